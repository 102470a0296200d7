//! Voice-leading resolver for smooth chord transitions
//!
//! Given the previously sounding notes and a new chord's pitch classes, finds
//! the voicing that minimizes total voice movement, so transitions sound
//! smooth instead of jumpy. Exact assignment search is bounded to four voices;
//! larger voicings degrade to greedy placement.

/// Resolve a new chord's pitch classes against the previous voicing.
///
/// `previous` is empty on the first chord, in which case the tones are simply
/// placed around `anchor_octave`. Returns an ascending voicing; empty input
/// yields an empty voicing.
pub fn smooth_voice_lead(previous: &[u8], chord_tones: &[u8], anchor_octave: u8) -> Vec<u8> {
    if chord_tones.is_empty() {
        return Vec::new();
    }

    if previous.is_empty() {
        return place_in_octave(chord_tones, anchor_octave);
    }

    let center = previous.iter().map(|&n| n as f64).sum::<f64>() / previous.len() as f64;
    let center_octave = center as i32 / 12;

    // Candidate notes per tone: the pitch class within one octave of the
    // previous chord's center, kept inside the usable piano range
    let mut candidates_per_tone: Vec<Vec<u8>> = Vec::with_capacity(chord_tones.len());
    for &pc in chord_tones {
        let mut candidates = Vec::new();
        for octave in (center_octave - 1).max(0)..=(center_octave + 1).min(8) {
            let note = octave * 12 + pc as i32;
            if (24..=96).contains(&note) {
                candidates.push(note as u8);
            }
        }
        if candidates.is_empty() {
            candidates.push((anchor_octave as u16 * 12 + pc as u16).min(127) as u8);
        }
        candidates_per_tone.push(candidates);
    }

    let mut voicing = if chord_tones.len() == previous.len() && previous.len() <= 4 {
        match_voices(previous, &candidates_per_tone)
    } else {
        greedy_place(previous, &candidates_per_tone, center)
    };
    voicing.sort_unstable();
    voicing
}

/// Place pitch classes around an octave, shifted into the 36..=84 register
fn place_in_octave(pitch_classes: &[u8], octave: u8) -> Vec<u8> {
    let mut notes: Vec<u8> = pitch_classes
        .iter()
        .map(|&pc| {
            let mut note = octave as i32 * 12 + pc as i32;
            while note < 36 {
                note += 12;
            }
            while note > 84 {
                note -= 12;
            }
            note as u8
        })
        .collect();
    notes.sort_unstable();
    notes
}

/// Exact assignment: try every previous-note/tone pairing (at most 24 for
/// four voices) and keep the minimum total movement. The first minimal
/// permutation in enumeration order wins ties.
fn match_voices(previous: &[u8], candidates_per_tone: &[Vec<u8>]) -> Vec<u8> {
    let mut best_voicing = Vec::new();
    let mut best_cost = u32::MAX;

    for perm in permutations(previous.len()) {
        let mut voicing = Vec::with_capacity(previous.len());
        let mut cost = 0u32;
        for (i, &tone) in perm.iter().enumerate() {
            let prev = previous[i] as i32;
            let note = nearest_candidate(&candidates_per_tone[tone], prev);
            cost += (note as i32 - prev).unsigned_abs();
            voicing.push(note);
        }
        if cost < best_cost {
            best_cost = cost;
            best_voicing = voicing;
        }
    }

    best_voicing
}

/// Greedy placement for mismatched voice counts. Tones are processed in
/// chord-tone order; each takes the globally closest (candidate, unused
/// previous note) pair. Once previous notes run out, remaining tones settle
/// nearest the old chord's center.
fn greedy_place(previous: &[u8], candidates_per_tone: &[Vec<u8>], center: f64) -> Vec<u8> {
    let mut result = Vec::with_capacity(candidates_per_tone.len());
    let mut used = vec![false; previous.len()];

    for candidates in candidates_per_tone {
        let any_unused = used.iter().any(|&u| !u);

        let chosen = if any_unused {
            let mut best: Option<(u8, usize, u32)> = None;
            for &c in candidates {
                for (i, &p) in previous.iter().enumerate() {
                    if used[i] {
                        continue;
                    }
                    let dist = (c as i32 - p as i32).unsigned_abs();
                    if best.is_none_or(|(_, _, d)| dist < d) {
                        best = Some((c, i, dist));
                    }
                }
            }
            best.map(|(note, prev_idx, _)| {
                used[prev_idx] = true;
                note
            })
        } else {
            let mut best: Option<(u8, f64)> = None;
            for &c in candidates {
                let dist = (c as f64 - center).abs();
                if best.is_none_or(|(_, d)| dist < d) {
                    best = Some((c, dist));
                }
            }
            best.map(|(note, _)| note)
        };

        match chosen {
            Some(note) => result.push(note),
            None => {
                if let Some(&mid) = candidates.get(candidates.len() / 2) {
                    result.push(mid);
                }
            }
        }
    }

    result.sort_unstable();
    result
}

fn nearest_candidate(candidates: &[u8], target: i32) -> u8 {
    let mut best = candidates[0];
    let mut best_dist = (best as i32 - target).unsigned_abs();
    for &c in &candidates[1..] {
        let dist = (c as i32 - target).unsigned_abs();
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

/// All permutations of 0..n in lexicographic order
fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn extend(current: &mut Vec<usize>, used: &mut [bool], out: &mut Vec<Vec<usize>>) {
        if current.len() == used.len() {
            out.push(current.clone());
            return;
        }
        for i in 0..used.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            current.push(i);
            extend(current, used, out);
            current.pop();
            used[i] = false;
        }
    }

    let mut out = Vec::new();
    extend(&mut Vec::with_capacity(n), &mut vec![false; n], &mut out);
    out
}

// ============================================================================
// Voicing Transforms
// ============================================================================

/// Apply chord inversion: move the lowest note up an octave, `inversion`
/// times, capped at one less than the voice count.
pub fn apply_inversion(notes: &[u8], inversion: u8) -> Vec<u8> {
    let mut result = notes.to_vec();
    if result.is_empty() || inversion == 0 {
        return result;
    }

    for _ in 0..(inversion as usize).min(result.len() - 1) {
        let lowest = result.remove(0);
        result.push((lowest as u16 + 12).min(127) as u8);
    }
    result.sort_unstable();
    result
}

/// Widen a close voicing: the lowest note stays put, each upper voice shifts
/// up by `spread * index * 6` semitones. `spread` runs 0.0 (tight) to 1.0
/// (wide, two-plus octaves).
pub fn apply_spread(notes: &[u8], spread: f32) -> Vec<u8> {
    if notes.len() <= 1 || spread <= 0.0 {
        return notes.to_vec();
    }

    let mut result = vec![notes[0]];
    for (i, &note) in notes.iter().enumerate().skip(1) {
        let offset = (spread * i as f32 * 6.0) as i32;
        result.push((note as i32 + offset).clamp(0, 127) as u8);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tones_yield_empty_voicing() {
        assert!(smooth_voice_lead(&[60, 64, 67], &[], 4).is_empty());
        assert!(smooth_voice_lead(&[], &[], 4).is_empty());
    }

    #[test]
    fn test_first_chord_placed_around_anchor() {
        let voicing = smooth_voice_lead(&[], &[0, 4, 7], 4);
        assert_eq!(voicing, vec![48, 52, 55]);
        for w in voicing.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_first_chord_register_limits() {
        // Low anchor gets lifted into range, high anchor pulled down
        for &n in smooth_voice_lead(&[], &[0, 4, 7], 0).iter() {
            assert!((36..=84).contains(&n));
        }
        for &n in smooth_voice_lead(&[], &[0, 4, 7], 8).iter() {
            assert!((36..=84).contains(&n));
        }
    }

    #[test]
    fn test_common_tones_held() {
        // C major -> F major: C holds, E->F, G->A
        let voicing = smooth_voice_lead(&[60, 64, 67], &[5, 9, 0], 4);
        assert_eq!(voicing, vec![60, 65, 69]);
    }

    #[test]
    fn test_shrinking_voice_count_goes_greedy() {
        // G7 (4 voices) -> C major (3 voices)
        let voicing = smooth_voice_lead(&[55, 59, 62, 65], &[0, 4, 7], 4);
        assert_eq!(voicing, vec![55, 60, 64]);
    }

    #[test]
    fn test_growing_voice_count_goes_greedy() {
        let voicing = smooth_voice_lead(&[60, 64, 67], &[0, 4, 7, 10, 2], 4);
        assert_eq!(voicing.len(), 5);
        for w in voicing.windows(2) {
            assert!(w[0] <= w[1]);
        }
        for &n in &voicing {
            assert!((24..=96).contains(&n));
        }
    }

    /// Movement of a voicing against a previous chord: the cheapest pairing
    /// over all permutations.
    fn movement(voicing: &[u8], previous: &[u8]) -> u32 {
        permutations(previous.len())
            .into_iter()
            .map(|perm| {
                perm.iter()
                    .enumerate()
                    .map(|(i, &j)| (voicing[j] as i32 - previous[i] as i32).unsigned_abs())
                    .sum()
            })
            .min()
            .unwrap()
    }

    /// Brute-force minimal movement over every candidate combination, using
    /// the same candidate rule as the resolver (pitch class within one octave
    /// of the previous chord's center, inside 24..=96).
    fn brute_force_best(previous: &[u8], chord_tones: &[u8]) -> u32 {
        let center =
            previous.iter().map(|&n| n as f64).sum::<f64>() / previous.len() as f64;
        let center_octave = center as i32 / 12;

        let candidates: Vec<Vec<u8>> = chord_tones
            .iter()
            .map(|&pc| {
                ((center_octave - 1).max(0)..=(center_octave + 1).min(8))
                    .map(|oct| oct * 12 + pc as i32)
                    .filter(|n| (24..=96).contains(n))
                    .map(|n| n as u8)
                    .collect()
            })
            .collect();

        let mut combos: Vec<Vec<u8>> = vec![Vec::new()];
        for tone_candidates in &candidates {
            combos = combos
                .into_iter()
                .flat_map(|combo| {
                    tone_candidates.iter().map(move |&c| {
                        let mut next = combo.clone();
                        next.push(c);
                        next
                    })
                })
                .collect();
        }

        combos.iter().map(|v| movement(v, previous)).min().unwrap()
    }

    #[test]
    fn test_equal_size_resolution_is_optimal() {
        let cases: [(&[u8], &[u8]); 5] = [
            (&[60, 64, 67], &[5, 9, 0]),
            (&[60, 64, 67], &[2, 6, 9]),
            (&[48, 55, 64], &[1, 5, 8]),
            (&[58, 62, 65, 69], &[0, 4, 7, 11]),
            (&[50, 57, 65, 72], &[3, 8, 10, 2]),
        ];

        for (previous, tones) in cases {
            let voicing = smooth_voice_lead(previous, tones, 4);
            assert_eq!(
                movement(&voicing, previous),
                brute_force_best(previous, tones),
                "suboptimal voicing {:?} for {:?} -> {:?}",
                voicing,
                previous,
                tones
            );
        }
    }

    #[test]
    fn test_inversion_moves_bass_up() {
        assert_eq!(apply_inversion(&[60, 64, 67], 1), vec![64, 67, 72]);
        assert_eq!(apply_inversion(&[60, 64, 67], 2), vec![67, 72, 76]);
    }

    #[test]
    fn test_inversion_capped_at_voice_count() {
        // Third inversion of a triad caps at two lifts
        assert_eq!(
            apply_inversion(&[60, 64, 67], 3),
            apply_inversion(&[60, 64, 67], 2)
        );
        assert_eq!(apply_inversion(&[60], 3), vec![60]);
        assert!(apply_inversion(&[], 2).is_empty());
    }

    #[test]
    fn test_inversion_preserves_pitch_classes() {
        let original = [60u8, 63, 67, 70];
        let n = original.len() as u8;
        for k in 1..n {
            let once = apply_inversion(&original, k);
            let back = apply_inversion(&once, n - k);
            let mut pcs: Vec<u8> = back.iter().map(|n| n % 12).collect();
            pcs.sort_unstable();
            let mut want: Vec<u8> = original.iter().map(|n| n % 12).collect();
            want.sort_unstable();
            assert_eq!(pcs, want);
            for (a, b) in back.iter().zip(original.iter()) {
                assert_eq!((*a as i32 - *b as i32) % 12, 0);
            }
        }
    }

    #[test]
    fn test_spread_keeps_bass_and_widens_uppers() {
        assert_eq!(apply_spread(&[60, 64, 67], 1.0), vec![60, 70, 79]);
        assert_eq!(apply_spread(&[60, 64, 67], 0.5), vec![60, 67, 73]);
        assert_eq!(apply_spread(&[60, 64, 67], 0.0), vec![60, 64, 67]);
        assert_eq!(apply_spread(&[60], 1.0), vec![60]);
    }

    #[test]
    fn test_spread_clamps_to_midi_range() {
        let spread = apply_spread(&[120, 125, 126], 1.0);
        assert!(spread.iter().all(|&n| n <= 127));
        assert_eq!(spread[0], 120);
    }
}
