//! Curated General MIDI instrument bank
//!
//! A single controller knob sweeps this list, so it stays small and ordered
//! by family rather than covering all 128 GM programs.

/// (GM program, display name)
pub const INSTRUMENTS: [(u8, &str); 16] = [
    (0, "Acoustic Grand Piano"),
    (4, "Electric Piano"),
    (19, "Organ"),
    (48, "Strings Ensemble"),
    (89, "Synth Pad"),
    (80, "Synth Lead"),
    (25, "Acoustic Guitar"),
    (27, "Electric Guitar Clean"),
    (30, "Electric Guitar Distorted"),
    (32, "Acoustic Bass"),
    (36, "Slap Bass"),
    (56, "Trumpet"),
    (65, "Saxophone"),
    (73, "Flute"),
    (52, "Choir Aahs"),
    (61, "Brass Section"),
];

/// Map a controller value (0-127) to an instrument index
pub fn index_for_cc(value: u8) -> usize {
    (value as usize * INSTRUMENTS.len() / 128).min(INSTRUMENTS.len() - 1)
}

/// GM program for an instrument index (clamped)
pub fn program_at(index: usize) -> u8 {
    INSTRUMENTS[index.min(INSTRUMENTS.len() - 1)].0
}

/// Display name for an instrument index (clamped)
pub fn name_at(index: usize) -> &'static str {
    INSTRUMENTS[index.min(INSTRUMENTS.len() - 1)].1
}

/// Display name for a GM program, if it is in the curated bank
pub fn name_for_program(program: u8) -> Option<&'static str> {
    INSTRUMENTS
        .iter()
        .find(|(p, _)| *p == program)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cc_sweep_covers_bank() {
        assert_eq!(index_for_cc(0), 0);
        assert_eq!(index_for_cc(127), INSTRUMENTS.len() - 1);

        let mut last = 0;
        for value in 0..=127u8 {
            let index = index_for_cc(value);
            assert!(index >= last);
            last = index;
        }
        assert_eq!(last, INSTRUMENTS.len() - 1);
    }

    #[test]
    fn test_lookups_clamp() {
        assert_eq!(program_at(999), INSTRUMENTS[15].0);
        assert_eq!(name_at(0), "Acoustic Grand Piano");
        assert_eq!(name_for_program(56), Some("Trumpet"));
        assert_eq!(name_for_program(1), None);
    }
}
