//! Chord generation session state
//!
//! One played note becomes a full chord: the engine tracks the active chord
//! type, inversion, spread, and key mode, and remembers the previous voicing
//! so consecutive chords voice-lead into each other.

use serde::Serialize;

use crate::config::ChordConfig;
use crate::theory::{self, ChordType, ScaleMode};
use crate::voice_leading::{apply_inversion, apply_spread, smooth_voice_lead};

/// Read-only engine snapshot for display and logging collaborators
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub chord_name: String,
    pub chord_type: &'static str,
    pub inversion: u8,
    pub spread: f32,
    pub notes: Vec<u8>,
    pub note_names: Vec<String>,
    pub key_mode: Option<&'static str>,
    pub key_root: Option<&'static str>,
    pub voice_leading: bool,
}

pub struct ChordEngine {
    root_note: Option<u8>,
    chord_type: ChordType,
    inversion: u8,
    spread: f32,
    voice_leading_enabled: bool,
    default_octave: u8,
    key_root: Option<u8>,
    key_mode: Option<ScaleMode>,
    last_voicing: Vec<u8>,
    current_voicing: Vec<u8>,
    velocity: u8,
}

impl ChordEngine {
    pub fn new(config: &ChordConfig) -> Self {
        Self {
            root_note: None,
            chord_type: ChordType::from_name(&config.default_type).unwrap_or(ChordType::Major),
            inversion: 0,
            spread: 0.0,
            voice_leading_enabled: config.voice_leading,
            default_octave: config.default_octave,
            key_root: config.key_root.map(|r| r % 12),
            key_mode: config.key_mode.as_deref().and_then(ScaleMode::from_name),
            last_voicing: Vec::new(),
            current_voicing: Vec::new(),
            velocity: 100,
        }
    }

    /// Set the active chord type by selector name. Unknown names are
    /// rejected without touching state.
    pub fn set_chord_type(&mut self, name: &str) -> bool {
        match ChordType::from_name(name) {
            Some(chord_type) => {
                self.chord_type = chord_type;
                true
            }
            None => false,
        }
    }

    /// Set inversion from a controller value (0-127 maps to 0-3)
    pub fn set_inversion(&mut self, cc_value: u8) {
        self.inversion = (cc_value / 32).min(3);
    }

    /// Set spread from a controller value (0-127 maps to 0.0-1.0)
    pub fn set_spread(&mut self, cc_value: u8) {
        self.spread = cc_value as f32 / 127.0;
    }

    /// Enable key mode: chord qualities follow the key's scale degrees.
    /// Unknown scale names are rejected without touching state.
    pub fn set_key_mode(&mut self, key_root: u8, scale_name: &str) -> bool {
        match ScaleMode::from_name(scale_name) {
            Some(scale) => {
                self.key_root = Some(key_root % 12);
                self.key_mode = Some(scale);
                true
            }
            None => false,
        }
    }

    /// Back to free chromatic mode
    pub fn clear_key_mode(&mut self) {
        self.key_mode = None;
        self.key_root = None;
    }

    /// Generate a chord from a single played note.
    ///
    /// Returns the (note, velocity) pairs to sound, lowest first. The voicing
    /// becomes the reference for the next chord's voice leading.
    pub fn generate_chord(&mut self, midi_note: u8, velocity: u8) -> Vec<(u8, u8)> {
        self.root_note = Some(midi_note);
        self.velocity = velocity;
        let root_pc = midi_note % 12;

        let chord_type = if self.key_active() {
            self.diatonic_chord_type(root_pc)
        } else {
            self.chord_type
        };

        let pitch_classes: Vec<u8> = chord_type
            .intervals()
            .iter()
            .map(|&interval| (root_pc + interval) % 12)
            .collect();

        let mut notes = if self.voice_leading_enabled && !self.last_voicing.is_empty() {
            smooth_voice_lead(&self.last_voicing, &pitch_classes, self.default_octave)
        } else {
            place_near(midi_note, &pitch_classes)
        };

        if self.inversion > 0 {
            notes = apply_inversion(&notes, self.inversion);
        }
        if self.spread > 0.05 {
            notes = apply_spread(&notes, self.spread);
        }

        self.last_voicing = notes.clone();
        self.current_voicing = notes.clone();

        notes.into_iter().map(|n| (n, velocity)).collect()
    }

    /// Stop the sounding chord. Returns the notes to silence; the voicing
    /// stays remembered for voice leading into the next chord.
    pub fn stop_chord(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.current_voicing)
    }

    /// Display name of the current chord, e.g. "Cmaj7" or "Dm/1st"
    pub fn chord_name(&self) -> String {
        let Some(root) = self.root_note else {
            return String::new();
        };
        let root_pc = root % 12;

        let chord_type = if self.key_active() {
            self.diatonic_chord_type(root_pc)
        } else {
            self.chord_type
        };

        let inversion_suffix = match self.inversion {
            1 => "/1st",
            2 => "/2nd",
            3 => "/3rd",
            _ => "",
        };

        format!(
            "{}{}{}",
            theory::note_name(root_pc),
            chord_type.suffix(),
            inversion_suffix
        )
    }

    /// Note labels for the sounding chord, e.g. ["C4", "E4", "G4"]
    pub fn note_names(&self) -> Vec<String> {
        self.current_voicing
            .iter()
            .map(|&n| theory::note_label(n))
            .collect()
    }

    pub fn root_note(&self) -> Option<u8> {
        self.root_note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn current_voicing(&self) -> &[u8] {
        &self.current_voicing
    }

    pub fn is_sounding(&self) -> bool {
        !self.current_voicing.is_empty()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            chord_name: self.chord_name(),
            chord_type: self.chord_type.name(),
            inversion: self.inversion,
            spread: self.spread,
            notes: self.current_voicing.clone(),
            note_names: self.note_names(),
            key_mode: self.key_mode.map(|m| m.name()),
            key_root: self.key_root.map(theory::note_name),
            voice_leading: self.voice_leading_enabled,
        }
    }

    fn key_active(&self) -> bool {
        self.key_mode.is_some() && self.key_root.is_some()
    }

    /// Diatonic chord quality for a root pitch class within the active key
    fn diatonic_chord_type(&self, root_pc: u8) -> ChordType {
        let (Some(key_root), Some(scale)) = (self.key_root, self.key_mode) else {
            return self.chord_type;
        };

        let interval = (root_pc + 12 - key_root) % 12;
        scale.diatonic_quality(scale.degree_of(interval))
    }
}

/// Place pitch classes in the played note's octave, shifted to sit within
/// [note-6, note+18]
fn place_near(midi_note: u8, pitch_classes: &[u8]) -> Vec<u8> {
    let base_octave = midi_note as i32 / 12;
    let mut notes: Vec<u8> = pitch_classes
        .iter()
        .map(|&pc| {
            let mut note = base_octave * 12 + pc as i32;
            while note < midi_note as i32 - 6 {
                note += 12;
            }
            while note > midi_note as i32 + 18 {
                note -= 12;
            }
            note.clamp(0, 127) as u8
        })
        .collect();
    notes.sort_unstable();
    notes
}
