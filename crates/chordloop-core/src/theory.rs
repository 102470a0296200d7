//! Chord and scale vocabularies

use serde::{Deserialize, Serialize};

use crate::error::ChordloopError;

/// Note names for display (sharp spellings)
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Name of a pitch class (0-11)
pub fn note_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES[(pitch_class % 12) as usize]
}

/// Display label for a MIDI note, e.g. "C4" for note 60
pub fn note_label(note: u8) -> String {
    format!("{}{}", note_name(note % 12), note as i16 / 12 - 1)
}

// ============================================================================
// Chord Types
// ============================================================================

/// Chord quality vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordType {
    Major,
    Minor,
    Sus2,
    Sus4,
    Dim,
    Aug,
    Dom7,
    Maj7,
    Min7,
    Dim7,
    Aug7,
    Add9,
    Min9,
    Maj9,
    Power,
    #[serde(rename = "6")]
    Sixth,
    Min6,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "11")]
    Eleventh,
    #[serde(rename = "13")]
    Thirteenth,
}

impl ChordType {
    /// Semitone offsets from the root, first always 0, strictly increasing
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::Dim => &[0, 3, 6],
            Self::Aug => &[0, 4, 8],
            Self::Dom7 => &[0, 4, 7, 10],
            Self::Maj7 => &[0, 4, 7, 11],
            Self::Min7 => &[0, 3, 7, 10],
            Self::Dim7 => &[0, 3, 6, 9],
            Self::Aug7 => &[0, 4, 8, 10],
            Self::Add9 => &[0, 4, 7, 14],
            Self::Min9 => &[0, 3, 7, 10, 14],
            Self::Maj9 => &[0, 4, 7, 11, 14],
            Self::Power => &[0, 7],
            Self::Sixth => &[0, 4, 7, 9],
            Self::Min6 => &[0, 3, 7, 9],
            Self::Ninth => &[0, 4, 7, 10, 14],
            Self::Eleventh => &[0, 4, 7, 10, 14, 17],
            Self::Thirteenth => &[0, 4, 7, 10, 14, 21],
        }
    }

    /// Selector name as used by configuration and controllers
    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Dim => "dim",
            Self::Aug => "aug",
            Self::Dom7 => "dom7",
            Self::Maj7 => "maj7",
            Self::Min7 => "min7",
            Self::Dim7 => "dim7",
            Self::Aug7 => "aug7",
            Self::Add9 => "add9",
            Self::Min9 => "min9",
            Self::Maj9 => "maj9",
            Self::Power => "power",
            Self::Sixth => "6",
            Self::Min6 => "min6",
            Self::Ninth => "9",
            Self::Eleventh => "11",
            Self::Thirteenth => "13",
        }
    }

    /// Display suffix for chord names, e.g. "m7" in "Cm7"
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Dim => "dim",
            Self::Aug => "aug",
            Self::Dom7 => "7",
            Self::Maj7 => "maj7",
            Self::Min7 => "m7",
            Self::Dim7 => "dim7",
            Self::Aug7 => "aug7",
            Self::Add9 => "add9",
            Self::Min9 => "m9",
            Self::Maj9 => "maj9",
            Self::Power => "5",
            Self::Sixth => "6",
            Self::Min6 => "m6",
            Self::Ninth => "9",
            Self::Eleventh => "11",
            Self::Thirteenth => "13",
        }
    }

    /// Look up a chord type by selector name
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_CHORD_TYPES.iter().copied().find(|t| t.name() == name)
    }
}

impl std::str::FromStr for ChordType {
    type Err = ChordloopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ChordloopError::UnknownChordType(s.to_string()))
    }
}

/// Every chord type in vocabulary order
pub const ALL_CHORD_TYPES: [ChordType; 20] = [
    ChordType::Major,
    ChordType::Minor,
    ChordType::Sus2,
    ChordType::Sus4,
    ChordType::Dim,
    ChordType::Aug,
    ChordType::Dom7,
    ChordType::Maj7,
    ChordType::Min7,
    ChordType::Dim7,
    ChordType::Aug7,
    ChordType::Add9,
    ChordType::Min9,
    ChordType::Maj9,
    ChordType::Power,
    ChordType::Sixth,
    ChordType::Min6,
    ChordType::Ninth,
    ChordType::Eleventh,
    ChordType::Thirteenth,
];

// ============================================================================
// Scales and Diatonic Qualities
// ============================================================================

/// Scale vocabulary for key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    Major,
    Minor,
    Dorian,
    Mixolydian,
    Phrygian,
}

/// Diatonic chord qualities for major-type scale degrees (I-VII)
const MAJOR_DIATONIC: [ChordType; 7] = [
    ChordType::Major,
    ChordType::Minor,
    ChordType::Minor,
    ChordType::Major,
    ChordType::Major,
    ChordType::Minor,
    ChordType::Dim,
];

/// Diatonic chord qualities for minor scale degrees (I-VII)
const MINOR_DIATONIC: [ChordType; 7] = [
    ChordType::Minor,
    ChordType::Dim,
    ChordType::Major,
    ChordType::Minor,
    ChordType::Minor,
    ChordType::Major,
    ChordType::Major,
];

impl ScaleMode {
    /// Scale intervals (semitones from the key root)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Self::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Self::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Self::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
        }
    }

    /// Selector name as used by configuration
    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Dorian => "dorian",
            Self::Mixolydian => "mixolydian",
            Self::Phrygian => "phrygian",
        }
    }

    /// Look up a scale by selector name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            "dorian" => Some(Self::Dorian),
            "mixolydian" => Some(Self::Mixolydian),
            "phrygian" => Some(Self::Phrygian),
            _ => None,
        }
    }

    /// Scale degree for an interval above the key root.
    ///
    /// Non-scale intervals snap to the member with the smallest circular
    /// distance; ties go to the earlier scale degree.
    pub fn degree_of(&self, interval: u8) -> usize {
        let scale = self.intervals();
        let interval = interval % 12;

        if let Some(degree) = scale.iter().position(|&s| s == interval) {
            return degree;
        }

        let mut best = 0;
        let mut best_dist = u8::MAX;
        for (degree, &s) in scale.iter().enumerate() {
            let d = s.abs_diff(interval);
            let dist = d.min(12 - d);
            if dist < best_dist {
                best_dist = dist;
                best = degree;
            }
        }
        best
    }

    /// Diatonic chord quality for a scale degree (0-indexed).
    ///
    /// Only the minor scale takes the minor quality table; the modes borrow
    /// the major table, matching how the key-mode feature treats them.
    pub fn diatonic_quality(&self, degree: usize) -> ChordType {
        let table = match self {
            Self::Minor => &MINOR_DIATONIC,
            _ => &MAJOR_DIATONIC,
        };
        table[degree % table.len()]
    }
}

impl std::str::FromStr for ScaleMode {
    type Err = ChordloopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ChordloopError::UnknownScale(s.to_string()))
    }
}
