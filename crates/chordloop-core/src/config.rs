//! Construction-time configuration
//!
//! An external loader owns the config file; these types only describe its
//! shape and defaults. Nothing here touches the filesystem.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Chord engine defaults, supplied at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordConfig {
    /// Selector name of the startup chord type
    pub default_type: String,
    /// Octave used to anchor the first chord of a session
    pub default_octave: u8,
    pub voice_leading: bool,
    /// Scale selector name; key mode is active only with `key_root`
    pub key_mode: Option<String>,
    /// Key root pitch class (0-11)
    pub key_root: Option<u8>,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            default_type: "major".to_string(),
            default_octave: 4,
            voice_leading: true,
            key_mode: None,
            key_root: None,
        }
    }
}

/// What a mapped controller number does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CcAction {
    /// Button press selects a chord type by name
    ChordType { value: String },
    Inversion,
    Spread,
    Volume,
    Reverb,
    Modulation,
    PitchBend,
    Instrument,
    RecordToggle,
    PlayPause,
    UndoLayer,
    ClearLoop,
}

/// Controller-number to action bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMap {
    bindings: HashMap<u8, CcAction>,
}

impl ControlMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, cc: u8, action: CcAction) {
        self.bindings.insert(cc, action);
    }

    pub fn action_for(&self, cc: u8) -> Option<&CcAction> {
        self.bindings.get(&cc)
    }
}

impl Default for ControlMap {
    /// The stock MPK Mini layout: eight chord-type buttons, four knobs,
    /// an instrument knob, joystick axes, and four looper pads.
    fn default() -> Self {
        let chord_buttons = [
            (20, "major"),
            (21, "minor"),
            (22, "sus2"),
            (23, "sus4"),
            (24, "dim"),
            (25, "aug"),
            (26, "dom7"),
            (27, "maj7"),
        ];

        let mut map = Self::empty();
        for (cc, name) in chord_buttons {
            map.bind(
                cc,
                CcAction::ChordType {
                    value: name.to_string(),
                },
            );
        }

        map.bind(70, CcAction::Inversion);
        map.bind(71, CcAction::Spread);
        map.bind(72, CcAction::Volume);
        map.bind(73, CcAction::Reverb);
        map.bind(74, CcAction::Instrument);
        map.bind(1, CcAction::PitchBend);
        map.bind(2, CcAction::Modulation);
        map.bind(28, CcAction::RecordToggle);
        map.bind(29, CcAction::PlayPause);
        map.bind(30, CcAction::UndoLayer);
        map.bind(31, CcAction::ClearLoop);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_config_defaults() {
        let config = ChordConfig::default();
        assert_eq!(config.default_type, "major");
        assert_eq!(config.default_octave, 4);
        assert!(config.voice_leading);
        assert!(config.key_mode.is_none());
    }

    #[test]
    fn test_chord_config_partial_json() {
        let config: ChordConfig =
            serde_json::from_str(r#"{"default_type": "min7", "key_mode": "minor", "key_root": 9}"#)
                .unwrap();
        assert_eq!(config.default_type, "min7");
        assert_eq!(config.key_mode.as_deref(), Some("minor"));
        assert_eq!(config.key_root, Some(9));
        // Unspecified fields keep their defaults
        assert_eq!(config.default_octave, 4);
    }

    #[test]
    fn test_cc_action_json_shape() {
        let action: CcAction =
            serde_json::from_str(r#"{"action": "chord_type", "value": "sus4"}"#).unwrap();
        assert_eq!(
            action,
            CcAction::ChordType {
                value: "sus4".to_string()
            }
        );
        let action: CcAction = serde_json::from_str(r#"{"action": "spread"}"#).unwrap();
        assert_eq!(action, CcAction::Spread);
    }

    #[test]
    fn test_default_map_bindings() {
        let map = ControlMap::default();
        assert_eq!(
            map.action_for(20),
            Some(&CcAction::ChordType {
                value: "major".to_string()
            })
        );
        assert_eq!(map.action_for(70), Some(&CcAction::Inversion));
        assert_eq!(map.action_for(28), Some(&CcAction::RecordToggle));
        assert_eq!(map.action_for(99), None);
    }
}
