//! chordloop-core: Domain types for the chordloop chord looper

pub mod config;
mod engine;
mod error;
pub mod instruments;
mod layer;
pub mod theory;
pub mod voice_leading;

pub use config::{CcAction, ChordConfig, ControlMap};
pub use engine::{ChordEngine, EngineSnapshot};
pub use error::{ChordloopError, Result};
pub use layer::{LoopEvent, LoopEventKind, LoopLayer, LooperState};
pub use theory::{note_label, note_name, ChordType, ScaleMode, ALL_CHORD_TYPES, NOTE_NAMES};
pub use voice_leading::{apply_inversion, apply_spread, smooth_voice_lead};
