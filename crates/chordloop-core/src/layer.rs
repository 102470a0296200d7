//! Loop recording domain model

use serde::{Deserialize, Serialize};

/// What a recorded event does on playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopEventKind {
    NoteOn,
    NoteOff,
}

/// A single recorded MIDI event, immutable once recorded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopEvent {
    /// Seconds from loop start
    pub offset_secs: f64,
    pub kind: LoopEventKind,
    /// Logical channel the event was recorded on
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    /// GM program active when the event was recorded
    pub program: u8,
}

/// One recorded take. Filled while recording, sealed on record-stop, then
/// immutable except for whole-layer removal (undo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopLayer {
    pub events: Vec<LoopEvent>,
    /// Instrument program active when recording began
    pub program: u8,
}

impl LoopLayer {
    pub fn new(program: u8) -> Self {
        Self {
            events: Vec::new(),
            program,
        }
    }

    pub fn add(&mut self, event: LoopEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Loop recorder state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LooperState {
    #[default]
    Idle,
    Recording,
    Playing,
    Paused,
    Overdubbing,
}

impl LooperState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Overdubbing => "overdubbing",
        }
    }

    /// True while an open layer is accepting events
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording | Self::Overdubbing)
    }
}
