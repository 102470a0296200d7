//! Sound output seam
//!
//! The core calls these operations but owns no audio state; synthesis lives
//! in an external collaborator. `NullSound` logs instead of sounding,
//! `ChannelSound` forwards to whatever sits on the other end of a channel.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Continuous synth controls routed from controller knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundParam {
    Volume,
    Reverb,
    Modulation,
    PitchBend,
}

/// Sound-producing collaborator interface
pub trait SoundSink: Send + Sync {
    fn note_on(&self, channel: u8, note: u8, velocity: u8);
    fn note_off(&self, channel: u8, note: u8);
    fn program_select(&self, channel: u8, program: u8);
    fn all_notes_off(&self, channel: u8);
    fn set_param(&self, param: SoundParam, value: u8);
}

/// One sound instruction, as forwarded to an external synth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCommand {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ProgramSelect { channel: u8, program: u8 },
    AllNotesOff { channel: u8 },
    SetParam { param: SoundParam, value: u8 },
}

/// Silent sink for running without audio; every call is logged
#[derive(Debug, Default)]
pub struct NullSound;

impl SoundSink for NullSound {
    fn note_on(&self, channel: u8, note: u8, velocity: u8) {
        debug!(channel, note, velocity, "note on");
    }

    fn note_off(&self, channel: u8, note: u8) {
        debug!(channel, note, "note off");
    }

    fn program_select(&self, channel: u8, program: u8) {
        debug!(channel, program, "program select");
    }

    fn all_notes_off(&self, channel: u8) {
        debug!(channel, "all notes off");
    }

    fn set_param(&self, param: SoundParam, value: u8) {
        debug!(?param, value, "set param");
    }
}

/// Forwards commands over a bounded channel to a synth collaborator.
///
/// Sends never block the control path; if the synth side stalls and the
/// queue fills, commands are dropped.
pub struct ChannelSound {
    tx: Sender<SoundCommand>,
}

impl ChannelSound {
    pub fn new(tx: Sender<SoundCommand>) -> Self {
        Self { tx }
    }

    fn send(&self, command: SoundCommand) {
        let _ = self.tx.try_send(command);
    }
}

impl SoundSink for ChannelSound {
    fn note_on(&self, channel: u8, note: u8, velocity: u8) {
        self.send(SoundCommand::NoteOn {
            channel,
            note,
            velocity,
        });
    }

    fn note_off(&self, channel: u8, note: u8) {
        self.send(SoundCommand::NoteOff { channel, note });
    }

    fn program_select(&self, channel: u8, program: u8) {
        self.send(SoundCommand::ProgramSelect { channel, program });
    }

    fn all_notes_off(&self, channel: u8) {
        self.send(SoundCommand::AllNotesOff { channel });
    }

    fn set_param(&self, param: SoundParam, value: u8) {
        self.send(SoundCommand::SetParam { param, value });
    }
}
