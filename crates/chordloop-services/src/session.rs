//! Real-time control path
//!
//! Routes note and controller input (delivered by an external MIDI
//! transport) through the chord engine, the sound sink, and the loop
//! recorder. Owns the session's instrument selection.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use chordloop_core::{
    instruments, CcAction, ChordConfig, ChordEngine, ControlMap, EngineSnapshot, LoopEventKind,
};

use crate::looper::Looper;
use crate::sound::{SoundParam, SoundSink};

/// Channel live chords sound on; loop layers replay on 1-8, drums on 9
const LIVE_CHANNEL: u8 = 0;

/// Combined read-only status for display collaborators
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub engine: EngineSnapshot,
    pub instrument: &'static str,
    pub looper_state: &'static str,
    pub layers: usize,
    pub loop_secs: f64,
}

pub struct Session {
    engine: ChordEngine,
    looper: Looper,
    sound: Arc<dyn SoundSink>,
    control_map: ControlMap,
    instrument_index: usize,
    program: u8,
}

impl Session {
    pub fn new(config: &ChordConfig, control_map: ControlMap, sound: Arc<dyn SoundSink>) -> Self {
        let program = instruments::program_at(0);
        sound.program_select(LIVE_CHANNEL, program);

        Self {
            engine: ChordEngine::new(config),
            looper: Looper::new(Arc::clone(&sound)),
            sound,
            control_map,
            instrument_index: 0,
            program,
        }
    }

    /// A key went down: generate the chord, sound it, and feed the loop
    /// recorder if a layer is open
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.release_current();

        let chord = self.engine.generate_chord(note, velocity);
        for &(n, v) in &chord {
            self.sound.note_on(LIVE_CHANNEL, n, v);
            self.looper
                .record_event(LoopEventKind::NoteOn, LIVE_CHANNEL, n, v, self.program);
        }
        debug!(chord = %self.engine.chord_name(), notes = chord.len(), "chord on");
    }

    /// A key came up: release the sounding chord
    pub fn note_off(&mut self, _note: u8) {
        self.release_current();
    }

    /// A mapped controller moved. Buttons fire on press (value > 0) only.
    pub fn controller_change(&mut self, cc: u8, value: u8) {
        let Some(action) = self.control_map.action_for(cc).cloned() else {
            debug!(cc, value, "unmapped controller");
            return;
        };

        match &action {
            CcAction::ChordType { value: name } => {
                if value > 0 && self.engine.set_chord_type(name) {
                    info!(chord_type = %name, "chord type");
                }
            }
            CcAction::Inversion => self.engine.set_inversion(value),
            CcAction::Spread => self.engine.set_spread(value),
            CcAction::Volume => self.sound.set_param(SoundParam::Volume, value),
            CcAction::Reverb => self.sound.set_param(SoundParam::Reverb, value),
            CcAction::Modulation => self.sound.set_param(SoundParam::Modulation, value),
            CcAction::PitchBend => self.sound.set_param(SoundParam::PitchBend, value),
            CcAction::Instrument => self.select_instrument(instruments::index_for_cc(value)),
            CcAction::RecordToggle => {
                if value > 0 {
                    let state = self.looper.toggle_record(self.program);
                    info!(state = state.name(), "record toggle");
                }
            }
            CcAction::PlayPause => {
                if value > 0 {
                    let state = self.looper.toggle_play_pause();
                    info!(state = state.name(), "play/pause");
                }
            }
            CcAction::UndoLayer => {
                if value > 0 {
                    self.looper.undo_layer();
                }
            }
            CcAction::ClearLoop => {
                if value > 0 {
                    self.looper.clear();
                }
            }
        }

        // A held chord tracks engine changes immediately
        if matches!(
            action,
            CcAction::ChordType { .. } | CcAction::Inversion | CcAction::Spread
        ) {
            self.regenerate_sounding_chord();
        }
    }

    /// Re-sound the current chord after a chord-shape control change
    fn regenerate_sounding_chord(&mut self) {
        let Some(root) = self.engine.root_note() else {
            return;
        };
        if !self.engine.is_sounding() {
            return;
        }

        let velocity = self.engine.velocity();
        self.release_current();
        let chord = self.engine.generate_chord(root, velocity);
        for &(n, v) in &chord {
            self.sound.note_on(LIVE_CHANNEL, n, v);
            self.looper
                .record_event(LoopEventKind::NoteOn, LIVE_CHANNEL, n, v, self.program);
        }
    }

    fn release_current(&mut self) {
        for note in self.engine.stop_chord() {
            self.sound.note_off(LIVE_CHANNEL, note);
            self.looper
                .record_event(LoopEventKind::NoteOff, LIVE_CHANNEL, note, 0, self.program);
        }
    }

    fn select_instrument(&mut self, index: usize) {
        if index == self.instrument_index {
            return;
        }
        self.instrument_index = index;
        self.program = instruments::program_at(index);
        self.sound.program_select(LIVE_CHANNEL, self.program);
        info!(instrument = instruments::name_at(index), "instrument");
    }

    pub fn status(&self) -> StatusSnapshot {
        let looper = self.looper.snapshot();
        StatusSnapshot {
            engine: self.engine.snapshot(),
            instrument: instruments::name_at(self.instrument_index),
            looper_state: looper.state.name(),
            layers: looper.layers,
            loop_secs: looper.loop_secs,
        }
    }

    pub fn engine(&mut self) -> &mut ChordEngine {
        &mut self.engine
    }

    pub fn looper(&mut self) -> &mut Looper {
        &mut self.looper
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for note in self.engine.stop_chord() {
            self.sound.note_off(LIVE_CHANNEL, note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::capture::CaptureSink;
    use crate::sound::SoundCommand;
    use chordloop_core::LooperState;

    fn session_with_sink() -> (Session, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::new());
        let session = Session::new(
            &ChordConfig::default(),
            ControlMap::default(),
            sink.clone(),
        );
        (session, sink)
    }

    fn sounded_notes(sink: &CaptureSink) -> Vec<u8> {
        sink.note_ons().iter().map(|&(_, _, n)| n).collect()
    }

    #[test]
    fn test_construction_selects_initial_program() {
        let (_session, sink) = session_with_sink();
        assert!(sink.commands().iter().any(|(_, c)| {
            *c == SoundCommand::ProgramSelect {
                channel: 0,
                program: 0,
            }
        }));
    }

    #[test]
    fn test_note_on_sounds_a_chord_on_live_channel() {
        let (mut session, sink) = session_with_sink();
        session.note_on(60, 100);

        let note_ons = sink.note_ons();
        assert_eq!(note_ons.len(), 3);
        assert!(note_ons.iter().all(|&(_, channel, _)| channel == 0));
        assert_eq!(sounded_notes(&sink), vec![60, 64, 67]);
    }

    #[test]
    fn test_note_off_releases_exactly_the_chord() {
        let (mut session, sink) = session_with_sink();
        session.note_on(60, 100);
        session.note_off(60);

        let offs: Vec<u8> = sink
            .commands()
            .into_iter()
            .filter_map(|(_, c)| match c {
                SoundCommand::NoteOff { note, .. } => Some(note),
                _ => None,
            })
            .collect();
        assert_eq!(offs, vec![60, 64, 67]);
    }

    #[test]
    fn test_chord_button_changes_subsequent_chords() {
        let (mut session, sink) = session_with_sink();

        session.controller_change(21, 127); // minor button
        session.note_on(60, 100);
        assert_eq!(sounded_notes(&sink), vec![60, 63, 67]);
        session.note_off(60);

        sink.clear();
        session.controller_change(21, 0); // button release: no change
        session.controller_change(26, 127); // dom7 button
        session.note_on(60, 100);
        let notes = sounded_notes(&sink);
        let mut pcs: Vec<u8> = notes.iter().map(|n| n % 12).collect();
        pcs.sort_unstable();
        assert_eq!(pcs, vec![0, 4, 7, 10]);
    }

    #[test]
    fn test_held_chord_regenerates_on_spread_change() {
        let (mut session, sink) = session_with_sink();
        session.note_on(60, 100);
        sink.clear();

        session.controller_change(71, 127); // spread knob wide open

        // The old voicing is released and a wider one sounds
        let commands = sink.commands();
        assert!(commands
            .iter()
            .any(|(_, c)| matches!(c, SoundCommand::NoteOff { .. })));
        let notes = sounded_notes(&sink);
        assert_eq!(notes.len(), 3);
        assert!(notes[2] > 67);
    }

    #[test]
    fn test_control_change_without_held_chord_stays_silent() {
        let (mut session, sink) = session_with_sink();
        sink.clear();
        session.controller_change(70, 64); // inversion knob, nothing held
        assert!(sink.note_ons().is_empty());
    }

    #[test]
    fn test_instrument_knob_switches_program() {
        let (mut session, sink) = session_with_sink();
        sink.clear();

        session.controller_change(74, 127); // last instrument in the bank
        assert!(sink.commands().iter().any(|(_, c)| {
            *c == SoundCommand::ProgramSelect {
                channel: 0,
                program: 61,
            }
        }));
        assert_eq!(session.status().instrument, "Brass Section");

        // Same position again: no duplicate program change
        sink.clear();
        session.controller_change(74, 127);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_record_pads_drive_the_looper() {
        let (mut session, _sink) = session_with_sink();

        session.controller_change(28, 127); // record toggle
        assert_eq!(session.looper().state(), LooperState::Recording);

        session.note_on(60, 100);
        std::thread::sleep(std::time::Duration::from_millis(40));
        session.note_off(60);
        session.controller_change(28, 127);
        assert_eq!(session.looper().state(), LooperState::Playing);

        // Chord events landed in the sealed layer: 3 note-ons + 3 note-offs
        let events = session
            .looper()
            .with_layers(|layers| layers[0].events.len())
            .unwrap();
        assert_eq!(events, 6);

        session.controller_change(31, 127); // clear pad
        assert_eq!(session.looper().state(), LooperState::Idle);
    }

    #[test]
    fn test_unmapped_controller_is_ignored() {
        let (mut session, sink) = session_with_sink();
        sink.clear();
        session.controller_change(99, 127);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_status_snapshot_combines_engine_and_looper() {
        let (mut session, _sink) = session_with_sink();
        session.note_on(60, 100);

        let status = session.status();
        assert_eq!(status.engine.chord_name, "C");
        assert_eq!(status.instrument, "Acoustic Grand Piano");
        assert_eq!(status.looper_state, "idle");
        assert_eq!(status.layers, 0);
        assert_eq!(status.loop_secs, 0.0);
    }

    #[test]
    fn test_volume_knob_routes_to_sound_param() {
        let (mut session, sink) = session_with_sink();
        sink.clear();
        session.controller_change(72, 90);
        assert_eq!(
            sink.commands()[0].1,
            SoundCommand::SetParam {
                param: SoundParam::Volume,
                value: 90
            }
        );
    }
}
