//! Loop recorder with overdub and a background playback scheduler
//!
//! Records timestamped note events into layers and replays the merged layers
//! on a worker thread. Control-path mutations and the scheduler share one
//! mutex, but the scheduler only holds it long enough to snapshot the layer
//! list, so dispatch never blocks recording or undo.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use chordloop_core::{LoopEvent, LoopEventKind, LoopLayer, LooperState};

use crate::sound::SoundSink;

/// Playback channels handed out to layers; live input keeps channel 0
const LAYER_CHANNELS: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
/// Reserved percussion channel; drum events replay here regardless of layer
const DRUM_CHANNEL: u8 = 9;
/// Bounded wait for the scheduler to acknowledge a stop
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LooperError {
    #[error("Playback scheduler failed to stop within {0:?}")]
    SchedulerStuck(Duration),
}

/// Read-only looper status for display collaborators
#[derive(Debug, Clone, Serialize)]
pub struct LooperSnapshot {
    pub state: LooperState,
    pub layers: usize,
    pub loop_secs: f64,
}

struct Shared {
    state: LooperState,
    layers: Vec<LoopLayer>,
    loop_length: Duration,
    record_start: Instant,
    active_layer: Option<LoopLayer>,
}

impl Shared {
    fn open_layer(&mut self, program: u8) {
        self.active_layer = Some(LoopLayer::new(program));
        self.record_start = Instant::now();
    }

    /// Seal the open layer; takes with no events are discarded
    fn seal_layer(&mut self) {
        if let Some(layer) = self.active_layer.take() {
            if !layer.is_empty() {
                self.layers.push(layer);
            }
        }
    }
}

struct PlaybackHandle {
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
    thread: JoinHandle<()>,
}

pub struct Looper {
    shared: Arc<Mutex<Shared>>,
    sound: Arc<dyn SoundSink>,
    playback: Option<PlaybackHandle>,
}

impl Looper {
    pub fn new(sound: Arc<dyn SoundSink>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: LooperState::Idle,
                layers: Vec::new(),
                loop_length: Duration::ZERO,
                record_start: Instant::now(),
                active_layer: None,
            })),
            sound,
            playback: None,
        }
    }

    pub fn state(&self) -> LooperState {
        self.shared.lock().map(|s| s.state).unwrap_or_default()
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    pub fn layer_count(&self) -> usize {
        self.shared.lock().map(|s| s.layers.len()).unwrap_or(0)
    }

    /// Loop length fixed by the first completed take; zero while idle
    pub fn loop_length(&self) -> Duration {
        self.shared
            .lock()
            .map(|s| s.loop_length)
            .unwrap_or(Duration::ZERO)
    }

    pub fn snapshot(&self) -> LooperSnapshot {
        LooperSnapshot {
            state: self.state(),
            layers: self.layer_count(),
            loop_secs: self.loop_length().as_secs_f64(),
        }
    }

    /// Access the sealed layers, e.g. for persistence or tests
    pub fn with_layers<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&[LoopLayer]) -> R,
    {
        self.shared.lock().ok().map(|s| f(&s.layers))
    }

    /// Single record-toggle input. Walks Idle -> Recording -> Playing ->
    /// Overdubbing -> Playing; from Paused it resumes straight into an
    /// overdub. Returns the new state.
    pub fn toggle_record(&mut self, current_program: u8) -> LooperState {
        let mut start_scheduler = false;

        let next = {
            let Ok(mut shared) = self.shared.lock() else {
                return LooperState::Idle;
            };

            match shared.state {
                LooperState::Idle => {
                    shared.open_layer(current_program);
                    shared.state = LooperState::Recording;
                    info!("Recording first loop");
                }
                LooperState::Recording => {
                    let elapsed = shared.record_start.elapsed();
                    shared.seal_layer();
                    shared.loop_length = elapsed;
                    shared.state = LooperState::Playing;
                    start_scheduler = true;
                    info!(loop_secs = elapsed.as_secs_f64(), "Loop recorded, playing");
                }
                LooperState::Playing => {
                    shared.open_layer(current_program);
                    shared.state = LooperState::Overdubbing;
                    info!("Overdubbing");
                }
                LooperState::Overdubbing => {
                    shared.seal_layer();
                    shared.state = LooperState::Playing;
                    // The scheduler exits when the layer list is empty;
                    // restart it now that a layer exists
                    start_scheduler = true;
                    info!(layers = shared.layers.len(), "Layer added");
                }
                LooperState::Paused => {
                    shared.open_layer(current_program);
                    shared.state = LooperState::Overdubbing;
                    start_scheduler = true;
                    info!("Resuming into overdub");
                }
            }
            shared.state
        };

        if start_scheduler {
            self.start_playback();
        }
        next
    }

    /// Play/pause input. Pausing seals any open overdub layer and stops the
    /// scheduler; resuming restarts it.
    pub fn toggle_play_pause(&mut self) -> LooperState {
        let mut scheduler_op = None;

        let next = {
            let Ok(mut shared) = self.shared.lock() else {
                return LooperState::Idle;
            };

            match shared.state {
                LooperState::Playing | LooperState::Overdubbing => {
                    shared.seal_layer();
                    shared.state = LooperState::Paused;
                    scheduler_op = Some(false);
                    info!("Paused");
                }
                LooperState::Paused => {
                    shared.state = LooperState::Playing;
                    scheduler_op = Some(true);
                    info!("Playing");
                }
                _ => {}
            }
            shared.state
        };

        match scheduler_op {
            Some(true) => self.start_playback(),
            Some(false) => self.stop_playback_logged(),
            None => {}
        }
        next
    }

    /// Drop the most recent sealed layer. The looper resets to Idle only
    /// when the last layer goes.
    pub fn undo_layer(&mut self) -> LooperState {
        let mut stop_scheduler = false;

        let next = {
            let Ok(mut shared) = self.shared.lock() else {
                return LooperState::Idle;
            };

            if shared.layers.pop().is_some() {
                info!(remaining = shared.layers.len(), "Undo layer");
                if shared.layers.is_empty() {
                    shared.loop_length = Duration::ZERO;
                    shared.state = LooperState::Idle;
                    stop_scheduler = true;
                    info!("All layers removed");
                }
            }
            shared.state
        };

        if stop_scheduler {
            self.stop_playback_logged();
        }
        next
    }

    /// Discard everything, including any in-progress layer
    pub fn clear(&mut self) -> LooperState {
        {
            let Ok(mut shared) = self.shared.lock() else {
                return LooperState::Idle;
            };
            shared.active_layer = None;
            shared.layers.clear();
            shared.loop_length = Duration::ZERO;
            shared.state = LooperState::Idle;
        }
        self.stop_playback_logged();
        info!("Loop cleared");
        LooperState::Idle
    }

    /// Append an event to the open layer. Ignored unless recording. The
    /// timestamp wraps modulo the loop length once one is fixed, which keeps
    /// overdubbed events phase-aligned with the first take.
    pub fn record_event(
        &self,
        kind: LoopEventKind,
        channel: u8,
        note: u8,
        velocity: u8,
        program: u8,
    ) {
        let Ok(mut shared) = self.shared.lock() else {
            return;
        };

        let mut offset = shared.record_start.elapsed().as_secs_f64();
        let loop_secs = shared.loop_length.as_secs_f64();
        if loop_secs > 0.0 {
            offset %= loop_secs;
        }

        if let Some(layer) = shared.active_layer.as_mut() {
            layer.add(LoopEvent {
                offset_secs: offset,
                kind,
                channel,
                note,
                velocity,
                program,
            });
        }
    }

    fn start_playback(&mut self) {
        let worker_alive = self
            .playback
            .as_ref()
            .is_some_and(|handle| !handle.thread.is_finished());
        if worker_alive {
            return;
        }
        if self.playback.is_some() {
            // Reap a worker that already ran out of work
            self.stop_playback_logged();
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let sound = Arc::clone(&self.sound);

        let thread = thread::spawn(move || {
            playback_loop(shared, sound, stop_rx);
            drop(done_tx);
        });

        self.playback = Some(PlaybackHandle {
            stop_tx,
            done_rx,
            thread,
        });
    }

    /// Stop the scheduler with a bounded join. All playback channels are
    /// silenced whether or not the worker acknowledged in time.
    fn stop_playback(&mut self) -> Result<(), LooperError> {
        let Some(handle) = self.playback.take() else {
            return Ok(());
        };

        drop(handle.stop_tx);
        let result = match handle.done_rx.recv_timeout(STOP_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.thread.join();
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(LooperError::SchedulerStuck(STOP_TIMEOUT)),
        };

        silence_channels(self.sound.as_ref());
        result
    }

    /// A stuck scheduler can keep emitting stray notes; that is fatal for
    /// the session, so it is logged loudly and never retried.
    fn stop_playback_logged(&mut self) {
        if let Err(err) = self.stop_playback() {
            error!(%err, "playback scheduler did not stop");
        }
    }
}

impl Drop for Looper {
    fn drop(&mut self) {
        self.stop_playback_logged();
    }
}

/// One scheduled dispatch within a loop iteration
struct Scheduled {
    event: LoopEvent,
    play_channel: u8,
}

fn playback_loop(shared: Arc<Mutex<Shared>>, sound: Arc<dyn SoundSink>, stop_rx: Receiver<()>) {
    loop {
        let loop_start = Instant::now();

        // Snapshot under the lock, then release it for the whole iteration
        let (layers, loop_length) = {
            let Ok(shared) = shared.lock() else { return };
            (shared.layers.clone(), shared.loop_length)
        };

        if layers.is_empty() || loop_length.is_zero() {
            return;
        }

        // Merge every layer into one timestamp-ascending schedule. The sort
        // is stable, so simultaneous events keep their per-layer order.
        let mut schedule: Vec<Scheduled> = Vec::new();
        for (i, layer) in layers.iter().enumerate() {
            let layer_channel = LAYER_CHANNELS[i % LAYER_CHANNELS.len()];
            for event in &layer.events {
                let play_channel = if event.channel == DRUM_CHANNEL {
                    DRUM_CHANNEL
                } else {
                    layer_channel
                };
                schedule.push(Scheduled {
                    event: *event,
                    play_channel,
                });
            }
        }
        schedule.sort_by(|a, b| {
            a.event
                .offset_secs
                .partial_cmp(&b.event.offset_secs)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Prime each layer channel with its layer's instrument
        let mut channel_programs: HashMap<u8, u8> = HashMap::new();
        for (i, layer) in layers.iter().enumerate() {
            let channel = LAYER_CHANNELS[i % LAYER_CHANNELS.len()];
            if channel_programs.get(&channel) != Some(&layer.program) {
                sound.program_select(channel, layer.program);
                channel_programs.insert(channel, layer.program);
            }
        }

        for item in &schedule {
            if cancelled(&stop_rx) {
                silence_channels(sound.as_ref());
                return;
            }

            let target = loop_start + Duration::from_secs_f64(item.event.offset_secs);
            let now = Instant::now();
            if target > now && wait_cancelled(&stop_rx, target - now) {
                silence_channels(sound.as_ref());
                return;
            }

            // Melodic channels follow the event's recorded program; drums
            // play as-is on the percussion channel
            if item.play_channel != DRUM_CHANNEL
                && channel_programs.get(&item.play_channel) != Some(&item.event.program)
            {
                sound.program_select(item.play_channel, item.event.program);
                channel_programs.insert(item.play_channel, item.event.program);
            }

            match item.event.kind {
                LoopEventKind::NoteOn => {
                    sound.note_on(item.play_channel, item.event.note, item.event.velocity)
                }
                LoopEventKind::NoteOff => sound.note_off(item.play_channel, item.event.note),
            }
        }

        // Pad out the loop remainder, then silence before the next pass so
        // held notes don't bleed across the seam
        let elapsed = loop_start.elapsed();
        if elapsed < loop_length && wait_cancelled(&stop_rx, loop_length - elapsed) {
            silence_channels(sound.as_ref());
            return;
        }
        silence_channels(sound.as_ref());
    }
}

/// Non-blocking cancellation check
fn cancelled(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

/// Sleep that wakes immediately on cancellation; true if cancelled
fn wait_cancelled(stop_rx: &Receiver<()>, wait: Duration) -> bool {
    !matches!(stop_rx.recv_timeout(wait), Err(RecvTimeoutError::Timeout))
}

fn silence_channels(sound: &dyn SoundSink) {
    for channel in LAYER_CHANNELS {
        sound.all_notes_off(channel);
    }
    sound.all_notes_off(DRUM_CHANNEL);
}
