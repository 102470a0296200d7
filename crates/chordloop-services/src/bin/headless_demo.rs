//! Headless smoke run: scripted chords and a short loop against the
//! logging sink. Run with `RUST_LOG=debug` to watch every dispatched note.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use chordloop_core::{ChordConfig, ControlMap};
use chordloop_services::{NullSound, Session};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut session = Session::new(
        &ChordConfig::default(),
        ControlMap::default(),
        Arc::new(NullSound),
    );

    // A I-vi-IV-V progression from single keys
    for note in [60u8, 69, 65, 67] {
        session.note_on(note, 100);
        thread::sleep(Duration::from_millis(300));
        session.note_off(note);
    }

    // Record a two-chord loop, let it cycle twice, then tear it down
    session.controller_change(28, 127); // record toggle
    session.note_on(60, 100);
    thread::sleep(Duration::from_millis(400));
    session.note_off(60);
    session.note_on(67, 100);
    thread::sleep(Duration::from_millis(400));
    session.note_off(67);
    session.controller_change(28, 127); // seal, playback starts

    thread::sleep(Duration::from_millis(1700));

    session.controller_change(29, 127); // pause
    session.controller_change(31, 127); // clear

    println!("{:#?}", session.status());
    Ok(())
}
