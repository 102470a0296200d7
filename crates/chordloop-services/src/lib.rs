//! chordloop-services: Loop scheduling, sound routing, and the control path

pub mod looper;
pub mod session;
pub mod sound;

pub use looper::{Looper, LooperError, LooperSnapshot};
pub use session::{Session, StatusSnapshot};
pub use sound::{ChannelSound, NullSound, SoundCommand, SoundParam, SoundSink};
