//! Core library for the Follow Me sequence-memorization trainer.
//!
//! The crate holds everything below the presentation layer: per-mode sequence
//! state, the playback scheduler and press-and-hold delete state machines,
//! settings and their persistence, and the [`Trainer`] that wires them
//! together. Timers are modelled as a virtual [`Timeline`] so a front end,
//! a test or a simulation can drive the same code.

pub mod config;
pub mod controller;
pub mod error;
pub mod hold;
pub mod mode;
pub mod playback;
pub mod render;
pub mod sequence;
pub mod services;
pub mod store;
pub mod timeline;

pub use config::{Feature, Settings};
pub use controller::{
    Guard, Notice, Outcome, PlaybackStatus, SpeedAdjust, Trainer, TrainerEvent, Trigger,
};
pub use error::{FollowMeError, Result};
pub use hold::{HoldState, HoldToDelete};
pub use mode::Mode;
pub use playback::{build_playlist, PlaybackItem, PlaybackSession, PlaybackStep, PlaybackTiming};
pub use render::Frame;
pub use sequence::{ModeStates, SequenceState};
pub use services::{Haptics, Narrator, Silent};
pub use store::{FileStorage, MemoryStorage, PersistentStore, Storage};
pub use timeline::{PlaybackClock, Timeline, TimerId};
