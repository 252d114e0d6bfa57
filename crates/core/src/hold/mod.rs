//! Press-and-hold delete.
//!
//! `Idle -> ArmedWaiting` on press, `ArmedWaiting -> Repeating` once the
//! initial delay elapses, back to `Idle` on release. Undos performed while
//! the button is down are not persisted individually; the release reports a
//! single save for the whole gesture.

use std::time::Duration;

use crate::config::{SPEED_DELETE_INITIAL_DELAY, SPEED_DELETE_INTERVAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldState {
    #[default]
    Idle,
    ArmedWaiting,
    Repeating,
}

/// Inputs of the hold machine: pointer events and its own timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldInput {
    /// Button pressed. `allowed` is the result of the caller's guard check
    /// (feature enabled, no playback running).
    Press { allowed: bool },
    /// The initial delay timer fired.
    DelayElapsed,
    /// The repeat timer fired.
    RepeatTick,
    /// Button released.
    Release,
    /// Pointer left the button; stops without the click fallback.
    Cancel,
}

/// What the owner has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoldEffect {
    /// Perform one unpersisted undo.
    pub undo: bool,
    /// Fire the next timer input after this delay.
    pub next_timer: Option<Duration>,
    /// Write state to storage once.
    pub persist: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HoldToDelete {
    state: HoldState,
}

impl HoldToDelete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn is_held(&self) -> bool {
        self.state != HoldState::Idle
    }

    /// Single transition function of the machine.
    pub fn handle(&mut self, input: HoldInput) -> HoldEffect {
        match (self.state, input) {
            (_, HoldInput::Press { allowed }) => {
                if !allowed {
                    self.state = HoldState::Idle;
                    return HoldEffect::default();
                }
                self.state = HoldState::ArmedWaiting;
                HoldEffect {
                    undo: true,
                    next_timer: Some(SPEED_DELETE_INITIAL_DELAY),
                    persist: false,
                }
            }
            (HoldState::ArmedWaiting, HoldInput::DelayElapsed)
            | (HoldState::Repeating, HoldInput::RepeatTick) => {
                self.state = HoldState::Repeating;
                HoldEffect {
                    undo: true,
                    next_timer: Some(SPEED_DELETE_INTERVAL),
                    persist: false,
                }
            }
            (
                HoldState::ArmedWaiting | HoldState::Repeating,
                HoldInput::Release | HoldInput::Cancel,
            ) => {
                self.state = HoldState::Idle;
                HoldEffect {
                    persist: true,
                    ..HoldEffect::default()
                }
            }
            // Stale timers and releases without a matching press.
            _ => HoldEffect::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_click_undoes_once_and_persists_on_release() {
        let mut hold = HoldToDelete::new();
        let press = hold.handle(HoldInput::Press { allowed: true });
        assert!(press.undo);
        assert!(!press.persist);
        assert_eq!(press.next_timer, Some(SPEED_DELETE_INITIAL_DELAY));
        assert_eq!(hold.state(), HoldState::ArmedWaiting);

        let release = hold.handle(HoldInput::Release);
        assert!(!release.undo);
        assert!(release.persist);
        assert_eq!(hold.state(), HoldState::Idle);
    }

    #[test]
    fn held_press_repeats_until_release() {
        let mut hold = HoldToDelete::new();
        hold.handle(HoldInput::Press { allowed: true });

        let first = hold.handle(HoldInput::DelayElapsed);
        assert!(first.undo);
        assert_eq!(first.next_timer, Some(SPEED_DELETE_INTERVAL));
        assert_eq!(hold.state(), HoldState::Repeating);

        let tick = hold.handle(HoldInput::RepeatTick);
        assert!(tick.undo && !tick.persist);

        assert!(hold.handle(HoldInput::Release).persist);
        assert_eq!(hold.handle(HoldInput::RepeatTick), HoldEffect::default());
    }

    #[test]
    fn refused_press_does_nothing() {
        let mut hold = HoldToDelete::new();
        assert_eq!(hold.handle(HoldInput::Press { allowed: false }), HoldEffect::default());
        assert_eq!(hold.handle(HoldInput::Release), HoldEffect::default());
        assert!(!hold.is_held());
    }

    #[test]
    fn stale_delay_is_ignored_after_release() {
        let mut hold = HoldToDelete::new();
        hold.handle(HoldInput::Press { allowed: true });
        hold.handle(HoldInput::Cancel);
        assert_eq!(hold.handle(HoldInput::DelayElapsed), HoldEffect::default());
        assert_eq!(hold.state(), HoldState::Idle);
    }
}
