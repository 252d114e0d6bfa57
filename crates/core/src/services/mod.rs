use std::time::Duration;

use crate::Result;

/// Text-to-speech collaborator. Calls are fire-and-forget from the
/// trainer's point of view; returned errors are logged and dropped.
pub trait Narrator {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Vibration collaborator, same contract as [`Narrator`].
pub trait Haptics {
    fn vibrate(&mut self, duration: Duration) -> Result<()>;
}

/// Stand-in for platforms without speech output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Narrator for Silent {
    fn speak(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

impl Haptics for Silent {
    fn vibrate(&mut self, _duration: Duration) -> Result<()> {
        Ok(())
    }
}

/// Text narrated after a speed change, e.g. `125% speed`.
pub fn speed_announcement(multiplier: f32) -> String {
    format!("{}% speed", (multiplier * 100.0).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_services_accept_everything() {
        let mut silent = Silent;
        assert!(silent.speak("C").is_ok());
        assert!(silent.vibrate(Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn announces_rounded_percentage() {
        assert_eq!(speed_announcement(1.1), "110% speed");
        assert_eq!(speed_announcement(0.5), "50% speed");
    }
}
