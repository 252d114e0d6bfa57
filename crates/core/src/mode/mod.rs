use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{FollowMeError, Result};

/// Longest sequence a bananas track may hold.
pub const BANANAS_MAX_LEN: usize = 25;
/// Longest sequence the piano mode may hold.
pub const PIANO_MAX_LEN: usize = 20;
/// Number of rounds in the escalating challenge.
pub const ROUNDS15_MAX_ROUND: u32 = 15;

/// Practice activity. Each mode owns an independent sequence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Number tracks, one to four of them. Older data stored the multi-track
    /// variant as `follows`.
    #[serde(alias = "follows")]
    Bananas,
    /// Note letters and octave digits on a single track.
    Piano,
    /// Fifteen rounds where round `n` takes exactly `n` values.
    Rounds15,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Bananas, Mode::Piano, Mode::Rounds15];

    /// Key used for this mode in the persisted state document.
    pub fn key(self) -> &'static str {
        match self {
            Mode::Bananas => "bananas",
            Mode::Piano => "piano",
            Mode::Rounds15 => "rounds15",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Bananas => "Bananas",
            Mode::Piano => "piano",
            Mode::Rounds15 => "15 rounds",
        }
    }

    /// Returns `true` when `token` belongs to this mode's input alphabet.
    pub fn accepts(self, token: &str) -> bool {
        match self {
            Mode::Bananas => matches!(token.parse::<u8>(), Ok(1..=9)) && token.len() == 1,
            Mode::Piano => {
                matches!(token, "A" | "B" | "C" | "D" | "E" | "F" | "G")
                    || (matches!(token.parse::<u8>(), Ok(1..=5)) && token.len() == 1)
            }
            Mode::Rounds15 => match token.parse::<u8>() {
                Ok(value @ 1..=12) => token == value.to_string(),
                _ => false,
            },
        }
    }

    /// Fixed length ceiling, if the mode has one. Rounds15 is bounded by the
    /// current round instead.
    pub fn fixed_ceiling(self) -> Option<usize> {
        match self {
            Mode::Bananas => Some(BANANAS_MAX_LEN),
            Mode::Piano => Some(PIANO_MAX_LEN),
            Mode::Rounds15 => None,
        }
    }

    /// Whether the mode lets the user choose more than one track.
    pub fn supports_multiple_tracks(self) -> bool {
        matches!(self, Mode::Bananas)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Mode {
    type Err = FollowMeError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bananas" | "follows" => Ok(Mode::Bananas),
            "piano" => Ok(Mode::Piano),
            "rounds15" | "rounds" | "15" => Ok(Mode::Rounds15),
            other => Err(FollowMeError::msg(format!("unknown mode `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabets_follow_mode() {
        assert!(Mode::Bananas.accepts("9"));
        assert!(!Mode::Bananas.accepts("0"));
        assert!(!Mode::Bananas.accepts("10"));
        assert!(!Mode::Bananas.accepts("C"));

        assert!(Mode::Piano.accepts("C"));
        assert!(Mode::Piano.accepts("5"));
        assert!(!Mode::Piano.accepts("6"));
        assert!(!Mode::Piano.accepts("c"));

        assert!(Mode::Rounds15.accepts("12"));
        assert!(Mode::Rounds15.accepts("1"));
        assert!(!Mode::Rounds15.accepts("13"));
        assert!(!Mode::Rounds15.accepts("07"));
    }

    #[test]
    fn legacy_follows_maps_to_bananas() {
        let mode: Mode = serde_json::from_str("\"follows\"").unwrap();
        assert_eq!(mode, Mode::Bananas);
        assert_eq!("follows".parse::<Mode>().unwrap(), Mode::Bananas);
        assert_eq!(serde_json::to_string(&Mode::Rounds15).unwrap(), "\"rounds15\"");
    }

    #[test]
    fn rejects_unknown_mode_names() {
        let err = "drums".parse::<Mode>().unwrap_err();
        assert!(format!("{err}").contains("drums"));
    }
}
