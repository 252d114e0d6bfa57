use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{FollowMeError, Mode, Result};

/// Number of track slots every sequence state carries.
pub const MAX_SEQUENCES: usize = 4;
/// Pause between two played items at a speed multiplier of 1.0.
pub const BASE_DELAY_MS: u64 = 798;
/// Hold time before press-and-hold delete starts repeating.
pub const SPEED_DELETE_INITIAL_DELAY: Duration = Duration::from_millis(250);
/// Repeat period of press-and-hold delete and the rounds15 clear.
pub const SPEED_DELETE_INTERVAL: Duration = Duration::from_millis(10);
/// Deferral between an append and the autoplay it triggers.
pub const AUTOPLAY_DEFER: Duration = Duration::from_millis(100);
/// Wait between the end of a rounds15 playback and its auto-clear.
pub const ROUNDS15_CLEAR_DELAY: Duration = Duration::from_millis(300);
/// Highlight window of a played number before speed scaling.
pub const FLASH_MS: u64 = 250;

pub const MIN_MULTIPLIER: f32 = 0.5;
pub const MAX_MULTIPLIER: f32 = 1.5;

/// Clamps a speed or scale multiplier into the accepted range.
pub fn clamp_multiplier(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
}

fn percent(multiplier: f32) -> i32 {
    (multiplier * 100.0).round() as i32
}

/// Display label of a playback speed, e.g. `125% (Fast)`.
pub fn speed_label(multiplier: f32) -> String {
    let percent = percent(multiplier);
    let suffix = match percent {
        100 => "Base",
        p if p > 100 => "Fast",
        _ => "Slow",
    };
    format!("{percent}% ({suffix})")
}

/// Display label of the UI scale, e.g. `75% (Small)`.
pub fn scale_label(multiplier: f32) -> String {
    let percent = percent(multiplier);
    let suffix = match percent {
        100 => "Base",
        p if p > 100 => "Large",
        _ => "Small",
    };
    format!("{percent}% ({suffix})")
}

/// Process-wide options, persisted as a flat JSON map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "isDarkMode")]
    pub dark_mode: bool,
    #[serde(rename = "bananasSpeedMultiplier")]
    pub bananas_speed: f32,
    #[serde(rename = "pianoSpeedMultiplier")]
    pub piano_speed: f32,
    #[serde(rename = "rounds15SpeedMultiplier")]
    pub rounds15_speed: f32,
    #[serde(rename = "uiScaleMultiplier")]
    pub ui_scale: f32,
    #[serde(rename = "isSpeedDeletingEnabled")]
    pub speed_delete: bool,
    #[serde(rename = "isPianoAutoplayEnabled")]
    pub piano_autoplay: bool,
    #[serde(rename = "isBananasAutoplayEnabled")]
    pub bananas_autoplay: bool,
    #[serde(rename = "isRounds15ClearAfterPlaybackEnabled")]
    pub rounds15_clear_after_playback: bool,
    #[serde(rename = "isAudioPlaybackEnabled")]
    pub audio: bool,
    #[serde(rename = "isVoiceInputEnabled")]
    pub voice_input: bool,
    #[serde(rename = "areSlidersLocked")]
    pub sliders_locked: bool,
    #[serde(rename = "followsChunkSize")]
    pub chunk_size: usize,
    /// Extra pause, in milliseconds, when playback moves to another track.
    #[serde(rename = "followsInterSequenceDelay")]
    pub inter_sequence_delay_ms: u64,
    #[serde(rename = "currentMode")]
    pub current_mode: Mode,
    #[serde(rename = "isHapticsEnabled")]
    pub haptics: bool,
    #[serde(rename = "showWelcomeScreen")]
    pub show_welcome: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            bananas_speed: 1.0,
            piano_speed: 1.0,
            rounds15_speed: 1.0,
            ui_scale: 1.0,
            speed_delete: true,
            piano_autoplay: true,
            bananas_autoplay: true,
            rounds15_clear_after_playback: true,
            audio: true,
            voice_input: true,
            sliders_locked: true,
            chunk_size: 3,
            inter_sequence_delay_ms: 500,
            current_mode: Mode::Bananas,
            haptics: true,
            show_welcome: true,
        }
    }
}

impl Settings {
    /// Keys written by earlier versions that are dropped on load.
    pub const RETIRED_KEYS: &'static [&'static str] = &["isFollowsAutoplayEnabled"];

    /// Playback speed multiplier of the given mode.
    pub fn speed(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Bananas => self.bananas_speed,
            Mode::Piano => self.piano_speed,
            Mode::Rounds15 => self.rounds15_speed,
        }
    }

    /// Stores a clamped speed multiplier for the given mode and returns it.
    pub fn set_speed(&mut self, mode: Mode, multiplier: f32) -> f32 {
        let multiplier = clamp_multiplier(multiplier);
        match mode {
            Mode::Bananas => self.bananas_speed = multiplier,
            Mode::Piano => self.piano_speed = multiplier,
            Mode::Rounds15 => self.rounds15_speed = multiplier,
        }
        multiplier
    }

    pub fn inter_sequence_delay(&self) -> Duration {
        Duration::from_millis(self.inter_sequence_delay_ms)
    }

    /// Brings values edited by hand or written by older builds back into range.
    pub fn normalize(&mut self) {
        self.bananas_speed = clamp_multiplier(self.bananas_speed);
        self.piano_speed = clamp_multiplier(self.piano_speed);
        self.rounds15_speed = clamp_multiplier(self.rounds15_speed);
        self.ui_scale = clamp_multiplier(self.ui_scale);
        self.chunk_size = self.chunk_size.max(1);
    }
}

/// Boolean options that can be flipped from the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    DarkMode,
    SpeedDelete,
    PianoAutoplay,
    BananasAutoplay,
    Rounds15ClearAfterPlayback,
    Audio,
    VoiceInput,
    SliderLock,
    Haptics,
    WelcomeScreen,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::DarkMode,
        Feature::SpeedDelete,
        Feature::PianoAutoplay,
        Feature::BananasAutoplay,
        Feature::Rounds15ClearAfterPlayback,
        Feature::Audio,
        Feature::VoiceInput,
        Feature::SliderLock,
        Feature::Haptics,
        Feature::WelcomeScreen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::DarkMode => "dark-mode",
            Feature::SpeedDelete => "speed-delete",
            Feature::PianoAutoplay => "piano-autoplay",
            Feature::BananasAutoplay => "bananas-autoplay",
            Feature::Rounds15ClearAfterPlayback => "rounds15-clear",
            Feature::Audio => "audio",
            Feature::VoiceInput => "voice-input",
            Feature::SliderLock => "slider-lock",
            Feature::Haptics => "haptics",
            Feature::WelcomeScreen => "welcome",
        }
    }

    pub fn get(self, settings: &Settings) -> bool {
        match self {
            Feature::DarkMode => settings.dark_mode,
            Feature::SpeedDelete => settings.speed_delete,
            Feature::PianoAutoplay => settings.piano_autoplay,
            Feature::BananasAutoplay => settings.bananas_autoplay,
            Feature::Rounds15ClearAfterPlayback => settings.rounds15_clear_after_playback,
            Feature::Audio => settings.audio,
            Feature::VoiceInput => settings.voice_input,
            Feature::SliderLock => settings.sliders_locked,
            Feature::Haptics => settings.haptics,
            Feature::WelcomeScreen => settings.show_welcome,
        }
    }

    pub fn set(self, settings: &mut Settings, enabled: bool) {
        let flag = match self {
            Feature::DarkMode => &mut settings.dark_mode,
            Feature::SpeedDelete => &mut settings.speed_delete,
            Feature::PianoAutoplay => &mut settings.piano_autoplay,
            Feature::BananasAutoplay => &mut settings.bananas_autoplay,
            Feature::Rounds15ClearAfterPlayback => &mut settings.rounds15_clear_after_playback,
            Feature::Audio => &mut settings.audio,
            Feature::VoiceInput => &mut settings.voice_input,
            Feature::SliderLock => &mut settings.sliders_locked,
            Feature::Haptics => &mut settings.haptics,
            Feature::WelcomeScreen => &mut settings.show_welcome,
        };
        *flag = enabled;
    }
}

impl FromStr for Feature {
    type Err = FollowMeError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim().to_ascii_lowercase();
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == value)
            .ok_or_else(|| FollowMeError::msg(format!("unknown feature `{value}`")))
    }
}
