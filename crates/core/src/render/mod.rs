use std::fmt;

use crate::{
    config::{scale_label, speed_label},
    store::Storage,
    Mode, Trainer,
};

/// Glyph of the demo button while no playback runs.
pub const IDLE_GLYPH: &str = "▶";

/// Snapshot of what the presentation layer draws for the active mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub mode: Mode,
    pub sequences: Vec<Vec<String>>,
    /// Track lit up by the playback in progress.
    pub highlighted: Option<usize>,
    /// `(current, max)` for rounds15.
    pub round: Option<(u32, u32)>,
    pub demo_glyph: String,
    pub entry_enabled: bool,
    pub undo_enabled: bool,
    pub speed: f32,
    pub ui_scale: f32,
    pub dark_mode: bool,
}

impl Frame {
    pub fn capture<S: Storage>(trainer: &Trainer<S>) -> Self {
        let mode = trainer.mode();
        let state = trainer.active_state();
        let settings = trainer.settings();
        let round = state
            .current_round
            .zip(state.max_round)
            .filter(|_| mode == Mode::Rounds15);

        Self {
            mode,
            sequences: state.active().to_vec(),
            highlighted: trainer.highlighted_track(mode),
            round,
            demo_glyph: trainer
                .demo_progress(mode)
                .map(|position| position.to_string())
                .unwrap_or_else(|| IDLE_GLYPH.to_string()),
            entry_enabled: trainer.is_entry_enabled(mode),
            undo_enabled: trainer.is_undo_enabled(mode),
            speed: settings.speed(mode),
            ui_scale: settings.ui_scale,
            dark_mode: settings.dark_mode,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.mode.label())?;
        if let Some((current, max)) = self.round {
            write!(f, " Round {current} / {max}")?;
        }
        writeln!(
            f,
            "  speed {}  scale {}  demo {}",
            speed_label(self.speed),
            scale_label(self.ui_scale),
            self.demo_glyph
        )?;

        for (index, sequence) in self.sequences.iter().enumerate() {
            let marker = if self.highlighted == Some(index) { '*' } else { ' ' };
            writeln!(f, "{marker}{}: {}", index + 1, sequence.join(" "))?;
        }

        if !self.entry_enabled {
            writeln!(f, "  (input locked)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AUTOPLAY_DEFER, store::MemoryStorage, Feature};

    #[test]
    fn captures_rounds_indicator_and_idle_glyph() {
        let mut trainer = Trainer::load(MemoryStorage::new());
        trainer.switch_mode(Mode::Rounds15);
        let frame = Frame::capture(&trainer);

        assert_eq!(frame.round, Some((1, 15)));
        assert_eq!(frame.demo_glyph, IDLE_GLYPH);
        assert_eq!(frame.sequences.len(), 1);
        assert!(format!("{frame}").contains("Round 1 / 15"));
    }

    #[test]
    fn shows_progress_and_highlight_during_playback() {
        let mut trainer = Trainer::load(MemoryStorage::new());
        trainer.set_sequence_count(2);
        trainer.append("3");
        trainer.append("4");
        trainer.advance(AUTOPLAY_DEFER);

        let frame = Frame::capture(&trainer);
        assert_eq!(frame.demo_glyph, "1");
        assert_eq!(frame.highlighted, Some(0));
        assert!(!frame.entry_enabled);
        assert_eq!(frame.round, None);

        let text = format!("{frame}");
        assert!(text.contains("*1: 3"));
        assert!(text.contains("(input locked)"));
    }

    #[test]
    fn renders_settings_labels() {
        let mut trainer = Trainer::load(MemoryStorage::new());
        trainer.toggle(Feature::SliderLock);
        trainer.slide_ui_scale(0.75);
        let text = format!("{}", Frame::capture(&trainer));
        assert!(text.contains("speed 100% (Base)"));
        assert!(text.contains("scale 75% (Small)"));
    }
}
