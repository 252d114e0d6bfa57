//! Timed replay of entered sequences.
//!
//! A session walks a precomputed [`Playlist`] and is advanced one transition
//! at a time through [`PlaybackSession::tick`]. Every step says how long the
//! caller should wait before the next tick, so the session can be driven by a
//! real timer, a test harness or virtual time.

use std::time::Duration;

use crate::{
    config::{BASE_DELAY_MS, FLASH_MS},
    Mode,
};

/// One value to replay and the track it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackItem {
    pub sequence_index: usize,
    pub value: String,
}

pub type Playlist = Vec<PlaybackItem>;

/// Interleaves `sequences` in chunks of `chunk_size`: up to `chunk_size`
/// items from track 0, then from track 1, and so on, before moving to the
/// next chunk. Exhausted tracks simply stop contributing.
pub fn build_playlist(sequences: &[Vec<String>], chunk_size: usize) -> Playlist {
    let chunk_size = chunk_size.max(1);
    let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
    let chunks = max_len.div_ceil(chunk_size);

    let mut playlist = Playlist::with_capacity(sequences.iter().map(Vec::len).sum());
    for chunk in 0..chunks {
        let start = chunk * chunk_size;
        for (sequence_index, sequence) in sequences.iter().enumerate() {
            let end = (start + chunk_size).min(sequence.len());
            if start >= end {
                continue;
            }
            playlist.extend(sequence[start..end].iter().map(|value| PlaybackItem {
                sequence_index,
                value: value.clone(),
            }));
        }
    }
    playlist
}

fn micros(millis: f64) -> Duration {
    Duration::from_micros((millis * 1000.0).round() as u64)
}

/// Per-item durations of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// How long an item stays highlighted.
    pub flash: Duration,
    /// Time from the start of one item to the start of the next.
    pub pause: Duration,
    /// Added to the pause when the next item belongs to another track.
    pub inter_sequence_delay: Duration,
}

impl PlaybackTiming {
    /// Timing of `mode` at the given speed multiplier.
    pub fn for_mode(mode: Mode, speed: f32, inter_sequence_delay: Duration) -> Self {
        let speed = if speed > 0.0 { speed } else { 1.0 };
        let pause = micros(BASE_DELAY_MS as f64 / speed as f64);
        let flash = match mode {
            Mode::Piano => micros(BASE_DELAY_MS as f64 * 0.8 / speed as f64),
            Mode::Bananas | Mode::Rounds15 if speed > 1.0 => {
                micros(FLASH_MS as f64 / speed as f64)
            }
            Mode::Bananas | Mode::Rounds15 => Duration::from_millis(FLASH_MS),
        };
        Self {
            flash,
            pause,
            inter_sequence_delay,
        }
    }

    /// Wait between the end of an item's highlight and the next item.
    fn gap(&self, switches_track: bool) -> Duration {
        let gap = self.pause.saturating_sub(self.flash);
        if switches_track {
            gap + self.inter_sequence_delay
        } else {
            gap
        }
    }
}

/// Transition produced by one [`PlaybackSession::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Highlight and narrate the item at `position`, then tick again after
    /// `next_tick`.
    Show {
        position: usize,
        item: PlaybackItem,
        next_tick: Duration,
    },
    /// Remove the highlight of the item at `position`, then tick again after
    /// `next_tick`.
    Hide {
        position: usize,
        item: PlaybackItem,
        next_tick: Duration,
    },
    /// The playlist is exhausted.
    Finished,
}

impl PlaybackStep {
    /// Delay before the next tick, `None` once the session finished.
    pub fn next_tick(&self) -> Option<Duration> {
        match self {
            PlaybackStep::Show { next_tick, .. } | PlaybackStep::Hide { next_tick, .. } => {
                Some(*next_tick)
            }
            PlaybackStep::Finished => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Showing(usize),
    Waiting(usize),
    Done,
}

/// One run of the scheduler from start to exhaustion.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    playlist: Playlist,
    timing: PlaybackTiming,
    phase: Phase,
}

impl PlaybackSession {
    pub fn new(playlist: Playlist, timing: PlaybackTiming) -> Self {
        Self {
            playlist,
            timing,
            phase: Phase::Ready,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Item currently highlighted, if any.
    pub fn current(&self) -> Option<(usize, &PlaybackItem)> {
        match self.phase {
            Phase::Showing(position) => {
                self.playlist.get(position).map(|item| (position, item))
            }
            _ => None,
        }
    }

    /// Index of the item shown last, kept through the pause that follows it.
    pub fn position(&self) -> Option<usize> {
        match self.phase {
            Phase::Showing(position) | Phase::Waiting(position) => Some(position),
            Phase::Ready | Phase::Done => None,
        }
    }

    /// Advances the session by one transition.
    pub fn tick(&mut self) -> PlaybackStep {
        let next = match self.phase {
            Phase::Ready => 0,
            Phase::Showing(position) => {
                let item = self.playlist[position].clone();
                let switches_track = self
                    .playlist
                    .get(position + 1)
                    .is_some_and(|next| next.sequence_index != item.sequence_index);
                self.phase = Phase::Waiting(position);
                return PlaybackStep::Hide {
                    position,
                    item,
                    next_tick: self.timing.gap(switches_track),
                };
            }
            Phase::Waiting(position) => position + 1,
            Phase::Done => return PlaybackStep::Finished,
        };

        match self.playlist.get(next) {
            Some(item) => {
                self.phase = Phase::Showing(next);
                PlaybackStep::Show {
                    position: next,
                    item: item.clone(),
                    next_tick: self.timing.flash,
                }
            }
            None => {
                self.phase = Phase::Done;
                PlaybackStep::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn order(playlist: &Playlist) -> Vec<(usize, &str)> {
        playlist
            .iter()
            .map(|item| (item.sequence_index, item.value.as_str()))
            .collect()
    }

    #[test]
    fn interleaves_chunks_of_unequal_tracks() {
        let sequences = vec![seq(&["a0", "a1", "a2", "a3", "a4"]), seq(&["b0", "b1", "b2"])];
        let playlist = build_playlist(&sequences, 2);

        assert_eq!(
            order(&playlist),
            vec![
                (0, "a0"),
                (0, "a1"),
                (1, "b0"),
                (1, "b1"),
                (0, "a2"),
                (0, "a3"),
                (1, "b2"),
                (0, "a4"),
            ]
        );
    }

    #[test]
    fn single_track_plays_in_order() {
        let playlist = build_playlist(&[seq(&["3", "1", "4"])], 3);
        assert_eq!(order(&playlist), vec![(0, "3"), (0, "1"), (0, "4")]);
    }

    #[test]
    fn empty_tracks_produce_empty_playlist() {
        assert!(build_playlist(&[Vec::new(), Vec::new()], 3).is_empty());
        assert!(build_playlist(&[], 3).is_empty());
    }

    #[test]
    fn timing_scales_with_speed() {
        let base = PlaybackTiming::for_mode(Mode::Bananas, 1.0, Duration::ZERO);
        assert_eq!(base.pause, Duration::from_millis(798));
        assert_eq!(base.flash, Duration::from_millis(250));

        let fast = PlaybackTiming::for_mode(Mode::Rounds15, 1.25, Duration::ZERO);
        assert_eq!(fast.flash, Duration::from_millis(200));
        assert!(fast.pause < base.pause);

        let slow = PlaybackTiming::for_mode(Mode::Bananas, 0.5, Duration::ZERO);
        assert_eq!(slow.flash, Duration::from_millis(250));
        assert_eq!(slow.pause, Duration::from_millis(1596));

        let piano = PlaybackTiming::for_mode(Mode::Piano, 1.0, Duration::ZERO);
        assert_eq!(piano.flash, Duration::from_micros(638_400));
    }

    #[test]
    fn session_alternates_show_and_hide() {
        let timing = PlaybackTiming {
            flash: Duration::from_millis(100),
            pause: Duration::from_millis(300),
            inter_sequence_delay: Duration::from_millis(50),
        };
        let playlist = build_playlist(&[seq(&["1", "2"]), seq(&["3"])], 2);
        let mut session = PlaybackSession::new(playlist, timing);

        let steps: Vec<PlaybackStep> = std::iter::from_fn(|| {
            let step = session.tick();
            (step != PlaybackStep::Finished).then_some(step)
        })
        .collect();

        let delays: Vec<Duration> = steps.iter().filter_map(PlaybackStep::next_tick).collect();
        assert_eq!(
            delays,
            vec![100, 200, 100, 250, 100, 200]
                .into_iter()
                .map(Duration::from_millis)
                .collect::<Vec<_>>()
        );
        assert!(matches!(steps[0], PlaybackStep::Show { position: 0, .. }));
        assert!(matches!(steps[5], PlaybackStep::Hide { position: 2, .. }));
        assert!(session.is_finished());
        assert_eq!(session.tick(), PlaybackStep::Finished);
    }

    #[test]
    fn current_reports_highlighted_item() {
        let timing = PlaybackTiming::for_mode(Mode::Bananas, 1.0, Duration::ZERO);
        let mut session = PlaybackSession::new(build_playlist(&[seq(&["7"])], 1), timing);
        assert!(session.current().is_none());
        session.tick();
        assert_eq!(
            session
                .current()
                .map(|(position, item)| (position, item.value.as_str())),
            Some((0, "7"))
        );
        session.tick();
        assert!(session.current().is_none());
    }

    #[test]
    fn position_survives_the_pause_after_an_item() {
        let timing = PlaybackTiming::for_mode(Mode::Bananas, 1.0, Duration::ZERO);
        let playlist = build_playlist(&[seq(&["4", "5"])], 1);
        let mut session = PlaybackSession::new(playlist, timing);
        assert_eq!(session.position(), None);

        session.tick();
        assert_eq!(session.position(), Some(0));
        session.tick();
        assert!(session.current().is_none());
        assert_eq!(session.position(), Some(0));
        session.tick();
        assert_eq!(session.position(), Some(1));
        session.tick();
        session.tick();
        assert_eq!(session.position(), None);
    }
}
