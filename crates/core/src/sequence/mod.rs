use serde::{Deserialize, Serialize};

use crate::{config::MAX_SEQUENCES, mode::ROUNDS15_MAX_ROUND, Mode};

/// Why a push or pop on a [`SequenceState`] did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceGuard {
    /// No track is active.
    NoActiveSequences,
    /// The receiving track is at its length ceiling.
    CeilingReached,
    /// Nothing has been entered yet.
    NothingToUndo,
    /// The track that would be popped is already empty.
    TargetEmpty,
}

/// Per-mode entered data.
///
/// `sequences` always carries [`MAX_SEQUENCES`] slots; only the first
/// `sequence_count` of them are active. `next_sequence_index` selects the
/// receiving track round-robin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceState {
    pub sequences: Vec<Vec<String>>,
    pub sequence_count: usize,
    pub next_sequence_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_round: Option<u32>,
}

impl SequenceState {
    /// First-run state of the given mode.
    pub fn initial(mode: Mode) -> Self {
        let (current_round, max_round) = match mode {
            Mode::Rounds15 => (Some(1), Some(ROUNDS15_MAX_ROUND)),
            _ => (None, None),
        };
        Self {
            sequences: vec![Vec::new(); MAX_SEQUENCES],
            sequence_count: 1,
            next_sequence_index: 0,
            current_round,
            max_round,
        }
    }

    /// The tracks that are rendered and played.
    pub fn active(&self) -> &[Vec<String>] {
        let count = self.sequence_count.min(self.sequences.len());
        &self.sequences[..count]
    }

    /// Index of the track receiving the next value.
    pub fn target_index(&self) -> Option<usize> {
        (self.sequence_count > 0).then(|| self.next_sequence_index % self.sequence_count)
    }

    /// Index of the track the next undo pops from.
    pub fn undo_index(&self) -> Option<usize> {
        if self.sequence_count == 0 || self.next_sequence_index == 0 {
            return None;
        }
        Some((self.next_sequence_index - 1) % self.sequence_count)
    }

    /// Longest active track.
    pub fn max_len(&self) -> usize {
        self.active().iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.max_len() == 0
    }

    /// Appends `value` to the receiving track if `ceiling` allows it and
    /// returns the index of the track that received it.
    pub fn push(
        &mut self,
        value: impl Into<String>,
        ceiling: usize,
    ) -> Result<usize, SequenceGuard> {
        let target = self.target_index().ok_or(SequenceGuard::NoActiveSequences)?;
        let sequence = &mut self.sequences[target];
        if sequence.len() >= ceiling {
            return Err(SequenceGuard::CeilingReached);
        }
        sequence.push(value.into());
        self.next_sequence_index += 1;
        Ok(target)
    }

    /// Removes the most recently entered value.
    pub fn pop(&mut self) -> Result<String, SequenceGuard> {
        if self.sequence_count == 0 {
            return Err(SequenceGuard::NoActiveSequences);
        }
        let target = self.undo_index().ok_or(SequenceGuard::NothingToUndo)?;
        let value = self.sequences[target].pop().ok_or(SequenceGuard::TargetEmpty)?;
        self.next_sequence_index -= 1;
        Ok(value)
    }

    /// Changes the number of active tracks. Entered data is kept; the
    /// round-robin restarts at the first track.
    pub fn set_sequence_count(&mut self, count: usize) {
        self.sequence_count = count.min(MAX_SEQUENCES);
        self.next_sequence_index = 0;
    }

    /// Moves to the next round, wrapping to round 1 past the last one.
    /// Returns `true` when the wrap happened.
    pub fn advance_round(&mut self) -> bool {
        let max_round = self.max_round.unwrap_or(ROUNDS15_MAX_ROUND);
        let next = self.current_round.unwrap_or(1) + 1;
        if next > max_round {
            self.current_round = Some(1);
            true
        } else {
            self.current_round = Some(next);
            false
        }
    }

    /// Back to round 1 with an empty sequence.
    pub fn reset_rounds(&mut self) {
        for sequence in &mut self.sequences {
            sequence.clear();
        }
        self.next_sequence_index = 0;
        self.current_round = Some(1);
    }

    /// Repairs data that violates the structural invariants, e.g. documents
    /// written with a single slot or edited by hand.
    pub fn normalize(&mut self, mode: Mode) {
        self.sequences.truncate(MAX_SEQUENCES);
        while self.sequences.len() < MAX_SEQUENCES {
            self.sequences.push(Vec::new());
        }
        self.sequence_count = self.sequence_count.min(MAX_SEQUENCES);
        if !mode.supports_multiple_tracks() {
            self.sequence_count = 1;
        }
        let entered: usize = self.active().iter().map(Vec::len).sum();
        if self.next_sequence_index > entered {
            self.next_sequence_index = entered;
        }
        if mode == Mode::Rounds15 {
            let max_round = self.max_round.unwrap_or(ROUNDS15_MAX_ROUND).max(1);
            let current = self.current_round.unwrap_or(1);
            self.max_round = Some(max_round);
            self.current_round = Some(if (1..=max_round).contains(&current) { current } else { 1 });
        }
    }
}

/// The sequence state of every mode, persisted as a map keyed by mode name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeStates {
    pub bananas: SequenceState,
    pub piano: SequenceState,
    pub rounds15: SequenceState,
}

impl Default for ModeStates {
    fn default() -> Self {
        Self {
            bananas: SequenceState::initial(Mode::Bananas),
            piano: SequenceState::initial(Mode::Piano),
            rounds15: SequenceState::initial(Mode::Rounds15),
        }
    }
}

impl ModeStates {
    /// Keys of retired modes that are dropped on load.
    pub const RETIRED_KEYS: &'static [&'static str] = &["follows"];

    pub fn get(&self, mode: Mode) -> &SequenceState {
        match mode {
            Mode::Bananas => &self.bananas,
            Mode::Piano => &self.piano,
            Mode::Rounds15 => &self.rounds15,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut SequenceState {
        match mode {
            Mode::Bananas => &mut self.bananas,
            Mode::Piano => &mut self.piano,
            Mode::Rounds15 => &mut self.rounds15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi(count: usize) -> SequenceState {
        let mut state = SequenceState::initial(Mode::Bananas);
        state.set_sequence_count(count);
        state
    }

    #[test]
    fn round_robin_targets_tracks_in_order() {
        let mut state = multi(3);
        for k in 1..=7 {
            let landed = state.push(k.to_string(), 25).unwrap();
            assert_eq!(landed, (k - 1) % 3);
        }
        assert_eq!(state.sequences[0], vec!["1", "4", "7"]);
        assert_eq!(state.sequences[1], vec!["2", "5"]);
        assert_eq!(state.sequences[2], vec!["3", "6"]);
    }

    #[test]
    fn push_respects_ceiling() {
        let mut state = SequenceState::initial(Mode::Piano);
        for _ in 0..30 {
            let _ = state.push("C", 20);
        }
        assert_eq!(state.sequences[0].len(), 20);
        assert_eq!(state.push("C", 20), Err(SequenceGuard::CeilingReached));
        assert_eq!(state.next_sequence_index, 20);
    }

    #[test]
    fn pop_takes_from_last_filled_track() {
        let mut state = multi(2);
        state.push("1", 25).unwrap();
        state.push("2", 25).unwrap();
        state.push("3", 25).unwrap();

        assert_eq!(state.pop().unwrap(), "3");
        assert_eq!(state.pop().unwrap(), "2");
        assert_eq!(state.next_sequence_index, 1);
        assert_eq!(state.sequences[0], vec!["1"]);
        assert!(state.sequences[1].is_empty());
    }

    #[test]
    fn pop_then_push_restores_length() {
        let mut state = multi(2);
        for value in ["1", "2", "3", "4", "5"] {
            state.push(value, 25).unwrap();
        }
        let before: Vec<usize> = state.active().iter().map(Vec::len).collect();
        state.pop().unwrap();
        let landed = state.push("9", 25).unwrap();

        let after: Vec<usize> = state.active().iter().map(Vec::len).collect();
        assert_eq!(before, after);
        assert_eq!(state.sequences[landed].last().map(String::as_str), Some("9"));
    }

    #[test]
    fn pop_guards() {
        let mut state = SequenceState::initial(Mode::Bananas);
        assert_eq!(state.pop(), Err(SequenceGuard::NothingToUndo));

        state.sequence_count = 0;
        assert_eq!(state.push("1", 25), Err(SequenceGuard::NoActiveSequences));
        assert_eq!(state.pop(), Err(SequenceGuard::NoActiveSequences));

        let mut state = multi(2);
        state.next_sequence_index = 1;
        assert_eq!(state.pop(), Err(SequenceGuard::TargetEmpty));
        assert_eq!(state.next_sequence_index, 1);
    }

    #[test]
    fn rounds_wrap_after_last() {
        let mut state = SequenceState::initial(Mode::Rounds15);
        for _ in 1..15 {
            assert!(!state.advance_round());
        }
        assert_eq!(state.current_round, Some(15));
        assert!(state.advance_round());
        assert_eq!(state.current_round, Some(1));
    }

    #[test]
    fn normalize_pads_slots_and_fixes_round() {
        let mut state = SequenceState {
            sequences: vec![vec!["1".to_string()]],
            sequence_count: 3,
            next_sequence_index: 9,
            current_round: Some(40),
            max_round: None,
        };
        state.normalize(Mode::Rounds15);

        assert_eq!(state.sequences.len(), MAX_SEQUENCES);
        assert_eq!(state.sequence_count, 1);
        assert_eq!(state.next_sequence_index, 1);
        assert_eq!(state.current_round, Some(1));
        assert_eq!(state.max_round, Some(15));
    }

    #[test]
    fn rounds_fields_only_serialized_for_rounds15() {
        let piano = serde_json::to_value(SequenceState::initial(Mode::Piano)).unwrap();
        assert!(piano.get("currentRound").is_none());

        let rounds = serde_json::to_value(SequenceState::initial(Mode::Rounds15)).unwrap();
        assert_eq!(rounds["currentRound"], 1);
        assert_eq!(rounds["maxRound"], 15);
        assert_eq!(rounds["sequenceCount"], 1);
    }
}
