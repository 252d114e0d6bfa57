//! The trainer application object.
//!
//! [`Trainer`] owns the settings, every mode's sequence state, the persistent
//! store, the collaborator services and a [`Timeline`] of deferred
//! continuations. Front ends forward raw input events to it, drive its
//! timers through [`Trainer::advance`] and drain [`TrainerEvent`]s to redraw.

use std::{fmt, time::Duration};

use crate::{
    config::{
        clamp_multiplier, Feature, AUTOPLAY_DEFER, MAX_SEQUENCES, ROUNDS15_CLEAR_DELAY,
        SPEED_DELETE_INTERVAL,
    },
    hold::{HoldEffect, HoldInput, HoldState, HoldToDelete},
    playback::{build_playlist, PlaybackSession, PlaybackStep, PlaybackTiming},
    sequence::SequenceGuard,
    services::{speed_announcement, Haptics, Narrator, Silent},
    store::{PersistentStore, Storage},
    timeline::{Timeline, TimerId},
    Mode, ModeStates, SequenceState, Settings,
};

const APPEND_PULSE: Duration = Duration::from_millis(10);
const UNDO_PULSE: Duration = Duration::from_millis(20);
const HAPTICS_ENABLED_PULSE: Duration = Duration::from_millis(50);

/// Why an operation was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    NoActiveSequences,
    CeilingReached,
    InvalidToken,
    PlaybackRunning,
    /// A full rounds15 round waits for its playback.
    EntryLocked,
    NothingToUndo,
    TargetEmpty,
    EmptySequence,
    SpeedDeleteDisabled,
    NotHeld,
    SlidersLocked,
    OutOfRange,
    /// The operation does not exist in the active mode.
    WrongMode,
}

impl From<SequenceGuard> for Guard {
    fn from(value: SequenceGuard) -> Self {
        match value {
            SequenceGuard::NoActiveSequences => Guard::NoActiveSequences,
            SequenceGuard::CeilingReached => Guard::CeilingReached,
            SequenceGuard::NothingToUndo => Guard::NothingToUndo,
            SequenceGuard::TargetEmpty => Guard::TargetEmpty,
        }
    }
}

/// Result of a controller operation. Rejections are silent no-ops, the guard
/// only tells the caller which check refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(Guard),
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// Who asked for a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    User,
    Autoplay,
}

/// Playback status of one mode. Any status other than `Idle` locks value
/// entry and undo for that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Running,
    /// Rounds15 is wiping the played sequence before the next round.
    Clearing,
}

/// Blocking informational message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Playback was requested by the user on an empty sequence.
    EmptySequence(Mode),
    /// All rounds were finished and the counter went back to 1.
    RoundsComplete { max_round: u32 },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptySequence(Mode::Piano) => {
                f.write_str("The sequence is empty. Enter some notes first!")
            }
            Notice::EmptySequence(_) => {
                f.write_str("The sequence is empty. Enter some numbers first!")
            }
            Notice::RoundsComplete { max_round } => {
                write!(f, "You finished all {max_round} rounds. Resetting to Round 1.")
            }
        }
    }
}

/// Speed change requested from the keyboard or voice path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedAdjust {
    By(f32),
    Reset,
}

/// Everything a front end needs to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainerEvent {
    StateChanged(Mode),
    SettingsChanged,
    ModeSwitched(Mode),
    PlaybackStarted {
        mode: Mode,
        items: usize,
    },
    ItemShown {
        mode: Mode,
        position: usize,
        sequence_index: usize,
        value: String,
    },
    ItemHidden {
        mode: Mode,
        position: usize,
        sequence_index: usize,
    },
    PlaybackFinished(Mode),
    RoundAdvanced {
        round: u32,
    },
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Autoplay(Mode),
    Playback(Mode),
    BeginClear,
    RapidDelete,
    Hold,
}

#[derive(Debug, Default)]
struct ModeRuntime {
    status: PlaybackStatus,
    session: Option<PlaybackSession>,
    timer: Option<TimerId>,
    autoplay: Option<TimerId>,
    entry_locked: bool,
}

fn slot(mode: Mode) -> usize {
    match mode {
        Mode::Bananas => 0,
        Mode::Piano => 1,
        Mode::Rounds15 => 2,
    }
}

pub struct Trainer<S> {
    settings: Settings,
    states: ModeStates,
    store: PersistentStore<S>,
    narrator: Box<dyn Narrator>,
    haptics: Box<dyn Haptics>,
    timeline: Timeline<Task>,
    runtime: [ModeRuntime; 3],
    hold: HoldToDelete,
    hold_mode: Mode,
    hold_timer: Option<TimerId>,
    events: Vec<TrainerEvent>,
}

impl<S: Storage> Trainer<S> {
    /// Loads persisted settings and state from `storage`, falling back to
    /// defaults, with silent narration and haptics.
    pub fn load(storage: S) -> Self {
        let mut store = PersistentStore::new(storage);
        let snapshot = store.load();
        tracing::debug!(mode = %snapshot.settings.current_mode, "trainer loaded");
        Self {
            hold_mode: snapshot.settings.current_mode,
            settings: snapshot.settings,
            states: snapshot.states,
            store,
            narrator: Box::new(Silent),
            haptics: Box::new(Silent),
            timeline: Timeline::new(),
            runtime: Default::default(),
            hold: HoldToDelete::new(),
            hold_timer: None,
            events: Vec::new(),
        }
    }

    pub fn with_narrator(mut self, narrator: impl Narrator + 'static) -> Self {
        self.narrator = Box::new(narrator);
        self
    }

    pub fn with_haptics(mut self, haptics: impl Haptics + 'static) -> Self {
        self.haptics = Box::new(haptics);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.settings.current_mode
    }

    pub fn state(&self, mode: Mode) -> &SequenceState {
        self.states.get(mode)
    }

    pub fn active_state(&self) -> &SequenceState {
        self.states.get(self.mode())
    }

    pub fn store(&self) -> &PersistentStore<S> {
        &self.store
    }

    pub fn playback_status(&self, mode: Mode) -> PlaybackStatus {
        self.runtime(mode).status
    }

    pub fn is_busy(&self, mode: Mode) -> bool {
        self.playback_status(mode) != PlaybackStatus::Idle
    }

    /// Whether value keys of `mode` accept input.
    pub fn is_entry_enabled(&self, mode: Mode) -> bool {
        !self.is_busy(mode) && !self.runtime(mode).entry_locked
    }

    pub fn is_undo_enabled(&self, mode: Mode) -> bool {
        !self.is_busy(mode)
    }

    /// 1-based position of the item being played, `None` when idle.
    pub fn demo_progress(&self, mode: Mode) -> Option<usize> {
        let session = self.runtime(mode).session.as_ref()?;
        session.position().map(|position| position + 1)
    }

    /// Track whose item is currently highlighted.
    pub fn highlighted_track(&self, mode: Mode) -> Option<usize> {
        let session = self.runtime(mode).session.as_ref()?;
        session.current().map(|(_, item)| item.sequence_index)
    }

    pub fn hold_state(&self) -> HoldState {
        self.hold.state()
    }

    pub fn drain_events(&mut self) -> Vec<TrainerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// Time until the next pending timer fires.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timeline.next_deadline()
    }

    /// Runs every timer that falls due within `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.timeline.now() + elapsed;
        while let Some(event) = self.timeline.pop_due(until) {
            self.run(event.id, event.task);
        }
        self.timeline.settle(until);
    }

    /// Runs timers until none is pending and returns the virtual time spent.
    pub fn run_until_idle(&mut self) -> Duration {
        let start = self.timeline.now();
        while let Some(deadline) = self.timeline.next_deadline() {
            self.advance(deadline);
        }
        self.timeline.now() - start
    }

    /// Appends `value` to the receiving track of the active mode.
    pub fn append(&mut self, value: &str) -> Outcome {
        let mode = self.mode();
        if !mode.accepts(value) {
            return Outcome::Ignored(Guard::InvalidToken);
        }
        if self.is_busy(mode) {
            return Outcome::Ignored(Guard::PlaybackRunning);
        }
        if self.runtime(mode).entry_locked {
            return Outcome::Ignored(Guard::EntryLocked);
        }

        let state = self.states.get_mut(mode);
        let ceiling = mode
            .fixed_ceiling()
            .unwrap_or_else(|| state.current_round.unwrap_or(1) as usize);
        let landed = match state.push(value, ceiling) {
            Ok(landed) => landed,
            Err(guard) => return Outcome::Ignored(guard.into()),
        };
        let sequence_count = state.sequence_count;
        let landed_len = state.sequences[landed].len();
        let current_round = state.current_round.unwrap_or(1) as usize;

        tracing::debug!(%mode, value, track = landed, "value appended");
        self.events.push(TrainerEvent::StateChanged(mode));
        self.pulse(APPEND_PULSE);

        match mode {
            Mode::Piano if self.settings.piano_autoplay => self.schedule_autoplay(mode),
            Mode::Bananas if self.settings.bananas_autoplay => {
                if sequence_count == 1 || landed == sequence_count - 1 {
                    self.schedule_autoplay(mode);
                }
            }
            Mode::Rounds15 if landed_len == current_round => {
                self.runtime_mut(mode).entry_locked = true;
                self.schedule_autoplay(mode);
            }
            _ => {}
        }

        self.persist();
        Outcome::Applied
    }

    /// Removes the most recently entered value of the active mode.
    pub fn undo(&mut self) -> Outcome {
        let mode = self.mode();
        let outcome = self.undo_unpersisted(mode);
        if outcome.is_applied() {
            self.persist();
        }
        outcome
    }

    fn undo_unpersisted(&mut self, mode: Mode) -> Outcome {
        if self.is_busy(mode) {
            return Outcome::Ignored(Guard::PlaybackRunning);
        }
        if let Err(guard) = self.states.get_mut(mode).pop() {
            return Outcome::Ignored(guard.into());
        }
        if mode == Mode::Rounds15 {
            let runtime = self.runtime_mut(mode);
            runtime.entry_locked = false;
            if let Some(pending) = runtime.autoplay.take() {
                self.timeline.cancel(pending);
            }
        }
        self.events.push(TrainerEvent::StateChanged(mode));
        self.pulse(UNDO_PULSE);
        Outcome::Applied
    }

    /// Backspace pressed. Performs one undo right away and starts the
    /// press-and-hold timers.
    pub fn press_delete(&mut self) -> Outcome {
        self.stop_hold_timer();
        let mode = self.mode();
        let guard = if !self.settings.speed_delete {
            Some(Guard::SpeedDeleteDisabled)
        } else if self.is_busy(mode) {
            Some(Guard::PlaybackRunning)
        } else {
            None
        };

        self.hold_mode = mode;
        let effect = self.hold.handle(HoldInput::Press {
            allowed: guard.is_none(),
        });
        self.apply_hold(effect);
        match guard {
            Some(guard) => Outcome::Ignored(guard),
            None => Outcome::Applied,
        }
    }

    /// Backspace released. Persists the whole gesture once. With speed
    /// delete disabled the release acts as a plain click.
    pub fn release_delete(&mut self) -> Outcome {
        self.stop_hold_timer();
        if !self.hold.is_held() {
            if !self.settings.speed_delete {
                return self.undo();
            }
            return Outcome::Ignored(Guard::NotHeld);
        }
        let effect = self.hold.handle(HoldInput::Release);
        self.apply_hold(effect);
        Outcome::Applied
    }

    /// The pointer left the backspace button while held.
    pub fn cancel_delete(&mut self) {
        self.stop_hold_timer();
        if self.hold.is_held() {
            let effect = self.hold.handle(HoldInput::Cancel);
            self.apply_hold(effect);
        }
    }

    fn apply_hold(&mut self, effect: HoldEffect) {
        let undone = effect.undo && self.undo_unpersisted(self.hold_mode).is_applied();
        if let (true, Some(delay)) = (undone, effect.next_timer) {
            self.hold_timer = Some(self.timeline.schedule(delay, Task::Hold));
        }
        if effect.persist {
            self.persist();
        }
    }

    fn stop_hold_timer(&mut self) {
        if let Some(id) = self.hold_timer.take() {
            self.timeline.cancel(id);
        }
    }

    /// Plays the active mode's sequences on user request.
    pub fn play(&mut self) -> Outcome {
        self.start_playback(self.mode(), Trigger::User)
    }

    /// Starts a playback session for `mode`.
    pub fn start_playback(&mut self, mode: Mode, trigger: Trigger) -> Outcome {
        if self.is_busy(mode) {
            return Outcome::Ignored(Guard::PlaybackRunning);
        }

        let state = self.states.get(mode);
        if state.is_empty() {
            if trigger == Trigger::User {
                self.events
                    .push(TrainerEvent::Notice(Notice::EmptySequence(mode)));
            }
            self.runtime_mut(mode).entry_locked = false;
            return Outcome::Ignored(Guard::EmptySequence);
        }

        let inter_sequence_delay = if state.sequence_count > 1 {
            self.settings.inter_sequence_delay()
        } else {
            Duration::ZERO
        };
        let timing =
            PlaybackTiming::for_mode(mode, self.settings.speed(mode), inter_sequence_delay);
        let playlist = build_playlist(state.active(), self.settings.chunk_size);
        let items = playlist.len();

        self.cancel_mode_timer(mode);
        let runtime = self.runtime_mut(mode);
        runtime.status = PlaybackStatus::Running;
        runtime.session = Some(PlaybackSession::new(playlist, timing));

        tracing::debug!(%mode, items, ?trigger, "playback started");
        self.events.push(TrainerEvent::PlaybackStarted { mode, items });
        self.playback_tick(mode);
        Outcome::Applied
    }

    fn schedule_autoplay(&mut self, mode: Mode) {
        let id = self.timeline.schedule(AUTOPLAY_DEFER, Task::Autoplay(mode));
        if let Some(previous) = self.runtime_mut(mode).autoplay.replace(id) {
            self.timeline.cancel(previous);
        }
    }

    fn playback_tick(&mut self, mode: Mode) {
        let step = match self.runtime_mut(mode).session.as_mut() {
            Some(session) => session.tick(),
            None => return,
        };

        match step {
            PlaybackStep::Show {
                position,
                item,
                next_tick,
            } => {
                self.speak(&item.value);
                self.events.push(TrainerEvent::ItemShown {
                    mode,
                    position,
                    sequence_index: item.sequence_index,
                    value: item.value,
                });
                self.schedule_mode_timer(mode, next_tick, Task::Playback(mode));
            }
            PlaybackStep::Hide {
                position,
                item,
                next_tick,
            } => {
                self.events.push(TrainerEvent::ItemHidden {
                    mode,
                    position,
                    sequence_index: item.sequence_index,
                });
                self.schedule_mode_timer(mode, next_tick, Task::Playback(mode));
            }
            PlaybackStep::Finished => self.finish_playback(mode),
        }
    }

    fn finish_playback(&mut self, mode: Mode) {
        let clear = mode == Mode::Rounds15 && self.settings.rounds15_clear_after_playback;
        let runtime = self.runtime_mut(mode);
        runtime.session = None;
        runtime.timer = None;
        if clear {
            runtime.status = PlaybackStatus::Clearing;
        } else {
            runtime.status = PlaybackStatus::Idle;
            runtime.entry_locked = false;
        }

        tracing::debug!(%mode, clear, "playback finished");
        self.events.push(TrainerEvent::PlaybackFinished(mode));
        if clear {
            self.schedule_mode_timer(Mode::Rounds15, ROUNDS15_CLEAR_DELAY, Task::BeginClear);
        }
    }

    fn begin_clear(&mut self) {
        if self.states.rounds15.sequences[0].is_empty() {
            self.advance_round();
        } else {
            self.schedule_mode_timer(Mode::Rounds15, SPEED_DELETE_INTERVAL, Task::RapidDelete);
        }
    }

    fn rapid_delete(&mut self) {
        let state = &mut self.states.rounds15;
        state.sequences[0].pop();
        state.next_sequence_index = state.next_sequence_index.saturating_sub(1);
        let done = state.sequences[0].is_empty();
        self.events.push(TrainerEvent::StateChanged(Mode::Rounds15));

        if done {
            self.advance_round();
        } else {
            self.schedule_mode_timer(Mode::Rounds15, SPEED_DELETE_INTERVAL, Task::RapidDelete);
        }
    }

    fn advance_round(&mut self) {
        let state = &mut self.states.rounds15;
        let wrapped = state.advance_round();
        let round = state.current_round.unwrap_or(1);
        let max_round = state.max_round.unwrap_or(round);

        let runtime = self.runtime_mut(Mode::Rounds15);
        runtime.status = PlaybackStatus::Idle;
        runtime.timer = None;
        runtime.entry_locked = false;

        tracing::info!(round, wrapped, "rounds15 advanced");
        self.events.push(TrainerEvent::RoundAdvanced { round });
        if wrapped {
            self.events
                .push(TrainerEvent::Notice(Notice::RoundsComplete { max_round }));
        }
        self.persist();
    }

    /// Back to round 1 with an empty sequence, cancelling any rounds15
    /// playback in flight.
    pub fn reset_rounds(&mut self) -> Outcome {
        if self.mode() != Mode::Rounds15 {
            return Outcome::Ignored(Guard::WrongMode);
        }
        self.cancel_mode_timer(Mode::Rounds15);
        let runtime = self.runtime_mut(Mode::Rounds15);
        runtime.status = PlaybackStatus::Idle;
        runtime.session = None;
        runtime.entry_locked = false;

        self.states.rounds15.reset_rounds();
        tracing::info!("rounds15 reset");
        self.events.push(TrainerEvent::StateChanged(Mode::Rounds15));
        self.persist();
        Outcome::Applied
    }

    fn schedule_mode_timer(&mut self, mode: Mode, delay: Duration, task: Task) {
        let id = self.timeline.schedule(delay, task);
        if let Some(previous) = self.runtime_mut(mode).timer.replace(id) {
            self.timeline.cancel(previous);
        }
    }

    fn cancel_mode_timer(&mut self, mode: Mode) {
        let runtime = self.runtime_mut(mode);
        let pending = [runtime.timer.take(), runtime.autoplay.take()];
        for id in pending.into_iter().flatten() {
            self.timeline.cancel(id);
        }
    }

    fn run(&mut self, id: TimerId, task: Task) {
        for runtime in &mut self.runtime {
            if runtime.timer == Some(id) {
                runtime.timer = None;
            }
            if runtime.autoplay == Some(id) {
                runtime.autoplay = None;
            }
        }
        if self.hold_timer == Some(id) {
            self.hold_timer = None;
        }

        match task {
            Task::Autoplay(mode) => {
                let _ = self.start_playback(mode, Trigger::Autoplay);
            }
            Task::Playback(mode) => self.playback_tick(mode),
            Task::BeginClear => self.begin_clear(),
            Task::RapidDelete => self.rapid_delete(),
            Task::Hold => {
                let input = match self.hold.state() {
                    HoldState::ArmedWaiting => HoldInput::DelayElapsed,
                    _ => HoldInput::RepeatTick,
                };
                let effect = self.hold.handle(input);
                self.apply_hold(effect);
            }
        }
    }

    /// Makes `mode` the active mode. Every mode keeps its own state.
    pub fn switch_mode(&mut self, mode: Mode) -> Outcome {
        self.cancel_delete();
        self.settings.current_mode = mode;
        tracing::info!(%mode, "mode switched");
        self.events.push(TrainerEvent::ModeSwitched(mode));
        self.persist();
        Outcome::Applied
    }

    /// Nudges or resets the active mode's speed, narrating the new value.
    pub fn adjust_speed(&mut self, adjust: SpeedAdjust) -> f32 {
        let mode = self.mode();
        let target = match adjust {
            SpeedAdjust::Reset => 1.0,
            SpeedAdjust::By(delta) => self.settings.speed(mode) + delta,
        };
        let multiplier = self.settings.set_speed(mode, target);
        self.speak(&speed_announcement(multiplier));
        self.settings_changed();
        multiplier
    }

    /// Speed slider of `mode` moved.
    pub fn slide_speed(&mut self, mode: Mode, multiplier: f32) -> Outcome {
        if self.settings.sliders_locked {
            return Outcome::Ignored(Guard::SlidersLocked);
        }
        self.settings.set_speed(mode, multiplier);
        self.settings_changed();
        Outcome::Applied
    }

    /// UI scale slider moved.
    pub fn slide_ui_scale(&mut self, multiplier: f32) -> Outcome {
        if self.settings.sliders_locked {
            return Outcome::Ignored(Guard::SlidersLocked);
        }
        self.settings.ui_scale = clamp_multiplier(multiplier);
        self.settings_changed();
        Outcome::Applied
    }

    /// Flips `feature` and returns its new value.
    pub fn toggle(&mut self, feature: Feature) -> bool {
        let enabled = !feature.get(&self.settings);
        self.set_feature(feature, enabled);
        enabled
    }

    pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
        feature.set(&mut self.settings, enabled);
        tracing::debug!(feature = feature.name(), enabled, "feature set");
        match feature {
            Feature::Audio if enabled => self.speak("Audio"),
            Feature::Haptics if enabled => self.pulse(HAPTICS_ENABLED_PULSE),
            _ => {}
        }
        self.settings_changed();
    }

    /// Number of bananas tracks, 1 to 4.
    pub fn set_sequence_count(&mut self, count: usize) -> Outcome {
        if !(1..=MAX_SEQUENCES).contains(&count) {
            return Outcome::Ignored(Guard::OutOfRange);
        }
        self.states.bananas.set_sequence_count(count);
        self.events.push(TrainerEvent::StateChanged(Mode::Bananas));
        self.persist();
        Outcome::Applied
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Outcome {
        if chunk_size == 0 {
            return Outcome::Ignored(Guard::OutOfRange);
        }
        self.settings.chunk_size = chunk_size;
        self.settings_changed();
        Outcome::Applied
    }

    pub fn set_inter_sequence_delay(&mut self, delay: Duration) {
        self.settings.inter_sequence_delay_ms = delay.as_millis() as u64;
        self.settings_changed();
    }

    /// Closes the welcome screen, optionally for good.
    pub fn dismiss_welcome(&mut self, dont_show_again: bool) {
        self.settings.show_welcome = !dont_show_again;
        self.settings_changed();
    }

    /// Replaces settings and every mode's state with first-run defaults and
    /// clears storage.
    pub fn restore_defaults(&mut self) {
        self.timeline.cancel_all();
        self.runtime = Default::default();
        self.hold = HoldToDelete::new();
        self.hold_timer = None;

        self.settings = Settings::default();
        self.states = ModeStates::default();
        self.hold_mode = self.settings.current_mode;
        if let Err(err) = self.store.clear() {
            tracing::warn!(%err, "failed to clear storage");
        }
        self.persist();

        tracing::info!("defaults restored");
        self.events.push(TrainerEvent::SettingsChanged);
        self.events
            .push(TrainerEvent::ModeSwitched(self.settings.current_mode));
        for mode in Mode::ALL {
            self.events.push(TrainerEvent::StateChanged(mode));
        }
    }

    fn runtime(&self, mode: Mode) -> &ModeRuntime {
        &self.runtime[slot(mode)]
    }

    fn runtime_mut(&mut self, mode: Mode) -> &mut ModeRuntime {
        &mut self.runtime[slot(mode)]
    }

    fn settings_changed(&mut self) {
        self.events.push(TrainerEvent::SettingsChanged);
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.settings, &self.states) {
            tracing::warn!(%err, "failed to save state, keeping it in memory");
        }
    }

    fn speak(&mut self, text: &str) {
        if !self.settings.audio {
            return;
        }
        if let Err(err) = self.narrator.speak(text) {
            tracing::warn!(%err, "narration failed");
        }
    }

    fn pulse(&mut self, duration: Duration) {
        if !self.settings.haptics {
            return;
        }
        if let Err(err) = self.haptics.vibrate(duration) {
            tracing::warn!(%err, "haptic feedback failed");
        }
    }
}

impl<S> fmt::Debug for Trainer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trainer")
            .field("mode", &self.settings.current_mode)
            .field("states", &self.states)
            .field("hold", &self.hold.state())
            .field("pending_timers", &!self.timeline.is_idle())
            .finish()
    }
}
