use std::time::Duration;

/// Virtual clock driven by whoever owns the timeline. Real front ends advance
/// it with wall-clock deltas, tests advance it directly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    now: Duration,
}

impl PlaybackClock {
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves the clock forward. The clock never runs backwards.
    pub fn advance_to(&mut self, instant: Duration) {
        self.now = self.now.max(instant);
    }
}

/// Handle returned by [`Timeline::schedule`], used to cancel a pending task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
pub struct ScheduledEvent<T> {
    pub id: TimerId,
    pub due: Duration,
    pub task: T,
}

/// Deferred continuations ordered by due time; ties run in scheduling order.
#[derive(Debug)]
pub struct Timeline<T> {
    clock: PlaybackClock,
    events: Vec<ScheduledEvent<T>>,
    next_id: u64,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            clock: PlaybackClock::default(),
            events: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Runs `task` once `delay` has elapsed from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.clock.now() + delay;
        let index = self.events.partition_point(|event| event.due <= due);
        self.events.insert(index, ScheduledEvent { id, due, task });
        id
    }

    /// Drops a pending task. Returns `false` when it already ran or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.events.iter().position(|event| event.id == id) {
            Some(index) => {
                self.events.remove(index);
                true
            }
            None => false,
        }
    }

    /// Time until the earliest pending task, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.events
            .first()
            .map(|event| event.due.saturating_sub(self.clock.now()))
    }

    pub fn is_idle(&self) -> bool {
        self.events.is_empty()
    }

    /// Pops the earliest task due at or before `until`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<ScheduledEvent<T>> {
        if self.events.first()?.due > until {
            return None;
        }
        let event = self.events.remove(0);
        self.clock.advance_to(event.due);
        Some(event)
    }

    /// Moves the clock to `instant` once no task is due before it.
    pub fn settle(&mut self, instant: Duration) {
        self.clock.advance_to(instant);
    }

    /// Drops every pending task. The clock keeps its position.
    pub fn cancel_all(&mut self) {
        self.events.clear();
    }
}
