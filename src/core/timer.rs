use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Finished,
}

/// Countdown for timed evaluations.
///
/// Remaining time is always derived from wall-clock time between marks, so
/// a throttled or suspended tick source cannot make the timer run slow.
/// Sub-second remainders are carried over to the next sync.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    initial_seconds: u64,
    remaining_seconds: u64,
    state: TimerState,
    last_mark: Option<Instant>,
}

impl CountdownTimer {
    /// A disabled timer, or one with nothing to count, starts out finished.
    pub fn new(initial_seconds: u64, enabled: bool) -> Self {
        let state = if !enabled || initial_seconds == 0 {
            TimerState::Finished
        } else {
            TimerState::Idle
        };
        Self {
            initial_seconds,
            remaining_seconds: initial_seconds,
            state,
            last_mark: None,
        }
    }

    /// Returns false when the timer was not idle with time left.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != TimerState::Idle || self.remaining_seconds == 0 {
            return false;
        }
        self.state = TimerState::Running;
        self.last_mark = Some(now);
        tracing::debug!(seconds = self.remaining_seconds, "Timer started");
        true
    }

    /// Periodic callback.
    pub fn tick(&mut self, now: Instant) -> u64 {
        self.sync(now)
    }

    /// The view went to the background. Brings the count up to date so the
    /// next sync measures from here.
    pub fn on_hidden(&mut self, now: Instant) {
        self.sync(now);
    }

    /// The view is back. Applies the full time spent hidden.
    pub fn on_visible(&mut self, now: Instant) -> u64 {
        let before = self.remaining_seconds;
        let after = self.sync(now);
        if before != after {
            tracing::debug!(
                elapsed = before - after,
                remaining = after,
                "Timer caught up after visibility change"
            );
        }
        after
    }

    fn sync(&mut self, now: Instant) -> u64 {
        if self.state != TimerState::Running {
            return self.remaining_seconds;
        }
        let Some(mark) = self.last_mark else {
            return self.remaining_seconds;
        };

        let elapsed = now.saturating_duration_since(mark).as_secs();
        if elapsed > 0 {
            self.last_mark = Some(mark + Duration::from_secs(elapsed));
            self.remaining_seconds = self.remaining_seconds.saturating_sub(elapsed);
            if self.remaining_seconds == 0 {
                self.state = TimerState::Finished;
                self.last_mark = None;
                tracing::debug!("Timer finished");
            }
        }
        self.remaining_seconds
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn initial_seconds(&self) -> u64 {
        self.initial_seconds
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TimerState::Finished
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn disabled_or_empty_timer_is_already_finished() {
        assert!(CountdownTimer::new(30, false).is_finished());
        assert!(CountdownTimer::new(0, true).is_finished());
        let mut timer = CountdownTimer::new(0, true);
        assert!(!timer.start(Instant::now()));
    }

    #[test]
    fn ticks_follow_the_clock() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(5, true);
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.start(t0));
        assert!(!timer.start(t0));

        assert_eq!(timer.tick(t0 + secs(1)), 4);
        assert_eq!(timer.tick(t0 + secs(2)), 3);
        assert!(timer.is_running());
        assert_eq!(timer.tick(t0 + secs(5)), 0);
        assert!(timer.is_finished());
        assert_eq!(timer.tick(t0 + secs(9)), 0);
    }

    #[test]
    fn sub_second_remainders_are_carried() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(10, true);
        timer.start(t0);

        assert_eq!(timer.tick(t0 + Duration::from_millis(700)), 10);
        assert_eq!(timer.tick(t0 + Duration::from_millis(1400)), 9);
        assert_eq!(timer.tick(t0 + Duration::from_millis(2100)), 8);
    }

    #[test]
    fn hidden_time_is_not_lost_when_ticks_stall() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(60, true);
        timer.start(t0);
        timer.tick(t0 + secs(1));

        timer.on_hidden(t0 + secs(2));
        // no ticks delivered while hidden
        assert_eq!(timer.on_visible(t0 + secs(32)), 28);
        assert!(timer.is_running());

        timer.on_hidden(t0 + secs(33));
        assert_eq!(timer.on_visible(t0 + secs(120)), 0);
        assert!(timer.is_finished());
    }

    #[test]
    fn idle_timer_ignores_clock_events() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(15, true);
        timer.on_hidden(t0);
        assert_eq!(timer.on_visible(t0 + secs(60)), 15);
        assert_eq!(timer.tick(t0 + secs(61)), 15);
        assert_eq!(timer.initial_seconds(), 15);
    }
}
