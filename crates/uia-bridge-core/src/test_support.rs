//! Deterministic time for tests.

use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use uia_bridge_common::mutex_lock_or_recover;

use crate::time::Clock;
use crate::time::Sleeper;

/// A clock that only moves when something sleeps on it.
///
/// Implements both [`Clock`] and [`Sleeper`]: every `sleep` advances `now`
/// by the requested duration and is recorded instead of blocking.
#[derive(Debug)]
pub struct FakeClock {
    origin: Instant,
    state: Mutex<FakeClockState>,
}

#[derive(Debug, Default)]
struct FakeClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(FakeClockState::default()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        mutex_lock_or_recover(&self.state).elapsed += duration;
    }

    pub fn elapsed(&self) -> Duration {
        mutex_lock_or_recover(&self.state).elapsed
    }

    pub fn sleep_count(&self) -> usize {
        mutex_lock_or_recover(&self.state).sleeps.len()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        mutex_lock_or_recover(&self.state).sleeps.clone()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

impl Sleeper for FakeClock {
    fn sleep(&self, duration: Duration) {
        let mut state = mutex_lock_or_recover(&self.state);
        state.elapsed += duration;
        state.sleeps.push(duration);
    }
}
