use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

/// How long [`assert_blocked()`] observes a thread before concluding it is blocked.
pub const BLOCKED_OBSERVATION_PERIOD: Duration = Duration::from_millis(100);

/// How often [`wait_until()`] re-evaluates its condition.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Asserts that a scoped thread is still running after [`BLOCKED_OBSERVATION_PERIOD`].
///
/// A thread can never be proven blocked, only observed not to finish. Tests using this should
/// make sure the observed thread has nothing to do except wait on the resource under test.
///
/// # Panics
///
/// Panics if the thread finishes during the observation period.
pub fn assert_blocked<T>(handle: &ScopedJoinHandle<'_, T>) {
    thread::sleep(BLOCKED_OBSERVATION_PERIOD);

    assert!(
        !handle.is_finished(),
        "thread was expected to be blocked but finished within {BLOCKED_OBSERVATION_PERIOD:?}"
    );
}

/// Polls `condition` until it returns `true`.
///
/// Returns `false` if the condition did not become `true` within `timeout`.
#[must_use]
#[cfg_attr(test, mutants::skip)] // Can be mutated to an infinite loop.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let started = Instant::now();

    loop {
        if condition() {
            return true;
        }

        if started.elapsed() >= timeout {
            return false;
        }

        thread::sleep(POLL_INTERVAL);
    }
}
