//! Bounded polling for action implementations.
//!
//! The engine never imposes its own timeouts; implementations that need to
//! wait for the app use these helpers.
use crate::error::StepFailure;
use std::fmt::{Debug, Display};
use std::thread;
use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Retry `attempt` until it succeeds or `timeout` elapses.
///
/// The function runs at least once, and once more after the deadline has
/// passed, so it always gets its full allotted time.
pub fn wait_for_return_value<T, E, F>(
    timeout: Duration,
    what: &str,
    mut attempt: F,
) -> Result<T, StepFailure>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(err) => tracing::trace!(what, "attempt failed: {err}"),
        }
        thread::sleep(POLL_INTERVAL);
        if Instant::now() >= deadline {
            break;
        }
    }

    let last_error = match attempt() {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    Err(StepFailure::runtime(format!(
        "{what} failed by timeout after {} seconds: {last_error}",
        timeout.as_secs_f64()
    )))
}

/// Poll until `attempt` returns a value equal to `desired`.
pub fn wait_for_result<T, E, F>(
    timeout: Duration,
    desired: &T,
    what: &str,
    mut attempt: F,
) -> Result<T, StepFailure>
where
    T: PartialEq + Debug,
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    wait_for_return_value(timeout, what, || match attempt() {
        Ok(value) if value == *desired => Ok(value),
        Ok(value) => Err(format!("got {value:?}, expected {desired:?}")),
        Err(err) => Err(err.to_string()),
    })
}
