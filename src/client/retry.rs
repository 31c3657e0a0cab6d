//! Bounded fixed-delay retry for relay connection.

use std::time::Duration;

/// Attempts made by `connect_with_retry` at process start.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;

/// Delay between connection attempts.
pub const DEFAULT_CONNECT_WAIT: Duration = Duration::from_millis(200);

/// Blocking sleep, injectable so retry loops can be tested without waiting.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] that parks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Run `attempt` up to `max_attempts` times (at least once), sleeping `wait`
/// between failures. Returns the last error if every attempt fails.
///
/// Total blocking time is bounded by `(max_attempts - 1) * wait`.
pub fn retry_fixed<T, E>(
    max_attempts: u32,
    wait: Duration,
    sleeper: &dyn Sleeper,
    mut attempt: impl FnMut(u32) -> Result<T, E>,
) -> Result<T, E> {
    let max_attempts = max_attempts.max(1);
    let mut n = 1;
    loop {
        match attempt(n) {
            Ok(value) => return Ok(value),
            Err(e) if n >= max_attempts => return Err(e),
            Err(_) => {
                sleeper.sleep(wait);
                n += 1;
            }
        }
    }
}
