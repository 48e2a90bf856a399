use std::time::{Duration, Instant};

/// Monotonic time source driving transfer deadlines.
///
/// Endpoints and link adapters take a clock parameter so tests can run on
/// virtual time instead of busy-waiting on the wall clock.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// The process clock: `Instant::now` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
