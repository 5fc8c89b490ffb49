//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::pal::abstractions::Platform;

/// Fake implementation of the platform abstraction for testing.
///
/// This implementation allows tests to control the clock instead of relying
/// on the real system time. Multiple clones of the same `FakePlatform` share
/// the same underlying reading, allowing tests to advance time after the
/// platform has been handed to a registry.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    wall_time: Arc<Mutex<Duration>>,
}

impl FakePlatform {
    /// Creates a new fake platform with a zero clock reading.
    pub(crate) fn new() -> Self {
        Self {
            wall_time: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Sets the clock reading.
    ///
    /// This affects all clones of this platform, allowing tests to simulate
    /// time progression during a measurement.
    pub(crate) fn set_wall_time(&self, time: Duration) {
        *self
            .wall_time
            .lock()
            .expect("FakePlatform state lock should not be poisoned") = time;
    }

    /// Advances the clock reading by the given amount.
    pub(crate) fn advance(&self, by: Duration) {
        let mut wall_time = self
            .wall_time
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        *wall_time = wall_time
            .checked_add(by)
            .expect("advancing the fake clock overflows Duration - this indicates an unrealistic scenario");
    }
}

impl Platform for FakePlatform {
    fn wall_time(&self) -> Duration {
        *self
            .wall_time
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializes_with_zero_time() {
        let platform = FakePlatform::new();
        assert_eq!(platform.wall_time(), Duration::ZERO);
    }

    #[test]
    fn sets_wall_time() {
        let platform = FakePlatform::new();
        platform.set_wall_time(Duration::from_millis(150));

        assert_eq!(platform.wall_time(), Duration::from_millis(150));
    }

    #[test]
    fn advances_wall_time() {
        let platform = FakePlatform::new();
        platform.set_wall_time(Duration::from_millis(100));
        platform.advance(Duration::from_millis(25));

        assert_eq!(platform.wall_time(), Duration::from_millis(125));
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        // Setting time on one clone affects the other.
        platform1.set_wall_time(Duration::from_millis(100));
        assert_eq!(platform2.wall_time(), Duration::from_millis(100));

        platform2.advance(Duration::from_millis(50));
        assert_eq!(platform1.wall_time(), Duration::from_millis(150));
    }
}
