//! Real platform implementation backed by the operating system clock.

use std::time::{Duration, Instant};

use crate::pal::abstractions::Platform;

/// Real implementation of the platform abstraction.
///
/// Readings are measured against an [`Instant`] anchor captured when the
/// platform is created, which keeps them monotonic and high-resolution.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RealPlatform {
    anchor: Instant,
}

impl RealPlatform {
    /// Creates a new real platform anchored at the current instant.
    pub(crate) fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Platform for RealPlatform {
    fn wall_time(&self) -> Duration {
        self.anchor.elapsed()
    }
}
