//! Facade over the real and fake platform implementations.

use std::time::Duration;

use crate::pal::abstractions::Platform;
#[cfg(test)]
use crate::pal::fake::FakePlatform;
use crate::pal::real::RealPlatform;

/// Enum facade that dispatches to either the real or the fake platform.
///
/// This allows platform selection to happen at runtime without generic
/// parameters spreading through every type that needs a clock.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    /// The real operating system clock.
    Real(RealPlatform),

    /// A fake clock controlled by test code.
    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    /// Creates a facade over the real operating system clock.
    pub(crate) fn real() -> Self {
        Self::Real(RealPlatform::new())
    }

    /// Creates a facade over a fake clock for testing.
    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(platform)
    }
}

impl Platform for PlatformFacade {
    fn wall_time(&self) -> Duration {
        match self {
            Self::Real(platform) => platform.wall_time(),
            #[cfg(test)]
            Self::Fake(platform) => platform.wall_time(),
        }
    }
}
