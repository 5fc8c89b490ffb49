//! Platform abstraction layer for wall-clock time reading.
//!
//! This module provides a platform abstraction that allows switching between
//! the real monotonic clock (backed by [`std::time::Instant`]) and fake
//! implementations for testing purposes.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
