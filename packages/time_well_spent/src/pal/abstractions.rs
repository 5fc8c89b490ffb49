//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Duration;

/// Provides wall-clock time reading functionality.
///
/// This trait abstracts the underlying clock source, allowing for both a real
/// implementation (the operating system monotonic clock) and fake
/// implementations (for testing).
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Gets the current wall-clock reading.
    ///
    /// Readings are monotonic and expressed as the time elapsed since an
    /// arbitrary per-platform anchor point. Only differences between two
    /// readings from the same platform instance are meaningful.
    fn wall_time(&self) -> Duration;
}
