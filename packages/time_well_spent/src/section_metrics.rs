use std::collections::HashMap;
use std::time::Duration;

/// Identifies one node in a registry's section tree.
///
/// Node ids are indices into an append-only arena, so a node's identity is
/// stable for the lifetime of its registry: the same (parent, name) pair
/// always resolves to the same id.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct NodeId(pub(crate) usize);

/// Aggregated timing statistics for one section at one position in the
/// nesting tree.
///
/// Durations are accumulated as `f64` milliseconds so that mean and standard
/// deviation can be derived at render time without storing raw samples.
#[derive(Clone, Debug)]
pub(crate) struct SectionMetrics {
    pub(crate) total_ms: f64,
    pub(crate) call_count: u64,
    pub(crate) min_ms: f64,
    pub(crate) max_ms: f64,
    pub(crate) sum_squares: f64,
    pub(crate) children: HashMap<String, NodeId>,
}

impl Default for SectionMetrics {
    fn default() -> Self {
        Self {
            total_ms: 0.0,
            call_count: 0,
            // Infinity until the first measurement; reported as zero.
            min_ms: f64::INFINITY,
            max_ms: 0.0,
            sum_squares: 0.0,
            children: HashMap::new(),
        }
    }
}

impl SectionMetrics {
    /// Folds one completed measurement into the aggregate.
    pub(crate) fn record(&mut self, duration: Duration) {
        let duration_ms = duration_to_ms(duration);

        self.total_ms += duration_ms;
        self.call_count = self.call_count.checked_add(1).expect(
            "section call count overflows u64 - this indicates an unrealistic scenario",
        );
        self.min_ms = self.min_ms.min(duration_ms);
        self.max_ms = self.max_ms.max(duration_ms);
        self.sum_squares += duration_ms * duration_ms;
    }

    /// Mean duration per call in milliseconds, or zero if nothing was
    /// recorded.
    pub(crate) fn mean_ms(&self) -> f64 {
        if self.call_count == 0 {
            0.0
        } else {
            #[expect(
                clippy::cast_precision_loss,
                reason = "call counts in realistic profiling runs are far below the f64 precision limit"
            )]
            let call_count = self.call_count as f64;
            self.total_ms / call_count
        }
    }

    /// Standard deviation of the recorded durations in milliseconds.
    ///
    /// The variance is clamped to zero before the square root because
    /// floating-point error can push `sum_squares/n - mean^2` slightly below
    /// zero for near-identical samples.
    pub(crate) fn std_dev_ms(&self) -> f64 {
        if self.call_count == 0 {
            return 0.0;
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "call counts in realistic profiling runs are far below the f64 precision limit"
        )]
        let call_count = self.call_count as f64;

        let mean = self.total_ms / call_count;
        let variance = (self.sum_squares / call_count) - (mean * mean);
        variance.max(0.0).sqrt()
    }

    /// Minimum single-call duration in milliseconds, or zero if nothing was
    /// recorded.
    pub(crate) fn reported_min_ms(&self) -> f64 {
        if self.min_ms.is_finite() {
            self.min_ms
        } else {
            0.0
        }
    }
}

/// Converts a duration to `f64` milliseconds.
///
/// Converting via integer nanoseconds keeps whole-millisecond durations exact
/// in `f64`, which matters for the aggregation invariants.
#[expect(
    clippy::cast_precision_loss,
    reason = "durations in realistic profiling runs are far below the f64 precision limit for nanoseconds"
)]
pub(crate) fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}
