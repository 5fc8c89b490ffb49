//! Scoped guards that time one section of code.

use std::marker::PhantomData;
use std::time::Duration;

use crate::Registry;
use crate::pal::Platform;
use crate::section_metrics::NodeId;

/// Times a section of code between creation and drop.
///
/// A guard is armed by [`Registry::begin`] (or [`begin_section`][1]): the
/// clock is read, the owning tree node is resolved from the calling thread's
/// nesting context, and the guard is pushed onto that thread's active-section
/// stack. Dropping the guard settles the measurement exactly once, through
/// any exit path out of the scope, including early returns and unwinding
/// panics.
///
/// Guards are not sendable to other threads: the active-section stack belongs
/// to the thread that armed the guard, and nested guards on one thread always
/// settle in reverse order of arming.
///
/// [1]: crate::begin_section
///
/// # Examples
///
/// ```
/// use time_well_spent::Registry;
///
/// let registry = Registry::new();
/// {
///     let _section = registry.begin("render");
///     // Work to measure happens here.
/// } // Elapsed wall-clock time is folded into the "render" node here.
/// ```
#[derive(Debug)]
#[must_use = "the section is timed between creation and drop"]
pub struct SectionGuard<'a> {
    registry: &'a Registry,
    node: NodeId,
    start: Duration,

    _single_threaded: PhantomData<*const ()>,
}

impl<'a> SectionGuard<'a> {
    /// Arms a guard for a node that has already been resolved and pushed onto
    /// the calling thread's active-section stack.
    pub(crate) fn new(registry: &'a Registry, node: NodeId, start: Duration) -> Self {
        Self {
            registry,
            node,
            start,
            _single_threaded: PhantomData,
        }
    }
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        let end = self.registry.platform().wall_time();
        let elapsed = end.saturating_sub(self.start);

        self.registry.settle(self.node, elapsed);
    }
}
