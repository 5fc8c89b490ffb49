//! Hierarchical wall-clock profiling of nested code sections.
//!
//! This package measures how execution time is spent across named sections of
//! instrumented code. Opening a section returns a scoped guard; when the
//! guard drops, the elapsed wall-clock time is folded into a shared tree of
//! statistics keyed by section name and dynamic call nesting. The tree can be
//! rendered at any time as an indented report with per-section total, mean,
//! minimum, maximum and standard deviation times plus each section's share of
//! its parent's time.
//!
//! The core functionality includes:
//! - [`Registry`] - Owns the shared section tree and hands out guards
//! - [`SectionGuard`] - Times one section between creation and drop
//! - [`Report`] - Thread-safe snapshot of the tree, renderable as text
//! - [`begin_section`] / [`generate_report`] - Free functions over the
//!   process-wide registry
//!
//! This package is not a sampling profiler; only code that is explicitly
//! instrumented is measured.
//!
//! # Simple Usage
//!
//! You can profile nested sections like this:
//!
//! ```
//! use time_well_spent::{begin_section, generate_report};
//!
//! # fn main() {
//! {
//!     let _load = begin_section("load_assets");
//!
//!     for _ in 0..3 {
//!         let _parse = begin_section("parse_asset");
//!         // Parsing work is attributed to "load_assets" -> "parse_asset".
//!     }
//! }
//!
//! // Render the indented report at any time.
//! print!("{}", generate_report());
//! # }
//! ```
//!
//! # Nesting
//!
//! Parent/child relationships are dynamic: a section becomes a child of
//! whatever section is innermost on the calling thread at the moment it is
//! opened, not of any static code structure. Opening the same name repeatedly
//! in the same position accumulates into one node, so a section inside a loop
//! reports one row whose call count is the iteration count.
//!
//! # Threading
//!
//! A [`Registry`] may be shared freely across threads; all statistics are
//! merged into one tree under a single lock. The nesting context is tracked
//! per thread, so sections opened on different threads never see each other
//! as parents, and [`SectionGuard`] cannot be sent to another thread.
//!
//! # The process-wide registry
//!
//! Most callers never construct a [`Registry`] themselves: [`begin_section`],
//! [`begin_section_here`], [`generate_report`] and [`print_report`] operate
//! on a lazily-initialized process-wide instance that lives until the process
//! exits. Separate registries are useful mainly for tests that need an
//! isolated tree.

mod pal;
mod registry;
mod report;
mod section_guard;
mod section_metrics;

pub use registry::Registry;
pub use report::{Report, ReportSection};
pub use section_guard::SectionGuard;

/// Panic message for lock acquisition on a poisoned lock.
///
/// Locks are only poisoned if a thread panicked while holding one, in which
/// case the statistics are unreliable and continuing is not meaningful.
pub(crate) const ERR_POISONED_LOCK: &str =
    "simultaneous access to shared section tree failed - the lock was poisoned by a panic";

/// Opens a named section in the process-wide registry, measuring from now
/// until the returned guard is dropped.
///
/// See [`Registry::begin`] for the attribution rules.
///
/// # Examples
///
/// ```
/// use time_well_spent::begin_section;
///
/// {
///     let _section = begin_section("simulation_step");
///     // Work to measure happens here.
/// } // Elapsed wall-clock time is recorded here.
/// ```
#[must_use = "the section is timed between creation and drop"]
pub fn begin_section(name: impl Into<String>) -> SectionGuard<'static> {
    Registry::global().begin(name)
}

/// Opens a section in the process-wide registry named after the caller's
/// source location (`file:line`).
///
/// See [`Registry::begin_here`].
#[must_use = "the section is timed between creation and drop"]
#[track_caller]
pub fn begin_section_here() -> SectionGuard<'static> {
    Registry::global().begin_here()
}

/// Renders the process-wide registry's statistics as an indented textual
/// report.
///
/// The report starts with a `=== Profiling Report ===` banner and ends with a
/// `========================` banner. Between them, every recorded section is
/// printed depth-first: the name left-justified in a minimum of 30 columns,
/// then total, mean, minimum, maximum and standard deviation times in
/// milliseconds, each right-justified in a fixed minimum width, then the
/// section's share of its parent's total time. Child sections are indented
/// two spaces deeper than their parent. A report over an empty tree consists
/// of only the two banner lines.
///
/// Safe to call at any time, any number of times, concurrently with ongoing
/// measurements; each call renders a consistent snapshot.
#[must_use]
pub fn generate_report() -> String {
    Registry::global().to_report().to_string()
}

/// Prints the process-wide registry's report to stdout.
///
/// This is a convenience function equivalent to printing
/// [`generate_report()`].
pub fn print_report() {
    Registry::global().print_to_stdout();
}
