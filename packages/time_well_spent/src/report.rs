//! Rendering of recorded section statistics.

use std::collections::HashMap;
use std::fmt;

use crate::registry::Tree;
use crate::section_metrics::{NodeId, SectionMetrics};

/// Thread-safe snapshot of a registry's section tree.
///
/// A `Report` contains the statistics captured by a
/// [`Registry`](crate::Registry) at one point in time and can be sent to
/// other threads, stored, or rendered while measurements continue. Sections
/// are sorted by name at every level so output is deterministic.
///
/// The [`Display`](fmt::Display) implementation renders the indented report
/// described on [`generate_report`](crate::generate_report).
///
/// # Examples
///
/// ```
/// use time_well_spent::Registry;
///
/// let registry = Registry::new();
/// {
///     let _section = registry.begin("work");
/// }
///
/// let report = registry.to_report();
/// for section in report.sections() {
///     println!("{} ran {} times", section.name(), section.call_count());
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Report {
    roots: Vec<ReportSection>,
}

/// Statistics for a single section at one position in the nesting tree.
///
/// All durations are in milliseconds of wall-clock time.
#[derive(Clone, Debug)]
pub struct ReportSection {
    name: String,
    total_ms: f64,
    call_count: u64,
    min_ms: f64,
    max_ms: f64,
    std_dev_ms: f64,
    children: Vec<ReportSection>,
}

impl Report {
    /// Creates a report by walking the tree under its lock.
    ///
    /// The caller holds the tree lock for the duration of this call, so the
    /// snapshot is consistent across the whole tree.
    pub(crate) fn from_tree(tree: &Tree) -> Self {
        Self {
            roots: snapshot_level(tree, &tree.roots),
        }
    }

    /// Whether any section has been recorded or is currently open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Returns an iterator over the top-level sections.
    ///
    /// This allows programmatic access to the same data that would be printed
    /// by [`print_to_stdout()`](Self::print_to_stdout).
    pub fn sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.roots.iter()
    }

    /// Prints the report to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        print!("{self}");
    }
}

/// Snapshots one name-to-node mapping (the root table or one node's
/// children), sorted by section name.
fn snapshot_level(tree: &Tree, level: &HashMap<String, NodeId>) -> Vec<ReportSection> {
    let mut sections: Vec<ReportSection> = level
        .iter()
        .map(|(name, id)| snapshot_node(tree, name, *id))
        .collect();
    sections.sort_by(|a, b| a.name.cmp(&b.name));
    sections
}

fn snapshot_node(tree: &Tree, name: &str, id: NodeId) -> ReportSection {
    let node: &SectionMetrics = tree.node(id);

    ReportSection {
        name: name.to_owned(),
        total_ms: node.total_ms,
        call_count: node.call_count,
        min_ms: node.reported_min_ms(),
        max_ms: node.max_ms,
        std_dev_ms: node.std_dev_ms(),
        children: snapshot_level(tree, &node.children),
    }
}

impl ReportSection {
    /// The section's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total wall-clock time recorded, in milliseconds.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.total_ms
    }

    /// Number of completed measurements folded into this section.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Mean time per call in milliseconds, or zero if nothing was recorded.
    #[must_use]
    pub fn mean(&self) -> f64 {
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

    /// Minimum single-call time in milliseconds, or zero if nothing was
    /// recorded.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min_ms
    }

    /// Maximum single-call time in milliseconds.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max_ms
    }

    /// Standard deviation of the recorded times in milliseconds.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.std_dev_ms
    }

    /// The sections nested directly under this one, sorted by name.
    #[must_use]
    pub fn children(&self) -> &[ReportSection] {
        &self.children
    }

    fn write_indented(
        &self,
        f: &mut fmt::Formatter<'_>,
        depth: usize,
        parent_total_ms: f64,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let percent_of_parent = if parent_total_ms > 0.0 {
            self.total_ms / parent_total_ms * 100.0
        } else {
            100.0
        };

        writeln!(
            f,
            "{indent}{:<30}  Total: {:>10.3} ms  Avg: {:>8.3} ms  Min: {:>8.3} ms  Max: {:>8.3} ms  StdDev: {:>8.3} ms  {:>5.1}% of parent",
            self.name,
            self.total_ms,
            self.mean(),
            self.min_ms,
            self.max_ms,
            self.std_dev_ms,
            percent_of_parent,
        )?;

        for child in &self.children {
            let child_depth = depth.checked_add(1).expect(
                "section nesting depth overflows usize - this indicates an unrealistic scenario",
            );
            child.write_indented(f, child_depth, self.total_ms)?;
        }

        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Profiling Report ===")?;

        for section in &self.roots {
            // Roots have no parent baseline, so they always render as 100%.
            section.write_indented(f, 0, 0.0)?;
        }

        writeln!(f, "========================")
    }
}
