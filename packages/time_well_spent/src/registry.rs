use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use crate::pal::{Platform, PlatformFacade};
use crate::section_metrics::{NodeId, SectionMetrics};
use crate::{ERR_POISONED_LOCK, Report, SectionGuard};

/// The process-wide registry used by the free functions at the crate root.
static GLOBAL_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Source of unique registry identifiers, used to tag thread-local stack
/// frames so that independent registries never see each other's sections as
/// parents.
static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// The active-section stack of the current thread, one stack per registry.
    ///
    /// Holds the node ids of the sections currently open on this thread, in
    /// nesting order. Only ever manipulated by [`Registry::begin`] and guard
    /// drop on the owning thread; guards are `!Send` so the pop always
    /// happens on the thread that pushed.
    static ACTIVE_SECTIONS: RefCell<HashMap<u64, Vec<NodeId>>> =
        RefCell::new(HashMap::new());
}

/// The shared section tree: the root table plus the arena holding every node.
///
/// Nodes live in an append-only arena and are addressed by [`NodeId`], so a
/// resolved id stays valid for the lifetime of the registry while the single
/// mutex around this structure serializes all access.
#[derive(Debug, Default)]
pub(crate) struct Tree {
    pub(crate) nodes: Vec<SectionMetrics>,
    pub(crate) roots: HashMap<String, NodeId>,
}

impl Tree {
    /// Resolves the node for `name` under `parent`, creating a zero-valued
    /// node on first use.
    ///
    /// With no parent the name is resolved in the root table. Resolution is
    /// infallible and the same (parent, name) pair always yields the same id.
    fn resolve_or_create(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        let existing = match parent {
            Some(parent_id) => self.node(parent_id).children.get(name).copied(),
            None => self.roots.get(name).copied(),
        };

        if let Some(id) = existing {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(SectionMetrics::default());

        match parent {
            Some(parent_id) => {
                self.node_mut(parent_id)
                    .children
                    .insert(name.to_owned(), id);
            }
            None => {
                self.roots.insert(name.to_owned(), id);
            }
        }

        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &SectionMetrics {
        self.nodes
            .get(id.0)
            .expect("node ids are only ever created by this tree")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut SectionMetrics {
        self.nodes
            .get_mut(id.0)
            .expect("node ids are only ever created by this tree")
    }
}

/// Owns the shared section tree and hands out scoped guards that measure
/// into it.
///
/// A registry aggregates wall-clock measurements from every thread into one
/// tree of named sections, with parent/child relationships determined by the
/// dynamic nesting of open guards on each thread. Most callers use the
/// process-wide instance through [`begin_section`](crate::begin_section) and
/// friends; separate instances exist mainly so tests can profile in
/// isolation.
///
/// # Examples
///
/// ```
/// use time_well_spent::Registry;
///
/// let registry = Registry::new();
///
/// {
///     let _outer = registry.begin("load");
///     for _ in 0..3 {
///         let _inner = registry.begin("parse");
///         // Work measured under "load" -> "parse".
///     }
/// }
///
/// registry.print_to_stdout();
/// ```
#[derive(Debug)]
pub struct Registry {
    id: u64,
    tree: Mutex<Tree>,
    platform: PlatformFacade,
}

impl Registry {
    /// Creates a new, empty registry using the real monotonic clock.
    #[expect(
        clippy::new_without_default,
        reason = "to avoid ambiguity with the notion of a 'default registry', which is the process-wide one from global()"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform_impl(PlatformFacade::real())
    }

    /// Returns the process-wide registry.
    ///
    /// The instance is created lazily on first use and lives for the rest of
    /// the process; it is never torn down. The free functions at the crate
    /// root all operate on this instance.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_REGISTRY
    }

    /// Creates a new registry with a specific platform.
    ///
    /// This method is primarily used for testing purposes to inject a fake
    /// clock that does not rely on real time passing.
    #[cfg(test)]
    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self::with_platform_impl(platform)
    }

    fn with_platform_impl(platform: PlatformFacade) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            tree: Mutex::new(Tree::default()),
            platform,
        }
    }

    /// Opens a named section, measuring from now until the returned guard is
    /// dropped.
    ///
    /// The section becomes a child of the innermost section currently open on
    /// the calling thread, or a root section if none is open. Repeatedly
    /// opening the same name in the same position accumulates into one node,
    /// so a section inside a loop ends up with one row whose call count is
    /// the iteration count.
    ///
    /// # Examples
    ///
    /// ```
    /// use time_well_spent::Registry;
    ///
    /// let registry = Registry::new();
    /// {
    ///     let _section = registry.begin("simulation_step");
    ///     // Work to measure happens here.
    /// } // Elapsed wall-clock time is recorded here.
    /// ```
    pub fn begin(&self, name: impl Into<String>) -> SectionGuard<'_> {
        let name = name.into();
        let start = self.platform.wall_time();

        let parent = ACTIVE_SECTIONS.with_borrow(|stacks| {
            stacks
                .get(&self.id)
                .and_then(|stack| stack.last().copied())
        });

        let node = {
            let mut tree = self.tree.lock().expect(ERR_POISONED_LOCK);
            tree.resolve_or_create(parent, &name)
        };

        ACTIVE_SECTIONS.with_borrow_mut(|stacks| {
            stacks.entry(self.id).or_default().push(node);
        });

        SectionGuard::new(self, node, start)
    }

    /// Opens a section named after the caller's source location.
    ///
    /// Equivalent to [`begin`](Self::begin) with a `file:line` name derived
    /// from the call site, for instrumenting a region without inventing a
    /// label for it.
    #[track_caller]
    pub fn begin_here(&self) -> SectionGuard<'_> {
        let location = Location::caller();
        self.begin(format!("{}:{}", location.file(), location.line()))
    }

    /// Settles one measurement: folds the elapsed time into the node and
    /// pops the calling thread's active-section stack.
    ///
    /// Called exactly once per guard, from its drop. The guard is `!Send`,
    /// so this runs on the thread that pushed the matching stack entry and
    /// the pop is strictly LIFO.
    pub(crate) fn settle(&self, node: NodeId, elapsed: Duration) {
        {
            let mut tree = self.tree.lock().expect(ERR_POISONED_LOCK);
            tree.node_mut(node).record(elapsed);
        }

        ACTIVE_SECTIONS.with_borrow_mut(|stacks| {
            let stack = stacks
                .get_mut(&self.id)
                .expect("a guard can only settle on the thread that armed it");

            let popped = stack.pop();
            debug_assert_eq!(popped, Some(node), "active-section stack must be LIFO");

            if stack.is_empty() {
                stacks.remove(&self.id);
            }
        });
    }

    pub(crate) fn platform(&self) -> &PlatformFacade {
        &self.platform
    }

    /// Creates a thread-safe report from this registry.
    ///
    /// The report is a consistent snapshot of the whole section tree: the
    /// tree lock is held across the entire traversal, so measurements that
    /// settle concurrently are either fully included or not at all.
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
    /// print!("{report}");
    /// ```
    #[must_use]
    pub fn to_report(&self) -> Report {
        let tree = self.tree.lock().expect(ERR_POISONED_LOCK);
        Report::from_tree(&tree)
    }

    /// Prints the profiling report to stdout.
    ///
    /// This is a convenience method equivalent to printing
    /// [`to_report()`](Self::to_report).
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        print!("{}", self.to_report());
    }

    /// Whether any section has ever been opened in this registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let tree = self.tree.lock().expect(ERR_POISONED_LOCK);
        tree.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::FakePlatform;

    fn create_test_registry() -> (Registry, FakePlatform) {
        let fake_platform = FakePlatform::new();
        let registry = Registry::with_platform(PlatformFacade::fake(fake_platform.clone()));
        (registry, fake_platform)
    }

    fn root_section<'a>(report: &'a Report, name: &str) -> &'a crate::ReportSection {
        report
            .sections()
            .find(|section| section.name() == name)
            .expect("expected section missing from report")
    }

    #[test]
    fn new_registry_is_empty() {
        let (registry, _) = create_test_registry();
        assert!(registry.is_empty());
    }

    #[test]
    fn opened_section_appears_in_report() {
        let (registry, _) = create_test_registry();

        {
            let _section = registry.begin("work");
        }

        assert!(!registry.is_empty());
        let report = registry.to_report();
        assert_eq!(root_section(&report, "work").call_count(), 1);
    }

    #[test]
    fn records_elapsed_wall_time() {
        let (registry, clock) = create_test_registry();
        clock.set_wall_time(Duration::from_millis(10));

        {
            let _section = registry.begin("work");
            clock.set_wall_time(Duration::from_millis(50));
        }

        let report = registry.to_report();
        let work = root_section(&report, "work");
        assert_eq!(work.call_count(), 1);
        assert!((work.total() - 40.0).abs() < 1e-9);
        assert!((work.min() - 40.0).abs() < 1e-9);
        assert!((work.max() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn nested_section_becomes_child_not_root() {
        let (registry, clock) = create_test_registry();

        {
            let _outer = registry.begin("outer");
            {
                let _inner = registry.begin("inner");
                clock.advance(Duration::from_millis(5));
            }
        }

        let report = registry.to_report();
        assert_eq!(report.sections().count(), 1, "inner must not be a root");

        let outer = root_section(&report, "outer");
        let inner = outer
            .children()
            .iter()
            .find(|child| child.name() == "inner")
            .expect("inner must be a child of outer");
        assert_eq!(inner.call_count(), 1);
        assert!((inner.total() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn same_name_same_parent_accumulates_into_one_node() {
        let (registry, clock) = create_test_registry();

        {
            let _outer = registry.begin("outer");
            for _ in 0..2 {
                let _inner = registry.begin("inner");
                clock.advance(Duration::from_millis(5));
            }
        }

        let report = registry.to_report();
        let outer = root_section(&report, "outer");
        assert_eq!(outer.children().len(), 1);

        let inner = outer.children().first().expect("child checked above");
        assert_eq!(inner.call_count(), 2);
        assert!((inner.total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sequential_roots_with_same_name_share_a_node() {
        let (registry, clock) = create_test_registry();

        for _ in 0..3 {
            let _section = registry.begin("step");
            clock.advance(Duration::from_millis(2));
        }

        let report = registry.to_report();
        assert_eq!(report.sections().count(), 1);

        let step = root_section(&report, "step");
        assert_eq!(step.call_count(), 3);
        assert!((step.total() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn sibling_after_closed_sibling_resolves_under_outer() {
        let (registry, _) = create_test_registry();

        {
            let _outer = registry.begin("outer");
            {
                let _first = registry.begin("first");
            }
            {
                let _second = registry.begin("second");
            }
        }

        let report = registry.to_report();
        let outer = root_section(&report, "outer");
        let mut child_names: Vec<_> = outer
            .children()
            .iter()
            .map(|child| child.name().to_owned())
            .collect();
        child_names.sort();
        assert_eq!(child_names, ["first", "second"]);
    }

    #[test]
    fn section_after_nesting_unwinds_back_to_root() {
        let (registry, _) = create_test_registry();

        {
            let _outer = registry.begin("outer");
            let _inner = registry.begin("inner");
        }
        {
            let _later = registry.begin("later");
        }

        let report = registry.to_report();
        let mut root_names: Vec<_> = report
            .sections()
            .map(|section| section.name().to_owned())
            .collect();
        root_names.sort();
        assert_eq!(root_names, ["later", "outer"]);
    }

    #[test]
    fn recursive_nesting_creates_child_of_same_name() {
        let (registry, _) = create_test_registry();

        {
            let _outer = registry.begin("fibonacci");
            {
                let _inner = registry.begin("fibonacci");
            }
        }

        let report = registry.to_report();
        let outer = root_section(&report, "fibonacci");
        assert_eq!(outer.call_count(), 1);
        assert_eq!(outer.children().len(), 1);
        assert_eq!(
            outer.children().first().map(crate::ReportSection::name),
            Some("fibonacci")
        );
    }

    #[test]
    fn early_exit_still_settles_the_section() {
        fn early_return(registry: &Registry, clock: &FakePlatform) -> u32 {
            let _section = registry.begin("early");
            clock.advance(Duration::from_millis(3));
            if clock.wall_time() > Duration::ZERO {
                return 1;
            }
            0
        }

        let (registry, clock) = create_test_registry();
        assert_eq!(early_return(&registry, &clock), 1);

        let report = registry.to_report();
        let early = root_section(&report, "early");
        assert_eq!(early.call_count(), 1);
        assert!((early.total() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn separate_registries_do_not_share_nesting_context() {
        let (registry_a, _) = create_test_registry();
        let (registry_b, _) = create_test_registry();

        {
            let _outer = registry_a.begin("outer");
            // Opened while registry_a has an active section on this thread,
            // but it belongs to registry_b and must become a root there.
            let _other = registry_b.begin("other");
        }

        let report_b = registry_b.to_report();
        assert_eq!(report_b.sections().count(), 1);
        assert_eq!(root_section(&report_b, "other").call_count(), 1);

        let report_a = registry_a.to_report();
        let outer = root_section(&report_a, "outer");
        assert!(outer.children().is_empty());
    }

    #[test]
    fn begin_here_names_the_call_site() {
        let (registry, _) = create_test_registry();

        {
            let _section = registry.begin_here();
        }

        let report = registry.to_report();
        let section = report.sections().next().expect("one section expected");
        assert!(
            section.name().contains("registry.rs"),
            "section name should carry the call-site file: got {}",
            section.name()
        );
        assert!(
            section.name().rsplit(':').next().is_some_and(|line| {
                line.parse::<u32>().is_ok()
            }),
            "section name should end with the call-site line: got {}",
            section.name()
        );
    }

    #[test]
    fn global_returns_the_same_instance() {
        let first = Registry::global();
        let second = Registry::global();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn node_identity_is_stable_across_resolutions() {
        let mut tree = Tree::default();

        let first = tree.resolve_or_create(None, "a");
        let child = tree.resolve_or_create(Some(first), "b");
        let first_again = tree.resolve_or_create(None, "a");
        let child_again = tree.resolve_or_create(Some(first), "b");

        assert_eq!(first, first_again);
        assert_eq!(child, child_again);
        assert_ne!(first, child);
    }

    // The registry is shared across all instrumented threads.
    static_assertions::assert_impl_all!(Registry: Send, Sync);
}
