//! Reactive panes re-rendering a callable whenever its dependencies change
//!
//! # Invariants
//!
//! 1. Each dependency change triggers exactly one re-evaluation.
//! 2. An output of the same pane kind that takes part in no cross-widget
//!    link is merged into the existing pane; anything else replaces it.
//! 3. For methods, the dependency set is recomputed whenever a dependency
//!    changes to or from a parameterized value. Watchers for dependencies that are no
//!    longer present are removed precisely, by owner, change kind and name.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::param::depends::group_dependencies;
use crate::param::{Args, Dependency, Depends, Event, Parameterized, WatcherId, What};
use crate::widgets::{Layout, LayoutKind, Viewable};

use super::links;
use super::pane::{Output, Pane};

/// Evaluation counters, for inspection and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactiveStats {
    pub evaluations: u64,
    pub merges: u64,
    pub replacements: u64,
}

type MethodFn = Rc<dyn Fn(&Parameterized) -> Output>;
type FunctionFn = Rc<dyn Fn(&Args) -> Output>;

#[derive(Clone)]
enum Source {
    /// Method of `owner`; dependencies are resolved from the owner and may change
    Method {
        owner: Parameterized,
        method: String,
        callable: MethodFn,
    },
    /// Free function with statically declared dependencies
    Function { depends: Depends, callable: FunctionFn },
}

impl Source {
    fn evaluate(&self) -> Output {
        match self {
            Source::Method { owner, callable, .. } => callable(owner),
            Source::Function { depends, callable } => callable(&Args::resolve(depends)),
        }
    }

    fn dependencies(&self) -> Vec<Dependency> {
        match self {
            Source::Method { owner, method, .. } => owner.params_depended_on(method),
            Source::Function { depends, .. } => depends.all(),
        }
    }
}

/// One installed watcher covering a group of names on one owner
struct DependencyWatcher {
    owner: Parameterized,
    what: What,
    names: Vec<String>,
    id: WatcherId,
}

impl DependencyWatcher {
    fn covers(&self, dep: &Dependency) -> bool {
        self.owner.ptr_eq(&dep.owner) && self.what == dep.what && self.names.contains(&dep.name)
    }
}

struct ReactiveInner {
    source: Source,
    pane: Pane,
    layout: Layout,
    dependencies: Vec<Dependency>,
    watchers: Vec<DependencyWatcher>,
    stats: ReactiveStats,
}

impl Drop for ReactiveInner {
    fn drop(&mut self) {
        for watcher in self.watchers.drain(..) {
            watcher.owner.unwatch(watcher.id);
        }
    }
}

/// Shared handle to a reactive pane
#[derive(Clone)]
pub struct ReactivePane {
    inner: Rc<RefCell<ReactiveInner>>,
}

impl fmt::Debug for ReactivePane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ReactivePane")
            .field("dependencies", &inner.dependencies)
            .field("stats", &inner.stats)
            .finish()
    }
}

impl From<ReactivePane> for Viewable {
    fn from(pane: ReactivePane) -> Self {
        Viewable::Reactive(pane)
    }
}

impl ReactivePane {
    /// Re-render a method of `owner`. Dependencies come from
    /// [`Parameterized::depends_on`] declarations, or every parameter of the
    /// owner when none are declared.
    pub fn for_method(
        owner: &Parameterized,
        method: &str,
        callable: impl Fn(&Parameterized) -> Output + 'static,
    ) -> Self {
        Self::construct(Source::Method {
            owner: owner.clone(),
            method: method.to_string(),
            callable: Rc::new(callable),
        })
    }

    /// Re-render a function called with the live values of its declared dependencies
    pub fn for_function(depends: Depends, callable: impl Fn(&Args) -> Output + 'static) -> Self {
        Self::construct(Source::Function {
            depends,
            callable: Rc::new(callable),
        })
    }

    fn construct(source: Source) -> Self {
        let pane = Pane::new(source.evaluate());
        let layout = Layout::with_children(LayoutKind::Row, vec![Viewable::Pane(pane.clone())]);
        let reactive = Self {
            inner: Rc::new(RefCell::new(ReactiveInner {
                source,
                pane,
                layout,
                dependencies: Vec::new(),
                watchers: Vec::new(),
                stats: ReactiveStats {
                    evaluations: 1,
                    ..ReactiveStats::default()
                },
            })),
        };
        reactive.subscribe_changes();
        reactive
    }

    pub fn ptr_eq(&self, other: &ReactivePane) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Pane currently holding the output
    pub fn pane(&self) -> Pane {
        self.inner.borrow().pane.clone()
    }

    /// Row wrapping the current pane
    pub fn layout(&self) -> Layout {
        self.inner.borrow().layout.clone()
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.inner.borrow().dependencies.clone()
    }

    pub fn stats(&self) -> ReactiveStats {
        self.inner.borrow().stats
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    /// Invoke the callable with the current dependency values
    pub fn evaluate(&self) -> Output {
        let source = self.inner.borrow().source.clone();
        let output = source.evaluate();
        self.inner.borrow_mut().stats.evaluations += 1;
        output
    }

    /// Re-evaluate and merge the output into the pane, or replace the pane
    pub fn update(&self) {
        let output = self.evaluate();
        let pane = self.pane();
        if pane.kind() == output.pane_kind() && !output.is_linked() {
            pane.merge(output);
            self.inner.borrow_mut().stats.merges += 1;
            return;
        }

        let replacement = Pane::new(output);
        let retained = replacement.widgets();
        {
            let mut inner = self.inner.borrow_mut();
            debug!("replacing {:?} pane with {:?}", pane.kind(), replacement.kind());
            if inner.layout.replace(0, Viewable::Pane(replacement.clone())).is_none() {
                inner.layout.append(Viewable::Pane(replacement.clone()));
            }
            inner.pane = replacement;
            inner.stats.replacements += 1;
        }

        // discarded controls must not keep mirroring into their link targets
        for widget in pane.widgets() {
            if !retained.iter().any(|w| w.ptr_eq(&widget)) {
                links::unlink_widget(&widget);
            }
        }
    }

    /// Remove every dependency watcher
    pub fn dispose(&self) {
        let watchers: Vec<DependencyWatcher> = self.inner.borrow_mut().watchers.drain(..).collect();
        for watcher in watchers {
            watcher.owner.unwatch(watcher.id);
        }
    }

    fn subscribe_changes(&self) {
        let dependencies = self.inner.borrow().source.dependencies();
        self.watch_dependencies(&dependencies);
        self.inner.borrow_mut().dependencies = dependencies;
    }

    /// Install one watcher per `(owner, what)` group
    fn watch_dependencies(&self, dependencies: &[Dependency]) {
        for group in group_dependencies(dependencies) {
            let owner = group[0].owner.clone();
            let what = group[0].what;
            let names: Vec<String> = group.iter().map(|d| d.name.clone()).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let weak = Rc::downgrade(&self.inner);
            let id = owner.watch(&refs, what, move |event| on_dependency_change(&weak, event));
            self.inner.borrow_mut().watchers.push(DependencyWatcher { owner, what, names, id });
        }
    }

    /// Recompute a method's dependency set after a nested object changed
    fn resubscribe(&self) {
        let Source::Method { owner, method, .. } = self.inner.borrow().source.clone() else {
            return;
        };
        let new_deps = owner.params_depended_on(&method);

        let (stale, mut kept) = {
            let mut inner = self.inner.borrow_mut();
            let removed: Vec<Dependency> = inner
                .dependencies
                .iter()
                .filter(|d| !new_deps.contains(d))
                .cloned()
                .collect();
            if removed.is_empty() && new_deps.len() == inner.dependencies.len() {
                return;
            }
            let (stale, kept): (Vec<_>, Vec<_>) = inner
                .watchers
                .drain(..)
                .partition(|w| removed.iter().any(|d| w.covers(d)));
            inner.watchers = kept;
            let still_watched: Vec<Dependency> = inner
                .dependencies
                .iter()
                .filter(|d| new_deps.contains(d) && inner.watchers.iter().any(|w| w.covers(d)))
                .cloned()
                .collect();
            (stale, still_watched)
        };
        for watcher in &stale {
            watcher.owner.unwatch(watcher.id);
        }

        let added: Vec<Dependency> = new_deps.iter().filter(|d| !kept.contains(d)).cloned().collect();
        debug!(
            "{}.{}: {} watcher(s) removed, {} dependency(ies) added",
            owner.name(),
            method,
            stale.len(),
            added.len()
        );
        self.watch_dependencies(&added);
        kept.extend(added);
        self.inner.borrow_mut().dependencies = kept;
    }
}

fn on_dependency_change(weak: &Weak<RefCell<ReactiveInner>>, event: &Event) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let reactive = ReactivePane { inner };
    // a nested object appearing or going away changes the dependency set
    if event.new.is_parameterized() || event.old.is_parameterized() {
        reactive.resubscribe();
    }
    reactive.update();
}
