//! Declared dependencies of reactive callables

use std::fmt;

use super::parameterized::{ObjectId, Parameterized, What};
use super::value::Value;

/// One `(owner, parameter, change kind)` triple an output depends on
#[derive(Clone)]
pub struct Dependency {
    pub owner: Parameterized,
    pub name: String,
    pub what: What,
}

impl Dependency {
    pub fn new(owner: &Parameterized, name: &str, what: What) -> Self {
        Self {
            owner: owner.clone(),
            name: name.to_string(),
            what,
        }
    }

    /// Value dependency on `owner.name`
    pub fn value(owner: &Parameterized, name: &str) -> Self {
        Self::new(owner, name, What::Value)
    }

    /// Live value of the dependency
    pub fn current(&self) -> Value {
        self.owner.value(&self.name).unwrap_or_default()
    }

    /// Grouping key used when subscribing several names with one watcher
    pub fn group_key(&self) -> (ObjectId, What) {
        (self.owner.id(), self.what)
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.owner.ptr_eq(&other.owner) && self.name == other.name && self.what == other.what
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{:?}", self.owner.name(), self.name, self.what)
    }
}

/// Positional and keyword dependencies declared for a function
#[derive(Clone, Debug, Default)]
pub struct Depends {
    pub args: Vec<Dependency>,
    pub kwargs: Vec<(String, Dependency)>,
}

impl Depends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, dep: Dependency) -> Self {
        self.args.push(dep);
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, dep: Dependency) -> Self {
        self.kwargs.push((key.into(), dep));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Every dependency, positional first
    pub fn all(&self) -> Vec<Dependency> {
        self.args
            .iter()
            .cloned()
            .chain(self.kwargs.iter().map(|(_, d)| d.clone()))
            .collect()
    }
}

/// Live argument values passed to a reactive callable
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl Args {
    /// Read the current values of every declared dependency
    pub fn resolve(depends: &Depends) -> Self {
        Self {
            positional: depends.args.iter().map(Dependency::current).collect(),
            keyword: depends
                .kwargs
                .iter()
                .map(|(k, d)| (k.clone(), d.current()))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn kw(&self, key: &str) -> Option<&Value> {
        self.keyword.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Group dependencies by `(owner, what)` preserving first-seen order,
/// so each group can be subscribed with a single watcher
pub fn group_dependencies(deps: &[Dependency]) -> Vec<Vec<Dependency>> {
    let mut groups: Vec<Vec<Dependency>> = Vec::new();
    for dep in deps {
        match groups.iter_mut().find(|g| g[0].group_key() == dep.group_key()) {
            Some(group) => group.push(dep.clone()),
            None => groups.push(vec![dep.clone()]),
        }
    }
    groups
}
