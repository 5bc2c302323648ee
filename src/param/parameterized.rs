//! Parameterized objects: named parameter sets with change notification
//!
//! A [`Parameterized`] is a cheap, clonable handle to shared single-threaded
//! state. Watchers are notified synchronously, in registration order, and
//! only when the watched attribute actually changes. No internal borrow is
//! held while a watcher runs, so callbacks are free to read or write the
//! object again.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::error::{ParamError, Result};

use super::depends::Dependency;
use super::parameter::{Bounds, Parameter};
use super::value::Value;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a parameterized object
pub type ObjectId = u64;

/// Which attribute of a parameter changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum What {
    Value,
    Constant,
    Precedence,
    Label,
    Objects,
    Bounds,
    Step,
}

/// Handle returned by [`Parameterized::watch`], used for precise removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

/// A single change notification
#[derive(Debug, Clone)]
pub struct Event {
    pub object: Parameterized,
    pub name: String,
    pub what: What,
    pub old: Value,
    pub new: Value,
}

type Callback = Rc<dyn Fn(&Event)>;

struct Watcher {
    id: WatcherId,
    names: Vec<String>,
    what: What,
    callback: Callback,
}

struct ParameterizedInner {
    id: ObjectId,
    name: String,
    params: Vec<Parameter>,
    watchers: Vec<Watcher>,
    next_watcher: u64,
    /// Declared dependency paths per method name, e.g. `["x", "sub.y"]`
    method_deps: HashMap<String, Vec<String>>,
}

/// Shared handle to a parameterized object
#[derive(Clone)]
pub struct Parameterized {
    inner: Rc<RefCell<ParameterizedInner>>,
}

/// Non-owning handle, used by listeners that must not keep an object alive
#[derive(Clone)]
pub struct WeakParameterized {
    inner: Weak<RefCell<ParameterizedInner>>,
}

impl WeakParameterized {
    pub fn upgrade(&self) -> Option<Parameterized> {
        self.inner.upgrade().map(|inner| Parameterized { inner })
    }
}

impl fmt::Debug for Parameterized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Parameterized")
            .field("id", &inner.id)
            .field("name", &inner.name)
            .field("params", &inner.params.len())
            .finish()
    }
}

impl Parameterized {
    /// Create an empty object with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ParameterizedInner {
                id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                params: Vec::new(),
                watchers: Vec::new(),
                next_watcher: 0,
                method_deps: HashMap::new(),
            })),
        }
    }

    /// Builder-style parameter declaration
    pub fn with_param(self, param: Parameter) -> Self {
        self.add_param(param);
        self
    }

    /// Declare a parameter; redeclaring a name replaces it in place
    pub fn add_param(&self, param: Parameter) {
        let mut inner = self.inner.borrow_mut();
        match inner.params.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => inner.params.push(param),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.borrow().id
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn ptr_eq(&self, other: &Parameterized) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakParameterized {
        WeakParameterized {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> Vec<String> {
        self.inner.borrow().params.iter().map(|p| p.name.clone()).collect()
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.inner.borrow().params.iter().any(|p| p.name == name)
    }

    /// Snapshot of a parameter descriptor
    pub fn get(&self, name: &str) -> Option<Parameter> {
        self.inner.borrow().params.iter().find(|p| p.name == name).cloned()
    }

    /// Declaration index of a parameter
    pub fn position(&self, name: &str) -> Option<usize> {
        self.inner.borrow().params.iter().position(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        self.inner
            .borrow()
            .params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
    }

    /// Validate and set a parameter value, notifying value watchers on change
    pub fn set_param(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let old = {
            let mut inner = self.inner.borrow_mut();
            let object = inner.name.clone();
            let param = inner
                .params
                .iter_mut()
                .find(|p| p.name == name)
                .ok_or_else(|| ParamError::UnknownParameter {
                    object,
                    name: name.to_string(),
                })?;
            if param.constant {
                return Err(ParamError::ConstantParameter {
                    name: name.to_string(),
                });
            }
            param.validate(&value)?;
            if param.value == value {
                return Ok(());
            }
            std::mem::replace(&mut param.value, value.clone())
        };
        self.notify(name, What::Value, old, value);
        Ok(())
    }

    /// Set several values, stopping at the first failure
    pub fn set_params<'a>(&self, values: impl IntoIterator<Item = (&'a str, Value)>) -> Result<()> {
        for (name, value) in values {
            self.set_param(name, value)?;
        }
        Ok(())
    }

    pub fn set_precedence(&self, name: &str, precedence: Option<f64>) -> Result<()> {
        self.update_attr(name, What::Precedence, |p| {
            let old = opt_float(p.precedence);
            p.precedence = precedence;
            (old, opt_float(precedence))
        })
    }

    pub fn set_constant(&self, name: &str, constant: bool) -> Result<()> {
        self.update_attr(name, What::Constant, |p| {
            let old = Value::Bool(p.constant);
            p.constant = constant;
            (old, Value::Bool(constant))
        })
    }

    pub fn set_label(&self, name: &str, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        self.update_attr(name, What::Label, |p| {
            let old = Value::Str(std::mem::replace(&mut p.label, label.clone()));
            (old, Value::Str(label))
        })
    }

    pub fn set_objects(&self, name: &str, objects: Vec<Value>) -> Result<()> {
        self.update_attr(name, What::Objects, |p| {
            let old = Value::List(std::mem::replace(&mut p.objects, objects.clone()));
            (old, Value::List(objects))
        })
    }

    pub fn set_bounds(&self, name: &str, bounds: Option<Bounds>) -> Result<()> {
        self.update_attr(name, What::Bounds, |p| {
            let old = bounds_value(p.bounds);
            p.bounds = bounds;
            (old, bounds_value(bounds))
        })
    }

    pub fn set_step(&self, name: &str, step: Option<f64>) -> Result<()> {
        self.update_attr(name, What::Step, |p| {
            let old = opt_float(p.step);
            p.step = step;
            (old, opt_float(step))
        })
    }

    fn update_attr(
        &self,
        name: &str,
        what: What,
        apply: impl FnOnce(&mut Parameter) -> (Value, Value),
    ) -> Result<()> {
        let (old, new) = {
            let mut inner = self.inner.borrow_mut();
            let object = inner.name.clone();
            let param = inner
                .params
                .iter_mut()
                .find(|p| p.name == name)
                .ok_or_else(|| ParamError::UnknownParameter {
                    object,
                    name: name.to_string(),
                })?;
            apply(param)
        };
        if old != new {
            self.notify(name, what, old, new);
        }
        Ok(())
    }

    /// Register a callback for changes of `what` on any of `names`
    pub fn watch(&self, names: &[&str], what: What, callback: impl Fn(&Event) + 'static) -> WatcherId {
        let mut inner = self.inner.borrow_mut();
        let id = WatcherId(inner.next_watcher);
        inner.next_watcher += 1;
        inner.watchers.push(Watcher {
            id,
            names: names.iter().map(|n| n.to_string()).collect(),
            what,
            callback: Rc::new(callback),
        });
        id
    }

    /// Remove a watcher; returns whether it was registered
    pub fn unwatch(&self, id: WatcherId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.watchers.len();
        inner.watchers.retain(|w| w.id != id);
        before != inner.watchers.len()
    }

    /// Number of registered watchers
    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    fn is_watching(&self, id: WatcherId) -> bool {
        self.inner.borrow().watchers.iter().any(|w| w.id == id)
    }

    fn notify(&self, name: &str, what: What, old: Value, new: Value) {
        let targets: Vec<(WatcherId, Callback)> = self
            .inner
            .borrow()
            .watchers
            .iter()
            .filter(|w| w.what == what && w.names.iter().any(|n| n == name))
            .map(|w| (w.id, Rc::clone(&w.callback)))
            .collect();
        if targets.is_empty() {
            return;
        }
        debug!("{}.{} {:?} changed, notifying {} watcher(s)", self.name(), name, what, targets.len());
        let event = Event {
            object: self.clone(),
            name: name.to_string(),
            what,
            old,
            new,
        };
        for (id, callback) in targets {
            // an earlier callback in this cycle may have removed a later one
            if self.is_watching(id) {
                callback(&event);
            }
        }
    }

    /// Declare the parameters a method depends on. Dotted paths such as
    /// `"sub.x"` follow nested parameterized values.
    pub fn depends_on(&self, method: &str, paths: &[&str]) {
        self.inner
            .borrow_mut()
            .method_deps
            .insert(method.to_string(), paths.iter().map(|p| p.to_string()).collect());
    }

    /// Resolve the current dependency set of a method. Without a declaration
    /// the method depends on every parameter of the object.
    pub fn params_depended_on(&self, method: &str) -> Vec<Dependency> {
        let declared = self.inner.borrow().method_deps.get(method).cloned();
        let Some(paths) = declared else {
            return self
                .param_names()
                .into_iter()
                .map(|name| Dependency::new(self, &name, What::Value))
                .collect();
        };

        let mut deps: Vec<Dependency> = Vec::new();
        for path in paths {
            for dep in self.resolve_path(&path) {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
        deps
    }

    fn resolve_path(&self, path: &str) -> Vec<Dependency> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let mut deps = vec![Dependency::new(self, head, What::Value)];
        if let Some(rest) = rest {
            if let Some(Value::Object(sub)) = self.value(head) {
                deps.extend(sub.resolve_path(rest));
            }
        }
        deps
    }
}

fn opt_float(value: Option<f64>) -> Value {
    value.map(Value::Float).unwrap_or(Value::None)
}

fn bounds_value(bounds: Option<Bounds>) -> Value {
    match bounds {
        None => Value::None,
        Some((lo, hi)) => Value::Tuple(vec![opt_float(lo), opt_float(hi)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn example() -> Parameterized {
        Parameterized::new("Example")
            .with_param(Parameter::number("a", 0.0).with_bounds(0.0, 10.0))
            .with_param(Parameter::boolean("b", false))
    }

    #[test]
    fn test_declaration_order() {
        assert_eq!(example().param_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_set_param_notifies_once_on_change() {
        let obj = example();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        obj.watch(&["a"], What::Value, move |_| c.set(c.get() + 1));

        obj.set_param("a", 5.0).unwrap();
        obj.set_param("a", 5.0).unwrap();
        obj.set_param("b", true).unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(obj.value("a"), Some(Value::Float(5.0)));
    }

    #[test]
    fn test_set_param_errors() {
        let obj = example();
        assert!(matches!(obj.set_param("zz", 1.0), Err(ParamError::UnknownParameter { .. })));
        assert!(matches!(obj.set_param("a", 50.0), Err(ParamError::OutOfBounds { .. })));
        obj.set_constant("a", true).unwrap();
        assert!(matches!(obj.set_param("a", 1.0), Err(ParamError::ConstantParameter { .. })));
    }

    #[test]
    fn test_unwatch_removes_precisely() {
        let obj = example();
        let count = Rc::new(Cell::new(0));
        let c1 = count.clone();
        let c2 = count.clone();
        let w1 = obj.watch(&["a"], What::Value, move |_| c1.set(c1.get() + 1));
        let _w2 = obj.watch(&["a"], What::Value, move |_| c2.set(c2.get() + 10));
        assert!(obj.unwatch(w1));
        assert!(!obj.unwatch(w1));
        obj.set_param("a", 1.0).unwrap();
        assert_eq!(count.get(), 10);
    }

    #[test]
    fn test_metadata_events_carry_kind() {
        let obj = example();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        obj.watch(&["a"], What::Precedence, move |e| s.borrow_mut().push(e.new.clone()));
        obj.set_precedence("a", Some(2.0)).unwrap();
        obj.set_precedence("a", Some(2.0)).unwrap();
        obj.set_precedence("a", None).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::Float(2.0), Value::None]);
    }

    #[test]
    fn test_watcher_may_write_back() {
        let obj = example();
        let o = obj.clone();
        obj.watch(&["a"], What::Value, move |e| {
            let flag = e.new.as_f64().unwrap_or(0.0) > 3.0;
            o.set_param("b", flag).unwrap();
        });
        obj.set_param("a", 4.0).unwrap();
        assert_eq!(obj.value("b"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_params_depended_on_follows_nested_objects() {
        let sub = Parameterized::new("Sub").with_param(Parameter::integer("y", 1));
        let obj = Parameterized::new("Owner")
            .with_param(Parameter::integer("x", 0))
            .with_param(Parameter::object("sub", sub.clone()));
        obj.depends_on("view", &["x", "sub.y"]);

        let deps = obj.params_depended_on("view");
        assert_eq!(deps.len(), 3);
        assert!(deps.contains(&Dependency::new(&sub, "y", What::Value)));

        let all = obj.params_depended_on("undeclared");
        assert_eq!(all.len(), 2);
    }
}
