//! Parameter descriptors: per-attribute metadata plus the current value

use crate::error::{ParamError, Result};

use super::kind::ParamKind;
use super::value::{Action, Value};
use super::parameterized::Parameterized;

/// Lower and upper bound, `None` meaning open-ended on that side
pub type Bounds = (Option<f64>, Option<f64>);

/// Descriptor exposing a discrete set of allowed values
pub trait HasOptions {
    /// Allowed options, or `None` when the descriptor has no options accessor
    fn options(&self) -> Option<Vec<Value>>;
}

/// Descriptor exposing numeric bounds
pub trait HasBounds {
    /// Soft bounds falling back per side to the hard bounds, or `None` when
    /// the descriptor has no bounds accessor at all
    fn soft_bounds(&self) -> Option<Bounds>;
}

/// Metadata and current value for one named attribute of a parameterized object
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub value: Value,
    pub default: Value,
    pub label: String,
    /// Ordering/visibility priority; `None` uses the configured default
    pub precedence: Option<f64>,
    pub constant: bool,
    pub bounds: Option<Bounds>,
    pub softbounds: Option<Bounds>,
    /// Allowed options for selector kinds
    pub objects: Vec<Value>,
    pub step: Option<f64>,
    /// Glob pattern for file selectors
    pub path: Option<String>,
    pub allow_none: bool,
    pub doc: Option<String>,
}

impl Parameter {
    /// Create a descriptor with a value and default of `value`
    pub fn new(name: impl Into<String>, kind: ParamKind, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        Self {
            label: label_from_name(&name),
            allow_none: value.is_none(),
            name,
            kind,
            default: value.clone(),
            value,
            precedence: None,
            constant: false,
            bounds: None,
            softbounds: None,
            objects: Vec::new(),
            step: None,
            path: None,
            doc: None,
        }
    }

    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, ParamKind::Number, value)
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ParamKind::Integer, value)
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, ParamKind::Boolean, value)
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, Value::Str(value.into()))
    }

    pub fn color(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Color, Value::Str(value.into()))
    }

    pub fn date(name: impl Into<String>, timestamp: i64) -> Self {
        Self::new(name, ParamKind::Date, Value::Date(timestamp))
    }

    pub fn range(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(
            name,
            ParamKind::Range,
            Value::Tuple(vec![Value::Float(start), Value::Float(end)]),
        )
    }

    pub fn dict(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Dict, Value::Dict(Default::default()))
    }

    pub fn selector(name: impl Into<String>, value: impl Into<Value>, objects: Vec<Value>) -> Self {
        Self::new(name, ParamKind::Selector, value).with_objects(objects)
    }

    pub fn object_selector(
        name: impl Into<String>,
        value: impl Into<Value>,
        objects: Vec<Value>,
    ) -> Self {
        Self::new(name, ParamKind::ObjectSelector, value).with_objects(objects)
    }

    pub fn list_selector(name: impl Into<String>, value: Vec<Value>, objects: Vec<Value>) -> Self {
        Self::new(name, ParamKind::ListSelector, Value::List(value)).with_objects(objects)
    }

    /// File selector; with a `path` pattern it offers the matching files as options
    pub fn file_selector(name: impl Into<String>, value: impl Into<Value>, path: Option<&str>) -> Self {
        let mut param = Self::new(name, ParamKind::FileSelector, value);
        param.path = path.map(str::to_string);
        param
    }

    pub fn action(name: impl Into<String>, action: impl Fn(&Parameterized) + 'static) -> Self {
        Self::new(name, ParamKind::Action, Value::Action(Action::new(action)))
    }

    /// Generic parameter holding a nested parameterized object
    pub fn object(name: impl Into<String>, object: Parameterized) -> Self {
        Self::new(name, ParamKind::Parameter, Value::Object(object))
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some((Some(lower), Some(upper)));
        self
    }

    /// Bounds where either side may be open-ended
    pub fn with_partial_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_softbounds(mut self, bounds: Bounds) -> Self {
        self.softbounds = Some(bounds);
        self
    }

    pub fn with_precedence(mut self, precedence: f64) -> Self {
        self.precedence = Some(precedence);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_objects(mut self, objects: Vec<Value>) -> Self {
        self.objects = objects;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_allow_none(mut self, allow_none: bool) -> Self {
        self.allow_none = allow_none;
        self
    }

    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    /// Whether this descriptor is invoked rather than valued
    pub fn is_action(&self) -> bool {
        self.kind.is_a(&ParamKind::Action)
    }

    /// Nearest built-in kind in the inheritance chain
    fn base_kind(&self) -> ParamKind {
        self.kind
            .ancestors()
            .into_iter()
            .find(|k| !matches!(k, ParamKind::Custom { .. }))
            .unwrap_or(ParamKind::Parameter)
    }

    /// Check that `value` is acceptable for this descriptor
    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_none() {
            return if self.allow_none {
                Ok(())
            } else {
                Err(self.mismatch(value))
            };
        }

        let kind = self.base_kind();
        let type_ok = match kind {
            ParamKind::Boolean => matches!(value, Value::Bool(_)),
            ParamKind::Integer => matches!(value, Value::Int(_)),
            ParamKind::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            ParamKind::Date => matches!(value, Value::Date(_) | Value::Int(_)),
            ParamKind::String | ParamKind::Color => matches!(value, Value::Str(_)),
            ParamKind::Dict => matches!(value, Value::Dict(_)),
            ParamKind::Tuple => matches!(value, Value::Tuple(_) | Value::List(_)),
            ParamKind::NumericTuple | ParamKind::Range | ParamKind::DateRange => match value {
                Value::Tuple(items) | Value::List(items) => {
                    items.len() == 2 && items.iter().all(|v| v.as_f64().is_some())
                }
                _ => false,
            },
            ParamKind::ListSelector => matches!(value, Value::List(_)),
            ParamKind::Callable | ParamKind::Action => matches!(value, Value::Action(_)),
            _ => true,
        };
        if !type_ok {
            return Err(self.mismatch(value));
        }

        if let Some(x) = value.as_f64() {
            self.check_bounds(x)?;
        }

        if kind.is_a(&ParamKind::Selector) && !self.objects.is_empty() {
            let candidates: Vec<&Value> = match value {
                Value::List(items) if kind == ParamKind::ListSelector => items.iter().collect(),
                other => vec![other],
            };
            for candidate in candidates {
                if !self.objects.contains(candidate) {
                    return Err(ParamError::InvalidOption {
                        name: self.name.clone(),
                        value: candidate.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_bounds(&self, x: f64) -> Result<()> {
        let Some((lower, upper)) = self.bounds else {
            return Ok(());
        };
        let below = lower.is_some_and(|lo| x < lo);
        let above = upper.is_some_and(|hi| x > hi);
        if below || above {
            return Err(ParamError::OutOfBounds {
                name: self.name.clone(),
                value: x,
                bounds: format_bounds(&(lower, upper)),
            });
        }
        Ok(())
    }

    fn mismatch(&self, value: &Value) -> ParamError {
        ParamError::TypeMismatch {
            name: self.name.clone(),
            kind: self.kind.to_string(),
            found: value.type_name().to_string(),
        }
    }
}

impl HasOptions for Parameter {
    fn options(&self) -> Option<Vec<Value>> {
        if self.kind.is_a(&ParamKind::Selector) {
            Some(self.objects.clone())
        } else {
            None
        }
    }
}

impl HasBounds for Parameter {
    fn soft_bounds(&self) -> Option<Bounds> {
        if !(self.kind.is_a(&ParamKind::Number) || self.kind.is_a(&ParamKind::Range)) {
            return None;
        }
        let (hard_lo, hard_hi) = self.bounds.unwrap_or((None, None));
        Some(match self.softbounds {
            None => (hard_lo, hard_hi),
            Some((soft_lo, soft_hi)) => (soft_lo.or(hard_lo), soft_hi.or(hard_hi)),
        })
    }
}

/// Default label derived from a parameter name: `line_width` -> `Line width`
pub fn label_from_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_bounds(bounds: &Bounds) -> String {
    let side = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_else(|| "None".into());
    format!("({}, {})", side(bounds.0), side(bounds.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_name() {
        assert_eq!(label_from_name("line_width"), "Line width");
        assert_eq!(label_from_name("a"), "A");
        assert_eq!(label_from_name(""), "");
    }

    #[test]
    fn test_soft_bounds_fall_back_per_side() {
        let p = Parameter::number("x", 1.0)
            .with_bounds(0.0, 10.0)
            .with_softbounds((None, Some(5.0)));
        assert_eq!(p.soft_bounds(), Some((Some(0.0), Some(5.0))));

        let open = Parameter::number("y", 1.0);
        assert_eq!(open.soft_bounds(), Some((None, None)));

        assert_eq!(Parameter::boolean("b", true).soft_bounds(), None);
    }

    #[test]
    fn test_options_only_for_selectors() {
        let s = Parameter::selector("s", "a", vec!["a".into(), "b".into()]);
        assert_eq!(s.options().map(|o| o.len()), Some(2));
        assert!(Parameter::string("t", "x").options().is_none());
    }

    #[test]
    fn test_validate_bounds_and_types() {
        let p = Parameter::number("a", 0.0).with_bounds(0.0, 10.0);
        assert!(p.validate(&Value::Float(5.0)).is_ok());
        assert!(p.validate(&Value::Int(10)).is_ok());
        assert!(matches!(
            p.validate(&Value::Float(11.0)),
            Err(ParamError::OutOfBounds { .. })
        ));
        assert!(matches!(
            p.validate(&Value::Str("x".into())),
            Err(ParamError::TypeMismatch { .. })
        ));

        let i = Parameter::integer("i", 1);
        assert!(i.validate(&Value::Float(1.0)).is_err());
    }

    #[test]
    fn test_validate_selector_membership() {
        let s = Parameter::selector("s", "a", vec!["a".into(), "b".into()]);
        assert!(s.validate(&"b".into()).is_ok());
        assert!(matches!(
            s.validate(&"c".into()),
            Err(ParamError::InvalidOption { .. })
        ));

        let l = Parameter::list_selector("l", vec![], vec!["a".into(), "b".into()]);
        assert!(l.validate(&Value::List(vec!["a".into(), "b".into()])).is_ok());
        assert!(l.validate(&Value::List(vec!["z".into()])).is_err());
    }

    #[test]
    fn test_custom_kind_validates_as_parent() {
        let p = Parameter::new("pct", ParamKind::custom("Percent", ParamKind::Integer), 5i64)
            .with_bounds(0.0, 100.0);
        assert!(p.validate(&Value::Int(50)).is_ok());
        assert!(p.validate(&Value::Float(0.5)).is_err());
        assert!(p.validate(&Value::Int(101)).is_err());
    }
}
