//! Initialise parameter values from JSON supplied via a file or environment variable
//!
//! Three sources are consulted, in order:
//! 1. an explicit `json_file`
//! 2. a `.json` path stored in the environment variable
//! 3. JSON text stored directly in the environment variable
//!
//! e.g. `PARAM_JSON_INIT='{"p1": 5}' my-app` sets `p1` to 5 on every object
//! initialised with the default variable name.

use std::path::PathBuf;

use log::{debug, warn};

use crate::constants::json_init::DEFAULT_VARNAME;
use crate::error::{ParamError, Result};

use super::parameterized::Parameterized;
use super::value::Value;

/// JSON-driven initializer for parameter values
#[derive(Debug, Clone)]
pub struct JsonInit {
    /// Environment variable holding the JSON text or a `.json` path
    pub varname: String,
    /// Key selecting a sub-dictionary; defaults to the object's name
    pub target: Option<String>,
    /// Explicit JSON file, takes precedence over the environment
    pub json_file: Option<PathBuf>,
}

impl Default for JsonInit {
    fn default() -> Self {
        Self {
            varname: DEFAULT_VARNAME.to_string(),
            target: None,
            json_file: None,
        }
    }
}

impl JsonInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_varname(mut self, varname: impl Into<String>) -> Self {
        self.varname = varname.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_json_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_file = Some(path.into());
        self
    }

    /// Apply the JSON specification to `object`. Problems are reported as
    /// warnings attributed to the object; valid keys are always applied.
    pub fn apply(&self, object: &Parameterized) {
        let owner = object.name();
        let env_var = std::env::var(&self.varname).ok();
        let spec = match self.load(env_var.as_deref()) {
            Ok(Some(spec)) => spec,
            Ok(None) => return,
            Err(err) => {
                warn!("{}: {}", owner, err);
                return;
            }
        };
        self.apply_spec(object, &spec);
    }

    /// Apply an already parsed specification
    pub fn apply_spec(&self, object: &Parameterized, spec: &serde_json::Value) {
        let owner = object.name();
        let Some(root) = spec.as_object() else {
            warn!("{}: JSON parameter specification must be a dictionary.", owner);
            return;
        };

        let target = self.target.clone().unwrap_or_else(|| owner.clone());
        let params = match root.get(&target) {
            Some(serde_json::Value::Object(sub)) => sub,
            _ => root,
        };

        for (name, json) in params {
            match object.set_param(name, Value::from_json(json)) {
                Ok(()) => debug!("{}: initialised '{}' from JSON", owner, name),
                Err(err) => warn!("{}: {}", owner, err),
            }
        }
    }

    fn load(&self, env_var: Option<&str>) -> Result<Option<serde_json::Value>> {
        let file = match (&self.json_file, env_var) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(var)) if var.ends_with(".json") => Some(PathBuf::from(var)),
            (None, Some(_)) => None,
            (None, None) => return Ok(None),
        };

        let text = match file {
            Some(path) => std::fs::read_to_string(&path).map_err(|err| {
                ParamError::Json(format!("could not load JSON file {}: {}", path.display(), err))
            })?,
            None => env_var.unwrap_or_default().to_string(),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Parameter;
    use std::io::Write;

    fn example() -> Parameterized {
        Parameterized::new("Example")
            .with_param(Parameter::integer("p1", 0).with_bounds(0.0, 10.0))
            .with_param(Parameter::string("title", ""))
    }

    #[test]
    fn test_apply_spec_sets_values() {
        let obj = example();
        let spec = serde_json::json!({"p1": 5, "title": "hello"});
        JsonInit::new().apply_spec(&obj, &spec);
        assert_eq!(obj.value("p1"), Some(Value::Int(5)));
        assert_eq!(obj.value("title"), Some(Value::Str("hello".into())));
    }

    #[test]
    fn test_invalid_keys_do_not_block_others() {
        let obj = example();
        let spec = serde_json::json!({"p1": 50, "missing": 1, "title": "kept"});
        JsonInit::new().apply_spec(&obj, &spec);
        assert_eq!(obj.value("p1"), Some(Value::Int(0)));
        assert_eq!(obj.value("title"), Some(Value::Str("kept".into())));
    }

    #[test]
    fn test_non_dictionary_root_is_ignored() {
        let obj = example();
        JsonInit::new().apply_spec(&obj, &serde_json::json!([1, 2, 3]));
        assert_eq!(obj.value("p1"), Some(Value::Int(0)));
    }

    #[test]
    fn test_target_selects_sub_dictionary() {
        let obj = example();
        let spec = serde_json::json!({"Example": {"p1": 3}, "Other": {"p1": 9}});
        JsonInit::new().apply_spec(&obj, &spec);
        assert_eq!(obj.value("p1"), Some(Value::Int(3)));

        JsonInit::new().with_target("Other").apply_spec(&obj, &spec);
        assert_eq!(obj.value("p1"), Some(Value::Int(9)));
    }

    #[test]
    fn test_json_file_source() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"p1": 7}}"#).unwrap();
        let obj = example();
        JsonInit::new()
            .with_varname("PARAMBIND_TEST_UNSET_VAR")
            .with_json_file(file.path())
            .apply(&obj);
        assert_eq!(obj.value("p1"), Some(Value::Int(7)));
    }

    #[test]
    fn test_missing_sources_are_a_no_op() {
        let obj = example();
        JsonInit::new().with_varname("PARAMBIND_TEST_NEVER_SET").apply(&obj);
        assert_eq!(obj.value("p1"), Some(Value::Int(0)));
    }
}
