//! Parameter schemas for models and node behaviors.
//!
//! A schema lists named, typed fields with optional bounds and defaults.
//! Resolving a raw JSON parameter bag against it either yields a complete
//! [`Params`] set or an `InvalidParameter` error naming the offending field.
//! Unknown fields are rejected, missing required fields are never defaulted.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Float { min: Option<f64>, max: Option<f64> },
    Int { min: Option<i64>, max: Option<i64> },
    Bool,
    /// Any JSON value, decoded by the factory.
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    pub name: &'static str,
    pub kind: ParamKind,
    /// `None` marks the field as required.
    pub default: Option<Value>,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<ParamField>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: ParamField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn float(self, name: &'static str, default: Option<f64>, min: Option<f64>, max: Option<f64>) -> Self {
        self.field(ParamField {
            name,
            kind: ParamKind::Float { min, max },
            default: default.map(Value::from),
            description: "",
        })
    }

    pub fn int(self, name: &'static str, default: Option<i64>, min: Option<i64>, max: Option<i64>) -> Self {
        self.field(ParamField {
            name,
            kind: ParamKind::Int { min, max },
            default: default.map(Value::from),
            description: "",
        })
    }

    pub fn boolean(self, name: &'static str, default: Option<bool>) -> Self {
        self.field(ParamField {
            name,
            kind: ParamKind::Bool,
            default: default.map(Value::from),
            description: "",
        })
    }

    pub fn json(self, name: &'static str, default: Option<Value>) -> Self {
        self.field(ParamField {
            name,
            kind: ParamKind::Json,
            default,
            description: "",
        })
    }

    /// Attach a description to the most recently added field.
    pub fn describe(mut self, description: &'static str) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.description = description;
        }
        self
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    /// Validate `raw` (an object, or null for "all defaults") for `owner`.
    pub fn resolve(&self, owner: &str, raw: &Value, seed: u64) -> SimResult<Params> {
        let empty = Map::new();
        let given = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(invalid(owner, "<params>", format!("expected an object, got {}", other)));
            }
        };

        if let Some(unknown) = given.keys().find(|key| !self.fields.iter().any(|f| f.name == key.as_str())) {
            return Err(invalid(owner, unknown, "unknown parameter"));
        }

        let mut values = BTreeMap::new();
        for field in &self.fields {
            let value = match given.get(field.name).or(field.default.as_ref()) {
                Some(value) => value,
                None => return Err(invalid(owner, field.name, "required parameter is missing")),
            };
            values.insert(field.name.to_string(), check(owner, field, value)?);
        }

        Ok(Params {
            owner: owner.to_string(),
            values,
            seed,
        })
    }
}

fn invalid(owner: &str, field: &str, reason: impl Into<String>) -> SimError {
    SimError::InvalidParameter {
        owner: owner.to_string(),
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check(owner: &str, field: &ParamField, value: &Value) -> SimResult<Value> {
    match &field.kind {
        ParamKind::Float { min, max } => {
            let v = value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid(owner, field.name, format!("expected a number, got {}", value)))?;
            if min.is_some_and(|min| v < min) || max.is_some_and(|max| v > max) {
                return Err(invalid(owner, field.name, out_of_range(v, *min, *max)));
            }
            Ok(Value::from(v))
        }
        ParamKind::Int { min, max } => {
            let v = value
                .as_i64()
                .ok_or_else(|| invalid(owner, field.name, format!("expected an integer, got {}", value)))?;
            if min.is_some_and(|min| v < min) || max.is_some_and(|max| v > max) {
                return Err(invalid(owner, field.name, out_of_range(v, *min, *max)));
            }
            Ok(Value::from(v))
        }
        ParamKind::Bool => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err(invalid(owner, field.name, format!("expected true or false, got {}", value)))
            }
        }
        ParamKind::Json => Ok(value.clone()),
    }
}

fn out_of_range<T: std::fmt::Display>(v: T, min: Option<T>, max: Option<T>) -> String {
    let bound = |b: Option<T>| b.map(|b| b.to_string()).unwrap_or_else(|| "..".to_string());
    format!("{} is outside [{}, {}]", v, bound(min), bound(max))
}

/// A resolved, schema-checked parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    owner: String,
    values: BTreeMap<String, Value>,
    seed: u64,
}

impl Params {
    /// Seed of the simulation the parameters were resolved for.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `InvalidParameter` for `field` of this parameter set, for checks
    /// that span several fields.
    pub fn reject(&self, field: &str, reason: impl Into<String>) -> SimError {
        invalid(&self.owner, field, reason)
    }

    fn get(&self, name: &str) -> SimResult<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| invalid(&self.owner, name, "not declared in the schema"))
    }

    pub fn f64(&self, name: &str) -> SimResult<f64> {
        self.get(name)?
            .as_f64()
            .ok_or_else(|| invalid(&self.owner, name, "not a number"))
    }

    pub fn i64(&self, name: &str) -> SimResult<i64> {
        self.get(name)?
            .as_i64()
            .ok_or_else(|| invalid(&self.owner, name, "not an integer"))
    }

    pub fn u64(&self, name: &str) -> SimResult<u64> {
        let v = self.i64(name)?;
        u64::try_from(v).map_err(|_| invalid(&self.owner, name, format!("{} is negative", v)))
    }

    pub fn bool(&self, name: &str) -> SimResult<bool> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| invalid(&self.owner, name, "not a boolean"))
    }

    pub fn json(&self, name: &str) -> SimResult<&Value> {
        self.get(name)
    }

    /// Deserialize a JSON field into `T`.
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> SimResult<T> {
        serde_json::from_value(self.get(name)?.clone()).map_err(|e| invalid(&self.owner, name, e.to_string()))
    }
}
