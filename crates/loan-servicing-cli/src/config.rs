//! Reference date and servicing policy shared by every subcommand.

use std::fs;

use chrono::{Local, NaiveDate};
use serde_json::Value;

use loan_servicing_core::ServicingPolicy;

pub struct Context {
    pub as_of: NaiveDate,
    /// Set when `--as-of` was given; an explicit flag wins over the input.
    pub as_of_forced: bool,
    pub policy: Option<ServicingPolicy>,
}

impl Context {
    pub fn load(as_of: Option<NaiveDate>, config: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let policy = match config {
            Some(path) => Some(load_policy(path)?),
            None => None,
        };
        Ok(Context {
            as_of: as_of.unwrap_or_else(|| Local::now().date_naive()),
            as_of_forced: as_of.is_some(),
            policy,
        })
    }

    /// Fill `as_of` and `policy` into a JSON input object.
    pub fn apply(&self, mut value: Value) -> Result<Value, Box<dyn std::error::Error>> {
        let map = value
            .as_object_mut()
            .ok_or("Input must be a JSON object")?;

        let as_of = Value::String(self.as_of.to_string());
        if self.as_of_forced {
            map.insert("as_of".into(), as_of);
        } else {
            map.entry("as_of").or_insert(as_of);
        }

        if let Some(policy) = &self.policy {
            if !map.contains_key("policy") {
                map.insert("policy".into(), serde_json::to_value(policy)?);
            }
        }
        Ok(value)
    }
}

/// Load a policy file. YAML is a superset of JSON, so one parser covers both.
pub fn load_policy(path: &str) -> Result<ServicingPolicy, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {}", path, e))?;
    let policy: ServicingPolicy = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse config '{}': {}", path, e))?;
    policy.validate()?;
    tracing::debug!(path, "loaded servicing policy");
    Ok(policy)
}
