use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What to do when a type is requested again while it is still being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CircularPolicy {
    /// Fail the resolution with a circular dependency reason.
    #[default]
    Unresolved,
    /// Substitute `Value::Null` for the repeated type.
    Null,
}

/// Tunables for the built-in strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenerateOptions {
    /// Minimum number of elements in generated collections.
    pub collection_min: usize,
    /// Maximum number of elements in generated collections.
    pub collection_max: usize,
    pub string_min_len: usize,
    pub string_max_len: usize,
    /// Probability that an `Option<T>` is generated as null.
    pub null_probability: f64,
    /// Lower clamp for integer primitives (intersected with the kind's range).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_min: Option<i64>,
    /// Upper clamp for integer primitives (intersected with the kind's range).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_max: Option<i64>,
    pub float_min: f64,
    pub float_max: f64,
    /// How many times a type may already be on the active stack when it is
    /// requested again.
    pub recursion_limit: usize,
    /// Hard bound on nested requests, counting every type on the active
    /// stack. Catches recursion through ever-growing generic arguments.
    pub max_depth: usize,
    pub circular_policy: CircularPolicy,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            collection_min: 0,
            collection_max: 10,
            string_min_len: 1,
            string_max_len: 16,
            null_probability: 0.25,
            int_min: None,
            int_max: None,
            float_min: -1.0e6,
            float_max: 1.0e6,
            recursion_limit: 0,
            max_depth: 32,
            circular_policy: CircularPolicy::Unresolved,
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.collection_min > self.collection_max {
            return Err("collection_min must be <= collection_max".to_string());
        }
        if self.string_min_len > self.string_max_len {
            return Err("string_min_len must be <= string_max_len".to_string());
        }
        if !(0.0..=1.0).contains(&self.null_probability) {
            return Err("null_probability must be within [0, 1]".to_string());
        }
        if let (Some(min), Some(max)) = (self.int_min, self.int_max) {
            if min > max {
                return Err("int_min must be <= int_max".to_string());
            }
        }
        if !self.float_min.is_finite() || !self.float_max.is_finite() {
            return Err("float bounds must be finite".to_string());
        }
        if self.float_min > self.float_max {
            return Err("float_min must be <= float_max".to_string());
        }
        if !(self.float_max - self.float_min).is_finite() {
            return Err("float range is too wide to sample".to_string());
        }
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".to_string());
        }
        Ok(())
    }
}
