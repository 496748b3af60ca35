//! Settings that shape how requests are compiled.

use enum_iterator::Sequence;
use query_engine_metadata::metadata::FieldLookup;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What to do with a requested limit above the maximum.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum LimitPolicy {
    /// Fail the request.
    #[default]
    Reject,
    /// Lower the limit to the maximum.
    Clamp,
}

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    /// Limit used when a request does not give one.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Largest limit a request may ask for.
    #[serde(default = "max_limit")]
    pub max_limit: u32,
    #[serde(default)]
    pub limit_policy: LimitPolicy,
    /// Whether unknown field names are rejected or used as raw column names.
    #[serde(default)]
    pub field_lookup: FieldLookup,
    /// Prefix of operator and combinator keys in filters, e.g. `_eq` and `_and`.
    #[serde(default = "operator_prefix")]
    pub operator_prefix: String,
    /// Deepest join nesting a filter or path may reach.
    #[serde(default = "max_join_depth")]
    pub max_join_depth: u32,
}

fn default_limit() -> u32 {
    20
}

fn max_limit() -> u32 {
    100
}

fn operator_prefix() -> String {
    "_".to_string()
}

fn max_join_depth() -> u32 {
    5
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            default_limit: default_limit(),
            max_limit: max_limit(),
            limit_policy: LimitPolicy::default(),
            field_lookup: FieldLookup::default(),
            operator_prefix: operator_prefix(),
            max_join_depth: max_join_depth(),
        }
    }
}

impl CompilerSettings {
    pub fn is_default(&self) -> bool {
        self == &CompilerSettings::default()
    }
}
