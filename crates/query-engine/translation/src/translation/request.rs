//! The shape of an incoming query request.

use serde::{Deserialize, Serialize};

/// A request to read rows of one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryRequest {
    /// Dotted field paths to return. Omitted means the schema's default fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    /// The filter tree.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_: Option<serde_json::Map<String, serde_json::Value>>,
    /// Order entries. Omitted means the schema's default order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<OrderInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Cursor pagination: rows after the `after` cursor, up to `first` of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Cursor pagination: rows before the `before` cursor, up to `last` of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

impl QueryRequest {
    /// Whether any cursor pagination argument is present.
    pub fn uses_cursors(&self) -> bool {
        self.first.is_some() || self.after.is_some() || self.last.is_some() || self.before.is_some()
    }
}

/// One order entry: either the string form (`"price:desc"`, `"priceDESC"`, `"price"`)
/// or an object naming the direction and null placement explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderInput {
    Path(String),
    Element {
        field: String,
        #[serde(default, alias = "order", skip_serializing_if = "Option::is_none")]
        direction: Option<OrderDirection>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nulls: Option<NullsPlacement>,
    },
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// Where nulls sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsPlacement {
    #[serde(alias = "FIRST")]
    First,
    #[serde(alias = "LAST")]
    Last,
}
