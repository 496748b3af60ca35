//! Serializable schema definitions, as written in the configuration file.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::schema::JoinType;

/// Schema definitions keyed by logical table name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDefinitions(pub BTreeMap<String, SchemaDefinition>);

impl SchemaDefinitions {
    pub fn empty() -> Self {
        SchemaDefinitions(BTreeMap::new())
    }
}

/// A logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// The physical table name.
    pub table: String,
    /// The database schema the table lives in, if it must be qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_schema: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_order: Vec<String>,
}

/// A logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub column: String,
    /// Name the column is emitted under in the select list.
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub output_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinDefinition>,
}

/// A join from a field to another logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinDefinition {
    /// Logical name of the target table.
    pub target: String,
    /// Field of the target table matched against this field's column.
    pub column: String,
    #[serde(rename = "type", default)]
    pub join_type: JoinType,
    /// Target fields that stand in for this field when it is filtered or selected directly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<String>,
    /// Additional key pairs for composite joins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite: Vec<KeyPairDefinition>,
}

/// One additional pair of a composite join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeyPairDefinition {
    /// Field of the source table.
    pub field: String,
    /// Field of the target table.
    pub column: String,
}
