//! The logical schema model: tables, their fields and the joins between them.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::MetadataError;

/// The physical table a schema reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalTable {
    pub schema: Option<String>,
    pub name: String,
}

/// A logical table. Logical field names are mapped to physical columns, and some
/// fields describe a join to another schema.
#[derive(Debug)]
pub struct Schema {
    table_name: String,
    physical: PhysicalTable,
    fields: IndexMap<String, FieldConfig>,
    default_fields: Vec<String>,
    default_order: Vec<String>,
}

/// How a field name that the schema does not declare is treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "camelCase")]
pub enum FieldLookup {
    /// Unknown names are rejected.
    #[default]
    Strict,
    /// Unknown names are used verbatim as column names.
    Permissive,
}

/// The outcome of looking a field name up in a schema.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Field(&'a FieldConfig),
    /// Permissive lookup of an undeclared name.
    RawColumn(&'a str),
}

impl<'a> Lookup<'a> {
    /// The physical column the name resolved to.
    pub fn column(&self) -> &'a str {
        match *self {
            Lookup::Field(field) => &field.column,
            Lookup::RawColumn(name) => name,
        }
    }
}

/// Configuration of one logical field.
#[derive(Debug)]
pub struct FieldConfig {
    pub column: String,
    /// Name the column is emitted under in the select list.
    pub output_alias: Option<String>,
    pub join: Option<JoinDescriptor>,
}

/// How a field reaches another schema.
#[derive(Debug)]
pub struct JoinDescriptor {
    pub target: LazySchema,
    /// Logical field of the target schema matched against the source field's column.
    pub target_field: String,
    pub join_type: JoinType,
    /// Target fields that stand in for the join field when it is filtered or selected directly.
    pub select_fields: Vec<String>,
    /// Additional column pairs for composite join keys.
    pub extra_key_pairs: Vec<KeyPair>,
}

/// The kind of join a field describes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    Inner,
    #[default]
    Left,
    Right,
    Full,
}

/// A pair of logical fields, on the source and target schemas, that must be equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub source_field: String,
    pub target_field: String,
}

type Resolver = Box<dyn Fn() -> Option<Arc<Schema>> + Send + Sync>;

/// A join target that is resolved on first use and memoized.
///
/// Schemas may refer to each other in cycles, so a target is only looked up when a
/// query first traverses the join. Only a weak reference is memoized: schemas that join
/// each other never keep one another alive, and the owner of the schemas (usually a
/// registry) decides when they are freed.
pub struct LazySchema {
    cell: OnceLock<Weak<Schema>>,
    resolver: Resolver,
}

impl LazySchema {
    pub fn new(resolver: impl Fn() -> Option<Arc<Schema>> + Send + Sync + 'static) -> Self {
        LazySchema {
            cell: OnceLock::new(),
            resolver: Box::new(resolver),
        }
    }

    /// A target produced by a closure that always succeeds.
    pub fn from_fn(resolver: impl Fn() -> Arc<Schema> + Send + Sync + 'static) -> Self {
        Self::new(move || Some(resolver()))
    }

    /// A target that is already known. The target is owned by the join.
    pub fn resolved(schema: Arc<Schema>) -> Self {
        LazySchema {
            cell: OnceLock::from(Arc::downgrade(&schema)),
            resolver: Box::new(move || Some(schema.clone())),
        }
    }

    /// The target schema, or `None` if it cannot be resolved.
    pub fn get(&self) -> Option<Arc<Schema>> {
        if let Some(schema) = self.cell.get().and_then(Weak::upgrade) {
            return Some(schema);
        }
        let schema = (self.resolver)()?;
        // Fails when a freed target is still memoized; later calls resolve again.
        let _ = self.cell.set(Arc::downgrade(&schema));
        Some(schema)
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get().and_then(Weak::upgrade) {
            Some(schema) => f.debug_tuple("LazySchema").field(&schema.table_name).finish(),
            None => f.write_str("LazySchema(<unresolved>)"),
        }
    }
}

impl Schema {
    /// Start building a schema whose physical table has the same name as the logical one.
    pub fn builder(table_name: impl Into<String>) -> SchemaBuilder {
        let table_name = table_name.into();
        SchemaBuilder {
            physical: PhysicalTable {
                schema: None,
                name: table_name.clone(),
            },
            table_name,
            fields: IndexMap::new(),
            default_fields: vec![],
            default_order: vec![],
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn physical(&self) -> &PhysicalTable {
        &self.physical
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldConfig)> {
        self.fields.iter()
    }

    /// Select paths used when a request does not choose any.
    pub fn default_fields(&self) -> &[String] {
        &self.default_fields
    }

    /// Order entries used when a request does not give any.
    pub fn default_order(&self) -> &[String] {
        &self.default_order
    }

    /// Look a field up under the given mode.
    pub fn lookup<'a>(&'a self, name: &'a str, mode: FieldLookup) -> Result<Lookup<'a>, MetadataError> {
        match (self.fields.get(name), mode) {
            (Some(field), _) => Ok(Lookup::Field(field)),
            (None, FieldLookup::Permissive) => Ok(Lookup::RawColumn(name)),
            (None, FieldLookup::Strict) => Err(MetadataError::UnknownField {
                field: name.to_string(),
                schema: self.table_name.clone(),
            }),
        }
    }

    /// The physical column for a logical name, or the name itself if it is not declared.
    /// Used for join keys, which may name either.
    pub fn column_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.fields
            .get(name)
            .map_or(name, |field| field.column.as_str())
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    table_name: String,
    physical: PhysicalTable,
    fields: IndexMap<String, FieldConfig>,
    default_fields: Vec<String>,
    default_order: Vec<String>,
}

impl SchemaBuilder {
    /// Read from a table with a different physical name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.physical.name = name.into();
        self
    }

    /// Qualify the physical table with a database schema.
    pub fn db_schema(mut self, schema: impl Into<String>) -> Self {
        self.physical.schema = Some(schema.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    pub fn default_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.default_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_order<S: Into<String>>(mut self, order: impl IntoIterator<Item = S>) -> Self {
        self.default_order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            table_name: self.table_name,
            physical: self.physical,
            fields: self.fields,
            default_fields: self.default_fields,
            default_order: self.default_order,
        }
    }
}

impl FieldConfig {
    /// A plain field stored in `column`.
    pub fn column(column: impl Into<String>) -> Self {
        FieldConfig {
            column: column.into(),
            output_alias: None,
            join: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.output_alias = Some(alias.into());
        self
    }

    pub fn with_join(mut self, join: JoinDescriptor) -> Self {
        self.join = Some(join);
        self
    }
}

impl JoinDescriptor {
    /// A left join to `target`, keyed on `target_field`.
    pub fn new(target: LazySchema, target_field: impl Into<String>) -> Self {
        JoinDescriptor {
            target,
            target_field: target_field.into(),
            join_type: JoinType::default(),
            select_fields: vec![],
            extra_key_pairs: vec![],
        }
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.select_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn key_pair(mut self, source_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        self.extra_key_pairs.push(KeyPair {
            source_field: source_field.into(),
            target_field: target_field.into(),
        });
        self
    }
}
