//! A registry of named schemas whose joins resolve against each other.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use super::definition::{SchemaDefinition, SchemaDefinitions};
use super::error::MetadataError;
use super::schema::{FieldConfig, JoinDescriptor, LazySchema, Schema};

/// Schemas keyed by logical table name.
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Build a registry from schemas constructed in code.
    pub fn from_schemas(schemas: impl IntoIterator<Item = Arc<Schema>>) -> Self {
        SchemaRegistry {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.table_name().to_string(), schema))
                .collect(),
        }
    }

    /// Build a registry from configuration. Join targets name other definitions and are
    /// resolved through the registry on first use.
    pub fn from_definitions(
        definitions: &SchemaDefinitions,
    ) -> Result<Arc<SchemaRegistry>, MetadataError> {
        validate(definitions)?;
        tracing::debug!(schemas = definitions.0.len(), "building schema registry");

        Ok(Arc::new_cyclic(|registry: &Weak<SchemaRegistry>| {
            let schemas = definitions
                .0
                .iter()
                .map(|(name, definition)| {
                    (
                        name.clone(),
                        Arc::new(make_schema(name, definition, registry)),
                    )
                })
                .collect();
            SchemaRegistry { schemas }
        }))
    }

    pub fn get(&self, table_name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(table_name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Check that every join names a known schema, and that its select fields exist there.
fn validate(definitions: &SchemaDefinitions) -> Result<(), MetadataError> {
    for (schema_name, definition) in &definitions.0 {
        for (field_name, field) in &definition.fields {
            let Some(join) = &field.join else { continue };
            let target = definitions.0.get(&join.target).ok_or_else(|| {
                MetadataError::UnknownJoinTarget {
                    schema: schema_name.clone(),
                    field: field_name.clone(),
                    target: join.target.clone(),
                }
            })?;
            if let Some(select) = join
                .select
                .iter()
                .find(|select| !target.fields.contains_key(*select))
            {
                return Err(MetadataError::UnknownSelectField {
                    schema: schema_name.clone(),
                    field: field_name.clone(),
                    target: join.target.clone(),
                    select: select.clone(),
                });
            }
        }
    }
    Ok(())
}

fn make_schema(
    name: &str,
    definition: &SchemaDefinition,
    registry: &Weak<SchemaRegistry>,
) -> Schema {
    let mut builder = Schema::builder(name).table(definition.table.clone());
    if let Some(db_schema) = &definition.db_schema {
        builder = builder.db_schema(db_schema.clone());
    }

    for (field_name, field) in &definition.fields {
        let mut config = FieldConfig::column(field.column.clone());
        if let Some(alias) = &field.output_alias {
            config = config.with_alias(alias.clone());
        }
        if let Some(join) = &field.join {
            let registry = registry.clone();
            let target_name = join.target.clone();
            let target =
                LazySchema::new(move || registry.upgrade()?.get(&target_name).cloned());

            let mut descriptor = JoinDescriptor::new(target, join.column.clone())
                .join_type(join.join_type)
                .select(join.select.iter().cloned());
            for pair in &join.composite {
                descriptor = descriptor.key_pair(pair.field.clone(), pair.column.clone());
            }
            config = config.with_join(descriptor);
        }
        builder = builder.field(field_name.clone(), config);
    }

    builder
        .default_fields(definition.default_fields.iter().cloned())
        .default_order(definition.default_order.iter().cloned())
        .build()
}
