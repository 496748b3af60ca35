//! Helpers for processing the QueryRequest and building SQL.

use std::sync::Arc;

use filter_compiler_configuration::CompilerSettings;
use query_engine_metadata::metadata::{FieldConfig, FieldLookup, JoinDescriptor, Lookup, Schema};
use query_engine_sql::sql;

use super::error::Error;
use super::query::joins::{JoinEdge, JoinRegistry};

/// Static information for a single compilation.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    settings: &'a CompilerSettings,
    lookup: FieldLookup,
}

/// Mutable state for a single compilation.
#[derive(Debug, Default)]
pub struct State {
    joins: JoinRegistry,
}

impl<'a> Env<'a> {
    /// Create a new Env, using the lookup mode from the settings.
    pub fn new(settings: &'a CompilerSettings) -> Self {
        Env {
            settings,
            lookup: settings.field_lookup,
        }
    }

    /// Override the lookup mode for this compilation.
    #[must_use]
    pub fn with_lookup(mut self, lookup: FieldLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn settings(&self) -> &'a CompilerSettings {
        self.settings
    }

    pub fn operator_prefix(&self) -> &'a str {
        &self.settings.operator_prefix
    }

    /// Look a field up in a schema under this compilation's lookup mode.
    pub fn lookup_field<'s>(&self, schema: &'s Schema, name: &'s str) -> Result<Lookup<'s>, Error> {
        Ok(schema.lookup(name, self.lookup)?)
    }

    /// Fail if a schema at this depth would be nested too deeply.
    pub fn check_depth(&self, depth: u32) -> Result<(), Error> {
        if depth >= self.settings.max_join_depth {
            Err(Error::JoinDepthExceeded {
                depth,
                max_depth: self.settings.max_join_depth,
            })
        } else {
            Ok(())
        }
    }
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    pub fn into_joins(self) -> JoinRegistry {
        self.joins
    }

    /// Register a join edge produced by resolving a join field.
    pub fn register_join(&mut self, edge: JoinEdge) {
        self.joins.register(edge);
    }
}

/// The alias of a schema at a join depth: `t{depth}_{table name}`.
pub fn table_alias(schema: &Schema, depth: u32) -> sql::ast::TableAlias {
    sql::helpers::make_table_alias(format!("t{depth}_{}", schema.table_name()))
}

/// The physical table of a schema.
pub fn table_reference(schema: &Schema) -> sql::ast::TableReference {
    let physical = schema.physical();
    sql::ast::TableReference::DBTable {
        schema: physical
            .schema
            .as_ref()
            .map(|name| sql::ast::SchemaName(name.clone())),
        table: sql::ast::TableName(physical.name.clone()),
    }
}

/// A column of a schema at a join depth.
pub fn column_expression(schema: &Schema, depth: u32, column: &str) -> sql::ast::Expression {
    sql::ast::Expression::ColumnReference(sql::helpers::make_column(
        &table_alias(schema, depth),
        column,
    ))
}

/// A join field, resolved: the field's join, its target schema and the edge joining it.
pub struct ResolvedJoin<'a> {
    pub join: &'a JoinDescriptor,
    pub target: Arc<Schema>,
    pub edge: JoinEdge,
}

/// Resolve the join of `field` (named `field_name` on `schema`, at `depth`) into the
/// edge that joins its target at `depth + 1`. The edge is not registered.
pub fn resolve_join<'a>(
    env: &Env,
    schema: &Schema,
    depth: u32,
    field_name: &str,
    field: &'a FieldConfig,
    join: &'a JoinDescriptor,
) -> Result<ResolvedJoin<'a>, Error> {
    env.check_depth(depth + 1)?;

    let target = join
        .target
        .get()
        .ok_or_else(|| Error::UnresolvedJoinTarget {
            field: field_name.to_string(),
            schema: schema.table_name().to_string(),
        })?;

    let mut key_pairs = vec![(
        sql::ast::ColumnName(field.column.clone()),
        sql::ast::ColumnName(target.column_for(&join.target_field).to_string()),
    )];
    key_pairs.extend(join.extra_key_pairs.iter().map(|pair| {
        (
            sql::ast::ColumnName(schema.column_for(&pair.source_field).to_string()),
            sql::ast::ColumnName(target.column_for(&pair.target_field).to_string()),
        )
    }));

    let edge = JoinEdge {
        source_alias: table_alias(schema, depth),
        target_alias: table_alias(&target, depth + 1),
        target_table: table_reference(&target),
        join_type: join.join_type,
        key_pairs,
    };

    Ok(ResolvedJoin { join, target, edge })
}
