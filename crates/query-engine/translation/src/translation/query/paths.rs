//! Resolve dotted field paths, as used by select lists and order entries.

use query_engine_metadata::metadata::{Lookup, Schema};
use query_engine_sql::sql;

use super::joins::JoinEdge;
use crate::translation::error::Error;
use crate::translation::helpers::{self, Env};

/// A path resolved to a column.
#[derive(Debug)]
pub struct ResolvedPath {
    pub expression: sql::ast::Expression,
    /// The name the column should be selected under, if any.
    pub output_alias: Option<String>,
    /// Joins traversed to reach the column, outermost first. They are not registered.
    pub joins: Vec<JoinEdge>,
}

/// Resolve a dotted path such as `translation.value` against the root schema.
pub fn resolve_path(env: &Env, schema: &Schema, path: &str) -> Result<ResolvedPath, Error> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(Error::MalformedPath(path.to_string()));
    }

    let mut joins = vec![];
    let (expression, output_alias) = walk(env, schema, 0, &segments, path, &mut joins)?;
    Ok(ResolvedPath {
        expression,
        output_alias,
        joins,
    })
}

fn walk(
    env: &Env,
    schema: &Schema,
    depth: u32,
    segments: &[&str],
    path: &str,
    joins: &mut Vec<JoinEdge>,
) -> Result<(sql::ast::Expression, Option<String>), Error> {
    env.check_depth(depth)?;
    let Some((name, rest)) = segments.split_first() else {
        return Err(Error::MalformedPath(path.to_string()));
    };
    let is_nested = path.contains('.');

    let field = match env.lookup_field(schema, name)? {
        Lookup::RawColumn(column) => {
            if !rest.is_empty() {
                return Err(Error::UnknownField {
                    field: (*name).to_string(),
                    schema: schema.table_name().to_string(),
                });
            }
            let output_alias = is_nested.then(|| path.replace('.', "_"));
            return Ok((
                helpers::column_expression(schema, depth, column),
                output_alias,
            ));
        }
        Lookup::Field(field) => field,
    };
    let output_alias = || {
        field
            .output_alias
            .clone()
            .or_else(|| is_nested.then(|| path.to_string()))
    };

    match &field.join {
        Some(join) if !rest.is_empty() => {
            let resolved = helpers::resolve_join(env, schema, depth, name, field, join)?;
            joins.push(resolved.edge);
            walk(env, &resolved.target, depth + 1, rest, path, joins)
        }
        Some(join) if !join.select_fields.is_empty() => {
            // The join field on its own stands for its first select field.
            let resolved = helpers::resolve_join(env, schema, depth, name, field, join)?;
            joins.push(resolved.edge);
            let column = env
                .lookup_field(&resolved.target, &join.select_fields[0])?
                .column();
            Ok((
                helpers::column_expression(&resolved.target, depth + 1, column),
                field.output_alias.clone().or_else(|| Some(path.to_string())),
            ))
        }
        None if !rest.is_empty() => Err(Error::NotARelationship {
            field: (*name).to_string(),
            schema: schema.table_name().to_string(),
        }),
        _ => Ok((
            helpers::column_expression(schema, depth, &field.column),
            output_alias(),
        )),
    }
}
