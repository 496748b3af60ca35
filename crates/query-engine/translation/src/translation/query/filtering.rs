//! Handle filtering/where clauses translation.

use serde_json::{Map, Value};

use query_engine_metadata::metadata::{Lookup, Schema};
use query_engine_sql::sql;
use query_engine_sql::sql::ast::Expression;

use super::operators::{self, Operator};
use crate::translation::error::Error;
use crate::translation::helpers::{self, Env, State};

/// Boolean combinators of filter nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
    Not,
}

impl Combinator {
    fn parse(key: &str, prefix: &str) -> Option<Combinator> {
        match key.strip_prefix(prefix)? {
            "and" => Some(Combinator::And),
            "or" => Some(Combinator::Or),
            "not" => Some(Combinator::Not),
            _ => None,
        }
    }
}

/// Translate a filter tree to the WHERE expression of a query. The join targets it
/// traverses are registered in the state.
pub fn translate_where(
    env: &Env,
    state: &mut State,
    schema: &Schema,
    filter: Option<&Map<String, Value>>,
) -> Result<sql::ast::Where, Error> {
    let expressions = match filter {
        None => vec![],
        Some(filter) => translate_filter(env, state, schema, 0, filter)?,
    };
    Ok(sql::ast::Where(
        sql::helpers::conjunction(expressions).unwrap_or_else(sql::helpers::empty_where),
    ))
}

/// Translate one filter node over `schema` at `depth`. The result is implicitly conjoined;
/// an empty result means the node does not constrain anything.
pub fn translate_filter(
    env: &Env,
    state: &mut State,
    schema: &Schema,
    depth: u32,
    filter: &Map<String, Value>,
) -> Result<Vec<Expression>, Error> {
    env.check_depth(depth)?;
    let prefix = env.operator_prefix();

    let mut expressions = vec![];
    for (key, value) in filter {
        if value.is_null() {
            continue;
        }
        match Combinator::parse(key, prefix) {
            Some(Combinator::And) => {
                for child in filter_list(key, value) {
                    expressions.extend(translate_filter(env, state, schema, depth, child)?);
                }
            }
            Some(Combinator::Or) => {
                let mut branches = vec![];
                for child in filter_list(key, value) {
                    branches.extend(sql::helpers::conjunction(translate_filter(
                        env, state, schema, depth, child,
                    )?));
                }
                expressions.extend(sql::helpers::disjunction(branches));
            }
            Some(Combinator::Not) => {
                let Some(child) = value.as_object() else {
                    tracing::debug!(key = %key, "skipping combinator that is not an object");
                    continue;
                };
                if let Some(inner) =
                    sql::helpers::conjunction(translate_filter(env, state, schema, depth, child)?)
                {
                    expressions.push(Expression::Not(Box::new(inner)));
                }
            }
            None if !prefix.is_empty() && key.starts_with(prefix) => {
                tracing::debug!(key = %key, "skipping unrecognised combinator");
            }
            None => expressions.extend(translate_field(env, state, schema, depth, key, value)?),
        }
    }
    Ok(expressions)
}

/// The child filters of an `and`/`or` combinator. A value that is not a list, and any
/// child that is not an object, constrains nothing and is skipped.
fn filter_list<'a>(key: &str, value: &'a Value) -> Vec<&'a Map<String, Value>> {
    let Some(children) = value.as_array() else {
        tracing::debug!(key = %key, "skipping combinator that is not a list");
        return vec![];
    };
    children
        .iter()
        .filter(|child| !child.is_null())
        .filter_map(|child| {
            let child = child.as_object();
            if child.is_none() {
                tracing::debug!(key = %key, "skipping combinator child that is not an object");
            }
            child
        })
        .collect()
}

/// A map is an operator map when it is non-empty and every key is an operator key.
/// Combinator keys make it a nested filter instead.
pub fn is_filter_object(map: &Map<String, Value>, prefix: &str) -> bool {
    !map.is_empty()
        && map.keys().all(|key| {
            if prefix.is_empty() {
                Operator::from_name(key).is_some()
            } else {
                key.starts_with(prefix) && Combinator::parse(key, prefix).is_none()
            }
        })
}

/// Translate the filter of one named field.
fn translate_field(
    env: &Env,
    state: &mut State,
    schema: &Schema,
    depth: u32,
    name: &str,
    value: &Value,
) -> Result<Vec<Expression>, Error> {
    if matches!(value, Value::Object(map) if map.is_empty()) {
        return Ok(vec![]);
    }

    let field = match env.lookup_field(schema, name)? {
        Lookup::RawColumn(column) => {
            let column = helpers::column_expression(schema, depth, column);
            return translate_field_value(env, &column, name, value);
        }
        Lookup::Field(field) => field,
    };
    let own_column = || helpers::column_expression(schema, depth, &field.column);

    let Some(join) = &field.join else {
        return translate_field_value(env, &own_column(), name, value);
    };

    match value {
        Value::Object(map) if !is_filter_object(map, env.operator_prefix()) => {
            // A nested filter over the join target.
            let resolved = helpers::resolve_join(env, schema, depth, name, field, join)?;
            state.register_join(resolved.edge);
            translate_filter(env, state, &resolved.target, depth + 1, map)
        }
        Value::Object(_) | Value::Bool(_) | Value::Number(_) | Value::String(_)
            if !join.select_fields.is_empty() =>
        {
            // An operator map or literal on the join field applies to each of its select fields.
            let resolved = helpers::resolve_join(env, schema, depth, name, field, join)?;
            state.register_join(resolved.edge);
            let mut expressions = vec![];
            for select in &join.select_fields {
                let column = env.lookup_field(&resolved.target, select)?.column();
                let column = helpers::column_expression(&resolved.target, depth + 1, column);
                expressions.extend(translate_field_value(env, &column, name, value)?);
            }
            Ok(expressions)
        }
        _ => translate_field_value(env, &own_column(), name, value),
    }
}

/// Translate the value given for a field: an operator map or a literal compared for equality.
fn translate_field_value(
    env: &Env,
    column: &Expression,
    field: &str,
    value: &Value,
) -> Result<Vec<Expression>, Error> {
    let prefix = env.operator_prefix();
    match value {
        Value::Null => Ok(vec![]),
        Value::Object(map) if map.is_empty() => Ok(vec![]),
        Value::Object(map) if is_filter_object(map, prefix) => {
            let mut expressions = vec![];
            for (key, operand) in map {
                let operator =
                    Operator::parse(key, prefix).ok_or_else(|| Error::UnknownOperator {
                        field: field.to_string(),
                        operator: key.clone(),
                    })?;
                if operand.is_null() && !operator.accepts_null() {
                    continue;
                }
                expressions.extend(operators::translate_operator(
                    column, operator, operand, field, key,
                )?);
            }
            Ok(expressions)
        }
        Value::Object(_) => Err(Error::MalformedFilter {
            field: field.to_string(),
            reason: "nested filters are only allowed on join fields".to_string(),
        }),
        Value::Array(_) => Err(Error::MalformedFilter {
            field: field.to_string(),
            reason: format!("a list of values must be given to the {prefix}in operator"),
        }),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(operators::translate_operator(
            column,
            Operator::Eq,
            value,
            field,
            Operator::Eq.name(),
        )?
        .into_iter()
        .collect()),
    }
}
