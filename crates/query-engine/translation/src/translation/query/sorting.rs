//! Handle the ORDER BY clause.

use query_engine_metadata::metadata::Schema;
use query_engine_sql::sql;

use super::paths;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State};
use crate::translation::request::{NullsPlacement, OrderDirection, OrderInput};

/// A parsed order entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub path: String,
    pub direction: OrderDirection,
    pub nulls: Option<NullsPlacement>,
}

/// Parse the string form of an order entry.
///
/// `path:asc` and `path:desc` (any case) come first, then a trailing `ASC` or `DESC`
/// directly after the path (`priceDESC`). Anything else is an ascending path.
pub fn parse_order_string(entry: &str) -> Result<OrderEntry, Error> {
    if entry.is_empty() {
        return Err(Error::MalformedOrder(entry.to_string()));
    }

    let (path, direction) = if let Some((path, direction)) = entry
        .rsplit_once(':')
        .and_then(|(path, direction)| Some((path, parse_direction(direction)?)))
        .filter(|(path, _)| !path.is_empty())
    {
        (path, direction)
    } else if let Some(path) = entry.strip_suffix("DESC").filter(|path| !path.is_empty()) {
        (path, OrderDirection::Desc)
    } else if let Some(path) = entry.strip_suffix("ASC").filter(|path| !path.is_empty()) {
        (path, OrderDirection::Asc)
    } else {
        (entry, OrderDirection::Asc)
    };

    Ok(OrderEntry {
        path: path.to_string(),
        direction,
        nulls: None,
    })
}

fn parse_direction(direction: &str) -> Option<OrderDirection> {
    if direction.eq_ignore_ascii_case("asc") {
        Some(OrderDirection::Asc)
    } else if direction.eq_ignore_ascii_case("desc") {
        Some(OrderDirection::Desc)
    } else {
        None
    }
}

/// Parse either form of an order entry.
pub fn parse_order_input(input: &OrderInput) -> Result<OrderEntry, Error> {
    match input {
        OrderInput::Path(entry) => parse_order_string(entry),
        OrderInput::Element {
            field,
            direction,
            nulls,
        } => {
            if field.is_empty() {
                return Err(Error::MalformedOrder(field.clone()));
            }
            Ok(OrderEntry {
                path: field.clone(),
                direction: direction.unwrap_or_default(),
                nulls: *nulls,
            })
        }
    }
}

/// Convert the order entries of a request to an ORDER BY clause. Joins the paths
/// traverse are registered in the state.
///
/// Without entries the schema's default order is used.
pub fn translate_order_by(
    env: &Env,
    state: &mut State,
    schema: &Schema,
    order: Option<&[OrderInput]>,
) -> Result<sql::ast::OrderBy, Error> {
    let entries = match order {
        Some(order) => order
            .iter()
            .map(parse_order_input)
            .collect::<Result<Vec<_>, _>>()?,
        None => schema
            .default_order()
            .iter()
            .map(|entry| parse_order_string(entry))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut elements = Vec::with_capacity(entries.len());
    for entry in entries {
        let resolved = paths::resolve_path(env, schema, &entry.path)?;
        for edge in resolved.joins {
            state.register_join(edge);
        }
        elements.push(sql::ast::OrderByElement {
            target: resolved.expression,
            direction: match entry.direction {
                OrderDirection::Asc => sql::ast::OrderByDirection::Asc,
                OrderDirection::Desc => sql::ast::OrderByDirection::Desc,
            },
            nulls: entry.nulls.map(|nulls| match nulls {
                NullsPlacement::First => sql::ast::NullsOrder::NullsFirst,
                NullsPlacement::Last => sql::ast::NullsOrder::NullsLast,
            }),
        });
    }

    Ok(sql::ast::OrderBy { elements })
}
