//! Handle the select list.

use std::collections::BTreeSet;

use query_engine_metadata::metadata::Schema;
use query_engine_sql::sql;

use super::paths;
use crate::translation::error::Error;
use crate::translation::helpers::{self, Env, State};

/// Translate the requested paths to a select list. Joins the paths traverse are
/// registered in the state.
///
/// Without a selection the schema's default fields are used, and without those every
/// column of the root table is returned.
pub fn translate_select_list(
    env: &Env,
    state: &mut State,
    schema: &Schema,
    select: Option<&[String]>,
) -> Result<sql::ast::SelectList, Error> {
    let paths = select.unwrap_or_else(|| schema.default_fields());
    if paths.is_empty() {
        return Ok(sql::ast::SelectList::SelectStarFrom(
            sql::ast::TableReference::AliasedTable(helpers::table_alias(schema, 0)),
        ));
    }

    let mut seen = BTreeSet::new();
    let mut select_list = Vec::with_capacity(paths.len());
    for path in paths {
        if !seen.insert(path.as_str()) {
            return Err(Error::DuplicateSelectField(path.clone()));
        }
        let resolved = paths::resolve_path(env, schema, path)?;
        for edge in resolved.joins {
            state.register_join(edge);
        }
        select_list.push((
            resolved.output_alias.map(sql::helpers::make_column_alias),
            resolved.expression,
        ));
    }

    Ok(sql::ast::SelectList::SelectList(select_list))
}
