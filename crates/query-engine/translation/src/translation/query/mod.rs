//! Translate a query request against a schema into a parameterized SQL statement.

pub mod fields;
pub mod filtering;
pub mod joins;
pub mod operators;
pub mod pagination;
pub mod paths;
pub mod sorting;
pub mod values;

use filter_compiler_configuration::Configuration;
use query_engine_metadata::metadata::Schema;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{self, Env, State};
use crate::translation::request::QueryRequest;
use joins::JoinEdge;
use pagination::Pagination;

/// A compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub plan: sql::execution_plan::ExecutionPlan,
    /// The joins the statement contains, in the order they appear.
    pub joins_used: Vec<JoinEdge>,
    pub pagination: Pagination,
}

impl CompiledQuery {
    /// The statement text and its parameters.
    pub fn statement(&self) -> sql::string::SQL {
        self.plan.query_sql()
    }
}

/// Translate a request against a collection of the configuration's registry.
pub fn translate_collection(
    configuration: &Configuration,
    collection: &str,
    request: &QueryRequest,
) -> Result<CompiledQuery, Error> {
    let schema = configuration
        .registry
        .get(collection)
        .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
    translate(&Env::new(&configuration.settings), schema, request)
}

/// Translate a request against a root schema.
///
/// The filter is compiled first, then the select list and the order. Each registers the
/// joins it needs; the statement contains them in that order, each once.
pub fn translate(env: &Env, schema: &Schema, request: &QueryRequest) -> Result<CompiledQuery, Error> {
    let mut state = State::new();

    let where_ = filtering::translate_where(env, &mut state, schema, request.where_.as_ref())?;
    let select_list =
        fields::translate_select_list(env, &mut state, schema, request.select.as_deref())?;
    let order_by = sorting::translate_order_by(env, &mut state, schema, request.order.as_deref())?;
    let pagination = translate_pagination(env, request)?;

    let joins = state.into_joins();
    let query = sql::ast::Select {
        select_list,
        from: Some(root_from(schema)),
        joins: joins.to_sql(),
        where_,
        order_by,
        limit: pagination.to_sql(),
    };

    let plan = sql::execution_plan::ExecutionPlan {
        root_table: schema.table_name().to_string(),
        query,
    };
    log_plan(&plan);

    Ok(CompiledQuery {
        plan,
        joins_used: joins.into_edges(),
        pagination,
    })
}

/// Translate the filter of a request into a `COUNT(*)` statement over the same rows,
/// ignoring the select list, order and pagination.
pub fn translate_count(
    env: &Env,
    schema: &Schema,
    request: &QueryRequest,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    let mut state = State::new();
    let where_ = filtering::translate_where(env, &mut state, schema, request.where_.as_ref())?;

    let mut query = sql::helpers::count_select();
    query.from = Some(root_from(schema));
    query.joins = state.joins().to_sql();
    query.where_ = where_;

    let plan = sql::execution_plan::ExecutionPlan {
        root_table: schema.table_name().to_string(),
        query,
    };
    log_plan(&plan);
    Ok(plan)
}

fn translate_pagination(env: &Env, request: &QueryRequest) -> Result<Pagination, Error> {
    if request.uses_cursors() {
        pagination::resolve_cursor_pagination(
            env.settings(),
            request.first,
            request.after.as_deref(),
            request.last,
            request.before.as_deref(),
        )
    } else {
        pagination::resolve_pagination(env.settings(), request.limit, request.offset)
    }
}

fn root_from(schema: &Schema) -> sql::ast::From {
    sql::ast::From::Table {
        reference: helpers::table_reference(schema),
        alias: helpers::table_alias(schema, 0),
    }
}

fn log_plan(plan: &sql::execution_plan::ExecutionPlan) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let statement = plan.query_sql();
        tracing::debug!(
            root_table = %plan.root_table,
            params = ?statement.params,
            "compiled statement:\n{}",
            statement.pretty()
        );
    }
}
