//! Execute a compiled statement against the database.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::QueryScalar;
use sqlx::Postgres;
use tracing::{info_span, Instrument};

use query_engine_sql::sql;
use query_engine_sql::sql::string::Param;

use crate::error::Error;

/// Runs compiled statements. Each row comes back as one JSON object.
#[async_trait]
pub trait StatementExecutor {
    async fn execute(&self, statement: &sql::string::SQL) -> Result<Vec<serde_json::Value>, Error>;
}

/// Executes statements over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
}

impl PostgresExecutor {
    pub fn new(pool: PgPool) -> Self {
        PostgresExecutor { pool }
    }

    /// Create a pool for a connection string.
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(PostgresExecutor { pool })
    }

    /// Run `EXPLAIN` for a plan, returning the formatted statement and the query plan.
    pub async fn explain(
        &self,
        plan: &sql::execution_plan::ExecutionPlan,
    ) -> Result<(String, String), Error> {
        let query = plan.explain_query_sql();
        tracing::info!(generated_sql = %query.sql, params = ?&query.params);

        let lines: Vec<String> = bind_params(sqlx::query_scalar(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .instrument(info_span!("Database request"))
            .await?;

        Ok((plan.query_sql().pretty(), lines.join("\n")))
    }
}

#[async_trait]
impl StatementExecutor for PostgresExecutor {
    async fn execute(&self, statement: &sql::string::SQL) -> Result<Vec<serde_json::Value>, Error> {
        let query = wrap_rows(statement);
        tracing::info!(generated_sql = %query.sql, params = ?&query.params);

        let result: serde_json::Value = bind_params(sqlx::query_scalar(&query.sql), &query.params)
            .fetch_one(&self.pool)
            .instrument(info_span!("Database request"))
            .await?;

        match result {
            serde_json::Value::Array(rows) => Ok(rows),
            other => Err(Error::UnexpectedResult(format!(
                "expected an array of rows, got {other}"
            ))),
        }
    }
}

/// Wrap a statement so the database returns all of its rows as a single JSON array.
pub fn wrap_rows(statement: &sql::string::SQL) -> sql::string::SQL {
    let mut sql = sql::string::SQL::new();
    sql.append_syntax("SELECT coalesce(json_agg(row_to_json(rows)), '[]') FROM (");
    sql.append_syntax(&statement.sql);
    sql.append_syntax(") AS rows");
    sql.params.clone_from(&statement.params);
    sql.param_index = statement.param_index;
    sql
}

/// Bind the parameters of a statement in order.
fn bind_params<'q, O>(
    query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &'q [Param],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    params.iter().fold(query, |query, param| match param {
        Param::String(s) => query.bind(s.as_str()),
        Param::Int8(i) => query.bind(*i),
        Param::Float8(f) => query.bind(*f),
        Param::Bool(b) => query.bind(*b),
    })
}
