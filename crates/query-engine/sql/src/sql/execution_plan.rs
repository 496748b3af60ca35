//! Describe the SQL execution plan.

use super::ast;
use super::string;

/// Definition of an execution plan to be run against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    /// The logical table the statement is rooted at.
    pub root_table: String,
    /// The query.
    pub query: ast::Select,
}

impl ExecutionPlan {
    /// Extract the query component as SQL.
    pub fn query_sql(&self) -> string::SQL {
        select_to_sql(&self.query)
    }

    /// Extract the query component as an EXPLAIN statement.
    pub fn explain_query_sql(&self) -> string::SQL {
        let mut sql = string::SQL::new();
        ast::Explain::Select(&self.query).to_sql(&mut sql);
        sql
    }
}

/// Render a select statement.
pub fn select_to_sql(select: &ast::Select) -> string::SQL {
    let mut sql = string::SQL::new();
    select.to_sql(&mut sql);
    sql
}
