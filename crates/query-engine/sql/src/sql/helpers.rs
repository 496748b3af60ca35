//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// A `false` expression.
pub fn false_expr() -> Expression {
    Expression::Value(Value::Bool(false))
}

// Aliasing //

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: String) -> TableAlias {
    TableAlias { name }
}

/// A column of an aliased table.
pub fn make_column(table: &TableAlias, name: &str) -> ColumnReference {
    ColumnReference::TableColumn {
        table: TableReference::AliasedTable(table.clone()),
        name: ColumnName(name.to_string()),
    }
}

// Expressions //

/// `left = right`
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator::Equals,
        right: Box::new(right),
    }
}

/// AND all the expressions together. `None` when there is nothing to combine.
pub fn conjunction(expressions: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    expressions
        .into_iter()
        .reduce(|left, right| Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        })
}

/// OR all the expressions together. `None` when there is nothing to combine.
pub fn disjunction(expressions: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    expressions
        .into_iter()
        .reduce(|left, right| Expression::Or {
            left: Box::new(left),
            right: Box::new(right),
        })
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: SelectList) -> Select {
    Select {
        select_list,
        from: None,
        joins: vec![],
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build a `SELECT COUNT(*) AS "count"` select with the rest empty.
pub fn count_select() -> Select {
    simple_select(SelectList::SelectList(vec![(
        Some(make_column_alias("count".to_string())),
        Expression::Count(CountType::Star),
    )]))
}
