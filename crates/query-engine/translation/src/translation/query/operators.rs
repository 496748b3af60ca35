//! The comparison operators a filter may apply to a column.

use enum_iterator::{all, Sequence};

use query_engine_sql::sql;
use query_engine_sql::sql::ast::{BinaryArrayOperator, BinaryOperator, Expression};

use super::values;
use crate::translation::error::Error;

/// Longest operand accepted by the pattern operators.
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Like,
    ILike,
    NotLike,
    NotILike,
    Contains,
    NotContains,
    ContainsI,
    NotContainsI,
    StartsWith,
    StartsWithI,
    EndsWith,
    EndsWithI,
    Is,
    IsNot,
    Between,
}

impl Operator {
    /// The canonical name, without the prefix.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Like => "like",
            Operator::ILike => "iLike",
            Operator::NotLike => "notLike",
            Operator::NotILike => "notILike",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::ContainsI => "containsi",
            Operator::NotContainsI => "notContainsi",
            Operator::StartsWith => "startsWith",
            Operator::StartsWithI => "startsWithi",
            Operator::EndsWith => "endsWith",
            Operator::EndsWithI => "endsWithi",
            Operator::Is => "is",
            Operator::IsNot => "isNot",
            Operator::Between => "between",
        }
    }

    /// Find an operator by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Operator> {
        all::<Operator>().find(|operator| operator.name().eq_ignore_ascii_case(name))
    }

    /// Find the operator a prefixed filter key names, e.g. `_eq`.
    pub fn parse(key: &str, prefix: &str) -> Option<Operator> {
        key.strip_prefix(prefix).and_then(Operator::from_name)
    }

    /// Whether a null operand is meaningful rather than "no filter".
    pub fn accepts_null(self) -> bool {
        matches!(self, Operator::Is | Operator::IsNot)
    }
}

/// Apply `operator` with `operand` to `column`. `key` is the filter key as written, for errors.
///
/// Returns `None` when the operator contributes no predicate, which is only the case for
/// `notIn` with an empty list.
pub fn translate_operator(
    column: &Expression,
    operator: Operator,
    operand: &serde_json::Value,
    field: &str,
    key: &str,
) -> Result<Option<Expression>, Error> {
    let malformed = |reason: &str| Error::MalformedOperand {
        field: field.to_string(),
        operator: key.to_string(),
        reason: reason.to_string(),
    };
    let scalar = |value: &serde_json::Value| {
        values::translate_json_value(value)
            .map(values::parameter)
            .ok_or_else(|| malformed("expected a scalar value"))
    };
    let pattern = |value: &serde_json::Value| match value.as_str() {
        None => Err(malformed("expected a string")),
        Some(s) if s.chars().count() > MAX_PATTERN_LENGTH => Err(malformed(&format!(
            "pattern is longer than {MAX_PATTERN_LENGTH} characters"
        ))),
        Some(s) => Ok(s.to_string()),
    };

    let expression = match operator {
        Operator::Eq => binary(column, BinaryOperator::Equals, scalar(operand)?),
        Operator::Neq => binary(column, BinaryOperator::NotEquals, scalar(operand)?),
        Operator::Gt => binary(column, BinaryOperator::GreaterThan, scalar(operand)?),
        Operator::Gte => binary(column, BinaryOperator::GreaterThanOrEqualTo, scalar(operand)?),
        Operator::Lt => binary(column, BinaryOperator::LessThan, scalar(operand)?),
        Operator::Lte => binary(column, BinaryOperator::LessThanOrEqualTo, scalar(operand)?),

        Operator::In | Operator::NotIn => {
            let items = operand
                .as_array()
                .ok_or_else(|| malformed("expected an array"))?;
            if items.is_empty() {
                // IN () matches nothing; NOT IN () excludes nothing.
                return Ok(match operator {
                    Operator::In => Some(sql::helpers::false_expr()),
                    _ => None,
                });
            }
            Expression::BinaryArrayOperation {
                left: Box::new(column.clone()),
                operator: if operator == Operator::In {
                    BinaryArrayOperator::In
                } else {
                    BinaryArrayOperator::NotIn
                },
                right: items.iter().map(scalar).collect::<Result<Vec<_>, _>>()?,
            }
        }

        Operator::Like => like(column, BinaryOperator::Like, pattern(operand)?),
        Operator::ILike => like(
            column,
            BinaryOperator::CaseInsensitiveLike,
            pattern(operand)?,
        ),
        Operator::NotLike => like(column, BinaryOperator::NotLike, pattern(operand)?),
        Operator::NotILike => like(
            column,
            BinaryOperator::NotCaseInsensitiveLike,
            pattern(operand)?,
        ),

        Operator::Contains => like(column, BinaryOperator::Like, contains(&pattern(operand)?)),
        Operator::NotContains => like(column, BinaryOperator::NotLike, contains(&pattern(operand)?)),
        Operator::ContainsI => like(
            column,
            BinaryOperator::CaseInsensitiveLike,
            contains(&pattern(operand)?),
        ),
        Operator::NotContainsI => like(
            column,
            BinaryOperator::NotCaseInsensitiveLike,
            contains(&pattern(operand)?),
        ),
        Operator::StartsWith => {
            like(column, BinaryOperator::Like, starts_with(&pattern(operand)?))
        }
        Operator::StartsWithI => like(
            column,
            BinaryOperator::CaseInsensitiveLike,
            starts_with(&pattern(operand)?),
        ),
        Operator::EndsWith => like(column, BinaryOperator::Like, ends_with(&pattern(operand)?)),
        Operator::EndsWithI => like(
            column,
            BinaryOperator::CaseInsensitiveLike,
            ends_with(&pattern(operand)?),
        ),

        Operator::Is | Operator::IsNot => {
            if !operand.is_null() {
                return Err(malformed("only null is supported"));
            }
            Expression::UnaryOperation {
                expression: Box::new(column.clone()),
                operator: if operator == Operator::Is {
                    sql::ast::UnaryOperator::IsNull
                } else {
                    sql::ast::UnaryOperator::IsNotNull
                },
            }
        }

        Operator::Between => match operand.as_array().map(Vec::as_slice) {
            Some([low, high]) => Expression::And {
                left: Box::new(binary(
                    column,
                    BinaryOperator::GreaterThanOrEqualTo,
                    scalar(low)?,
                )),
                right: Box::new(binary(
                    column,
                    BinaryOperator::LessThanOrEqualTo,
                    scalar(high)?,
                )),
            },
            _ => return Err(malformed("expected an array of exactly two values")),
        },
    };

    Ok(Some(expression))
}

fn binary(column: &Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(column.clone()),
        operator,
        right: Box::new(right),
    }
}

fn like(column: &Expression, operator: BinaryOperator, pattern: String) -> Expression {
    binary(
        column,
        operator,
        values::parameter(sql::string::Param::String(pattern)),
    )
}

/// Escape the LIKE metacharacters `%`, `_` and `\`.
pub fn escape_like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains(value: &str) -> String {
    format!("%{}%", escape_like_pattern(value))
}

fn starts_with(value: &str) -> String {
    format!("{}%", escape_like_pattern(value))
}

fn ends_with(value: &str) -> String {
    format!("%{}", escape_like_pattern(value))
}
