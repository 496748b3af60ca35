//! Handle the translation of literal values.

use query_engine_sql::sql;

/// Convert a scalar JSON value into a query parameter.
/// Returns `None` for null, arrays and objects, which cannot be bound as a single scalar.
pub fn translate_json_value(value: &serde_json::Value) -> Option<sql::string::Param> {
    match value {
        serde_json::Value::String(s) => Some(sql::string::Param::String(s.clone())),
        serde_json::Value::Bool(b) => Some(sql::string::Param::Bool(*b)),
        serde_json::Value::Number(num) => match num.as_i64() {
            Some(i) => Some(sql::string::Param::Int8(i)),
            None => num.as_f64().map(sql::string::Param::Float8),
        },
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

/// A parameter expression.
pub fn parameter(param: sql::string::Param) -> sql::ast::Expression {
    sql::ast::Expression::Value(sql::ast::Value::Parameter(param))
}
