//! Errors raised while building or querying schemas.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("unknown field '{field}' on schema '{schema}'")]
    UnknownField { field: String, schema: String },
    #[error("field '{field}' of schema '{schema}' joins unknown schema '{target}'")]
    UnknownJoinTarget {
        schema: String,
        field: String,
        target: String,
    },
    #[error("field '{field}' of schema '{schema}' selects '{select}', which schema '{target}' does not define")]
    UnknownSelectField {
        schema: String,
        field: String,
        target: String,
        select: String,
    },
}
