//! Errors for query translation.

use query_engine_metadata::metadata::MetadataError;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("collection '{0}' not found")]
    CollectionNotFound(String),
    #[error("unknown field '{field}' on schema '{schema}'")]
    UnknownField { field: String, schema: String },
    #[error("requested limit {requested} exceeds the maximum of {maximum}")]
    LimitExceedsMaximum { requested: u32, maximum: u32 },
    #[error("unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },
    #[error("malformed operand for '{operator}' on field '{field}': {reason}")]
    MalformedOperand {
        field: String,
        operator: String,
        reason: String,
    },
    #[error("malformed filter on '{field}': {reason}")]
    MalformedFilter { field: String, reason: String },
    #[error("malformed field path '{0}'")]
    MalformedPath(String),
    #[error("malformed order entry '{0}'")]
    MalformedOrder(String),
    #[error("field '{field}' of schema '{schema}' is not a relationship")]
    NotARelationship { field: String, schema: String },
    #[error("join target of field '{field}' on schema '{schema}' could not be resolved")]
    UnresolvedJoinTarget { field: String, schema: String },
    #[error("join depth {depth} exceeds the maximum of {max_depth}")]
    JoinDepthExceeded { depth: u32, max_depth: u32 },
    #[error("field '{0}' is selected more than once")]
    DuplicateSelectField(String),
    #[error("invalid cursor '{0}'")]
    InvalidCursor(String),
}

impl From<MetadataError> for Error {
    fn from(error: MetadataError) -> Self {
        match error {
            MetadataError::UnknownField { field, schema } => Error::UnknownField { field, schema },
            MetadataError::UnknownJoinTarget { schema, field, .. }
            | MetadataError::UnknownSelectField { schema, field, .. } => {
                Error::UnresolvedJoinTarget { field, schema }
            }
        }
    }
}
