//! Resolve the LIMIT and OFFSET of a query.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use filter_compiler_configuration::{CompilerSettings, LimitPolicy};
use query_engine_sql::sql;

use crate::translation::error::Error;

const CURSOR_PREFIX: &str = "cursor:";

/// A resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u64,
}

impl Pagination {
    pub fn to_sql(self) -> sql::ast::Limit {
        sql::ast::Limit {
            limit: Some(self.limit),
            offset: Some(self.offset),
        }
    }

    /// The cursor of the row at `index` within this page.
    pub fn cursor_for(self, index: u64) -> String {
        encode_cursor(self.offset.saturating_add(index))
    }
}

/// Resolve a requested limit and offset. A missing limit is the default limit; a limit
/// above the maximum is handled by the limit policy. Negative offsets become 0.
pub fn resolve_pagination(
    settings: &CompilerSettings,
    limit: Option<u32>,
    offset: Option<i64>,
) -> Result<Pagination, Error> {
    Ok(Pagination {
        limit: resolve_limit(settings, limit)?,
        offset: offset.map_or(0, |offset| offset.max(0).unsigned_abs()),
    })
}

fn resolve_limit(settings: &CompilerSettings, requested: Option<u32>) -> Result<u32, Error> {
    let Some(requested) = requested else {
        return Ok(settings.default_limit);
    };
    if requested <= settings.max_limit {
        return Ok(requested);
    }
    match settings.limit_policy {
        LimitPolicy::Reject => Err(Error::LimitExceedsMaximum {
            requested,
            maximum: settings.max_limit,
        }),
        LimitPolicy::Clamp => {
            tracing::warn!(
                requested,
                maximum = settings.max_limit,
                "clamping requested limit"
            );
            Ok(settings.max_limit)
        }
    }
}

/// Resolve relay-style cursor arguments to a page.
///
/// `first` takes precedence over `last` for the page size. With `after` the page starts
/// just past that cursor; with `before` it ends just before it.
pub fn resolve_cursor_pagination(
    settings: &CompilerSettings,
    first: Option<u32>,
    after: Option<&str>,
    last: Option<u32>,
    before: Option<&str>,
) -> Result<Pagination, Error> {
    let limit = resolve_limit(settings, first.or(last))?;
    let offset = match (after, before) {
        (Some(after), _) => decode_cursor(after)?
            .checked_add(1)
            .ok_or_else(|| Error::InvalidCursor(after.to_string()))?,
        (None, Some(before)) => decode_cursor(before)?.saturating_sub(u64::from(limit)),
        (None, None) => 0,
    };
    Ok(Pagination { limit, offset })
}

/// Encode a row offset as an opaque cursor.
pub fn encode_cursor(offset: u64) -> String {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

/// Decode a cursor produced by [`encode_cursor`].
pub fn decode_cursor(cursor: &str) -> Result<u64, Error> {
    let invalid = || Error::InvalidCursor(cursor.to_string());
    let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;
    decoded
        .strip_prefix(CURSOR_PREFIX)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(invalid)
}

/// Page information for a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub total_count: u64,
}

impl PageInfo {
    /// Page information from the total row count and the page that was read.
    pub fn calculate(total_count: u64, pagination: Pagination) -> Self {
        PageInfo {
            has_next_page: pagination.offset.saturating_add(u64::from(pagination.limit))
                < total_count,
            has_previous_page: pagination.offset > 0,
            total_count,
        }
    }
}
