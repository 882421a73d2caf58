/*
 * Responsibility
 * - Resolve the tableId tenant context from its three sources in strict
 *   priority order: token claims, X-Table-Id header, tableId query parameter
 * - Enforce the customer-mandatory rule
 */
use axum::http::HeaderMap;

use crate::error::GatewayError;
use crate::services::auth::{Claims, Role};

pub const TABLE_ID_HEADER: &str = "x-table-id";
pub const TABLE_ID_PARAM: &str = "tableId";

/// Resolve the tableId for an authenticated request.
///
/// Claims win over the header, the header over the query parameter. Parse
/// failures at the header/query steps are logged and fall through to the
/// next source. Customers must end up with a positive tableId from one of
/// the three sources; every other role may proceed without one.
pub fn resolve(
    claims: &Claims,
    role: Role,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<Option<i64>, GatewayError> {
    let table_id = claims
        .table_id()
        .or_else(|| from_header(headers))
        .or_else(|| from_query(query));

    if role == Role::Customer && !table_id.is_some_and(|id| id > 0) {
        return Err(GatewayError::ClaimMissing(
            "A valid TableId must be present for Customers in JWT claims \
             or X-Table-Id header/query parameter"
                .into(),
        ));
    }

    Ok(table_id)
}

fn from_header(headers: &HeaderMap) -> Option<i64> {
    let raw = headers.get(TABLE_ID_HEADER)?.to_str().ok()?;
    parse_positive(raw, "X-Table-Id header")
}

fn from_query(query: Option<&str>) -> Option<i64> {
    let query = query?;
    let (_, value) = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TABLE_ID_PARAM)?;
    parse_positive(&value, "tableId query parameter")
}

fn parse_positive(raw: &str, source: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            tracing::warn!(value = raw, source, "invalid tableId value, ignoring");
            None
        }
    }
}
