use std::time::Instant;

use axum::http::Method;

use crate::services::auth::Role;

/// Identity resolved by the authentication stage. Absent on public paths.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
    pub table_id: Option<i64>,
}

impl Identity {
    pub fn role_name(&self) -> &'static str {
        self.role.as_str()
    }
}

/// Per-request state threaded through the stage chain by `&mut`.
///
/// Constructed at chain entry, dropped at exit; owned exclusively by one
/// request's pipeline run. Replaces the untyped attribute bag a generic
/// filter framework would offer, so a stage can't misspell a key or read a
/// value of the wrong type.
///
/// `path` is the logical path as the client addressed it, captured before
/// any rewriting for backend routing — both the public-path check and the
/// role policy must see this one.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub correlation_id: Option<String>,
    pub identity: Option<Identity>,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            correlation_id: None,
            identity: None,
            started_at: Instant::now(),
        }
    }
}
