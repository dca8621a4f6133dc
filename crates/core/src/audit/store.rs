use chrono::{DateTime, Utc};
use thiserror::Error;

use super::AuditRecord;

/// Page size applied when a query does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Hard cap on page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for querying the audit trail.
///
/// The common lookups are "everything about one call" and "one event type
/// across calls"; conditions AND together, time bounds are inclusive.
#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub call_id: Option<String>,
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            call_id: None,
            event_type: None,
            user_id: None,
            since: None,
            until: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded for one call, newest first.
    pub fn for_call(call_id: impl Into<String>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            ..Self::default()
        }
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn by_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Set pagination, clamping the limit to `1..=MAX_PAGE_SIZE` and the
    /// offset to non-negative.
    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self.offset = offset.max(0);
        self
    }
}

/// Trait for audit event storage
pub trait AuditStore: Send + Sync {
    /// Insert an audit record, returns the assigned ID
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError>;

    /// Query audit records with optional filters
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError>;

    /// Count matching audit records, ignoring pagination
    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError>;
}
