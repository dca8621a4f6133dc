//! Audit trail query endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use calldesk_core::audit::{AuditFilter, AuditRecord, DEFAULT_PAGE_SIZE};

use crate::state::AppState;

/// Query parameters for `GET /audit`.
///
/// All filters are optional and combine with AND. Timestamps are ISO 8601.
#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    pub call_id: Option<String>,
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQueryParams {
    /// Filter without pagination, shared by the query and the total count.
    fn base_filter(&self) -> AuditFilter {
        let mut filter = AuditFilter::new();
        if let Some(ref call_id) = self.call_id {
            filter.call_id = Some(call_id.clone());
        }
        if let Some(ref event_type) = self.event_type {
            filter = filter.event_type(event_type);
        }
        if let Some(ref user_id) = self.user_id {
            filter = filter.by_user(user_id);
        }
        filter.since = self.from;
        filter.until = self.to;
        filter
    }
}

/// Response for audit query endpoint
#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    /// Events matching the filter, newest first
    pub events: Vec<AuditRecord>,
    /// Total number of matching events, ignoring pagination
    pub total: i64,
    /// Limit used for this query (after clamping)
    pub limit: i64,
    /// Offset used for this query
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct AuditErrorResponse {
    pub error: String,
}

fn storage_error(context: &str, e: impl std::fmt::Display) -> (StatusCode, Json<AuditErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AuditErrorResponse {
            error: format!("{}: {}", context, e),
        }),
    )
}

/// Query the audit trail with optional filters and pagination.
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, (StatusCode, Json<AuditErrorResponse>)> {
    let base_filter = params.base_filter();
    let query_filter = base_filter.clone().page(
        params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        params.offset.unwrap_or(0),
    );

    let events = state
        .audit_store()
        .query(&query_filter)
        .map_err(|e| storage_error("Failed to query audit events", e))?;

    let total = state
        .audit_store()
        .count(&base_filter)
        .map_err(|e| storage_error("Failed to count audit events", e))?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit: query_filter.limit,
        offset: query_filter.offset,
    }))
}
