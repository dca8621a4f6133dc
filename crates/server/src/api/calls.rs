//! Call API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use calldesk_core::audit::AuditEvent;
use calldesk_core::call::{Call, CallAction, CallError, CallStatus, NewCall};
use calldesk_core::metrics::{CALLS_SUBMITTED, CALL_ACTIONS};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a call
#[derive(Debug, Deserialize)]
pub struct SubmitCallBody {
    /// Submitter name
    pub name: String,
    /// Submitter email
    pub email: String,
    /// Free-text problem description
    pub message: String,
}

/// Request body for applying an action
#[derive(Debug, Deserialize)]
pub struct CallActionBody {
    pub action: CallAction,
}

/// Request body for setting priority
#[derive(Debug, Deserialize)]
pub struct SetPriorityBody {
    pub priority: u32,
}

/// Response for call operations
#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: CallStatus,
    pub priority: u32,
    pub created_at: String,
    pub solved_at: Option<String>,
    pub updated_at: String,
}

impl From<Call> for CallResponse {
    fn from(call: Call) -> Self {
        Self {
            id: call.id,
            name: call.name,
            email: call.email,
            message: call.message,
            status: call.status,
            priority: call.priority,
            created_at: call.created_at.to_rfc3339(),
            solved_at: call.solved_at.map(|t| t.to_rfc3339()),
            updated_at: call.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing calls
#[derive(Debug, Serialize)]
pub struct ListCallsResponse {
    pub calls: Vec<CallResponse>,
    pub total: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct CallErrorResponse {
    pub error: String,
}

/// Map a call error to an HTTP response.
///
/// NotFound maps to 404, rejected transitions and write conflicts to 409,
/// storage failures to 500.
fn error_response(e: CallError) -> (StatusCode, Json<CallErrorResponse>) {
    let status = match e {
        CallError::NotFound(_) => StatusCode::NOT_FOUND,
        CallError::InvalidTransition { .. } | CallError::Conflict(_) => StatusCode::CONFLICT,
        CallError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(CallErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn record_action(action: &str, result: &Result<Call, CallError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(CallError::NotFound(_)) => "rejected",
        Err(CallError::InvalidTransition { .. }) => "rejected",
        Err(CallError::Conflict(_)) => "rejected",
        Err(CallError::Storage(_)) => "error",
    };
    CALL_ACTIONS.with_label_values(&[action, outcome]).inc();
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new call. The new call becomes active immediately.
pub async fn submit_call(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitCallBody>,
) -> Result<(StatusCode, Json<CallResponse>), impl IntoResponse> {
    let request = NewCall {
        name: body.name,
        email: body.email,
        message: body.message,
    };

    match state.engine().submit(request) {
        Ok(call) => {
            CALLS_SUBMITTED.inc();
            state.audit().try_emit(AuditEvent::CallSubmitted {
                call_id: call.id.clone(),
                name: call.name.clone(),
                email: call.email.clone(),
            });

            Ok((StatusCode::CREATED, Json(CallResponse::from(call))))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Get a call by ID
pub async fn get_call(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CallResponse>, impl IntoResponse> {
    match state.engine().get(&id) {
        Ok(call) => Ok(Json(CallResponse::from(call))),
        Err(e) => Err(error_response(e)),
    }
}

/// List all calls in worklist order
pub async fn list_calls(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListCallsResponse>, impl IntoResponse> {
    match state.engine().worklist() {
        Ok(calls) => {
            let total = calls.len();
            Ok(Json(ListCallsResponse {
                calls: calls.into_iter().map(CallResponse::from).collect(),
                total,
            }))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Apply a lifecycle action to a call
pub async fn call_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CallActionBody>,
) -> Result<Json<CallResponse>, impl IntoResponse> {
    let actor = "anonymous".to_string(); // TODO: Get from auth

    // Snapshot the status before the action for the audit record.
    let previous_status = state
        .engine()
        .get(&id)
        .map(|c| c.status.to_string())
        .unwrap_or_default();

    let result = state.engine().apply_action(&id, body.action);
    record_action(body.action.as_str(), &result);

    match result {
        Ok(call) => {
            let event = match body.action {
                CallAction::Solve => AuditEvent::CallSolved {
                    call_id: call.id.clone(),
                    solved_by: actor,
                    previous_status,
                },
                CallAction::Cancel => AuditEvent::CallCancelled {
                    call_id: call.id.clone(),
                    cancelled_by: actor,
                    previous_status,
                },
                CallAction::Activate => AuditEvent::CallActivated {
                    call_id: call.id.clone(),
                    activated_by: actor,
                },
            };
            state.audit().try_emit(event);

            Ok(Json(CallResponse::from(call)))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Set a call's priority
pub async fn set_priority(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SetPriorityBody>,
) -> Result<Json<CallResponse>, impl IntoResponse> {
    let actor = "anonymous".to_string(); // TODO: Get from auth

    let old_priority = state
        .engine()
        .get(&id)
        .map(|c| c.priority)
        .unwrap_or_default();

    let result = state.engine().set_priority(&id, body.priority);
    record_action("reprioritize", &result);

    match result {
        Ok(call) => {
            state.audit().try_emit(AuditEvent::CallReprioritized {
                call_id: call.id.clone(),
                changed_by: actor,
                old_priority,
                new_priority: call.priority,
            });

            Ok(Json(CallResponse::from(call)))
        }
        Err(e) => Err(error_response(e)),
    }
}
