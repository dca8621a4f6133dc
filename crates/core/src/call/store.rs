//! Call storage trait and error taxonomy.

use thiserror::Error;

use crate::call::{Call, CallStatus};

/// Error type for call operations.
#[derive(Debug, Error)]
pub enum CallError {
    /// No call with the given id.
    #[error("Call not found: {0}")]
    NotFound(String),

    /// Action attempted on a call whose status does not permit it.
    #[error("Cannot {action} call {call_id}: current status is {status}")]
    InvalidTransition {
        call_id: String,
        status: CallStatus,
        action: String,
    },

    /// The record was modified concurrently; the caller may retry.
    #[error("Call modified concurrently: {0}")]
    Conflict(String),

    /// Underlying persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Request to submit a new call.
#[derive(Debug, Clone)]
pub struct NewCall {
    /// Submitter name.
    pub name: String,
    /// Submitter email.
    pub email: String,
    /// Free-text problem description.
    pub message: String,
}

/// Trait for call storage backends.
///
/// `create` and `set_active` are single atomic units: the demotion of any
/// other active call and the write to the target either both take effect or
/// neither does.
pub trait CallStore: Send + Sync {
    /// Insert a new call as active, demoting any other active call to
    /// pending in the same transaction.
    fn create(&self, request: NewCall) -> Result<Call, CallError>;

    /// Get a call by id.
    fn get(&self, id: &str) -> Result<Option<Call>, CallError>;

    /// Persist the mutable fields (status, priority, solved_at) of an
    /// existing call. The call's version stamp must match the stored row;
    /// a stale stamp yields `Conflict`.
    fn update(&self, call: &Call) -> Result<Call, CallError>;

    /// Set the target call active, demoting any other active call to pending
    /// in the same transaction. Fails with `InvalidTransition` if the target
    /// is terminal. Idempotent when the target is already active.
    fn set_active(&self, id: &str) -> Result<Call, CallError>;

    /// All calls with the given status, unordered.
    fn list_by_status(&self, status: CallStatus) -> Result<Vec<Call>, CallError>;

    /// All calls in worklist order: status rank asc, priority desc,
    /// created_at asc.
    fn list_all_ordered(&self) -> Result<Vec<Call>, CallError>;
}
