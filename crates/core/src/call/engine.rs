//! Call lifecycle engine.
//!
//! Owns all writes to call records and enforces the transition rules:
//!
//! | Current          | Action   | Next     | Side effect               |
//! |------------------|----------|----------|---------------------------|
//! | (none)           | submit   | active   | demote current active     |
//! | active/pending   | solve    | solved   | set solved_at             |
//! | active/pending   | cancel   | canceled | none                      |
//! | pending          | activate | active   | demote current active     |
//! | active           | activate | active   | idempotent                |
//! | solved/canceled  | any      | —        | InvalidTransition         |
//!
//! Demotion is unconditional and happens in the same atomic unit as the
//! write that sets a call active, so at most one call is ever active.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{Call, CallAction, CallError, CallStatus, CallStore, NewCall};

/// Lifecycle engine over a call store.
///
/// The presentation layer goes through this type for every read and write;
/// it never touches the store directly, so the single-active invariant
/// cannot be bypassed.
pub struct CallEngine {
    store: Arc<dyn CallStore>,
}

impl CallEngine {
    pub fn new(store: Arc<dyn CallStore>) -> Self {
        Self { store }
    }

    /// Public submission: creates a new active call, demoting any current
    /// active call to pending in the same atomic unit.
    pub fn submit(&self, request: NewCall) -> Result<Call, CallError> {
        let call = self.store.create(request)?;
        info!(call_id = %call.id, "call submitted and activated");
        Ok(call)
    }

    /// Get a call by id.
    pub fn get(&self, id: &str) -> Result<Call, CallError> {
        self.store
            .get(id)?
            .ok_or_else(|| CallError::NotFound(id.to_string()))
    }

    /// All calls in worklist order: active first, then pending by priority
    /// descending and creation time ascending, terminal calls last.
    pub fn worklist(&self) -> Result<Vec<Call>, CallError> {
        self.store.list_all_ordered()
    }

    /// Apply a staff action to a call.
    pub fn apply_action(&self, id: &str, action: CallAction) -> Result<Call, CallError> {
        let mut call = self.get(id)?;

        if call.is_terminal() {
            return Err(CallError::InvalidTransition {
                call_id: call.id,
                status: call.status,
                action: action.to_string(),
            });
        }

        match action {
            CallAction::Solve => {
                call.status = CallStatus::Solved;
                call.solved_at = Some(Utc::now());
                let solved = self.store.update(&call)?;
                info!(call_id = %solved.id, "call solved");
                Ok(solved)
            }
            CallAction::Cancel => {
                call.status = CallStatus::Canceled;
                let canceled = self.store.update(&call)?;
                info!(call_id = %canceled.id, "call canceled");
                Ok(canceled)
            }
            CallAction::Activate => {
                // Delegated unconditionally: the store re-reads inside its
                // transaction, so an already-active call is an idempotent
                // promote and a racing submit cannot yield a stale answer.
                let activated = self.store.set_active(&call.id)?;
                info!(call_id = %activated.id, "call activated");
                Ok(activated)
            }
        }
    }

    /// Set a call's priority. Independent of the state machine except that
    /// terminal calls are immutable.
    pub fn set_priority(&self, id: &str, priority: u32) -> Result<Call, CallError> {
        let mut call = self.get(id)?;

        if call.is_terminal() {
            return Err(CallError::InvalidTransition {
                call_id: call.id,
                status: call.status,
                action: "reprioritize".to_string(),
            });
        }

        call.priority = priority;
        self.store.update(&call)
    }
}
