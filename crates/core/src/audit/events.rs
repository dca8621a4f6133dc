use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Call lifecycle
    CallSubmitted {
        call_id: String,
        name: String,
        email: String,
    },
    CallSolved {
        call_id: String,
        solved_by: String,
        /// Status the call held before solving ("active" or "pending")
        previous_status: String,
    },
    CallCancelled {
        call_id: String,
        cancelled_by: String,
        previous_status: String,
    },
    CallActivated {
        call_id: String,
        activated_by: String,
    },
    CallReprioritized {
        call_id: String,
        changed_by: String,
        old_priority: u32,
        new_priority: u32,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::CallSubmitted { .. } => "call_submitted",
            Self::CallSolved { .. } => "call_solved",
            Self::CallCancelled { .. } => "call_cancelled",
            Self::CallActivated { .. } => "call_activated",
            Self::CallReprioritized { .. } => "call_reprioritized",
        }
    }

    /// Extract call_id if this event is call-related
    pub fn call_id(&self) -> Option<&str> {
        match self {
            Self::CallSubmitted { call_id, .. }
            | Self::CallSolved { call_id, .. }
            | Self::CallCancelled { call_id, .. }
            | Self::CallActivated { call_id, .. }
            | Self::CallReprioritized { call_id, .. } => Some(call_id),
            _ => None,
        }
    }

    /// Extract user_id if this event was triggered by a user action
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::CallSolved { solved_by, .. } => Some(solved_by),
            Self::CallCancelled { cancelled_by, .. } => Some(cancelled_by),
            Self::CallActivated { activated_by, .. } => Some(activated_by),
            Self::CallReprioritized { changed_by, .. } => Some(changed_by),
            _ => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub call_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}
