//! Core call data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current status of a call.
///
/// State machine:
/// ```text
/// submit ──> Active <──> Pending
///               │            │
///               ├── solve ───┼──> Solved
///               └── cancel ──┴──> Canceled
/// ```
///
/// `Active` and `Pending` are mutually reachable; `Solved` and `Canceled`
/// are terminal. At most one call is `Active` at any instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Pending,
    Active,
    Solved,
    Canceled,
}

impl CallStatus {
    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Solved | CallStatus::Canceled)
    }

    /// Worklist rank: active calls sort first, terminal calls last.
    pub fn rank(&self) -> u8 {
        match self {
            CallStatus::Active => 0,
            CallStatus::Pending => 1,
            CallStatus::Solved => 2,
            CallStatus::Canceled => 3,
        }
    }

    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Active => "active",
            CallStatus::Solved => "solved",
            CallStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CallStatus::Pending),
            "active" => Ok(CallStatus::Active),
            "solved" => Ok(CallStatus::Solved),
            "canceled" => Ok(CallStatus::Canceled),
            other => Err(format!("unknown call status: {}", other)),
        }
    }
}

/// Staff action applied to an existing call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    Solve,
    Cancel,
    Activate,
}

impl CallAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallAction::Solve => "solve",
            CallAction::Cancel => "cancel",
            CallAction::Activate => "activate",
        }
    }
}

impl fmt::Display for CallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A support call record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Call {
    /// Unique identifier (UUID), assigned on creation.
    pub id: String,

    /// Submitter name.
    pub name: String,

    /// Submitter email.
    pub email: String,

    /// Free-text problem description.
    pub message: String,

    /// Current status.
    pub status: CallStatus,

    /// Secondary ordering key among non-active calls (higher = more urgent).
    /// Independent field, never derived from timestamps.
    pub priority: u32,

    /// When the call was submitted.
    pub created_at: DateTime<Utc>,

    /// Set exactly once when the call is solved; None otherwise.
    pub solved_at: Option<DateTime<Utc>>,

    /// Optimistic-concurrency stamp, bumped on every store write.
    #[serde(default)]
    pub version: u64,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Call {
    /// Returns true if no further actions are permitted on this call.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Worklist ordering key: status rank asc, priority desc, created_at asc.
    pub fn worklist_key(&self) -> (u8, std::cmp::Reverse<u32>, DateTime<Utc>) {
        (
            self.status.rank(),
            std::cmp::Reverse(self.priority),
            self.created_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!CallStatus::Pending.is_terminal());
        assert!(!CallStatus::Active.is_terminal());
        assert!(CallStatus::Solved.is_terminal());
        assert!(CallStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_status_rank_orders_active_first() {
        assert!(CallStatus::Active.rank() < CallStatus::Pending.rank());
        assert!(CallStatus::Pending.rank() < CallStatus::Solved.rank());
        assert!(CallStatus::Solved.rank() < CallStatus::Canceled.rank());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            CallStatus::Pending,
            CallStatus::Active,
            CallStatus::Solved,
            CallStatus::Canceled,
        ] {
            let parsed: CallStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert!("open".parse::<CallStatus>().is_err());
        assert!("".parse::<CallStatus>().is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&CallStatus::Active).unwrap();
        assert_eq!(json, r#""active""#);

        let deserialized: CallStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, CallStatus::Active);
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&CallAction::Activate).unwrap();
        assert_eq!(json, r#""activate""#);

        let deserialized: CallAction = serde_json::from_str(r#""solve""#).unwrap();
        assert_eq!(deserialized, CallAction::Solve);
    }

    #[test]
    fn test_worklist_key_ordering() {
        let now = Utc::now();
        let call = |status: CallStatus, priority: u32, created_at: DateTime<Utc>| Call {
            id: "x".to_string(),
            name: "n".to_string(),
            email: "e".to_string(),
            message: "m".to_string(),
            status,
            priority,
            created_at,
            solved_at: None,
            version: 0,
            updated_at: created_at,
        };

        let active = call(CallStatus::Active, 0, now);
        let pending_high = call(CallStatus::Pending, 5, now);
        let pending_low = call(CallStatus::Pending, 1, now);
        let earlier = call(CallStatus::Pending, 1, now - chrono::Duration::seconds(10));
        let solved = call(CallStatus::Solved, 100, now);

        // Active sorts before any pending regardless of priority.
        assert!(active.worklist_key() < pending_high.worklist_key());
        // Higher priority sorts first among pending.
        assert!(pending_high.worklist_key() < pending_low.worklist_key());
        // Earlier creation breaks priority ties.
        assert!(earlier.worklist_key() < pending_low.worklist_key());
        // Terminal calls sort last, even with high priority.
        assert!(pending_low.worklist_key() < solved.worklist_key());
    }
}
