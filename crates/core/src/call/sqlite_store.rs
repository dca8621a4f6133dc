//! SQLite-backed call store implementation.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{Call, CallError, CallStatus, CallStore, NewCall};

const CALL_COLUMNS: &str =
    "id, name, email, message, status, priority, created_at, solved_at, version, updated_at";

/// SQLite-backed call store.
///
/// The connection mutex serializes writers; `create` and `set_active` run
/// their demote-and-write sequence inside a single transaction so readers
/// never observe two active calls, nor zero after the first submission.
pub struct SqliteCallStore {
    conn: Mutex<Connection>,
}

impl SqliteCallStore {
    /// Create a new SQLite call store, creating the database file and tables
    /// if needed.
    pub fn new(path: &Path) -> Result<Self, CallError> {
        let conn = Connection::open(path).map_err(|e| CallError::Storage(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite call store (useful for testing).
    pub fn in_memory() -> Result<Self, CallError> {
        let conn = Connection::open_in_memory().map_err(|e| CallError::Storage(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CallError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS calls (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                status TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                solved_at TEXT,
                version INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_calls_status ON calls(status);
            CREATE INDEX IF NOT EXISTS idx_calls_priority ON calls(priority DESC);
            CREATE INDEX IF NOT EXISTS idx_calls_created_at ON calls(created_at);
            "#,
        )
        .map_err(|e| CallError::Storage(e.to_string()))?;

        Ok(())
    }

    fn row_to_call(row: &rusqlite::Row) -> rusqlite::Result<Call> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let email: String = row.get(2)?;
        let message: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let priority: u32 = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let solved_at_str: Option<String> = row.get(7)?;
        let version: u64 = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let status = CallStatus::from_str(&status_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;

        // Timestamps are written by this store; fall back to now on the
        // off chance a row was edited by hand.
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let solved_at = solved_at_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        Ok(Call {
            id,
            name,
            email,
            message,
            status,
            priority,
            created_at,
            solved_at,
            version,
            updated_at,
        })
    }
}

impl CallStore for SqliteCallStore {
    fn create(&self, request: NewCall) -> Result<Call, CallError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| CallError::Storage(e.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        // Demote whatever currently holds the slot; both writes commit
        // together.
        tx.execute(
            "UPDATE calls SET status = 'pending', version = version + 1, updated_at = ? \
             WHERE status = 'active'",
            params![now.to_rfc3339()],
        )
        .map_err(|e| CallError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO calls (id, name, email, message, status, priority, created_at, solved_at, version, updated_at) \
             VALUES (?, ?, ?, ?, 'active', 0, ?, NULL, 0, ?)",
            params![
                id,
                request.name,
                request.email,
                request.message,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| CallError::Storage(e.to_string()))?;

        tx.commit().map_err(|e| CallError::Storage(e.to_string()))?;

        Ok(Call {
            id,
            name: request.name,
            email: request.email,
            message: request.message,
            status: CallStatus::Active,
            priority: 0,
            created_at: now,
            solved_at: None,
            version: 0,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Call>, CallError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM calls WHERE id = ?", CALL_COLUMNS),
            params![id],
            Self::row_to_call,
        );

        match result {
            Ok(call) => Ok(Some(call)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CallError::Storage(e.to_string())),
        }
    }

    fn update(&self, call: &Call) -> Result<Call, CallError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let changed = conn
            .execute(
                "UPDATE calls SET status = ?, priority = ?, solved_at = ?, version = version + 1, updated_at = ? \
                 WHERE id = ? AND version = ?",
                params![
                    call.status.as_str(),
                    call.priority,
                    call.solved_at.map(|dt| dt.to_rfc3339()),
                    now.to_rfc3339(),
                    call.id,
                    call.version,
                ],
            )
            .map_err(|e| CallError::Storage(e.to_string()))?;

        if changed == 0 {
            // Distinguish a vanished row from a stale version stamp.
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM calls WHERE id = ?",
                    params![call.id],
                    |row| row.get::<_, i64>(0),
                )
                .map(|n| n > 0)
                .map_err(|e| CallError::Storage(e.to_string()))?;

            return if exists {
                Err(CallError::Conflict(call.id.clone()))
            } else {
                Err(CallError::NotFound(call.id.clone()))
            };
        }

        Ok(Call {
            version: call.version + 1,
            updated_at: now,
            ..call.clone()
        })
    }

    fn set_active(&self, id: &str) -> Result<Call, CallError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| CallError::Storage(e.to_string()))?;

        let current = tx.query_row(
            &format!("SELECT {} FROM calls WHERE id = ?", CALL_COLUMNS),
            params![id],
            Self::row_to_call,
        );

        let current = match current {
            Ok(call) => call,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(CallError::NotFound(id.to_string()));
            }
            Err(e) => return Err(CallError::Storage(e.to_string())),
        };

        // Re-checked inside the transaction so a racing solve/cancel cannot
        // be overwritten.
        if current.status.is_terminal() {
            return Err(CallError::InvalidTransition {
                call_id: id.to_string(),
                status: current.status,
                action: "activate".to_string(),
            });
        }

        let now = Utc::now();

        tx.execute(
            "UPDATE calls SET status = 'pending', version = version + 1, updated_at = ? \
             WHERE status = 'active' AND id != ?",
            params![now.to_rfc3339(), id],
        )
        .map_err(|e| CallError::Storage(e.to_string()))?;

        tx.execute(
            "UPDATE calls SET status = 'active', version = version + 1, updated_at = ? WHERE id = ?",
            params![now.to_rfc3339(), id],
        )
        .map_err(|e| CallError::Storage(e.to_string()))?;

        tx.commit().map_err(|e| CallError::Storage(e.to_string()))?;

        Ok(Call {
            status: CallStatus::Active,
            version: current.version + 1,
            updated_at: now,
            ..current
        })
    }

    fn list_by_status(&self, status: CallStatus) -> Result<Vec<Call>, CallError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM calls WHERE status = ?",
                CALL_COLUMNS
            ))
            .map_err(|e| CallError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![status.as_str()], Self::row_to_call)
            .map_err(|e| CallError::Storage(e.to_string()))?;

        let mut calls = Vec::new();
        for row_result in rows {
            calls.push(row_result.map_err(|e| CallError::Storage(e.to_string()))?);
        }

        Ok(calls)
    }

    fn list_all_ordered(&self) -> Result<Vec<Call>, CallError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM calls ORDER BY \
                 CASE status \
                     WHEN 'active' THEN 0 \
                     WHEN 'pending' THEN 1 \
                     WHEN 'solved' THEN 2 \
                     ELSE 3 \
                 END ASC, \
                 priority DESC, \
                 created_at ASC",
                CALL_COLUMNS
            ))
            .map_err(|e| CallError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_call)
            .map_err(|e| CallError::Storage(e.to_string()))?;

        let mut calls = Vec::new();
        for row_result in rows {
            calls.push(row_result.map_err(|e| CallError::Storage(e.to_string()))?);
        }

        Ok(calls)
    }
}
