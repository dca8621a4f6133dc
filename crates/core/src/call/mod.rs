//! Call queue: data types, storage, and the lifecycle engine.

mod engine;
mod sqlite_store;
mod store;
mod types;

pub use engine::CallEngine;
pub use sqlite_store::SqliteCallStore;
pub use store::{CallError, CallStore, NewCall};
pub use types::{Call, CallAction, CallStatus};
