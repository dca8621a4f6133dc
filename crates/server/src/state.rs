use std::sync::Arc;

use calldesk_core::audit::{AuditHandle, AuditStore};
use calldesk_core::{CallEngine, Config, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: Arc<CallEngine>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: Arc<CallEngine>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            engine,
            audit,
            audit_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &CallEngine {
        self.engine.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
