pub mod audit;
pub mod call;
pub mod config;
pub mod metrics;

pub use call::{Call, CallAction, CallEngine, CallError, CallStatus, CallStore, NewCall, SqliteCallStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
