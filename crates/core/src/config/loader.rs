use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Env var prefix for overrides: `CALLDESK_SERVER_PORT=9000` overrides
/// `[server] port` from the file.
const ENV_PREFIX: &str = "CALLDESK_";

/// Provider stack: the TOML file is the base, env vars win.
fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"))
}

/// Load the service configuration.
///
/// A missing file is a hard error; a fresh deployment should fail loudly
/// rather than run on defaults nobody wrote down.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse configuration from a TOML string, without env overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Figment::from(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
