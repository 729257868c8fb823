use std::path::Path;

use smarthome_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_TEMPERATURE_API_URL: &str = "TEMPERATURE_API_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Builds an `AppConfig` from an optional file plus environment overrides.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config file (if any) and apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => AppConfig::default(),
        };
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Overlay environment values. `lookup` is injected so callers and tests
    /// can supply something other than the process environment.
    pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_DATABASE_URL) {
            debug!("database url overridden from {ENV_DATABASE_URL}");
            config.database.url = url;
        }
        if let Some(url) = get(ENV_TEMPERATURE_API_URL) {
            debug!("temperature api url overridden from {ENV_TEMPERATURE_API_URL}");
            config.temperature_api.url = url;
        }
        if let Some(port) = get(ENV_PORT) {
            apply_listen_addr(config, &port)?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log.level = level;
        }
        Ok(())
    }
}

/// Accepts `"8080"`, `":8080"` or `"host:8080"`.
fn apply_listen_addr(config: &mut AppConfig, value: &str) -> Result<()> {
    let value = value.trim();
    let (host, port) = match value.rsplit_once(':') {
        Some((host, port)) => (Some(host), port),
        None => (None, value),
    };

    let port: u16 = port
        .parse()
        .map_err(|_| Error::Config(format!("invalid {ENV_PORT} value: {value}")))?;

    config.server.port = port;
    if let Some(host) = host.filter(|h| !h.is_empty()) {
        config.server.host = host.to_string();
    }
    Ok(())
}
