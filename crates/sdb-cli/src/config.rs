use std::env;
use std::time::Duration;
use sdb_engine::ServiceConfig;
use crate::error::CliError;

const URL_VAR: &str = "SDB_ENGINE_URL";
const TIMEOUT_VAR: &str = "SDB_ENGINE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub service: ServiceConfig,
}

impl EngineSettings {
    /// Reads the environment, after pulling in a `.env` file if there is one
    pub fn load(url_override: Option<&str>) -> Result<Self, CliError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        Self::from_vars(
            url_override.map(str::to_string).or_else(|| env::var(URL_VAR).ok()),
            env::var(TIMEOUT_VAR).ok(),
        )
    }

    fn from_vars(url: Option<String>, timeout: Option<String>) -> Result<Self, CliError> {
        let defaults = ServiceConfig::default();

        let base_url = url.unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CliError::Config(format!(
                "{} must be an http(s) URL, got '{}'",
                URL_VAR, base_url
            )));
        }

        let timeout = match timeout {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| CliError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_VAR, raw
                )))?,
            None => defaults.timeout,
        };

        Ok(Self {
            service: ServiceConfig { base_url, timeout },
        })
    }
}
