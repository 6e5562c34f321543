//! API configuration.

use std::path::PathBuf;

use crate::{Result, SiloError};

/// Environment variable holding the API host, e.g. `https://api.example.com`.
pub const ENV_HOST: &str = "API_HOST";
/// Environment variable holding the static API key.
pub const ENV_KEY: &str = "API_KEY";
/// Environment variable holding the storage root for disk-mode downloads.
pub const ENV_STORAGE: &str = "API_STORAGE";

/// Connection settings for the data API.
///
/// Constructed once at startup and passed into the client; there is no
/// ambient global configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the API, without a trailing slash.
    pub host: String,
    /// Static API key sent as the `X-API-KEY` header.
    pub api_key: String,
    /// Root directory for disk-mode partition downloads.
    pub storage_root: PathBuf,
}

impl ApiConfig {
    /// Creates a configuration from explicit values.
    pub fn new(
        host: impl Into<String>,
        api_key: impl Into<String>,
        storage_root: impl Into<PathBuf>,
    ) -> Self {
        let host = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            storage_root: storage_root.into(),
        }
    }

    /// Reads the configuration from `API_HOST`, `API_KEY`, and `API_STORAGE`.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Config`] if any of the three variables is unset.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name).map_err(|_| SiloError::Config(format!("{name} is not set")))
        };
        Ok(Self::new(read(ENV_HOST)?, read(ENV_KEY)?, read(ENV_STORAGE)?))
    }
}
