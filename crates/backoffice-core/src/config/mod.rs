//! Application configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from a TOML file,
//! an optional environment overlay, and `BACKOFFICE__`-prefixed
//! environment variables. Each sub-module is one configuration section.

pub mod admin;
pub mod database;
pub mod logging;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::admin::{ActivityConfig, AdminConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};

use crate::error::AppError;

/// Environment variable naming the overlay file under `config/`.
pub const ENV_VAR: &str = "BACKOFFICE_ENV";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Admin area listing settings.
    #[serde(default)]
    pub admin: AdminConfig,
    /// User activity recorder settings.
    #[serde(default)]
    pub activity: ActivityConfig,
}

impl AppConfig {
    /// Load configuration from the TOML file at `path`.
    ///
    /// The file is optional so that a deployment can be configured purely
    /// through the environment. When `BACKOFFICE_ENV` is set, the file
    /// `config/<env>.toml` is merged on top, and finally variables such as
    /// `BACKOFFICE__DATABASE__URL` override individual keys.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(false));

        if let Ok(env) = std::env::var(ENV_VAR) {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("BACKOFFICE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
