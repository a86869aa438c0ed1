//! Database configuration.

use serde::{Deserialize, Serialize};

/// Where the backoffice keeps its tables and how many connections it may hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Pool ceiling.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept warm.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a free connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Seconds before an idle connection is dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Server-side `statement_timeout` in milliseconds. 0, the default,
    /// leaves the server setting alone.
    ///
    /// A write that outlives it is cancelled by Postgres and its
    /// transaction rolled back.
    #[serde(default)]
    pub statement_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}
