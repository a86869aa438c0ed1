//! Admin area and activity recorder configuration.

use serde::{Deserialize, Serialize};

/// Settings for the admin listings and overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Rows per page on every management listing.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Number of rows in each overview "latest"/"top" panel.
    #[serde(default = "default_overview_limit")]
    pub overview_limit: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            overview_limit: default_overview_limit(),
        }
    }
}

/// Settings for the login/logout activity recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Maximum number of auth events buffered before `record` waits.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_overview_limit() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    1024
}
