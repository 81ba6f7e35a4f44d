use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::view::{Direction, SortKey};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

/// Listing server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the REST API to
    pub bind_address: String,

    /// Port for the REST API server
    pub port: u16,

    /// Page size used when a request names no limit
    pub default_page_size: usize,

    /// Upper bound for a requested limit
    pub max_page_size: usize,

    /// Capture files loaded at startup
    pub captures: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            default_page_size: crate::store::DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            captures: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Clamp a requested page limit; 0 means the default
    pub fn clamp_limit(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default_page_size.min(self.max_page_size)
        } else {
            requested.min(self.max_page_size)
        }
    }
}

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Base URL of the listing server
    pub server: String,

    pub capture_id: String,

    /// Records requested per page
    pub page_size: usize,

    /// Pages to load after the first
    pub pages: usize,

    /// Display filter text
    pub filter: Option<String>,

    pub search: Option<String>,

    pub sort: Option<(SortKey, Direction)>,

    /// Sequence numbers to mark
    pub marks: Vec<u64>,

    /// Show only the conversation of this sequence number
    pub follow: Option<u64>,

    /// Fetch and print the detail of this sequence number
    pub inspect: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        let config = ServerConfig {
            max_page_size: 500,
            ..ServerConfig::default()
        };
        assert_eq!(config.clamp_limit(0), 100);
        assert_eq!(config.clamp_limit(50), 50);
        assert_eq!(config.clamp_limit(10_000), 500);
    }
}
