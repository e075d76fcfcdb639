use std::path::PathBuf;

const DEFAULT_WATCHLIST_PATH: &str = "watchlist.json";

/// Configuration for the local key/value store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// File holding the persisted key/value pairs
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_WATCHLIST_PATH),
        }
    }
}

impl StoreConfig {
    /// Create a new store configuration from environment variables
    pub fn from_env() -> Self {
        let path = std::env::var("WATCHLIST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WATCHLIST_PATH));

        Self { path }
    }
}
