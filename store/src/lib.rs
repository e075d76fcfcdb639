mod config;
mod error;
mod kv;
mod watchlist;

pub use config::StoreConfig;
pub use error::StoreError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use watchlist::{WatchlistStore, WATCHLIST_KEY};
