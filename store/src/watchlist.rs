use crate::{KeyValueStore, StoreError};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Storage key holding the JSON-encoded list of watched coin ids
pub const WATCHLIST_KEY: &str = "watchlist";

/// The authoritative watchlist, shared by every view.
///
/// Ids keep their insertion order and are unique. Every successful toggle
/// persists the full list before returning and is published to subscribers.
pub struct WatchlistStore {
    storage: Arc<dyn KeyValueStore>,
    ids: Mutex<Vec<String>>,
    updates: watch::Sender<Vec<String>>,
}

impl WatchlistStore {
    /// Create the store, loading the persisted list
    pub async fn open(storage: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let (updates, _) = watch::channel(Vec::new());
        let store = Self {
            storage,
            ids: Mutex::new(Vec::new()),
            updates,
        };

        let ids = store.load().await?;
        info!("Loaded watchlist with {} coins", ids.len());
        Ok(store)
    }

    /// Re-sync with storage: re-read the persisted list and replace the
    /// in-memory copy, so edits made to the stored value by another writer
    /// become visible. Subscribers are notified when the list changed.
    ///
    /// A missing or malformed value yields an empty list.
    pub async fn load(&self) -> Result<Vec<String>, StoreError> {
        let mut current = self.ids.lock().await;
        let ids = read_ids(self.storage.as_ref()).await?;

        if *current != ids {
            *current = ids.clone();
            self.updates.send_replace(ids.clone());
        }
        Ok(ids)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.ids.lock().await.iter().any(|watched| watched == id)
    }

    pub async fn list(&self) -> Vec<String> {
        self.ids.lock().await.clone()
    }

    /// Remove `id` if watched, append it otherwise; returns the new list
    pub async fn toggle(&self, id: &str) -> Result<Vec<String>, StoreError> {
        let mut current = self.ids.lock().await;

        let mut updated = current.clone();
        if let Some(pos) = updated.iter().position(|watched| watched == id) {
            updated.remove(pos);
        } else {
            updated.push(id.to_string());
        }

        let encoded = serde_json::to_string(&updated)?;
        self.storage.set(WATCHLIST_KEY, encoded).await?;
        debug!("Toggled '{}', watchlist now has {} coins", id, updated.len());

        *current = updated.clone();
        self.updates.send_replace(updated.clone());
        Ok(updated)
    }

    /// Receive the list after every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.updates.subscribe()
    }
}

async fn read_ids(storage: &dyn KeyValueStore) -> Result<Vec<String>, StoreError> {
    let Some(raw) = storage.get(WATCHLIST_KEY).await? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => Ok(dedup(ids)),
        Err(e) => {
            warn!("Ignoring malformed watchlist value: {}", e);
            Ok(Vec::new())
        }
    }
}

// First occurrence wins
fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
