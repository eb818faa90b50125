//! Embedded like store.
//!
//! Each item lives behind its own async mutex; the outer map lock is held only
//! long enough to find that mutex, so toggles on different items run in
//! parallel and toggles on the same item are serialized.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use super::{ItemKey, ItemKind, LikeState, LikeStore, PurgeReport, StoreError, ToggleOutcome};

#[derive(Debug, Default)]
struct ItemEntry {
    like_count: i32,
    likers: HashSet<String>,
}

/// `None` marks an item purged while another task was waiting on its lock.
type Slot = Arc<tokio::sync::Mutex<Option<ItemEntry>>>;

/// In-memory [`LikeStore`].
#[derive(Debug, Default)]
pub struct MemoryLikeStore {
    items: Mutex<HashMap<ItemKey, Slot>>,
}

impl MemoryLikeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a likeable item with no likes.
    pub fn insert_item(&self, item: ItemKey) {
        self.seed_item(item, std::iter::empty::<String>());
    }

    /// Register a likeable item already liked by `likers`.
    pub fn seed_item<I, S>(&self, item: ItemKey, likers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let likers: HashSet<String> = likers.into_iter().map(Into::into).collect();
        let entry = ItemEntry {
            like_count: likers.len() as i32,
            likers,
        };
        self.map().insert(item, Arc::new(tokio::sync::Mutex::new(Some(entry))));
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<ItemKey, Slot>> {
        // The map only holds handles, so a poisoned guard is still consistent.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, item: &ItemKey) -> Option<Slot> {
        self.map().get(item).cloned()
    }
}

#[async_trait::async_trait]
impl LikeStore for MemoryLikeStore {
    async fn toggle(&self, user_id: &str, item: &ItemKey) -> Result<ToggleOutcome, StoreError> {
        let slot = self
            .slot(item)
            .ok_or_else(|| StoreError::ItemNotFound(item.clone()))?;

        let mut guard = slot.lock().await;
        let entry = guard
            .as_mut()
            .ok_or_else(|| StoreError::ItemNotFound(item.clone()))?;

        let transition = LikeState::from_present(entry.likers.contains(user_id)).toggle();
        if transition.next.is_liked() {
            entry.likers.insert(user_id.to_string());
        } else {
            entry.likers.remove(user_id);
        }
        entry.like_count += transition.delta;

        Ok(ToggleOutcome {
            liked: transition.next.is_liked(),
            like_count: entry.like_count,
        })
    }

    async fn purge_item(&self, item: &ItemKey) -> Result<PurgeReport, StoreError> {
        let Some(slot) = self.slot(item) else {
            return Ok(PurgeReport::default());
        };

        let mut guard = slot.lock().await;
        let report = guard.take().map_or_else(PurgeReport::default, |entry| PurgeReport {
            records_removed: entry.likers.len() as u64,
            item_removed: true,
        });

        let mut map = self.map();
        // Only drop the handle we purged; the item may have been re-created.
        if map.get(item).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
            map.remove(item);
        }

        Ok(report)
    }

    async fn has_liked(&self, user_id: &str, item: &ItemKey) -> Result<bool, StoreError> {
        let Some(slot) = self.slot(item) else {
            return Ok(false);
        };
        let guard = slot.lock().await;
        Ok(guard
            .as_ref()
            .is_some_and(|entry| entry.likers.contains(user_id)))
    }

    async fn liked_ids(
        &self,
        user_id: &str,
        kind: ItemKind,
        ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        let mut liked = HashSet::new();
        for id in ids {
            if self.has_liked(user_id, &ItemKey::new(kind, id.as_str())).await? {
                liked.insert(id.clone());
            }
        }
        Ok(liked)
    }

    async fn like_count(&self, item: &ItemKey) -> Result<Option<i32>, StoreError> {
        let Some(slot) = self.slot(item) else {
            return Ok(None);
        };
        let guard = slot.lock().await;
        Ok(guard.as_ref().map(|entry| entry.like_count))
    }

    async fn record_count(&self, item: &ItemKey) -> Result<u64, StoreError> {
        let Some(slot) = self.slot(item) else {
            return Ok(0);
        };
        let guard = slot.lock().await;
        Ok(guard.as_ref().map_or(0, |entry| entry.likers.len() as u64))
    }
}
