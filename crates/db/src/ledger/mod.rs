//! Like ledger storage contract.
//!
//! Every likeable item carries a denormalized `like_count` next to the set of
//! [`item_like`](crate::entities::item_like) rows pointing at it. A
//! [`LikeStore`] keeps the two in step: the count always equals the number of
//! like rows between completed operations, and a user holds at most one like
//! per item.
//!
//! The decision of what a toggle does is [`LikeState::toggle`], a pure
//! function. Stores only look up the current state, ask for the
//! [`Transition`], and apply exactly its row change and counter delta inside
//! one per-item critical section.

pub mod memory;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::entities::item_like::ItemKind;
pub use memory::MemoryLikeStore;

/// Natural key of a likeable item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Item kind.
    pub kind: ItemKind,
    /// Item ID within its kind.
    pub id: String,
}

impl ItemKey {
    /// Create a key.
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key of a shot.
    pub fn shot(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Shot, id)
    }

    /// Key of a tutorial.
    pub fn tutorial(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Tutorial, id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Like state of one `(user, item)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    /// No like row exists for the pair.
    NotLiked,
    /// A like row exists for the pair.
    Liked,
}

/// Result of toggling a [`LikeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the toggle.
    pub next: LikeState,
    /// Change to apply to the item's `like_count`: `+1` or `-1`.
    pub delta: i32,
}

impl LikeState {
    /// State implied by whether a like row is present.
    #[must_use]
    pub const fn from_present(present: bool) -> Self {
        if present { Self::Liked } else { Self::NotLiked }
    }

    /// Whether this is [`LikeState::Liked`].
    #[must_use]
    pub const fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }

    /// The only transition: flip the state and report the counter delta.
    #[must_use]
    pub const fn toggle(self) -> Transition {
        match self {
            Self::NotLiked => Transition {
                next: Self::Liked,
                delta: 1,
            },
            Self::Liked => Transition {
                next: Self::NotLiked,
                delta: -1,
            },
        }
    }
}

/// What a completed toggle left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    /// Whether the caller now likes the item.
    pub liked: bool,
    /// The item's like count after the toggle.
    pub like_count: i32,
}

/// What [`LikeStore::purge_item`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    /// Like rows deleted.
    pub records_removed: u64,
    /// Whether the item row itself existed and was deleted.
    pub item_removed: bool,
}

/// Like store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced item does not exist. Nothing was changed.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemKey),

    /// The critical section could not be entered (deadlock, serialization
    /// failure, lock wait timeout). Nothing was changed; safe to retry.
    #[error("Contended: {0}")]
    Contended(String),

    /// Any other storage fault.
    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the operation may succeed if retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Contended(_))
    }
}

/// Storage for likes and like counters.
///
/// Implementations must run each `toggle` and `purge_item` as one atomic unit
/// scoped to the single item, so toggles on the same item are linearizable and
/// toggles on different items never wait on each other.
#[async_trait::async_trait]
pub trait LikeStore: Send + Sync {
    /// Flip the like of `user_id` on `item` and adjust the counter by the
    /// transition's delta, atomically.
    async fn toggle(&self, user_id: &str, item: &ItemKey) -> Result<ToggleOutcome, StoreError>;

    /// Delete every like of `item` together with the item itself.
    async fn purge_item(&self, item: &ItemKey) -> Result<PurgeReport, StoreError>;

    /// Whether `user_id` currently likes `item`.
    async fn has_liked(&self, user_id: &str, item: &ItemKey) -> Result<bool, StoreError>;

    /// The subset of `ids` (all of kind `kind`) liked by `user_id`.
    async fn liked_ids(
        &self,
        user_id: &str,
        kind: ItemKind,
        ids: &[String],
    ) -> Result<HashSet<String>, StoreError>;

    /// The item's cached like count, or `None` if the item does not exist.
    async fn like_count(&self, item: &ItemKey) -> Result<Option<i32>, StoreError>;

    /// Number of like rows referencing the item.
    async fn record_count(&self, item: &ItemKey) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_from_not_liked_adds_one() {
        let t = LikeState::NotLiked.toggle();
        assert_eq!(t.next, LikeState::Liked);
        assert_eq!(t.delta, 1);
    }

    #[test]
    fn test_toggle_from_liked_removes_one() {
        let t = LikeState::Liked.toggle();
        assert_eq!(t.next, LikeState::NotLiked);
        assert_eq!(t.delta, -1);
    }

    #[test]
    fn test_double_toggle_is_identity() {
        for start in [LikeState::NotLiked, LikeState::Liked] {
            let first = start.toggle();
            let second = first.next.toggle();
            assert_eq!(second.next, start);
            assert_eq!(first.delta + second.delta, 0);
        }
    }

    #[test]
    fn test_from_present() {
        assert!(LikeState::from_present(true).is_liked());
        assert!(!LikeState::from_present(false).is_liked());
    }

    #[test]
    fn test_item_key_display() {
        assert_eq!(ItemKey::shot("img-42").to_string(), "shot:img-42");
        assert_eq!(ItemKey::tutorial("t1").to_string(), "tutorial:t1");
    }

    #[test]
    fn test_toggle_outcome_serializes_camel_case() {
        let json = serde_json::to_value(ToggleOutcome {
            liked: true,
            like_count: 4,
        })
        .unwrap_or_default();
        assert_eq!(json, serde_json::json!({"liked": true, "likeCount": 4}));
    }

    #[test]
    fn test_only_contention_is_retryable() {
        assert!(StoreError::Contended("deadlock".to_string()).is_retryable());
        assert!(!StoreError::Backend("io".to_string()).is_retryable());
        assert!(!StoreError::ItemNotFound(ItemKey::shot("x")).is_retryable());
    }
}
