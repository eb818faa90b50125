//! Like ledger service.
//!
//! Front door for every like toggle and item purge. The storage side
//! ([`LikeStore`]) provides the per-item atomic step; this layer checks the
//! caller, retries contended attempts a bounded number of times, and maps
//! store failures onto [`AppError`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fairway_common::config::LedgerConfig;
use fairway_common::{AppError, AppResult};
use fairway_db::ledger::{ItemKey, ItemKind, LikeStore, PurgeReport, StoreError, ToggleOutcome};
use tracing::{debug, warn};

/// Like ledger service.
#[derive(Clone)]
pub struct LikeLedger {
    store: Arc<dyn LikeStore>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl LikeLedger {
    /// Create a new like ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LikeStore>, config: &LedgerConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    /// Flip the caller's like on an item.
    ///
    /// `actor` is the authenticated user, `None` for anonymous callers.
    pub async fn toggle_like(
        &self,
        actor: Option<&str>,
        kind: ItemKind,
        item_id: &str,
    ) -> AppResult<ToggleOutcome> {
        let user_id = actor.ok_or(AppError::Unauthorized)?;
        let item = ItemKey::new(kind, item_id);
        let item_ref = &item;

        let outcome = self
            .with_retry("toggle", item_ref, || self.store.toggle(user_id, item_ref))
            .await?;

        debug!(%item, user_id, liked = outcome.liked, like_count = outcome.like_count, "Toggled like");
        Ok(outcome)
    }

    /// Delete an item together with all of its likes.
    pub async fn purge_item(&self, kind: ItemKind, item_id: &str) -> AppResult<PurgeReport> {
        let item = ItemKey::new(kind, item_id);
        let item_ref = &item;

        let report = self
            .with_retry("purge", item_ref, || self.store.purge_item(item_ref))
            .await?;

        debug!(
            %item,
            records_removed = report.records_removed,
            item_removed = report.item_removed,
            "Purged item"
        );
        Ok(report)
    }

    /// Whether `user_id` likes the item.
    pub async fn has_liked(&self, user_id: &str, kind: ItemKind, item_id: &str) -> AppResult<bool> {
        self.store
            .has_liked(user_id, &ItemKey::new(kind, item_id))
            .await
            .map_err(into_app_error)
    }

    /// Which of `ids` the viewer likes. Anonymous viewers like nothing.
    pub async fn liked_ids(
        &self,
        viewer: Option<&str>,
        kind: ItemKind,
        ids: &[String],
    ) -> AppResult<HashSet<String>> {
        let Some(user_id) = viewer else {
            return Ok(HashSet::new());
        };
        self.store
            .liked_ids(user_id, kind, ids)
            .await
            .map_err(into_app_error)
    }

    /// Current like count of an item.
    pub async fn like_count(&self, kind: ItemKind, item_id: &str) -> AppResult<i32> {
        let item = ItemKey::new(kind, item_id);
        self.store
            .like_count(&item)
            .await
            .map_err(into_app_error)?
            .ok_or_else(|| not_found(&item))
    }

    /// Delay before attempt `attempt + 1`, doubling from the configured base.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    async fn with_retry<T, F, Fut>(&self, op: &str, item: &ItemKey, mut attempt_op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_op().await {
                Ok(value) => return Ok(value),
                Err(StoreError::Contended(reason)) if attempt < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        op,
                        %item,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Like ledger contended, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(StoreError::Contended(reason)) => {
                    warn!(op, %item, attempts = attempt, reason = %reason, "Like ledger contention not resolved");
                    return Err(AppError::Unavailable(format!(
                        "{item} is busy after {attempt} attempts, try again"
                    )));
                }
                Err(err) => return Err(into_app_error(err)),
            }
        }
    }
}

fn not_found(item: &ItemKey) -> AppError {
    match item.kind {
        ItemKind::Shot => AppError::NotFound(format!("Shot {}", item.id)),
        ItemKind::Tutorial => AppError::NotFound(format!("Tutorial {}", item.id)),
    }
}

fn into_app_error(err: StoreError) -> AppError {
    match err {
        StoreError::ItemNotFound(item) => not_found(&item),
        StoreError::Contended(reason) => AppError::Unavailable(reason),
        StoreError::Backend(reason) => AppError::Database(reason),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fairway_db::ledger::MemoryLikeStore;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config() -> LedgerConfig {
        LedgerConfig {
            max_attempts: 3,
            retry_delay_ms: 1,
            lock_timeout_ms: 0,
        }
    }

    fn ledger_with(store: Arc<MemoryLikeStore>) -> LikeLedger {
        LikeLedger::new(store, &config())
    }

    /// Fails the first `failures` calls with the given error, then delegates.
    struct FlakyStore {
        inner: MemoryLikeStore,
        failures: u32,
        calls: AtomicU32,
        fail_with: fn() -> StoreError,
    }

    impl FlakyStore {
        fn new(failures: u32, fail_with: fn() -> StoreError) -> Self {
            let inner = MemoryLikeStore::new();
            inner.insert_item(ItemKey::shot("img-1"));
            Self {
                inner,
                failures,
                calls: AtomicU32::new(0),
                fail_with,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail_now(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) < self.failures
        }
    }

    #[async_trait::async_trait]
    impl LikeStore for FlakyStore {
        async fn toggle(&self, user_id: &str, item: &ItemKey) -> Result<ToggleOutcome, StoreError> {
            if self.fail_now() {
                return Err((self.fail_with)());
            }
            self.inner.toggle(user_id, item).await
        }

        async fn purge_item(&self, item: &ItemKey) -> Result<PurgeReport, StoreError> {
            if self.fail_now() {
                return Err((self.fail_with)());
            }
            self.inner.purge_item(item).await
        }

        async fn has_liked(&self, user_id: &str, item: &ItemKey) -> Result<bool, StoreError> {
            self.inner.has_liked(user_id, item).await
        }

        async fn liked_ids(
            &self,
            user_id: &str,
            kind: ItemKind,
            ids: &[String],
        ) -> Result<HashSet<String>, StoreError> {
            self.inner.liked_ids(user_id, kind, ids).await
        }

        async fn like_count(&self, item: &ItemKey) -> Result<Option<i32>, StoreError> {
            self.inner.like_count(item).await
        }

        async fn record_count(&self, item: &ItemKey) -> Result<u64, StoreError> {
            self.inner.record_count(item).await
        }
    }

    fn deadlock() -> StoreError {
        StoreError::Contended("deadlock detected".to_string())
    }

    fn connection_lost() -> StoreError {
        StoreError::Backend("connection reset".to_string())
    }

    async fn assert_consistent(store: &MemoryLikeStore, item: &ItemKey) {
        let count = store.like_count(item).await.unwrap().unwrap();
        let records = store.record_count(item).await.unwrap();
        assert_eq!(count as u64, records, "like_count diverged from records");
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_start() {
        let store = Arc::new(MemoryLikeStore::new());
        store.insert_item(ItemKey::shot("img-42"));
        let ledger = ledger_with(Arc::clone(&store));

        let first = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-42").await.unwrap();
        assert_eq!(first, ToggleOutcome { liked: true, like_count: 1 });

        let second = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-42").await.unwrap();
        assert_eq!(second, ToggleOutcome { liked: false, like_count: 0 });

        assert_consistent(&store, &ItemKey::shot("img-42")).await;
    }

    #[tokio::test]
    async fn test_count_matches_records_after_every_toggle() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::tutorial("t1");
        store.insert_item(item.clone());
        let ledger = ledger_with(Arc::clone(&store));

        for user in ["u1", "u2", "u1", "u3", "u2", "u2", "u4"] {
            ledger.toggle_like(Some(user), ItemKind::Tutorial, "t1").await.unwrap();
            assert_consistent(&store, &item).await;
        }
        assert_eq!(ledger.like_count(ItemKind::Tutorial, "t1").await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_new_likers_all_counted() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::shot("img-7");
        store.seed_item(item.clone(), ["u1", "u2", "u3"]);
        let ledger = ledger_with(Arc::clone(&store));

        let results = join_all(["u4", "u5"].map(|user| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.toggle_like(Some(user), ItemKind::Shot, "img-7").await })
        }))
        .await;

        for result in results {
            assert!(result.unwrap().unwrap().liked);
        }
        assert_eq!(store.like_count(&item).await.unwrap(), Some(5));
        assert_eq!(store.record_count(&item).await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_distinct_users_race() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::shot("img-100");
        store.insert_item(item.clone());
        let ledger = ledger_with(Arc::clone(&store));

        let results = join_all((0..64).map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .toggle_like(Some(&format!("user-{i}")), ItemKind::Shot, "img-100")
                    .await
            })
        }))
        .await;

        let mut counts: Vec<i32> = results
            .into_iter()
            .map(|r| r.unwrap().unwrap().like_count)
            .collect();
        counts.sort_unstable();

        // Linearizable: each toggle observed a distinct count.
        assert_eq!(counts, (1..=64).collect::<Vec<_>>());
        assert_eq!(store.like_count(&item).await.unwrap(), Some(64));
        assert_consistent(&store, &item).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_pair_even_race_ends_not_liked() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::shot("img-3");
        store.seed_item(item.clone(), ["u7", "u8"]);
        let ledger = ledger_with(Arc::clone(&store));

        let results = join_all((0..10).map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-3").await })
        }))
        .await;

        let liked = results
            .into_iter()
            .filter(|r| r.as_ref().unwrap().as_ref().unwrap().liked)
            .count();

        // Serialized flips alternate, so half of them reported "liked".
        assert_eq!(liked, 5);
        assert!(!ledger.has_liked("u1", ItemKind::Shot, "img-3").await.unwrap());
        assert_eq!(store.like_count(&item).await.unwrap(), Some(2));
        assert_consistent(&store, &item).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_pair_odd_race_is_one_net_toggle() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::tutorial("t3");
        store.insert_item(item.clone());
        let ledger = ledger_with(Arc::clone(&store));

        join_all((0..9).map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.toggle_like(Some("u1"), ItemKind::Tutorial, "t3").await })
        }))
        .await;

        assert!(ledger.has_liked("u1", ItemKind::Tutorial, "t3").await.unwrap());
        assert_eq!(store.like_count(&item).await.unwrap(), Some(1));
        assert_eq!(store.record_count(&item).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_items_are_independent() {
        let store = Arc::new(MemoryLikeStore::new());
        store.seed_item(ItemKey::shot("a"), ["x"]);
        store.insert_item(ItemKey::tutorial("b"));
        let ledger = ledger_with(Arc::clone(&store));

        let tasks = (0..20).map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let user = format!("user-{i}");
                let (kind, id) = if i % 2 == 0 {
                    (ItemKind::Shot, "a")
                } else {
                    (ItemKind::Tutorial, "b")
                };
                ledger.toggle_like(Some(&user), kind, id).await
            })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.like_count(&ItemKey::shot("a")).await.unwrap(), Some(11));
        assert_eq!(store.like_count(&ItemKey::tutorial("b")).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_anonymous_toggle_is_unauthorized() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::shot("img-1");
        store.insert_item(item.clone());
        let ledger = ledger_with(Arc::clone(&store));

        let result = ledger.toggle_like(None, ItemKind::Shot, "img-1").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert_eq!(store.like_count(&item).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let store = Arc::new(MemoryLikeStore::new());
        let ledger = ledger_with(Arc::clone(&store));

        let result = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-9").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(store.record_count(&ItemKey::shot("img-9")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_then_toggle_is_not_found() {
        let store = Arc::new(MemoryLikeStore::new());
        let item = ItemKey::shot("img-5");
        store.seed_item(item.clone(), ["u1", "u2", "u3"]);
        let ledger = ledger_with(Arc::clone(&store));

        let report = ledger.purge_item(ItemKind::Shot, "img-5").await.unwrap();
        assert_eq!(report.records_removed, 3);
        assert!(report.item_removed);
        assert_eq!(store.record_count(&item).await.unwrap(), 0);

        let result = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-5").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_liked_ids_for_anonymous_viewer_is_empty() {
        let store = Arc::new(MemoryLikeStore::new());
        store.seed_item(ItemKey::shot("a"), ["u1"]);
        let ledger = ledger_with(store);

        let ids = vec!["a".to_string()];
        assert!(ledger.liked_ids(None, ItemKind::Shot, &ids).await.unwrap().is_empty());
        assert_eq!(
            ledger.liked_ids(Some("u1"), ItemKind::Shot, &ids).await.unwrap(),
            HashSet::from(["a".to_string()])
        );
    }

    #[tokio::test]
    async fn test_contention_is_retried() {
        let store = Arc::new(FlakyStore::new(2, deadlock));
        let ledger = LikeLedger::new(Arc::clone(&store) as Arc<dyn LikeStore>, &config());

        let outcome = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-1").await.unwrap();

        assert_eq!(outcome, ToggleOutcome { liked: true, like_count: 1 });
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn test_persistent_contention_is_transient_failure() {
        let store = Arc::new(FlakyStore::new(u32::MAX, deadlock));
        let ledger = LikeLedger::new(Arc::clone(&store) as Arc<dyn LikeStore>, &config());

        let result = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-1").await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
        assert_eq!(store.calls(), 3);
        assert_eq!(store.inner.like_count(&ItemKey::shot("img-1")).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_backend_fault_is_not_retried() {
        let store = Arc::new(FlakyStore::new(1, connection_lost));
        let ledger = LikeLedger::new(Arc::clone(&store) as Arc<dyn LikeStore>, &config());

        let result = ledger.toggle_like(Some("u1"), ItemKind::Shot, "img-1").await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_purge_is_retried_on_contention() {
        let store = Arc::new(FlakyStore::new(1, deadlock));
        let ledger = LikeLedger::new(Arc::clone(&store) as Arc<dyn LikeStore>, &config());

        let report = ledger.purge_item(ItemKind::Shot, "img-1").await.unwrap();

        assert!(report.item_removed);
        assert_eq!(store.calls(), 2);
    }

    #[test]
    fn test_retry_delay_doubles() {
        let ledger = LikeLedger::new(
            Arc::new(MemoryLikeStore::new()),
            &LedgerConfig {
                max_attempts: 4,
                retry_delay_ms: 10,
                lock_timeout_ms: 0,
            },
        );

        assert_eq!(ledger.delay_for_attempt(1), Duration::from_millis(10));
        assert_eq!(ledger.delay_for_attempt(2), Duration::from_millis(20));
        assert_eq!(ledger.delay_for_attempt(3), Duration::from_millis(40));
    }
}
