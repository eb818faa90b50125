//! Like repository: the `PostgreSQL` [`LikeStore`].
//!
//! A toggle runs in one transaction that first takes the item row's lock
//! (`SELECT ... FOR UPDATE`), so concurrent toggles on the same item queue up
//! behind each other while toggles on other items proceed. The counter is
//! moved with a relative `like_count = like_count + delta` update.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, RuntimeErr, Set, SqlErr,
    TransactionTrait, sea_query::Expr,
};
use tracing::debug;

use crate::entities::{ItemLike, Shot, Tutorial, item_like, shot, tutorial};
use crate::ledger::{
    ItemKey, ItemKind, LikeState, LikeStore, PurgeReport, StoreError, ToggleOutcome,
};
use fairway_common::IdGenerator;

/// SQLSTATEs that mean "nothing happened, try again":
/// serialization failure, deadlock detected, lock not available.
const RETRYABLE_SQLSTATES: &[&str] = &["40001", "40P01", "55P03"];

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
    lock_timeout: Option<Duration>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator,
            lock_timeout: None,
        }
    }

    /// Bound how long a toggle waits for the item's row lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    async fn begin(&self) -> Result<DatabaseTransaction, StoreError> {
        let txn = self.db.begin().await.map_err(classify)?;
        if let Some(timeout) = self.lock_timeout {
            txn.execute_unprepared(&format!(
                "SET LOCAL lock_timeout = '{}ms'",
                timeout.as_millis()
            ))
            .await
            .map_err(classify)?;
        }
        Ok(txn)
    }
}

/// Lock the item row and return its current count, or `None` if it is gone.
async fn lock_item<C: ConnectionTrait>(conn: &C, item: &ItemKey) -> Result<Option<i32>, DbErr> {
    Ok(match item.kind {
        ItemKind::Shot => Shot::find_by_id(item.id.as_str())
            .lock_exclusive()
            .one(conn)
            .await?
            .map(|s| s.like_count),
        ItemKind::Tutorial => Tutorial::find_by_id(item.id.as_str())
            .lock_exclusive()
            .one(conn)
            .await?
            .map(|t| t.like_count),
    })
}

async fn read_count<C: ConnectionTrait>(conn: &C, item: &ItemKey) -> Result<Option<i32>, DbErr> {
    Ok(match item.kind {
        ItemKind::Shot => Shot::find_by_id(item.id.as_str())
            .one(conn)
            .await?
            .map(|s| s.like_count),
        ItemKind::Tutorial => Tutorial::find_by_id(item.id.as_str())
            .one(conn)
            .await?
            .map(|t| t.like_count),
    })
}

async fn add_to_count<C: ConnectionTrait>(conn: &C, item: &ItemKey, delta: i32) -> Result<(), DbErr> {
    match item.kind {
        ItemKind::Shot => {
            Shot::update_many()
                .col_expr(
                    shot::Column::LikeCount,
                    Expr::col(shot::Column::LikeCount).add(delta),
                )
                .filter(shot::Column::Id.eq(item.id.as_str()))
                .exec(conn)
                .await?;
        }
        ItemKind::Tutorial => {
            Tutorial::update_many()
                .col_expr(
                    tutorial::Column::LikeCount,
                    Expr::col(tutorial::Column::LikeCount).add(delta),
                )
                .filter(tutorial::Column::Id.eq(item.id.as_str()))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

async fn delete_item<C: ConnectionTrait>(conn: &C, item: &ItemKey) -> Result<bool, DbErr> {
    let result = match item.kind {
        ItemKind::Shot => Shot::delete_by_id(item.id.as_str()).exec(conn).await?,
        ItemKind::Tutorial => Tutorial::delete_by_id(item.id.as_str()).exec(conn).await?,
    };
    Ok(result.rows_affected > 0)
}

fn likes_of(item: &ItemKey) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(item_like::Column::ItemKind.eq(item.kind))
        .add(item_like::Column::ItemId.eq(item.id.as_str()))
}

fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned()),
        _ => None,
    }
}

/// Map a database error onto the ledger's failure kinds.
fn classify(err: DbErr) -> StoreError {
    // A racing insert for the same (user, item) loses on the unique index.
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return StoreError::Contended(err.to_string());
    }
    if sqlstate(&err).is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code.as_str())) {
        return StoreError::Contended(err.to_string());
    }
    StoreError::Backend(err.to_string())
}

#[async_trait::async_trait]
impl LikeStore for LikeRepository {
    async fn toggle(&self, user_id: &str, item: &ItemKey) -> Result<ToggleOutcome, StoreError> {
        let txn = self.begin().await?;

        if lock_item(&txn, item).await.map_err(classify)?.is_none() {
            txn.rollback().await.map_err(classify)?;
            return Err(StoreError::ItemNotFound(item.clone()));
        }

        let existing = ItemLike::find()
            .filter(likes_of(item))
            .filter(item_like::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(classify)?;

        let transition = LikeState::from_present(existing.is_some()).toggle();

        if let Some(like) = existing {
            ItemLike::delete_by_id(like.id)
                .exec(&txn)
                .await
                .map_err(classify)?;
        } else {
            item_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                item_kind: Set(item.kind),
                item_id: Set(item.id.clone()),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await
            .map_err(classify)?;
        }

        add_to_count(&txn, item, transition.delta)
            .await
            .map_err(classify)?;

        let like_count = read_count(&txn, item)
            .await
            .map_err(classify)?
            .ok_or_else(|| StoreError::ItemNotFound(item.clone()))?;

        txn.commit().await.map_err(classify)?;

        debug!(%item, user_id, liked = transition.next.is_liked(), like_count, "Like toggled");

        Ok(ToggleOutcome {
            liked: transition.next.is_liked(),
            like_count,
        })
    }

    async fn purge_item(&self, item: &ItemKey) -> Result<PurgeReport, StoreError> {
        let txn = self.begin().await?;

        let exists = lock_item(&txn, item).await.map_err(classify)?.is_some();

        let deleted = ItemLike::delete_many()
            .filter(likes_of(item))
            .exec(&txn)
            .await
            .map_err(classify)?;

        let item_removed = if exists {
            delete_item(&txn, item).await.map_err(classify)?
        } else {
            false
        };

        txn.commit().await.map_err(classify)?;

        debug!(%item, records_removed = deleted.rows_affected, item_removed, "Item purged");

        Ok(PurgeReport {
            records_removed: deleted.rows_affected,
            item_removed,
        })
    }

    async fn has_liked(&self, user_id: &str, item: &ItemKey) -> Result<bool, StoreError> {
        let like = ItemLike::find()
            .filter(likes_of(item))
            .filter(item_like::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(classify)?;
        Ok(like.is_some())
    }

    async fn liked_ids(
        &self,
        user_id: &str,
        kind: ItemKind,
        ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let likes = ItemLike::find()
            .filter(item_like::Column::UserId.eq(user_id))
            .filter(item_like::Column::ItemKind.eq(kind))
            .filter(item_like::Column::ItemId.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(classify)?;

        Ok(likes.into_iter().map(|like| like.item_id).collect())
    }

    async fn like_count(&self, item: &ItemKey) -> Result<Option<i32>, StoreError> {
        read_count(self.db.as_ref(), item).await.map_err(classify)
    }

    async fn record_count(&self, item: &ItemKey) -> Result<u64, StoreError> {
        ItemLike::find()
            .filter(likes_of(item))
            .count(self.db.as_ref())
            .await
            .map_err(classify)
    }
}
