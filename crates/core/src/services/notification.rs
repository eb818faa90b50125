//! Notification service.

use fairway_common::{AppResult, IdGenerator};
use fairway_db::entities::notification;
use fairway_db::repositories::NotificationRepository;
use sea_orm::Set;
use serde::Serialize;

/// Notification as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub message: String,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            message: n.message,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Leave a message for a user.
    pub async fn notify(&self, user_id: &str, message: String) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            message: Set(message),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.notification_repo.create(model).await
    }

    /// Return the user's unread notifications and remove them; each is shown once.
    pub async fn take_inbox(&self, user_id: &str) -> AppResult<Vec<NotificationResponse>> {
        let unread = self.notification_repo.find_unread(user_id).await?;
        let ids: Vec<String> = unread.iter().map(|n| n.id.clone()).collect();
        self.notification_repo.delete_many(user_id, &ids).await?;

        Ok(unread.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_take_inbox_returns_and_clears() {
        let unread = notification::Model {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            message: "Your shot was rejected: wrong hole".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[unread]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let service = NotificationService::new(NotificationRepository::new(Arc::new(db)));

        let inbox = service.take_inbox("u1").await.unwrap();

        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message, "Your shot was rejected: wrong hole");
    }

    #[tokio::test]
    async fn test_take_empty_inbox() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<notification::Model>::new()])
            .into_connection();
        let service = NotificationService::new(NotificationRepository::new(Arc::new(db)));

        assert!(service.take_inbox("u1").await.unwrap().is_empty());
    }
}
