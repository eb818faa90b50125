//! Moderation service: the admin approval queue for shots and tutorials.
//!
//! Rejection tells the author first, then removes the submission (likes and
//! row in one ledger transaction). A failed notification leaves the submission
//! untouched. The shot's image file is removed last on a best-effort basis, and
//! a failure there is logged instead of failing the request.

use std::sync::Arc;

use fairway_common::{AppError, AppResult, StorageBackend};
use fairway_db::entities::item_like::ItemKind;
use fairway_db::entities::user;
use fairway_db::repositories::{ShotRepository, TutorialRepository};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::like_ledger::LikeLedger;
use super::notification::NotificationService;
use super::shot::ShotResponse;
use super::tutorial::TutorialResponse;

/// Submissions waiting for a decision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationQueue {
    pub shots: Vec<ShotResponse>,
    pub tutorials: Vec<TutorialResponse>,
}

/// Input for rejecting a submission.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectInput {
    pub kind: ItemKind,
    pub id: String,
    #[validate(length(min = 1, max = 500, message = "A rejection reason is required"))]
    pub reason: String,
}

/// Moderation service for business logic.
#[derive(Clone)]
pub struct ModerationService {
    shot_repo: ShotRepository,
    tutorial_repo: TutorialRepository,
    ledger: LikeLedger,
    notifications: NotificationService,
    storage: Arc<dyn StorageBackend>,
}

fn require_admin(actor: &user::Model) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub fn new(
        shot_repo: ShotRepository,
        tutorial_repo: TutorialRepository,
        ledger: LikeLedger,
        notifications: NotificationService,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            shot_repo,
            tutorial_repo,
            ledger,
            notifications,
            storage,
        }
    }

    /// Unapproved shots and tutorials, oldest first.
    pub async fn queue(&self, actor: &user::Model) -> AppResult<ModerationQueue> {
        require_admin(actor)?;

        let shots = self.shot_repo.find_pending().await?;
        let tutorials = self.tutorial_repo.find_pending().await?;

        Ok(ModerationQueue {
            shots: shots
                .into_iter()
                .map(|s| {
                    let url = self.storage.public_url(&s.file_key);
                    ShotResponse::new(s, url, None)
                })
                .collect(),
            tutorials: tutorials.into_iter().map(Into::into).collect(),
        })
    }

    /// Publish a submission.
    pub async fn approve(&self, actor: &user::Model, kind: ItemKind, id: &str) -> AppResult<()> {
        require_admin(actor)?;

        match kind {
            ItemKind::Shot => {
                self.shot_repo.approve(id).await?;
            }
            ItemKind::Tutorial => {
                self.tutorial_repo.approve(id).await?;
            }
        }

        info!(%kind, item_id = %id, admin_id = %actor.id, "Submission approved");
        Ok(())
    }

    /// Remove a submission and tell its author why.
    pub async fn reject(&self, actor: &user::Model, input: RejectInput) -> AppResult<()> {
        require_admin(actor)?;
        input.validate()?;
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("A rejection reason is required".to_string()));
        }

        let (author_id, label, file_key) = match input.kind {
            ItemKind::Shot => {
                let shot = self.shot_repo.get_by_id(&input.id).await?;
                (shot.user_id, format!("shot \"{}\"", shot.title), Some(shot.file_key))
            }
            ItemKind::Tutorial => {
                let tutorial = self.tutorial_repo.get_by_id(&input.id).await?;
                (tutorial.user_id, format!("tutorial \"{}\"", tutorial.title), None)
            }
        };

        self.notifications
            .notify(&author_id, format!("Your {label} was rejected: {reason}"))
            .await?;
        self.ledger.purge_item(input.kind, &input.id).await?;

        if let Some(key) = file_key {
            if let Err(e) = self.storage.delete(&key).await {
                warn!(file_key = %key, error = %e, "Rejected shot file could not be removed");
            }
        }

        info!(kind = %input.kind, item_id = %input.id, admin_id = %actor.id, "Submission rejected");
        Ok(())
    }
}
