//! Tutorial service.

use fairway_common::{AppError, AppResult, IdGenerator};
use fairway_db::entities::item_like::ItemKind;
use fairway_db::entities::{tutorial, user};
use fairway_db::repositories::TutorialRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::like_ledger::LikeLedger;

/// Input for submitting a tutorial.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTutorialInput {
    #[validate(length(min = 1, max = 50))]
    pub title: String,

    #[validate(url)]
    pub video_link: String,

    #[validate(length(min = 1, max = 20))]
    pub category: String,
}

/// Tutorial as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub video_link: String,
    pub category: String,
    pub like_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    pub approved: bool,
    pub created_at: String,
}

impl TutorialResponse {
    fn new(t: tutorial::Model, is_liked: Option<bool>) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            title: t.title,
            video_link: t.video_link,
            category: t.category,
            like_count: t.like_count,
            is_liked,
            approved: t.approved,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

impl From<tutorial::Model> for TutorialResponse {
    fn from(t: tutorial::Model) -> Self {
        Self::new(t, None)
    }
}

/// Tutorial service for business logic.
#[derive(Clone)]
pub struct TutorialService {
    tutorial_repo: TutorialRepository,
    ledger: LikeLedger,
    id_gen: IdGenerator,
}

impl TutorialService {
    /// Create a new tutorial service.
    #[must_use]
    pub const fn new(tutorial_repo: TutorialRepository, ledger: LikeLedger) -> Self {
        Self {
            tutorial_repo,
            ledger,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a tutorial for moderation.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreateTutorialInput,
    ) -> AppResult<TutorialResponse> {
        input.validate()?;

        let model = tutorial::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author.id.clone()),
            title: Set(input.title.trim().to_string()),
            video_link: Set(input.video_link),
            category: Set(input.category.trim().to_string()),
            like_count: Set(0),
            approved: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let tutorial = self.tutorial_repo.create(model).await?;
        info!(tutorial_id = %tutorial.id, user_id = %author.id, "Tutorial submitted");

        Ok(tutorial.into())
    }

    /// Approved tutorials, optionally in one category, with the viewer's likes.
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        category: Option<&str>,
    ) -> AppResult<Vec<TutorialResponse>> {
        let tutorials = self.tutorial_repo.find_approved(category).await?;

        let ids: Vec<String> = tutorials.iter().map(|t| t.id.clone()).collect();
        let viewer_id = viewer.map(|v| v.id.as_str());
        let liked = self
            .ledger
            .liked_ids(viewer_id, ItemKind::Tutorial, &ids)
            .await?;

        Ok(tutorials
            .into_iter()
            .map(|t| {
                let is_liked = viewer_id.map(|_| liked.contains(&t.id));
                TutorialResponse::new(t, is_liked)
            })
            .collect())
    }

    /// Delete a tutorial together with its likes. Owner or admin only.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let tutorial = self.tutorial_repo.get_by_id(id).await?;
        if !actor.is_admin() && actor.id != tutorial.user_id {
            return Err(AppError::Forbidden(
                "Only the author or an admin can delete this tutorial".to_string(),
            ));
        }

        self.ledger.purge_item(ItemKind::Tutorial, id).await?;
        info!(tutorial_id = %id, actor_id = %actor.id, "Tutorial deleted");
        Ok(())
    }
}
