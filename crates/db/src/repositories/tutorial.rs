//! Tutorial repository.

use std::sync::Arc;

use crate::entities::{Tutorial, tutorial};
use fairway_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Tutorial repository for database operations.
#[derive(Clone)]
pub struct TutorialRepository {
    db: Arc<DatabaseConnection>,
}

impl TutorialRepository {
    /// Create a new tutorial repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tutorial by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tutorial::Model>> {
        Tutorial::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tutorial by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tutorial::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tutorial {id}")))
    }

    /// Create a new tutorial.
    pub async fn create(&self, model: tutorial::ActiveModel) -> AppResult<tutorial::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a tutorial approved.
    pub async fn approve(&self, id: &str) -> AppResult<tutorial::Model> {
        let tutorial = self.get_by_id(id).await?;
        let mut active: tutorial::ActiveModel = tutorial.into();
        active.approved = Set(true);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved tutorials, optionally restricted to one category.
    pub async fn find_approved(&self, category: Option<&str>) -> AppResult<Vec<tutorial::Model>> {
        let mut query = Tutorial::find().filter(tutorial::Column::Approved.eq(true));

        if let Some(category) = category {
            query = query.filter(tutorial::Column::Category.eq(category));
        }

        query
            .order_by_desc(tutorial::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tutorials waiting for moderation, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<tutorial::Model>> {
        Tutorial::find()
            .filter(tutorial::Column::Approved.eq(false))
            .order_by_asc(tutorial::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
