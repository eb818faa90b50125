//! Shot repository.

use std::sync::Arc;

use crate::entities::{Shot, shot};
use crate::entities::shot::{Compass, DistanceUnit, WindUnit};
use fairway_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;

/// Criteria for searching the gallery. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotSearch {
    /// Hole number.
    pub hole_number: Option<i32>,
    /// Wind speed; zero matches windless shots.
    pub wind_speed: Option<i32>,
    /// Wind speed unit.
    pub wind_unit: Option<WindUnit>,
    /// Wind direction.
    pub wind_direction: Option<Compass>,
    /// Flag position on the green.
    pub flag_position: Option<Compass>,
    /// Shot distance.
    pub shot_distance: Option<i32>,
    /// Shot distance unit.
    pub distance_unit: Option<DistanceUnit>,
}

impl ShotSearch {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all().add(shot::Column::Approved.eq(true));
        if let Some(hole) = self.hole_number {
            cond = cond.add(shot::Column::HoleNumber.eq(hole));
        }
        if let Some(speed) = self.wind_speed {
            cond = cond.add(shot::Column::WindSpeed.eq(speed));
        }
        if let Some(unit) = self.wind_unit {
            cond = cond.add(shot::Column::WindUnit.eq(unit));
        }
        if let Some(direction) = self.wind_direction {
            cond = cond.add(shot::Column::WindDirection.eq(direction));
        }
        if let Some(flag) = self.flag_position {
            cond = cond.add(shot::Column::FlagPosition.eq(flag));
        }
        if let Some(distance) = self.shot_distance {
            cond = cond.add(shot::Column::ShotDistance.eq(distance));
        }
        if let Some(unit) = self.distance_unit {
            cond = cond.add(shot::Column::DistanceUnit.eq(unit));
        }
        cond
    }
}

/// Shot repository for database operations.
#[derive(Clone)]
pub struct ShotRepository {
    db: Arc<DatabaseConnection>,
}

impl ShotRepository {
    /// Create a new shot repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a shot by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<shot::Model>> {
        Shot::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a shot by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<shot::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shot {id}")))
    }

    /// Create a new shot.
    pub async fn create(&self, model: shot::ActiveModel) -> AppResult<shot::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a shot.
    ///
    /// `like_count` must never be set here; the like ledger owns it.
    pub async fn update(&self, model: shot::ActiveModel) -> AppResult<shot::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a shot approved.
    pub async fn approve(&self, id: &str) -> AppResult<shot::Model> {
        let shot = self.get_by_id(id).await?;
        let mut active: shot::ActiveModel = shot.into();
        active.approved = Set(true);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.update(active).await
    }

    /// Approved shots, newest first.
    pub async fn find_approved(&self, limit: u64, offset: u64) -> AppResult<Vec<shot::Model>> {
        Shot::find()
            .filter(shot::Column::Approved.eq(true))
            .order_by_desc(shot::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of approved shots.
    pub async fn count_approved(&self) -> AppResult<u64> {
        Shot::find()
            .filter(shot::Column::Approved.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved shots matching every set criterion.
    pub async fn search(&self, criteria: &ShotSearch) -> AppResult<Vec<shot::Model>> {
        Shot::find()
            .filter(criteria.condition())
            .order_by_desc(shot::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Shots waiting for moderation, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<shot::Model>> {
        Shot::find()
            .filter(shot::Column::Approved.eq(false))
            .order_by_asc(shot::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
