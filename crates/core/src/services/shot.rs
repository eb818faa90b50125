//! Shot service: uploads, the gallery, search and edits of shot photos.

use std::sync::Arc;

use fairway_common::storage::has_image_extension;
use fairway_common::{AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key};
use fairway_db::entities::item_like::ItemKind;
use fairway_db::entities::shot::{self, Compass, DistanceUnit, WindUnit};
use fairway_db::entities::user;
use fairway_db::repositories::{ShotRepository, ShotSearch};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError};

use super::like_ledger::LikeLedger;

/// Shots shown per gallery page.
pub const GALLERY_PAGE_SIZE: u64 = 9;

/// Playing conditions recorded with a shot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_wind_speed"))]
pub struct ShotDetails {
    /// Hole number, 1 to 18.
    #[validate(range(min = 1, max = 18))]
    pub hole_number: i32,
    /// Wind speed; the upper bound depends on `wind_unit`.
    pub wind_speed: i32,
    /// Wind speed unit.
    pub wind_unit: WindUnit,
    /// Direction the wind is blowing towards.
    pub wind_direction: Compass,
    /// Flag position on the green.
    pub flag_position: Compass,
    /// Distance to the pin.
    #[validate(range(min = 1))]
    pub shot_distance: i32,
    /// Distance unit.
    pub distance_unit: DistanceUnit,
    /// Optional link to a video of the shot.
    #[validate(url)]
    pub video_link: Option<String>,
}

fn validate_wind_speed(details: &ShotDetails) -> Result<(), ValidationError> {
    let max = details.wind_unit.max_speed();
    if (0..=max).contains(&details.wind_speed) {
        Ok(())
    } else {
        let mut err = ValidationError::new("wind_speed");
        err.message = Some(
            format!(
                "Wind speed must be between 0 and {max} {}",
                details.wind_unit.label()
            )
            .into(),
        );
        Err(err)
    }
}

impl ShotDetails {
    /// Human readable title, e.g.
    /// `Hole 7 · 12MPH Wind Going NE · N Side Flag Position · Shot from 150yds Away`.
    #[must_use]
    pub fn compose_title(&self) -> String {
        let wind = if self.wind_speed > 0 {
            format!(
                "{}{} Wind Going {}",
                self.wind_speed,
                self.wind_unit.label().to_uppercase(),
                self.wind_direction.label()
            )
        } else {
            "No Wind".to_string()
        };

        format!(
            "Hole {} · {wind} · {} Side Flag Position · Shot from {}{} Away",
            self.hole_number,
            self.flag_position.label(),
            self.shot_distance,
            self.distance_unit.label()
        )
    }
}

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the client.
    pub file_name: String,
    /// MIME type as sent by the client.
    pub content_type: String,
    /// File contents.
    pub data: Vec<u8>,
}

/// Shot as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotResponse {
    pub id: String,
    /// Uploader.
    pub user_id: String,
    /// Title composed from the playing conditions.
    pub title: String,
    /// Public URL of the image.
    pub url: String,
    pub video_link: Option<String>,
    pub hole_number: i32,
    pub wind_speed: i32,
    pub wind_unit: WindUnit,
    pub wind_direction: Compass,
    pub flag_position: Compass,
    pub shot_distance: i32,
    pub distance_unit: DistanceUnit,
    pub like_count: i32,
    /// Whether the viewer likes this shot; absent for anonymous viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    pub approved: bool,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl ShotResponse {
    /// Build a response for a shot whose image is served at `url`.
    #[must_use]
    pub fn new(shot: shot::Model, url: String, is_liked: Option<bool>) -> Self {
        Self {
            id: shot.id,
            user_id: shot.user_id,
            title: shot.title,
            url,
            video_link: shot.video_link,
            hole_number: shot.hole_number,
            wind_speed: shot.wind_speed,
            wind_unit: shot.wind_unit,
            wind_direction: shot.wind_direction,
            flag_position: shot.flag_position,
            shot_distance: shot.shot_distance,
            distance_unit: shot.distance_unit,
            like_count: shot.like_count,
            is_liked,
            approved: shot.approved,
            created_at: shot.created_at.to_rfc3339(),
        }
    }
}

/// One page of the gallery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPage {
    /// Shots on this page, newest first.
    pub shots: Vec<ShotResponse>,
    /// 1-based page number.
    pub page: u64,
    /// Number of pages; at least 1 even when the gallery is empty.
    pub total_pages: u64,
}

/// Shot service for business logic.
#[derive(Clone)]
pub struct ShotService {
    shot_repo: ShotRepository,
    ledger: LikeLedger,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    max_upload_bytes: usize,
}

impl ShotService {
    /// Create a new shot service.
    #[must_use]
    pub fn new(
        shot_repo: ShotRepository,
        ledger: LikeLedger,
        storage: Arc<dyn StorageBackend>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            shot_repo,
            ledger,
            storage,
            id_gen: IdGenerator::new(),
            max_upload_bytes,
        }
    }

    fn to_response(&self, shot: shot::Model, is_liked: Option<bool>) -> ShotResponse {
        let url = self.storage.public_url(&shot.file_key);
        ShotResponse::new(shot, url, is_liked)
    }

    /// Attach the viewer's like state to a batch of shots.
    async fn with_likes(
        &self,
        viewer: Option<&user::Model>,
        shots: Vec<shot::Model>,
    ) -> AppResult<Vec<ShotResponse>> {
        let ids: Vec<String> = shots.iter().map(|s| s.id.clone()).collect();
        let viewer_id = viewer.map(|v| v.id.as_str());
        let liked = self.ledger.liked_ids(viewer_id, ItemKind::Shot, &ids).await?;

        Ok(shots
            .into_iter()
            .map(|s| {
                let is_liked = viewer_id.map(|_| liked.contains(&s.id));
                self.to_response(s, is_liked)
            })
            .collect())
    }

    fn check_image(&self, image: &ImageUpload) -> AppResult<()> {
        if image.data.is_empty() {
            return Err(AppError::BadRequest("Image file is empty".to_string()));
        }
        if image.data.len() > self.max_upload_bytes {
            return Err(AppError::BadRequest(format!(
                "Image exceeds {} bytes",
                self.max_upload_bytes
            )));
        }
        if !image.content_type.starts_with("image/") || !has_image_extension(&image.file_name) {
            return Err(AppError::Validation("Only image files are accepted".to_string()));
        }
        Ok(())
    }

    async fn store_image(&self, image: &ImageUpload) -> AppResult<String> {
        self.check_image(image)?;
        let key = generate_storage_key(&image.file_name);
        let stored = self.storage.upload(&key, &image.data).await?;
        debug!(
            file_key = %stored.key,
            size = stored.size,
            content_type = %image.content_type,
            "Stored shot image"
        );
        Ok(stored.key)
    }

    async fn remove_file_best_effort(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(file_key = %key, error = %e, "Failed to remove shot file");
        }
    }

    /// Upload a new shot. It stays out of the gallery until approved.
    pub async fn upload(
        &self,
        uploader: &user::Model,
        details: ShotDetails,
        image: ImageUpload,
    ) -> AppResult<ShotResponse> {
        details.validate()?;
        let file_key = self.store_image(&image).await?;

        let model = shot::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(uploader.id.clone()),
            title: Set(details.compose_title()),
            file_key: Set(file_key.clone()),
            video_link: Set(details.video_link),
            hole_number: Set(details.hole_number),
            wind_speed: Set(details.wind_speed),
            wind_unit: Set(details.wind_unit),
            wind_direction: Set(details.wind_direction),
            flag_position: Set(details.flag_position),
            shot_distance: Set(details.shot_distance),
            distance_unit: Set(details.distance_unit),
            like_count: Set(0),
            approved: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let shot = match self.shot_repo.create(model).await {
            Ok(shot) => shot,
            Err(e) => {
                self.remove_file_best_effort(&file_key).await;
                return Err(e);
            }
        };

        info!(shot_id = %shot.id, user_id = %uploader.id, "Shot uploaded");
        Ok(self.to_response(shot, None))
    }

    /// A page (1-based) of approved shots, newest first.
    pub async fn gallery(&self, viewer: Option<&user::Model>, page: u64) -> AppResult<GalleryPage> {
        if page == 0 {
            return Err(AppError::BadRequest("Pages start at 1".to_string()));
        }

        let total = self.shot_repo.count_approved().await?;
        let total_pages = total.div_ceil(GALLERY_PAGE_SIZE).max(1);
        if page > total_pages {
            return Err(AppError::NotFound(format!("Gallery page {page}")));
        }

        let shots = self
            .shot_repo
            .find_approved(GALLERY_PAGE_SIZE, (page - 1) * GALLERY_PAGE_SIZE)
            .await?;

        Ok(GalleryPage {
            shots: self.with_likes(viewer, shots).await?,
            page,
            total_pages,
        })
    }

    /// A single shot. Unapproved shots are visible to their owner and admins only.
    pub async fn show(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<ShotResponse> {
        let shot = self.shot_repo.get_by_id(id).await?;
        let privileged = viewer.is_some_and(|v| v.is_admin() || v.id == shot.user_id);
        if !shot.approved && !privileged {
            return Err(AppError::NotFound(format!("Shot {id}")));
        }

        let mut responses = self.with_likes(viewer, vec![shot]).await?;
        responses
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Shot {id}")))
    }

    /// Approved shots matching the criteria.
    pub async fn search(
        &self,
        viewer: Option<&user::Model>,
        criteria: &ShotSearch,
    ) -> AppResult<Vec<ShotResponse>> {
        let shots = self.shot_repo.search(criteria).await?;
        self.with_likes(viewer, shots).await
    }

    /// Rewrite a shot's details and optionally replace its image. Admin only.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        details: ShotDetails,
        image: Option<ImageUpload>,
    ) -> AppResult<ShotResponse> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("Only admins can edit shots".to_string()));
        }
        details.validate()?;

        let shot = self.shot_repo.get_by_id(id).await?;
        let old_key = shot.file_key.clone();

        let new_key = match &image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };

        let mut active: shot::ActiveModel = shot.into();
        active.title = Set(details.compose_title());
        active.video_link = Set(details.video_link);
        active.hole_number = Set(details.hole_number);
        active.wind_speed = Set(details.wind_speed);
        active.wind_unit = Set(details.wind_unit);
        active.wind_direction = Set(details.wind_direction);
        active.flag_position = Set(details.flag_position);
        active.shot_distance = Set(details.shot_distance);
        active.distance_unit = Set(details.distance_unit);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        if let Some(key) = &new_key {
            active.file_key = Set(key.clone());
        }

        let updated = self.shot_repo.update(active).await?;
        if new_key.is_some() {
            self.remove_file_best_effort(&old_key).await;
        }

        info!(shot_id = %updated.id, admin_id = %actor.id, "Shot updated");
        Ok(self.to_response(updated, None))
    }

    /// Delete a shot with its likes, then its file. Owner or admin only.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let shot = self.shot_repo.get_by_id(id).await?;
        if !actor.is_admin() && actor.id != shot.user_id {
            return Err(AppError::Forbidden(
                "Only the owner or an admin can delete this shot".to_string(),
            ));
        }

        self.ledger.purge_item(ItemKind::Shot, id).await?;
        self.remove_file_best_effort(&shot.file_key).await;

        info!(shot_id = %id, actor_id = %actor.id, "Shot deleted");
        Ok(())
    }
}
