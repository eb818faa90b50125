//! Shot endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    response::IntoResponse,
    routing::post,
};
use fairway_common::{AppError, AppResult};
use fairway_core::{GalleryPage, ImageUpload, ShotDetails, ShotResponse};
use fairway_db::ledger::{ItemKind, ToggleOutcome};
use fairway_db::repositories::ShotSearch;
use serde::Deserialize;

use super::toggled;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Request for one gallery page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRequest {
    #[serde(default = "first_page")]
    pub page: u64,
}

const fn first_page() -> u64 {
    1
}

/// Request naming a shot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotIdRequest {
    pub shot_id: String,
}

/// Fields of an upload or update form.
///
/// `details` carries [`ShotDetails`] as JSON; `file` is the image. An empty
/// file part counts as no file.
#[derive(Default)]
struct ShotForm {
    shot_id: Option<String>,
    details: Option<ShotDetails>,
    image: Option<ImageUpload>,
}

async fn read_shot_form(mut multipart: Multipart) -> AppResult<ShotForm> {
    let mut form = ShotForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();
                if !data.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            "details" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let details = serde_json::from_str(&text)
                    .map_err(|e| AppError::BadRequest(format!("Invalid shot details: {e}")))?;
                form.details = Some(details);
            }
            "shotId" => {
                form.shot_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    Ok(form)
}

fn missing(what: &str) -> AppError {
    AppError::BadRequest(format!("Missing form field: {what}"))
}

/// A page of approved shots.
async fn gallery(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<GalleryRequest>,
) -> AppResult<ApiResponse<GalleryPage>> {
    let page = state.shot_service.gallery(viewer.as_ref(), req.page).await?;
    Ok(ApiResponse::ok(page))
}

/// A single shot.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShotIdRequest>,
) -> AppResult<ApiResponse<ShotResponse>> {
    let shot = state.shot_service.show(viewer.as_ref(), &req.shot_id).await?;
    Ok(ApiResponse::ok(shot))
}

/// Upload a shot for moderation.
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<ShotResponse>> {
    let form = read_shot_form(multipart).await?;
    let details = form.details.ok_or_else(|| missing("details"))?;
    let image = form.image.ok_or_else(|| missing("file"))?;

    let shot = state.shot_service.upload(&user, details, image).await?;
    Ok(ApiResponse::created(shot))
}

/// Approved shots matching the given criteria.
async fn search(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(criteria): Json<ShotSearch>,
) -> AppResult<ApiResponse<Vec<ShotResponse>>> {
    let shots = state.shot_service.search(viewer.as_ref(), &criteria).await?;
    Ok(ApiResponse::ok(shots))
}

/// Like or unlike a shot.
async fn like(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShotIdRequest>,
) -> AppResult<ApiResponse<ToggleOutcome>> {
    let outcome = state
        .like_ledger
        .toggle_like(user.as_ref().map(|u| u.id.as_str()), ItemKind::Shot, &req.shot_id)
        .await?;
    Ok(toggled(outcome))
}

/// Edit a shot's details and optionally replace its image.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<ShotResponse>> {
    let form = read_shot_form(multipart).await?;
    let shot_id = form.shot_id.ok_or_else(|| missing("shotId"))?;
    let details = form.details.ok_or_else(|| missing("details"))?;

    let shot = state
        .shot_service
        .update(&user, &shot_id, details, form.image)
        .await?;
    Ok(ApiResponse::ok(shot))
}

/// Delete a shot.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShotIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.shot_service.delete(&user, &req.shot_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gallery", post(gallery))
        .route("/show", post(show))
        .route("/upload", post(upload))
        .route("/search", post(search))
        .route("/like", post(like))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
