//! Tutorial endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use fairway_common::AppResult;
use fairway_core::{CreateTutorialInput, TutorialResponse};
use fairway_db::ledger::{ItemKind, ToggleOutcome};
use serde::Deserialize;

use super::toggled;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Request naming a tutorial.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialIdRequest {
    pub tutorial_id: String,
}

/// Request to list one category.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub category: String,
}

/// All approved tutorials.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<TutorialResponse>>> {
    let tutorials = state.tutorial_service.list(viewer.as_ref(), None).await?;
    Ok(ApiResponse::ok(tutorials))
}

/// Approved tutorials in one category.
async fn search(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> AppResult<ApiResponse<Vec<TutorialResponse>>> {
    let tutorials = state
        .tutorial_service
        .list(viewer.as_ref(), Some(req.category.trim()))
        .await?;
    Ok(ApiResponse::ok(tutorials))
}

/// Submit a tutorial for moderation.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTutorialInput>,
) -> AppResult<ApiResponse<TutorialResponse>> {
    let tutorial = state.tutorial_service.create(&user, input).await?;
    Ok(ApiResponse::created(tutorial))
}

/// Like or unlike a tutorial.
async fn like(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<ToggleOutcome>> {
    let outcome = state
        .like_ledger
        .toggle_like(
            user.as_ref().map(|u| u.id.as_str()),
            ItemKind::Tutorial,
            &req.tutorial_id,
        )
        .await?;
    Ok(toggled(outcome))
}

/// Delete a tutorial.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.tutorial_service.delete(&user, &req.tutorial_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(list))
        .route("/create", post(create))
        .route("/search", post(search))
        .route("/like", post(like))
        .route("/delete", post(delete))
}
