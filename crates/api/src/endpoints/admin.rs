//! Moderation endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use fairway_common::AppResult;
use fairway_core::{ModerationQueue, RejectInput};
use fairway_db::ledger::ItemKind;
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Request naming one submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub kind: ItemKind,
    pub id: String,
}

/// Submissions waiting for approval.
async fn queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ModerationQueue>> {
    let queue = state.moderation_service.queue(&user).await?;
    Ok(ApiResponse::ok(queue))
}

/// Publish a submission.
async fn approve(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubmissionRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .moderation_service
        .approve(&user, req.kind, &req.id)
        .await?;
    Ok(response::ok())
}

/// Reject a submission with a reason for its author.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RejectInput>,
) -> AppResult<impl IntoResponse> {
    state.moderation_service.reject(&user, input).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue", post(queue))
        .route("/approve", post(approve))
        .route("/reject", post(reject))
}
