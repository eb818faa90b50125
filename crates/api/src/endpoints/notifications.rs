//! Notification endpoints.

use axum::{Router, extract::State, routing::post};
use fairway_common::AppResult;
use fairway_core::NotificationResponse;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Unread notifications. Each one is returned once.
async fn inbox(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = state.notification_service.take_inbox(&user.id).await?;
    Ok(ApiResponse::ok(notifications))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/inbox", post(inbox))
}
