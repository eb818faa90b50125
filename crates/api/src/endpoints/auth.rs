//! Authentication endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use fairway_common::AppResult;
use fairway_core::{RegisterInput, SignInInput, SignedIn};
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Session response for signup and signin.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub token: String,
}

impl From<SignedIn> for SessionResponse {
    fn from(signed_in: SignedIn) -> Self {
        Self {
            is_admin: signed_in.user.is_admin(),
            id: signed_in.user.id,
            username: signed_in.user.username,
            token: signed_in.token,
        }
    }
}

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let signed_in = state.user_service.register(input).await?;
    Ok(ApiResponse::created(signed_in.into()))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let signed_in = state.user_service.sign_in(input).await?;
    Ok(ApiResponse::ok(signed_in.into()))
}

/// Sign out, invalidating the current token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.user_service.sign_out(&user.id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}
