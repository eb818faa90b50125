//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use fairway_core::{
    LikeLedger, ModerationService, NotificationService, ShotService, TutorialService, UserService,
};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub shot_service: ShotService,
    pub tutorial_service: TutorialService,
    pub moderation_service: ModerationService,
    pub notification_service: NotificationService,
    pub like_ledger: LikeLedger,
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stores the user in the request
/// extensions. Unknown tokens leave the request anonymous; handlers that need a
/// user reject it through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req).map(str::to_owned) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Ignoring bearer token"),
        }
    }

    next.run(req).await
}
