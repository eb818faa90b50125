//! API endpoints.

mod admin;
mod auth;
mod notifications;
mod shots;
mod tutorials;

use axum::Router;
use fairway_db::ledger::ToggleOutcome;

use crate::{middleware::AppState, response::ApiResponse};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/shots", shots::router())
        .nest("/tutorials", tutorials::router())
        .nest("/admin", admin::router())
        .nest("/notifications", notifications::router())
}

/// `201 Created` when the toggle left the item liked, `200 OK` when it did not.
fn toggled(outcome: ToggleOutcome) -> ApiResponse<ToggleOutcome> {
    if outcome.liked {
        ApiResponse::created(outcome)
    } else {
        ApiResponse::ok(outcome)
    }
}
