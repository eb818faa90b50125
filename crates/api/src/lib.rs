//! HTTP API layer for fairway.
//!
//! - **Endpoints**: accounts, shots, tutorials, moderation and notifications
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: application state and the auth layer
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
