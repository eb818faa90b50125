//! Fairway server entry point.

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use fairway_api::{AppState, auth_middleware, router as api_router};
use fairway_common::{Config, LocalStorage, StorageBackend};
use fairway_core::{
    LikeLedger, ModerationService, NotificationService, ShotService, TutorialService, UserService,
};
use fairway_db::repositories::{
    LikeRepository, NotificationRepository, ShotRepository, TutorialRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Room for the multipart framing and text fields around an uploaded image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fairway=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting fairway server...");

    let config = Config::load()?;

    let db = fairway_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    fairway_db::migrate(&db).await?;
    info!("Migrations completed");

    tokio::fs::create_dir_all(&config.uploads.path).await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.uploads.path.clone(),
        config.uploads.base_url.clone(),
    ));

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let shot_repo = ShotRepository::new(Arc::clone(&db));
    let tutorial_repo = TutorialRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let like_repo =
        LikeRepository::new(Arc::clone(&db)).with_lock_timeout(config.ledger.lock_timeout());

    // Initialize services
    let like_ledger = LikeLedger::new(Arc::new(like_repo), &config.ledger);
    let notification_service = NotificationService::new(notification_repo);
    let user_service = UserService::new(user_repo, &config);
    let shot_service = ShotService::new(
        shot_repo.clone(),
        like_ledger.clone(),
        Arc::clone(&storage),
        config.uploads.max_bytes,
    );
    let tutorial_service = TutorialService::new(tutorial_repo.clone(), like_ledger.clone());
    let moderation_service = ModerationService::new(
        shot_repo,
        tutorial_repo,
        like_ledger.clone(),
        notification_service.clone(),
        storage,
    );

    let state = AppState {
        user_service,
        shot_service,
        tutorial_service,
        moderation_service,
        notification_service,
        like_ledger,
    };

    let body_limit = config.uploads.max_bytes + FORM_OVERHEAD_BYTES;

    let app = Router::new()
        .nest("/api", api_router())
        .nest_service(&config.uploads.base_url, ServeDir::new(&config.uploads.path))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(%addr, public_url = %config.server.url, "Listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
