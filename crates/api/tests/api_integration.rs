//! API integration tests.
//!
//! These drive the router end to end with a mock database behind the
//! repositories and the in-memory like store behind the ledger.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use fairway_api::{AppState, auth_middleware, router as api_router};
use fairway_common::LocalStorage;
use fairway_common::config::{
    AdminConfig, Config, DatabaseConfig, LedgerConfig, ServerConfig, UploadConfig,
};
use fairway_core::{
    LikeLedger, ModerationService, NotificationService, ShotService, TutorialService, UserService,
};
use fairway_db::entities::user::{self, Role};
use fairway_db::ledger::{ItemKey, LikeStore, MemoryLikeStore};
use fairway_db::repositories::{
    NotificationRepository, ShotRepository, TutorialRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "https://golf.example".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        uploads: UploadConfig::default(),
        ledger: LedgerConfig::default(),
        admin: AdminConfig::default(),
    }
}

fn create_test_user(id: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_string(),
        password_hash: String::new(),
        token: Some(format!("token-{id}")),
        role: Role::User,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// A database that answers each token lookup with the given users, in order.
fn db_with_sessions(users: &[&str]) -> DatabaseConnection {
    let mut db = MockDatabase::new(DatabaseBackend::Postgres);
    for id in users {
        db = db.append_query_results([[create_test_user(id)]]);
    }
    db.into_connection()
}

/// Create test app state with mock database.
fn create_test_state(db: DatabaseConnection, store: Arc<MemoryLikeStore>) -> AppState {
    let db = Arc::new(db);
    let config = create_test_config();
    let storage = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("fairway-api-tests"),
        config.uploads.base_url.clone(),
    ));

    let like_ledger = LikeLedger::new(store, &config.ledger);
    let notification_service =
        NotificationService::new(NotificationRepository::new(Arc::clone(&db)));

    AppState {
        user_service: UserService::new(UserRepository::new(Arc::clone(&db)), &config),
        shot_service: ShotService::new(
            ShotRepository::new(Arc::clone(&db)),
            like_ledger.clone(),
            storage.clone(),
            config.uploads.max_bytes,
        ),
        tutorial_service: TutorialService::new(
            TutorialRepository::new(Arc::clone(&db)),
            like_ledger.clone(),
        ),
        moderation_service: ModerationService::new(
            ShotRepository::new(Arc::clone(&db)),
            TutorialRepository::new(Arc::clone(&db)),
            like_ledger.clone(),
            notification_service.clone(),
            storage,
        ),
        notification_service,
        like_ledger,
    }
}

/// Create the test router, with the auth layer in front of it.
fn create_test_router(db: DatabaseConnection, store: Arc<MemoryLikeStore>) -> Router {
    let state = create_test_state(db, store);
    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_like_requires_authentication() {
    let store = Arc::new(MemoryLikeStore::new());
    store.insert_item(ItemKey::shot("s1"));
    let app = create_test_router(db_with_sessions(&[]), Arc::clone(&store));

    let response = app
        .oneshot(post_json("/shots/like", None, r#"{"shotId":"s1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.record_count(&ItemKey::shot("s1")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_like_then_unlike_shot() {
    let store = Arc::new(MemoryLikeStore::new());
    store.insert_item(ItemKey::shot("s1"));
    let app = create_test_router(db_with_sessions(&["u1", "u1"]), Arc::clone(&store));

    let response = app
        .clone()
        .oneshot(post_json("/shots/like", Some("token-u1"), r#"{"shotId":"s1"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likeCount"], 1);

    let response = app
        .oneshot(post_json("/shots/like", Some("token-u1"), r#"{"shotId":"s1"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likeCount"], 0);
}

#[tokio::test]
async fn test_like_counts_each_user_once() {
    let store = Arc::new(MemoryLikeStore::new());
    store.seed_item(ItemKey::tutorial("t1"), ["u1"]);
    let app = create_test_router(db_with_sessions(&["u2"]), Arc::clone(&store));

    let response = app
        .oneshot(post_json(
            "/tutorials/like",
            Some("token-u2"),
            r#"{"tutorialId":"t1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["likeCount"], 2);
    assert_eq!(store.record_count(&ItemKey::tutorial("t1")).await.unwrap(), 2);
}

#[tokio::test]
async fn test_like_unknown_item_is_not_found() {
    let store = Arc::new(MemoryLikeStore::new());
    let app = create_test_router(db_with_sessions(&["u1"]), store);

    let response = app
        .oneshot(post_json("/shots/like", Some("token-u1"), r#"{"shotId":"gone"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_token_stays_anonymous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db, Arc::new(MemoryLikeStore::new()));

    let response = app
        .oneshot(post_json("/notifications/inbox", Some("stale"), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signout_requires_authentication() {
    let app = create_test_router(db_with_sessions(&[]), Arc::new(MemoryLikeStore::new()));

    let response = app
        .oneshot(post_json("/signout", None, "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_password_mismatch() {
    let app = create_test_router(db_with_sessions(&[]), Arc::new(MemoryLikeStore::new()));

    let response = app
        .oneshot(post_json(
            "/signup",
            None,
            r#"{"username":"birdie","password":"one","confirmPassword":"two"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gallery_pages_start_at_one() {
    let app = create_test_router(db_with_sessions(&[]), Arc::new(MemoryLikeStore::new()));

    let response = app
        .oneshot(post_json("/shots/gallery", None, r#"{"page":0}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = create_test_router(db_with_sessions(&["u1"]), Arc::new(MemoryLikeStore::new()));
    let boundary = "fairwayboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"details\"\r\n\r\n\
         {{\"holeNumber\":7,\"windSpeed\":0,\"windUnit\":\"MPH\",\"windDirection\":\"N\",\
         \"flagPosition\":\"Center\",\"shotDistance\":150,\"distanceUnit\":\"yds\"}}\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/shots/upload")
                .method("POST")
                .header("Authorization", "Bearer token-u1")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_queue_forbidden_for_users() {
    let app = create_test_router(db_with_sessions(&["u1"]), Arc::new(MemoryLikeStore::new()));

    let response = app
        .oneshot(post_json("/admin/queue", Some("token-u1"), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
