//! Router tests against an in-memory store

use super::*;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use chrono::{Duration, Utc};
use folio_common::{
    auth::SessionToken,
    config::{
        AdminConfig, CacheConfig, ObservabilityConfig, ServerConfig, SessionConfig, StoreConfig,
    },
    db::{MemoryStore, ProjectRepository},
};
use serde_json::{json, Value};
use tower::ServiceExt;

const EMAIL: &str = "duku@joben.eu";
const PASSWORD: &str = "Bigboss2025";

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        store: StoreConfig {
            provider: "memory".into(),
            url: String::new(),
            anon_key: String::new(),
            table: "projects".into(),
            bucket: "project-images".into(),
            timeout_secs: 5,
        },
        cache: CacheConfig::default(),
        session: SessionConfig::default(),
        admin: AdminConfig::default(),
        observability: ObservabilityConfig::default(),
    }
}

fn test_app() -> Router {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let repository = ProjectRepository::new(store.clone(), store);

    create_router(AppState {
        cache: Arc::new(ProjectCache::new(repository, config.stale_after())),
        config: Arc::new(config),
        prometheus: None,
    })
}

fn fresh_token() -> String {
    SessionToken::issue(EMAIL, Utc::now()).encode()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(request.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_store_counts() {
    let app = test_app();
    let response = send(&app, Method::GET, "/ready", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"]["total"], 0);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let app = test_app();
    let response = send(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_issues_token() {
    let app = test_app();
    let response = send(
        &app,
        Method::POST,
        "/v1/admin/login",
        None,
        Some(json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let token = SessionToken::decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(token.email, EMAIL);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = test_app();
    let response = send(
        &app,
        Method::POST,
        "/v1/admin/login",
        None,
        Some(json!({ "email": EMAIL, "password": "bigboss2025" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_bearer() {
    let app = test_app();
    let project = json!({ "title": "Joben", "description": "Job board" });

    let missing = send(&app, Method::POST, "/v1/admin/projects", None, Some(project.clone())).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let expired = SessionToken::issue(EMAIL, Utc::now() - Duration::hours(25)).encode();
    let response = send(
        &app,
        Method::POST,
        "/v1/admin/projects",
        Some(&expired),
        Some(project.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong_case = SessionToken::issue("DUKU@joben.eu", Utc::now()).encode();
    let response = send(
        &app,
        Method::POST,
        "/v1/admin/projects",
        Some(&wrong_case),
        Some(project.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let garbage = send(&app, Method::POST, "/v1/admin/projects", Some("!!"), Some(project)).await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let listed = json_body(send(&app, Method::GET, "/v1/projects", None, None).await).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_create_update_delete_flow() {
    let app = test_app();
    let token = fresh_token();

    // Warm the list slot so the create has something to invalidate
    let empty = json_body(send(&app, Method::GET, "/v1/projects", None, None).await).await;
    assert_eq!(empty, json!([]));

    let response = send(
        &app,
        Method::POST,
        "/v1/admin/projects",
        Some(&token),
        Some(json!({
            "title": "DiveIn",
            "description": "Dive log",
            "tech": ["Rust", "Axum"]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["featured"], false);

    let listed = json_body(send(&app, Method::GET, "/v1/projects", None, None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let featured = json_body(send(&app, Method::GET, "/v1/projects/featured", None, None).await).await;
    assert_eq!(featured, json!([]));

    let response = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/projects/{}", id),
        Some(&token),
        Some(json!({ "featured": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["featured"], true);
    assert_eq!(updated["title"], "DiveIn");

    let featured = json_body(send(&app, Method::GET, "/v1/projects/featured", None, None).await).await;
    assert_eq!(featured[0]["id"], id);

    let fetched = json_body(send(&app, Method::GET, &format!("/v1/projects/{}", id), None, None).await).await;
    assert_eq!(fetched["featured"], true);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/v1/admin/projects/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, &format!("/v1/projects/{}", id), None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/v1/admin/projects/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_empty_title() {
    let app = test_app();
    let response = send(
        &app,
        Method::POST,
        "/v1/admin/projects",
        Some(&fresh_token()),
        Some(json!({ "title": "", "description": "Job board" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["field"], "title");
}

#[tokio::test]
async fn test_patch_rejects_unknown_fields() {
    let app = test_app();
    let token = fresh_token();
    let created = json_body(
        send(
            &app,
            Method::POST,
            "/v1/admin/projects",
            Some(&token),
            Some(json!({ "title": "Joben", "description": "Job board" })),
        )
        .await,
    )
    .await;

    let response = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/projects/{}", created["id"]),
        Some(&token),
        Some(json!({ "id": 99 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_seed_only_fills_empty_table() {
    let app = test_app();
    let token = fresh_token();

    let first = json_body(send(&app, Method::POST, "/v1/admin/seed", Some(&token), None).await).await;
    assert_eq!(first, json!({ "outcome": "inserted", "count": 3 }));

    let second = json_body(send(&app, Method::POST, "/v1/admin/seed", Some(&token), None).await).await;
    assert_eq!(second["outcome"], "already_seeded");

    let listed = json_body(send(&app, Method::GET, "/v1/projects", None, None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_image_upload_and_removal() {
    let app = test_app();
    let token = fresh_token();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/admin/projects/4/image?file_name=Shot.PNG")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(vec![0x89, b'P', b'N', b'G']))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let url = json_body(response).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("memory://project-images/projects/4-"));
    assert!(url.ends_with(".png"));

    let response = send(
        &app,
        Method::DELETE,
        "/v1/admin/images",
        Some(&token),
        Some(json!({ "url": url })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let app = test_app();
    let response = send(&app, Method::GET, "/v1/projects/12345", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
