//! Route-level tests against the axum router, backed by in-memory adapters.

use std::sync::Arc;

use api_adapters::{router, ApiLimits, AppState, CatalogMetrics};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use domains::{
    Actor, ContentKind, DomainError, IdentityVerifier, LegacyEntry, OwnerProfile, Role,
    ScoringWeights,
};
use serde_json::{json, Value};
use services::{
    FeedAggregator, ModerationService, ProjectService, ResolutionService, SimilarityScorer,
};
use storage_adapters::memory::{
    InMemoryLegacyCatalog, InMemoryModerationLog, InMemoryOwnerDirectory, InMemoryRecordStore,
    InMemorySuppressionRegistry,
};
use storage_adapters::RecordingNotifier;
use tower::ServiceExt;
use uuid::Uuid;

/// Accepts the literal tokens "admin" and "owner".
struct StaticVerifier {
    admin: Actor,
    owner: Actor,
}

impl IdentityVerifier for StaticVerifier {
    fn verify(&self, token: &str) -> Result<Actor, DomainError> {
        match token {
            "admin" => Ok(self.admin.clone()),
            "owner" => Ok(self.owner.clone()),
            _ => Err(DomainError::Unauthenticated("unknown token".into())),
        }
    }
}

struct TestApp {
    router: Router,
    owner: Actor,
}

fn legacy(id: &str, days_ago: i64, kind: ContentKind) -> LegacyEntry {
    LegacyEntry {
        id: id.into(),
        title: format!("Legacy {id}"),
        description: String::new(),
        kind,
        tags: vec!["puzzle".into()],
        developer: "unknown".into(),
        features: vec![],
        screenshots: vec![],
        links: vec![],
        published_at: Utc::now() - Duration::days(days_ago),
    }
}

fn test_app() -> TestApp {
    let admin = Actor { id: Uuid::now_v7(), name: "admin".into(), role: Role::Admin };
    let owner = Actor { id: Uuid::now_v7(), name: "pixelsmith".into(), role: Role::User };

    let records = Arc::new(InMemoryRecordStore::new());
    let legacy = Arc::new(InMemoryLegacyCatalog::new([
        legacy("42", 1, ContentKind::Game),
        legacy("43", 2, ContentKind::Game),
        legacy("44", 3, ContentKind::App),
    ]));
    let suppression = Arc::new(InMemorySuppressionRegistry::new());
    let log = Arc::new(InMemoryModerationLog::new());
    let owners = Arc::new(InMemoryOwnerDirectory::new());
    owners.upsert(OwnerProfile {
        id: owner.id,
        display_name: owner.name.clone(),
        email: Some("pixelsmith@example.com".into()),
        role: Role::User,
        welcome_sent: false,
    });
    let notifier = Arc::new(RecordingNotifier::new());

    let feed = Arc::new(FeedAggregator::new(records.clone(), legacy.clone(), suppression.clone()));
    let state = AppState {
        resolution: Arc::new(ResolutionService::new(records.clone(), legacy.clone())),
        similarity: Arc::new(SimilarityScorer::new(feed.clone(), ScoringWeights::default(), 100)),
        feed,
        moderation: Arc::new(ModerationService::new(
            records.clone(),
            legacy.clone(),
            suppression,
            log,
            notifier.clone(),
        )),
        projects: Arc::new(ProjectService::new(records, legacy, owners, notifier)),
        verifier: Arc::new(StaticVerifier { admin, owner: owner.clone() }),
        metrics: Arc::new(CatalogMetrics::new()),
        limits: ApiLimits::default(),
    };

    TestApp { router: router(state), owner }
}

async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn feed_lists_legacy_items_newest_first() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/api/feed?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["identifier"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["42", "43"]);
    assert_eq!(body["degraded"], json!([]));
}

#[tokio::test]
async fn unknown_item_is_404_with_error_body() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/api/items/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn moderation_requires_a_bearer_token() {
    let app = test_app();
    let request = json!({ "target_identifier": "42", "target_kind": "legacy", "action": "hide" });
    let (status, body) =
        send(&app.router, Method::POST, "/api/moderation", None, Some(request)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn admin_hide_removes_item_from_feed() {
    let app = test_app();
    let request = json!({
        "target_identifier": "42",
        "target_kind": "legacy",
        "action": "hide",
        "reason": "spam"
    });
    let (status, body) =
        send(&app.router, Method::POST, "/api/moderation", Some("admin"), Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action_type"], "hide");

    let (_, feed) = send(&app.router, Method::GET, "/api/feed", None, None).await;
    let ids: Vec<_> = feed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["identifier"].as_str().unwrap().to_string())
        .collect();
    assert!(!ids.contains(&"42".to_string()));
}

#[tokio::test]
async fn legacy_ban_is_a_conflict() {
    let app = test_app();
    let request = json!({ "target_identifier": "42", "target_kind": "legacy", "action": "ban" });
    let (status, body) =
        send(&app.router, Method::POST, "/api/moderation", Some("admin"), Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "illegal_transition");
}

#[tokio::test]
async fn non_admin_hide_is_forbidden() {
    let app = test_app();
    let request = json!({ "target_identifier": "42", "target_kind": "legacy", "action": "hide" });
    let (status, _) =
        send(&app.router, Method::POST, "/api/moderation", Some("owner"), Some(request)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn project_lifecycle_over_http() {
    let app = test_app();
    let (status, created) = send(
        &app.router,
        Method::POST,
        "/api/projects",
        Some("owner"),
        Some(json!({ "title": "Cool Game", "kind": "game", "tags": ["puzzle"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    assert_eq!(created["owner_id"], app.owner.id.to_string());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, claimed) = send(
        &app.router,
        Method::POST,
        &format!("/api/projects/{id}/claim"),
        Some("owner"),
        Some(json!({ "legacy_id": "42" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["claimed_legacy_id"], "42");

    let (status, published) =
        send(&app.router, Method::POST, &format!("/api/projects/{id}/publish"), Some("owner"), None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["status"], "published");

    // The claimed legacy entry now resolves to the managed record.
    let (status, item) =
        send(&app.router, Method::GET, "/api/items/cool-game-42", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["identifier"], id);

    let (status, similar) =
        send(&app.router, Method::GET, "/api/items/cool-game/similar?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let picks = similar.as_array().unwrap();
    assert_eq!(picks.len(), 2);
    assert!(picks.iter().all(|p| p["identifier"] != id.as_str() && p["identifier"] != "42"));
}

#[tokio::test]
async fn review_queue_is_admin_only() {
    let app = test_app();
    let (status, _) =
        send(&app.router, Method::GET, "/api/moderation/reviews", Some("owner"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&app.router, Method::GET, "/api/moderation/reviews", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn metrics_count_feed_requests() {
    let app = test_app();
    send(&app.router, Method::GET, "/api/feed", None, None).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("catalog_feed_requests_total 1"));
}
