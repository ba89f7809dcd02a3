// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests of the permission guards, alone and behind the gateway.
//!
//! - Route-layer guard and `AgentContext` extractor reach the same decisions
//! - Non-agent traffic passes guarded routes unchecked
//! - A gateway rejection happens before permission resolution is reached

use axum::body::Body;
use axum::extract::FromRef;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gatehouse_core::domain::violation::PermissionDenied;
use gatehouse_core::presentation::response::ErrorBody;
use gatehouse_core::presentation::GATEWAY_MARKER_HEADER;
use gatehouse_core::{AgentContext, Gatehouse, GatehouseConfig, Permission, PermissionGuard};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Clone)]
struct AppState {
    guard: Arc<PermissionGuard>,
}

impl FromRef<AppState> for Arc<PermissionGuard> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.guard)
    }
}

async fn list_agents(ctx: AgentContext) -> Result<Response, PermissionDenied> {
    ctx.require(Permission::AgentView)?;
    let caller = ctx
        .identity()
        .map(|agent| agent.agent_id.clone())
        .unwrap_or_else(|| "host".to_string());
    Ok(Json(serde_json::json!({ "caller": caller })).into_response())
}

async fn admin_write() -> &'static str {
    "written"
}

fn build(gatehouse: &mut Gatehouse) -> Router {
    let engine = gatehouse.activate_permissions();
    let guard = PermissionGuard::new(engine).unwrap();
    let router = Router::new()
        .route("/api/agents", get(list_agents))
        .route(
            "/api/admin",
            post(admin_write).route_layer(guard.layer([Permission::AdminWrite])),
        )
        .route(
            "/api/ledger",
            post(|| async { "moved" })
                .route_layer(guard.layer([Permission::SutraView, Permission::SutraTransfer])),
        )
        .with_state(AppState {
            guard: Arc::new(guard),
        });
    gatehouse.protect(router)
}

fn permissions_only() -> Router {
    build(&mut Gatehouse::new(GatehouseConfig::default()))
}

fn as_agent(method: &str, path: &str, agent_id: &str, agent_type: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("x-agent-id", agent_id)
        .header("x-agent-type", agent_type)
        .body(Body::empty())
        .unwrap()
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_playlist_agent_denied_admin_write() {
    let app = permissions_only();
    let response = app
        .oneshot(as_agent("POST", "/api/admin", "playlist-1", "playlist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: ErrorBody = serde_json::from_value(json(response).await).unwrap();
    assert_eq!(
        body.detail,
        "Agent playlist-1 (playlist) lacks permission: admin_write"
    );
    assert_eq!(serde_json::to_value(&body).unwrap()["layer"], "dharma");
}

#[tokio::test]
async fn test_playlist_agent_allowed_agent_view() {
    let app = permissions_only();
    let response = app
        .oneshot(as_agent("GET", "/api/agents", "playlist-1", "playlist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["caller"], "playlist-1");
}

#[tokio::test]
async fn test_admin_passes_every_guard() {
    let app = permissions_only();
    for (method, path) in [("GET", "/api/agents"), ("POST", "/api/admin"), ("POST", "/api/ledger")] {
        let response = app
            .clone()
            .oneshot(as_agent(method, path, "root", "admin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{method} {path}");
    }
}

#[tokio::test]
async fn test_non_agent_traffic_passes_guarded_routes() {
    let app = permissions_only();

    let response = app
        .clone()
        .oneshot(Request::post("/api/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Only one of the two identity headers: still first-party.
    let half = Request::get("/api/agents")
        .header("x-agent-id", "who")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(half).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["caller"], "host");
}

#[tokio::test]
async fn test_unknown_agent_type_is_denied() {
    let app = permissions_only();
    let response = app
        .oneshot(as_agent("GET", "/api/agents", "ghost-1", "ghost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_multi_permission_layer_requires_all() {
    let app = permissions_only();
    // curator holds sutra_view but not sutra_transfer.
    let response = app
        .clone()
        .oneshot(as_agent("POST", "/api/ledger", "curator-1", "curator"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json(response).await;
    assert!(body["detail"].as_str().unwrap().ends_with("sutra_transfer"));

    // sutra holds both.
    let response = app
        .oneshot(as_agent("POST", "/api/ledger", "sutra-1", "sutra"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_runtime_grant_and_denial_take_effect() {
    let mut gatehouse = Gatehouse::new(GatehouseConfig::default());
    let app = build(&mut gatehouse);
    let engine = Arc::clone(gatehouse.policy().unwrap());

    engine.grant("playlist-1", [Permission::AdminWrite]);
    let response = app
        .clone()
        .oneshot(as_agent("POST", "/api/admin", "playlist-1", "playlist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    engine.deny("playlist-1", [Permission::AdminWrite]);
    let response = app
        .oneshot(as_agent("POST", "/api/admin", "playlist-1", "playlist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_gateway_rejects_before_permissions_are_resolved() {
    let mut config = GatehouseConfig::default();
    config.gateway.allowed_origins = vec!["https://onezeroeight.ai".into()];
    let mut gatehouse = Gatehouse::new(config);
    gatehouse.activate_gateway().unwrap();
    let app = build(&mut gatehouse);

    let request = Request::post("/api/admin")
        .header("origin", "https://evil.com")
        .header("x-agent-id", "root")
        .header("x-agent-type", "admin")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()[GATEWAY_MARKER_HEADER], "sutra");
    let body = json(response).await;
    assert_eq!(body["layer"], "sutra");
    assert_eq!(body["detail"], "Origin not allowed: https://evil.com");
}

#[tokio::test]
async fn test_gateway_and_guard_compose_on_admitted_request() {
    let mut gatehouse = Gatehouse::new(GatehouseConfig::default());
    gatehouse.activate_gateway().unwrap();
    let app = build(&mut gatehouse);

    let response = app
        .oneshot(as_agent("POST", "/api/admin", "playlist-1", "playlist"))
        .await
        .unwrap();
    // Admitted by the gateway, then refused by the guard; the marker is still stamped.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()[GATEWAY_MARKER_HEADER], "sutra");
    assert_eq!(json(response).await["layer"], "dharma");
}
