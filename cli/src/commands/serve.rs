// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `gatehouse serve`
//!
//! Runs an axum server with both layers active:
//!
//! | Route | Guard |
//! |-------|-------|
//! | `GET /health` | excluded from the gateway |
//! | `GET /gatehouse/status` | gateway only |
//! | `GET /api/agents` | `agent_view` via `AgentContext` |
//! | `GET /api/agents/me/permissions` | gateway only, reports effective permissions |
//! | `POST /api/admin` | `admin_write` via route layer |

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use gatehouse_core::domain::config::GatehouseConfig;
use gatehouse_core::domain::permission::Permission;
use gatehouse_core::domain::violation::PermissionDenied;
use gatehouse_core::presentation::api;
use gatehouse_core::{AgentContext, Gatehouse, PermissionGuard};

#[derive(Clone)]
struct AppState {
    guard: Arc<PermissionGuard>,
}

impl FromRef<AppState> for Arc<PermissionGuard> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.guard)
    }
}

/// Build the fully protected application router.
pub fn build_app(config: GatehouseConfig) -> Result<Router> {
    config.validate().context("Invalid configuration")?;

    let mut gatehouse = Gatehouse::new(config);
    gatehouse
        .activate_gateway()
        .context("Failed to activate gateway layer")?;
    let engine = gatehouse.activate_permissions();
    let guard = PermissionGuard::new(engine).context("Failed to build permission guard")?;

    let routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/agents", get(list_agents_handler))
        .route("/api/agents/me/permissions", get(effective_permissions_handler))
        .route(
            "/api/admin",
            post(admin_handler).route_layer(guard.layer([Permission::AdminWrite])),
        )
        .with_state(AppState {
            guard: Arc::new(guard),
        });

    let gatehouse = Arc::new(gatehouse);
    let app = routes.merge(api::router(Arc::clone(&gatehouse)));
    Ok(gatehouse.protect(app))
}

pub async fn execute(host: String, port: u16, config: GatehouseConfig) -> Result<()> {
    let app = build_app(config)?;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Gatehouse listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    info!("Gatehouse shutting down");

    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_agents_handler(ctx: AgentContext) -> Result<Response, PermissionDenied> {
    ctx.require(Permission::AgentView)?;
    Ok(Json(serde_json::json!({ "agents": [] })).into_response())
}

async fn effective_permissions_handler(ctx: AgentContext) -> Json<serde_json::Value> {
    match ctx.effective_permissions() {
        Some((identity, permissions)) => Json(serde_json::json!({
            "agent_id": identity.agent_id,
            "agent_type": identity.agent_type,
            "permissions": permissions,
        })),
        None => Json(serde_json::json!({ "agent_id": null, "permissions": [] })),
    }
}

async fn admin_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
