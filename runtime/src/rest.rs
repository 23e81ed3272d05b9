// Copyright 2026 Katsini Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for Katsini.
//!
//! Three read-only lookup routes, one per store. Every failure is a 400 with
//! `{"error": "<message>"}`; panics become a 500 with the same shape.

use crate::app::App;
use crate::error::KatsiniResult;
use crate::providers::app_store::AppStoreQuery;
use crate::providers::play_store::PlayStoreQuery;
use crate::service::Katsini;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the axum Router with all REST endpoints.
pub fn router(service: Arc<Katsini>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/playstore", get(handle_play_store))
        .route("/appstore", get(handle_app_store))
        .route("/appgallery", get(handle_app_gallery))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(service)
}

/// Serve on `listener` until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, service: Arc<Katsini>) -> anyhow::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!("REST API listening on http://{addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("REST API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("received shutdown signal");
}

// ── Helpers ─────────────────────────────────────────────────────

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn respond(result: KatsiniResult<App>) -> Response {
    match result {
        Ok(app) => Json(app).into_response(),
        Err(e) => {
            if e.is_client_fault() {
                info!(kind = e.kind(), error = %e, "lookup rejected");
            } else {
                warn!(kind = e.kind(), error = %e, "lookup failed");
            }
            error_body(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// ── Handlers ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayStoreParams {
    bundle_id: Option<String>,
    lang: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppStoreParams {
    app_id: Option<String>,
    bundle_id: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppGalleryParams {
    app_id: Option<String>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_play_store(
    State(service): State<Arc<Katsini>>,
    Query(params): Query<PlayStoreParams>,
) -> Response {
    let query = PlayStoreQuery {
        bundle_id: params.bundle_id.unwrap_or_default(),
        lang: params.lang,
        country: params.country,
    };
    respond(service.play_store(&query).await)
}

async fn handle_app_store(
    State(service): State<Arc<Katsini>>,
    Query(params): Query<AppStoreParams>,
) -> Response {
    let query = AppStoreQuery {
        app_id: params.app_id,
        bundle_id: params.bundle_id,
        country: params.country,
    };
    respond(service.app_store(&query).await)
}

async fn handle_app_gallery(
    State(service): State<Arc<Katsini>>,
    Query(params): Query<AppGalleryParams>,
) -> Response {
    let app_id = params.app_id.unwrap_or_default();
    respond(service.app_gallery(&app_id).await)
}
