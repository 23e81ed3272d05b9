//! Run the HTTP service in the foreground.

use crate::config::Config;
use crate::rest;
use crate::service::Katsini;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Default bind address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Bind `addr` and serve lookups until a shutdown signal arrives.
pub async fn run(addr: SocketAddr, config: Config) -> Result<()> {
    info!("starting Katsini v{}", env!("CARGO_PKG_VERSION"));
    info!(
        deadline_secs = config.deadline.as_secs(),
        appgallery_fallback = config.appgallery_fallback_enabled(),
        "configuration loaded"
    );

    let service = Arc::new(Katsini::new(config));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    rest::serve(listener, service).await
}
