//! Studyhall · multilingual learning site backend
//!
//! - Axum HTTP + WebSocket API
//! - Courses, games, library and tools read from a content directory
//! - Interactive widgets driven over `/ws`
//! - Static SPA fallback (`<static_dir>/index.html`)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   SITE_CONFIG_PATH : path to TOML config ([site] and [game] sections)
//!   CONTENT_DIR      : content root (default "content")
//!   STATIC_DIR       : SPA build output (default "static")
//!   DEFAULT_LOCALE   : en | pt | es
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod config;
mod content;
mod domain;
mod locale;
mod markdown;
mod pages;
mod protocol;
mod routes;
mod session;
mod state;
mod telemetry;
mod util;
mod widgets;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::config::SiteConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Config file + env overrides, then the shared state built from it.
  let state = Arc::new(AppState::new(SiteConfig::load()));

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "studyhall", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "studyhall", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "studyhall", error = %e, "Could not listen for Ctrl-C; running until killed");
    std::future::pending::<()>().await;
  }
  info!(target: "studyhall", "Shutdown requested");
}
