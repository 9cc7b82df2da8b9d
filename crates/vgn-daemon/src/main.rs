//! vgn-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, connects and
//! migrates the database, wires middleware, and starts the HTTP server
//! with graceful shutdown on SIGINT / SIGTERM / SIGHUP. All route handlers
//! live in `routes.rs`; shared state in `state.rs`.

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use vgn_daemon::{config, routes, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    // Every date in the ledger is a calendar day; pin the process to UTC so
    // date truncation can never straddle a local midnight.
    std::env::set_var("TZ", "UTC");

    init_tracing();

    let cfg = config::Config::from_env();

    let pool = vgn_store::connect(&cfg.db_conn_str).await?;
    vgn_store::migrate(&pool).await?;

    let shared = state::AppState::with_postgres(pool);

    let app = routes::build_router(shared)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("vgn-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// CORS: allow only localhost origins (operator tooling).
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = ["http://localhost", "http://127.0.0.1"];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}

/// Resolve when any shutdown signal arrives.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut sighup = signal(SignalKind::hangup()).expect("install SIGHUP handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("got SIGINT"),
        _ = sigterm.recv() => info!("got SIGTERM"),
        _ = sighup.recv() => info!("got SIGHUP"),
    }
}
