/*
 * Responsibility
 * - Tracing/panic-hook initialization, Config load, state build
 * - Router assembly: pipeline middleware around the upstream router,
 *   CORS, HTTP hygiene, response-header normalization
 * - axum::serve() startup
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;
use crate::{error, middleware, pipeline};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,api_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost
        // (stderr can be hidden depending on how the process is launched).
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice
        // immediately. In production, keep the default behavior.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = AppState::from_config(&config).context("invalid gateway policy configuration")?;
    let app = build_router(&config, state, default_upstream());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assemble the boundary around an upstream router.
///
/// The upstream is the routing collaborator: the deployment's reverse-proxy
/// routes, or a plain `Router` in tests. Layer order, innermost first:
/// pipeline → CORS → trace/limit/timeout → response-header normalization
/// (outermost, so it sees headers from every layer and from the backend).
pub fn build_router(config: &Config, state: AppState, upstream: Router) -> Router {
    let router =
        upstream.layer(axum_middleware::from_fn_with_state(state, pipeline::handle));
    let router = middleware::cors::apply(router, config);
    let router = middleware::http::apply(router);
    router.layer(axum_middleware::from_fn(error::dedupe_response_headers))
}

/// Placeholder upstream for running the gateway standalone. Real deployments
/// pass their routing table to [`build_router`] instead.
pub fn default_upstream() -> Router {
    Router::new().fallback(upstream_unavailable)
}

async fn upstream_unavailable() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "no upstream route configured")
}
