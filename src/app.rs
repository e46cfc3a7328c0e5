/*
 * Responsibility
 * - load Config → build dependencies → assemble the Router
 * - layer order (outer → inner): transport (request id, timeout, trace)
 *   → fault translation → body limit → token validation → policy guard → handler
 * - start serving with axum::serve()
 */
use std::sync::Arc;

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, HttpLimits};
use crate::middleware;
use crate::services::auth::build_token_validator;
use crate::services::policy::PolicyRegistry;
use crate::services::telemetry::TracingTelemetrySink;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,patient_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let operations = api::v1::operations(&state.policies)?;
    let app = build_router(state, operations, config.http);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Process-level services, built once and shared read-only by every request.
pub fn build_state(config: &Config) -> Result<AppState> {
    let validator = build_token_validator(config)?;
    let policies = Arc::new(PolicyRegistry::defaults()?);

    tracing::info!(
        issuer = %config.auth_issuer,
        audiences = ?config.auth_audiences,
        policies = policies.len(),
        "request pipeline configured"
    );

    Ok(AppState::new(
        validator,
        policies,
        Arc::new(TracingTelemetrySink),
    ))
}

/// Assemble the full pipeline around `operations` (see `api::operations`).
pub fn build_router(state: AppState, operations: Router<AppState>, limits: HttpLimits) -> Router {
    let v1 = middleware::auth::access::apply(operations, state.clone());
    let telemetry = state.telemetry.clone();

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state);

    let router = middleware::http::limit_body(router, limits);
    let router = middleware::faults::apply(router, telemetry);
    middleware::http::apply(router, limits)
}
