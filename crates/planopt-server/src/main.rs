//! planopt HTTP service.
//!
//! Exposes the optimizer over three endpoints:
//!
//! - `GET /health`: liveness probe.
//! - `GET /rules`: the rule set in application order.
//! - `POST /optimize`: a plan plus inline table statistics; returns the
//!   optimized plan rendering, its cost, and the optimization trace.

mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planopt=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new());
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/rules", get(routes::list_rules))
        .route("/optimize", post(routes::optimize))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("failed to bind 0.0.0.0:3000");
    tracing::info!("planopt server listening on {}", listener.local_addr().expect("local addr"));
    axum::serve(listener, app).await.expect("server error");
}
