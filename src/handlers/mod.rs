mod health;
mod metrics;
mod login;

use axum::{Router, routing::{get, post}};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::state::AppState;

use health::health_handler;
use metrics::metrics_handler;
use login::login_handler;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/jammanage/api/login", post(login_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
