use axum::{extract::State, http::{StatusCode, header}, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use crate::metrics::RATE_LIMIT_ENTRIES;
use crate::state::AppState;

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    RATE_LIMIT_ENTRIES.set(state.rate_limiter.len() as f64);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
        .into_response()
}
