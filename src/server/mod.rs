pub mod routes;

use crate::errors::EngineError;
use crate::state::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/price", post(routes::price))
        .route("/api/pnl", post(routes::pnl))
        .route("/api/pnl/strikes", post(routes::pnl_by_strike))
        .route("/api/pnl/expiries", post(routes::pnl_by_expiry))
        .route("/api/profile", post(routes::profile))
        .route("/api/implied-vol", post(routes::implied_vol))
        .route("/api/historical-vol", post(routes::historical_vol))
        .route("/api/surface", post(routes::surface))
        .route("/api/strategies", post(routes::strategies))
        .route("/api/quote/{symbol}", get(routes::quote))
        .route("/api/counters", get(routes::get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match self {
            EngineError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
