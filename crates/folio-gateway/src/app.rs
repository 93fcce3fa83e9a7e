use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    batch_views_handler, get_content_handler, get_related_handler, health_handler,
    record_share_handler, record_view_handler, stats_handler,
};
use crate::state::AppState;

/// Rate limit route charged by `POST /v1/content/{id}/views`.
pub const VIEWS_ROUTE: &str = "views";
/// Rate limit route charged by `POST /v1/content/{id}/shares`.
pub const SHARES_ROUTE: &str = "shares";

/// Whole tokens left in the caller's bucket after the request.
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/v1",
                Router::new()
                    .route("/content/{id}", get(get_content_handler))
                    .route("/content/{id}/related", get(get_related_handler))
                    .route("/content/{id}/stats", get(stats_handler))
                    .route("/content/{id}/views", post(record_view_handler))
                    .route("/content/{id}/shares", post(record_share_handler))
                    .route("/stats/views", get(batch_views_handler)),
            )
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(state)
    }
}
