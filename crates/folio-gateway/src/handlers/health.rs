use crate::model::HealthResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use tracing::warn;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match state.store().ping().await {
        Ok(()) => "up",
        Err(e) => {
            warn!(error = %e, "counter store health check failed");
            "down"
        }
    };
    Json(HealthResponse {
        status: "ok",
        store,
    })
}
