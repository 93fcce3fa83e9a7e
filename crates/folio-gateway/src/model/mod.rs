mod content;
mod health;
mod stats;

pub use content::{ContentResponse, ContentSummary, RelatedQuery, RelatedResponse};
pub use health::HealthResponse;
pub use stats::{BatchStatsQuery, BatchStatsResponse, CounterResponse, StatsResponse};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}
