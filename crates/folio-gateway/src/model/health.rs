use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// `up` or `down`; the service keeps serving either way.
    pub store: &'static str,
}
