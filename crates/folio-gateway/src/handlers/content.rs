use crate::error::{AppError, Result};
use crate::model::{ContentResponse, ContentSummary, RelatedQuery, RelatedResponse};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use tracing::debug;

/// Serves a record by canonical id, or permanently redirects a retired
/// alias to its canonical location.
pub async fn get_content_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let resolution = state.catalog().resolve(&id)?;
    if resolution.redirect {
        debug!(requested = %id, canonical = %resolution.canonical, "redirecting retired alias");
        let location = format!("/v1/content/{}", resolution.canonical);
        return Ok(Redirect::permanent(&location).into_response());
    }

    let record = state
        .catalog()
        .get(resolution.canonical.as_str())
        .ok_or_else(|| AppError::NotFound(id.clone()))?;

    let related = state
        .related(record.id.as_str(), state.related_limit(None))?
        .into_iter()
        .map(ContentSummary::from)
        .collect();

    let counters = state.counters();
    let (views, shares) = tokio::join!(counters.get_views(&record.id), counters.get_shares(&record.id));

    let mut response = ContentResponse::new(record, related);
    response.views = views;
    response.shares = shares;
    Ok(Json(response).into_response())
}

pub async fn get_related_handler(
    Path(id): Path<String>,
    Query(query): Query<RelatedQuery>,
    State(state): State<AppState>,
) -> Result<Json<RelatedResponse>> {
    let canonical = state.catalog().resolve(&id)?.canonical;
    let related = state
        .related(canonical.as_str(), state.related_limit(query.limit))?
        .into_iter()
        .map(ContentSummary::from)
        .collect();

    Ok(Json(RelatedResponse {
        id: canonical.to_string(),
        related,
    }))
}
