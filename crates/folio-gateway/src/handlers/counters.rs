use crate::app::{RATE_LIMIT_REMAINING, SHARES_ROUTE, VIEWS_ROUTE};
use crate::client::ClientId;
use crate::error::{AppError, Result};
use crate::model::{BatchStatsQuery, BatchStatsResponse, CounterResponse, StatsResponse};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_core::ContentId;
use folio_counters::Metric;
use folio_ratelimit::RateLimitDecision;
use std::collections::BTreeMap;
use tracing::debug;

/// Most ids accepted by one batch stats request.
pub const MAX_BATCH_IDS: usize = 100;

pub async fn stats_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>> {
    let canonical = state.catalog().resolve(&id)?.canonical;
    let counters = state.counters();

    let (views, views_24h, shares, shares_24h) = tokio::join!(
        counters.get_views(&canonical),
        counters.get_views_24h(&canonical),
        counters.get_shares(&canonical),
        counters.get_shares_24h(&canonical),
    );

    Ok(Json(StatsResponse {
        id: canonical.to_string(),
        views,
        views_24h,
        shares,
        shares_24h,
    }))
}

pub async fn record_view_handler(
    Path(id): Path<String>,
    client: ClientId,
    State(state): State<AppState>,
) -> Result<Response> {
    record(&state, &id, &client, Metric::Views, VIEWS_ROUTE).await
}

pub async fn record_share_handler(
    Path(id): Path<String>,
    client: ClientId,
    State(state): State<AppState>,
) -> Result<Response> {
    record(&state, &id, &client, Metric::Shares, SHARES_ROUTE).await
}

/// Charges the client's budget for `route`, then bumps `metric` on the
/// canonical id. Retired aliases count against the record they point to.
async fn record(
    state: &AppState,
    requested: &str,
    client: &ClientId,
    metric: Metric,
    route: &str,
) -> Result<Response> {
    let canonical = state.catalog().resolve(requested)?.canonical;

    let remaining = match state.limiter().allow_one(client.as_str(), route).await {
        RateLimitDecision::Allowed { remaining } => remaining,
        limited @ RateLimitDecision::Limited { .. } => {
            debug!(client = %client, route, id = %canonical, "rejecting rate limited request");
            return Err(AppError::RateLimited {
                retry_after_secs: limited.retry_after_secs().unwrap_or(1),
            });
        }
    };

    let total = state.counters().increment(metric, &canonical).await;
    let body = Json(CounterResponse {
        id: canonical.to_string(),
        metric: metric.as_str(),
        total,
    });
    Ok(([(RATE_LIMIT_REMAINING, remaining.to_string())], body).into_response())
}

/// Totals for up to [`MAX_BATCH_IDS`] ids in one store round trip.
pub async fn batch_views_handler(
    Query(query): Query<BatchStatsQuery>,
    State(state): State<AppState>,
) -> Result<Json<BatchStatsResponse>> {
    let requested: Vec<&str> = query
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();

    if requested.is_empty() {
        return Err(AppError::BadRequest("at least one id is required".to_string()));
    }
    if requested.len() > MAX_BATCH_IDS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_BATCH_IDS} ids per request, got {}",
            requested.len()
        )));
    }

    let mut resolved: Vec<(&str, ContentId)> = Vec::with_capacity(requested.len());
    let mut unknown = Vec::new();
    for id in requested {
        match state.catalog().resolve(id) {
            Ok(resolution) => resolved.push((id, resolution.canonical)),
            Err(_) => unknown.push(id.to_string()),
        }
    }

    let mut canonical: Vec<ContentId> = resolved.iter().map(|(_, id)| id.clone()).collect();
    canonical.sort();
    canonical.dedup();
    let totals = state.counters().get_many_views(&canonical).await;

    let views = resolved
        .into_iter()
        .map(|(requested, id)| (requested.to_string(), totals.get(&id).copied().flatten()))
        .collect::<BTreeMap<_, _>>();

    Ok(Json(BatchStatsResponse { views, unknown }))
}
