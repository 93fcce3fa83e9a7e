use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize)]
pub struct StatsResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views_24h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_24h: Option<i64>,
}

/// Answer to a recorded view or share.
#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub id: String,
    pub metric: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchStatsQuery {
    /// Comma separated ids.
    pub ids: String,
}

#[derive(Debug, Serialize)]
pub struct BatchStatsResponse {
    /// Keyed by the id as requested; `null` when the store is unavailable.
    pub views: BTreeMap<String, Option<i64>>,
    pub unknown: Vec<String>,
}
