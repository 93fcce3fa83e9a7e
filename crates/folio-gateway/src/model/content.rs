use folio_core::ContentRecord;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ContentSummary {
    pub id: String,
    pub tags: Vec<String>,
    pub published_at: Timestamp,
    pub featured: bool,
    pub archived: bool,
}

impl From<&ContentRecord> for ContentSummary {
    fn from(record: &ContentRecord) -> Self {
        Self {
            id: record.id.to_string(),
            tags: record.tags.clone(),
            published_at: record.published_at,
            featured: record.featured,
            archived: record.archived,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub id: String,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
    pub published_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    pub featured: bool,
    pub archived: bool,
    pub draft: bool,
    pub related: Vec<ContentSummary>,
    /// Left out when the counter store is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<i64>,
}

impl ContentResponse {
    pub fn new(record: &ContentRecord, related: Vec<ContentSummary>) -> Self {
        Self {
            id: record.id.to_string(),
            aliases: record.aliases.iter().map(ToString::to_string).collect(),
            tags: record.tags.clone(),
            published_at: record.published_at,
            updated_at: record.updated_at,
            featured: record.featured,
            archived: record.archived,
            draft: record.draft,
            related,
            views: None,
            shares: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RelatedResponse {
    pub id: String,
    pub related: Vec<ContentSummary>,
}
