use crate::error::{CoreError, RecordError, RecordErrors};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::Display;
use typed_builder::TypedBuilder;

const MAX_LENGTH: usize = 128;

/// A validated content identifier (a slug).
///
/// Ids are 1-128 characters of `[A-Za-z0-9._-]`. Colons are rejected
/// because ids are embedded in colon-delimited store keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Creates a new `ContentId` after validating the input.
    pub fn new(id: impl Into<String>) -> std::result::Result<Self, CoreError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> std::result::Result<(), CoreError> {
        if id.is_empty() || id.len() > MAX_LENGTH {
            return Err(CoreError::InvalidContentId(format!(
                "length must be between 1 and {}, got {}",
                MAX_LENGTH,
                id.len()
            )));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(CoreError::InvalidContentId(format!(
                "must contain only alphanumeric characters, dots, hyphens, or underscores: '{}'",
                id
            )));
        }

        Ok(())
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ContentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentId {
    type Error = CoreError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ContentId {
    type Error = CoreError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentId> for String {
    fn from(value: ContentId) -> Self {
        value.0
    }
}

/// A validated content record as supplied by the content collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, TypedBuilder)]
pub struct ContentRecord {
    /// The canonical identifier.
    pub id: ContentId,
    /// Retired identifiers that must redirect to `id`.
    #[builder(default)]
    pub aliases: Vec<ContentId>,
    /// Topical labels, de-duplicated, in display order.
    #[builder(default)]
    pub tags: Vec<String>,
    pub published_at: Timestamp,
    #[builder(default, setter(strip_option))]
    pub updated_at: Option<Timestamp>,
    #[builder(default)]
    pub featured: bool,
    #[builder(default)]
    pub archived: bool,
    #[builder(default)]
    pub draft: bool,
}

/// Content metadata exactly as the collaborator hands it over, before any
/// validation (e.g. deserialized from frontmatter or a JSON export).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContentRecord {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub draft: bool,
}

/// Parses either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date
/// (interpreted as midnight UTC).
fn parse_timestamp(value: &str) -> std::result::Result<Timestamp, String> {
    if let Ok(ts) = value.parse::<Timestamp>() {
        return Ok(ts);
    }
    let date = value
        .parse::<Date>()
        .map_err(|e| format!("invalid timestamp '{value}': {e}"))?;
    date.to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp())
        .map_err(|e| format!("invalid timestamp '{value}': {e}"))
}

impl TryFrom<RawContentRecord> for ContentRecord {
    type Error = RecordError;

    fn try_from(raw: RawContentRecord) -> std::result::Result<Self, Self::Error> {
        let fail = |reason: String| RecordError::new(raw.id.clone(), reason);

        let id = ContentId::new(raw.id.as_str()).map_err(|e| fail(e.to_string()))?;

        let mut aliases: Vec<ContentId> = Vec::with_capacity(raw.aliases.len());
        for alias in &raw.aliases {
            let alias = ContentId::new(alias.as_str())
                .map_err(|e| fail(format!("alias rejected: {e}")))?;
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let mut seen = HashSet::with_capacity(raw.tags.len());
        let mut tags = Vec::with_capacity(raw.tags.len());
        for tag in &raw.tags {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(fail("tags must not be blank".to_string()));
            }
            if seen.insert(tag.to_string()) {
                tags.push(tag.to_string());
            }
        }

        let published_at = raw
            .published_at
            .as_deref()
            .ok_or_else(|| fail("published_at is required".to_string()))
            .and_then(|s| parse_timestamp(s).map_err(&fail))?;

        let updated_at = raw
            .updated_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(&fail)?;

        if let Some(updated_at) = updated_at {
            if updated_at < published_at {
                return Err(fail(format!(
                    "updated_at {updated_at} precedes published_at {published_at}"
                )));
            }
        }

        Ok(ContentRecord {
            id,
            aliases,
            tags,
            published_at,
            updated_at,
            featured: raw.featured,
            archived: raw.archived,
            draft: raw.draft,
        })
    }
}

/// Validates a whole load of raw records.
///
/// Every invalid record is reported, not just the first one.
pub fn validate_records(
    raws: impl IntoIterator<Item = RawContentRecord>,
) -> std::result::Result<Vec<ContentRecord>, RecordErrors> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for raw in raws {
        match ContentRecord::try_from(raw) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(RecordErrors(errors))
    }
}
