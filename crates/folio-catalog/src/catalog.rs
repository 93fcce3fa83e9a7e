use crate::error::{ConfigurationError, LoadError, ResolveError};
use crate::redirect::{RedirectMap, Resolution};
use crate::related::RelatedRanker;
use crate::source::ContentSource;
use folio_core::{validate_records, ContentId, ContentRecord};
use std::collections::HashMap;
use tracing::info;

/// The immutable view of one load cycle: records, redirects and ranking.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<ContentRecord>,
    index: HashMap<ContentId, usize>,
    redirects: RedirectMap,
    ranker: RelatedRanker,
}

impl Catalog {
    /// Builds a catalog from validated records, keeping their order.
    pub fn build(records: Vec<ContentRecord>) -> Result<Self, ConfigurationError> {
        let redirects = RedirectMap::build(&records)?;
        let index = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.id.clone(), i))
            .collect();

        Ok(Self {
            records,
            index,
            redirects,
            ranker: RelatedRanker::default(),
        })
    }

    /// Reads every record from `source`, validates them and builds the
    /// catalog. Any invalid record or redirect conflict fails the load.
    pub async fn load(source: &dyn ContentSource) -> Result<Self, LoadError> {
        let raws = source.load_all_records().await?;
        let records = validate_records(raws)?;
        let catalog = Self::build(records)?;

        info!(
            records = catalog.len(),
            aliases = catalog.redirects.alias_count(),
            "content catalog loaded"
        );
        Ok(catalog)
    }

    /// Replaces the ranker used by [`Catalog::related`].
    pub fn with_ranker(mut self, ranker: RelatedRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn resolve(&self, requested: &str) -> Result<Resolution, ResolveError> {
        self.redirects.resolve(requested)
    }

    /// Looks up a record by canonical id only; aliases are not followed.
    pub fn get(&self, id: &str) -> Option<&ContentRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Related records for any identifier, canonical or retired.
    pub fn related(&self, requested: &str, limit: usize) -> Result<Vec<&ContentRecord>, ResolveError> {
        let resolution = self.resolve(requested)?;
        let focal = self
            .get(resolution.canonical.as_str())
            .ok_or_else(|| ResolveError::NotFound(requested.to_string()))?;
        Ok(self.ranker.rank(focal, &self.records, limit))
    }

    /// The most recently published non-draft records, newest first.
    ///
    /// Callers may use this when [`Catalog::related`] comes back empty; the
    /// ranker itself never falls back.
    pub fn recent(&self, limit: usize, exclude: Option<&ContentId>) -> Vec<&ContentRecord> {
        let mut recent: Vec<&ContentRecord> = self
            .records
            .iter()
            .filter(|record| !record.draft && Some(&record.id) != exclude)
            .collect();
        recent.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        recent.truncate(limit);
        recent
    }

    pub fn redirects(&self) -> &RedirectMap {
        &self.redirects
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use folio_core::RawContentRecord;
    use jiff::Timestamp;

    fn raw(id: &str, aliases: &[&str], tags: &[&str], published: &str) -> RawContentRecord {
        RawContentRecord {
            id: id.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            published_at: Some(published.to_string()),
            ..Default::default()
        }
    }

    async fn scenario() -> Catalog {
        let source = StaticSource::new(vec![
            raw("a", &["old-a"], &[], "2024-01-01"),
            raw("b", &[], &["x", "y"], "2024-02-01"),
            raw("c", &[], &["x"], "2024-03-01"),
        ]);
        Catalog::load(&source).await.unwrap()
    }

    #[tokio::test]
    async fn related_scenario() {
        let catalog = scenario().await;

        let related = catalog.related("c", 3).unwrap();
        let ids: Vec<&str> = related.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn related_follows_aliases() {
        let catalog = scenario().await;
        assert!(catalog.related("old-a", 3).unwrap().is_empty());
        assert!(matches!(
            catalog.related("missing", 3),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn resolve_and_get() {
        let catalog = scenario().await;

        let resolution = catalog.resolve("old-a").unwrap();
        assert!(resolution.redirect);
        assert_eq!(resolution.canonical.as_str(), "a");

        assert!(catalog.get("a").is_some());
        assert!(catalog.get("old-a").is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[tokio::test]
    async fn recent_skips_drafts_and_excluded() {
        let mut draft = raw("draft", &[], &[], "2025-01-01");
        draft.draft = true;
        let source = StaticSource::new(vec![
            raw("old", &[], &[], "2020-01-01"),
            draft,
            raw("new", &[], &[], "2024-01-01"),
            raw("mid", &[], &[], "2022-01-01"),
        ]);
        let catalog = Catalog::load(&source).await.unwrap();

        let recent: Vec<&str> = catalog.recent(10, None).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(recent, vec!["new", "mid", "old"]);

        let exclude = ContentId::new("new").unwrap();
        let recent: Vec<&str> = catalog
            .recent(1, Some(&exclude))
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(recent, vec!["mid"]);
    }

    #[tokio::test]
    async fn load_rejects_invalid_records() {
        let source = StaticSource::new(vec![
            raw("ok", &[], &[], "2024-01-01"),
            raw("bad id", &[], &[], "2024-01-01"),
        ]);
        match Catalog::load(&source).await.unwrap_err() {
            LoadError::Invalid(errors) => assert_eq!(errors.ids(), vec!["bad id"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn load_rejects_duplicate_alias() {
        let source = StaticSource::new(vec![
            raw("a", &["gone"], &[], "2024-01-01"),
            raw("b", &["gone"], &[], "2024-01-01"),
        ]);
        assert!(matches!(
            Catalog::load(&source).await.unwrap_err(),
            LoadError::Configuration(ConfigurationError::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn build_from_records() {
        let record = ContentRecord::builder()
            .id(ContentId::new("solo").unwrap())
            .published_at(Timestamp::UNIX_EPOCH)
            .build();
        let catalog = Catalog::build(vec![record]).unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.redirects().is_canonical("solo"));
    }
}
