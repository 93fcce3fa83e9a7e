use async_trait::async_trait;
use folio_core::RawContentRecord;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("content source could not be read: {0}")]
    Unreadable(String),
    #[error("content source is malformed: {0}")]
    Malformed(String),
}

/// The content collaborator: hands over every record in one call at load
/// time. This crate never reads files or databases itself.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn load_all_records(&self) -> Result<Vec<RawContentRecord>, SourceError>;
}

/// A source over records that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawContentRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawContentRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn load_all_records(&self) -> Result<Vec<RawContentRecord>, SourceError> {
        Ok(self.records.clone())
    }
}
