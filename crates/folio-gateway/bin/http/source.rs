use async_trait::async_trait;
use folio_catalog::{ContentSource, SourceError};
use folio_core::RawContentRecord;
use std::path::PathBuf;

/// Reads content records from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn parse_records(text: &str) -> Result<Vec<RawContentRecord>, SourceError> {
    serde_json::from_str(text).map_err(|e| SourceError::Malformed(e.to_string()))
}

#[async_trait]
impl ContentSource for JsonFileSource {
    async fn load_all_records(&self) -> Result<Vec<RawContentRecord>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Unreadable(format!("{}: {e}", self.path.display())))?;
        parse_records(&text)
    }
}
