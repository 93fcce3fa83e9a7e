use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid content id: {0}")]
    InvalidContentId(String),
    #[error("invalid bucket spec: {0}")]
    InvalidBucketSpec(String),
}

/// Errors reported by a counter store.
///
/// None of these are fatal: callers treat every variant as "the store is
/// unavailable for this request" and degrade.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
    #[error("counter store operation timed out: {0}")]
    Timeout(String),
    #[error("counter store returned invalid data: {0}")]
    InvalidData(String),
    #[error("counter store operation failed: {0}")]
    Operation(String),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// A content record that failed validation at load time.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record '{id}' is invalid: {reason}")]
pub struct RecordError {
    /// The id as supplied by the collaborator, possibly malformed itself.
    pub id: String,
    pub reason: String,
}

impl RecordError {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Every record rejected during a load, in input order.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct RecordErrors(pub Vec<RecordError>);

impl RecordErrors {
    /// Ids of the offending records.
    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.id.as_str()).collect()
    }
}

impl Display for RecordErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} invalid content record(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_list_every_offender() {
        let errors = RecordErrors(vec![
            RecordError::new("a", "no tags"),
            RecordError::new("b:c", "bad id"),
        ]);

        assert_eq!(errors.ids(), vec!["a", "b:c"]);
        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 invalid content record(s)"));
        assert!(rendered.contains("record 'b:c' is invalid: bad id"));
    }

    #[test]
    fn timeout_is_distinguishable() {
        assert!(StoreError::Timeout("GET".into()).is_timeout());
        assert!(!StoreError::Unavailable("down".into()).is_timeout());
    }
}
