use crate::source::SourceError;
use folio_core::{ContentId, RecordErrors};
use thiserror::Error;

/// Corrupt content metadata detected while building the redirect map.
///
/// Always fatal: startup must abort rather than serve a half-consistent
/// catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("content id '{0}' is used by more than one record")]
    DuplicateId(ContentId),
    /// An alias naming a canonical id. This is also how a redirect chain
    /// shows up: chaining needs an alias that names another record.
    #[error("alias '{alias}' of '{owner}' collides with an active content id")]
    AliasIsCanonical { alias: ContentId, owner: ContentId },
    #[error("alias '{alias}' is claimed by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: ContentId,
        first: ContentId,
        second: ContentId,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("no content matches '{0}'")]
    NotFound(String),
}

/// Why a load cycle could not produce a catalog.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Invalid(#[from] RecordErrors),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
