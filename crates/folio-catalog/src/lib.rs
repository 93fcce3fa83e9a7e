//! Content catalog: identifier resolution and related-content ranking.
//!
//! A [`Catalog`] is built once per load cycle from the full record set and
//! is immutable afterwards, so it can be shared behind an `Arc` by every
//! request without locking.
//!
//! # Example
//!
//! ```rust
//! use folio_catalog::Catalog;
//! use folio_core::{ContentId, ContentRecord};
//! use jiff::Timestamp;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let post = ContentRecord::builder()
//!     .id(ContentId::new("new-post")?)
//!     .aliases(vec![ContentId::new("old-post")?])
//!     .tags(vec!["rust".to_string()])
//!     .published_at(Timestamp::UNIX_EPOCH)
//!     .build();
//!
//! let catalog = Catalog::build(vec![post])?;
//! let resolution = catalog.resolve("old-post")?;
//! assert!(resolution.redirect);
//! assert_eq!(resolution.canonical.as_str(), "new-post");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod redirect;
pub mod related;
pub mod source;

pub use catalog::Catalog;
pub use error::{ConfigurationError, LoadError, ResolveError};
pub use redirect::{RedirectMap, Resolution};
pub use related::{rank, RankWeights, RelatedRanker, DEFAULT_RELATED_LIMIT};
pub use source::{ContentSource, SourceError, StaticSource};
