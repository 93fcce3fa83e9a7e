//! HTTP surface for content resolution, related content and usage
//! counters.

pub mod app;
pub mod client;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::{App, SHARES_ROUTE, VIEWS_ROUTE};
pub use client::ClientId;
pub use error::{AppError, Result};
pub use state::{AppState, RelatedFallback};
