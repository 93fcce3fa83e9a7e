mod content;
mod counters;
mod health;

pub use content::{get_content_handler, get_related_handler};
pub use counters::{batch_views_handler, record_share_handler, record_view_handler, stats_handler};
pub use health::health_handler;
