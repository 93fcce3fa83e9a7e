use clap::{Parser, ValueEnum};
use folio_gateway::RelatedFallback;
use folio_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

pub const LISTEN_ADDR_ENV: &str = "FOLIO_LISTEN_ADDR";
pub const CONTENT_FILE_ENV: &str = "FOLIO_CONTENT_FILE";
pub const STORE_BACKEND_ENV: &str = "FOLIO_STORE_BACKEND";
pub const REDIS_URL_ENV: &str = "FOLIO_REDIS_URL";
pub const STORE_TIMEOUT_MS_ENV: &str = "FOLIO_STORE_TIMEOUT_MS";
pub const STORE_RECONNECT_MS_ENV: &str = "FOLIO_STORE_RECONNECT_MS";
pub const HISTORY_RETENTION_DAYS_ENV: &str = "FOLIO_HISTORY_RETENTION_DAYS";
pub const COUNTER_WINDOW_HOURS_ENV: &str = "FOLIO_COUNTER_WINDOW_HOURS";
pub const LOCAL_BUCKETS_ENV: &str = "FOLIO_LOCAL_BUCKETS";
pub const DEFAULT_CAPACITY_ENV: &str = "FOLIO_RATE_LIMIT_CAPACITY";
pub const DEFAULT_REFILL_ENV: &str = "FOLIO_RATE_LIMIT_REFILL_PER_SECOND";
pub const VIEWS_CAPACITY_ENV: &str = "FOLIO_VIEWS_CAPACITY";
pub const VIEWS_REFILL_ENV: &str = "FOLIO_VIEWS_REFILL_PER_SECOND";
pub const SHARES_CAPACITY_ENV: &str = "FOLIO_SHARES_CAPACITY";
pub const SHARES_REFILL_ENV: &str = "FOLIO_SHARES_REFILL_PER_SECOND";
pub const RELATED_LIMIT_ENV: &str = "FOLIO_RELATED_LIMIT";
pub const RELATED_FALLBACK_ENV: &str = "FOLIO_RELATED_FALLBACK";
pub const FEATURED_BONUS_ENV: &str = "FOLIO_FEATURED_BONUS";
pub const ARCHIVED_PENALTY_ENV: &str = "FOLIO_ARCHIVED_PENALTY";
pub const LOG_FORMAT_ENV: &str = "FOLIO_LOG_FORMAT";
pub const LOG_LEVEL_ENV: &str = "FOLIO_LOG_LEVEL";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackendArg {
    #[value(name = "redis")]
    Redis,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for StoreBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackendArg::Redis => write!(f, "redis"),
            StoreBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelatedFallbackArg {
    #[value(name = "none")]
    None,
    #[value(name = "recent")]
    Recent,
}

impl From<RelatedFallbackArg> for RelatedFallback {
    fn from(arg: RelatedFallbackArg) -> Self {
        match arg {
            RelatedFallbackArg::None => RelatedFallback::None,
            RelatedFallbackArg::Recent => RelatedFallback::Recent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "compact")]
    Compact,
    #[value(name = "json")]
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "folio-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// JSON array of content records.
    #[arg(long, env = CONTENT_FILE_ENV)]
    pub content_file: PathBuf,

    #[arg(
        long,
        env = STORE_BACKEND_ENV,
        value_enum,
        default_value_t = StoreBackendArg::Redis
    )]
    pub store: StoreBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("store", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = STORE_TIMEOUT_MS_ENV, default_value_t = 250)]
    pub store_timeout_ms: u64,

    /// How often to retry an unreachable Redis at startup; 0 never retries.
    #[arg(long, env = STORE_RECONNECT_MS_ENV, default_value_t = 5_000)]
    pub store_reconnect_ms: u64,

    #[arg(long, env = HISTORY_RETENTION_DAYS_ENV, default_value_t = 90)]
    pub history_retention_days: u32,

    #[arg(long, env = COUNTER_WINDOW_HOURS_ENV, default_value_t = 24)]
    pub counter_window_hours: u32,

    /// Buckets kept in memory while the store is unreachable.
    #[arg(long, env = LOCAL_BUCKETS_ENV, default_value_t = folio_ratelimit::DEFAULT_LOCAL_CAPACITY)]
    pub local_buckets: u64,

    #[arg(long, env = DEFAULT_CAPACITY_ENV, default_value_t = 60)]
    pub rate_limit_capacity: u32,

    #[arg(long, env = DEFAULT_REFILL_ENV, default_value_t = 1.0)]
    pub rate_limit_refill_per_second: f64,

    #[arg(long, env = VIEWS_CAPACITY_ENV)]
    pub views_capacity: Option<u32>,

    #[arg(long, env = VIEWS_REFILL_ENV)]
    pub views_refill_per_second: Option<f64>,

    #[arg(long, env = SHARES_CAPACITY_ENV, default_value_t = 10)]
    pub shares_capacity: u32,

    #[arg(long, env = SHARES_REFILL_ENV, default_value_t = 0.1)]
    pub shares_refill_per_second: f64,

    #[arg(long, env = RELATED_LIMIT_ENV, default_value_t = folio_catalog::DEFAULT_RELATED_LIMIT)]
    pub related_limit: usize,

    #[arg(
        long,
        env = RELATED_FALLBACK_ENV,
        value_enum,
        default_value_t = RelatedFallbackArg::None
    )]
    pub related_fallback: RelatedFallbackArg,

    #[arg(long, env = FEATURED_BONUS_ENV, default_value_t = 0.5)]
    pub featured_bonus: f64,

    #[arg(long, env = ARCHIVED_PENALTY_ENV, default_value_t = 0.5)]
    pub archived_penalty: f64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    #[arg(long, env = LOG_LEVEL_ENV, default_value = "info")]
    pub log_level: LevelFilter,
}
