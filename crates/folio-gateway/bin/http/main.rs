mod cli;
mod source;

use crate::cli::{StoreBackendArg, CLI};
use crate::source::JsonFileSource;
use clap::Parser;
use folio_catalog::{Catalog, RankWeights, RelatedRanker};
use folio_core::{BucketSpec, CounterStore};
use folio_counters::UsageCounters;
use folio_gateway::{App, AppState, SHARES_ROUTE, VIEWS_ROUTE};
use folio_ratelimit::{LocalBuckets, RateLimiter, RouteLimits};
use folio_store::{InMemoryCounterStore, OfflineCounterStore, RedisCounterStore, SwappableCounterStore};
use jiff::SignedDuration;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    folio_telemetry::init(config.log_format.into(), config.log_level)?;

    info!(
        listen_addr = %config.listen_addr,
        content_file = %config.content_file.display(),
        store_backend = %config.store,
        "starting folio gateway"
    );

    // invalid records and redirect conflicts abort startup
    let ranker = RelatedRanker::new(
        RankWeights::builder()
            .featured_bonus(config.featured_bonus)
            .archived_penalty(config.archived_penalty)
            .build(),
    );
    let catalog = Catalog::load(&JsonFileSource::new(&config.content_file))
        .await?
        .with_ranker(ranker);

    let store = connect_store(&config).await;

    let counters = UsageCounters::builder()
        .store(store.clone())
        .retention(SignedDuration::from_hours(
            i64::from(config.history_retention_days) * 24,
        ))
        .window(SignedDuration::from_hours(i64::from(config.counter_window_hours)))
        .build();

    let limiter = RateLimiter::builder()
        .store(store.clone())
        .limits(route_limits(&config)?)
        .local(LocalBuckets::new(config.local_buckets))
        .build();

    let state = AppState::builder()
        .catalog(Arc::new(catalog))
        .counters(counters)
        .limiter(limiter)
        .store(store)
        .related_limit(config.related_limit)
        .related_fallback(config.related_fallback.into())
        .build();

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "serving HTTP");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Connects the counter store. An unreachable Redis leaves the process
/// running with counters hidden and local rate limiting until a background
/// retry gets through.
async fn connect_store(config: &CLI) -> Arc<dyn CounterStore> {
    let timeout = Duration::from_millis(config.store_timeout_ms);

    match (config.store, config.redis_url.clone()) {
        (StoreBackendArg::InMemory, _) => Arc::new(InMemoryCounterStore::new()),
        (StoreBackendArg::Redis, None) => {
            warn!("no redis url configured, running without a counter store");
            Arc::new(OfflineCounterStore::new("no redis url configured"))
        }
        (StoreBackendArg::Redis, Some(url)) => match RedisCounterStore::connect(&url, timeout).await {
            Ok(store) => {
                if let Err(e) = store.ping().await {
                    warn!(error = %e, "redis did not answer PING, continuing anyway");
                }
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "failed to connect to redis, running without a counter store");
                let store = SwappableCounterStore::new(Arc::new(OfflineCounterStore::new(e.to_string())));
                if config.store_reconnect_ms > 0 {
                    let interval = Duration::from_millis(config.store_reconnect_ms);
                    store.reconnect_in_background(interval, move || {
                        let url = url.clone();
                        async move {
                            RedisCounterStore::connect(&url, timeout)
                                .await
                                .map(|redis| Arc::new(redis) as Arc<dyn CounterStore>)
                        }
                    });
                }
                Arc::new(store)
            }
        },
    }
}

fn route_limits(config: &CLI) -> anyhow::Result<RouteLimits> {
    let default_spec = BucketSpec::new(config.rate_limit_capacity, config.rate_limit_refill_per_second)?;
    let views_spec = BucketSpec::new(
        config.views_capacity.unwrap_or(default_spec.capacity()),
        config
            .views_refill_per_second
            .unwrap_or(default_spec.refill_per_second()),
    )?;
    let shares_spec = BucketSpec::new(config.shares_capacity, config.shares_refill_per_second)?;

    Ok(RouteLimits::builder()
        .default_spec(default_spec)
        .build()
        .with_route(VIEWS_ROUTE, views_spec)
        .with_route(SHARES_ROUTE, shares_spec))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
