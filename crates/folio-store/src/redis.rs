use async_trait::async_trait;
use folio_core::store::Result;
use folio_core::{BucketOutcome, BucketSpec, CounterStore, StoreError, TokenBucket};
use jiff::Timestamp;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult, Script};
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Upper bound on a single store round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

/// Longest a bucket hash is kept after its last use.
const MAX_BUCKET_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Refill-and-consume for one bucket, executed atomically by Redis.
///
/// State lives in a hash with `tokens` and `last_refill_ms`; returns
/// `{allowed, tokens}` with tokens as a string so fractions survive the
/// Lua-to-integer reply conversion.
const TAKE_TOKENS_SCRIPT: &str = r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local cost = tonumber(ARGV[3])
local now_ms = tonumber(ARGV[4])
local ttl_ms = tonumber(ARGV[5])

local state = redis.call("HMGET", key, "tokens", "last_refill_ms")
local tokens = tonumber(state[1])
local last_refill_ms = tonumber(state[2])

if tokens == nil or last_refill_ms == nil then
    tokens = capacity
    last_refill_ms = now_ms
end

if now_ms > last_refill_ms then
    tokens = math.min(capacity, tokens + ((now_ms - last_refill_ms) / 1000.0) * rate)
    last_refill_ms = now_ms
end

local allowed = 0
if tokens >= cost then
    tokens = tokens - cost
    allowed = 1
end

redis.call("HSET", key, "tokens", tostring(tokens), "last_refill_ms", tostring(last_refill_ms))
redis.call("PEXPIRE", key, ttl_ms)

return {allowed, tostring(tokens)}
"#;

fn map_redis_error(operation: &str, err: redis::RedisError) -> StoreError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        StoreError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StoreError::Unavailable(message)
    } else {
        StoreError::Operation(message)
    }
}

/// Twice the time to refill from empty, between one second and
/// [`MAX_BUCKET_TTL`].
fn bucket_ttl_ms(spec: &BucketSpec) -> u64 {
    let ttl = spec
        .time_to_full()
        .saturating_mul(2)
        .clamp(Duration::from_secs(1), MAX_BUCKET_TTL);
    ttl.as_millis() as u64
}

/// A Redis-backed [`CounterStore`].
///
/// Uses a [`ConnectionManager`], which multiplexes requests over one
/// connection and reconnects in the background after failures. Every call
/// is wrapped in a timeout; an elapsed timeout is reported as
/// [`StoreError::Timeout`].
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    timeout: Duration,
    take_tokens: Script,
}

impl Debug for RedisCounterStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Wraps an established connection.
    pub fn new(conn: ConnectionManager, timeout: Duration) -> Self {
        Self {
            conn,
            timeout,
            take_tokens: Script::new(TAKE_TOKENS_SCRIPT),
        }
    }

    /// Opens a connection to `redis_url`, giving up after `timeout`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use folio_store::{RedisCounterStore, DEFAULT_TIMEOUT};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = RedisCounterStore::connect("redis://127.0.0.1:6379", DEFAULT_TIMEOUT).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {e}")))?;

        let conn = match tokio::time::timeout(timeout, client.get_connection_manager()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(map_redis_error("failed to connect to Redis", e)),
            Err(_) => {
                return Err(StoreError::Timeout(format!(
                    "connecting to Redis took longer than {timeout:?}"
                )))
            }
        };

        debug!(timeout = ?timeout, "connected to Redis counter store");
        Ok(Self::new(conn, timeout))
    }

    /// Runs one store operation under the configured timeout.
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        with_timeout(operation, self.timeout, fut).await
    }
}

/// An elapsed `timeout` is reported as [`StoreError::Timeout`], the same
/// way callers see an unreachable server.
async fn with_timeout<T, F>(operation: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(operation, error = %e, "Redis operation failed");
            Err(map_redis_error(operation, e))
        }
        Err(_) => {
            warn!(operation, timeout = ?timeout, "Redis operation timed out");
            Err(StoreError::Timeout(format!(
                "{operation}: no reply within {timeout:?}"
            )))
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        trace!(key, "INCR");
        let mut conn = self.conn.clone();
        self.bounded("INCR", conn.incr::<_, _, i64>(key, 1)).await
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        trace!(key, "GET");
        let mut conn = self.conn.clone();
        self.bounded("GET", conn.get::<_, Option<i64>>(key)).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        trace!(count = keys.len(), "MGET");
        let mut conn = self.conn.clone();
        let values: Vec<Option<i64>> = self
            .bounded("MGET", async {
                redis::cmd("MGET").arg(keys).query_async(&mut conn).await
            })
            .await?;

        if values.len() != keys.len() {
            return Err(StoreError::InvalidData(format!(
                "MGET returned {} values for {} keys",
                values.len(),
                keys.len()
            )));
        }
        Ok(values)
    }

    async fn record_event(&self, history_key: &str, at: Timestamp, event_id: &str) -> Result<()> {
        trace!(key = history_key, event_id, "ZADD");
        let mut conn = self.conn.clone();
        self.bounded("ZADD", async {
            redis::cmd("ZADD")
                .arg(history_key)
                .arg(at.as_second())
                .arg(event_id)
                .query_async::<i64>(&mut conn)
                .await
        })
        .await
        .map(|_| ())
    }

    async fn count_since(&self, history_key: &str, since: Timestamp) -> Result<i64> {
        trace!(key = history_key, since = %since, "ZCOUNT");
        let mut conn = self.conn.clone();
        self.bounded("ZCOUNT", async {
            redis::cmd("ZCOUNT")
                .arg(history_key)
                .arg(since.as_second())
                .arg("+inf")
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn prune_older_than(&self, history_key: &str, cutoff: Timestamp) -> Result<u64> {
        trace!(key = history_key, cutoff = %cutoff, "ZREMRANGEBYSCORE");
        let mut conn = self.conn.clone();
        // "(" makes the upper bound exclusive: entries exactly at the cutoff stay.
        let upper = format!("({}", cutoff.as_second());
        self.bounded("ZREMRANGEBYSCORE", async {
            redis::cmd("ZREMRANGEBYSCORE")
                .arg(history_key)
                .arg("-inf")
                .arg(upper)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn take_tokens(
        &self,
        bucket_key: &str,
        spec: &BucketSpec,
        cost: u32,
        now: Timestamp,
    ) -> Result<BucketOutcome> {
        trace!(key = bucket_key, cost, "take tokens");
        let mut conn = self.conn.clone();
        let ttl_ms = bucket_ttl_ms(spec);

        let (allowed, tokens): (i64, String) = self
            .bounded("EVALSHA take_tokens", async {
                self.take_tokens
                    .key(bucket_key)
                    .arg(spec.capacity())
                    .arg(spec.refill_per_second())
                    .arg(cost)
                    .arg(now.as_millisecond())
                    .arg(ttl_ms)
                    .invoke_async(&mut conn)
                    .await
            })
            .await?;

        let tokens: f64 = tokens.parse().map_err(|e| {
            StoreError::InvalidData(format!(
                "bucket '{bucket_key}' returned non-numeric tokens '{tokens}': {e}"
            ))
        })?;

        // clamp into 0..=capacity in case the hash was edited by hand
        let tokens = TokenBucket::from_parts(spec, tokens, now.as_millisecond()).tokens();
        Ok(BucketOutcome::from_remaining(spec, allowed == 1, tokens, cost))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("PING", async {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    #[test]
    fn connection_refusal_is_unavailable() {
        let err = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(
            map_redis_error("GET", err),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn timed_out_io_is_timeout() {
        let err = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out",
        ));
        assert!(map_redis_error("GET", err).is_timeout());
    }

    #[test]
    fn bucket_ttl_is_bounded() {
        assert_eq!(bucket_ttl_ms(&BucketSpec::new(5, 1.0).unwrap()), 10_000);
        assert_eq!(bucket_ttl_ms(&BucketSpec::new(1, 1000.0).unwrap()), 1_000);
        let slow = BucketSpec::new(1, 1e-9).unwrap();
        assert_eq!(bucket_ttl_ms(&slow), MAX_BUCKET_TTL.as_millis() as u64);
    }

    #[tokio::test]
    async fn pending_operation_times_out() {
        let timeout = Duration::from_millis(20);
        let err = with_timeout("GET", timeout, std::future::pending::<RedisResult<i64>>())
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn silent_server_times_out_within_bound() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and hold every connection without ever replying
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(100);
        let started = Instant::now();
        let err = match RedisCounterStore::connect(&format!("redis://{addr}"), timeout).await {
            Ok(store) => store.incr("views:post").await.unwrap_err(),
            Err(e) => e,
        };

        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(2));
        server.abort();
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails_without_panicking() {
        // Port 1 is privileged and never runs Redis in test environments.
        let result = RedisCounterStore::connect("redis://127.0.0.1:1", DEFAULT_TIMEOUT).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalid_url_is_unavailable() {
        let err = RedisCounterStore::connect("not a url", DEFAULT_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
