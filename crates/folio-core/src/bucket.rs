use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shape of a token bucket: how many tokens it holds and how fast it refills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketSpec {
    capacity: u32,
    refill_per_second: f64,
}

impl BucketSpec {
    /// Both the capacity and the refill rate must be positive, and an empty
    /// bucket must refill within a representable [`Duration`].
    pub fn new(capacity: u32, refill_per_second: f64) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::InvalidBucketSpec(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if !refill_per_second.is_finite() || refill_per_second <= 0.0 {
            return Err(CoreError::InvalidBucketSpec(format!(
                "refill rate must be a positive number, got {refill_per_second}"
            )));
        }
        if Duration::try_from_secs_f64(capacity as f64 / refill_per_second).is_err() {
            return Err(CoreError::InvalidBucketSpec(format!(
                "refill rate {refill_per_second} is too slow to ever refill {capacity} tokens"
            )));
        }
        Ok(Self {
            capacity,
            refill_per_second,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_per_second(&self) -> f64 {
        self.refill_per_second
    }

    /// Time an empty bucket needs to become full again.
    pub fn time_to_full(&self) -> Duration {
        saturating_secs(self.capacity as f64 / self.refill_per_second)
    }
}

fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Result of a single refill-and-consume step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketOutcome {
    pub allowed: bool,
    /// Tokens left after this step.
    pub remaining: f64,
    /// Set only when the request was rejected.
    pub retry_after: Option<Duration>,
}

impl BucketOutcome {
    /// Builds the outcome for a bucket that holds `remaining` tokens after
    /// the attempt.
    pub fn from_remaining(spec: &BucketSpec, allowed: bool, remaining: f64, cost: u32) -> Self {
        let retry_after = if allowed {
            None
        } else {
            let missing = (cost as f64 - remaining).max(0.0);
            Some(saturating_secs(missing / spec.refill_per_second))
        };
        Self {
            allowed,
            remaining,
            retry_after,
        }
    }
}

/// Token bucket state.
///
/// Time is carried as Unix milliseconds so the same state can be stored
/// verbatim in the remote store and in the in-process fallback table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBucket {
    tokens: f64,
    last_refill_ms: i64,
}

impl TokenBucket {
    /// A bucket that starts full.
    pub fn full(spec: &BucketSpec, now_ms: i64) -> Self {
        Self {
            tokens: spec.capacity as f64,
            last_refill_ms: now_ms,
        }
    }

    /// Restores persisted state, clamping tokens into `0..=capacity`.
    pub fn from_parts(spec: &BucketSpec, tokens: f64, last_refill_ms: i64) -> Self {
        Self {
            tokens: tokens.clamp(0.0, spec.capacity as f64),
            last_refill_ms,
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_refill_ms(&self) -> i64 {
        self.last_refill_ms
    }

    /// Adds the tokens accrued since the last refill, capped at capacity.
    ///
    /// A clock that moved backwards adds nothing and keeps the later mark.
    pub fn refill(&mut self, spec: &BucketSpec, now_ms: i64) {
        if now_ms <= self.last_refill_ms {
            return;
        }
        let elapsed_secs = (now_ms - self.last_refill_ms) as f64 / 1000.0;
        self.tokens = (self.tokens + elapsed_secs * spec.refill_per_second).min(spec.capacity as f64);
        self.last_refill_ms = now_ms;
    }

    /// Refills, then takes `cost` tokens if they are all available.
    ///
    /// A rejected attempt still keeps the refill so partial progress is
    /// never lost.
    pub fn try_consume(&mut self, spec: &BucketSpec, cost: u32, now_ms: i64) -> BucketOutcome {
        self.refill(spec, now_ms);

        let allowed = self.tokens >= cost as f64;
        if allowed {
            self.tokens -= cost as f64;
        }
        BucketOutcome::from_remaining(spec, allowed, self.tokens, cost)
    }
}
