use folio_core::BucketOutcome;
use std::time::Duration;

/// Answer to a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimitDecision {
    /// The request may proceed; `remaining` whole tokens are left.
    Allowed { remaining: u32 },
    /// The request should be rejected and retried after `retry_after`.
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Remaining budget, zero once limited.
    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitDecision::Allowed { remaining } => *remaining,
            RateLimitDecision::Limited { .. } => 0,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitDecision::Allowed { .. } => None,
            RateLimitDecision::Limited { retry_after } => Some(*retry_after),
        }
    }

    /// Retry delay in whole seconds, rounded up, for the `Retry-After`
    /// header.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after()
            .map(|retry| retry.as_secs_f64().ceil().max(1.0) as u64)
    }
}

impl From<BucketOutcome> for RateLimitDecision {
    fn from(outcome: BucketOutcome) -> Self {
        if outcome.allowed {
            RateLimitDecision::Allowed {
                remaining: outcome.remaining.floor().max(0.0) as u32,
            }
        } else {
            RateLimitDecision::Limited {
                retry_after: outcome.retry_after.unwrap_or_default(),
            }
        }
    }
}
