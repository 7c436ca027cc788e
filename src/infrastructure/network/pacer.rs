// Request pacing and bounded retry schedule
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token-paced gate shared by every request a client makes.
///
/// One object owns the budget, so pacing lives in exactly one place and can
/// be swapped for a no-op in tests. A zero period also yields the no-op gate.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Option<Arc<DirectLimiter>>,
}

impl RequestPacer {
    pub fn new(period: Duration) -> Self {
        let limiter = Quota::with_period(period)
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter }
    }

    /// Gate that never waits.
    pub fn unpaced() -> Self {
        Self { limiter: None }
    }

    /// Wait until the next request slot opens.
    pub async fn pace(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

/// Bounded exponential backoff, kept pure: attempt number in, next delay out.
/// The caller owns the actual sleeping.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before the attempt after `attempt` (1-based), doubling each
    /// round; None once the attempt budget is spent.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(16);
        Some(self.base_delay * 2u32.pow(exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn backoff_doubles_until_budget_is_spent() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.backoff_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.backoff_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.backoff_after(3), None, "third attempt is the last");
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let policy = RetryPolicy::new(1, Duration::from_secs(1));
        assert_eq!(policy.backoff_after(1), None);
    }

    #[test]
    fn zero_attempts_clamps_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff_after(1), None);
    }

    #[tokio::test]
    async fn unpaced_gate_never_waits() {
        let pacer = RequestPacer::unpaced();
        let start = Instant::now();
        for _ in 0..100 {
            pacer.pace().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn zero_period_behaves_unpaced() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            pacer.pace().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn paced_gate_spaces_consecutive_calls() {
        let pacer = RequestPacer::new(Duration::from_millis(60));
        let start = Instant::now();
        pacer.pace().await;
        pacer.pace().await;
        pacer.pace().await;
        assert!(
            start.elapsed() >= Duration::from_millis(110),
            "three calls through a 60ms gate should take at least two periods, \
             took {:?}",
            start.elapsed()
        );
    }
}
