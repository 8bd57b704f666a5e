//! Sliding-window rate limiter for outbound reasoning calls
//!
//! Admits at most `max_requests` calls in any rolling `window`. Callers take
//! turns through a queue mutex held for the whole acquire, including the
//! wait. The timestamps sit behind their own mutex that is only held while
//! pruning or recording, so `status()` never waits on a sleeping caller.

use cqa_common::config::RateLimitConfig;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Snapshot of limiter occupancy
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RateLimitStatus {
    pub requests_in_window: usize,
    pub max_requests: usize,
    pub window_ms: u64,
    /// Zero when a slot is free now
    pub next_slot_in_ms: u64,
}

/// Process-wide sliding-window limiter, shared via `Arc`
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    max_requests: usize,
    window: Duration,
    queue: Mutex<()>,
    requests: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            queue: Mutex::new(()),
            requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    /// Wait until a slot is free, then claim it
    pub async fn acquire(&self) {
        let _turn = self.queue.lock().await;

        loop {
            let wait_time = {
                let mut requests = self.requests.lock().await;
                let now = Instant::now();
                self.prune(&mut requests, now);

                if requests.len() < self.max_requests {
                    requests.push_back(now);
                    return;
                }

                let wait_time = match requests.front() {
                    Some(oldest) => (*oldest + self.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                };

                tracing::debug!(
                    in_window = requests.len(),
                    wait_ms = wait_time.as_millis() as u64,
                    "Reasoning rate limit reached, waiting"
                );
                wait_time
            };

            tokio::time::sleep(wait_time).await;
        }
    }

    /// Current occupancy without claiming a slot
    pub async fn status(&self) -> RateLimitStatus {
        let mut requests = self.requests.lock().await;
        let now = Instant::now();
        self.prune(&mut requests, now);

        let next_slot_in = if requests.len() < self.max_requests {
            Duration::ZERO
        } else {
            requests
                .front()
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                .unwrap_or(Duration::ZERO)
        };

        RateLimitStatus {
            requests_in_window: requests.len(),
            max_requests: self.max_requests,
            window_ms: self.window.as_millis() as u64,
            next_slot_in_ms: next_slot_in.as_millis() as u64,
        }
    }

    fn prune(&self, requests: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = requests.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                requests.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_limit_without_waiting() {
        let limiter = SlidingWindowRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        let status = limiter.status().await;
        assert_eq!(status.requests_in_window, 3);
        assert_eq!(status.next_slot_in_ms, 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_oldest_to_expire() {
        let limiter = SlidingWindowRateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(4)).await;
        limiter.acquire().await;
        limiter.acquire().await;

        // Third call waits until the first timestamp leaves the window
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_exceed_window() {
        let limiter = Arc::new(SlidingWindowRateLimiter::new(3, Duration::from_secs(1)));
        let mut tasks = JoinSet::new();

        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move {
                limiter.acquire().await;
                Instant::now()
            });
        }

        let mut admitted = Vec::new();
        while let Some(result) = tasks.join_next().await {
            admitted.push(result.unwrap());
        }
        admitted.sort();

        assert_eq!(admitted.len(), 10);
        for pair in admitted.windows(4) {
            assert!(
                pair[3].duration_since(pair[0]) >= Duration::from_secs(1),
                "more than 3 calls admitted inside one window"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_answers_while_a_caller_waits() {
        let limiter = Arc::new(SlidingWindowRateLimiter::new(1, Duration::from_secs(60)));
        limiter.acquire().await;

        let waiting = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        let status = tokio::time::timeout(Duration::from_secs(1), limiter.status())
            .await
            .expect("status blocked behind a waiting acquire");
        assert_eq!(status.requests_in_window, 1);
        assert!(status.next_slot_in_ms > 0);
        assert!(!waiting.is_finished());

        waiting.await.unwrap();
        assert_eq!(limiter.status().await.requests_in_window, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_frees_after_window() {
        let limiter = SlidingWindowRateLimiter::new(1, Duration::from_millis(500));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_millis(500)).await;

        let status = limiter.status().await;
        assert_eq!(status.requests_in_window, 0);
        assert_eq!(status.next_slot_in_ms, 0);
    }
}
