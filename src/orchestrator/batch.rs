//! Fixed-size batch admission.
//!
//! Items are started `concurrency` at a time. Batch N+1 starts only after
//! every future of batch N has settled, plus a fixed delay. This is admission
//! control to stay under third-party limits, not a rate limiter.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

/// Run `f` over `items` in sequential batches, returning results in input
/// order. A `concurrency` of zero is treated as one.
pub async fn run_batches<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    delay: Duration,
    mut f: F,
) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let concurrency = concurrency.max(1);
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut items = items.into_iter().peekable();
    let mut batch = 0usize;

    while items.peek().is_some() {
        batch += 1;
        let futures: Vec<Fut> = items.by_ref().take(concurrency).map(&mut f).collect();
        debug!(batch, size = futures.len(), total, "Starting batch");
        results.extend(join_all(futures).await);

        if items.peek().is_some() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound_and_order() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_batches((0..10).collect(), 3, Duration::from_millis(500), |i: u32| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // later items finish first inside a batch
                tokio::time::sleep(Duration::from_millis(100 - u64::from(i) * 5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i * 2
            }
        })
        .await;

        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_batches_only() {
        let start = Instant::now();
        let results = run_batches(vec![1, 2, 3, 4], 2, Duration::from_millis(500), |i| async move {
            i
        })
        .await;
        assert_eq!(results, vec![1, 2, 3, 4]);
        // two batches, one gap
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_empty_and_zero_concurrency() {
        let empty: Vec<u8> = run_batches(Vec::new(), 3, Duration::ZERO, |i: u8| async move { i }).await;
        assert!(empty.is_empty());

        let results = run_batches(vec![1, 2], 0, Duration::ZERO, |i: u8| async move { i + 1 }).await;
        assert_eq!(results, vec![2, 3]);
    }
}
