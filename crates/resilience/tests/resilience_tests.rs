//! Integration tests for resilience patterns

use measvre_resilience::{retry_async, ResilienceError, RetryPolicy, Timeout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_retry_around_timeouts() {
    let policy = RetryPolicy::new(3).with_initial_delay(Duration::from_millis(1));
    let timeout = Timeout::new(Duration::from_millis(20));
    let calls = AtomicUsize::new(0);

    // First attempt hangs past the deadline, second one answers quickly
    let result = retry_async(
        &policy,
        |e: &ResilienceError| matches!(e, ResilienceError::Timeout(_)),
        || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            timeout
                .execute(async move {
                    if n == 0 {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                    }
                    n
                })
                .await
        },
    )
    .await;

    assert_eq!(result.ok(), Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_is_not_retried_when_classified_permanent() {
    let policy = RetryPolicy::new(4).with_initial_delay(Duration::from_millis(1));
    let timeout = Timeout::new(Duration::from_millis(5));
    let calls = AtomicUsize::new(0);

    let result = retry_async(&policy, |_: &ResilienceError| false, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        timeout
            .execute(tokio::time::sleep(Duration::from_millis(100)))
            .await
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_backoff_sequence_is_monotonic_without_jitter() {
    let policy = RetryPolicy::new(6)
        .with_initial_delay(Duration::from_millis(50))
        .with_max_delay(Duration::from_secs(1))
        .with_jitter(false);

    let delays: Vec<Duration> = (1..6).map(|a| policy.delay_for_attempt(a)).collect();
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(delays[0], Duration::from_millis(50));
}
