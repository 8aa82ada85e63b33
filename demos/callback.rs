//! Demonstrates observing retries
//!
//! Run with: cargo run --example callback

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rebound::{Retry, RetryPolicy, TracingCallback};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Built-in callback: every retry becomes a WARN event
    let retry = Retry::new(
        RetryPolicy::new()
            .with_attempts(4)
            .with_init_delay(Duration::from_millis(50))
            .with_callback(TracingCallback),
    );
    let outcome = retry.execute(|| Err::<(), _>("connection reset")).await;
    tracing::info!(attempts = outcome.count(), error = ?outcome.error(), "finished");

    // Closure callback: count retries and print the schedule
    let retries = Arc::new(AtomicU64::new(0));
    let retry = Retry::new(
        RetryPolicy::fixed()
            .with_attempts(3)
            .with_init_delay(Duration::from_millis(10))
            .with_seed(7)
            .with_callback({
                let retries = retries.clone();
                move |attempt: u64, delay: Duration, err: &String| {
                    retries.fetch_add(1, Ordering::Relaxed);
                    println!("attempt {} failed ({}), next in {:?}", attempt, err, delay);
                }
            }),
    );

    let mut n = 0;
    let outcome = retry
        .execute(|| {
            n += 1;
            if n < 3 {
                Err(format!("timeout #{}", n))
            } else {
                Ok(n)
            }
        })
        .await;
    tracing::info!(
        data = ?outcome.data(),
        retries = retries.load(Ordering::Relaxed),
        "closure callback done"
    );
}
