//! Shared Engine Example
//!
//! One engine serving many concurrent tasks. Each run keeps its own attempt
//! count, per-error budgets and outcome.
//!
//! Run with: cargo run --example shared_engine

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rebound::{Backoff, Cancellation, Retry, RetryPolicy};

#[tokio::main]
async fn main() {
    let shutdown = Cancellation::new();
    let retry = Arc::new(Retry::new(
        RetryPolicy::new()
            .with_attempts(5)
            .with_error_attempts("rate limited", 2)
            .with_init_delay(Duration::from_millis(10))
            .with_backoff(Backoff::combine([Backoff::Fixed, Backoff::Random]))
            .with_cancellation(shutdown.clone()),
    ));

    let mut handles = Vec::new();
    for worker in 0..8u32 {
        let retry = retry.clone();
        handles.push(tokio::spawn(async move {
            let calls = Arc::new(AtomicU32::new(0));
            let outcome = retry
                .execute_async(|| {
                    let calls = calls.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        if n < worker % 4 {
                            Err("rate limited")
                        } else {
                            Ok(worker * 10)
                        }
                    }
                })
                .await;
            (worker, outcome)
        }));
    }

    for handle in handles {
        match handle.await {
            Ok((worker, outcome)) => match outcome.data() {
                Some(data) => println!(
                    "worker {}: {} after {} attempts",
                    worker,
                    data,
                    outcome.count()
                ),
                None => println!(
                    "worker {}: gave up after {} attempts ({:?})",
                    worker,
                    outcome.count(),
                    outcome.error()
                ),
            },
            Err(e) => println!("task failed: {}", e),
        }
    }

    shutdown.cancel();
    let outcome = retry.execute(|| Ok::<_, &str>(())).await;
    println!("after shutdown: {:?}", outcome.error());
}
