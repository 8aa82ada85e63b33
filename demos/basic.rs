//! Basic Retry Example
//!
//! Demonstrates the everyday ways of retrying an operation:
//! - Retrying with the default policy
//! - Bounding attempts globally and per error
//! - Refusing to retry some errors
//! - Giving up at a deadline
//!
//! Run with: cargo run --example basic

use std::time::Duration;

use rebound::{Backoff, Cancellation, Retry, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DbError {
    Busy,
    Deadlock,
    BadQuery,
}

// ==================== Default Policy ====================

/// Example 1: succeed on the first attempt with every knob at its default
async fn example_default() {
    println!("\n=== Example 1: Default Policy ===");

    let outcome = rebound::execute_with_default(|| Ok::<_, DbError>("lee")).await;
    println!(
        "  data = {:?}, attempts = {}, waited {:?}",
        outcome.data(),
        outcome.count(),
        outcome.elapsed()
    );
}

// ==================== Budgets ====================

/// Example 2: a deadlock may only be retried once, other errors up to five times
async fn example_budgets() {
    println!("\n=== Example 2: Attempt Budgets ===");

    let retry = Retry::new(
        RetryPolicy::new()
            .with_attempts(5)
            .with_error_attempts(DbError::Deadlock, 1)
            .with_init_delay(Duration::from_millis(20))
            .with_backoff(Backoff::combine([Backoff::Fixed, Backoff::Random]))
            .with_detail(true),
    );

    let mut calls = 0;
    let outcome = retry
        .execute(|| {
            calls += 1;
            println!("  Attempt {}", calls);
            if calls == 1 {
                Err::<(), _>(DbError::Busy)
            } else {
                Err(DbError::Deadlock)
            }
        })
        .await;

    match outcome.error() {
        Some(err) => println!("  Gave up after {} attempts: {}", outcome.count(), err),
        None => println!("  Unexpected success"),
    }
    println!("  Errors seen: {:?}", outcome.attempt_errors());
}

// ==================== Predicate ====================

/// Example 3: a malformed query is never retried
async fn example_predicate() {
    println!("\n=== Example 3: Retry Predicate ===");

    let retry = Retry::new(
        RetryPolicy::new()
            .with_retry_if(|err: &DbError| *err != DbError::BadQuery)
            .with_init_delay(Duration::from_millis(10)),
    );

    let outcome = retry.execute(|| Err::<(), _>(DbError::BadQuery)).await;
    let attempts = outcome.count();
    if let Err(err) = outcome.into_result() {
        println!("  attempts = {}, error = {}", attempts, err);
    }
}

// ==================== Deadline ====================

/// Example 4: slow backoff cut short by a deadline
async fn example_deadline() {
    println!("\n=== Example 4: Deadline ===");

    let retry = Retry::new(
        RetryPolicy::new()
            .with_attempts(10)
            .with_init_delay(Duration::from_millis(50))
            .with_backoff(Backoff::Exponential)
            .with_cancellation(Cancellation::new().with_timeout(Duration::from_secs(1))),
    );

    let outcome = retry.execute(|| Err::<(), _>(DbError::Busy)).await;
    println!(
        "  attempts = {}, error = {:?}, elapsed = {:?}",
        outcome.count(),
        outcome.error(),
        outcome.elapsed()
    );
}

#[tokio::main]
async fn main() {
    println!("======================================");
    println!("         Basic Retry Example          ");
    println!("======================================");

    example_default().await;
    example_budgets().await;
    example_predicate().await;
    example_deadline().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
