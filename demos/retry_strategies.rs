//! Example demonstrating retry, timeout and redirect policies.
//!
//! This example shows how to:
//! - Retry immediately a fixed number of times
//! - Retry with a constant delay
//! - Retry with an exponential backoff
//! - Combine timeouts with retries
//! - Consume a request through a callback
//!
//! Run with: `cargo run --example retry_strategies`

use simpler_agent::{Error, RetryPolicy};
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("simpler_agent=info,retry_strategies=info")
        .init();

    println!("=== No Retry ===");
    match simpler_agent::get("https://jsonplaceholder.typicode.com/nonexistent").await {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Failed immediately (no retries): {}", e),
    }
    println!();

    println!("=== Immediate Retries ===");
    let response = simpler_agent::get("https://jsonplaceholder.typicode.com/posts/1")
        .retry(3)
        .await?;
    println!("Attempts: {}", response.attempts);
    println!();

    println!("=== Exponential Backoff ===");
    println!("Delays: 100ms, 200ms, 400ms");
    let start = Instant::now();
    match simpler_agent::get("https://httpbin.org/status/503")
        .retry(
            RetryPolicy::new(3)
                .delay(Duration::from_millis(100))
                .backoff(2.0),
        )
        .await
    {
        Ok(response) => println!("Response: {}", response.status),
        Err(e) => {
            println!("Failed after retries: {}", e);
            println!("Total time: {:?}", start.elapsed());
        }
    }
    println!();

    println!("=== Timeout With Constant Delay Retries ===");
    match simpler_agent::get("https://httpbin.org/delay/3")
        .timeout(Duration::from_secs(1))
        .retry(RetryPolicy::new(2).delay(Duration::from_millis(500)))
        .await
    {
        Ok(response) => println!("Success after {} attempts", response.attempts),
        Err(e) => println!("Gave up: {} (aborted: {})", e, e.is_abort()),
    }
    println!();

    println!("=== Redirects Through a Callback ===");
    let (tx, rx) = tokio::sync::oneshot::channel();
    simpler_agent::get("http://github.com/")
        .redirects(3)
        .end(move |outcome| {
            let _ = tx.send(outcome);
        });
    match rx.await {
        Ok(Ok(response)) => println!("Landed with status {}", response.status),
        Ok(Err(e)) => println!("Failed: {}", e),
        Err(_) => println!("Callback dropped"),
    }

    Ok(())
}
