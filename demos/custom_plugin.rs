//! Example demonstrating custom plugins.
//!
//! This example shows how to:
//! - Implement the `Plugin` trait
//! - Keep per-request state inside a plugin
//! - Combine custom plugins with the built-in ones
//!
//! Run with: `cargo run --example custom_plugin`

use async_trait::async_trait;
use simpler_agent::{Directive, Error, Plugin, RequestSpec, Response};
use std::time::{Duration, Instant};

/// Retries rate-limited requests (HTTP 429) up to a fixed number of times.
struct RetryOnRateLimit {
    max: usize,
    retried: usize,
}

#[async_trait]
impl Plugin for RetryOnRateLimit {
    async fn on_error(&mut self, _req: &mut RequestSpec, err: &Error) -> Directive {
        if err.status_code() == Some(429) && self.retried < self.max {
            self.retried += 1;
            tokio::time::sleep(Duration::from_secs(1)).await;
            return Directive::Retry;
        }
        Directive::Proceed
    }
}

/// Logs how long each attempt took.
#[derive(Default)]
struct AttemptTimer {
    started: Option<Instant>,
}

#[async_trait]
impl Plugin for AttemptTimer {
    async fn on_request(&mut self, req: &mut RequestSpec) {
        println!("-> {} {}{}", req.method(), req.host(), req.path_and_query());
        self.started = Some(Instant::now());
    }

    async fn on_response(&mut self, _req: &mut RequestSpec, res: &Response) -> Directive {
        if let Some(started) = self.started.take() {
            println!("<- {} in {:?}", res.status, started.elapsed());
        }
        Directive::Proceed
    }

    async fn on_error(&mut self, _req: &mut RequestSpec, err: &Error) -> Directive {
        if let Some(started) = self.started.take() {
            println!("<- failed in {:?}: {:?}", started.elapsed(), err.status_code());
        }
        Directive::Proceed
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("simpler_agent=info,custom_plugin=info")
        .init();

    println!("=== Rate Limit Retries ===");
    match simpler_agent::get("https://httpbin.org/status/429")
        .use_plugin(AttemptTimer::default)
        .use_plugin(|| RetryOnRateLimit { max: 2, retried: 0 })
        .await
    {
        Ok(response) => println!("Success! Attempts: {}", response.attempts),
        Err(e) => println!("Failed: {}", e),
    }
    println!();

    println!("=== Custom and Built-in Plugins Together ===");
    match simpler_agent::get("https://jsonplaceholder.typicode.com/posts/1")
        .use_plugin(AttemptTimer::default)
        .timeout(Duration::from_secs(5))
        .retry(3)
        .await
    {
        Ok(response) => {
            println!("Success!");
            println!("  Attempts: {}", response.attempts);
            println!("  Latency: {:?}", response.latency);
        }
        Err(e) => println!("Failed: {}", e),
    }

    Ok(())
}
