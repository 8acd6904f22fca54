//! # simpler-agent - A light-weight HTTP request client
//!
//! Build a request, attach resilience plugins (timeout, retry, redirects) and
//! await it. Responses are decompressed, parsed as JSON when possible and
//! keep their raw text for debugging.
//!
//! ## Quick Start
//!
//! ```no_run
//! use simpler_agent::RetryPolicy;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simpler_agent::Error> {
//!     let response = simpler_agent::get("https://api.example.com/users/123")
//!         .query([("expand", "teams")])
//!         .timeout(Duration::from_secs(5))
//!         .retry(RetryPolicy::new(3).delay(Duration::from_millis(100)).backoff(2.0))
//!         .await?;
//!     println!("User: {}", response.body["name"]);
//!
//!     let created = simpler_agent::post("https://api.example.com/users")
//!         .json(&serde_json::json!({"name": "Alice"}))
//!         .await?;
//!     println!("Created user with ID: {}", created.body["id"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Awaitable or callback** - Await a [`Request`] directly, or pass a callback to [`Request::end`]
//! - **Plugins** - Timeout, retry and redirect policies are [`Plugin`]s; register your own with [`Request::use_plugin`]
//! - **Decoding** - `gzip`, `deflate` and `br` bodies are decompressed; malformed JSON never fails a request
//! - **Rich errors** - Every error names the method, host, path and status of the failed attempt
//! - **Automatic logging** - Structured logging with `tracing`
//!
//! ## Error Handling
//!
//! ```no_run
//! use simpler_agent::Error;
//!
//! # async fn example() {
//! match simpler_agent::get("http://api.example.com/endpoint").await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(Error::Response { response, .. }) => {
//!         eprintln!("HTTP error {}: {}", response.status, response.text);
//!     }
//!     Err(Error::Connection { message, .. }) => eprintln!("Unreachable: {}", message),
//!     Err(Error::Abort { .. }) => eprintln!("Timed out"),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # }
//! ```

mod client;
mod decode;
mod error;
mod execute;
pub mod metadata;
pub mod plugins;
mod request;
mod response;
pub mod tls;
mod transport;

pub use client::{Client, ClientBuilder};
pub use error::{Error, ErrorContext, Result};
pub use metadata::{AbortHandle, RequestSpec};
pub use plugins::{Directive, Plugin, PluginFactory, PluginSlot, RetryPolicy};
pub use request::Request;
pub use response::Response;
pub use tls::TlsConfig;

use http::Method;

/// Creates a GET request.
pub fn get(url: &str) -> Request {
    Request::new(Method::GET, url)
}

/// Creates a HEAD request.
pub fn head(url: &str) -> Request {
    Request::new(Method::HEAD, url)
}

/// Creates a POST request.
pub fn post(url: &str) -> Request {
    Request::new(Method::POST, url)
}

/// Creates a PUT request.
pub fn put(url: &str) -> Request {
    Request::new(Method::PUT, url)
}

/// Creates a PATCH request.
pub fn patch(url: &str) -> Request {
    Request::new(Method::PATCH, url)
}

/// Creates a DELETE request.
pub fn delete(url: &str) -> Request {
    Request::new(Method::DELETE, url)
}
