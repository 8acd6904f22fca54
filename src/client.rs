//! A reusable request factory.
//!
//! The [`Client`] type prefixes every path with a base URL and stamps default
//! headers and plugins onto every [`Request`] it creates. Use
//! [`ClientBuilder`] to configure one.

use crate::plugins::RetryPolicy;
use crate::{Error, Request, Result};
use http::Method;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Creates requests sharing a URL prefix, headers and resilience defaults.
///
/// The prefix is joined to each path by plain concatenation, so
/// `Client::new("http://host/api")?.get("/v1")` targets `http://host/api/v1`.
///
/// # Examples
///
/// ```no_run
/// use simpler_agent::{Client, RetryPolicy};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), simpler_agent::Error> {
/// let client = Client::builder()
///     .prefix("https://api.example.com/api")?
///     .default_header("User-Agent", "my-app/1.0")
///     .timeout(Duration::from_secs(30))
///     .retry(RetryPolicy::new(3).delay(Duration::from_millis(100)))
///     .build()?;
///
/// let user = client.get("/users/123").await?;
/// println!("User: {}", user.body["name"]);
///
/// let created = client
///     .post("/users")
///     .json(&serde_json::json!({"name": "Alice"}))
///     .await?;
/// println!("Created user with ID: {}", created.body["id"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    prefix: String,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    redirects: Option<usize>,
}

impl Client {
    /// Creates a client with only a URL prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is not a valid URL.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        Self::builder().prefix(prefix)?.build()
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The URL prefix of every request.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Creates a request for `method` on the prefix followed by `path`.
    pub fn request(&self, method: Method, path: &str) -> Request {
        let mut request = Request::new(method, format!("{}{}", self.inner.prefix, path))
            .headers(self.inner.default_headers.iter().cloned());
        if let Some(ttl) = self.inner.timeout {
            request = request.timeout(ttl);
        }
        if let Some(policy) = self.inner.retry {
            request = request.retry(policy);
        }
        if let Some(max) = self.inner.redirects {
            request = request.redirects(max);
        }
        request
    }

    /// Creates a GET request.
    pub fn get(&self, path: &str) -> Request {
        self.request(Method::GET, path)
    }

    /// Creates a HEAD request.
    pub fn head(&self, path: &str) -> Request {
        self.request(Method::HEAD, path)
    }

    /// Creates a POST request.
    pub fn post(&self, path: &str) -> Request {
        self.request(Method::POST, path)
    }

    /// Creates a PUT request.
    pub fn put(&self, path: &str) -> Request {
        self.request(Method::PUT, path)
    }

    /// Creates a PATCH request.
    pub fn patch(&self, path: &str) -> Request {
        self.request(Method::PATCH, path)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, path: &str) -> Request {
        self.request(Method::DELETE, path)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use simpler_agent::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), simpler_agent::Error> {
/// let client = ClientBuilder::new()
///     .prefix("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .retry(3)
///     .redirects(5)
///     .default_header("User-Agent", "my-app/1.0")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    prefix: Option<String>,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    redirects: Option<usize>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL prefix for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is not a valid URL.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        Url::parse(&prefix)?;
        self.prefix = Some(prefix);
        Ok(self)
    }

    /// Adds a header that will be included in all requests. Names are kept
    /// exactly as given.
    pub fn default_header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let (name, value) = (name.into(), value.to_string());
        match self.default_headers.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.default_headers.push((name, value)),
        }
        self
    }

    /// Sets a timeout applied to every attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for every request.
    pub fn retry(mut self, policy: impl Into<RetryPolicy>) -> Self {
        self.retry = Some(policy.into());
        self
    }

    /// Follows up to `max_redirects` redirects on every request.
    pub fn redirects(mut self, max_redirects: usize) -> Self {
        self.redirects = Some(max_redirects);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no prefix was provided.
    pub fn build(self) -> Result<Client> {
        let prefix = self
            .prefix
            .ok_or_else(|| Error::Configuration("URL prefix is required".to_string()))?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                prefix,
                default_headers: self.default_headers,
                timeout: self.timeout,
                retry: self.retry,
                redirects: self.redirects,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_concatenated() {
        let client = Client::new("http://www.unit-test.com/api").unwrap();
        let request = client.get("/v1");
        let spec = request.spec().unwrap();

        assert_eq!(*spec.method(), Method::GET);
        assert_eq!(spec.host(), "www.unit-test.com");
        assert_eq!(spec.path(), "/api/v1");
    }

    #[test]
    fn test_default_headers_are_applied() {
        let client = Client::builder()
            .prefix("http://h.test")
            .unwrap()
            .default_header("User-Agent", "test-agent")
            .default_header("User-Agent", "test-agent/2")
            .build()
            .unwrap();

        let request = client.delete("/x").set("X-Extra", 1);
        let spec = request.spec().unwrap();

        assert_eq!(spec.headers().len(), 2);
        assert_eq!(spec.header("User-Agent"), Some("test-agent/2"));
        assert_eq!(spec.header("X-Extra"), Some("1"));
    }

    #[test]
    fn test_missing_prefix_is_rejected() {
        let result = Client::builder().build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        assert!(matches!(
            Client::new("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
