//! The request builder.
//!
//! A [`Request`] accumulates configuration and can then be completed once,
//! either by awaiting it or by handing it a callback with [`Request::end`].
//! Both paths consume the request, so a logical request is never executed
//! twice.

use crate::execute::execute;
use crate::metadata::RequestSpec;
use crate::plugins::{Plugin, PluginFactory, RedirectPlugin, RetryPlugin, RetryPolicy, TimeoutPlugin};
use crate::{Error, Response, Result};
use base64::Engine as _;
use http::Method;
use serde::Serialize;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A request under construction.
///
/// Builder methods never fail. A problem such as an unparsable URL or an
/// unserializable body is remembered and returned when the request runs.
///
/// # Examples
///
/// ```no_run
/// use simpler_agent::RetryPolicy;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), simpler_agent::Error> {
/// let response = simpler_agent::put("https://api.example.com/people/1")
///     .set("Authorization", "Bearer abc123")
///     .query([("notify", "true")])
///     .json(&serde_json::json!({"first": "Dorothea", "last": "Brook"}))
///     .timeout(Duration::from_secs(5))
///     .retry(RetryPolicy::new(3).delay(Duration::from_millis(100)).backoff(2.0))
///     .redirects(2)
///     .await?;
///
/// println!("{}", response.body["result"]);
/// # Ok(())
/// # }
/// ```
pub struct Request {
    spec: Result<RequestSpec>,
    plugins: Vec<PluginFactory>,
}

impl Request {
    /// Creates a request for `method` on `url`.
    pub fn new(method: Method, url: impl AsRef<str>) -> Self {
        Self {
            spec: RequestSpec::new(method, url.as_ref()),
            plugins: Vec::new(),
        }
    }

    fn with_spec(mut self, f: impl FnOnce(&mut RequestSpec) -> Result<()>) -> Self {
        if let Ok(spec) = &mut self.spec {
            if let Err(e) = f(spec) {
                self.spec = Err(e);
            }
        }
        self
    }

    /// Sets a header. Names are kept exactly as given; setting the same name
    /// again replaces the earlier value.
    ///
    /// `X-Token` and `x-token` are stored as two entries. Header names are
    /// case-insensitive on the wire, so both are sent as values of one
    /// header.
    pub fn set(self, name: impl Into<String>, value: impl ToString) -> Self {
        let (name, value) = (name.into(), value.to_string());
        self.with_spec(|spec| {
            spec.set_header(name, value);
            Ok(())
        })
    }

    /// Sets several headers at once.
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        headers
            .into_iter()
            .fold(self, |request, (name, value)| request.set(name, value))
    }

    /// Sets HTTP basic authentication.
    pub fn auth(self, username: &str, password: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        self.set("Authorization", format!("Basic {}", encoded))
    }

    /// Merges query parameters. A key set again replaces the earlier value.
    pub fn query<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let params: Vec<(String, String)> = params
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self.with_spec(|spec| {
            for (key, value) in params {
                spec.set_query(key, value);
            }
            Ok(())
        })
    }

    /// Merges query parameters from an encoded string such as `"a=1&b=2"`.
    pub fn query_str(self, query: &str) -> Self {
        let params: Vec<(String, String)> =
            url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect();
        self.query(params)
    }

    /// Sends `body` as-is. No content type is added.
    pub fn send(self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.with_spec(|spec| {
            spec.body = body;
            Ok(())
        })
    }

    /// Serializes `body` as JSON and sets `Content-Length` and
    /// `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        let body = serde_json::to_vec(body).map_err(|e| Error::Serialization(e.to_string()));
        self.with_spec(|spec| {
            let body = body?;
            spec.set_header("Content-Length".to_string(), body.len().to_string());
            spec.set_header("Content-Type".to_string(), "application/json".to_string());
            spec.body = body;
            Ok(())
        })
    }

    /// Sets the client certificate (PEM).
    pub fn cert(self, pem: impl Into<Vec<u8>>) -> Self {
        let pem = pem.into();
        self.with_spec(|spec| {
            spec.tls.cert = Some(pem);
            Ok(())
        })
    }

    /// Sets the client private key (PEM).
    pub fn key(self, pem: impl Into<Vec<u8>>) -> Self {
        let pem = pem.into();
        self.with_spec(|spec| {
            spec.tls.key = Some(pem);
            Ok(())
        })
    }

    /// Adds a trusted root certificate (PEM).
    pub fn ca(self, pem: impl Into<Vec<u8>>) -> Self {
        let pem = pem.into();
        self.with_spec(|spec| {
            spec.tls.ca.push(pem);
            Ok(())
        })
    }

    /// Registers a plugin factory. The factory runs once per execution and
    /// plugins see lifecycle events in registration order.
    pub fn use_plugin<F, P>(mut self, factory: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Plugin + 'static,
    {
        self.plugins
            .push(Box::new(move || Box::new(factory()) as Box<dyn Plugin>));
        self
    }

    /// Aborts any attempt that takes longer than `ttl`.
    pub fn timeout(self, ttl: Duration) -> Self {
        self.use_plugin(move || TimeoutPlugin::new(ttl))
    }

    /// Retries 5xx responses, connection failures and timeouts.
    ///
    /// Accepts a retry count or a full [`RetryPolicy`].
    pub fn retry(self, policy: impl Into<RetryPolicy>) -> Self {
        let policy = policy.into();
        self.use_plugin(move || RetryPlugin::new(policy))
    }

    /// Follows up to `max_redirects` `300`/`301` redirects.
    pub fn redirects(self, max_redirects: usize) -> Self {
        self.use_plugin(move || RedirectPlugin::new(max_redirects))
    }

    /// Returns the request specification, or the configuration error that
    /// will be reported when the request runs.
    pub fn spec(&self) -> std::result::Result<&RequestSpec, &Error> {
        self.spec.as_ref()
    }

    /// Runs the request to completion.
    pub async fn execute(self) -> Result<Response> {
        let spec = self.spec?;
        execute(spec, &self.plugins).await
    }

    /// Runs the request on the Tokio runtime and passes the outcome to `done`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() {
    /// simpler_agent::get("http://api.example.com/status").end(|outcome| match outcome {
    ///     Ok(response) => println!("status {}", response.status),
    ///     Err(err) => eprintln!("failed: {}", err),
    /// });
    /// # }
    /// ```
    pub fn end<F>(self, done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Response>) + Send + 'static,
    {
        tokio::spawn(async move { done(self.execute().await) })
    }
}

impl IntoFuture for Request {
    type Output = Result<Response>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.execute())
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("spec", &self.spec)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
