//! The resolved description of a request and its cancellation handle.

use crate::tls::TlsConfig;
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Cancels the attempt currently in flight.
///
/// Every attempt gets a fresh handle, so aborting a handle obtained for one
/// attempt never affects a later one.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    /// Cancels the attempt this handle belongs to.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Returns `true` if [`abort`](Self::abort) was called.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) async fn aborted(&self) {
        self.token.cancelled().await
    }
}

/// Everything needed to perform one attempt of a request.
///
/// A `RequestSpec` is assembled by [`Request`](crate::Request) and frozen once
/// execution starts. Plugins see it mutably, but only the location
/// (host, port and path) can change, through
/// [`set_location`](Self::set_location).
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) scheme: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) tls: TlsConfig,
    pub(crate) abort: AbortHandle,
}

impl RequestSpec {
    /// Parses `url` into a request specification.
    ///
    /// Query parameters already present in the URL are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, has no host, or uses a
    /// scheme other than `http` or `https`.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        let mut spec = Self {
            method,
            scheme: String::new(),
            host: String::new(),
            port: 0,
            path: String::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
            tls: TlsConfig::default(),
            abort: AbortHandle::default(),
        };
        spec.apply_location(&url)?;
        spec.query = url.query_pairs().into_owned().collect();
        Ok(spec)
    }

    fn apply_location(&mut self, url: &Url) -> Result<()> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Error::Configuration(format!(
                "Unsupported protocol: {}",
                scheme
            )));
        }
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::Configuration(format!("URL has no host: {}", url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::Configuration(format!("URL has no port: {}", url)))?;

        self.scheme = scheme.to_string();
        self.host = host.to_string();
        self.port = port;
        self.path = url.path().to_string();
        Ok(())
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URL scheme, `http` or `https`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The path, without query.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Headers in insertion order. Names are case sensitive.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a header by its exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The TLS material used for this request.
    pub fn tls(&self) -> &TlsConfig {
        &self.tls
    }

    /// Returns the handle that cancels the current attempt.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Rewrites the request location from a `Location` header value.
    ///
    /// Relative locations are resolved against the current URL and keep its
    /// scheme. Host, port and path are replaced. The query is kept, and
    /// pairs carried by the location are merged into it.
    pub fn set_location(&mut self, location: &str) -> Result<()> {
        let target = self.url()?.join(location)?;
        self.apply_location(&target)?;
        for (key, value) in target.query_pairs().into_owned() {
            upsert(&mut self.query, key, value);
        }
        Ok(())
    }

    /// The percent-encoded query string, without the leading `?`.
    ///
    /// Spaces are written as `%20`.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(key, value)| format!("{}={}", escape(key), escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The path followed by the encoded query string, if any.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        format!("{}?{}", self.path, self.query_string())
    }

    /// The full URL of the next attempt.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))?;
        url.set_path(&self.path);
        if !self.query.is_empty() {
            url.set_query(Some(&self.query_string()));
        }
        Ok(url)
    }

    /// Converts the headers for the wire.
    ///
    /// HTTP header names are case-insensitive on the wire, so names differing
    /// only in case become separate values of one header. Both values are
    /// sent; neither replaces the other.
    pub(crate) fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
            map.append(name, value);
        }
        Ok(map)
    }

    /// Sets a header, replacing a previous value stored under the exact same name.
    pub(crate) fn set_header(&mut self, name: String, value: String) {
        upsert(&mut self.headers, name, value);
    }

    /// Sets a query parameter, replacing a previous value for the same key.
    pub(crate) fn set_query(&mut self, key: String, value: String) {
        upsert(&mut self.query, key, value);
    }

    /// Gives the next attempt a fresh abort handle.
    pub(crate) fn rearm(&mut self) {
        self.abort = AbortHandle::default();
    }
}

/// Form-encodes `input`, then swaps `+` for `%20`. A literal `+` is already
/// written as `%2B`, so every remaining `+` stands for a space.
fn escape(input: &str) -> String {
    url::form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn upsert(entries: &mut Vec<(String, String)>, key: String, value: String) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_url_parts() {
        let spec = RequestSpec::new(Method::GET, "http://www.unit-test.com/api/v1?q=foo").unwrap();

        assert_eq!(spec.scheme(), "http");
        assert_eq!(spec.host(), "www.unit-test.com");
        assert_eq!(spec.port(), 80);
        assert_eq!(spec.path(), "/api/v1");
        assert_eq!(spec.query(), &[("q".to_string(), "foo".to_string())]);
        assert_eq!(spec.path_and_query(), "/api/v1?q=foo");
    }

    #[test]
    fn test_https_default_port() {
        let spec = RequestSpec::new(Method::PUT, "https://www.unit-test.com/api/v1").unwrap();
        assert_eq!(spec.port(), 443);
        assert_eq!(spec.url().unwrap().as_str(), "https://www.unit-test.com/api/v1");
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let result = RequestSpec::new(Method::GET, "ftp://www.unit-test.com/file");
        assert!(matches!(result, Err(Error::Configuration(_))));

        let result = RequestSpec::new(Method::GET, "not a url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_query_last_write_wins() {
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/p?a=1").unwrap();
        spec.set_query("b".to_string(), "2".to_string());
        spec.set_query("a".to_string(), "3".to_string());

        assert_eq!(spec.path_and_query(), "/p?a=3&b=2");
    }

    #[test]
    fn test_headers_are_case_sensitive() {
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/").unwrap();
        spec.set_header("X-Token".to_string(), "one".to_string());
        spec.set_header("x-token".to_string(), "two".to_string());
        spec.set_header("X-Token".to_string(), "three".to_string());

        assert_eq!(spec.headers().len(), 2);
        assert_eq!(spec.header("X-Token"), Some("three"));
        assert_eq!(spec.header("x-token"), Some("two"));

        let map = spec.header_map().unwrap();
        let values: Vec<_> = map.get_all("x-token").iter().collect();
        assert_eq!(values, vec!["three", "two"]);
    }

    #[test]
    fn test_invalid_header_is_a_configuration_error() {
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/").unwrap();
        spec.set_header("bad header".to_string(), "v".to_string());
        assert!(matches!(spec.header_map(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_set_location_absolute() {
        let mut spec = RequestSpec::new(Method::GET, "http://unit-test.com/api?x=1").unwrap();
        spec.set_location("https://www.unit-test.com:8443/api/").unwrap();

        assert_eq!(spec.scheme(), "https");
        assert_eq!(spec.host(), "www.unit-test.com");
        assert_eq!(spec.port(), 8443);
        assert_eq!(spec.path(), "/api/");
        assert_eq!(spec.path_and_query(), "/api/?x=1");
    }

    #[test]
    fn test_set_location_merges_query() {
        let mut spec = RequestSpec::new(Method::GET, "http://unit-test.com/api?x=1&page=1").unwrap();
        spec.set_query("foo".to_string(), "bar".to_string());
        spec.set_location("/moved?page=2").unwrap();

        assert_eq!(spec.path_and_query(), "/moved?x=1&page=2&foo=bar");
    }

    #[test]
    fn test_query_spaces_are_percent_encoded() {
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/p?q=a%20b").unwrap();
        spec.set_query("plus".to_string(), "1+1".to_string());
        spec.set_query("tag".to_string(), "x y&z".to_string());

        assert_eq!(spec.path_and_query(), "/p?q=a%20b&plus=1%2B1&tag=x%20y%26z");
        assert_eq!(
            spec.url().unwrap().as_str(),
            "http://h.test/p?q=a%20b&plus=1%2B1&tag=x%20y%26z"
        );
    }

    #[test]
    fn test_set_location_relative() {
        let mut spec = RequestSpec::new(Method::GET, "http://unit-test.com:8080/api/v1").unwrap();
        spec.set_location("/moved?page=2").unwrap();

        assert_eq!(spec.host(), "unit-test.com");
        assert_eq!(spec.port(), 8080);
        assert_eq!(spec.path_and_query(), "/moved?page=2");
    }

    #[test]
    fn test_rearm_replaces_abort_handle() {
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/").unwrap();
        let first = spec.abort_handle();
        spec.rearm();
        first.abort();

        assert!(first.is_aborted());
        assert!(!spec.abort_handle().is_aborted());
    }
}
