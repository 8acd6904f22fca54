//! Response wrapper that preserves both the parsed body and the raw text.
//!
//! The [`Response`] type carries the decoded response text together with its
//! JSON interpretation, the status code, headers and timing information.

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A decoded HTTP response.
///
/// The body has already been decompressed according to its
/// `content-encoding`. `body` holds the JSON interpretation of `text`, or
/// [`Value::Null`] when the text is not valid JSON.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), simpler_agent::Error> {
/// let response = simpler_agent::get("http://api.example.com/users/123").await?;
///
/// println!("User: {}", response.body["name"]);
/// println!("Request took {:?}", response.latency);
/// println!("Status: {}", response.status);
/// println!("Attempts: {}", response.attempts);
///
/// if response.body.is_null() {
///     println!("Not JSON: {}", response.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The decoded response body as text.
    pub text: String,

    /// The response body parsed as JSON, `Value::Null` if parsing failed.
    pub body: Value,

    /// The total latency of the logical request, including every retry and
    /// redirect. A response carried by an error reports only the latency of
    /// its own attempt.
    pub latency: Duration,

    /// The number of attempts made to produce this response.
    pub attempts: usize,
}

impl Response {
    /// Creates a new `Response`, parsing `text` as JSON.
    ///
    /// Malformed JSON never fails; it leaves `body` as `Value::Null`.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        text: String,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
            latency,
            attempts,
        }
    }

    /// Returns the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Deserializes the raw text into a typed value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use simpler_agent::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// #[derive(serde::Deserialize)]
    /// struct Answer {
    ///     result: String,
    /// }
    ///
    /// let response = Response::new(
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     r#"{"result": "OK"}"#.to_string(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let answer: Answer = response.json().unwrap();
    /// assert_eq!(answer.result, "OK");
    /// ```
    pub fn json<T>(&self) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(&self.text)
    }

    /// Returns `true` if the request required more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a reference to a header value by name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use simpler_agent::Response;
    /// # use http::{HeaderMap, StatusCode, HeaderValue};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("application/json"));
    ///
    /// let response = Response::new(
    ///     StatusCode::OK,
    ///     headers,
    ///     String::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// assert_eq!(
    ///     response.header("content-type").unwrap(),
    ///     "application/json"
    /// );
    /// assert!(response.body.is_null());
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str) -> Response {
        Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            text.to_string(),
            Duration::ZERO,
            1,
        )
    }

    #[test]
    fn test_json_body_is_parsed() {
        let response = response(r#"{"result": "OK"}"#);
        assert_eq!(response.body["result"], "OK");
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_malformed_json_keeps_text() {
        let response = response("{not json");
        assert!(response.body.is_null());
        assert_eq!(response.text, "{not json");
        assert!(response.json::<Value>().is_err());
    }

    #[test]
    fn test_was_retried() {
        let mut response = response("");
        assert!(!response.was_retried());
        response.attempts = 3;
        assert!(response.was_retried());
    }
}
