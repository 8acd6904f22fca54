//! Error types for HTTP requests.
//!
//! Every error produced by a network attempt carries an [`ErrorContext`]
//! describing which request failed, so the rendered message always reads
//! `"<reason> method=<M> host=<H> path=<P> status=<S|none>"`. Errors that
//! arrived with a response additionally keep the full decoded [`Response`].

use crate::metadata::RequestSpec;
use crate::Response;
use http::{Method, StatusCode};
use std::fmt;

/// The request an error belongs to.
///
/// `path` includes the encoded query string, exactly as it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// The HTTP method of the failed attempt.
    pub method: Method,
    /// The host the attempt was sent to.
    pub host: String,
    /// The path and query of the attempt.
    pub path: String,
}

impl ErrorContext {
    pub(crate) fn from_spec(spec: &RequestSpec) -> Self {
        Self {
            method: spec.method().clone(),
            host: spec.host().to_string(),
            path: spec.path_and_query(),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "method={} host={} path={}",
            self.method, self.host, self.path
        )
    }
}

/// The main error type for HTTP requests.
///
/// The first three variants are the terminal outcomes of a network attempt;
/// the rest are raised before any attempt is made and are never retried.
///
/// # Examples
///
/// ```no_run
/// use simpler_agent::Error;
///
/// # async fn example() {
/// match simpler_agent::get("http://api.example.com/users/1").await {
///     Ok(response) => println!("user: {}", response.body),
///     Err(Error::Response { response, .. }) => {
///         eprintln!("HTTP error {}: {}", response.status, response.text);
///     }
///     Err(Error::Abort { .. }) => eprintln!("timed out"),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The server answered with a status of 300 or above.
    #[error("Bad response from server. {context} status={}\n{}", .response.status.as_u16(), .response.text)]
    Response {
        /// The request that failed.
        context: ErrorContext,
        /// The decoded response, including its raw text and headers.
        response: Box<Response>,
    },

    /// The attempt never reached a response (DNS failure, refused connection,
    /// broken body stream, undecodable body).
    #[error("Connection Error: {message} {context} status=none")]
    Connection {
        /// The request that failed.
        context: ErrorContext,
        /// The underlying transport message.
        message: String,
    },

    /// The attempt was cancelled through its [`AbortHandle`](crate::AbortHandle),
    /// typically by the timeout plugin.
    #[error("Request aborted. {context} status=none")]
    Abort {
        /// The request that was cancelled.
        context: ErrorContext,
    },

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns `true` for 5xx responses and for attempts that ended without
    /// a status (connection failures and aborts).
    ///
    /// # Examples
    ///
    /// ```
    /// use simpler_agent::{Error, ErrorContext};
    /// use http::Method;
    ///
    /// let err = Error::Connection {
    ///     context: ErrorContext {
    ///         method: Method::GET,
    ///         host: "example.com".to_string(),
    ///         path: "/".to_string(),
    ///     },
    ///     message: "connection refused".to_string(),
    /// };
    ///
    /// assert!(err.is_retryable());
    /// assert!(err.status().is_none());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Response { response, .. } => response.status.is_server_error(),
            Error::Connection { .. } | Error::Abort { .. } => true,
            Error::Configuration(_) | Error::InvalidUrl(_) | Error::Serialization(_) => false,
        }
    }

    /// Returns the HTTP status code. Only `Response` errors have one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Response { response, .. } => Some(response.status),
            _ => None,
        }
    }

    /// Returns the numeric HTTP status code. Only `Response` errors have one.
    pub fn status_code(&self) -> Option<u16> {
        self.status().map(|status| status.as_u16())
    }

    /// Returns the response that caused this error, if one arrived.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Response { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the raw decoded response text if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        self.response().map(|response| response.text.as_str())
    }

    /// Returns the request context for errors produced by a network attempt.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Response { context, .. }
            | Error::Connection { context, .. }
            | Error::Abort { context } => Some(context),
            _ => None,
        }
    }

    /// Returns `true` if the attempt was cancelled.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    /// Returns `true` if the attempt never reached a response.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

/// A specialized `Result` type for HTTP requests.
pub type Result<T> = std::result::Result<T, Error>;
