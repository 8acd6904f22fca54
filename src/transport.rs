//! A single network attempt.

use crate::decode::decode_body;
use crate::metadata::RequestSpec;
use crate::tls::TlsConfig;
use crate::{Error, ErrorContext, Response, Result};
use std::time::Instant;

/// Performs one request/response cycle per call.
///
/// Redirects and decompression are left to the caller; idle connections are
/// not kept around between attempts. HTTP/1 header names go out title-cased.
pub(crate) struct Transport {
    http_client: reqwest::Client,
}

impl Transport {
    /// Builds a transport carrying the given TLS material.
    pub(crate) fn new(tls: &TlsConfig) -> Result<Self> {
        let builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .http1_title_case_headers();
        let http_client = tls
            .apply(builder)?
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Runs one attempt of the request.
    ///
    /// Succeeds with the decoded response when the status is below 300.
    /// Otherwise fails with [`Error::Response`], [`Error::Connection`] or,
    /// when the request's abort handle fires first, [`Error::Abort`].
    pub(crate) async fn attempt(&self, spec: &RequestSpec, attempt: usize) -> Result<Response> {
        let url = spec.url()?;
        let headers = spec.header_map()?;
        let context = ErrorContext::from_spec(spec);

        tracing::debug!(
            method = %spec.method(),
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let mut request = self
            .http_client
            .request(spec.method().clone(), url)
            .headers(headers);
        if !spec.body().is_empty() {
            request = request.body(spec.body().to_vec());
        }

        let abort = spec.abort_handle();
        let started = Instant::now();
        let exchange = async {
            let response = request.send().await.map_err(|e| connection_error(&context, e))?;
            let status = response.status();
            let headers = response.headers().clone();
            let raw = response
                .bytes()
                .await
                .map_err(|e| connection_error(&context, e))?;
            let decoded = decode_body(raw, &headers).map_err(|e| Error::Connection {
                context: context.clone(),
                message: e.to_string(),
            })?;
            let text = String::from_utf8_lossy(&decoded).into_owned();
            Ok::<_, Error>(Response::new(status, headers, text, started.elapsed(), attempt))
        };

        let response = tokio::select! {
            biased;
            _ = abort.aborted() => {
                return Err(Error::Abort { context: context.clone() });
            }
            outcome = exchange => outcome?,
        };

        tracing::info!(
            status = response.status.as_u16(),
            latency_ms = response.latency.as_millis(),
            attempt = attempt,
            "Received HTTP response"
        );

        if response.status.as_u16() >= 300 {
            if response.status.is_client_error() {
                tracing::error!(
                    status = response.status.as_u16(),
                    response = %response.text,
                    "Client error (4xx)"
                );
            } else if response.status.is_server_error() {
                tracing::warn!(
                    status = response.status.as_u16(),
                    response = %response.text,
                    "Server error (5xx)"
                );
            }
            return Err(Error::Response {
                context,
                response: Box::new(response),
            });
        }

        Ok(response)
    }
}

fn connection_error(context: &ErrorContext, error: reqwest::Error) -> Error {
    Error::Connection {
        context: context.clone(),
        message: error_chain(&error),
    }
}

/// Joins an error with its sources, since `reqwest` keeps the useful part
/// ("connection refused", DNS failures) in the source chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
