//! Following `300`/`301` redirects.

use super::{Directive, Plugin};
use crate::metadata::RequestSpec;
use crate::Error;
use async_trait::async_trait;
use http::header::LOCATION;
use http::StatusCode;

/// Follows `300 Multiple Choices` and `301 Moved Permanently` responses that
/// carry a `Location` header, up to a fixed number of times per logical
/// request.
///
/// Once the limit is reached the redirect response is surfaced as-is.
#[derive(Debug, Clone)]
pub struct RedirectPlugin {
    max_redirects: usize,
    redirects: usize,
}

impl RedirectPlugin {
    /// Creates a plugin following at most `max_redirects` redirects.
    pub fn new(max_redirects: usize) -> Self {
        Self {
            max_redirects,
            redirects: 0,
        }
    }

    /// Number of redirects followed so far.
    pub fn redirects(&self) -> usize {
        self.redirects
    }
}

#[async_trait]
impl Plugin for RedirectPlugin {
    async fn on_error(&mut self, req: &mut RequestSpec, err: &Error) -> Directive {
        let Some(response) = err.response() else {
            return Directive::Proceed;
        };
        if response.status != StatusCode::MULTIPLE_CHOICES
            && response.status != StatusCode::MOVED_PERMANENTLY
        {
            return Directive::Proceed;
        }
        let Some(location) = response.header(LOCATION.as_str()).filter(|l| !l.is_empty()) else {
            return Directive::Proceed;
        };
        if self.redirects >= self.max_redirects {
            tracing::warn!(
                max_redirects = self.max_redirects,
                location = %location,
                "Redirect limit reached"
            );
            return Directive::Proceed;
        }

        if let Err(e) = req.set_location(location) {
            tracing::warn!(error = %e, location = %location, "Ignoring invalid redirect location");
            return Directive::Proceed;
        }
        self.redirects += 1;
        tracing::info!(
            status = response.status.as_u16(),
            location = %location,
            redirect = self.redirects,
            "Following redirect"
        );
        Directive::Retry
    }
}
