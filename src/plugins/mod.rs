//! Lifecycle plugins and the pipeline that runs them.
//!
//! A [`Plugin`] observes three points of every attempt: before it is sent,
//! after a response arrives, and after it fails. Each point may ask for the
//! logical request to be attempted again by returning [`Directive::Retry`].
//!
//! Plugins are registered as factories. A fresh [`PluginSlot`] is built from
//! those factories when a request starts executing, so counters kept inside a
//! plugin live exactly as long as one logical request.

mod redirect;
mod retry;
mod timeout;

pub use redirect::RedirectPlugin;
pub use retry::{RetryPlugin, RetryPolicy};
pub use timeout::TimeoutPlugin;

use crate::metadata::RequestSpec;
use crate::{Error, Response};
use async_trait::async_trait;

/// Whether a plugin wants the logical request attempted again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Directive {
    /// Leave the outcome as it is.
    #[default]
    Proceed,
    /// Run another attempt.
    Retry,
}

impl Directive {
    /// Combines two directives. `Retry` wins regardless of order.
    pub fn or(self, other: Directive) -> Directive {
        if self == Directive::Retry || other == Directive::Retry {
            Directive::Retry
        } else {
            Directive::Proceed
        }
    }

    /// Returns `true` for [`Directive::Retry`].
    pub fn is_retry(self) -> bool {
        self == Directive::Retry
    }
}

/// Observer of the request lifecycle.
///
/// Every method is optional; the defaults do nothing and return
/// [`Directive::Proceed`].
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use simpler_agent::{Directive, Error, Plugin, RequestSpec};
///
/// /// Retries exactly once on 429.
/// #[derive(Default)]
/// struct RetryOnRateLimit {
///     retried: bool,
/// }
///
/// #[async_trait]
/// impl Plugin for RetryOnRateLimit {
///     async fn on_error(&mut self, _req: &mut RequestSpec, err: &Error) -> Directive {
///         if err.status_code() == Some(429) && !self.retried {
///             self.retried = true;
///             return Directive::Retry;
///         }
///         Directive::Proceed
///     }
/// }
///
/// let request = simpler_agent::get("http://api.example.com/")
///     .use_plugin(RetryOnRateLimit::default);
/// ```
#[async_trait]
pub trait Plugin: Send {
    /// Runs before every attempt, including retries.
    async fn on_request(&mut self, _req: &mut RequestSpec) {}

    /// Runs after an attempt that produced a successful response.
    async fn on_response(&mut self, _req: &mut RequestSpec, _res: &Response) -> Directive {
        Directive::Proceed
    }

    /// Runs after an attempt that failed.
    async fn on_error(&mut self, _req: &mut RequestSpec, _err: &Error) -> Directive {
        Directive::Proceed
    }
}

/// Builds a fresh plugin instance for one logical request.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// The ordered plugin instances of one logical request.
#[derive(Default)]
pub struct PluginSlot {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSlot {
    /// Instantiates every factory, preserving registration order.
    pub fn instantiate(factories: &[PluginFactory]) -> Self {
        Self {
            plugins: factories.iter().map(|factory| factory()).collect(),
        }
    }

    /// Number of plugins in the slot.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Runs `on_request` on every plugin in order.
    pub async fn on_request(&mut self, req: &mut RequestSpec) {
        for plugin in &mut self.plugins {
            plugin.on_request(req).await;
        }
    }

    /// Runs `on_response` on every plugin in order and folds the directives.
    ///
    /// Every plugin runs even after one asked for a retry.
    pub async fn on_response(&mut self, req: &mut RequestSpec, res: &Response) -> Directive {
        let mut combined = Directive::Proceed;
        for plugin in &mut self.plugins {
            combined = combined.or(plugin.on_response(req, res).await);
        }
        combined
    }

    /// Runs `on_error` on every plugin in order and folds the directives.
    ///
    /// Every plugin runs even after one asked for a retry.
    pub async fn on_error(&mut self, req: &mut RequestSpec, err: &Error) -> Directive {
        let mut combined = Directive::Proceed;
        for plugin in &mut self.plugins {
            combined = combined.or(plugin.on_error(req, err).await);
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorContext;
    use http::Method;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        answer: Directive,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for Recorder {
        async fn on_request(&mut self, _req: &mut RequestSpec) {
            self.log.lock().unwrap().push(format!("{}:request", self.name));
        }

        async fn on_error(&mut self, _req: &mut RequestSpec, _err: &Error) -> Directive {
            self.log.lock().unwrap().push(format!("{}:error", self.name));
            self.answer
        }
    }

    fn slot(answers: &[(&'static str, Directive)], log: &Arc<Mutex<Vec<String>>>) -> PluginSlot {
        let factories: Vec<PluginFactory> = answers
            .iter()
            .map(|&(name, answer)| {
                let log = log.clone();
                Box::new(move || {
                    Box::new(Recorder {
                        name,
                        answer,
                        log: log.clone(),
                    }) as Box<dyn Plugin>
                }) as PluginFactory
            })
            .collect();
        PluginSlot::instantiate(&factories)
    }

    fn spec() -> RequestSpec {
        RequestSpec::new(Method::GET, "http://h.test/").unwrap()
    }

    fn error() -> Error {
        Error::Abort {
            context: ErrorContext {
                method: Method::GET,
                host: "h.test".to_string(),
                path: "/".to_string(),
            },
        }
    }

    #[test]
    fn test_directive_or() {
        use Directive::*;
        assert_eq!(Proceed.or(Proceed), Proceed);
        assert_eq!(Retry.or(Proceed), Retry);
        assert_eq!(Proceed.or(Retry), Retry);
        assert_eq!(Retry.or(Retry), Retry);
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut slot = slot(
            &[("a", Directive::Proceed), ("b", Directive::Proceed)],
            &log,
        );
        let mut spec = spec();

        slot.on_request(&mut spec).await;
        slot.on_error(&mut spec, &error()).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:request", "b:request", "a:error", "b:error"]
        );
    }

    #[tokio::test]
    async fn test_later_proceed_does_not_cancel_earlier_retry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut slot = slot(
            &[
                ("first", Directive::Retry),
                ("second", Directive::Proceed),
                ("third", Directive::Proceed),
            ],
            &log,
        );

        let directive = slot.on_error(&mut spec(), &error()).await;

        assert_eq!(directive, Directive::Retry);
        // Every plugin still observed the error.
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_default_methods_proceed() {
        struct Silent;
        impl Plugin for Silent {}

        let factories: Vec<PluginFactory> = vec![Box::new(|| Box::new(Silent) as Box<dyn Plugin>)];
        let mut slot = PluginSlot::instantiate(&factories);
        let mut spec = spec();
        let response = Response::new(
            http::StatusCode::OK,
            http::HeaderMap::new(),
            String::new(),
            std::time::Duration::ZERO,
            1,
        );

        assert_eq!(slot.len(), 1);
        assert_eq!(slot.on_response(&mut spec, &response).await, Directive::Proceed);
        assert_eq!(slot.on_error(&mut spec, &error()).await, Directive::Proceed);
    }
}
