//! Per-attempt deadlines.

use super::{Directive, Plugin};
use crate::metadata::RequestSpec;
use crate::{Error, Response};
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Aborts an attempt that runs longer than `ttl`.
///
/// The timer is armed before every attempt and disarmed as soon as the
/// attempt resolves. An aborted attempt fails with [`Error::Abort`]; whether
/// it is retried is up to the other plugins.
#[derive(Debug)]
pub struct TimeoutPlugin {
    ttl: Duration,
    timer: Option<JoinHandle<()>>,
}

impl TimeoutPlugin {
    /// Creates a plugin aborting attempts after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, timer: None }
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[async_trait]
impl Plugin for TimeoutPlugin {
    async fn on_request(&mut self, req: &mut RequestSpec) {
        self.disarm();
        let handle = req.abort_handle();
        let ttl = self.ttl;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            tracing::debug!(timeout_ms = ttl.as_millis(), "Request timed out, aborting attempt");
            handle.abort();
        }));
    }

    async fn on_response(&mut self, _req: &mut RequestSpec, _res: &Response) -> Directive {
        self.disarm();
        Directive::Proceed
    }

    async fn on_error(&mut self, _req: &mut RequestSpec, _err: &Error) -> Directive {
        self.disarm();
        Directive::Proceed
    }
}

impl Drop for TimeoutPlugin {
    fn drop(&mut self) {
        self.disarm();
    }
}
