//! The execution loop turning one [`RequestSpec`] into one outcome.
//!
//! ```text
//! Requesting --> Attempting --> Resolving --+--> Done
//!     ^                                     |
//!     +------------- retry -----------------+--> Failed
//! ```
//!
//! The loop itself has no iteration limit. It ends because the built-in
//! plugins bound their own retries and redirects; a plugin that always asks
//! for a retry keeps it running forever.

use crate::metadata::RequestSpec;
use crate::plugins::{PluginFactory, PluginSlot};
use crate::transport::Transport;
use crate::{Response, Result};
use std::time::Instant;

enum State {
    Requesting,
    Attempting,
    Resolving(Result<Response>),
    Done(Response),
    Failed(crate::Error),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Requesting => "requesting",
            State::Attempting => "attempting",
            State::Resolving(_) => "resolving",
            State::Done(_) => "done",
            State::Failed(_) => "failed",
        }
    }
}

/// Runs a logical request to completion.
///
/// Plugins are instantiated here, once, and dropped when the outcome is
/// known. Errors are returned exactly as the last attempt produced them.
pub(crate) async fn execute(mut spec: RequestSpec, factories: &[PluginFactory]) -> Result<Response> {
    let start_time = Instant::now();
    let transport = Transport::new(spec.tls())?;
    // Surface header problems before any plugin or attempt runs.
    spec.header_map()?;

    let mut slot = PluginSlot::instantiate(factories);
    let mut attempts = 0;
    let mut state = State::Requesting;

    loop {
        state = match state {
            State::Requesting => {
                spec.rearm();
                slot.on_request(&mut spec).await;
                State::Attempting
            }
            State::Attempting => {
                attempts += 1;
                State::Resolving(transport.attempt(&spec, attempts).await)
            }
            State::Resolving(Ok(response)) => {
                if slot.on_response(&mut spec, &response).await.is_retry() {
                    State::Requesting
                } else {
                    State::Done(response)
                }
            }
            State::Resolving(Err(error)) => {
                tracing::warn!(
                    error = %error,
                    attempt = attempts,
                    method = %spec.method(),
                    path = %spec.path(),
                    "Request failed"
                );
                if slot.on_error(&mut spec, &error).await.is_retry() {
                    State::Requesting
                } else {
                    State::Failed(error)
                }
            }
            State::Done(mut response) => {
                response.latency = start_time.elapsed();
                response.attempts = attempts;
                return Ok(response);
            }
            State::Failed(error) => return Err(error),
        };
        tracing::trace!(state = state.name(), attempt = attempts, "Request state");
    }
}
