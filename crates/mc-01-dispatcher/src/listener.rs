//! Response listener that feeds inbound responses into the correlation table.

use crate::dispatcher::Shared;
use crate::domain::error::CallError;
use crate::domain::pending::DeliveryOutcome;
use shared_bus::Subscription;
use shared_types::Response;
use std::sync::Weak;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Owns the dispatcher's channel subscription.
///
/// Responses are handled one at a time, so parts of one call reach the caller
/// in the order the worker emitted them.
pub(crate) struct ResponseListener {
    shared: Weak<Shared>,
    subscription: Subscription,
    shutdown: watch::Receiver<bool>,
}

impl ResponseListener {
    pub(crate) fn new(
        shared: Weak<Shared>,
        subscription: Subscription,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            shared,
            subscription,
            shutdown,
        }
    }

    /// Run the listener loop
    pub(crate) async fn run(mut self) {
        loop {
            let message = tokio::select! {
                message = self.subscription.recv() => message,
                _ = self.shutdown.changed() => {
                    debug!("Shutdown requested, stopping listener");
                    break;
                }
            };

            let Some(shared) = self.shared.upgrade() else {
                break;
            };

            let Some(message) = message else {
                warn!("Channel closed, stopping listener");
                shared
                    .table
                    .fail_all(CallError::Transport("channel closed".into()));
                break;
            };

            handle_message(&shared, &message).await;
        }
    }
}

async fn handle_message(shared: &Shared, message: &str) {
    let response: Response = match serde_json::from_str(message) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Dropping unparseable response");
            return;
        }
    };

    let Some(request_id) = response.request_id.clone() else {
        warn!(
            error = response.error.as_deref().unwrap_or_default(),
            "Dropping response without request id"
        );
        return;
    };

    let last = response.is_final();

    if !shared.verify(&response) {
        warn!(request_id = %request_id, "Response signature did not verify");
        if shared.table.fail(&request_id, CallError::InvalidSignature) && !last {
            shared.send_cancel(&request_id).await;
        }
        return;
    }

    match shared.table.deliver(&request_id, response) {
        DeliveryOutcome::Completed | DeliveryOutcome::Continued => {}
        DeliveryOutcome::Abandoned => {
            if !last {
                shared.send_cancel(&request_id).await;
            }
        }
        DeliveryOutcome::Unknown => {
            debug!(request_id = %request_id, done = last, "Ignoring response for unknown request id");
        }
    }
}
