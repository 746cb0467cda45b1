//! # Response Router
//!
//! Worker-side receive loop. For every inbound request it verifies the
//! signature, looks up the processor, runs the processor chain in its own task
//! and emits one signed response per produced result.
//!
//! ## Terminal Rejections
//!
//! | Condition | `error` |
//! |-----------|---------|
//! | unparseable envelope | `malformed request: …` |
//! | bad signature | `invalid signature` |
//! | no processor | `unknown method` |
//! | id already running | `duplicate request id` |
//! | processor failure | the processor's message |
//!
//! Each rejection is a single response with `success = false, done = true`.
//! The processor is never invoked for the first four.

use crate::processor::{Processor, Produced};
use crate::registry::ProcessorRegistry;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{ChannelError, MessageChannel, Subscription};
use shared_types::{
    CallerMessage, Cancel, EnvelopeSigner, ProcessorError, ProtocolError, Request, RequestId,
    Response, Signer,
};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Errors installing a router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The channel's inbound subscription is unavailable.
    #[error("cannot subscribe to channel: {0}")]
    Channel(#[from] ChannelError),
}

/// Statistics for the router
#[derive(Debug, Default)]
pub struct RouterStats {
    /// Inbound messages received
    pub messages_received: AtomicU64,
    /// Responses emitted
    pub responses_sent: AtomicU64,
    /// Requests rejected before reaching a processor
    pub requests_rejected: AtomicU64,
    /// Chains that ended with a processor error
    pub processor_failures: AtomicU64,
    /// Chains stopped by a cancel envelope
    pub chains_cancelled: AtomicU64,
    /// Chains that emitted their final result
    pub chains_completed: AtomicU64,
}

struct RouterShared {
    registry: ProcessorRegistry,
    channel: Arc<dyn MessageChannel>,
    signer: Arc<dyn Signer>,
    /// Cancel triggers of running chains. Dropping one stops its chain.
    in_flight: DashMap<RequestId, oneshot::Sender<()>>,
    stats: RouterStats,
}

/// A router installed on a channel.
pub struct ResponseRouter {
    shared: Arc<RouterShared>,
    shutdown_tx: watch::Sender<bool>,
    stopped: watch::Receiver<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ResponseRouter {
    /// Subscribe to `channel` and start serving `registry`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn install(
        registry: ProcessorRegistry,
        channel: Arc<dyn MessageChannel>,
        signer: Arc<dyn Signer>,
    ) -> Result<Self, RouterError> {
        let subscription = channel.subscribe()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (stopped_tx, stopped) = watch::channel(false);

        info!(methods = ?registry.methods(), "Installing response router");

        let shared = Arc::new(RouterShared {
            registry,
            channel,
            signer,
            in_flight: DashMap::new(),
            stats: RouterStats::default(),
        });

        let task = tokio::spawn(receive_loop(
            Arc::clone(&shared),
            subscription,
            shutdown_rx,
            stopped_tx,
        ));

        Ok(Self {
            shared,
            shutdown_tx,
            stopped,
            task: Mutex::new(Some(task)),
        })
    }

    /// Router statistics.
    pub fn stats(&self) -> &RouterStats {
        &self.shared.stats
    }

    /// Number of processor chains currently running.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.len()
    }

    /// Wait until the receive loop stops (channel closed or shutdown).
    pub async fn closed(&self) {
        let mut stopped = self.stopped.clone();
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }

    /// Stop receiving and cancel every running chain.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        self.shared.in_flight.clear();
        info!("Response router shut down");
    }
}

impl Drop for ResponseRouter {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn receive_loop(
    shared: Arc<RouterShared>,
    mut subscription: Subscription,
    mut shutdown: watch::Receiver<bool>,
    stopped: watch::Sender<bool>,
) {
    loop {
        let message = tokio::select! {
            message = subscription.recv() => message,
            _ = shutdown.changed() => {
                debug!("Shutdown requested, stopping router");
                break;
            }
        };
        let Some(message) = message else {
            info!("Channel closed, stopping router");
            break;
        };

        shared.stats.messages_received.fetch_add(1, Ordering::Relaxed);
        shared.handle_message(&message).await;
    }

    shared.in_flight.clear();
    let _ = stopped.send(true);
}

impl RouterShared {
    async fn handle_message(self: &Arc<Self>, message: &str) {
        match parse_envelope(message) {
            Ok(CallerMessage::Request(request)) => self.handle_request(request).await,
            Ok(CallerMessage::Cancel(cancel)) => self.handle_cancel(cancel),
            Err((request_id, reason)) => {
                warn!(request_id = ?request_id, reason = %reason, "Malformed inbound message");
                self.reject(request_id, ProtocolError::MalformedRequest(reason))
                    .await;
            }
        }
    }

    async fn handle_request(self: &Arc<Self>, request: Request) {
        let request_id = request.request_id.clone();

        // Signature is checked before method lookup
        if !self.signer.verify_envelope(&request) {
            warn!(request_id = %request_id, method = %request.method, "Request signature did not verify");
            self.reject(Some(request_id), ProtocolError::InvalidSignature)
                .await;
            return;
        }

        let Some(processor) = self.registry.get(&request.method) else {
            warn!(request_id = %request_id, method = %request.method, "Unknown method");
            self.reject(Some(request_id), ProtocolError::UnknownMethod)
                .await;
            return;
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        match self.in_flight.entry(request_id.clone()) {
            Entry::Occupied(_) => {
                warn!(request_id = %request_id, "Request id already in flight");
                self.reject(Some(request_id), ProtocolError::DuplicateRequestId)
                    .await;
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(cancel_tx);
            }
        }

        debug!(request_id = %request_id, method = %request.method, "Dispatching to processor");
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            shared.run_chain(processor, request, cancel_rx).await;
        });
    }

    fn handle_cancel(&self, cancel: Cancel) {
        if !self.signer.verify_envelope(&cancel) {
            warn!(request_id = %cancel.cancel, "Ignoring cancel with invalid signature");
            self.stats.requests_rejected.fetch_add(1, Ordering::Relaxed);
            return;
        }

        match self.in_flight.remove(&cancel.cancel) {
            Some((_, trigger)) => {
                let _ = trigger.send(());
                self.stats.chains_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %cancel.cancel, "Cancelled processor chain");
            }
            None => {
                debug!(request_id = %cancel.cancel, "Cancel for request not in flight");
            }
        }
    }

    /// Run a processor chain to completion, error or cancellation.
    ///
    /// Cancellation is only observed while a step is computing, so a response
    /// is never cut off mid-send.
    async fn run_chain(
        &self,
        processor: Arc<dyn Processor>,
        request: Request,
        mut cancelled: oneshot::Receiver<()>,
    ) {
        let Request {
            method,
            request_id,
            payload,
            ..
        } = request;

        let mut outcome = tokio::select! {
            outcome = guarded(processor.process(&method, payload)) => outcome,
            _ = &mut cancelled => {
                debug!(request_id = %request_id, "Chain stopped before first result");
                return;
            }
        };

        let mut parts = 0u32;
        loop {
            let Produced {
                result,
                continuation,
            } = match outcome {
                Ok(produced) => produced,
                Err(e) => {
                    error!(request_id = %request_id, method = %method, parts = parts, error = %e, "Processor failed");
                    self.stats.processor_failures.fetch_add(1, Ordering::Relaxed);
                    self.in_flight.remove(&request_id);
                    self.emit(Response::failure(Some(request_id), e.to_string()))
                        .await;
                    return;
                }
            };

            let done = continuation.is_none();
            parts += 1;
            if done {
                self.in_flight.remove(&request_id);
                self.stats.chains_completed.fetch_add(1, Ordering::Relaxed);
            }

            if !self
                .emit(Response::part(request_id.clone(), result, done))
                .await
            {
                self.in_flight.remove(&request_id);
                return;
            }

            let Some(next) = continuation else {
                debug!(request_id = %request_id, method = %method, parts = parts, done = true, "Chain finished");
                return;
            };

            outcome = tokio::select! {
                outcome = guarded(next) => outcome,
                _ = &mut cancelled => {
                    debug!(request_id = %request_id, parts = parts, "Chain stopped by cancel");
                    return;
                }
            };
        }
    }

    async fn reject(&self, request_id: Option<RequestId>, error: ProtocolError) {
        self.stats.requests_rejected.fetch_add(1, Ordering::Relaxed);
        self.emit(Response::failure(request_id, error.to_string()))
            .await;
    }

    /// Sign and send one response. Returns false if it could not be sent.
    async fn emit(&self, mut response: Response) -> bool {
        if let Err(e) = self.signer.seal(&mut response) {
            error!(request_id = ?response.request_id, error = %e, "Failed to sign response");
            return false;
        }
        let message = match serde_json::to_string(&response) {
            Ok(message) => message,
            Err(e) => {
                error!(request_id = ?response.request_id, error = %e, "Failed to encode response");
                return false;
            }
        };
        match self.channel.send(message).await {
            Ok(()) => {
                self.stats.responses_sent.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = ?response.request_id, success = response.success, done = response.done, "Sent response");
                true
            }
            Err(e) => {
                error!(request_id = ?response.request_id, error = %e, "Failed to send response");
                false
            }
        }
    }
}

/// Run one processor step, turning a panic into a processor error.
async fn guarded<F>(step: F) -> Result<Produced, ProcessorError>
where
    F: Future<Output = Result<Produced, ProcessorError>>,
{
    match AssertUnwindSafe(step).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProcessorError::Panicked),
    }
}

/// Parse an inbound envelope. On failure, returns the request id if the
/// message carried one, and the reason.
fn parse_envelope(message: &str) -> Result<CallerMessage, (Option<RequestId>, String)> {
    let value: Value = serde_json::from_str(message).map_err(|e| (None, e.to_string()))?;
    let request_id = value
        .get("requestId")
        .and_then(Value::as_str)
        .map(RequestId::from);

    let parsed = if value.get("cancel").is_some() {
        serde_json::from_value(value).map(CallerMessage::Cancel)
    } else {
        serde_json::from_value(value).map(CallerMessage::Request)
    };
    parsed.map_err(|e| (request_id, e.to_string()))
}
