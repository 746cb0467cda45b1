//! # Request Dispatcher
//!
//! Caller-side entry point. Builds, signs and sends requests, registers them
//! in the correlation table, and resolves them from the response listener.

use crate::call::{await_part, Part};
use crate::domain::config::DispatcherConfig;
use crate::domain::error::{CallError, DispatcherError};
use crate::domain::pending::{CorrelationTable, PendingStats};
use crate::domain::request_id::RequestIdGenerator;
use crate::listener::ResponseListener;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_bus::MessageChannel;
use shared_types::{Cancel, EnvelopeSigner, Method, Request, RequestId, Response, Signer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// State shared by the dispatcher handle, its background tasks and every
/// outstanding continuation.
pub(crate) struct Shared {
    pub(crate) table: CorrelationTable,
    channel: Arc<dyn MessageChannel>,
    signer: Arc<dyn Signer>,
    ids: RequestIdGenerator,
    config: DispatcherConfig,
    shut_down: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl Shared {
    /// Check a response's signature.
    pub(crate) fn verify(&self, response: &Response) -> bool {
        self.signer.verify_envelope(response)
    }

    /// Tell the worker to stop producing for `request_id`. Best effort.
    pub(crate) async fn send_cancel(&self, request_id: &RequestId) {
        let mut cancel = Cancel::new(request_id.clone());
        if let Err(e) = self.signer.seal(&mut cancel) {
            error!(request_id = %request_id, error = %e, "Failed to sign cancel");
            return;
        }
        let message = match serde_json::to_string(&cancel) {
            Ok(message) => message,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Failed to encode cancel");
                return;
            }
        };
        match self.channel.send(message).await {
            Ok(()) => debug!(request_id = %request_id, "Sent cancel"),
            Err(e) => warn!(request_id = %request_id, error = %e, "Failed to send cancel"),
        }
    }

    /// Release a call and notify the worker.
    pub(crate) async fn cancel_call(&self, request_id: &RequestId) {
        if self.table.cancel(request_id) {
            self.send_cancel(request_id).await;
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Handle for issuing calls to the worker context.
///
/// Cheap to clone; all clones share one correlation table.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    /// Subscribe to the channel and start the response listener and the
    /// stale-entry sweeper.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        channel: Arc<dyn MessageChannel>,
        signer: Arc<dyn Signer>,
        config: DispatcherConfig,
    ) -> Result<Self, DispatcherError> {
        config.validate()?;
        let subscription = channel.subscribe()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let shared = Arc::new(Shared {
            table: CorrelationTable::new(config.default_timeout),
            channel,
            signer,
            ids: RequestIdGenerator::new(),
            config: config.clone(),
            shut_down: AtomicBool::new(false),
            shutdown_tx,
        });

        let listener =
            ResponseListener::new(Arc::downgrade(&shared), subscription, shutdown_rx.clone());
        tokio::spawn(listener.run());
        tokio::spawn(sweep_task(
            Arc::downgrade(&shared),
            config.sweep_interval,
            shutdown_rx,
        ));

        info!(
            session = shared.ids.session(),
            timeout_ms = config.default_timeout.as_millis(),
            "Dispatcher started"
        );
        Ok(Self { shared })
    }

    /// Call a typed method with the default timeout.
    pub async fn dispatch<M: Method>(
        &self,
        payload: M::Payload,
    ) -> Result<Part<M::Output>, CallError> {
        self.dispatch_with_timeout::<M>(payload, self.shared.config.default_timeout)
            .await
    }

    /// Call a typed method with a per-call timeout.
    pub async fn dispatch_with_timeout<M: Method>(
        &self,
        payload: M::Payload,
        timeout: Duration,
    ) -> Result<Part<M::Output>, CallError> {
        let payload = serde_json::to_value(payload).map_err(|e| CallError::Encode(e.to_string()))?;
        self.call(M::NAME, payload, timeout).await
    }

    /// Call a method by name with a JSON payload and the default timeout.
    pub async fn dispatch_raw(&self, method: &str, payload: Value) -> Result<Part<Value>, CallError> {
        self.call(method, payload, self.shared.config.default_timeout)
            .await
    }

    /// Call a method by name with a JSON payload and a per-call timeout.
    pub async fn dispatch_raw_with_timeout(
        &self,
        method: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Part<Value>, CallError> {
        self.call(method, payload, timeout).await
    }

    async fn call<T>(&self, method: &str, payload: Value, timeout: Duration) -> Result<Part<T>, CallError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let shared = &self.shared;
        if shared.shut_down.load(Ordering::Acquire) {
            return Err(CallError::Shutdown);
        }

        let request_id = shared.ids.next_id();
        let mut request = Request::new(method, request_id.clone(), payload);
        shared
            .signer
            .seal(&mut request)
            .map_err(|e| CallError::Encode(e.to_string()))?;
        let message =
            serde_json::to_string(&request).map_err(|e| CallError::Encode(e.to_string()))?;

        // Register before sending so a fast response always finds its entry
        let since = Instant::now();
        let receiver = shared
            .table
            .register(request_id.clone(), method, Some(timeout))?;

        if let Err(e) = shared.channel.send(message).await {
            shared.table.fail(&request_id, CallError::Transport(e.to_string()));
            error!(request_id = %request_id, method = method, error = %e, "Failed to send request");
            return Err(CallError::from(e));
        }

        debug!(request_id = %request_id, method = method, "Sent request");
        await_part(Arc::clone(shared), request_id, receiver, since, timeout).await
    }

    /// Get number of calls awaiting a response
    pub fn pending_count(&self) -> usize {
        self.shared.table.pending_count()
    }

    /// Check if a call is still pending
    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.shared.table.is_pending(request_id)
    }

    /// Correlation statistics.
    pub fn stats(&self) -> &PendingStats {
        self.shared.table.stats()
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.shared.config
    }

    /// Stop the background tasks and fail every pending call with
    /// `CallError::Shutdown`. Later dispatches fail immediately.
    pub async fn shutdown(&self) {
        if self.shared.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.shared.shutdown_tx.send(true);

        let released = self.shared.table.fail_all(CallError::Shutdown);
        for request_id in &released {
            self.shared.send_cancel(request_id).await;
        }
        info!(released = released.len(), "Dispatcher shut down");
    }
}

/// Background task evicting stale correlation entries.
async fn sweep_task(shared: Weak<Shared>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let evicted = shared.table.remove_expired();
        for request_id in &evicted {
            shared.send_cancel(request_id).await;
        }
        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), "Evicted stale pending calls");
        }
    }
    debug!("Sweeper stopped");
}
