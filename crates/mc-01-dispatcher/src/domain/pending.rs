//! Correlation Table - maps request ids to waiting callers.
//!
//! Each live call owns one entry holding the single-resolution sender for the
//! call's next link. A non-final response resolves that sender and installs a
//! fresh one for the continuation; a final response resolves it and removes
//! the entry.
//!
//! Flow:
//! 1. Dispatcher generates a `RequestId`
//! 2. Dispatcher calls `register()` to get a oneshot receiver
//! 3. Dispatcher sends the signed request
//! 4. Response listener calls `deliver()` for every verified response
//! 5. Caller awaits the receiver; a delivered link carries the receiver of
//!    the following link when more parts will come

use crate::domain::error::CallError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use shared_types::{CallResult, RequestId, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// One resolved link of a call chain.
pub type Link = Result<Delivered, CallError>;

/// A successfully delivered part.
#[derive(Debug)]
pub struct Delivered {
    /// Data or validation carried by the response.
    pub result: CallResult<Value>,
    /// Receiver of the next link; `None` on the final part.
    pub next: Option<oneshot::Receiver<Link>>,
    /// When the entry last saw activity; the next link's timeout runs from here.
    pub at: Instant,
}

/// Where a call is in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No response seen yet.
    AwaitingFirst,
    /// At least one non-final part delivered.
    AwaitingContinuation,
}

/// What happened to a delivered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Final part handed to the caller; entry removed.
    Completed,
    /// Non-final part handed to the caller; entry kept for the next part.
    Continued,
    /// The caller stopped listening; entry removed.
    Abandoned,
    /// No entry for this id (already finished, evicted or never issued).
    Unknown,
}

/// A call waiting for its next response.
struct PendingEntry {
    /// Resolves the caller's current link
    sender: oneshot::Sender<Link>,
    stage: Stage,
    /// Method name (for logging)
    method: String,
    created_at: Instant,
    last_activity: Instant,
    /// Allowed silence between two responses
    timeout: Duration,
    /// Parts delivered so far
    parts: u32,
}

impl PendingEntry {
    fn is_stale(&self, now: Instant) -> bool {
        self.sender.is_closed() || now.duration_since(self.last_activity) > self.timeout
    }
}

/// Statistics for the correlation table
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total calls registered
    pub total_registered: AtomicU64,
    /// Total calls finished with a final part
    pub total_completed: AtomicU64,
    /// Total calls finished with an error
    pub total_failed: AtomicU64,
    /// Total calls evicted by timeout
    pub total_timeouts: AtomicU64,
    /// Total calls cancelled or abandoned by the caller
    pub total_cancelled: AtomicU64,
}

/// Request id → pending caller state.
pub struct CorrelationTable {
    pending: DashMap<RequestId, PendingEntry>,
    default_timeout: Duration,
    stats: Arc<PendingStats>,
}

impl CorrelationTable {
    /// Create an empty table.
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            default_timeout,
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a call and get the receiver of its first link.
    ///
    /// # Errors
    ///
    /// `CallError::DuplicateRequestId` if `request_id` is already live.
    pub fn register(
        &self,
        request_id: RequestId,
        method: &str,
        timeout: Option<Duration>,
    ) -> Result<oneshot::Receiver<Link>, CallError> {
        match self.pending.entry(request_id.clone()) {
            Entry::Occupied(_) => {
                warn!(request_id = %request_id, method = method, "Request id already pending");
                Err(CallError::DuplicateRequestId(request_id))
            }
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                let now = Instant::now();
                slot.insert(PendingEntry {
                    sender: tx,
                    stage: Stage::AwaitingFirst,
                    method: method.to_string(),
                    created_at: now,
                    last_activity: now,
                    timeout: timeout.unwrap_or(self.default_timeout),
                    parts: 0,
                });
                self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %request_id, method = method, "Registered pending call");
                Ok(rx)
            }
        }
    }

    /// Hand a verified response to the waiting caller.
    pub fn deliver(&self, request_id: &RequestId, response: Response) -> DeliveryOutcome {
        let last = response.is_final();
        let link = interpret(response);

        if last {
            return self.finish(request_id, link);
        }

        // Non-final responses are always successful, so `link` is `Ok`.
        let result = match link {
            Ok(result) => result,
            Err(error) => return self.finish(request_id, Err(error)),
        };

        let (next_tx, next_rx) = oneshot::channel();
        let (sender, method, parts, at) = {
            let Some(mut entry) = self.pending.get_mut(request_id) else {
                debug!(request_id = %request_id, "Continuation for unknown or released request id");
                return DeliveryOutcome::Unknown;
            };
            let sender = std::mem::replace(&mut entry.sender, next_tx);
            entry.stage = Stage::AwaitingContinuation;
            entry.last_activity = Instant::now();
            entry.parts += 1;
            (sender, entry.method.clone(), entry.parts, entry.last_activity)
        };

        let delivered = Delivered {
            result,
            next: Some(next_rx),
            at,
        };
        match sender.send(Ok(delivered)) {
            Ok(()) => {
                debug!(request_id = %request_id, method = %method, parts = parts, done = false, "Delivered part");
                DeliveryOutcome::Continued
            }
            Err(_) => {
                self.pending.remove(request_id);
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %request_id, method = %method, "Caller dropped the call chain");
                DeliveryOutcome::Abandoned
            }
        }
    }

    fn finish(&self, request_id: &RequestId, link: Result<CallResult<Value>, CallError>) -> DeliveryOutcome {
        let Some((_, entry)) = self.pending.remove(request_id) else {
            debug!(request_id = %request_id, "Response for unknown or released request id");
            return DeliveryOutcome::Unknown;
        };

        let failed = link.is_err();
        let link = link.map(|result| Delivered {
            result,
            next: None,
            at: Instant::now(),
        });
        let elapsed = entry.created_at.elapsed();

        match entry.sender.send(link) {
            Ok(()) => {
                let counter = if failed {
                    &self.stats.total_failed
                } else {
                    &self.stats.total_completed
                };
                counter.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    method = %entry.method,
                    parts = entry.parts + 1,
                    elapsed_ms = elapsed.as_millis(),
                    done = true,
                    "Completed pending call"
                );
                DeliveryOutcome::Completed
            }
            Err(_) => {
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %request_id, method = %entry.method, "Caller dropped the call chain");
                DeliveryOutcome::Abandoned
            }
        }
    }

    /// Resolve a call with an error and release it.
    ///
    /// Returns true if the call was pending.
    pub fn fail(&self, request_id: &RequestId, error: CallError) -> bool {
        let Some((_, entry)) = self.pending.remove(request_id) else {
            return false;
        };
        warn!(request_id = %request_id, method = %entry.method, error = %error, "Failing pending call");
        self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
        let _ = entry.sender.send(Err(error));
        true
    }

    /// Release a call without resolving it (caller-initiated cancel).
    ///
    /// Returns true if the call was pending.
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        if self.pending.remove(request_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(request_id = %request_id, "Cancelled pending call");
            true
        } else {
            false
        }
    }

    /// Release a call whose caller gave up waiting.
    ///
    /// Returns true if the call was pending.
    pub fn expire(&self, request_id: &RequestId) -> bool {
        let Some((_, entry)) = self.pending.remove(request_id) else {
            return false;
        };
        warn!(
            request_id = %request_id,
            method = %entry.method,
            timeout_ms = entry.timeout.as_millis(),
            "Call timed out"
        );
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Evict stale entries: calls silent past their timeout, and calls whose
    /// caller dropped the receiver.
    ///
    /// Timed-out callers receive `CallError::Timeout`. Returns the evicted ids
    /// so the worker can be told to stop.
    pub fn remove_expired(&self) -> Vec<RequestId> {
        let now = Instant::now();
        let stale: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|entry| entry.value().is_stale(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = Vec::with_capacity(stale.len());
        for request_id in stale {
            let Some((_, entry)) = self
                .pending
                .remove_if(&request_id, |_, entry| entry.is_stale(now))
            else {
                continue;
            };

            if entry.sender.is_closed() {
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %request_id, method = %entry.method, "Evicted abandoned call");
            } else {
                warn!(
                    request_id = %request_id,
                    method = %entry.method,
                    elapsed_ms = now.duration_since(entry.last_activity).as_millis(),
                    timeout_ms = entry.timeout.as_millis(),
                    "Removing expired pending call"
                );
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                let _ = entry.sender.send(Err(CallError::Timeout));
            }
            evicted.push(request_id);
        }

        evicted
    }

    /// Resolve every pending call with `error`. Returns the released ids.
    pub fn fail_all(&self, error: CallError) -> Vec<RequestId> {
        let ids: Vec<RequestId> = self.pending.iter().map(|e| e.key().clone()).collect();
        ids.into_iter()
            .filter(|id| self.fail(id, error.clone()))
            .collect()
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a request id is pending
    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    /// Stage of a pending call.
    pub fn stage(&self, request_id: &RequestId) -> Option<Stage> {
        self.pending.get(request_id).map(|entry| entry.stage)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Turn a response into the caller-facing outcome of one link.
///
/// Validation resolves the call rather than failing it. Data never travels
/// alongside validation.
fn interpret(response: Response) -> Result<CallResult<Value>, CallError> {
    if response.success {
        return Ok(match response.validation {
            Some(validation) => CallResult::invalid(validation),
            None => CallResult {
                data: response.data,
                validation: None,
            },
        });
    }

    match (response.error, response.validation) {
        (Some(message), _) => Err(CallError::Remote { message }),
        (None, Some(validation)) => Ok(CallResult::invalid(validation)),
        (None, None) => Err(CallError::MalformedResponse),
    }
}
