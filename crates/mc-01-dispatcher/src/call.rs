//! # Call Parts and Continuations
//!
//! A dispatched call resolves to a [`Part`]: one `CallResult` plus, while the
//! worker has more to send, a [`Continuation`]. The continuation is consumed
//! by awaiting it, so a chain can be walked exactly once and never restarted.
//!
//! ```text
//! dispatch() ──► Part { D1, Some(c1) }
//!                         │ c1.next()
//!                         ▼
//!                Part { D2, Some(c2) }
//!                         │ c2.next()
//!                         ▼
//!                Part { D3, None }      (done)
//! ```

use crate::dispatcher::Shared;
use crate::domain::error::CallError;
use crate::domain::pending::Link;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use shared_types::{CallResult, RequestId};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::debug;

/// One resolved part of a call.
#[derive(Debug)]
pub struct Part<T> {
    /// Data or validation of this part.
    pub result: CallResult<T>,
    /// Handle to the next part; `None` once the worker sent `done == true`.
    pub continuation: Option<Continuation<T>>,
}

impl<T> Part<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Whether this is the last part of the call.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.continuation.is_none()
    }

    /// Split into the result and the continuation.
    pub fn into_parts(self) -> (CallResult<T>, Option<Continuation<T>>) {
        (self.result, self.continuation)
    }

    /// Walk the remaining chain as a stream of results.
    ///
    /// The stream ends after the final part or after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<CallResult<T>, CallError>> + Send {
        enum State<T> {
            Ready(Part<T>),
            Waiting(Continuation<T>),
            Done,
        }

        stream::unfold(State::Ready(self), |state| async move {
            let part = match state {
                State::Ready(part) => part,
                State::Waiting(continuation) => match continuation.next().await {
                    Ok(part) => part,
                    Err(error) => return Some((Err(error), State::Done)),
                },
                State::Done => return None,
            };
            let (result, continuation) = part.into_parts();
            let state = continuation.map_or(State::Done, State::Waiting);
            Some((Ok(result), state))
        })
    }

    /// Await every remaining part and collect the results in order.
    pub async fn drain(self) -> Result<Vec<CallResult<T>>, CallError> {
        let mut results = Vec::new();
        let mut part = self;
        loop {
            let (result, continuation) = part.into_parts();
            results.push(result);
            match continuation {
                Some(continuation) => part = continuation.next().await?,
                None => return Ok(results),
            }
        }
    }
}

/// Consume-once handle to the next part of a call.
///
/// Dropping it without awaiting abandons the call: the dispatcher releases the
/// correlation entry and tells the worker to stop.
pub struct Continuation<T> {
    request_id: RequestId,
    receiver: oneshot::Receiver<Link>,
    timeout: Duration,
    since: Instant,
    shared: Arc<Shared>,
    _output: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("request_id", &self.request_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<T> Continuation<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(
        request_id: RequestId,
        receiver: oneshot::Receiver<Link>,
        timeout: Duration,
        since: Instant,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            request_id,
            receiver,
            timeout,
            since,
            shared,
            _output: PhantomData,
        }
    }

    /// Id of the call this continuation belongs to.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Await the next part.
    ///
    /// The timeout counts from the previous part's arrival, not from this
    /// call, so a caller that awaits late gets less time.
    pub async fn next(self) -> Result<Part<T>, CallError> {
        let Self {
            request_id,
            receiver,
            timeout,
            since,
            shared,
            ..
        } = self;
        await_part(shared, request_id, receiver, since, timeout).await
    }

    /// Abandon the rest of the chain and tell the worker to stop.
    pub async fn cancel(self) {
        debug!(request_id = %self.request_id, "Cancelling call chain");
        self.shared.cancel_call(&self.request_id).await;
    }
}

/// Await one link of a call and turn it into a typed part.
///
/// The link times out `timeout` after `since`, the entry's last activity.
pub(crate) async fn await_part<T>(
    shared: Arc<Shared>,
    request_id: RequestId,
    receiver: oneshot::Receiver<Link>,
    since: Instant,
    timeout: Duration,
) -> Result<Part<T>, CallError>
where
    T: DeserializeOwned + Send + 'static,
{
    let awaited = match since.checked_add(timeout) {
        Some(deadline) => {
            tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), receiver).await
        }
        None => Ok(receiver.await),
    };
    let link = match awaited {
        Ok(Ok(link)) => link,
        // Entry released without a result
        Ok(Err(_)) => return Err(CallError::Cancelled),
        Err(_) => {
            if shared.table.expire(&request_id) {
                shared.send_cancel(&request_id).await;
            }
            return Err(CallError::Timeout);
        }
    };

    let delivered = link?;
    let continuation = delivered
        .next
        .map(|receiver| {
            Continuation::new(
                request_id.clone(),
                receiver,
                timeout,
                delivered.at,
                Arc::clone(&shared),
            )
        });

    match delivered.result.decode::<T>() {
        Ok(result) => Ok(Part {
            result,
            continuation,
        }),
        Err(e) => {
            if let Some(continuation) = continuation {
                continuation.cancel().await;
            }
            Err(CallError::Decode(e.to_string()))
        }
    }
}
