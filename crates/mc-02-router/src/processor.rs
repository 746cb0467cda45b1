//! # Processor Contract
//!
//! A processor turns `(method, payload)` into one or more results over time.
//! Each step yields a [`Produced`]: a result plus, when more will follow, the
//! future computing the next step.
//!
//! Typed processors implement [`Handler`] for a [`Method`]; the payload is
//! decoded at the router boundary, and a shape mismatch becomes a terminal
//! `invalid payload` error before the handler runs.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::Value;
use shared_types::{CallResult, Method, ProcessorError};
use std::future::Future;
use std::marker::PhantomData;

/// Future computing the next step of a chain.
pub type NextStep<T> = BoxFuture<'static, Result<Produced<T>, ProcessorError>>;

/// One step of a processor's output.
pub struct Produced<T = Value> {
    /// The result emitted for this step.
    pub result: CallResult<T>,
    /// The next step; `None` when this is the last result.
    pub continuation: Option<NextStep<T>>,
}

impl<T> Produced<T> {
    /// A final result.
    pub fn last(result: CallResult<T>) -> Self {
        Self {
            result,
            continuation: None,
        }
    }

    /// A final result carrying data.
    pub fn last_data(data: T) -> Self {
        Self::last(CallResult::data(data))
    }

    /// A result followed by the step computed by `next`.
    pub fn more<F>(result: CallResult<T>, next: F) -> Self
    where
        F: Future<Output = Result<Produced<T>, ProcessorError>> + Send + 'static,
    {
        Self {
            result,
            continuation: Some(next.boxed()),
        }
    }

    /// Whether no further step follows.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.continuation.is_none()
    }
}

impl<T> Produced<T>
where
    T: Serialize + Send + 'static,
{
    /// Convert this step and every following step to JSON results.
    pub fn encode(self) -> Result<Produced, ProcessorError> {
        let result = self.result.encode()?;
        let continuation = self
            .continuation
            .map(|next| next.map(|step| step.and_then(Produced::<T>::encode)).boxed());
        Ok(Produced {
            result,
            continuation,
        })
    }
}

impl<T> std::fmt::Debug for Produced<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Produced")
            .field("result", &self.result)
            .field("last", &self.is_last())
            .finish()
    }
}

/// Untyped processor selected by method name.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Produce the first step for `payload`.
    async fn process(&self, method: &str, payload: Value) -> Result<Produced, ProcessorError>;
}

/// Typed processor for one [`Method`].
#[async_trait]
pub trait Handler<M: Method>: Send + Sync + 'static {
    /// Produce the first step for a decoded payload.
    async fn handle(&self, payload: M::Payload) -> Result<Produced<M::Output>, ProcessorError>;
}

/// Adapts a [`Handler`] to the untyped [`Processor`] contract.
pub struct Typed<M, H> {
    handler: H,
    _method: PhantomData<fn() -> M>,
}

impl<M, H> Typed<M, H>
where
    M: Method,
    H: Handler<M>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _method: PhantomData,
        }
    }
}

#[async_trait]
impl<M, H> Processor for Typed<M, H>
where
    M: Method,
    H: Handler<M>,
{
    async fn process(&self, _method: &str, payload: Value) -> Result<Produced, ProcessorError> {
        let payload: M::Payload = serde_json::from_value(payload)
            .map_err(|e| ProcessorError::InvalidPayload(e.to_string()))?;
        Handler::<M>::handle(&self.handler, payload).await?.encode()
    }
}
