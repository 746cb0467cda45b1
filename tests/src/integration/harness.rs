//! # Test Harness
//!
//! A dispatcher and a router joined by an in-memory channel pair, sharing one
//! signing key, plus a handful of scripted processors.

use async_trait::async_trait;
use futures::future::pending;
use mc_01_dispatcher::{Dispatcher, DispatcherConfig};
use mc_02_router::{Processor, ProcessorRegistry, Produced, ResponseRouter};
use serde_json::{json, Value};
use shared_bus::InMemoryChannel;
use shared_types::{CallResult, HmacSigner, ProcessorError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Key shared by both ends unless a test says otherwise.
pub const TEST_SECRET: &[u8] = b"mercato-integration-secret";

pub fn signer() -> HmacSigner {
    HmacSigner::new(TEST_SECRET).expect("non-empty key")
}

/// Both ends of one channel.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub router: ResponseRouter,
}

impl Harness {
    /// Default registry and dispatcher configuration.
    pub fn start() -> Self {
        Self::with(registry(), DispatcherConfig::default())
    }

    pub fn with(registry: ProcessorRegistry, config: DispatcherConfig) -> Self {
        Self::with_signers(registry, config, signer(), signer())
    }

    /// Caller and worker keyed independently.
    pub fn with_signers(
        registry: ProcessorRegistry,
        config: DispatcherConfig,
        caller_signer: HmacSigner,
        worker_signer: HmacSigner,
    ) -> Self {
        let (caller, worker) = InMemoryChannel::pair();
        let router = ResponseRouter::install(registry, Arc::new(worker), Arc::new(worker_signer))
            .expect("router installs");
        let dispatcher = Dispatcher::start(Arc::new(caller), Arc::new(caller_signer), config)
            .expect("dispatcher starts");
        Self { dispatcher, router }
    }
}

/// Registry with every scripted processor:
///
/// | Method | Behaviour |
/// |--------|-----------|
/// | `echo` | returns the payload |
/// | `empty` | returns no data |
/// | `validate` | field error on `name` unless the payload has one |
/// | `count` | emits `1..=payload` as separate parts |
/// | `stall` | emits `"first"`, then never finishes |
/// | `hang` | never produces a first result |
/// | `fail` | processor error |
/// | `panic` | panics |
pub fn registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register("echo", Arc::new(Echo)).expect("unique");
    registry.register("empty", Arc::new(Empty)).expect("unique");
    registry
        .register("validate", Arc::new(Validate))
        .expect("unique");
    registry
        .register("count", Arc::new(Count::default()))
        .expect("unique");
    registry.register("stall", Arc::new(Stall)).expect("unique");
    registry.register("hang", Arc::new(Hang)).expect("unique");
    registry.register("fail", Arc::new(Fail)).expect("unique");
    registry.register("panic", Arc::new(Panic)).expect("unique");
    registry
}

pub struct Echo;

#[async_trait]
impl Processor for Echo {
    async fn process(&self, _method: &str, payload: Value) -> Result<Produced, ProcessorError> {
        Ok(Produced::last_data(payload))
    }
}

pub struct Empty;

#[async_trait]
impl Processor for Empty {
    async fn process(&self, _method: &str, _payload: Value) -> Result<Produced, ProcessorError> {
        Ok(Produced::last(CallResult::empty()))
    }
}

pub struct Validate;

#[async_trait]
impl Processor for Validate {
    async fn process(&self, _method: &str, payload: Value) -> Result<Produced, ProcessorError> {
        match payload.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => Ok(Produced::last_data(json!({ "hello": name }))),
            _ => Ok(Produced::last(CallResult::field_error("name", "required"))),
        }
    }
}

/// Emits `1..=n`; counts how many steps were computed.
#[derive(Default)]
pub struct Count {
    pub steps: Arc<AtomicUsize>,
}

fn count_step(n: u64, upto: u64, steps: Arc<AtomicUsize>) -> Produced {
    steps.fetch_add(1, Ordering::SeqCst);
    if n >= upto {
        Produced::last_data(json!(n))
    } else {
        Produced::more(CallResult::data(json!(n)), async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(count_step(n + 1, upto, steps))
        })
    }
}

#[async_trait]
impl Processor for Count {
    async fn process(&self, _method: &str, payload: Value) -> Result<Produced, ProcessorError> {
        let upto = payload
            .as_u64()
            .ok_or_else(|| ProcessorError::InvalidPayload("expected a count".into()))?;
        Ok(count_step(1, upto.max(1), Arc::clone(&self.steps)))
    }
}

pub struct Stall;

#[async_trait]
impl Processor for Stall {
    async fn process(&self, _method: &str, _payload: Value) -> Result<Produced, ProcessorError> {
        Ok(Produced::more(CallResult::data(json!("first")), async {
            pending::<()>().await;
            Ok(Produced::last_data(json!("unreachable")))
        }))
    }
}

pub struct Hang;

#[async_trait]
impl Processor for Hang {
    async fn process(&self, _method: &str, _payload: Value) -> Result<Produced, ProcessorError> {
        pending::<()>().await;
        Ok(Produced::last(CallResult::empty()))
    }
}

pub struct Fail;

#[async_trait]
impl Processor for Fail {
    async fn process(&self, _method: &str, _payload: Value) -> Result<Produced, ProcessorError> {
        Err(ProcessorError::failed("backend unavailable"))
    }
}

pub struct Panic;

#[async_trait]
impl Processor for Panic {
    async fn process(&self, _method: &str, _payload: Value) -> Result<Produced, ProcessorError> {
        panic!("processor bug");
    }
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
