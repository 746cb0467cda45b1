//! Processor registry: method name → processor.

use crate::processor::{Handler, Processor, Typed};
use shared_types::Method;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A processor is already registered under this method.
    #[error("method already registered: {0}")]
    Duplicate(String),
}

/// The set of processors a router serves.
///
/// Built before the router is installed and immutable afterwards.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an untyped processor under `method`.
    pub fn register(
        &mut self,
        method: impl Into<String>,
        processor: Arc<dyn Processor>,
    ) -> Result<(), RegistryError> {
        let method = method.into();
        if self.processors.contains_key(&method) {
            return Err(RegistryError::Duplicate(method));
        }
        info!(method = %method, "Registered processor");
        self.processors.insert(method, processor);
        Ok(())
    }

    /// Register a typed handler under `M::NAME`.
    pub fn register_method<M, H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        M: Method,
        H: Handler<M>,
    {
        self.register(M::NAME, Arc::new(Typed::<M, H>::new(handler)))
    }

    /// Look up the processor for `method`.
    pub fn get(&self, method: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(method).cloned()
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
