//! Circuit breakers
//!
//! A circuit breaker is an external backpressure signal: while open, buffer
//! writes on pipelines fed by real sources are refused, pushing the
//! pressure back to the data origin. Connector-fed pipelines are never
//! gated, so records already admitted into a chain keep flowing through it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A source of open/closed backpressure decisions
pub trait CircuitBreaker: Send + Sync {
    /// Whether the breaker currently refuses new records
    fn is_open(&self) -> bool;
}

/// Supplies the process-wide breaker applied to entry-point pipelines
#[derive(Clone, Default)]
pub struct CircuitBreakerManager {
    global: Option<Arc<dyn CircuitBreaker>>,
}

impl CircuitBreakerManager {
    /// A manager with no breaker configured
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A manager applying `breaker` to every entry-point pipeline
    pub fn with_global(breaker: Arc<dyn CircuitBreaker>) -> Self {
        Self {
            global: Some(breaker),
        }
    }

    /// The process-wide breaker, when one is configured
    pub fn global_breaker(&self) -> Option<Arc<dyn CircuitBreaker>> {
        self.global.clone()
    }
}

/// A breaker toggled by hand (admin surfaces, tests)
#[derive(Default)]
pub struct ManualBreaker {
    open: AtomicBool,
}

impl ManualBreaker {
    /// A closed breaker
    pub fn new() -> Self {
        Self::default()
    }

    /// Start refusing records
    pub fn open(&self) {
        self.open.store(true, Ordering::Relaxed);
    }

    /// Resume accepting records
    pub fn close(&self) {
        self.open.store(false, Ordering::Relaxed);
    }
}

impl CircuitBreaker for ManualBreaker {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }
}
