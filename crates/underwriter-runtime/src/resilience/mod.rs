//! Resilience patterns for bureau calls.

mod circuit_breaker;

pub(crate) use circuit_breaker::humantime_duration;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
