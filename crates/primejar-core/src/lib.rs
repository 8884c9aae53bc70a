//! Core domain logic for the Jar of Primes.
//!
//! This crate owns the shared counter and the rules for advancing it:
//!
//! - [`counter`] -- the bounded wrapping counter
//! - [`prime`] -- trial-division primality and the configurable
//!   exception rule
//! - [`engine`] -- [`PrimeEngine`], the serialization point through which
//!   every step request flows
//! - [`config`] -- typed configuration loaded from `primejar-config.yaml`
//!
//! Transport concerns (HTTP gateway, push channel) live in
//! `primejar-observer`; client-side reconciliation lives in
//! `primejar-client`.
//!
//! [`PrimeEngine`]: engine::PrimeEngine

pub mod config;
pub mod counter;
pub mod engine;
pub mod prime;

// Re-export primary types for convenience.
pub use config::{ConfigError, DeviceConfig};
pub use counter::{Counter, CounterError, DEFAULT_MODULUS};
pub use engine::{EngineError, PrimeEngine, StepResult};
pub use prime::{PrimalityRule, is_prime};
