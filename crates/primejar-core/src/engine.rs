//! Step engine owning the shared counter.
//!
//! [`PrimeEngine`] is the serialization point for all state mutation.
//! A step request advances the counter one increment at a time until the
//! value is prime under the engine's [`PrimalityRule`], then reports the
//! landing value in a single [`StepResult`]. The intermediate composite
//! values are internal to the search and never observable.
//!
//! # Concurrency
//!
//! The counter sits behind an async [`Mutex`]. A step holds the lock for
//! the whole search, so at most one step owns the counter at a time and
//! concurrent step requests from different transports are strictly
//! serialized. Reads take the same lock briefly; there is no other path
//! to the value.

use tokio::sync::Mutex;
use tracing::debug;

use crate::counter::{Counter, CounterError};
use crate::prime::PrimalityRule;

/// Errors that can occur while operating the step engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The counter could not be constructed.
    #[error("counter error: {source}")]
    Counter {
        /// The underlying counter error.
        #[from]
        source: CounterError,
    },

    /// A full wrap of the counter range found no prime.
    ///
    /// Unreachable with a validated modulus (2 is always in range), but
    /// the search loop is bounded rather than trusted to terminate.
    #[error("no prime found in [0, {modulus}) after a full wrap")]
    NoPrimeInRange {
        /// The counter modulus that was searched.
        modulus: u64,
    },
}

/// Outcome of a single completed step.
///
/// Produced once per [`PrimeEngine::step`] call. `new_value` is always
/// prime under the engine's rule; `previous_value` is where the counter
/// stood before the search began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Counter value before the step.
    pub previous_value: u64,

    /// The prime the counter landed on.
    pub new_value: u64,

    /// Whether the very first increment already landed on a prime.
    pub was_immediately_prime: bool,
}

/// The step engine: shared counter plus primality rule.
///
/// Wrapped in an `Arc` and shared between the request gateway and the
/// persistent-channel handlers. Both transports advance state through
/// [`step`](Self::step), so the exactly-one-result-per-step contract
/// holds regardless of where a command entered.
#[derive(Debug)]
pub struct PrimeEngine {
    /// The shared counter, locked for the duration of each step search.
    counter: Mutex<Counter>,

    /// Primality rule deciding where a step search stops.
    rule: PrimalityRule,
}

impl PrimeEngine {
    /// Create an engine with the given starting value, wrap bound, and
    /// primality rule.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Counter`] if the bound or starting value
    /// is invalid.
    pub fn new(initial_value: u64, modulus: u64, rule: PrimalityRule) -> Result<Self, EngineError> {
        let counter = Counter::new(initial_value, modulus)?;
        Ok(Self {
            counter: Mutex::new(counter),
            rule,
        })
    }

    /// Return the current counter value.
    pub async fn current(&self) -> u64 {
        self.counter.lock().await.value()
    }

    /// Advance the counter to the next prime and return the result.
    ///
    /// Increments one at a time, wrapping at the modulus, until the
    /// value is prime under the engine's rule. The lock is held for the
    /// whole search, so no other step can interleave.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoPrimeInRange`] if a full wrap of the
    /// range finds no prime. This cannot happen with a validated
    /// modulus; the bound exists so the loop provably terminates.
    pub async fn step(&self) -> Result<StepResult, EngineError> {
        let mut counter = self.counter.lock().await;
        let previous_value = counter.value();
        let modulus = counter.modulus();

        let mut increments: u64 = 0;
        loop {
            let value = counter.advance();
            increments = increments.saturating_add(1);

            if self.rule.is_prime(value) {
                debug!(
                    previous_value,
                    new_value = value,
                    increments,
                    "step landed on prime"
                );
                return Ok(StepResult {
                    previous_value,
                    new_value: value,
                    was_immediately_prime: increments == 1,
                });
            }

            if increments >= modulus {
                return Err(EngineError::NoPrimeInRange { modulus });
            }
        }
    }

    /// Return the engine's primality rule.
    pub const fn rule(&self) -> &PrimalityRule {
        &self.rule
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::counter::DEFAULT_MODULUS;

    fn engine_at(value: u64) -> PrimeEngine {
        PrimeEngine::new(value, DEFAULT_MODULUS, PrimalityRule::canonical()).unwrap()
    }

    #[tokio::test]
    async fn step_lands_on_next_prime() {
        let engine = engine_at(11);
        let result = engine.step().await.unwrap();
        assert_eq!(result.previous_value, 11);
        assert_eq!(result.new_value, 13);
        assert!(!result.was_immediately_prime);
    }

    #[tokio::test]
    async fn step_from_even_composite() {
        let engine = engine_at(8);
        let result = engine.step().await.unwrap();
        // 9 and 10 are composite; the search stops at 11.
        assert_eq!(result.new_value, 11);
        assert!(!result.was_immediately_prime);
    }

    #[tokio::test]
    async fn step_reports_immediate_prime() {
        let engine = engine_at(1);
        let result = engine.step().await.unwrap();
        assert_eq!(result.new_value, 2);
        assert!(result.was_immediately_prime);
    }

    #[tokio::test]
    async fn step_wraps_through_zero() {
        // 999_983 is the largest prime below 1_000_000, so stepping from
        // it wraps through 0 and 1 before landing on 2.
        let engine = engine_at(999_983);
        let result = engine.step().await.unwrap();
        assert_eq!(result.previous_value, 999_983);
        assert_eq!(result.new_value, 2);
        assert!(!result.was_immediately_prime);
    }

    #[tokio::test]
    async fn current_reads_without_stepping() {
        let engine = engine_at(42);
        assert_eq!(engine.current().await, 42);
        assert_eq!(engine.current().await, 42);
    }

    #[tokio::test]
    async fn exception_value_stops_the_search() {
        let engine =
            PrimeEngine::new(8, 20, PrimalityRule::with_exceptions([9])).unwrap();
        let result = engine.step().await.unwrap();
        assert_eq!(result.new_value, 9);
        assert!(result.was_immediately_prime);
    }

    #[tokio::test]
    async fn concurrent_steps_are_serialized() {
        use std::sync::Arc;

        let engine = Arc::new(engine_at(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move { engine.step().await }));
        }

        let mut landed = Vec::new();
        for handle in handles {
            landed.push(handle.await.unwrap().unwrap().new_value);
        }
        landed.sort_unstable();

        // Eight serialized steps from 0 visit the first eight primes in
        // some order; no prime is landed on twice.
        assert_eq!(landed, vec![2, 3, 5, 7, 11, 13, 17, 19]);
    }
}
