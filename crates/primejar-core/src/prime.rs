//! Primality testing for the step engine.
//!
//! The canonical rule is deterministic trial division: 0 and 1 are not
//! prime, 2 is, even numbers above 2 are not, and odd candidates are
//! divided by every odd divisor whose square does not exceed them. The
//! loop compares `divisor * divisor` against the candidate instead of
//! taking a square root, keeping the whole test in integer arithmetic.
//!
//! [`PrimalityRule`] layers a configured set of exception values on top
//! of the canonical test. Historical firmware shipped with `8_648_640`
//! hardwired as prime; that behavior is reproducible only by listing the
//! value in the configuration, and the device binary warns when any
//! exception is configured.

use std::collections::BTreeSet;

/// Deterministic trial-division primality test.
///
/// Matches the classical definition for all `u64` inputs:
/// `is_prime(0) == false`, `is_prime(1) == false`, `is_prime(2) == true`,
/// and even candidates above 2 are rejected without division.
pub fn is_prime(candidate: u64) -> bool {
    if candidate < 2 {
        return false;
    }
    if candidate == 2 {
        return true;
    }
    if candidate.checked_rem(2) == Some(0) {
        return false;
    }

    let mut divisor: u64 = 3;
    while let Some(square) = divisor.checked_mul(divisor) {
        if square > candidate {
            return true;
        }
        if candidate.checked_rem(divisor) == Some(0) {
            return false;
        }
        divisor = match divisor.checked_add(2) {
            Some(next) => next,
            // Divisor range exhausted; no factor found.
            None => return true,
        };
    }
    true
}

/// Primality rule with configurable exception values.
///
/// The exception set contains values the device reports as prime even
/// though trial division says otherwise. It is empty unless explicitly
/// configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimalityRule {
    /// Values treated as prime regardless of the canonical test.
    extra_primes: BTreeSet<u64>,
}

impl PrimalityRule {
    /// Create the canonical rule with no exceptions.
    pub const fn canonical() -> Self {
        Self {
            extra_primes: BTreeSet::new(),
        }
    }

    /// Create a rule with the given exception values.
    pub fn with_exceptions<I: IntoIterator<Item = u64>>(extra_primes: I) -> Self {
        Self {
            extra_primes: extra_primes.into_iter().collect(),
        }
    }

    /// Test a candidate under this rule.
    pub fn is_prime(&self, candidate: u64) -> bool {
        self.extra_primes.contains(&candidate) || is_prime(candidate)
    }

    /// Return the configured exception values.
    pub const fn exceptions(&self) -> &BTreeSet<u64> {
        &self.extra_primes
    }

    /// Whether any exception values are configured.
    pub fn has_exceptions(&self) -> bool {
        !self.extra_primes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_ten_candidates() {
        let expected = [
            (0, false),
            (1, false),
            (2, true),
            (3, true),
            (4, false),
            (5, true),
            (6, false),
            (7, true),
            (8, false),
            (9, false),
        ];
        for (candidate, verdict) in expected {
            assert_eq!(
                is_prime(candidate),
                verdict,
                "is_prime({candidate}) should be {verdict}"
            );
        }
    }

    #[test]
    fn large_candidates_near_ten_million() {
        assert!(!is_prime(9_999_990));
        assert!(is_prime(9_999_991));
        assert!(!is_prime(9_999_992));
    }

    #[test]
    fn perfect_squares_are_composite() {
        assert!(!is_prime(25));
        assert!(!is_prime(49));
        assert!(!is_prime(121));
    }

    #[test]
    fn canonical_rule_has_no_exceptions() {
        let rule = PrimalityRule::canonical();
        assert!(!rule.has_exceptions());
        assert!(!rule.is_prime(8_648_640));
    }

    #[test]
    fn exception_values_report_prime() {
        let rule = PrimalityRule::with_exceptions([8_648_640]);
        assert!(rule.has_exceptions());
        assert!(rule.is_prime(8_648_640));
        // The canonical cases are unaffected.
        assert!(rule.is_prime(7));
        assert!(!rule.is_prime(9));
    }
}
