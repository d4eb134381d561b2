//! # Miller–Rabin — Incremental Primality Search State
//!
//! A `MillerRabin` holds one odd candidate n together with the residues every
//! round needs: n − 1 and its factorization n − 1 = 2^k · r with r odd. The
//! state supports two independent motions:
//!
//! - **Testing**: `test_witness(a)` runs one Miller–Rabin round with base a
//!   against the current n. It never moves the search position; the caller
//!   accumulates as many rounds as its error bound requires.
//! - **Searching**: `next_candidate()` moves n to the next larger odd integer
//!   that survives trial division by `SMALL_PRIMES`, recomputing the cached
//!   residues.
//!
//! ## Lifecycle
//!
//! `init(n, false)` tests exactly n: if trial division already shows n is
//! composite, no state is created (`None`), which is the normal "not prime"
//! answer. `init(n, true)` treats n as a starting point and always returns a
//! state positioned at the first candidate *after* n.
//!
//! The state is dropped (released) when it goes out of scope.

use rug::ops::RemRounding;
use rug::rand::RandState;
use rug::Integer;
use tracing::debug;

use crate::error::ArithError;
use crate::has_small_factor;

/// Outcome of one Miller–Rabin round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Witness {
    ProbablyPrime,
    Composite,
}

impl Witness {
    pub fn is_probably_prime(self) -> bool {
        self == Witness::ProbablyPrime
    }
}

/// Cheap trial-division filter: false means n is certainly not prime.
pub fn trial(n: &Integer) -> bool {
    *n > 1u32 && !has_small_factor(n)
}

/// First odd integer greater than `n` accepted by `accept`.
pub(crate) fn next_odd_after(n: &Integer, accept: impl Fn(&Integer) -> bool) -> Integer {
    let mut c = n.clone();
    if c.is_even() {
        c += 1u32;
    } else {
        c += 2u32;
    }
    while !accept(&c) {
        c += 2u32;
    }
    c
}

/// Search state for plain primality.
#[derive(Debug, Clone)]
pub struct MillerRabin {
    n: Integer,
    n_minus_one: Integer,
    /// Odd part of n − 1.
    r: Integer,
    /// n − 1 = 2^k · r.
    k: u32,
}

impl MillerRabin {
    /// Create a search state for `n`.
    ///
    /// Returns `Ok(None)` when `search` is false and `n` fails trial division.
    ///
    /// # Errors
    ///
    /// `NonPositive` when `n <= 0`.
    pub fn init(n: &Integer, search: bool) -> Result<Option<Self>, ArithError> {
        if *n <= 0u32 {
            return Err(ArithError::NonPositive);
        }
        if search {
            return Ok(Some(Self::at(next_odd_after(n, trial))));
        }
        if !trial(n) {
            debug!(bits = n.significant_bits(), "candidate rejected by trial division");
            return Ok(None);
        }
        Ok(Some(Self::at(n.clone())))
    }

    /// State positioned at `n` without any filtering.
    pub(crate) fn at(n: Integer) -> Self {
        let n_minus_one = Integer::from(&n - 1u32);
        let k = n_minus_one.find_one(0).unwrap_or(0);
        let r = Integer::from(&n_minus_one >> k);
        MillerRabin {
            n,
            n_minus_one,
            r,
            k,
        }
    }

    /// Advance to the next odd candidate that passes trial division.
    pub fn next_candidate(&mut self) {
        *self = Self::at(next_odd_after(&self.n, trial));
    }

    pub fn current(&self) -> &Integer {
        &self.n
    }

    /// One Miller–Rabin round with witness `base`.
    ///
    /// Bases congruent to 0 or ±1 modulo n carry no information and report
    /// `ProbablyPrime`; callers should draw bases from [2, n − 2].
    pub fn test_witness(&self, base: &Integer) -> Witness {
        if self.n == 2u32 || self.n == 3u32 {
            return Witness::ProbablyPrime;
        }
        if self.n < 2u32 || self.n.is_even() {
            return Witness::Composite;
        }
        let a = Integer::from(base.rem_euc(&self.n));
        if a == 0u32 || a == 1u32 || a == self.n_minus_one {
            return Witness::ProbablyPrime;
        }
        // r >= 1, so the power always exists.
        let Ok(mut y) = a.pow_mod(&self.r, &self.n) else {
            return Witness::Composite;
        };
        if y == 1u32 || y == self.n_minus_one {
            return Witness::ProbablyPrime;
        }
        for _ in 1..self.k {
            y.square_mut();
            y %= &self.n;
            if y == self.n_minus_one {
                return Witness::ProbablyPrime;
            }
            if y == 1u32 {
                return Witness::Composite;
            }
        }
        Witness::Composite
    }
}

/// Uniform witness base in [2, n − 2] (2 when that range is empty).
pub fn random_witness(n: &Integer, rng: &mut RandState<'_>) -> Integer {
    if *n <= 4u32 {
        return Integer::from(2u32);
    }
    let span = Integer::from(n - 3u32);
    Integer::from(span.random_below_ref(rng)) + 2u32
}

/// Trial division followed by `rounds` random Miller–Rabin rounds.
pub fn is_probable_prime(
    n: &Integer,
    rounds: u32,
    rng: &mut RandState<'_>,
) -> Result<bool, ArithError> {
    let Some(state) = MillerRabin::init(n, false)? else {
        return Ok(false);
    };
    Ok(passes_rounds(&state, rounds, rng))
}

/// Smallest odd probable prime strictly greater than `start`.
pub fn next_probable_prime(
    start: &Integer,
    rounds: u32,
    rng: &mut RandState<'_>,
) -> Result<Integer, ArithError> {
    let Some(mut state) = MillerRabin::init(start, true)? else {
        // Search mode always yields a state.
        return Err(ArithError::NonPositive);
    };
    let mut stepped = 0u64;
    while !passes_rounds(&state, rounds, rng) {
        state.next_candidate();
        stepped += 1;
    }
    debug!(stepped, bits = state.current().significant_bits(), "probable prime found");
    Ok(state.current().clone())
}

fn passes_rounds(state: &MillerRabin, rounds: u32, rng: &mut RandState<'_>) -> bool {
    (0..rounds).all(|_| {
        let base = random_witness(state.current(), rng);
        state.test_witness(&base).is_probably_prime()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: u64) -> Integer {
        Integer::from(v)
    }

    #[test]
    fn init_rejects_nine_without_search() {
        assert!(MillerRabin::init(&int(9), false).unwrap().is_none());
    }

    #[test]
    fn init_with_search_advances_nine_to_eleven() {
        let state = MillerRabin::init(&int(9), true).unwrap().unwrap();
        assert_eq!(*state.current(), 11);
    }

    #[test]
    fn search_skips_a_prime_start() {
        // Skip-first: starting at a prime still moves past it.
        let state = MillerRabin::init(&int(11), true).unwrap().unwrap();
        assert_eq!(*state.current(), 13);
    }

    #[test]
    fn init_rejects_non_positive() {
        assert_eq!(MillerRabin::init(&Integer::new(), false).err(), Some(ArithError::NonPositive));
        assert_eq!(
            MillerRabin::init(&Integer::from(-7), true).err(),
            Some(ArithError::NonPositive)
        );
    }

    #[test]
    fn trial_keeps_small_primes_and_rejects_one() {
        assert!(!trial(&int(1)));
        assert!(trial(&int(2)));
        assert!(trial(&int(311)));
        assert!(!trial(&int(313 * 3)));
    }

    #[test]
    fn next_candidate_is_odd_and_increasing() {
        let mut state = MillerRabin::init(&int(1000), true).unwrap().unwrap();
        let mut prev = state.current().clone();
        for _ in 0..50 {
            state.next_candidate();
            assert!(state.current().is_odd());
            assert!(*state.current() > prev);
            prev = state.current().clone();
        }
    }

    #[test]
    fn residues_track_candidate() {
        let mut state = MillerRabin::init(&int(97), false).unwrap().unwrap();
        // 96 = 2^5 * 3
        assert_eq!(state.k, 5);
        assert_eq!(state.r, 3);
        state.next_candidate();
        assert_eq!(*state.current(), 101);
        // 100 = 2^2 * 25
        assert_eq!(state.k, 2);
        assert_eq!(state.r, 25);
    }

    #[test]
    fn witness_accepts_primes() {
        for p in [5u64, 7, 97, 7919, 1_000_003] {
            let state = MillerRabin::init(&int(p), false).unwrap().unwrap();
            for a in [2u64, 3, 5, 7, 11] {
                assert_eq!(state.test_witness(&int(a)), Witness::ProbablyPrime, "p={} a={}", p, a);
            }
        }
    }

    #[test]
    fn witness_rejects_strong_pseudoprime_with_other_base() {
        // 2047 = 23 * 89 is a strong pseudoprime to base 2 but not base 3.
        let state = MillerRabin::at(int(2047));
        assert_eq!(state.test_witness(&int(2)), Witness::ProbablyPrime);
        assert_eq!(state.test_witness(&int(3)), Witness::Composite);
    }

    #[test]
    fn witness_rejects_pseudoprime_beyond_trial_table() {
        // 829 * 1657, strong pseudoprime to bases 2 and 3, no factor in the trial table.
        let state = MillerRabin::init(&int(1_373_653), false).unwrap().unwrap();
        assert_eq!(state.test_witness(&int(5)), Witness::Composite);
    }

    #[test]
    fn uninformative_bases() {
        let state = MillerRabin::at(int(101));
        assert_eq!(state.test_witness(&int(0)), Witness::ProbablyPrime);
        assert_eq!(state.test_witness(&int(100)), Witness::ProbablyPrime);
        assert_eq!(state.test_witness(&Integer::from(-1)), Witness::ProbablyPrime);
    }

    #[test]
    fn witness_base_is_reduced_modulo_n() {
        // 2047 = 23 * 89 is a strong pseudoprime to base 2 but not to base 3.
        let state = MillerRabin::at(int(2047));
        assert_eq!(state.test_witness(&Integer::from(-2045)), Witness::ProbablyPrime);
        assert_eq!(state.test_witness(&int(2050)), Witness::Composite);
        assert_eq!(state.test_witness(&Integer::from(-2044)), Witness::Composite);
    }

    #[test]
    fn random_witness_in_range() {
        let mut rng = RandState::new();
        let n = int(11);
        for _ in 0..200 {
            let a = random_witness(&n, &mut rng);
            assert!(a >= 2u32 && a <= 9u32, "witness {} out of range", a);
        }
        assert_eq!(random_witness(&int(3), &mut rng), 2);
    }

    #[test]
    fn drivers_agree_with_gmp() {
        let mut rng = RandState::new();
        for n in [1u64, 2, 9, 97, 561, 7919, 1_000_001, 1_000_003] {
            let expected = Integer::from(n).is_probably_prime(30) != rug::integer::IsPrime::No;
            assert_eq!(is_probable_prime(&int(n), 20, &mut rng).unwrap(), expected, "n={}", n);
        }
        let next = next_probable_prime(&int(1_000_000), 20, &mut rng).unwrap();
        assert_eq!(next, Integer::from(1_000_000u32).next_prime());
    }
}
