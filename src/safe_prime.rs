//! # Safe Prime — Paired Miller–Rabin Search
//!
//! A safe prime is a prime n such that m = (n − 1)/2 is also prime. The search
//! state owns two `MillerRabin` sub-states, one for n and one for m, and only
//! ever moves them together, so n = 2m + 1 holds for every observable state.
//!
//! Witness rounds are dispatched per side: both n and m must pass
//! independently. Callers conventionally alternate sides with a round index
//! (`Side::from_index`): even rounds test n, odd rounds test m.
//!
//! Trial division is applied to both sides, so candidate stepping skips every
//! n for which either n or (n − 1)/2 has a small factor.

use rug::rand::RandState;
use rug::Integer;
use tracing::debug;

use crate::error::ArithError;
use crate::miller_rabin::{next_odd_after, random_witness, trial, MillerRabin, Witness};

/// Which half of a safe-prime pair a witness round runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The candidate n itself.
    N,
    /// The Sophie Germain half m = (n − 1)/2.
    M,
}

impl Side {
    /// Even selectors pick n, odd selectors pick m.
    pub fn from_index(index: i64) -> Self {
        if index % 2 == 0 {
            Side::N
        } else {
            Side::M
        }
    }
}

/// Trial division on both n and (n − 1)/2.
pub fn safe_trial(n: &Integer) -> bool {
    trial(n) && trial(&half_of(n))
}

fn half_of(n: &Integer) -> Integer {
    Integer::from(n - 1u32) >> 1u32
}

/// Search state for safe primality.
#[derive(Debug, Clone)]
pub struct SafeMillerRabin {
    n_state: MillerRabin,
    m_state: MillerRabin,
}

impl SafeMillerRabin {
    /// Create a paired search state for `n`.
    ///
    /// Returns `Ok(None)` when `search` is false and either n or (n − 1)/2
    /// fails trial division. With `search` the state starts at the first
    /// acceptable candidate after `n`.
    ///
    /// # Errors
    ///
    /// `NonPositive` when `n <= 0`.
    pub fn init(n: &Integer, search: bool) -> Result<Option<Self>, ArithError> {
        if *n <= 0u32 {
            return Err(ArithError::NonPositive);
        }
        if search {
            return Ok(Some(Self::at(next_odd_after(n, safe_trial))));
        }
        if !safe_trial(n) {
            debug!(bits = n.significant_bits(), "safe candidate rejected by trial division");
            return Ok(None);
        }
        Ok(Some(Self::at(n.clone())))
    }

    fn at(n: Integer) -> Self {
        let m = half_of(&n);
        SafeMillerRabin {
            n_state: MillerRabin::at(n),
            m_state: MillerRabin::at(m),
        }
    }

    /// Step n by 2 (and m by 1) until both pass trial division.
    pub fn next_candidate(&mut self) {
        *self = Self::at(next_odd_after(self.n_state.current(), safe_trial));
    }

    /// The candidate n.
    pub fn current(&self) -> &Integer {
        self.n_state.current()
    }

    /// The paired value m = (n − 1)/2.
    pub fn half(&self) -> &Integer {
        self.m_state.current()
    }

    /// One Miller–Rabin round on the chosen side.
    pub fn test_witness(&self, base: &Integer, side: Side) -> Witness {
        match side {
            Side::N => self.n_state.test_witness(base),
            Side::M => self.m_state.test_witness(base),
        }
    }
}

/// Trial division on both sides followed by `rounds` alternating rounds.
pub fn is_safe_prime(n: &Integer, rounds: u32, rng: &mut RandState<'_>) -> Result<bool, ArithError> {
    let Some(state) = SafeMillerRabin::init(n, false)? else {
        return Ok(false);
    };
    Ok(passes_rounds(&state, rounds, rng))
}

/// Smallest safe probable prime strictly greater than `start`.
pub fn next_safe_prime(
    start: &Integer,
    rounds: u32,
    rng: &mut RandState<'_>,
) -> Result<Integer, ArithError> {
    let Some(mut state) = SafeMillerRabin::init(start, true)? else {
        return Err(ArithError::NonPositive);
    };
    let mut stepped = 0u64;
    while !passes_rounds(&state, rounds, rng) {
        state.next_candidate();
        stepped += 1;
    }
    debug!(stepped, bits = state.current().significant_bits(), "safe prime found");
    Ok(state.current().clone())
}

fn passes_rounds(state: &SafeMillerRabin, rounds: u32, rng: &mut RandState<'_>) -> bool {
    (0..rounds).all(|i| {
        let side = Side::from_index(i64::from(i));
        let modulus = match side {
            Side::N => state.current(),
            Side::M => state.half(),
        };
        let base = random_witness(modulus, rng);
        state.test_witness(&base, side).is_probably_prime()
    })
}
