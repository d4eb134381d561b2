//! # Registry — Byte-Level Session API
//!
//! The caller boundary. Every integer goes in and out as a two's-complement
//! byte buffer (see `codec`), and stateful objects are referred to by small
//! copyable handles instead of pointers.
//!
//! A `Session` owns every table and search state it hands out. Handles are
//! ids into the session's maps; ids are never reused, so a released or
//! foreign handle is reported as `StaleHandle` instead of touching freed
//! state. Dropping the session releases everything still live.
//!
//! ## Operations
//!
//! | Capability | Methods |
//! |------------|---------|
//! | Exponentiation | `pow_mod`, `simultaneous_pow_mod`, `legendre` |
//! | Fixed-base tables | `compile_table`, `table_pow`, `release_table` |
//! | Prime search | `prime_search_init`, `prime_next_candidate`, `prime_test_witness`, `prime_current`, `release_prime_search` |
//! | Safe-prime search | `safe_search_init`, `safe_next_candidate`, `safe_test_witness`, `safe_current`, `release_safe_search` |

use std::collections::HashMap;

use tracing::debug;

use crate::codec::{decode, decode_many, encode};
use crate::error::ArithError;
use crate::fpowm::FixedBaseTable;
use crate::miller_rabin::{MillerRabin, Witness};
use crate::powm;
use crate::safe_prime::{SafeMillerRabin, Side};

macro_rules! handle_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Numeric identifier, stable for the lifetime of the handle.
            pub fn id(self) -> u64 {
                self.0
            }
        }
    };
}

handle_type!(
    /// Handle to a fixed-base exponentiation table.
    TableHandle
);
handle_type!(
    /// Handle to a plain primality search state.
    PrimeHandle
);
handle_type!(
    /// Handle to a safe-primality search state.
    SafePrimeHandle
);

/// Owner of all handle-addressed state for one caller.
#[derive(Default)]
pub struct Session {
    next_id: u64,
    tables: HashMap<u64, FixedBaseTable>,
    primes: HashMap<u64, MillerRabin>,
    safe_primes: HashMap<u64, SafeMillerRabin>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Number of tables and search states not yet released.
    pub fn live_handles(&self) -> usize {
        self.tables.len() + self.primes.len() + self.safe_primes.len()
    }

    fn allocate_id(&mut self) -> u64 {
        // Zero is never handed out.
        self.next_id += 1;
        self.next_id
    }

    // ── Exponentiation ──────────────────────────────────────────

    pub fn pow_mod(&self, base: &[u8], exponent: &[u8], modulus: &[u8]) -> Result<Vec<u8>, ArithError> {
        let result = powm::pow_mod(&decode(base)?, &decode(exponent)?, &decode(modulus)?)?;
        Ok(encode(&result))
    }

    pub fn simultaneous_pow_mod<B: AsRef<[u8]>>(
        &self,
        bases: &[B],
        exponents: &[B],
        modulus: &[u8],
    ) -> Result<Vec<u8>, ArithError> {
        let bases = decode_many(bases)?;
        let exponents = decode_many(exponents)?;
        let result = powm::simultaneous_pow_mod(&bases, &exponents, &decode(modulus)?)?;
        Ok(encode(&result))
    }

    pub fn legendre(&self, op: &[u8], odd_prime: &[u8]) -> Result<i32, ArithError> {
        powm::legendre(&decode(op)?, &decode(odd_prime)?)
    }

    // ── Fixed-base tables ───────────────────────────────────────

    pub fn compile_table(
        &mut self,
        base: &[u8],
        modulus: &[u8],
        block_width: u32,
        max_exponent_bits: u32,
    ) -> Result<TableHandle, ArithError> {
        let table = FixedBaseTable::new(
            &decode(base)?,
            &decode(modulus)?,
            block_width,
            max_exponent_bits,
        )?;
        let id = self.allocate_id();
        self.tables.insert(id, table);
        Ok(TableHandle(id))
    }

    pub fn table_pow(&self, handle: TableHandle, exponent: &[u8]) -> Result<Vec<u8>, ArithError> {
        let table = self
            .tables
            .get(&handle.0)
            .ok_or(ArithError::StaleHandle { id: handle.0 })?;
        Ok(encode(&table.pow(&decode(exponent)?)?))
    }

    pub fn release_table(&mut self, handle: TableHandle) -> Result<(), ArithError> {
        self.tables
            .remove(&handle.0)
            .map(|_| debug!(id = handle.0, "fixed-base table released"))
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }

    // ── Prime search ────────────────────────────────────────────

    /// `Ok(None)` is the "not prime" answer from trial division.
    pub fn prime_search_init(&mut self, n: &[u8], search: bool) -> Result<Option<PrimeHandle>, ArithError> {
        let Some(state) = MillerRabin::init(&decode(n)?, search)? else {
            return Ok(None);
        };
        let id = self.allocate_id();
        self.primes.insert(id, state);
        Ok(Some(PrimeHandle(id)))
    }

    pub fn prime_next_candidate(&mut self, handle: PrimeHandle) -> Result<(), ArithError> {
        self.prime_state_mut(handle)?.next_candidate();
        Ok(())
    }

    pub fn prime_test_witness(&self, handle: PrimeHandle, base: &[u8]) -> Result<Witness, ArithError> {
        let base = decode(base)?;
        Ok(self.prime_state(handle)?.test_witness(&base))
    }

    pub fn prime_current(&self, handle: PrimeHandle) -> Result<Vec<u8>, ArithError> {
        Ok(encode(self.prime_state(handle)?.current()))
    }

    pub fn release_prime_search(&mut self, handle: PrimeHandle) -> Result<(), ArithError> {
        self.primes
            .remove(&handle.0)
            .map(|_| debug!(id = handle.0, "prime search released"))
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }

    fn prime_state(&self, handle: PrimeHandle) -> Result<&MillerRabin, ArithError> {
        self.primes
            .get(&handle.0)
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }

    fn prime_state_mut(&mut self, handle: PrimeHandle) -> Result<&mut MillerRabin, ArithError> {
        self.primes
            .get_mut(&handle.0)
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }

    // ── Safe-prime search ───────────────────────────────────────

    pub fn safe_search_init(
        &mut self,
        n: &[u8],
        search: bool,
    ) -> Result<Option<SafePrimeHandle>, ArithError> {
        let Some(state) = SafeMillerRabin::init(&decode(n)?, search)? else {
            return Ok(None);
        };
        let id = self.allocate_id();
        self.safe_primes.insert(id, state);
        Ok(Some(SafePrimeHandle(id)))
    }

    pub fn safe_next_candidate(&mut self, handle: SafePrimeHandle) -> Result<(), ArithError> {
        self.safe_state_mut(handle)?.next_candidate();
        Ok(())
    }

    /// Even `index` tests n, odd `index` tests (n − 1)/2.
    pub fn safe_test_witness(
        &self,
        handle: SafePrimeHandle,
        base: &[u8],
        index: i64,
    ) -> Result<Witness, ArithError> {
        let base = decode(base)?;
        Ok(self
            .safe_state(handle)?
            .test_witness(&base, Side::from_index(index)))
    }

    /// The n side of the pair.
    pub fn safe_current(&self, handle: SafePrimeHandle) -> Result<Vec<u8>, ArithError> {
        Ok(encode(self.safe_state(handle)?.current()))
    }

    pub fn release_safe_search(&mut self, handle: SafePrimeHandle) -> Result<(), ArithError> {
        self.safe_primes
            .remove(&handle.0)
            .map(|_| debug!(id = handle.0, "safe-prime search released"))
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }

    fn safe_state(&self, handle: SafePrimeHandle) -> Result<&SafeMillerRabin, ArithError> {
        self.safe_primes
            .get(&handle.0)
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }

    fn safe_state_mut(&mut self, handle: SafePrimeHandle) -> Result<&mut SafeMillerRabin, ArithError> {
        self.safe_primes
            .get_mut(&handle.0)
            .ok_or(ArithError::StaleHandle { id: handle.0 })
    }
}
