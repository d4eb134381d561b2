//! # Powm — Single and Simultaneous Modular Exponentiation
//!
//! `pow_mod` is a thin wrapper over GMP's `mpz_powm`. `simultaneous_pow_mod`
//! computes a product of powers Π bᵢ^eᵢ mod m in one left-to-right pass:
//!
//! 1. Terms are split into blocks of `SPOWM_BLOCK_WIDTH`.
//! 2. For each block every subset product of the bases is precomputed
//!    (2^w entries, each one multiplication from a smaller subset).
//! 3. The exponents of the block are scanned bit by bit from the top: one
//!    squaring per bit, plus one multiplication by the table entry selected
//!    by the column of exponent bits.
//!
//! This shares the squarings across all terms of a block, so a block of w
//! terms costs about as many squarings as a single exponentiation. The same
//! table-and-scan core drives the fixed-base tables in `fpowm`.
//!
//! Intermediate values differ from sequential exponentiation; the final
//! residue is identical.

use rug::ops::RemRounding;
use rug::Integer;

use crate::error::ArithError;

/// Terms per block in simultaneous exponentiation (2^5 table entries).
pub const SPOWM_BLOCK_WIDTH: usize = 5;

/// base^exponent mod modulus, result in [0, |modulus|).
///
/// Negative exponents use the inverse of `base`.
pub fn pow_mod(base: &Integer, exponent: &Integer, modulus: &Integer) -> Result<Integer, ArithError> {
    if *modulus == 0 {
        return Err(ArithError::ZeroModulus);
    }
    base.clone()
        .pow_mod(exponent, modulus)
        .map_err(|_| ArithError::NotInvertible)
}

/// Π bases[i]^exponents[i] mod modulus, result in [0, |modulus|).
pub fn simultaneous_pow_mod(
    bases: &[Integer],
    exponents: &[Integer],
    modulus: &Integer,
) -> Result<Integer, ArithError> {
    if bases.len() != exponents.len() {
        return Err(ArithError::LengthMismatch {
            bases: bases.len(),
            exponents: exponents.len(),
        });
    }
    if bases.is_empty() {
        return Err(ArithError::EmptyBatch);
    }
    if *modulus == 0 {
        return Err(ArithError::ZeroModulus);
    }
    let m = Integer::from(modulus.abs_ref());

    // Fold negative exponents into inverted bases so the scan only sees e >= 0.
    let mut reduced_bases = Vec::with_capacity(bases.len());
    let mut abs_exponents = Vec::with_capacity(exponents.len());
    for (b, e) in bases.iter().zip(exponents) {
        let b = Integer::from(b.rem_euc(&m));
        if *e < 0 {
            let inv = b.invert(&m).map_err(|_| ArithError::NotInvertible)?;
            reduced_bases.push(inv);
            abs_exponents.push(Integer::from(e.abs_ref()));
        } else {
            reduced_bases.push(b);
            abs_exponents.push(e.clone());
        }
    }

    let mut result = Integer::from(1u32) % &m;
    for (bs, es) in reduced_bases
        .chunks(SPOWM_BLOCK_WIDTH)
        .zip(abs_exponents.chunks(SPOWM_BLOCK_WIDTH))
    {
        let table = SubsetTable::new(bs, &m);
        let partial = table.scan(es, &m);
        result = Integer::from(&result * &partial) % &m;
    }
    Ok(result)
}

/// Legendre symbol (op / odd_prime) in {-1, 0, 1}.
///
/// `odd_prime` is only checked for being odd and positive; primality is the
/// caller's responsibility.
pub fn legendre(op: &Integer, odd_prime: &Integer) -> Result<i32, ArithError> {
    if odd_prime.cmp0() != std::cmp::Ordering::Greater || odd_prime.is_even() {
        return Err(ArithError::InvalidModulus);
    }
    Ok(op.legendre(odd_prime))
}

/// All 2^w subset products of w bases modulo m.
///
/// Entry `i` is the product of the bases whose index bit is set in `i`.
pub(crate) struct SubsetTable {
    entries: Vec<Integer>,
}

impl SubsetTable {
    /// Build the table; `bases` must already be reduced modulo `m`.
    pub(crate) fn new(bases: &[Integer], m: &Integer) -> Self {
        let size = 1usize << bases.len();
        let mut entries: Vec<Integer> = Vec::with_capacity(size);
        entries.push(Integer::from(1u32) % m);
        for i in 1..size {
            let low = i.trailing_zeros() as usize;
            let next = Integer::from(&entries[i & (i - 1)] * &bases[low]) % m;
            entries.push(next);
        }
        SubsetTable { entries }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Π bases[j]^exponents[j] mod m with one squaring per exponent bit.
    ///
    /// `exponents` must be non-negative and no longer than the base list.
    pub(crate) fn scan(&self, exponents: &[Integer], m: &Integer) -> Integer {
        let top = exponents
            .iter()
            .map(|e| e.significant_bits())
            .max()
            .unwrap_or(0);
        let mut acc = self.entries[0].clone();
        for bit in (0..top).rev() {
            acc.square_mut();
            acc %= m;
            let mut idx = 0usize;
            for (j, e) in exponents.iter().enumerate() {
                if e.get_bit(bit) {
                    idx |= 1 << j;
                }
            }
            if idx != 0 {
                acc *= &self.entries[idx];
                acc %= m;
            }
        }
        acc
    }
}
