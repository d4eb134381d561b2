//! # Fpowm — Fixed-Base Exponentiation Tables
//!
//! When the same base g and modulus m are used with many exponents, the
//! exponent can be split into `w` slices of `s = ceil(max_bits / w)` bits:
//!
//! ```text
//! e = e_0 + e_1·2^s + … + e_{w-1}·2^{(w-1)s}
//! g^e = Π (g^{2^{is}})^{e_i}
//! ```
//!
//! The powers `g_i = g^{2^{is}}` are fixed, so all 2^w subset products of the
//! `g_i` are computed once at build time. Each exponentiation is then a
//! simultaneous exponentiation over `w` terms of only `s` bits: `s` squarings
//! and at most `s` multiplications, against `max_bits` squarings for a plain
//! `pow_mod`.
//!
//! Larger block widths trade memory (2^w residues) for fewer squarings.

use rug::ops::RemRounding;
use rug::Integer;
use tracing::debug;

use crate::error::ArithError;
use crate::powm::SubsetTable;

/// Block width used when the caller does not choose one.
pub const DEFAULT_BLOCK_WIDTH: u32 = 16;

/// Upper bound on block width (2^16 precomputed residues).
pub const MAX_BLOCK_WIDTH: u32 = 16;

/// Precomputed table for base^e mod modulus with e < 2^max_exponent_bits.
///
/// Memory is released when the table is dropped.
pub struct FixedBaseTable {
    modulus: Integer,
    block_width: u32,
    max_exponent_bits: u32,
    slice_bits: u32,
    pieces: u32,
    table: SubsetTable,
}

impl FixedBaseTable {
    /// Build a table for `base` and `modulus`.
    ///
    /// # Errors
    ///
    /// `ZeroModulus` for a zero modulus, `InvalidBlockWidth` when
    /// `block_width` is outside `1..=MAX_BLOCK_WIDTH`.
    pub fn new(
        base: &Integer,
        modulus: &Integer,
        block_width: u32,
        max_exponent_bits: u32,
    ) -> Result<Self, ArithError> {
        if *modulus == 0 {
            return Err(ArithError::ZeroModulus);
        }
        if block_width == 0 || block_width > MAX_BLOCK_WIDTH {
            return Err(ArithError::InvalidBlockWidth { width: block_width });
        }
        let m = Integer::from(modulus.abs_ref());
        let slice_bits = max_exponent_bits.div_ceil(block_width).max(1);
        let pieces = max_exponent_bits.div_ceil(slice_bits);

        let mut powers = Vec::with_capacity(pieces as usize);
        let mut g = Integer::from(base.rem_euc(&m));
        for i in 0..pieces {
            if i > 0 {
                for _ in 0..slice_bits {
                    g.square_mut();
                    g %= &m;
                }
            }
            powers.push(g.clone());
        }
        let table = SubsetTable::new(&powers, &m);
        debug!(
            block_width,
            max_exponent_bits,
            slice_bits,
            entries = table.len(),
            "fixed-base table compiled"
        );

        Ok(FixedBaseTable {
            modulus: m,
            block_width,
            max_exponent_bits,
            slice_bits,
            pieces,
            table,
        })
    }

    /// Build a table with `DEFAULT_BLOCK_WIDTH`.
    pub fn with_default_width(
        base: &Integer,
        modulus: &Integer,
        max_exponent_bits: u32,
    ) -> Result<Self, ArithError> {
        Self::new(base, modulus, DEFAULT_BLOCK_WIDTH, max_exponent_bits)
    }

    /// base^exponent mod modulus.
    ///
    /// # Errors
    ///
    /// `NegativeExponent`, or `ExponentTooLarge` when the exponent has more
    /// bits than the table was built for.
    pub fn pow(&self, exponent: &Integer) -> Result<Integer, ArithError> {
        if *exponent < 0 {
            return Err(ArithError::NegativeExponent);
        }
        let bits = exponent.significant_bits();
        if bits > self.max_exponent_bits {
            return Err(ArithError::ExponentTooLarge {
                bits,
                max_bits: self.max_exponent_bits,
            });
        }
        let slices: Vec<Integer> = (0..self.pieces)
            .map(|i| Integer::from(exponent >> (i * self.slice_bits)).keep_bits(self.slice_bits))
            .collect();
        Ok(self.table.scan(&slices, &self.modulus))
    }

    pub fn modulus(&self) -> &Integer {
        &self.modulus
    }

    pub fn block_width(&self) -> u32 {
        self.block_width
    }

    pub fn max_exponent_bits(&self) -> u32 {
        self.max_exponent_bits
    }
}
