//! # Codec — Two's-Complement Byte Buffers
//!
//! Every value crossing the byte API is a signed big-endian two's-complement
//! buffer. Internally everything is a `rug::Integer` (sign-magnitude), so this
//! module is the only place where the two representations meet.
//!
//! ## Wire Format
//!
//! - Most significant byte first.
//! - If the high bit of byte 0 is set the value is negative and equals the
//!   unsigned magnitude of the buffer minus `2^(8·len)`.
//! - `encode` always emits one explicit sign byte in front of the magnitude:
//!   `0x00` for non-negative values, `0xFF` for negative ones. The natural
//!   minimal encoding sometimes needs that byte and sometimes does not; always
//!   emitting it keeps the output length a function of `|value|` alone.
//!
//! The magnitude length follows GMP's `sizeinbase(·, 2)` convention, so zero
//! occupies one magnitude byte and encodes as `[0x00, 0x00]`.

use rug::integer::Order;
use rug::Integer;
use std::cmp::Ordering;

use crate::error::ArithError;

/// Decode a two's-complement big-endian buffer.
pub fn decode(bytes: &[u8]) -> Result<Integer, ArithError> {
    let first = *bytes.first().ok_or(ArithError::EmptyBuffer)?;
    let mut value = Integer::from_digits(bytes, Order::Msf);
    if first & 0x80 != 0 {
        // Buffer holds 2^(8·len) + value.
        value -= Integer::from(1u32) << (8 * bytes.len());
    }
    Ok(value)
}

/// Encode `value` as a sign byte followed by its two's-complement magnitude.
pub fn encode(value: &Integer) -> Vec<u8> {
    let len = magnitude_len(value);
    let mut out = vec![0u8; len + 1];
    match value.cmp0() {
        Ordering::Less => {
            // 2^(8·(len+1)) + value fits in len+1 bytes and starts with 0xFF
            // because |value| < 2^(8·len).
            let wrapped = (Integer::from(1u32) << (8 * (len + 1))) + value;
            write_be(&wrapped, &mut out);
        }
        Ordering::Equal | Ordering::Greater => {
            write_be(value, &mut out[1..]);
        }
    }
    out
}

/// Decode a batch of buffers, failing on the first empty one.
pub fn decode_many<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Vec<Integer>, ArithError> {
    buffers.iter().map(|b| decode(b.as_ref())).collect()
}

/// Byte length of `|value|`, at least one.
fn magnitude_len(value: &Integer) -> usize {
    let bits = value.significant_bits() as usize;
    bits.div_ceil(8).max(1)
}

/// Right-align the big-endian magnitude of a non-negative `v` in `out`.
fn write_be(v: &Integer, out: &mut [u8]) {
    let digits = v.to_digits::<u8>(Order::Msf);
    let start = out.len() - digits.len();
    out[start..].copy_from_slice(&digits);
}
