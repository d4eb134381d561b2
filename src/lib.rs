//! Arbitrary-precision modular arithmetic and primality search over GMP.
//!
//! Integers cross the public byte API (`registry::Session`) as signed
//! two's-complement buffers (`codec`). Behind it sit stateless exponentiation
//! (`powm`), precomputed fixed-base tables (`fpowm`), and the incremental
//! Miller–Rabin search states for primes (`miller_rabin`) and safe primes
//! (`safe_prime`).

pub mod codec;
pub mod config;
pub mod error;
pub mod fpowm;
pub mod miller_rabin;
pub mod powm;
pub mod registry;
pub mod safe_prime;

pub use error::ArithError;

use rug::Integer;

/// Primes below 317, used to discard search candidates before any
/// Miller–Rabin round is spent on them.
const SMALL_PRIMES: [u32; 64] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311,
];

/// True when `n` has a proper factor in `SMALL_PRIMES`.
///
/// The table primes themselves are not flagged.
pub fn has_small_factor(n: &Integer) -> bool {
    SMALL_PRIMES
        .iter()
        .find(|&&p| n.is_divisible_u(p))
        .is_some_and(|&p| *n > p)
}
