//! Error type shared by every arithmetic entry point.
//!
//! All variants are caller contract violations or degenerate numeric inputs.
//! "n is composite" is never an error: it is reported as data
//! (`Option::None` from an `init`, or `Witness::Composite`).

/// Errors from codec, exponentiation, table and search operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArithError {
    /// A byte buffer with no bytes was passed to the decoder.
    EmptyBuffer,
    /// Simultaneous exponentiation was called with no terms.
    EmptyBatch,
    /// `bases` and `exponents` differ in length.
    LengthMismatch { bases: usize, exponents: usize },
    /// Modular arithmetic with a zero modulus.
    ZeroModulus,
    /// The modulus is not valid for this operation (e.g. an even "odd prime").
    InvalidModulus,
    /// A negative exponent was used with a base that has no inverse.
    NotInvertible,
    /// Exponent does not fit the fixed-base table it was applied to.
    ExponentTooLarge { bits: u32, max_bits: u32 },
    /// Fixed-base tables do not accept negative exponents.
    NegativeExponent,
    /// Block width outside `1..=MAX_BLOCK_WIDTH`.
    InvalidBlockWidth { width: u32 },
    /// Primality search over a non-positive integer.
    NonPositive,
    /// The handle was released or never belonged to this session.
    StaleHandle { id: u64 },
}

impl std::fmt::Display for ArithError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithError::EmptyBuffer => write!(f, "cannot decode an empty byte buffer"),
            ArithError::EmptyBatch => write!(f, "simultaneous exponentiation needs at least one term"),
            ArithError::LengthMismatch { bases, exponents } => write!(
                f,
                "got {} bases but {} exponents",
                bases, exponents
            ),
            ArithError::ZeroModulus => write!(f, "modulus is zero"),
            ArithError::InvalidModulus => write!(f, "modulus must be an odd positive integer"),
            ArithError::NotInvertible => write!(f, "base is not invertible modulo the modulus"),
            ArithError::ExponentTooLarge { bits, max_bits } => write!(
                f,
                "exponent has {} bits but table was built for at most {}",
                bits, max_bits
            ),
            ArithError::NegativeExponent => write!(f, "fixed-base table exponent is negative"),
            ArithError::InvalidBlockWidth { width } => {
                write!(f, "block width {} is out of range", width)
            }
            ArithError::NonPositive => write!(f, "primality check of non-positive integer"),
            ArithError::StaleHandle { id } => write!(f, "handle {} is not live", id),
        }
    }
}

impl std::error::Error for ArithError {}
