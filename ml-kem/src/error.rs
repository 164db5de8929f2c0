use core::fmt;

use hybrid_array::{Array, ArraySize};

/// The kind of byte string that a length error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Input {
    /// An encoded encapsulation key.
    EncapsulationKey,
    /// An encoded decapsulation key.
    DecapsulationKey,
    /// A ciphertext.
    Ciphertext,
    /// A 32-byte encapsulation message `m`.
    Message,
    /// A 64-byte key generation seed `d || z`.
    Seed,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EncapsulationKey => "encapsulation key",
            Self::DecapsulationKey => "decapsulation key",
            Self::Ciphertext => "ciphertext",
            Self::Message => "message",
            Self::Seed => "seed",
        })
    }
}

/// Errors used throughout this crate.
///
/// Decapsulation of a correctly sized ciphertext never fails; a malformed ciphertext yields the
/// implicit-rejection key instead of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A key, ciphertext, or seed does not have the length fixed by the parameter set.
    #[error("Invalid {input} length: expected {expected}, got {actual}")]
    InputLength {
        /// The kind of input that was rejected.
        input: Input,
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
    /// The requested parameter set is unknown, or does not match the input.
    #[error("Unknown or mismatched parameter set")]
    Configuration,
    /// An encapsulation key contains a coefficient that is not reduced modulo q (FIPS 203, 7.2).
    #[error("Encapsulation key failed the modulus check")]
    InvalidEncapsulationKey,
    /// The hash `H(ek)` stored in a decapsulation key does not match its encapsulation key
    /// (FIPS 203, 7.3).
    #[error("Decapsulation key failed the hash check")]
    InvalidDecapsulationKey,
}

/// Result type used by this crate.
pub type Result<T> = core::result::Result<T, Error>;

// Copy `bytes` into a fixed-size array, or report which input had the wrong length.
pub(crate) fn fixed_length<N: ArraySize>(input: Input, bytes: &[u8]) -> Result<Array<u8, N>> {
    Array::try_from(bytes).map_err(|_| Error::InputLength {
        input,
        expected: N::USIZE,
        actual: bytes.len(),
    })
}
