#![no_std]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::pedantic)] // Be pedantic by default
#![warn(clippy::integer_division_remainder_used)] // Be judicious about using `/` and `%`
#![allow(clippy::clone_on_copy)] // Be explicit about moving data

//! # Usage
//!
//! ML-KEM creates a (decapsulation key, encapsulation key) pair, such that anyone can use the
//! encapsulation key to establish a shared key with the holder of the decapsulation key.
//!
#![cfg_attr(feature = "getrandom", doc = "```")]
#![cfg_attr(not(feature = "getrandom"), doc = "```ignore")]
//! // NOTE: requires the `getrandom` feature is enabled
//!
//! use ml_kem::{Decapsulate, Encapsulate, KemCore, MlKem768};
//!
//! // Generate a decapsulation/encapsulation keypair
//! let (dk, ek) = MlKem768::generate_with_os_rng();
//!
//! // Encapsulate a shared key to the holder of the decapsulation key, receive the shared
//! // secret `k_send` and the encapsulated form `ct`.
//! let (ct, k_send) = ek.encapsulate_with_os_rng();
//!
//! // Decapsulate the shared key
//! let k_recv = dk.decapsulate(&ct);
//!
//! // We've now established a shared key
//! assert_eq!(k_send, k_recv);
//! ```

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod algebra;
mod compress;
mod crypto;
mod error;
mod kem;
mod ntt;
mod param;
mod pke;
mod sampling;

#[cfg(feature = "alloc")]
mod variant;

use core::fmt::Debug;

use hybrid_array::{
    Array, ArraySize,
    typenum::{U2, U3, U4, U5, U10, U11, U32, U64},
};
use rand_core::CryptoRng;

pub use crate::crypto::{Primitives, Sha3, Xof};
pub use crate::error::{Error, Input, Result};
pub use crate::kem::{DecapsulationKey, EncapsulationKey, Kem};
pub use crate::param::{
    CbdSamplingSize, EncodedCiphertext, EncodedDecapsulationKey, EncodedEncryptionKey, KemParams,
    ParameterSet, PkeParams, PrfOutput,
};
pub use hybrid_array as array;

#[cfg(feature = "alloc")]
pub use crate::variant::Variant;

/// A 32-byte array, defined here for brevity because it is used several times
pub type B32 = Array<u8, U32>;

/// A 64-byte array, used for the `d || z` key generation seed
pub type B64 = Array<u8, U64>;

/// A shared key produced by the KEM `K`
pub type SharedKey = B32;

/// A value that can be serialized to and deserialized from a fixed-size byte array
pub trait EncodedSizeUser {
    /// The size of an encoded object
    type EncodedSize: ArraySize;

    /// Parse an object from its encoded form
    ///
    /// # Errors
    ///
    /// Returns an error if the encoding fails a validity check.
    fn from_bytes(enc: &Encoded<Self>) -> Result<Self>
    where
        Self: Sized;

    /// Serialize an object to its encoded form
    fn as_bytes(&self) -> Encoded<Self>;
}

/// A byte array encoding a value the indicated size
pub type Encoded<T> = Array<u8, <T as EncodedSizeUser>::EncodedSize>;

/// An object that can encapsulate a shared key `K` under a fresh ciphertext `C`
pub trait Encapsulate<C, K> {
    /// Encapsulate a fresh shared key, drawing randomness from `rng`
    fn encapsulate<R: CryptoRng + ?Sized>(&self, rng: &mut R) -> (C, K);

    /// Encapsulate a fresh shared key using the operating system's random number generator
    #[cfg(feature = "getrandom")]
    fn encapsulate_with_os_rng(&self) -> (C, K) {
        self.encapsulate(&mut rand_core::UnwrapErr(getrandom::SysRng))
    }
}

/// An object that can encapsulate a shared key with caller-supplied randomness.  This is for
/// testing against known answers; the randomness must otherwise come from a secure source.
pub trait EncapsulateDeterministic<C, K> {
    /// Encapsulate with the 32-byte message `m`
    fn encapsulate_deterministic(&self, m: &B32) -> (C, K);
}

/// An object that can recover a shared key `K` from a ciphertext `C`
pub trait Decapsulate<C, K> {
    /// Decapsulate the ciphertext.  This never fails: a malformed ciphertext yields a
    /// pseudorandom key that the sender cannot predict.
    fn decapsulate(&self, c: &C) -> K;
}

/// An ML-KEM ciphertext for the KEM `K`
pub type Ciphertext<K> = Array<u8, <K as KemCore>::CiphertextSize>;

/// A generic interface to a Key Encapsulation Method
pub trait KemCore: Clone {
    /// The size of a ciphertext
    type CiphertextSize: ArraySize;

    /// A decapsulation key for this KEM
    type DecapsulationKey: Decapsulate<Ciphertext<Self>, SharedKey>
        + EncodedSizeUser
        + Debug
        + PartialEq;

    /// An encapsulation key for this KEM
    type EncapsulationKey: Encapsulate<Ciphertext<Self>, SharedKey>
        + EncapsulateDeterministic<Ciphertext<Self>, SharedKey>
        + EncodedSizeUser
        + Clone
        + Debug
        + PartialEq;

    /// Generate a new (decapsulation, encapsulation) key pair
    fn generate<R: CryptoRng + ?Sized>(
        rng: &mut R,
    ) -> (Self::DecapsulationKey, Self::EncapsulationKey);

    /// Generate a key pair deterministically from the seeds `d` and `z`
    fn generate_deterministic(d: &B32, z: &B32)
    -> (Self::DecapsulationKey, Self::EncapsulationKey);

    /// Generate a new key pair using the operating system's random number generator
    #[cfg(feature = "getrandom")]
    fn generate_with_os_rng() -> (Self::DecapsulationKey, Self::EncapsulationKey) {
        Self::generate(&mut rand_core::UnwrapErr(getrandom::SysRng))
    }
}

/// `MlKem512` is the parameter set for security category 1, corresponding to key search on a
/// block cipher with a 128-bit key.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MlKem512Params;

impl ParameterSet for MlKem512Params {
    type K = U2;
    type Eta1 = U3;
    type Eta2 = U2;
    type Du = U10;
    type Dv = U4;
}

/// `MlKem768` is the parameter set for security category 3, corresponding to key search on a
/// block cipher with a 192-bit key.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MlKem768Params;

impl ParameterSet for MlKem768Params {
    type K = U3;
    type Eta1 = U2;
    type Eta2 = U2;
    type Du = U10;
    type Dv = U4;
}

/// `MlKem1024` is the parameter set for security category 5, corresponding to key search on a
/// block cipher with a 256-bit key.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MlKem1024Params;

impl ParameterSet for MlKem1024Params {
    type K = U4;
    type Eta1 = U2;
    type Eta2 = U2;
    type Du = U11;
    type Dv = U5;
}

/// ML-KEM with the parameter set for security category 1
pub type MlKem512 = Kem<MlKem512Params>;

/// ML-KEM with the parameter set for security category 3
pub type MlKem768 = Kem<MlKem768Params>;

/// ML-KEM with the parameter set for security category 5
pub type MlKem1024 = Kem<MlKem1024Params>;

#[cfg(test)]
mod test {
    use super::*;
    use hybrid_array::typenum::Unsigned;
    use rand_core::UnwrapErr;

    fn sizes_test<K: KemCore>(ek: usize, dk: usize, ct: usize) {
        assert_eq!(
            <K::EncapsulationKey as EncodedSizeUser>::EncodedSize::USIZE,
            ek
        );
        assert_eq!(
            <K::DecapsulationKey as EncodedSizeUser>::EncodedSize::USIZE,
            dk
        );
        assert_eq!(K::CiphertextSize::USIZE, ct);
    }

    #[test]
    fn sizes() {
        sizes_test::<MlKem512>(800, 1632, 768);
        sizes_test::<MlKem768>(1184, 2400, 1088);
        sizes_test::<MlKem1024>(1568, 3168, 1568);
    }

    fn round_trip_test<K: KemCore>() {
        let mut rng = UnwrapErr(getrandom::SysRng);

        let (dk, ek) = K::generate(&mut rng);

        let ek_bytes = ek.as_bytes();
        let ek = K::EncapsulationKey::from_bytes(&ek_bytes).unwrap();
        let dk_bytes = dk.as_bytes();
        let dk = K::DecapsulationKey::from_bytes(&dk_bytes).unwrap();

        let (ct, k_send) = ek.encapsulate(&mut rng);
        let k_recv = dk.decapsulate(&ct);
        assert_eq!(k_send, k_recv);
    }

    #[test]
    fn round_trip() {
        round_trip_test::<MlKem512>();
        round_trip_test::<MlKem768>();
        round_trip_test::<MlKem1024>();
    }

    #[test]
    fn parameter_sets_are_domain_separated() {
        let d = B32::default();
        let z = B32::default();
        let (_, ek512) = MlKem512::generate_deterministic(&d, &z);
        let (_, ek768) = MlKem768::generate_deterministic(&d, &z);

        // rho is the last 32 bytes of the encapsulation key, and G(d || k) differs by k
        let rho512 = &ek512.as_bytes()[768..];
        let rho768 = &ek768.as_bytes()[1152..];
        assert_ne!(rho512, rho768);
    }
}
