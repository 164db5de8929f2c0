//! Selection of a parameter set at runtime, for callers that only hold byte strings.

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use hybrid_array::typenum::{U32, Unsigned};
use rand_core::CryptoRng;
use zeroize::Zeroize;

use crate::error::{Error, Input, Result, fixed_length};
use crate::{
    Decapsulate, Encapsulate, EncapsulateDeterministic, EncodedSizeUser, KemCore, MlKem512,
    MlKem768, MlKem1024, SharedKey,
};

/// One of the three ML-KEM parameter sets, chosen at runtime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// ML-KEM-512 (k = 2)
    MlKem512,
    /// ML-KEM-768 (k = 3)
    MlKem768,
    /// ML-KEM-1024 (k = 4)
    MlKem1024,
}

impl Variant {
    /// All supported parameter sets, from the smallest to the largest
    pub const ALL: [Self; 3] = [Self::MlKem512, Self::MlKem768, Self::MlKem1024];

    /// The parameter set with module rank `k`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `k` is not 2, 3, or 4.
    pub const fn from_k(k: usize) -> Result<Self> {
        match k {
            2 => Ok(Self::MlKem512),
            3 => Ok(Self::MlKem768),
            4 => Ok(Self::MlKem1024),
            _ => Err(Error::Configuration),
        }
    }

    /// The parameter set whose encapsulation keys are `len` bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no parameter set has that key length.
    pub fn from_encapsulation_key_len(len: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.encapsulation_key_size() == len)
            .ok_or(Error::Configuration)
    }

    /// The standard name of the parameter set, e.g. `ML-KEM-768`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MlKem512 => "ML-KEM-512",
            Self::MlKem768 => "ML-KEM-768",
            Self::MlKem1024 => "ML-KEM-1024",
        }
    }

    /// The module rank `k`
    #[must_use]
    pub const fn k(self) -> usize {
        match self {
            Self::MlKem512 => 2,
            Self::MlKem768 => 3,
            Self::MlKem1024 => 4,
        }
    }

    /// The length of an encoded encapsulation key in bytes
    #[must_use]
    pub fn encapsulation_key_size(self) -> usize {
        match self {
            Self::MlKem512 => ek_size::<MlKem512>(),
            Self::MlKem768 => ek_size::<MlKem768>(),
            Self::MlKem1024 => ek_size::<MlKem1024>(),
        }
    }

    /// The length of an encoded decapsulation key in bytes
    #[must_use]
    pub fn decapsulation_key_size(self) -> usize {
        match self {
            Self::MlKem512 => dk_size::<MlKem512>(),
            Self::MlKem768 => dk_size::<MlKem768>(),
            Self::MlKem1024 => dk_size::<MlKem1024>(),
        }
    }

    /// The length of a ciphertext in bytes
    #[must_use]
    pub fn ciphertext_size(self) -> usize {
        match self {
            Self::MlKem512 => <MlKem512 as KemCore>::CiphertextSize::USIZE,
            Self::MlKem768 => <MlKem768 as KemCore>::CiphertextSize::USIZE,
            Self::MlKem1024 => <MlKem1024 as KemCore>::CiphertextSize::USIZE,
        }
    }

    /// Generate a key pair, returned as `(decapsulation key, encapsulation key)` bytes.
    pub fn generate<R: CryptoRng + ?Sized>(self, rng: &mut R) -> (Vec<u8>, Vec<u8>) {
        match self {
            Self::MlKem512 => encode_pair::<MlKem512>(MlKem512::generate(rng)),
            Self::MlKem768 => encode_pair::<MlKem768>(MlKem768::generate(rng)),
            Self::MlKem1024 => encode_pair::<MlKem1024>(MlKem1024::generate(rng)),
        }
    }

    /// Deterministically generate a key pair from the 32-byte seeds `d` and `z`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if either seed is not 32 bytes long.
    pub fn generate_deterministic(self, d: &[u8], z: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut d = fixed_length::<U32>(Input::Seed, d)?;
        let mut z = fixed_length::<U32>(Input::Seed, z)?;

        let pair = match self {
            Self::MlKem512 => encode_pair::<MlKem512>(MlKem512::generate_deterministic(&d, &z)),
            Self::MlKem768 => encode_pair::<MlKem768>(MlKem768::generate_deterministic(&d, &z)),
            Self::MlKem1024 => {
                encode_pair::<MlKem1024>(MlKem1024::generate_deterministic(&d, &z))
            }
        };

        d.zeroize();
        z.zeroize();
        Ok(pair)
    }

    /// Encapsulate a fresh shared key to the encapsulation key `ek`, returning the ciphertext
    /// bytes and the shared key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if `ek` has the wrong length for this parameter set, and
    /// [`Error::InvalidEncapsulationKey`] if it fails the modulus check.
    pub fn encapsulate<R: CryptoRng + ?Sized>(
        self,
        ek: &[u8],
        rng: &mut R,
    ) -> Result<(Vec<u8>, SharedKey)> {
        match self {
            Self::MlKem512 => encapsulate::<MlKem512, _>(ek, rng),
            Self::MlKem768 => encapsulate::<MlKem768, _>(ek, rng),
            Self::MlKem1024 => encapsulate::<MlKem1024, _>(ek, rng),
        }
    }

    /// Encapsulate with the caller-supplied 32-byte message `m`.
    ///
    /// # Errors
    ///
    /// As for [`Variant::encapsulate`], and [`Error::InputLength`] if `m` is not 32 bytes long.
    pub fn encapsulate_deterministic(self, ek: &[u8], m: &[u8]) -> Result<(Vec<u8>, SharedKey)> {
        match self {
            Self::MlKem512 => encapsulate_deterministic::<MlKem512>(ek, m),
            Self::MlKem768 => encapsulate_deterministic::<MlKem768>(ek, m),
            Self::MlKem1024 => encapsulate_deterministic::<MlKem1024>(ek, m),
        }
    }

    /// Decapsulate the ciphertext `ct` with the decapsulation key `dk`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if either input has the wrong length for this parameter
    /// set, checking `ct` first, and [`Error::InvalidDecapsulationKey`] if `dk` fails the hash
    /// check.  A ciphertext of the right length always decapsulates.
    pub fn decapsulate(self, dk: &[u8], ct: &[u8]) -> Result<SharedKey> {
        match self {
            Self::MlKem512 => decapsulate::<MlKem512>(dk, ct),
            Self::MlKem768 => decapsulate::<MlKem768>(dk, ct),
            Self::MlKem1024 => decapsulate::<MlKem1024>(dk, ct),
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or(Error::Configuration)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn ek_size<K: KemCore>() -> usize {
    <K::EncapsulationKey as EncodedSizeUser>::EncodedSize::USIZE
}

fn dk_size<K: KemCore>() -> usize {
    <K::DecapsulationKey as EncodedSizeUser>::EncodedSize::USIZE
}

fn encode_pair<K: KemCore>(
    (dk, ek): (K::DecapsulationKey, K::EncapsulationKey),
) -> (Vec<u8>, Vec<u8>) {
    let mut dk_bytes = dk.as_bytes();
    let out = (dk_bytes.to_vec(), ek.as_bytes().to_vec());
    dk_bytes.zeroize();
    out
}

fn parse_ek<K: KemCore>(ek: &[u8]) -> Result<K::EncapsulationKey> {
    let enc = fixed_length(Input::EncapsulationKey, ek)?;
    K::EncapsulationKey::from_bytes(&enc)
}

fn encapsulate<K, R>(ek: &[u8], rng: &mut R) -> Result<(Vec<u8>, SharedKey)>
where
    K: KemCore,
    R: CryptoRng + ?Sized,
{
    let ek = parse_ek::<K>(ek)?;
    let (ct, k) = ek.encapsulate(rng);
    Ok((ct.to_vec(), k))
}

fn encapsulate_deterministic<K: KemCore>(ek: &[u8], m: &[u8]) -> Result<(Vec<u8>, SharedKey)> {
    let ek = parse_ek::<K>(ek)?;
    let mut m = fixed_length::<U32>(Input::Message, m)?;
    let (ct, k) = ek.encapsulate_deterministic(&m);
    m.zeroize();
    Ok((ct.to_vec(), k))
}

fn decapsulate<K: KemCore>(dk: &[u8], ct: &[u8]) -> Result<SharedKey> {
    let ct = fixed_length::<K::CiphertextSize>(Input::Ciphertext, ct)?;

    let mut enc = fixed_length(Input::DecapsulationKey, dk)?;
    let dk = K::DecapsulationKey::from_bytes(&enc);
    enc.zeroize();

    Ok(dk?.decapsulate(&ct))
}
