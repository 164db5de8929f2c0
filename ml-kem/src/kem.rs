use core::fmt;
use core::marker::PhantomData;

use hybrid_array::typenum::U32;
use rand_core::CryptoRng;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{Primitives, Sha3};
use crate::error::{Error, Input, Result, fixed_length};
use crate::param::{EncodedCiphertext, EncodedDecapsulationKey, EncodedEncryptionKey, KemParams};
use crate::pke::{DecryptionKey, EncryptionKey};
use crate::{
    B32, B64, Decapsulate, Encapsulate, EncapsulateDeterministic, EncodedSizeUser,
    KemCore, SharedKey,
};

/// A `DecapsulationKey` provides the ability to generate a new key pair, and decapsulate an
/// encapsulated shared key.
#[derive(Clone)]
pub struct DecapsulationKey<P: KemParams, S: Primitives = Sha3> {
    dk_pke: DecryptionKey<P>,
    ek: EncapsulationKey<P, S>,
    z: B32,
}

impl<P: KemParams, S: Primitives> fmt::Debug for DecapsulationKey<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecapsulationKey").finish_non_exhaustive()
    }
}

impl<P: KemParams, S: Primitives> PartialEq for DecapsulationKey<P, S> {
    fn eq(&self, other: &Self) -> bool {
        // The encapsulation key is public, so only the secret parts need a constant-time compare
        let ek_eq = Choice::from(u8::from(self.ek == other.ek));
        let eq = self.z.as_slice().ct_eq(other.z.as_slice()) & self.dk_pke.ct_eq(&other.dk_pke);
        (eq & ek_eq).into()
    }
}

impl<P: KemParams, S: Primitives> Drop for DecapsulationKey<P, S> {
    fn drop(&mut self) {
        self.z.zeroize();
    }
}

impl<P: KemParams, S: Primitives> ZeroizeOnDrop for DecapsulationKey<P, S> {}

impl<P: KemParams, S: Primitives> EncodedSizeUser for DecapsulationKey<P, S> {
    type EncodedSize = P::DecapsulationKeySize;

    /// Decode a decapsulation key, checking that the embedded `H(ek)` matches the embedded
    /// encapsulation key (FIPS 203, 7.3).
    fn from_bytes(enc: &EncodedDecapsulationKey<P>) -> Result<Self> {
        let (dk_pke, ek_pke, h, z) = P::split_dk(enc);
        let ek = EncapsulationKey::<P, S>::from_bytes(ek_pke)
            .map_err(|_| Error::InvalidDecapsulationKey)?;

        if ek.h != *h {
            return Err(Error::InvalidDecapsulationKey);
        }

        Ok(Self {
            dk_pke: DecryptionKey::<P>::from_bytes(dk_pke),
            ek,
            z: z.clone(),
        })
    }

    fn as_bytes(&self) -> EncodedDecapsulationKey<P> {
        let dk_pke = self.dk_pke.as_bytes();
        let ek = self.ek.as_bytes();
        P::concat_dk(dk_pke, ek, self.ek.h.clone(), self.z.clone())
    }
}

impl<P: KemParams, S: Primitives> DecapsulationKey<P, S> {
    // Algorithm 16 ML-KEM.KeyGen_internal
    /// Deterministically derive a key pair from the seeds `d` and `z`.
    #[must_use]
    pub fn generate_deterministic(d: &B32, z: &B32) -> Self {
        let (dk_pke, ek_pke) = DecryptionKey::generate::<S>(d);
        let ek = EncapsulationKey::new(ek_pke);
        Self {
            dk_pke,
            ek,
            z: z.clone(),
        }
    }

    /// Rebuild a key from the 64-byte seed `d || z` it was generated from.
    #[must_use]
    pub fn from_seed(seed: &B64) -> Self {
        let (d, z) = seed.split_ref::<U32>();
        Self::generate_deterministic(d, z)
    }

    // Algorithm 19 ML-KEM.KeyGen, with the randomness supplied by the caller
    pub(crate) fn generate<R: CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut d = B32::default();
        let mut z = B32::default();
        rng.fill_bytes(&mut d);
        rng.fill_bytes(&mut z);

        let dk = Self::generate_deterministic(&d, &z);
        d.zeroize();
        z.zeroize();
        dk
    }

    /// Decode a decapsulation key from a byte slice of any length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if the slice has the wrong length, and
    /// [`Error::InvalidDecapsulationKey`] if the key fails the hash check.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut enc = fixed_length::<P::DecapsulationKeySize>(Input::DecapsulationKey, bytes)?;
        let dk = Self::from_bytes(&enc);
        enc.zeroize();
        dk
    }

    /// The encapsulation key paired with this decapsulation key
    pub fn encapsulation_key(&self) -> &EncapsulationKey<P, S> {
        &self.ek
    }

    /// Decapsulate a ciphertext given as a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if the ciphertext has the wrong length.  A ciphertext of
    /// the right length always decapsulates, possibly to the implicit-rejection key.
    pub fn decapsulate_slice(&self, ct: &[u8]) -> Result<SharedKey> {
        let ct = fixed_length::<P::CiphertextSize>(Input::Ciphertext, ct)?;
        Ok(self.decapsulate(&ct))
    }
}

// Algorithm 18 ML-KEM.Decaps_internal
impl<P: KemParams, S: Primitives> Decapsulate<EncodedCiphertext<P>, SharedKey>
    for DecapsulationKey<P, S>
{
    fn decapsulate(&self, ct: &EncodedCiphertext<P>) -> SharedKey {
        let mut mp = self.dk_pke.decrypt(ct);
        let (mut kp, mut rp) = S::g(&[mp.as_slice(), self.ek.h.as_slice()]);
        let mut kbar = S::j(&[self.z.as_slice(), ct.as_slice()]);

        let cp = self.ek.ek_pke.encrypt::<S>(&mp, &rp);
        let equal = ct.as_slice().ct_eq(cp.as_slice());
        let k = SharedKey::from_fn(|i| u8::conditional_select(&kbar[i], &kp[i], equal));

        mp.zeroize();
        kp.zeroize();
        rp.zeroize();
        kbar.zeroize();
        k
    }
}

/// An `EncapsulationKey` provides the ability to encapsulate a shared key so that it can only be
/// decapsulated by the holder of the corresponding decapsulation key.
#[derive(Clone, Debug, PartialEq)]
pub struct EncapsulationKey<P: KemParams, S: Primitives = Sha3> {
    ek_pke: EncryptionKey<P>,
    h: B32,
    _primitives: PhantomData<S>,
}

impl<P: KemParams, S: Primitives> EncapsulationKey<P, S> {
    fn new(ek_pke: EncryptionKey<P>) -> Self {
        let h = S::h(&ek_pke.as_bytes());
        Self {
            ek_pke,
            h,
            _primitives: PhantomData,
        }
    }

    /// `H(ek)`, the hash of the encoded key
    pub fn hash(&self) -> &B32 {
        &self.h
    }

    /// Decode an encapsulation key from a byte slice of any length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if the slice has the wrong length, and
    /// [`Error::InvalidEncapsulationKey`] if the key fails the modulus check.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let enc = fixed_length::<P::EncryptionKeySize>(Input::EncapsulationKey, bytes)?;
        Self::from_bytes(&enc)
    }

    // Algorithm 17 ML-KEM.Encaps_internal
    fn encapsulate_internal(&self, m: &B32) -> (EncodedCiphertext<P>, SharedKey) {
        let (k, mut r) = S::g(&[m.as_slice(), self.h.as_slice()]);
        let c = self.ek_pke.encrypt::<S>(m, &r);
        r.zeroize();
        (c, k)
    }

    /// Encapsulate with a message `m` given as a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputLength`] if `m` is not 32 bytes long.
    pub fn encapsulate_slice(&self, m: &[u8]) -> Result<(EncodedCiphertext<P>, SharedKey)> {
        let mut m = fixed_length::<U32>(Input::Message, m)?;
        let out = self.encapsulate_internal(&m);
        m.zeroize();
        Ok(out)
    }
}

impl<P: KemParams, S: Primitives> EncodedSizeUser for EncapsulationKey<P, S> {
    type EncodedSize = P::EncryptionKeySize;

    /// Decode an encapsulation key, checking that every coefficient of `t_hat` is reduced
    /// modulo q (FIPS 203, 7.2).
    fn from_bytes(enc: &EncodedEncryptionKey<P>) -> Result<Self> {
        let ek_pke = EncryptionKey::from_bytes(enc);
        if ek_pke.as_bytes() != *enc {
            return Err(Error::InvalidEncapsulationKey);
        }

        Ok(Self::new(ek_pke))
    }

    fn as_bytes(&self) -> EncodedEncryptionKey<P> {
        self.ek_pke.as_bytes()
    }
}

// Algorithm 20 ML-KEM.Encaps
impl<P: KemParams, S: Primitives> Encapsulate<EncodedCiphertext<P>, SharedKey>
    for EncapsulationKey<P, S>
{
    fn encapsulate<R: CryptoRng + ?Sized>(&self, rng: &mut R) -> (EncodedCiphertext<P>, SharedKey) {
        let mut m = B32::default();
        rng.fill_bytes(&mut m);
        let out = self.encapsulate_internal(&m);
        m.zeroize();
        out
    }
}

impl<P: KemParams, S: Primitives> EncapsulateDeterministic<EncodedCiphertext<P>, SharedKey>
    for EncapsulationKey<P, S>
{
    fn encapsulate_deterministic(&self, m: &B32) -> (EncodedCiphertext<P>, SharedKey) {
        self.encapsulate_internal(m)
    }
}

/// An implementation of overall ML-KEM functionality.  Generic over parameter sets, but then ties
/// together all of the other related types and sizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Kem<P: KemParams, S: Primitives = Sha3> {
    _params: PhantomData<(P, S)>,
}

impl<P: KemParams, S: Primitives> KemCore for Kem<P, S> {
    type CiphertextSize = P::CiphertextSize;
    type DecapsulationKey = DecapsulationKey<P, S>;
    type EncapsulationKey = EncapsulationKey<P, S>;

    fn generate<R: CryptoRng + ?Sized>(
        rng: &mut R,
    ) -> (Self::DecapsulationKey, Self::EncapsulationKey) {
        let dk = DecapsulationKey::generate(rng);
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
    }

    fn generate_deterministic(
        d: &B32,
        z: &B32,
    ) -> (Self::DecapsulationKey, Self::EncapsulationKey) {
        let dk = DecapsulationKey::generate_deterministic(d, z);
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
    }
}

impl<P: KemParams, S: Primitives> Kem<P, S> {
    /// Rebuild a key pair from its 64-byte seed `d || z`.
    #[must_use]
    pub fn from_seed(seed: &B64) -> (DecapsulationKey<P, S>, EncapsulationKey<P, S>) {
        let dk = DecapsulationKey::from_seed(seed);
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
    }
}
