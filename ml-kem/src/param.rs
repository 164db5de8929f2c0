//! This module encapsulates all of the compile-time logic related to parameter-set dependent sizes
//! of objects.  `ParameterSet` captures the parameters in the form described by FIPS 203.
//! `EncodingSize`, `VectorEncodingSize`, and `CbdSamplingSize` are "upstream" of `ParameterSet`;
//! they provide basic logic about the size of encoded objects.
//!
//! While the primary purpose of these traits is to describe the sizes of objects, in order to
//! avoid leakage of complicated trait bounds, they also need to provide any logic that needs to
//! know any details about object sizes.  For example, `PkeParams::split_ek` needs to know that an
//! encoded encryption key is an encoded vector followed by a 32-byte seed.

use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Rem, Sub};

use hybrid_array::{
    Array,
    typenum::{Prod, Sum, U0, U2, U3, U4, U6, U12, U32, U384},
};
use module_lattice::{
    ArraySize, Encode, EncodedPolynomial, EncodedPolynomialSize, EncodedVectorSize, EncodingSize,
};

use crate::B32;
use crate::algebra::{NttVector, Polynomial, Vector};
use crate::compress::Compress;

/// An integer that describes a bit length to be used in sampling
pub trait CbdSamplingSize: ArraySize {
    /// The width of one sampled value, `2 * eta` bits
    type SampleSize: EncodingSize;
}

impl CbdSamplingSize for U2 {
    type SampleSize = U4;
}

impl CbdSamplingSize for U3 {
    type SampleSize = U6;
}

/// The output of `PRF_eta`, `64 * eta` bytes
pub type PrfOutput<Eta> = EncodedPolynomial<<Eta as CbdSamplingSize>::SampleSize>;

/// A `ParameterSet` captures the parameters that describe a particular instance of ML-KEM.  There
/// are three variants, corresponding to three different security levels.
pub trait ParameterSet: Copy + Clone + Debug + Default + PartialEq + Eq {
    /// The dimensionality of vectors and arrays
    type K: ArraySize;

    /// The bit width of the centered binomial distribution used when sampling `s`, `e`, and `y`
    type Eta1: CbdSamplingSize;

    /// The bit width of the centered binomial distribution used when sampling `e1` and `e2`
    type Eta2: CbdSamplingSize;

    /// The bit width of compressed elements of the vector `u`
    type Du: EncodingSize;

    /// The bit width of the compressed polynomial `v`
    type Dv: EncodingSize;
}

pub type EncodedNttVector<P> = Array<u8, <P as PkeParams>::NttVectorSize>;
pub type EncodedDecryptionKey<P> = Array<u8, <P as PkeParams>::NttVectorSize>;
pub type EncodedU<P> = Array<u8, <P as PkeParams>::EncodedUSize>;
pub type EncodedV<P> = Array<u8, <P as PkeParams>::EncodedVSize>;

/// An encoded K-PKE encryption key, which is also an encoded ML-KEM encapsulation key
pub type EncodedEncryptionKey<P> = Array<u8, <P as PkeParams>::EncryptionKeySize>;

/// An encoded ciphertext
pub type EncodedCiphertext<P> = Array<u8, <P as PkeParams>::CiphertextSize>;

/// Sizes and codecs for the K-PKE component scheme
pub trait PkeParams: ParameterSet {
    type NttVectorSize: ArraySize;
    type EncodedUSize: ArraySize;
    type EncodedVSize: ArraySize;
    type EncryptionKeySize: ArraySize;
    type CiphertextSize: ArraySize;

    fn encode_u12(p: &NttVector<Self::K>) -> EncodedNttVector<Self>;
    fn decode_u12(v: &EncodedNttVector<Self>) -> NttVector<Self::K>;

    /// `ByteEncode_du(Compress_du(u))`
    fn encode_u(u: &Vector<Self::K>) -> EncodedU<Self>;

    /// `Decompress_du(ByteDecode_du(c1))`
    fn decode_u(enc: &EncodedU<Self>) -> Vector<Self::K>;

    /// `ByteEncode_dv(Compress_dv(v))`
    fn encode_v(v: &Polynomial) -> EncodedV<Self>;

    /// `Decompress_dv(ByteDecode_dv(c2))`
    fn decode_v(enc: &EncodedV<Self>) -> Polynomial;

    fn concat_ct(u: EncodedU<Self>, v: EncodedV<Self>) -> EncodedCiphertext<Self>;
    fn split_ct(ct: &EncodedCiphertext<Self>) -> (&EncodedU<Self>, &EncodedV<Self>);

    fn concat_ek(t_hat: EncodedNttVector<Self>, rho: B32) -> EncodedEncryptionKey<Self>;
    fn split_ek(ek: &EncodedEncryptionKey<Self>) -> (&EncodedNttVector<Self>, &B32);
}

type CompressedUSize<P> = EncodedVectorSize<<P as ParameterSet>::Du, <P as ParameterSet>::K>;
type CompressedVSize<P> = EncodedPolynomialSize<<P as ParameterSet>::Dv>;

impl<P> PkeParams for P
where
    P: ParameterSet,
    // t_hat and s_hat are encoded with 12 bits per coefficient (384 = 32 * 12)
    U384: Mul<P::K>,
    Prod<U384, P::K>: ArraySize
        + Add<U32>
        + Div<P::K, Output = U384>
        + Rem<P::K, Output = U0>,
    Sum<Prod<U384, P::K>, U32>: ArraySize + Sub<Prod<U384, P::K>, Output = U32>,
    // u is encoded with du bits per coefficient
    EncodedPolynomialSize<P::Du>: Mul<P::K>,
    Prod<EncodedPolynomialSize<P::Du>, P::K>: ArraySize
        + Add<EncodedPolynomialSize<P::Dv>>
        + Div<P::K, Output = EncodedPolynomialSize<P::Du>>
        + Rem<P::K, Output = U0>,
    // Ciphertext encoding rules
    Sum<Prod<EncodedPolynomialSize<P::Du>, P::K>, EncodedPolynomialSize<P::Dv>>: ArraySize
        + Sub<
            Prod<EncodedPolynomialSize<P::Du>, P::K>,
            Output = EncodedPolynomialSize<P::Dv>,
        >,
{
    type NttVectorSize = EncodedVectorSize<U12, P::K>;
    type EncodedUSize = CompressedUSize<P>;
    type EncodedVSize = CompressedVSize<P>;
    type EncryptionKeySize = Sum<Self::NttVectorSize, U32>;
    type CiphertextSize = Sum<CompressedUSize<P>, CompressedVSize<P>>;

    fn encode_u12(p: &NttVector<Self::K>) -> EncodedNttVector<Self> {
        Encode::<U12>::encode(p)
    }

    fn decode_u12(v: &EncodedNttVector<Self>) -> NttVector<Self::K> {
        Encode::<U12>::decode(v)
    }

    fn encode_u(u: &Vector<Self::K>) -> EncodedU<Self> {
        let mut u = u.clone();
        u.compress::<P::Du>();
        Encode::<P::Du>::encode(&u)
    }

    fn decode_u(enc: &EncodedU<Self>) -> Vector<Self::K> {
        let mut u: Vector<Self::K> = Encode::<P::Du>::decode(enc);
        u.decompress::<P::Du>();
        u
    }

    fn encode_v(v: &Polynomial) -> EncodedV<Self> {
        let mut v = v.clone();
        v.compress::<P::Dv>();
        Encode::<P::Dv>::encode(&v)
    }

    fn decode_v(enc: &EncodedV<Self>) -> Polynomial {
        let mut v: Polynomial = Encode::<P::Dv>::decode(enc);
        v.decompress::<P::Dv>();
        v
    }

    fn concat_ct(u: EncodedU<Self>, v: EncodedV<Self>) -> EncodedCiphertext<Self> {
        u.concat(v)
    }

    fn split_ct(ct: &EncodedCiphertext<Self>) -> (&EncodedU<Self>, &EncodedV<Self>) {
        ct.split_ref::<CompressedUSize<P>>()
    }

    fn concat_ek(t_hat: EncodedNttVector<Self>, rho: B32) -> EncodedEncryptionKey<Self> {
        t_hat.concat(rho)
    }

    fn split_ek(ek: &EncodedEncryptionKey<Self>) -> (&EncodedNttVector<Self>, &B32) {
        ek.split_ref::<Self::NttVectorSize>()
    }
}

/// An encoded ML-KEM decapsulation key
pub type EncodedDecapsulationKey<P> = Array<u8, <P as KemParams>::DecapsulationKeySize>;

/// Sizes and codecs for ML-KEM proper
pub trait KemParams: PkeParams {
    type DecapsulationKeySize: ArraySize;

    /// `dk = dk_pke || ek || H(ek) || z`
    fn concat_dk(
        dk: EncodedDecryptionKey<Self>,
        ek: EncodedEncryptionKey<Self>,
        h: B32,
        z: B32,
    ) -> EncodedDecapsulationKey<Self>;

    fn split_dk(
        enc: &EncodedDecapsulationKey<Self>,
    ) -> (
        &EncodedDecryptionKey<Self>,
        &EncodedEncryptionKey<Self>,
        &B32,
        &B32,
    );
}

type DkPkeEkSize<P> = Sum<<P as PkeParams>::NttVectorSize, <P as PkeParams>::EncryptionKeySize>;
type DkPkeEkHashSize<P> = Sum<DkPkeEkSize<P>, U32>;

impl<P> KemParams for P
where
    P: PkeParams,
    P::NttVectorSize: Add<P::EncryptionKeySize>,
    DkPkeEkSize<P>: ArraySize + Add<U32> + Sub<P::NttVectorSize, Output = P::EncryptionKeySize>,
    DkPkeEkHashSize<P>: ArraySize + Add<U32> + Sub<DkPkeEkSize<P>, Output = U32>,
    Sum<DkPkeEkHashSize<P>, U32>: ArraySize + Sub<DkPkeEkHashSize<P>, Output = U32>,
{
    type DecapsulationKeySize = Sum<DkPkeEkHashSize<P>, U32>;

    fn concat_dk(
        dk: EncodedDecryptionKey<Self>,
        ek: EncodedEncryptionKey<Self>,
        h: B32,
        z: B32,
    ) -> EncodedDecapsulationKey<Self> {
        dk.concat(ek).concat(h).concat(z)
    }

    fn split_dk(
        enc: &EncodedDecapsulationKey<Self>,
    ) -> (
        &EncodedDecryptionKey<Self>,
        &EncodedEncryptionKey<Self>,
        &B32,
        &B32,
    ) {
        let (enc, z) = enc.split_ref::<DkPkeEkHashSize<P>>();
        let (enc, h) = enc.split_ref::<DkPkeEkSize<P>>();
        let (dk_pke, ek) = enc.split_ref::<P::NttVectorSize>();
        (dk_pke, ek, h, z)
    }
}
