use core::fmt;

use hybrid_array::typenum::{U1, Unsigned};
use module_lattice::Encode;
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::B32;
use crate::algebra::{NttVector, Polynomial};
use crate::compress::Compress;
use crate::crypto::Primitives;
use crate::ntt::{Ntt, NttInverse};
use crate::param::{EncodedCiphertext, EncodedDecryptionKey, EncodedEncryptionKey, PkeParams};
use crate::sampling::{expand_a, sample_poly_cbd_prf, sample_vector_cbd};

/// A `DecryptionKey` provides the ability to decrypt K-PKE ciphertexts
#[derive(Clone)]
pub struct DecryptionKey<P: PkeParams> {
    s_hat: NttVector<P::K>,
}

impl<P: PkeParams> fmt::Debug for DecryptionKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey").finish_non_exhaustive()
    }
}

impl<P: PkeParams> ConstantTimeEq for DecryptionKey<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        let mut lhs = self.as_bytes();
        let mut rhs = other.as_bytes();
        let eq = lhs.as_slice().ct_eq(rhs.as_slice());
        lhs.zeroize();
        rhs.zeroize();
        eq
    }
}

impl<P: PkeParams> PartialEq for DecryptionKey<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl<P: PkeParams> Drop for DecryptionKey<P> {
    fn drop(&mut self) {
        self.s_hat.zeroize();
    }
}

impl<P: PkeParams> ZeroizeOnDrop for DecryptionKey<P> {}

/// An `EncryptionKey` provides the ability to encrypt a 32-byte message under K-PKE
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionKey<P: PkeParams> {
    t_hat: NttVector<P::K>,
    rho: B32,
}

impl<P: PkeParams> DecryptionKey<P> {
    // Algorithm 13 K-PKE.KeyGen
    pub(crate) fn generate<S: Primitives>(d: &B32) -> (Self, EncryptionKey<P>) {
        let k = P::K::U8;

        // Derive seeds.  The parameter k is hashed in for domain separation between parameter sets.
        let (rho, mut sigma) = S::g(&[d.as_slice(), &[k]]);

        // Sample pseudo-random matrix and vectors
        let a_hat = expand_a::<S, P::K>(&rho, false);
        let mut s = sample_vector_cbd::<S, P::K, P::Eta1>(&sigma, 0);
        let mut e = sample_vector_cbd::<S, P::K, P::Eta1>(&sigma, k);

        // NTT the vectors
        let s_hat = s.ntt();
        let mut e_hat = e.ntt();

        // Compute the public value
        let t_hat = &(&a_hat * &s_hat) + &e_hat;

        sigma.zeroize();
        s.zeroize();
        e.zeroize();
        e_hat.zeroize();

        (Self { s_hat }, EncryptionKey { t_hat, rho })
    }

    // Algorithm 15 K-PKE.Decrypt
    pub(crate) fn decrypt(&self, ciphertext: &EncodedCiphertext<P>) -> B32 {
        let (c1, c2) = P::split_ct(ciphertext);

        let u = P::decode_u(c1);
        let v = P::decode_v(c2);

        let mut su = (&self.s_hat * &u.ntt()).ntt_inverse();
        let mut w = &v - &su;

        w.compress::<U1>();
        let m = Encode::<U1>::encode(&w);

        su.zeroize();
        w.zeroize();
        m
    }

    /// Encode the key as `ByteEncode_12(s_hat)`.
    pub fn as_bytes(&self) -> EncodedDecryptionKey<P> {
        P::encode_u12(&self.s_hat)
    }

    /// Decode the key from its byte representation.  Every byte string of the right length
    /// decodes; coefficients are reduced modulo q.
    pub fn from_bytes(enc: &EncodedDecryptionKey<P>) -> Self {
        Self {
            s_hat: P::decode_u12(enc),
        }
    }
}

impl<P: PkeParams> EncryptionKey<P> {
    // Algorithm 14 K-PKE.Encrypt
    pub(crate) fn encrypt<S: Primitives>(&self, m: &B32, r: &B32) -> EncodedCiphertext<P> {
        let k = P::K::U8;

        let a_hat_t = expand_a::<S, P::K>(&self.rho, true);
        let mut y = sample_vector_cbd::<S, P::K, P::Eta1>(r, 0);
        let mut e1 = sample_vector_cbd::<S, P::K, P::Eta2>(r, k);
        let mut e2 = sample_poly_cbd_prf::<S, P::Eta2>(r, 2 * k);

        let mut y_hat = y.ntt();
        let u = &(&a_hat_t * &y_hat).ntt_inverse() + &e1;

        let mut mu: Polynomial = Encode::<U1>::decode(m);
        mu.decompress::<U1>();

        let mut ty = (&self.t_hat * &y_hat).ntt_inverse();
        let v = &(&ty + &e2) + &mu;

        let c1 = P::encode_u(&u);
        let c2 = P::encode_v(&v);

        y.zeroize();
        y_hat.zeroize();
        e1.zeroize();
        e2.zeroize();
        mu.zeroize();
        ty.zeroize();

        P::concat_ct(c1, c2)
    }

    /// Encode the key as `ByteEncode_12(t_hat) || rho`.
    pub fn as_bytes(&self) -> EncodedEncryptionKey<P> {
        let t_hat = P::encode_u12(&self.t_hat);
        P::concat_ek(t_hat, self.rho.clone())
    }

    /// Decode the key from its byte representation.  Coefficients of `t_hat` that are not
    /// reduced modulo q are reduced, so `as_bytes` only reproduces the input when every
    /// coefficient was already in range.
    pub fn from_bytes(enc: &EncodedEncryptionKey<P>) -> Self {
        let (t_hat, rho) = P::split_ek(enc);
        Self {
            t_hat: P::decode_u12(t_hat),
            rho: rho.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::Sha3;
    use crate::{MlKem512Params, MlKem768Params, MlKem1024Params};
    use rand_core::{CryptoRng, UnwrapErr};

    fn rand<R: CryptoRng + ?Sized>(rng: &mut R) -> B32 {
        let mut val = B32::default();
        rng.fill_bytes(&mut val);
        val
    }

    fn round_trip_test<P: PkeParams>() {
        let mut rng = UnwrapErr(getrandom::SysRng);
        let d = rand(&mut rng);
        let m = rand(&mut rng);
        let r = rand(&mut rng);

        let (dk, ek) = DecryptionKey::<P>::generate::<Sha3>(&d);
        let c = ek.encrypt::<Sha3>(&m, &r);
        assert_eq!(dk.decrypt(&c), m);
    }

    #[test]
    fn round_trip() {
        for _ in 0..10 {
            round_trip_test::<MlKem512Params>();
            round_trip_test::<MlKem768Params>();
            round_trip_test::<MlKem1024Params>();
        }
    }

    fn deterministic_test<P: PkeParams>() {
        let d = B32::from_fn(|i| u8::try_from(i).unwrap());
        let m = B32::from_fn(|i| u8::try_from(2 * i).unwrap());
        let r = B32::from_fn(|i| u8::try_from(3 * i).unwrap());

        let (dk1, ek1) = DecryptionKey::<P>::generate::<Sha3>(&d);
        let (dk2, ek2) = DecryptionKey::<P>::generate::<Sha3>(&d);
        assert_eq!(dk1, dk2);
        assert_eq!(ek1, ek2);

        assert_eq!(ek1.encrypt::<Sha3>(&m, &r), ek2.encrypt::<Sha3>(&m, &r));

        // A different seed gives a different key
        let mut d2 = d.clone();
        d2[0] ^= 1;
        let (dk3, ek3) = DecryptionKey::<P>::generate::<Sha3>(&d2);
        assert_ne!(dk1, dk3);
        assert_ne!(ek1, ek3);
    }

    #[test]
    fn deterministic() {
        deterministic_test::<MlKem512Params>();
        deterministic_test::<MlKem768Params>();
        deterministic_test::<MlKem1024Params>();
    }

    fn codec_test<P: PkeParams>() {
        let d = B32::from_fn(|i| u8::try_from(i).unwrap());
        let (dk, ek) = DecryptionKey::<P>::generate::<Sha3>(&d);

        let dk_bytes = dk.as_bytes();
        assert_eq!(dk_bytes.len(), 384 * P::K::USIZE);
        assert_eq!(DecryptionKey::<P>::from_bytes(&dk_bytes), dk);

        let ek_bytes = ek.as_bytes();
        assert_eq!(ek_bytes.len(), 384 * P::K::USIZE + 32);
        assert_eq!(EncryptionKey::<P>::from_bytes(&ek_bytes), ek);

        // rho is stored in the clear at the end of the key
        assert_eq!(&ek_bytes[384 * P::K::USIZE..], ek.rho.as_slice());
    }

    #[test]
    fn codec() {
        codec_test::<MlKem512Params>();
        codec_test::<MlKem768Params>();
        codec_test::<MlKem1024Params>();
    }

    #[test]
    fn ciphertext_sizes() {
        let m = B32::default();
        let r = B32::default();
        let d = B32::default();

        let (_, ek) = DecryptionKey::<MlKem512Params>::generate::<Sha3>(&d);
        assert_eq!(ek.encrypt::<Sha3>(&m, &r).len(), 768);

        let (_, ek) = DecryptionKey::<MlKem768Params>::generate::<Sha3>(&d);
        assert_eq!(ek.encrypt::<Sha3>(&m, &r).len(), 1088);

        let (_, ek) = DecryptionKey::<MlKem1024Params>::generate::<Sha3>(&d);
        assert_eq!(ek.encrypt::<Sha3>(&m, &r).len(), 1568);
    }

    #[test]
    fn debug_hides_secret() {
        let (dk, _) = DecryptionKey::<MlKem768Params>::generate::<Sha3>(&B32::default());
        assert_eq!(std::format!("{dk:?}"), "DecryptionKey { .. }");
    }
}
