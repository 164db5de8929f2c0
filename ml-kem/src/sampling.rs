use hybrid_array::Array;
use module_lattice::{ArraySize, Encode, Truncate};
use zeroize::Zeroize;

use crate::B32;
use crate::algebra::{
    BaseField, Elem, Field, Int, NttMatrix, NttPolynomial, NttVector, Polynomial, Vector,
};
use crate::crypto::{Primitives, Xof};
use crate::param::{CbdSamplingSize, PrfOutput};

// The number of three-byte groups SampleNTT reads before giving up.  Each group yields two
// candidates, each accepted with probability q / 4096, so 256 coefficients take about 158 groups
// on average and running past 1024 happens with negligible probability.
const SAMPLE_NTT_MAX_GROUPS: usize = 1024;

// Algorithm 7 SampleNTT
//
// `xof` must already have absorbed `rho || j || i`.
pub(crate) fn sample_ntt<X: Xof>(xof: &mut X) -> NttPolynomial {
    let mut a = NttPolynomial::default();
    let mut j = 0;
    let mut b = [0u8; 3];

    for _ in 0..SAMPLE_NTT_MAX_GROUPS {
        xof.read(&mut b);

        let b0 = Int::from(b[0]);
        let b1 = Int::from(b[1]);
        let b2 = Int::from(b[2]);

        let d1 = b0 | ((b1 & 0x0f) << 8);
        let d2 = (b1 >> 4) | (b2 << 4);

        if d1 < BaseField::Q {
            a.0[j] = Elem::new(d1);
            j += 1;
        }

        if j == 256 {
            break;
        }

        if d2 < BaseField::Q {
            a.0[j] = Elem::new(d2);
            j += 1;
        }

        if j == 256 {
            break;
        }
    }

    assert!(j == 256, "SampleNTT exhausted its XOF budget");
    a
}

// Algorithm 8 SamplePolyCBD_eta
//
// The input is read as 256 values of `2 * eta` bits each.  The low `eta` bits of a value are `x`
// and the high `eta` bits are `y` in the notation of FIPS 203, and the coefficient is
// `HammingWeight(x) - HammingWeight(y)`.
pub(crate) fn sample_poly_cbd<Eta: CbdSamplingSize>(prf_output: &PrfOutput<Eta>) -> Polynomial {
    let mask: Int = (1 << Eta::USIZE) - 1;
    let mut vals: Polynomial = Encode::<Eta::SampleSize>::decode(prf_output);

    for v in &mut vals.0 {
        let x: Int = Truncate::truncate((v.0 & mask).count_ones());
        let y: Int = Truncate::truncate((v.0 >> Eta::USIZE).count_ones());
        *v = Elem::new(x) - Elem::new(y);
    }

    vals
}

// `SamplePolyCBD_eta(PRF_eta(sigma, n))`
pub(crate) fn sample_poly_cbd_prf<S, Eta>(sigma: &B32, n: u8) -> Polynomial
where
    S: Primitives,
    Eta: CbdSamplingSize,
{
    let mut prf_output = S::prf::<Eta>(sigma, n);
    let p = sample_poly_cbd::<Eta>(&prf_output);
    prf_output.zeroize();
    p
}

// A vector of CBD samples with nonces `n, n + 1, ..., n + K - 1`
pub(crate) fn sample_vector_cbd<S, K, Eta>(sigma: &B32, n: u8) -> Vector<K>
where
    S: Primitives,
    K: ArraySize,
    Eta: CbdSamplingSize,
{
    Vector::new(Array::from_fn(|i| {
        let i: u8 = Truncate::truncate(i);
        sample_poly_cbd_prf::<S, Eta>(sigma, n + i)
    }))
}

// The matrix `A_hat` of Algorithm 13 (lines 3-7), or its transpose.  Entry `(i, j)` of `A_hat` is
// sampled from `XOF(rho, j, i)`.
pub(crate) fn expand_a<S: Primitives, K: ArraySize>(rho: &B32, transpose: bool) -> NttMatrix<K> {
    NttMatrix::new(Array::from_fn(|i| {
        NttVector::new(Array::from_fn(|j| {
            let i: u8 = Truncate::truncate(i);
            let j: u8 = Truncate::truncate(j);
            let mut xof = if transpose {
                S::xof(rho, i, j)
            } else {
                S::xof(rho, j, i)
            };
            sample_ntt(&mut xof)
        }))
    }))
}

#[cfg(test)]
#[allow(clippy::integer_division_remainder_used)]
mod test {
    use super::*;
    use crate::crypto::Sha3;
    use hybrid_array::typenum::{U2, U3};

    // An XOF that replays a fixed byte string, then zeros
    struct Replay<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl Xof for Replay<'_> {
        fn read(&mut self, output: &mut [u8]) {
            for b in output {
                *b = self.data.get(self.pos).copied().unwrap_or(0);
                self.pos += 1;
            }
        }
    }

    // An XOF whose every candidate is rejected
    struct AllOnes;

    impl Xof for AllOnes {
        fn read(&mut self, output: &mut [u8]) {
            output.fill(0xff);
        }
    }

    fn signed(x: Elem) -> i32 {
        let x = i32::from(x.0);
        if x > i32::from(BaseField::Q / 2) {
            x - i32::from(BaseField::Q)
        } else {
            x
        }
    }

    #[test]
    fn sample_ntt_parses_twelve_bit_candidates() {
        // 0x123, 0x456 and then 0xfff (rejected), 0x001
        let mut data = [0u8; 6];
        data[..3].copy_from_slice(&[0x23, 0x61, 0x45]);
        data[3..].copy_from_slice(&[0xff, 0x1f, 0x00]);

        let mut xof = Replay {
            data: &data,
            pos: 0,
        };
        let a = sample_ntt(&mut xof);
        assert_eq!(a.0[0].0, 0x123);
        assert_eq!(a.0[1].0, 0x456);
        assert_eq!(a.0[2].0, 0x001);

        // The remaining coefficients come from the zero bytes
        assert!(a.0[3..].iter().all(|x| x.0 == 0));
    }

    #[test]
    fn sample_ntt_range() {
        let rho = B32::default();
        for (i, j) in [(0, 0), (1, 2), (3, 3)] {
            let a = sample_ntt(&mut Sha3::xof(&rho, i, j));
            assert!(a.0.iter().all(|x| x.0 < BaseField::Q));
        }
    }

    #[test]
    #[should_panic(expected = "SampleNTT exhausted its XOF budget")]
    fn sample_ntt_is_bounded() {
        let _ = sample_ntt(&mut AllOnes);
    }

    #[test]
    fn sample_cbd_known_values() {
        // With eta = 2, each byte holds two values of four bits.  For 0b1101_0011 the low value is
        // 0b0011 (x = 2 ones, y = 0) and the high value is 0b1101 (x = 1, y = 2).
        let mut input = PrfOutput::<U2>::default();
        input[0] = 0b1101_0011;
        let p = sample_poly_cbd::<U2>(&input);
        assert_eq!(signed(p.0[0]), 2);
        assert_eq!(signed(p.0[1]), -1);
        assert!(p.0[2..].iter().all(|x| x.0 == 0));

        // All ones gives eta - eta = 0 everywhere
        let input = PrfOutput::<U3>::from_fn(|_| 0xff);
        let p = sample_poly_cbd::<U3>(&input);
        assert!(p.0.iter().all(|x| x.0 == 0));

        // With eta = 3 the low half of each 6-bit value counts positively
        let mut input = PrfOutput::<U3>::default();
        input[0] = 0b0000_0111;
        input[1] = 0b0000_1110;
        let p = sample_poly_cbd::<U3>(&input);
        assert_eq!(signed(p.0[0]), 3);
        assert_eq!(signed(p.0[1]), -3);
    }

    fn sample_cbd_range_test<Eta: CbdSamplingSize>() {
        let eta = i32::try_from(Eta::USIZE).unwrap();
        let sigma = B32::default();

        let mut counts = [0usize; 7];
        for n in 0..16 {
            let p = sample_poly_cbd_prf::<Sha3, Eta>(&sigma, n);
            for x in p.0.iter().copied().map(signed) {
                assert!((-eta..=eta).contains(&x));
                counts[usize::try_from(x + 3).unwrap()] += 1;
            }
        }

        // The distribution is centered: zero is the most common value
        let zero = counts[3];
        assert!(counts.iter().all(|&c| c <= zero));
    }

    #[test]
    fn sample_cbd_range() {
        sample_cbd_range_test::<U2>();
        sample_cbd_range_test::<U3>();
    }

    #[test]
    fn vector_cbd_nonces() {
        let sigma = B32::from_fn(|i| u8::try_from(i).unwrap());
        let v = sample_vector_cbd::<Sha3, U3, U2>(&sigma, 3);
        for (i, p) in v.0.iter().enumerate() {
            let n = u8::try_from(3 + i).unwrap();
            assert_eq!(*p, sample_poly_cbd_prf::<Sha3, U2>(&sigma, n));
        }
    }

    #[test]
    fn expand_a_transpose() {
        let rho = B32::from_fn(|i| u8::try_from(i).unwrap());
        let a = expand_a::<Sha3, U3>(&rho, false);
        let a_t = expand_a::<Sha3, U3>(&rho, true);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(a.0[i].0[j], a_t.0[j].0[i]);
            }
        }

        // Entry (0, 1) comes from XOF(rho, 1, 0)
        let expected = sample_ntt(&mut Sha3::xof(&rho, 1, 0));
        assert_eq!(a.0[0].0[1], expected);
    }
}
