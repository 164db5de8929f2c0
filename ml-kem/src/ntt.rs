use module_lattice::{ArraySize, MultiplyNtt};

use crate::algebra::{BaseField, Elem, Field, NttPolynomial, NttVector, Polynomial, Vector};

// The powers of zeta used in the NTT and in MultiplyNTTs are fixed, so they are tabulated at
// compile time:
//
//   ZETA_POW_BITREV[i] = zeta^{BitRev_7(i)}
//   GAMMA[i]           = zeta^{2 BitRev_7(i) + 1}
//
// Operator overloading can't be const, so the reductions are done by hand, and `for` loops are
// written as `while` loops.  The values match Appendix A of FIPS 203.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
#[allow(clippy::integer_division_remainder_used)]
const ZETA_POW_BITREV: [Elem; 128] = {
    const ZETA: u64 = 17;
    const fn bitrev7(x: usize) -> usize {
        ((x as u8).reverse_bits() >> 1) as usize
    }

    // Compute the powers of zeta
    let mut pow = [Elem::new(0); 128];
    let mut i = 0;
    let mut curr = 1u64;
    while i < 128 {
        pow[i] = Elem::new(curr as u16);
        i += 1;
        curr = (curr * ZETA) % (BaseField::QLL);
    }

    // Reorder the powers according to bitrev7
    let mut pow_bitrev = [Elem::new(0); 128];
    let mut i = 0;
    while i < 128 {
        pow_bitrev[i] = pow[bitrev7(i)];
        i += 1;
    }
    pow_bitrev
};

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
#[allow(clippy::integer_division_remainder_used)]
const GAMMA: [Elem; 128] = {
    const ZETA: u64 = 17;
    let mut gamma = [Elem::new(0); 128];
    let mut i = 0;
    while i < 128 {
        let zpb = ZETA_POW_BITREV[i].0 as u64;
        gamma[i] = Elem::new(((zpb * zpb * ZETA) % BaseField::QLL) as u16);
        i += 1;
    }
    gamma
};

pub(crate) trait Ntt {
    type Output;
    fn ntt(&self) -> Self::Output;
}

/// Constant-time NTT butterfly layer.
///
/// The loop bounds are compile-time constants, so no division is needed to step through the
/// array.
#[allow(clippy::inline_always)]
#[inline(always)]
fn ntt_layer<const LEN: usize, const ITERATIONS: usize>(w: &mut [Elem; 256], m: &mut usize) {
    for i in 0..ITERATIONS {
        let start = i * 2 * LEN;
        *m += 1;
        let z = ZETA_POW_BITREV[*m];
        for j in start..(start + LEN) {
            let t = z * w[j + LEN];
            w[j + LEN] = w[j] - t;
            w[j] = w[j] + t;
        }
    }
}

impl Ntt for Polynomial {
    type Output = NttPolynomial;

    // Algorithm 9 NTT
    fn ntt(&self) -> Self::Output {
        let mut w: [Elem; 256] = self.0.clone().into();
        let mut m = 0;

        ntt_layer::<128, 1>(&mut w, &mut m);
        ntt_layer::<64, 2>(&mut w, &mut m);
        ntt_layer::<32, 4>(&mut w, &mut m);
        ntt_layer::<16, 8>(&mut w, &mut m);
        ntt_layer::<8, 16>(&mut w, &mut m);
        ntt_layer::<4, 32>(&mut w, &mut m);
        ntt_layer::<2, 64>(&mut w, &mut m);

        NttPolynomial::new(w.into())
    }
}

impl<K: ArraySize> Ntt for Vector<K> {
    type Output = NttVector<K>;

    fn ntt(&self) -> Self::Output {
        NttVector::new(self.0.iter().map(Polynomial::ntt).collect())
    }
}

#[allow(clippy::module_name_repetitions)]
pub(crate) trait NttInverse {
    type Output;
    fn ntt_inverse(&self) -> Self::Output;
}

/// Constant-time inverse NTT butterfly layer.
#[allow(clippy::inline_always)]
#[inline(always)]
fn ntt_inverse_layer<const LEN: usize, const ITERATIONS: usize>(
    w: &mut [Elem; 256],
    m: &mut usize,
) {
    for i in 0..ITERATIONS {
        let start = i * 2 * LEN;
        *m -= 1;
        let z = -ZETA_POW_BITREV[*m];
        for j in start..(start + LEN) {
            let t = w[j];
            w[j] = t + w[j + LEN];
            w[j + LEN] = z * (t - w[j + LEN]);
        }
    }
}

impl NttInverse for NttPolynomial {
    type Output = Polynomial;

    // Algorithm 10 NTT^{-1}
    fn ntt_inverse(&self) -> Self::Output {
        // 128^{-1} mod q
        const INVERSE_128: Elem = Elem::new(3303);

        let mut w: [Elem; 256] = self.0.clone().into();
        let mut m = 128;

        ntt_inverse_layer::<2, 64>(&mut w, &mut m);
        ntt_inverse_layer::<4, 32>(&mut w, &mut m);
        ntt_inverse_layer::<8, 16>(&mut w, &mut m);
        ntt_inverse_layer::<16, 8>(&mut w, &mut m);
        ntt_inverse_layer::<32, 4>(&mut w, &mut m);
        ntt_inverse_layer::<64, 2>(&mut w, &mut m);
        ntt_inverse_layer::<128, 1>(&mut w, &mut m);

        INVERSE_128 * &Polynomial::new(w.into())
    }
}

impl<K: ArraySize> NttInverse for NttVector<K> {
    type Output = Vector<K>;

    fn ntt_inverse(&self) -> Self::Output {
        Vector::new(self.0.iter().map(NttPolynomial::ntt_inverse).collect())
    }
}

// Algorithm 11 MultiplyNTTs
//
// Each adjacent pair of coefficients is a residue modulo `X^2 - GAMMA[i]`.
impl MultiplyNtt for BaseField {
    fn multiply_ntt(lhs: &NttPolynomial, rhs: &NttPolynomial) -> NttPolynomial {
        let mut out = NttPolynomial::default();

        let lhs = lhs.0.chunks_exact(2);
        let rhs = rhs.0.chunks_exact(2);
        let dst = out.0.chunks_exact_mut(2);
        for (((a, b), c), gamma) in lhs.zip(rhs).zip(dst).zip(GAMMA.iter()) {
            // Algorithm 12 BaseCaseMultiply
            c[0] = a[0] * b[0] + a[1] * b[1] * *gamma;
            c[1] = a[0] * b[1] + a[1] * b[0];
        }

        out
    }
}
