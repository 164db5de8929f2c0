use module_lattice::{ArraySize, EncodingSize, Truncate};

use crate::algebra::{BaseField, Elem, Field, Int, Polynomial, Vector};

/// A convenience trait to allow us to associate some constants with a typenum
pub trait CompressionFactor: EncodingSize {
    const POW2_HALF: u32;
    const MASK: Int;
}

impl<T> CompressionFactor for T
where
    T: EncodingSize,
{
    const POW2_HALF: u32 = 1 << (T::USIZE - 1);
    const MASK: Int = (1 << T::USIZE) - 1;
}

// `ceil(2^36 / q)`.  For every `x < q` and `d <= 11`,
//
//   floor(((x << d) + (q - 1) / 2) * BARRETT_M / 2^36) = round(2^d * x / q)
//
// so compression needs no division.
const BARRETT_M: u64 = 20_642_679;
const BARRETT_SHIFT: u32 = 36;
const HALF_Q: u64 = 1664;

// Algorithms 4 and 5 Compress_d / Decompress_d
pub trait Compress {
    fn compress<D: CompressionFactor>(&mut self) -> &Self;
    fn decompress<D: CompressionFactor>(&mut self) -> &Self;
}

impl Compress for Elem {
    // Equation 4.7: Compress_d(x) = round((2^d / q) x) mod 2^d
    fn compress<D: CompressionFactor>(&mut self) -> &Self {
        let x = u64::from(self.0) << D::USIZE;
        let y = ((x + HALF_Q) * BARRETT_M) >> BARRETT_SHIFT;
        self.0 = <Int as Truncate<u64>>::truncate(y) & D::MASK;
        self
    }

    // Equation 4.8: Decompress_d(y) = round((q / 2^d) y)
    fn decompress<D: CompressionFactor>(&mut self) -> &Self {
        let y = u32::from(self.0) * u32::from(BaseField::Q) + D::POW2_HALF;
        self.0 = Truncate::truncate(y >> D::USIZE);
        self
    }
}

impl Compress for Polynomial {
    fn compress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.compress::<D>();
        }

        self
    }

    fn decompress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.decompress::<D>();
        }

        self
    }
}

impl<K: ArraySize> Compress for Vector<K> {
    fn compress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.compress::<D>();
        }

        self
    }

    fn decompress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.decompress::<D>();
        }

        self
    }
}

#[cfg(test)]
#[allow(clippy::integer_division_remainder_used)]
mod test {
    use super::*;
    use hybrid_array::typenum::{U1, U4, U5, U10, U11, U12};

    // Reference implementation of Compress_d, computed with a division
    fn compress_ref(x: u64, d: usize) -> u64 {
        let q = u64::from(BaseField::Q);
        (((x << d) + q / 2) / q) % (1 << d)
    }

    // Reference implementation of Decompress_d, computed with a division
    fn decompress_ref(y: u64, d: usize) -> u64 {
        let q = u64::from(BaseField::Q);
        (q * y + (1 << (d - 1))) >> d
    }

    // Distance between `a` and `b` in Z_q, taken as the smaller of the two directions
    fn mod_distance(a: u64, b: u64) -> u64 {
        let q = u64::from(BaseField::Q);
        let diff = (a + q - b) % q;
        diff.min(q - diff)
    }

    fn compression_exact<D: EncodingSize>() {
        for x in 0..BaseField::Q {
            let mut e = Elem::new(x);
            e.compress::<D>();
            assert_eq!(u64::from(e.0), compress_ref(x.into(), D::USIZE), "x = {x}");
        }
    }

    fn decompression_exact<D: EncodingSize>() {
        for y in 0..(1 << D::USIZE) {
            let mut e = Elem::new(y);
            e.decompress::<D>();
            assert_eq!(u64::from(e.0), decompress_ref(y.into(), D::USIZE), "y = {y}");
            assert!(e.0 < BaseField::Q);
        }
    }

    // Decompress(Compress(x)) is within ceil(q / 2^(d+1)) of x
    fn round_trip_error<D: EncodingSize>() {
        let q = u64::from(BaseField::Q);
        let bound = q.div_ceil(1 << (D::USIZE + 1));
        for x in 0..BaseField::Q {
            let mut e = Elem::new(x);
            e.compress::<D>();
            e.decompress::<D>();
            assert!(mod_distance(e.0.into(), x.into()) <= bound, "x = {x}");
        }
    }

    // Compress(Decompress(y)) = y
    fn decompress_then_compress<D: EncodingSize>() {
        for y in 0..(1 << D::USIZE) {
            let mut e = Elem::new(y);
            e.decompress::<D>();
            e.compress::<D>();
            assert_eq!(e.0, y);
        }
    }

    fn all<D: EncodingSize>() {
        compression_exact::<D>();
        decompression_exact::<D>();
        round_trip_error::<D>();
        decompress_then_compress::<D>();
    }

    #[test]
    fn compress_decompress() {
        all::<U1>();
        all::<U4>();
        all::<U5>();
        all::<U10>();
        all::<U11>();
    }

    #[test]
    fn compress_1_is_rounding_to_half_q() {
        let one = |x: Int| {
            let mut e = Elem::new(x);
            e.compress::<U1>();
            e.0
        };

        assert_eq!(one(0), 0);
        assert_eq!(one(832), 0);
        assert_eq!(one(833), 1);
        assert_eq!(one(1664), 1);
        assert_eq!(one(2496), 1);
        assert_eq!(one(2497), 0);
        assert_eq!(one(3328), 0);
    }

    #[test]
    fn decompress_1() {
        let mut e = Elem::new(1);
        e.decompress::<U1>();
        assert_eq!(e.0, 1665);
    }

    #[test]
    fn compress_12_matches_reference() {
        // Not used by ML-KEM, but the multiplier is still exact for d = 12
        for x in [0, 1, 1000, 3328] {
            let mut e = Elem::new(x);
            e.compress::<U12>();
            assert_eq!(u64::from(e.0), compress_ref(x.into(), 12));
        }
    }
}
