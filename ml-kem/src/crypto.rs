use core::fmt::Debug;

use hybrid_array::Array;
use module_lattice::ArraySize;
use sha3::{
    Digest, Sha3_256, Sha3_512, Shake128, Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use crate::B32;
use crate::param::{CbdSamplingSize, PrfOutput};

/// A sponge that is first absorbed into and then squeezed from.  Absorbing after the first
/// squeeze is a logic error.
#[allow(clippy::large_enum_variant)]
pub enum ShakeState<Shake: ExtendableOutput> {
    Absorbing(Shake),
    Squeezing(Shake::Reader),
}

impl<Shake: ExtendableOutput + Default> Default for ShakeState<Shake> {
    fn default() -> Self {
        Self::Absorbing(Shake::default())
    }
}

impl<Shake: ExtendableOutput + Update + Default + Clone> ShakeState<Shake> {
    pub(crate) fn absorb(mut self, input: &[u8]) -> Self {
        match &mut self {
            Self::Absorbing(sponge) => Update::update(sponge, input),
            Self::Squeezing(_) => unreachable!(),
        }

        self
    }

    pub(crate) fn squeeze(&mut self, output: &mut [u8]) -> &mut Self {
        match self {
            Self::Absorbing(sponge) => {
                // Clone required to satisfy borrow checker
                let mut reader = sponge.clone().finalize_xof();
                reader.read(output);
                *self = Self::Squeezing(reader);
            }
            Self::Squeezing(reader) => {
                reader.read(output);
            }
        }

        self
    }

    pub(crate) fn squeeze_new<N: ArraySize>(&mut self) -> Array<u8, N> {
        let mut v = Array::default();
        self.squeeze(&mut v);
        v
    }
}

/// An extendable-output function that has already absorbed its input.
pub trait Xof {
    /// Write the next `output.len()` bytes of the output stream into `output`.
    fn read(&mut self, output: &mut [u8]);
}

impl<Shake: ExtendableOutput + Update + Default + Clone> Xof for ShakeState<Shake> {
    fn read(&mut self, output: &mut [u8]) {
        self.squeeze(output);
    }
}

/// The symmetric primitives that ML-KEM is built from.  The engine is generic over this trait
/// so that an alternative provider of SHA-3 can be substituted; [`Sha3`] is the default.
pub trait Primitives: Copy + Clone + Debug + Default + PartialEq + Eq {
    /// The XOF returned by [`Primitives::xof`].
    type Xof: Xof;

    /// `H(s) = SHA3-256(s)`
    fn h(input: &[u8]) -> B32;

    /// `G(c) = SHA3-512(c)`, split into two 32-byte halves.  The input is given in pieces that
    /// are hashed as if concatenated.
    fn g(inputs: &[&[u8]]) -> (B32, B32);

    /// `J(s) = SHAKE256(s, 32)`, with the input given in pieces.
    fn j(inputs: &[&[u8]]) -> B32;

    /// `PRF_eta(s, b) = SHAKE256(s || b, 64 * eta)`
    fn prf<Eta: CbdSamplingSize>(s: &B32, b: u8) -> PrfOutput<Eta>;

    /// `XOF(rho, i, j)`: SHAKE128 with `rho || i || j` absorbed
    fn xof(rho: &B32, i: u8, j: u8) -> Self::Xof;
}

/// [`Primitives`] backed by the `sha3` crate
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sha3;

impl Primitives for Sha3 {
    type Xof = ShakeState<Shake128>;

    fn h(input: &[u8]) -> B32 {
        let mut out = B32::default();
        out.copy_from_slice(&Sha3_256::digest(input));
        out
    }

    fn g(inputs: &[&[u8]]) -> (B32, B32) {
        let mut h = Sha3_512::new();
        for input in inputs {
            Digest::update(&mut h, input);
        }
        let digest = h.finalize();

        let (k, r) = digest.split_at(32);
        let mut a = B32::default();
        let mut b = B32::default();
        a.copy_from_slice(k);
        b.copy_from_slice(r);
        (a, b)
    }

    fn j(inputs: &[&[u8]]) -> B32 {
        inputs
            .iter()
            .fold(ShakeState::<Shake256>::default(), |state, input| {
                state.absorb(input)
            })
            .squeeze_new()
    }

    fn prf<Eta: CbdSamplingSize>(s: &B32, b: u8) -> PrfOutput<Eta> {
        ShakeState::<Shake256>::default()
            .absorb(s)
            .absorb(&[b])
            .squeeze_new()
    }

    fn xof(rho: &B32, i: u8, j: u8) -> Self::Xof {
        ShakeState::<Shake128>::default()
            .absorb(rho)
            .absorb(&[i])
            .absorb(&[j])
    }
}
