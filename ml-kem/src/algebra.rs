pub use module_lattice::Field;

module_lattice::define_field!(
    BaseField,
    u16,
    u32,
    u64,
    3329,
    "The field of integers modulo q = 3329"
);

pub type Int = <BaseField as Field>::Int;

/// An element of GF(q)
pub type Elem = module_lattice::Elem<BaseField>;

/// An element of the ring `R_q = Z_q[X] / (X^256 + 1)`
pub type Polynomial = module_lattice::Polynomial<BaseField>;

/// A vector of `K` elements of `R_q`
pub type Vector<K> = module_lattice::Vector<BaseField, K>;

/// An element of the NTT algebra `T_q`
pub type NttPolynomial = module_lattice::NttPolynomial<BaseField>;

/// A vector of `K` elements of `T_q`
pub type NttVector<K> = module_lattice::NttVector<BaseField, K>;

/// A `K x K` matrix over `T_q`
pub type NttMatrix<K> = module_lattice::NttMatrix<BaseField, K, K>;
