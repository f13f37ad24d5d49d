//! Shamir polynomials and Lagrange interpolation over the scalar field.
//!
//! Grounded on the teacher's `shuffling/community_decryption/mod.rs`
//! additive-combination arithmetic, generalized here from plain summation to
//! full `(t, n)` Lagrange reconstruction, per `spec.md` §9's note to "rely on
//! a vetted finite-field library; do not re-implement modular inverse" —
//! inversion is `ark_ff::Field::inverse()`, never hand-rolled.

use ark_ff::{Field, UniformRand, Zero};
use ark_std::rand::RngCore;

use crate::group::Scalar;

/// A degree-`(t-1)` polynomial over the scalar field, held only for the
/// duration of one key-generation run and zeroized on drop.
///
/// `ark_ff` scalar types do not implement `zeroize::Zeroize` (they carry no
/// `std::ptr::write_volatile`-backed primitive), so this overwrites its
/// coefficients with zero by hand rather than deriving `ZeroizeOnDrop`,
/// matching `spec.md` §5's "used once then zeroized" for secret polynomial
/// coefficients.
#[derive(Clone)]
pub struct Polynomial {
    coefficients: Vec<Scalar>,
}

impl Polynomial {
    /// Samples a uniform random polynomial of degree `threshold - 1`
    /// (`spec.md` §4.D step 1): every coefficient, including the constant
    /// term, is drawn uniformly from the scalar field.
    pub fn random<R: RngCore + ?Sized>(threshold: u32, rng: &mut R) -> Self {
        let coefficients = (0..threshold).map(|_| Scalar::rand(rng)).collect();
        Polynomial { coefficients }
    }

    /// Evaluates `f(x)` by Horner's method. `spec.md` indexes participants
    /// from 1, so `x = 0` is reserved for the constant term / combined secret.
    pub fn evaluate(&self, x: u32) -> Scalar {
        let x = Scalar::from(x as u64);
        let mut result = Scalar::zero();
        for coefficient in self.coefficients.iter().rev() {
            result = result * x + coefficient;
        }
        result
    }

    /// The polynomial's constant term `f(0)`, i.e. this trustee's
    /// contribution to the combined secret.
    pub fn constant_term(&self) -> Scalar {
        self.coefficients[0]
    }
}

impl Drop for Polynomial {
    fn drop(&mut self) {
        for coefficient in self.coefficients.iter_mut() {
            *coefficient = Scalar::zero();
        }
    }
}

/// `lambda_j(0) = prod_{k in index_set, k != j} (-k) / (j - k) mod q`
/// (`spec.md` §4.D step 4).
pub fn lagrange_coefficient_at_zero(index_set: &[u32], j: u32) -> Scalar {
    let mut numerator = Scalar::from(1u64);
    let mut denominator = Scalar::from(1u64);
    let j_scalar = Scalar::from(j as u64);
    for &k in index_set {
        if k == j {
            continue;
        }
        let k_scalar = Scalar::from(k as u64);
        numerator *= -k_scalar;
        denominator *= j_scalar - k_scalar;
    }
    numerator * denominator.inverse().expect("distinct indices give nonzero denominator")
}

/// Combines per-trustee values (public shares `H_j` or partial decryptions
/// `d_j`) weighted by their Lagrange coefficients at zero, reconstructing
/// `F(0) * base_point` for whichever base point the values were computed
/// relative to.
pub fn lagrange_combine<G>(values: &[(u32, G)]) -> G
where
    G: Copy + core::ops::Mul<Scalar, Output = G> + core::iter::Sum,
{
    let index_set: Vec<u32> = values.iter().map(|(index, _)| *index).collect();
    values
        .iter()
        .map(|(index, value)| *value * lagrange_coefficient_at_zero(&index_set, *index))
        .sum()
}
