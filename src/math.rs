// src/math.rs
// Evaluator capability injected into every dynamics routine: cosine, sine and square-matrix
// inversion over a scalar type. Numeric works on f64 through nalgebra; Symbolic works on Expr
// and inverts exactly via cofactors. The dynamics code is written once, generic over Evaluator.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::{DMatrix, Matrix2};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, DynamicsResult};
use crate::expr::Expr;

/// Scalar bound shared by both backends: enough algebra for nalgebra matrix products.
pub trait DynScalar:
    nalgebra::Scalar
    + Zero
    + One
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + Send
    + Sync
{
}

impl<T> DynScalar for T where
    T: nalgebra::Scalar
        + Zero
        + One
        + From<f64>
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
        + Neg<Output = T>
        + AddAssign
        + SubAssign
        + MulAssign
        + Send
        + Sync
{
}

/// Cosine, sine and matrix inversion over one scalar type.
pub trait Evaluator: Debug + Send + Sync {
    type Scalar: DynScalar;

    fn cos(&self, x: &Self::Scalar) -> Self::Scalar;

    fn sin(&self, x: &Self::Scalar) -> Self::Scalar;

    /// Inverse of a square matrix; `SingularMatrix` when it does not exist.
    fn invert(&self, m: &DMatrix<Self::Scalar>) -> DynamicsResult<DMatrix<Self::Scalar>>;

    /// Numeric value of a scalar, if it has one.
    fn to_f64(&self, x: &Self::Scalar) -> Option<f64>;

    fn invert2(&self, m: &Matrix2<Self::Scalar>) -> DynamicsResult<Matrix2<Self::Scalar>> {
        let dyn_m = DMatrix::from_iterator(2, 2, m.iter().cloned());
        let inv = self.invert(&dyn_m)?;
        Ok(Matrix2::from_iterator(inv.iter().cloned()))
    }
}

/// Floating-point backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Numeric;

impl Evaluator for Numeric {
    type Scalar = f64;

    fn cos(&self, x: &f64) -> f64 {
        x.cos()
    }

    fn sin(&self, x: &f64) -> f64 {
        x.sin()
    }

    fn invert(&self, m: &DMatrix<f64>) -> DynamicsResult<DMatrix<f64>> {
        let size = m.nrows();
        if size != m.ncols() {
            return Err(DynamicsError::SingularMatrix { size });
        }
        match m.clone().try_inverse() {
            Some(inv) if inv.iter().all(|v| v.is_finite()) => Ok(inv),
            _ => Err(DynamicsError::SingularMatrix { size }),
        }
    }

    fn to_f64(&self, x: &f64) -> Option<f64> {
        Some(*x)
    }
}

/// Symbolic backend over [`Expr`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Symbolic;

impl Evaluator for Symbolic {
    type Scalar = Expr;

    fn cos(&self, x: &Expr) -> Expr {
        Expr::cos(x.clone())
    }

    fn sin(&self, x: &Expr) -> Expr {
        Expr::sin(x.clone())
    }

    /// Exact inverse `adj(m) / det(m)`.
    fn invert(&self, m: &DMatrix<Expr>) -> DynamicsResult<DMatrix<Expr>> {
        let size = m.nrows();
        if size != m.ncols() {
            return Err(DynamicsError::SingularMatrix { size });
        }
        let det = determinant(m);
        if let Some(c) = det.as_const() {
            if c == 0.0 || !c.is_finite() {
                return Err(DynamicsError::SingularMatrix { size });
            }
        }
        let inv_det = Expr::reciprocal(det);
        // inverse[i][j] = cofactor[j][i] / det
        Ok(DMatrix::from_fn(size, size, |i, j| {
            cofactor(m, j, i) * inv_det.clone()
        }))
    }

    fn to_f64(&self, x: &Expr) -> Option<f64> {
        x.as_const()
    }
}

/// Laplace expansion along the first row. Only used on 1x1 and 2x2 matrices here.
fn determinant(m: &DMatrix<Expr>) -> Expr {
    match m.nrows() {
        0 => Expr::one(),
        1 => m[(0, 0)].clone(),
        n => (0..n).fold(Expr::zero(), |acc, j| acc + m[(0, j)].clone() * cofactor(m, 0, j)),
    }
}

fn cofactor(m: &DMatrix<Expr>, row: usize, col: usize) -> Expr {
    let minor = determinant(&m.clone().remove_row(row).remove_column(col));
    if (row + col) % 2 == 0 {
        minor
    } else {
        -minor
    }
}

/// How the free-motion equation `M·ddq = -C·dq` is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMode {
    /// `ddq = M⁻¹·(-C·dq)` through the evaluator's inverse. The compatibility contract.
    #[default]
    DirectInverse,
    /// Cholesky factorization of the (symmetric positive definite) mass matrix. Numeric only.
    Cholesky,
}
