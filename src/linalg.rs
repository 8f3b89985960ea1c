//! Dense linear algebra for least squares.
//!
//! The design matrix is factored once with nalgebra's Householder QR. That
//! factorisation gives the coefficient solve, the rank check and the unscaled
//! covariance `(X'X)^-1 = R^-1 R^-T`. The normal equations are never formed.

use crate::error::{LinearModelError, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Default relative tolerance for declaring a design column dependent.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// Thin QR decomposition `X = QR` of a tall matrix, without column pivoting.
#[derive(Debug, Clone)]
pub struct QrDecomposition {
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    column_norms: Vec<f64>,
}

impl QrDecomposition {
    /// Decompose `x` (n x p, n >= p).
    pub fn new(x: &ArrayView2<f64>) -> Result<Self> {
        let (n, p) = x.dim();
        if n < p {
            return Err(LinearModelError::InvalidInput(format!(
                "QR decomposition needs at least as many rows as columns, got {}x{}",
                n, p
            )));
        }

        let x = to_dmatrix(x);
        let column_norms = x.column_iter().map(|c| c.norm()).collect();
        let qr = x.qr();
        Ok(Self {
            q: qr.q(),
            r: qr.r(),
            column_norms,
        })
    }

    /// The p x p upper triangular factor.
    pub fn r(&self) -> Array2<f64> {
        to_array2(&self.r)
    }

    pub fn ncols(&self) -> usize {
        self.r.ncols()
    }

    /// Compute the first p entries of `Q' y`.
    pub fn qt_mul(&self, y: &ArrayView1<f64>) -> Result<Array1<f64>> {
        if y.len() != self.q.nrows() {
            return Err(LinearModelError::dimension_mismatch(
                "response vector",
                self.q.nrows(),
                y.len(),
            ));
        }
        let y = DVector::from_iterator(y.len(), y.iter().copied());
        Ok(self.q.tr_mul(&y).iter().copied().collect())
    }

    /// First column that is (numerically) a linear combination of the
    /// columns before it.
    ///
    /// `|R_jj|` is the norm of column j after projecting out columns `0..j`,
    /// so it is compared against the norm of column j itself. Rescaling a
    /// column does not change the outcome.
    pub fn first_deficient_column(&self, tolerance: f64) -> Option<usize> {
        self.r
            .diagonal()
            .iter()
            .zip(&self.column_norms)
            .position(|(d, &norm)| norm == 0.0 || d.abs() <= tolerance * norm)
    }

    /// Numerical rank under `tolerance`.
    pub fn rank(&self, tolerance: f64) -> usize {
        self.r
            .diagonal()
            .iter()
            .zip(&self.column_norms)
            .filter(|(d, norm)| **norm > 0.0 && d.abs() > tolerance * **norm)
            .count()
    }

    /// Least-squares solution of `X b = y`.
    ///
    /// # Errors
    ///
    /// Returns [`LinearModelError::InvalidInput`] if R is singular.
    pub fn solve_least_squares(&self, y: &ArrayView1<f64>) -> Result<Array1<f64>> {
        let qty = DVector::from_vec(self.qt_mul(y)?.to_vec());
        let beta = self
            .r
            .solve_upper_triangular(&qty)
            .ok_or_else(singular_r)?;
        Ok(beta.iter().copied().collect())
    }

    /// `R^-1`.
    pub fn r_inverse(&self) -> Result<Array2<f64>> {
        let p = self.ncols();
        let inv = self
            .r
            .solve_upper_triangular(&DMatrix::identity(p, p))
            .ok_or_else(singular_r)?;
        Ok(to_array2(&inv))
    }

    /// `(X'X)^-1`, computed as `R^-1 R^-T`.
    pub fn unscaled_covariance(&self) -> Result<Array2<f64>> {
        let r_inv = self.r_inverse()?;
        Ok(r_inv.dot(&r_inv.t()))
    }
}

fn singular_r() -> LinearModelError {
    LinearModelError::InvalidInput("triangular factor R is singular".to_string())
}

fn to_dmatrix(x: &ArrayView2<f64>) -> DMatrix<f64> {
    let (n, p) = x.dim();
    DMatrix::from_fn(n, p, |i, j| x[[i, j]])
}

fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}
