/////////////////////////////////////////////////////////////////////////////////////////////
//
// Adds symmetric linear solves: Cholesky with a Bunch-Kaufman fallback and checked pivots.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # linalg
//!
//! Factor-once, solve-many routines for the symmetric systems that appear when
//! fitting kernel interpolants. Kernel matrices are symmetric positive definite
//! in exact arithmetic but can become numerically indefinite for large shape
//! parameters, so an `LLᵀ` factorisation is tried first and the
//! Bunch-Kaufman `LBLᵀ` factorisation is used when it fails.

use faer::{
    self, Conj, Mat, MatRef, Side,
    diag::Diag,
    dyn_stack::{MemBuffer, MemStack},
    linalg::solvers::{Llt, Solve},
    mat::*,
    perm::Perm,
    prelude::*,
};

use crate::error::{Error, Result};

/// A symmetric factorisation that can be reused for any number of right-hand sides.
pub enum SymmetricSolver {
    Llt(Llt<f64>),
    Lblt(Lblt),
}

impl std::fmt::Debug for SymmetricSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricSolver")
            .field("kind", &self.kind())
            .field("dim", &self.dim())
            .finish()
    }
}

impl SymmetricSolver {
    /// Factorises the lower triangle of the square matrix `a`.
    pub fn factorize(a: &Mat<f64>) -> Result<Self> {
        if a.nrows() != a.ncols() {
            return Err(Error::DimensionMismatch {
                what: "symmetric matrix columns",
                expected: a.nrows(),
                found: a.ncols(),
            });
        }

        match a.llt(Side::Lower) {
            Ok(llt) => Ok(Self::Llt(llt)),
            Err(_) => Lblt::try_new(a.as_ref(), Side::Lower).map(Self::Lblt),
        }
    }

    /// Solves `A X = B` for every column of `rhs`.
    pub fn solve(&self, rhs: &Mat<f64>) -> Result<Mat<f64>> {
        if rhs.nrows() != self.dim() {
            return Err(Error::DimensionMismatch {
                what: "right-hand side rows",
                expected: self.dim(),
                found: rhs.nrows(),
            });
        }

        let x = match self {
            Self::Llt(llt) => llt.solve(rhs),
            Self::Lblt(lblt) => lblt.solve(rhs),
        };

        let finite = x.col_iter().all(|c| c.iter().all(|v| v.is_finite()));
        match finite {
            true => Ok(x),
            false => Err(Error::NumericFailure(format!(
                "{} solve of a {}x{} system produced non-finite values",
                self.kind(),
                self.dim(),
                self.dim()
            ))),
        }
    }

    /// Name of the factorisation in use.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Llt(_) => "LLT",
            Self::Lblt(_) => "LBLT",
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Self::Llt(llt) => llt.L().nrows(),
            Self::Lblt(lblt) => lblt.L.nrows(),
        }
    }
}

/// Bunch-Kaufman factorisation `P A Pᵀ = L B Lᵀ` with 1x1 and 2x2 pivot blocks.
#[allow(non_snake_case)]
pub struct Lblt {
    L: Mat<f64>,
    B_diag: Diag<f64>,
    B_subdiag: Diag<f64>,
    P: Perm<usize>,
}

#[allow(non_snake_case)]
impl Lblt {
    /// Returns the Bunch-Kaufman factorisation of the input A.
    ///
    /// The A is interpreted as symmetric, but only the provided side is accessed.
    /// Fails if a pivot block is singular relative to the magnitude of A.
    pub fn try_new(A: MatRef<'_, f64>, side: Side) -> Result<Self> {
        if A.nrows() != A.ncols() {
            return Err(Error::DimensionMismatch {
                what: "symmetric matrix columns",
                expected: A.nrows(),
                found: A.ncols(),
            });
        }

        let n = A.nrows();
        let mut L = Mat::zeros(n, n);

        match side {
            Side::Lower => L.copy_from_triangular_lower(A),
            Side::Upper => L.copy_from_triangular_lower(A.transpose()),
        }

        let scale = (0..n)
            .flat_map(|j| (j..n).map(move |i| (i, j)))
            .fold(0.0f64, |acc, (i, j)| acc.max(L[(i, j)].abs()));

        let par = faer::get_global_parallelism();

        let mut diag = Diag::zeros(n);
        let mut subdiag = Diag::zeros(n);
        let mut perm_fwd = vec![0usize; n];
        let mut perm_bwd = vec![0usize; n];

        let mut mem = MemBuffer::new(
            faer::linalg::cholesky::lblt::factor::cholesky_in_place_scratch::<usize, f64>(
                n,
                par,
                default(),
            ),
        );
        let stack = MemStack::new(&mut mem);

        faer::linalg::cholesky::lblt::factor::cholesky_in_place(
            L.as_mut(),
            subdiag.as_mut(),
            &mut perm_fwd,
            &mut perm_bwd,
            par,
            stack,
            default(),
        );

        diag.copy_from(L.diagonal());
        L.diagonal_mut().fill(1.0);

        let d: Vec<f64> = diag.as_ref().column_vector().iter().copied().collect();
        let s: Vec<f64> = subdiag.as_ref().column_vector().iter().copied().collect();
        check_pivots(&d, &s, scale)?;

        Ok(Self {
            L,
            B_diag: diag,
            B_subdiag: subdiag,
            P: unsafe {
                Perm::new_unchecked(perm_fwd.into_boxed_slice(), perm_bwd.into_boxed_slice())
            },
        })
    }

    pub fn solve(&self, rhs: &Mat<f64>) -> Mat<f64> {
        let mut rhs = rhs.clone();
        self.solve_in_place(rhs.as_mut());
        rhs
    }

    fn solve_in_place(&self, rhs: MatMut<'_, f64>) {
        let par = faer::get_global_parallelism();

        let mut mem = MemBuffer::new(
            faer::linalg::cholesky::lblt::solve::solve_in_place_scratch::<usize, f64>(
                self.L.nrows(),
                rhs.ncols(),
                par,
            ),
        );
        let stack = MemStack::new(&mut mem);

        faer::linalg::cholesky::lblt::solve::solve_in_place_with_conj(
            self.L.as_ref(),
            self.B_diag.as_ref(),
            self.B_subdiag.as_ref(),
            Conj::No,
            self.P.as_ref(),
            rhs,
            par,
            stack,
        );
    }
}

/// Walks the block diagonal of `B`; a non-zero `subdiag[i]` opens a 2x2 block.
fn check_pivots(diag: &[f64], subdiag: &[f64], scale: f64) -> Result<()> {
    let n = diag.len();
    let tol = n as f64 * f64::EPSILON * scale;
    let singular = |i: usize, what: &str| Error::Factorization {
        size: n,
        reason: format!("singular {what} pivot at row {i}"),
    };

    let mut i = 0;
    while i < n {
        if i + 1 < n && subdiag[i] != 0.0 {
            let (a, b, c) = (diag[i], subdiag[i], diag[i + 1]);
            let det = a * c - b * b;
            let block_scale = a.abs().max(b.abs()).max(c.abs());
            if !det.is_finite() || det.abs() <= tol * block_scale {
                return Err(singular(i, "2x2"));
            }
            i += 2;
        } else {
            if !diag[i].is_finite() || diag[i].abs() <= tol {
                return Err(singular(i, "1x1"));
            }
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::utils::approx::*;

    /// Deterministic SPD matrix: A = M M^T + alpha I.
    fn make_spd(n: usize, alpha: f64) -> Mat<f64> {
        let mut m = Mat::<f64>::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let x = (i as f64 + 1.0) * (j as f64 + 2.0);
                m[(i, j)] = (x.sin() + 2.0 * x.cos()) / (1.0 + (i + j + 1) as f64);
            }
        }
        let mut a = &m * m.transpose();
        for i in 0..n {
            a[(i, i)] += alpha.max(1e-3);
        }
        a
    }

    /// Symmetric indefinite: SPD with a large negative shift on half the diagonal.
    fn make_indefinite(n: usize) -> Mat<f64> {
        let mut a = make_spd(n, 1e-2);
        for i in (0..n).step_by(2) {
            a[(i, i)] -= 10.0;
        }
        a
    }

    #[test]
    fn spd_matrix_uses_cholesky() {
        let n = 7usize;
        let a = make_spd(n, 1e-2);
        let b = Mat::<f64>::from_fn(n, 3, |i, j| ((i + j + 2) as f64).sin());

        let solver = SymmetricSolver::factorize(&a).unwrap();
        assert_eq!(solver.kind(), "LLT");
        assert_eq!(solver.dim(), n);

        let x = solver.solve(&b).unwrap();
        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * (n as f64));
        assert!(&a * &x ~ b);
    }

    #[test]
    fn indefinite_matrix_falls_back_to_lblt() {
        let n = 6usize;
        let a = make_indefinite(n);
        let b = Mat::<f64>::from_fn(n, 2, |i, j| (i + 1 + 3 * j) as f64 / (1.0 + i as f64));

        let solver = SymmetricSolver::factorize(&a).unwrap();
        assert_eq!(solver.kind(), "LBLT");

        let x = solver.solve(&b).unwrap();
        let approx_eq = CwiseMat(ApproxEq::eps() * 1024.0 * (n as f64));
        assert!(&a * &x ~ b);
    }

    #[test]
    fn lblt_matches_llt_on_spd_input() {
        let n = 5usize;
        let a = make_spd(n, 0.5);
        let b = Mat::<f64>::from_fn(n, 1, |i, _| i as f64 - 2.0);

        let x_lblt = Lblt::try_new(a.as_ref(), Side::Lower).unwrap().solve(&b);
        let x_llt = a.llt(Side::Lower).unwrap().solve(&b);

        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * (n as f64));
        assert!(&x_lblt ~ &x_llt);
    }

    #[test]
    fn upper_side_is_read_transposed() {
        let n = 4usize;
        let a = make_spd(n, 1.0);
        let mut upper_only = a.clone();
        for j in 0..n {
            for i in (j + 1)..n {
                upper_only[(i, j)] = 0.0;
            }
        }
        let b = Mat::<f64>::from_fn(n, 1, |i, _| 1.0 + i as f64);

        let x = Lblt::try_new(upper_only.as_ref(), Side::Upper).unwrap().solve(&b);
        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * (n as f64));
        assert!(&a * &x ~ b);
    }

    #[test]
    fn swap_matrix_solves_with_two_by_two_pivot() {
        let a = Mat::<f64>::from_fn(2, 2, |i, j| if i == j { 0.0 } else { 1.0 });
        let b = Mat::<f64>::from_fn(2, 1, |i, _| (i + 1) as f64);

        let x = SymmetricSolver::factorize(&a).unwrap().solve(&b).unwrap();
        assert!((x[(0, 0)] - 2.0).abs() < 1e-14);
        assert!((x[(1, 0)] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let a = Mat::<f64>::from_fn(2, 2, |_, _| 1.0);
        let err = SymmetricSolver::factorize(&a).unwrap_err();
        assert!(matches!(err, Error::Factorization { size: 2, .. }));
    }

    #[test]
    fn rhs_shape_is_checked() {
        let a = make_spd(3, 1.0);
        let solver = SymmetricSolver::factorize(&a).unwrap();
        let b = Mat::<f64>::zeros(4, 1);
        assert!(matches!(
            solver.solve(&b),
            Err(Error::DimensionMismatch { expected: 3, found: 4, .. })
        ));
    }

    #[test]
    fn solve_returns_finite_solution() {
        let a = Mat::<f64>::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 });
        let b = Mat::<f64>::from_fn(2, 1, |i, _| (i + 1) as f64);

        let x = SymmetricSolver::factorize(&a).unwrap().solve(&b).unwrap();
        assert!((x[(0, 0)] - 0.5).abs() < 1e-15);
        assert!((x[(1, 0)] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn non_square_lblt_input_is_rejected() {
        let a = Mat::<f64>::zeros(2, 3);
        assert!(matches!(
            Lblt::try_new(a.as_ref(), Side::Lower),
            Err(Error::DimensionMismatch { expected: 2, found: 3, .. })
        ));
    }
}
