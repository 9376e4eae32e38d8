/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides benchmark test functions with analytic derivatives for generating reference data.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Franke's function and its 3D analogue from [1], with analytic gradients
//! and Hessians so they can serve as complete reference data.
//!
//! # References
//! 1. Bozzini, Mira & Rossini, Milvia. (2002). Testing methods for 3D scattered data
//!    interpolation. 20. 111-135.
use concentric_rbf_utils::{FlatMatrix, FlatTensor3};

use crate::error::{Error, Result};
use crate::point_set::PointSet;

/// One term `c * exp(-Σ a_i (9 x_i - b_i)²)`.
struct GaussianTerm<const D: usize> {
    c: f64,
    a: [f64; D],
    b: [f64; D],
}

const FRANKE_2D: [GaussianTerm<2>; 4] = [
    GaussianTerm { c: 0.75, a: [0.25, 0.25], b: [2.0, 2.0] },
    GaussianTerm { c: 0.75, a: [1.0 / 49.0, 0.1], b: [-1.0, -1.0] },
    GaussianTerm { c: 0.5, a: [0.25, 0.25], b: [7.0, 3.0] },
    GaussianTerm { c: -0.2, a: [1.0, 1.0], b: [4.0, 7.0] },
];

const FRANKE_3D: [GaussianTerm<3>; 4] = [
    GaussianTerm { c: 0.75, a: [0.25, 0.25, 0.25], b: [2.0, 2.0, 2.0] },
    GaussianTerm { c: 0.75, a: [1.0 / 49.0, 0.1, 0.1], b: [-1.0, -1.0, -1.0] },
    GaussianTerm { c: 0.5, a: [0.25, 0.25, 0.25], b: [7.0, 3.0, 5.0] },
    GaussianTerm { c: -0.2, a: [1.0, 1.0, 1.0], b: [4.0, 7.0, 5.0] },
];

/// Accumulates value, gradient and row-major Hessian of a sum of terms at `x`.
fn eval_terms<const D: usize>(
    terms: &[GaussianTerm<D>],
    x: &[f64],
    gradient: &mut [f64],
    hessian: &mut [f64],
) -> f64 {
    gradient.fill(0.0);
    hessian.fill(0.0);

    let mut value = 0.0;
    for term in terms {
        let mut exponent = 0.0;
        let mut u = [0.0; D];
        for i in 0..D {
            let s = 9.0 * x[i] - term.b[i];
            exponent += term.a[i] * s * s;
            u[i] = -18.0 * term.a[i] * s;
        }
        let t = term.c * (-exponent).exp();
        value += t;

        for i in 0..D {
            gradient[i] += t * u[i];
            for j in 0..D {
                hessian[i * D + j] += t * u[i] * u[j];
            }
            hessian[i * D + i] -= t * 162.0 * term.a[i];
        }
    }
    value
}

fn reference_set<const D: usize>(terms: &[GaussianTerm<D>], points: &FlatMatrix) -> Result<PointSet> {
    let (p, d) = points.shape();
    if d != D {
        return Err(Error::DimensionMismatch {
            what: "test function dimension",
            expected: D,
            found: d,
        });
    }

    let mut values = Vec::with_capacity(p);
    let mut gradients = points.zeros_like();
    let mut hessians = FlatTensor3::zeros(p, D, D).ok_or(Error::InvalidDimensions {
        num_points: p,
        dims: D,
    })?;

    for ((x, g), h) in points.rows().zip(gradients.rows_mut()).zip(hessians.planes_mut()) {
        values.push(eval_terms(terms, x, g, h));
    }

    PointSet::new(points.clone())
        .with_values(values)?
        .with_gradients(gradients)?
        .with_hessians(hessians)
}

/// Struct that implements 2D and 3D functions to generate reference data for testing
/// interpolation schemes.
pub struct TestFunctions;

impl TestFunctions {
    /// Franke's two-dimensional test function:
    /// <div>
    /// $$
    /// \begin{aligned}
    /// F(x,y) &=
    /// \tfrac{3}{4}\exp\!\left[
    ///     -\frac{(9x-2)^2 + (9y-2)^2}{4}
    /// \right] \\[6pt]
    /// &\quad+ \tfrac{3}{4}\exp\!\left[
    ///     -\frac{(9x+1)^2}{49}
    ///     -\frac{(9y+1)^2}{10}
    /// \right] \\[6pt]
    /// &\quad+ \tfrac{1}{2}\exp\!\left[
    ///     -\frac{(9x-7)^2 + (9y-3)^2}{4}
    /// \right] \\[6pt]
    /// &\quad- \tfrac{1}{5}\exp\!\left[
    ///     -(9x-4)^2 - (9y-7)^2
    /// \right]
    /// \end{aligned}
    /// $$
    /// </div>
    ///
    /// Returns a point set carrying values, gradients and Hessians at `points`.
    ///
    /// # Examples
    /// ```
    /// use concentric_rbf::{Quantity, TestFunctions, generate_random_points};
    ///
    /// let points = generate_random_points(10, 2, Some(3)).unwrap();
    /// let reference = TestFunctions::franke_2d(&points).unwrap();
    /// assert!(reference.has(Quantity::Hessian));
    /// ```
    pub fn franke_2d(points: &FlatMatrix) -> Result<PointSet> {
        reference_set(&FRANKE_2D, points)
    }

    /// 3D Franke-like test function:
    ///
    /// <div>
    /// $$
    /// \begin{aligned}
    /// F(x,y,z) &=
    /// \tfrac{3}{4}\exp\!\left[
    ///     -\frac{(9x-2)^2 + (9y-2)^2 + (9z-2)^2}{4}
    /// \right] \\[6pt]
    /// &\quad+ \tfrac{3}{4}\exp\!\left[
    ///     -\frac{(9x+1)^2}{49}
    ///     -\frac{(9y+1)^2}{10}
    ///     -\frac{(9z+1)^2}{10}
    /// \right] \\[6pt]
    /// &\quad+ \tfrac{1}{2}\exp\!\left[
    ///     -\frac{(9x-7)^2 + (9y-3)^2 + (9z-5)^2}{4}
    /// \right] \\[6pt]
    /// &\quad- \tfrac{1}{5}\exp\!\left[
    ///     -(9x-4)^2 - (9y-7)^2 - (9z-5)^2
    /// \right]
    /// \end{aligned}
    /// $$
    /// </div>
    pub fn franke_3d(points: &FlatMatrix) -> Result<PointSet> {
        reference_set(&FRANKE_3D, points)
    }
}
