/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a Gaussian RBF interpolant with analytic derivatives and a direct symmetric solve.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::sync::Arc;
use std::time::Instant;

use concentric_rbf_utils::{FlatMatrix, distance_squared};
use faer::Mat;

use crate::{
    error::{Error, Result},
    linalg::SymmetricSolver,
    point_set::{PointSet, Quantity},
    progress::{ProgressMsg, ProgressSink},
    scheme::InterpolationScheme,
};

/// A convenience builder for constructing a [`GaussianRbf`].
///
/// The builder should be called via the [`GaussianRbf::builder`] method.
#[derive(Debug)]
pub struct GaussianRbfBuilder {
    centers: FlatMatrix,
    values: Vec<f64>,
    gamma: f64,
    nugget: f64,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl GaussianRbfBuilder {
    fn new(centers: FlatMatrix, values: Vec<f64>) -> Self {
        Self {
            centers,
            values,
            gamma: 1.0,
            nugget: 0.0,
            progress_callback: None,
        }
    }

    /// Initial shape parameter. Defaults to `1.0`.
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Value added to the diagonal of the kernel matrix. Defaults to `0.0`.
    pub fn nugget(mut self, nugget: f64) -> Self {
        self.nugget = nugget;
        self
    }

    /// Optional callback for reporting solve timings.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Factorises the kernel matrix and solves for the coefficients.
    pub fn build(self) -> Result<GaussianRbf> {
        if self.values.len() != self.centers.nrows() {
            return Err(Error::DimensionMismatch {
                what: "training values",
                expected: self.centers.nrows(),
                found: self.values.len(),
            });
        }
        if !(self.nugget.is_finite() && self.nugget >= 0.0) {
            return Err(Error::InvalidSettings(format!(
                "nugget must be finite and non-negative, got {}",
                self.nugget
            )));
        }
        check_gamma(self.gamma)?;

        let mut rbf = GaussianRbf {
            centers: self.centers,
            values: self.values,
            gamma: self.gamma,
            nugget: self.nugget,
            coefficients: Vec::new(),
            solver: None,
            progress_callback: self.progress_callback,
        };
        rbf.refit(self.gamma)?;
        Ok(rbf)
    }
}

/// Gaussian radial basis function interpolant
///
/// `f(x) = Σᵢ αᵢ exp(-γ ‖x - cᵢ‖²)`
///
/// with the coefficients `α` solving `(K + nugget I) α = values`, where
/// `Kᵢⱼ = exp(-γ ‖cᵢ - cⱼ‖²)`. Changing `γ` refactorises `K` once;
/// changing the values reuses the existing factorisation.
///
/// # Examples
///
/// ```
/// use concentric_rbf::{GaussianRbf, InterpolationScheme};
/// use concentric_rbf_utils::FlatMatrix;
///
/// let centers = FlatMatrix::from_row_major(3, 1, vec![0.0, 0.5, 1.0]).unwrap();
/// let rbf = GaussianRbf::builder(centers, vec![1.0, 2.0, 0.0])
///     .gamma(4.0)
///     .build()
///     .unwrap();
///
/// let v = rbf.evaluate(&[0.5], None, None).unwrap();
/// assert!((v - 2.0).abs() < 1e-10);
/// ```
#[derive(Debug)]
pub struct GaussianRbf {
    centers: FlatMatrix,
    values: Vec<f64>,
    gamma: f64,
    nugget: f64,
    coefficients: Vec<f64>,
    solver: Option<SymmetricSolver>,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl GaussianRbf {
    /// Creates a new [`GaussianRbfBuilder`] for the given centres and values.
    pub fn builder(centers: FlatMatrix, values: Vec<f64>) -> GaussianRbfBuilder {
        GaussianRbfBuilder::new(centers, values)
    }

    /// Builder seeded from the coordinates and values of a training set.
    pub fn from_training(training: &PointSet) -> Result<GaussianRbfBuilder> {
        let values = training.values().ok_or(Error::MissingReference {
            quantity: Quantity::Value,
        })?;
        Ok(GaussianRbfBuilder::new(
            training.coordinates().clone(),
            values.to_vec(),
        ))
    }

    pub fn centers(&self) -> &FlatMatrix {
        &self.centers
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Name of the factorisation used for the current gamma.
    pub fn solver_kind(&self) -> Option<&'static str> {
        self.solver.as_ref().map(|s| s.kind())
    }

    /// Replaces the data values, re-solving with the current factorisation.
    ///
    /// On failure the previous values and coefficients are kept.
    pub fn set_values(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.centers.nrows() {
            return Err(Error::DimensionMismatch {
                what: "training values",
                expected: self.centers.nrows(),
                found: values.len(),
            });
        }
        match &self.solver {
            Some(solver) => {
                self.coefficients = solve_coefficients(solver, &values)?;
                self.values = values;
                Ok(())
            }
            None => {
                let previous = std::mem::replace(&mut self.values, values);
                let result = self.refit(self.gamma);
                if result.is_err() {
                    self.values = previous;
                }
                result
            }
        }
    }

    fn kernel_matrix(&self, gamma: f64) -> Mat<f64> {
        let n = self.centers.nrows();
        let nugget = self.nugget;
        Mat::from_fn(n, n, |i, j| {
            let k = (-gamma * distance_squared(self.centers.row(i), self.centers.row(j))).exp();
            match i == j {
                true => k + nugget,
                false => k,
            }
        })
    }

    /// Factorises and solves for `gamma`, committing the new state only on success.
    fn refit(&mut self, gamma: f64) -> Result<()> {
        let solve_start = Instant::now();

        let solver = SymmetricSolver::factorize(&self.kernel_matrix(gamma))?;
        let coefficients = solve_coefficients(&solver, &self.values)?;

        self.gamma = gamma;
        self.solver = Some(solver);
        self.coefficients = coefficients;

        if let Some(sink) = &self.progress_callback {
            sink.emit(ProgressMsg::Message {
                message: format!(
                    "Took {:?} to fit Gaussian RBF with {} centres, gamma = {:e}, solver = {}",
                    solve_start.elapsed(),
                    self.centers.nrows(),
                    self.gamma,
                    self.solver_kind().unwrap_or("none"),
                ),
            });
        }
        Ok(())
    }
}

fn solve_coefficients(solver: &SymmetricSolver, values: &[f64]) -> Result<Vec<f64>> {
    let rhs = Mat::from_fn(values.len(), 1, |i, _| values[i]);
    let x = solver.solve(&rhs)?;
    Ok(x.col(0).iter().copied().collect())
}

impl InterpolationScheme for GaussianRbf {
    fn dims(&self) -> usize {
        self.centers.ncols()
    }

    fn gamma(&self) -> f64 {
        self.gamma
    }

    fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        check_gamma(gamma)?;
        self.refit(gamma)
    }

    fn evaluate(
        &self,
        point: &[f64],
        mut gradient: Option<&mut [f64]>,
        mut hessian: Option<&mut [f64]>,
    ) -> Result<f64> {
        if self.solver.is_none() {
            return Err(Error::NumericFailure(
                "no kernel factorisation available".to_string(),
            ));
        }

        let d = self.dims();
        check_slice("evaluation point", d, point.len())?;
        if let Some(g) = gradient.as_deref_mut() {
            check_slice("gradient buffer", d, g.len())?;
            g.fill(0.0);
        }
        if let Some(h) = hessian.as_deref_mut() {
            check_slice("Hessian buffer", d * d, h.len())?;
            h.fill(0.0);
        }

        let gamma = self.gamma;
        let mut diff = vec![0.0; d];
        let mut value = 0.0;

        for (center, alpha) in self.centers.rows().zip(self.coefficients.iter()) {
            for ((r, x), c) in diff.iter_mut().zip(point).zip(center) {
                *r = x - c;
            }
            let r2: f64 = diff.iter().map(|r| r * r).sum();
            let w = alpha * (-gamma * r2).exp();
            value += w;

            // d/dx exp(-γ r²) = -2γ (x - c) exp(-γ r²)
            if let Some(g) = gradient.as_deref_mut() {
                for (gi, ri) in g.iter_mut().zip(&diff) {
                    *gi -= 2.0 * gamma * w * ri;
                }
            }

            if let Some(h) = hessian.as_deref_mut() {
                for i in 0..d {
                    for j in 0..d {
                        let delta = if i == j { 1.0 } else { 0.0 };
                        h[i * d + j] += w * (4.0 * gamma * gamma * diff[i] * diff[j] - 2.0 * gamma * delta);
                    }
                }
            }
        }

        Ok(value)
    }
}

fn check_gamma(gamma: f64) -> Result<()> {
    match gamma.is_finite() && gamma > 0.0 {
        true => Ok(()),
        false => Err(Error::InvalidSettings(format!(
            "gamma must be finite and positive, got {gamma}"
        ))),
    }
}

fn check_slice(what: &'static str, expected: usize, found: usize) -> Result<()> {
    match expected == found {
        true => Ok(()),
        false => Err(Error::DimensionMismatch {
            what,
            expected,
            found,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::generate_random_points;
    use approx::assert_abs_diff_eq;

    fn smooth(x: &[f64]) -> f64 {
        (2.0 * x[0]).sin() + x[1] * x[1]
    }

    fn fitted(gamma: f64) -> GaussianRbf {
        let centers = generate_random_points(20, 2, Some(5)).unwrap();
        let values = centers.rows().map(smooth).collect();
        GaussianRbf::builder(centers, values).gamma(gamma).build().unwrap()
    }

    #[test]
    fn reproduces_training_values() {
        let rbf = fitted(20.0);
        for (p, row) in rbf.centers().rows().enumerate() {
            let v = rbf.evaluate(row, None, None).unwrap();
            assert_abs_diff_eq!(v, rbf.values[p], epsilon = 1e-6);
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let rbf = fitted(30.0);
        let x = [0.37, 0.61];
        let mut g = [0.0; 2];
        rbf.evaluate(&x, Some(&mut g), None).unwrap();

        let h = 1e-5;
        for k in 0..2 {
            let mut xp = x;
            let mut xm = x;
            xp[k] += h;
            xm[k] -= h;
            let fd = (rbf.evaluate(&xp, None, None).unwrap() - rbf.evaluate(&xm, None, None).unwrap())
                / (2.0 * h);
            assert_abs_diff_eq!(g[k], fd, epsilon = 1e-5 * (1.0 + fd.abs()));
        }
    }

    #[test]
    fn hessian_matches_finite_differences_of_gradient() {
        let rbf = fitted(30.0);
        let x = [0.42, 0.18];
        let mut hess = [0.0; 4];
        rbf.evaluate(&x, None, Some(&mut hess)).unwrap();

        let h = 1e-5;
        for k in 0..2 {
            let mut xp = x;
            let mut xm = x;
            xp[k] += h;
            xm[k] -= h;
            let mut gp = [0.0; 2];
            let mut gm = [0.0; 2];
            rbf.evaluate(&xp, Some(&mut gp), None).unwrap();
            rbf.evaluate(&xm, Some(&mut gm), None).unwrap();
            for i in 0..2 {
                let fd = (gp[i] - gm[i]) / (2.0 * h);
                assert_abs_diff_eq!(hess[i * 2 + k], fd, epsilon = 1e-4 * (1.0 + fd.abs()));
            }
        }
        assert_abs_diff_eq!(hess[1], hess[2], epsilon = 1e-10);
    }

    #[test]
    fn set_gamma_refits() {
        let mut rbf = fitted(20.0);
        let before = rbf.coefficients().to_vec();
        rbf.set_gamma(40.0).unwrap();
        assert_eq!(rbf.gamma(), 40.0);
        assert!(before.iter().zip(rbf.coefficients()).any(|(a, b)| a != b));

        let first = rbf.centers().row(0).to_vec();
        let v = rbf.evaluate(&first, None, None).unwrap();
        assert_abs_diff_eq!(v, smooth(&first), epsilon = 1e-6);
    }

    #[test]
    fn set_values_reuses_factorisation() {
        let mut rbf = fitted(25.0);
        let doubled: Vec<f64> = rbf.values.iter().map(|v| 2.0 * v).collect();
        let before = rbf.coefficients().to_vec();
        rbf.set_values(doubled).unwrap();
        for (a, b) in before.iter().zip(rbf.coefficients()) {
            assert_abs_diff_eq!(2.0 * a, *b, epsilon = 1e-8 * (1.0 + b.abs()));
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        let mut rbf = fitted(20.0);
        assert!(matches!(rbf.set_gamma(-1.0), Err(Error::InvalidSettings(_))));
        assert!(matches!(
            rbf.evaluate(&[0.0, 0.0, 0.0], None, None),
            Err(Error::DimensionMismatch { expected: 2, found: 3, .. })
        ));
        let mut short = [0.0; 1];
        assert!(rbf.evaluate(&[0.0, 0.0], Some(&mut short), None).is_err());

        let centers = FlatMatrix::zeros(3, 2).unwrap();
        assert!(GaussianRbf::builder(centers, vec![1.0; 2]).build().is_err());
    }

    #[test]
    fn from_training_requires_values() {
        let set = PointSet::new(FlatMatrix::zeros(2, 2).unwrap());
        assert!(matches!(
            GaussianRbf::from_training(&set),
            Err(Error::MissingReference { quantity: Quantity::Value })
        ));
    }

    #[test]
    fn failed_set_gamma_keeps_previous_fit() {
        let centers = FlatMatrix::from_row_major(2, 1, vec![0.0, 1e-9]).unwrap();
        let mut rbf = GaussianRbf::builder(centers, vec![1.0, 2.0])
            .gamma(1e17)
            .build()
            .unwrap();
        let coefficients = rbf.coefficients().to_vec();
        let before = rbf.evaluate(&[0.5e-9], None, None).unwrap();

        // Both centres coincide to machine precision at gamma = 1, so the kernel is singular.
        assert!(matches!(rbf.set_gamma(1.0), Err(Error::Factorization { .. })));

        assert_eq!(rbf.gamma(), 1e17);
        assert_eq!(rbf.coefficients(), coefficients.as_slice());
        assert!(rbf.solver_kind().is_some());
        assert_eq!(rbf.evaluate(&[0.5e-9], None, None).unwrap(), before);
    }

    #[test]
    fn evaluate_fails_without_factorisation() {
        let mut rbf = fitted(20.0);
        rbf.solver = None;
        assert!(matches!(
            rbf.evaluate(&[0.5, 0.5], None, None),
            Err(Error::NumericFailure(_))
        ));
    }
}
