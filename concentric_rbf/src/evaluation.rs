/////////////////////////////////////////////////////////////////////////////////////////////
//
// Evaluates interpolation schemes over point sets and scores them against reference data.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    distance::{GlobalDistance, LocalDistance},
    error::{Error, Result},
    objective::ObjectiveFunction,
    point_set::{PointSet, Quantity},
    progress::{DecileProgress, ProgressMsg, ProgressSink},
    scheme::InterpolationScheme,
};

/// Evaluates `scheme` at every point of `point_set`, writing the results in place.
///
/// Values are always written. Gradients are written when
/// `evaluate_gradients` or `evaluate_hessians` is set, Hessians when
/// `evaluate_hessians` is set. Previously stored quantities that are not
/// requested are cleared.
pub fn interpolate_on_set<S>(
    scheme: &S,
    point_set: &mut PointSet,
    evaluate_gradients: bool,
    evaluate_hessians: bool,
) -> Result<()>
where
    S: InterpolationScheme + ?Sized,
{
    interpolate_sequential(scheme, point_set, evaluate_gradients, evaluate_hessians, None)
}

/// Data-parallel variant of [`interpolate_on_set`].
///
/// The scheme is only read, so points are evaluated concurrently on the rayon
/// thread pool. Results are identical to the sequential version.
pub fn par_interpolate_on_set<S>(
    scheme: &S,
    point_set: &mut PointSet,
    evaluate_gradients: bool,
    evaluate_hessians: bool,
) -> Result<()>
where
    S: InterpolationScheme + Sync + ?Sized,
{
    interpolate_parallel(scheme, point_set, evaluate_gradients, evaluate_hessians)
}

fn check_dims<S: InterpolationScheme + ?Sized>(scheme: &S, point_set: &PointSet) -> Result<()> {
    match scheme.dims() == point_set.dims() {
        true => Ok(()),
        false => Err(Error::DimensionMismatch {
            what: "point set dimensions",
            expected: scheme.dims(),
            found: point_set.dims(),
        }),
    }
}

fn interpolate_sequential<S>(
    scheme: &S,
    point_set: &mut PointSet,
    evaluate_gradients: bool,
    evaluate_hessians: bool,
    progress: Option<&Arc<dyn ProgressSink>>,
) -> Result<()>
where
    S: InterpolationScheme + ?Sized,
{
    check_dims(scheme, point_set)?;

    let evaluate_gradients = evaluate_gradients || evaluate_hessians;
    let total = point_set.num_points();
    let mut buffers = point_set.prepare_results(evaluate_gradients, evaluate_hessians)?;
    let mut tracker = DecileProgress::new();

    for p in 0..total {
        let gradient = buffers.gradients.as_mut().map(|g| g.row_mut(p));
        let hessian = buffers.hessians.as_mut().map(|h| h.plane_mut(p));
        buffers.values[p] = scheme.evaluate(buffers.coordinates.row(p), gradient, hessian)?;

        if let Some(sink) = progress {
            if let Some(percent) = tracker.update(p + 1, total) {
                sink.emit(ProgressMsg::EvaluationProgress { percent });
            }
        }
    }

    Ok(())
}

fn interpolate_parallel<S>(
    scheme: &S,
    point_set: &mut PointSet,
    evaluate_gradients: bool,
    evaluate_hessians: bool,
) -> Result<()>
where
    S: InterpolationScheme + Sync + ?Sized,
{
    check_dims(scheme, point_set)?;

    let evaluate_gradients = evaluate_gradients || evaluate_hessians;
    let d = point_set.dims();
    let grad_len = if evaluate_gradients { d } else { 0 };
    let hess_len = if evaluate_hessians { d * d } else { 0 };

    let coordinates = point_set.coordinates();
    let results = (0..point_set.num_points())
        .into_par_iter()
        .map(|p| {
            let mut gradient = vec![0.0; grad_len];
            let mut hessian = vec![0.0; hess_len];
            let value = scheme.evaluate(
                coordinates.row(p),
                evaluate_gradients.then_some(gradient.as_mut_slice()),
                evaluate_hessians.then_some(hessian.as_mut_slice()),
            )?;
            Ok((value, gradient, hessian))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut buffers = point_set.prepare_results(evaluate_gradients, evaluate_hessians)?;
    for (p, (value, gradient, hessian)) in results.into_iter().enumerate() {
        buffers.values[p] = value;
        if let Some(g) = buffers.gradients.as_mut() {
            g.row_mut(p).copy_from_slice(&gradient);
        }
        if let Some(h) = buffers.hessians.as_mut() {
            h.plane_mut(p).copy_from_slice(&hessian);
        }
    }

    Ok(())
}

/// Global distances of the three quantities from the last run.
///
/// Quantities that were not requested are reported as `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalDistances {
    pub values: f64,
    pub gradients: f64,
    pub hessians: f64,
}

/// Scores an interpolation scheme against a reference point set.
///
/// Holds the interpolated result set, the per-point local distances of the
/// last [`TestOnSet::run`] and the resulting objective value.
///
/// # Examples
///
/// ```
/// use concentric_rbf::{
///     GaussianRbf, PointSet, TestOnSet,
///     distance::{GlobalDistanceKind, LocalDistanceKind},
///     objective::Objective,
/// };
/// use concentric_rbf_utils::FlatMatrix;
///
/// let centers = FlatMatrix::from_row_major(3, 1, vec![0.0, 0.5, 1.0]).unwrap();
/// let rbf = GaussianRbf::builder(centers, vec![0.0, 0.25, 1.0]).gamma(5.0).build().unwrap();
///
/// let coords = FlatMatrix::from_row_major(2, 1, vec![0.25, 0.75]).unwrap();
/// let reference = PointSet::new(coords).with_values(vec![0.0625, 0.5625]).unwrap();
///
/// let mut test = TestOnSet::new(
///     &rbf,
///     &reference,
///     &LocalDistanceKind::AbsDiff,
///     &GlobalDistanceKind::Rms,
///     &Objective::L2Like,
/// ).unwrap();
///
/// let score = test.run(false, false).unwrap();
/// assert!(score >= 0.0);
/// assert!(test.dist_local_gradients().is_empty());
/// ```
pub struct TestOnSet<'a, S: ?Sized, L: ?Sized, G: ?Sized, O: ?Sized> {
    scheme: &'a S,
    reference: &'a PointSet,
    local: &'a L,
    global: &'a G,
    objective: &'a O,
    interpolated: PointSet,
    dist_local_values: Vec<f64>,
    dist_local_gradients: Vec<f64>,
    dist_local_hessians: Vec<f64>,
    global_distances: GlobalDistances,
    objective_value: Option<f64>,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl<'a, S, L, G, O> TestOnSet<'a, S, L, G, O>
where
    S: InterpolationScheme + ?Sized,
    L: LocalDistance + ?Sized,
    G: GlobalDistance + ?Sized,
    O: ObjectiveFunction + ?Sized,
{
    /// Prepares a test of `scheme` against `reference`.
    ///
    /// The reference must carry values and match the scheme's dimension.
    pub fn new(
        scheme: &'a S,
        reference: &'a PointSet,
        local: &'a L,
        global: &'a G,
        objective: &'a O,
    ) -> Result<Self> {
        check_dims(scheme, reference)?;
        reference.require(Quantity::Value)?;

        Ok(Self {
            scheme,
            reference,
            local,
            global,
            objective,
            interpolated: reference.empty_like(),
            dist_local_values: Vec::new(),
            dist_local_gradients: Vec::new(),
            dist_local_hessians: Vec::new(),
            global_distances: GlobalDistances::default(),
            objective_value: None,
            progress_callback: None,
        })
    }

    /// Reports evaluation progress of sequential runs in deciles.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Interpolates every reference point and returns the objective value.
    ///
    /// Requesting Hessians implies gradients. Fails with
    /// [`Error::MissingReference`] if the reference lacks a requested quantity.
    pub fn run(&mut self, evaluate_gradients: bool, evaluate_hessians: bool) -> Result<f64> {
        let evaluate_gradients = evaluate_gradients || evaluate_hessians;
        self.check_reference(evaluate_gradients, evaluate_hessians)?;

        interpolate_sequential(
            self.scheme,
            &mut self.interpolated,
            evaluate_gradients,
            evaluate_hessians,
            self.progress_callback.as_ref(),
        )?;

        self.score(evaluate_gradients, evaluate_hessians)
    }

    fn check_reference(&self, evaluate_gradients: bool, evaluate_hessians: bool) -> Result<()> {
        if evaluate_gradients {
            self.reference.require(Quantity::Gradient)?;
        }
        if evaluate_hessians {
            self.reference.require(Quantity::Hessian)?;
        }
        Ok(())
    }

    fn score(&mut self, evaluate_gradients: bool, evaluate_hessians: bool) -> Result<f64> {
        let local = self.local;
        let missing = |quantity| Error::MissingReference { quantity };

        let interpolated = self.interpolated.values().ok_or(missing(Quantity::Value))?;
        let reference = self.reference.values().ok_or(missing(Quantity::Value))?;
        self.dist_local_values = interpolated
            .iter()
            .zip(reference)
            .map(|(a, b)| local.local_distance(std::slice::from_ref(a), std::slice::from_ref(b)))
            .collect();

        self.dist_local_gradients = match evaluate_gradients {
            true => {
                let interpolated = self.interpolated.gradients().ok_or(missing(Quantity::Gradient))?;
                let reference = self.reference.gradients().ok_or(missing(Quantity::Gradient))?;
                interpolated
                    .rows()
                    .zip(reference.rows())
                    .map(|(a, b)| local.local_distance(a, b))
                    .collect()
            }
            false => Vec::new(),
        };

        self.dist_local_hessians = match evaluate_hessians {
            true => {
                let interpolated = self.interpolated.hessians().ok_or(missing(Quantity::Hessian))?;
                let reference = self.reference.hessians().ok_or(missing(Quantity::Hessian))?;
                interpolated
                    .planes()
                    .zip(reference.planes())
                    .map(|(a, b)| local.local_distance(a, b))
                    .collect()
            }
            false => Vec::new(),
        };

        let global = self.global;
        let reduce = |d: &[f64], used: bool| if used { global.global_distance(d) } else { 0.0 };
        self.global_distances = GlobalDistances {
            values: reduce(&self.dist_local_values, true),
            gradients: reduce(&self.dist_local_gradients, evaluate_gradients),
            hessians: reduce(&self.dist_local_hessians, evaluate_hessians),
        };

        let value = self.objective.combine(
            self.global_distances.values,
            self.global_distances.gradients,
            self.global_distances.hessians,
        );
        self.objective_value = Some(value);
        Ok(value)
    }

    /// Per-point local distances of the values from the last run.
    pub fn dist_local_values(&self) -> &[f64] {
        &self.dist_local_values
    }

    /// Per-point local distances of the gradients; empty if not requested.
    pub fn dist_local_gradients(&self) -> &[f64] {
        &self.dist_local_gradients
    }

    /// Per-point local distances of the Hessians; empty if not requested.
    pub fn dist_local_hessians(&self) -> &[f64] {
        &self.dist_local_hessians
    }

    pub fn global_distances(&self) -> GlobalDistances {
        self.global_distances
    }

    /// Objective value of the last run, `None` before the first run.
    pub fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    /// The interpolated quantities of the last run.
    pub fn interpolated(&self) -> &PointSet {
        &self.interpolated
    }
}

impl<'a, S, L, G, O> TestOnSet<'a, S, L, G, O>
where
    S: InterpolationScheme + Sync + ?Sized,
    L: LocalDistance + ?Sized,
    G: GlobalDistance + ?Sized,
    O: ObjectiveFunction + ?Sized,
{
    /// Same as [`TestOnSet::run`] but evaluates the points on the rayon thread pool.
    ///
    /// Per-point progress is not reported in parallel runs.
    pub fn run_parallel(&mut self, evaluate_gradients: bool, evaluate_hessians: bool) -> Result<f64> {
        let evaluate_gradients = evaluate_gradients || evaluate_hessians;
        self.check_reference(evaluate_gradients, evaluate_hessians)?;

        interpolate_parallel(
            self.scheme,
            &mut self.interpolated,
            evaluate_gradients,
            evaluate_hessians,
        )?;

        self.score(evaluate_gradients, evaluate_hessians)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{GlobalDistanceKind, LocalDistanceKind};
    use crate::objective::{Objective, h1_like_objective};
    use approx::assert_abs_diff_eq;
    use concentric_rbf_utils::{FlatMatrix, FlatTensor3};
    use std::sync::Mutex;

    /// `f(x) = gamma * Σ x_k²`, with exact derivatives.
    struct Paraboloid {
        dims: usize,
        gamma: f64,
    }

    impl InterpolationScheme for Paraboloid {
        fn dims(&self) -> usize {
            self.dims
        }

        fn gamma(&self) -> f64 {
            self.gamma
        }

        fn set_gamma(&mut self, gamma: f64) -> Result<()> {
            self.gamma = gamma;
            Ok(())
        }

        fn evaluate(
            &self,
            point: &[f64],
            gradient: Option<&mut [f64]>,
            hessian: Option<&mut [f64]>,
        ) -> Result<f64> {
            if let Some(g) = gradient {
                for (gi, x) in g.iter_mut().zip(point) {
                    *gi = 2.0 * self.gamma * x;
                }
            }
            if let Some(h) = hessian {
                let d = self.dims;
                for i in 0..d {
                    for j in 0..d {
                        h[i * d + j] = if i == j { 2.0 * self.gamma } else { 0.0 };
                    }
                }
            }
            Ok(self.gamma * point.iter().map(|x| x * x).sum::<f64>())
        }
    }

    /// Reference data of the unit paraboloid on a few points.
    fn reference(with_derivatives: bool) -> PointSet {
        let coords =
            FlatMatrix::from_row_major(3, 2, vec![0.0, 0.0, 1.0, 0.0, 1.0, 2.0]).unwrap();
        let values = coords.rows().map(|r| r.iter().map(|x| x * x).sum()).collect();
        let set = PointSet::new(coords.clone()).with_values(values).unwrap();
        if !with_derivatives {
            return set;
        }
        let grads = FlatMatrix::from_fn(3, 2, |p, k| 2.0 * coords[(p, k)]).unwrap();
        let mut hess = FlatTensor3::zeros(3, 2, 2).unwrap();
        for p in 0..3 {
            hess[(p, 0, 0)] = 2.0;
            hess[(p, 1, 1)] = 2.0;
        }
        set.with_gradients(grads).unwrap().with_hessians(hess).unwrap()
    }

    #[test]
    fn interpolate_writes_requested_quantities() {
        let scheme = Paraboloid { dims: 2, gamma: 1.5 };
        let mut set = reference(false).empty_like();

        interpolate_on_set(&scheme, &mut set, false, true).unwrap();
        assert_eq!(set.values().unwrap(), &[0.0, 1.5, 7.5]);
        assert_eq!(set.gradients().unwrap().row(2), &[3.0, 6.0]);
        assert_eq!(set.hessians().unwrap().plane(1), &[3.0, 0.0, 0.0, 3.0]);

        interpolate_on_set(&scheme, &mut set, false, false).unwrap();
        assert!(set.gradients().is_none());
        assert!(set.hessians().is_none());
    }

    #[test]
    fn parallel_matches_sequential() {
        let scheme = Paraboloid { dims: 2, gamma: 0.7 };
        let mut seq = reference(false).empty_like();
        let mut par = seq.clone();
        interpolate_on_set(&scheme, &mut seq, true, true).unwrap();
        par_interpolate_on_set(&scheme, &mut par, true, true).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let scheme = Paraboloid { dims: 3, gamma: 1.0 };
        let mut set = reference(false);
        assert!(matches!(
            interpolate_on_set(&scheme, &mut set, false, false),
            Err(Error::DimensionMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn values_only_run_leaves_derivative_arrays_empty() {
        let scheme = Paraboloid { dims: 2, gamma: 2.0 };
        let reference = reference(false);
        let mut test = TestOnSet::new(
            &scheme,
            &reference,
            &LocalDistanceKind::AbsDiff,
            &GlobalDistanceKind::Mean,
            &h1_like_objective,
        )
        .unwrap();

        let score = test.run(false, false).unwrap();

        // |2f - f| = f at each point: 0, 1, 5
        assert_eq!(test.dist_local_values(), &[0.0, 1.0, 5.0]);
        assert!(test.dist_local_gradients().is_empty());
        assert!(test.dist_local_hessians().is_empty());
        assert_abs_diff_eq!(score, h1_like_objective(2.0, 0.0, 0.0));
        assert_eq!(test.objective_value(), Some(score));
    }

    #[test]
    fn full_run_combines_all_quantities() {
        let scheme = Paraboloid { dims: 2, gamma: 1.0 };
        let reference = reference(true);
        let mut test = TestOnSet::new(
            &scheme,
            &reference,
            &LocalDistanceKind::AbsDiff,
            &GlobalDistanceKind::Max,
            &Objective::H2Like,
        )
        .unwrap();
        assert_eq!(test.run(true, true).unwrap(), 0.0);
        assert_eq!(test.dist_local_hessians().len(), 3);

        let scheme = Paraboloid { dims: 2, gamma: 2.0 };
        let mut test = TestOnSet::new(
            &scheme,
            &reference,
            &LocalDistanceKind::AbsDiff,
            &GlobalDistanceKind::Max,
            &Objective::H2Like,
        )
        .unwrap();
        let score = test.run(true, true).unwrap();
        let g = test.global_distances();
        assert_abs_diff_eq!(g.values, 5.0);
        assert_abs_diff_eq!(g.gradients, 20f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(g.hessians, 8f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(score, g.values + g.gradients + g.hessians, epsilon = 1e-12);

        let parallel = test.run_parallel(true, true).unwrap();
        assert_abs_diff_eq!(parallel, score, epsilon = 1e-14);
    }

    #[test]
    fn missing_reference_quantity_is_an_error() {
        let scheme = Paraboloid { dims: 2, gamma: 1.0 };
        let reference = reference(false);
        let mut test = TestOnSet::new(
            &scheme,
            &reference,
            &LocalDistanceKind::AbsDiff,
            &GlobalDistanceKind::Rms,
            &Objective::H1Like,
        )
        .unwrap();
        assert!(matches!(
            test.run(true, false),
            Err(Error::MissingReference { quantity: Quantity::Gradient })
        ));

        let bare = reference.empty_like();
        assert!(TestOnSet::new(
            &scheme,
            &bare,
            &LocalDistanceKind::AbsDiff,
            &GlobalDistanceKind::Rms,
            &Objective::L2Like,
        )
        .is_err());
    }

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<u32>>);

    impl ProgressSink for Recorder {
        fn emit(&self, msg: ProgressMsg) {
            if let ProgressMsg::EvaluationProgress { percent } = msg {
                self.0.lock().unwrap().push(percent);
            }
        }
    }

    #[test]
    fn sequential_run_reports_deciles() {
        let coords = FlatMatrix::from_fn(25, 1, |p, _| p as f64).unwrap();
        let values = vec![0.0; 25];
        let reference = PointSet::new(coords).with_values(values).unwrap();
        let scheme = Paraboloid { dims: 1, gamma: 1.0 };

        let recorder = Arc::new(Recorder::default());
        let mut test = TestOnSet::new(
            &scheme,
            &reference,
            &LocalDistanceKind::AbsDiff,
            &GlobalDistanceKind::Rms,
            &Objective::L2Like,
        )
        .unwrap()
        .progress_callback(recorder.clone());
        test.run(false, false).unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
    }
}
