/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the bounded coarse-scan plus bisection search for the shape parameter gamma.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Gamma search
//!
//! Minimises the score of a [`TestOnSet`] over a closed gamma interval,
//! assuming the score has a single minimum there.
//!
//! 1. A coarse scan scores `num_regular + 2` equally spaced gammas including
//!    both interval ends. The best grid point and its neighbours form the
//!    initial bracket `[lo, hi]`.
//! 2. Each bisection step probes `g - f (g - lo) / 2` and `g + f (hi - g) / 2`
//!    around the best gamma `g`. An improving left probe shrinks the bracket
//!    to `[lo, g]`, an improving right probe to `[g, hi]`, and otherwise the
//!    bracket becomes `[left, right]`. The bracket never grows and always
//!    contains the best gamma.
//!
//! If the score is not unimodal the search still terminates but may return
//! a local minimum.

use std::sync::Arc;

use concentric_rbf_utils::argmin;
use tracing::{debug, info, warn};

use crate::{
    config::{GammaSearchSettings, SearchConfig},
    distance::{GlobalDistance, LocalDistance},
    error::{Error, Result},
    evaluation::TestOnSet,
    objective::ObjectiveFunction,
    point_set::PointSet,
    progress::{ProgressMsg, ProgressSink, SearchStage},
    scheme::InterpolationScheme,
};

/// One scored gamma candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaEvaluation {
    pub stage: SearchStage,
    pub gamma: f64,
    pub score: f64,
}

/// Why the bisection refinement stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `num_bisec` iterations were performed.
    MaxIterations,
    /// The probe displacement fell below the gamma tolerance.
    GammaConverged,
    /// An improving step gained less than the objective tolerance.
    ObjectiveConverged,
}

/// Outcome of [`optimize_gamma`].
#[derive(Debug, Clone, PartialEq)]
pub struct GammaSearchResult {
    pub best_gamma: f64,
    pub best_score: f64,
    /// Final bracket around `best_gamma`.
    pub bracket: (f64, f64),
    /// Number of bisection iterations performed.
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// Every candidate scored, in evaluation order.
    pub history: Vec<GammaEvaluation>,
}

/// Searches `[gamma_min, gamma_max]` for the gamma minimising the score of
/// `scheme` against `reference`.
///
/// On success the scheme is left at the returned best gamma.
///
/// # Errors
/// - [`Error::InvalidSettings`] for a non-finite or empty interval or invalid settings.
/// - [`Error::MissingReference`] if the reference lacks a quantity the settings request.
/// - [`Error::NumericFailure`] if no coarse grid point yields a finite score.
/// - Any error raised by the scheme while refitting or evaluating.
#[allow(clippy::too_many_arguments)]
pub fn optimize_gamma<S, L, G, O>(
    scheme: &mut S,
    reference: &PointSet,
    local: &L,
    global: &G,
    objective: &O,
    gamma_min: f64,
    gamma_max: f64,
    settings: &GammaSearchSettings,
    progress: Option<Arc<dyn ProgressSink>>,
) -> Result<GammaSearchResult>
where
    S: InterpolationScheme + Sync + ?Sized,
    L: LocalDistance + ?Sized,
    G: GlobalDistance + ?Sized,
    O: ObjectiveFunction + ?Sized,
{
    if !(gamma_min.is_finite() && gamma_max.is_finite() && gamma_min < gamma_max) {
        return Err(Error::InvalidSettings(format!(
            "gamma interval [{gamma_min}, {gamma_max}] must be finite and non-empty"
        )));
    }
    settings.validate()?;

    let do_gradients = settings.needs_gradients();
    let do_hessians = settings.do_hessians;
    let mut history: Vec<GammaEvaluation> = Vec::new();

    let mut score_candidate = |scheme: &mut S, stage: SearchStage, gamma: f64| -> Result<f64> {
        scheme.set_gamma(gamma)?;

        let mut test = TestOnSet::new(&*scheme, reference, local, global, objective)?;
        if let Some(sink) = &progress {
            test = test.progress_callback(Arc::clone(sink));
        }
        let score = match settings.parallel {
            true => test.run_parallel(do_gradients, do_hessians)?,
            false => test.run(do_gradients, do_hessians)?,
        };

        debug!(?stage, gamma, score, "scored gamma candidate");
        if let Some(sink) = &progress {
            sink.emit(ProgressMsg::GammaCandidate { stage, gamma, score });
        }
        history.push(GammaEvaluation { stage, gamma, score });
        Ok(score)
    };

    // Coarse scan
    let num_grid = settings.num_regular + 2;
    let step = (gamma_max - gamma_min) / (num_grid - 1) as f64;
    let grid: Vec<f64> = (0..num_grid)
        .map(|k| match k == num_grid - 1 {
            true => gamma_max,
            false => gamma_min + k as f64 * step,
        })
        .collect();

    let mut scores = Vec::with_capacity(num_grid);
    for &gamma in &grid {
        scores.push(score_candidate(scheme, SearchStage::CoarseScan, gamma)?);
    }

    let best = argmin(&scores).ok_or_else(|| {
        Error::NumericFailure("no gamma on the coarse grid produced a finite score".to_string())
    })?;

    if best == 0 || best == num_grid - 1 {
        warn!(
            gamma = grid[best],
            gamma_min, gamma_max, "best gamma lies on the search interval boundary"
        );
    }

    let mut best_gamma = grid[best];
    let mut best_score = scores[best];
    let mut lo = grid[best.saturating_sub(1)];
    let mut hi = grid[(best + 1).min(num_grid - 1)];

    // Bisection refinement
    let gamma_tol = settings.gamma_tolerance * (gamma_max - gamma_min);
    let factor = settings.bisection_factor;
    let mut stop_reason = StopReason::MaxIterations;
    let mut iterations = 0;

    for _ in 0..settings.num_bisec {
        let left = best_gamma - factor * (best_gamma - lo) / 2.0;
        let right = best_gamma + factor * (hi - best_gamma) / 2.0;

        if (best_gamma - left).max(right - best_gamma) < gamma_tol {
            stop_reason = StopReason::GammaConverged;
            break;
        }
        iterations += 1;

        let previous_best = best_score;

        let left_score = match best_gamma - left > gamma_tol {
            true => Some(score_candidate(scheme, SearchStage::Bisection, left)?),
            false => None,
        };

        if let Some(score) = left_score.filter(|s| *s < best_score) {
            hi = best_gamma;
            best_gamma = left;
            best_score = score;
        } else {
            let right_score = match right - best_gamma > gamma_tol {
                true => Some(score_candidate(scheme, SearchStage::Bisection, right)?),
                false => None,
            };

            if let Some(score) = right_score.filter(|s| *s < best_score) {
                lo = best_gamma;
                best_gamma = right;
                best_score = score;
            } else {
                lo = left;
                hi = right;
            }
        }

        let gain = previous_best - best_score;
        if gain > 0.0 && gain < settings.objective_tolerance * previous_best.abs() {
            stop_reason = StopReason::ObjectiveConverged;
            break;
        }
    }

    // Leave the scheme fitted at the best gamma.
    if scheme.gamma() != best_gamma {
        scheme.set_gamma(best_gamma)?;
    }

    info!(
        best_gamma,
        best_score,
        iterations,
        ?stop_reason,
        evaluations = history.len(),
        "gamma search finished"
    );
    if let Some(sink) = &progress {
        sink.emit(ProgressMsg::Message {
            message: format!(
                "Best gamma {best_gamma:e} with score {best_score:e} after {} evaluations ({stop_reason:?})",
                history.len()
            ),
        });
    }

    Ok(GammaSearchResult {
        best_gamma,
        best_score,
        bracket: (lo, hi),
        iterations,
        stop_reason,
        history,
    })
}

impl SearchConfig {
    /// Runs [`optimize_gamma`] with the distances, objective and interval of
    /// this configuration. Derivative errors the objective ignores are not
    /// computed.
    pub fn optimize<S>(
        &self,
        scheme: &mut S,
        reference: &PointSet,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<GammaSearchResult>
    where
        S: InterpolationScheme + Sync + ?Sized,
    {
        optimize_gamma(
            scheme,
            reference,
            &self.local_distance,
            &self.global_distance,
            &self.objective,
            self.gamma_min,
            self.gamma_max,
            &self.effective_settings(),
            progress,
        )
    }
}
