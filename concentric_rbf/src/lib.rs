/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for shape parameter tuning of mesh-free interpolants.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Shape parameter tuning for mesh-free interpolation.
//!
//! Radial basis function interpolants such as the Gaussian
//! `φ(r) = exp(-γ r²)` are controlled by a shape parameter `γ`. Small values
//! give flat, smooth but badly conditioned interpolants; large values give
//! spiky, local ones. The best value depends on the data.
//!
//! This crate scores an interpolant against reference data and searches for
//! the `γ` that minimises the score:
//!
//! - **Scoring** - [`TestOnSet`] evaluates a scheme at every reference point,
//!   measures the per-point error of values, gradients and Hessians with a
//!   [`LocalDistance`](distance::LocalDistance), reduces each with a
//!   [`GlobalDistance`](distance::GlobalDistance) and combines the three with
//!   an [`ObjectiveFunction`](objective::ObjectiveFunction) in the spirit of
//!   Sobolev norms [1].
//! - **Search** - [`optimize_gamma`] scans the admissible interval on a coarse
//!   grid and refines the best candidate by bisection, assuming the score has
//!   a single minimum in the interval.
//!
//! Any interpolant can take part by implementing [`InterpolationScheme`];
//! [`GaussianRbf`] is provided as a ready to use scheme with analytic
//! derivatives and a direct symmetric solve built on
//! [`faer`](https://docs.rs/faer/latest/faer/).
//!
//! # Examples
//!
//! ```
//! use concentric_rbf::{
//!     GaussianRbf, TestFunctions, generate_random_points, optimize_gamma,
//!     config::GammaSearchSettings,
//!     distance::{GlobalDistanceKind, LocalDistanceKind},
//!     objective::Objective,
//! };
//!
//! // Training and reference data from Franke's function
//! let training = TestFunctions::franke_2d(&generate_random_points(60, 2, Some(1)).unwrap()).unwrap();
//! let reference = TestFunctions::franke_2d(&generate_random_points(40, 2, Some(2)).unwrap()).unwrap();
//!
//! let mut rbf = GaussianRbf::from_training(&training)
//!     .unwrap()
//!     .gamma(20.0)
//!     .nugget(1e-10)
//!     .build()
//!     .unwrap();
//!
//! let settings = GammaSearchSettings::builder()
//!     .num_regular(6)
//!     .num_bisec(3)
//!     .do_hessians(false)
//!     .build()
//!     .unwrap();
//!
//! let result = optimize_gamma(
//!     &mut rbf,
//!     &reference,
//!     &LocalDistanceKind::AbsDiff,
//!     &GlobalDistanceKind::Rms,
//!     &Objective::H1Like,
//!     10.0,
//!     80.0,
//!     &settings,
//!     None,
//! )
//! .unwrap();
//!
//! assert!(result.best_gamma >= 10.0 && result.best_gamma <= 80.0);
//! ```
//!
//! # References
//! 1.  G. Fasshauer, 2007. Meshfree Approximation Methods with Matlab. World Scientific Publishing Co.
//! 2.  S. Rippa. An algorithm for selecting a good value for the parameter c in radial
//!     basis function interpolation. Adv. Comput. Math., 11:193–210, 1999.
pub mod config;

mod common;

pub mod distance;

mod error;

mod evaluation;

pub mod io;

pub mod linalg;

pub mod objective;

mod optimizer;

mod point_set;

pub mod progress;

mod rbf;

mod scheme;

mod test_functions;

pub use {
    common::{create_evaluation_grid, generate_random_points},
    error::{Error, Result},
    evaluation::{GlobalDistances, TestOnSet, interpolate_on_set, par_interpolate_on_set},
    optimizer::{GammaEvaluation, GammaSearchResult, StopReason, optimize_gamma},
    point_set::{PointSet, Quantity},
    rbf::{GaussianRbf, GaussianRbfBuilder},
    scheme::InterpolationScheme,
    test_functions::TestFunctions,
};
