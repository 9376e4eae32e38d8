/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the evaluation contract every gamma-parameterised interpolation scheme implements.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::error::Result;

/// A mesh-free interpolant controlled by a single shape parameter `gamma`.
///
/// The evaluation pipeline and the gamma search only ever reach a scheme
/// through this trait.
pub trait InterpolationScheme {
    /// Spatial dimension `D` of the points the scheme accepts.
    fn dims(&self) -> usize;

    /// Current shape parameter.
    fn gamma(&self) -> f64;

    /// Changes the shape parameter, refitting whatever depends on it.
    fn set_gamma(&mut self, gamma: f64) -> Result<()>;

    /// Evaluates the interpolant at `point` (length `D`).
    ///
    /// When given, `gradient` (length `D`) receives the gradient and `hessian`
    /// (length `D * D`, row-major) the Hessian.
    fn evaluate(
        &self,
        point: &[f64],
        gradient: Option<&mut [f64]>,
        hessian: Option<&mut [f64]>,
    ) -> Result<f64>;
}
