/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines objective functions combining global value, gradient and Hessian errors.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// Combines the global distances of values, gradients and Hessians into a score.
///
/// Components that were not computed are passed as `0.0`.
pub trait ObjectiveFunction {
    fn combine(&self, value: f64, gradient: f64, hessian: f64) -> f64;
}

impl<F> ObjectiveFunction for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    #[inline]
    fn combine(&self, value: f64, gradient: f64, hessian: f64) -> f64 {
        self(value, gradient, hessian)
    }
}

/// Sobolev `H²`-like score: `value + gradient + hessian`.
#[inline]
pub fn h2_like_objective(value: f64, gradient: f64, hessian: f64) -> f64 {
    value + gradient + hessian
}

/// Sobolev `H¹`-like score: `value + gradient`.
#[inline]
pub fn h1_like_objective(value: f64, gradient: f64, _hessian: f64) -> f64 {
    value + gradient
}

/// `L²`-like score: `value` only.
#[inline]
pub fn l2_like_objective(value: f64, _gradient: f64, _hessian: f64) -> f64 {
    value
}

/// Built-in objectives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    #[default]
    H2Like,
    H1Like,
    L2Like,
}

impl Objective {
    /// Whether the objective reads the gradient component.
    pub fn uses_gradients(&self) -> bool {
        matches!(self, Objective::H2Like | Objective::H1Like)
    }

    /// Whether the objective reads the Hessian component.
    pub fn uses_hessians(&self) -> bool {
        matches!(self, Objective::H2Like)
    }
}

impl ObjectiveFunction for Objective {
    #[inline]
    fn combine(&self, value: f64, gradient: f64, hessian: f64) -> f64 {
        match self {
            Objective::H2Like => h2_like_objective(value, gradient, hessian),
            Objective::H1Like => h1_like_objective(value, gradient, hessian),
            Objective::L2Like => l2_like_objective(value, gradient, hessian),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_objectives() {
        let (a, b, c) = (0.5, 1.25, 4.0);
        assert_eq!(l2_like_objective(a, b, c), a);
        assert_eq!(h1_like_objective(a, b, c), a + b);
        assert_eq!(h2_like_objective(a, b, c), a + b + c);
    }

    #[test]
    fn enum_matches_functions() {
        let (a, b, c) = (0.1, 0.2, 0.3);
        assert_eq!(Objective::L2Like.combine(a, b, c), a);
        assert_eq!(Objective::H1Like.combine(a, b, c), a + b);
        assert_eq!(Objective::H2Like.combine(a, b, c), a + b + c);
        assert!(!Objective::L2Like.uses_gradients());
        assert!(Objective::H1Like.uses_gradients() && !Objective::H1Like.uses_hessians());
    }

    #[test]
    fn functions_and_closures_are_objectives() {
        assert_eq!(h2_like_objective.combine(1.0, 2.0, 3.0), 6.0);
        let weighted = |v: f64, g: f64, h: f64| v + 0.1 * g + 0.01 * h;
        assert_eq!(weighted.combine(1.0, 10.0, 100.0), 3.0);
    }
}
