/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a table-driven arccosine using piecewise quadratic Lagrange interpolation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Fast arccosine.
//!
//! `[-1, 1]` is split into `2 * steps` intervals of width `h = 1 / steps`. For
//! each interval the table stores `acos` at the left end and at the midpoint;
//! evaluation is the quadratic through the left end, midpoint and right end.
//! Accuracy degrades near `±1` where `acos` has unbounded slope.

use std::f64::consts::PI;

/// Default number of table steps per unit interval.
pub const DEFAULT_ACOS_STEPS: usize = 4096;

/// Read-only lookup table for [`FastAcos::eval`].
///
/// The table is built by the constructor and never changes afterwards, so a
/// single instance can be shared across threads by reference.
///
/// # Examples
///
/// ```
/// use concentric_rbf_utils::FastAcos;
///
/// let acos = FastAcos::new();
/// assert!((acos.eval(0.5) - 0.5f64.acos()).abs() < 1e-9);
/// assert_eq!(acos.eval(-2.0), std::f64::consts::PI);
/// assert_eq!(acos.eval(1.0), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FastAcos {
    h: f64,
    /// `acos` at the `2 * steps + 1` interval boundaries.
    nodes: Vec<f64>,
    /// `acos` at the `2 * steps` interval midpoints.
    midpoints: Vec<f64>,
}

impl Default for FastAcos {
    fn default() -> Self {
        Self::new()
    }
}

impl FastAcos {
    pub fn new() -> Self {
        Self::with_steps(DEFAULT_ACOS_STEPS)
    }

    /// Builds a table with `steps` intervals per unit length.
    ///
    /// # Panics
    /// Panics if `steps == 0`.
    pub fn with_steps(steps: usize) -> Self {
        assert!(steps > 0, "FastAcos needs at least one step");

        let num_intervals = 2 * steps;
        let h = 1.0 / steps as f64;

        let nodes = (0..=num_intervals)
            .map(|i| match i == num_intervals {
                true => 0.0,
                false => clamped_acos(-1.0 + i as f64 * h),
            })
            .collect();

        let midpoints = (0..num_intervals)
            .map(|i| clamped_acos(-1.0 + (i as f64 + 0.5) * h))
            .collect();

        Self {
            h,
            nodes,
            midpoints,
        }
    }

    /// Number of table steps per unit length.
    pub fn steps(&self) -> usize {
        self.midpoints.len() / 2
    }

    /// Approximates `acos(x)`.
    ///
    /// Returns exactly `π` for `x <= -1` and exactly `0` for `x >= 1`.
    /// A NaN input yields NaN.
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        if x <= -1.0 {
            return PI;
        }
        if x >= 1.0 {
            return 0.0;
        }

        let last = self.midpoints.len() - 1;
        let i = (((x + 1.0) / self.h) as usize).min(last);
        let alpha = (x - (-1.0 + i as f64 * self.h)) / self.h;

        let left = self.nodes[i];
        let mid = self.midpoints[i];
        let right = self.nodes[i + 1];

        2.0 * ((left * (alpha - 0.5) - 2.0 * alpha * mid) * (alpha - 1.0)
            + alpha * (alpha - 0.5) * right)
    }
}

#[inline]
fn clamped_acos(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}
