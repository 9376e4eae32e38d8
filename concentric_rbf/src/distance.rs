/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines per-point local distances and their global reductions for interpolation errors.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Distances between interpolated and reference quantities.
//!
//! A [`LocalDistance`] compares one interpolated quantity of one point with
//! its reference (a value is a slice of length 1, a gradient of length `D`
//! and a Hessian of length `D * D`). A [`GlobalDistance`] reduces the local
//! distances of all points to a single number.
//!
//! Local distances are expected to be non-negative and zero when both sides
//! are equal; this is not checked.

use concentric_rbf_utils::{distance, distance_squared};
use serde::{Deserialize, Serialize};

/// Distance between one interpolated quantity and its reference.
pub trait LocalDistance {
    fn local_distance(&self, interpolated: &[f64], reference: &[f64]) -> f64;
}

/// Order-independent reduction of per-point local distances.
pub trait GlobalDistance {
    fn global_distance(&self, local: &[f64]) -> f64;
}

impl<F> LocalDistance for F
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    #[inline]
    fn local_distance(&self, interpolated: &[f64], reference: &[f64]) -> f64 {
        self(interpolated, reference)
    }
}

impl<F> GlobalDistance for F
where
    F: Fn(&[f64]) -> f64,
{
    #[inline]
    fn global_distance(&self, local: &[f64]) -> f64 {
        self(local)
    }
}

/// Built-in local distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalDistanceKind {
    /// Euclidean (Frobenius for Hessians) norm of the difference.
    #[default]
    AbsDiff,
    /// Squared euclidean norm of the difference.
    SquaredDiff,
    /// Largest absolute component of the difference.
    MaxAbsDiff,
}

impl LocalDistance for LocalDistanceKind {
    #[inline]
    fn local_distance(&self, interpolated: &[f64], reference: &[f64]) -> f64 {
        match self {
            LocalDistanceKind::AbsDiff => distance(interpolated, reference),
            LocalDistanceKind::SquaredDiff => distance_squared(interpolated, reference),
            LocalDistanceKind::MaxAbsDiff => interpolated
                .iter()
                .zip(reference)
                .fold(0.0, |acc, (a, b)| acc.max((a - b).abs())),
        }
    }
}

/// Built-in global reductions. All return `0.0` for an empty input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalDistanceKind {
    Mean,
    /// Square root of the mean of the squared local distances.
    #[default]
    Rms,
    Max,
    Sum,
}

impl GlobalDistance for GlobalDistanceKind {
    fn global_distance(&self, local: &[f64]) -> f64 {
        if local.is_empty() {
            return 0.0;
        }
        let n = local.len() as f64;
        match self {
            GlobalDistanceKind::Mean => local.iter().sum::<f64>() / n,
            GlobalDistanceKind::Rms => (local.iter().map(|d| d * d).sum::<f64>() / n).sqrt(),
            GlobalDistanceKind::Max => match local.iter().any(|d| d.is_nan()) {
                true => f64::NAN,
                false => local.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            },
            GlobalDistanceKind::Sum => local.iter().sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn local_kinds() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 0.0, 6.0];
        assert_abs_diff_eq!(LocalDistanceKind::AbsDiff.local_distance(&a, &b), 13f64.sqrt());
        assert_abs_diff_eq!(LocalDistanceKind::SquaredDiff.local_distance(&a, &b), 13.0);
        assert_abs_diff_eq!(LocalDistanceKind::MaxAbsDiff.local_distance(&a, &b), 3.0);
        for kind in [
            LocalDistanceKind::AbsDiff,
            LocalDistanceKind::SquaredDiff,
            LocalDistanceKind::MaxAbsDiff,
        ] {
            assert_eq!(kind.local_distance(&a, &a), 0.0);
        }
    }

    #[test]
    fn global_kinds() {
        let d = [3.0, 0.0, 4.0, 1.0];
        assert_abs_diff_eq!(GlobalDistanceKind::Mean.global_distance(&d), 2.0);
        assert_abs_diff_eq!(GlobalDistanceKind::Rms.global_distance(&d), (26.0f64 / 4.0).sqrt());
        assert_abs_diff_eq!(GlobalDistanceKind::Max.global_distance(&d), 4.0);
        assert_abs_diff_eq!(GlobalDistanceKind::Sum.global_distance(&d), 8.0);
    }

    #[test]
    fn nan_local_distance_propagates() {
        let d = [1.0, f64::NAN, 3.0];
        for kind in [
            GlobalDistanceKind::Mean,
            GlobalDistanceKind::Rms,
            GlobalDistanceKind::Max,
            GlobalDistanceKind::Sum,
        ] {
            assert!(kind.global_distance(&d).is_nan(), "{kind:?}");
        }
    }

    #[test]
    fn global_is_order_independent() {
        let d = [0.5, 2.5, 1.25, 7.0];
        let mut r = d;
        r.reverse();
        for kind in [
            GlobalDistanceKind::Mean,
            GlobalDistanceKind::Rms,
            GlobalDistanceKind::Max,
            GlobalDistanceKind::Sum,
        ] {
            assert_abs_diff_eq!(kind.global_distance(&d), kind.global_distance(&r), epsilon = 1e-14);
            assert_eq!(kind.global_distance(&[]), 0.0);
        }
    }

    #[test]
    fn closures_are_distances() {
        let l1 = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>();
        assert_eq!(l1.local_distance(&[1.0, -1.0], &[0.0, 1.0]), 3.0);
        let first = |d: &[f64]| d[0];
        assert_eq!(first.global_distance(&[9.0, 1.0]), 9.0);
    }
}
