/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies small vector kernels: norms, distances, scaling and reductions over slices.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Euclidean norm of a vector. Returns `0.0` for an empty slice.
///
/// # Examples
///
/// ```
/// use concentric_rbf_utils::norm;
///
/// assert_eq!(norm(&[3.0, 4.0]), 5.0);
/// assert_eq!(norm(&[]), 0.0);
/// ```
#[inline(always)]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Calculates the euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use concentric_rbf_utils::distance;
///
/// let dist = distance(&[1.0, 2.0], &[4.0, 6.0]);
///
/// assert_eq!(dist, 5.0);
/// ```
#[inline(always)]
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut dist = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let diff = x - y;
        dist += diff * diff;
    }
    dist.sqrt()
}

/// Squared euclidean distance, skipping the square root.
#[inline(always)]
pub fn distance_squared(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[inline(always)]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Writes `src / val` elementwise into `dst`.
#[inline(always)]
pub fn scale(src: &[f64], val: f64, dst: &mut [f64]) {
    debug_assert_eq!(src.len(), dst.len());
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d = s / val;
    }
}

/// Divides every entry of `v` by `val`.
#[inline(always)]
pub fn scale_in_place(v: &mut [f64], val: f64) {
    for x in v.iter_mut() {
        *x /= val;
    }
}

/// Returns the index of the smallest finite entry, or `None` if there is none.
///
/// # Examples
///
/// ```
/// use concentric_rbf_utils::argmin;
///
/// assert_eq!(argmin(&[3.0, f64::NAN, 1.0, 2.0]), Some(2));
/// assert_eq!(argmin(&[f64::NAN]), None);
/// ```
pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn norm_is_distance_to_origin() {
        let v = [0.3, -1.2, 2.5, 0.0];
        let origin = [0.0; 4];
        assert_abs_diff_eq!(norm(&v), distance(&v, &origin), epsilon = 1e-15);
    }

    #[test]
    fn empty_vectors_have_zero_length() {
        assert_eq!(norm(&[]), 0.0);
        assert_eq!(distance(&[], &[]), 0.0);
    }

    #[test]
    fn scale_divides() {
        let src = [2.0, 4.0, -6.0];
        let mut dst = [0.0; 3];
        scale(&src, 2.0, &mut dst);
        assert_eq!(dst, [1.0, 2.0, -3.0]);

        let mut v = src;
        scale_in_place(&mut v, -2.0);
        assert_eq!(v, [-1.0, -2.0, 3.0]);
    }

    #[test]
    fn squared_distance_matches() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.0, -1.0, 5.0];
        assert_abs_diff_eq!(distance_squared(&a, &b), distance(&a, &b).powi(2), epsilon = 1e-12);
        assert_eq!(dot(&a, &b), -2.0 + 15.0);
    }
}
