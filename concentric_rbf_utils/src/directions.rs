/////////////////////////////////////////////////////////////////////////////////////////////
//
// Samples uniformly distributed unit directions and measures their angular separation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::{FastAcos, FlatMatrix, dot, norm, scale_in_place};

/// Draws `num_directions` unit vectors in `dims` dimensions.
///
/// Each vector is a standard normal sample normalised to unit length, which
/// gives a uniform distribution on the hypersphere. Returns `None` if either
/// count is zero.
pub fn random_directions<R: Rng>(
    dims: usize,
    num_directions: usize,
    rng: &mut R,
) -> Option<FlatMatrix> {
    let mut directions = FlatMatrix::zeros(num_directions, dims)?;

    for row in directions.rows_mut() {
        loop {
            for x in row.iter_mut() {
                *x = rng.sample(StandardNormal);
            }
            let length = norm(row);
            if length > f64::MIN_POSITIVE {
                scale_in_place(row, length);
                break;
            }
        }
    }

    Some(directions)
}

/// Seeded convenience wrapper around [`random_directions`].
///
/// # Parameters
/// - `seed`: if `Some`, the same directions are produced on every run; if
///   `None`, the generator is seeded from the operating system's randomness source.
///
/// # Example
/// ```
/// use concentric_rbf_utils::generate_random_directions;
///
/// let dirs = generate_random_directions(3, 50, Some(7)).unwrap();
/// assert_eq!(dirs.shape(), (50, 3));
/// ```
pub fn generate_random_directions(
    dims: usize,
    num_directions: usize,
    seed: Option<u64>,
) -> Option<FlatMatrix> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    random_directions(dims, num_directions, &mut rng)
}

/// Angular separation statistics of a set of unit directions, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionStats {
    /// Smallest angle between any two directions.
    pub min_angle: f64,
    /// Mean over directions of the angle to the nearest other direction.
    pub mean_nearest_angle: f64,
    /// Largest nearest-neighbour angle; large values indicate holes in the covering.
    pub max_nearest_angle: f64,
}

impl DirectionStats {
    /// Computes nearest-neighbour angles between the rows of `directions`.
    ///
    /// Rows are assumed to be unit length. Returns `None` for fewer than two
    /// directions.
    pub fn compute(directions: &FlatMatrix, acos: &FastAcos) -> Option<Self> {
        let n = directions.nrows();
        if n < 2 {
            return None;
        }

        let mut nearest = vec![f64::INFINITY; n];
        for i in 0..n {
            let a = directions.row(i);
            for j in (i + 1)..n {
                let angle = acos.eval(dot(a, directions.row(j)));
                nearest[i] = nearest[i].min(angle);
                nearest[j] = nearest[j].min(angle);
            }
        }

        let min_angle = nearest.iter().copied().fold(f64::INFINITY, f64::min);
        let max_nearest_angle = nearest.iter().copied().fold(0.0, f64::max);
        let mean_nearest_angle = nearest.iter().sum::<f64>() / n as f64;

        Some(Self {
            min_angle,
            mean_nearest_angle,
            max_nearest_angle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn directions_have_unit_length() {
        let mut rng = StdRng::seed_from_u64(42);
        for dims in 1..=5 {
            let dirs = random_directions(dims, 200, &mut rng).unwrap();
            for row in dirs.rows() {
                assert_abs_diff_eq!(norm(row), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let a = generate_random_directions(3, 16, Some(11)).unwrap();
        let b = generate_random_directions(3, 16, Some(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_counts_give_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(random_directions(0, 4, &mut rng).is_none());
        assert!(random_directions(3, 0, &mut rng).is_none());
    }

    #[test]
    fn roughly_isotropic_mean() {
        let dirs = generate_random_directions(3, 20_000, Some(3)).unwrap();
        for j in 0..3 {
            let mean: f64 = dirs.rows().map(|r| r[j]).sum::<f64>() / 20_000.0;
            assert!(mean.abs() < 0.03, "component {j} mean {mean}");
        }
    }

    #[test]
    fn stats_of_coordinate_axes() {
        let axes = FlatMatrix::from_row_major(
            3,
            3,
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        )
        .unwrap();
        let stats = DirectionStats::compute(&axes, &FastAcos::new()).unwrap();
        assert_abs_diff_eq!(stats.min_angle, FRAC_PI_2, epsilon = 1e-9);
        assert_abs_diff_eq!(stats.mean_nearest_angle, FRAC_PI_2, epsilon = 1e-9);
        assert_abs_diff_eq!(stats.max_nearest_angle, FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn stats_need_two_directions() {
        let one = FlatMatrix::from_row_major(1, 2, vec![1.0, 0.0]).unwrap();
        assert!(DirectionStats::compute(&one, &FastAcos::new()).is_none());
    }
}
