/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports the flat containers, vector kernels, fast arccosine and direction sampling.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Numeric building blocks for the [`concentric_rbf`] crate
//!
//! - [`FlatMatrix`] / [`FlatTensor3`]: contiguous row-major storage.
//! - [`norm`], [`distance`], [`scale`]: O(D) vector kernels.
//! - [`FastAcos`]: table-driven arccosine.
//! - [`random_directions`]: uniform unit vectors on the hypersphere.
//!
//! [`concentric_rbf`]: https://docs.rs/concentric_rbf
mod directions;
mod fast_acos;
mod flat_array;
mod utils;

pub use {
    directions::{DirectionStats, generate_random_directions, random_directions},
    fast_acos::{DEFAULT_ACOS_STEPS, FastAcos},
    flat_array::{FlatMatrix, FlatTensor3},
    utils::{argmin, distance, distance_squared, dot, norm, scale, scale_in_place},
};
