/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines contiguous row-major matrix and rank-3 tensor containers used across the crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Flat, row-major storage for point coordinates, gradients and Hessians.
//!
//! Every container owns a single `Vec<f64>`; rows and planes are borrowed
//! slices into that buffer, so a matrix is released exactly once when it is
//! dropped. Constructors return `None` when any dimension is zero.

use std::ops::{Index, IndexMut};
use std::slice::{ChunksExact, ChunksExactMut};

use faer::{Mat, MatRef};
use serde::{Deserialize, Serialize};

/// Dense `nrows x ncols` matrix of `f64` in row-major order.
///
/// # Examples
///
/// ```
/// use concentric_rbf_utils::FlatMatrix;
///
/// let mut m = FlatMatrix::zeros(3, 2).unwrap();
/// m[(1, 0)] = 4.0;
///
/// assert_eq!(m.row(1), &[4.0, 0.0]);
/// assert_eq!(m.as_slice()[2], 4.0);
/// assert!(FlatMatrix::zeros(0, 2).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatMatrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl FlatMatrix {
    /// Allocates a zero-filled matrix, or `None` if either dimension is zero.
    pub fn zeros(nrows: usize, ncols: usize) -> Option<Self> {
        Self::filled(nrows, ncols, 0.0)
    }

    /// Allocates a matrix with every entry set to `value`.
    pub fn filled(nrows: usize, ncols: usize, value: f64) -> Option<Self> {
        if nrows == 0 || ncols == 0 {
            return None;
        }
        Some(Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        })
    }

    /// Wraps an existing row-major buffer.
    ///
    /// Returns `None` if either dimension is zero or `data.len() != nrows * ncols`.
    pub fn from_row_major(nrows: usize, ncols: usize, data: Vec<f64>) -> Option<Self> {
        if nrows == 0 || ncols == 0 || data.len() != nrows * ncols {
            return None;
        }
        Some(Self { data, nrows, ncols })
    }

    /// Builds a matrix by evaluating `f(row, col)` for every entry.
    pub fn from_fn<F>(nrows: usize, ncols: usize, mut f: F) -> Option<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut m = Self::zeros(nrows, ncols)?;
        for i in 0..nrows {
            for (j, x) in m.row_mut(i).iter_mut().enumerate() {
                *x = f(i, j);
            }
        }
        Some(m)
    }

    /// Copies a faer matrix into flat row-major storage.
    pub fn from_mat(mat: MatRef<'_, f64>) -> Option<Self> {
        Self::from_fn(mat.nrows(), mat.ncols(), |i, j| mat[(i, j)])
    }

    /// Returns an owned faer copy of this matrix.
    pub fn to_mat(&self) -> Mat<f64> {
        MatRef::from_row_major_slice(self.data.as_slice(), self.nrows, self.ncols).to_owned()
    }

    /// Returns a zero-filled matrix with the same shape.
    pub fn zeros_like(&self) -> Self {
        Self {
            data: vec![0.0; self.data.len()],
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.ncols;
        &self.data[start..start + self.ncols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.ncols;
        &mut self.data[start..start + self.ncols]
    }

    /// Iterates over the rows in order.
    #[inline]
    pub fn rows(&self) -> ChunksExact<'_, f64> {
        self.data.chunks_exact(self.ncols)
    }

    #[inline]
    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.ncols)
    }

    /// The whole backing buffer; entry `(i, j)` lives at `i * ncols + j`.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

impl Index<(usize, usize)> for FlatMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        debug_assert!(j < self.ncols);
        &self.data[i * self.ncols + j]
    }
}

impl IndexMut<(usize, usize)> for FlatMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        debug_assert!(j < self.ncols);
        &mut self.data[i * self.ncols + j]
    }
}

/// Dense `n0 x n1 x n2` tensor of `f64`, stored as `n0` contiguous
/// row-major `n1 x n2` planes.
///
/// Used for per-point Hessians: plane `p` is the full `D x D` Hessian of point `p`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatTensor3 {
    data: Vec<f64>,
    dims: (usize, usize, usize),
}

impl FlatTensor3 {
    /// Allocates a zero-filled tensor, or `None` if any dimension is zero.
    pub fn zeros(n0: usize, n1: usize, n2: usize) -> Option<Self> {
        if n0 == 0 || n1 == 0 || n2 == 0 {
            return None;
        }
        Some(Self {
            data: vec![0.0; n0 * n1 * n2],
            dims: (n0, n1, n2),
        })
    }

    /// Wraps an existing buffer laid out plane by plane.
    pub fn from_vec(n0: usize, n1: usize, n2: usize, data: Vec<f64>) -> Option<Self> {
        if n0 == 0 || n1 == 0 || n2 == 0 || data.len() != n0 * n1 * n2 {
            return None;
        }
        Some(Self {
            data,
            dims: (n0, n1, n2),
        })
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    #[inline]
    fn plane_len(&self) -> usize {
        self.dims.1 * self.dims.2
    }

    /// Borrow plane `i` as a row-major `n1 x n2` slice.
    #[inline]
    pub fn plane(&self, i: usize) -> &[f64] {
        let len = self.plane_len();
        &self.data[i * len..(i + 1) * len]
    }

    #[inline]
    pub fn plane_mut(&mut self, i: usize) -> &mut [f64] {
        let len = self.plane_len();
        &mut self.data[i * len..(i + 1) * len]
    }

    #[inline]
    pub fn planes(&self) -> ChunksExact<'_, f64> {
        let len = self.plane_len();
        self.data.chunks_exact(len)
    }

    #[inline]
    pub fn planes_mut(&mut self) -> ChunksExactMut<'_, f64> {
        let len = self.plane_len();
        self.data.chunks_exact_mut(len)
    }

    /// Borrow row `j` of plane `i`.
    #[inline]
    pub fn row(&self, i: usize, j: usize) -> &[f64] {
        let n2 = self.dims.2;
        let start = i * self.plane_len() + j * n2;
        &self.data[start..start + n2]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Index<(usize, usize, usize)> for FlatTensor3 {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &f64 {
        debug_assert!(j < self.dims.1 && k < self.dims.2);
        &self.data[(i * self.dims.1 + j) * self.dims.2 + k]
    }
}

impl IndexMut<(usize, usize, usize)> for FlatTensor3 {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut f64 {
        debug_assert!(j < self.dims.1 && k < self.dims.2);
        &mut self.data[(i * self.dims.1 + j) * self.dims.2 + k]
    }
}
