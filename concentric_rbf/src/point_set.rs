/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the point set container holding coordinates, values, gradients and Hessians.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::fmt;

use concentric_rbf_utils::{FlatMatrix, FlatTensor3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The per-point quantities a [`PointSet`] may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Value,
    Gradient,
    Hessian,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Value => write!(f, "value"),
            Quantity::Gradient => write!(f, "gradient"),
            Quantity::Hessian => write!(f, "Hessian"),
        }
    }
}

/// An ordered set of `P` points in `D` dimensions with optional per-point data.
///
/// Values are scalars, gradients are stored as a `P x D` matrix and Hessians as
/// `P` full row-major `D x D` planes. The number of points and dimensions are
/// fixed at construction.
///
/// # Examples
///
/// ```
/// use concentric_rbf::PointSet;
/// use concentric_rbf_utils::FlatMatrix;
///
/// let coords = FlatMatrix::from_row_major(2, 2, vec![0.0, 0.0, 1.0, 1.0]).unwrap();
/// let set = PointSet::new(coords).with_values(vec![1.0, 2.0]).unwrap();
///
/// assert_eq!(set.num_points(), 2);
/// assert_eq!(set.values(), Some(&[1.0, 2.0][..]));
/// assert!(set.gradients().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    coordinates: FlatMatrix,
    values: Option<Vec<f64>>,
    gradients: Option<FlatMatrix>,
    hessians: Option<FlatTensor3>,
}

/// Mutable views of the result storage of a [`PointSet`], split so that each
/// point can be written while the coordinates are read.
pub(crate) struct ResultBuffers<'a> {
    pub coordinates: &'a FlatMatrix,
    pub values: &'a mut [f64],
    pub gradients: Option<&'a mut FlatMatrix>,
    pub hessians: Option<&'a mut FlatTensor3>,
}

impl PointSet {
    /// Creates a point set holding coordinates only.
    pub fn new(coordinates: FlatMatrix) -> Self {
        Self {
            coordinates,
            values: None,
            gradients: None,
            hessians: None,
        }
    }

    /// Creates a point set from a row-major coordinate buffer.
    pub fn from_coordinates(num_points: usize, dims: usize, data: Vec<f64>) -> Result<Self> {
        if num_points == 0 || dims == 0 {
            return Err(Error::InvalidDimensions { num_points, dims });
        }
        let found = data.len();
        let coordinates = FlatMatrix::from_row_major(num_points, dims, data).ok_or(
            Error::DimensionMismatch {
                what: "coordinate buffer length",
                expected: num_points * dims,
                found,
            },
        )?;
        Ok(Self::new(coordinates))
    }

    pub fn with_values(mut self, values: Vec<f64>) -> Result<Self> {
        check_len("values", self.num_points(), values.len())?;
        self.values = Some(values);
        Ok(self)
    }

    pub fn with_gradients(mut self, gradients: FlatMatrix) -> Result<Self> {
        check_len("gradient rows", self.num_points(), gradients.nrows())?;
        check_len("gradient columns", self.dims(), gradients.ncols())?;
        self.gradients = Some(gradients);
        Ok(self)
    }

    pub fn with_hessians(mut self, hessians: FlatTensor3) -> Result<Self> {
        let (p, r, c) = hessians.dims();
        check_len("Hessian planes", self.num_points(), p)?;
        check_len("Hessian rows", self.dims(), r)?;
        check_len("Hessian columns", self.dims(), c)?;
        self.hessians = Some(hessians);
        Ok(self)
    }

    /// A new set with the same coordinates and no attached data.
    pub fn empty_like(&self) -> Self {
        Self::new(self.coordinates.clone())
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.coordinates.nrows()
    }

    #[inline]
    pub fn dims(&self) -> usize {
        self.coordinates.ncols()
    }

    pub fn coordinates(&self) -> &FlatMatrix {
        &self.coordinates
    }

    #[inline]
    pub fn point(&self, p: usize) -> &[f64] {
        self.coordinates.row(p)
    }

    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    pub fn gradients(&self) -> Option<&FlatMatrix> {
        self.gradients.as_ref()
    }

    pub fn hessians(&self) -> Option<&FlatTensor3> {
        self.hessians.as_ref()
    }

    /// Whether the set carries data for `quantity`.
    pub fn has(&self, quantity: Quantity) -> bool {
        match quantity {
            Quantity::Value => self.values.is_some(),
            Quantity::Gradient => self.gradients.is_some(),
            Quantity::Hessian => self.hessians.is_some(),
        }
    }

    /// Returns `Err(MissingReference)` unless the set carries `quantity`.
    pub fn require(&self, quantity: Quantity) -> Result<()> {
        match self.has(quantity) {
            true => Ok(()),
            false => Err(Error::MissingReference { quantity }),
        }
    }

    /// Prepares result storage for an evaluation run and returns split views of it.
    ///
    /// Values are always allocated. Gradient and Hessian storage is allocated
    /// when requested and dropped otherwise, so stale results from an earlier
    /// run never survive.
    pub(crate) fn prepare_results(
        &mut self,
        gradients: bool,
        hessians: bool,
    ) -> Result<ResultBuffers<'_>> {
        let (p, d) = self.coordinates.shape();

        match &mut self.values {
            Some(v) => v.iter_mut().for_each(|x| *x = 0.0),
            None => self.values = Some(vec![0.0; p]),
        }

        self.gradients = match gradients {
            true => Some(self.coordinates.zeros_like()),
            false => None,
        };

        self.hessians = match hessians {
            true => Some(
                FlatTensor3::zeros(p, d, d)
                    .ok_or(Error::InvalidDimensions { num_points: p, dims: d })?,
            ),
            false => None,
        };

        let Self {
            coordinates,
            values,
            gradients,
            hessians,
        } = self;

        Ok(ResultBuffers {
            coordinates,
            values: values.as_deref_mut().unwrap_or_default(),
            gradients: gradients.as_mut(),
            hessians: hessians.as_mut(),
        })
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    match expected == found {
        true => Ok(()),
        false => Err(Error::DimensionMismatch {
            what,
            expected,
            found,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PointSet {
        PointSet::from_coordinates(4, 2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            PointSet::from_coordinates(0, 2, vec![]),
            Err(Error::InvalidDimensions { num_points: 0, dims: 2 })
        ));
    }

    #[test]
    fn rejects_mismatched_attachments() {
        assert!(matches!(
            square().with_values(vec![1.0; 3]),
            Err(Error::DimensionMismatch { expected: 4, found: 3, .. })
        ));
        let grads = FlatMatrix::zeros(4, 3).unwrap();
        assert!(square().with_gradients(grads).is_err());
        let hess = FlatTensor3::zeros(4, 2, 3).unwrap();
        assert!(square().with_hessians(hess).is_err());
    }

    #[test]
    fn require_reports_missing_quantity() {
        let set = square().with_values(vec![0.0; 4]).unwrap();
        assert!(set.require(Quantity::Value).is_ok());
        assert!(matches!(
            set.require(Quantity::Hessian),
            Err(Error::MissingReference { quantity: Quantity::Hessian })
        ));
    }

    #[test]
    fn prepare_results_drops_unrequested_storage() {
        let mut set = square();
        {
            let buffers = set.prepare_results(true, true).unwrap();
            assert_eq!(buffers.values.len(), 4);
            assert!(buffers.gradients.is_some());
            assert!(buffers.hessians.is_some());
        }
        assert!(set.has(Quantity::Hessian));

        set.prepare_results(false, false).unwrap();
        assert!(set.has(Quantity::Value));
        assert!(!set.has(Quantity::Gradient));
        assert!(!set.has(Quantity::Hessian));
    }
}
