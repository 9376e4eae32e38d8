/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the error type shared by evaluation, optimisation, solver and file I/O routines.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::point_set::Quantity;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by `concentric_rbf`.
#[derive(Debug, Error)]
pub enum Error {
    /// A point set or matrix was requested with a zero dimension.
    #[error("invalid dimensions: {num_points} points in {dims} dimensions")]
    InvalidDimensions { num_points: usize, dims: usize },

    /// Two collaborating arrays disagree in size.
    #[error("{what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A quantity was requested from a point set that does not carry it.
    #[error("point set carries no {quantity} data")]
    MissingReference { quantity: Quantity },

    /// The symmetric factorisation hit a singular pivot.
    #[error("factorisation of {size}x{size} system failed: {reason}")]
    Factorization { size: usize, reason: String },

    /// A solve or evaluation produced non-finite numbers.
    #[error("numeric failure: {0}")]
    NumericFailure(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure on a caller-supplied reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A non-numeric token in a matrix text file.
    #[error("'{}' line {line}: cannot parse {token:?} as a number", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("'{}' contains no numeric rows", path.display())]
    EmptyMatrix { path: PathBuf },

    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to serialize '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse JSON in '{}': {source}", path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("format mismatch in '{}': found '{found}', expected '{expected}'", path.display())]
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("version mismatch in '{}': found {found}, expected {expected}", path.display())]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    /// Failure reported by a user-supplied interpolation scheme.
    #[error("interpolation scheme error: {0}")]
    Scheme(String),
}
