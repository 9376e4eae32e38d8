/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the matrix text reader, point set writers, matrix printing and CSV import.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Plain-text matrix and point set files.
//!
//! The matrix text format holds one row per line. Values are separated by any
//! mix of spaces, tabs and commas, everything after `#` is a comment and lines
//! that are empty after stripping comments are skipped. The first data row
//! fixes the column count; reading stops silently at the first row with a
//! different count.
//!
//! Point sets are written one point per row as coordinates, value, gradient
//! and the full row-major Hessian, so a file written with all quantities has
//! `2D + 1 + D²` columns. [`read_point_set`] and [`csv_to_point_set`] use the
//! column count to decide which quantities are present.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use concentric_rbf_utils::{FlatMatrix, FlatTensor3};
use csv::{ReaderBuilder, Trim};

use crate::error::{Error, Result};
use crate::point_set::{PointSet, Quantity};

/// Splits a line of the matrix text format into its tokens.
pub fn clean_line(line: &str) -> impl Iterator<Item = &str> {
    let data = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    data.split([' ', ',', '\t', '\r', '\n'])
        .filter(|token| !token.is_empty())
}

/// Reads a matrix from a text file.
///
/// # Errors
/// - [`Error::Open`] / [`Error::Read`] on I/O failure.
/// - [`Error::Parse`] for a non-numeric token.
/// - [`Error::EmptyMatrix`] if the file holds no data rows.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<FlatMatrix> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matrix(BufReader::new(file), path)
}

/// Parses the matrix text format from any buffered reader. `path` is only
/// used for error reporting.
pub fn parse_matrix<R: BufRead>(reader: R, path: &Path) -> Result<FlatMatrix> {
    let mut data = Vec::new();
    let mut ncols = 0;
    let mut nrows = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let tokens: Vec<&str> = clean_line(&line).collect();
        if tokens.is_empty() {
            continue;
        }
        if ncols == 0 {
            ncols = tokens.len();
        } else if tokens.len() != ncols {
            break;
        }

        for token in tokens {
            let value: f64 = token.parse().map_err(|_| Error::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                token: token.to_string(),
            })?;
            data.push(value);
        }
        nrows += 1;
    }

    FlatMatrix::from_row_major(nrows, ncols, data).ok_or_else(|| Error::EmptyMatrix {
        path: path.to_path_buf(),
    })
}

/// Reads a point set of dimension `dims` written by [`write_point_set`].
pub fn read_point_set<P: AsRef<Path>>(path: P, dims: usize) -> Result<PointSet> {
    point_set_from_columns(&read_matrix(path)?, dims)
}

/// Selects the quantities written by the point set writers.
///
/// The reader infers quantities from the column count, so gradients need
/// values and Hessians need gradients. Other combinations are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFlags {
    pub values: bool,
    pub gradients: bool,
    pub hessians: bool,
}

impl Default for WriteFlags {
    fn default() -> Self {
        Self {
            values: true,
            gradients: true,
            hessians: true,
        }
    }
}

impl WriteFlags {
    /// Coordinates and values only.
    pub fn values_only() -> Self {
        Self {
            values: true,
            gradients: false,
            hessians: false,
        }
    }
}

/// Writes `set` to a text file in a Gnuplot friendly layout.
///
/// Fails before touching the file with [`Error::InvalidSettings`] if the
/// flags skip a quantity that a later one depends on, or with
/// [`Error::MissingReference`] if a flagged quantity is absent from the set.
pub fn write_point_set<P: AsRef<Path>>(path: P, set: &PointSet, flags: WriteFlags) -> Result<()> {
    let path = path.as_ref();
    check_flags(set, flags)?;

    let file = File::create(path).map_err(|source| Error::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    write_rows(&mut writer, set, flags)
        .and_then(|_| writer.flush())
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Same as [`write_point_set`] but writes to any writer.
pub fn write_point_set_to<W: Write>(writer: &mut W, set: &PointSet, flags: WriteFlags) -> Result<()> {
    check_flags(set, flags)?;
    write_rows(writer, set, flags)?;
    Ok(())
}

fn check_flags(set: &PointSet, flags: WriteFlags) -> Result<()> {
    if (flags.gradients && !flags.values) || (flags.hessians && !flags.gradients) {
        return Err(Error::InvalidSettings(format!(
            "{flags:?} cannot be read back: gradients need values and Hessians need gradients"
        )));
    }
    if flags.values {
        set.require(Quantity::Value)?;
    }
    if flags.gradients {
        set.require(Quantity::Gradient)?;
    }
    if flags.hessians {
        set.require(Quantity::Hessian)?;
    }
    Ok(())
}

fn write_rows<W: Write>(w: &mut W, set: &PointSet, flags: WriteFlags) -> std::io::Result<()> {
    let d = set.dims();

    let mut header: Vec<String> = (0..d).map(|i| format!("x{i}")).collect();
    if flags.values {
        header.push("value".to_string());
    }
    if flags.gradients {
        header.extend((0..d).map(|i| format!("g{i}")));
    }
    if flags.hessians {
        header.extend((0..d * d).map(|k| format!("h{}{}", k / d, k % d)));
    }
    writeln!(w, "# {}", header.join(" "))?;

    let values = set.values().filter(|_| flags.values);
    let gradients = set.gradients().filter(|_| flags.gradients);
    let hessians = set.hessians().filter(|_| flags.hessians);

    let mut row = Vec::with_capacity(header.len());
    for p in 0..set.num_points() {
        row.clear();
        row.extend_from_slice(set.point(p));
        if let Some(v) = values {
            row.push(v[p]);
        }
        if let Some(g) = gradients {
            row.extend_from_slice(g.row(p));
        }
        if let Some(h) = hessians {
            row.extend_from_slice(h.plane(p));
        }
        write_row(w, &row)?;
    }
    Ok(())
}

fn write_row<W: Write>(w: &mut W, row: &[f64]) -> std::io::Result<()> {
    for (j, x) in row.iter().enumerate() {
        match j == 0 {
            true => write!(w, "{x:24.17e}")?,
            false => write!(w, "  {x:24.17e}")?,
        }
    }
    writeln!(w)
}

/// Prints a matrix, one row per line.
pub fn format_matrix<W: Write>(w: &mut W, matrix: &FlatMatrix) -> Result<()> {
    for row in matrix.rows() {
        write_row(w, row)?;
    }
    Ok(())
}

/// Prints a symmetric `m x m` matrix given by its packed upper triangle
/// (row by row), marking the lower triangle with `sym`.
pub fn format_matrix_sym<W: Write>(w: &mut W, packed: &[f64], m: usize) -> Result<()> {
    let expected = m * (m + 1) / 2;
    if packed.len() != expected {
        return Err(Error::DimensionMismatch {
            what: "packed symmetric matrix length",
            expected,
            found: packed.len(),
        });
    }

    let mut k = 0;
    for i in 0..m {
        for j in 0..m {
            match j < i {
                true => write!(w, "     sym     ")?,
                false => {
                    write!(w, "{:12.5e} ", packed[k])?;
                    k += 1;
                }
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Loads a CSV file of reference data for points of dimension `dims`.
///
/// The number of columns decides the quantities present: `D` coordinates
/// only, `D + 1` with values, `2D + 1` with gradients, `2D + 1 + D²` with
/// Hessians.
///
/// # Arguments
/// * `file_path` - Path to the CSV file.
/// * `has_headers` - Whether the file has a single header row to skip.
/// * `dims` - Spatial dimension of the points.
pub fn csv_to_point_set<P: AsRef<Path>>(file_path: P, has_headers: bool, dims: usize) -> Result<PointSet> {
    let path = file_path.as_ref();
    let csv_error = |source: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut data = Vec::new();
    let mut ncols = 0;
    let mut nrows = 0;

    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        ncols = record.len();
        let line = record.position().map_or(nrows + 1, |pos| pos.line() as usize);

        for token in record.iter() {
            let value: f64 = token.parse().map_err(|_| Error::Parse {
                path: path.to_path_buf(),
                line,
                token: token.to_string(),
            })?;
            data.push(value);
        }
        nrows += 1;
    }

    let matrix = FlatMatrix::from_row_major(nrows, ncols, data).ok_or_else(|| Error::EmptyMatrix {
        path: path.to_path_buf(),
    })?;
    point_set_from_columns(&matrix, dims)
}

/// Splits the columns of `matrix` into a point set of dimension `dims`.
pub fn point_set_from_columns(matrix: &FlatMatrix, dims: usize) -> Result<PointSet> {
    let (p, ncols) = matrix.shape();
    let d = dims;
    let full = 2 * d + 1 + d * d;

    if d == 0 || !(ncols == d || ncols == d + 1 || ncols == 2 * d + 1 || ncols == full) {
        return Err(Error::DimensionMismatch {
            what: "point set columns",
            expected: full,
            found: ncols,
        });
    }

    let column_block = |start: usize, width: usize| -> Vec<f64> {
        matrix
            .rows()
            .flat_map(|row| row[start..start + width].iter().copied())
            .collect()
    };
    let invalid = || Error::InvalidDimensions { num_points: p, dims: d };

    let coordinates = FlatMatrix::from_row_major(p, d, column_block(0, d)).ok_or_else(invalid)?;
    let mut set = PointSet::new(coordinates);

    if ncols > d {
        set = set.with_values(column_block(d, 1))?;
    }
    if ncols > d + 1 {
        let gradients = FlatMatrix::from_row_major(p, d, column_block(d + 1, d)).ok_or_else(invalid)?;
        set = set.with_gradients(gradients)?;
    }
    if ncols == full {
        let hessians = FlatTensor3::from_vec(p, d, d, column_block(2 * d + 1, d * d)).ok_or_else(invalid)?;
        set = set.with_hessians(hessians)?;
    }
    Ok(set)
}
