/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration types for the gamma search and their versioned JSON persistence.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares configuration types for the gamma search.
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    distance::{GlobalDistanceKind, LocalDistanceKind},
    error::{Error, Result},
    objective::Objective,
};

/// Parameters controlling the coarse scan and bisection refinement of
/// [`optimize_gamma`](crate::optimize_gamma).
///
/// ### Default Values
/// - `num_regular`: `10`
/// - `num_bisec`: `4`
/// - `bisection_factor`: `1.0`
/// - `do_gradients`: `true`
/// - `do_hessians`: `true`
/// - `gamma_tolerance`: `1e-8`
/// - `objective_tolerance`: `1e-10`
/// - `parallel`: `false`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaSearchSettings {
    /// Number of interior points of the coarse grid; the grid has
    /// `num_regular + 2` points including both interval ends.
    pub num_regular: usize,

    /// Maximum number of bisection iterations.
    pub num_bisec: usize,

    /// Scales the probe distance from the best gamma; must lie in `(0, 2)`.
    /// Values below one probe closer to the best gamma.
    pub bisection_factor: f64,

    /// Include gradient errors in the score.
    pub do_gradients: bool,

    /// Include Hessian errors in the score. Implies gradients.
    pub do_hessians: bool,

    /// Stop once the probe displacement falls below this fraction of the
    /// search interval.
    pub gamma_tolerance: f64,

    /// Stop once an improving step gains less than this fraction of the
    /// previous best score.
    pub objective_tolerance: f64,

    /// Evaluate the points of each candidate on the rayon thread pool.
    pub parallel: bool,
}

impl Default for GammaSearchSettings {
    fn default() -> Self {
        Self {
            num_regular: 10,
            num_bisec: 4,
            bisection_factor: 1.0,
            do_gradients: true,
            do_hessians: true,
            gamma_tolerance: 1e-8,
            objective_tolerance: 1e-10,
            parallel: false,
        }
    }
}

impl GammaSearchSettings {
    /// Returns a new [`GammaSearchSettingsBuilder`] populated with the defaults.
    pub fn builder() -> GammaSearchSettingsBuilder {
        GammaSearchSettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Checks the invariants the search relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.bisection_factor > 0.0 && self.bisection_factor < 2.0) {
            return Err(Error::InvalidSettings(format!(
                "bisection_factor must lie in (0, 2), got {}",
                self.bisection_factor
            )));
        }
        if !(self.gamma_tolerance.is_finite() && self.gamma_tolerance >= 0.0) {
            return Err(Error::InvalidSettings(format!(
                "gamma_tolerance must be finite and non-negative, got {}",
                self.gamma_tolerance
            )));
        }
        if !(self.objective_tolerance.is_finite() && self.objective_tolerance >= 0.0) {
            return Err(Error::InvalidSettings(format!(
                "objective_tolerance must be finite and non-negative, got {}",
                self.objective_tolerance
            )));
        }
        Ok(())
    }

    /// Whether gradients must be evaluated for a candidate.
    pub fn needs_gradients(&self) -> bool {
        self.do_gradients || self.do_hessians
    }

    /// Save these settings to a versioned JSON envelope.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(path.as_ref(), self)
    }

    /// Load settings from a versioned JSON envelope and validate them.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Self = load_json(path.as_ref())?;
        settings.validate()?;
        Ok(settings)
    }
}

/// A convenience builder for constructing a [`GammaSearchSettings`] instance.
///
/// The builder should be called via the [`GammaSearchSettings::builder`] method.
///
/// # Examples
///
/// ```
/// use concentric_rbf::config::GammaSearchSettings;
///
/// let settings = GammaSearchSettings::builder()
///     .num_regular(20)
///     .num_bisec(8)
///     .do_hessians(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.num_regular, 20);
/// assert!(GammaSearchSettings::builder().bisection_factor(2.0).build().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct GammaSearchSettingsBuilder {
    settings: GammaSearchSettings,
}

impl GammaSearchSettingsBuilder {
    /// Sets the number of interior coarse grid points.
    pub fn num_regular(mut self, num_regular: usize) -> Self {
        self.settings.num_regular = num_regular;
        self
    }

    /// Sets the maximum number of bisection iterations.
    pub fn num_bisec(mut self, num_bisec: usize) -> Self {
        self.settings.num_bisec = num_bisec;
        self
    }

    /// Sets the bisection probe factor.
    pub fn bisection_factor(mut self, bisection_factor: f64) -> Self {
        self.settings.bisection_factor = bisection_factor;
        self
    }

    /// Enables or disables gradient errors in the score.
    pub fn do_gradients(mut self, do_gradients: bool) -> Self {
        self.settings.do_gradients = do_gradients;
        self
    }

    /// Enables or disables Hessian errors in the score.
    pub fn do_hessians(mut self, do_hessians: bool) -> Self {
        self.settings.do_hessians = do_hessians;
        self
    }

    /// Sets the relative gamma tolerance.
    pub fn gamma_tolerance(mut self, gamma_tolerance: f64) -> Self {
        self.settings.gamma_tolerance = gamma_tolerance;
        self
    }

    /// Sets the relative objective tolerance.
    pub fn objective_tolerance(mut self, objective_tolerance: f64) -> Self {
        self.settings.objective_tolerance = objective_tolerance;
        self
    }

    /// Enables or disables parallel point evaluation.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.settings.parallel = parallel;
        self
    }

    /// Validates and returns the [`GammaSearchSettings`].
    pub fn build(self) -> Result<GammaSearchSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

/// A complete description of a gamma search run: interval, distances,
/// objective and search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub gamma_min: f64,
    pub gamma_max: f64,
    pub local_distance: LocalDistanceKind,
    pub global_distance: GlobalDistanceKind,
    pub objective: Objective,
    pub settings: GammaSearchSettings,
}

impl SearchConfig {
    /// A configuration over `[gamma_min, gamma_max]` with default choices elsewhere.
    pub fn new(gamma_min: f64, gamma_max: f64) -> Self {
        Self {
            gamma_min,
            gamma_max,
            local_distance: LocalDistanceKind::default(),
            global_distance: GlobalDistanceKind::default(),
            objective: Objective::default(),
            settings: GammaSearchSettings::default(),
        }
    }

    /// The settings with derivative flags reduced to what the objective reads.
    pub fn effective_settings(&self) -> GammaSearchSettings {
        let mut settings = self.settings;
        settings.do_gradients &= self.objective.uses_gradients();
        settings.do_hessians &= self.objective.uses_hessians();
        settings
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(path.as_ref(), self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = load_json(path.as_ref())?;
        config.settings.validate()?;
        Ok(config)
    }
}

const JSON_FORMAT_NAME: &str = "concentric_rbf.json";
const JSON_VERSION: u32 = 1;

/// Borrowing envelope for SAVE.
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    model: &'a T,
}

/// Owning envelope for LOAD.
#[derive(Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    #[serde(flatten)]
    model: T,
}

fn save_json<T: Serialize + ?Sized>(path: &Path, model: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut w = BufWriter::new(file);

    let env = JsonEnvelopeRef {
        format: JSON_FORMAT_NAME,
        version: JSON_VERSION,
        model,
    };

    serde_json::to_writer_pretty(&mut w, &env).map_err(|e| Error::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    w.flush().map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let env: JsonEnvelopeOwned<T> =
        serde_json::from_reader(reader).map_err(|e| Error::Deserialize {
            path: path.to_path_buf(),
            source: e,
        })?;

    if env.format != JSON_FORMAT_NAME {
        return Err(Error::FormatMismatch {
            path: path.to_path_buf(),
            found: env.format,
            expected: JSON_FORMAT_NAME,
        });
    }

    if env.version != JSON_VERSION {
        return Err(Error::VersionMismatch {
            path: path.to_path_buf(),
            found: env.version,
            expected: JSON_VERSION,
        });
    }

    Ok(env.model)
}
