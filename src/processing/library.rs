//! Read-only correction tables and their on-disk configuration
//!
//! A correction-data directory holds a `streakimage.json` config next to the
//! flat-field and monochromator tables it refers to. Tables are parsed once
//! and cached for the lifetime of the library, so one library can serve a
//! whole batch of images across threads.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StreakError};
use crate::types::parameters::{CameraModel, ParameterTree, required};
use crate::utils::file_utils::read_numeric_table;
use crate::utils::misc::interpolate_linear;

pub const CONFIG_FILE_NAME: &str = "streakimage.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionConfig {
    /// Gain setting → divisor.
    #[serde(default)]
    pub gain_correction: HashMap<String, f64>,
    /// Camera name → folder holding its flat-field tables.
    #[serde(default)]
    pub camera_correction_folders: HashMap<String, String>,
    /// Camera name → flat-field file prefix schedule.
    #[serde(default)]
    pub camera_correction_prefixes: HashMap<String, PrefixSchedule>,
    /// Camera name → monochromator table, overriding the default location.
    #[serde(default)]
    pub mono_correction_files: HashMap<String, String>,
}

/// Flat-field tables were re-measured over time; the prefix names the set
/// valid on a given acquisition date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixSchedule {
    pub default: String,
    #[serde(default)]
    pub ranges: Vec<PrefixRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub prefix: String,
}

impl PrefixSchedule {
    /// Prefix of the first range containing `date` (inclusive), else the default.
    pub fn prefix_for(&self, date: Option<NaiveDate>) -> &str {
        date.and_then(|date| {
            self.ranges
                .iter()
                .find(|range| range.start <= date && date <= range.end)
        })
        .map_or(self.default.as_str(), |range| range.prefix.as_str())
    }
}

/// Monochromator response sampled at ascending wavelengths.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoCurve {
    wavelengths: Vec<f64>,
    factors: Vec<f64>,
}

impl MonoCurve {
    pub fn new(mut points: Vec<(f64, f64)>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (wavelengths, factors) = points.into_iter().unzip();
        Some(Self {
            wavelengths,
            factors,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.wavelengths[0], self.wavelengths[self.wavelengths.len() - 1])
    }

    /// Correction factor at every requested wavelength.
    ///
    /// Wavelengths outside the measured domain are only allowed with `extrapolate`.
    pub fn factors_at(&self, wavelengths: &[f64], extrapolate: bool) -> Result<Vec<f64>> {
        let (low, high) = self.domain();
        let requested = wavelengths
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| {
                (lo.min(w), hi.max(w))
            });
        if !extrapolate && (requested.0 < low || requested.1 > high) {
            return Err(StreakError::OutOfCalibrationRange {
                requested,
                calibrated: (low, high),
            });
        }
        Ok(wavelengths
            .iter()
            .map(|&w| interpolate_linear(&self.wavelengths, &self.factors, w))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FlatFieldKey {
    camera: CameraModel,
    prefix: String,
    time_range: String,
    width: usize,
    height: usize,
}

/// Correction tables rooted at one directory, cached after first use.
#[derive(Debug)]
pub struct CorrectionLibrary {
    root: PathBuf,
    config: CorrectionConfig,
    flat_fields: RwLock<HashMap<FlatFieldKey, Arc<Array2<f64>>>>,
    mono_curves: RwLock<HashMap<CameraModel, Arc<MonoCurve>>>,
}

impl CorrectionLibrary {
    pub fn new(root: impl Into<PathBuf>, config: CorrectionConfig) -> Self {
        Self {
            root: root.into(),
            config,
            flat_fields: RwLock::new(HashMap::new()),
            mono_curves: RwLock::new(HashMap::new()),
        }
    }

    /// Open a correction-data directory and read its `streakimage.json`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config_path = root.join(CONFIG_FILE_NAME);
        let file = File::open(&config_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StreakError::MissingCorrectionData(format!(
                "{} does not exist",
                config_path.display()
            )),
            _ => e.into(),
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Divisor for an MCP gain setting.
    pub fn gain_divisor(&self, gain: &str) -> Result<f64> {
        let divisor = *self.config.gain_correction.get(gain.trim()).ok_or_else(|| {
            StreakError::MissingCorrectionData(format!("no gain coefficient for gain {gain:?}"))
        })?;
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(StreakError::InvalidCorrectionData {
                path: self.root.join(CONFIG_FILE_NAME),
                reason: format!("gain coefficient {divisor} for gain {gain:?}"),
            });
        }
        Ok(divisor)
    }

    /// Flat-field array for the camera, time range and dimensions of an image.
    ///
    /// The file is `{folder}/{camera}_{prefix}_ST{time range}_correction_{width}x{height}.dat`.
    pub fn flat_field(
        &self,
        parameters: &ParameterTree,
        width: usize,
        height: usize,
    ) -> Result<Arc<Array2<f64>>> {
        let camera = camera_model(parameters)?;
        let time_range = required(
            parameters.streak_camera().time_range(),
            "Streakcamera",
            "TimeRange",
        )?;
        let prefix = self.camera_prefix(camera, parameters)?;
        let key = FlatFieldKey {
            camera,
            prefix,
            time_range: time_range.to_string(),
            width,
            height,
        };

        if let Some(cached) = self
            .flat_fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(cached));
        }

        let folder = self
            .config
            .camera_correction_folders
            .get(camera.name())
            .ok_or_else(|| {
                StreakError::MissingCorrectionData(format!("no correction folder for {camera}"))
            })?;
        let path = self.root.join(folder).join(format!(
            "{}_{}_ST{}_correction_{}x{}.dat",
            camera.name(),
            key.prefix,
            key.time_range,
            width,
            height
        ));
        debug!(path = %path.display(), "loading flat-field correction");

        let rows = read_numeric_table(&path)?;
        if rows.len() != height || rows.iter().any(|row| row.len() != width) {
            return Err(StreakError::InvalidCorrectionData {
                path,
                reason: format!("expected {height} rows of {width} values"),
            });
        }
        let values: Vec<f64> = rows.into_iter().flatten().collect();
        if values.iter().any(|&v| v == 0.0) {
            return Err(StreakError::InvalidCorrectionData {
                path,
                reason: "flat-field contains zero".to_string(),
            });
        }
        let array = Arc::new(Array2::from_shape_vec((height, width), values)?);

        self.flat_fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&array));
        Ok(array)
    }

    /// Monochromator response curve of a camera.
    pub fn mono_curve(&self, camera: CameraModel) -> Result<Arc<MonoCurve>> {
        if let Some(cached) = self
            .mono_curves
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&camera)
        {
            return Ok(Arc::clone(cached));
        }

        let path = match self.config.mono_correction_files.get(camera.name()) {
            Some(file) => self.root.join(file),
            None => self
                .root
                .join(format!("{}_corrections", camera.name()))
                .join(format!("{}_mono.dat", camera.name())),
        };
        debug!(path = %path.display(), "loading monochromator correction");

        let invalid = |reason: &str| StreakError::InvalidCorrectionData {
            path: path.clone(),
            reason: reason.to_string(),
        };
        let points = read_numeric_table(&path)?
            .into_iter()
            .map(|row| match row[..] {
                [wavelength, factor] if factor != 0.0 => Ok((wavelength, factor)),
                [_, _] => Err(invalid("response factor is zero")),
                _ => Err(invalid("expected two columns")),
            })
            .collect::<Result<Vec<_>>>()?;
        let curve = Arc::new(MonoCurve::new(points).ok_or_else(|| invalid("fewer than two points"))?);

        self.mono_curves
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(camera, Arc::clone(&curve));
        Ok(curve)
    }

    fn camera_prefix(&self, camera: CameraModel, parameters: &ParameterTree) -> Result<String> {
        let schedule = self
            .config
            .camera_correction_prefixes
            .get(camera.name())
            .ok_or_else(|| {
                StreakError::MissingCorrectionData(format!("no correction prefix for {camera}"))
            })?;
        if schedule.ranges.is_empty() {
            return Ok(schedule.default.clone());
        }
        let date = required(parameters.application().date(), "Application", "Date")?;
        let date = NaiveDate::parse_from_str(date, "%m-%d-%Y").map_err(|_| {
            StreakError::InvalidParameter {
                field: "Application.Date",
                value: date.to_string(),
            }
        })?;
        Ok(schedule.prefix_for(Some(date)).to_string())
    }
}

/// Camera model named in the parameter tree.
pub(crate) fn camera_model(parameters: &ParameterTree) -> Result<CameraModel> {
    required(parameters.camera().camera_name(), "Camera", "CameraName")?.parse()
}
