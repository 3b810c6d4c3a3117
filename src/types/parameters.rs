//! Two-level parameter tree recovered from the comment block.
//!
//! Categories and fields evolved across acquisition software versions, so the
//! tree is a sparse string mapping. The typed views below only offer
//! convenient accessors; an absent field is `None`, never an error.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StreakError};

pub type Fields = IndexMap<String, String>;

/// Strips the spaces and periods the acquisition software puts into names.
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| *c != ' ' && *c != '.').collect()
}

/// Ordered mapping of category name → field name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTree {
    categories: IndexMap<String, Fields>,
}

impl ParameterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a category, merging into an existing one of the same name.
    pub fn insert_category(&mut self, name: &str, fields: Fields) {
        self.categories
            .entry(normalize_name(name))
            .or_default()
            .extend(fields);
    }

    pub fn insert(&mut self, category: &str, field: &str, value: impl Into<String>) {
        self.categories
            .entry(normalize_name(category))
            .or_default()
            .insert(normalize_name(field), value.into());
    }

    pub fn category(&self, name: &str) -> Option<&Fields> {
        self.categories.get(&normalize_name(name))
    }

    pub fn get(&self, category: &str, field: &str) -> Option<&str> {
        self.category(category)?
            .get(&normalize_name(field))
            .map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &Fields)> {
        self.categories.iter().map(|(name, fields)| (name.as_str(), fields))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn application(&self) -> ApplicationParams<'_> {
        ApplicationParams(self.category("Application"))
    }

    pub fn camera(&self) -> CameraParams<'_> {
        CameraParams(self.category("Camera"))
    }

    pub fn acquisition(&self) -> AcquisitionParams<'_> {
        AcquisitionParams(self.category("Acquisition"))
    }

    pub fn streak_camera(&self) -> StreakCameraParams<'_> {
        StreakCameraParams(self.category("Streakcamera"))
    }

    pub fn spectrograph(&self) -> SpectrographParams<'_> {
        SpectrographParams(self.category("Spectrograph"))
    }
}

fn lookup<'a>(fields: Option<&'a Fields>, key: &str) -> Option<&'a str> {
    fields?.get(key).map(String::as_str)
}

/// Fetches a value a correction cannot do without.
pub(crate) fn required<'a>(
    value: Option<&'a str>,
    category: &'static str,
    field: &'static str,
) -> Result<&'a str> {
    value.ok_or(StreakError::MissingParameter { category, field })
}

#[derive(Debug, Clone, Copy)]
pub struct ApplicationParams<'a>(Option<&'a Fields>);

impl<'a> ApplicationParams<'a> {
    /// Acquisition date as `MM-DD-YYYY`.
    pub fn date(&self) -> Option<&'a str> {
        lookup(self.0, "Date")
    }

    /// Acquisition time as `HH:MM:SS`.
    pub fn time(&self) -> Option<&'a str> {
        lookup(self.0, "Time")
    }

    pub fn software(&self) -> Option<&'a str> {
        lookup(self.0, "Software")
    }

    pub fn software_version(&self) -> Option<&'a str> {
        lookup(self.0, "SoftwareVersion")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraParams<'a>(Option<&'a Fields>);

impl<'a> CameraParams<'a> {
    pub fn camera_name(&self) -> Option<&'a str> {
        lookup(self.0, "CameraName")
    }

    pub fn model(&self) -> Option<CameraModel> {
        self.camera_name()?.parse().ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AcquisitionParams<'a>(Option<&'a Fields>);

impl<'a> AcquisitionParams<'a> {
    pub fn nr_exposure(&self) -> Option<&'a str> {
        lookup(self.0, "NrExposure")
    }

    pub fn exposure_time(&self) -> Option<&'a str> {
        lookup(self.0, "ExposureTime")
    }

    pub fn backsub_corr(&self) -> Option<&'a str> {
        lookup(self.0, "BacksubCorr")
    }

    pub fn shading_corr(&self) -> Option<&'a str> {
        lookup(self.0, "ShadingCorr")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StreakCameraParams<'a>(Option<&'a Fields>);

impl<'a> StreakCameraParams<'a> {
    pub fn mcp_gain(&self) -> Option<&'a str> {
        lookup(self.0, "MCPGain")
    }

    pub fn time_range(&self) -> Option<&'a str> {
        lookup(self.0, "TimeRange")
    }

    pub fn mode(&self) -> Option<&'a str> {
        lookup(self.0, "Mode")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpectrographParams<'a>(Option<&'a Fields>);

impl<'a> SpectrographParams<'a> {
    pub fn wavelength(&self) -> Option<&'a str> {
        lookup(self.0, "Wavelength")
    }

    pub fn grating(&self) -> Option<&'a str> {
        lookup(self.0, "Grating")
    }

    pub fn slit_width(&self) -> Option<&'a str> {
        lookup(self.0, "SlitWidth")
    }
}

/// Streak camera heads with known correction data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraModel {
    /// UV/VIS head.
    #[serde(rename = "C4742-95")]
    C4742_95,
    /// IR head.
    #[serde(rename = "C4742-95-12ER")]
    C4742_95_12ER,
}

impl CameraModel {
    pub fn name(self) -> &'static str {
        match self {
            CameraModel::C4742_95 => "C4742-95",
            CameraModel::C4742_95_12ER => "C4742-95-12ER",
        }
    }

    pub fn spectral_range(self) -> &'static str {
        match self {
            CameraModel::C4742_95 => "uvvis",
            CameraModel::C4742_95_12ER => "ir",
        }
    }
}

impl FromStr for CameraModel {
    type Err = StreakError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "C4742-95" => Ok(CameraModel::C4742_95),
            "C4742-95-12ER" => Ok(CameraModel::C4742_95_12ER),
            other => Err(StreakError::InvalidParameter {
                field: "Camera.CameraName",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CameraModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
