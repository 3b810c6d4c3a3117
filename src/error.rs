use std::path::PathBuf;

use thiserror::Error;

use crate::types::header::PixelEncoding;

/// Corrections that flip a state flag and may only be applied once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Correction {
    Background,
    Gain,
    Camera,
    Monochromator,
    Exposure,
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Correction::Background => "background subtraction",
            Correction::Gain => "gain correction",
            Correction::Camera => "camera correction",
            Correction::Monochromator => "monochromator correction",
            Correction::Exposure => "exposure correction",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StreakError {
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported pixel encoding: {0:?}")]
    UnsupportedEncoding(PixelEncoding),

    #[error("Truncated data: expected at least {expected} bytes, found {actual}")]
    TruncatedData { expected: usize, actual: usize },

    #[error("Category name and/or body could not be parsed: {category:?}")]
    CommentParse { category: String },

    #[error("{0} has already been applied")]
    AlreadyCorrected(Correction),

    #[error("Background is not compatible to data (mismatched parameters: [{}])", .parameters.join(", "))]
    IncompatibleBackground {
        parameters: Vec<&'static str>,
        #[source]
        source: Option<Box<StreakError>>,
    },

    #[error("{dimension} differs: {expected} vs {found}")]
    DimensionMismatch {
        dimension: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("File types do not match: {expected:?} vs {found:?}")]
    EncodingMismatch {
        expected: PixelEncoding,
        found: PixelEncoding,
    },

    #[error("Missing correction data: {0}")]
    MissingCorrectionData(String),

    #[error(
        "Data bounds {requested:?} exceed the measured correction {calibrated:?}; request extrapolation explicitly"
    )]
    OutOfCalibrationRange {
        requested: (f64, f64),
        calibrated: (f64, f64),
    },

    #[error("Missing parameter {category}.{field}")]
    MissingParameter {
        category: &'static str,
        field: &'static str,
    },

    #[error("Invalid value for {field}: {value:?}")]
    InvalidParameter { field: &'static str, value: String },

    #[error("Invalid correction data in {}: {reason}", .path.display())]
    InvalidCorrectionData { path: PathBuf, reason: String },

    #[error("Offset windows do not select any pixel")]
    EmptySelection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid correction config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid matrix shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, StreakError>;
