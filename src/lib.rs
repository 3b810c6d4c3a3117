//! Decoder and correction pipeline for HPD-TA streak camera images.
//!
//! An image file holds a fixed 64-byte header, a bracketed key/value comment
//! block, the intensity grid and two trailing float axes (wavelength, time).
//! [`StreakImage`] decodes all of it and offers the corrections that turn the
//! raw counts into comparable data.

pub mod error;
pub mod export;
pub mod parser;
pub mod processing;
pub mod streak_image;
pub mod types;
pub mod utils;

pub use error::{Correction, Result, StreakError};
pub use processing::{
    BackgroundKey, BackgroundRegistry, CorrectionConfig, CorrectionLibrary, OffsetWindow,
    check_compatibility,
};
pub use streak_image::{CorrectionState, LoadOptions, StreakImage};
pub use types::{CameraModel, ImageData, ParameterTree, PixelEncoding, RawHeader};
