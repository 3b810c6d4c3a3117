//! Type definitions for the HPD-TA image format

pub mod header;
pub mod image_data;
pub mod parameters;

// Re-export the main types for convenience
pub use header::{HEADER_LENGTH, PixelEncoding, RawHeader};
pub use image_data::ImageData;
pub use parameters::{CameraModel, ParameterTree};
