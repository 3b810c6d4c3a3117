use crate::error::{Result, StreakError};
use crate::streak_image::StreakImage;

fn ensure_same(dimension: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(StreakError::DimensionMismatch {
            dimension,
            expected,
            found,
        });
    }
    Ok(())
}

/// Compare dimensions and pixel encoding of two images.
///
/// Both the header geometry and the shape of the decoded matrices must agree.
pub fn check_compatibility(image: &StreakImage, other: &StreakImage) -> Result<()> {
    ensure_same("height", image.height().into(), other.height().into())?;
    ensure_same("width", image.width().into(), other.width().into())?;

    let (rows, columns) = image.data().dim();
    let (other_rows, other_columns) = other.data().dim();
    ensure_same("time samples", rows, other_rows)?;
    ensure_same("wavelength samples", columns, other_columns)?;

    if image.encoding() != other.encoding() {
        return Err(StreakError::EncodingMismatch {
            expected: image.encoding(),
            found: other.encoding(),
        });
    }
    Ok(())
}

/// Acquisition settings that must agree between an image and its background.
///
/// Returns the labels of every setting that differs.
pub fn mismatched_parameters(image: &StreakImage, background: &StreakImage) -> Vec<&'static str> {
    let (ours, theirs) = (image.parameters(), background.parameters());
    let strip = |value: Option<&str>| value.map(|v| v.replace(' ', ""));

    let mut mismatched = Vec::new();
    if ours.streak_camera().mcp_gain() != theirs.streak_camera().mcp_gain() {
        mismatched.push("gain");
    }
    if ours.streak_camera().time_range() != theirs.streak_camera().time_range() {
        mismatched.push("time range");
    }
    if ours.acquisition().nr_exposure() != theirs.acquisition().nr_exposure() {
        mismatched.push("exposure count");
    }
    if strip(ours.acquisition().exposure_time()) != strip(theirs.acquisition().exposure_time()) {
        mismatched.push("exposure time");
    }
    mismatched
}
