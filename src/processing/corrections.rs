//! In-place corrections of the intensity matrix.
//!
//! Every correction validates its inputs and computes the new matrix before
//! assigning it, so a failed call leaves the image untouched.

use ndarray::{Array1, s};
use tracing::{debug, info};

use super::compatibility::{check_compatibility, mismatched_parameters};
use super::library::{CorrectionLibrary, camera_model};
use crate::error::{Correction, Result, StreakError};
use crate::streak_image::StreakImage;
use crate::types::parameters::required;
use crate::utils::misc::exposure_time_ms;

/// Rectangle in axis units used to estimate a constant offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetWindow {
    time: (f64, f64),
    wavelength: (f64, f64),
}

impl OffsetWindow {
    /// Bounds are inclusive and may be given in either order.
    pub fn new(time: (f64, f64), wavelength: (f64, f64)) -> Self {
        let ordered = |(a, b): (f64, f64)| if a <= b { (a, b) } else { (b, a) };
        Self {
            time: ordered(time),
            wavelength: ordered(wavelength),
        }
    }

    fn contains(&self, time: f64, wavelength: f64) -> bool {
        (self.time.0..=self.time.1).contains(&time)
            && (self.wavelength.0..=self.wavelength.1).contains(&wavelength)
    }
}

impl StreakImage {
    fn ensure_not_applied(&self, correction: Correction) -> Result<()> {
        if self.state.is_applied(correction) {
            return Err(StreakError::AlreadyCorrected(correction));
        }
        Ok(())
    }

    /// Subtracts a compatible background frame element-wise.
    ///
    /// The two matrices are aligned by position; the background's axis labels
    /// are not compared.
    pub fn subtract_background(&mut self, background: &StreakImage) -> Result<()> {
        self.ensure_not_applied(Correction::Background)?;
        check_compatibility(self, background).map_err(|e| StreakError::IncompatibleBackground {
            parameters: Vec::new(),
            source: Some(Box::new(e)),
        })?;
        let mismatched = mismatched_parameters(self, background);
        if !mismatched.is_empty() {
            return Err(StreakError::IncompatibleBackground {
                parameters: mismatched,
                source: None,
            });
        }

        self.data.intensities = &self.data.intensities - &background.data.intensities;
        self.state.mark(Correction::Background);
        info!("applied background subtraction");
        Ok(())
    }

    /// Subtracts the mean intensity over the union of `windows`.
    ///
    /// May be applied repeatedly; returns the subtracted offset.
    pub fn apply_manual_offset(&mut self, windows: &[OffsetWindow]) -> Result<f64> {
        let (mut total, mut count) = (0.0, 0usize);
        for (row, &time) in self.data.times.iter().enumerate() {
            for (column, &wavelength) in self.data.wavelengths.iter().enumerate() {
                if windows.iter().any(|w| w.contains(time, wavelength)) {
                    total += self.data.intensities[[row, column]];
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Err(StreakError::EmptySelection);
        }

        let offset = total / count as f64;
        self.data.intensities -= offset;
        debug!(offset, pixels = count, "applied manual offset");
        Ok(offset)
    }

    /// Subtracts the average of the top-left and top-right corner means.
    ///
    /// Each corner spans the first `rows` time samples and `columns`
    /// wavelength columns. Returns the subtracted offset.
    pub fn apply_corner_background(&mut self, columns: usize, rows: usize) -> Result<f64> {
        let (height, width) = self.data.dim();
        let (rows, columns) = (rows.min(height), columns.min(width));
        let left = self.data.intensities.slice(s![..rows, ..columns]).mean();
        let right = self
            .data
            .intensities
            .slice(s![..rows, width - columns..])
            .mean();
        let (Some(left), Some(right)) = (left, right) else {
            return Err(StreakError::EmptySelection);
        };

        let offset = (left + right) / 2.0;
        self.data.intensities -= offset;
        debug!(offset, "applied corner background");
        Ok(offset)
    }

    /// Divides by the coefficient of the image's MCP gain setting.
    pub fn apply_gain_correction(&mut self, library: &CorrectionLibrary) -> Result<()> {
        self.ensure_not_applied(Correction::Gain)?;
        let gain = required(
            self.parameters.streak_camera().mcp_gain(),
            "Streakcamera",
            "MCPGain",
        )?;
        let divisor = library.gain_divisor(gain)?;

        self.data.intensities /= divisor;
        self.state.mark(Correction::Gain);
        info!(gain, divisor, "applied gain correction");
        Ok(())
    }

    /// Divides element-wise by the flat-field of the camera and time range.
    pub fn apply_camera_correction(&mut self, library: &CorrectionLibrary) -> Result<()> {
        self.ensure_not_applied(Correction::Camera)?;
        let (height, width) = self.data.dim();
        let flat_field = library.flat_field(&self.parameters, width, height)?;

        self.data.intensities = &self.data.intensities / &*flat_field;
        self.state.mark(Correction::Camera);
        info!("applied camera correction");
        Ok(())
    }

    /// Divides every column by the monochromator response at its wavelength.
    pub fn apply_mono_correction(
        &mut self,
        library: &CorrectionLibrary,
        extrapolate: bool,
    ) -> Result<()> {
        self.ensure_not_applied(Correction::Monochromator)?;
        let curve = library.mono_curve(camera_model(&self.parameters)?)?;
        let factors = Array1::from(curve.factors_at(&self.data.wavelengths.to_vec(), extrapolate)?);

        self.data.intensities = &self.data.intensities / &factors;
        self.state.mark(Correction::Monochromator);
        info!(extrapolate, "applied monochromator correction");
        Ok(())
    }

    /// Normalizes to counts per millisecond of total exposure.
    pub fn apply_exposure_correction(&mut self) -> Result<()> {
        self.ensure_not_applied(Correction::Exposure)?;
        let acquisition = self.parameters.acquisition();
        let time = required(acquisition.exposure_time(), "Acquisition", "ExposureTime")?;
        let count = required(acquisition.nr_exposure(), "Acquisition", "NrExposure")?;

        let time_ms = exposure_time_ms(time)?;
        let count: f64 = count
            .trim()
            .parse()
            .map_err(|_| StreakError::InvalidParameter {
                field: "Acquisition.NrExposure",
                value: count.to_string(),
            })?;
        let factor = time_ms * count;
        if factor == 0.0 {
            return Err(StreakError::InvalidParameter {
                field: "Acquisition.ExposureTime",
                value: time.to_string(),
            });
        }

        self.data.intensities /= factor;
        self.state.mark(Correction::Exposure);
        info!(factor, "applied exposure correction");
        Ok(())
    }

    /// Re-labels the time axis so the sample with the largest total intensity
    /// sits at zero.
    ///
    /// Applied once as the last step of construction; calling it again has no
    /// further effect.
    pub(crate) fn shift_zero_to_max(&mut self) {
        if let Some(index) = self.data.index_of_max() {
            let peak = self.data.times[index];
            self.data.times -= peak;
            debug!(peak, index, "shifted time zero to maximum");
        }
    }

    /// Adds `shift` to every time label.
    pub fn shift_time_scale(&mut self, shift: f64) {
        self.data.times += shift;
    }
}
