//! Intensity matrix with its physical axes

use bon::Builder;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Intensities indexed by `[time, wavelength]`.
///
/// `wavelengths` labels the columns and `times` labels the rows.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct ImageData {
    pub intensities: Array2<f64>,
    pub wavelengths: Array1<f64>,
    pub times: Array1<f64>,
}

impl ImageData {
    /// Total intensity of every time sample, summed across wavelength.
    pub fn time_profile(&self) -> Array1<f64> {
        self.intensities.sum_axis(Axis(1))
    }

    /// Row index of the time sample with the largest total intensity.
    ///
    /// Ties resolve to the earliest row; NaN sums never win.
    pub fn index_of_max(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &total) in self.time_profile().iter().enumerate() {
            match best {
                Some((_, current)) if total <= current || total.is_nan() => {}
                None if total.is_nan() => {}
                _ => best = Some((idx, total)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn dim(&self) -> (usize, usize) {
        self.intensities.dim()
    }
}
