use std::path::{Path, PathBuf};

use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Correction, Result, StreakError};
use crate::parser::{parse_comment, parse_header, parse_image_data};
use crate::processing::{BackgroundRegistry, CorrectionLibrary};
use crate::types::header::{PixelEncoding, RawHeader};
use crate::types::image_data::ImageData;
use crate::types::parameters::{ParameterTree, required};
use crate::utils::file_utils::read_binary_file_mmap;

/// Which once-only corrections have been applied to an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionState {
    pub background_subtracted: bool,
    pub gain_corrected: bool,
    pub camera_corrected: bool,
    pub mono_corrected: bool,
    pub exposure_corrected: bool,
}

impl CorrectionState {
    pub fn is_applied(&self, correction: Correction) -> bool {
        match correction {
            Correction::Background => self.background_subtracted,
            Correction::Gain => self.gain_corrected,
            Correction::Camera => self.camera_corrected,
            Correction::Monochromator => self.mono_corrected,
            Correction::Exposure => self.exposure_corrected,
        }
    }

    pub(crate) fn mark(&mut self, correction: Correction) {
        let flag = match correction {
            Correction::Background => &mut self.background_subtracted,
            Correction::Gain => &mut self.gain_corrected,
            Correction::Camera => &mut self.camera_corrected,
            Correction::Monochromator => &mut self.mono_corrected,
            Correction::Exposure => &mut self.exposure_corrected,
        };
        *flag = true;
    }
}

/// Corrections applied while an image is constructed.
///
/// An explicit `background` wins over a lookup in `backgrounds`.
#[derive(Debug, Default, Clone, Copy, Builder)]
pub struct LoadOptions<'a> {
    pub background: Option<&'a StreakImage>,
    pub backgrounds: Option<&'a BackgroundRegistry>,
    pub corrections: Option<&'a CorrectionLibrary>,
}

/// A decoded streak camera image
///
/// Only built by decoding, so the header always describes the matrix it holds.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(builder_type(vis = "pub(crate)"), start_fn(vis = "pub(crate)"))]
pub struct StreakImage {
    pub(crate) header: RawHeader,
    pub(crate) data: ImageData,
    pub(crate) comment: String,
    pub(crate) parameters: ParameterTree,
    #[builder(default)]
    pub(crate) state: CorrectionState,
    pub(crate) source: Option<PathBuf>,
}

impl StreakImage {
    /// Open and decode an image file without optional corrections.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &LoadOptions::default())
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, options: &LoadOptions<'_>) -> Result<Self> {
        let path = path.as_ref();
        let mmap_data = read_binary_file_mmap(path)?;

        let mut image = Self::decode(&mmap_data)?;
        image.source = Some(path.to_path_buf());
        image.finish(options)?;
        Ok(image)
    }

    /// Load independent files in parallel, one result per path in input order.
    pub fn open_many<P>(paths: &[P], options: &LoadOptions<'_>) -> Vec<Result<Self>>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| Self::open_with(path, options))
            .collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, &LoadOptions::default())
    }

    pub fn from_bytes_with(bytes: &[u8], options: &LoadOptions<'_>) -> Result<Self> {
        let mut image = Self::decode(bytes)?;
        image.finish(options)?;
        Ok(image)
    }

    /// Decodes header, pixels, axes and comment without touching the data.
    fn decode(bytes: &[u8]) -> Result<Self> {
        let header = parse_header(bytes)?;

        let comment_range = header.comment_range();
        if bytes.len() < comment_range.end {
            return Err(StreakError::TruncatedData {
                expected: comment_range.end,
                actual: bytes.len(),
            });
        }
        let data = parse_image_data(&bytes[header.data_start()..], &header)?;
        let comment = String::from_utf8_lossy(&bytes[comment_range]).into_owned();
        let parameters = parse_comment(&comment)?;

        let state = CorrectionState {
            background_subtracted: parameters.acquisition().backsub_corr() == Some("1"),
            ..CorrectionState::default()
        };
        debug!(
            categories = parameters.len(),
            background_subtracted = state.background_subtracted,
            "decoded image"
        );

        Ok(Self::builder()
            .header(header)
            .data(data)
            .comment(comment)
            .parameters(parameters)
            .state(state)
            .build())
    }

    /// Background subtraction, then camera correction, then peak alignment.
    fn finish(&mut self, options: &LoadOptions<'_>) -> Result<()> {
        let background = match (options.background, options.backgrounds) {
            (Some(background), _) => Some(background),
            (None, Some(registry)) => Some(registry.resolve(self)?),
            (None, None) => None,
        };
        if let Some(background) = background {
            self.subtract_background(background)?;
        }
        if let Some(library) = options.corrections {
            self.apply_camera_correction(library)?;
        }
        self.shift_zero_to_max();
        Ok(())
    }

    pub fn header(&self) -> &RawHeader {
        &self.header
    }

    pub fn width(&self) -> u16 {
        self.header.width
    }

    pub fn height(&self) -> u16 {
        self.header.height
    }

    pub fn encoding(&self) -> PixelEncoding {
        self.header.encoding
    }

    pub fn x_offset(&self) -> u8 {
        self.header.x_offset
    }

    pub fn y_offset(&self) -> u8 {
        self.header.y_offset
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    /// Intensities indexed by `[time, wavelength]`.
    pub fn intensities(&self) -> &Array2<f64> {
        &self.data.intensities
    }

    pub fn wavelengths(&self) -> &Array1<f64> {
        &self.data.wavelengths
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.data.times
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn parameters(&self) -> &ParameterTree {
        &self.parameters
    }

    pub fn state(&self) -> CorrectionState {
        self.state
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// First 12 characters of the source file name.
    pub fn id(&self) -> Option<String> {
        let name = self.source.as_ref()?.file_name()?.to_str()?;
        Some(name.chars().take(12).collect())
    }

    /// Acquisition timestamp from `Application.Date` and `Application.Time`.
    pub fn acquisition_datetime(&self) -> Result<NaiveDateTime> {
        let application = self.parameters.application();
        let date = required(application.date(), "Application", "Date")?;
        let time = required(application.time(), "Application", "Time")?;

        let date = NaiveDate::parse_from_str(date, "%m-%d-%Y").map_err(|_| {
            StreakError::InvalidParameter {
                field: "Application.Date",
                value: date.to_string(),
            }
        })?;
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|_| {
            StreakError::InvalidParameter {
                field: "Application.Time",
                value: time.to_string(),
            }
        })?;
        Ok(NaiveDateTime::new(date, time))
    }

    /// Get a summary of the image and its most relevant settings
    pub fn summary(&self) -> String {
        let spectrograph = self.parameters.spectrograph();
        let streak = self.parameters.streak_camera();
        let acquisition = self.parameters.acquisition();
        let show = |value: Option<&str>| value.unwrap_or("-").to_string();

        let applied = [
            Correction::Background,
            Correction::Gain,
            Correction::Camera,
            Correction::Monochromator,
            Correction::Exposure,
        ]
        .into_iter()
        .filter(|c| self.state.is_applied(*c))
        .join(", ");

        let mut result = String::new();
        result.push_str("Image:\n");
        result.push_str(&format!("  Size: {}x{}\n", self.width(), self.height()));
        result.push_str(&format!(
            "  Offset: {}x{}\n",
            self.x_offset(),
            self.y_offset()
        ));
        result.push_str(&format!("  Encoding: {:?}\n", self.encoding()));
        result.push_str(&format!(
            "  Corrections: {}\n",
            if applied.is_empty() { "none" } else { applied.as_str() }
        ));

        result.push_str("\nSpectrograph:\n");
        result.push_str(&format!("  Grating: {}\n", show(spectrograph.grating())));
        result.push_str(&format!("  Wavelength: {}\n", show(spectrograph.wavelength())));
        result.push_str(&format!("  Slit width: {}\n", show(spectrograph.slit_width())));

        result.push_str("\nStreak camera:\n");
        result.push_str(&format!("  Gain: {}\n", show(streak.mcp_gain())));
        result.push_str(&format!("  Time range: {}\n", show(streak.time_range())));
        result.push_str(&format!("  Mode: {}\n", show(streak.mode())));

        result.push_str("\nAcquisition:\n");
        result.push_str(&format!("  Exposures: {}\n", show(acquisition.nr_exposure())));
        result.push_str(&format!(
            "  Exposure time: {}\n",
            show(acquisition.exposure_time())
        ));

        result
    }
}
