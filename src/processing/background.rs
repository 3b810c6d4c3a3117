use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, StreakError};
use crate::streak_image::StreakImage;
use crate::types::parameters::required;

/// Acquisition settings a background has to share with the image it corrects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BackgroundKey {
    pub time_range: String,
    pub gain: String,
    pub exposure_count: String,
    /// Whitespace removed, e.g. `10ms`.
    pub exposure_time: String,
}

impl BackgroundKey {
    pub fn for_image(image: &StreakImage) -> Result<Self> {
        let parameters = image.parameters();
        let streak = parameters.streak_camera();
        let acquisition = parameters.acquisition();
        Ok(Self {
            time_range: required(streak.time_range(), "Streakcamera", "TimeRange")?.to_string(),
            gain: required(streak.mcp_gain(), "Streakcamera", "MCPGain")?.to_string(),
            exposure_count: required(acquisition.nr_exposure(), "Acquisition", "NrExposure")?
                .to_string(),
            exposure_time: required(acquisition.exposure_time(), "Acquisition", "ExposureTime")?
                .split_whitespace()
                .collect(),
        })
    }
}

impl fmt::Display for BackgroundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bg_ST{}_g{}_{}x{}",
            self.time_range, self.gain, self.exposure_count, self.exposure_time
        )
    }
}

/// Pre-loaded backgrounds, looked up by the settings of the image to correct.
#[derive(Debug, Default)]
pub struct BackgroundRegistry {
    backgrounds: HashMap<BackgroundKey, StreakImage>,
}

impl BackgroundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a background under its own key, returning any it replaces.
    pub fn insert(&mut self, background: StreakImage) -> Result<Option<StreakImage>> {
        let key = BackgroundKey::for_image(&background)?;
        Ok(self.backgrounds.insert(key, background))
    }

    /// Finds the background matching `image`.
    ///
    /// Key construction and lookup live here together so callers never build
    /// keys by hand.
    pub fn resolve(&self, image: &StreakImage) -> Result<&StreakImage> {
        let key = BackgroundKey::for_image(image)?;
        self.backgrounds
            .get(&key)
            .ok_or_else(|| StreakError::MissingCorrectionData(format!("no background {key}")))
    }

    pub fn len(&self) -> usize {
        self.backgrounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backgrounds.is_empty()
    }
}
