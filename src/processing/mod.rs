//! Corrections applied to decoded images and the data they rely on

pub mod background;
pub mod compatibility;
pub mod corrections;
pub mod library;

// Re-export for easier access
pub use background::{BackgroundKey, BackgroundRegistry};
pub use compatibility::check_compatibility;
pub use corrections::OffsetWindow;
pub use library::{CorrectionConfig, CorrectionLibrary, MonoCurve, PrefixRange, PrefixSchedule};
