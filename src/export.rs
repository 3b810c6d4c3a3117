//! "Wavelength explicit" text export, readable by Glotaran.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::error::Result;
use crate::streak_image::StreakImage;

/// Writes two blank lines, the format tag, the interval count, a row of
/// wavelength labels and one row per time sample.
pub fn write_wavelength_explicit<W: Write>(image: &StreakImage, mut writer: W) -> Result<()> {
    write!(
        writer,
        "\n\nWavelength explicit\nIntervalnr {}\n",
        image.width()
    )?;
    writeln!(writer, " {}", image.wavelengths().iter().join(" "))?;
    for (time, row) in image.times().iter().zip(image.intensities().rows()) {
        writeln!(writer, "{} {}", time, row.iter().join(" "))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_wavelength_explicit(image: &StreakImage, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    write_wavelength_explicit(image, BufWriter::new(file))
}
