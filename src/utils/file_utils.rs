use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{Result, StreakError};

/// Map an image file into memory; decoding then borrows straight from the map
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: image files are opened read-only and not written while mapped
    unsafe { Mmap::map(&file) }
}

/// Reads a tab-delimited numeric table without a header row.
///
/// Rows may differ in length and cells are trimmed. A missing file is
/// reported as [`StreakError::MissingCorrectionData`].
pub fn read_numeric_table(path: &Path) -> Result<Vec<Vec<f64>>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            StreakError::MissingCorrectionData(format!("{} does not exist", path.display()))
        }
        _ => e.into(),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    reader
        .deserialize::<Vec<f64>>()
        .enumerate()
        .map(|(row, record)| {
            record.map_err(|e| StreakError::InvalidCorrectionData {
                path: path.to_path_buf(),
                reason: format!("row {}: {e}", row + 1),
            })
        })
        .collect()
}
