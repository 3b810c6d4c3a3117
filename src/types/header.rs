use std::ops::Range;

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Size of the fixed header; the comment block always starts here.
pub const HEADER_LENGTH: usize = 64;

/// Per-pixel storage used by the acquisition software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelEncoding {
    Bit8 = 0,
    /// Reserved, never written by HPD-TA.
    Compressed = 1,
    Bit16 = 2,
    Bit32 = 3,
}

impl PixelEncoding {
    /// Byte width of one pixel in the intensity block.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelEncoding::Bit16 => 2,
            _ => 4,
        }
    }
}

impl TryFrom<u8> for PixelEncoding {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelEncoding::Bit8),
            1 => Ok(PixelEncoding::Compressed),
            2 => Ok(PixelEncoding::Bit16),
            3 => Ok(PixelEncoding::Bit32),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct RawHeader {
    pub file_signature: String,
    pub comment_length: u16,
    pub width: u16,
    pub height: u16,
    pub x_offset: u8,
    pub y_offset: u8,
    pub encoding: PixelEncoding,
}

impl RawHeader {
    /// Byte range of the comment block within the file.
    pub fn comment_range(&self) -> Range<usize> {
        HEADER_LENGTH..HEADER_LENGTH + self.comment_length as usize
    }

    /// Offset of the first pixel, directly after the comment block.
    pub fn data_start(&self) -> usize {
        self.comment_range().end
    }
}
