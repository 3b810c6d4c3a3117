#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Encodes images in the on-disk HPD-TA layout.
#[derive(Debug, Clone)]
pub struct SyntheticImage {
    pub width: u16,
    pub height: u16,
    pub encoding: u8,
    pub x_offset: u8,
    pub y_offset: u8,
    pub pixels: Vec<u32>,
    pub wavelengths: Vec<f32>,
    pub times: Vec<f32>,
    pub comment: String,
}

impl SyntheticImage {
    /// 3 × 4 image, 16-bit, descending wavelengths, peak in the third row.
    pub fn sample() -> Self {
        Self {
            width: 3,
            height: 4,
            encoding: 2,
            x_offset: 0,
            y_offset: 0,
            pixels: vec![1, 2, 3, 4, 5, 6, 10, 20, 30, 7, 8, 9],
            wavelengths: vec![600.0, 550.0, 500.0],
            times: vec![0.0, 10.0, 20.0, 30.0],
            comment: comment_with_gain("42"),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[0..2].copy_from_slice(b"IM");
        bytes[2..4].copy_from_slice(&(self.comment.len() as u16).to_le_bytes());
        bytes[4..6].copy_from_slice(&self.width.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.height.to_le_bytes());
        bytes[8] = self.x_offset;
        bytes[10] = self.y_offset;
        bytes[12] = self.encoding;
        bytes.extend_from_slice(self.comment.as_bytes());
        for &pixel in &self.pixels {
            match self.encoding {
                2 => bytes.extend_from_slice(&(pixel as u16).to_le_bytes()),
                _ => bytes.extend_from_slice(&pixel.to_le_bytes()),
            }
        }
        for value in self.wavelengths.iter().chain(&self.times) {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}

pub fn comment_with_gain(gain: &str) -> String {
    comment(gain, "0")
}

pub fn comment(gain: &str, backsub: &str) -> String {
    [
        "[Application],Date=\"03-15-2020\",Time=\"10:30:00\",Software=\"HPD-TA\",SoftwareVersion=\"8.3.0\"".to_string(),
        "[Camera],CameraName=\"C4742-95\",Type=1".to_string(),
        format!("[Acquisition],NrExposure=10,ExposureTime=\"10 ms\",BacksubCorr={backsub}"),
        format!("[Streak camera],UseDevice=1,Time Range=\"2 ns\",Mode=\"Operate\",MCP Gain=\"{gain}\""),
        "[Spectrograph],Wavelength=\"500\",Grating=\"1\",Slit Width=\"50\"".to_string(),
        "[Comment],UserComment=\"synthetic, sample\"".to_string(),
    ]
    .join("\r\n")
}
