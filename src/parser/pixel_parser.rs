use ndarray::{Array1, Array2, s};
use winnow::{
    Parser,
    binary::{le_f32, le_u16, le_u32},
    combinator::repeat,
    error::ContextError,
};

use crate::error::{Result, StreakError};
use crate::types::header::{PixelEncoding, RawHeader};
use crate::types::image_data::ImageData;

/// Parses `count` unsigned pixels of the given encoding in stored order.
fn parse_pixel_values(
    input: &mut &[u8],
    count: usize,
    encoding: PixelEncoding,
) -> std::result::Result<Vec<f64>, ContextError> {
    match encoding {
        PixelEncoding::Bit16 => repeat(count, le_u16.map(f64::from)).parse_next(input),
        _ => repeat(count, le_u32.map(f64::from)).parse_next(input),
    }
}

/// Parses `count` little-endian f32 axis values.
fn parse_axis(input: &mut &[u8], count: usize) -> std::result::Result<Array1<f64>, ContextError> {
    let values: Vec<f32> = repeat(count, le_f32).parse_next(input)?;
    Ok(values.into_iter().map(f64::from).collect())
}

/// Decodes the intensity grid and both axes from everything after the comment block.
///
/// Pixels are read from the start of `input` in time-major order; the
/// wavelength axis (`width` floats) and time axis (`height` floats) sit at
/// the very end of the buffer. A descending wavelength axis is reversed
/// together with the pixel columns so the result is always ascending.
pub fn parse_image_data(input: &[u8], header: &RawHeader) -> Result<ImageData> {
    let width = header.width as usize;
    let height = header.height as usize;
    match header.encoding {
        PixelEncoding::Bit16 | PixelEncoding::Bit32 => {}
        other => return Err(StreakError::UnsupportedEncoding(other)),
    }

    let pixel_bytes = width * height * header.encoding.bytes_per_pixel();
    let axis_bytes = (width + height) * 4;
    let expected = pixel_bytes + axis_bytes;
    let truncated = |_: ContextError| StreakError::TruncatedData {
        expected,
        actual: input.len(),
    };
    if input.len() < expected {
        return Err(StreakError::TruncatedData {
            expected,
            actual: input.len(),
        });
    }

    let mut pixels = &input[..pixel_bytes];
    let values =
        parse_pixel_values(&mut pixels, width * height, header.encoding).map_err(truncated)?;

    let mut axes = &input[input.len() - axis_bytes..];
    let wavelengths = parse_axis(&mut axes, width).map_err(truncated)?;
    let times = parse_axis(&mut axes, height).map_err(truncated)?;

    let intensities = Array2::from_shape_vec((height, width), values)?;

    let descending = width > 1 && wavelengths[0] > wavelengths[width - 1];
    let (intensities, wavelengths) = if descending {
        (
            intensities.slice(s![.., ..;-1]).to_owned(),
            wavelengths.slice(s![..;-1]).to_owned(),
        )
    } else {
        (intensities, wavelengths)
    };

    Ok(ImageData::builder()
        .intensities(intensities)
        .wavelengths(wavelengths)
        .times(times)
        .build())
}
