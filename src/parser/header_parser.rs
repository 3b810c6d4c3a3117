use tracing::{debug, warn};
use winnow::{
    Parser,
    binary::{le_u8, le_u16},
    error::ContextError,
    token::take,
};

use crate::error::{Result, StreakError};
use crate::types::header::{HEADER_LENGTH, PixelEncoding, RawHeader};

/// Signature written by HPD-TA at the start of every image.
const IMAGE_SIGNATURE: &str = "IM";

/// Parses the fixed 64-byte header.
///
/// The header layout is as follows:
/// - 2 bytes: ASCII signature
/// - 3 little‑endian u16 values: comment_length, width, height
/// - 1 byte x_offset, 1 byte skipped, 1 byte y_offset, 1 byte skipped
/// - 1 byte: pixel encoding
/// - remaining bytes up to 64 are reserved
pub fn parse_header(input: &[u8]) -> Result<RawHeader> {
    if input.len() < HEADER_LENGTH {
        return Err(StreakError::MalformedHeader(format!(
            "expected {HEADER_LENGTH} header bytes, found {}",
            input.len()
        )));
    }
    let malformed = |e: ContextError| StreakError::MalformedHeader(e.to_string());
    let mut input = &input[..HEADER_LENGTH];

    let file_signature = take(2usize).parse_next(&mut input).map_err(malformed)?;
    let comment_length = le_u16.parse_next(&mut input).map_err(malformed)?;
    let width = le_u16.parse_next(&mut input).map_err(malformed)?;
    let height = le_u16.parse_next(&mut input).map_err(malformed)?;
    let x_offset = le_u8.parse_next(&mut input).map_err(malformed)?;
    let _ = take(1usize).parse_next(&mut input).map_err(malformed)?;
    let y_offset = le_u8.parse_next(&mut input).map_err(malformed)?;
    let _ = take(1usize).parse_next(&mut input).map_err(malformed)?;
    let encoding_byte: u8 = le_u8.parse_next(&mut input).map_err(malformed)?;

    let encoding = PixelEncoding::try_from(encoding_byte).map_err(|byte| {
        StreakError::MalformedHeader(format!("unknown pixel encoding {byte}"))
    })?;

    let file_signature = String::from_utf8_lossy(file_signature).into_owned();
    if file_signature != IMAGE_SIGNATURE {
        warn!(signature = %file_signature, "unexpected image signature");
    }

    let header = RawHeader::builder()
        .file_signature(file_signature)
        .comment_length(comment_length)
        .width(width)
        .height(height)
        .x_offset(x_offset)
        .y_offset(y_offset)
        .encoding(encoding)
        .build();
    debug!(
        width,
        height,
        comment_length,
        encoding = ?encoding,
        "parsed image header"
    );
    Ok(header)
}
