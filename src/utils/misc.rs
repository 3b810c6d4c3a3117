use crate::error::{Result, StreakError};

/// Linearly interpolates `(xs, ys)` at `x`.
///
/// `xs` must be ascending with at least two points; values outside the
/// domain are extrapolated from the first or last segment.
pub fn interpolate_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    let upper = xs.partition_point(|&v| v < x).clamp(1, last);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Exposure time such as `"10 ms"` or `"500 us"` in milliseconds.
pub fn exposure_time_ms(value: &str) -> Result<f64> {
    let invalid = || StreakError::InvalidParameter {
        field: "Acquisition.ExposureTime",
        value: value.to_string(),
    };
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| c.is_alphabetic())
        .ok_or_else(invalid)?;
    let (number, unit) = trimmed.split_at(split);
    let number: f64 = number.trim().parse().map_err(|_| invalid())?;
    let scale = match unit.trim() {
        "s" => 1000.0,
        "ms" => 1.0,
        "us" | "u" | "µs" => 0.001,
        _ => return Err(invalid()),
    };
    Ok(number * scale)
}
