//! Capture rectangle placement around the cursor.
//!
//! Pure and deterministic: the same spec, cursor and monitor bounds always
//! produce the same rectangle, and that rectangle never leaves the monitor.

use crate::{frame_spec::CaptureFrameSpec, rect::PixelRect};

/// Smallest side of a ratio-derived rectangle.
pub const MIN_DIMENSION: i32 = 20;
/// Share of the monitor's shorter side used for ratio-derived rectangles.
const DEFAULT_SIZE_FACTOR: f64 = 0.4;

/// Computes the capture rectangle for `spec` centred on the cursor and
/// clamped into `bounds`.
pub fn compute(
    spec: &CaptureFrameSpec,
    cursor_x: i32,
    cursor_y: i32,
    bounds: &PixelRect,
) -> PixelRect {
    let monitor_width = bounds.width();
    let monitor_height = bounds.height();

    let (width, height) = match *spec {
        CaptureFrameSpec::AspectRatio { width, height } => {
            let (raw_width, raw_height) =
                ratio_size(width.get(), height.get(), monitor_width, monitor_height);
            (
                clamp(raw_width, MIN_DIMENSION, monitor_width),
                clamp(raw_height, MIN_DIMENSION, monitor_height),
            )
        }
        CaptureFrameSpec::PixelSize { width, height } => (
            clamp(saturating_i32(width.get()), 1, monitor_width),
            clamp(saturating_i32(height.get()), 1, monitor_height),
        ),
    };

    let left = cursor_x.saturating_sub(width / 2);
    let top = cursor_y.saturating_sub(height / 2);
    let left = clamp(left, bounds.left(), bounds.right() - width);
    let top = clamp(top, bounds.top(), bounds.bottom() - height);

    PixelRect::from_parts(left, top, width, height)
}

/// Floors a pointer position reported in fractional pixels.
pub fn cursor_point(x: f64, y: f64) -> (i32, i32) {
    (x.floor() as i32, y.floor() as i32)
}

/// Width-first sizing, switching to height-first when the derived height
/// would overflow the monitor.
fn ratio_size(ratio_w: u32, ratio_h: u32, monitor_width: i32, monitor_height: i32) -> (i32, i32) {
    let shorter = monitor_width.min(monitor_height);
    let max_dimension = MIN_DIMENSION.max((shorter as f64 * DEFAULT_SIZE_FACTOR) as i32);

    let ratio_w = ratio_w as f64;
    let ratio_h = ratio_h as f64;

    let width = max_dimension;
    let height = round(width as f64 * ratio_h / ratio_w);
    if height <= monitor_height {
        return (width, height);
    }

    let height = monitor_height;
    let width = round(height as f64 * ratio_w / ratio_h);
    (width, height)
}

fn round(value: f64) -> i32 {
    let rounded = value.round_ties_even();
    if rounded >= i32::MAX as f64 {
        i32::MAX
    } else {
        rounded as i32
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Upper bound wins when the range is inverted, so a monitor narrower than
/// the minimum still yields an on-monitor rectangle.
fn clamp(value: i32, min: i32, max: i32) -> i32 {
    value.max(min).min(max)
}
