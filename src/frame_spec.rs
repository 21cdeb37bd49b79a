use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::errors::SpecParseError;

const fn nz(value: u32) -> NonZeroU32 {
    match NonZeroU32::new(value) {
        Some(value) => value,
        None => panic!("preset dimension must be non-zero"),
    }
}

/// Target shape of the capture rectangle.
///
/// `AspectRatio` keeps proportions only; `PixelSize` is an exact size in
/// device pixels. Text form is `W:H` or `WxH` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureFrameSpec {
    AspectRatio { width: NonZeroU32, height: NonZeroU32 },
    PixelSize { width: NonZeroU32, height: NonZeroU32 },
}

impl CaptureFrameSpec {
    pub const PRESETS: [CaptureFrameSpec; 6] = [
        Self::ratio_const(1, 1),
        Self::ratio_const(16, 9),
        Self::ratio_const(4, 3),
        Self::ratio_const(3, 2),
        Self::ratio_const(9, 16),
        Self::ratio_const(21, 9),
    ];

    const fn ratio_const(width: u32, height: u32) -> Self {
        Self::AspectRatio {
            width: nz(width),
            height: nz(height),
        }
    }

    pub fn ratio(width: u32, height: u32) -> Option<Self> {
        Some(Self::AspectRatio {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    pub fn pixel_size(width: u32, height: u32) -> Option<Self> {
        Some(Self::PixelSize {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::AspectRatio { width, .. } | Self::PixelSize { width, .. } => width.get(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::AspectRatio { height, .. } | Self::PixelSize { height, .. } => height.get(),
        }
    }
}

impl Default for CaptureFrameSpec {
    fn default() -> Self {
        Self::PRESETS[0]
    }
}

impl fmt::Display for CaptureFrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AspectRatio { width, height } => write!(f, "{width}:{height}"),
            Self::PixelSize { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

impl FromStr for CaptureFrameSpec {
    type Err = SpecParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SpecParseError::Empty);
        }

        if let Some((width, height)) = trimmed.split_once(':') {
            let (width, height) = parse_pair(input, width, height)?;
            return Self::ratio(width, height).ok_or_else(|| non_positive(input));
        }

        let separator = trimmed
            .find(|c: char| c.eq_ignore_ascii_case(&'x'))
            .ok_or_else(|| malformed(input))?;
        let (width, height) = parse_pair(input, &trimmed[..separator], &trimmed[separator + 1..])?;
        Self::pixel_size(width, height).ok_or_else(|| non_positive(input))
    }
}

/// Both halves must be whole numbers; the sign check happens after parsing so
/// `-4:3` reports as non-positive rather than malformed.
fn parse_pair(input: &str, width: &str, height: &str) -> Result<(u32, u32), SpecParseError> {
    let width = parse_component(input, width)?;
    let height = parse_component(input, height)?;
    if width <= 0 || height <= 0 {
        return Err(non_positive(input));
    }
    Ok((width as u32, height as u32))
}

fn parse_component(input: &str, part: &str) -> Result<i64, SpecParseError> {
    let part = part.trim();
    if part.is_empty() {
        return Err(malformed(input));
    }
    let value: i64 = part.parse().map_err(|_| malformed(input))?;
    if value > u32::MAX as i64 {
        return Err(malformed(input));
    }
    Ok(value)
}

fn malformed(input: &str) -> SpecParseError {
    SpecParseError::Malformed {
        input: input.to_string(),
    }
}

fn non_positive(input: &str) -> SpecParseError {
    SpecParseError::NonPositive {
        input: input.to_string(),
    }
}
