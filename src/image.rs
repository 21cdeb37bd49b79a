//! Normalisation of raw frames into [`CapturedImage`], plus encoding for the
//! output sinks.

use std::fmt;
use std::io::Cursor;

use anyhow::Result;
use ::image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb, RgbaImage};

use crate::{
    capture::{AlphaMode, Coverage, PixelLayout, RawFrame},
    errors::AcquireError,
    rect::PixelRect,
};

/// Pixel format of every [`CapturedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Top-down rows, bytes B, G, R, A, colour premultiplied by alpha.
    Bgra8Premultiplied,
}

/// Final capture result. Never mutated after construction.
pub struct CapturedImage {
    width: u32,
    height: u32,
    bytes: Box<[u8]>,
}

impl CapturedImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row; rows are tightly packed.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn format(&self) -> PixelFormat {
        PixelFormat::Bgra8Premultiplied
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// BGRA bytes of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y as usize * self.stride() + x as usize * 4;
        let px = &self.bytes[start..start + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha RGBA copy.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut rgba = Vec::with_capacity(self.bytes.len());
        for px in self.bytes.chunks_exact(4) {
            let a = px[3];
            rgba.extend_from_slice(&[
                unpremultiply(px[2], a),
                unpremultiply(px[1], a),
                unpremultiply(px[0], a),
                a,
            ]);
        }
        // Buffer length is width * height * 4 by construction.
        ImageBuffer::from_raw(self.width, self.height, rgba)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// RGB bitmap; the Windows clipboard does not understand RGBA bitmaps.
    pub fn to_bmp(&self) -> Result<Vec<u8>> {
        let rgb: Option<ImageBuffer<Rgb<u8>, Vec<u8>>> =
            ImageBuffer::from_vec(self.width, self.height, self.rgb());
        let mut bmp: Vec<u8> = Vec::new();
        if let Some(rgb) = rgb {
            let img = DynamicImage::from(rgb);
            img.write_to(&mut Cursor::new(&mut bmp), ImageOutputFormat::Bmp)?;
        }
        Ok(bmp)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png: Vec<u8> = Vec::new();
        DynamicImage::from(self.to_rgba_image())
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
        Ok(png)
    }

    fn rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.bytes.chunks_exact(4) {
            let a = px[3];
            rgb.extend_from_slice(&[
                unpremultiply(px[2], a),
                unpremultiply(px[1], a),
                unpremultiply(px[0], a),
            ]);
        }
        rgb
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format())
            .finish_non_exhaustive()
    }
}

/// Crops `frame` to `rect` and converts it to premultiplied BGRA.
///
/// Full-monitor frames are cropped at `rect - monitor_bounds`, with the window
/// clamped to the frame so a stale rectangle never reads outside the buffer.
/// Region frames already start at `rect`; they must cover it fully and are
/// only trimmed to its size.
pub fn normalize(
    frame: RawFrame,
    rect: &PixelRect,
    monitor_bounds: &PixelRect,
) -> Result<CapturedImage, AcquireError> {
    validate(&frame)?;
    if frame.coverage == Coverage::Region
        && (i64::from(frame.width) < i64::from(rect.width())
            || i64::from(frame.height) < i64::from(rect.height()))
    {
        return Err(invalid(format!(
            "region frame {}x{} smaller than requested {}x{}",
            frame.width,
            frame.height,
            rect.width(),
            rect.height()
        )));
    }

    let frame_width = frame.width as i64;
    let frame_height = frame.height as i64;
    let (x, y) = match frame.coverage {
        Coverage::FullMonitor => (
            clamp(
                rect.left() as i64 - monitor_bounds.left() as i64,
                0,
                frame_width - 1,
            ),
            clamp(
                rect.top() as i64 - monitor_bounds.top() as i64,
                0,
                frame_height - 1,
            ),
        ),
        Coverage::Region => (0, 0),
    };
    let width = clamp(rect.width() as i64, 1, frame_width - x) as usize;
    let height = clamp(rect.height() as i64, 1, frame_height - y) as usize;
    let (x, y) = (x as usize, y as usize);

    let mut bytes = Vec::with_capacity(width * height * 4);
    for row in y..y + height {
        let start = row * frame.stride + x * 4;
        for px in frame.data[start..start + width * 4].chunks_exact(4) {
            bytes.extend_from_slice(&to_bgra_premultiplied(
                px,
                frame.layout,
                frame.alpha,
            ));
        }
    }

    Ok(CapturedImage {
        width: width as u32,
        height: height as u32,
        bytes: bytes.into_boxed_slice(),
    })
}

fn validate(frame: &RawFrame) -> Result<(), AcquireError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(invalid(format!(
            "empty frame {}x{}",
            frame.width, frame.height
        )));
    }
    let row_bytes = frame.width as usize * 4;
    if frame.stride < row_bytes {
        return Err(invalid(format!(
            "stride {} shorter than row of {} bytes",
            frame.stride, row_bytes
        )));
    }
    let needed = frame.stride * (frame.height as usize - 1) + row_bytes;
    if frame.data.len() < needed {
        return Err(invalid(format!(
            "{} bytes for {}x{} with stride {}, need {}",
            frame.data.len(),
            frame.width,
            frame.height,
            frame.stride,
            needed
        )));
    }
    Ok(())
}

fn invalid(reason: String) -> AcquireError {
    AcquireError::InvalidFrame { reason }
}

fn to_bgra_premultiplied(px: &[u8], layout: PixelLayout, alpha: AlphaMode) -> [u8; 4] {
    let (b, g, r, a) = match layout {
        PixelLayout::Bgra8 => (px[0], px[1], px[2], px[3]),
        PixelLayout::Rgba8 => (px[2], px[1], px[0], px[3]),
    };
    match alpha {
        AlphaMode::Premultiplied => [b, g, r, a],
        AlphaMode::Opaque => [b, g, r, 255],
        AlphaMode::Straight => [
            premultiply(b, a),
            premultiply(g, a),
            premultiply(r, a),
            a,
        ],
    }
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}

fn unpremultiply(channel: u8, alpha: u8) -> u8 {
    if alpha == 0 {
        return 0;
    }
    ((channel as u16 * 255 + alpha as u16 / 2) / alpha as u16).min(255) as u8
}

/// Upper bound wins for an inverted range.
fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: i32, top: i32, width: i32, height: i32) -> PixelRect {
        PixelRect::new(left, top, width, height).unwrap()
    }

    /// BGRA frame where each pixel encodes its own coordinates.
    fn gradient(width: u32, height: u32, stride: usize, coverage: Coverage) -> RawFrame {
        let mut data = vec![0xEE; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let i = y * stride + x * 4;
                data[i..i + 4].copy_from_slice(&[x as u8, y as u8, 7, 255]);
            }
        }
        RawFrame {
            width,
            height,
            stride,
            layout: PixelLayout::Bgra8,
            alpha: AlphaMode::Premultiplied,
            coverage,
            data,
        }
    }

    #[test]
    fn full_monitor_frame_is_cropped_at_offset() {
        let bounds = rect(-100, 50, 40, 30);
        let frame = gradient(40, 30, 40 * 4 + 16, Coverage::FullMonitor);
        let image = normalize(frame, &rect(-90, 55, 6, 4), &bounds).unwrap();
        assert_eq!((image.width(), image.height()), (6, 4));
        assert_eq!(image.stride(), 24);
        assert_eq!(image.pixel(0, 0), Some([10, 5, 7, 255]));
        assert_eq!(image.pixel(5, 3), Some([15, 8, 7, 255]));
        assert_eq!(image.pixel(6, 0), None);
    }

    #[test]
    fn crop_window_is_clamped_inside_frame() {
        let bounds = rect(0, 0, 20, 10);
        let frame = gradient(20, 10, 80, Coverage::FullMonitor);
        let image = normalize(frame, &rect(15, 8, 10, 10), &bounds).unwrap();
        assert_eq!((image.width(), image.height()), (5, 2));
        assert_eq!(image.pixel(0, 0), Some([15, 8, 7, 255]));

        let frame = gradient(20, 10, 80, Coverage::FullMonitor);
        let image = normalize(frame, &rect(-5, -5, 3, 3), &bounds).unwrap();
        assert_eq!(image.pixel(0, 0), Some([0, 0, 7, 255]));
    }

    #[test]
    fn region_frame_has_no_offset() {
        let bounds = rect(0, 0, 1920, 1080);
        let frame = gradient(8, 6, 32, Coverage::Region);
        let image = normalize(frame, &rect(500, 400, 8, 6), &bounds).unwrap();
        assert_eq!((image.width(), image.height()), (8, 6));
        assert_eq!(image.pixel(0, 0), Some([0, 0, 7, 255]));
        assert_eq!(image.pixel(7, 5), Some([7, 5, 7, 255]));
    }

    #[test]
    fn short_region_frame_is_rejected() {
        let bounds = rect(0, 0, 1920, 1080);
        let frame = gradient(7, 5, 28, Coverage::Region);
        let result = normalize(frame, &rect(500, 400, 8, 6), &bounds);
        assert!(matches!(result, Err(AcquireError::InvalidFrame { .. })));

        let frame = gradient(8, 5, 32, Coverage::Region);
        let result = normalize(frame, &rect(500, 400, 8, 6), &bounds);
        assert!(matches!(result, Err(AcquireError::InvalidFrame { .. })));
    }

    #[test]
    fn oversized_region_frame_is_trimmed() {
        let bounds = rect(0, 0, 1920, 1080);
        let frame = gradient(10, 9, 40, Coverage::Region);
        let image = normalize(frame, &rect(500, 400, 8, 6), &bounds).unwrap();
        assert_eq!((image.width(), image.height()), (8, 6));
        assert_eq!(image.pixel(7, 5), Some([7, 5, 7, 255]));
    }

    #[test]
    fn rgba_straight_alpha_is_swizzled_and_premultiplied() {
        let frame = RawFrame {
            width: 2,
            height: 1,
            stride: 8,
            layout: PixelLayout::Rgba8,
            alpha: AlphaMode::Straight,
            coverage: Coverage::Region,
            data: vec![200, 100, 50, 255, 200, 100, 50, 128],
        };
        let image = normalize(frame, &rect(0, 0, 2, 1), &rect(0, 0, 2, 1)).unwrap();
        assert_eq!(image.format(), PixelFormat::Bgra8Premultiplied);
        assert_eq!(image.pixel(0, 0), Some([50, 100, 200, 255]));
        assert_eq!(image.pixel(1, 0), Some([25, 50, 100, 128]));
    }

    #[test]
    fn opaque_alpha_is_forced_to_255() {
        let mut frame = gradient(2, 2, 8, Coverage::Region);
        frame.alpha = AlphaMode::Opaque;
        frame.data[3] = 0;
        let image = normalize(frame, &rect(0, 0, 2, 2), &rect(0, 0, 2, 2)).unwrap();
        assert_eq!(image.pixel(0, 0).map(|px| px[3]), Some(255));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut frame = gradient(4, 4, 16, Coverage::FullMonitor);
        frame.data.truncate(16 * 3 + 8);
        let result = normalize(frame, &rect(0, 0, 4, 4), &rect(0, 0, 4, 4));
        assert!(matches!(result, Err(AcquireError::InvalidFrame { .. })));

        let mut frame = gradient(4, 4, 16, Coverage::FullMonitor);
        frame.stride = 8;
        let result = normalize(frame, &rect(0, 0, 4, 4), &rect(0, 0, 4, 4));
        assert!(matches!(result, Err(AcquireError::InvalidFrame { .. })));
    }

    #[test]
    fn rgba_export_unpremultiplies() {
        let frame = RawFrame {
            width: 1,
            height: 1,
            stride: 4,
            layout: PixelLayout::Bgra8,
            alpha: AlphaMode::Premultiplied,
            coverage: Coverage::Region,
            data: vec![25, 50, 100, 128],
        };
        let image = normalize(frame, &rect(0, 0, 1, 1), &rect(0, 0, 1, 1)).unwrap();
        let rgba = image.to_rgba_image();
        assert_eq!(rgba.get_pixel(0, 0).0, [199, 100, 50, 128]);
    }

    #[test]
    fn encodes_png_and_bmp() {
        let frame = gradient(3, 2, 12, Coverage::Region);
        let image = normalize(frame, &rect(0, 0, 3, 2), &rect(0, 0, 3, 2)).unwrap();
        let png = image.to_png().unwrap();
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);
        let bmp = image.to_bmp().unwrap();
        assert_eq!(&bmp[..2], b"BM");
    }
}
