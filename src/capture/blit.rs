use anyhow::Result;
use screenshots::{Image, Screen};

use super::{AlphaMode, Coverage, FrameSource, PixelLayout, RawFrame};
use crate::{errors::AcquireError, monitor::MonitorDetails, rect::PixelRect};

pub trait ScreenExt {
    fn capture_rect(&self, rect: &PixelRect) -> Result<Image>;
}

impl ScreenExt for Screen {
    /// `capture_area` takes screen-relative logical units.
    fn capture_rect(&self, rect: &PixelRect) -> Result<Image> {
        let info = &self.display_info;
        let x = (rect.left() - info.x) as f32 / info.scale_factor;
        let y = (rect.top() - info.y) as f32 / info.scale_factor;
        let w = rect.width() as f32 / info.scale_factor;
        let h = rect.height() as f32 / info.scale_factor;

        self.capture_area(x as i32, y as i32, w.round() as u32, h.round() as u32)
    }
}

/// Synchronous screen-DC copy of just the requested rectangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlitSource;

impl FrameSource for BlitSource {
    fn name(&self) -> &'static str {
        "gdi-blit"
    }

    fn acquire(
        &self,
        rect: &PixelRect,
        _monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        let screen =
            Screen::from_point(rect.left(), rect.top()).map_err(AcquireError::platform)?;
        let image = screen.capture_rect(rect).map_err(AcquireError::platform)?;
        tracing::debug!(
            "blit {} -> {}x{} (scale {})",
            rect,
            image.width(),
            image.height(),
            screen.display_info.scale_factor
        );

        Ok(RawFrame {
            width: image.width(),
            height: image.height(),
            stride: image.width() as usize * 4,
            layout: PixelLayout::Rgba8,
            alpha: AlphaMode::Straight,
            coverage: Coverage::Region,
            data: image.rgba().to_vec(),
        })
    }
}
