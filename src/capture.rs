mod blit;
pub mod delivery;

#[cfg(target_os = "windows")]
mod wgc;
#[cfg(target_os = "windows")]
pub use wgc::AcceleratedSource;

#[cfg(not(target_os = "windows"))]
mod stub;
#[cfg(not(target_os = "windows"))]
pub use stub::AcceleratedSource;

pub use blit::{BlitSource, ScreenExt};

use crate::{errors::AcquireError, monitor::MonitorDetails, rect::PixelRect};

/// Channel order of a raw frame, 4 bytes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Bgra8,
    Rgba8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    Straight,
    Premultiplied,
    /// Alpha byte is undefined; treat every pixel as opaque.
    Opaque,
}

/// What part of the desktop a raw frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// The whole monitor; the requested rectangle must be cropped out.
    FullMonitor,
    /// Exactly the requested rectangle.
    Region,
}

/// Pixels as produced by an acquisition strategy, before normalisation.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per source row, at least `width * 4`.
    pub stride: usize,
    pub layout: PixelLayout,
    pub alpha: AlphaMode,
    pub coverage: Coverage,
    pub data: Vec<u8>,
}

/// One acquisition strategy: the accelerated WGC path or the GDI blit.
///
/// Implementations own every native resource they create for the duration of
/// a single call and release it before returning.
pub trait FrameSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn acquire(&self, rect: &PixelRect, monitor: &MonitorDetails)
        -> Result<RawFrame, AcquireError>;
}
