use tracing::{debug, error, info, warn};

use crate::{
    capture::{AcceleratedSource, BlitSource, FrameSource},
    config::EngineConfig,
    errors::{AcquireError, CaptureError},
    image::{normalize, CapturedImage},
    monitor::MonitorDetails,
    rect::PixelRect,
};

/// Two-tier capture: accelerated first, legacy blit on any failure.
///
/// Holds no native state between calls, so it can be shared across threads.
pub struct CaptureEngine<A = AcceleratedSource, L = BlitSource> {
    accelerated: A,
    legacy: L,
}

impl CaptureEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_sources(AcceleratedSource::new(config.frame_timeout), BlitSource)
    }
}

impl<A: FrameSource, L: FrameSource> CaptureEngine<A, L> {
    pub fn with_sources(accelerated: A, legacy: L) -> Self {
        Self {
            accelerated,
            legacy,
        }
    }

    /// Captures `rect` on `monitor`. Either an image of the rectangle or a
    /// single failure carrying both strategies' reasons.
    pub fn capture_region(
        &self,
        rect: &PixelRect,
        monitor: &MonitorDetails,
    ) -> Result<CapturedImage, CaptureError> {
        let accelerated = match self.run(&self.accelerated, rect, monitor) {
            Ok(image) => return Ok(image),
            Err(e) => e,
        };
        match &accelerated {
            AcquireError::Unavailable { .. } => debug!(
                "{} unavailable, using {}: {}",
                self.accelerated.name(),
                self.legacy.name(),
                accelerated
            ),
            _ => warn!(
                "{} failed, falling back to {}: {}",
                self.accelerated.name(),
                self.legacy.name(),
                accelerated
            ),
        }

        match self.run(&self.legacy, rect, monitor) {
            Ok(image) => Ok(image),
            Err(legacy) => {
                error!(
                    "capture of {} failed: accelerated: {}; legacy: {}",
                    rect, accelerated, legacy
                );
                Err(CaptureError::Failed {
                    accelerated,
                    legacy,
                })
            }
        }
    }

    fn run(
        &self,
        source: &dyn FrameSource,
        rect: &PixelRect,
        monitor: &MonitorDetails,
    ) -> Result<CapturedImage, AcquireError> {
        let frame = source.acquire(rect, monitor)?;
        let image = normalize(frame, rect, &monitor.bounds)?;
        info!(
            "{} captured {}x{} for {}",
            source.name(),
            image.width(),
            image.height(),
            rect
        );
        Ok(image)
    }
}
