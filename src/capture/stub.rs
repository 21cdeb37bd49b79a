use std::time::Duration;

use super::{FrameSource, RawFrame};
use crate::{errors::AcquireError, monitor::MonitorDetails, rect::PixelRect};

/// Accelerated capture stand-in for non-Windows targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceleratedSource;

impl AcceleratedSource {
    pub fn new(_timeout: Duration) -> Self {
        Self
    }
}

impl FrameSource for AcceleratedSource {
    fn name(&self) -> &'static str {
        "accelerated-stub"
    }

    fn acquire(
        &self,
        _rect: &PixelRect,
        monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        tracing::debug!("accelerated capture stub (non-Windows) monitor={:?}", monitor.id);
        Err(AcquireError::unavailable(
            "Windows.Graphics.Capture is only available on Windows",
        ))
    }
}
