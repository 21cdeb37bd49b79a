use tracing::debug;

use crate::{
    errors::MonitorNotFound, frame_spec::CaptureFrameSpec, lens, monitor::MonitorDetails,
    rect::PixelRect,
};

/// Follows the cursor and holds the rectangle a capture would use.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    spec: CaptureFrameSpec,
    target: Option<(PixelRect, MonitorDetails)>,
}

impl CursorTracker {
    pub fn new(spec: CaptureFrameSpec) -> Self {
        Self { spec, target: None }
    }

    pub fn spec(&self) -> CaptureFrameSpec {
        self.spec
    }

    /// Last valid rectangle and the monitor it was placed on.
    pub fn target(&self) -> Option<&(PixelRect, MonitorDetails)> {
        self.target.as_ref()
    }

    /// Recomputes the rectangle for a cursor at `(x, y)`. A failed monitor
    /// lookup leaves the previous rectangle in place.
    pub fn update(
        &mut self,
        x: i32,
        y: i32,
        monitor: Result<MonitorDetails, MonitorNotFound>,
    ) -> Option<&(PixelRect, MonitorDetails)> {
        match monitor {
            Ok(monitor) => {
                let rect = lens::compute(&self.spec, x, y, &monitor.bounds);
                debug!("rect {rect} on {:?}", monitor.id);
                self.target = Some((rect, monitor));
            }
            Err(e) => debug!("{e}, keeping last rectangle"),
        }
        self.target.as_ref()
    }
}
