//! Monitor lookup for a virtual-desktop point.
//!
//! Nothing is cached: every call asks the OS, so hot-plugged or rearranged
//! displays are picked up on the next cursor move.

use crate::{errors::MonitorNotFound, rect::PixelRect};

/// Opaque display identity (an `HMONITOR` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(pub isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorDetails {
    pub id: MonitorId,
    /// Full monitor rectangle in virtual-desktop device pixels.
    pub bounds: PixelRect,
}

/// Returns the monitor containing `(x, y)`, or the nearest one when the point
/// lies outside every display.
pub fn resolve(x: i32, y: i32) -> Result<MonitorDetails, MonitorNotFound> {
    platform::resolve(x, y).ok_or(MonitorNotFound { x, y })
}

/// Nearest-monitor selection over an enumerated set; a containing monitor
/// always wins because its distance is zero.
pub fn nearest(monitors: &[MonitorDetails], x: i32, y: i32) -> Option<MonitorDetails> {
    monitors
        .iter()
        .min_by_key(|monitor| monitor.bounds.distance_sq(x, y))
        .copied()
}

#[cfg(target_os = "windows")]
mod platform {
    use windows::Win32::{
        Foundation::POINT,
        Graphics::Gdi::{GetMonitorInfoW, MonitorFromPoint, MONITORINFO, MONITOR_DEFAULTTONEAREST},
    };

    use super::{MonitorDetails, MonitorId};
    use crate::rect::PixelRect;

    pub(super) fn resolve(x: i32, y: i32) -> Option<MonitorDetails> {
        let hmonitor = unsafe { MonitorFromPoint(POINT { x, y }, MONITOR_DEFAULTTONEAREST) };
        if hmonitor.is_invalid() {
            return None;
        }

        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !unsafe { GetMonitorInfoW(hmonitor, &mut info) }.as_bool() {
            tracing::debug!("GetMonitorInfoW failed for {:?}", hmonitor);
            return None;
        }

        let rect = info.rcMonitor;
        let bounds = PixelRect::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        )?;
        Some(MonitorDetails {
            id: MonitorId(hmonitor.0 as isize),
            bounds,
        })
    }
}

#[cfg(not(target_os = "windows"))]
mod platform {
    use screenshots::Screen;

    use super::{nearest, MonitorDetails, MonitorId};
    use crate::rect::PixelRect;

    pub(super) fn resolve(x: i32, y: i32) -> Option<MonitorDetails> {
        let screens = match Screen::all() {
            Ok(screens) => screens,
            Err(e) => {
                tracing::debug!("display enumeration failed: {e:?}");
                return None;
            }
        };
        let monitors: Vec<MonitorDetails> = screens
            .iter()
            .filter_map(|screen| {
                let info = &screen.display_info;
                let bounds =
                    PixelRect::new(info.x, info.y, info.width as i32, info.height as i32)?;
                Some(MonitorDetails {
                    id: MonitorId(info.id as isize),
                    bounds,
                })
            })
            .collect();
        nearest(&monitors, x, y)
    }
}
