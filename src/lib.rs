//! Cursor-anchored region capture for multi-monitor desktops.
//!
//! [`monitor::resolve`] finds the display under the cursor, [`lens::compute`]
//! places a rectangle of the chosen [`CaptureFrameSpec`] around it, and
//! [`CaptureEngine::capture_region`] turns that rectangle into a
//! [`CapturedImage`], preferring Windows.Graphics.Capture and falling back to a
//! GDI blit.

pub mod capture;
pub mod config;
pub mod engine;
pub mod errors;
pub mod frame_spec;
pub mod image;
pub mod lens;
pub mod monitor;
pub mod rect;
pub mod tracker;
pub mod util;

pub use self::config::{EngineConfig, OutputMode, Settings, SettingsStore};
pub use self::engine::CaptureEngine;
pub use self::errors::{AcquireError, CaptureError, MonitorNotFound, SpecParseError};
pub use self::frame_spec::CaptureFrameSpec;
pub use self::image::{CapturedImage, PixelFormat};
pub use self::monitor::{MonitorDetails, MonitorId};
pub use self::rect::PixelRect;
pub use self::tracker::CursorTracker;
