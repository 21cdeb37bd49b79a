use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use time::{macros::format_description, OffsetDateTime};

use crate::{
    config::{OutputMode, Settings},
    image::CapturedImage,
};

/// Places the image on the clipboard as a 24-bit bitmap.
#[cfg(target_os = "windows")]
pub fn copy_image(image: &CapturedImage) -> Result<()> {
    use clipboard_win::{formats, set_clipboard};

    let bmp = image.to_bmp()?;
    set_clipboard(formats::Bitmap, bmp).map_err(|e| anyhow!(e))
}

#[cfg(not(target_os = "windows"))]
pub fn copy_image(image: &CapturedImage) -> Result<()> {
    Err(anyhow!(
        "clipboard output is only supported on Windows ({}x{} image dropped)",
        image.width(),
        image.height()
    ))
}

/// `<pictures dir>/FrameSnap`.
pub fn default_output_dir() -> Result<PathBuf> {
    dirs::picture_dir()
        .map(|dir| dir.join("FrameSnap"))
        .ok_or_else(|| anyhow!("no pictures directory"))
}

/// Writes `<dir>/<YYYY-MM>/snip_<YYYYMMDD_HHMMSS>.png` stamped with local time.
pub fn save_png(image: &CapturedImage, dir: &Path) -> Result<PathBuf> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    save_png_at(image, dir, now)
}

pub fn save_png_at(image: &CapturedImage, dir: &Path, at: OffsetDateTime) -> Result<PathBuf> {
    let month = at.format(format_description!("[year]-[month]"))?;
    let stamp = at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))?;

    let dir = dir.join(month);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("snip_{stamp}.png"));
    fs::write(&path, image.to_png()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Clipboard always, plus a PNG file in save mode. Returns the saved path.
pub fn deliver(image: &CapturedImage, settings: &Settings) -> Result<Option<PathBuf>> {
    copy_image(image)?;
    match settings.output_mode {
        OutputMode::ClipboardOnly => Ok(None),
        OutputMode::ClipboardAndSave => {
            let dir = match &settings.output_dir {
                Some(dir) => dir.clone(),
                None => default_output_dir()?,
            };
            save_png(image, &dir).map(Some)
        }
    }
}

/// Monitor bounds, cursor positions and both capture paths then share one
/// device-pixel space.
#[cfg(target_os = "windows")]
pub fn enable_dpi_awareness() -> Result<()> {
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) }
        .map_err(|e| anyhow!("SetProcessDpiAwarenessContext: {e}"))
}

#[cfg(not(target_os = "windows"))]
pub fn enable_dpi_awareness() -> Result<()> {
    Ok(())
}
