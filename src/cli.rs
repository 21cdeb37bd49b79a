use clap::Parser;
use frame_snap::CaptureFrameSpec;

#[derive(Debug, Parser)]
#[command(
    name = "frame-snap",
    about = "Middle-click capture of a fixed-shape region around the cursor",
    version
)]
pub struct Cli {
    /// Frame to capture, as a ratio (`16:9`) or a pixel size (`800x600`).
    /// Saved to the settings file for later runs.
    pub spec: Option<CaptureFrameSpec>,
}
