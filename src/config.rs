//! Engine configuration and persisted user settings.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::frame_spec::CaptureFrameSpec;

pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(2);

const APP_DIR: &str = "FrameSnap";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on the wait for an accelerated frame.
    pub frame_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
    #[default]
    ClipboardOnly,
    ClipboardAndSave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "aspectRatio")]
    pub frame_spec: String,
    pub output_mode: OutputMode,
    pub frame_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_spec: CaptureFrameSpec::default().to_string(),
            output_mode: OutputMode::default(),
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT.as_millis() as u64,
            output_dir: None,
        }
    }
}

impl Settings {
    /// The stored frame spec; an unparsable value falls back to the first preset.
    pub fn frame_spec(&self) -> CaptureFrameSpec {
        match self.frame_spec.parse() {
            Ok(spec) => spec,
            Err(e) => {
                let fallback = CaptureFrameSpec::default();
                warn!("stored frame spec ignored, using {fallback}: {e}");
                fallback
            }
        }
    }

    pub fn set_frame_spec(&mut self, spec: CaptureFrameSpec) {
        self.frame_spec = spec.to_string();
    }

    pub fn engine_config(&self) -> EngineConfig {
        match self.frame_timeout_ms {
            0 => EngineConfig::default(),
            ms => EngineConfig {
                frame_timeout: Duration::from_millis(ms),
            },
        }
    }
}

/// JSON file holding [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// `<config dir>/FrameSnap/settings.json`.
    pub fn new() -> Result<Self> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("no config directory"))?;
        Ok(Self::at(dir.join(APP_DIR).join(SETTINGS_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Settings {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
            Err(e) => {
                warn!("failed to read {}: {e}", self.path.display());
                return Settings::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("malformed settings in {}: {e}", self.path.display());
            Settings::default()
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
