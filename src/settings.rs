//! Preview settings
//!
//! Settings are read from `~/.config/lumen/settings.toml`

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use lumen_core::{ClockTime, Extent};
use lumen_light::LightingConfig;
use lumen_render::{BloomSettings, OutlineSettings};
use lumen_scene::{HintSettings, SceneConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All preview settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub video: VideoSettings,
    pub preview: PreviewSettings,
    pub lighting: LightingConfig,
    pub bloom: BloomSettings,
    pub outline: OutlineSettings,
    pub hint: HintSettings,
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lumen"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// The scene part of the settings
    pub fn scene(&self) -> SceneConfig {
        SceneConfig {
            lighting: self.lighting.clone(),
            bloom: self.bloom,
            outline: self.outline,
            hint: self.hint,
        }
    }
}

/// Video settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    /// Allow the offscreen post-process chain
    pub post_processing: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            post_processing: true,
        }
    }
}

impl VideoSettings {
    pub fn resolution(&self) -> Extent {
        Extent::new(self.width, self.height)
    }
}

/// Headless preview run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Number of frames to render
    pub frames: u32,
    /// Simulated frame interval in milliseconds
    pub frame_ms: u64,
    /// Pin the wall clock to "HH:MM" instead of local time
    pub clock: Option<String>,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            frames: 900,
            frame_ms: 16,
            clock: None,
        }
    }
}

impl PreviewSettings {
    pub fn pinned_clock(&self) -> anyhow::Result<Option<ClockTime>> {
        self.clock.as_deref().map(parse_clock).transpose()
    }
}

fn parse_clock(text: &str) -> anyhow::Result<ClockTime> {
    let (hour, minute) = text
        .split_once(':')
        .with_context(|| format!("Clock '{}' is not HH:MM", text))?;
    let hour: u32 = hour.trim().parse().context("Invalid clock hour")?;
    let minute: u32 = minute.trim().parse().context("Invalid clock minute")?;
    if hour > 23 || minute > 59 {
        bail!("Clock '{}' is out of range", text);
    }
    Ok(ClockTime::new(hour, minute))
}
