//! Reader and writer settings.
//!
//! Settings are plain data passed to the reader and writer explicitly. They
//! can be persisted as JSON, by default in the user config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::formats::ply::PlyEncoding;
use crate::util::{Error, Result};

/// Default zero padding of frame file names (`000.vtp`).
pub const DEFAULT_FRAME_DIGITS: usize = 3;

const MAX_FRAME_DIGITS: usize = 9;

/// Reader and writer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Zero padding of frame file names in a stack directory.
    pub frame_digits: usize,
    /// Encoding used when writing PLY.
    pub ply_encoding: PlyEncoding,
    /// Color loaded layers by their first feature column.
    pub color_by_first_feature: bool,
    /// Display size hint attached to point layers.
    pub point_size: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_digits: DEFAULT_FRAME_DIGITS,
            ply_encoding: PlyEncoding::default(),
            color_by_first_feature: true,
            point_size: 0.5,
        }
    }
}

impl Config {
    /// Location of the settings file in the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("layerbridge");
            p.push("config.json");
            p
        })
    }

    /// Load settings from a JSON file. Missing keys take their defaults and
    /// out of range values are reset.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.sanitize();
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from [`default_path`](Self::default_path), falling back to
    /// defaults when there is no usable file.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path().filter(|p| p.is_file()) else {
            return Self::default();
        };
        Self::load(&path).unwrap_or_else(|e| {
            warn!("ignoring config: {}", e);
            Self::default()
        })
    }

    /// Save settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn sanitize(&mut self) {
        if !(1..=MAX_FRAME_DIGITS).contains(&self.frame_digits) {
            warn!(
                "frame_digits {} out of range, using {}",
                self.frame_digits, DEFAULT_FRAME_DIGITS
            );
            self.frame_digits = DEFAULT_FRAME_DIGITS;
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            self.point_size = Self::default().point_size;
        }
    }
}
