// Runtime configuration: an optional TOML file layered under environment overrides.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::shared::ControlId;

pub const DEFAULT_CONFIG_FILE: &str = "ambience.toml";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AmbienceConfig {
    /// Application segment of asset urls: `/static/<app>/sounds/<file>`.
    pub app: String,
    /// Directory that `/static/` maps onto.
    pub static_root: PathBuf,
    /// Where the settings blob and the log file live.
    pub data_dir: PathBuf,
    pub tick_ms: u64,
    pub audio: AudioConfig,
    pub controls: ControlsConfig,
}

impl Default for AmbienceConfig {
    fn default() -> Self {
        Self {
            app: String::from("chatkada"),
            static_root: PathBuf::from("static"),
            data_dir: PathBuf::from(".chatkada"),
            tick_ms: 16, // ~60fps
            audio: AudioConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Build the per-channel lowpass + gain chain. Off means direct playback.
    pub filter_graph: bool,
    pub command_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            filter_graph: true,
            command_capacity: 1024,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Controls left out of the panel layout.
    pub hidden: Vec<ControlId>,
}

impl AmbienceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// An explicit path must parse; the implicit `ambience.toml` is only read if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("AMBIENCE_APP") {
            self.app = val;
        }
        if let Some(val) = lookup("AMBIENCE_STATIC_ROOT") {
            self.static_root = PathBuf::from(val);
        }
        if let Some(val) = lookup("AMBIENCE_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("AMBIENCE_TICK_MS").and_then(|v| v.parse().ok()) {
            self.tick_ms = val;
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("ambience.log")
    }
}
