use crate::colors::Rgb;
use crate::error::{Error, Result};
use crate::widget::glow::{DEFAULT_INTERVAL, DEFAULT_STEP};
use crate::widget::KeyFont;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub keyboard: KeyboardSettings,
    #[serde(default)]
    pub demo: DemoSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeyboardSettings {
    pub cold: Option<Rgb>,
    pub hot: Option<Rgb>,
    pub highlight: Option<Rgb>,
    pub text: Option<Rgb>,
    pub preset: Option<u8>,
    pub track_physical: bool,
    pub heat_map: bool,
    pub font: KeyFont,
    pub glow: GlowSettings,
    /// Key name -> image path
    pub backgrounds: BTreeMap<String, PathBuf>,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            cold: None,
            hot: None,
            highlight: None,
            text: None,
            preset: None,
            track_physical: true,
            heat_map: true,
            font: KeyFont::default(),
            glow: GlowSettings::default(),
            backgrounds: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlowSettings {
    pub step: f64,
    pub interval_ms: u64,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Keys pressed by "Simulate keys"
    pub simulate: Vec<String>,
    /// Key pressed by the repeating timer
    pub auto_record_key: String,
    /// Timer period; 0 disables it
    pub auto_record_ms: u64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            simulate: ["A", "S", "D", "F", "Space"].map(String::from).to_vec(),
            auto_record_key: "Space".to_string(),
            auto_record_ms: 1500,
        }
    }
}

impl Settings {
    /// Settings from the default location; a missing or broken file gives defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("{}, using defaults", e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings = Self::parse(&content).map_err(|source| Error::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("heatboard")
            .join("config.toml")
    }
}
