use crate::colors::{preset, Rgb};
use crate::error::{Error, Result};
use crate::keymap::Key;
use crate::settings::{DemoSettings, KeyboardSettings};
use crate::widget::{HeatKeyboard, KeyFont};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Keyboard appearance and behaviour resolved from settings and CLI flags
#[derive(Clone, Debug)]
pub struct KeyboardConfig {
    pub cold: Rgb,
    pub hot: Rgb,
    pub highlight: Rgb,
    pub text: Rgb,
    pub preset: u8,
    pub track_physical: bool,
    pub heat_map: bool,
    pub font: KeyFont,
    pub glow_step: f64,
    pub glow_interval: Duration,
    pub backgrounds: Vec<(Key, PathBuf)>,
}

impl KeyboardConfig {
    /// A preset given on the command line replaces colours from the file
    pub fn from_settings(settings: &KeyboardSettings, cli_preset: Option<u8>) -> Self {
        let index = cli_preset.or(settings.preset).unwrap_or(0);
        let base = preset(index);
        let from_file = |color: Option<Rgb>, fallback: Rgb| match cli_preset {
            Some(_) => fallback,
            None => color.unwrap_or(fallback),
        };

        let backgrounds = settings
            .backgrounds
            .iter()
            .filter_map(|(name, path)| match Key::from_name(name) {
                Some(key) => Some((key, path.clone())),
                None => {
                    warn!("ignoring background for unknown key '{}'", name);
                    None
                }
            })
            .collect();

        Self {
            cold: from_file(settings.cold, base.cold),
            hot: from_file(settings.hot, base.hot),
            highlight: from_file(settings.highlight, base.highlight),
            text: settings.text.unwrap_or(Rgb::WHITE),
            preset: index,
            track_physical: settings.track_physical,
            heat_map: settings.heat_map,
            font: settings.font,
            glow_step: settings.glow.step,
            glow_interval: Duration::from_millis(settings.glow.interval_ms),
            backgrounds,
        }
    }

    /// Push this configuration into a keyboard. Unloadable images are skipped.
    pub fn apply(&self, keyboard: &mut HeatKeyboard) {
        keyboard.set_cold_color(self.cold);
        keyboard.set_hot_color(self.hot);
        keyboard.set_highlight_color(self.highlight);
        keyboard.set_text_color(self.text);
        keyboard.set_key_font(self.font);
        keyboard.set_glow_timing(self.glow_step, self.glow_interval);
        keyboard.set_heat_map_enabled(self.heat_map);
        keyboard.set_track_physical_keyboard(self.track_physical);
        for (key, path) in &self.backgrounds {
            if let Err(e) = keyboard.set_key_background_image(*key, path) {
                warn!("{}", e);
            }
        }
    }
}

/// Seconds per demo frame when the requested value is unusable
pub const DEFAULT_FRAME_TIME: f32 = 0.03;

/// Configuration for the interactive demo
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub keyboard: KeyboardConfig,
    pub samples: HashMap<Key, u32>,
    pub simulate: Vec<Key>,
    pub auto_record: Option<(Key, Duration)>,
    pub time_step: f32,
}

impl DemoConfig {
    pub fn from_settings(
        keyboard: KeyboardConfig,
        demo: &DemoSettings,
        samples: HashMap<Key, u32>,
        time_step: f32,
    ) -> Result<Self> {
        let simulate = demo
            .simulate
            .iter()
            .map(|name| Key::from_name(name).ok_or_else(|| Error::UnknownKey(name.clone())))
            .collect::<Result<Vec<_>>>()?;

        let auto_record = match demo.auto_record_ms {
            0 => None,
            ms => {
                let key = Key::from_name(&demo.auto_record_key)
                    .ok_or_else(|| Error::UnknownKey(demo.auto_record_key.clone()))?;
                Some((key, Duration::from_millis(ms)))
            }
        };

        let time_step = if time_step.is_nan() {
            DEFAULT_FRAME_TIME
        } else {
            time_step.clamp(0.005, 1.0)
        };

        Ok(Self {
            keyboard,
            samples,
            simulate,
            auto_record,
            time_step,
        })
    }
}

/// Configuration for a one-shot render to stdout
#[derive(Clone, Debug)]
pub struct PrintConfig {
    pub keyboard: KeyboardConfig,
    pub samples: HashMap<Key, u32>,
    pub width: u16,
    pub height: u16,
}

/// Parse `NAME=COUNT` pairs separated by commas, e.g. `A=3,S=1,Space=7`.
/// Raw decimal codes are accepted as names and kept even if no key shows them.
pub fn parse_samples(input: &str) -> Result<HashMap<Key, u32>> {
    let mut samples = HashMap::new();
    for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, count) = pair
            .split_once('=')
            .ok_or_else(|| Error::Samples(pair.to_string()))?;
        let key = Key::from_name(name).ok_or_else(|| Error::UnknownKey(name.trim().to_string()))?;
        let count: u32 = count
            .trim()
            .parse()
            .map_err(|_| Error::Samples(pair.to_string()))?;
        samples.insert(key, count);
    }
    Ok(samples)
}
