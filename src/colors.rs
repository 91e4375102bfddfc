use crate::error::Error;
use crossterm::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit color used for heat map and key styling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional)
    pub fn parse(s: &str) -> Result<Self, Error> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::Color(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::Color(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Add `amount` to every channel, saturating at 255
    pub fn lighten(self, amount: u8) -> Self {
        Self::new(
            self.r.saturating_add(amount),
            self.g.saturating_add(amount),
            self.b.saturating_add(amount),
        )
    }

    pub fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Per-channel linear interpolation from `a` to `b`.
/// `factor` is clamped to 0..=1; channels truncate toward zero.
pub fn mix_color(a: Rgb, b: Rgb, factor: f64) -> Rgb {
    let factor = factor.clamp(0.0, 1.0);
    let lerp = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * factor) as u8;
    Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
}

/// A named cold/hot/highlight triple
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatPreset {
    pub name: &'static str,
    pub cold: Rgb,
    pub hot: Rgb,
    pub highlight: Rgb,
}

pub const PRESETS: [HeatPreset; 10] = [
    HeatPreset { name: "default", cold: Rgb::new(18, 26, 38), hot: Rgb::new(126, 192, 255), highlight: Rgb::new(255, 65, 130) },
    HeatPreset { name: "fire", cold: Rgb::new(40, 12, 8), hot: Rgb::new(255, 196, 40), highlight: Rgb::new(255, 255, 200) },
    HeatPreset { name: "ice", cold: Rgb::new(10, 20, 48), hot: Rgb::new(90, 230, 255), highlight: Rgb::new(255, 255, 255) },
    HeatPreset { name: "pink", cold: Rgb::new(36, 12, 36), hot: Rgb::new(255, 110, 200), highlight: Rgb::new(255, 230, 120) },
    HeatPreset { name: "gold", cold: Rgb::new(34, 28, 10), hot: Rgb::new(255, 215, 64), highlight: Rgb::new(255, 255, 255) },
    HeatPreset { name: "electric", cold: Rgb::new(8, 30, 36), hot: Rgb::new(0, 255, 255), highlight: Rgb::new(255, 255, 255) },
    HeatPreset { name: "lava", cold: Rgb::new(30, 6, 18), hot: Rgb::new(255, 50, 40), highlight: Rgb::new(255, 0, 255) },
    HeatPreset { name: "mono", cold: Rgb::new(28, 28, 28), hot: Rgb::new(235, 235, 235), highlight: Rgb::new(255, 255, 255) },
    HeatPreset { name: "demo", cold: Rgb::new(26, 32, 44), hot: Rgb::new(92, 178, 255), highlight: Rgb::new(255, 128, 188) },
    HeatPreset { name: "neon", cold: Rgb::new(12, 8, 40), hot: Rgb::new(200, 60, 255), highlight: Rgb::new(60, 255, 160) },
];

/// Look up a preset by index, wrapping around the table
pub fn preset(index: u8) -> HeatPreset {
    PRESETS[index as usize % PRESETS.len()]
}

/// Cycling preset selection for the demo controls
#[derive(Clone, Copy)]
pub struct PresetState {
    pub index: u8,
}

impl PresetState {
    pub fn new(index: u8) -> Self {
        Self { index: index % PRESETS.len() as u8 }
    }

    pub fn next(&mut self) -> HeatPreset {
        self.index = (self.index + 1) % PRESETS.len() as u8;
        self.current()
    }

    pub fn current(&self) -> HeatPreset {
        preset(self.index)
    }
}
