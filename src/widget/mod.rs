//! Heat map keyboard widget
//!
//! `HeatKeyboard` lays out one `KeyCell` per key cap, counts presses per
//! logical key and pushes `(count, max)` to every cell bound to that key.
//! Each cell fades its own press glow.

pub mod cell;
pub mod glow;
pub mod image;
pub mod keyboard;

pub use cell::KeyFont;
pub use keyboard::{GlowChanged, HeatKeyboard};

/// Rectangle in terminal cells
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x
            && col < self.x + self.width
            && row >= self.y
            && row < self.y + self.height
    }
}
