//! One key cap: heat map color, press glow and painting.

use super::glow::Glow;
use super::image::KeyBackground;
use super::Area;
use crate::colors::{mix_color, Rgb};
use crate::keymap::Key;
use crate::terminal::{Cell, Terminal};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Opacity of the heat wash painted over background artwork
const IMAGE_TINT: f64 = 140.0 / 255.0;
/// Border is drawn this much brighter than the fill
const BORDER_LIFT: u8 = 40;
/// Alpha threshold below which an artwork pixel shows the plain fill
const ALPHA_THRESHOLD: u8 = 10;

/// Text attributes for key labels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct KeyFont {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

/// Resolved colors and attributes of a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyStyle {
    pub fill: Rgb,
    pub border: Rgb,
    pub text: Rgb,
    pub bold: bool,
    pub italic: bool,
}

pub struct KeyCell {
    label: String,
    key: Key,
    heat: u32,
    heat_max: u32,
    cold: Rgb,
    hot: Rgb,
    highlight: Rgb,
    text: Rgb,
    font: KeyFont,
    background: Option<KeyBackground>,
    glow: Glow,
    dirty: bool,
}

impl KeyCell {
    pub fn new(label: &str, key: Key) -> Self {
        Self {
            label: label.to_string(),
            key,
            heat: 0,
            heat_max: 1,
            cold: Rgb::new(30, 35, 45),
            hot: Rgb::new(102, 170, 255),
            highlight: Rgb::new(255, 51, 102),
            text: Rgb::WHITE,
            font: KeyFont::default(),
            background: None,
            glow: Glow::default(),
            dirty: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn heat(&self) -> u32 {
        self.heat
    }

    pub fn heat_max(&self) -> u32 {
        self.heat_max
    }

    pub fn glow(&self) -> &Glow {
        &self.glow
    }

    pub fn glow_level(&self) -> f64 {
        self.glow.level()
    }

    pub fn font(&self) -> KeyFont {
        self.font
    }

    pub fn background(&self) -> Option<&KeyBackground> {
        self.background.as_ref()
    }

    /// Needs repainting
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// This key's count and the keyboard-wide maximum (clamped to at least 1)
    pub fn set_heat(&mut self, count: u32, max: u32) {
        self.heat = count;
        self.heat_max = max.max(1);
        self.dirty = true;
    }

    pub fn set_heat_colors(&mut self, cold: Rgb, hot: Rgb) {
        self.cold = cold;
        self.hot = hot;
        self.dirty = true;
    }

    pub fn set_highlight_color(&mut self, color: Rgb) {
        self.highlight = color;
        self.dirty = true;
    }

    pub fn set_base_text_color(&mut self, color: Rgb) {
        self.text = color;
        self.dirty = true;
    }

    pub fn set_font(&mut self, font: KeyFont) {
        self.font = font;
        self.dirty = true;
    }

    pub fn set_glow_timing(&mut self, step: f64, interval: Duration) {
        self.glow.set_timing(step, interval);
    }

    /// Replace the artwork; returns false when it is the same image
    pub fn set_background(&mut self, background: Option<KeyBackground>) -> bool {
        let same = match (&self.background, &background) {
            (Some(current), Some(new)) => current.same_image(new),
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }
        self.background = background;
        self.dirty = true;
        true
    }

    /// Full glow, fading from `now`. Returns true if the level changed.
    pub fn trigger_glow(&mut self, now: Instant) -> bool {
        let before = self.glow.level();
        self.glow.trigger(now);
        self.dirty = true;
        before != self.glow.level()
    }

    pub fn set_glow_level(&mut self, level: f64) -> bool {
        let changed = self.glow.set_level(level);
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Run due fade ticks. Returns true if the level changed.
    pub fn advance_glow(&mut self, now: Instant) -> bool {
        let changed = self.glow.advance(now);
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// count / max, clamped to 0..=1
    pub fn heat_ratio(&self) -> f64 {
        (self.heat as f64 / self.heat_max.max(1) as f64).clamp(0.0, 1.0)
    }

    /// Heat gradient color before the glow overlay
    pub fn base_color(&self) -> Rgb {
        mix_color(self.cold, self.hot, self.heat_ratio())
    }

    /// Base color blended toward the highlight, using the glow level as
    /// both the overlay alpha and the mix factor.
    pub fn fill_color(&self) -> Rgb {
        let overlay_alpha = self.glow.level().clamp(0.0, 1.0);
        mix_color(self.base_color(), self.highlight, overlay_alpha)
    }

    pub fn style(&self) -> KeyStyle {
        let fill = self.fill_color();
        KeyStyle {
            fill,
            border: mix_color(fill.lighten(BORDER_LIFT), self.highlight, self.glow.level()),
            text: self.text,
            bold: self.font.bold,
            italic: self.font.italic,
        }
    }

    /// Draw into `area`: a rounded box when there is room, a flat strip otherwise
    pub fn paint(&mut self, term: &mut Terminal, area: Area) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let style = self.style();
        let fill = style.fill.to_color();
        let boxed = area.width >= 3 && area.height >= 3;

        match self.background.as_mut() {
            Some(background) => {
                let rgba = background.pixels(area.width as u32, area.height as u32 * 2);
                let wash = |px: &image::Rgba<u8>| {
                    if px[3] < ALPHA_THRESHOLD {
                        style.fill
                    } else {
                        mix_color(Rgb::new(px[0], px[1], px[2]), style.fill, IMAGE_TINT)
                    }
                };
                for cy in 0..area.height as u32 {
                    for cx in 0..area.width as u32 {
                        let top = wash(rgba.get_pixel(cx, cy * 2));
                        let bottom = wash(rgba.get_pixel(cx, cy * 2 + 1));
                        term.set_with_bg(
                            area.x as i32 + cx as i32,
                            area.y as i32 + cy as i32,
                            '▀',
                            Some(top.to_color()),
                            Some(bottom.to_color()),
                            false,
                        );
                    }
                }
            }
            None => {
                for y in area.y..area.y + area.height {
                    for x in area.x..area.x + area.width {
                        term.set_with_bg(x as i32, y as i32, ' ', None, Some(fill), false);
                    }
                }
            }
        }

        if boxed {
            let border = Some(style.border.to_color());
            let left = area.x as i32;
            let right = (area.x + area.width - 1) as i32;
            let top = area.y as i32;
            let bottom = (area.y + area.height - 1) as i32;

            for x in left + 1..right {
                term.set_with_bg(x, top, '─', border, Some(fill), false);
                term.set_with_bg(x, bottom, '─', border, Some(fill), false);
            }
            for y in top + 1..bottom {
                term.set_with_bg(left, y, '│', border, Some(fill), false);
                term.set_with_bg(right, y, '│', border, Some(fill), false);
            }
            // Rounded corners also clip the artwork
            term.set_with_bg(left, top, '╭', border, Some(fill), false);
            term.set_with_bg(right, top, '╮', border, Some(fill), false);
            term.set_with_bg(left, bottom, '╰', border, Some(fill), false);
            term.set_with_bg(right, bottom, '╯', border, Some(fill), false);
        }

        let inner = (if boxed { area.width - 2 } else { area.width }) as usize;
        let label: Vec<char> = self.label.chars().take(inner).collect();
        let x = area.x as usize + (area.width as usize - label.len()) / 2;
        let y = area.y + area.height / 2;
        for (i, ch) in label.into_iter().enumerate() {
            term.set_cell(
                (x + i) as i32,
                y as i32,
                Cell {
                    ch,
                    fg: Some(style.text.to_color()),
                    bg: Some(fill),
                    bold: style.bold,
                    italic: style.italic,
                },
            );
        }

        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn bg_of(term: &Terminal, x: u16, y: u16) -> Option<crossterm::style::Color> {
        term.cell(x, y).and_then(|c| c.bg)
    }

    #[test]
    fn max_is_clamped_to_one() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        cell.set_heat(0, 0);
        assert_eq!(cell.heat_max(), 1);
        assert_eq!(cell.heat_ratio(), 0.0);
    }

    #[test]
    fn ratio_is_clamped_to_one() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        cell.set_heat(9, 3);
        assert_eq!(cell.heat_ratio(), 1.0);
        cell.set_heat(1, 4);
        assert_eq!(cell.heat_ratio(), 0.25);
    }

    #[test]
    fn base_color_follows_heat() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        let cold = Rgb::new(0, 0, 0);
        let hot = Rgb::new(200, 100, 40);
        cell.set_heat_colors(cold, hot);
        assert_eq!(cell.base_color(), cold);
        cell.set_heat(1, 2);
        assert_eq!(cell.base_color(), Rgb::new(100, 50, 20));
        cell.set_heat(2, 2);
        assert_eq!(cell.base_color(), hot);
    }

    #[test]
    fn glow_blends_toward_highlight() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        cell.set_heat_colors(Rgb::new(0, 0, 0), Rgb::new(0, 0, 0));
        cell.set_highlight_color(Rgb::new(200, 100, 50));
        assert_eq!(cell.fill_color(), Rgb::new(0, 0, 0));
        cell.set_glow_level(0.5);
        assert_eq!(cell.fill_color(), Rgb::new(100, 50, 25));
        assert!(cell.trigger_glow(Instant::now()));
        assert_eq!(cell.fill_color(), Rgb::new(200, 100, 50));
    }

    #[test]
    fn style_uses_font_and_text_color() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        cell.set_base_text_color(Rgb::new(1, 2, 3));
        cell.set_font(KeyFont { bold: true, italic: false });
        let style = cell.style();
        assert_eq!(style.text, Rgb::new(1, 2, 3));
        assert!(style.bold);
        assert!(!style.italic);
        assert_eq!(style.border, style.fill.lighten(BORDER_LIFT));
    }

    #[test]
    fn border_lifts_the_fill_and_follows_the_glow() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        cell.set_heat_colors(Rgb::new(10, 20, 30), Rgb::new(230, 240, 250));
        cell.set_highlight_color(Rgb::new(255, 0, 0));
        cell.set_heat(1, 1);

        cell.set_glow_level(0.5);
        let style = cell.style();
        assert_eq!(style.border, mix_color(style.fill.lighten(BORDER_LIFT), Rgb::new(255, 0, 0), 0.5));

        cell.set_glow_level(1.0);
        let style = cell.style();
        assert_eq!(style.fill, Rgb::new(255, 0, 0));
        assert_eq!(style.border, Rgb::new(255, 0, 0));
    }

    #[test]
    fn setters_mark_dirty_and_paint_cleans() {
        let mut cell = KeyCell::new("A", Key::char('A'));
        let mut term = Terminal::offscreen(5, 3);
        cell.paint(&mut term, Area::new(0, 0, 5, 3));
        assert!(!cell.is_dirty());
        cell.set_heat(1, 1);
        assert!(cell.is_dirty());
    }

    #[test]
    fn boxed_paint_draws_rounded_frame_and_label() {
        let mut cell = KeyCell::new("Tab", Key::TAB);
        let mut term = Terminal::offscreen(7, 3);
        cell.paint(&mut term, Area::new(0, 0, 7, 3));
        assert_eq!(term.row_text(0), "╭─────╮");
        assert_eq!(term.row_text(1), "│ Tab │");
        assert_eq!(term.row_text(2), "╰─────╯");
        assert_eq!(bg_of(&term, 3, 1), Some(cell.fill_color().to_color()));
    }

    #[test]
    fn flat_paint_truncates_label() {
        let mut cell = KeyCell::new("Backspace", Key::BACKSPACE);
        let mut term = Terminal::offscreen(4, 1);
        cell.paint(&mut term, Area::new(0, 0, 4, 1));
        assert_eq!(term.row_text(0), "Back");
    }

    #[test]
    fn artwork_is_washed_with_fill() {
        let white = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let mut cell = KeyCell::new("", Key::SPACE);
        cell.set_heat_colors(Rgb::new(0, 0, 0), Rgb::new(0, 0, 0));
        assert!(cell.set_background(Some(KeyBackground::from_image(DynamicImage::ImageRgba8(white)))));
        let mut term = Terminal::offscreen(2, 1);
        cell.paint(&mut term, Area::new(0, 0, 2, 1));
        let washed = mix_color(Rgb::WHITE, Rgb::new(0, 0, 0), IMAGE_TINT);
        let painted = term.cell(0, 0).unwrap();
        assert_eq!(painted.ch, '▀');
        assert_eq!(painted.fg, Some(washed.to_color()));
        assert_eq!(painted.bg, Some(washed.to_color()));
    }

    #[test]
    fn same_background_is_ignored() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let bg = KeyBackground::from_image(img);
        let mut cell = KeyCell::new("A", Key::char('A'));
        assert!(cell.set_background(Some(bg.clone())));
        assert!(!cell.set_background(Some(bg)));
        assert!(cell.set_background(None));
        assert!(!cell.set_background(None));
    }
}
