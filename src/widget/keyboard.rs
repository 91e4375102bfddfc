use super::cell::{KeyCell, KeyFont};
use super::image::KeyBackground;
use super::Area;
use crate::colors::Rgb;
use crate::error::Result;
use crate::keymap::{Key, KeySpec, ROWS};
use crate::tap::{EvdevSource, KeySource, Subscription, TapMode};
use crate::terminal::Terminal;
use crossterm::event::KeyCode;
use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Columns left empty between neighbouring keys
const KEY_GAP: u16 = 1;

/// Emitted whenever a cell's glow level changes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowChanged {
    pub cell: usize,
    pub key: Key,
    pub level: f64,
}

/// Grid position of a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Placement {
    row: u16,
    column: u16,
    column_span: u16,
    row_span: u16,
}

/// On-screen keyboard with press counting, heat map and press glow
pub struct HeatKeyboard {
    cells: Vec<KeyCell>,
    placements: Vec<Placement>,
    columns: u16,
    rows: u16,
    bindings: HashMap<Key, Vec<usize>>,
    counts: HashMap<Key, u32>,
    track_physical: bool,
    heat_map_enabled: bool,
    cold: Rgb,
    hot: Rgb,
    highlight: Rgb,
    text: Rgb,
    font: KeyFont,
    backgrounds: HashMap<Key, KeyBackground>,
    source: Box<dyn KeySource>,
    tap: Option<Subscription>,
    tap_tx: Sender<Key>,
    tap_rx: Receiver<Key>,
    observers: Vec<Sender<GlowChanged>>,
    areas: Vec<Area>,
}

impl HeatKeyboard {
    /// Keyboard reading physical keys through evdev
    pub fn new() -> Self {
        Self::with_source(Box::new(EvdevSource))
    }

    /// Keyboard with a custom physical key source; tracking starts enabled
    pub fn with_source(source: Box<dyn KeySource>) -> Self {
        let (tap_tx, tap_rx) = mpsc::channel();
        let mut keyboard = Self {
            cells: Vec::new(),
            placements: Vec::new(),
            columns: 0,
            rows: ROWS.len() as u16,
            bindings: HashMap::new(),
            counts: HashMap::new(),
            track_physical: true,
            heat_map_enabled: true,
            cold: Rgb::new(18, 26, 38),
            hot: Rgb::new(126, 192, 255),
            highlight: Rgb::new(255, 65, 130),
            text: Rgb::WHITE,
            font: KeyFont::default(),
            backgrounds: HashMap::new(),
            source,
            tap: None,
            tap_tx,
            tap_rx,
            observers: Vec::new(),
            areas: Vec::new(),
        };

        for (row, specs) in ROWS.iter().enumerate() {
            let mut column = 0;
            for spec in specs.iter() {
                keyboard.add_key(row as u16, column, spec);
                column += spec.column_span;
            }
            keyboard.columns = keyboard.columns.max(column);
        }

        keyboard.refresh_heat_map();
        keyboard.install_tap();
        keyboard
    }

    fn add_key(&mut self, row: u16, column: u16, spec: &KeySpec) {
        let mut cell = KeyCell::new(spec.label, spec.key);
        cell.set_font(self.font);
        cell.set_heat_colors(self.cold, self.hot);
        cell.set_highlight_color(self.highlight);
        cell.set_base_text_color(self.text);
        if let Some(background) = self.backgrounds.get(&spec.key) {
            cell.set_background(Some(background.clone()));
        }

        let index = self.cells.len();
        self.cells.push(cell);
        self.placements.push(Placement {
            row,
            column,
            column_span: spec.column_span.max(1),
            row_span: spec.row_span.max(1),
        });
        self.bindings.entry(spec.key).or_default().push(index);
    }

    // ---- statistics ----

    /// Count one press of `key` and light up every cell bound to it.
    /// Keys without a cell are ignored.
    pub fn record_key(&mut self, key: Key) {
        let Some(indices) = self.bindings.get(&key) else {
            return;
        };
        let indices = indices.clone();

        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        debug!(key = %key, count = *count, "key recorded");

        let now = Instant::now();
        for index in indices {
            if self.cells[index].trigger_glow(now) {
                self.notify(index);
            }
        }
        self.refresh_heat_map();
    }

    /// Replace the whole count table
    pub fn set_heat_samples(&mut self, samples: HashMap<Key, u32>) {
        self.counts = samples;
        self.refresh_heat_map();
    }

    pub fn clear_statistics(&mut self) {
        self.counts.clear();
        self.refresh_heat_map();
    }

    pub fn count(&self, key: Key) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &HashMap<Key, u32> {
        &self.counts
    }

    /// Largest count in the table, at least 1
    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0).max(1)
    }

    pub fn total_presses(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    fn refresh_heat_map(&mut self) {
        let max = self.max_count();
        for (key, indices) in &self.bindings {
            let count = if self.heat_map_enabled {
                self.counts.get(key).copied().unwrap_or(0)
            } else {
                0
            };
            for &index in indices {
                let cell = &mut self.cells[index];
                cell.set_heat(count, max);
                cell.set_heat_colors(self.cold, self.hot);
            }
        }
    }

    // ---- physical keyboard ----

    pub fn track_physical_keyboard(&self) -> bool {
        self.track_physical
    }

    /// Subscribe to or release the physical key tap
    pub fn set_track_physical_keyboard(&mut self, enabled: bool) {
        if self.track_physical == enabled {
            return;
        }
        self.track_physical = enabled;
        if enabled {
            self.install_tap();
        } else {
            self.release_tap();
        }
    }

    /// Mode of the installed tap, if tracking
    pub fn tap_mode(&self) -> Option<TapMode> {
        self.tap.as_ref().map(Subscription::mode)
    }

    fn install_tap(&mut self) {
        if !self.track_physical || self.tap.is_some() {
            return;
        }
        match self.source.open(self.tap_tx.clone()) {
            Ok(subscription) => {
                info!(mode = ?subscription.mode(), "tracking physical keyboard");
                self.tap = Some(subscription);
            }
            Err(e) => warn!("failed to install physical key tap: {}", e),
        }
    }

    fn release_tap(&mut self) {
        if let Some(subscription) = self.tap.take() {
            drop(subscription);
            // Presses already queued belong to the released subscription
            while self.tap_rx.try_recv().is_ok() {}
        }
    }

    /// Record every press delivered by the tap since the last call.
    /// Returns how many presses were drained.
    pub fn pump_physical(&mut self) -> usize {
        let pending: Vec<Key> = self.tap_rx.try_iter().collect();
        if !self.track_physical {
            return 0;
        }
        let drained = pending.len();
        for key in pending {
            self.record_key(key);
        }
        drained
    }

    /// A key event from the host terminal. Counted only when tracking and the
    /// tap cannot see the hardware itself, so presses are never counted twice.
    pub fn handle_terminal_key(&mut self, code: KeyCode) -> bool {
        if !self.track_physical || self.tap_mode() != Some(TapMode::Local) {
            return false;
        }
        match Key::from_crossterm(code) {
            Some(key) if self.bindings.contains_key(&key) => {
                self.record_key(key);
                true
            }
            _ => false,
        }
    }

    // ---- appearance ----

    pub fn heat_map_enabled(&self) -> bool {
        self.heat_map_enabled
    }

    /// When disabled every cell shows the cold color; counts are kept
    pub fn set_heat_map_enabled(&mut self, enabled: bool) {
        self.heat_map_enabled = enabled;
        self.refresh_heat_map();
    }

    pub fn cold_color(&self) -> Rgb {
        self.cold
    }

    pub fn hot_color(&self) -> Rgb {
        self.hot
    }

    pub fn highlight_color(&self) -> Rgb {
        self.highlight
    }

    pub fn text_color(&self) -> Rgb {
        self.text
    }

    pub fn key_font(&self) -> KeyFont {
        self.font
    }

    pub fn set_cold_color(&mut self, color: Rgb) {
        self.cold = color;
        self.refresh_heat_map();
    }

    pub fn set_hot_color(&mut self, color: Rgb) {
        self.hot = color;
        self.refresh_heat_map();
    }

    pub fn set_highlight_color(&mut self, color: Rgb) {
        self.highlight = color;
        for cell in &mut self.cells {
            cell.set_highlight_color(color);
        }
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.text = color;
        for cell in &mut self.cells {
            cell.set_base_text_color(color);
        }
    }

    pub fn set_key_font(&mut self, font: KeyFont) {
        self.font = font;
        for cell in &mut self.cells {
            cell.set_font(font);
        }
    }

    /// Glow decay step and tick interval for every cell
    pub fn set_glow_timing(&mut self, step: f64, interval: Duration) {
        for cell in &mut self.cells {
            cell.set_glow_timing(step, interval);
        }
    }

    /// Load artwork for every cell bound to `key`. On error nothing changes.
    pub fn set_key_background_image(&mut self, key: Key, path: impl AsRef<Path>) -> Result<()> {
        let background = KeyBackground::from_path(path)?;
        debug!(key = %key, path = ?background.path(), "key background loaded");
        self.set_key_background(key, background);
        Ok(())
    }

    pub fn set_key_background(&mut self, key: Key, background: KeyBackground) {
        if let Some(indices) = self.bindings.get(&key) {
            for &index in indices {
                self.cells[index].set_background(Some(background.clone()));
            }
        }
        self.backgrounds.insert(key, background);
    }

    pub fn clear_key_background_image(&mut self, key: Key) {
        self.backgrounds.remove(&key);
        if let Some(indices) = self.bindings.get(&key) {
            for &index in indices {
                self.cells[index].set_background(None);
            }
        }
    }

    // ---- animation ----

    /// Receive a `GlowChanged` for every glow level change
    pub fn subscribe_glow(&mut self) -> Receiver<GlowChanged> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, index: usize) {
        if self.observers.is_empty() {
            return;
        }
        let event = GlowChanged {
            cell: index,
            key: self.cells[index].key(),
            level: self.cells[index].glow_level(),
        };
        self.observers.retain(|tx| tx.send(event).is_ok());
    }

    /// Advance every fading glow to `now`. Returns true if anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for index in 0..self.cells.len() {
            if self.cells[index].advance_glow(now) {
                self.notify(index);
                changed = true;
            }
        }
        changed
    }

    /// Set one cell's glow directly (clamped to 0..=1)
    pub fn set_glow_level(&mut self, index: usize, level: f64) {
        if let Some(cell) = self.cells.get_mut(index) {
            if cell.set_glow_level(level) {
                self.notify(index);
            }
        }
    }

    // ---- layout and painting ----

    pub fn cells(&self) -> &[KeyCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&KeyCell> {
        self.cells.get(index)
    }

    /// Indices of the cells bound to `key`
    pub fn cells_for(&self, key: Key) -> &[usize] {
        self.bindings.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn grid_size(&self) -> (u16, u16) {
        (self.columns, self.rows)
    }

    /// Smallest size that still shows every key, in terminal cells
    pub fn minimum_size(&self) -> (u16, u16) {
        (self.columns * 3, self.rows)
    }

    /// Preferred size with boxed keys, in terminal cells
    pub fn size_hint(&self) -> (u16, u16) {
        (self.columns * 5, self.rows * 3)
    }

    /// Place every cell inside `area`; columns and rows stretch uniformly
    pub fn layout(&mut self, area: Area) -> &[Area] {
        let columns = self.columns.max(1) as u32;
        let rows = self.rows.max(1) as u32;
        let col_edge = |c: u16| area.x + (c as u32 * area.width as u32 / columns) as u16;
        let row_edge = |r: u16| area.y + (r as u32 * area.height as u32 / rows) as u16;

        self.areas = self
            .placements
            .iter()
            .map(|p| {
                let x = col_edge(p.column);
                let y = row_edge(p.row);
                let right = col_edge(p.column + p.column_span);
                let bottom = row_edge(p.row + p.row_span);
                let span = right - x;
                let width = if span > KEY_GAP { span - KEY_GAP } else { span };
                Area::new(x, y, width, bottom - y)
            })
            .collect();
        &self.areas
    }

    /// Lay out and draw every cell
    pub fn paint(&mut self, term: &mut Terminal, area: Area) {
        self.layout(area);
        for (cell, cell_area) in self.cells.iter_mut().zip(self.areas.iter()) {
            cell.paint(term, *cell_area);
        }
    }

    /// Cell under a terminal position, from the last layout
    pub fn hit_test(&self, col: u16, row: u16) -> Option<usize> {
        self.areas.iter().position(|a| a.contains(col, row))
    }

    /// Clicking a cell is the same as pressing its key
    pub fn click(&mut self, col: u16, row: u16) -> Option<Key> {
        let key = self.cells[self.hit_test(col, row)?].key();
        self.record_key(key);
        Some(key)
    }
}

impl Default for HeatKeyboard {
    fn default() -> Self {
        Self::new()
    }
}
