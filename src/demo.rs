//! Demo host: the keyboard on the left, a control panel on the right.

use crate::colors::{PresetState, Rgb};
use crate::config::DemoConfig;
use crate::keymap::Key;
use crate::tap::TapMode;
use crate::terminal::{MouseCaptureGuard, Terminal};
use crate::widget::{Area, GlowChanged, HeatKeyboard};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::style::Color;
use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const INFO: &[&str] = &[
    "Usage:",
    "- Press keys on the real keyboard to see them glow",
    "- \"Simulate keys\" builds up the heat map quickly",
    "- \"Clear statistics\" resets the heat map",
    "- Click a key to press it",
    "",
    "Ctrl+S simulate   Ctrl+L clear",
    "Ctrl+H heat map   Ctrl+T tracking",
    "Ctrl+N colours    Ctrl+Q quit",
];

const BUTTON_HEIGHT: u16 = 3;
const PANEL_TEXT: Color = Color::Grey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Simulate,
    Clear,
    ToggleHeatMap,
    ToggleTracking,
    NextPreset,
    Quit,
}

impl Action {
    const BUTTONS: [Action; 4] = [
        Action::Simulate,
        Action::Clear,
        Action::ToggleHeatMap,
        Action::ToggleTracking,
    ];

    fn from_shortcut(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::Char('s') => Action::Simulate,
            KeyCode::Char('l') => Action::Clear,
            KeyCode::Char('h') => Action::ToggleHeatMap,
            KeyCode::Char('t') => Action::ToggleTracking,
            KeyCode::Char('n') => Action::NextPreset,
            KeyCode::Char('c') | KeyCode::Char('q') => Action::Quit,
            _ => return None,
        })
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

pub struct Demo {
    keyboard: HeatKeyboard,
    simulate: Vec<Key>,
    auto_record: Option<(Key, Duration)>,
    next_auto: Option<Instant>,
    presets: PresetState,
    glow: Receiver<GlowChanged>,
    last_key: Option<Key>,
    buttons: Vec<(Action, Area)>,
}

impl Demo {
    /// Configure `keyboard` for the demo and start the auto-record timer at `now`
    pub fn new(mut keyboard: HeatKeyboard, config: &DemoConfig, now: Instant) -> Self {
        config.keyboard.apply(&mut keyboard);
        if !config.samples.is_empty() {
            keyboard.set_heat_samples(config.samples.clone());
        }
        let glow = keyboard.subscribe_glow();
        Self {
            keyboard,
            simulate: config.simulate.clone(),
            auto_record: config.auto_record,
            next_auto: config.auto_record.map(|(_, period)| now + period),
            presets: PresetState::new(config.keyboard.preset),
            glow,
            last_key: None,
            buttons: Vec::new(),
        }
    }

    pub fn keyboard(&self) -> &HeatKeyboard {
        &self.keyboard
    }

    /// Returns true when the demo should exit
    pub fn perform(&mut self, action: Action) -> bool {
        debug!(?action, "demo action");
        match action {
            Action::Simulate => {
                for key in self.simulate.clone() {
                    self.keyboard.record_key(key);
                }
            }
            Action::Clear => self.keyboard.clear_statistics(),
            Action::ToggleHeatMap => {
                let enabled = !self.keyboard.heat_map_enabled();
                self.keyboard.set_heat_map_enabled(enabled);
            }
            Action::ToggleTracking => {
                let enabled = !self.keyboard.track_physical_keyboard();
                self.keyboard.set_track_physical_keyboard(enabled);
            }
            Action::NextPreset => {
                let preset = self.presets.next();
                self.keyboard.set_cold_color(preset.cold);
                self.keyboard.set_hot_color(preset.hot);
                self.keyboard.set_highlight_color(preset.highlight);
            }
            Action::Quit => return true,
        }
        false
    }

    /// Ctrl shortcuts drive the demo; other keys go to the keyboard
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        if event.kind == KeyEventKind::Release {
            return false;
        }
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match (event.kind, Action::from_shortcut(event.code)) {
                (KeyEventKind::Press, Some(action)) => self.perform(action),
                _ => false,
            };
        }
        // A held key repeats; each repeat is a press, as with the evdev tap
        self.keyboard.handle_terminal_key(event.code);
        false
    }

    pub fn handle_click(&mut self, col: u16, row: u16) -> bool {
        let hit = self
            .buttons
            .iter()
            .find(|(_, area)| area.contains(col, row))
            .map(|(action, _)| *action);
        match hit {
            Some(action) => self.perform(action),
            None => {
                self.keyboard.click(col, row);
                false
            }
        }
    }

    /// Timer, physical keys and glow fades due at `now`
    pub fn update(&mut self, now: Instant) {
        if let (Some((key, period)), Some(next)) = (self.auto_record, self.next_auto) {
            if now >= next {
                self.keyboard.record_key(key);
                self.next_auto = Some(now + period);
            }
        }
        self.keyboard.pump_physical();
        self.keyboard.tick(now);
        for change in self.glow.try_iter() {
            if change.level >= 1.0 {
                self.last_key = Some(change.key);
            }
        }
    }

    pub fn status_line(&self) -> String {
        let mode = match self.keyboard.tap_mode() {
            Some(TapMode::Global) => "GLOBAL",
            Some(TapMode::Local) => "LOCAL",
            None => "OFF",
        };
        let last = self.last_key.map(|k| k.name()).unwrap_or_else(|| "-".to_string());
        format!(
            "[{}]  presses: {}  max: {}  colours: {}  last: {}",
            mode,
            self.keyboard.total_presses(),
            self.keyboard.max_count(),
            self.presets.current().name,
            last
        )
    }

    fn button_label(&self, action: Action) -> String {
        match action {
            Action::Simulate => "Simulate keys".to_string(),
            Action::Clear => "Clear statistics".to_string(),
            Action::ToggleHeatMap => format!("Heat map: {}", on_off(self.keyboard.heat_map_enabled())),
            Action::ToggleTracking => {
                format!("Tracking: {}", on_off(self.keyboard.track_physical_keyboard()))
            }
            Action::NextPreset | Action::Quit => String::new(),
        }
    }

    pub fn draw(&mut self, term: &mut Terminal) {
        term.clear();
        let (width, height) = term.size();
        let (min_w, min_h) = self.keyboard.minimum_size();
        let keyboard_width = (width as u32 * 2 / 3) as u16;

        if keyboard_width < min_w + 2 || height < min_h + 3 {
            let msg = format!("Terminal too small: need {}x{}", (min_w + 2) * 3 / 2, min_h + 3);
            term.set_str(0, 0, &msg, Some(PANEL_TEXT), false);
            self.buttons.clear();
            return;
        }

        let (_, hint_h) = self.keyboard.size_hint();
        let available = height - 3;
        let keyboard_height = available.min(hint_h);
        let keyboard_area = Area::new(
            1,
            1 + (available - keyboard_height) / 2,
            keyboard_width - 2,
            keyboard_height,
        );
        self.keyboard.paint(term, keyboard_area);

        let panel_x = keyboard_width + 1;
        let panel_width = width.saturating_sub(panel_x + 1);
        for (i, line) in INFO.iter().enumerate() {
            let text: String = line.chars().take(panel_width as usize).collect();
            term.set_str(panel_x as i32, 1 + i as i32, &text, Some(PANEL_TEXT), i == 0);
        }

        let accent = self.keyboard.highlight_color();
        let mut y = 2 + INFO.len() as u16;
        self.buttons.clear();
        for action in Action::BUTTONS {
            if y + BUTTON_HEIGHT > height - 1 || panel_width < 4 {
                break;
            }
            let area = Area::new(panel_x, y, panel_width.min(28), BUTTON_HEIGHT);
            draw_button(term, area, &self.button_label(action), accent);
            self.buttons.push((action, area));
            y += BUTTON_HEIGHT;
        }

        let status: String = self.status_line().chars().take(width as usize).collect();
        term.set_str(0, height as i32 - 1, &status, Some(accent.to_color()), true);
    }
}

fn draw_button(term: &mut Terminal, area: Area, label: &str, accent: Rgb) {
    let border = Some(accent.to_color());
    let left = area.x as i32;
    let right = (area.x + area.width - 1) as i32;
    let top = area.y as i32;
    let bottom = (area.y + area.height - 1) as i32;

    for x in left + 1..right {
        term.set(x, top, '─', border, false);
        term.set(x, bottom, '─', border, false);
    }
    term.set(left, top, '┌', border, false);
    term.set(right, top, '┐', border, false);
    term.set(left, bottom, '└', border, false);
    term.set(right, bottom, '┘', border, false);
    term.set(left, top + 1, '│', border, false);
    term.set(right, top + 1, '│', border, false);

    let inner = area.width.saturating_sub(2) as usize;
    let text: String = label.chars().take(inner).collect();
    let x = left + 1 + (inner - text.chars().count()) as i32 / 2;
    term.set_str(x, top + 1, &text, Some(Color::White), true);
}

/// Run the interactive demo until Ctrl+Q / Ctrl+C
pub fn run(term: &mut Terminal, keyboard: HeatKeyboard, config: &DemoConfig) -> io::Result<()> {
    let mut demo = Demo::new(keyboard, config, Instant::now());
    let frame = Duration::from_secs_f32(config.time_step);
    let _mouse_guard = MouseCaptureGuard::enable()?;
    info!(mode = ?demo.keyboard().tap_mode(), "demo started");

    'frames: loop {
        let mut timeout = frame;
        while let Some(event) = term.poll_event(timeout)? {
            timeout = Duration::ZERO;
            let quit = match event {
                Event::Key(key) => demo.handle_key(key),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        demo.handle_click(mouse.column, mouse.row)
                    }
                    _ => false,
                },
                Event::Resize(w, h) => {
                    term.resize(w, h);
                    term.clear_screen()?;
                    false
                }
                _ => false,
            };
            if quit {
                break 'frames;
            }
        }

        demo.update(Instant::now());
        demo.draw(term);
        term.render()?;
    }

    info!(presses = demo.keyboard().total_presses(), "demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyboardConfig;
    use crate::settings::{DemoSettings, Settings};
    use crate::tap::NullSource;
    use std::collections::HashMap;

    fn demo_at(now: Instant) -> Demo {
        let keyboard = KeyboardConfig::from_settings(&Settings::default().keyboard, None);
        let config =
            DemoConfig::from_settings(keyboard, &DemoSettings::default(), HashMap::new(), 0.03).unwrap();
        Demo::new(HeatKeyboard::with_source(Box::new(NullSource)), &config, now)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn simulate_records_default_keys() {
        let mut demo = demo_at(Instant::now());
        assert!(!demo.perform(Action::Simulate));
        for name in ["A", "S", "D", "F", "Space"] {
            assert_eq!(demo.keyboard().count(Key::from_name(name).unwrap()), 1, "{}", name);
        }
        assert_eq!(demo.keyboard().total_presses(), 5);
    }

    #[test]
    fn toggles_and_clear() {
        let mut demo = demo_at(Instant::now());
        demo.perform(Action::Simulate);
        demo.perform(Action::ToggleHeatMap);
        assert!(!demo.keyboard().heat_map_enabled());
        demo.perform(Action::ToggleTracking);
        assert!(!demo.keyboard().track_physical_keyboard());
        assert_eq!(demo.keyboard().tap_mode(), None);
        demo.perform(Action::Clear);
        assert!(demo.keyboard().counts().is_empty());
    }

    #[test]
    fn next_preset_recolors_keyboard() {
        let mut demo = demo_at(Instant::now());
        let before = demo.keyboard().cold_color();
        demo.perform(Action::NextPreset);
        assert_ne!(demo.keyboard().cold_color(), before);
        assert_eq!(demo.keyboard().cold_color(), crate::colors::preset(1).cold);
    }

    #[test]
    fn timer_records_space() {
        let start = Instant::now();
        let mut demo = demo_at(start);
        demo.update(start + Duration::from_millis(1000));
        assert_eq!(demo.keyboard().count(Key::SPACE), 0);
        demo.update(start + Duration::from_millis(1500));
        assert_eq!(demo.keyboard().count(Key::SPACE), 1);
        demo.update(start + Duration::from_millis(2000));
        assert_eq!(demo.keyboard().count(Key::SPACE), 1);
        demo.update(start + Duration::from_millis(3000));
        assert_eq!(demo.keyboard().count(Key::SPACE), 2);
    }

    #[test]
    fn shortcuts_and_typed_keys() {
        let mut demo = demo_at(Instant::now());
        assert!(!demo.handle_key(ctrl('s')));
        assert_eq!(demo.keyboard().total_presses(), 5);
        assert!(!demo.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)));
        assert_eq!(demo.keyboard().count(Key::char('A')), 2);
        assert!(!demo.handle_key(ctrl('x')));
        assert!(demo.handle_key(ctrl('q')));
        assert!(demo.handle_key(ctrl('c')));
    }

    #[test]
    fn held_keys_count_every_repeat() {
        let mut demo = demo_at(Instant::now());
        let held = |kind| KeyEvent::new_with_kind(KeyCode::Char('j'), KeyModifiers::NONE, kind);
        demo.handle_key(held(KeyEventKind::Press));
        demo.handle_key(held(KeyEventKind::Repeat));
        demo.handle_key(held(KeyEventKind::Repeat));
        demo.handle_key(held(KeyEventKind::Release));
        assert_eq!(demo.keyboard().count(Key::char('J')), 3);

        let repeat = KeyEvent::new_with_kind(KeyCode::Char('s'), KeyModifiers::CONTROL, KeyEventKind::Repeat);
        demo.handle_key(repeat);
        assert_eq!(demo.keyboard().total_presses(), 3);
    }

    #[test]
    fn buttons_are_clickable_after_draw() {
        let mut demo = demo_at(Instant::now());
        let mut term = Terminal::offscreen(150, 24);
        demo.draw(&mut term);
        assert_eq!(demo.buttons.len(), 4);

        let (_, heat) = demo.buttons[2];
        assert!(!demo.handle_click(heat.x + 1, heat.y + 1));
        assert!(!demo.keyboard().heat_map_enabled());

        demo.draw(&mut term);
        let panel = (0..24).map(|y| term.row_text(y)).collect::<Vec<_>>().join("\n");
        assert!(panel.contains("Heat map: off"));
        assert!(panel.contains("Simulate keys"));
        assert!(term.row_text(23).starts_with("[LOCAL]"));
    }

    #[test]
    fn status_reports_last_key() {
        let start = Instant::now();
        let mut demo = demo_at(start);
        demo.keyboard.record_key(Key::char('Q'));
        demo.update(start);
        assert!(demo.status_line().contains("last: Q"));
        assert!(demo.status_line().contains("presses: 1"));
    }

    #[test]
    fn tiny_terminal_shows_message() {
        let mut demo = demo_at(Instant::now());
        let mut term = Terminal::offscreen(40, 5);
        demo.draw(&mut term);
        assert!(term.row_text(0).starts_with("Terminal too small"));
        assert!(demo.buttons.is_empty());
    }
}
