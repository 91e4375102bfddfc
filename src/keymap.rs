//! Logical key codes and the on-screen keyboard layout (US ANSI, six rows)

use crossterm::event::{KeyCode, ModifierKeyCode};
use std::fmt;

/// Logical key identifier, independent of which cells display it.
///
/// Printable keys use the upper-case ASCII value of their base character,
/// non-printing keys live in the `0x0100_00xx` range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub u32);

const SPECIAL: u32 = 0x0100_0000;

impl Key {
    pub const ESCAPE: Key = Key(SPECIAL);
    pub const TAB: Key = Key(SPECIAL + 0x01);
    pub const BACKSPACE: Key = Key(SPECIAL + 0x03);
    pub const ENTER: Key = Key(SPECIAL + 0x04);
    pub const INSERT: Key = Key(SPECIAL + 0x06);
    pub const DELETE: Key = Key(SPECIAL + 0x07);
    pub const PAUSE: Key = Key(SPECIAL + 0x08);
    pub const PRINT: Key = Key(SPECIAL + 0x09);
    pub const LEFT: Key = Key(SPECIAL + 0x12);
    pub const UP: Key = Key(SPECIAL + 0x13);
    pub const RIGHT: Key = Key(SPECIAL + 0x14);
    pub const DOWN: Key = Key(SPECIAL + 0x15);
    pub const SHIFT: Key = Key(SPECIAL + 0x20);
    pub const CONTROL: Key = Key(SPECIAL + 0x21);
    pub const META: Key = Key(SPECIAL + 0x22);
    pub const ALT: Key = Key(SPECIAL + 0x23);
    pub const CAPS_LOCK: Key = Key(SPECIAL + 0x24);
    pub const SCROLL_LOCK: Key = Key(SPECIAL + 0x26);
    pub const MENU: Key = Key(SPECIAL + 0x55);

    pub const SPACE: Key = Key(0x20);
    pub const APOSTROPHE: Key = Key(0x27);
    pub const COMMA: Key = Key(0x2c);
    pub const MINUS: Key = Key(0x2d);
    pub const PERIOD: Key = Key(0x2e);
    pub const SLASH: Key = Key(0x2f);
    pub const SEMICOLON: Key = Key(0x3b);
    pub const EQUAL: Key = Key(0x3d);
    pub const BRACKET_LEFT: Key = Key(0x5b);
    pub const BACKSLASH: Key = Key(0x5c);
    pub const BRACKET_RIGHT: Key = Key(0x5d);
    pub const GRAVE: Key = Key(0x60);

    /// F1..=F12
    pub const fn function(n: u8) -> Key {
        Key(SPECIAL + 0x2f + n as u32)
    }

    /// Letter or digit key; letters are case-folded
    pub const fn char(c: char) -> Key {
        Key(c.to_ascii_uppercase() as u32)
    }

    /// Map a typed character to the key that produces it on a US layout
    pub fn from_char(c: char) -> Option<Key> {
        let base = match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => return Some(Key::char(c)),
            ' ' => ' ',
            '!' => '1',
            '@' => '2',
            '#' => '3',
            '$' => '4',
            '%' => '5',
            '^' => '6',
            '&' => '7',
            '*' => '8',
            '(' => '9',
            ')' => '0',
            '_' => '-',
            '+' => '=',
            '{' => '[',
            '}' => ']',
            '|' => '\\',
            ':' => ';',
            '"' => '\'',
            '<' => ',',
            '>' => '.',
            '?' => '/',
            '~' => '`',
            '`' | '-' | '=' | '[' | ']' | '\\' | ';' | '\'' | ',' | '.' | '/' => c,
            _ => return None,
        };
        Some(Key(base as u32))
    }

    /// Stable name used by settings, CLI arguments and listings
    pub fn name(self) -> String {
        if let Some((_, name)) = NAMES.iter().find(|(key, _)| *key == self) {
            return (*name).to_string();
        }
        match char::from_u32(self.0) {
            Some(c) if c.is_ascii_graphic() => c.to_string(),
            _ => format!("0x{:x}", self.0),
        }
    }

    /// Parse a key name (case-insensitive), a single character, or a raw decimal code
    pub fn from_name(name: &str) -> Option<Key> {
        let name = name.trim();
        if let Some((key, _)) = NAMES.iter().find(|(_, n)| n.eq_ignore_ascii_case(name)) {
            return Some(*key);
        }
        if let Some((_, key)) = ALIASES.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            return Some(*key);
        }
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Key::from_char(c);
        }
        name.parse::<u32>().ok().map(Key)
    }

    /// Translate a terminal key event code
    pub fn from_crossterm(code: KeyCode) -> Option<Key> {
        Some(match code {
            KeyCode::Char(c) => return Key::from_char(c),
            KeyCode::Esc => Key::ESCAPE,
            KeyCode::Tab | KeyCode::BackTab => Key::TAB,
            KeyCode::Backspace => Key::BACKSPACE,
            KeyCode::Enter => Key::ENTER,
            KeyCode::Insert => Key::INSERT,
            KeyCode::Delete => Key::DELETE,
            KeyCode::Pause => Key::PAUSE,
            KeyCode::PrintScreen => Key::PRINT,
            KeyCode::ScrollLock => Key::SCROLL_LOCK,
            KeyCode::CapsLock => Key::CAPS_LOCK,
            KeyCode::Menu => Key::MENU,
            KeyCode::Left => Key::LEFT,
            KeyCode::Right => Key::RIGHT,
            KeyCode::Up => Key::UP,
            KeyCode::Down => Key::DOWN,
            KeyCode::F(n @ 1..=12) => Key::function(n),
            KeyCode::Modifier(m) => match m {
                ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Key::SHIFT,
                ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Key::CONTROL,
                ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Key::ALT,
                ModifierKeyCode::LeftSuper | ModifierKeyCode::RightSuper => Key::META,
                _ => return None,
            },
            _ => return None,
        })
    }

    /// Translate an evdev key; left and right modifiers collapse to one code
    pub fn from_evdev(key: evdev::Key) -> Option<Key> {
        use evdev::Key as Ev;
        Some(match key {
            Ev::KEY_ESC => Key::ESCAPE,
            Ev::KEY_1 => Key::char('1'), Ev::KEY_2 => Key::char('2'), Ev::KEY_3 => Key::char('3'),
            Ev::KEY_4 => Key::char('4'), Ev::KEY_5 => Key::char('5'), Ev::KEY_6 => Key::char('6'),
            Ev::KEY_7 => Key::char('7'), Ev::KEY_8 => Key::char('8'), Ev::KEY_9 => Key::char('9'),
            Ev::KEY_0 => Key::char('0'),
            Ev::KEY_MINUS => Key::MINUS, Ev::KEY_EQUAL => Key::EQUAL, Ev::KEY_BACKSPACE => Key::BACKSPACE,
            Ev::KEY_TAB => Key::TAB,
            Ev::KEY_Q => Key::char('Q'), Ev::KEY_W => Key::char('W'), Ev::KEY_E => Key::char('E'),
            Ev::KEY_R => Key::char('R'), Ev::KEY_T => Key::char('T'), Ev::KEY_Y => Key::char('Y'),
            Ev::KEY_U => Key::char('U'), Ev::KEY_I => Key::char('I'), Ev::KEY_O => Key::char('O'),
            Ev::KEY_P => Key::char('P'),
            Ev::KEY_LEFTBRACE => Key::BRACKET_LEFT, Ev::KEY_RIGHTBRACE => Key::BRACKET_RIGHT,
            Ev::KEY_BACKSLASH => Key::BACKSLASH,
            Ev::KEY_CAPSLOCK => Key::CAPS_LOCK,
            Ev::KEY_A => Key::char('A'), Ev::KEY_S => Key::char('S'), Ev::KEY_D => Key::char('D'),
            Ev::KEY_F => Key::char('F'), Ev::KEY_G => Key::char('G'), Ev::KEY_H => Key::char('H'),
            Ev::KEY_J => Key::char('J'), Ev::KEY_K => Key::char('K'), Ev::KEY_L => Key::char('L'),
            Ev::KEY_SEMICOLON => Key::SEMICOLON, Ev::KEY_APOSTROPHE => Key::APOSTROPHE,
            Ev::KEY_ENTER | Ev::KEY_KPENTER => Key::ENTER,
            Ev::KEY_LEFTSHIFT | Ev::KEY_RIGHTSHIFT => Key::SHIFT,
            Ev::KEY_Z => Key::char('Z'), Ev::KEY_X => Key::char('X'), Ev::KEY_C => Key::char('C'),
            Ev::KEY_V => Key::char('V'), Ev::KEY_B => Key::char('B'), Ev::KEY_N => Key::char('N'),
            Ev::KEY_M => Key::char('M'),
            Ev::KEY_COMMA => Key::COMMA, Ev::KEY_DOT => Key::PERIOD, Ev::KEY_SLASH => Key::SLASH,
            Ev::KEY_LEFTCTRL | Ev::KEY_RIGHTCTRL => Key::CONTROL,
            Ev::KEY_LEFTMETA | Ev::KEY_RIGHTMETA => Key::META,
            Ev::KEY_LEFTALT | Ev::KEY_RIGHTALT => Key::ALT,
            Ev::KEY_SPACE => Key::SPACE,
            Ev::KEY_GRAVE => Key::GRAVE,
            Ev::KEY_F1 => Key::function(1), Ev::KEY_F2 => Key::function(2),
            Ev::KEY_F3 => Key::function(3), Ev::KEY_F4 => Key::function(4),
            Ev::KEY_F5 => Key::function(5), Ev::KEY_F6 => Key::function(6),
            Ev::KEY_F7 => Key::function(7), Ev::KEY_F8 => Key::function(8),
            Ev::KEY_F9 => Key::function(9), Ev::KEY_F10 => Key::function(10),
            Ev::KEY_F11 => Key::function(11), Ev::KEY_F12 => Key::function(12),
            Ev::KEY_SYSRQ => Key::PRINT,
            Ev::KEY_SCROLLLOCK => Key::SCROLL_LOCK,
            Ev::KEY_PAUSE => Key::PAUSE,
            Ev::KEY_INSERT => Key::INSERT,
            Ev::KEY_DELETE => Key::DELETE,
            Ev::KEY_COMPOSE => Key::MENU,
            Ev::KEY_LEFT => Key::LEFT, Ev::KEY_UP => Key::UP,
            Ev::KEY_RIGHT => Key::RIGHT, Ev::KEY_DOWN => Key::DOWN,
            _ => return None,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

const NAMES: &[(Key, &str)] = &[
    (Key::ESCAPE, "Escape"),
    (Key::TAB, "Tab"),
    (Key::BACKSPACE, "Backspace"),
    (Key::ENTER, "Enter"),
    (Key::INSERT, "Insert"),
    (Key::DELETE, "Delete"),
    (Key::PAUSE, "Pause"),
    (Key::PRINT, "Print"),
    (Key::LEFT, "Left"),
    (Key::UP, "Up"),
    (Key::RIGHT, "Right"),
    (Key::DOWN, "Down"),
    (Key::SHIFT, "Shift"),
    (Key::CONTROL, "Control"),
    (Key::META, "Meta"),
    (Key::ALT, "Alt"),
    (Key::CAPS_LOCK, "CapsLock"),
    (Key::SCROLL_LOCK, "ScrollLock"),
    (Key::MENU, "Menu"),
    (Key::SPACE, "Space"),
    (Key::function(1), "F1"),
    (Key::function(2), "F2"),
    (Key::function(3), "F3"),
    (Key::function(4), "F4"),
    (Key::function(5), "F5"),
    (Key::function(6), "F6"),
    (Key::function(7), "F7"),
    (Key::function(8), "F8"),
    (Key::function(9), "F9"),
    (Key::function(10), "F10"),
    (Key::function(11), "F11"),
    (Key::function(12), "F12"),
];

const ALIASES: &[(&str, Key)] = &[
    ("Esc", Key::ESCAPE),
    ("Return", Key::ENTER),
    ("Bksp", Key::BACKSPACE),
    ("Ctrl", Key::CONTROL),
    ("Win", Key::META),
    ("Super", Key::META),
    ("Caps", Key::CAPS_LOCK),
    ("PrtSc", Key::PRINT),
    ("ScrLk", Key::SCROLL_LOCK),
];

/// One key cap of the layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeySpec {
    pub label: &'static str,
    pub key: Key,
    pub column_span: u16,
    pub row_span: u16,
}

const fn k(label: &'static str, key: Key) -> KeySpec {
    KeySpec { label, key, column_span: 1, row_span: 1 }
}

const fn wide(label: &'static str, key: Key, column_span: u16) -> KeySpec {
    KeySpec { label, key, column_span, row_span: 1 }
}

pub const FUNCTION_ROW: &[KeySpec] = &[
    k("Esc", Key::ESCAPE),
    k("F1", Key::function(1)), k("F2", Key::function(2)), k("F3", Key::function(3)), k("F4", Key::function(4)),
    k("F5", Key::function(5)), k("F6", Key::function(6)), k("F7", Key::function(7)), k("F8", Key::function(8)),
    k("F9", Key::function(9)), k("F10", Key::function(10)), k("F11", Key::function(11)), k("F12", Key::function(12)),
    k("PrtSc", Key::PRINT), k("ScrLk", Key::SCROLL_LOCK), k("Pause", Key::PAUSE),
    k("Insert", Key::INSERT), k("Delete", Key::DELETE),
];

pub const NUMBER_ROW: &[KeySpec] = &[
    k("`", Key::GRAVE),
    k("1", Key::char('1')), k("2", Key::char('2')), k("3", Key::char('3')), k("4", Key::char('4')),
    k("5", Key::char('5')), k("6", Key::char('6')), k("7", Key::char('7')), k("8", Key::char('8')),
    k("9", Key::char('9')), k("0", Key::char('0')),
    k("-", Key::MINUS), k("=", Key::EQUAL),
    wide("Backspace", Key::BACKSPACE, 2),
];

pub const QWERTY_ROW: &[KeySpec] = &[
    wide("Tab", Key::TAB, 2),
    k("Q", Key::char('Q')), k("W", Key::char('W')), k("E", Key::char('E')), k("R", Key::char('R')),
    k("T", Key::char('T')), k("Y", Key::char('Y')), k("U", Key::char('U')), k("I", Key::char('I')),
    k("O", Key::char('O')), k("P", Key::char('P')),
    k("[", Key::BRACKET_LEFT), k("]", Key::BRACKET_RIGHT),
    wide("\\", Key::BACKSLASH, 2),
];

pub const HOME_ROW: &[KeySpec] = &[
    wide("Caps", Key::CAPS_LOCK, 2),
    k("A", Key::char('A')), k("S", Key::char('S')), k("D", Key::char('D')), k("F", Key::char('F')),
    k("G", Key::char('G')), k("H", Key::char('H')), k("J", Key::char('J')), k("K", Key::char('K')),
    k("L", Key::char('L')),
    k(";", Key::SEMICOLON), k("'", Key::APOSTROPHE),
    wide("Enter", Key::ENTER, 3),
];

pub const LETTER_ROW: &[KeySpec] = &[
    wide("Shift", Key::SHIFT, 3),
    k("Z", Key::char('Z')), k("X", Key::char('X')), k("C", Key::char('C')), k("V", Key::char('V')),
    k("B", Key::char('B')), k("N", Key::char('N')), k("M", Key::char('M')),
    k(",", Key::COMMA), k(".", Key::PERIOD), k("/", Key::SLASH),
    wide("Shift", Key::SHIFT, 3),
];

pub const MODIFIER_ROW: &[KeySpec] = &[
    wide("Ctrl", Key::CONTROL, 2),
    k("Win", Key::META),
    k("Alt", Key::ALT),
    wide("Space", Key::SPACE, 6),
    k("Alt", Key::ALT),
    k("Win", Key::META),
    k("Menu", Key::MENU),
    wide("Ctrl", Key::CONTROL, 2),
    k("←", Key::LEFT), k("↑", Key::UP), k("↓", Key::DOWN), k("→", Key::RIGHT),
];

/// Rows top to bottom
pub const ROWS: [&[KeySpec]; 6] = [FUNCTION_ROW, NUMBER_ROW, QWERTY_ROW, HOME_ROW, LETTER_ROW, MODIFIER_ROW];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_codes_are_ascii() {
        assert_eq!(Key::char('a'), Key(65));
        assert_eq!(Key::char('S'), Key(83));
        assert_eq!(Key::SPACE, Key(32));
        assert_eq!(Key::function(1), Key(0x0100_0030));
        assert_eq!(Key::function(12), Key(0x0100_003b));
    }

    #[test]
    fn shifted_characters_map_to_base_key() {
        assert_eq!(Key::from_char('!'), Some(Key::char('1')));
        assert_eq!(Key::from_char('{'), Some(Key::BRACKET_LEFT));
        assert_eq!(Key::from_char('"'), Some(Key::APOSTROPHE));
        assert_eq!(Key::from_char('~'), Some(Key::GRAVE));
        assert_eq!(Key::from_char('é'), None);
    }

    #[test]
    fn names_round_trip() {
        for row in ROWS {
            for spec in row {
                assert_eq!(Key::from_name(&spec.key.name()), Some(spec.key), "{}", spec.label);
            }
        }
    }

    #[test]
    fn from_name_accepts_aliases_and_raw_codes() {
        assert_eq!(Key::from_name("esc"), Some(Key::ESCAPE));
        assert_eq!(Key::from_name("Ctrl"), Some(Key::CONTROL));
        assert_eq!(Key::from_name("space"), Some(Key::SPACE));
        assert_eq!(Key::from_name("f7"), Some(Key::function(7)));
        assert_eq!(Key::from_name("q"), Some(Key::char('Q')));
        assert_eq!(Key::from_name("65"), Some(Key(65)));
        assert_eq!(Key::from_name("NotAKey"), None);
    }

    #[test]
    fn crossterm_translation() {
        assert_eq!(Key::from_crossterm(KeyCode::Char('a')), Some(Key::char('A')));
        assert_eq!(Key::from_crossterm(KeyCode::Char('?')), Some(Key::SLASH));
        assert_eq!(Key::from_crossterm(KeyCode::F(5)), Some(Key::function(5)));
        assert_eq!(Key::from_crossterm(KeyCode::F(13)), None);
        assert_eq!(
            Key::from_crossterm(KeyCode::Modifier(ModifierKeyCode::RightShift)),
            Some(Key::SHIFT)
        );
    }

    #[test]
    fn evdev_modifiers_collapse() {
        assert_eq!(Key::from_evdev(evdev::Key::KEY_LEFTSHIFT), Some(Key::SHIFT));
        assert_eq!(Key::from_evdev(evdev::Key::KEY_RIGHTSHIFT), Some(Key::SHIFT));
        assert_eq!(Key::from_evdev(evdev::Key::KEY_A), Some(Key::char('A')));
        assert_eq!(Key::from_evdev(evdev::Key::KEY_VOLUMEUP), None);
    }

    #[test]
    fn rows_have_expected_widths() {
        let widths: Vec<u16> = ROWS
            .iter()
            .map(|row| row.iter().map(|s| s.column_span).sum())
            .collect();
        assert_eq!(widths, vec![18, 15, 16, 16, 16, 19]);
    }

    #[test]
    fn shift_is_shared_by_two_cells() {
        let shift_count = ROWS.iter().flat_map(|r| r.iter()).filter(|s| s.key == Key::SHIFT).count();
        assert_eq!(shift_count, 2);
    }
}
