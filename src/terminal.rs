use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event},
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

/// Terminal abstraction for rendering
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    alternate_screen: bool,
}

/// A single cell in the terminal buffer
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            bold: false,
            italic: false,
        }
    }
}

impl Terminal {
    /// Initialize the terminal for drawing
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        let (width, height) = size()?;

        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
        }

        let mut term = Self::offscreen(width, height);
        term.alternate_screen = alternate_screen;
        Ok(term)
    }

    /// Buffer-only terminal of a fixed size (print mode and tests)
    pub fn offscreen(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            alternate_screen: false,
        }
    }

    /// Get terminal dimensions
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Reallocate the buffer after the window changed size
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            for cell in row {
                *cell = Cell::default();
            }
        }
    }

    /// Clear the actual terminal
    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(())
    }

    /// Set a character at position with optional color
    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        self.set_cell(x, y, Cell { ch, fg, bold, ..Cell::default() });
    }

    /// Set a character with both foreground and background colors
    pub fn set_with_bg(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Option<Color>,
        bg: Option<Color>,
        bold: bool,
    ) {
        self.set_cell(x, y, Cell { ch, fg, bg, bold, italic: false });
    }

    /// Store a fully styled cell; out-of-bounds writes are dropped
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = cell;
        }
    }

    /// Set a string starting at position
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    /// Read back a buffered cell
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.buffer.get(y as usize)?.get(x as usize)
    }

    /// Text of one buffer row without styling
    pub fn row_text(&self, y: u16) -> String {
        self.buffer
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Render the entire buffer to screen
    pub fn render(&self) -> io::Result<()> {
        let mut stdout = stdout();

        for (y, row) in self.buffer.iter().enumerate() {
            queue!(stdout, MoveTo(0, y as u16))?;

            for cell in row {
                if cell.bold {
                    queue!(stdout, SetAttribute(Attribute::Bold))?;
                }
                if cell.italic {
                    queue!(stdout, SetAttribute(Attribute::Italic))?;
                }
                if let Some(color) = cell.fg {
                    queue!(stdout, SetForegroundColor(color))?;
                }
                if let Some(color) = cell.bg {
                    queue!(stdout, SetBackgroundColor(color))?;
                }

                queue!(stdout, Print(cell.ch))?;

                if cell.fg.is_some() || cell.bg.is_some() {
                    queue!(stdout, ResetColor)?;
                }
                if cell.bold || cell.italic {
                    queue!(stdout, SetAttribute(Attribute::Reset))?;
                }
            }
        }

        stdout.flush()?;
        Ok(())
    }

    /// Poll for the next input event, waiting at most `timeout`
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if poll(timeout)? {
            return Ok(Some(read()?));
        }
        Ok(None)
    }

    /// Print buffer to stdout with ANSI colors (for print mode)
    pub fn print_to_stdout(&self) {
        let mut out = String::new();
        for row in &self.buffer {
            for cell in row {
                if cell.ch == ' ' && cell.bg.is_none() {
                    out.push(' ');
                    continue;
                }

                if cell.bold {
                    out.push_str("\x1b[1m");
                }
                if cell.italic {
                    out.push_str("\x1b[3m");
                }
                if let Some(code) = cell.fg.and_then(|c| sgr_color(c, false)) {
                    out.push_str(&code);
                }
                if let Some(code) = cell.bg.and_then(|c| sgr_color(c, true)) {
                    out.push_str(&code);
                }

                out.push(cell.ch);
                out.push_str("\x1b[0m");
            }
            out.push('\n');
        }
        print!("{}", out);
    }
}

/// ANSI SGR sequence selecting `color` as foreground or background
fn sgr_color(color: Color, background: bool) -> Option<String> {
    let base = if background { 40 } else { 30 };
    let extended = if background { 48 } else { 38 };
    let code = match color {
        Color::Rgb { r, g, b } => return Some(format!("\x1b[{};2;{};{};{}m", extended, r, g, b)),
        Color::AnsiValue(v) => return Some(format!("\x1b[{};5;{}m", extended, v)),
        // Standard colors (0-7)
        Color::Black => base,
        Color::DarkRed => base + 1,
        Color::DarkGreen => base + 2,
        Color::DarkYellow => base + 3,
        Color::DarkBlue => base + 4,
        Color::DarkMagenta => base + 5,
        Color::DarkCyan => base + 6,
        Color::Grey => base + 7,
        // Bright colors (8-15)
        Color::DarkGrey => base + 60,
        Color::Red => base + 61,
        Color::Green => base + 62,
        Color::Yellow => base + 63,
        Color::Blue => base + 64,
        Color::Magenta => base + 65,
        Color::Cyan => base + 66,
        Color::White => base + 67,
        _ => return None,
    };
    Some(format!("\x1b[{}m", code))
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// Enables mouse reporting for as long as it lives
pub struct MouseCaptureGuard;

impl MouseCaptureGuard {
    pub fn enable() -> io::Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for MouseCaptureGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut term = Terminal::offscreen(4, 2);
        term.set(-1, 0, 'x', None, false);
        term.set(4, 0, 'x', None, false);
        term.set(0, 2, 'x', None, false);
        assert_eq!(term.row_text(0), "    ");
        assert_eq!(term.row_text(1), "    ");
    }

    #[test]
    fn set_with_bg_keeps_both_colors() {
        let mut term = Terminal::offscreen(3, 1);
        term.set_with_bg(1, 0, '▀', Some(Color::Red), Some(Color::Blue), false);
        let cell = term.cell(1, 0).unwrap();
        assert_eq!(cell.fg, Some(Color::Red));
        assert_eq!(cell.bg, Some(Color::Blue));
    }

    #[test]
    fn resize_and_clear_reset_the_buffer() {
        let mut term = Terminal::offscreen(2, 2);
        term.set_str(0, 0, "ab", None, true);
        term.clear();
        assert_eq!(term.cell(0, 0), Some(&Cell::default()));
        term.resize(5, 3);
        assert_eq!(term.size(), (5, 3));
        assert_eq!(term.row_text(2).len(), 5);
    }

    #[test]
    fn sgr_codes() {
        assert_eq!(
            sgr_color(Color::Rgb { r: 1, g: 2, b: 3 }, true).as_deref(),
            Some("\x1b[48;2;1;2;3m")
        );
        assert_eq!(sgr_color(Color::White, false).as_deref(), Some("\x1b[97m"));
        assert_eq!(sgr_color(Color::DarkRed, true).as_deref(), Some("\x1b[41m"));
    }
}
