use heapless::Vec;

use crate::error::EditError;

/// Key codes for special keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Backspace,
    Enter,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    CtrlC,
    Char(u8),
}

/// State machine for parsing ANSI escape sequences
///
/// Any byte after ESC moves to `CsiSeen`, not only `[`. Some non-CSI
/// sequences are therefore read as cursor keys; the wire behavior is kept
/// as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeState {
    Idle,
    EscapeSeen,
    CsiSeen,
}

/// Line buffer, cursor and key decoder.
///
/// Holds at most `BUF_SIZE - 1` bytes; the cursor stays within
/// `0..=len`. Only printable ASCII is ever stored, so the line is always
/// valid UTF-8.
pub struct Terminal<const BUF_SIZE: usize> {
    buffer: Vec<u8, BUF_SIZE>,
    cursor_pos: usize,
    escape_state: EscapeState,
    after_cr: bool,
}

impl<const BUF_SIZE: usize> Default for Terminal<BUF_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BUF_SIZE: usize> Terminal<BUF_SIZE> {
    /// Create an empty line
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor_pos: 0,
            escape_state: EscapeState::Idle,
            after_cr: false,
        }
    }

    /// Longest line the buffer accepts
    pub const fn capacity() -> usize {
        BUF_SIZE.saturating_sub(1)
    }

    /// Process a single byte of input, handling ANSI escape sequences
    ///
    /// A LF directly after a CR is swallowed so CRLF submits once.
    pub fn process_byte(&mut self, byte: u8) -> Option<KeyCode> {
        let after_cr = core::mem::replace(&mut self.after_cr, false);
        match self.escape_state {
            EscapeState::Idle => match byte {
                b'\r' => {
                    self.after_cr = true;
                    Some(KeyCode::Enter)
                }
                b'\n' if after_cr => None,
                b'\n' => Some(KeyCode::Enter),
                0x08 | 0x7F => Some(KeyCode::Backspace),
                0x03 => Some(KeyCode::CtrlC),
                b'\t' => Some(KeyCode::Tab),
                0x1B => {
                    self.escape_state = EscapeState::EscapeSeen;
                    None
                }
                0x20..=0x7E => Some(KeyCode::Char(byte)),
                _ => None,
            },
            EscapeState::EscapeSeen => {
                log::trace!("escape introducer {:#04x}", byte);
                self.escape_state = EscapeState::CsiSeen;
                None
            }
            EscapeState::CsiSeen => {
                self.escape_state = EscapeState::Idle;
                match byte {
                    b'A' => Some(KeyCode::ArrowUp),
                    b'B' => Some(KeyCode::ArrowDown),
                    b'C' => Some(KeyCode::ArrowRight),
                    b'D' => Some(KeyCode::ArrowLeft),
                    _ => {
                        log::trace!("ignored escape final {:#04x}", byte);
                        None
                    }
                }
            }
        }
    }

    /// Current decoder state
    pub fn escape_state(&self) -> EscapeState {
        self.escape_state
    }

    /// The current line
    pub fn line(&self) -> &str {
        core::str::from_utf8(&self.buffer).unwrap_or("")
    }

    /// The part of the line right of the cursor
    pub fn tail(&self) -> &str {
        self.line().get(self.cursor_pos..).unwrap_or("")
    }

    /// Length of the line in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when the line is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the current cursor position
    pub fn cursor_position(&self) -> usize {
        self.cursor_pos
    }

    /// True when the cursor sits after the last byte
    pub fn at_end(&self) -> bool {
        self.cursor_pos == self.buffer.len()
    }

    /// Insert a byte at the cursor and advance past it
    pub fn insert(&mut self, byte: u8) -> Result<(), EditError> {
        if self.buffer.len() >= Self::capacity() {
            return Err(EditError::BufferFull);
        }
        if self.at_end() {
            self.buffer.push(byte).map_err(|_| EditError::BufferFull)?;
        } else {
            self.buffer
                .insert(self.cursor_pos, byte)
                .map_err(|_| EditError::BufferFull)?;
        }
        self.cursor_pos += 1;
        Ok(())
    }

    /// Remove the byte left of the cursor. Returns false when there is none.
    pub fn backspace(&mut self) -> bool {
        if self.cursor_pos == 0 {
            return false;
        }
        self.buffer.remove(self.cursor_pos - 1);
        self.cursor_pos -= 1;
        true
    }

    /// Move the cursor one byte left, if possible
    pub fn cursor_left(&mut self) -> bool {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor one byte right, if possible
    pub fn cursor_right(&mut self) -> bool {
        if self.cursor_pos < self.buffer.len() {
            self.cursor_pos += 1;
            true
        } else {
            false
        }
    }

    /// Add text at the end of the line and move the cursor there.
    ///
    /// Nothing changes when the text does not fit.
    pub fn append(&mut self, text: &str) -> Result<(), EditError> {
        if self.buffer.len() + text.len() > Self::capacity() {
            return Err(EditError::BufferFull);
        }
        self.buffer
            .extend_from_slice(text.as_bytes())
            .map_err(|_| EditError::BufferFull)?;
        self.cursor_pos = self.buffer.len();
        Ok(())
    }

    /// Replace the line (history recall) and move the cursor to its end
    pub fn set_buffer(&mut self, content: &str) -> Result<(), EditError> {
        if content.len() > Self::capacity() {
            return Err(EditError::BufferFull);
        }
        self.clear_buffer();
        self.append(content)
    }

    /// Clear the current buffer
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.cursor_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<const N: usize>(terminal: &mut Terminal<N>, bytes: &[u8]) -> alloc::vec::Vec<KeyCode> {
        bytes.iter().filter_map(|&b| terminal.process_byte(b)).collect()
    }

    fn type_str<const N: usize>(terminal: &mut Terminal<N>, text: &str) {
        for b in text.bytes() {
            terminal.insert(b).unwrap();
        }
    }

    #[test]
    fn test_decode_control_bytes() {
        let mut terminal = Terminal::<16>::new();
        assert_eq!(
            feed(&mut terminal, b"a\x08\x7f\t\x03"),
            [
                KeyCode::Char(b'a'),
                KeyCode::Backspace,
                KeyCode::Backspace,
                KeyCode::Tab,
                KeyCode::CtrlC
            ]
        );
        assert!(feed(&mut terminal, b"\x01\x80").is_empty());
    }

    #[test]
    fn test_decode_arrows() {
        let mut terminal = Terminal::<16>::new();
        assert_eq!(
            feed(&mut terminal, b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            [
                KeyCode::ArrowUp,
                KeyCode::ArrowDown,
                KeyCode::ArrowRight,
                KeyCode::ArrowLeft
            ]
        );
        assert_eq!(terminal.escape_state(), EscapeState::Idle);
    }

    #[test]
    fn test_any_introducer_reaches_csi() {
        let mut terminal = Terminal::<16>::new();
        assert_eq!(terminal.process_byte(0x1b), None);
        assert_eq!(terminal.escape_state(), EscapeState::EscapeSeen);
        assert_eq!(terminal.process_byte(b'O'), None);
        assert_eq!(terminal.escape_state(), EscapeState::CsiSeen);
        assert_eq!(terminal.process_byte(b'D'), Some(KeyCode::ArrowLeft));
        assert_eq!(feed(&mut terminal, b"\x1b[Zx"), [KeyCode::Char(b'x')]);
    }

    #[test]
    fn test_crlf_submits_once() {
        let mut terminal = Terminal::<16>::new();
        assert_eq!(feed(&mut terminal, b"\r\n"), [KeyCode::Enter]);
        assert_eq!(feed(&mut terminal, b"\n\n"), [KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(feed(&mut terminal, b"\r\r"), [KeyCode::Enter, KeyCode::Enter]);
    }

    #[test]
    fn test_mid_line_insert_and_backspace() {
        let mut terminal = Terminal::<16>::new();
        type_str(&mut terminal, "abc");
        terminal.cursor_left();
        terminal.cursor_left();
        assert_eq!(terminal.cursor_position(), 1);

        terminal.insert(b'X').unwrap();
        assert_eq!(terminal.line(), "aXbc");
        assert_eq!(terminal.cursor_position(), 2);
        assert_eq!(terminal.tail(), "bc");

        assert!(terminal.backspace());
        assert_eq!(terminal.line(), "abc");
        assert_eq!(terminal.cursor_position(), 1);
    }

    #[test]
    fn test_cursor_bounds() {
        let mut terminal = Terminal::<16>::new();
        assert!(!terminal.cursor_left());
        assert!(!terminal.cursor_right());
        assert!(!terminal.backspace());
        type_str(&mut terminal, "ab");
        assert!(!terminal.cursor_right());
        assert!(terminal.cursor_left());
        assert!(terminal.cursor_left());
        assert!(!terminal.cursor_left());
        assert!(!terminal.backspace());
        assert_eq!(terminal.line(), "ab");
    }

    #[test]
    fn test_buffer_full() {
        let mut terminal = Terminal::<4>::new();
        type_str(&mut terminal, "abc");
        assert_eq!(terminal.insert(b'd'), Err(EditError::BufferFull));
        assert_eq!(terminal.line(), "abc");
        terminal.cursor_left();
        assert_eq!(terminal.insert(b'd'), Err(EditError::BufferFull));
        assert_eq!(terminal.cursor_position(), 2);
    }

    #[test]
    fn test_append_and_set_buffer() {
        let mut terminal = Terminal::<8>::new();
        type_str(&mut terminal, "ab");
        terminal.cursor_left();
        terminal.append("cd").unwrap();
        assert_eq!(terminal.line(), "abcd");
        assert!(terminal.at_end());
        assert_eq!(terminal.append("xyzw"), Err(EditError::BufferFull));
        assert_eq!(terminal.line(), "abcd");

        terminal.set_buffer("history").unwrap();
        assert_eq!(terminal.cursor_position(), 7);
        assert_eq!(terminal.set_buffer("too long!"), Err(EditError::BufferFull));
        assert_eq!(terminal.line(), "history");
    }
}
