use core::fmt;

use heapless::{String, Vec};

use crate::config::OUTPUT_BUFFER_SIZE;

/// Destination for everything the shell prints.
///
/// Writes are synchronous and may happen many times per input byte
/// (echo, escape sequences, redraws). Because `write_fmt` is provided here,
/// `write!` works directly on a `&mut dyn Sink`.
pub trait Sink {
    /// Write raw bytes
    fn write(&mut self, bytes: &[u8]);

    /// Write a string
    fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    /// Write formatted text, truncated to [`OUTPUT_BUFFER_SIZE`] bytes
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        let mut buffer = String::<OUTPUT_BUFFER_SIZE>::new();
        if fmt::write(&mut buffer, args).is_err() {
            log::warn!("formatted output truncated to {} bytes", OUTPUT_BUFFER_SIZE);
        }
        self.write(buffer.as_bytes());
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, bytes: &[u8]) {
        (**self).write(bytes);
    }
}

impl Sink for alloc::vec::Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Fixed-capacity byte vector; bytes past the capacity are dropped.
impl<const N: usize> Sink for Vec<u8, N> {
    fn write(&mut self, bytes: &[u8]) {
        let room = N - self.len();
        let take = bytes.len().min(room);
        // take never exceeds the remaining capacity
        let _ = self.extend_from_slice(&bytes[..take]);
        if take < bytes.len() {
            log::warn!("sink full, dropped {} bytes", bytes.len() - take);
        }
    }
}

/// Adapts a byte closure (UART write, `print!`, ...) into a [`Sink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(&[u8])> Sink for FnSink<F> {
    fn write(&mut self, bytes: &[u8]) {
        (self.0)(bytes);
    }
}

/// Buffer that collects output until the owner drains it.
///
/// Used where the real transport is async: the session writes here
/// synchronously, and the driver forwards the bytes between input bytes.
#[derive(Debug, Default)]
pub struct BufferedSink<const N: usize> {
    buffer: Vec<u8, N>,
    dropped: usize,
}

impl<const N: usize> BufferedSink<N> {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            dropped: 0,
        }
    }

    /// Bytes waiting to be sent
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Forget the pending bytes once they have been sent
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Total bytes lost to a full buffer since creation
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<const N: usize> Sink for BufferedSink<N> {
    fn write(&mut self, bytes: &[u8]) {
        let before = self.buffer.len();
        self.buffer.write(bytes);
        self.dropped += bytes.len() - (self.buffer.len() - before);
    }
}

/// ANSI control sequences used by the line editor
pub mod ansi {
    /// Move to column 0 and erase the line
    pub const CLEAR_LINE: &str = "\r\x1b[K";
    /// Erase from the cursor to the end of the line
    pub const ERASE_TO_EOL: &str = "\x1b[K";
    /// Erase the whole screen
    pub const CLEAR_SCREEN: &str = "\x1b[2J";
    /// Move the cursor to the top-left corner
    pub const CURSOR_HOME: &str = "\x1b[H";
    /// One column left
    pub const CURSOR_LEFT: &str = "\x1b[D";
    /// One column right
    pub const CURSOR_RIGHT: &str = "\x1b[C";
    /// Remember the cursor position
    pub const SAVE_CURSOR: &str = "\x1b[s";
    /// Return to the remembered cursor position
    pub const RESTORE_CURSOR: &str = "\x1b[u";
    /// Step back, blank the cell, step back again
    pub const DESTRUCTIVE_BACKSPACE: &str = "\x08 \x08";
    /// Terminal bell, used to signal rejected input
    pub const BELL: &str = "\x07";
    /// Reset text formatting
    pub const RESET: &str = "\x1b[0m";
    /// Line terminator for terminal output
    pub const NEWLINE: &str = "\r\n";
}

/// Set text color (0-7 basic colors, 8-15 bright colors)
pub fn set_color(out: &mut dyn Sink, color: u8) {
    if color < 8 {
        write!(out, "\x1b[3{}m", color);
    } else {
        write!(out, "\x1b[9{}m", color - 8);
    }
}

/// Write text in a color, then reset formatting
pub fn write_colored(out: &mut dyn Sink, text: &str, color: u8) {
    set_color(out, color);
    out.write_str(text);
    out.write_str(ansi::RESET);
}

/// ANSI color codes for convenience
pub mod colors {
    pub const BLACK: u8 = 0;
    pub const RED: u8 = 1;
    pub const GREEN: u8 = 2;
    pub const YELLOW: u8 = 3;
    pub const BLUE: u8 = 4;
    pub const MAGENTA: u8 = 5;
    pub const CYAN: u8 = 6;
    pub const WHITE: u8 = 7;

    pub const BRIGHT_BLACK: u8 = 8;
    pub const BRIGHT_RED: u8 = 9;
    pub const BRIGHT_GREEN: u8 = 10;
    pub const BRIGHT_YELLOW: u8 = 11;
    pub const BRIGHT_BLUE: u8 = 12;
    pub const BRIGHT_MAGENTA: u8 = 13;
    pub const BRIGHT_CYAN: u8 = 14;
    pub const BRIGHT_WHITE: u8 = 15;
}
