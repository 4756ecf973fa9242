use heapless::String;

use crate::error::HistoryError;

/// Result of an Up/Down recall request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recall<'a> {
    /// Nothing to recall; leave the line alone
    Unchanged,
    /// Replace the line with this entry
    Entry(&'a str),
    /// Walked past the newest entry; blank the line
    Blank,
}

/// Ring of the last `N` submitted lines, each up to `LINE` bytes.
///
/// Read and write positions each carry a mirror bit that flips on
/// wraparound: equal positions with equal bits mean empty, equal positions
/// with different bits mean full. A full ring overwrites its oldest entry.
///
/// Recall walks a snapshot of the oldest-to-newest order taken at the last
/// push, so browsing never disturbs the ring itself.
pub struct History<const N: usize, const LINE: usize> {
    entries: [String<LINE>; N],
    write_pos: usize,
    write_mirror: bool,
    read_pos: usize,
    read_mirror: bool,
    find_index: [usize; N],
    find_pos: usize,
}

impl<const N: usize, const LINE: usize> Default for History<N, LINE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const LINE: usize> History<N, LINE> {
    /// Create an empty history
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| String::new()),
            write_pos: 0,
            write_mirror: false,
            read_pos: 0,
            read_mirror: false,
            find_index: [0; N],
            find_pos: 0,
        }
    }

    /// True when every slot holds an entry
    pub fn is_full(&self) -> bool {
        self.write_pos == self.read_pos && self.write_mirror != self.read_mirror
    }

    /// True when no entry has been stored
    pub fn is_empty(&self) -> bool {
        self.write_pos == self.read_pos && self.write_mirror == self.read_mirror
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        if self.write_mirror == self.read_mirror {
            self.write_pos - self.read_pos
        } else {
            N - self.read_pos + self.write_pos
        }
    }

    /// Store a line. Empty lines are ignored; consecutive duplicates are kept.
    pub fn push(&mut self, line: &str) -> Result<(), HistoryError> {
        if N == 0 || line.is_empty() {
            return Ok(());
        }
        let entry = String::try_from(line).map_err(|_| HistoryError::LineTooLong)?;

        if self.is_full() {
            self.read_pos = (self.read_pos + 1) % N;
            if self.read_pos == 0 {
                self.read_mirror = !self.read_mirror;
            }
        }
        self.entries[self.write_pos] = entry;
        self.write_pos = (self.write_pos + 1) % N;
        if self.write_pos == 0 {
            self.write_mirror = !self.write_mirror;
        }

        self.rebuild_index();
        self.reset_position();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        if self.is_full() {
            for (i, slot) in self.find_index.iter_mut().enumerate() {
                *slot = (self.read_pos + i) % N;
            }
        } else {
            for (i, slot) in self.find_index.iter_mut().take(self.write_pos).enumerate() {
                *slot = i;
            }
        }
    }

    /// Point the recall cursor one past the newest entry
    pub fn reset_position(&mut self) {
        self.find_pos = self.len();
    }

    /// Step to the next older entry; the oldest repeats once reached
    pub fn up(&mut self) -> Recall<'_> {
        if self.is_empty() {
            return Recall::Unchanged;
        }
        self.find_pos = self.find_pos.saturating_sub(1);
        Recall::Entry(&self.entries[self.find_index[self.find_pos]])
    }

    /// Step to the next newer entry, or blank the line past the newest
    pub fn down(&mut self) -> Recall<'_> {
        if self.is_empty() {
            return Recall::Unchanged;
        }
        if self.find_pos + 1 >= self.len() {
            self.reset_position();
            return Recall::Blank;
        }
        self.find_pos += 1;
        Recall::Entry(&self.entries[self.find_index[self.find_pos]])
    }

    /// Get an iterator over history entries (oldest to newest)
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        (0..self.len()).map(move |i| self.entries[(self.read_pos + i) % N].as_str())
    }
}
