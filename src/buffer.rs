//! Host text buffer contract and the mutation path that writes to it.
//!
//! The buffer (a text area, an editor pane) is owned by the host UI. The
//! engine only ever touches it through [`TextBuffer`] and only via the
//! mutation functions here, so a host integrates by implementing four
//! methods. All offsets are character offsets.

use std::sync::{Arc, Mutex};

use crate::error::{DictamergeError, Result};
use crate::normalize::{apply_capitalization, clean_spacing, needs_space_before, should_capitalize};

/// Minimal contract a host text surface must provide.
///
/// Pairs with `TranscriptionChannel` on the input side - this is where
/// merged dictation lands.
pub trait TextBuffer: Send {
    /// Returns the full buffer contents.
    fn value(&self) -> String;

    /// Replaces the full buffer contents.
    fn set_value(&mut self, text: &str);

    /// Returns the current cursor or selection as `(start, end)` char
    /// offsets, with `start == end` for a plain cursor. Hosts without an
    /// addressable cursor return `None` and get the append-at-end path.
    fn selection(&self) -> Option<(usize, usize)>;

    /// Moves the cursor/selection. May be a no-op for hosts that returned
    /// `None` from [`TextBuffer::selection`].
    fn set_selection(&mut self, start: usize, end: usize);

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "buffer"
    }
}

/// Shared handle to a host buffer.
///
/// The host keeps one clone and the session loop keeps the other. The lock
/// is only ever held for a single synchronous read or mutation.
pub type SharedBuffer = Arc<Mutex<dyn TextBuffer>>;

/// Wraps a host buffer implementation in a [`SharedBuffer`] handle.
pub fn shared(buffer: impl TextBuffer + 'static) -> SharedBuffer {
    Arc::new(Mutex::new(buffer))
}

/// A single buffer-mutation instruction: replace the char range
/// `start..end` with `text`. An insertion is a zero-width range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Mutation {
    /// Replacement of an existing range.
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Insertion at a single offset.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, offset, text)
    }

    /// Char offset of the cursor after this mutation is applied.
    pub fn cursor_after(&self) -> usize {
        self.start + self.text.chars().count()
    }
}

/// Applies one mutation atomically and repositions the cursor to the end of
/// the inserted text. Returns the new cursor offset.
///
/// The range is validated against the live buffer before anything is
/// written; an out-of-bounds instruction fails with
/// [`DictamergeError::BufferRange`] and leaves the buffer exactly as it was.
pub fn apply_mutation(buffer: &mut dyn TextBuffer, mutation: &Mutation) -> Result<usize> {
    let current = buffer.value();
    let len = current.chars().count();

    if mutation.start > mutation.end || mutation.end > len {
        return Err(DictamergeError::BufferRange {
            start: mutation.start,
            end: mutation.end,
            len,
        });
    }
    let (Some(start_byte), Some(end_byte)) = (
        byte_offset(&current, mutation.start),
        byte_offset(&current, mutation.end),
    ) else {
        return Err(DictamergeError::BufferRange {
            start: mutation.start,
            end: mutation.end,
            len,
        });
    };

    let mut next = String::with_capacity(current.len() + mutation.text.len());
    next.push_str(&current[..start_byte]);
    next.push_str(&mutation.text);
    next.push_str(&current[end_byte..]);
    buffer.set_value(&next);

    let cursor = mutation.cursor_after();
    buffer.set_selection(cursor, cursor);
    Ok(cursor)
}

/// Degraded path for hosts without an addressable cursor: appends `text` at
/// the end of the buffer, inferring spacing and capitalization from the
/// trailing characters only. Returns the new cursor offset.
pub fn append_to_end(buffer: &mut dyn TextBuffer, text: &str) -> Result<usize> {
    let current = buffer.value();
    let len = current.chars().count();

    let cleaned = clean_spacing(text);
    if cleaned.is_empty() {
        return Ok(len);
    }

    let mut appended = String::with_capacity(cleaned.len() + 1);
    if needs_space_before(&current, len, &cleaned) {
        appended.push(' ');
    }
    appended.push_str(&apply_capitalization(
        &cleaned,
        should_capitalize(&current, len),
    ));

    apply_mutation(buffer, &Mutation::insert(len, appended))
}

/// In-memory buffer for tests and headless hosts.
///
/// Behaves like a plain text area: the selection is clamped to the text and
/// collapses sensibly when the text shrinks underneath it.
pub struct InMemoryBuffer {
    text: String,
    selection: (usize, usize),
}

impl InMemoryBuffer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            selection: (0, 0),
        }
    }

    /// Creates a buffer with existing content and the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.chars().count();
        Self {
            text,
            selection: (end, end),
        }
    }
}

impl Default for InMemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer for InMemoryBuffer {
    fn value(&self) -> String {
        self.text.clone()
    }

    fn set_value(&mut self, text: &str) {
        self.text = text.to_string();
        let len = self.text.chars().count();
        self.selection = (self.selection.0.min(len), self.selection.1.min(len));
    }

    fn selection(&self) -> Option<(usize, usize)> {
        Some(self.selection)
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.text.chars().count();
        let start = start.min(len);
        let end = end.min(len).max(start);
        self.selection = (start, end);
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

fn byte_offset(text: &str, char_offset: usize) -> Option<usize> {
    let mut n = 0;
    for (i, _) in text.char_indices() {
        if n == char_offset {
            return Some(i);
        }
        n += 1;
    }
    (n == char_offset).then_some(text.len())
}
