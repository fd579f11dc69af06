//! # Buffer Module
//!
//! Editable text content plus caret/selection state. The buffer answers one
//! question for the send path: what is the current unit to transmit. That is
//! the active selection verbatim, or the line containing the caret.

use crate::error::Result;
use std::path::Path;

/// Editable multiline text with a caret and an optional selection.
///
/// Offsets are byte offsets into the text, always clamped to `char`
/// boundaries. Line boundaries are computed from `\n` only; carriage returns
/// are stripped when content enters the buffer.
pub struct TextBuffer {
    text: String,
    caret: usize,
    selection: Option<(usize, usize)>,
    last_caret: usize,
}

impl TextBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        TextBuffer {
            text: String::new(),
            caret: 0,
            selection: None,
            last_caret: 0,
        }
    }

    /// Full buffer content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current caret offset.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Current selection range, if any.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// Replaces the entire content, stripping carriage returns.
    ///
    /// Caret and selection are reset; a replace is a fresh document.
    pub fn replace(&mut self, text: &str) {
        self.text = text.replace('\r', "");
        self.caret = 0;
        self.last_caret = 0;
        self.selection = None;
    }

    /// Replaces the content from a file.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.replace(&text);
        Ok(())
    }

    /// Moves the caret to an authoritative position.
    ///
    /// The position is clamped to the text and remembered as the
    /// last-known-good caret.
    pub fn set_caret(&mut self, pos: usize) {
        let pos = clamp_to_boundary(&self.text, pos);
        self.caret = pos;
        self.last_caret = pos;
    }

    /// Records a caret position as reported by an unreliable UI layer.
    ///
    /// A report of exactly 0 with no active selection, while a non-zero
    /// last-known caret exists, is treated as a stale report and ignored.
    /// This is a heuristic: a genuine caret-at-0 is indistinguishable from a
    /// stale one, and such a report will resolve the remembered line instead.
    /// Callers that know the position is authoritative use [`set_caret`].
    ///
    /// [`set_caret`]: TextBuffer::set_caret
    pub fn report_caret(&mut self, pos: usize) {
        if pos == 0 && self.selection.is_none() && self.last_caret != 0 {
            return;
        }
        self.set_caret(pos);
    }

    /// Sets the selection to `[start, end)`, clamped and ordered.
    ///
    /// An empty range clears the selection.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let start = clamp_to_boundary(&self.text, start);
        let end = clamp_to_boundary(&self.text, end);
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection = if start == end { None } else { Some((start, end)) };
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Resolves the current unit to send.
    ///
    /// A non-empty selection is returned verbatim and may span multiple
    /// lines. Otherwise the caret's containing line is returned, without its
    /// terminators. A caret sitting on a `\n` belongs to the line ending
    /// there, not the line starting after it.
    pub fn resolve_unit(&self) -> &str {
        if let Some((start, end)) = self.selection {
            return &self.text[start..end];
        }
        let (start, end) = self.line_bounds(self.caret);
        &self.text[start..end]
    }

    /// Number of `\n`-delimited lines in the buffer.
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.text.split('\n').count()
        }
    }

    /// Content span `[start, end)` of the zero-based line `index`, excluding
    /// the terminator.
    pub fn line_span(&self, index: usize) -> Option<(usize, usize)> {
        if self.text.is_empty() {
            return None;
        }
        let mut start = 0;
        for _ in 0..index {
            start = self.text[start..].find('\n').map(|i| start + i + 1)?;
        }
        let end = self.text[start..]
            .find('\n')
            .map_or(self.text.len(), |i| start + i);
        Some((start, end))
    }

    fn line_bounds(&self, caret: usize) -> (usize, usize) {
        let start = self.text[..caret].rfind('\n').map_or(0, |i| i + 1);
        let end = self.text[caret..]
            .find('\n')
            .map_or(self.text.len(), |i| caret + i);
        (start, end)
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps `pos` into `text`, backing off to the nearest `char` boundary.
fn clamp_to_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}
