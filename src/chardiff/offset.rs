//! Byte offsets used inside the character diff engine.
//!
//! Byte positions never leave the engine: every range is converted to rune
//! offsets through a [`RuneIndex`] before it is returned.

/// Byte position within one side's string, always on a char boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(super) struct ByteOffset(pub usize);

impl ByteOffset {
    pub fn shifted(self, by: usize) -> Self {
        ByteOffset(self.0 + by)
    }
}

/// Half-open byte range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ByteSpan {
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl ByteSpan {
    pub fn new(start: ByteOffset, end: ByteOffset) -> Self {
        debug_assert!(start <= end);
        ByteSpan { start, end }
    }

    pub fn len(self) -> usize {
        self.end.0 - self.start.0
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn slice(self, text: &str) -> &str {
        &text[self.start.0..self.end.0]
    }
}

/// Byte offset of every char start in a string, plus its length
pub(super) struct RuneIndex {
    starts: Vec<usize>,
}

impl RuneIndex {
    pub fn new(text: &str) -> Self {
        let mut starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        starts.push(text.len());
        RuneIndex { starts }
    }

    /// Rune offset of a byte offset on a char boundary
    pub fn rune_at(&self, offset: ByteOffset) -> usize {
        match self.starts.binary_search(&offset.0) {
            Ok(rune) | Err(rune) => rune,
        }
    }

    /// Byte offset of the `rune`-th char (or the string length past the end)
    pub fn byte_at(&self, rune: usize) -> ByteOffset {
        ByteOffset(self.starts[rune.min(self.starts.len() - 1)])
    }
}
