//! Types related to source files.

use std::fmt;
use std::ops::Range;

use crate::files::FileId;

/// Byte offsets into source files.
pub type BytePos = u32;

/// A 1-based line and column, as tracked by the lexer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, col: 1 };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Byte ranges in source files.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FileRange {
    file_id: FileId,
    byte_range: ByteRange,
}

impl fmt::Debug for FileRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FileRange({}, {}..{})",
            self.file_id, self.byte_range.start, self.byte_range.end
        )
    }
}

impl FileRange {
    pub const fn new(file_id: FileId, byte_range: ByteRange) -> Self {
        Self {
            file_id,
            byte_range,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub const fn byte_range(&self) -> ByteRange {
        self.byte_range
    }

    pub const fn start(&self) -> BytePos {
        self.byte_range.start
    }

    pub const fn end(&self) -> BytePos {
        self.byte_range.end
    }

    pub fn merge(&self, other: &Self) -> Option<Self> {
        if self.file_id == other.file_id {
            Some(Self::new(
                self.file_id,
                ByteRange::merge(self.byte_range, other.byte_range),
            ))
        } else {
            None
        }
    }
}

impl From<FileRange> for Range<usize> {
    fn from(file_range: FileRange) -> Self {
        file_range.byte_range.into()
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    start: BytePos,
    end: BytePos,
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteRange({}..{})", self.start, self.end)
    }
}

impl ByteRange {
    pub fn new(start: BytePos, end: BytePos) -> Self {
        Self { start, end }
    }

    /// An empty range sitting at `pos`.
    pub fn point(pos: BytePos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn start(&self) -> BytePos {
        self.start
    }

    pub const fn end(&self) -> BytePos {
        self.end
    }

    pub fn merge(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Self {
        (range.start as usize)..(range.end as usize)
    }
}

pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;
