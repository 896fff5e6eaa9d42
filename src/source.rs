// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

// =================================================================
// Span
// =================================================================

/// Identifies a _half open_ region of the source text.  That is,
/// `start` is the first byte offset covered, whilst `end` is one past
/// the last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Determine the number of bytes this span covers.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Extract the underlying region covered by this span as a
    /// `Range`.  This is really just for convenience.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Join two spans from the same source, producing a span covering
    /// both (and anything between them).
    pub fn join(first: Span, last: Span) -> Span {
        Span::new(first.start, last.end)
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Span {
        Span::new(r.start, r.end)
    }
}

// =================================================================
// Errors
// =================================================================

/// Errors which can arise when constructing a source index, or when
/// requesting an invalid region of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// A multi-byte UTF-8 sequence ran past the end of the input.
    InvalidUtf8(usize),
    /// A requested region lies (partially) outside the source text.
    InvalidRange(usize, usize),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceError::InvalidUtf8(offset) => {
                write!(f, "invalid UTF-8 sequence at offset {offset}")
            }
            SourceError::InvalidRange(offset, length) => {
                write!(f, "invalid source range requested ({offset}+{length})")
            }
        }
    }
}

impl std::error::Error for SourceError {}

// =================================================================
// Line Info
// =================================================================

/// Information about a single line of source code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineInfo {
    /// 1-based line number.
    pub number: usize,
    /// Line offset in bytes.
    pub offset: usize,
    /// Line length in bytes.
    pub length: usize,
    /// Line length in characters.
    pub char_length: usize,
}

// =================================================================
// Source
// =================================================================

/// An indexed source unit.  Immutable after construction, it owns the
/// original text together with a sorted map from byte offset to line
/// index, enabling line/column lookups for diagnostics.
pub struct Source {
    name: String,
    code: String,
    lines: Vec<LineInfo>,
    offset_lines: BTreeMap<usize, usize>,
}

impl Source {
    /// Construct a source index by walking the code byte-by-byte.
    /// Bytes opening a multi-byte UTF-8 sequence consume their
    /// continuation bytes, which count toward byte length but not
    /// character length.
    pub fn new(name: &str, code: &str) -> Result<Self, SourceError> {
        let bytes = code.as_bytes();
        let mut lines = Vec::new();
        let mut offset_lines = BTreeMap::new();
        let mut line = LineInfo { number: 1, offset: 0, length: 0, char_length: 0 };
        let mut i = 0;
        //
        while i < bytes.len() {
            let b = bytes[i];
            // A newline closes the current line descriptor.
            if b == b'\n' {
                offset_lines.insert(line.offset, lines.len());
                let number = line.number;
                lines.push(line);
                line = LineInfo { number: number + 1, offset: i + 1, length: 0, char_length: 0 };
                i += 1;
                continue;
            }
            // Number of continuation bytes forming this character.
            let extra = if (b & 0xF0) == 0xF0 {
                3
            } else if (b & 0xE0) == 0xE0 {
                2
            } else if (b & 0xC0) == 0xC0 {
                1
            } else {
                0
            };
            if extra > 0 && (i + extra) >= bytes.len() {
                return Err(SourceError::InvalidUtf8(i));
            }
            line.length += 1 + extra;
            line.char_length += 1;
            i += 1 + extra;
        }
        // Close the final (possibly empty) line.
        offset_lines.insert(line.offset, lines.len());
        lines.push(line);
        //
        Ok(Self { name: name.to_string(), code: code.to_string(), lines, offset_lines })
    }

    /// Get the logical source name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the code string.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the length of the code string in bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Get the number of code lines.
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Get information about a line by its 0-based index.
    pub fn line_info(&self, index: usize) -> &LineInfo {
        &self.lines[index]
    }

    /// Get the 0-based index of the line containing a given byte
    /// offset.  This is the last line whose starting offset is at or
    /// before the given offset.
    pub fn line_index_by_offset(&self, offset: usize) -> usize {
        match self.offset_lines.range(..=offset).next_back() {
            Some((_, index)) => *index,
            None => 0,
        }
    }

    /// Get the 1-based column of a given byte offset within its line.
    /// Columns count characters rather than bytes, where a byte whose
    /// top two bits are `10` continues the previous character.
    pub fn column_by_offset(&self, offset: usize) -> usize {
        let line = self.line_info(self.line_index_by_offset(offset));
        if offset > self.code.len() {
            return line.char_length;
        }
        let slice = &self.code.as_bytes()[line.offset..offset];
        1 + slice.iter().filter(|b| (*b & 0xC0) != 0x80).count()
    }

    /// Get the 1-based number of the line containing a given byte
    /// offset.
    pub fn line_number_by_offset(&self, offset: usize) -> usize {
        self.line_info(self.line_index_by_offset(offset)).number
    }

    /// Get the text covered by a given span.  The span is expected to
    /// have been produced against this source.
    pub fn text(&self, span: Span) -> &str {
        &self.code[span.range()]
    }

    /// Get a substring of the code, checking the requested region
    /// against the source bounds.
    pub fn get_text(&self, offset: usize, length: usize) -> Result<&str, SourceError> {
        if offset + length > self.code.len() {
            return Err(SourceError::InvalidRange(offset, length));
        }
        Ok(&self.code[offset..offset + length])
    }

    /// Get the span of the whitespace-delimited token found at a given
    /// offset, trimming any leading whitespace.  Fails when the offset
    /// lies outside the source.
    pub fn get_token(&self, offset: usize) -> Result<Span, SourceError> {
        if offset >= self.code.len() {
            return Err(SourceError::InvalidRange(offset, 0));
        }
        let bytes = self.code.as_bytes();
        let start = match bytes[offset..].iter().position(|b| !b.is_ascii_whitespace()) {
            Some(n) => offset + n,
            None => self.code.len(),
        };
        let end = match bytes[start..].iter().position(|b| b.is_ascii_whitespace()) {
            Some(n) => start + n,
            None => self.code.len(),
        };
        Ok(Span::new(start, end))
    }

    /// Get a span of at most `size` bytes starting at a given offset,
    /// clamped to the end of the source.  Fails when the offset lies
    /// outside the source.
    pub fn get_token_sized(&self, offset: usize, size: usize) -> Result<Span, SourceError> {
        if offset >= self.code.len() {
            return Err(SourceError::InvalidRange(offset, size));
        }
        let end = usize::min(offset + size, self.code.len());
        Ok(Span::new(offset, end))
    }
}
