//! Source spans and line mapping.
//!
//! Every syntax node, bound node, IR node and diagnostic carries a [`Span`]
//! so host tooling can map results back to the exact characters of the
//! formula text.

use std::fmt;
use std::ops::Range;

/// A position in source text, measured as a byte offset from the start.
pub type TextPos = u32;

/// A half-open range `[min, lim)` of byte offsets into the formula text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    /// First byte covered by the span (inclusive).
    pub min: TextPos,
    /// First byte after the span (exclusive).
    pub lim: TextPos,
}

impl Span {
    #[inline]
    pub fn new(min: TextPos, lim: TextPos) -> Self {
        debug_assert!(lim >= min);
        Self { min, lim }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self { min: pos, lim: pos }
    }

    #[inline]
    pub fn len(&self) -> TextPos {
        self.lim - self.min
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min == self.lim
    }

    /// Whether this span contains the given position.
    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.min && pos < self.lim
    }

    /// Whether `other` lies entirely within this span.
    #[inline]
    pub fn covers(&self, other: &Span) -> bool {
        other.min >= self.min && other.lim <= self.lim
    }

    /// Return a new span covering both this span and the other.
    pub fn union(&self, other: &Span) -> Span {
        Span::new(self.min.min(other.min), self.lim.max(other.lim))
    }

    /// Convert to a byte range.
    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.min as usize..self.lim as usize
    }

    /// The slice of `text` this span designates, if it is in bounds and on
    /// character boundaries.
    pub fn fragment<'t>(&self, text: &'t str) -> Option<&'t str> {
        text.get(self.to_range())
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.lim)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.lim)
    }
}

impl From<Range<u32>> for Span {
    fn from(range: Range<u32>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// Line and column information derived from source text.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LineAndColumn {
    /// 0-based line number.
    pub line: u32,
    /// 0-based column, in bytes.
    pub character: u32,
}

impl LineAndColumn {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A map from byte offsets to line numbers, built from source text.
/// Used by the CLI to print `line:column` positions for diagnostics.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offsets of the start of each line.
    line_starts: Vec<TextPos>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Get the line number (0-based) for a byte offset.
    pub fn line_of(&self, pos: TextPos) -> u32 {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line as u32,
            Err(line) => (line - 1) as u32,
        }
    }

    pub fn line_and_column_of(&self, pos: TextPos) -> LineAndColumn {
        let line = self.line_of(pos);
        let line_start = self.line_starts[line as usize];
        LineAndColumn {
            line,
            character: pos - line_start,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let span = Span::new(5, 15);
        assert_eq!(span.len(), 10);
        assert!(span.contains(5));
        assert!(span.contains(14));
        assert!(!span.contains(15));
        assert_eq!(span.to_string(), "[5, 15)");
    }

    #[test]
    fn test_span_union_and_cover() {
        let a = Span::new(2, 4);
        let b = Span::new(6, 9);
        let u = a.union(&b);
        assert_eq!(u, Span::new(2, 9));
        assert!(u.covers(&a));
        assert!(u.covers(&b));
        assert!(!a.covers(&u));
    }

    #[test]
    fn test_span_fragment() {
        let text = "CountIf(numtable, val > 5)";
        assert_eq!(Span::new(18, 25).fragment(text), Some("val > 5"));
        assert_eq!(Span::new(18, 99).fragment(text), None);
    }

    #[test]
    fn test_line_map() {
        let text = "a = 1;\nb = a;\nc = b;";
        let map = LineMap::new(text);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.line_of(0), 0);
        assert_eq!(map.line_of(7), 1);
        let lc = map.line_and_column_of(11);
        assert_eq!(lc, LineAndColumn::new(1, 4));
    }
}
