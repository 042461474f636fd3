//! Hierarchical namespace paths.

use crate::name::Name;
use std::fmt;
use std::sync::Arc;

/// An immutable, ordered sequence of [`Name`]s designating a namespace
/// location, e.g. a function namespace or a field-access chain.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Arc<[Name]>,
}

impl Path {
    /// The root (empty) path.
    pub fn root() -> Self {
        Self {
            segments: Arc::from(Vec::new()),
        }
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Name>) -> Self {
        let segments: Vec<Name> = segments.into_iter().collect();
        Self {
            segments: Arc::from(segments),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    /// A new path with `name` appended.
    pub fn append(&self, name: Name) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(name);
        Self::from_segments(segments)
    }

    /// The terminal segment, or the empty (invalid) name for the root.
    pub fn name(&self) -> Name {
        self.segments.last().cloned().unwrap_or_default()
    }

    /// The path one level up; the root is its own parent.
    pub fn parent(&self) -> Self {
        self.go_up(1)
    }

    /// Remove `levels` trailing segments, clamping at the root.
    pub fn go_up(&self, levels: usize) -> Self {
        let keep = self.segments.len().saturating_sub(levels);
        Self::from_segments(self.segments[..keep].iter().cloned())
    }

    /// Parse a dot-separated path. The empty string is the root path.
    ///
    /// Segments that are not simple identifiers may be single-quoted, with
    /// `''` standing for an embedded quote, so `Display` output round-trips.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return Some(Self::root());
        }

        let mut segments = Vec::new();
        let mut chars = text.chars().peekable();
        loop {
            let mut segment = String::new();
            if chars.peek() == Some(&'\'') {
                chars.next();
                loop {
                    match chars.next()? {
                        '\'' if chars.peek() == Some(&'\'') => {
                            chars.next();
                            segment.push('\'');
                        }
                        '\'' => break,
                        c => segment.push(c),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == '.' {
                        break;
                    }
                    segment.push(c);
                    chars.next();
                }
            }

            if !Name::is_valid_text(&segment) {
                return None;
            }
            segments.push(Name::new(segment));

            match chars.next() {
                None => break,
                Some('.') => continue,
                Some(_) => return None,
            }
        }
        Some(Self::from_segments(segments))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.escaped())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self)
    }
}
