//! Validated identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Marker prepended to names that would otherwise be entirely blank.
pub const BLANK_NAME_MARKER: char = '_';

/// Characters a name may not contain; normalization maps each to a space.
#[inline]
fn is_disallowed(ch: char) -> bool {
    matches!(
        ch,
        '\r' | '\n' | '\t' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// An identifier used as a key for variables, fields, enum options,
/// functions and namespace segments.
///
/// Cheap to clone. Disallowed characters are mapped to spaces on
/// construction, so equality and hashing compare normalized text. Blank
/// text is kept blank (and invalid); [`Name::normalized`] also applies the
/// blank marker.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        if text.chars().any(is_disallowed) {
            let mapped: String = text.chars().map(|ch| if is_disallowed(ch) { ' ' } else { ch }).collect();
            Self(Arc::from(mapped))
        } else {
            Self(Arc::from(text))
        }
    }

    /// Build a name from arbitrary text, normalizing it first.
    pub fn normalized(text: &str) -> Self {
        let (value, _) = Self::normalize(text);
        Self::new(value)
    }

    /// The empty (invalid) name.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Map disallowed line-breaking and tab characters to a space and make
    /// sure the result is never entirely whitespace. Returns the normalized
    /// value and whether it differs from the input.
    pub fn normalize(text: &str) -> (String, bool) {
        let mut changed = false;
        let mut value: String = text
            .chars()
            .map(|ch| {
                if is_disallowed(ch) {
                    changed = true;
                    ' '
                } else {
                    ch
                }
            })
            .collect();

        if value.trim().is_empty() {
            value.insert(0, BLANK_NAME_MARKER);
            changed = true;
        }
        (value, changed)
    }

    /// A valid name is non-blank and contains no disallowed characters.
    pub fn is_valid_text(text: &str) -> bool {
        !text.trim().is_empty() && !text.chars().any(is_disallowed)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        Self::is_valid_text(&self.0)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the name can be written without single quotes in a formula.
    pub fn is_simple_identifier(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c == '_' || c.is_alphanumeric())
    }

    /// Render for formula text, quoting with `'` (and doubling embedded
    /// quotes) when the name is not a simple identifier.
    pub fn escaped(&self) -> String {
        if self.is_simple_identifier() {
            self.0.to_string()
        } else {
            format!("'{}'", self.0.replace('\'', "''"))
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_line_breaks() {
        let (value, changed) = Name::normalize("a\tb\nc");
        assert_eq!(value, "a b c");
        assert!(changed);
    }

    #[test]
    fn test_normalize_blank_gets_marker() {
        let (value, changed) = Name::normalize("\r\n");
        assert_eq!(value, "_  ");
        assert!(changed);

        let (value, changed) = Name::normalize("");
        assert_eq!(value, "_");
        assert!(changed);
    }

    #[test]
    fn test_normalize_unchanged() {
        let (value, changed) = Name::normalize("Price");
        assert_eq!(value, "Price");
        assert!(!changed);
    }

    #[test]
    fn test_validity() {
        assert!(Name::new("x").is_valid());
        assert!(Name::new("My Field").is_valid());
        assert!(!Name::empty().is_valid());
        assert!(!Name::new("   ").is_valid());
        assert!(!Name::new("\r\n").is_valid());
        assert!(Name::normalized("\r\n").is_valid());
    }

    #[test]
    fn test_equality_uses_normalized_text() {
        let tabbed = Name::new("a\tb");
        assert_eq!(tabbed, Name::new("a b"));
        assert_eq!(tabbed.as_str(), "a b");
        assert!(tabbed.is_valid());
        assert_eq!(Name::from("x\u{2028}y".to_string()), Name::new("x y"));

        let mut set = std::collections::HashSet::new();
        set.insert(Name::new("line\nbreak"));
        assert!(set.contains(&Name::new("line break")));
    }

    #[test]
    fn test_escaped() {
        assert_eq!(Name::new("Price").escaped(), "Price");
        assert_eq!(Name::new("Unit Price").escaped(), "'Unit Price'");
        assert_eq!(Name::new("it's").escaped(), "'it''s'");
    }
}
