//! Parser for the textual type grammar.
//!
//! ```text
//! type    := tag | '!' fields | '*' fields | '%' kind options
//! fields  := '[' (name ':' type (',' name ':' type)*)? ']'
//! options := '[' (name ':' value (',' name ':' value)*)? ']'
//! kind    := 'n' | 'c' | 's'
//! name    := identifier | "'" quoted "'"
//! value   := number | '"' text '"' | '#' hex{6,8}
//! ```
//!
//! Whitespace between tokens is ignored. The output of `Display` for
//! [`DType`] parses back to an equal type.

use crate::dtype::{DType, EnumKind, EnumType, EnumValue, RecordType};
use fxl_core::Name;
use indexmap::IndexMap;
use std::str::FromStr;
use thiserror::Error;

/// Failure to parse a type specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("unexpected end of type specification")]
    UnexpectedEnd,
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unknown type tag '{0}'")]
    UnknownTag(char),
    #[error("unknown enum kind '{0}'")]
    UnknownEnumKind(char),
    #[error("'{0}' appears more than once")]
    DuplicateName(String),
    #[error("invalid name at offset {0}")]
    InvalidName(usize),
    #[error("option '{name}' does not have a {kind} value")]
    InvalidValue { name: String, kind: &'static str },
}

impl DType {
    /// Parse the full type grammar.
    pub fn parse(text: &str) -> Result<DType, TypeParseError> {
        let mut parser = TypeParser {
            text,
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        match parser.peek() {
            None => Ok(ty),
            Some(found) => Err(TypeParseError::Unexpected {
                found,
                offset: parser.pos,
            }),
        }
    }
}

impl FromStr for DType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DType::parse(s)
    }
}

struct TypeParser<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> TypeParser<'t> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        self.skip_ws();
        let offset = self.pos;
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(found) => Err(TypeParseError::Unexpected { found, offset }),
            None => Err(TypeParseError::UnexpectedEnd),
        }
    }

    fn parse_type(&mut self) -> Result<DType, TypeParseError> {
        self.skip_ws();
        match self.bump().ok_or(TypeParseError::UnexpectedEnd)? {
            '!' => Ok(DType::Record(self.parse_fields()?)),
            '*' => Ok(DType::Table(self.parse_fields()?)),
            '%' => {
                let sigil = self.bump().ok_or(TypeParseError::UnexpectedEnd)?;
                let kind =
                    EnumKind::from_sigil(sigil).ok_or(TypeParseError::UnknownEnumKind(sigil))?;
                self.parse_options(kind)
            }
            tag => DType::from_tag(tag).ok_or(TypeParseError::UnknownTag(tag)),
        }
    }

    /// Parse a bracketed, comma-separated list of `name:item` pairs.
    fn parse_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self, &Name) -> Result<T, TypeParseError>,
    ) -> Result<IndexMap<Name, T>, TypeParseError> {
        self.expect('[')?;
        let mut entries = IndexMap::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(entries);
        }
        loop {
            let name = self.parse_name()?;
            self.expect(':')?;
            let value = item(self, &name)?;
            if entries.contains_key(&name) {
                return Err(TypeParseError::DuplicateName(name.to_string()));
            }
            entries.insert(name, value);

            self.skip_ws();
            let offset = self.pos;
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(entries),
                Some(found) => return Err(TypeParseError::Unexpected { found, offset }),
                None => return Err(TypeParseError::UnexpectedEnd),
            }
        }
    }

    fn parse_fields(&mut self) -> Result<RecordType, TypeParseError> {
        let fields = self.parse_list(|parser, _| parser.parse_type())?;
        Ok(RecordType::from_fields(fields))
    }

    fn parse_options(&mut self, kind: EnumKind) -> Result<DType, TypeParseError> {
        let options = self.parse_list(|parser, name| {
            let value = parser.parse_value()?;
            if value.kind() != kind {
                return Err(TypeParseError::InvalidValue {
                    name: name.to_string(),
                    kind: kind.as_str(),
                });
            }
            Ok(value)
        })?;
        // Names and kinds were validated above.
        EnumType::new(kind, options)
            .map(DType::Enum)
            .ok_or(TypeParseError::InvalidName(self.pos))
    }

    fn parse_name(&mut self) -> Result<Name, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        let mut text = String::new();
        if self.peek() == Some('\'') {
            self.bump();
            loop {
                match self.bump().ok_or(TypeParseError::UnexpectedEnd)? {
                    '\'' if self.peek() == Some('\'') => {
                        self.bump();
                        text.push('\'');
                    }
                    '\'' => break,
                    ch => text.push(ch),
                }
            }
        } else {
            while let Some(ch) = self.peek() {
                if ch == '_' || ch.is_alphanumeric() {
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if Name::is_valid_text(&text) {
            Ok(Name::new(text))
        } else {
            Err(TypeParseError::InvalidName(start))
        }
    }

    fn parse_value(&mut self) -> Result<EnumValue, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek().ok_or(TypeParseError::UnexpectedEnd)? {
            '"' => {
                self.bump();
                let mut text = String::new();
                loop {
                    match self.bump().ok_or(TypeParseError::UnexpectedEnd)? {
                        '"' if self.peek() == Some('"') => {
                            self.bump();
                            text.push('"');
                        }
                        '"' => break,
                        ch => text.push(ch),
                    }
                }
                Ok(EnumValue::String(text))
            }
            '#' => {
                self.bump();
                let digits_start = self.pos;
                while self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
                    self.bump();
                }
                let digits = &self.text[digits_start..self.pos];
                let rgba = match digits.len() {
                    6 => u32::from_str_radix(digits, 16).map(|rgb| (rgb << 8) | 0xff),
                    8 => u32::from_str_radix(digits, 16),
                    _ => return Err(self.unexpected_at(start)),
                };
                rgba.map(EnumValue::Color)
                    .map_err(|_| self.unexpected_at(start))
            }
            _ => {
                while self
                    .peek()
                    .map_or(false, |c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
                {
                    self.bump();
                }
                self.text[start..self.pos]
                    .parse::<f64>()
                    .map(EnumValue::Number)
                    .map_err(|_| self.unexpected_at(start))
            }
        }
    }

    fn unexpected_at(&self, offset: usize) -> TypeParseError {
        match self.text[offset..].chars().next() {
            Some(found) => TypeParseError::Unexpected { found, offset },
            None => TypeParseError::UnexpectedEnd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        for tag in ['?', 'e', 'N', '-', 'n', 'w', 'b', 's', 'h', 'D', 'T', 'd', 'c', 'g', 'O'] {
            let ty = DType::parse(&tag.to_string()).unwrap();
            assert_eq!(ty.tag(), Some(tag));
        }
    }

    #[test]
    fn test_parse_nested_aggregates() {
        let ty = DType::parse("![Value:n, Tbl:*[Value2:n], Rec:![Value3:n]]").unwrap();
        let record = ty.as_record().unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.field("Tbl").unwrap().row_type().unwrap().len(), 1);
        assert_eq!(ty.to_string(), "![Value:n, Tbl:*[Value2:n], Rec:![Value3:n]]");
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let ty = DType::parse(" * [ a : n , 'b c' : s ] ").unwrap();
        assert_eq!(ty.to_string(), "*[a:n, 'b c':s]");
    }

    #[test]
    fn test_parse_enum_grammar() {
        let ty = DType::parse("%s[Ascending:\"ascending\", Descending:\"descending\"]").unwrap();
        let e = ty.as_enum().unwrap();
        assert_eq!(e.kind(), EnumKind::String);
        assert_eq!(
            e.option("Descending"),
            Some(&EnumValue::String("descending".to_string()))
        );

        let ty = DType::parse("%c[Red:#ff0000ff, Clear:#00000000]").unwrap();
        assert_eq!(
            ty.as_enum().unwrap().option("Red"),
            Some(&EnumValue::Color(0xff0000ff))
        );

        let ty = DType::parse("%n[Low:-1, High:2.5]").unwrap();
        assert_eq!(ty.to_string(), "%n[Low:-1, High:2.5]");
    }

    #[test]
    fn test_six_digit_color_is_opaque() {
        let ty = DType::parse("%c[Red:#ff0000]").unwrap();
        assert_eq!(ty.to_string(), "%c[Red:#ff0000ff]");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(DType::parse(""), Err(TypeParseError::UnexpectedEnd));
        assert_eq!(DType::parse("x"), Err(TypeParseError::UnknownTag('x')));
        assert_eq!(DType::parse("%q[]"), Err(TypeParseError::UnknownEnumKind('q')));
        assert_eq!(
            DType::parse("![a:n, a:s]"),
            Err(TypeParseError::DuplicateName("a".to_string()))
        );
        assert!(matches!(
            DType::parse("%n[A:\"x\"]"),
            Err(TypeParseError::InvalidValue { .. })
        ));
        assert!(matches!(DType::parse("![a:n"), Err(TypeParseError::UnexpectedEnd)));
        assert!(matches!(DType::parse("n n"), Err(TypeParseError::Unexpected { .. })));
    }

    #[test]
    fn test_quoted_names_round_trip() {
        let text = "![\"it's\":n]";
        // Double quotes are not a name delimiter.
        assert!(DType::parse(text).is_err());

        let ty = DType::parse("!['it''s':n]").unwrap();
        assert_eq!(ty.to_string(), "!['it''s':n]");
    }
}
