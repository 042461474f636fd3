//! SyntaxKind enum - all token kinds of the formula language.

/// The kind of a syntax token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SyntaxKind {
    // ========================================================================
    // Tokens
    // ========================================================================
    Unknown = 0,
    EndOfFileToken,

    // Literals
    NumericLiteral,
    StringLiteral,
    Identifier,

    // String interpolation: `$"` text `{` expr `}` text `"`
    InterpolationStart,
    InterpolationText,
    InterpolationEnd,

    // Punctuation
    OpenParenToken,
    CloseParenToken,
    OpenBraceToken,
    CloseBraceToken,
    OpenBracketToken,
    CloseBracketToken,
    DotToken,
    CommaToken,
    SemicolonToken,
    ColonToken,

    // Operators
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    CaretToken,
    PercentToken,
    AmpersandToken,
    EqualsToken,
    LessThanGreaterThanToken,
    LessThanToken,
    LessThanEqualsToken,
    GreaterThanToken,
    GreaterThanEqualsToken,
    AmpersandAmpersandToken,
    BarBarToken,
    ExclamationToken,

    // ========================================================================
    // Keywords
    // ========================================================================
    TrueKeyword,
    FalseKeyword,
    AndKeyword,
    OrKeyword,
    NotKeyword,
    InKeyword,
    ExactinKeyword,
    AsKeyword,
}

impl SyntaxKind {
    pub const FIRST_KEYWORD: SyntaxKind = SyntaxKind::TrueKeyword;
    pub const LAST_KEYWORD: SyntaxKind = SyntaxKind::AsKeyword;

    #[inline]
    pub fn is_keyword(self) -> bool {
        self >= Self::FIRST_KEYWORD && self <= Self::LAST_KEYWORD
    }

    #[inline]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::NumericLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
        )
    }

    /// Source text of fixed tokens, used in diagnostics.
    pub fn text(self) -> &'static str {
        match self {
            SyntaxKind::Unknown => "<unknown>",
            SyntaxKind::EndOfFileToken => "<end of input>",
            SyntaxKind::NumericLiteral => "<number>",
            SyntaxKind::StringLiteral => "<string>",
            SyntaxKind::Identifier => "<identifier>",
            SyntaxKind::InterpolationStart => "$\"",
            SyntaxKind::InterpolationText => "<text>",
            SyntaxKind::InterpolationEnd => "\"",
            SyntaxKind::OpenParenToken => "(",
            SyntaxKind::CloseParenToken => ")",
            SyntaxKind::OpenBraceToken => "{",
            SyntaxKind::CloseBraceToken => "}",
            SyntaxKind::OpenBracketToken => "[",
            SyntaxKind::CloseBracketToken => "]",
            SyntaxKind::DotToken => ".",
            SyntaxKind::CommaToken => ",",
            SyntaxKind::SemicolonToken => ";",
            SyntaxKind::ColonToken => ":",
            SyntaxKind::PlusToken => "+",
            SyntaxKind::MinusToken => "-",
            SyntaxKind::AsteriskToken => "*",
            SyntaxKind::SlashToken => "/",
            SyntaxKind::CaretToken => "^",
            SyntaxKind::PercentToken => "%",
            SyntaxKind::AmpersandToken => "&",
            SyntaxKind::EqualsToken => "=",
            SyntaxKind::LessThanGreaterThanToken => "<>",
            SyntaxKind::LessThanToken => "<",
            SyntaxKind::LessThanEqualsToken => "<=",
            SyntaxKind::GreaterThanToken => ">",
            SyntaxKind::GreaterThanEqualsToken => ">=",
            SyntaxKind::AmpersandAmpersandToken => "&&",
            SyntaxKind::BarBarToken => "||",
            SyntaxKind::ExclamationToken => "!",
            SyntaxKind::TrueKeyword => "true",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::AndKeyword => "And",
            SyntaxKind::OrKeyword => "Or",
            SyntaxKind::NotKeyword => "Not",
            SyntaxKind::InKeyword => "in",
            SyntaxKind::ExactinKeyword => "exactin",
            SyntaxKind::AsKeyword => "As",
        }
    }

    /// Look up a keyword by its exact spelling.
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "true" => SyntaxKind::TrueKeyword,
            "false" => SyntaxKind::FalseKeyword,
            "And" => SyntaxKind::AndKeyword,
            "Or" => SyntaxKind::OrKeyword,
            "Not" => SyntaxKind::NotKeyword,
            "in" => SyntaxKind::InKeyword,
            "exactin" => SyntaxKind::ExactinKeyword,
            "As" => SyntaxKind::AsKeyword,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_range() {
        assert!(SyntaxKind::AsKeyword.is_keyword());
        assert!(SyntaxKind::TrueKeyword.is_keyword());
        assert!(!SyntaxKind::Identifier.is_keyword());
        assert!(!SyntaxKind::ExclamationToken.is_keyword());
    }

    #[test]
    fn test_keyword_lookup_round_trips() {
        for kind in [
            SyntaxKind::TrueKeyword,
            SyntaxKind::FalseKeyword,
            SyntaxKind::AndKeyword,
            SyntaxKind::OrKeyword,
            SyntaxKind::NotKeyword,
            SyntaxKind::InKeyword,
            SyntaxKind::ExactinKeyword,
            SyntaxKind::AsKeyword,
        ] {
            assert_eq!(SyntaxKind::from_keyword(kind.text()), Some(kind));
        }
        assert_eq!(SyntaxKind::from_keyword("and"), None);
    }
}
