//! Parser utility functions.

use fxl_ast::syntax_kind::SyntaxKind;

/// Check if a token kind can start an expression.
pub fn can_start_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::NumericLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::Identifier
            | SyntaxKind::InterpolationStart
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NotKeyword
            | SyntaxKind::ExclamationToken
            | SyntaxKind::MinusToken
            | SyntaxKind::OpenParenToken
            | SyntaxKind::OpenBraceToken
            | SyntaxKind::OpenBracketToken
    )
}

/// Tokens that close an enclosing construct. Error recovery never consumes
/// them, so the construct that owns them can.
pub fn is_closing_token(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::EndOfFileToken
            | SyntaxKind::CloseParenToken
            | SyntaxKind::CloseBracketToken
            | SyntaxKind::CloseBraceToken
            | SyntaxKind::CommaToken
            | SyntaxKind::SemicolonToken
            | SyntaxKind::InterpolationEnd
    )
}

/// Display text for a token in diagnostics.
pub fn token_display(kind: SyntaxKind, value: &str) -> String {
    match kind {
        SyntaxKind::Identifier | SyntaxKind::NumericLiteral if !value.is_empty() => {
            value.to_string()
        }
        SyntaxKind::StringLiteral => format!("\"{}\"", value),
        _ => kind.text().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_tokens_never_start_expressions() {
        for kind in [
            SyntaxKind::EndOfFileToken,
            SyntaxKind::CloseParenToken,
            SyntaxKind::CommaToken,
            SyntaxKind::SemicolonToken,
        ] {
            assert!(is_closing_token(kind));
            assert!(!can_start_expression(kind));
        }
    }

    #[test]
    fn test_token_display() {
        assert_eq!(token_display(SyntaxKind::Identifier, "Price"), "Price");
        assert_eq!(token_display(SyntaxKind::CloseParenToken, ""), ")");
        assert_eq!(token_display(SyntaxKind::StringLiteral, "a"), "\"a\"");
    }
}
