//! Token information produced by the scanner.

use fxl_ast::syntax_kind::SyntaxKind;
use fxl_ast::types::TokenFlags;
use fxl_core::Span;

/// Information about a scanned token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    /// The kind of token.
    pub kind: SyntaxKind,
    /// Byte range in the source text.
    pub span: Span,
    /// The value of the token (identifier text, unescaped string, etc.).
    pub text: String,
    /// Token flags (preceding line break, numeric format, etc.).
    pub flags: TokenFlags,
}

impl TokenInfo {
    pub fn new(kind: SyntaxKind, span: Span) -> Self {
        Self {
            kind,
            span,
            text: String::new(),
            flags: TokenFlags::NONE,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = text;
        self
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The length of this token in bytes.
    pub fn len(&self) -> u32 {
        self.span.len()
    }

    /// Whether this token has zero length.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Whether there was a line break before this token.
    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }
}
