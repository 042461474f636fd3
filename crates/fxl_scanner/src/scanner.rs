//! The formula scanner/lexer.
//!
//! Converts source text into the token stream the parser consumes. Positions
//! are byte offsets into the UTF-8 text. String interpolation is scanned with
//! a mode stack: inside `$"..."` the scanner produces text fragments, and a
//! `{` opens an expression island that ends at its matching `}`.

use crate::char_codes::*;
use crate::token::TokenInfo;
use fxl_ast::syntax_kind::SyntaxKind;
use fxl_ast::types::TokenFlags;
use fxl_core::Span;
use fxl_diagnostics::{messages, DiagnosticCollection};

/// Scanning mode for string interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Literal text of an interpolated string.
    Text,
    /// Expression island; `depth` counts nested unmatched `{`.
    Island { depth: u32 },
}

/// Saved scanner state for lookahead.
#[derive(Debug, Clone)]
pub struct ScannerState {
    pos: usize,
    token_start: usize,
    token: SyntaxKind,
    token_value: String,
    token_flags: TokenFlags,
    modes: Vec<Mode>,
    diagnostic_count: usize,
}

/// The scanner converts formula source text into tokens.
pub struct Scanner<'t> {
    /// The source text being scanned.
    text: &'t str,
    /// Current byte position in the text.
    pos: usize,
    /// Start of the current token (after leading trivia).
    token_start: usize,
    /// The current token kind.
    token: SyntaxKind,
    /// The value of the current token.
    token_value: String,
    /// Token flags for the current token.
    token_flags: TokenFlags,
    /// Interpolation mode stack; empty in plain expression context.
    modes: Vec<Mode>,
    /// Accumulated diagnostics.
    diagnostics: DiagnosticCollection,
}

impl<'t> Scanner<'t> {
    /// Create a new scanner for the given source text.
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            pos: 0,
            token_start: 0,
            token: SyntaxKind::Unknown,
            token_value: String::new(),
            token_flags: TokenFlags::NONE,
            modes: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn text(&self) -> &'t str {
        self.text
    }

    /// Look ahead: save state, call f, restore state and return the result.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let state = self.save_state();
        let result = f(self);
        self.restore_state(state);
        result
    }

    /// Get the current token kind.
    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    /// Get the current token's value.
    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    /// Get the start position of the current token (after trivia).
    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Get the current position (end of current token).
    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn token_span(&self) -> Span {
        Span::new(self.token_start as u32, self.pos as u32)
    }

    /// Get the current token flags.
    #[inline]
    pub fn token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    /// Whether the current token was preceded by a line break.
    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.token_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    /// Whether the scanner is inside an interpolated string.
    pub fn in_interpolation(&self) -> bool {
        !self.modes.is_empty()
    }

    /// Get the accumulated diagnostics.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get a TokenInfo for the current token.
    pub fn token_info(&self) -> TokenInfo {
        TokenInfo {
            kind: self.token,
            span: self.token_span(),
            text: self.token_value.clone(),
            flags: self.token_flags,
        }
    }

    /// Save the full scanner state for lookahead.
    pub fn save_state(&self) -> ScannerState {
        ScannerState {
            pos: self.pos,
            token_start: self.token_start,
            token: self.token,
            token_value: self.token_value.clone(),
            token_flags: self.token_flags,
            modes: self.modes.clone(),
            diagnostic_count: self.diagnostics.len(),
        }
    }

    /// Restore the full scanner state, discarding diagnostics reported since
    /// the state was saved.
    pub fn restore_state(&mut self, state: ScannerState) {
        self.pos = state.pos;
        self.token_start = state.token_start;
        self.token = state.token;
        self.token_value = state.token_value;
        self.token_flags = state.token_flags;
        self.modes = state.modes;
        if self.diagnostics.len() > state.diagnostic_count {
            let kept: Vec<_> = self
                .diagnostics
                .diagnostics()
                .iter()
                .take(state.diagnostic_count)
                .cloned()
                .collect();
            self.diagnostics.clear();
            self.diagnostics.extend_from_slice(&kept);
        }
    }

    // ========================================================================
    // Character access
    // ========================================================================

    #[inline]
    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    /// Look at the character at the current position without advancing.
    #[inline]
    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Look at the `n`th character after the current one.
    #[inline]
    fn char_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Advance past the current character.
    #[inline]
    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn report(&mut self, start: usize, message: &fxl_diagnostics::DiagnosticMessage, args: &[&str]) {
        let span = Span::new(start as u32, self.pos.max(start) as u32);
        self.diagnostics.report(span, message, args);
    }

    /// Skip whitespace and comments (trivia), setting token_flags for line breaks.
    fn skip_trivia(&mut self) {
        loop {
            let Some(ch) = self.current_char() else {
                return;
            };
            match ch {
                c if is_line_break(c) => {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.advance();
                }
                c if is_white_space_single_line(c) => self.advance(),
                '/' if self.char_at(1) == Some('/') => {
                    // Single-line comment
                    let body = &self.text.as_bytes()[self.pos..];
                    match memchr::memchr2(b'\n', b'\r', body) {
                        Some(offset) => self.pos += offset,
                        None => self.pos = self.text.len(),
                    }
                }
                '/' if self.char_at(1) == Some('*') => {
                    // Multi-line comment
                    let start = self.pos;
                    let body = &self.text.as_bytes()[self.pos + 2..];
                    match memchr::memmem::find(body, b"*/") {
                        Some(offset) => {
                            if body[..offset].iter().any(|b| *b == b'\n' || *b == b'\r') {
                                self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                            }
                            self.pos += 2 + offset + 2;
                        }
                        None => {
                            self.pos = self.text.len();
                            self.report(start, &messages::UNTERMINATED_COMMENT, &[]);
                        }
                    }
                }
                _ => return,
            }
        }
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::NONE;
        self.token_value.clear();

        if self.modes.last() == Some(&Mode::Text) {
            self.token_start = self.pos;
            self.token = self.scan_interpolation_text();
            return self.token;
        }

        // Skip trivia (whitespace, comments)
        self.skip_trivia();
        self.token_start = self.pos;

        let Some(ch) = self.current_char() else {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            '[' => self.single(SyntaxKind::OpenBracketToken),
            ']' => self.single(SyntaxKind::CloseBracketToken),
            ';' => self.single(SyntaxKind::SemicolonToken),
            ',' => self.single(SyntaxKind::CommaToken),
            ':' => self.single(SyntaxKind::ColonToken),
            '+' => self.single(SyntaxKind::PlusToken),
            '-' => self.single(SyntaxKind::MinusToken),
            '*' => self.single(SyntaxKind::AsteriskToken),
            '/' => self.single(SyntaxKind::SlashToken),
            '^' => self.single(SyntaxKind::CaretToken),
            '%' => self.single(SyntaxKind::PercentToken),
            '=' => self.single(SyntaxKind::EqualsToken),
            '!' => self.single(SyntaxKind::ExclamationToken),
            '{' => self.scan_open_brace(),
            '}' => self.scan_close_brace(),
            '.' => self.scan_dot(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_bar(),
            '"' => self.scan_string_literal(),
            '\'' => self.scan_quoted_identifier(),
            '$' if self.char_at(1) == Some('"') => {
                self.pos += 2;
                self.modes.push(Mode::Text);
                SyntaxKind::InterpolationStart
            }
            '0'..='9' => self.scan_number(),
            _ if is_identifier_start(ch) => self.scan_identifier(),
            _ => {
                let start = self.pos;
                self.advance();
                let text = ch.to_string();
                self.report(start, &messages::INVALID_CHARACTER, &[&text]);
                SyntaxKind::Unknown
            }
        };

        self.token
    }

    // ========================================================================
    // Token-specific scanning methods
    // ========================================================================

    #[inline]
    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    fn scan_open_brace(&mut self) -> SyntaxKind {
        if let Some(Mode::Island { depth }) = self.modes.last_mut() {
            *depth += 1;
        }
        self.single(SyntaxKind::OpenBraceToken)
    }

    fn scan_close_brace(&mut self) -> SyntaxKind {
        match self.modes.last_mut() {
            Some(Mode::Island { depth }) if *depth > 0 => *depth -= 1,
            Some(Mode::Island { .. }) => {
                // End of the island; back to interpolated text.
                self.modes.pop();
            }
            _ => {}
        }
        self.single(SyntaxKind::CloseBraceToken)
    }

    fn scan_dot(&mut self) -> SyntaxKind {
        if self.char_at(1).map_or(false, is_digit) {
            self.scan_number()
        } else {
            self.single(SyntaxKind::DotToken)
        }
    }

    fn scan_less_than(&mut self) -> SyntaxKind {
        match self.char_at(1) {
            Some('=') => {
                self.pos += 2;
                SyntaxKind::LessThanEqualsToken
            }
            Some('>') => {
                self.pos += 2;
                SyntaxKind::LessThanGreaterThanToken
            }
            _ => self.single(SyntaxKind::LessThanToken),
        }
    }

    fn scan_greater_than(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            self.pos += 2;
            SyntaxKind::GreaterThanEqualsToken
        } else {
            self.single(SyntaxKind::GreaterThanToken)
        }
    }

    fn scan_ampersand(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('&') {
            self.pos += 2;
            SyntaxKind::AmpersandAmpersandToken
        } else {
            self.single(SyntaxKind::AmpersandToken)
        }
    }

    fn scan_bar(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('|') {
            self.pos += 2;
            SyntaxKind::BarBarToken
        } else {
            let start = self.pos;
            self.pos += 1;
            self.report(start, &messages::INVALID_CHARACTER, &["|"]);
            SyntaxKind::Unknown
        }
    }

    /// `"..."` with `""` standing for an embedded quote.
    fn scan_string_literal(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1; // skip opening quote
        let mut result = String::new();
        loop {
            let body = &self.text.as_bytes()[self.pos..];
            match memchr::memchr(b'"', body) {
                Some(offset) => {
                    result.push_str(&self.text[self.pos..self.pos + offset]);
                    self.pos += offset + 1;
                    if self.current_char() == Some('"') {
                        result.push('"');
                        self.token_flags |= TokenFlags::HAS_ESCAPE;
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
                None => {
                    result.push_str(&self.text[self.pos..]);
                    self.pos = self.text.len();
                    self.token_flags |= TokenFlags::UNTERMINATED;
                    self.report(start, &messages::UNTERMINATED_STRING_LITERAL, &[]);
                    break;
                }
            }
        }
        self.token_value = result;
        SyntaxKind::StringLiteral
    }

    /// `'Some Name'` with `''` standing for an embedded quote.
    fn scan_quoted_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut result = String::new();
        loop {
            match self.current_char() {
                None => {
                    self.token_flags |= TokenFlags::UNTERMINATED;
                    self.report(start, &messages::UNTERMINATED_QUOTED_IDENTIFIER, &[]);
                    break;
                }
                Some('\'') => {
                    self.pos += 1;
                    if self.current_char() == Some('\'') {
                        result.push('\'');
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
        if result.is_empty() && !self.token_flags.contains(TokenFlags::UNTERMINATED) {
            self.report(start, &messages::EMPTY_IDENTIFIER, &[]);
        }
        self.token_flags |= TokenFlags::QUOTED;
        self.token_value = result;
        SyntaxKind::Identifier
    }

    /// Literal text inside `$"..."`: stops before an unescaped `{` or `"`.
    fn scan_interpolation_text(&mut self) -> SyntaxKind {
        let start = self.pos;
        let mut result = String::new();
        loop {
            let body = &self.text.as_bytes()[self.pos..];
            let Some(offset) = memchr::memchr3(b'"', b'{', b'}', body) else {
                result.push_str(&self.text[self.pos..]);
                self.pos = self.text.len();
                break;
            };
            result.push_str(&self.text[self.pos..self.pos + offset]);
            self.pos += offset;
            let ch = body[offset];
            if self.text.as_bytes().get(self.pos + 1) == Some(&ch) {
                // `""`, `{{` and `}}` escapes
                result.push(ch as char);
                self.token_flags |= TokenFlags::HAS_ESCAPE;
                self.pos += 2;
                continue;
            }
            if ch == b'}' {
                result.push('}');
                self.pos += 1;
                continue;
            }
            break;
        }

        if self.pos > start {
            self.token_value = result;
            return SyntaxKind::InterpolationText;
        }

        match self.current_char() {
            Some('{') => {
                self.pos += 1;
                self.modes.push(Mode::Island { depth: 0 });
                SyntaxKind::OpenBraceToken
            }
            Some('"') => {
                self.pos += 1;
                self.modes.pop();
                SyntaxKind::InterpolationEnd
            }
            _ => {
                // End of input inside the string.
                self.modes.pop();
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.report(start, &messages::UNTERMINATED_STRING_LITERAL, &[]);
                SyntaxKind::InterpolationEnd
            }
        }
    }

    /// Decimal numbers with optional fraction and exponent.
    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        let bytes = self.text.as_bytes();
        let digits = |mut i: usize| {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            i
        };

        let mut end = digits(self.pos);
        if end < bytes.len() && bytes[end] == b'.' {
            self.token_flags |= TokenFlags::HAS_DECIMAL_POINT;
            end = digits(end + 1);
        }
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp = end + 1;
            if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                exp += 1;
            }
            let exp_end = digits(exp);
            if exp_end > exp {
                self.token_flags |= TokenFlags::HAS_EXPONENT;
                end = exp_end;
            }
        }
        self.pos = end;
        self.token_value = self.text[start..end].to_string();
        SyntaxKind::NumericLiteral
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.advance();
        while let Some(ch) = self.current_char() {
            if !is_identifier_part(ch) {
                break;
            }
            self.advance();
        }
        let text = &self.text[start..self.pos];
        self.token_value = text.to_string();
        SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::Identifier)
    }
}
