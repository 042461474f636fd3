//! The formula parser implementation.
//!
//! A recursive descent parser with precedence climbing for binary operators.
//! It consumes tokens from the scanner and builds an arena-allocated tree.
//! Every node's span runs from the start of its first token to the end of
//! its last consumed token, so spans never include trailing trivia.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use fxl_ast::node::*;
use fxl_ast::syntax_kind::SyntaxKind;
use fxl_ast::types::*;
use fxl_core::Span;
use fxl_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use fxl_scanner::Scanner;

use crate::precedence::{binary_operator, get_binary_operator_precedence, OperatorPrecedence};
use crate::utilities::{can_start_expression, is_closing_token, token_display};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// Syntax options for a parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Permit `a; b` chains at expression level.
    pub allow_chaining: bool,
    /// Reject formulas longer than this many bytes without parsing them.
    pub max_expression_length: Option<usize>,
}

/// Result of parsing one formula.
#[derive(Debug)]
pub struct ParsedFormula<'a> {
    pub root: Expr<'a>,
    pub text: &'a str,
    /// Number of node ids handed out; ids are `0..node_count`.
    pub node_count: u32,
    pub diagnostics: DiagnosticCollection,
}

impl<'a> ParsedFormula<'a> {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Result of parsing a named-formula document.
#[derive(Debug)]
pub struct ParsedDocument<'a> {
    pub document: Document<'a>,
    pub node_count: u32,
    pub diagnostics: DiagnosticCollection,
}

/// The parser produces a formula tree or a document from source text.
pub struct Parser<'a> {
    arena: &'a Bump,
    scanner: Scanner<'a>,
    source_text: &'a str,
    options: ParseOptions,
    diagnostics: DiagnosticCollection,
    /// End of the most recently consumed token.
    prev_end: u32,
    next_id: u32,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Bump, source_text: &str, options: ParseOptions) -> Self {
        let source_text: &'a str = arena.alloc_str(source_text);
        Self {
            arena,
            scanner: Scanner::new(source_text),
            source_text,
            options,
            diagnostics: DiagnosticCollection::new(),
            prev_end: 0,
            next_id: 0,
            recursion_depth: 0,
        }
    }

    /// Parse the whole text as a single formula.
    pub fn parse_formula(mut self) -> ParsedFormula<'a> {
        let len = self.source_text.len();
        if let Some(max) = self.options.max_expression_length {
            if len > max {
                let span = Span::new(0, len as u32);
                self.diagnostics.report(
                    span,
                    &messages::EXPRESSION_TOO_LONG,
                    &[&len.to_string(), &max.to_string()],
                );
                let root = self.error_expr(span);
                return self.finish_formula(root);
            }
        }

        self.next_token();
        let root = self.parse_expression();
        if self.current_token() != SyntaxKind::EndOfFileToken {
            self.error_at_current(&messages::UNEXPECTED_TOKEN);
        }
        self.finish_formula(root)
    }

    fn finish_formula(mut self, root: Expr<'a>) -> ParsedFormula<'a> {
        let mut diagnostics = self.scanner.take_diagnostics();
        diagnostics.extend(std::mem::take(&mut self.diagnostics));
        diagnostics.sort();
        ParsedFormula {
            root,
            text: self.source_text,
            node_count: self.next_id,
            diagnostics,
        }
    }

    /// Parse the text as a script of named formulas and user-defined
    /// functions.
    pub fn parse_document(mut self) -> ParsedDocument<'a> {
        self.next_token();
        let mut items = BumpVec::new_in(self.arena);
        while self.current_token() != SyntaxKind::EndOfFileToken {
            let start = self.scanner.token_start();
            if let Some(item) = self.parse_doc_item() {
                items.push(item);
            }
            if self.scanner.token_start() == start
                && self.current_token() != SyntaxKind::EndOfFileToken
            {
                self.next_token();
            }
        }

        let mut diagnostics = self.scanner.take_diagnostics();
        diagnostics.extend(std::mem::take(&mut self.diagnostics));
        diagnostics.sort();
        ParsedDocument {
            document: Document {
                items: items.into_bump_slice(),
                text: self.source_text,
            },
            node_count: self.next_id,
            diagnostics,
        }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current_token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    fn next_token(&mut self) -> SyntaxKind {
        self.prev_end = self.scanner.token_end() as u32;
        self.scanner.scan()
    }

    #[inline]
    fn token_pos(&self) -> u32 {
        self.scanner.token_start() as u32
    }

    #[inline]
    fn token_value(&self) -> &str {
        self.scanner.token_value()
    }

    fn new_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Node data spanning from `start` to the end of the last consumed token.
    fn finish_node(&mut self, start: u32) -> NodeData {
        let id = self.new_id();
        NodeData::new(id, Span::new(start, self.prev_end.max(start)))
    }

    fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            let pos = self.token_pos();
            self.diagnostics
                .report(Span::empty(pos), &messages::_0_EXPECTED, &[kind.text()]);
            false
        }
    }

    fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    fn error_at_current(&mut self, message: &DiagnosticMessage) {
        let span = self.scanner.token_span();
        let text = token_display(self.current_token(), self.token_value());
        self.diagnostics.report(span, message, &[&text]);
    }

    fn error_expr(&mut self, span: Span) -> Expr<'a> {
        let id = self.new_id();
        let data = NodeData::new(id, span).with_flags(NodeFlags::MISSING);
        Expr::Error(self.arena.alloc(ErrorExpr { data }))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Chain level: `a; b; c` when chaining is allowed.
    fn parse_expression(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        let first = self.parse_expression_no_chain();
        if self.current_token() != SyntaxKind::SemicolonToken {
            return first;
        }

        if !self.options.allow_chaining {
            let span = self.scanner.token_span();
            self.diagnostics
                .report(span, &messages::CHAINING_NOT_ALLOWED, &[]);
        }

        let mut items = BumpVec::new_in(self.arena);
        items.push(first);
        while self.parse_optional(SyntaxKind::SemicolonToken) {
            // A trailing `;` is allowed.
            if !can_start_expression(self.current_token()) {
                break;
            }
            items.push(self.parse_expression_no_chain());
        }
        let data = self.finish_node(start);
        Expr::Chain(self.arena.alloc(ChainExpr {
            data,
            items: items.into_bump_slice(),
        }))
    }

    fn parse_expression_no_chain(&mut self) -> Expr<'a> {
        self.parse_binary_expression_or_higher(OperatorPrecedence::Lowest)
    }

    fn parse_binary_expression_or_higher(&mut self, precedence: OperatorPrecedence) -> Expr<'a> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.recursion_depth -= 1;
            let span = self.scanner.token_span();
            self.diagnostics
                .report(span, &messages::EXPRESSION_EXPECTED, &[]);
            return self.error_expr(span);
        }

        let start = self.token_pos();
        let mut left = self.parse_unary_expression_or_higher();
        loop {
            let kind = self.current_token();
            let new_precedence = get_binary_operator_precedence(kind);
            if new_precedence == OperatorPrecedence::Invalid || new_precedence <= precedence {
                break;
            }
            let Some(op) = binary_operator(kind) else {
                break;
            };
            self.next_token();
            let right = self.parse_binary_expression_or_higher(new_precedence);
            let data = self.finish_node(start);
            left = Expr::Binary(self.arena.alloc(BinaryExpr {
                data,
                op,
                left,
                right,
            }));
        }

        self.recursion_depth -= 1;
        left
    }

    fn parse_unary_expression_or_higher(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        match self.current_token() {
            SyntaxKind::NotKeyword | SyntaxKind::ExclamationToken => {
                self.next_token();
                // `Not` binds looser than comparisons: `Not a = b` is `Not (a = b)`.
                let operand = self.parse_binary_expression_or_higher(OperatorPrecedence::LogicalAnd);
                let data = self.finish_node(start);
                Expr::Unary(self.arena.alloc(UnaryExpr {
                    data,
                    op: UnaryOp::Not,
                    operand,
                }))
            }
            SyntaxKind::MinusToken => {
                self.next_token();
                let operand = self.parse_unary_expression_or_higher();
                let data = self.finish_node(start);
                Expr::Unary(self.arena.alloc(UnaryExpr {
                    data,
                    op: UnaryOp::Negate,
                    operand,
                }))
            }
            _ => self.parse_postfix_expression(),
        }
    }

    /// Postfix `%` over member/call expressions.
    fn parse_postfix_expression(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        let mut expr = self.parse_member_expression();
        while self.current_token() == SyntaxKind::PercentToken {
            self.next_token();
            let data = self.finish_node(start);
            expr = Expr::Unary(self.arena.alloc(UnaryExpr {
                data,
                op: UnaryOp::Percent,
                operand: expr,
            }));
        }
        expr
    }

    /// `.member` access, and `Ns.Func(...)` calls on pure identifier chains.
    fn parse_member_expression(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        let mut expr = self.parse_primary_expression();
        while self.current_token() == SyntaxKind::DotToken {
            self.next_token();
            let member = self.parse_identifier();
            if self.current_token() == SyntaxKind::OpenParenToken {
                match self.namespace_of(expr) {
                    Some(namespace) => {
                        expr = self.parse_call_rest(start, namespace, member);
                        continue;
                    }
                    None => {
                        self.error_at_current(&messages::UNEXPECTED_TOKEN);
                    }
                }
            }
            let data = self.finish_node(start);
            expr = Expr::Dotted(self.arena.alloc(DottedExpr {
                data,
                object: expr,
                member,
            }));
        }
        expr
    }

    /// The identifiers of a pure `a.b.c` chain, used as a call namespace.
    fn namespace_of(&self, expr: Expr<'a>) -> Option<&'a [Identifier<'a>]> {
        fn collect<'a>(expr: Expr<'a>, out: &mut Vec<Identifier<'a>>) -> bool {
            match expr {
                Expr::Ident(id) => {
                    out.push(*id);
                    true
                }
                Expr::Dotted(d) => {
                    if !collect(d.object, out) {
                        return false;
                    }
                    out.push(d.member);
                    true
                }
                _ => false,
            }
        }
        let mut segments = Vec::new();
        if collect(expr, &mut segments) {
            Some(self.arena.alloc_slice_copy(&segments))
        } else {
            None
        }
    }

    fn parse_primary_expression(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        match self.current_token() {
            SyntaxKind::NumericLiteral => self.parse_number_literal(),
            SyntaxKind::StringLiteral => {
                let value: &'a str = self.arena.alloc_str(self.scanner.token_value());
                self.next_token();
                let data = self.finish_node(start);
                Expr::String(self.arena.alloc(StringLiteral { data, value }))
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = self.current_token() == SyntaxKind::TrueKeyword;
                self.next_token();
                let data = self.finish_node(start);
                Expr::Boolean(self.arena.alloc(BooleanLiteral { data, value }))
            }
            SyntaxKind::InterpolationStart => self.parse_interpolation(),
            SyntaxKind::Identifier => {
                let name = self.parse_identifier();
                if self.current_token() == SyntaxKind::OpenParenToken {
                    self.parse_call_rest(start, &[], name)
                } else {
                    Expr::Ident(self.arena.alloc(name))
                }
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let inner = self.parse_expression();
                self.parse_expected(SyntaxKind::CloseParenToken);
                inner
            }
            SyntaxKind::OpenBraceToken => self.parse_record(),
            SyntaxKind::OpenBracketToken => self.parse_table(),
            kind => {
                let span = if is_closing_token(kind) {
                    Span::empty(start)
                } else {
                    self.scanner.token_span()
                };
                self.diagnostics
                    .report(span, &messages::EXPRESSION_EXPECTED, &[]);
                if !is_closing_token(kind) {
                    self.next_token();
                }
                self.error_expr(span)
            }
        }
    }

    fn parse_number_literal(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        let text: &'a str = self.arena.alloc_str(self.scanner.token_value());
        let span = self.scanner.token_span();
        let value = match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                self.diagnostics
                    .report(span, &messages::INVALID_NUMBER, &[text]);
                0.0
            }
        };
        self.next_token();
        let data = self.finish_node(start);
        Expr::Number(self.arena.alloc(NumberLiteral { data, text, value }))
    }

    fn parse_identifier(&mut self) -> Identifier<'a> {
        let start = self.token_pos();
        if self.current_token() == SyntaxKind::Identifier {
            let quoted = self.scanner.token_flags().contains(TokenFlags::QUOTED);
            let text: &'a str = self.arena.alloc_str(self.scanner.token_value());
            self.next_token();
            let mut data = self.finish_node(start);
            if quoted {
                data = data.with_flags(NodeFlags::QUOTED);
            }
            Identifier { data, text }
        } else {
            self.error_at_current(&messages::IDENTIFIER_EXPECTED);
            let id = self.new_id();
            Identifier {
                data: NodeData::new(id, Span::empty(start)).with_flags(NodeFlags::MISSING),
                text: "",
            }
        }
    }

    /// Arguments of a call whose name has been consumed.
    fn parse_call_rest(
        &mut self,
        start: u32,
        namespace: &'a [Identifier<'a>],
        name: Identifier<'a>,
    ) -> Expr<'a> {
        self.parse_expected(SyntaxKind::OpenParenToken);
        let mut args = BumpVec::new_in(self.arena);
        if self.current_token() != SyntaxKind::CloseParenToken {
            loop {
                args.push(self.parse_argument());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        let data = self.finish_node(start);
        Expr::Call(self.arena.alloc(CallExpr {
            data,
            namespace,
            name,
            args: args.into_bump_slice(),
        }))
    }

    /// One call argument, optionally aliased with `As`.
    fn parse_argument(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        let operand = self.parse_expression();
        if self.current_token() != SyntaxKind::AsKeyword {
            return operand;
        }
        self.next_token();
        let alias = self.parse_identifier();
        let data = self.finish_node(start);
        Expr::As(self.arena.alloc(AsExpr {
            data,
            operand,
            alias,
        }))
    }

    /// `{ name: expr, ... }`
    fn parse_record(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        self.next_token();
        let mut fields = BumpVec::new_in(self.arena);
        if self.current_token() != SyntaxKind::CloseBraceToken {
            loop {
                let field_start = self.token_pos();
                let name = self.parse_identifier();
                self.parse_expected(SyntaxKind::ColonToken);
                let value = self.parse_expression();
                let data = self.finish_node(field_start);
                fields.push(RecordField { data, name, value });
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        let data = self.finish_node(start);
        Expr::Record(self.arena.alloc(RecordExpr {
            data,
            fields: fields.into_bump_slice(),
        }))
    }

    /// `[ expr, ... ]`
    fn parse_table(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        self.next_token();
        let mut items = BumpVec::new_in(self.arena);
        if self.current_token() != SyntaxKind::CloseBracketToken {
            loop {
                items.push(self.parse_expression());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.parse_expected(SyntaxKind::CloseBracketToken);
        let data = self.finish_node(start);
        Expr::Table(self.arena.alloc(TableExpr {
            data,
            items: items.into_bump_slice(),
        }))
    }

    /// `$"text {expr} text"`
    fn parse_interpolation(&mut self) -> Expr<'a> {
        let start = self.token_pos();
        self.next_token();
        let mut parts = BumpVec::new_in(self.arena);
        loop {
            match self.current_token() {
                SyntaxKind::InterpolationText => {
                    let text_start = self.token_pos();
                    let value: &'a str = self.arena.alloc_str(self.scanner.token_value());
                    self.next_token();
                    let data = self.finish_node(text_start);
                    parts.push(InterpolationPart::Text(
                        self.arena.alloc(InterpolationText { data, value }),
                    ));
                }
                SyntaxKind::OpenBraceToken => {
                    self.next_token();
                    let expr = self.parse_expression();
                    parts.push(InterpolationPart::Expr(expr));
                    self.parse_expected(SyntaxKind::CloseBraceToken);
                }
                SyntaxKind::InterpolationEnd => {
                    self.next_token();
                    break;
                }
                _ => {
                    self.error_at_current(&messages::UNEXPECTED_TOKEN);
                    break;
                }
            }
        }
        let data = self.finish_node(start);
        Expr::Interpolation(self.arena.alloc(InterpolationExpr {
            data,
            parts: parts.into_bump_slice(),
        }))
    }

    // ========================================================================
    // Documents
    // ========================================================================

    fn parse_doc_item(&mut self) -> Option<DocItem<'a>> {
        if self.current_token() != SyntaxKind::Identifier {
            self.error_at_current(&messages::DEFINITION_EXPECTED);
            self.skip_past_semicolon();
            return None;
        }

        let start = self.token_pos();
        let name = self.parse_identifier();
        match self.current_token() {
            SyntaxKind::EqualsToken => {
                self.next_token();
                let body = self.parse_expression_no_chain();
                self.expect_item_end();
                let data = self.finish_node(start);
                Some(DocItem::Formula(
                    self.arena.alloc(NamedFormula { data, name, body }),
                ))
            }
            SyntaxKind::OpenParenToken => self.parse_udf(start, name),
            _ => {
                self.error_at_current(&messages::DEFINITION_EXPECTED);
                self.skip_past_semicolon();
                None
            }
        }
    }

    fn parse_udf(&mut self, start: u32, name: Identifier<'a>) -> Option<DocItem<'a>> {
        self.next_token();
        let mut params = BumpVec::new_in(self.arena);
        if self.current_token() != SyntaxKind::CloseParenToken {
            loop {
                let param_start = self.token_pos();
                let param_name = self.parse_identifier();
                self.parse_expected(SyntaxKind::ColonToken);
                let ty = self.parse_type_ref();
                let data = self.finish_node(param_start);
                params.push(Param {
                    data,
                    name: param_name,
                    ty,
                });
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        self.parse_expected(SyntaxKind::ColonToken);
        let return_type = self.parse_type_ref();

        let body = match self.current_token() {
            SyntaxKind::EqualsToken => {
                self.next_token();
                let body = self.parse_expression_no_chain();
                self.expect_item_end();
                UdfBody::Expr(body)
            }
            SyntaxKind::OpenBraceToken => {
                let body = self.parse_block_body();
                self.parse_optional(SyntaxKind::SemicolonToken);
                UdfBody::Block(body)
            }
            _ => {
                self.error_at_current(&messages::DEFINITION_EXPECTED);
                self.skip_past_semicolon();
                return None;
            }
        };

        let data = self.finish_node(start);
        Some(DocItem::Udf(self.arena.alloc(UdfDecl {
            data,
            name,
            params: params.into_bump_slice(),
            return_type,
            body,
        })))
    }

    fn parse_type_ref(&mut self) -> TypeRef<'a> {
        let start = self.token_pos();
        let name = self.parse_identifier();
        let data = self.finish_node(start);
        TypeRef { data, name }
    }

    /// `{ a; b; }`
    fn parse_block_body(&mut self) -> &'a BlockBody<'a> {
        let start = self.token_pos();
        self.next_token();
        let mut statements = BumpVec::new_in(self.arena);
        while can_start_expression(self.current_token()) {
            statements.push(self.parse_expression_no_chain());
            if !self.parse_optional(SyntaxKind::SemicolonToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        let data = self.finish_node(start);
        self.arena.alloc(BlockBody {
            data,
            statements: statements.into_bump_slice(),
        })
    }

    fn expect_item_end(&mut self) {
        if !self.parse_optional(SyntaxKind::SemicolonToken) {
            self.error_at_current(&messages::UNEXPECTED_TOKEN);
            self.skip_past_semicolon();
        }
    }

    /// Error recovery: skip tokens through the next `;` outside brackets.
    fn skip_past_semicolon(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.current_token() {
                SyntaxKind::EndOfFileToken => return,
                SyntaxKind::SemicolonToken if depth == 0 => {
                    self.next_token();
                    return;
                }
                SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenBracketToken => depth += 1,
                SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::CloseBracketToken => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.next_token();
        }
    }
}

/// Parse `text` as a single formula.
pub fn parse_formula<'a>(arena: &'a Bump, text: &str, options: ParseOptions) -> ParsedFormula<'a> {
    Parser::new(arena, text, options).parse_formula()
}

/// Parse `text` as a named-formula document.
pub fn parse_document<'a>(arena: &'a Bump, text: &str) -> ParsedDocument<'a> {
    Parser::new(arena, text, ParseOptions::default()).parse_document()
}
