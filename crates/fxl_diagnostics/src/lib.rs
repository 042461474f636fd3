//! fxl_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! User-level problems in a formula (bad syntax, unknown names, type and
//! arity mismatches, cyclic definitions) never abort analysis. They are
//! recorded as [`Diagnostic`]s carrying a message and a source span, and
//! collected in a [`DiagnosticCollection`] threaded through each stage.

use fxl_core::text::Span;
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    /// Supporting note attached to another diagnostic.
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Message => write!(f, "note"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1005, 2001).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The source span `[min, lim)` the diagnostic refers to.
    pub span: Span,
    /// The formatted message.
    pub message_text: String,
    /// The diagnostic code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
    /// Related diagnostics.
    pub related_information: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a diagnostic at `span`.
    pub fn new(span: Span, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    /// Add related diagnostic information.
    pub fn with_related(mut self, related: Diagnostic) -> Self {
        self.related_information.push(related);
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Shift the span by `offset` bytes, used when a formula is checked as
    /// a slice of a larger document.
    pub fn offset_by(mut self, offset: u32) -> Self {
        self.span = Span::new(self.span.min + offset, self.span.lim + offset);
        for related in &mut self.related_information {
            related.span = Span::new(related.span.min + offset, related.span.lim + offset);
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} FX{} {}: {}",
            self.category, self.code, self.span, self.message_text
        )
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated during analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Shorthand for `add(Diagnostic::new(..))`.
    pub fn report(&mut self, span: Span, message: &DiagnosticMessage, args: &[&str]) {
        self.add(Diagnostic::new(span, message, args));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn extend_from_slice(&mut self, diagnostics: &[Diagnostic]) {
        self.diagnostics.extend_from_slice(diagnostics);
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Sort diagnostics by position. Stable, so diagnostics at the same
    /// position keep their report order.
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| a.span.min.cmp(&b.span.min).then(a.span.lim.cmp(&b.span.lim)));
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
        ($code:expr, Message, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Message, message: $msg }
        };
    }

    // ========================================================================
    // Scanner and parser errors (1000-1099)
    // ========================================================================
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1001, Error, "Unterminated string literal.");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1002, Error, "Unexpected character '{0}'.");
    pub const UNTERMINATED_COMMENT: DiagnosticMessage = diag!(1003, Error, "Unterminated comment; expected '*/'.");
    pub const UNTERMINATED_QUOTED_IDENTIFIER: DiagnosticMessage = diag!(1004, Error, "Unterminated quoted identifier; expected a closing '''.");
    pub const _0_EXPECTED: DiagnosticMessage = diag!(1005, Error, "Expected '{0}'.");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!(1006, Error, "Expected an operand. The formula or expression expects a valid operand.");
    pub const UNEXPECTED_TOKEN: DiagnosticMessage = diag!(1007, Error, "Unexpected characters. '{0}' is used in the formula in an unexpected way.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1008, Error, "Expected an identifier.");
    pub const CHAINING_NOT_ALLOWED: DiagnosticMessage = diag!(1009, Error, "Expressions cannot be chained with ';' here.");
    pub const EXPRESSION_TOO_LONG: DiagnosticMessage = diag!(1010, Error, "The formula is {0} characters long, which exceeds the limit of {1}.");
    pub const INVALID_NUMBER: DiagnosticMessage = diag!(1011, Error, "'{0}' is not a valid number.");
    pub const EMPTY_IDENTIFIER: DiagnosticMessage = diag!(1012, Error, "Quoted identifiers cannot be empty.");

    // ========================================================================
    // Binder errors (2000-2099)
    // ========================================================================
    pub const NAME_NOT_RECOGNIZED: DiagnosticMessage = diag!(2001, Error, "Name isn't valid. '{0}' isn't recognized.");
    pub const UNKNOWN_FUNCTION: DiagnosticMessage = diag!(2002, Error, "'{0}' is an unknown or unsupported function.");
    pub const INVALID_ARGUMENT_COUNT: DiagnosticMessage = diag!(2003, Error, "Invalid number of arguments: received {0}, expected {1}.");
    pub const BAD_ARGUMENT_TYPE: DiagnosticMessage = diag!(2004, Error, "Invalid argument type ({0}). Expecting a {1} value instead.");
    pub const BAD_OPERAND_TYPE: DiagnosticMessage = diag!(2005, Error, "The '{0}' operator cannot be applied to a value of type {1}.");
    pub const INCOMPARABLE_TYPES: DiagnosticMessage = diag!(2006, Error, "Incompatible types for comparison. These types can't be compared: {0}, {1}.");
    pub const FIELD_NOT_RECOGNIZED: DiagnosticMessage = diag!(2007, Error, "Name isn't valid. '{0}' isn't recognized as a member of {1}.");
    pub const NO_MEMBERS: DiagnosticMessage = diag!(2008, Error, "Invalid use of '.': a value of type {0} has no members.");
    pub const DUPLICATE_FIELD: DiagnosticMessage = diag!(2009, Error, "The field '{0}' appears more than once in this record.");
    pub const AS_NOT_PERMITTED: DiagnosticMessage = diag!(2010, Error, "'As' is only permitted on the first argument of a function that iterates a table.");
    pub const INCOMPATIBLE_TABLE_ROWS: DiagnosticMessage = diag!(2011, Error, "Table rows have incompatible types: {0} and {1}.");
    pub const INTERPOLATION_NOT_TEXT: DiagnosticMessage = diag!(2012, Error, "Interpolated values must be convertible to text; a value of type {0} is not.");
    pub const INCOMPATIBLE_BRANCHES: DiagnosticMessage = diag!(2013, Error, "The results of '{0}' have incompatible types: {1} and {2}.");
    pub const FUNCTION_USED_AS_VALUE: DiagnosticMessage = diag!(2014, Error, "'{0}' is a function and must be called with parentheses.");
    pub const TABLE_ARGUMENT_EXPECTED: DiagnosticMessage = diag!(2015, Error, "The first argument of '{0}' must be a table; found {1}.");
    pub const THIS_RECORD_UNAVAILABLE: DiagnosticMessage = diag!(2016, Error, "'ThisRecord' is only available inside a record scope.");
    pub const AMBIGUOUS_NAME: DiagnosticMessage = diag!(2017, Warning, "'{0}' is both a field of the current record and a global name; the field is used.");
    pub const MIXED_TABLE_ITEMS: DiagnosticMessage = diag!(2018, Error, "Table items must all be records or all be values; expected a {0} item, found {1}.");

    // ========================================================================
    // Definition and dependency errors (3000-3099)
    // ========================================================================
    pub const UNKNOWN_TYPE: DiagnosticMessage = diag!(3001, Error, "Unknown type '{0}'.");
    pub const DUPLICATE_PARAMETER: DiagnosticMessage = diag!(3002, Error, "The parameter '{0}' is declared more than once.");
    pub const NON_PRIMITIVE_RETURN_TYPE: DiagnosticMessage = diag!(3003, Error, "The return type '{0}' is not supported; user-defined functions must return a primitive type.");
    pub const DUPLICATE_DEFINITION: DiagnosticMessage = diag!(3004, Error, "'{0}' is already defined.");
    pub const CIRCULAR_REFERENCE: DiagnosticMessage = diag!(3005, Error, "Circular reference between named formulas: {0}.");
    pub const RETURN_TYPE_MISMATCH: DiagnosticMessage = diag!(3006, Error, "'{0}' is declared to return {1}, but its body has type {2}.");
    pub const CONFLICTS_WITH_HOST_NAME: DiagnosticMessage = diag!(3007, Error, "'{0}' conflicts with a name already defined by the host.");
    pub const NON_PRIMITIVE_PARAMETER_TYPE: DiagnosticMessage = diag!(3008, Error, "The parameter '{0}' has type '{1}'; user-defined function parameters must be primitive.");
    pub const DEFINITION_EXPECTED: DiagnosticMessage = diag!(3009, Error, "Expected a named formula ('name = expression;') or a function definition.");
    pub const FIRST_DEFINED_HERE: DiagnosticMessage = diag!(3010, Message, "'{0}' is first defined here.");
}
