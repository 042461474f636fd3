//! Operator precedence for binary operators.

use fxl_ast::syntax_kind::SyntaxKind;
use fxl_ast::types::BinaryOp;

/// Operator precedence levels, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    LogicalOr = 1,
    LogicalAnd = 2,
    /// Prefix `Not` / `!` binds looser than comparisons.
    LogicalNot = 3,
    Comparison = 4,
    Concatenation = 5,
    Additive = 6,
    Multiplicative = 7,
    Exponentiation = 8,
    Invalid = 255,
}

/// Get the binary operator precedence for a given token kind.
pub fn get_binary_operator_precedence(kind: SyntaxKind) -> OperatorPrecedence {
    match kind {
        SyntaxKind::OrKeyword | SyntaxKind::BarBarToken => OperatorPrecedence::LogicalOr,
        SyntaxKind::AndKeyword | SyntaxKind::AmpersandAmpersandToken => {
            OperatorPrecedence::LogicalAnd
        }
        SyntaxKind::EqualsToken
        | SyntaxKind::LessThanGreaterThanToken
        | SyntaxKind::LessThanToken
        | SyntaxKind::LessThanEqualsToken
        | SyntaxKind::GreaterThanToken
        | SyntaxKind::GreaterThanEqualsToken
        | SyntaxKind::InKeyword
        | SyntaxKind::ExactinKeyword => OperatorPrecedence::Comparison,
        SyntaxKind::AmpersandToken => OperatorPrecedence::Concatenation,
        SyntaxKind::PlusToken | SyntaxKind::MinusToken => OperatorPrecedence::Additive,
        SyntaxKind::AsteriskToken | SyntaxKind::SlashToken => OperatorPrecedence::Multiplicative,
        SyntaxKind::CaretToken => OperatorPrecedence::Exponentiation,
        _ => OperatorPrecedence::Invalid,
    }
}

/// Map a binary operator token to its operator.
pub fn binary_operator(kind: SyntaxKind) -> Option<BinaryOp> {
    Some(match kind {
        SyntaxKind::OrKeyword | SyntaxKind::BarBarToken => BinaryOp::Or,
        SyntaxKind::AndKeyword | SyntaxKind::AmpersandAmpersandToken => BinaryOp::And,
        SyntaxKind::EqualsToken => BinaryOp::Eq,
        SyntaxKind::LessThanGreaterThanToken => BinaryOp::NotEq,
        SyntaxKind::LessThanToken => BinaryOp::Lt,
        SyntaxKind::LessThanEqualsToken => BinaryOp::LtEq,
        SyntaxKind::GreaterThanToken => BinaryOp::Gt,
        SyntaxKind::GreaterThanEqualsToken => BinaryOp::GtEq,
        SyntaxKind::InKeyword => BinaryOp::In,
        SyntaxKind::ExactinKeyword => BinaryOp::ExactIn,
        SyntaxKind::AmpersandToken => BinaryOp::Concat,
        SyntaxKind::PlusToken => BinaryOp::Add,
        SyntaxKind::MinusToken => BinaryOp::Sub,
        SyntaxKind::AsteriskToken => BinaryOp::Mul,
        SyntaxKind::SlashToken => BinaryOp::Div,
        SyntaxKind::CaretToken => BinaryOp::Pow,
        _ => return None,
    })
}
