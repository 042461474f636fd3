//! Dispatch helpers for syntax nodes: node data access and kind names.

use crate::node::*;
use crate::types::NodeId;
use fxl_core::Span;

impl<'a> Expr<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Expr::Number(n) => &n.data,
            Expr::String(n) => &n.data,
            Expr::Boolean(n) => &n.data,
            Expr::Ident(n) => &n.data,
            Expr::Unary(n) => &n.data,
            Expr::Binary(n) => &n.data,
            Expr::Chain(n) => &n.data,
            Expr::Dotted(n) => &n.data,
            Expr::Call(n) => &n.data,
            Expr::Record(n) => &n.data,
            Expr::Table(n) => &n.data,
            Expr::Interpolation(n) => &n.data,
            Expr::As(n) => &n.data,
            Expr::Error(n) => &n.data,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.data().id
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.data().span
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "NumberLiteral",
            Expr::String(_) => "StringLiteral",
            Expr::Boolean(_) => "BooleanLiteral",
            Expr::Ident(_) => "Identifier",
            Expr::Unary(_) => "UnaryExpression",
            Expr::Binary(_) => "BinaryExpression",
            Expr::Chain(_) => "ChainExpression",
            Expr::Dotted(_) => "DottedExpression",
            Expr::Call(_) => "CallExpression",
            Expr::Record(_) => "RecordExpression",
            Expr::Table(_) => "TableExpression",
            Expr::Interpolation(_) => "InterpolationExpression",
            Expr::As(_) => "AsExpression",
            Expr::Error(_) => "ErrorExpression",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expr::Error(_))
    }

    pub fn as_identifier(&self) -> Option<&'a Identifier<'a>> {
        match *self {
            Expr::Ident(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&'a CallExpr<'a>> {
        match *self {
            Expr::Call(n) => Some(n),
            _ => None,
        }
    }
}

impl<'a> InterpolationPart<'a> {
    pub fn span(&self) -> Span {
        match self {
            InterpolationPart::Text(t) => t.data.span,
            InterpolationPart::Expr(e) => e.span(),
        }
    }
}
