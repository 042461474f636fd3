//! Syntax tree node definitions for the formula language.
//!
//! Nodes are allocated in a bump arena and reference their children through
//! `&'a` references. Text is arena-allocated as `&'a str`; nothing in the
//! tree owns heap memory, so dropping the arena frees the whole tree.

use crate::types::*;
use fxl_core::{Name, Path, Span};

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Common data shared by all syntax nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    /// Unique node id within the parse.
    pub id: NodeId,
    /// Source range `[min, lim)`.
    pub span: Span,
    pub flags: NodeFlags,
}

impl NodeData {
    pub fn new(id: NodeId, span: Span) -> Self {
        Self {
            id,
            span,
            flags: NodeFlags::NONE,
        }
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Identifier
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Identifier<'a> {
    pub data: NodeData,
    /// Unquoted identifier text.
    pub text: &'a str,
}

impl<'a> Identifier<'a> {
    pub fn name(&self) -> Name {
        Name::new(self.text)
    }

    pub fn is_quoted(&self) -> bool {
        self.data.flags.contains(NodeFlags::QUOTED)
    }

    pub fn is_missing(&self) -> bool {
        self.data.flags.contains(NodeFlags::MISSING)
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// A formula expression. A closed set of variants: every stage matches
/// exhaustively on it.
#[derive(Debug, Clone, Copy)]
pub enum Expr<'a> {
    Number(&'a NumberLiteral<'a>),
    String(&'a StringLiteral<'a>),
    Boolean(&'a BooleanLiteral),
    Ident(&'a Identifier<'a>),
    Unary(&'a UnaryExpr<'a>),
    Binary(&'a BinaryExpr<'a>),
    /// `a; b; c`
    Chain(&'a ChainExpr<'a>),
    /// `record.field`
    Dotted(&'a DottedExpr<'a>),
    Call(&'a CallExpr<'a>),
    Record(&'a RecordExpr<'a>),
    Table(&'a TableExpr<'a>),
    Interpolation(&'a InterpolationExpr<'a>),
    /// `source As Alias`
    As(&'a AsExpr<'a>),
    /// Placeholder produced by error recovery.
    Error(&'a ErrorExpr),
}

#[derive(Debug, Clone, Copy)]
pub struct NumberLiteral<'a> {
    pub data: NodeData,
    pub text: &'a str,
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct StringLiteral<'a> {
    pub data: NodeData,
    /// Value with escapes resolved.
    pub value: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct BooleanLiteral {
    pub data: NodeData,
    pub value: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryExpr<'a> {
    pub data: NodeData,
    pub op: UnaryOp,
    pub operand: Expr<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<'a> {
    pub data: NodeData,
    pub op: BinaryOp,
    pub left: Expr<'a>,
    pub right: Expr<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChainExpr<'a> {
    pub data: NodeData,
    pub items: NodeList<'a, Expr<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct DottedExpr<'a> {
    pub data: NodeData,
    pub object: Expr<'a>,
    pub member: Identifier<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct CallExpr<'a> {
    pub data: NodeData,
    /// Namespace qualifiers, empty for an unqualified call.
    pub namespace: NodeList<'a, Identifier<'a>>,
    pub name: Identifier<'a>,
    pub args: NodeList<'a, Expr<'a>>,
}

impl<'a> CallExpr<'a> {
    pub fn namespace_path(&self) -> Path {
        Path::from_segments(self.namespace.iter().map(|id| id.name()))
    }

    /// Dotted name as written, e.g. `Math.Round`.
    pub fn qualified_name(&self) -> String {
        self.namespace_path().append(self.name.name()).to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordField<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub value: Expr<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordExpr<'a> {
    pub data: NodeData,
    pub fields: NodeList<'a, RecordField<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct TableExpr<'a> {
    pub data: NodeData,
    pub items: NodeList<'a, Expr<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub enum InterpolationPart<'a> {
    Text(&'a InterpolationText<'a>),
    Expr(Expr<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct InterpolationText<'a> {
    pub data: NodeData,
    pub value: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct InterpolationExpr<'a> {
    pub data: NodeData,
    pub parts: NodeList<'a, InterpolationPart<'a>>,
}

impl<'a> InterpolationExpr<'a> {
    pub fn has_expressions(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, InterpolationPart::Expr(_)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AsExpr<'a> {
    pub data: NodeData,
    pub operand: Expr<'a>,
    pub alias: Identifier<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorExpr {
    pub data: NodeData,
}

// ============================================================================
// Named-formula documents
// ============================================================================

/// A parsed script of named formulas and user-defined functions.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub items: NodeList<'a, DocItem<'a>>,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub enum DocItem<'a> {
    Formula(&'a NamedFormula<'a>),
    Udf(&'a UdfDecl<'a>),
}

impl<'a> DocItem<'a> {
    pub fn name(&self) -> &Identifier<'a> {
        match self {
            DocItem::Formula(f) => &f.name,
            DocItem::Udf(u) => &u.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            DocItem::Formula(f) => f.data.span,
            DocItem::Udf(u) => u.data.span,
        }
    }
}

/// `name = expr;`
#[derive(Debug, Clone, Copy)]
pub struct NamedFormula<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub body: Expr<'a>,
}

/// `name(p: T, ...): R = expr;` or `name(p: T, ...): R { a; b };`
#[derive(Debug, Clone, Copy)]
pub struct UdfDecl<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub params: NodeList<'a, Param<'a>>,
    pub return_type: TypeRef<'a>,
    pub body: UdfBody<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct Param<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub ty: TypeRef<'a>,
}

/// A type written by name, e.g. `Number`.
#[derive(Debug, Clone, Copy)]
pub struct TypeRef<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum UdfBody<'a> {
    Expr(Expr<'a>),
    /// Imperative block `{ a; b }`.
    Block(&'a BlockBody<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct BlockBody<'a> {
    pub data: NodeData,
    pub statements: NodeList<'a, Expr<'a>>,
}
