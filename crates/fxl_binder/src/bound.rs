//! Bound tree: the binder's per-node results.

use crate::functions::FunctionSignature;
use crate::symbol::VariableKind;
use fxl_ast::{Expr, NodeId};
use fxl_core::{Name, Span};
use fxl_diagnostics::DiagnosticCollection;
use fxl_types::{Coercion, DType};
use std::sync::Arc;

/// Identifies a row scope opened during binding. Frame 0 is the row scope
/// the tree was bound against, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

/// What a node's name resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Literals, operators and constructors.
    None,
    /// A variable of the scope graph, by logical name.
    Variable { name: Name, kind: VariableKind },
    /// A field of a row scope reached without qualification.
    RowField { frame: FrameId, name: Name },
    /// The whole row of a row scope (`ThisRecord` or an `As` alias).
    ThisRecord { frame: FrameId },
    /// A member of a record, by logical name.
    Field { name: Name },
    /// A column of a table, projected into a one-column table.
    Column { name: Name },
    /// An enum used as a namespace for its options.
    EnumType { name: Name },
    EnumOption { enum_name: Name, option: Name },
    Call {
        function: Arc<FunctionSignature>,
        /// Row scope opened for the per-row arguments.
        scope: Option<FrameId>,
    },
    /// Resolution failed; a diagnostic was reported.
    Error,
}

/// Binder results for one syntax node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundNode {
    pub id: NodeId,
    pub span: Span,
    pub ty: DType,
    /// Whether the denoted value can be updated in place.
    pub mutable: bool,
    /// Conversion the surrounding context applies to this node's value.
    pub coercion: Coercion,
    pub binding: Binding,
}

impl BoundNode {
    pub fn new(id: NodeId, span: Span, ty: DType) -> Self {
        Self {
            id,
            span,
            ty,
            mutable: false,
            coercion: Coercion::None,
            binding: Binding::None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.ty.is_error() || self.binding == Binding::Error
    }
}

/// A syntax tree together with the binder's results for every node and
/// the diagnostics reported while binding.
#[derive(Debug)]
pub struct BoundTree<'a> {
    pub root: Expr<'a>,
    pub(crate) nodes: Vec<Option<BoundNode>>,
    pub(crate) exprs: Vec<Option<Expr<'a>>>,
    pub diagnostics: DiagnosticCollection,
    /// Row scope frames opened while binding, with their row types.
    pub(crate) frames: Vec<DType>,
    /// The frame of the row scope the whole formula was bound against.
    pub(crate) rule_frame: Option<FrameId>,
}

impl<'a> BoundTree<'a> {
    pub fn node(&self, id: NodeId) -> Option<&BoundNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// The bound node of `expr`. Every expression of the tree is bound.
    pub fn of(&self, expr: Expr<'_>) -> Option<&BoundNode> {
        self.node(expr.id())
    }

    pub fn expr(&self, id: NodeId) -> Option<Expr<'a>> {
        self.exprs.get(id.index()).copied().flatten()
    }

    pub fn root_node(&self) -> Option<&BoundNode> {
        self.of(self.root)
    }

    /// The type of the whole formula.
    pub fn result_type(&self) -> DType {
        self.root_node().map_or(DType::Error, |node| node.ty.clone())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Row type of a frame.
    pub fn frame_row(&self, frame: FrameId) -> Option<&DType> {
        self.frames.get(frame.0 as usize)
    }

    pub fn rule_frame(&self) -> Option<FrameId> {
        self.rule_frame
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BoundNode> {
        self.nodes.iter().flatten()
    }
}
