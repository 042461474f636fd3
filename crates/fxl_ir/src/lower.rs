//! Lowering of bound trees into the IR.
//!
//! Each bound node becomes one IR node with the node's type and span. The
//! conversions the binder recorded are made explicit as conversion calls,
//! per-row arguments of table functions are wrapped in `Lazy`, and
//! operators are resolved to the typed form their operands call for.

use crate::nodes::*;
use fxl_ast::*;
use fxl_binder::{Binding, BoundNode, BoundTree, FrameId};
use fxl_core::{SlotArena, Span};
use fxl_types::DType;
use rustc_hash::FxHashMap;

/// Lower `tree` into the IR. Returns the root node and the formula's own
/// row scope.
#[tracing::instrument(level = "debug", skip_all)]
pub fn lower(tree: &BoundTree<'_>) -> (IrNode, ScopeSymbol) {
    let mut lowerer = Lowerer::new(tree);
    let rule_row = tree
        .rule_frame()
        .and_then(|frame| tree.frame_row(frame))
        .cloned()
        .unwrap_or_else(DType::empty_record);
    let rule_scope = lowerer.scopes.alloc(rule_row.clone());
    if let Some(frame) = tree.rule_frame() {
        lowerer.frame_scopes.insert(frame, rule_scope);
    }
    let root = lowerer.lower_expr(tree.root);
    tracing::debug!(scopes = lowerer.scopes.len(), "lowered formula");
    (
        root,
        ScopeSymbol {
            id: rule_scope,
            row: rule_row,
        },
    )
}

struct Lowerer<'t, 'a> {
    tree: &'t BoundTree<'a>,
    /// Live row scopes. Ids of closed scopes are handed out again.
    scopes: SlotArena<ScopeSymbolId, DType>,
    frame_scopes: FxHashMap<FrameId, ScopeSymbolId>,
}

impl<'t, 'a> Lowerer<'t, 'a> {
    fn new(tree: &'t BoundTree<'a>) -> Self {
        Self {
            tree,
            scopes: SlotArena::new(),
            frame_scopes: FxHashMap::default(),
        }
    }

    fn scope_of(&self, frame: FrameId) -> Option<ScopeSymbolId> {
        self.frame_scopes.get(&frame).copied()
    }

    /// Lower `expr` and apply the conversion its context recorded.
    fn lower_expr(&mut self, expr: Expr<'a>) -> IrNode {
        let tree = self.tree;
        let Some(bound) = tree.of(expr) else {
            return IrNode::error(expr.span());
        };
        let node = if bound.is_error() {
            IrNode::error(bound.span)
        } else {
            self.lower_node(expr, bound)
        };
        match bound.coercion.function_name() {
            Some(function) if !node.ty.is_error() => {
                let ty = bound.coercion.target_type(&node.ty);
                IrNode::call(bound.span, ty, function, vec![node])
            }
            _ => node,
        }
    }

    fn lower_node(&mut self, expr: Expr<'a>, bound: &BoundNode) -> IrNode {
        let span = bound.span;
        let ty = bound.ty.clone();
        let kind = match expr {
            Expr::Number(n) => IrKind::Number(n.value),
            Expr::String(s) => IrKind::String(s.value.to_string()),
            Expr::Boolean(b) => IrKind::Boolean(b.value),
            Expr::Ident(_) => match &bound.binding {
                Binding::Variable { name, .. } | Binding::EnumType { name } => IrKind::Variable(name.clone()),
                Binding::RowField { frame, name } => match self.scope_of(*frame) {
                    Some(scope) => IrKind::ScopeAccess {
                        scope,
                        field: name.clone(),
                    },
                    None => IrKind::Error,
                },
                Binding::ThisRecord { frame } => match self.scope_of(*frame) {
                    Some(scope) => IrKind::ScopeRow(scope),
                    None => IrKind::Error,
                },
                _ => IrKind::Error,
            },
            Expr::Unary(n) => return self.lower_unary(span, ty, n),
            Expr::Binary(n) => return self.lower_binary(span, ty, n),
            Expr::Chain(n) => {
                let items = n.items.iter().map(|item| self.lower_expr(*item)).collect();
                return IrNode::call(span, ty, "Chain", items);
            }
            Expr::Dotted(n) => return self.lower_dotted(span, ty, bound, n),
            Expr::Call(_) => return self.lower_call(span, ty, bound, expr),
            Expr::Record(n) => IrKind::Record(
                n.fields
                    .iter()
                    .map(|field| (field.name.name(), self.lower_expr(field.value)))
                    .collect(),
            ),
            Expr::Table(n) => IrKind::Table(n.items.iter().map(|item| self.lower_expr(*item)).collect()),
            Expr::Interpolation(n) => return self.lower_interpolation(span, n),
            Expr::As(n) => return self.lower_expr(n.operand),
            Expr::Error(_) => IrKind::Error,
        };
        if kind == IrKind::Error {
            return IrNode::error(span);
        }
        IrNode::new(span, ty, kind)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn lower_unary(&mut self, span: Span, ty: DType, unary: &UnaryExpr<'a>) -> IrNode {
        let operand = self.lower_expr(unary.operand);
        let decimal = ty == DType::Decimal;
        let op = match (unary.op, decimal) {
            (UnaryOp::Negate, false) => UnaryOpKind::NegateNumber,
            (UnaryOp::Negate, true) => UnaryOpKind::NegateDecimal,
            (UnaryOp::Percent, false) => UnaryOpKind::PercentNumber,
            (UnaryOp::Percent, true) => UnaryOpKind::PercentDecimal,
            (UnaryOp::Not, _) => UnaryOpKind::Not,
        };
        IrNode::new(
            span,
            ty,
            IrKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    fn lower_binary(&mut self, span: Span, ty: DType, binary: &BinaryExpr<'a>) -> IrNode {
        let left = self.lower_expr(binary.left);
        let right = self.lower_expr(binary.right);
        let op = match binary.op {
            BinaryOp::Concat => return IrNode::call(span, ty, "Concatenate", vec![left, right]),
            BinaryOp::Add => BinaryOpKind::Add,
            BinaryOp::Sub => BinaryOpKind::Sub,
            BinaryOp::Mul => BinaryOpKind::Mul,
            BinaryOp::Div => BinaryOpKind::Div,
            BinaryOp::Pow => BinaryOpKind::Power,
            BinaryOp::Eq => BinaryOpKind::Eq,
            BinaryOp::NotEq => BinaryOpKind::NotEq,
            BinaryOp::Lt => BinaryOpKind::Lt,
            BinaryOp::LtEq => BinaryOpKind::LtEq,
            BinaryOp::Gt => BinaryOpKind::Gt,
            BinaryOp::GtEq => BinaryOpKind::GtEq,
            BinaryOp::And => BinaryOpKind::And,
            BinaryOp::Or => BinaryOpKind::Or,
            BinaryOp::In => BinaryOpKind::In,
            BinaryOp::ExactIn => BinaryOpKind::ExactIn,
        };
        let operands = operand_kind(op, &ty, &left.ty, &right.ty);
        IrNode::new(
            span,
            ty,
            IrKind::Binary {
                op,
                operands,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    // ========================================================================
    // Member access
    // ========================================================================

    fn lower_dotted(&mut self, span: Span, ty: DType, bound: &BoundNode, dotted: &DottedExpr<'a>) -> IrNode {
        match &bound.binding {
            Binding::EnumOption { enum_name, option } => IrNode::new(
                span,
                ty,
                IrKind::EnumOption {
                    enum_name: enum_name.clone(),
                    option: option.clone(),
                },
            ),
            Binding::Field { name } => {
                let row_scope = match self.tree.of(dotted.object).map(|object| &object.binding) {
                    Some(Binding::ThisRecord { frame }) => self.scope_of(*frame),
                    _ => None,
                };
                if let Some(scope) = row_scope {
                    return IrNode::new(
                        span,
                        ty,
                        IrKind::ScopeAccess {
                            scope,
                            field: name.clone(),
                        },
                    );
                }
                let record = self.lower_expr(dotted.object);
                IrNode::new(
                    span,
                    ty,
                    IrKind::FieldAccess {
                        record: Box::new(record),
                        field: name.clone(),
                    },
                )
            }
            Binding::Column { name } => {
                let table = self.lower_expr(dotted.object);
                let column = IrNode::new(dotted.member.data.span, DType::String, IrKind::String(name.to_string()));
                IrNode::call(span, ty, "ShowColumns", vec![table, column])
            }
            _ => IrNode::error(span),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn lower_call(&mut self, span: Span, ty: DType, bound: &BoundNode, expr: Expr<'a>) -> IrNode {
        let (Expr::Call(call), Binding::Call { function, scope: frame }) = (expr, &bound.binding) else {
            return IrNode::error(span);
        };
        let count = call.args.len();
        let mut args = Vec::with_capacity(count);
        let mut scope = None;
        for (i, arg) in call.args.iter().enumerate() {
            if i == 1 {
                // The row scope covers the per-row arguments only.
                if let Some(frame) = frame {
                    let row = self.tree.frame_row(*frame).cloned().unwrap_or_else(DType::empty_record);
                    let id = self.scopes.alloc(row);
                    self.frame_scopes.insert(*frame, id);
                    scope = Some(id);
                }
            }
            let lowered = self.lower_expr(*arg);
            if function.is_lambda_slot(i, count) {
                args.push(IrNode::new(arg.span(), lowered.ty.clone(), IrKind::Lazy(Box::new(lowered))));
            } else {
                args.push(lowered);
            }
        }
        if let (Some(frame), Some(id)) = (frame, scope) {
            self.frame_scopes.remove(frame);
            self.scopes.remove(id);
        }
        IrNode::new(
            span,
            ty,
            IrKind::Call {
                function: function.path().to_string(),
                scope,
                args,
            },
        )
    }

    fn lower_interpolation(&mut self, span: Span, interpolation: &InterpolationExpr<'a>) -> IrNode {
        if !interpolation.has_expressions() {
            let text: String = interpolation
                .parts
                .iter()
                .filter_map(|part| match part {
                    InterpolationPart::Text(text) => Some(text.value),
                    InterpolationPart::Expr(_) => None,
                })
                .collect();
            return IrNode::new(span, DType::String, IrKind::String(text));
        }
        let mut args = Vec::with_capacity(interpolation.parts.len());
        for part in interpolation.parts.iter() {
            match part {
                InterpolationPart::Text(text) if text.value.is_empty() => {}
                InterpolationPart::Text(text) => args.push(IrNode::new(
                    text.data.span,
                    DType::String,
                    IrKind::String(text.value.to_string()),
                )),
                InterpolationPart::Expr(inner) => args.push(self.lower_expr(*inner)),
            }
        }
        IrNode::call(span, DType::String, "Concatenate", args)
    }
}

/// Operand kind of a binary operator over operands that already carry
/// their conversions.
fn operand_kind(op: BinaryOpKind, result: &DType, left: &DType, right: &DType) -> OperandKind {
    use BinaryOpKind as B;
    let dated = |ty: &DType| matches!(ty, DType::Date | DType::DateTime);
    match op {
        B::And | B::Or => OperandKind::None,
        B::In | B::ExactIn => match right {
            DType::Table(_) => OperandKind::Table,
            _ => OperandKind::Text,
        },
        B::Add | B::Sub if dated(left) && dated(right) => OperandKind::of(left),
        B::Add | B::Sub if dated(left) || dated(right) => {
            if matches!(left, DType::DateTime) || matches!(right, DType::DateTime) {
                OperandKind::DateTimeAndNumber
            } else {
                OperandKind::DateAndNumber
            }
        }
        B::Add | B::Sub | B::Mul | B::Div | B::Power => OperandKind::of(result),
        B::Eq | B::NotEq | B::Lt | B::LtEq | B::Gt | B::GtEq => match (left, right) {
            (DType::Blank, other) | (other, DType::Blank) => OperandKind::of(other),
            (DType::Number, _) | (_, DType::Number) => OperandKind::Numbers,
            (other, _) => OperandKind::of(other),
        },
    }
}
