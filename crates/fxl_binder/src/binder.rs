//! The binder implementation.
//!
//! Walks a formula's syntax tree once and produces a [`BoundTree`]:
//! - Name resolution against row scopes, the scope graph and enums
//! - A type for every node, with the coercions its context applies
//! - Mutability of every node
//! - Function overload selection, arity and argument checks
//!
//! User errors never stop the pass. They are reported as diagnostics and
//! the offending node gets `DType::Error`, which later checks accept
//! silently. Only a broken scope graph fails the whole pass.

use crate::bound::{Binding, BoundNode, BoundTree, FrameId};
use crate::functions::{builtin_functions, FunctionSignature};
use crate::scope::{RowScope, ScopeGraph, ScopeId};
use fxl_ast::*;
use fxl_core::{CoreResult, Name, Path, Span};
use fxl_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use fxl_types::{Coercion, DType, EnumStore, RecordType};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOptions {
    /// Numeric literals are `Number` instead of `Decimal`.
    pub numbers_are_floats: bool,
    /// Per-row arguments can refer to the whole row as `ThisRecord`.
    pub expose_this_record: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            numbers_are_floats: false,
            expose_this_record: true,
        }
    }
}

/// Outcome of [`Binder::validate_invocation`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationCheck {
    pub ok: bool,
    /// The call's type when `ok`, `DType::Error` otherwise.
    pub return_type: DType,
    /// The overload that matched.
    pub function: Option<Arc<FunctionSignature>>,
}

impl InvocationCheck {
    fn failed() -> Self {
        Self {
            ok: false,
            return_type: DType::Error,
            function: None,
        }
    }
}

/// Binding context: where names resolve and how literals are typed.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'g> {
    graph: &'g ScopeGraph,
    scope: Option<ScopeId>,
    enums: &'g EnumStore,
    options: BindOptions,
}

impl<'g> Binder<'g> {
    pub fn new(graph: &'g ScopeGraph, scope: Option<ScopeId>, enums: &'g EnumStore) -> Self {
        Self {
            graph,
            scope,
            enums,
            options: BindOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> BindOptions {
        self.options
    }

    /// Bind the tree rooted at `root`. `node_count` is the number of node
    /// ids the parser handed out. With a `row_scope`, unqualified names
    /// resolve against its record first.
    #[tracing::instrument(level = "debug", skip_all, fields(nodes = node_count))]
    pub fn bind<'a>(
        &self,
        root: Expr<'a>,
        node_count: u32,
        row_scope: Option<&RowScope>,
    ) -> CoreResult<BoundTree<'a>> {
        let mut pass = BindPass::new(self, node_count as usize);
        if let Some(row_scope) = row_scope {
            let frame = pass.open_frame(row_scope.row.clone(), None, row_scope.mutable);
            pass.frames[frame.0 as usize].this_record = row_scope.expose_this_record;
            pass.active.push(frame);
        }
        pass.bind_expr(root)?;
        tracing::debug!(diagnostics = pass.diagnostics.len(), "bound formula");
        Ok(pass.finish(root, row_scope.map(|_| FrameId(0))))
    }

    /// Overloads of the function at `path`: scope graph first, then the
    /// built-in library for unqualified names.
    pub fn lookup_functions(&self, path: &Path) -> CoreResult<Vec<Arc<FunctionSignature>>> {
        let found = self.graph.resolve_functions(self.scope, path)?;
        if !found.is_empty() || path.len() != 1 {
            return Ok(found);
        }
        Ok(builtin_functions().lookup(path.name().as_str()).to_vec())
    }

    /// Would `args` form a legal call of the function at `path`?
    ///
    /// The nodes may come from any bound tree, in any order; only their
    /// types matter. Each overload is tried in turn.
    pub fn validate_invocation(&self, path: &Path, args: &[&BoundNode]) -> CoreResult<InvocationCheck> {
        for function in self.lookup_functions(path)? {
            if let Some(return_type) = check_arguments(&function, args) {
                return Ok(InvocationCheck {
                    ok: true,
                    return_type,
                    function: Some(function),
                });
            }
        }
        Ok(InvocationCheck::failed())
    }
}

/// The call's type if `args` fit `function`.
fn check_arguments(function: &FunctionSignature, args: &[&BoundNode]) -> Option<DType> {
    let count = args.len();
    if !function.admits_arity(count) {
        return None;
    }
    for (i, arg) in args.iter().enumerate() {
        let kind = function.slot_kind(i, count)?;
        kind.admits(&arg.ty)?;
    }
    let types: Vec<DType> = args.iter().map(|arg| arg.ty.clone()).collect();
    let ty = function.return_type(&types);
    let unioned = function.unioned_args(count);
    if !unioned.is_empty() && ty == DType::Error && unioned.iter().all(|&i| !types[i].is_error()) {
        return None;
    }
    if function.conflicting_row(&types).is_some() {
        return None;
    }
    Some(ty)
}

/// Pick the overload for a call with `count` arguments, preferring a
/// row-scoped overload exactly when the first argument is a table.
fn choose_overload(
    overloads: &[Arc<FunctionSignature>],
    count: usize,
    first: Option<&DType>,
) -> Option<Arc<FunctionSignature>> {
    let tabular = matches!(first, Some(DType::Table(_)));
    overloads
        .iter()
        .find(|f| f.admits_arity(count) && f.scope_arg.is_some() == tabular)
        .or_else(|| overloads.iter().find(|f| f.admits_arity(count)))
        .or_else(|| overloads.first())
        .cloned()
}

/// Translate the display names of a field-access chain into the backing
/// path of logical names.
///
/// Chains must be rooted at the current row (`ThisRecord` or an
/// unqualified field), a row-selecting call, or a user-defined function
/// call. Returns `None` for any other root or for a segment that did not
/// resolve.
pub fn backing_path(tree: &BoundTree<'_>, node: NodeId) -> Option<Path> {
    let bound = tree.node(node)?;
    match (&bound.binding, tree.expr(node)?) {
        (Binding::ThisRecord { .. }, _) => Some(Path::root()),
        (Binding::RowField { name, .. }, _) => Some(Path::root().append(name.clone())),
        (Binding::Field { name }, Expr::Dotted(dotted)) => {
            Some(backing_path(tree, dotted.object.id())?.append(name.clone()))
        }
        (Binding::Call { function, .. }, Expr::Call(call)) => {
            if function.user_defined {
                return Some(function.path());
            }
            if !function.row_selector {
                return None;
            }
            let source = match *call.args.first()? {
                Expr::As(alias) => alias.operand,
                other => other,
            };
            match &tree.of(source)?.binding {
                Binding::Variable { name, .. } => Some(Path::root().append(name.clone())),
                _ => backing_path(tree, source.id()),
            }
        }
        _ => None,
    }
}

// ============================================================================
// Binding pass
// ============================================================================

#[derive(Debug)]
struct Frame {
    row: RecordType,
    /// Set for `Table As Alias`; fields are then only reachable through
    /// the alias.
    alias: Option<Name>,
    this_record: bool,
    mutable: bool,
}

/// A bound first argument, with its `As` alias if it had one.
struct FirstArgument {
    node: BoundNode,
    alias: Option<Name>,
    alias_span: Span,
}

struct BindPass<'b, 'g, 'a> {
    binder: &'b Binder<'g>,
    nodes: Vec<Option<BoundNode>>,
    exprs: Vec<Option<Expr<'a>>>,
    diagnostics: DiagnosticCollection,
    /// Every frame opened so far, indexed by `FrameId`.
    frames: Vec<Frame>,
    /// Frames in effect, innermost last.
    active: Vec<FrameId>,
}

impl<'b, 'g, 'a> BindPass<'b, 'g, 'a> {
    fn new(binder: &'b Binder<'g>, node_count: usize) -> Self {
        Self {
            binder,
            nodes: vec![None; node_count],
            exprs: vec![None; node_count],
            diagnostics: DiagnosticCollection::new(),
            frames: Vec::new(),
            active: Vec::new(),
        }
    }

    fn finish(self, root: Expr<'a>, rule_frame: Option<FrameId>) -> BoundTree<'a> {
        BoundTree {
            root,
            nodes: self.nodes,
            exprs: self.exprs,
            diagnostics: self.diagnostics,
            frames: self
                .frames
                .into_iter()
                .map(|frame| DType::Record(frame.row))
                .collect(),
            rule_frame,
        }
    }

    fn report(&mut self, span: Span, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.report(span, message, args);
    }

    fn store(&mut self, expr: Expr<'a>, node: BoundNode) {
        let index = expr.id().index();
        if index >= self.nodes.len() {
            self.nodes.resize(index + 1, None);
            self.exprs.resize(index + 1, None);
        }
        self.nodes[index] = Some(node);
        self.exprs[index] = Some(expr);
    }

    fn set_coercion(&mut self, id: NodeId, coercion: Coercion) {
        if let Some(Some(node)) = self.nodes.get_mut(id.index()) {
            node.coercion = coercion;
        }
    }

    fn open_frame(&mut self, row: RecordType, alias: Option<Name>, mutable: bool) -> FrameId {
        let id = FrameId(self.frames.len() as u32);
        self.frames.push(Frame {
            row,
            alias,
            this_record: self.binder.options.expose_this_record,
            mutable,
        });
        id
    }

    fn literal_number_type(&self) -> DType {
        if self.binder.options.numbers_are_floats {
            DType::Number
        } else {
            DType::Decimal
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn bind_expr(&mut self, expr: Expr<'a>) -> CoreResult<BoundNode> {
        let leaf = |ty: DType| BoundNode::new(expr.id(), expr.span(), ty);
        let node = match expr {
            Expr::Number(_) => leaf(self.literal_number_type()),
            Expr::String(_) => leaf(DType::String),
            Expr::Boolean(_) => leaf(DType::Boolean),
            Expr::Ident(id) => self.bind_identifier(expr, id)?,
            Expr::Unary(n) => self.bind_unary(expr, n)?,
            Expr::Binary(n) => self.bind_binary(expr, n)?,
            Expr::Chain(n) => {
                let mut last = DType::Void;
                for item in n.items.iter() {
                    last = self.bind_expr(*item)?.ty;
                }
                leaf(last)
            }
            Expr::Dotted(n) => self.bind_dotted(expr, n)?,
            Expr::Call(n) => self.bind_call(expr, n)?,
            Expr::Record(n) => self.bind_record(expr, n)?,
            Expr::Table(n) => self.bind_table(expr, n)?,
            Expr::Interpolation(n) => self.bind_interpolation(expr, n)?,
            Expr::As(n) => {
                self.report(n.data.span, &messages::AS_NOT_PERMITTED, &[]);
                let operand = self.bind_expr(n.operand)?;
                leaf(operand.ty)
            }
            Expr::Error(_) => BoundNode {
                binding: Binding::Error,
                ..leaf(DType::Error)
            },
        };
        self.store(expr, node.clone());
        Ok(node)
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn bind_identifier(&mut self, expr: Expr<'a>, id: &Identifier<'a>) -> CoreResult<BoundNode> {
        let mut node = BoundNode::new(expr.id(), expr.span(), DType::Error);
        node.binding = Binding::Error;
        if id.is_missing() {
            return Ok(node);
        }
        let text = id.text;
        let graph = self.binder.graph;
        let scope = self.binder.scope;

        if let Some((binding, ty, mutable)) = self.resolve_in_frames(text) {
            if matches!(binding, Binding::RowField { .. })
                && graph.resolve_variable(scope, text)?.is_some()
            {
                self.report(id.data.span, &messages::AMBIGUOUS_NAME, &[text]);
            }
            tracing::trace!(name = text, ?binding, "resolved in row scope");
            node.binding = binding;
            node.ty = ty;
            node.mutable = mutable;
            return Ok(node);
        }

        if text == "ThisRecord" {
            self.report(id.data.span, &messages::THIS_RECORD_UNAVAILABLE, &[]);
            return Ok(node);
        }

        if let Some(variable) = graph.resolve_variable(scope, text)? {
            tracing::trace!(name = text, logical = %variable.name, "resolved variable");
            node.ty = variable.ty.clone();
            node.mutable = variable.mutable && variable.ty.is_aggregate();
            node.binding = Binding::Variable {
                name: variable.name.clone(),
                kind: variable.kind,
            };
            return Ok(node);
        }

        if let Some(ty) = self.binder.enums.get(text) {
            node.ty = ty.clone();
            node.binding = Binding::EnumType { name: id.name() };
            return Ok(node);
        }

        if builtin_functions().contains(text) || graph.has_function_named(scope, text)? {
            self.report(id.data.span, &messages::FUNCTION_USED_AS_VALUE, &[text]);
        } else {
            self.report(id.data.span, &messages::NAME_NOT_RECOGNIZED, &[text]);
        }
        Ok(node)
    }

    /// Resolve `text` against the active row scopes, innermost first.
    fn resolve_in_frames(&self, text: &str) -> Option<(Binding, DType, bool)> {
        for &frame_id in self.active.iter().rev() {
            let frame = &self.frames[frame_id.0 as usize];
            let whole_row = || (Binding::ThisRecord { frame: frame_id }, DType::Record(frame.row.clone()), frame.mutable);
            match &frame.alias {
                Some(alias) if alias.as_str() == text => return Some(whole_row()),
                Some(_) => continue,
                None => {}
            }
            if frame.this_record && text == "ThisRecord" {
                return Some(whole_row());
            }
            if let Some((logical, ty)) = frame.row.resolve_field(text) {
                let binding = Binding::RowField {
                    frame: frame_id,
                    name: logical,
                };
                return Some((binding, ty.clone(), frame.mutable));
            }
        }
        None
    }

    fn bind_dotted(&mut self, expr: Expr<'a>, dotted: &DottedExpr<'a>) -> CoreResult<BoundNode> {
        let object = self.bind_expr(dotted.object)?;
        let mut node = BoundNode::new(expr.id(), expr.span(), DType::Error);
        node.binding = Binding::Error;
        let member = dotted.member.text;
        let member_span = dotted.member.data.span;
        if dotted.member.is_missing() || object.is_error() {
            return Ok(node);
        }

        match (&object.binding, &object.ty) {
            (Binding::EnumType { name }, DType::Enum(e)) => {
                if e.option(member).is_some() {
                    node.ty = object.ty.clone();
                    node.binding = Binding::EnumOption {
                        enum_name: name.clone(),
                        option: dotted.member.name(),
                    };
                } else {
                    let owner = name.to_string();
                    self.report(member_span, &messages::FIELD_NOT_RECOGNIZED, &[member, &owner]);
                }
            }
            (_, DType::Record(record)) => match record.resolve_field(member) {
                Some((logical, ty)) => {
                    node.ty = ty.clone();
                    node.mutable = object.mutable;
                    node.binding = Binding::Field { name: logical };
                }
                None => {
                    self.report(member_span, &messages::FIELD_NOT_RECOGNIZED, &[member, "the record"]);
                }
            },
            (_, DType::Table(row)) => match row.resolve_field(member) {
                Some((logical, ty)) => {
                    node.ty = DType::Table(RecordType::from_fields([(logical.clone(), ty.clone())]));
                    node.binding = Binding::Column { name: logical };
                }
                None => {
                    self.report(member_span, &messages::FIELD_NOT_RECOGNIZED, &[member, "the table"]);
                }
            },
            (_, other) => {
                self.report(member_span, &messages::NO_MEMBERS, &[other.kind_name()]);
            }
        }
        Ok(node)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn bind_unary(&mut self, expr: Expr<'a>, unary: &UnaryExpr<'a>) -> CoreResult<BoundNode> {
        let operand = self.bind_expr(unary.operand)?;
        let mut node = BoundNode::new(expr.id(), expr.span(), DType::Error);
        match unary.op {
            UnaryOp::Negate | UnaryOp::Percent => {
                if let Some(ty) = self.numeric_operand(&operand, unary.op.as_str()) {
                    node.ty = match ty {
                        DType::Blank => self.literal_number_type(),
                        other => other,
                    };
                }
            }
            UnaryOp::Not => {
                self.coerce_operand(&operand, &DType::Boolean, unary.op.as_str());
                node.ty = DType::Boolean;
            }
        }
        Ok(node)
    }

    fn bind_binary(&mut self, expr: Expr<'a>, binary: &BinaryExpr<'a>) -> CoreResult<BoundNode> {
        let left = self.bind_expr(binary.left)?;
        let right = self.bind_expr(binary.right)?;
        let op = binary.op;
        let mut node = BoundNode::new(expr.id(), expr.span(), DType::Error);

        node.ty = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
                self.arithmetic(op, &left, &right)
            }
            BinaryOp::Concat => {
                self.coerce_operand(&left, &DType::String, op.as_str());
                self.coerce_operand(&right, &DType::String, op.as_str());
                DType::String
            }
            BinaryOp::And | BinaryOp::Or => {
                self.coerce_operand(&left, &DType::Boolean, op.as_str());
                self.coerce_operand(&right, &DType::Boolean, op.as_str());
                DType::Boolean
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                self.comparison(expr.span(), op, &left, &right);
                DType::Boolean
            }
            BinaryOp::In | BinaryOp::ExactIn => {
                self.membership(op, &left, &right);
                DType::Boolean
            }
        };
        Ok(node)
    }

    /// Check an arithmetic operand and record its conversion to a number.
    /// Returns the operand's numeric type (`Blank` for a blank operand), or
    /// `None` when it is unusable.
    fn numeric_operand(&mut self, operand: &BoundNode, op: &str) -> Option<DType> {
        match &operand.ty {
            ty if ty.is_error() => None,
            ty @ (DType::Number | DType::Decimal | DType::Blank) => Some(ty.clone()),
            ty => match ty.coerces_to(&DType::Number) {
                Some(coercion) => {
                    self.set_coercion(operand.id, coercion);
                    Some(DType::Number)
                }
                None => {
                    self.report(operand.span, &messages::BAD_OPERAND_TYPE, &[op, ty.kind_name()]);
                    None
                }
            },
        }
    }

    /// Unify two numeric operands: Decimal only when neither side is a
    /// Number; Decimal operands of a Number operation are converted.
    fn unify_numeric(&mut self, left: (&BoundNode, DType), right: (&BoundNode, DType)) -> DType {
        let decimal = |ty: &DType| matches!(ty, DType::Decimal | DType::Blank);
        let result = match (&left.1, &right.1) {
            (DType::Blank, DType::Blank) => self.literal_number_type(),
            (l, r) if decimal(l) && decimal(r) => DType::Decimal,
            _ => DType::Number,
        };
        if result == DType::Number {
            for (node, ty) in [left, right] {
                if ty == DType::Decimal && node.coercion.is_none() {
                    self.set_coercion(node.id, Coercion::DecimalToNumber);
                }
            }
        }
        result
    }

    fn arithmetic(&mut self, op: BinaryOp, left: &BoundNode, right: &BoundNode) -> DType {
        if left.is_error() || right.is_error() {
            return DType::Error;
        }
        let dated = |ty: &DType| matches!(ty, DType::Date | DType::DateTime);
        match (op, &left.ty, &right.ty) {
            (BinaryOp::Add | BinaryOp::Sub, l, r) if dated(l) && (r.is_numeric() || *r == DType::Blank) => {
                return l.clone();
            }
            (BinaryOp::Add, l, r) if dated(r) && l.is_numeric() => return r.clone(),
            (BinaryOp::Sub, l, r) if dated(l) && dated(r) => {
                if l != r {
                    let coercion = Coercion::DateToDateTime;
                    let date_side = if *l == DType::Date { left } else { right };
                    self.set_coercion(date_side.id, coercion);
                }
                return DType::Number;
            }
            _ => {}
        }
        let l = self.numeric_operand(left, op.as_str());
        let r = self.numeric_operand(right, op.as_str());
        match (l, r) {
            (Some(l), Some(r)) => self.unify_numeric((left, l), (right, r)),
            _ => DType::Error,
        }
    }

    /// Record the conversion of `operand` to `target`, reporting when none
    /// exists.
    fn coerce_operand(&mut self, operand: &BoundNode, target: &DType, op: &str) {
        if operand.is_error() {
            return;
        }
        match operand.ty.coerces_to(target) {
            Some(coercion) => {
                if !coercion.is_none() {
                    self.set_coercion(operand.id, coercion);
                }
            }
            None => {
                self.report(operand.span, &messages::BAD_OPERAND_TYPE, &[op, operand.ty.kind_name()]);
            }
        }
    }

    fn comparison(&mut self, span: Span, op: BinaryOp, left: &BoundNode, right: &BoundNode) {
        if left.is_error() || right.is_error() {
            return;
        }
        let (l, r) = (left.ty.backing_kind(), right.ty.backing_kind());
        let numeric = |ty: &DType| ty.is_numeric() || *ty == DType::Blank;
        let enum_to_backing = |this: &mut Self, node: &BoundNode| {
            if matches!(node.ty, DType::Enum(_)) {
                this.set_coercion(node.id, Coercion::EnumToBacking);
            }
        };

        let comparable = if numeric(&l) && numeric(&r) {
            enum_to_backing(self, left);
            enum_to_backing(self, right);
            self.unify_numeric((left, l.clone()), (right, r.clone()));
            true
        } else if l == DType::Blank || r == DType::Blank {
            true
        } else if l.is_date_like() && r.is_date_like() {
            match (&l, &r) {
                (DType::Date, DType::DateTime) => self.set_coercion(left.id, Coercion::DateToDateTime),
                (DType::DateTime, DType::Date) => self.set_coercion(right.id, Coercion::DateToDateTime),
                _ => {}
            }
            l == r || (l != DType::Time && r != DType::Time)
        } else if l.is_text_like() && r.is_text_like() {
            for node in [left, right] {
                match node.ty {
                    DType::Enum(_) => self.set_coercion(node.id, Coercion::EnumToBacking),
                    DType::Hyperlink if l != r => self.set_coercion(node.id, Coercion::HyperlinkToText),
                    _ => {}
                }
            }
            true
        } else if op == BinaryOp::Eq || op == BinaryOp::NotEq {
            !l.is_aggregate() && !r.is_aggregate() && (left.ty.accepts(&right.ty) || right.ty.accepts(&left.ty))
        } else {
            false
        };

        if !comparable {
            self.report(span, &messages::INCOMPARABLE_TYPES, &[left.ty.kind_name(), right.ty.kind_name()]);
        }
    }

    fn membership(&mut self, op: BinaryOp, left: &BoundNode, right: &BoundNode) {
        if left.is_error() || right.is_error() {
            return;
        }
        match &right.ty {
            DType::Table(row) if row.len() == 1 => {
                let column = row.fields().next().map(|(_, ty)| ty.clone()).unwrap_or(DType::Error);
                match left.ty.coerces_to(&column) {
                    Some(coercion) if !coercion.is_none() => self.set_coercion(left.id, coercion),
                    Some(_) => {}
                    None => {
                        self.report(left.span, &messages::BAD_OPERAND_TYPE, &[op.as_str(), left.ty.kind_name()]);
                    }
                }
            }
            DType::Table(_) => {
                self.report(right.span, &messages::BAD_OPERAND_TYPE, &[op.as_str(), right.ty.kind_name()]);
            }
            _ => {
                self.coerce_operand(left, &DType::String, op.as_str());
                self.coerce_operand(right, &DType::String, op.as_str());
            }
        }
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    fn bind_record(&mut self, expr: Expr<'a>, record: &RecordExpr<'a>) -> CoreResult<BoundNode> {
        let mut fields: Vec<(Name, DType)> = Vec::with_capacity(record.fields.len());
        for field in record.fields.iter() {
            let value = self.bind_expr(field.value)?;
            let name = field.name.name();
            if fields.iter().any(|(existing, _)| *existing == name) {
                self.report(field.name.data.span, &messages::DUPLICATE_FIELD, &[field.name.text]);
                continue;
            }
            fields.push((name, value.ty));
        }
        Ok(BoundNode::new(expr.id(), expr.span(), DType::record(fields)))
    }

    fn bind_table(&mut self, expr: Expr<'a>, table: &TableExpr<'a>) -> CoreResult<BoundNode> {
        let value = Name::new("Value");
        let mut items = Vec::with_capacity(table.items.len());
        let mut row: Option<DType> = None;
        // Whether the first typed item was a record.
        let mut records: Option<bool> = None;
        for item in table.items.iter() {
            let bound = self.bind_expr(*item)?;
            if bound.ty.is_error() {
                items.push(bound);
                continue;
            }
            let is_record = matches!(bound.ty, DType::Record(_));
            let item_row = match &bound.ty {
                DType::Record(_) => bound.ty.clone(),
                scalar => DType::record([(value.clone(), scalar.clone())]),
            };
            match records {
                None => records = Some(is_record),
                Some(expected) if expected != is_record => {
                    let (want, found) = if expected { ("Record", bound.ty.kind_name()) } else { ("value", "Record") };
                    self.report(bound.span, &messages::MIXED_TABLE_ITEMS, &[want, found]);
                    items.push(bound);
                    continue;
                }
                Some(_) => {}
            }
            row = Some(match row {
                None => item_row,
                Some(acc) => {
                    let merged = acc.union(&item_row);
                    if merged == DType::Error {
                        self.report(bound.span, &messages::INCOMPATIBLE_TABLE_ROWS, &[&acc.to_string(), &item_row.to_string()]);
                        acc
                    } else {
                        merged
                    }
                }
            });
            items.push(bound);
        }

        // Scalar items are converted to the column's widened type.
        let column = row.as_ref().and_then(DType::as_record).and_then(|r| r.field("Value")).cloned();
        if let Some(column) = column {
            for item in &items {
                if item.ty.is_scalar() && !item.ty.is_error() {
                    if let Some(coercion) = item.ty.coerces_to(&column) {
                        if !coercion.is_none() {
                            self.set_coercion(item.id, coercion);
                        }
                    }
                }
            }
        }

        let ty = match row {
            Some(DType::Record(r)) => DType::Table(r),
            _ => DType::empty_table(),
        };
        Ok(BoundNode::new(expr.id(), expr.span(), ty))
    }

    fn bind_interpolation(&mut self, expr: Expr<'a>, interpolation: &InterpolationExpr<'a>) -> CoreResult<BoundNode> {
        for part in interpolation.parts.iter() {
            let InterpolationPart::Expr(inner) = part else {
                continue;
            };
            let bound = self.bind_expr(*inner)?;
            if bound.is_error() {
                continue;
            }
            let coercion = if bound.ty.is_scalar() {
                bound.ty.coerces_to(&DType::String)
            } else {
                None
            };
            match coercion {
                Some(coercion) => {
                    if !coercion.is_none() {
                        self.set_coercion(bound.id, coercion);
                    }
                }
                None => {
                    self.report(bound.span, &messages::INTERPOLATION_NOT_TEXT, &[bound.ty.kind_name()]);
                }
            }
        }
        Ok(BoundNode::new(expr.id(), expr.span(), DType::String))
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Bind a call's first argument, unwrapping `Source As Alias`.
    fn bind_first_argument(&mut self, arg: Expr<'a>) -> CoreResult<FirstArgument> {
        let Expr::As(alias) = arg else {
            return Ok(FirstArgument {
                node: self.bind_expr(arg)?,
                alias: None,
                alias_span: arg.span(),
            });
        };
        let operand = self.bind_expr(alias.operand)?;
        let node = BoundNode {
            id: arg.id(),
            span: arg.span(),
            coercion: Coercion::None,
            binding: Binding::None,
            ..operand
        };
        self.store(arg, node.clone());
        Ok(FirstArgument {
            node,
            alias: Some(alias.alias.name()),
            alias_span: alias.data.span,
        })
    }

    fn bind_call(&mut self, expr: Expr<'a>, call: &CallExpr<'a>) -> CoreResult<BoundNode> {
        let path = call.namespace_path().append(call.name.name());
        let overloads = self.binder.lookup_functions(&path)?;
        let count = call.args.len();
        let mut node = BoundNode::new(expr.id(), expr.span(), DType::Error);

        let first = match call.args.first() {
            Some(arg) => Some(self.bind_first_argument(*arg)?),
            None => None,
        };

        let Some(function) = choose_overload(&overloads, count, first.as_ref().map(|f| &f.node.ty)) else {
            if first.as_ref().map_or(false, |f| f.alias.is_some()) {
                self.report(call.args[0].span(), &messages::AS_NOT_PERMITTED, &[]);
            }
            for arg in call.args.iter().skip(1) {
                self.bind_expr(*arg)?;
            }
            let name = call.qualified_name();
            self.report(call.name.data.span, &messages::UNKNOWN_FUNCTION, &[&name]);
            node.binding = Binding::Error;
            return Ok(node);
        };
        tracing::trace!(function = %function, args = count, "bind call");

        // Open the row scope for per-row arguments.
        let mut frame = None;
        let mut table_reported = false;
        if let (Some(0), Some(first)) = (function.scope_arg, &first) {
            match &first.node.ty {
                DType::Table(row) => {
                    frame = Some(self.open_frame(row.clone(), first.alias.clone(), first.node.mutable));
                }
                ty if ty.is_error() => {}
                other => {
                    let name = function.name.to_string();
                    self.report(first.node.span, &messages::TABLE_ARGUMENT_EXPECTED, &[&name, other.kind_name()]);
                    table_reported = true;
                }
            }
        } else if let Some(first) = first.as_ref().filter(|f| f.alias.is_some()) {
            self.report(first.alias_span, &messages::AS_NOT_PERMITTED, &[]);
        }

        let mut args: Vec<BoundNode> = Vec::with_capacity(count);
        if let Some(first) = first {
            args.push(first.node);
        }
        for (i, arg) in call.args.iter().enumerate().skip(1) {
            let scoped = frame.filter(|_| function.is_lambda_slot(i, count));
            if let Some(frame) = scoped {
                self.active.push(frame);
            }
            let bound = self.bind_expr(*arg);
            if scoped.is_some() {
                self.active.pop();
            }
            args.push(bound?);
        }

        node.binding = Binding::Call {
            function: function.clone(),
            scope: frame,
        };

        if !function.admits_arity(count) {
            let received = count.to_string();
            let expected = function.arity_text();
            self.report(expr.span(), &messages::INVALID_ARGUMENT_COUNT, &[&received, &expected]);
            return Ok(node);
        }

        for (i, arg) in args.iter().enumerate() {
            if table_reported && i == 0 {
                continue;
            }
            let Some(kind) = function.slot_kind(i, count) else {
                continue;
            };
            match kind.admits(&arg.ty) {
                Some(coercion) => {
                    if !coercion.is_none() {
                        self.set_coercion(arg.id, coercion);
                    }
                }
                None => {
                    let expected = kind.describe();
                    self.report(arg.span, &messages::BAD_ARGUMENT_TYPE, &[arg.ty.kind_name(), &expected]);
                }
            }
        }

        let types: Vec<DType> = args.iter().map(|arg| arg.ty.clone()).collect();
        node.ty = function.return_type(&types);
        self.unify_branches(&function, &args, &node.ty);
        if let Some((i, row)) = function.conflicting_row(&types) {
            self.report(args[i].span, &messages::INCOMPATIBLE_TABLE_ROWS, &[&row.to_string(), &types[i].to_string()]);
        }
        node.mutable = function.row_selector && args.first().map_or(false, |arg| arg.mutable);
        Ok(node)
    }

    /// Convert every unioned argument to the call's type, or report the
    /// first pair that cannot be combined.
    fn unify_branches(&mut self, function: &FunctionSignature, args: &[BoundNode], result: &DType) {
        let unioned = function.unioned_args(args.len());
        if unioned.is_empty() {
            return;
        }
        if *result == DType::Error {
            let mut acc = DType::Blank;
            for &i in &unioned {
                let ty = &args[i].ty;
                if ty.is_error() {
                    return;
                }
                let merged = acc.union(ty);
                if merged == DType::Error {
                    let name = function.name.to_string();
                    self.report(args[i].span, &messages::INCOMPATIBLE_BRANCHES, &[&name, acc.kind_name(), ty.kind_name()]);
                    return;
                }
                acc = merged;
            }
            return;
        }
        for &i in &unioned {
            if let Some(coercion) = args[i].ty.coerces_to(result) {
                if !coercion.is_none() {
                    self.set_coercion(args[i].id, coercion);
                }
            }
        }
    }
}
