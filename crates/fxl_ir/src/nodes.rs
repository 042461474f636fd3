//! IR node definitions.
//!
//! The IR is an owned tree: every node carries its type and the span of
//! the source it was lowered from. Operators are resolved to typed forms
//! (`AddDecimals`, `EqText`, ...) and every conversion the binder decided
//! on is an explicit call.

use fxl_core::{arena_key, Name, Span};
use fxl_types::DType;

arena_key! {
    /// Handle of a row scope in the IR.
    pub struct ScopeSymbolId;
}

/// A row scope of the IR: the formula's own row, or the rows a
/// table-iterating call evaluates its lazy arguments against.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSymbol {
    pub id: ScopeSymbolId,
    /// Record type of the row.
    pub row: DType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    NegateNumber,
    NegateDecimal,
    PercentNumber,
    PercentDecimal,
    Not,
}

impl UnaryOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOpKind::NegateNumber => "NegateNumber",
            UnaryOpKind::NegateDecimal => "NegateDecimal",
            UnaryOpKind::PercentNumber => "PercentNumber",
            UnaryOpKind::PercentDecimal => "PercentDecimal",
            UnaryOpKind::Not => "Not",
        }
    }
}

/// Operator of a typed binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    In,
    ExactIn,
}

impl BinaryOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOpKind::Add => "Add",
            BinaryOpKind::Sub => "Sub",
            BinaryOpKind::Mul => "Mul",
            BinaryOpKind::Div => "Div",
            BinaryOpKind::Power => "Power",
            BinaryOpKind::Eq => "Eq",
            BinaryOpKind::NotEq => "NotEq",
            BinaryOpKind::Lt => "Lt",
            BinaryOpKind::LtEq => "LtEq",
            BinaryOpKind::Gt => "Gt",
            BinaryOpKind::GtEq => "GtEq",
            BinaryOpKind::And => "And",
            BinaryOpKind::Or => "Or",
            BinaryOpKind::In => "In",
            BinaryOpKind::ExactIn => "ExactIn",
        }
    }
}

/// What a binary operator works on, after conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Numbers,
    Decimals,
    Text,
    Booleans,
    Dates,
    DateTimes,
    Times,
    Colors,
    Guids,
    Blanks,
    /// A date or date-time shifted by a number of days.
    DateAndNumber,
    DateTimeAndNumber,
    /// Membership in a single-column table.
    Table,
    /// Values compared for identity only.
    Values,
    /// Logical operators.
    None,
}

impl OperandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperandKind::Numbers => "Numbers",
            OperandKind::Decimals => "Decimals",
            OperandKind::Text => "Text",
            OperandKind::Booleans => "Booleans",
            OperandKind::Dates => "Dates",
            OperandKind::DateTimes => "DateTimes",
            OperandKind::Times => "Times",
            OperandKind::Colors => "Colors",
            OperandKind::Guids => "Guids",
            OperandKind::Blanks => "Blanks",
            OperandKind::DateAndNumber => "DateAndNumber",
            OperandKind::DateTimeAndNumber => "DateTimeAndNumber",
            OperandKind::Table => "Table",
            OperandKind::Values => "Values",
            OperandKind::None => "",
        }
    }

    /// Operand kind for values of type `ty`.
    pub fn of(ty: &DType) -> Self {
        match ty {
            DType::Number => OperandKind::Numbers,
            DType::Decimal => OperandKind::Decimals,
            DType::String | DType::Hyperlink => OperandKind::Text,
            DType::Boolean => OperandKind::Booleans,
            DType::Date => OperandKind::Dates,
            DType::DateTime => OperandKind::DateTimes,
            DType::Time => OperandKind::Times,
            DType::Color => OperandKind::Colors,
            DType::Guid => OperandKind::Guids,
            DType::Blank => OperandKind::Blanks,
            DType::Enum(e) => OperandKind::of(&e.kind().backing_type()),
            _ => OperandKind::Values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    pub span: Span,
    pub ty: DType,
    pub kind: IrKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrKind {
    Number(f64),
    String(String),
    Boolean(bool),
    /// A scope-graph variable or named formula, by logical name.
    Variable(Name),
    /// A field of a row scope.
    ScopeAccess { scope: ScopeSymbolId, field: Name },
    /// The whole row of a row scope.
    ScopeRow(ScopeSymbolId),
    FieldAccess { record: Box<IrNode>, field: Name },
    EnumOption { enum_name: Name, option: Name },
    Unary { op: UnaryOpKind, operand: Box<IrNode> },
    Binary {
        op: BinaryOpKind,
        operands: OperandKind,
        left: Box<IrNode>,
        right: Box<IrNode>,
    },
    /// A function call, including conversions. `scope` is the row scope
    /// the call's lazy arguments are evaluated against.
    Call {
        function: String,
        scope: Option<ScopeSymbolId>,
        args: Vec<IrNode>,
    },
    /// An argument evaluated per row.
    Lazy(Box<IrNode>),
    Record(Vec<(Name, IrNode)>),
    Table(Vec<IrNode>),
    Error,
}

impl IrNode {
    pub fn new(span: Span, ty: DType, kind: IrKind) -> Self {
        Self { span, ty, kind }
    }

    pub fn error(span: Span) -> Self {
        Self::new(span, DType::Error, IrKind::Error)
    }

    pub fn call(span: Span, ty: DType, function: impl Into<String>, args: Vec<IrNode>) -> Self {
        Self::new(
            span,
            ty,
            IrKind::Call {
                function: function.into(),
                scope: None,
                args,
            },
        )
    }

    /// Name of the operation, for calls and operators.
    pub fn operation(&self) -> Option<String> {
        match &self.kind {
            IrKind::Call { function, .. } => Some(function.clone()),
            IrKind::Unary { op, .. } => Some(op.as_str().to_string()),
            IrKind::Binary { op, operands, .. } => Some(format!("{}{}", op.as_str(), operands.as_str())),
            _ => None,
        }
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&IrNode> {
        match &self.kind {
            IrKind::FieldAccess { record, .. } => vec![record],
            IrKind::Unary { operand, .. } => vec![operand],
            IrKind::Binary { left, right, .. } => vec![left, right],
            IrKind::Call { args, .. } | IrKind::Table(args) => args.iter().collect(),
            IrKind::Lazy(inner) => vec![inner],
            IrKind::Record(fields) => fields.iter().map(|(_, value)| value).collect(),
            IrKind::Number(_)
            | IrKind::String(_)
            | IrKind::Boolean(_)
            | IrKind::Variable(_)
            | IrKind::ScopeAccess { .. }
            | IrKind::ScopeRow(_)
            | IrKind::EnumOption { .. }
            | IrKind::Error => Vec::new(),
        }
    }

    /// Visit this node and all its descendants, parents first.
    pub fn walk<'n>(&'n self, f: &mut impl FnMut(&'n IrNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}
