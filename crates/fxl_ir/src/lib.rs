//! fxl_ir: Executable intermediate representation.
//!
//! [`lower`] turns a bound formula into an [`IrNode`] tree for an external
//! evaluator. The textual rendering produced by [`IrPrinter`] (and
//! `Display`) is stable; tooling and tests compare against it.

mod lower;
mod nodes;
mod printer;

pub use lower::lower;
pub use nodes::{BinaryOpKind, IrKind, IrNode, OperandKind, ScopeSymbol, ScopeSymbolId, UnaryOpKind};
pub use printer::IrPrinter;
