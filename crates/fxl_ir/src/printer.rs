//! Textual rendering of the IR.
//!
//! The rendering is stable and tests compare against it:
//! - calls and operators: `Name:Tag(arg, ...)`
//! - literals: `value:Tag`, strings quoted with `""` escapes
//! - lazy arguments: `Lazy(child)`
//! - variables: `name:Tag`; row access: `Scope<id>.field:Tag`
//! - field access: `FieldAccess:Tag(record, field)`
//! - records: `{a:x, ...}:Tag`; tables: `[x, ...]:Tag`
//! - errors: `Error:e`
//!
//! `Tag` is the one-letter type tag, or the full type text for records,
//! tables and enums.

use crate::nodes::{IrKind, IrNode};
use fxl_types::DType;
use std::fmt;

pub struct IrPrinter {
    output: String,
}

impl IrPrinter {
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(256),
        }
    }

    /// Render a tree to a string.
    pub fn print(&mut self, node: &IrNode) -> String {
        self.output.clear();
        self.write_node(node);
        std::mem::take(&mut self.output)
    }

    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn write_tag(&mut self, ty: &DType) {
        self.write(":");
        match ty.tag() {
            Some(tag) => self.output.push(tag),
            None => self.output.push_str(&ty.to_string()),
        }
    }

    fn write_args<'n>(&mut self, args: impl IntoIterator<Item = &'n IrNode>) {
        self.write("(");
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write_node(arg);
        }
        self.write(")");
    }

    fn write_node(&mut self, node: &IrNode) {
        match &node.kind {
            IrKind::Number(value) => {
                self.write(&value.to_string());
                self.write_tag(&node.ty);
            }
            IrKind::String(value) => {
                self.write(&format!("\"{}\"", value.replace('"', "\"\"")));
                self.write_tag(&node.ty);
            }
            IrKind::Boolean(value) => {
                self.write(if *value { "true" } else { "false" });
                self.write_tag(&node.ty);
            }
            IrKind::Variable(name) => {
                self.write(&name.escaped());
                self.write_tag(&node.ty);
            }
            IrKind::ScopeAccess { scope, field } => {
                self.write(&format!("Scope{}.{}", scope.0, field.escaped()));
                self.write_tag(&node.ty);
            }
            IrKind::ScopeRow(scope) => {
                self.write(&format!("Scope{}", scope.0));
                self.write_tag(&node.ty);
            }
            IrKind::FieldAccess { record, field } => {
                self.write("FieldAccess");
                self.write_tag(&node.ty);
                self.write("(");
                self.write_node(record);
                self.write(", ");
                self.write(&field.escaped());
                self.write(")");
            }
            IrKind::EnumOption { enum_name, option } => {
                self.write(&format!("{}.{}", enum_name.escaped(), option.escaped()));
                self.write_tag(&node.ty);
            }
            IrKind::Unary { op, operand } => {
                self.write(op.as_str());
                self.write_tag(&node.ty);
                self.write_args([operand.as_ref()]);
            }
            IrKind::Binary { op, operands, left, right } => {
                self.write(op.as_str());
                self.write(operands.as_str());
                self.write_tag(&node.ty);
                self.write_args([left.as_ref(), right.as_ref()]);
            }
            IrKind::Call { function, args, .. } => {
                self.write(function);
                self.write_tag(&node.ty);
                self.write_args(args);
            }
            IrKind::Lazy(inner) => {
                self.write("Lazy(");
                self.write_node(inner);
                self.write(")");
            }
            IrKind::Record(fields) => {
                self.write("{");
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&name.escaped());
                    self.write(":");
                    self.write_node(value);
                }
                self.write("}");
                self.write_tag(&node.ty);
            }
            IrKind::Table(items) => {
                self.write("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write_node(item);
                }
                self.write("]");
                self.write_tag(&node.ty);
            }
            IrKind::Error => self.write("Error:e"),
        }
    }
}

impl Default for IrPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IrNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&IrPrinter::new().print(self))
    }
}
