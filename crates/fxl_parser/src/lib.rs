//! fxl_parser: Recursive descent parser for formulas and named-formula
//! documents.
//!
//! Parses token streams from the scanner into an arena-allocated tree.

mod parser;
mod precedence;
mod utilities;

pub use parser::{parse_document, parse_formula, ParseOptions, ParsedDocument, ParsedFormula, Parser};
pub use precedence::OperatorPrecedence;
