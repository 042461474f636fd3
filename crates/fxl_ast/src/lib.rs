//! fxl_ast: Syntax tree definitions for the formula language.
//!
//! This module defines the expression and document node types, the token
//! `SyntaxKind` enum, and associated flag types.

pub mod generated;
pub mod node;
pub mod syntax_kind;
pub mod types;
pub mod visitor;

// Re-export key types
pub use node::*;
pub use syntax_kind::SyntaxKind;
pub use types::*;
