//! fxl_binder: Name resolution, typing and invocation checks.
//!
//! The binder walks a parsed formula against a scope graph and produces a
//! bound tree: every node paired with its type, mutability, the coercion
//! its context applies and what its name resolved to. It also owns the
//! function signature model and the built-in function library.

mod binder;
mod bound;
mod functions;
mod scope;
mod symbol;

pub use binder::{backing_path, BindOptions, Binder, InvocationCheck};
pub use bound::{Binding, BoundNode, BoundTree, FrameId};
pub use functions::{
    builtin_functions, FunctionLibrary, FunctionSignature, LambdaKind, ParamKind, ReturnRule, VariadicGroup,
};
pub use scope::{RowScope, ScopeError, ScopeGraph, ScopeId, ScopeTable};
pub use symbol::{Variable, VariableKind, VariableTable};
