//! fxl_depgraph: Formula dependencies and evaluation order.
//!
//! A [`DependencyFinder`] extracts the names a bound formula refers to;
//! [`topological_sort`] orders named formulas so every dependency comes
//! before its dependents, or reports the formulas that form cycles.

mod deps;
mod topo;

pub use deps::{BoundReferenceFinder, DependencyFinder};
pub use topo::{topological_sort, SortError};
