//! Dependency discovery over bound formulas.

use fxl_ast::visitor::AstVisitor;
use fxl_ast::Identifier;
use fxl_binder::{Binding, BoundTree, VariableKind};
use fxl_core::Name;
use indexmap::IndexSet;

/// Strategy for extracting the names a bound formula depends on.
pub trait DependencyFinder {
    /// Referenced names, in first-reference order.
    fn find_dependencies(&self, tree: &BoundTree<'_>) -> IndexSet<Name>;
}

/// Collects the logical names of identifiers bound to scope-graph
/// variables. Row fields, enums and functions are not dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundReferenceFinder {
    /// Only report named formulas, not host variables and constants.
    pub formulas_only: bool,
}

impl BoundReferenceFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named_formulas() -> Self {
        Self { formulas_only: true }
    }
}

impl DependencyFinder for BoundReferenceFinder {
    fn find_dependencies(&self, tree: &BoundTree<'_>) -> IndexSet<Name> {
        let mut collector = Collector {
            tree,
            formulas_only: self.formulas_only,
            names: IndexSet::new(),
        };
        collector.visit_expr(tree.root);
        collector.names
    }
}

struct Collector<'t, 'a> {
    tree: &'t BoundTree<'a>,
    formulas_only: bool,
    names: IndexSet<Name>,
}

impl<'t, 'a> AstVisitor<'a> for Collector<'t, 'a> {
    fn visit_identifier(&mut self, node: &'a Identifier<'a>) {
        let Some(bound) = self.tree.node(node.data.id) else {
            return;
        };
        if let Binding::Variable { name, kind } = &bound.binding {
            if !self.formulas_only || *kind == VariableKind::NamedFormula {
                self.names.insert(name.clone());
            }
        }
    }
}
