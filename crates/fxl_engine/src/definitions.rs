//! Named-formula documents.
//!
//! A document declares formulas (`name = expr;`) and user-defined functions
//! (`name(p: T): R = expr;`). Formulas may refer to each other in any
//! order: every formula is first bound with its peers typed `Unknown` to
//! discover references, the references are sorted into dependency order,
//! and each formula is then bound again once everything it reads has a
//! type.

use crate::{Engine, EngineError};
use bumpalo::Bump;
use fxl_ast::*;
use fxl_binder::{Binder, BoundTree, FunctionSignature, ParamKind, ReturnRule, ScopeGraph, ScopeId, Variable};
use fxl_core::{Name, Span};
use fxl_depgraph::{topological_sort, BoundReferenceFinder, DependencyFinder, SortError};
use fxl_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use fxl_ir::IrNode;
use fxl_parser::parse_document;
use fxl_types::DType;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// A checked named formula.
#[derive(Debug, Clone)]
pub struct FormulaDefinition {
    pub name: Name,
    pub span: Span,
    pub ty: DType,
    /// Logical names of everything the formula reads, formulas included.
    pub dependencies: Vec<Name>,
    /// The lowered body, when the formula has no errors.
    pub ir: Option<IrNode>,
}

/// Outcome of checking a document.
#[derive(Debug, Clone, Default)]
pub struct DefinitionsResult {
    /// Formulas in declaration order.
    pub formulas: Vec<FormulaDefinition>,
    pub udfs: Vec<Arc<FunctionSignature>>,
    /// Evaluation order. Formulas on a cycle are left out.
    pub order: Vec<Name>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DefinitionsResult {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn formula(&self, name: &str) -> Option<&FormulaDefinition> {
        self.formulas.iter().find(|f| f.name.as_str() == name)
    }
}

impl Engine {
    /// Check a named-formula document against the host.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn definitions(&self, source: &str) -> Result<DefinitionsResult, EngineError> {
        let arena = Bump::new();
        let parsed = parse_document(&arena, source);
        let mut checker = DocumentChecker {
            engine: self,
            graph: self.graph.clone(),
            scope: self.global,
            node_count: parsed.node_count,
            diagnostics: parsed.diagnostics,
        };
        checker.scope = checker.graph.create(Name::new("document"), Some(self.global))?;
        checker.check(parsed.document)
    }
}

struct Formula<'a> {
    decl: &'a NamedFormula<'a>,
    name: Name,
}

struct DocumentChecker<'e> {
    engine: &'e Engine,
    /// The host graph plus a document table holding the declarations.
    graph: ScopeGraph,
    scope: ScopeId,
    node_count: u32,
    diagnostics: DiagnosticCollection,
}

impl<'e> DocumentChecker<'e> {
    fn binder(&self, scope: ScopeId) -> Binder<'_> {
        Binder::new(&self.graph, Some(scope), &self.engine.enums).with_options(self.engine.bind_options())
    }

    fn bind<'a>(&self, scope: ScopeId, body: Expr<'a>) -> Result<BoundTree<'a>, EngineError> {
        Ok(self.binder(scope).bind(body, self.node_count, None)?)
    }

    fn check(mut self, document: Document<'_>) -> Result<DefinitionsResult, EngineError> {
        let (formulas, udfs) = self.declare(document)?;

        // First pass: discover references between formulas.
        let declared: FxHashSet<Name> = formulas.iter().map(|f| f.name.clone()).collect();
        let mut edges = Vec::new();
        for formula in &formulas {
            let tree = self.bind(self.scope, formula.decl.body)?;
            for dependency in BoundReferenceFinder::named_formulas().find_dependencies(&tree) {
                if declared.contains(&dependency) {
                    edges.push((dependency, formula.name.clone()));
                }
            }
        }
        let names: Vec<Name> = formulas.iter().map(|f| f.name.clone()).collect();
        let order = self.order(&formulas, &names, &edges);
        tracing::debug!(formulas = names.len(), ordered = order.len(), "ordered formulas");

        // Second pass: bind in dependency order, publishing each type.
        let mut results: FxHashMap<Name, FormulaDefinition> = FxHashMap::default();
        for name in &order {
            let Some(formula) = formulas.iter().find(|f| &f.name == name) else {
                continue;
            };
            let tree = self.bind(self.scope, formula.decl.body)?;
            let ty = tree.result_type();
            self.graph.set_variable_type(self.scope, name.as_str(), ty.clone())?;
            let ir = if tree.has_errors() {
                None
            } else {
                Some(fxl_ir::lower(&tree).0)
            };
            let dependencies = BoundReferenceFinder::new().find_dependencies(&tree).into_iter().collect();
            self.diagnostics.extend(tree.diagnostics);
            results.insert(
                name.clone(),
                FormulaDefinition {
                    name: name.clone(),
                    span: formula.decl.data.span,
                    ty,
                    dependencies,
                    ir,
                },
            );
        }

        for (udf, signature) in &udfs {
            self.check_udf_body(udf, signature)?;
        }

        let formulas = formulas
            .iter()
            .map(|formula| {
                results.remove(&formula.name).unwrap_or_else(|| FormulaDefinition {
                    name: formula.name.clone(),
                    span: formula.decl.data.span,
                    ty: DType::Error,
                    dependencies: Vec::new(),
                    ir: None,
                })
            })
            .collect();
        self.diagnostics.sort();
        Ok(DefinitionsResult {
            formulas,
            udfs: udfs.into_iter().map(|(_, signature)| signature).collect(),
            order,
            diagnostics: self.diagnostics.into_diagnostics(),
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Register every formula and function of the document, reporting
    /// duplicates, host conflicts and bad signatures.
    #[allow(clippy::type_complexity)]
    fn declare<'a>(
        &mut self,
        document: Document<'a>,
    ) -> Result<(Vec<Formula<'a>>, Vec<(&'a UdfDecl<'a>, Arc<FunctionSignature>)>), EngineError> {
        let mut formulas = Vec::new();
        let mut udfs = Vec::new();
        let mut seen: FxHashMap<Name, Span> = FxHashMap::default();
        for item in document.items.iter() {
            let ident = item.name();
            if ident.is_missing() {
                continue;
            }
            let name = ident.name();
            if let Some(&first) = seen.get(&name) {
                let duplicate = Diagnostic::new(ident.data.span, &messages::DUPLICATE_DEFINITION, &[ident.text])
                    .with_related(Diagnostic::new(first, &messages::FIRST_DEFINED_HERE, &[ident.text]));
                self.diagnostics.add(duplicate);
                continue;
            }
            seen.insert(name.clone(), ident.data.span);
            if self.conflicts_with_host(&name)? {
                self.diagnostics.report(ident.data.span, &messages::CONFLICTS_WITH_HOST_NAME, &[ident.text]);
                continue;
            }
            match item {
                DocItem::Formula(decl) => {
                    self.graph
                        .add_variable(self.scope, Variable::named_formula(name.clone(), DType::Unknown))?;
                    formulas.push(Formula { decl: *decl, name });
                }
                DocItem::Udf(decl) => {
                    if let Some(signature) = self.udf_signature(decl) {
                        self.graph.add_function(self.scope, signature.clone())?;
                        udfs.push((*decl, Arc::new(signature)));
                    }
                }
            }
        }
        Ok((formulas, udfs))
    }

    fn conflicts_with_host(&self, name: &Name) -> Result<bool, EngineError> {
        let global = Some(self.engine.global);
        Ok(self.graph.resolve_variable(global, name.as_str())?.is_some()
            || self.graph.has_function_named(global, name.as_str())?
            || self.engine.enums.get(name.as_str()).is_some())
    }

    /// The signature of a function declaration, or `None` after reporting
    /// why it has none.
    fn udf_signature(&mut self, decl: &UdfDecl<'_>) -> Option<FunctionSignature> {
        let mut ok = true;
        let mut params = Vec::with_capacity(decl.params.len());
        let mut names: FxHashSet<Name> = FxHashSet::default();
        for param in decl.params.iter() {
            if !names.insert(param.name.name()) {
                self.diagnostics
                    .report(param.name.data.span, &messages::DUPLICATE_PARAMETER, &[param.name.text]);
                ok = false;
            }
            match self.type_ref(&param.ty) {
                Some(ty) if ty.is_primitive() && ty != DType::Void => params.push(ty),
                Some(_) => {
                    let type_name = param.ty.name.text;
                    self.diagnostics.report(
                        param.ty.data.span,
                        &messages::NON_PRIMITIVE_PARAMETER_TYPE,
                        &[param.name.text, type_name],
                    );
                    ok = false;
                }
                None => ok = false,
            }
        }
        let returns = match self.type_ref(&decl.return_type) {
            Some(ty) if ty.is_primitive() => ty,
            Some(_) => {
                let type_name = decl.return_type.name.text;
                self.diagnostics
                    .report(decl.return_type.data.span, &messages::NON_PRIMITIVE_RETURN_TYPE, &[type_name]);
                return None;
            }
            None => return None,
        };
        ok.then(|| FunctionSignature::user_defined(decl.name.name(), params, returns))
    }

    fn type_ref(&mut self, type_ref: &TypeRef<'_>) -> Option<DType> {
        let text = type_ref.name.text;
        let ty = DType::from_type_name(text);
        if ty.is_none() {
            self.diagnostics.report(type_ref.data.span, &messages::UNKNOWN_TYPE, &[text]);
        }
        ty
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Dependency order of the formulas. Formulas on a cycle are reported,
    /// typed `Error` and left out; the rest are still ordered.
    fn order(&mut self, formulas: &[Formula<'_>], names: &[Name], edges: &[(Name, Name)]) -> Vec<Name> {
        let cycle = match topological_sort(names, edges) {
            Ok(order) => return order,
            Err(SortError::Cycle(members)) => members,
            Err(SortError::UnknownNode(name)) => {
                tracing::warn!(%name, "dependency on an undeclared formula");
                return names.to_vec();
            }
        };

        let listed = cycle.iter().map(Name::to_string).collect::<Vec<_>>().join(", ");
        for formula in formulas.iter().filter(|f| cycle.contains(&f.name)) {
            self.diagnostics
                .report(formula.decl.name.data.span, &messages::CIRCULAR_REFERENCE, &[&listed]);
            // The formula keeps no usable type; readers see an error.
            if let Err(err) = self.graph.set_variable_type(self.scope, formula.name.as_str(), DType::Error) {
                tracing::warn!(%err, "could not mark cyclic formula");
            }
        }

        let remaining: Vec<Name> = names.iter().filter(|n| !cycle.contains(n)).cloned().collect();
        let acyclic: Vec<(Name, Name)> = edges
            .iter()
            .filter(|(from, to)| !cycle.contains(from) && !cycle.contains(to))
            .cloned()
            .collect();
        topological_sort(&remaining, &acyclic).unwrap_or(remaining)
    }

    // ========================================================================
    // Function bodies
    // ========================================================================

    fn check_udf_body(&mut self, decl: &UdfDecl<'_>, signature: &FunctionSignature) -> Result<(), EngineError> {
        let scope = self.graph.create(decl.name.name(), Some(self.scope))?;
        for (param, ty) in decl.params.iter().zip(&signature.params) {
            let ty = match ty {
                ParamKind::Exact(ty) => ty.clone(),
                _ => DType::Error,
            };
            self.graph.add_variable(scope, Variable::constant(param.name.name(), ty))?;
        }

        let (body_type, body_span) = match decl.body {
            UdfBody::Expr(body) => {
                let tree = self.bind(scope, body)?;
                let ty = tree.result_type();
                self.diagnostics.extend(tree.diagnostics);
                (ty, body.span())
            }
            UdfBody::Block(block) => {
                let mut last = DType::Void;
                for statement in block.statements.iter() {
                    let tree = self.bind(scope, *statement)?;
                    last = tree.result_type();
                    self.diagnostics.extend(tree.diagnostics);
                }
                (last, block.data.span)
            }
        };
        self.graph.remove(scope);

        let declared = match &signature.returns {
            ReturnRule::Fixed(ty) => ty.clone(),
            _ => return Ok(()),
        };
        if declared != DType::Void && !body_type.is_error() && body_type.coerces_to(&declared).is_none() {
            let name = decl.name.text;
            self.diagnostics.report(
                body_span,
                &messages::RETURN_TYPE_MISMATCH,
                &[name, declared.kind_name(), body_type.kind_name()],
            );
        }
        Ok(())
    }
}
