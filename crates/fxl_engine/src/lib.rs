//! fxl_engine: Checking formulas against a host configuration.
//!
//! An [`Engine`] owns the host's scope graph, enums and options. It runs
//! the pipeline for single formulas (parse -> bind -> lower) and for
//! named-formula documents, where formulas are ordered by dependency
//! before each is bound.

mod definitions;

pub use definitions::{DefinitionsResult, FormulaDefinition};

use bumpalo::Bump;
use fxl_binder::{BindOptions, Binder, RowScope, ScopeError, ScopeGraph, ScopeId, Variable};
use fxl_core::Name;
use fxl_depgraph::{BoundReferenceFinder, DependencyFinder};
use fxl_diagnostics::Diagnostic;
use fxl_ir::{IrNode, ScopeSymbol};
use fxl_options::{EngineOptions, HostConfig, OptionsError};
use fxl_parser::{parse_formula, ParseOptions};
use fxl_types::{DType, EnumStore};
use rayon::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("enum '{0}' is already defined")]
    DuplicateEnum(Name),

    #[error(transparent)]
    Core(#[from] fxl_core::CoreError),
}

/// Outcome of checking one formula.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub return_type: DType,
    /// Parse and binding diagnostics, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// The lowered formula, when it has no errors.
    pub ir: Option<IrNode>,
    pub scope: Option<ScopeSymbol>,
    /// Logical names of the variables the formula reads.
    pub dependencies: Vec<Name>,
}

impl CheckResult {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// The checking context of one host.
#[derive(Debug, Clone)]
pub struct Engine {
    graph: ScopeGraph,
    global: ScopeId,
    enums: EnumStore,
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let mut graph = ScopeGraph::new();
        let global = graph.create_root("global");
        Self {
            graph,
            global,
            enums: EnumStore::with_builtins(),
            options,
        }
    }

    /// An engine with the options, variables and enums of a host
    /// configuration.
    pub fn from_config(config: &HostConfig) -> Result<Self, EngineError> {
        let mut engine = Self::new(config.options.clone());
        for (name, ty) in config.enum_types()? {
            if !engine.enums.add(name.clone(), ty) {
                return Err(EngineError::DuplicateEnum(name));
            }
        }
        for decl in &config.variables {
            let mut variable = Variable::new(decl.name.as_str(), decl.dtype()?);
            if decl.mutable {
                variable = variable.mutable();
            }
            if let Some(display) = &decl.display_name {
                variable = variable.with_display_name(display.as_str());
            }
            engine.declare(variable)?;
        }
        engine.enums.prepare()?;
        tracing::debug!(
            variables = config.variables.len(),
            enums = engine.enums.len(),
            "configured engine"
        );
        Ok(engine)
    }

    /// Make a host variable visible to formulas.
    pub fn declare(&mut self, variable: Variable) -> Result<(), ScopeError> {
        self.graph.add_variable(self.global, variable)
    }

    pub fn add_enum(&mut self, name: Name, ty: DType) -> bool {
        self.enums.add(name, ty)
    }

    pub fn graph(&self) -> &ScopeGraph {
        &self.graph
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn enums(&self) -> &EnumStore {
        &self.enums
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub(crate) fn bind_options(&self) -> BindOptions {
        BindOptions {
            numbers_are_floats: self.options.numbers_are_floats,
            expose_this_record: self.options.expose_this_record,
        }
    }

    pub(crate) fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            allow_chaining: self.options.allow_chaining,
            max_expression_length: Some(self.options.max_expression_length),
        }
    }

    pub fn check(&self, source: &str) -> Result<CheckResult, EngineError> {
        self.check_in_row(source, None)
    }

    /// Check a formula evaluated against the rows of `row`.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn check_in_row(&self, source: &str, row: Option<&RowScope>) -> Result<CheckResult, EngineError> {
        let arena = Bump::new();
        let parsed = parse_formula(&arena, source, self.parse_options());
        let mut diagnostics = parsed.diagnostics.into_diagnostics();
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(CheckResult {
                return_type: DType::Error,
                diagnostics,
                ir: None,
                scope: None,
                dependencies: Vec::new(),
            });
        }

        let binder = Binder::new(&self.graph, Some(self.global), &self.enums).with_options(self.bind_options());
        let tree = binder.bind(parsed.root, parsed.node_count, row)?;
        diagnostics.extend(tree.diagnostics.iter().cloned());
        diagnostics.sort_by_key(|d| (d.span.min, d.span.lim));

        let dependencies = BoundReferenceFinder::new().find_dependencies(&tree).into_iter().collect();
        let (ir, scope) = if tree.has_errors() {
            (None, None)
        } else {
            let (ir, scope) = fxl_ir::lower(&tree);
            (Some(ir), Some(scope))
        };
        Ok(CheckResult {
            return_type: tree.result_type(),
            diagnostics,
            ir,
            scope,
            dependencies,
        })
    }

    /// Check independent formulas in parallel. Results keep input order.
    pub fn check_many(&self, sources: &[&str]) -> Vec<Result<CheckResult, EngineError>> {
        sources.par_iter().map(|source| self.check(source)).collect()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
