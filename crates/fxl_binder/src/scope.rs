//! The scope graph.
//!
//! Scope tables hold variables and functions. A table may have a parent and
//! may compose peer tables; lookups starting at a table visit the table,
//! then each composed peer (fully expanded), then the parent chain. Links
//! are captured as ids when a table is created, so a well-formed graph is
//! acyclic; enumeration still checks for cycles and fails instead of
//! looping.

use crate::functions::FunctionSignature;
use crate::symbol::{Variable, VariableTable};
use fxl_core::{arena_key, CoreError, CoreResult, Name, Path, SlotArena, VersionToken};
use fxl_types::{DType, RecordType};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

arena_key! {
    /// Handle of a table in a [`ScopeGraph`].
    pub struct ScopeId;
}

/// Configuration-time errors when editing scope tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("'{0}' is already defined in this scope")]
    Duplicate(Name),
    #[error("scope {0:?} does not exist")]
    UnknownScope(ScopeId),
}

#[derive(Debug, Clone)]
pub struct ScopeTable {
    name: Name,
    parent: Option<ScopeId>,
    composed: Vec<ScopeId>,
    variables: VariableTable,
    /// Overloads keyed by full path.
    functions: FxHashMap<Path, Vec<Arc<FunctionSignature>>>,
    version: VersionToken,
}

impl ScopeTable {
    fn new(name: Name, parent: Option<ScopeId>, composed: Vec<ScopeId>) -> Self {
        Self {
            name,
            parent,
            composed,
            variables: VariableTable::new(),
            functions: FxHashMap::default(),
            version: VersionToken::fresh(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn composed(&self) -> &[ScopeId] {
        &self.composed
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn functions(&self, path: &Path) -> &[Arc<FunctionSignature>] {
        self.functions.get(path).map_or(&[], Vec::as_slice)
    }

    pub fn has_functions(&self, name: &str) -> bool {
        self.functions.keys().any(|path| path.name().as_str() == name)
    }

    pub fn version(&self) -> VersionToken {
        self.version
    }
}

/// Owner of every scope table of a configuration.
///
/// Build the graph first, then share it (behind an `Arc`) with readers.
/// Nothing inside is locked.
#[derive(Debug, Clone, Default)]
pub struct ScopeGraph {
    tables: SlotArena<ScopeId, ScopeTable>,
}

impl ScopeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub fn create(&mut self, name: impl Into<Name>, parent: Option<ScopeId>) -> Result<ScopeId, ScopeError> {
        if let Some(parent) = parent {
            self.require(parent)?;
        }
        Ok(self.tables.alloc(ScopeTable::new(name.into(), parent, Vec::new())))
    }

    /// A new table with no parent.
    pub fn create_root(&mut self, name: impl Into<Name>) -> ScopeId {
        self.tables.alloc(ScopeTable::new(name.into(), None, Vec::new()))
    }

    /// A new table whose lookups search each of `tables` in order.
    pub fn compose(&mut self, name: impl Into<Name>, tables: &[ScopeId]) -> Result<ScopeId, ScopeError> {
        for &table in tables {
            self.require(table)?;
        }
        Ok(self
            .tables
            .alloc(ScopeTable::new(name.into(), None, tables.to_vec())))
    }

    /// Re-link a table. Only valid while configuring; this is the one way
    /// a graph can become cyclic.
    pub fn set_parent(&mut self, scope: ScopeId, parent: Option<ScopeId>) -> Result<(), ScopeError> {
        if let Some(parent) = parent {
            self.require(parent)?;
        }
        let table = self.table_mut(scope)?;
        table.parent = parent;
        table.version.bump();
        Ok(())
    }

    pub fn remove(&mut self, scope: ScopeId) -> Option<ScopeTable> {
        self.tables.remove(scope)
    }

    pub fn add_variable(&mut self, scope: ScopeId, variable: Variable) -> Result<(), ScopeError> {
        let table = self.table_mut(scope)?;
        let name = variable.name.clone();
        if !table.variables.insert(variable) {
            return Err(ScopeError::Duplicate(name));
        }
        table.version.bump();
        Ok(())
    }

    pub fn remove_variable(&mut self, scope: ScopeId, name: &str) -> Result<Option<Variable>, ScopeError> {
        let table = self.table_mut(scope)?;
        let removed = table.variables.remove(name);
        if removed.is_some() {
            table.version.bump();
        }
        Ok(removed)
    }

    /// Replace the type of an existing variable. Returns false when the
    /// table has no such variable.
    pub fn set_variable_type(&mut self, scope: ScopeId, name: &str, ty: DType) -> Result<bool, ScopeError> {
        let table = self.table_mut(scope)?;
        match table.variables.get_mut(name) {
            Some(variable) => {
                variable.ty = ty;
                table.version.bump();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn add_function(&mut self, scope: ScopeId, signature: FunctionSignature) -> Result<(), ScopeError> {
        let table = self.table_mut(scope)?;
        table
            .functions
            .entry(signature.path())
            .or_default()
            .push(Arc::new(signature));
        table.version.bump();
        Ok(())
    }

    pub fn get(&self, scope: ScopeId) -> Option<&ScopeTable> {
        self.tables.get(scope)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn require(&self, scope: ScopeId) -> Result<&ScopeTable, ScopeError> {
        self.tables.get(scope).ok_or(ScopeError::UnknownScope(scope))
    }

    fn table_mut(&mut self, scope: ScopeId) -> Result<&mut ScopeTable, ScopeError> {
        self.tables.get_mut(scope).ok_or(ScopeError::UnknownScope(scope))
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Every table reachable from `roots`, in lookup order. `None` roots
    /// are skipped and tables reachable along several routes are yielded
    /// once per route.
    pub fn enumerate(&self, roots: &[Option<ScopeId>]) -> CoreResult<Vec<ScopeId>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for root in roots.iter().flatten() {
            self.expand(*root, &mut path, &mut out)?;
        }
        Ok(out)
    }

    fn expand(&self, scope: ScopeId, path: &mut Vec<ScopeId>, out: &mut Vec<ScopeId>) -> CoreResult<()> {
        let table = self.tables.get(scope).ok_or_else(|| {
            CoreError::InvalidState(format!("scope {:?} was removed while still linked", scope))
        })?;
        if path.contains(&scope) {
            return Err(CoreError::ScopeCycle(table.name.to_string()));
        }
        path.push(scope);
        out.push(scope);
        for &peer in &table.composed {
            self.expand(peer, path, out)?;
        }
        if let Some(parent) = table.parent {
            self.expand(parent, path, out)?;
        }
        path.pop();
        Ok(())
    }

    /// First variable visible from `root` under the logical or display
    /// name `name`.
    pub fn resolve_variable(&self, root: Option<ScopeId>, name: &str) -> CoreResult<Option<&Variable>> {
        for scope in self.enumerate(&[root])? {
            if let Some(variable) = self.tables.get(scope).and_then(|t| t.variables.resolve(name)) {
                return Ok(Some(variable));
            }
        }
        Ok(None)
    }

    /// Overloads of the function at `path` in the first table that defines
    /// any.
    pub fn resolve_functions(&self, root: Option<ScopeId>, path: &Path) -> CoreResult<Vec<Arc<FunctionSignature>>> {
        for scope in self.enumerate(&[root])? {
            if let Some(table) = self.tables.get(scope) {
                let found = table.functions(path);
                if !found.is_empty() {
                    return Ok(found.to_vec());
                }
            }
        }
        Ok(Vec::new())
    }

    /// Whether any visible table defines a function named `name`, in any
    /// namespace.
    pub fn has_function_named(&self, root: Option<ScopeId>, name: &str) -> CoreResult<bool> {
        Ok(self
            .enumerate(&[root])?
            .into_iter()
            .filter_map(|scope| self.tables.get(scope))
            .any(|table| table.has_functions(name)))
    }

    /// A token that changes whenever any table visible from `root` does.
    pub fn version(&self, root: ScopeId) -> CoreResult<VersionToken> {
        let scopes = self.enumerate(&[Some(root)])?;
        let mut tokens = scopes
            .into_iter()
            .filter_map(|scope| self.tables.get(scope))
            .map(ScopeTable::version);
        let first = tokens
            .next()
            .ok_or_else(|| CoreError::InvalidState("empty scope enumeration".to_string()))?;
        Ok(tokens.fold(first, VersionToken::combine))
    }
}

/// The record a row-scoped expression evaluates against.
#[derive(Debug, Clone, PartialEq)]
pub struct RowScope {
    pub row: RecordType,
    /// Expose `ThisRecord` for the whole row.
    pub expose_this_record: bool,
    /// Whether fields reached through the row may be updated.
    pub mutable: bool,
}

impl RowScope {
    pub fn new(row: RecordType) -> Self {
        Self {
            row,
            expose_this_record: true,
            mutable: false,
        }
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    pub fn hide_this_record(mut self) -> Self {
        self.expose_this_record = false;
        self
    }
}
