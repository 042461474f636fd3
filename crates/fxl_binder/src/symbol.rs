//! Variable and variable table definitions.

use fxl_core::Name;
use fxl_types::DType;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// What a name in a scope table stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// A host-provided value.
    Variable,
    /// A host-provided value that can never be updated.
    Constant,
    /// A formula declared in a named-formula document.
    NamedFormula,
}

/// A named value visible through a scope table.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// The logical (backing) name.
    pub name: Name,
    /// The name users write, when it differs from the logical name.
    pub display_name: Option<Name>,
    pub ty: DType,
    /// Whether the host allows in-place updates of the value.
    pub mutable: bool,
    pub kind: VariableKind,
}

impl Variable {
    pub fn new(name: impl Into<Name>, ty: DType) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            ty,
            mutable: false,
            kind: VariableKind::Variable,
        }
    }

    pub fn constant(name: impl Into<Name>, ty: DType) -> Self {
        Self {
            kind: VariableKind::Constant,
            ..Self::new(name, ty)
        }
    }

    pub fn named_formula(name: impl Into<Name>, ty: DType) -> Self {
        Self {
            kind: VariableKind::NamedFormula,
            ..Self::new(name, ty)
        }
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = self.kind == VariableKind::Variable;
        self
    }

    pub fn with_display_name(mut self, display: impl Into<Name>) -> Self {
        self.display_name = Some(display.into());
        self
    }

    /// The name shown to users.
    pub fn shown_name(&self) -> &Name {
        self.display_name.as_ref().unwrap_or(&self.name)
    }
}

/// Variables of one scope table in declaration order, addressable by
/// logical or display name.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    table: IndexMap<Name, Variable>,
    /// display name -> logical name
    display: FxHashMap<Name, Name>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a variable up by logical name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.table.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.table.get_mut(name)
    }

    /// Look a variable up by logical name, then by display name.
    pub fn resolve(&self, name: &str) -> Option<&Variable> {
        self.table
            .get(name)
            .or_else(|| self.display.get(name).and_then(|logical| self.table.get(logical)))
    }

    /// Whether either form of `variable`'s name is taken.
    pub fn conflicts(&self, variable: &Variable) -> bool {
        let taken = |name: &Name| self.table.contains_key(name) || self.display.contains_key(name);
        taken(&variable.name) || variable.display_name.as_ref().map_or(false, taken)
    }

    /// Insert a variable. Returns false, leaving the table unchanged, when
    /// one of its names is already taken.
    pub fn insert(&mut self, variable: Variable) -> bool {
        if self.conflicts(&variable) {
            return false;
        }
        if let Some(display) = &variable.display_name {
            self.display.insert(display.clone(), variable.name.clone());
        }
        self.table.insert(variable.name.clone(), variable);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let variable = self.table.shift_remove(name)?;
        if let Some(display) = &variable.display_name {
            self.display.remove(display);
        }
        Some(variable)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.table.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_display_name() {
        let mut table = VariableTable::new();
        assert!(table.insert(Variable::new("cr_orders", DType::empty_table()).with_display_name("Orders")));
        assert_eq!(table.resolve("Orders").map(|v| v.name.as_str()), Some("cr_orders"));
        assert_eq!(table.resolve("cr_orders").map(|v| v.name.as_str()), Some("cr_orders"));
        assert!(table.get("Orders").is_none());
    }

    #[test]
    fn test_conflicting_names_are_rejected() {
        let mut table = VariableTable::new();
        assert!(table.insert(Variable::new("a", DType::Number).with_display_name("A")));
        assert!(!table.insert(Variable::new("a", DType::String)));
        assert!(!table.insert(Variable::new("A", DType::String)));
        assert!(!table.insert(Variable::new("b", DType::String).with_display_name("a")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_frees_both_names() {
        let mut table = VariableTable::new();
        table.insert(Variable::new("a", DType::Number).with_display_name("A"));
        assert!(table.remove("a").is_some());
        assert!(!table.contains("A"));
        assert!(table.insert(Variable::new("b", DType::Number).with_display_name("A")));
    }

    #[test]
    fn test_constants_are_never_mutable() {
        assert!(Variable::new("x", DType::empty_record()).mutable().mutable);
        assert!(!Variable::constant("x", DType::empty_record()).mutable().mutable);
    }
}
