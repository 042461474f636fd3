//! Per-configuration enum sets.
//!
//! An [`EnumStore`] maps enum names to their types and keeps a reverse
//! index from type to name, built lazily on first lookup. Building the
//! index runs under a [`Guard`]; a host that shares the store across
//! threads calls [`EnumStore::prepare`] while configuring.

use crate::builtin_enums::builtin_enums;
use crate::dtype::DType;
use fxl_core::{CoreResult, Guard, Name};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct EnumStore {
    enums: IndexMap<Name, DType>,
    /// Display form of the type -> enum name.
    reverse: OnceLock<FxHashMap<String, Name>>,
    guard: Guard,
}

impl Default for EnumStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EnumStore {
    fn clone(&self) -> Self {
        Self::from_enums(self.enums.clone())
    }
}

impl EnumStore {
    pub fn new() -> Self {
        Self::from_enums(IndexMap::new())
    }

    /// A store holding every built-in enum.
    pub fn with_builtins() -> Self {
        Self::from_enums(
            builtin_enums()
                .map(|(name, ty)| (name.clone(), ty.clone()))
                .collect(),
        )
    }

    fn from_enums(enums: IndexMap<Name, DType>) -> Self {
        Self {
            enums,
            reverse: OnceLock::new(),
            guard: Guard::new("enum reverse index"),
        }
    }

    /// Register an enum. Returns false when the name is taken or the type
    /// is not an enum.
    pub fn add(&mut self, name: Name, ty: DType) -> bool {
        if ty.as_enum().is_none() || self.enums.contains_key(&name) {
            return false;
        }
        self.enums.insert(name, ty);
        self.reverse = OnceLock::new();
        true
    }

    pub fn get(&self, name: &str) -> Option<&DType> {
        self.enums.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &DType)> {
        self.enums.iter()
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }

    /// Build the reverse index now.
    pub fn prepare(&self) -> CoreResult<()> {
        self.reverse_index().map(|_| ())
    }

    /// The name an enum type was registered under.
    pub fn name_of(&self, ty: &DType) -> CoreResult<Option<&Name>> {
        if ty.as_enum().is_none() {
            return Ok(None);
        }
        Ok(self.reverse_index()?.get(&ty.to_string()))
    }

    fn reverse_index(&self) -> CoreResult<&FxHashMap<String, Name>> {
        if let Some(index) = self.reverse.get() {
            return Ok(index);
        }
        let _scope = self.guard.enter()?;
        let index = self.reverse.get_or_init(|| {
            let mut index = FxHashMap::default();
            for (name, ty) in &self.enums {
                // First registration wins for structurally identical enums.
                index.entry(ty.to_string()).or_insert_with(|| name.clone());
            }
            tracing::trace!(count = index.len(), "built enum reverse index");
            index
        });
        Ok(index)
    }
}
