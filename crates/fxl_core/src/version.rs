//! Dirty-tracking version tokens.
//!
//! A mutable aggregate (a scope table) owns a [`VersionToken`] and bumps it
//! on every mutation. Snapshots taken before a mutation compare unequal to
//! the current token afterwards. Tokens of several aggregates can be
//! combined into one derived token that changes whenever any input does.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(u64);

impl VersionToken {
    /// A token distinct from every token handed out before it.
    pub fn fresh() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }

    /// Invalidate every snapshot of this token.
    pub fn bump(&mut self) {
        *self = Self::fresh();
    }

    /// Derive a token whose identity depends on both inputs, in order.
    pub fn combine(self, other: VersionToken) -> VersionToken {
        let mut hasher = FxHasher::default();
        self.0.hash(&mut hasher);
        other.0.hash(&mut hasher);
        VersionToken(hasher.finish())
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl Default for VersionToken {
    fn default() -> Self {
        Self::fresh()
    }
}
