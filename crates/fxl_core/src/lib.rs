//! fxl_core: Core utilities for the fxl formula engine.
//!
//! Provides the name model (`Name`, `Path`), source spans, the free-list
//! slot arena, the reentrancy guard, version tokens and the fatal error
//! type shared by every stage of the pipeline.

pub mod arena;
pub mod error;
pub mod guard;
pub mod name;
pub mod path;
pub mod text;
pub mod version;

// Re-export commonly used types
pub use arena::{ArenaKey, SlotArena};
pub use error::{CoreError, CoreResult};
pub use guard::{Guard, GuardScope};
pub use name::Name;
pub use path::Path;
pub use text::{LineMap, Span, TextPos};
pub use version::VersionToken;
