//! fxl_types: The structural type system.
//!
//! [`DType`] describes the shape of every value the formula language
//! handles. Types have a compact textual grammar (`n`, `![a:n, b:s]`,
//! `%s[Asc:"asc"]`) that `Display` writes and [`DType::parse`] reads back.
//! The crate also holds the built-in enums, per-configuration enum stores
//! and logical/display name maps used by records.

pub mod builtin_enums;
pub mod display_names;
pub mod dtype;
pub mod enum_store;
pub mod parse;

pub use builtin_enums::{builtin_enum, builtin_enums, ErrorKind};
pub use display_names::DisplayNameMap;
pub use dtype::{Coercion, DType, EnumKind, EnumType, EnumValue, RecordType};
pub use enum_store::EnumStore;
pub use parse::TypeParseError;
