//! Built-in enumerations.
//!
//! The registry is built once per process and never mutated afterwards.
//! `ErrorKind` mirrors the host's error taxonomy one to one.

use crate::dtype::{DType, EnumKind, EnumType, EnumValue};
use fxl_core::Name;
use indexmap::IndexMap;
use lazy_static::lazy_static;

/// Error categories a host can attach to error values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorKind {
    None = 0,
    Sync = 1,
    MissingRequired = 2,
    CreatePermission = 3,
    EditPermission = 4,
    DeletePermission = 5,
    Conflict = 6,
    NotFound = 7,
    ConstraintViolation = 8,
    GeneratedValue = 9,
    ReadOnlyValue = 10,
    Validation = 11,
    Unknown = 12,
    Div0 = 13,
    BadLanguageCode = 14,
    BadRegex = 15,
    InvalidFunctionUsage = 16,
    FileNotFound = 17,
    AnalysisError = 18,
    ReadPermission = 19,
    NotSupported = 20,
    InsufficientMemory = 21,
    QuotaExceeded = 22,
    Network = 23,
    Numeric = 24,
    InvalidArgument = 25,
    Internal = 26,
    NotApplicable = 27,
    Timeout = 28,
    ServiceUnavailable = 29,
    Custom = 1000,
}

impl ErrorKind {
    pub const ALL: &'static [ErrorKind] = &[
        ErrorKind::None,
        ErrorKind::Sync,
        ErrorKind::MissingRequired,
        ErrorKind::CreatePermission,
        ErrorKind::EditPermission,
        ErrorKind::DeletePermission,
        ErrorKind::Conflict,
        ErrorKind::NotFound,
        ErrorKind::ConstraintViolation,
        ErrorKind::GeneratedValue,
        ErrorKind::ReadOnlyValue,
        ErrorKind::Validation,
        ErrorKind::Unknown,
        ErrorKind::Div0,
        ErrorKind::BadLanguageCode,
        ErrorKind::BadRegex,
        ErrorKind::InvalidFunctionUsage,
        ErrorKind::FileNotFound,
        ErrorKind::AnalysisError,
        ErrorKind::ReadPermission,
        ErrorKind::NotSupported,
        ErrorKind::InsufficientMemory,
        ErrorKind::QuotaExceeded,
        ErrorKind::Network,
        ErrorKind::Numeric,
        ErrorKind::InvalidArgument,
        ErrorKind::Internal,
        ErrorKind::NotApplicable,
        ErrorKind::Timeout,
        ErrorKind::ServiceUnavailable,
        ErrorKind::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::None => "None",
            ErrorKind::Sync => "Sync",
            ErrorKind::MissingRequired => "MissingRequired",
            ErrorKind::CreatePermission => "CreatePermission",
            ErrorKind::EditPermission => "EditPermission",
            ErrorKind::DeletePermission => "DeletePermission",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
            ErrorKind::GeneratedValue => "GeneratedValue",
            ErrorKind::ReadOnlyValue => "ReadOnlyValue",
            ErrorKind::Validation => "Validation",
            ErrorKind::Unknown => "Unknown",
            ErrorKind::Div0 => "Div0",
            ErrorKind::BadLanguageCode => "BadLanguageCode",
            ErrorKind::BadRegex => "BadRegex",
            ErrorKind::InvalidFunctionUsage => "InvalidFunctionUsage",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::AnalysisError => "AnalysisError",
            ErrorKind::ReadPermission => "ReadPermission",
            ErrorKind::NotSupported => "NotSupported",
            ErrorKind::InsufficientMemory => "InsufficientMemory",
            ErrorKind::QuotaExceeded => "QuotaExceeded",
            ErrorKind::Network => "Network",
            ErrorKind::Numeric => "Numeric",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::Internal => "Internal",
            ErrorKind::NotApplicable => "NotApplicable",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ServiceUnavailable => "ServiceUnavailable",
            ErrorKind::Custom => "Custom",
        }
    }

    #[inline]
    pub fn value(self) -> u16 {
        self as u16
    }
}

// ============================================================================
// Registry
// ============================================================================

const COLORS: &[(&str, u32)] = &[
    ("Black", 0x000000ff),
    ("White", 0xffffffff),
    ("Red", 0xff0000ff),
    ("Green", 0x008000ff),
    ("Blue", 0x0000ffff),
    ("Yellow", 0xffff00ff),
    ("Orange", 0xffa500ff),
    ("Purple", 0x800080ff),
    ("Gray", 0x808080ff),
    ("Silver", 0xc0c0c0ff),
    ("Navy", 0x000080ff),
    ("Transparent", 0x00000000),
];

const SORT_ORDER: &[(&str, &str)] = &[("Ascending", "ascending"), ("Descending", "descending")];

const START_OF_WEEK: &[(&str, f64)] = &[
    ("Sunday", 1.0),
    ("Monday", 2.0),
    ("MondayZero", 3.0),
    ("Tuesday", 12.0),
    ("Wednesday", 13.0),
    ("Thursday", 14.0),
    ("Friday", 15.0),
    ("Saturday", 16.0),
];

const TIME_UNIT: &[(&str, &str)] = &[
    ("Years", "years"),
    ("Quarters", "quarters"),
    ("Months", "months"),
    ("Days", "days"),
    ("Hours", "hours"),
    ("Minutes", "minutes"),
    ("Seconds", "seconds"),
    ("Milliseconds", "milliseconds"),
];

fn build<V>(kind: EnumKind, options: &[(&str, V)], value: impl Fn(&V) -> EnumValue) -> EnumType {
    // Each table above has unique, valid names of a single kind.
    let options: IndexMap<Name, EnumValue> = options
        .iter()
        .map(|(name, v)| (Name::new(name), value(v)))
        .collect();
    EnumType::from_validated(kind, options)
}

lazy_static! {
    static ref BUILTIN_ENUMS: IndexMap<Name, DType> = {
        let mut enums = IndexMap::new();
        let error_kinds: Vec<(&str, u16)> =
            ErrorKind::ALL.iter().map(|k| (k.name(), k.value())).collect();
        enums.insert(
            Name::new("ErrorKind"),
            DType::Enum(build(EnumKind::Number, &error_kinds, |v| EnumValue::Number(f64::from(*v)))),
        );
        enums.insert(
            Name::new("Color"),
            DType::Enum(build(EnumKind::Color, COLORS, |v| EnumValue::Color(*v))),
        );
        enums.insert(
            Name::new("SortOrder"),
            DType::Enum(build(EnumKind::String, SORT_ORDER, |v| EnumValue::String(v.to_string()))),
        );
        enums.insert(
            Name::new("StartOfWeek"),
            DType::Enum(build(EnumKind::Number, START_OF_WEEK, |v| EnumValue::Number(*v))),
        );
        enums.insert(
            Name::new("TimeUnit"),
            DType::Enum(build(EnumKind::String, TIME_UNIT, |v| EnumValue::String(v.to_string()))),
        );
        enums
    };
}

/// Every built-in enum, in registration order.
pub fn builtin_enums() -> impl Iterator<Item = (&'static Name, &'static DType)> {
    BUILTIN_ENUMS.iter()
}

pub fn builtin_enum(name: &str) -> Option<&'static DType> {
    BUILTIN_ENUMS.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_round_trip() {
        for (name, ty) in builtin_enums() {
            let text = ty.to_string();
            let parsed = DType::parse(&text).unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(&parsed, ty, "{} did not round-trip", name);
        }
    }

    #[test]
    fn test_error_kind_matches_taxonomy() {
        let e = builtin_enum("ErrorKind").and_then(DType::as_enum).unwrap();
        let names: Vec<&str> = e.options().map(|(n, _)| n.as_str()).collect();
        let expected: Vec<&str> = ErrorKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, expected);
        for kind in ErrorKind::ALL {
            assert_eq!(
                e.option(kind.name()),
                Some(&EnumValue::Number(f64::from(kind.value())))
            );
        }
    }

    #[test]
    fn test_lookup() {
        assert!(builtin_enum("SortOrder").is_some());
        assert!(builtin_enum("Nope").is_none());
        assert_eq!(
            builtin_enum("Color").unwrap().to_string().get(..3),
            Some("%c[")
        );
    }
}
