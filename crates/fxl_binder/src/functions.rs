//! Function signatures and the built-in function library.
//!
//! A [`FunctionSignature`] describes arity, the kind of value each argument
//! slot takes (including trailing variadic groups), how the return type is
//! derived from the argument types, and whether the function iterates a
//! table with its later arguments evaluated per row.

use fxl_core::{Name, Path};
use fxl_types::{builtin_enum, Coercion, DType, RecordType};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// What a per-row argument must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaKind {
    Boolean,
    Numeric,
    Scalar,
    Any,
}

/// The kind of value an argument slot accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Exact(DType),
    Numeric,
    Boolean,
    Text,
    Scalar,
    DateLike,
    AnyTable,
    AnyRecord,
    Any,
    /// Evaluated once per row of the function's table argument.
    Lambda(LambdaKind),
}

impl ParamKind {
    /// The coercion that lets a value of type `ty` fill this slot, or
    /// `None` when it cannot.
    pub fn admits(&self, ty: &DType) -> Option<Coercion> {
        if matches!(ty, DType::Error | DType::Unknown) {
            return Some(Coercion::None);
        }
        match self {
            ParamKind::Exact(target) => ty.coerces_to(target),
            ParamKind::Numeric | ParamKind::Lambda(LambdaKind::Numeric) => {
                if ty.is_numeric() || *ty == DType::Blank {
                    Some(Coercion::None)
                } else {
                    ty.coerces_to(&DType::Number)
                }
            }
            ParamKind::Boolean | ParamKind::Lambda(LambdaKind::Boolean) => {
                ty.coerces_to(&DType::Boolean)
            }
            ParamKind::Text => ty.coerces_to(&DType::String),
            ParamKind::Scalar | ParamKind::Lambda(LambdaKind::Scalar) => {
                (ty.is_scalar() || *ty == DType::Blank).then_some(Coercion::None)
            }
            ParamKind::DateLike => match ty {
                DType::Date | DType::DateTime | DType::Time | DType::Blank => Some(Coercion::None),
                _ => None,
            },
            ParamKind::AnyTable => matches!(ty, DType::Table(_)).then_some(Coercion::None),
            ParamKind::AnyRecord => matches!(ty, DType::Record(_)).then_some(Coercion::None),
            ParamKind::Any | ParamKind::Lambda(LambdaKind::Any) => Some(Coercion::None),
        }
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, ParamKind::Lambda(_))
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            ParamKind::Exact(ty) => ty.kind_name().to_string(),
            ParamKind::Numeric | ParamKind::Lambda(LambdaKind::Numeric) => "Number".into(),
            ParamKind::Boolean | ParamKind::Lambda(LambdaKind::Boolean) => "Boolean".into(),
            ParamKind::Text => "Text".into(),
            ParamKind::Scalar | ParamKind::Lambda(LambdaKind::Scalar) => "scalar".into(),
            ParamKind::DateLike => "Date".into(),
            ParamKind::AnyTable => "Table".into(),
            ParamKind::AnyRecord => "Record".into(),
            ParamKind::Any | ParamKind::Lambda(LambdaKind::Any) => "any".into(),
        }
    }
}

/// How a call's type is derived from its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnRule {
    Fixed(DType),
    /// The record type of the rows of table argument `i`.
    RowOf(usize),
    SameAs(usize),
    /// Decimal when every numeric argument is Decimal, else Number.
    WidestNumeric,
    /// Union of the value arguments of a condition/value list.
    UnionOfBranches,
    /// Union of every argument.
    FirstNonBlank,
    /// Table whose rows are the record arguments.
    TableOfRecords,
    /// Table of the per-row results of argument `i`.
    TableOfLambda(usize),
    /// Type of the optional projection argument, else the row type of
    /// table argument `i`.
    ProjectionOrRowOf(usize),
}

/// Arguments from `start` on repeat in groups of `len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariadicGroup {
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: Name,
    pub namespace: Path,
    pub min_arity: usize,
    /// `None` for unbounded.
    pub max_arity: Option<usize>,
    pub params: Vec<ParamKind>,
    pub variadic: Option<VariadicGroup>,
    /// Kind of a final argument that leaves the variadic group incomplete,
    /// such as the default result of `If`.
    pub trailing: Option<ParamKind>,
    pub returns: ReturnRule,
    /// Table argument whose rows the lambda arguments iterate.
    pub scope_arg: Option<usize>,
    /// Selects rows of its table argument without transforming them.
    pub row_selector: bool,
    pub user_defined: bool,
}

impl FunctionSignature {
    pub fn new(name: &str, min_arity: usize, max_arity: Option<usize>) -> Self {
        Self {
            name: Name::new(name),
            namespace: Path::root(),
            min_arity,
            max_arity,
            params: Vec::new(),
            variadic: None,
            trailing: None,
            returns: ReturnRule::Fixed(DType::Void),
            scope_arg: None,
            row_selector: false,
            user_defined: false,
        }
    }

    /// A user-defined function taking exactly `params`.
    pub fn user_defined(name: Name, params: Vec<DType>, returns: DType) -> Self {
        let arity = params.len();
        Self {
            name,
            min_arity: arity,
            max_arity: Some(arity),
            params: params.into_iter().map(ParamKind::Exact).collect(),
            returns: ReturnRule::Fixed(returns),
            user_defined: true,
            ..Self::new("", arity, Some(arity))
        }
    }

    pub fn in_namespace(mut self, namespace: Path) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ParamKind>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    pub fn variadic(mut self, start: usize, len: usize) -> Self {
        self.variadic = Some(VariadicGroup { start, len });
        self
    }

    pub fn trailing(mut self, kind: ParamKind) -> Self {
        self.trailing = Some(kind);
        self
    }

    pub fn returns(mut self, rule: ReturnRule) -> Self {
        self.returns = rule;
        self
    }

    pub fn scoped(mut self, table_arg: usize) -> Self {
        self.scope_arg = Some(table_arg);
        self
    }

    pub fn row_selector(mut self) -> Self {
        self.row_selector = true;
        self
    }

    /// Full path: namespace plus name.
    pub fn path(&self) -> Path {
        self.namespace.append(self.name.clone())
    }

    pub fn admits_arity(&self, count: usize) -> bool {
        count >= self.min_arity && self.max_arity.map_or(true, |max| count <= max)
    }

    /// `"2"`, `"1-3"` or `"2+"`, for arity diagnostics.
    pub fn arity_text(&self) -> String {
        match self.max_arity {
            Some(max) if max == self.min_arity => max.to_string(),
            Some(max) => format!("{}-{}", self.min_arity, max),
            None => format!("{}+", self.min_arity),
        }
    }

    /// The kind of argument `index` in a call with `count` arguments.
    pub fn slot_kind(&self, index: usize, count: usize) -> Option<&ParamKind> {
        match self.variadic {
            Some(group) if index >= group.start && group.len > 0 => {
                let in_group = count.saturating_sub(group.start);
                if let Some(trailing) = &self.trailing {
                    if index + 1 == count && in_group % group.len != 0 {
                        return Some(trailing);
                    }
                }
                self.params.get(group.start + (index - group.start) % group.len)
            }
            _ => self.params.get(index),
        }
    }

    /// Whether argument `index` is evaluated per row.
    pub fn is_lambda_slot(&self, index: usize, count: usize) -> bool {
        self.slot_kind(index, count).map_or(false, ParamKind::is_lambda)
    }

    /// Indices of the value arguments of a condition/value list.
    fn branch_indices(&self, count: usize) -> impl Iterator<Item = usize> + '_ {
        (0..count).filter(move |&i| {
            self.slot_kind(i, count)
                .map_or(false, |kind| !matches!(kind, ParamKind::Boolean))
        })
    }

    /// The call's type for the given argument types. Aggregates that cannot
    /// be combined give `DType::Error`.
    pub fn return_type(&self, args: &[DType]) -> DType {
        match &self.returns {
            ReturnRule::Fixed(ty) => ty.clone(),
            ReturnRule::RowOf(i) => args
                .get(*i)
                .and_then(DType::to_record)
                .unwrap_or(DType::Error),
            ReturnRule::SameAs(i) => args.get(*i).cloned().unwrap_or(DType::Error),
            ReturnRule::WidestNumeric => {
                let mut all_decimal = true;
                for (i, ty) in args.iter().enumerate() {
                    let numeric_slot = matches!(
                        self.slot_kind(i, args.len()),
                        Some(ParamKind::Numeric | ParamKind::Lambda(LambdaKind::Numeric))
                    );
                    if numeric_slot && !matches!(ty, DType::Decimal | DType::Blank) {
                        all_decimal = false;
                    }
                }
                if all_decimal && !args.is_empty() {
                    DType::Decimal
                } else {
                    DType::Number
                }
            }
            ReturnRule::UnionOfBranches => self
                .branch_indices(args.len())
                .map(|i| &args[i])
                .fold(DType::Blank, |acc, ty| acc.union(ty)),
            ReturnRule::FirstNonBlank => args.iter().fold(DType::Blank, |acc, ty| acc.union(ty)),
            ReturnRule::TableOfRecords => {
                let mut row: Option<DType> = None;
                for ty in args {
                    row = Some(match row {
                        None => ty.clone(),
                        Some(acc) => acc.union(ty),
                    });
                }
                match row {
                    None => DType::empty_table(),
                    Some(DType::Record(r)) => DType::Table(r),
                    Some(_) => DType::Error,
                }
            }
            ReturnRule::TableOfLambda(i) => match args.get(*i) {
                Some(DType::Record(r)) => DType::Table(r.clone()),
                Some(DType::Error | DType::Unknown) | None => DType::Error,
                Some(DType::Void) => DType::Void,
                Some(scalar) => DType::Table(RecordType::from_fields([(
                    Name::new("Value"),
                    scalar.clone(),
                )])),
            },
            ReturnRule::ProjectionOrRowOf(i) => {
                if args.len() > i + 2 {
                    args[args.len() - 1].clone()
                } else {
                    args.get(*i)
                        .and_then(DType::to_record)
                        .unwrap_or(DType::Error)
                }
            }
        }
    }

    /// For functions building a table from record arguments, the first
    /// argument whose row cannot be combined with the rows before it,
    /// together with the row combined so far.
    pub fn conflicting_row(&self, args: &[DType]) -> Option<(usize, DType)> {
        if self.returns != ReturnRule::TableOfRecords {
            return None;
        }
        let mut acc = DType::Blank;
        for (i, ty) in args.iter().enumerate() {
            if ty.is_error() {
                return None;
            }
            let merged = acc.union(ty);
            if merged == DType::Error {
                return Some((i, acc));
            }
            acc = merged;
        }
        None
    }

    /// Argument positions whose types are unioned into the result.
    pub fn unioned_args(&self, count: usize) -> Vec<usize> {
        match self.returns {
            ReturnRule::UnionOfBranches => self.branch_indices(count).collect(),
            ReturnRule::FirstNonBlank => (0..count).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

// ============================================================================
// Built-in library
// ============================================================================

/// Overloads by name.
#[derive(Debug, Default)]
pub struct FunctionLibrary {
    functions: FxHashMap<Name, Vec<Arc<FunctionSignature>>>,
}

impl FunctionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, signature: FunctionSignature) {
        self.functions
            .entry(signature.name.clone())
            .or_default()
            .push(Arc::new(signature));
    }

    pub fn lookup(&self, name: &str) -> &[Arc<FunctionSignature>] {
        self.functions.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.functions.keys()
    }
}

fn enum_param(name: &str) -> ParamKind {
    builtin_enum(name).cloned().map_or(ParamKind::Any, ParamKind::Exact)
}

fn build_library() -> FunctionLibrary {
    use LambdaKind as L;
    use ParamKind as P;
    use ReturnRule as R;

    let mut lib = FunctionLibrary::new();
    let sig = FunctionSignature::new;

    // Logical
    lib.add(
        sig("If", 2, None)
            .params([P::Boolean, P::Any])
            .variadic(0, 2)
            .trailing(P::Any)
            .returns(R::UnionOfBranches),
    );
    lib.add(sig("IsBlank", 1, Some(1)).params([P::Any]).returns(R::Fixed(DType::Boolean)));
    lib.add(sig("Blank", 0, Some(0)).returns(R::Fixed(DType::Blank)));
    lib.add(sig("IsError", 1, Some(1)).params([P::Any]).returns(R::Fixed(DType::Boolean)));
    lib.add(sig("Not", 1, Some(1)).params([P::Boolean]).returns(R::Fixed(DType::Boolean)));
    for name in ["And", "Or"] {
        lib.add(
            sig(name, 1, None)
                .params([P::Boolean])
                .variadic(0, 1)
                .returns(R::Fixed(DType::Boolean)),
        );
    }
    lib.add(
        sig("Coalesce", 1, None)
            .params([P::Any])
            .variadic(0, 1)
            .returns(R::FirstNonBlank),
    );

    // Math
    lib.add(sig("Abs", 1, Some(1)).params([P::Numeric]).returns(R::WidestNumeric));
    lib.add(
        sig("Round", 2, Some(2))
            .params([P::Numeric, P::Numeric])
            .returns(R::WidestNumeric),
    );
    for name in ["Sum", "Average", "Max", "Min"] {
        lib.add(
            sig(name, 2, Some(2))
                .params([P::AnyTable, P::Lambda(L::Numeric)])
                .returns(R::WidestNumeric)
                .scoped(0),
        );
        lib.add(
            sig(name, 1, None)
                .params([P::Numeric])
                .variadic(0, 1)
                .returns(R::WidestNumeric),
        );
    }

    // Tables
    lib.add(sig("CountRows", 1, Some(1)).params([P::AnyTable]).returns(R::Fixed(DType::Number)));
    lib.add(
        sig("CountIf", 2, None)
            .params([P::AnyTable, P::Lambda(L::Boolean)])
            .variadic(1, 1)
            .returns(R::Fixed(DType::Number))
            .scoped(0),
    );
    lib.add(
        sig("Filter", 2, None)
            .params([P::AnyTable, P::Lambda(L::Boolean)])
            .variadic(1, 1)
            .returns(R::SameAs(0))
            .scoped(0),
    );
    lib.add(
        sig("LookUp", 2, Some(3))
            .params([P::AnyTable, P::Lambda(L::Boolean), P::Lambda(L::Any)])
            .returns(R::ProjectionOrRowOf(0))
            .scoped(0),
    );
    lib.add(
        sig("ForAll", 2, Some(2))
            .params([P::AnyTable, P::Lambda(L::Any)])
            .returns(R::TableOfLambda(1))
            .scoped(0),
    );
    lib.add(
        sig("Sort", 2, Some(3))
            .params([P::AnyTable, P::Lambda(L::Scalar), enum_param("SortOrder")])
            .returns(R::SameAs(0))
            .scoped(0),
    );
    for name in ["First", "Last"] {
        lib.add(
            sig(name, 1, Some(1))
                .params([P::AnyTable])
                .returns(R::RowOf(0))
                .row_selector(),
        );
    }
    for name in ["FirstN", "LastN"] {
        lib.add(
            sig(name, 1, Some(2))
                .params([P::AnyTable, P::Numeric])
                .returns(R::SameAs(0))
                .row_selector(),
        );
    }
    lib.add(
        sig("Index", 2, Some(2))
            .params([P::AnyTable, P::Numeric])
            .returns(R::RowOf(0))
            .row_selector(),
    );
    lib.add(
        sig("Table", 0, None)
            .params([P::AnyRecord])
            .variadic(0, 1)
            .returns(R::TableOfRecords),
    );

    // Text
    lib.add(
        sig("Concatenate", 1, None)
            .params([P::Text])
            .variadic(0, 1)
            .returns(R::Fixed(DType::String)),
    );
    lib.add(sig("Len", 1, Some(1)).params([P::Text]).returns(R::Fixed(DType::Number)));
    for name in ["Upper", "Lower"] {
        lib.add(sig(name, 1, Some(1)).params([P::Text]).returns(R::Fixed(DType::String)));
    }
    for name in ["Left", "Right"] {
        lib.add(
            sig(name, 2, Some(2))
                .params([P::Text, P::Numeric])
                .returns(R::Fixed(DType::String)),
        );
    }
    lib.add(
        sig("Mid", 2, Some(3))
            .params([P::Text, P::Numeric, P::Numeric])
            .returns(R::Fixed(DType::String)),
    );
    lib.add(
        sig("Text", 1, Some(2))
            .params([P::Scalar, P::Text])
            .returns(R::Fixed(DType::String)),
    );
    lib.add(sig("Value", 1, Some(1)).params([P::Text]).returns(R::Fixed(DType::Number)));

    // Dates
    lib.add(
        sig("DateAdd", 2, Some(3))
            .params([P::DateLike, P::Numeric, enum_param("TimeUnit")])
            .returns(R::SameAs(0)),
    );
    lib.add(sig("Now", 0, Some(0)).returns(R::Fixed(DType::DateTime)));
    lib.add(sig("Today", 0, Some(0)).returns(R::Fixed(DType::Date)));

    lib
}

lazy_static! {
    static ref BUILTIN_FUNCTIONS: FunctionLibrary = build_library();
}

/// The process-wide built-in library.
pub fn builtin_functions() -> &'static FunctionLibrary {
    &BUILTIN_FUNCTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(name: &str) -> &'static FunctionSignature {
        &builtin_functions().lookup(name)[0]
    }

    #[test]
    fn test_if_slots() {
        let sig = first("If");
        assert_eq!(sig.slot_kind(0, 3), Some(&ParamKind::Boolean));
        assert_eq!(sig.slot_kind(1, 3), Some(&ParamKind::Any));
        assert_eq!(sig.slot_kind(2, 3), Some(&ParamKind::Any));
        assert_eq!(sig.slot_kind(2, 4), Some(&ParamKind::Boolean));
        assert_eq!(sig.slot_kind(4, 5), Some(&ParamKind::Any));
        assert_eq!(sig.unioned_args(5), vec![1, 3, 4]);
    }

    #[test]
    fn test_variadic_lambda_slots() {
        let sig = first("CountIf");
        assert!(!sig.is_lambda_slot(0, 3));
        assert!(sig.is_lambda_slot(1, 3));
        assert!(sig.is_lambda_slot(2, 3));
        assert_eq!(sig.arity_text(), "2+");
        assert_eq!(first("Mid").arity_text(), "2-3");
        assert_eq!(first("Now").arity_text(), "0");
    }

    #[test]
    fn test_return_rules() {
        let row = DType::record([(Name::new("a"), DType::Number)]);
        let table = row.to_table().unwrap();
        assert_eq!(first("First").return_type(&[table.clone()]), row);
        assert_eq!(first("Filter").return_type(&[table.clone(), DType::Boolean]), table);
        assert_eq!(
            first("If").return_type(&[DType::Boolean, DType::Decimal, DType::Number]),
            DType::Number
        );
        assert_eq!(
            first("Abs").return_type(&[DType::Decimal]),
            DType::Decimal
        );
        assert_eq!(
            first("ForAll").return_type(&[table.clone(), DType::String]).to_string(),
            "*[Value:s]"
        );
        assert_eq!(first("LookUp").return_type(&[table.clone(), DType::Boolean]), row);
        assert_eq!(
            first("LookUp").return_type(&[table, DType::Boolean, DType::String]),
            DType::String
        );
    }

    #[test]
    fn test_admits() {
        assert_eq!(ParamKind::Numeric.admits(&DType::Decimal), Some(Coercion::None));
        assert_eq!(ParamKind::Numeric.admits(&DType::String), Some(Coercion::TextToNumber));
        assert_eq!(ParamKind::Boolean.admits(&DType::Decimal), Some(Coercion::DecimalToBoolean));
        assert_eq!(ParamKind::Text.admits(&DType::Decimal), Some(Coercion::DecimalToText));
        assert_eq!(ParamKind::AnyTable.admits(&DType::Number), None);
        assert_eq!(ParamKind::Text.admits(&DType::empty_record()), None);
        assert_eq!(ParamKind::AnyTable.admits(&DType::Error), Some(Coercion::None));
    }

    #[test]
    fn test_library_has_overloads() {
        let sums = builtin_functions().lookup("Sum");
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[0].scope_arg, Some(0));
        assert_eq!(sums[1].scope_arg, None);
        assert!(builtin_functions().lookup("Nope").is_empty());
        assert!(first("First").row_selector);
    }
}
