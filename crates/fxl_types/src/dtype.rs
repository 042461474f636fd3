//! Structural type descriptors.
//!
//! A [`DType`] is one recursive value: primitives carry no payload, records
//! and tables share an ordered field map, enums carry their option set and
//! backing kind. Aggregates are reference counted, so cloning a type is cheap.

use crate::display_names::DisplayNameMap;
use fxl_core::Name;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Backing primitive kind of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    Number,
    Color,
    String,
}

impl EnumKind {
    /// The grammar sigil following `%`.
    pub fn sigil(self) -> char {
        match self {
            EnumKind::Number => 'n',
            EnumKind::Color => 'c',
            EnumKind::String => 's',
        }
    }

    pub fn from_sigil(ch: char) -> Option<Self> {
        match ch {
            'n' => Some(EnumKind::Number),
            'c' => Some(EnumKind::Color),
            's' => Some(EnumKind::String),
            _ => None,
        }
    }

    /// The primitive type option values are represented as.
    pub fn backing_type(self) -> DType {
        match self {
            EnumKind::Number => DType::Number,
            EnumKind::Color => DType::Color,
            EnumKind::String => DType::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnumKind::Number => "number",
            EnumKind::Color => "color",
            EnumKind::String => "string",
        }
    }
}

/// The value of one enum option.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Number(f64),
    /// RGBA, red in the high byte.
    Color(u32),
    String(String),
}

impl EnumValue {
    pub fn kind(&self) -> EnumKind {
        match self {
            EnumValue::Number(_) => EnumKind::Number,
            EnumValue::Color(_) => EnumKind::Color,
            EnumValue::String(_) => EnumKind::String,
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Number(n) => write!(f, "{}", n),
            EnumValue::Color(rgba) => write!(f, "#{:08x}", rgba),
            EnumValue::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
        }
    }
}

/// An enumeration: ordered option names with scalar values of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    kind: EnumKind,
    options: Arc<IndexMap<Name, EnumValue>>,
}

impl EnumType {
    /// Build an enum. Options whose value kind does not match `kind`, or
    /// that repeat an earlier name, are rejected by returning `None`.
    pub fn new(kind: EnumKind, options: impl IntoIterator<Item = (Name, EnumValue)>) -> Option<Self> {
        let mut map = IndexMap::new();
        for (name, value) in options {
            if value.kind() != kind || !name.is_valid() || map.contains_key(&name) {
                return None;
            }
            map.insert(name, value);
        }
        Some(Self {
            kind,
            options: Arc::new(map),
        })
    }

    pub(crate) fn from_validated(kind: EnumKind, options: IndexMap<Name, EnumValue>) -> Self {
        Self {
            kind,
            options: Arc::new(options),
        }
    }

    pub fn kind(&self) -> EnumKind {
        self.kind
    }

    pub fn option(&self, name: &str) -> Option<&EnumValue> {
        self.options.get(name)
    }

    pub fn options(&self) -> impl Iterator<Item = (&Name, &EnumValue)> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Ordered fields of a record (or of a table's row).
///
/// The optional display-name map does not participate in equality.
#[derive(Debug, Clone, Default)]
pub struct RecordType {
    fields: Arc<IndexMap<Name, DType>>,
    display_names: Option<Arc<DisplayNameMap>>,
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields) || self.fields == other.fields
    }
}

impl RecordType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from fields; a repeated name keeps the last type given.
    pub fn from_fields(fields: impl IntoIterator<Item = (Name, DType)>) -> Self {
        Self {
            fields: Arc::new(fields.into_iter().collect()),
            display_names: None,
        }
    }

    /// A copy with one field added or replaced.
    pub fn with_field(&self, name: Name, ty: DType) -> Self {
        let mut fields = (*self.fields).clone();
        fields.insert(name, ty);
        Self {
            fields: Arc::new(fields),
            display_names: self.display_names.clone(),
        }
    }

    pub fn with_display_names(mut self, names: DisplayNameMap) -> Self {
        self.display_names = Some(Arc::new(names));
        self
    }

    pub fn display_names(&self) -> Option<&DisplayNameMap> {
        self.display_names.as_deref()
    }

    pub fn field(&self, name: &str) -> Option<&DType> {
        self.fields.get(name)
    }

    /// Look a field up by logical name, then by display name. Returns the
    /// logical name and the field type.
    pub fn resolve_field(&self, name: &str) -> Option<(Name, &DType)> {
        if let Some((logical, ty)) = self.fields.get_key_value(name) {
            return Some((logical.clone(), ty));
        }
        let logical = self.display_names.as_ref()?.logical_of(name)?;
        self.fields
            .get_key_value(logical.as_str())
            .map(|(logical, ty)| (logical.clone(), ty))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Name, &DType)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// A type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    /// Not yet known (a formula whose definition is deferred).
    Unknown,
    /// Error sentinel; accepts and is accepted by everything.
    Error,
    /// Type of `Blank()`.
    Blank,
    Void,
    Number,
    Decimal,
    Boolean,
    String,
    Hyperlink,
    Date,
    Time,
    DateTime,
    Color,
    Guid,
    /// Untyped object.
    Untyped,
    Record(RecordType),
    Table(RecordType),
    Enum(EnumType),
}

impl Default for DType {
    fn default() -> Self {
        DType::Unknown
    }
}

impl DType {
    pub fn record(fields: impl IntoIterator<Item = (Name, DType)>) -> Self {
        DType::Record(RecordType::from_fields(fields))
    }

    pub fn table(fields: impl IntoIterator<Item = (Name, DType)>) -> Self {
        DType::Table(RecordType::from_fields(fields))
    }

    pub fn empty_record() -> Self {
        DType::Record(RecordType::new())
    }

    pub fn empty_table() -> Self {
        DType::Table(RecordType::new())
    }

    /// One-letter tag for non-aggregate types.
    pub fn tag(&self) -> Option<char> {
        Some(match self {
            DType::Unknown => '?',
            DType::Error => 'e',
            DType::Blank => 'N',
            DType::Void => '-',
            DType::Number => 'n',
            DType::Decimal => 'w',
            DType::Boolean => 'b',
            DType::String => 's',
            DType::Hyperlink => 'h',
            DType::Date => 'D',
            DType::Time => 'T',
            DType::DateTime => 'd',
            DType::Color => 'c',
            DType::Guid => 'g',
            DType::Untyped => 'O',
            DType::Record(_) | DType::Table(_) | DType::Enum(_) => return None,
        })
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        Some(match tag {
            '?' => DType::Unknown,
            'e' => DType::Error,
            'N' => DType::Blank,
            '-' => DType::Void,
            'n' => DType::Number,
            'w' => DType::Decimal,
            'b' => DType::Boolean,
            's' => DType::String,
            'h' => DType::Hyperlink,
            'D' => DType::Date,
            'T' => DType::Time,
            'd' => DType::DateTime,
            'c' => DType::Color,
            'g' => DType::Guid,
            'O' => DType::Untyped,
            _ => return None,
        })
    }

    /// Map a type name written in a function signature.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "Number" => DType::Number,
            "Decimal" => DType::Decimal,
            "Boolean" => DType::Boolean,
            "Text" => DType::String,
            "Hyperlink" => DType::Hyperlink,
            "Date" => DType::Date,
            "Time" => DType::Time,
            "DateTime" => DType::DateTime,
            "Color" => DType::Color,
            "GUID" => DType::Guid,
            "Void" => DType::Void,
            "UntypedObject" => DType::Untyped,
            "Record" => DType::empty_record(),
            "Table" => DType::empty_table(),
            _ => return None,
        })
    }

    /// Name used in user-facing messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DType::Unknown => "Unknown",
            DType::Error => "Error",
            DType::Blank => "Blank",
            DType::Void => "Void",
            DType::Number => "Number",
            DType::Decimal => "Decimal",
            DType::Boolean => "Boolean",
            DType::String => "Text",
            DType::Hyperlink => "Hyperlink",
            DType::Date => "Date",
            DType::Time => "Time",
            DType::DateTime => "DateTime",
            DType::Color => "Color",
            DType::Guid => "GUID",
            DType::Untyped => "UntypedObject",
            DType::Record(_) => "Record",
            DType::Table(_) => "Table",
            DType::Enum(_) => "Enum",
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Error or Unknown: checks involving these never report.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, DType::Error | DType::Unknown)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Number | DType::Decimal)
    }

    #[inline]
    pub fn is_aggregate(&self) -> bool {
        matches!(self, DType::Record(_) | DType::Table(_))
    }

    #[inline]
    pub fn is_date_like(&self) -> bool {
        matches!(self, DType::Date | DType::Time | DType::DateTime)
    }

    #[inline]
    pub fn is_text_like(&self) -> bool {
        matches!(self, DType::String | DType::Hyperlink)
    }

    /// Single values: primitives and enums.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            DType::Record(_) | DType::Table(_) | DType::Void | DType::Untyped
        )
    }

    /// Types a user-defined function may take or return.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DType::Number
                | DType::Decimal
                | DType::Boolean
                | DType::String
                | DType::Hyperlink
                | DType::Date
                | DType::Time
                | DType::DateTime
                | DType::Color
                | DType::Guid
                | DType::Void
        )
    }

    /// Enums report their backing primitive; other types themselves.
    pub fn backing_kind(&self) -> DType {
        match self {
            DType::Enum(e) => e.kind().backing_type(),
            other => other.clone(),
        }
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            DType::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The row type of a table.
    pub fn row_type(&self) -> Option<&RecordType> {
        match self {
            DType::Table(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            DType::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Table whose rows have this record type.
    pub fn to_table(&self) -> Option<DType> {
        self.as_record().map(|r| DType::Table(r.clone()))
    }

    /// Record type of a table's rows.
    pub fn to_record(&self) -> Option<DType> {
        self.row_type().map(|r| DType::Record(r.clone()))
    }

    // ========================================================================
    // Compatibility
    // ========================================================================

    /// Whether a value of type `other` can be used where `self` is expected,
    /// without conversion.
    ///
    /// Records are width-subtyped: `self` accepts `other` when every field
    /// of `self` exists in `other` with an accepted type. Enums are nominal.
    pub fn accepts(&self, other: &DType) -> bool {
        match (self, other) {
            (DType::Error | DType::Unknown, _) | (_, DType::Error | DType::Unknown) => true,
            (_, DType::Blank) | (DType::Void, _) => true,
            (DType::Record(a), DType::Record(b)) | (DType::Table(a), DType::Table(b)) => {
                a.fields().all(|(name, ty)| b.field(name.as_str()).map_or(false, |other| ty.accepts(other)))
            }
            (DType::Enum(a), DType::Enum(b)) => a == b,
            (a, b) => a.tag().is_some() && a.tag() == b.tag(),
        }
    }

    /// The conversion that makes a value of this type usable as `target`.
    /// `Some(Coercion::None)` when `target` accepts it directly.
    pub fn coerces_to(&self, target: &DType) -> Option<Coercion> {
        if target.accepts(self) {
            return Some(Coercion::None);
        }
        use Coercion as C;
        let coercion = match (self, target) {
            (DType::Number, DType::Decimal) => C::NumberToDecimal,
            (DType::Decimal, DType::Number) => C::DecimalToNumber,
            (DType::Boolean, DType::Number) => C::BooleanToNumber,
            (DType::Boolean, DType::Decimal) => C::BooleanToDecimal,
            (DType::String, DType::Number) => C::TextToNumber,
            (DType::String, DType::Decimal) => C::TextToDecimal,
            (DType::String, DType::Boolean) => C::TextToBoolean,
            (DType::String, DType::Hyperlink) => C::TextToHyperlink,
            (DType::Number, DType::Boolean) => C::NumberToBoolean,
            (DType::Decimal, DType::Boolean) => C::DecimalToBoolean,
            (DType::Number, DType::String) => C::NumberToText,
            (DType::Decimal, DType::String) => C::DecimalToText,
            (DType::Boolean, DType::String) => C::BooleanToText,
            (DType::Date, DType::String) => C::DateToText,
            (DType::Time, DType::String) => C::TimeToText,
            (DType::DateTime, DType::String) => C::DateTimeToText,
            (DType::Guid, DType::String) => C::GuidToText,
            (DType::Hyperlink, DType::String) => C::HyperlinkToText,
            (DType::Color, DType::String) => C::ColorToText,
            (DType::Date, DType::DateTime) => C::DateToDateTime,
            (DType::DateTime, DType::Date) => C::DateTimeToDate,
            (DType::Enum(e), target) if e.kind().backing_type() == *target => C::EnumToBacking,
            (DType::Enum(_), DType::String) => C::EnumToText,
            _ => return None,
        };
        Some(coercion)
    }

    /// Either type accepts the other, or one converts to the other.
    pub fn is_compatible(&self, other: &DType) -> bool {
        self.accepts(other)
            || other.accepts(self)
            || self.coerces_to(other).is_some()
            || other.coerces_to(self).is_some()
    }

    /// Widen two types into one, as for the branches of a conditional.
    /// Incompatible inputs give `DType::Error`.
    pub fn union(&self, other: &DType) -> DType {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (DType::Unknown, _) | (_, DType::Unknown) => DType::Unknown,
            (DType::Blank | DType::Error, t) | (t, DType::Blank | DType::Error) => t.clone(),
            (DType::Void, _) | (_, DType::Void) => DType::Void,
            (a, b) if a.is_numeric() && b.is_numeric() => DType::Number,
            (DType::Record(a), DType::Record(b)) => {
                union_fields(a, b).map_or(DType::Error, DType::Record)
            }
            (DType::Table(a), DType::Table(b)) => {
                union_fields(a, b).map_or(DType::Error, DType::Table)
            }
            (DType::Enum(a), DType::Enum(b)) => {
                a.kind().backing_type().union(&b.kind().backing_type())
            }
            (DType::Enum(e), t) | (t, DType::Enum(e)) => e.kind().backing_type().union(t),
            (a, b) if a.is_text_like() && b.is_text_like() => DType::String,
            (DType::Date, DType::DateTime) | (DType::DateTime, DType::Date) => DType::DateTime,
            _ => DType::Error,
        }
    }
}

/// All fields of both records; shared fields are unioned and a conflicting
/// shared field fails the whole union.
fn union_fields(a: &RecordType, b: &RecordType) -> Option<RecordType> {
    let mut fields: IndexMap<Name, DType> = IndexMap::new();
    for (name, ty) in a.fields() {
        let merged = match b.field(name.as_str()) {
            Some(other) => {
                let merged = ty.union(other);
                if merged == DType::Error && !ty.is_error() && !other.is_error() {
                    return None;
                }
                merged
            }
            None => ty.clone(),
        };
        fields.insert(name.clone(), merged);
    }
    for (name, ty) in b.fields() {
        if !fields.contains_key(name) {
            fields.insert(name.clone(), ty.clone());
        }
    }
    Some(RecordType::from_fields(fields))
}

/// A conversion applied to a value so it fits its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    None,
    NumberToDecimal,
    DecimalToNumber,
    BooleanToNumber,
    BooleanToDecimal,
    TextToNumber,
    TextToDecimal,
    TextToBoolean,
    TextToHyperlink,
    NumberToBoolean,
    DecimalToBoolean,
    NumberToText,
    DecimalToText,
    BooleanToText,
    DateToText,
    TimeToText,
    DateTimeToText,
    GuidToText,
    HyperlinkToText,
    ColorToText,
    DateToDateTime,
    DateTimeToDate,
    EnumToBacking,
    EnumToText,
}

impl Coercion {
    /// Name of the conversion function the IR calls, if any.
    pub fn function_name(self) -> Option<&'static str> {
        Some(match self {
            Coercion::None => return None,
            Coercion::NumberToDecimal => "NumberToDecimal",
            Coercion::DecimalToNumber => "DecimalToNumber",
            Coercion::BooleanToNumber => "BooleanToNumber",
            Coercion::BooleanToDecimal => "BooleanToDecimal",
            Coercion::TextToNumber => "TextToNumber",
            Coercion::TextToDecimal => "TextToDecimal",
            Coercion::TextToBoolean => "TextToBoolean",
            Coercion::TextToHyperlink => "TextToHyperlink",
            Coercion::NumberToBoolean => "NumberToBoolean",
            Coercion::DecimalToBoolean => "DecimalToBoolean",
            Coercion::NumberToText => "NumberToText",
            Coercion::DecimalToText => "DecimalToText",
            Coercion::BooleanToText => "BooleanToText",
            Coercion::DateToText => "DateToText",
            Coercion::TimeToText => "TimeToText",
            Coercion::DateTimeToText => "DateTimeToText",
            Coercion::GuidToText => "GuidToText",
            Coercion::HyperlinkToText => "HyperlinkToText",
            Coercion::ColorToText => "ColorToText",
            Coercion::DateToDateTime => "DateToDateTime",
            Coercion::DateTimeToDate => "DateTimeToDate",
            Coercion::EnumToBacking => "EnumToBacking",
            Coercion::EnumToText => "EnumToText",
        })
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Coercion::None
    }

    /// The type a value of type `from` has after this conversion.
    pub fn target_type(self, from: &DType) -> DType {
        use Coercion as C;
        match self {
            C::None => from.clone(),
            C::NumberToDecimal | C::BooleanToDecimal | C::TextToDecimal => DType::Decimal,
            C::DecimalToNumber | C::BooleanToNumber | C::TextToNumber => DType::Number,
            C::TextToBoolean | C::NumberToBoolean | C::DecimalToBoolean => DType::Boolean,
            C::TextToHyperlink => DType::Hyperlink,
            C::NumberToText
            | C::DecimalToText
            | C::BooleanToText
            | C::DateToText
            | C::TimeToText
            | C::DateTimeToText
            | C::GuidToText
            | C::HyperlinkToText
            | C::ColorToText
            | C::EnumToText => DType::String,
            C::DateToDateTime => DType::DateTime,
            C::DateTimeToDate => DType::Date,
            C::EnumToBacking => from.backing_kind(),
        }
    }
}

// ============================================================================
// Textual form
// ============================================================================

fn write_fields(f: &mut fmt::Formatter<'_>, record: &RecordType) -> fmt::Result {
    f.write_str("[")?;
    for (i, (name, ty)) in record.fields().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}:{}", name.escaped(), ty)?;
    }
    f.write_str("]")
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Record(r) => {
                f.write_str("!")?;
                write_fields(f, r)
            }
            DType::Table(r) => {
                f.write_str("*")?;
                write_fields(f, r)
            }
            DType::Enum(e) => write!(f, "{}", e),
            other => match other.tag() {
                Some(tag) => write!(f, "{}", tag),
                None => Ok(()),
            },
        }
    }
}

impl fmt::Display for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}[", self.kind.sigil())?;
        for (i, (name, value)) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", name.escaped(), value)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(text: &str) -> Name {
        Name::new(text)
    }

    #[test]
    fn test_width_subtyping() {
        let narrow = DType::record([(n("a"), DType::Number)]);
        let wide = DType::record([(n("a"), DType::Number), (n("b"), DType::String)]);
        assert!(narrow.accepts(&wide));
        assert!(!wide.accepts(&narrow));
        assert!(narrow.to_table().unwrap().accepts(&wide.to_table().unwrap()));
    }

    #[test]
    fn test_field_types_are_checked() {
        let a = DType::record([(n("a"), DType::Number)]);
        let b = DType::record([(n("a"), DType::String)]);
        assert!(!a.accepts(&b));
    }

    #[test]
    fn test_blank_and_error_are_permissive() {
        assert!(DType::Number.accepts(&DType::Blank));
        assert!(DType::Number.accepts(&DType::Error));
        assert!(DType::Error.accepts(&DType::String));
        assert!(DType::Unknown.accepts(&DType::empty_table()));
        assert!(!DType::Blank.accepts(&DType::Number));
    }

    #[test]
    fn test_enums_are_nominal() {
        let e = DType::Enum(
            EnumType::new(EnumKind::Number, [(n("A"), EnumValue::Number(1.0))]).unwrap(),
        );
        assert!(e.accepts(&e.clone()));
        assert!(!e.accepts(&DType::Number));
        assert!(!DType::Number.accepts(&e));
        assert_eq!(e.coerces_to(&DType::Number), Some(Coercion::EnumToBacking));
        assert_eq!(e.coerces_to(&DType::String), Some(Coercion::EnumToText));
        assert_eq!(e.backing_kind(), DType::Number);
    }

    #[test]
    fn test_coercions() {
        assert_eq!(DType::Decimal.coerces_to(&DType::String), Some(Coercion::DecimalToText));
        assert_eq!(DType::String.coerces_to(&DType::Decimal), Some(Coercion::TextToDecimal));
        assert_eq!(DType::Boolean.coerces_to(&DType::Number), Some(Coercion::BooleanToNumber));
        assert_eq!(DType::Number.coerces_to(&DType::Number), Some(Coercion::None));
        assert_eq!(DType::empty_record().coerces_to(&DType::String), None);
        assert_eq!(DType::Color.coerces_to(&DType::Number), None);
        assert_eq!(DType::Color.coerces_to(&DType::String), Some(Coercion::ColorToText));
        assert_eq!(Coercion::ColorToText.target_type(&DType::Color), DType::String);
    }

    #[test]
    fn test_union() {
        assert_eq!(DType::Number.union(&DType::Decimal), DType::Number);
        assert_eq!(DType::Decimal.union(&DType::Decimal), DType::Decimal);
        assert_eq!(DType::Blank.union(&DType::String), DType::String);
        assert_eq!(DType::String.union(&DType::Hyperlink), DType::String);
        assert_eq!(DType::Boolean.union(&DType::String), DType::Error);

        let a = DType::record([(n("x"), DType::Number)]);
        let b = DType::record([(n("x"), DType::Decimal), (n("y"), DType::String)]);
        assert_eq!(
            a.union(&b),
            DType::record([(n("x"), DType::Number), (n("y"), DType::String)])
        );

        let c = DType::record([(n("x"), DType::Boolean)]);
        assert_eq!(b.union(&c), DType::Error);
    }

    #[test]
    fn test_display_names_do_not_affect_equality() {
        let mut names = DisplayNameMap::new();
        names.insert(n("cr_price"), n("Price"));
        let plain = RecordType::from_fields([(n("cr_price"), DType::Number)]);
        let named = plain.clone().with_display_names(names);
        assert_eq!(plain, named);
        assert_eq!(named.resolve_field("Price").map(|(l, _)| l), Some(n("cr_price")));
        assert!(plain.resolve_field("Price").is_none());
    }

    #[test]
    fn test_display() {
        let t = DType::table([
            (n("Value"), DType::Number),
            (n("Unit Price"), DType::Decimal),
            (n("Rec"), DType::record([(n("x"), DType::Boolean)])),
        ]);
        assert_eq!(t.to_string(), "*[Value:n, 'Unit Price':w, Rec:![x:b]]");
        assert_eq!(DType::DateTime.to_string(), "d");
    }
}
