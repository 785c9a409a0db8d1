//! Purpose: Describe decodable records and hand out typed write access to their fields.
//! Exports: `Record`, `FieldDescriptor`, `Slot`, `IntSlot`, `QueryField`, `UnmarshalText`, `ValueKind`.
//! Role: Static replacement for runtime reflection; `#[derive(Record)]` targets this module.
//! Invariants: `Record::FIELDS` lists fields in declaration order and never changes at runtime.
//! Invariants: The kind set is closed; anything outside it goes through `Slot::Text` or `Slot::Opaque`.

use std::error::Error as StdError;
use std::fmt;
use std::num::TryFromIntError;

/// Static metadata for one record field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub tag: Option<&'static str>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, tag: Option<&'static str>) -> Self {
        Self { name, tag }
    }
}

/// A struct whose fields can be populated from a parameter map.
///
/// Usually derived with `#[derive(Record)]`. Hand-written impls must keep
/// `slot(i)` consistent with `FIELDS[i]`; returning `None` marks the field as
/// not writable and the decoder skips it.
pub trait Record {
    const FIELDS: &'static [FieldDescriptor];

    fn slot(&mut self, index: usize) -> Option<Slot<'_>>;
}

/// Closed classification of field types, used in error reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    String,
    Boolean,
    Integer,
    Float32,
    Float64,
    Custom,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float32 => "float32",
            ValueKind::Float64 => "float64",
            ValueKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable view of one field, tagged by its declared kind.
pub enum Slot<'a> {
    Str(&'a mut String),
    Bool(&'a mut bool),
    Int(IntSlot<'a>),
    F32(&'a mut f32),
    F64(&'a mut f64),
    /// Type with its own text decoding hook.
    Text(&'a mut dyn UnmarshalText),
    /// Type the decoder has no rule for.
    Opaque,
}

impl Slot<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Slot::Str(_) => ValueKind::String,
            Slot::Bool(_) => ValueKind::Boolean,
            Slot::Int(_) => ValueKind::Integer,
            Slot::F32(_) => ValueKind::Float32,
            Slot::F64(_) => ValueKind::Float64,
            Slot::Text(_) | Slot::Opaque => ValueKind::Custom,
        }
    }
}

impl fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.kind()).finish()
    }
}

/// Signed integer fields of any width; values are range-checked on assignment.
pub enum IntSlot<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
}

impl IntSlot<'_> {
    pub fn assign(self, value: i64) -> Result<(), TryFromIntError> {
        match self {
            IntSlot::I8(target) => *target = i8::try_from(value)?,
            IntSlot::I16(target) => *target = i16::try_from(value)?,
            IntSlot::I32(target) => *target = i32::try_from(value)?,
            IntSlot::I64(target) => *target = value,
            IntSlot::Isize(target) => *target = isize::try_from(value)?,
        }
        Ok(())
    }
}

/// Custom text decoding for a field type.
///
/// The decoder calls `unmarshal_text` first. When it fails, the decoder
/// retries with the built-in rule for `fallback()`, if the type exposes one;
/// otherwise the field is reported as an unsupported type.
pub trait UnmarshalText {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), Box<dyn StdError + Send + Sync>>;

    fn fallback(&mut self) -> Option<Slot<'_>> {
        None
    }
}

/// Field types a derived `Record` can hand out.
///
/// Implemented for `String`, `bool`, signed integers and floats. Types with a
/// text hook implement it by returning `Slot::Text(self)`.
pub trait QueryField {
    fn slot(&mut self) -> Slot<'_>;
}

impl QueryField for String {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Str(self)
    }
}

impl QueryField for bool {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Bool(self)
    }
}

impl QueryField for f32 {
    fn slot(&mut self) -> Slot<'_> {
        Slot::F32(self)
    }
}

impl QueryField for f64 {
    fn slot(&mut self) -> Slot<'_> {
        Slot::F64(self)
    }
}

macro_rules! int_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl QueryField for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Int(IntSlot::$variant(self))
                }
            }
        )*
    };
}

int_field!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize);

#[cfg(test)]
mod tests {
    use super::{IntSlot, QueryField, Slot, ValueKind};

    #[test]
    fn builtin_kinds() {
        let mut text = String::new();
        let mut flag = false;
        let mut small = 0i8;
        let mut single = 0f32;
        let mut double = 0f64;

        assert_eq!(text.slot().kind(), ValueKind::String);
        assert_eq!(flag.slot().kind(), ValueKind::Boolean);
        assert_eq!(small.slot().kind(), ValueKind::Integer);
        assert_eq!(single.slot().kind(), ValueKind::Float32);
        assert_eq!(double.slot().kind(), ValueKind::Float64);
        assert_eq!(Slot::Opaque.kind(), ValueKind::Custom);
    }

    #[test]
    fn int_slot_checks_width() {
        let mut small = 0i8;
        IntSlot::I8(&mut small).assign(127).expect("fits");
        assert_eq!(small, 127);
        assert!(IntSlot::I8(&mut small).assign(128).is_err());
        assert_eq!(small, 127);

        let mut wide = 0i64;
        IntSlot::I64(&mut wide).assign(i64::MIN).expect("fits");
        assert_eq!(wide, i64::MIN);
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ValueKind::Boolean.to_string(), "boolean");
        assert_eq!(ValueKind::Integer.to_string(), "integer");
        assert_eq!(ValueKind::Float32.to_string(), "float32");
        assert_eq!(ValueKind::Float64.to_string(), "float64");
    }
}
