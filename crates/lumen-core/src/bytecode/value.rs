//! Runtime values

use std::fmt;

use crate::heap::{Heap, ObjKind, ObjRef};

/// A Lumen value
///
/// Values are small and `Copy`; strings live on the [`Heap`] and are held by
/// handle. Equality is structural for primitives and by identity for
/// objects, which for interned strings is the same as content equality.
/// Numbers compare with IEEE semantics, so `NaN` is not equal to itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    Bool(bool),
    #[default]
    Nil,
    Number(f64),
    Obj(ObjRef),
}

impl Value {
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[must_use]
    pub const fn is_obj(&self) -> bool {
        matches!(self, Value::Obj(_))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::Obj(obj) if obj.kind() == ObjKind::String)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Obj(obj) => Some(*obj),
            _ => None,
        }
    }

    /// Only `nil` and `false` are falsey
    #[must_use]
    pub const fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Name of the value's type, for diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::Obj(obj) => obj.kind().name(),
        }
    }

    /// Render the value the way `print` does
    #[must_use]
    pub fn display<'a>(&self, heap: &'a Heap) -> ValueDisplay<'a> {
        ValueDisplay { value: *self, heap }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Obj(obj)
    }
}

/// Printable view of a [`Value`], borrowing the heap for object content
pub struct ValueDisplay<'a> {
    value: Value,
    heap: &'a Heap,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => f.write_str("nil"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Obj(obj) => write!(f, "{}", self.heap.get(obj)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());

        let mut heap = Heap::new();
        let empty = heap.copy_string("");
        assert!(!Value::Obj(empty).is_falsey());
    }

    #[test]
    fn equality_rules() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Bool(true), Value::Number(1.0));
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn interned_strings_compare_equal() {
        let mut heap = Heap::new();
        let a = Value::Obj(heap.copy_string("same"));
        let b = Value::Obj(heap.copy_string("same"));
        let c = Value::Obj(heap.copy_string("other"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Nil.as_number(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Nil.is_nil());
        assert!(Value::from(3.0).is_number());
        assert!(Value::from(false).is_bool());
    }

    #[test]
    fn string_tag() {
        let mut heap = Heap::new();
        let s = Value::from(heap.copy_string("x"));
        assert!(s.is_obj());
        assert!(s.is_string());
        assert_eq!(s.type_name(), "string");
        assert!(!Value::Nil.is_string());
    }

    #[test]
    fn printing() {
        let mut heap = Heap::new();
        let s = heap.copy_string("raw text");
        assert_eq!(Value::Bool(true).display(&heap).to_string(), "true");
        assert_eq!(Value::Nil.display(&heap).to_string(), "nil");
        assert_eq!(Value::Number(3.0).display(&heap).to_string(), "3");
        assert_eq!(Value::Number(-0.5).display(&heap).to_string(), "-0.5");
        assert_eq!(Value::Number(f64::INFINITY).display(&heap).to_string(), "inf");
        assert_eq!(Value::Obj(s).display(&heap).to_string(), "raw text");
    }
}
