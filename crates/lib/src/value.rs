//! Value types for document trees.
//!
//! This module provides the [`Value`] enum that represents everything a
//! document can store: leaf values (text, arbitrary-precision numbers,
//! booleans, symbols) and branch values (child documents and homogeneous
//! sequences). [`Kind`] is the runtime type tag used by sequences and by the
//! coercion collaborator in [`crate::convert`].

use std::fmt;

use bigdecimal::BigDecimal;

use crate::{document::DocRef, sequence::Sequence};

/// Runtime kind of a stored [`Value`].
///
/// `Kind` is a storage hint, not an identity: two sequences of different
/// kinds still compare equal if their contents do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Null/empty value
    Null,
    /// UTF-8 text
    Text,
    /// Arbitrary-precision decimal number
    Number,
    /// Boolean
    Bool,
    /// Enumerated constant, stored as its name
    Symbol,
    /// Child document
    Document,
    /// Homogeneous sequence of one of the preceding kinds
    Sequence,
}

impl Kind {
    /// Returns the kind name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Text => "text",
            Kind::Number => "number",
            Kind::Bool => "bool",
            Kind::Symbol => "symbol",
            Kind::Document => "document",
            Kind::Sequence => "sequence",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Values that can be stored in a document tree.
///
/// Leaf values are terminal; branch values ([`Value::Document`],
/// [`Value::Sequence`]) contain further structure. Sequences never nest.
///
/// # Direct Comparisons
///
/// `Value` implements `PartialEq` with primitive types for ergonomic
/// comparisons:
///
/// ```
/// # use pathdoc::value::Value;
/// let text = Value::from("hello");
/// let number = Value::from(42);
/// let flag = Value::from(true);
///
/// assert!(text == "hello");
/// assert!(number == 42);
/// assert!(flag == true);
///
/// // Type mismatches return false
/// assert!(!(text == 42));
/// ```
///
/// Two `Value::Document`s are equal iff their backing structures are
/// deep-equal under exact kind; decorators never participate.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null/empty value
    Null,
    /// Text string value
    Text(String),
    /// Arbitrary-precision decimal value
    Number(BigDecimal),
    /// Boolean value
    Bool(bool),
    /// Enumerated constant, stored as its name
    Symbol(String),
    /// Child document
    Document(DocRef),
    /// Homogeneous sequence
    Sequence(Sequence),
}

impl Value {
    /// Returns the runtime kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Text(_) => Kind::Text,
            Value::Number(_) => Kind::Number,
            Value::Bool(_) => Kind::Bool,
            Value::Symbol(_) => Kind::Symbol,
            Value::Document(_) => Kind::Document,
            Value::Sequence(_) => Kind::Sequence,
        }
    }

    /// Returns the kind name as a string.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a leaf value (terminal node).
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Value::Document(_) | Value::Sequence(_))
    }

    /// Attempts to view this value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to view this value as a number.
    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Attempts to view this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to view this value as a symbol name.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Attempts to view this value as a child document.
    pub fn as_document(&self) -> Option<&DocRef> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Attempts to view this value as a sequence.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a.structure_eq(b.as_ref()),
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Symbol(name) => write!(f, "{name}"),
            Value::Document(doc) => {
                write!(f, "{{")?;
                for (i, (key, value)) in doc.entries().into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, item) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// Convenient From implementations for common types
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(BigDecimal::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(BigDecimal::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(BigDecimal::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(BigDecimal::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        use bigdecimal::FromPrimitive;
        // Non-finite floats have no decimal form and store as null.
        match BigDecimal::from_f64(value) {
            Some(n) => Value::Number(n),
            None => Value::Null,
        }
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<DocRef> for Value {
    fn from(value: DocRef) -> Self {
        Value::Document(value)
    }
}

impl From<Sequence> for Value {
    fn from(value: Sequence) -> Self {
        Value::Sequence(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// PartialEq implementations for comparing Value with primitives
impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        match self {
            Value::Text(s) => s == other,
            _ => false,
        }
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for Value {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        match self {
            Value::Number(n) => *n == BigDecimal::from(*other),
            _ => false,
        }
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        self == &i64::from(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        match self {
            Value::Bool(b) => b == other,
            _ => false,
        }
    }
}

// Reverse implementations for symmetry
impl PartialEq<Value> for str {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        other == *self
    }
}

impl PartialEq<Value> for i64 {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl PartialEq<Value> for bool {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

/// Serializes a document's entries snapshot as a JSON-style map.
///
/// Used both by `Value::Document` serialization and by
/// [`to_json_string`](crate::document::DocumentExt::to_json_string).
pub(crate) struct JsonDoc(pub(crate) Vec<(String, Value)>);

impl serde::Serialize for JsonDoc {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Number(n) => {
                use bigdecimal::ToPrimitive;
                // Render as a JSON number where one exists; decimals too
                // wide for f64 fall back to their exact textual form.
                if n.is_integer() {
                    if let Some(i) = n.to_i64() {
                        return serializer.serialize_i64(i);
                    }
                }
                match n.to_f64() {
                    Some(f) if f.is_finite() => serializer.serialize_f64(f),
                    _ => serializer.serialize_str(&n.normalized().to_string()),
                }
            }
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Symbol(name) => serializer.serialize_str(name),
            Value::Document(doc) => JsonDoc(doc.entries()).serialize(serializer),
            Value::Sequence(seq) => seq.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Value::Null.kind(), Kind::Null);
        assert_eq!(Value::from("x").kind(), Kind::Text);
        assert_eq!(Value::from(1).kind(), Kind::Number);
        assert_eq!(Value::from(true).kind(), Kind::Bool);
        assert_eq!(Value::Symbol("ON".into()).kind(), Kind::Symbol);
    }

    #[test]
    fn test_primitive_comparisons() {
        assert_eq!(Value::from("hello"), "hello");
        assert_eq!(Value::from(42), 42);
        assert_eq!(Value::from(true), true);
        assert!(Value::from("42") != 42);
        assert!("42" == Value::from("42"));
    }

    #[test]
    fn test_from_float() {
        assert_eq!(Value::from(1.5), Value::Number("1.5".parse().unwrap()));
        assert!(Value::from(f64::NAN).is_null());
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
        assert!(Value::from(None::<&str>).is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::Null), "null");
        assert_eq!(format!("{}", Value::from(true)), "true");
        assert_eq!(format!("{}", Value::Symbol("RED".into())), "RED");
    }
}
