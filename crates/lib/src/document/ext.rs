//! Typed convenience accessors layered over the value-level [`Document`]
//! contract.
//!
//! Every getter routes through [`crate::convert`], so `get_number("port")`
//! on a stored `"8080"` succeeds. Getters coalesce nulls: a stored null at a
//! defaulted read yields the default, and a stored null at a required read
//! is missing.

use bigdecimal::BigDecimal;

use crate::{
    convert::convert,
    value::{JsonDoc, Kind, Value},
};

use super::{DocError, DocRef, Document};

fn unwrap_text(key: &str, value: Value) -> crate::Result<String> {
    match convert(&value, Kind::Text)? {
        Value::Text(s) => Ok(s),
        other => Err(wrong_kind(key, Kind::Text, &other)),
    }
}

fn wrong_kind(key: &str, expected: Kind, actual: &Value) -> crate::Error {
    DocError::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
    .into()
}

/// Typed sugar over [`Document`]. Blanket-implemented, so it is available on
/// every facade and on [`DocRef`] alike.
pub trait DocumentExt: Document {
    /// Sets a text value.
    fn add_text(&self, key: &str, value: impl Into<String>) -> crate::Result<()> {
        self.add(key, Value::Text(value.into()))
    }

    /// Sets a numeric value.
    fn add_number(&self, key: &str, value: impl Into<BigDecimal>) -> crate::Result<()> {
        self.add(key, Value::Number(value.into()))
    }

    /// Sets a boolean value.
    fn add_bool(&self, key: &str, value: bool) -> crate::Result<()> {
        self.add(key, Value::Bool(value))
    }

    /// Sets a symbol value by name.
    fn add_symbol(&self, key: &str, name: impl Into<String>) -> crate::Result<()> {
        self.add(key, Value::Symbol(crate::convert::symbol_name(&name.into())))
    }

    /// Attaches a child document.
    fn add_child(&self, key: &str, child: DocRef) -> crate::Result<()> {
        self.add(key, Value::Document(child))
    }

    /// Replaces the sequence at the key with the given texts.
    fn add_texts<I>(&self, key: &str, values: I) -> crate::Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.add_all(
            key,
            values
                .into_iter()
                .map(|v| Value::Text(v.into()))
                .collect(),
        )
    }

    /// Replaces the sequence at the key with the given numbers.
    fn add_numbers<I>(&self, key: &str, values: I) -> crate::Result<()>
    where
        I: IntoIterator,
        I::Item: Into<BigDecimal>,
    {
        self.add_all(
            key,
            values
                .into_iter()
                .map(|v| Value::Number(v.into()))
                .collect(),
        )
    }

    /// Replaces the sequence at the key with the given booleans.
    fn add_bools(&self, key: &str, values: impl IntoIterator<Item = bool>) -> crate::Result<()> {
        self.add_all(key, values.into_iter().map(Value::Bool).collect())
    }

    /// Appends a text element.
    fn append_text(&self, key: &str, value: impl Into<String>) -> crate::Result<()> {
        self.append(key, Value::Text(value.into()))
    }

    /// Appends a numeric element.
    fn append_number(&self, key: &str, value: impl Into<BigDecimal>) -> crate::Result<()> {
        self.append(key, Value::Number(value.into()))
    }

    /// Appends a boolean element.
    fn append_bool(&self, key: &str, value: bool) -> crate::Result<()> {
        self.append(key, Value::Bool(value))
    }

    /// Appends a child document element.
    fn append_child(&self, key: &str, child: DocRef) -> crate::Result<()> {
        self.append(key, Value::Document(child))
    }

    /// Gets a required text value, coercing where the conversion table
    /// allows.
    fn get_text(&self, key: &str) -> crate::Result<String> {
        let value = self.get(key)?;
        unwrap_text(key, value)
    }

    /// Gets a text value, or the default when absent or null.
    fn get_text_or(&self, key: &str, default: impl Into<String>) -> crate::Result<String> {
        let fallback = default.into();
        match self.get_or(key, Value::Text(fallback.clone()))? {
            Value::Null => Ok(fallback),
            value => unwrap_text(key, value),
        }
    }

    /// Gets a required numeric value, coercing where possible.
    fn get_number(&self, key: &str) -> crate::Result<BigDecimal> {
        let value = self.get(key)?;
        match convert(&value, Kind::Number)? {
            Value::Number(n) => Ok(n),
            other => Err(wrong_kind(key, Kind::Number, &other)),
        }
    }

    /// Gets a numeric value, or the default when absent or null.
    fn get_number_or(&self, key: &str, default: impl Into<BigDecimal>) -> crate::Result<BigDecimal> {
        let fallback = default.into();
        match self.get_or(key, Value::Number(fallback.clone()))? {
            Value::Null => Ok(fallback),
            value => match convert(&value, Kind::Number)? {
                Value::Number(n) => Ok(n),
                other => Err(wrong_kind(key, Kind::Number, &other)),
            },
        }
    }

    /// Gets a required boolean value, coercing where possible.
    fn get_bool(&self, key: &str) -> crate::Result<bool> {
        let value = self.get(key)?;
        match convert(&value, Kind::Bool)? {
            Value::Bool(b) => Ok(b),
            other => Err(wrong_kind(key, Kind::Bool, &other)),
        }
    }

    /// Gets a boolean value, or the default when absent or null.
    fn get_bool_or(&self, key: &str, default: bool) -> crate::Result<bool> {
        match self.get_or(key, Value::Bool(default))? {
            Value::Null => Ok(default),
            value => match convert(&value, Kind::Bool)? {
                Value::Bool(b) => Ok(b),
                other => Err(wrong_kind(key, Kind::Bool, &other)),
            },
        }
    }

    /// Gets a required symbol name, coercing from text where possible.
    fn get_symbol(&self, key: &str) -> crate::Result<String> {
        let value = self.get(key)?;
        match convert(&value, Kind::Symbol)? {
            Value::Symbol(name) => Ok(name),
            other => Err(wrong_kind(key, Kind::Symbol, &other)),
        }
    }

    /// Gets a required child document. Never coerced.
    fn get_child(&self, key: &str) -> crate::Result<DocRef> {
        let value = self.get(key)?;
        match value {
            Value::Document(doc) => Ok(doc),
            other => Err(wrong_kind(key, Kind::Document, &other)),
        }
    }

    /// Gets every non-null element of the sequence at the key as text.
    fn get_texts(&self, key: &str) -> crate::Result<Vec<String>> {
        self.get_all(key)?
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| unwrap_text(key, v))
            .collect()
    }

    /// Gets every non-null element of the sequence at the key as a number.
    fn get_numbers(&self, key: &str) -> crate::Result<Vec<BigDecimal>> {
        self.get_all(key)?
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| match convert(&v, Kind::Number)? {
                Value::Number(n) => Ok(n),
                other => Err(wrong_kind(key, Kind::Number, &other)),
            })
            .collect()
    }

    /// Gets every non-null child document of the sequence at the key.
    fn get_children(&self, key: &str) -> crate::Result<Vec<DocRef>> {
        self.get_all(key)?
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::Document(doc) => Ok(doc),
                other => Err(wrong_kind(key, Kind::Document, &other)),
            })
            .collect()
    }

    /// Renders this document as a JSON string. Holes serialize as `null`,
    /// symbols as their names.
    fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&JsonDoc(self.entries()))?)
    }

    /// Renders this document as pretty-printed JSON.
    fn to_json_string_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&JsonDoc(self.entries()))?)
    }
}

impl<D: Document + ?Sized> DocumentExt for D {}
