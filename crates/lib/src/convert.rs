//! Cross-kind value coercion.
//!
//! This module is the single source of truth for converting a stored
//! [`Value`] to a caller-requested [`Kind`]: every `get_*` accessor and the
//! coercion-aware equality check route through [`convert`] so the rules never
//! drift.
//!
//! ## Supported coercions
//!
//! - identity for every kind
//! - text ⇄ number, via arbitrary-precision decimal parsing/rendering
//! - text ⇄ bool, case-insensitive over fixed word lists
//! - text ⇄ symbol: trimmed, internal whitespace becomes `_`, matching is
//!   case-insensitive
//! - a sequence converts only to its own element kind, never to a scalar
//!
//! Number ⇄ bool and number ⇄ symbol are rejected, as is everything touching
//! documents other than identity.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::value::{Kind, Value};

/// Words accepted (case-insensitively) as `true` when coercing text to bool.
pub const TRUE_WORDS: &[&str] = &["true", "1", "on", "enabled", "set", "y", "yes"];

/// Words accepted (case-insensitively) as `false` when coercing text to bool.
pub const FALSE_WORDS: &[&str] = &["false", "0", "off", "disabled", "unset", "n", "no"];

/// Error type for coercion failures.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// No coercion rule bridges the two kinds.
    #[error("cannot convert {from} to {to}")]
    Unsupported { from: Kind, to: Kind },

    /// The rule exists but the concrete value does not parse.
    #[error("cannot parse '{value}' as {to}")]
    Unparseable { value: String, to: Kind },
}

impl From<ConvertError> for crate::Error {
    fn from(err: ConvertError) -> Self {
        crate::Error::Convert(err)
    }
}

/// Coerces `value` to the target kind.
///
/// Identity conversions clone the value; null converts to null for every
/// target (null-handling policy belongs to the caller, not the coercion
/// table).
pub fn convert(value: &Value, target: Kind) -> Result<Value, ConvertError> {
    if value.kind() == target || value.is_null() {
        return Ok(value.clone());
    }
    match (value, target) {
        (Value::Text(s), Kind::Number) => {
            let n = BigDecimal::from_str(s.trim()).map_err(|_| ConvertError::Unparseable {
                value: s.clone(),
                to: Kind::Number,
            })?;
            Ok(Value::Number(n))
        }
        (Value::Text(s), Kind::Bool) => match parse_bool(s) {
            Some(b) => Ok(Value::Bool(b)),
            None => Err(ConvertError::Unparseable {
                value: s.clone(),
                to: Kind::Bool,
            }),
        },
        (Value::Text(s), Kind::Symbol) => Ok(Value::Symbol(symbol_name(s))),
        (Value::Number(n), Kind::Text) => Ok(Value::Text(n.normalized().to_string())),
        (Value::Bool(b), Kind::Text) => Ok(Value::Text(b.to_string())),
        (Value::Symbol(name), Kind::Text) => Ok(Value::Text(name.clone())),
        // A sequence is only convertible to its own element kind, never to
        // a scalar.
        (Value::Sequence(seq), kind) if kind == seq.kind() => Ok(value.clone()),
        _ => Err(ConvertError::Unsupported {
            from: value.kind(),
            to: target,
        }),
    }
}

/// Parses a boolean word, case-insensitively, over [`TRUE_WORDS`] and
/// [`FALSE_WORDS`].
pub fn parse_bool(text: &str) -> Option<bool> {
    let word = text.trim();
    if TRUE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w)) {
        Some(true)
    } else if FALSE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w)) {
        Some(false)
    } else {
        None
    }
}

/// Normalizes free text into a symbol name: leading/trailing whitespace is
/// trimmed and internal whitespace runs become a single `_`.
pub fn symbol_name(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Case-insensitive symbol comparison over normalized names.
pub fn symbol_matches(a: &str, b: &str) -> bool {
    symbol_name(a).eq_ignore_ascii_case(&symbol_name(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    #[test]
    fn test_identity() {
        let v = Value::from("x");
        assert_eq!(convert(&v, Kind::Text).unwrap(), v);
        let v = Value::from(true);
        assert_eq!(convert(&v, Kind::Bool).unwrap(), v);
    }

    #[test]
    fn test_null_converts_to_null() {
        assert!(convert(&Value::Null, Kind::Bool).unwrap().is_null());
        assert!(convert(&Value::Null, Kind::Document).unwrap().is_null());
    }

    #[test]
    fn test_text_to_number_and_back() {
        assert_eq!(
            convert(&Value::from(" 3.50 "), Kind::Number).unwrap(),
            Value::Number("3.5".parse().unwrap())
        );
        assert_eq!(
            convert(&Value::from(12), Kind::Text).unwrap(),
            Value::from("12")
        );
        assert!(matches!(
            convert(&Value::from("abc"), Kind::Number),
            Err(ConvertError::Unparseable { .. })
        ));
    }

    #[test]
    fn test_text_to_bool_word_lists() {
        for word in ["true", "1", "ON", "Enabled", "set", "y", "yes"] {
            assert_eq!(
                convert(&Value::from(word), Kind::Bool).unwrap(),
                Value::from(true),
                "'{word}' should read as true"
            );
        }
        for word in ["false", "0", "off", "DISABLED", "unset", "n", "no"] {
            assert_eq!(
                convert(&Value::from(word), Kind::Bool).unwrap(),
                Value::from(false),
                "'{word}' should read as false"
            );
        }
        assert!(convert(&Value::from("maybe"), Kind::Bool).is_err());
    }

    #[test]
    fn test_text_to_symbol_normalization() {
        assert_eq!(
            convert(&Value::from("  light  red "), Kind::Symbol).unwrap(),
            Value::Symbol("light_red".into())
        );
        assert!(symbol_matches("LIGHT_RED", "light red"));
        assert!(!symbol_matches("LIGHT_RED", "dark red"));
    }

    #[test]
    fn test_number_to_bool_and_symbol_rejected() {
        assert!(matches!(
            convert(&Value::from(1), Kind::Bool),
            Err(ConvertError::Unsupported { .. })
        ));
        assert!(matches!(
            convert(&Value::from(1), Kind::Symbol),
            Err(ConvertError::Unsupported { .. })
        ));
        assert!(matches!(
            convert(&Value::from(true), Kind::Number),
            Err(ConvertError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_sequence_only_converts_to_its_element_kind() {
        let seq = Value::Sequence(
            Sequence::of_values(Kind::Text, [Value::from("a")]).unwrap(),
        );
        assert!(convert(&seq, Kind::Text).is_ok());
        assert!(convert(&seq, Kind::Number).is_err());
        // Identity still works.
        assert!(convert(&seq, Kind::Sequence).is_ok());
    }
}
