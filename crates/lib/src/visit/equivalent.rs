//! Coercion-aware equivalence through the visitor protocol.

use bigdecimal::BigDecimal;

use crate::{
    convert::{convert, symbol_matches},
    document::DocRef,
    value::{Kind, Value},
};

use super::{VisitKey, Visitor, accept};

/// Leaf equality under the coercion table.
///
/// Strictly equal values are equivalent; otherwise either side converted to
/// the other's kind must compare equal. Symbols match text (and other
/// symbols) case-insensitively over normalized names.
pub fn coercion_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Symbol(x), Value::Symbol(y)) => symbol_matches(x, y),
        (Value::Symbol(x), Value::Text(y)) | (Value::Text(x), Value::Symbol(y)) => {
            symbol_matches(x, y)
        }
        _ => {
            convert(b, a.kind()).map(|c| c == *a).unwrap_or(false)
                || convert(a, b.kind()).map(|c| c == *b).unwrap_or(false)
        }
    }
}

/// Deep equivalence: same shape, leaf values equal under [`coercion_eq`].
///
/// `{"flag": true}` is equivalent to `{"flag": "on"}` but not structurally
/// equal to it. Sequence lengths must match exactly, holes included.
pub fn equivalent(a: &DocRef, b: &DocRef) -> crate::Result<bool> {
    accept(a.as_ref(), EquivVisitor::new(b.clone()))
}

struct Level {
    other: DocRef,
    /// Document-level entries of the source seen at this level; compared
    /// against the counterpart's entry count so extra keys on either side
    /// break equivalence.
    seen: usize,
}

struct EquivVisitor {
    stack: Vec<Level>,
    matches: bool,
}

impl EquivVisitor {
    fn new(other: DocRef) -> Self {
        EquivVisitor {
            stack: vec![Level { other, seen: 0 }],
            matches: true,
        }
    }

    fn counterpart(&mut self, key: &VisitKey) -> crate::Result<Option<Value>> {
        if key.index().is_none() {
            if let Some(level) = self.stack.last_mut() {
                level.seen += 1;
            }
        }
        match self.stack.last() {
            Some(level) => level.other.opt(key.element()),
            None => Ok(None),
        }
    }

    fn leaf(&mut self, key: &VisitKey, value: &Value) -> crate::Result<()> {
        let ok = match self.counterpart(key)? {
            Some(other) => coercion_eq(value, &other),
            None => false,
        };
        if !ok {
            self.matches = false;
        }
        Ok(())
    }
}

impl Visitor for EquivVisitor {
    type Output = bool;

    fn null_value(&mut self, key: &VisitKey) -> crate::Result<()> {
        self.leaf(key, &Value::Null)
    }

    fn text_value(&mut self, key: &VisitKey, value: &str) -> crate::Result<()> {
        self.leaf(key, &Value::Text(value.to_string()))
    }

    fn number_value(&mut self, key: &VisitKey, value: &BigDecimal) -> crate::Result<()> {
        self.leaf(key, &Value::Number(value.clone()))
    }

    fn bool_value(&mut self, key: &VisitKey, value: bool) -> crate::Result<()> {
        self.leaf(key, &Value::Bool(value))
    }

    fn symbol_value(&mut self, key: &VisitKey, name: &str) -> crate::Result<()> {
        self.leaf(key, &Value::Symbol(name.to_string()))
    }

    fn begin_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        match self.counterpart(key)? {
            Some(Value::Document(other)) => {
                self.stack.push(Level { other, seen: 0 });
                Ok(())
            }
            _ => {
                self.matches = false;
                Ok(())
            }
        }
    }

    fn end_child(&mut self, _key: &VisitKey) -> crate::Result<()> {
        if let Some(level) = self.stack.pop() {
            if level.other.len() != level.seen {
                self.matches = false;
            }
        }
        Ok(())
    }

    fn begin_sequence(&mut self, key: &VisitKey, _kind: Kind, len: usize) -> crate::Result<()> {
        match self.counterpart(key)? {
            Some(Value::Sequence(other)) if other.len() == len => Ok(()),
            _ => {
                self.matches = false;
                Ok(())
            }
        }
    }

    fn is_complete(&self) -> bool {
        !self.matches
    }

    fn process(mut self) -> crate::Result<bool> {
        if let Some(root) = self.stack.pop() {
            if root.other.len() != root.seen {
                self.matches = false;
            }
        }
        Ok(self.matches)
    }
}
