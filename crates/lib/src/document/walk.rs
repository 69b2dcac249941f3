//! Generic path descent for [`DocumentCore`].
//!
//! Every path-keyed operation is one traversal algorithm parameterized by
//! three actions: `step` re-enters a child document through its public
//! facade (so a decorated child's own semantics govern deeper levels),
//! `terminal` runs against this level's structure once the cursor sits on
//! the last element, and `missing` resolves a read that ran out of tree.
//! [`walk`](DocumentCore::walk) never creates nodes;
//! [`insert`](DocumentCore::insert) materializes missing intermediates
//! through the decorator chain.

use std::cell::RefCell;

use crate::{
    key::{Element, KeyError, PathKey},
    sequence::{Sequence, SequenceError},
    structure::Structure,
    value::{Kind, Value},
};

use super::{DocError, DocRef, Document, DocumentCore};

fn type_mismatch(key: &PathKey, expected: &str, actual: &str) -> crate::Error {
    DocError::TypeMismatch {
        key: key.element_path(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
    .into()
}

fn seq_rejected(key: &PathKey, err: SequenceError) -> crate::Error {
    match err {
        SequenceError::KindMismatch { expected, actual } => DocError::TypeMismatch {
            key: key.element_path(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into(),
        SequenceError::Nested => DocError::TypeMismatch {
            key: key.element_path(),
            expected: "scalar or document".to_string(),
            actual: Kind::Sequence.to_string(),
        }
        .into(),
    }
}

fn exhausted(key: &PathKey) -> crate::Error {
    KeyError::malformed(key.as_str(), "key cursor is exhausted").into()
}

impl DocumentCore {
    /// Read-only descent. Resolves the child for every non-terminal element
    /// and hands the last element to `terminal`; absent intermediates go to
    /// `missing` instead of being created.
    fn walk<R>(
        &self,
        mut key: PathKey,
        step: impl FnOnce(DocRef, PathKey) -> crate::Result<R>,
        terminal: impl FnOnce(&mut Structure, &Element, &PathKey) -> crate::Result<R>,
        missing: impl FnOnce(&PathKey) -> crate::Result<R>,
    ) -> crate::Result<R> {
        let Some(element) = key.current().cloned() else {
            return Err(exhausted(&key));
        };
        if !key.has_more() {
            let mut guard = self.structure.write();
            return terminal(&mut guard, &element, &key);
        }
        let child = {
            let guard = self.structure.read();
            match (guard.get(element.name()), element.index()) {
                (None, _) | (Some(Value::Null), _) => None,
                (Some(Value::Document(doc)), None) => Some(doc.clone()),
                (Some(Value::Sequence(seq)), Some(i)) => match seq.get(i) {
                    None | Some(Value::Null) => None,
                    Some(Value::Document(doc)) => Some(doc.clone()),
                    Some(other) => {
                        return Err(type_mismatch(&key, "document", other.type_name()));
                    }
                },
                (Some(Value::Sequence(_)), None) => {
                    return Err(type_mismatch(&key, "document", "sequence"));
                }
                (Some(other), Some(_)) => {
                    return Err(type_mismatch(&key, "sequence", other.type_name()));
                }
                (Some(other), None) => {
                    return Err(type_mismatch(&key, "document", other.type_name()));
                }
            }
        };
        match child {
            Some(child) => {
                key.shift();
                step(child, key)
            }
            None => missing(&key),
        }
    }

    /// Materializing descent. Like `walk`, but absent (or null) intermediate
    /// locations are filled with fresh children wrapped through this
    /// document's decorator chain.
    fn insert<R>(
        &self,
        mut key: PathKey,
        step: impl FnOnce(DocRef, PathKey) -> crate::Result<R>,
        terminal: impl FnOnce(&mut Structure, &Element, &PathKey) -> crate::Result<R>,
    ) -> crate::Result<R> {
        let Some(element) = key.current().cloned() else {
            return Err(exhausted(&key));
        };
        if !key.has_more() {
            let mut guard = self.structure.write();
            return terminal(&mut guard, &element, &key);
        }
        let child: DocRef = {
            let mut guard = self.structure.write();
            match element.index() {
                None => {
                    let slot = guard.entry_or_insert_with(element.name(), || {
                        Value::Document(self.spawn_child())
                    });
                    // An explicit null is replaceable, same as absence.
                    if slot.is_null() {
                        *slot = Value::Document(self.spawn_child());
                    }
                    match slot {
                        Value::Document(doc) => doc.clone(),
                        other => return Err(type_mismatch(&key, "document", other.type_name())),
                    }
                }
                Some(i) => {
                    let slot = guard.entry_or_insert_with(element.name(), || {
                        Value::Sequence(Sequence::of(Kind::Document))
                    });
                    if slot.is_null() {
                        *slot = Value::Sequence(Sequence::of(Kind::Document));
                    }
                    match slot {
                        Value::Sequence(seq) => {
                            let stored = seq
                                .compute_if_absent(i, || Value::Document(self.spawn_child()))
                                .map_err(|err| seq_rejected(&key, err))?;
                            match stored {
                                Value::Document(doc) => doc.clone(),
                                other => {
                                    return Err(type_mismatch(
                                        &key,
                                        "document",
                                        other.type_name(),
                                    ));
                                }
                            }
                        }
                        other => return Err(type_mismatch(&key, "sequence", other.type_name())),
                    }
                }
            }
        };
        key.shift();
        step(child, key)
    }
}

impl Document for DocumentCore {
    fn add_at(&self, key: PathKey, value: Value) -> crate::Result<()> {
        // The value is consumed by exactly one of the two branches.
        let pending = RefCell::new(Some(value));
        self.insert(
            key,
            |child, rest| {
                child.add_at(rest, pending.borrow_mut().take().unwrap_or(Value::Null))
            },
            |structure, element, key| {
                let value = pending.borrow_mut().take().unwrap_or(Value::Null);
                match element.index() {
                    None => {
                        structure.insert(element.name(), value);
                        Ok(())
                    }
                    Some(i) => {
                        let kind = value.kind();
                        let slot = structure.entry_or_insert_with(element.name(), || {
                            Value::Sequence(Sequence::of(kind))
                        });
                        if slot.is_null() {
                            *slot = Value::Sequence(Sequence::of(kind));
                        }
                        match slot {
                            Value::Sequence(seq) => {
                                seq.set(i, value).map_err(|err| seq_rejected(key, err))?;
                                Ok(())
                            }
                            other => Err(type_mismatch(key, "sequence", other.type_name())),
                        }
                    }
                }
            },
        )
    }

    fn add_all_at(&self, key: PathKey, values: Vec<Value>) -> crate::Result<()> {
        let pending = RefCell::new(Some(values));
        self.insert(
            key,
            |child, rest| {
                child.add_all_at(rest, pending.borrow_mut().take().unwrap_or_default())
            },
            |structure, element, key| {
                if element.has_index() {
                    return Err(KeyError::malformed(
                        key.as_str(),
                        "bulk sequence write cannot target an indexed element",
                    )
                    .into());
                }
                let values = pending.borrow_mut().take().unwrap_or_default();
                let kind = values
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::kind)
                    .unwrap_or(Kind::Null);
                let seq =
                    Sequence::of_values(kind, values).map_err(|err| seq_rejected(key, err))?;
                structure.insert(element.name(), Value::Sequence(seq));
                Ok(())
            },
        )
    }

    fn append_at(&self, key: PathKey, value: Value) -> crate::Result<()> {
        let pending = RefCell::new(Some(value));
        self.insert(
            key,
            |child, rest| {
                child.append_at(rest, pending.borrow_mut().take().unwrap_or(Value::Null))
            },
            |structure, element, key| {
                if element.has_index() {
                    return Err(KeyError::malformed(
                        key.as_str(),
                        "append cannot target an indexed element",
                    )
                    .into());
                }
                let value = pending.borrow_mut().take().unwrap_or(Value::Null);
                let kind = value.kind();
                let slot = structure.entry_or_insert_with(element.name(), || {
                    Value::Sequence(Sequence::of(kind))
                });
                if slot.is_null() {
                    *slot = Value::Sequence(Sequence::of(kind));
                }
                match slot {
                    Value::Sequence(seq) => {
                        seq.append(value).map_err(|err| seq_rejected(key, err))?;
                        Ok(())
                    }
                    other => Err(type_mismatch(key, "sequence", other.type_name())),
                }
            },
        )
    }

    fn opt_at(&self, key: PathKey) -> crate::Result<Option<Value>> {
        self.walk(
            key,
            |child, rest| child.opt_at(rest),
            |structure, element, key| match element.index() {
                None => Ok(structure.get(element.name()).cloned()),
                Some(i) => match structure.get(element.name()) {
                    None | Some(Value::Null) => Ok(None),
                    Some(Value::Sequence(seq)) => Ok(seq.get(i).cloned()),
                    Some(other) => Err(type_mismatch(key, "sequence", other.type_name())),
                },
            },
            |_key| Ok(None),
        )
    }

    fn get_or_at(&self, key: PathKey, default: Value) -> crate::Result<Value> {
        // A stored explicit null is a value here; only absence defaults.
        // The null-filtering decorator widens this.
        Ok(self.opt_at(key)?.unwrap_or(default))
    }

    fn remove_at(&self, key: PathKey) -> crate::Result<bool> {
        self.walk(
            key,
            |child, rest| child.remove_at(rest),
            |structure, element, key| match element.index() {
                None => Ok(structure.remove(element.name()).is_some()),
                Some(i) => match structure.get_mut(element.name()) {
                    None | Some(Value::Null) => Ok(false),
                    Some(Value::Sequence(seq)) => {
                        let existed = i < seq.len();
                        if existed && seq.remove(i) {
                            // Removing the last element leaves no empty husk;
                            // a sequence that was already empty stays put.
                            structure.remove(element.name());
                        }
                        Ok(existed)
                    }
                    Some(other) => Err(type_mismatch(key, "sequence", other.type_name())),
                },
            },
            |_key| Ok(false),
        )
    }

    fn entries(&self) -> Vec<(String, Value)> {
        self.structure
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.structure.read().len()
    }

    fn chain(&self) -> super::Chain {
        self.chain.clone()
    }

    fn backing(&self) -> std::sync::Arc<parking_lot::RwLock<Structure>> {
        std::sync::Arc::clone(&self.structure)
    }
}
