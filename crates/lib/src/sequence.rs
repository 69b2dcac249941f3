//! Kind-tagged, expandable, sparse-tolerant sequence store.
//!
//! A [`Sequence`] is the indexed container behind `key[i]` addressing: an
//! ordered, 0-based, randomly-settable list fixed to one element [`Kind`].
//! Setting past the end grows the backing store with headroom; removing an
//! interior element leaves an explicit hole that still counts toward the
//! length, while removing the last element shrinks the sequence and drops any
//! now-trailing holes.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::value::{Kind, Value};

/// Extra capacity allocated beyond the highest set index.
const HEADROOM: usize = 8;

/// Error type for sequence storage failures.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The element's runtime kind is incompatible with the sequence kind.
    #[error("sequence of {expected} cannot hold {actual}")]
    KindMismatch { expected: Kind, actual: Kind },

    /// Sequences cannot contain sequences.
    #[error("sequences cannot nest")]
    Nested,
}

impl From<SequenceError> for crate::Error {
    fn from(err: SequenceError) -> Self {
        crate::Error::Sequence(err)
    }
}

/// A kind-tagged, auto-growing, sparse-tolerant indexed store.
///
/// Invariants:
/// - `len()` is the highest set index + 1; trailing unset slots never count.
/// - Unset slots and explicit nulls are indistinguishable on read and in
///   equality.
/// - Equality ignores unused backing capacity and the kind tag; only the
///   positional contents of `[0, len)` matter.
///
/// # Examples
///
/// ```
/// use pathdoc::{sequence::Sequence, value::{Kind, Value}};
///
/// let mut seq = Sequence::of(Kind::Text);
/// seq.append(Value::from("a"))?;
/// seq.append(Value::from("b"))?;
/// seq.set(4, Value::from("e"))?;
/// assert_eq!(seq.len(), 5);
/// assert_eq!(seq.get(2), Some(&Value::Null));
/// assert_eq!(seq.get(9), None);
/// # Ok::<(), pathdoc::sequence::SequenceError>(())
/// ```
#[derive(Debug)]
pub struct Sequence {
    kind: Kind,
    /// Backing slots; may exceed `len` by headroom. `Value::Null` marks an
    /// unset slot.
    slots: Vec<Value>,
    len: usize,
    /// Cached materialization of `[0, len)`, invalidated on mutation.
    cache: Mutex<Option<Arc<Vec<Value>>>>,
}

impl Sequence {
    /// Creates an empty sequence of the given element kind.
    pub fn of(kind: Kind) -> Self {
        Self::of_sized(kind, 0)
    }

    /// Creates an empty sequence with backing capacity for `expected`
    /// elements.
    pub fn of_sized(kind: Kind, expected: usize) -> Self {
        Sequence {
            kind,
            slots: Vec::with_capacity(expected),
            len: 0,
            cache: Mutex::new(None),
        }
    }

    /// Creates a sequence from initial values. The input is copied, never
    /// aliased.
    pub fn of_values(
        kind: Kind,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Self, SequenceError> {
        let mut seq = Sequence::of(kind);
        for value in values {
            seq.append(value)?;
        }
        Ok(seq)
    }

    /// The element kind this sequence is tagged with.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Highest set index + 1. Trailing unset slots never count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot counts toward the length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Gets the value at `index`. Returns `None` past the end; holes within
    /// the sequence read as `Value::Null`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        if index < self.len {
            Some(&self.slots[index])
        } else {
            None
        }
    }

    /// Sets the value at `index`, growing the backing store as needed.
    /// Returns the previous counted value at that slot, if any.
    ///
    /// A non-null value whose kind differs from the sequence kind fails with
    /// [`SequenceError::KindMismatch`] — unless every counted slot is still
    /// null, in which case the sequence kind is promoted to the value's kind.
    /// Parsers rely on that affordance when they provision an empty sequence
    /// before knowing its element kind.
    pub fn set(&mut self, index: usize, value: Value) -> Result<Option<Value>, SequenceError> {
        self.admit(&value)?;
        if index >= self.slots.len() {
            self.slots.resize(index + 1 + HEADROOM, Value::Null);
        }
        let old = std::mem::replace(&mut self.slots[index], value);
        let old = if index < self.len { Some(old) } else { None };
        self.len = self.len.max(index + 1);
        self.invalidate();
        Ok(old)
    }

    /// Appends a value at the end, equivalent to `set(len(), value)`.
    pub fn append(&mut self, value: Value) -> Result<(), SequenceError> {
        self.set(self.len, value)?;
        Ok(())
    }

    /// Returns the counted non-null value at `index`, or stores and returns a
    /// freshly supplied one.
    pub fn compute_if_absent(
        &mut self,
        index: usize,
        supplier: impl FnOnce() -> Value,
    ) -> Result<&Value, SequenceError> {
        if self.get(index).is_none_or(Value::is_null) {
            self.set(index, supplier())?;
        }
        Ok(&self.slots[index])
    }

    /// Removes the value at `index` and reports whether the sequence is now
    /// fully empty (the caller drops the sequence from its structure then).
    ///
    /// Removing the last element shrinks the sequence, dropping any
    /// now-trailing unset slots. Removing an interior element leaves an
    /// explicit hole that still counts toward `len()`.
    pub fn remove(&mut self, index: usize) -> bool {
        if index < self.len {
            self.slots[index] = Value::Null;
            if index + 1 == self.len {
                while self.len > 0 && self.slots[self.len - 1].is_null() {
                    self.len -= 1;
                }
            }
            self.invalidate();
        }
        self.len == 0
    }

    /// Iterates `[0, len)` in order, holes included as `Value::Null`.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.slots[..self.len].iter()
    }

    /// Materializes `[0, len)` as a list, holes included as `Value::Null`.
    /// The result is cached until the next mutation.
    pub fn to_list(&self) -> Arc<Vec<Value>> {
        let mut cache = self.cache.lock();
        match &*cache {
            Some(list) => Arc::clone(list),
            None => {
                let list = Arc::new(self.slots[..self.len].to_vec());
                *cache = Some(Arc::clone(&list));
                list
            }
        }
    }

    fn invalidate(&mut self) {
        *self.cache.get_mut() = None;
    }

    fn admit(&mut self, value: &Value) -> Result<(), SequenceError> {
        let kind = value.kind();
        if kind == Kind::Sequence {
            return Err(SequenceError::Nested);
        }
        if kind == Kind::Null || kind == self.kind {
            return Ok(());
        }
        // Type promotion on first real write: an all-null sequence adopts
        // the kind of the incoming value instead of failing.
        if self.iter().all(Value::is_null) {
            self.kind = kind;
            return Ok(());
        }
        Err(SequenceError::KindMismatch {
            expected: self.kind,
            actual: kind,
        })
    }
}

impl Clone for Sequence {
    fn clone(&self) -> Self {
        Sequence {
            kind: self.kind,
            slots: self.slots[..self.len].to_vec(),
            len: self.len,
            cache: Mutex::new(None),
        }
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        // Kind is a storage hint, not part of identity.
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Sequence {}

impl serde::Serialize for Sequence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len))?;
        for value in self.iter() {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut seq = Sequence::of(Kind::Text);
        seq.append(Value::from("a")).unwrap();
        seq.append(Value::from("b")).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(0), Some(&Value::from("a")));
        assert_eq!(seq.get(1), Some(&Value::from("b")));
        assert_eq!(seq.get(2), None);
    }

    #[test]
    fn test_sparse_set_grows_len_not_past_highest() {
        let mut seq = Sequence::of(Kind::Number);
        seq.set(4, Value::from(7)).unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.get(0), Some(&Value::Null));
        assert_eq!(seq.get(4), Some(&Value::from(7)));
        // Backing headroom never leaks into len.
        assert_eq!(seq.get(5), None);
    }

    #[test]
    fn test_interior_remove_keeps_len() {
        let mut seq =
            Sequence::of_values(Kind::Text, ["a", "b", "c"].map(Value::from)).unwrap();
        assert!(!seq.remove(1));
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(1), Some(&Value::Null));
        assert_eq!(seq.get(2), Some(&Value::from("c")));
    }

    #[test]
    fn test_last_remove_shrinks_and_drops_trailing_holes() {
        let mut seq =
            Sequence::of_values(Kind::Text, ["a", "b", "c"].map(Value::from)).unwrap();
        seq.remove(1);
        assert!(!seq.remove(2));
        // Index 1 was already a hole, so it trails away too.
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.get(0), Some(&Value::from("a")));

        assert!(seq.remove(0));
        assert!(seq.is_empty());
    }

    #[test]
    fn test_remove_past_end_is_noop() {
        let mut seq = Sequence::of_values(Kind::Text, [Value::from("a")]).unwrap();
        assert!(!seq.remove(5));
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut seq = Sequence::of_values(Kind::Text, [Value::from("a")]).unwrap();
        let err = seq.set(1, Value::from(1)).unwrap_err();
        assert_eq!(
            err,
            SequenceError::KindMismatch {
                expected: Kind::Text,
                actual: Kind::Number
            }
        );
    }

    #[test]
    fn test_nulls_always_admitted() {
        let mut seq = Sequence::of_values(Kind::Text, [Value::from("a")]).unwrap();
        seq.set(1, Value::Null).unwrap();
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_type_promotion_on_all_null_sequence() {
        let mut seq = Sequence::of(Kind::Text);
        seq.append(Value::Null).unwrap();
        seq.append(Value::Null).unwrap();
        // All elements are null, so the first real write re-tags the kind.
        seq.set(2, Value::from(42)).unwrap();
        assert_eq!(seq.kind(), Kind::Number);
        // And from here on the tag is enforced again.
        assert!(seq.append(Value::from("x")).is_err());
    }

    #[test]
    fn test_no_nested_sequences() {
        let mut seq = Sequence::of(Kind::Text);
        let err = seq
            .append(Value::Sequence(Sequence::of(Kind::Text)))
            .unwrap_err();
        assert_eq!(err, SequenceError::Nested);
    }

    #[test]
    fn test_compute_if_absent() {
        let mut seq = Sequence::of(Kind::Text);
        let v = seq
            .compute_if_absent(1, || Value::from("fresh"))
            .unwrap()
            .clone();
        assert_eq!(v, Value::from("fresh"));
        let v = seq
            .compute_if_absent(1, || Value::from("ignored"))
            .unwrap()
            .clone();
        assert_eq!(v, Value::from("fresh"));
    }

    #[test]
    fn test_equality_ignores_kind_and_capacity() {
        let a = Sequence::of_values(Kind::Text, []).unwrap();
        let b = Sequence::of_sized(Kind::Number, 32);
        assert_eq!(a, b);

        let mut c = Sequence::of(Kind::Text);
        c.set(2, Value::from("x")).unwrap();
        let mut d = Sequence::of_sized(Kind::Text, 64);
        d.append(Value::Null).unwrap();
        d.append(Value::Null).unwrap();
        d.append(Value::from("x")).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_to_list_cached_and_invalidated() {
        let mut seq = Sequence::of_values(Kind::Text, ["a", "b"].map(Value::from)).unwrap();
        let first = seq.to_list();
        let second = seq.to_list();
        assert!(Arc::ptr_eq(&first, &second));

        seq.append(Value::from("c")).unwrap();
        let third = seq.to_list();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 3);
    }

    #[test]
    fn test_of_values_copies_input() {
        let input = vec![Value::from("a"), Value::from("b")];
        let seq = Sequence::of_values(Kind::Text, input.clone()).unwrap();
        assert_eq!(seq.len(), 2);
        // The original collection is untouched and unaliased.
        assert_eq!(input.len(), 2);
    }
}
