//! Capability decorators and the constructor chain that propagates them.
//!
//! Each decorator is a facade implementing [`Document`] by delegating to an
//! inner [`DocRef`], adjusting behavior around the delegation. Stacking is
//! plain composition; the [`Chain`] remembers the constructors in factory
//! call order so lazily created children can be rebuilt with an identical
//! stack.

use std::{fmt, sync::Arc};

use parking_lot::{Mutex, RwLock};

use crate::{
    key::PathKey,
    structure::Structure,
    value::Value,
};

use super::{DocError, DocRef, Document};

/// Identity tag for one decorator layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecoratorKind {
    /// Rejects every mutation.
    Unmodifiable,
    /// Drops null writes and maps stored nulls back to read defaults.
    NullFilter,
    /// Serializes every call behind one lock.
    Synchronized,
    /// A user-supplied decorator, identified by name.
    Custom(&'static str),
}

impl fmt::Display for DecoratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorKind::Unmodifiable => f.write_str("unmodifiable"),
            DecoratorKind::NullFilter => f.write_str("null-filter"),
            DecoratorKind::Synchronized => f.write_str("synchronized"),
            DecoratorKind::Custom(name) => f.write_str(name),
        }
    }
}

type Ctor = Arc<dyn Fn(DocRef) -> DocRef + Send + Sync>;

/// Ordered decorator constructors, innermost-applied first.
///
/// The chain lives on the innermost raw document of every facade stack, so
/// any child it materializes inherits the full stack without the decorators
/// cooperating.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<(DecoratorKind, Ctor)>,
}

impl Chain {
    /// Returns a chain extended with one more layer.
    pub fn then(
        mut self,
        kind: DecoratorKind,
        ctor: impl Fn(DocRef) -> DocRef + Send + Sync + 'static,
    ) -> Self {
        self.layers.push((kind, Arc::new(ctor)));
        self
    }

    /// Wraps `doc` with every layer, in order.
    pub fn apply(&self, doc: DocRef) -> DocRef {
        self.layers
            .iter()
            .fold(doc, |inner, (_, ctor)| ctor(inner))
    }

    /// The layer kinds, in application order.
    pub fn kinds(&self) -> Vec<DecoratorKind> {
        self.layers.iter().map(|(kind, _)| kind.clone()).collect()
    }

    /// Returns true if the chain has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Chain").field(&self.kinds()).finish()
    }
}

/// Facade that rejects every mutation with [`DocError::Unsupported`].
#[derive(Debug)]
pub struct Unmodifiable {
    inner: DocRef,
}

impl Unmodifiable {
    pub fn new(inner: DocRef) -> Self {
        Unmodifiable { inner }
    }

    fn reject(&self, operation: &'static str, key: &PathKey) -> crate::Error {
        DocError::Unsupported {
            operation,
            key: key.as_str().to_string(),
        }
        .into()
    }
}

impl Document for Unmodifiable {
    fn add_at(&self, key: PathKey, _value: Value) -> crate::Result<()> {
        Err(self.reject("add", &key))
    }

    fn add_all_at(&self, key: PathKey, _values: Vec<Value>) -> crate::Result<()> {
        Err(self.reject("add_all", &key))
    }

    fn append_at(&self, key: PathKey, _value: Value) -> crate::Result<()> {
        Err(self.reject("append", &key))
    }

    fn opt_at(&self, key: PathKey) -> crate::Result<Option<Value>> {
        self.inner.opt_at(key)
    }

    fn get_or_at(&self, key: PathKey, default: Value) -> crate::Result<Value> {
        self.inner.get_or_at(key, default)
    }

    fn remove_at(&self, key: PathKey) -> crate::Result<bool> {
        Err(self.reject("remove", &key))
    }

    fn entries(&self) -> Vec<(String, Value)> {
        self.inner.entries()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn decorator(&self) -> Option<DecoratorKind> {
        Some(DecoratorKind::Unmodifiable)
    }

    fn inner(&self) -> Option<&DocRef> {
        Some(&self.inner)
    }

    fn chain(&self) -> Chain {
        self.inner.chain()
    }

    fn backing(&self) -> Arc<RwLock<Structure>> {
        self.inner.backing()
    }
}

/// Facade that silently drops null writes and maps stored nulls back to the
/// caller-supplied default on defaulted reads.
///
/// Bulk sequence writes pass through untouched: a null element inside
/// `add_all` is a legitimate hole, not a dropped write.
#[derive(Debug)]
pub struct NullFilter {
    inner: DocRef,
}

impl NullFilter {
    pub fn new(inner: DocRef) -> Self {
        NullFilter { inner }
    }
}

impl Document for NullFilter {
    fn add_at(&self, key: PathKey, value: Value) -> crate::Result<()> {
        if value.is_null() {
            tracing::trace!(key = %key, "dropping null add");
            return Ok(());
        }
        self.inner.add_at(key, value)
    }

    fn add_all_at(&self, key: PathKey, values: Vec<Value>) -> crate::Result<()> {
        self.inner.add_all_at(key, values)
    }

    fn append_at(&self, key: PathKey, value: Value) -> crate::Result<()> {
        if value.is_null() {
            tracing::trace!(key = %key, "dropping null append");
            return Ok(());
        }
        self.inner.append_at(key, value)
    }

    fn opt_at(&self, key: PathKey) -> crate::Result<Option<Value>> {
        self.inner.opt_at(key)
    }

    fn get_or_at(&self, key: PathKey, default: Value) -> crate::Result<Value> {
        match self.inner.opt_at(key)? {
            Some(value) if !value.is_null() => Ok(value),
            _ => Ok(default),
        }
    }

    fn remove_at(&self, key: PathKey) -> crate::Result<bool> {
        self.inner.remove_at(key)
    }

    fn entries(&self) -> Vec<(String, Value)> {
        self.inner.entries()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn decorator(&self) -> Option<DecoratorKind> {
        Some(DecoratorKind::NullFilter)
    }

    fn inner(&self) -> Option<&DocRef> {
        Some(&self.inner)
    }

    fn chain(&self) -> Chain {
        self.inner.chain()
    }

    fn backing(&self) -> Arc<RwLock<Structure>> {
        self.inner.backing()
    }
}

/// Facade holding one mutual-exclusion lock for each call's duration.
///
/// The lock belongs to this facade, not the backing store: two synchronized
/// facades wrapping the same document do not exclude each other.
#[derive(Debug)]
pub struct Synchronized {
    inner: DocRef,
    lock: Mutex<()>,
}

impl Synchronized {
    pub fn new(inner: DocRef) -> Self {
        Synchronized {
            inner,
            lock: Mutex::new(()),
        }
    }
}

impl Document for Synchronized {
    fn add_at(&self, key: PathKey, value: Value) -> crate::Result<()> {
        let _guard = self.lock.lock();
        self.inner.add_at(key, value)
    }

    fn add_all_at(&self, key: PathKey, values: Vec<Value>) -> crate::Result<()> {
        let _guard = self.lock.lock();
        self.inner.add_all_at(key, values)
    }

    fn append_at(&self, key: PathKey, value: Value) -> crate::Result<()> {
        let _guard = self.lock.lock();
        self.inner.append_at(key, value)
    }

    fn opt_at(&self, key: PathKey) -> crate::Result<Option<Value>> {
        let _guard = self.lock.lock();
        self.inner.opt_at(key)
    }

    fn get_or_at(&self, key: PathKey, default: Value) -> crate::Result<Value> {
        let _guard = self.lock.lock();
        self.inner.get_or_at(key, default)
    }

    fn remove_at(&self, key: PathKey) -> crate::Result<bool> {
        let _guard = self.lock.lock();
        self.inner.remove_at(key)
    }

    fn entries(&self) -> Vec<(String, Value)> {
        let _guard = self.lock.lock();
        self.inner.entries()
    }

    fn len(&self) -> usize {
        let _guard = self.lock.lock();
        self.inner.len()
    }

    fn decorator(&self) -> Option<DecoratorKind> {
        Some(DecoratorKind::Synchronized)
    }

    fn inner(&self) -> Option<&DocRef> {
        Some(&self.inner)
    }

    fn chain(&self) -> Chain {
        self.inner.chain()
    }

    fn backing(&self) -> Arc<RwLock<Structure>> {
        self.inner.backing()
    }
}
