//! Document core, decorator composition, and the fluent factory.
//!
//! The [`Document`] trait is the public contract of one tree node: every
//! read and write goes through it, whether the node is a raw
//! [`DocumentCore`] or a decorated facade. Handles are shared as
//! [`DocRef`] (`Arc<dyn Document>`), which is also how child documents are
//! stored inside their parent's structure — descent always re-enters the
//! child through its public interface, so a decorated child's own semantics
//! govern deeper access.
//!
//! Decorators compose through a [`Chain`] of constructor functions carried
//! on the innermost raw document. Any child materialized during a write is
//! rebuilt through the same chain, which keeps a whole tree consistent with
//! its root's capability stack without any decorator knowing about child
//! creation.
//!
//! # Usage
//!
//! ```
//! use pathdoc::document::{DocumentExt, DocumentFactory};
//!
//! let doc = DocumentFactory::new().null_filtering().create();
//! doc.add_text("server.host", "localhost")?;
//! doc.add_number("server.port", 8080)?;
//! assert_eq!(doc.get_text("server.host")?, "localhost");
//!
//! // The lazily created "server" child carries the same stack.
//! let child = doc.get_child("server")?;
//! assert_eq!(child.wraps(), doc.wraps());
//! # Ok::<(), pathdoc::Error>(())
//! ```

use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use parking_lot::RwLock;
use thiserror::Error;

use crate::{
    key::PathKey,
    structure::Structure,
    value::Value,
};

pub mod decorator;
mod ext;
mod walk;


pub use decorator::{Chain, DecoratorKind, NullFilter, Synchronized, Unmodifiable};
pub use ext::DocumentExt;

/// Shared handle to a document facade.
pub type DocRef = Arc<dyn Document>;

/// Structured error types for document operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DocError {
    /// A location held the wrong kind of value for the requested operation.
    #[error("type mismatch at '{key}': expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// A required value was absent or null.
    #[error("missing required value at '{key}'")]
    Missing { key: String },

    /// A mutating call reached an unmodifiable document.
    #[error("unsupported operation '{operation}' on unmodifiable document (key '{key}')")]
    Unsupported { operation: &'static str, key: String },
}

impl DocError {
    /// Check if this error is a type mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, DocError::TypeMismatch { .. })
    }

    /// Check if this error reports an absent or null value.
    pub fn is_missing(&self) -> bool {
        matches!(self, DocError::Missing { .. })
    }

    /// Check if this error reports a rejected mutation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DocError::Unsupported { .. })
    }

    /// Get the failing key.
    pub fn key(&self) -> &str {
        match self {
            DocError::TypeMismatch { key, .. }
            | DocError::Missing { key }
            | DocError::Unsupported { key, .. } => key,
        }
    }
}

impl From<DocError> for crate::Error {
    fn from(err: DocError) -> Self {
        crate::Error::Doc(err)
    }
}

/// The public contract of one document node.
///
/// The `*_at` methods take a [`PathKey`] cursor so that descent can recurse
/// through a child's facade while error messages keep referencing the
/// original full key. The string-keyed counterparts are provided methods
/// that parse and delegate.
///
/// Mutating a plain document from multiple threads is serialized only at the
/// storage-cell level; whole-operation exclusion is the job of the
/// [`Synchronized`] decorator.
pub trait Document: Send + Sync + fmt::Debug {
    /// Sets `value` at the key, materializing missing intermediate nodes.
    fn add_at(&self, key: PathKey, value: Value) -> crate::Result<()>;

    /// Replaces (or creates) the sequence at the key with the given values.
    fn add_all_at(&self, key: PathKey, values: Vec<Value>) -> crate::Result<()>;

    /// Appends `value` to the sequence at the key, creating a one-element
    /// sequence if none exists.
    fn append_at(&self, key: PathKey, value: Value) -> crate::Result<()>;

    /// Gets the value at the key, or `None` when the location is absent.
    fn opt_at(&self, key: PathKey) -> crate::Result<Option<Value>>;

    /// Gets the value at the key, or the caller-supplied default when the
    /// location is absent. Decorators may widen what counts as absent.
    fn get_or_at(&self, key: PathKey, default: Value) -> crate::Result<Value>;

    /// Removes the value at the key. Returns whether anything was removed.
    fn remove_at(&self, key: PathKey) -> crate::Result<bool>;

    /// One-level snapshot of this node's entries, in insertion order. This
    /// is the visitor driver's only hook into the tree.
    fn entries(&self) -> Vec<(String, Value)>;

    /// Number of entries at this level.
    fn len(&self) -> usize;

    /// Returns true if this level has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The decorator kind of this facade, or `None` for a raw document.
    fn decorator(&self) -> Option<DecoratorKind> {
        None
    }

    /// The wrapped facade this one delegates to, or `None` for a raw
    /// document.
    fn inner(&self) -> Option<&DocRef> {
        None
    }

    /// The composed decorator-constructor chain carried by the innermost raw
    /// document.
    fn chain(&self) -> Chain;

    /// The backing storage cell. Facades wrapping the same document share
    /// one cell.
    fn backing(&self) -> Arc<RwLock<Structure>>;

    // ---- provided: string-keyed conveniences ----

    /// Sets `value` at a path key given in external text form.
    fn add(&self, key: &str, value: Value) -> crate::Result<()> {
        self.add_at(PathKey::parse(key)?, value)
    }

    /// Replaces (or creates) the sequence at the key with the given values.
    fn add_all(&self, key: &str, values: Vec<Value>) -> crate::Result<()> {
        self.add_all_at(PathKey::parse(key)?, values)
    }

    /// Appends `value` to the sequence at the key.
    fn append(&self, key: &str, value: Value) -> crate::Result<()> {
        self.append_at(PathKey::parse(key)?, value)
    }

    /// Gets the value at the key, or `None` when absent.
    fn opt(&self, key: &str) -> crate::Result<Option<Value>> {
        self.opt_at(PathKey::parse(key)?)
    }

    /// Gets the value at the key; absent or null fails with
    /// [`DocError::Missing`].
    fn get(&self, key: &str) -> crate::Result<Value> {
        match self.opt_at(PathKey::parse(key)?)? {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(DocError::Missing {
                key: key.to_string(),
            }
            .into()),
        }
    }

    /// Gets the value at the key, or the default when absent.
    fn get_or(&self, key: &str, default: Value) -> crate::Result<Value> {
        self.get_or_at(PathKey::parse(key)?, default)
    }

    /// Gets all elements of the sequence at the key, holes included as
    /// nulls.
    fn get_all(&self, key: &str) -> crate::Result<Vec<Value>> {
        match self.opt_at(PathKey::parse(key)?)? {
            Some(Value::Sequence(seq)) => Ok(seq.to_list().as_ref().clone()),
            Some(other) => Err(DocError::TypeMismatch {
                key: key.to_string(),
                expected: "sequence".to_string(),
                actual: other.type_name().to_string(),
            }
            .into()),
            None => Err(DocError::Missing {
                key: key.to_string(),
            }
            .into()),
        }
    }

    /// Returns true if the key addresses a present location.
    fn contains(&self, key: &str) -> crate::Result<bool> {
        Ok(self.opt_at(PathKey::parse(key)?)?.is_some())
    }

    /// Removes the value at the key. Returns whether anything was removed.
    fn remove(&self, key: &str) -> crate::Result<bool> {
        self.remove_at(PathKey::parse(key)?)
    }

    // ---- provided: decorator-stack queries ----

    /// The ordered decorator stack of this facade, innermost-applied first
    /// (i.e. in factory call order, outermost created last).
    fn wraps(&self) -> Vec<DecoratorKind> {
        let mut stack = match self.inner() {
            Some(inner) => inner.wraps(),
            None => Vec::new(),
        };
        if let Some(kind) = self.decorator() {
            stack.push(kind);
        }
        stack
    }

    /// Returns true if any facade in the stack is of the given kind.
    fn has_wrapper(&self, kind: &DecoratorKind) -> bool {
        self.decorator().as_ref() == Some(kind)
            || self.inner().is_some_and(|inner| inner.has_wrapper(kind))
    }

    /// Deep structural equality under exact kind. Decorators never
    /// participate: a plain document equals a decorated facade over
    /// identical data.
    fn structure_eq(&self, other: &dyn Document) -> bool {
        let a = self.backing();
        let b = other.backing();
        if Arc::ptr_eq(&a, &b) {
            return true;
        }
        let a = a.read();
        let b = b.read();
        *a == *b
    }
}

/// The raw, mutable document node: one owned [`Structure`] plus the
/// decorator-constructor chain used to wrap lazily created children.
pub struct DocumentCore {
    structure: Arc<RwLock<Structure>>,
    chain: Chain,
}

impl DocumentCore {
    /// Creates an empty, undecorated document.
    pub fn new() -> Self {
        Self::with_chain(Chain::default())
    }

    pub(crate) fn with_chain(chain: Chain) -> Self {
        DocumentCore {
            structure: Arc::new(RwLock::new(Structure::new())),
            chain,
        }
    }

    pub(crate) fn sharing(structure: Arc<RwLock<Structure>>, chain: Chain) -> Self {
        DocumentCore { structure, chain }
    }

    /// Builds a fresh child document wrapped with the same stack as this
    /// one. The walker calls this while materializing missing path elements.
    fn spawn_child(&self) -> DocRef {
        tracing::trace!(stack = ?self.chain.kinds(), "materializing child document");
        let raw: DocRef = Arc::new(DocumentCore::with_chain(self.chain.clone()));
        self.chain.apply(raw)
    }
}

impl Default for DocumentCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCore")
            .field("structure", &*self.structure.read())
            .field("chain", &self.chain)
            .finish()
    }
}

/// Fluent, order-significant factory for documents.
///
/// Each wrap step composes its constructor onto the chain; `create()` builds
/// an empty raw document carrying the chain and applies every wrapper in
/// call order (the first requested decorator is the innermost).
///
/// ```
/// use pathdoc::document::{DecoratorKind, DocumentFactory};
///
/// let doc = DocumentFactory::new().null_filtering().synchronized().create();
/// assert_eq!(
///     doc.wraps(),
///     vec![DecoratorKind::NullFilter, DecoratorKind::Synchronized]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentFactory {
    chain: Chain,
}

impl DocumentFactory {
    /// Starts a factory producing plain mutable documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the unmodifiable decorator: every mutating call fails with
    /// [`DocError::Unsupported`].
    pub fn unmodifiable(self) -> Self {
        self.wrapped(DecoratorKind::Unmodifiable, |inner| {
            Arc::new(Unmodifiable::new(inner))
        })
    }

    /// Adds the null-filtering decorator: null writes are silently dropped
    /// and defaulted reads map stored nulls back to the default.
    pub fn null_filtering(self) -> Self {
        self.wrapped(DecoratorKind::NullFilter, |inner| {
            Arc::new(NullFilter::new(inner))
        })
    }

    /// Adds the synchronized decorator: one mutual-exclusion lock held for
    /// each call's duration.
    pub fn synchronized(self) -> Self {
        self.wrapped(DecoratorKind::Synchronized, |inner| {
            Arc::new(Synchronized::new(inner))
        })
    }

    /// Adds a user-defined decorator.
    pub fn wrapped(
        mut self,
        kind: DecoratorKind,
        ctor: impl Fn(DocRef) -> DocRef + Send + Sync + 'static,
    ) -> Self {
        self.chain = self.chain.then(kind, ctor);
        self
    }

    /// Creates an empty document wrapped with the requested stack.
    pub fn create(&self) -> DocRef {
        let raw: DocRef = Arc::new(DocumentCore::with_chain(self.chain.clone()));
        self.chain.apply(raw)
    }

    /// Wraps an existing document, sharing its backing structure: two
    /// facades, one owned store, both observing each other's mutations.
    /// Callers are responsible for not mutating concurrently through both
    /// facades without external synchronization.
    pub fn wrap(&self, existing: &DocRef) -> DocRef {
        let raw: DocRef = Arc::new(DocumentCore::sharing(
            existing.backing(),
            self.chain.clone(),
        ));
        self.chain.apply(raw)
    }
}

static EMPTY: LazyLock<DocRef> = LazyLock::new(|| DocumentFactory::new().unmodifiable().create());

/// The process-wide immutable empty document. Safe to alias anywhere: it
/// rejects all writes.
pub fn empty() -> DocRef {
    Arc::clone(&EMPTY)
}

/// Deep-copies a document through the visitor protocol, rebuilding every
/// node under the source's decorator chain.
///
/// The result is structurally independent of the source and
/// decorator-for-decorator identical to it, children included: a child of
/// the clone behaves exactly like the corresponding child of the source.
pub fn clone_document(doc: &DocRef) -> crate::Result<DocRef> {
    crate::visit::copy_with_chain(doc.as_ref(), doc.chain())
}
