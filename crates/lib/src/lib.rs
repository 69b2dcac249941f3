//! In-memory, schema-less, hierarchical document model with path-key
//! addressing.
//!
//! A document is a tree of named values reached through dotted, optionally
//! indexed keys such as `server.hosts[2].name`. Writes materialize missing
//! intermediate nodes; indexed writes land in kind-tagged, sparse-tolerant
//! sequences. Capabilities compose as decorators (unmodifiable,
//! null-filtering, synchronized) that propagate to lazily created children,
//! and a single-pass visitor protocol powers deep copy, merge,
//! coercion-aware equivalence, and whitelist transforms.
//!
//! # Quick start
//!
//! ```
//! use bigdecimal::BigDecimal;
//! use pathdoc::document::{DocumentExt, DocumentFactory};
//!
//! let doc = DocumentFactory::new().create();
//! doc.add_text("server.host", "localhost")?;
//! doc.add_text("server.port", "8080")?;
//! doc.add_texts("server.tags", ["a", "b"])?;
//!
//! // Typed reads coerce where the conversion table allows.
//! assert_eq!(doc.get_number("server.port")?, BigDecimal::from(8080));
//! assert_eq!(doc.get_text("server.tags[1]")?, "b");
//! # Ok::<(), pathdoc::Error>(())
//! ```
//!
//! # Module organization
//!
//! - [`key`]: path-key parsing and the traversal cursor
//! - [`value`]: the [`value::Value`] enum and runtime [`value::Kind`] tags
//! - [`sequence`]: kind-tagged sparse sequences behind `key[i]`
//! - [`structure`]: the insertion-ordered per-level store
//! - [`convert`]: the cross-kind coercion table
//! - [`document`]: the [`document::Document`] trait, core, decorators, and
//!   factory
//! - [`visit`]: the visitor protocol and the operations built on it

pub mod convert;
pub mod document;
pub mod key;
pub mod sequence;
pub mod structure;
pub mod value;
pub mod visit;

pub use document::{DocRef, Document, DocumentExt, DocumentFactory};
pub use value::{Kind, Value};

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The top-level error type, aggregating each module's structured errors.
///
/// Match on the variant (or use the `is_*` helpers) rather than on message
/// text.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path-key parsing errors.
    #[error(transparent)]
    Key(key::KeyError),

    /// Document access and mutation errors.
    #[error(transparent)]
    Doc(document::DocError),

    /// Sequence storage errors.
    #[error(transparent)]
    Sequence(sequence::SequenceError),

    /// Cross-kind coercion errors.
    #[error(transparent)]
    Convert(convert::ConvertError),

    /// Whitelist validation errors.
    #[error(transparent)]
    Validation(visit::ValidationError),

    /// JSON rendering errors.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// The module that produced this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Key(_) => "key",
            Error::Doc(_) => "document",
            Error::Sequence(_) => "sequence",
            Error::Convert(_) => "convert",
            Error::Validation(_) => "validation",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error reports an absent required value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Error::Doc(err) if err.is_missing())
    }

    /// Check if this error reports a value of the wrong kind, whether from
    /// storage or from a failed sequence write.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Doc(err) => err.is_type_mismatch(),
            Error::Sequence(_) => true,
            _ => false,
        }
    }

    /// Check if this error reports a rejected mutation on an unmodifiable
    /// document.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Doc(err) if err.is_unsupported())
    }

    /// Check if this error reports a malformed path key.
    pub fn is_malformed_key(&self) -> bool {
        matches!(self, Error::Key(_))
    }
}
