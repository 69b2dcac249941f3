//! Shared builders for integration tests.

use pathdoc::{DocRef, DocumentExt, DocumentFactory};

/// A plain, undecorated document.
pub fn plain() -> DocRef {
    DocumentFactory::new().create()
}

/// A small but representative configuration tree: scalars, a nested child,
/// a text sequence, and a sequence of documents.
pub fn server_config() -> DocRef {
    let doc = plain();
    doc.add_text("name", "edge-1").unwrap();
    doc.add_number("limits.max_conn", 512).unwrap();
    doc.add_bool("limits.strict", true).unwrap();
    doc.add_texts("tags", ["prod", "eu"]).unwrap();
    doc.add_text("listeners[0].host", "0.0.0.0").unwrap();
    doc.add_number("listeners[0].port", 80).unwrap();
    doc.add_text("listeners[1].host", "::").unwrap();
    doc.add_number("listeners[1].port", 443).unwrap();
    doc
}
