//! Deep copy through the visitor protocol.

use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::{
    document::{Chain, DocRef, Document, DocumentCore},
    sequence::Sequence,
    value::{Kind, Value},
};

use super::{VisitKey, Visitor, accept};

/// Deep-copies a document into a fresh, undecorated tree.
///
/// The copy observes the source through its facade, so filtered or
/// synchronized views copy as seen. Decorator re-application is the job of
/// [`clone_document`](crate::document::clone_document).
pub fn copy_document(doc: &dyn Document) -> crate::Result<DocRef> {
    accept(doc, CopyVisitor::new(Chain::default()))
}

/// Deep copy that rebuilds the whole tree under `chain`: every node of the
/// result, root and descendants alike, carries and wraps with the given
/// stack.
pub(crate) fn copy_with_chain(doc: &dyn Document, chain: Chain) -> crate::Result<DocRef> {
    accept(doc, CopyVisitor::new(chain))
}

/// Rebuilds every visited entry into a parallel tree of documents carrying
/// the visitor's chain.
///
/// Writes go through raw core handles so the copy is faithful even when the
/// chain filters or rejects writes; stored child values are the wrapped
/// facades, matching what deep writes into the original would produce.
/// Sequence containers are created on `begin_sequence` so empty sequences
/// and kind tags survive; elements (holes included) land via indexed adds.
struct CopyVisitor {
    chain: Chain,
    root: DocRef,
    stack: Vec<DocRef>,
}

impl CopyVisitor {
    fn new(chain: Chain) -> Self {
        let root: DocRef = Arc::new(DocumentCore::with_chain(chain.clone()));
        CopyVisitor {
            chain,
            stack: vec![root.clone()],
            root,
        }
    }

    fn current(&self) -> &DocRef {
        // The stack always holds at least the root.
        self.stack.last().unwrap_or(&self.root)
    }

    fn put(&mut self, key: &VisitKey, value: Value) -> crate::Result<()> {
        self.current().add(key.element(), value)
    }
}

impl Visitor for CopyVisitor {
    type Output = DocRef;

    fn null_value(&mut self, key: &VisitKey) -> crate::Result<()> {
        self.put(key, Value::Null)
    }

    fn text_value(&mut self, key: &VisitKey, value: &str) -> crate::Result<()> {
        self.put(key, Value::Text(value.to_string()))
    }

    fn number_value(&mut self, key: &VisitKey, value: &BigDecimal) -> crate::Result<()> {
        self.put(key, Value::Number(value.clone()))
    }

    fn bool_value(&mut self, key: &VisitKey, value: bool) -> crate::Result<()> {
        self.put(key, Value::Bool(value))
    }

    fn symbol_value(&mut self, key: &VisitKey, name: &str) -> crate::Result<()> {
        self.put(key, Value::Symbol(name.to_string()))
    }

    fn begin_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        let core: DocRef = Arc::new(DocumentCore::with_chain(self.chain.clone()));
        let wrapped = self.chain.apply(core.clone());
        self.put(key, Value::Document(wrapped))?;
        // Descend through the raw handle; the facade shares its backing.
        self.stack.push(core);
        Ok(())
    }

    fn end_child(&mut self, _key: &VisitKey) -> crate::Result<()> {
        self.stack.pop();
        Ok(())
    }

    fn begin_sequence(&mut self, key: &VisitKey, kind: Kind, _len: usize) -> crate::Result<()> {
        self.put(key, Value::Sequence(Sequence::of(kind)))
    }

    fn process(self) -> crate::Result<DocRef> {
        Ok(self.chain.apply(self.root))
    }
}
