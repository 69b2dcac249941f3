//! Structural merge through the visitor protocol.

use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::{
    document::{DocRef, Document, DocumentCore},
    sequence::Sequence,
    value::{Kind, Value},
};

use super::{VisitKey, Visitor, accept};

/// Merges `source` into `target`, preferring the target on collisions.
///
/// - A key absent from the target is copied over, subtrees included.
/// - A scalar or sequence already present in the target is kept as is;
///   sequences never merge element-by-element.
/// - Two documents under the same key merge recursively.
///
/// Children materialized in the target are built through the target's own
/// decorator chain.
pub fn merge_into(target: &DocRef, source: &dyn Document) -> crate::Result<()> {
    accept(source, MergeVisitor::new(target.clone()))
}

/// Non-destructive form of [`merge_into`]: duplicates `receiver` and merges
/// `source` into the duplicate, leaving both inputs untouched.
pub fn merge_documents(receiver: &DocRef, source: &dyn Document) -> crate::Result<DocRef> {
    let merged = crate::document::clone_document(receiver)?;
    merge_into(&merged, source)?;
    Ok(merged)
}

struct MergeVisitor {
    root: DocRef,
    stack: Vec<DocRef>,
    /// Depth of the subtree currently being skipped because the target
    /// already owns that location. Zero means merging normally.
    skip: usize,
}

impl MergeVisitor {
    fn new(target: DocRef) -> Self {
        MergeVisitor {
            stack: vec![target.clone()],
            root: target,
            skip: 0,
        }
    }

    fn current(&self) -> &DocRef {
        self.stack.last().unwrap_or(&self.root)
    }

    /// Copies a leaf unless the target already holds a non-null value there.
    fn put(&mut self, key: &VisitKey, value: Value) -> crate::Result<()> {
        if self.skip > 0 {
            return Ok(());
        }
        let current = self.current().clone();
        match current.opt(key.element())? {
            Some(existing) if !existing.is_null() => {
                tracing::trace!(key = key.full_path(), "merge keeps existing value");
                Ok(())
            }
            _ => current.add(key.element(), value),
        }
    }
}

impl Visitor for MergeVisitor {
    type Output = ();

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
        if self.skip > 0 {
            self.skip += 1;
            return Ok(());
        }
        let current = self.current().clone();
        match current.opt(key.element())? {
            Some(Value::Document(existing)) => {
                self.stack.push(existing);
                Ok(())
            }
            Some(existing) if !existing.is_null() => {
                // Kind collision: the target's value wins wholesale.
                tracing::debug!(
                    key = key.full_path(),
                    target = existing.type_name(),
                    "merge skips document over non-document"
                );
                self.skip = 1;
                Ok(())
            }
            _ => {
                let chain = current.chain();
                let fresh: DocRef = Arc::new(DocumentCore::with_chain(chain.clone()));
                let child = chain.apply(fresh);
                current.add(key.element(), Value::Document(child.clone()))?;
                self.stack.push(child);
                Ok(())
            }
        }
    }

    fn end_child(&mut self, _key: &VisitKey) -> crate::Result<()> {
        if self.skip > 0 {
            self.skip -= 1;
        } else {
            self.stack.pop();
        }
        Ok(())
    }

    fn begin_sequence(&mut self, key: &VisitKey, kind: Kind, _len: usize) -> crate::Result<()> {
        if self.skip > 0 {
            self.skip += 1;
            return Ok(());
        }
        let current = self.current().clone();
        match current.opt(key.element())? {
            Some(existing) if !existing.is_null() => {
                tracing::trace!(key = key.full_path(), "merge keeps existing sequence");
                self.skip = 1;
                Ok(())
            }
            _ => {
                current.add(key.element(), Value::Sequence(Sequence::of(kind)))?;
                Ok(())
            }
        }
    }

    fn end_sequence(&mut self, _key: &VisitKey) -> crate::Result<()> {
        if self.skip > 0 {
            self.skip -= 1;
        }
        Ok(())
    }

    fn process(self) -> crate::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentExt, DocumentFactory};

    fn doc() -> DocRef {
        DocumentFactory::new().create()
    }

    #[test]
    fn test_merge_fills_gaps_and_keeps_existing() {
        let target = doc();
        target.add_text("host", "kept").unwrap();
        let source = doc();
        source.add_text("host", "ignored").unwrap();
        source.add_number("port", 9090).unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        assert_eq!(target.get_text("host").unwrap(), "kept");
        assert_eq!(target.get_number("port").unwrap(), BigDecimal::from(9090));
    }

    #[test]
    fn test_merge_recurses_into_shared_children() {
        let target = doc();
        target.add_text("db.user", "alice").unwrap();
        let source = doc();
        source.add_text("db.user", "bob").unwrap();
        source.add_text("db.pass", "secret").unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        assert_eq!(target.get_text("db.user").unwrap(), "alice");
        assert_eq!(target.get_text("db.pass").unwrap(), "secret");
    }

    #[test]
    fn test_merge_never_splices_sequences() {
        let target = doc();
        target.add_texts("tags", ["a"]).unwrap();
        let source = doc();
        source.add_texts("tags", ["b", "c"]).unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        assert_eq!(target.get_texts("tags").unwrap(), ["a"]);
    }

    #[test]
    fn test_merge_copies_missing_subtree() {
        let target = doc();
        let source = doc();
        source.add_text("deep.nested.leaf", "v").unwrap();
        source.add_texts("deep.list", ["x", "y"]).unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        assert_eq!(target.get_text("deep.nested.leaf").unwrap(), "v");
        assert_eq!(target.get_texts("deep.list").unwrap(), ["x", "y"]);
    }

    #[test]
    fn test_merge_kind_collision_keeps_target_subtree() {
        let target = doc();
        target.add_text("node", "scalar").unwrap();
        let source = doc();
        source.add_text("node.inner", "doc").unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        assert_eq!(target.get_text("node").unwrap(), "scalar");
    }

    #[test]
    fn test_merge_materializes_through_target_chain() {
        let target = DocumentFactory::new().null_filtering().create();
        let source = doc();
        source.add_text("child.k", "v").unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        let child = target.get_child("child").unwrap();
        assert_eq!(child.wraps(), target.wraps());
    }

    #[test]
    fn test_merge_documents_leaves_inputs_untouched() {
        let receiver = doc();
        receiver.add_text("host", "kept").unwrap();
        let source = doc();
        source.add_text("host", "ignored").unwrap();
        source.add_number("port", 9090).unwrap();

        let merged = merge_documents(&receiver, source.as_ref()).unwrap();
        assert_eq!(merged.get_text("host").unwrap(), "kept");
        assert_eq!(merged.get_number("port").unwrap(), BigDecimal::from(9090));
        assert!(receiver.opt("port").unwrap().is_none());
        assert_eq!(source.get_text("host").unwrap(), "ignored");
    }

    #[test]
    fn test_merge_overwrites_explicit_null() {
        let target = doc();
        target.add("k", Value::Null).unwrap();
        let source = doc();
        source.add_text("k", "v").unwrap();

        merge_into(&target, source.as_ref()).unwrap();
        assert_eq!(target.get_text("k").unwrap(), "v");
    }
}
