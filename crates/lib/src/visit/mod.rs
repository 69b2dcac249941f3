//! Single-pass visiting over document trees.
//!
//! [`accept`] drives a [`Visitor`] over every entry of a document in
//! insertion order, descending depth-first through child documents and
//! sequences. The driver's only dependency on the tree is
//! [`Document::entries`], so it observes decorated facades exactly as a
//! caller would.
//!
//! Each callback receives a [`VisitKey`] carrying the entry name, the
//! sequence index if the value sits in a sequence slot, and the full path
//! from the root. Visitors are consumed by [`Visitor::process`], which
//! yields the traversal's result; [`Visitor::is_complete`] lets a visitor
//! stop the traversal early once its answer is settled.
//!
//! The operations built on this protocol live in the submodules:
//! [`copy_document`], [`merge_into`], [`equivalent`], and the
//! whitelist-driven [`transform::WhiteList`].

use std::sync::{Arc, OnceLock};

use bigdecimal::BigDecimal;

use crate::{
    document::Document,
    value::{Kind, Value},
};

mod copy;
mod equivalent;
mod merge;
pub mod transform;

pub use copy::copy_document;
pub(crate) use copy::copy_with_chain;
pub use equivalent::{coercion_eq, equivalent};
pub use merge::{merge_documents, merge_into};
pub use transform::{
    FailurePolicy, Rule, Transformed, Transformer, ValidationError, ValidationFailure, WhiteList,
};

/// The position of one visited value: entry name, optional sequence index,
/// and the chain of ancestors back to the root.
///
/// Path strings are rendered lazily and cached, so visitors that never look
/// at paths pay nothing for them.
#[derive(Debug, Clone)]
pub struct VisitKey {
    name: String,
    index: Option<usize>,
    parent: Option<Arc<VisitKey>>,
    element_cache: OnceLock<String>,
    simple_cache: OnceLock<String>,
    full_cache: OnceLock<String>,
}

impl VisitKey {
    fn child(parent: Option<&Arc<VisitKey>>, name: String) -> Self {
        VisitKey {
            name,
            index: None,
            parent: parent.map(Arc::clone),
            element_cache: OnceLock::new(),
            simple_cache: OnceLock::new(),
            full_cache: OnceLock::new(),
        }
    }

    fn with_index(&self, index: usize) -> Self {
        VisitKey {
            name: self.name.clone(),
            index: Some(index),
            parent: self.parent.clone(),
            element_cache: OnceLock::new(),
            simple_cache: OnceLock::new(),
            full_cache: OnceLock::new(),
        }
    }

    /// The entry name, without any index.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sequence index, when the value occupies a sequence slot.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The key of the enclosing document entry, if any.
    pub fn parent(&self) -> Option<&VisitKey> {
        self.parent.as_deref()
    }

    /// Nesting depth: 0 for root-level entries.
    pub fn depth(&self) -> usize {
        match &self.parent {
            Some(parent) => parent.depth() + 1,
            None => 0,
        }
    }

    /// This element alone, in key syntax: `name` or `name[i]`.
    pub fn element(&self) -> &str {
        self.element_cache.get_or_init(|| match self.index {
            Some(i) => format!("{}[{i}]", self.name),
            None => self.name.clone(),
        })
    }

    /// The dotted path from the root, without indexes.
    pub fn simple_path(&self) -> &str {
        self.simple_cache.get_or_init(|| match &self.parent {
            Some(parent) => format!("{}.{}", parent.simple_path(), self.name),
            None => self.name.clone(),
        })
    }

    /// The dotted path from the root, with indexes.
    pub fn full_path(&self) -> &str {
        self.full_cache.get_or_init(|| match &self.parent {
            Some(parent) => format!("{}.{}", parent.full_path(), self.element()),
            None => self.element().to_string(),
        })
    }
}

/// A single-pass tree consumer.
///
/// All value callbacks default to doing nothing, so a visitor implements
/// only the cases it cares about. The visitor is consumed by
/// [`process`](Visitor::process) once the traversal ends (or completes
/// early).
pub trait Visitor: Sized {
    /// The result of the whole traversal.
    type Output;

    fn null_value(&mut self, key: &VisitKey) -> crate::Result<()> {
        let _ = key;
        Ok(())
    }

    fn text_value(&mut self, key: &VisitKey, value: &str) -> crate::Result<()> {
        let _ = (key, value);
        Ok(())
    }

    fn number_value(&mut self, key: &VisitKey, value: &BigDecimal) -> crate::Result<()> {
        let _ = (key, value);
        Ok(())
    }

    fn bool_value(&mut self, key: &VisitKey, value: bool) -> crate::Result<()> {
        let _ = (key, value);
        Ok(())
    }

    fn symbol_value(&mut self, key: &VisitKey, name: &str) -> crate::Result<()> {
        let _ = (key, name);
        Ok(())
    }

    /// Called before descending into a child document.
    fn begin_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        let _ = key;
        Ok(())
    }

    /// Called after a child document's entries have been visited. Skipped
    /// when the traversal completed early inside the child.
    fn end_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        let _ = key;
        Ok(())
    }

    /// Called before a sequence's elements, which follow as value callbacks
    /// with indexed keys (holes arrive as [`null_value`](Visitor::null_value)).
    fn begin_sequence(&mut self, key: &VisitKey, kind: Kind, len: usize) -> crate::Result<()> {
        let _ = (key, kind, len);
        Ok(())
    }

    fn end_sequence(&mut self, key: &VisitKey) -> crate::Result<()> {
        let _ = key;
        Ok(())
    }

    /// Returns true once the visitor's answer can no longer change; the
    /// driver then stops descending.
    fn is_complete(&self) -> bool {
        false
    }

    /// Consumes the visitor, yielding the traversal result.
    fn process(self) -> crate::Result<Self::Output>;
}

/// Drives `visitor` over `doc` and returns the processed result.
pub fn accept<V: Visitor>(doc: &dyn Document, mut visitor: V) -> crate::Result<V::Output> {
    visit_entries(doc, None, &mut visitor)?;
    visitor.process()
}

fn visit_entries<V: Visitor>(
    doc: &dyn Document,
    parent: Option<&Arc<VisitKey>>,
    visitor: &mut V,
) -> crate::Result<()> {
    for (name, value) in doc.entries() {
        if visitor.is_complete() {
            return Ok(());
        }
        let key = VisitKey::child(parent, name);
        visit_value(&key, &value, visitor)?;
    }
    Ok(())
}

fn visit_value<V: Visitor>(key: &VisitKey, value: &Value, visitor: &mut V) -> crate::Result<()> {
    match value {
        Value::Null => visitor.null_value(key),
        Value::Text(s) => visitor.text_value(key, s),
        Value::Number(n) => visitor.number_value(key, n),
        Value::Bool(b) => visitor.bool_value(key, *b),
        Value::Symbol(name) => visitor.symbol_value(key, name),
        Value::Document(child) => {
            visitor.begin_child(key)?;
            let parent = Arc::new(key.clone());
            visit_entries(child.as_ref(), Some(&parent), visitor)?;
            if !visitor.is_complete() {
                visitor.end_child(key)?;
            }
            Ok(())
        }
        Value::Sequence(seq) => {
            visitor.begin_sequence(key, seq.kind(), seq.len())?;
            for (i, element) in seq.iter().enumerate() {
                if visitor.is_complete() {
                    return Ok(());
                }
                let slot = key.with_index(i);
                visit_value(&slot, element, visitor)?;
            }
            if !visitor.is_complete() {
                visitor.end_sequence(key)?;
            }
            Ok(())
        }
    }
}
