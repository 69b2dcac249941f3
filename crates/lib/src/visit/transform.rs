//! Rebuilding transforms: key/value remapping and whitelist validation.
//!
//! Both operations rebuild a filtered or remapped copy of a document through
//! the visitor protocol. [`Transformer`] applies caller-supplied rename and
//! value-mapping functions to every entry. [`WhiteList`] admits leaves by
//! declarative [`Rule`]s over dotted simple paths; what happens to a
//! rejected leaf is decided by registered failure handlers and the list's
//! [`FailurePolicy`].

use std::{fmt, sync::Arc};

use bigdecimal::BigDecimal;
use regex::Regex;
use thiserror::Error;

use crate::{
    document::{DocRef, Document, DocumentCore},
    sequence::Sequence,
    value::{Kind, Value},
};

use super::{VisitKey, Visitor, accept};

/// One rejected leaf: where it was, what it looked like, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Full path of the rejected leaf, indexes included.
    pub path: String,
    /// Textual form of the rejected value.
    pub value: String,
    /// Human-readable reason.
    pub reason: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' = '{}': {}", self.path, self.value, self.reason)
    }
}

/// Structured error types for validation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A leaf was rejected under [`FailurePolicy::Fail`].
    #[error("validation failed at {0}")]
    Failed(ValidationFailure),

    /// Rejections gathered under [`FailurePolicy::Collect`].
    #[error("validation collected {} failure(s){}", .0.len(), first_failure(.0))]
    Collected(Vec<ValidationFailure>),

    /// A rule pattern does not compile.
    #[error("invalid pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

fn first_failure(failures: &[ValidationFailure]) -> String {
    match failures.first() {
        Some(failure) => format!(", first at {failure}"),
        None => String::new(),
    }
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        crate::Error::Validation(err)
    }
}

/// What to do with a leaf no rule admits, after any registered failure
/// handlers have run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the transform on the first rejection.
    Fail,
    /// Keep going, dropping rejected leaves and reporting them afterwards.
    Collect,
    /// Silently drop rejected leaves.
    #[default]
    Drop,
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type ValueMap = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A whitelist rule: a full-match pattern over the dotted simple path, plus
/// optional value checks and rewrites applied to admitted leaves.
#[derive(Clone)]
pub struct Rule {
    path: Regex,
    value: Option<Regex>,
    predicate: Option<Predicate>,
    rename: Option<String>,
    map: Option<ValueMap>,
}

fn full_match(pattern: &str) -> Result<Regex, ValidationError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| ValidationError::Pattern {
        pattern: pattern.to_string(),
        source: Box::new(err),
    })
}

impl Rule {
    /// Admits any value whose simple path fully matches `path`.
    pub fn path(path: &str) -> Result<Self, ValidationError> {
        Ok(Rule {
            path: full_match(path)?,
            value: None,
            predicate: None,
            rename: None,
            map: None,
        })
    }

    /// Also requires the leaf's textual form to fully match `value`.
    pub fn matching(mut self, value: &str) -> Result<Self, ValidationError> {
        self.value = Some(full_match(value)?);
        Ok(self)
    }

    /// Also requires `predicate` to hold on the leaf value.
    pub fn admit_if(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Stores admitted leaves under a different terminal name.
    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    /// Rewrites admitted leaf values before storing them.
    pub fn map_value(mut self, map: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.map = Some(Arc::new(map));
        self
    }

    /// Shorthand for [`Rule::path`] + [`Rule::matching`].
    pub fn path_and_value(path: &str, value: &str) -> Result<Self, ValidationError> {
        Rule::path(path)?.matching(value)
    }

    fn covers(&self, simple_path: &str) -> bool {
        self.path.is_match(simple_path)
    }

    fn admits(&self, value: &Value) -> bool {
        let text_ok = match &self.value {
            Some(pattern) => pattern.is_match(&value.to_string()),
            None => true,
        };
        let pred_ok = match &self.predicate {
            Some(pred) => pred(value),
            None => true,
        };
        text_ok && pred_ok
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("path", &self.path.as_str())
            .field("value", &self.value.as_ref().map(Regex::as_str))
            .field("predicate", &self.predicate.is_some())
            .field("rename", &self.rename)
            .field("map", &self.map.is_some())
            .finish()
    }
}

type FailureHandler = Arc<dyn Fn(&ValidationFailure) + Send + Sync>;

/// An ordered set of admission rules, failure handlers, and a rejection
/// policy.
///
/// Handlers run per offending leaf, in registration order, before the
/// policy decides whether the transform aborts, collects, or silently
/// drops.
#[derive(Clone, Default)]
pub struct WhiteList {
    rules: Vec<Rule>,
    handlers: Vec<FailureHandler>,
    policy: FailurePolicy,
}

impl fmt::Debug for WhiteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhiteList")
            .field("rules", &self.rules)
            .field("handlers", &self.handlers.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Result of a whitelist transform: the rebuilt document plus, under
/// [`FailurePolicy::Collect`], everything that was dropped.
#[derive(Debug)]
pub struct Transformed {
    pub document: DocRef,
    pub failures: Vec<ValidationFailure>,
}

impl Transformed {
    /// Treats any collected failure as an error, yielding the document only
    /// when the transform was clean.
    pub fn into_document(self) -> crate::Result<DocRef> {
        if self.failures.is_empty() {
            Ok(self.document)
        } else {
            Err(ValidationError::Collected(self.failures).into())
        }
    }
}

impl WhiteList {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        WhiteList {
            rules: rules.into_iter().collect(),
            handlers: Vec::new(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a handler invoked once per rejected leaf, in registration
    /// order.
    pub fn on_failure(
        mut self,
        handler: impl Fn(&ValidationFailure) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Rebuilds `doc` keeping only admitted leaves. Child documents are
    /// structural: they are rebuilt during descent and pruned afterwards if
    /// filtering emptied them; sequence containers are created lazily so a
    /// fully rejected sequence leaves no husk.
    pub fn transform(&self, doc: &dyn Document) -> crate::Result<Transformed> {
        accept(doc, WhitelistVisitor::new(self))
    }

    /// The first rule covering `simple_path`, if any.
    fn find(&self, simple_path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.covers(simple_path))
    }
}

struct WhitelistVisitor<'a> {
    list: &'a WhiteList,
    root: DocRef,
    stack: Vec<DocRef>,
    /// Sequence awaiting its first admitted element.
    pending_seq: Option<(String, Kind)>,
    failures: Vec<ValidationFailure>,
    failed: Option<ValidationFailure>,
}

impl<'a> WhitelistVisitor<'a> {
    fn new(list: &'a WhiteList) -> Self {
        let root: DocRef = Arc::new(DocumentCore::new());
        WhitelistVisitor {
            list,
            stack: vec![root.clone()],
            root,
            pending_seq: None,
            failures: Vec::new(),
            failed: None,
        }
    }

    fn current(&self) -> &DocRef {
        self.stack.last().unwrap_or(&self.root)
    }

    fn flush_pending_seq(&mut self) -> crate::Result<()> {
        if let Some((name, kind)) = self.pending_seq.take() {
            self.current()
                .add(&name, Value::Sequence(Sequence::of(kind)))?;
        }
        Ok(())
    }

    fn reject(&mut self, key: &VisitKey, value: &Value, reason: String) {
        let failure = ValidationFailure {
            path: key.full_path().to_string(),
            value: value.to_string(),
            reason,
        };
        for handler in &self.list.handlers {
            handler(&failure);
        }
        match self.list.policy {
            FailurePolicy::Fail => self.failed = Some(failure),
            FailurePolicy::Collect => self.failures.push(failure),
            FailurePolicy::Drop => {
                tracing::trace!(failure = %failure, "dropping non-whitelisted value");
            }
        }
    }

    fn leaf(&mut self, key: &VisitKey, value: Value) -> crate::Result<()> {
        let Some(rule) = self.list.find(key.simple_path()) else {
            self.reject(key, &value, "path not whitelisted".to_string());
            return Ok(());
        };
        if !rule.admits(&value) {
            self.reject(key, &value, "value rejected by whitelist".to_string());
            return Ok(());
        }
        // A renamed rule relocates the whole sequence, container included.
        if let Some((name, kind)) = self.pending_seq.take() {
            let seq_name = rule.rename.as_deref().unwrap_or(&name);
            self.current()
                .add(seq_name, Value::Sequence(Sequence::of(kind)))?;
        }
        let value = match &rule.map {
            Some(map) => map(value),
            None => value,
        };
        let target = match (&rule.rename, key.index()) {
            (Some(name), Some(i)) => format!("{name}[{i}]"),
            (Some(name), None) => name.clone(),
            (None, _) => key.element().to_string(),
        };
        self.current().add(&target, value)
    }
}

impl Visitor for WhitelistVisitor<'_> {
    type Output = Transformed;

    fn null_value(&mut self, key: &VisitKey) -> crate::Result<()> {
        self.leaf(key, Value::Null)
    }

    fn text_value(&mut self, key: &VisitKey, value: &str) -> crate::Result<()> {
        self.leaf(key, Value::Text(value.to_string()))
    }

    fn number_value(&mut self, key: &VisitKey, value: &BigDecimal) -> crate::Result<()> {
        self.leaf(key, Value::Number(value.clone()))
    }

    fn bool_value(&mut self, key: &VisitKey, value: bool) -> crate::Result<()> {
        self.leaf(key, Value::Bool(value))
    }

    fn symbol_value(&mut self, key: &VisitKey, name: &str) -> crate::Result<()> {
        self.leaf(key, Value::Symbol(name.to_string()))
    }

    fn begin_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        // A document element materializes its enclosing sequence first.
        self.flush_pending_seq()?;
        let child: DocRef = Arc::new(DocumentCore::new());
        self.current()
            .add(key.element(), Value::Document(child.clone()))?;
        self.stack.push(child);
        Ok(())
    }

    fn end_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        let child = self.stack.pop();
        // Branches whose every leaf was rejected are pruned.
        if child.is_some_and(|c| c.is_empty()) {
            self.current().remove(key.element())?;
        }
        Ok(())
    }

    fn begin_sequence(&mut self, key: &VisitKey, kind: Kind, _len: usize) -> crate::Result<()> {
        self.pending_seq = Some((key.element().to_string(), kind));
        Ok(())
    }

    fn end_sequence(&mut self, _key: &VisitKey) -> crate::Result<()> {
        self.pending_seq = None;
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.failed.is_some()
    }

    fn process(self) -> crate::Result<Transformed> {
        if let Some(failure) = self.failed {
            return Err(ValidationError::Failed(failure).into());
        }
        Ok(Transformed {
            document: self.root,
            failures: self.failures,
        })
    }
}

type KeyMapper = Arc<dyn Fn(&VisitKey) -> Option<String> + Send + Sync>;
type ValueMapper = Arc<dyn Fn(&VisitKey, Value) -> Value + Send + Sync>;

/// Rebuilds a document applying key-rename and value-mapping functions to
/// every entry.
///
/// The rename function returns `Some(new_name)` to rename an entry (sequence
/// elements keep their index under the renamed sequence) or `None` to keep
/// the original. The value mapper sees every leaf.
#[derive(Clone, Default)]
pub struct Transformer {
    rename: Option<KeyMapper>,
    map: Option<ValueMapper>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename_keys(
        mut self,
        rename: impl Fn(&VisitKey) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.rename = Some(Arc::new(rename));
        self
    }

    pub fn map_values(
        mut self,
        map: impl Fn(&VisitKey, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.map = Some(Arc::new(map));
        self
    }

    /// Produces the remapped copy of `doc`.
    pub fn apply(&self, doc: &dyn Document) -> crate::Result<DocRef> {
        accept(doc, TransformVisitor::new(self))
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("rename", &self.rename.is_some())
            .field("map", &self.map.is_some())
            .finish()
    }
}

struct TransformVisitor<'a> {
    t: &'a Transformer,
    root: DocRef,
    stack: Vec<DocRef>,
}

impl<'a> TransformVisitor<'a> {
    fn new(t: &'a Transformer) -> Self {
        let root: DocRef = Arc::new(DocumentCore::new());
        TransformVisitor {
            t,
            stack: vec![root.clone()],
            root,
        }
    }

    fn current(&self) -> &DocRef {
        self.stack.last().unwrap_or(&self.root)
    }

    /// The renamed element, index preserved. The rename function is keyed by
    /// name/path, so every element of one sequence renames consistently.
    fn target_key(&self, key: &VisitKey) -> String {
        let name = self
            .t
            .rename
            .as_ref()
            .and_then(|rename| rename(key))
            .unwrap_or_else(|| key.name().to_string());
        match key.index() {
            Some(i) => format!("{name}[{i}]"),
            None => name,
        }
    }

    fn leaf(&mut self, key: &VisitKey, value: Value) -> crate::Result<()> {
        let value = match &self.t.map {
            Some(map) => map(key, value),
            None => value,
        };
        self.current().add(&self.target_key(key), value)
    }
}

impl Visitor for TransformVisitor<'_> {
    type Output = DocRef;

    fn null_value(&mut self, key: &VisitKey) -> crate::Result<()> {
        self.leaf(key, Value::Null)
    }

    fn text_value(&mut self, key: &VisitKey, value: &str) -> crate::Result<()> {
        self.leaf(key, Value::Text(value.to_string()))
    }

    fn number_value(&mut self, key: &VisitKey, value: &BigDecimal) -> crate::Result<()> {
        self.leaf(key, Value::Number(value.clone()))
    }

    fn bool_value(&mut self, key: &VisitKey, value: bool) -> crate::Result<()> {
        self.leaf(key, Value::Bool(value))
    }

    fn symbol_value(&mut self, key: &VisitKey, name: &str) -> crate::Result<()> {
        self.leaf(key, Value::Symbol(name.to_string()))
    }

    fn begin_child(&mut self, key: &VisitKey) -> crate::Result<()> {
        let child: DocRef = Arc::new(DocumentCore::new());
        self.current()
            .add(&self.target_key(key), Value::Document(child.clone()))?;
        self.stack.push(child);
        Ok(())
    }

    fn end_child(&mut self, _key: &VisitKey) -> crate::Result<()> {
        self.stack.pop();
        Ok(())
    }

    fn begin_sequence(&mut self, key: &VisitKey, kind: Kind, _len: usize) -> crate::Result<()> {
        self.current()
            .add(&self.target_key(key), Value::Sequence(Sequence::of(kind)))
    }

    fn process(self) -> crate::Result<DocRef> {
        Ok(self.root)
    }
}
