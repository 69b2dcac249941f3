//! End-to-end tests of the visitor-powered operations.

use bigdecimal::BigDecimal;
use pathdoc::{
    DocumentExt, DocumentFactory, Value,
    visit::{
        FailurePolicy, Rule, Transformer, VisitKey, Visitor, WhiteList, accept, copy_document,
        equivalent, merge_documents, merge_into,
    },
};

use crate::helpers::{plain, server_config};

/// Collects the full path of every leaf it sees.
#[derive(Default)]
struct LeafPaths(Vec<String>);

impl Visitor for LeafPaths {
    type Output = Vec<String>;

    fn null_value(&mut self, key: &VisitKey) -> pathdoc::Result<()> {
        self.0.push(key.full_path().to_string());
        Ok(())
    }

    fn text_value(&mut self, key: &VisitKey, _value: &str) -> pathdoc::Result<()> {
        self.0.push(key.full_path().to_string());
        Ok(())
    }

    fn number_value(&mut self, key: &VisitKey, _value: &BigDecimal) -> pathdoc::Result<()> {
        self.0.push(key.full_path().to_string());
        Ok(())
    }

    fn bool_value(&mut self, key: &VisitKey, _value: bool) -> pathdoc::Result<()> {
        self.0.push(key.full_path().to_string());
        Ok(())
    }

    fn process(self) -> pathdoc::Result<Vec<String>> {
        Ok(self.0)
    }
}

#[test]
fn test_custom_visitor_sees_every_leaf_once() {
    let paths = accept(server_config().as_ref(), LeafPaths::default()).unwrap();
    assert_eq!(
        paths,
        [
            "name",
            "limits.max_conn",
            "limits.strict",
            "tags[0]",
            "tags[1]",
            "listeners[0].host",
            "listeners[0].port",
            "listeners[1].host",
            "listeners[1].port",
        ]
    );
}

#[test]
fn test_copy_then_mutate_independently() {
    let source = server_config();
    let copy = copy_document(source.as_ref()).unwrap();
    assert!(copy.structure_eq(source.as_ref()));

    copy.add_text("listeners[0].host", "127.0.0.1").unwrap();
    assert_eq!(source.get_text("listeners[0].host").unwrap(), "0.0.0.0");
}

#[test]
fn test_merge_layered_configuration() {
    // Defaults merged under explicit settings, the usual layering.
    let explicit = plain();
    explicit.add_text("limits.mode", "strict").unwrap();
    explicit.add_number("limits.max_conn", 64).unwrap();

    let defaults = plain();
    defaults.add_number("limits.max_conn", 1024).unwrap();
    defaults.add_number("limits.timeout_ms", 5000).unwrap();
    defaults.add_texts("tags", ["default"]).unwrap();

    merge_into(&explicit, defaults.as_ref()).unwrap();
    assert_eq!(explicit.get_text("limits.mode").unwrap(), "strict");
    assert_eq!(
        explicit.get_number("limits.max_conn").unwrap(),
        BigDecimal::from(64)
    );
    assert_eq!(
        explicit.get_number("limits.timeout_ms").unwrap(),
        BigDecimal::from(5000)
    );
    assert_eq!(explicit.get_texts("tags").unwrap(), ["default"]);
}

#[test]
fn test_equivalence_under_coercion_end_to_end() {
    let typed = plain();
    typed.add_bool("x", true).unwrap();
    typed.add_number("nested.n", 12).unwrap();

    let textual = plain();
    textual.add_text("x", "on").unwrap();
    textual.add_text("nested.n", "12").unwrap();

    assert!(equivalent(&typed, &textual).unwrap());
    assert!(equivalent(&textual, &typed).unwrap());
    assert!(!typed.structure_eq(textual.as_ref()));

    textual.add_text("extra", "no").unwrap();
    assert!(!equivalent(&typed, &textual).unwrap());
}

#[test]
fn test_whitelist_drop_policy_end_to_end() {
    let doc = plain();
    doc.add_text("user.name", "alice").unwrap();
    doc.add_text("user.age", "34").unwrap();
    doc.add_text("user.password", "hunter2").unwrap();

    let list = WhiteList::new([
        Rule::path(r"user\.name").unwrap(),
        Rule::path_and_value(r"user\.age", r"\d+").unwrap(),
    ]);
    let out = list.transform(doc.as_ref()).unwrap();
    assert_eq!(out.document.get_text("user.name").unwrap(), "alice");
    assert_eq!(out.document.get_text("user.age").unwrap(), "34");
    assert!(out.document.opt("user.password").unwrap().is_none());
    assert!(out.failures.is_empty());
}

#[test]
fn test_whitelist_collect_policy_reports_everything_dropped() {
    let doc = plain();
    doc.add_text("keep", "v").unwrap();
    doc.add_texts("nums", ["1", "x", "3"]).unwrap();

    let list = WhiteList::new([
        Rule::path("keep").unwrap(),
        Rule::path_and_value("nums", r"\d+").unwrap(),
    ])
    .with_policy(FailurePolicy::Collect);

    let out = list.transform(doc.as_ref()).unwrap();
    assert_eq!(out.document.get_texts("nums").unwrap(), ["1", "3"]);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].path, "nums[1]");
    assert_eq!(out.failures[0].value, "x");
}

#[test]
fn test_whitelist_fail_policy_stops_at_first_rejection() {
    let doc = plain();
    doc.add_text("a", "ok").unwrap();
    doc.add_text("b", "nope").unwrap();

    let list =
        WhiteList::new([Rule::path("a").unwrap()]).with_policy(FailurePolicy::Fail);
    let err = list.transform(doc.as_ref()).unwrap_err();
    assert!(err.to_string().contains('b'));
}

#[test]
fn test_merge_documents_builds_a_fresh_layered_view() {
    let explicit = plain();
    explicit.add_text("limits.mode", "strict").unwrap();

    let defaults = plain();
    defaults.add_number("limits.timeout_ms", 5000).unwrap();

    let effective = merge_documents(&explicit, defaults.as_ref()).unwrap();
    assert_eq!(effective.get_text("limits.mode").unwrap(), "strict");
    assert_eq!(
        effective.get_number("limits.timeout_ms").unwrap(),
        BigDecimal::from(5000)
    );
    // Neither layer was modified.
    assert!(explicit.opt("limits.timeout_ms").unwrap().is_none());
    assert!(defaults.opt("limits.mode").unwrap().is_none());
}

#[test]
fn test_transformer_normalizes_key_style() {
    let doc = plain();
    doc.add_text("serverName", "edge-1").unwrap();
    doc.add_texts("allowedHosts", ["A.example", "B.example"]).unwrap();

    let out = Transformer::new()
        .rename_keys(|key| match key.name() {
            "serverName" => Some("server_name".to_string()),
            "allowedHosts" => Some("allowed_hosts".to_string()),
            _ => None,
        })
        .map_values(|_key, value| match value {
            Value::Text(s) => Value::Text(s.to_lowercase()),
            other => other,
        })
        .apply(doc.as_ref())
        .unwrap();

    assert_eq!(out.get_text("server_name").unwrap(), "edge-1");
    assert_eq!(
        out.get_texts("allowed_hosts").unwrap(),
        ["a.example", "b.example"]
    );
    assert!(out.opt("serverName").unwrap().is_none());
}

#[test]
fn test_operations_compose_copy_merge_equivalent() {
    let base = server_config();
    let copy = copy_document(base.as_ref()).unwrap();

    let overlay = plain();
    overlay.add_text("region", "eu-west").unwrap();
    merge_into(&copy, overlay.as_ref()).unwrap();

    assert!(!equivalent(&base, &copy).unwrap());
    copy.remove("region").unwrap();
    assert!(equivalent(&base, &copy).unwrap());
}

#[test]
fn test_visitor_observes_decorated_view() {
    // A null-filtering facade wrapped around a document with stored nulls
    // still exposes them through entries(); filtering is a write-side and
    // defaulted-read concern.
    let base = plain();
    base.add("k", Value::Null).unwrap();
    base.add_text("t", "v").unwrap();

    let filtered = DocumentFactory::new().null_filtering().wrap(&base);
    let paths = accept(filtered.as_ref(), LeafPaths::default()).unwrap();
    assert_eq!(paths, ["k", "t"]);
}
