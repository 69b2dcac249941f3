//! End-to-end document behavior: path addressing, sequences through the
//! document surface, decorator stacks, and cloning.

use bigdecimal::BigDecimal;
use pathdoc::{
    DocumentExt, DocumentFactory, Value,
    document::{DecoratorKind, clone_document, empty},
};

use crate::helpers::{plain, server_config};

#[test]
fn test_build_and_read_back_nested_config() {
    let doc = server_config();
    assert_eq!(doc.get_text("name").unwrap(), "edge-1");
    assert_eq!(
        doc.get_number("limits.max_conn").unwrap(),
        BigDecimal::from(512)
    );
    assert!(doc.get_bool("limits.strict").unwrap());
    assert_eq!(doc.get_texts("tags").unwrap(), ["prod", "eu"]);
    assert_eq!(doc.get_text("listeners[1].host").unwrap(), "::");
    assert_eq!(doc.get_children("listeners").unwrap().len(), 2);
}

#[test]
fn test_sequence_sparsity_through_document_ops() {
    let doc = plain();
    doc.add_texts("list", ["a", "b"]).unwrap();
    doc.append_text("list", "c").unwrap();
    assert!(doc.remove("list[1]").unwrap());

    // Interior removal leaves a counted hole.
    let all = doc.get_all("list").unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], "a");
    assert!(all[1].is_null());
    assert_eq!(all[2], "c");

    // The hole refills in place.
    doc.add_text("list[1]", "B").unwrap();
    assert_eq!(doc.get_texts("list").unwrap(), ["a", "B", "c"]);
}

#[test]
fn test_sparse_write_far_past_end() {
    let doc = plain();
    doc.add_number("seats[0]", 1).unwrap();
    doc.add_number("seats[100]", 2).unwrap();
    let all = doc.get_all("seats").unwrap();
    assert_eq!(all.len(), 101);
    assert!(all[50].is_null());
}

#[test]
fn test_decorator_stack_propagates_to_lazy_children() {
    let doc = DocumentFactory::new()
        .null_filtering()
        .synchronized()
        .create();
    doc.add_text("svc.net.host", "h").unwrap();

    let net = doc.get_child("svc").unwrap().get_child("net").unwrap();
    assert_eq!(
        net.wraps(),
        vec![DecoratorKind::NullFilter, DecoratorKind::Synchronized]
    );
    // Behavior propagates along with the report.
    net.add("dropped", Value::Null).unwrap();
    assert!(!net.contains("dropped").unwrap());
}

#[test]
fn test_unmodifiable_view_over_live_document() {
    let base = server_config();
    let frozen = DocumentFactory::new().unmodifiable().wrap(&base);

    assert!(frozen.add_text("k", "v").unwrap_err().is_unsupported());

    // The view is live: it sees writes made through the unwrapped handle.
    base.add_text("added", "later").unwrap();
    assert_eq!(frozen.get_text("added").unwrap(), "later");
}

#[test]
fn test_empty_is_a_safe_shared_terminal() {
    let e = empty();
    assert!(e.is_empty());
    assert!(e.add_text("x", "y").unwrap_err().is_unsupported());
    assert!(e.opt("anything.at.all").unwrap().is_none());
}

#[test]
fn test_clone_preserves_structure_and_stack() {
    let source = DocumentFactory::new().null_filtering().create();
    source.add_text("a.b.c", "deep").unwrap();
    source.add_texts("seq", ["x", "y"]).unwrap();
    source.remove("seq[0]").unwrap();

    let cloned = clone_document(&source).unwrap();
    assert!(cloned.structure_eq(source.as_ref()));
    assert_eq!(cloned.wraps(), source.wraps());

    // Holes survive the round trip.
    let seq = cloned.get_all("seq").unwrap();
    assert!(seq[0].is_null());
    assert_eq!(seq[1], "y");

    // And the trees are independent afterwards.
    source.add_text("only.source", "1").unwrap();
    assert!(cloned.opt("only.source").unwrap().is_none());
}

#[test]
fn test_error_paths_name_the_failing_location() {
    let doc = plain();
    doc.add_text("net.host", "h").unwrap();

    // Descending through a scalar reports the scalar's own path.
    let err = doc.get("net.host.deeper").unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(err.to_string().contains("net.host"));

    let err = doc.get("net.missing").unwrap_err();
    assert!(err.is_missing());
    assert!(err.to_string().contains("net.missing"));
}

#[test]
fn test_malformed_keys_rejected_uniformly() {
    let doc = plain();
    for key in ["", "a..b", "a[", "a[x]", "a[-1]", "a b"] {
        assert!(
            doc.add(key, Value::from(1)).unwrap_err().is_malformed_key(),
            "add '{key}'"
        );
        assert!(
            doc.opt(key).unwrap_err().is_malformed_key(),
            "opt '{key}'"
        );
    }
}

#[test]
fn test_json_rendering_of_full_tree() {
    let doc = plain();
    doc.add_text("name", "n").unwrap();
    doc.add_texts("seq", ["a"]).unwrap();
    doc.remove("seq[0]").unwrap();
    doc.add_text("seq[1]", "b").unwrap();
    doc.add_bool("child.on", false).unwrap();

    let json = doc.to_json_string().unwrap();
    assert_eq!(json, r#"{"name":"n","seq":[null,"b"],"child":{"on":false}}"#);
}
