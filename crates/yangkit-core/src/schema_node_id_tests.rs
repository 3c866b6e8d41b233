use crate::{QName, QNameModule, SchemaNodeIdentifier};

fn q(local: &str) -> QName {
    QNameModule::new("urn:t", None).bind(local).unwrap()
}

#[test]
fn empty_paths_are_rejected() {
    assert!(SchemaNodeIdentifier::absolute(vec![]).is_err());
    assert!(SchemaNodeIdentifier::descendant(vec![]).is_err());
}

#[test]
fn single_step_is_first_and_last() {
    let id = SchemaNodeIdentifier::absolute(vec![q("only")]).unwrap();
    assert!(id.is_absolute());
    assert_eq!(id.first_node_identifier(), id.last_node_identifier());
    assert_eq!(id.node_identifiers().len(), 1);
}

#[test]
fn display_marks_absolute_paths() {
    let abs = SchemaNodeIdentifier::absolute(vec![q("a"), q("b")]).unwrap();
    insta::assert_snapshot!(abs, @"/(urn:t)a/(urn:t)b");

    let desc = SchemaNodeIdentifier::descendant(vec![q("a"), q("b")]).unwrap();
    insta::assert_snapshot!(desc, @"(urn:t)a/(urn:t)b");
    assert_eq!(desc.first_node_identifier(), &q("a"));
    assert_eq!(desc.last_node_identifier(), &q("b"));
}

#[test]
fn serde_rejects_empty_steps() {
    let abs = SchemaNodeIdentifier::absolute(vec![q("a")]).unwrap();
    let json = serde_json::to_string(&abs).unwrap();
    insta::assert_snapshot!(json, @r#"{"absolute":true,"steps":[{"module":{"namespace":"urn:t","revision":null},"local":"a"}]}"#);

    let back: SchemaNodeIdentifier = serde_json::from_str(&json).unwrap();
    assert_eq!(back, abs);

    let empty = r#"{"absolute":false,"steps":[]}"#;
    assert!(serde_json::from_str::<SchemaNodeIdentifier>(empty).is_err());
}
