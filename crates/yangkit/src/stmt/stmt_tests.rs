use indoc::indoc;
use rowan::TextRange;
use yangkit_core::{QName, QNameModule, YangVersion};

use super::*;
use crate::diagnostics::{Diagnostics, Span};
use crate::parser::parse;
use crate::source_map::SourceId;

struct Prefixes;

impl PrefixResolver for Prefixes {
    fn resolve_prefix(&self, prefix: &str) -> Option<QNameModule> {
        match prefix {
            "t" => Some(QNameModule::new("urn:t", None)),
            "o" => Some(QNameModule::new("urn:o", None)),
            _ => None,
        }
    }

    fn default_module(&self) -> QNameModule {
        QNameModule::new("urn:t", None)
    }
}

#[track_caller]
fn arg(kind: ArgumentKind, raw: &str) -> Argument {
    parse_argument(kind, raw, YangVersion::V1_1, &Prefixes).unwrap()
}

#[track_caller]
fn arg_error(kind: ArgumentKind, raw: &str) -> String {
    parse_argument(kind, raw, YangVersion::V1_1, &Prefixes)
        .unwrap_err()
        .to_string()
}

fn qname(ns: &str, local: &str) -> QName {
    QNameModule::new(ns, None).bind(local).unwrap()
}

fn span() -> Span {
    Span::new(SourceId::default(), TextRange::default())
}

#[test]
fn keyword_lookup_round_trips() {
    for keyword in Keyword::ALL {
        assert_eq!(Keyword::lookup(keyword.as_str()), Some(*keyword));
    }
    assert_eq!(Keyword::lookup("leaf-list"), Some(Keyword::LeafList));
    assert_eq!(Keyword::lookup("contaner"), None);
}

#[test]
fn keyword_classification() {
    assert!(Keyword::Choice.is_schema_node());
    assert!(!Keyword::Choice.is_data_node());
    assert!(Keyword::Input.is_data_node());
    assert!(Keyword::Augment.is_data_tree_aware());
    assert!(!Keyword::Grouping.is_data_tree_aware());
    assert!(Keyword::Grouping.is_schema_tree_aware());
    assert!(!Keyword::Leaf.is_schema_tree_aware());
    assert!(Keyword::Choice.is_shorthand_case());
    assert!(!Keyword::Case.is_shorthand_case());
}

#[test]
fn identifiers_bind_to_default_module() {
    assert_eq!(
        arg(ArgumentKind::Identifier, "top"),
        Argument::Identifier(qname("urn:t", "top"))
    );
    assert_eq!(
        arg(ArgumentKind::Reference, "o:grp"),
        Argument::Reference(qname("urn:o", "grp"))
    );
    insta::assert_snapshot!(arg_error(ArgumentKind::Identifier, "9lives"), @"`9lives` is not a valid identifier");
}

#[test]
fn unbound_prefix_is_reported_separately() {
    let err = parse_argument(ArgumentKind::Reference, "x:grp", YangVersion::V1_1, &Prefixes);
    assert_eq!(err, Err(ArgumentError::UnboundPrefix("x".to_string())));
}

#[test]
fn type_arguments_distinguish_builtins() {
    assert!(matches!(
        arg(ArgumentKind::TypeRef, "uint8"),
        Argument::Type(TypeRef::Builtin(_))
    ));
    assert_eq!(
        arg(ArgumentKind::TypeRef, "o:percent"),
        Argument::Type(TypeRef::Derived(qname("urn:o", "percent")))
    );
}

#[test]
fn scalar_arguments() {
    assert_eq!(arg(ArgumentKind::Boolean, "false"), Argument::Boolean(false));
    assert_eq!(arg(ArgumentKind::MaxElements, "unbounded"), Argument::MaxElements(None));
    assert_eq!(arg(ArgumentKind::MaxElements, "10"), Argument::MaxElements(Some(10)));
    assert_eq!(arg(ArgumentKind::Integer, "-5"), Argument::Integer(-5));
    assert_eq!(
        arg(ArgumentKind::OrderedBy, "user"),
        Argument::OrderedBy(OrderedBy::User)
    );
    assert_eq!(
        arg(ArgumentKind::Deviate, "not-supported"),
        Argument::Deviate(DeviateKind::NotSupported)
    );

    insta::assert_snapshot!(arg_error(ArgumentKind::Boolean, "yes"), @"`yes` is not `true` or `false`");
    insta::assert_snapshot!(arg_error(ArgumentKind::MaxElements, "0"), @"max-elements must be positive");
    insta::assert_snapshot!(arg_error(ArgumentKind::FractionDigits, "19"), @"fraction-digits 19 is outside the range 1..18");
    insta::assert_snapshot!(arg_error(ArgumentKind::Version, "2"), @"unsupported yang-version `2`");
    insta::assert_snapshot!(arg_error(ArgumentKind::Revision, "2024-13-01"), @"`2024-13-01` is not a valid revision date");
}

#[test]
fn key_lists_split_on_whitespace() {
    assert_eq!(
        arg(ArgumentKind::Keys, "name  o:id"),
        Argument::Keys(vec![qname("urn:t", "name"), qname("urn:o", "id")])
    );
    insta::assert_snapshot!(arg_error(ArgumentKind::Keys, "  "), @"key statement names no leaves");
}

#[test]
fn schema_node_ids() {
    let Argument::SchemaNodeId(absolute) = arg(ArgumentKind::SchemaNodeId, "/o:top/o:inner") else {
        panic!("expected schema node id");
    };
    assert!(absolute.is_absolute());
    insta::assert_snapshot!(absolute, @"/(urn:o)top/(urn:o)inner");

    let Argument::SchemaNodeId(descendant) = arg(ArgumentKind::SchemaNodeId, "inner/leaf") else {
        panic!("expected schema node id");
    };
    assert!(!descendant.is_absolute());
    insta::assert_snapshot!(descendant, @"(urn:t)inner/(urn:t)leaf");
}

#[test]
fn if_feature_expressions() {
    let Argument::IfFeature(expr) = arg(ArgumentKind::IfFeature, "a or b and not (o:c)") else {
        panic!("expected if-feature");
    };
    let names: Vec<String> = expr.features().iter().map(|q| q.to_string()).collect();
    insta::assert_snapshot!(names.join(" "), @"(urn:t)a (urn:t)b (urn:o)c");

    let a = qname("urn:t", "a");
    let b = qname("urn:t", "b");
    assert!(expr.evaluate(&|q: &QName| *q == a));
    assert!(expr.evaluate(&|q: &QName| *q == b));
    assert!(!expr.evaluate(&|_: &QName| false));
    assert!(!expr.evaluate(&|q: &QName| *q != a));
}

#[test]
fn if_feature_expressions_require_yang_1_1() {
    let err = IfFeatureExpr::parse("a and b", YangVersion::V1, &Prefixes).unwrap_err();
    insta::assert_snapshot!(err, @"`a and b` is not a valid YANG identifier");
    assert!(IfFeatureExpr::parse("a", YangVersion::V1, &Prefixes).is_ok());

    let err = IfFeatureExpr::parse("a and", YangVersion::V1_1, &Prefixes).unwrap_err();
    insta::assert_snapshot!(err, @"if-feature expression ends unexpectedly");
    let err = IfFeatureExpr::parse("(a or b", YangVersion::V1_1, &Prefixes).unwrap_err();
    insta::assert_snapshot!(err, @"if-feature expression ends unexpectedly");
}

#[test]
fn lowering_drops_unknown_keywords_and_keeps_extensions() {
    let source = indoc! {r#"
    module m {
      contaner c;
      ext:marker "x" { description "d"; }
      leaf l;
    }
    "#};
    let parsed = parse(source, SourceId::default(), None, None).unwrap();
    assert!(parsed.diagnostics.is_empty());

    let mut tree = StmtTree::new();
    let mut diagnostics = Diagnostics::new();
    let root = lower_source(&parsed.root, SourceId::default(), &mut tree, &mut diagnostics).unwrap();

    let children: Vec<String> = tree
        .children(root)
        .iter()
        .map(|id| tree.get(*id).keyword.to_string())
        .collect();
    assert_eq!(children, ["ext:marker", "leaf"]);
    insta::assert_snapshot!(diagnostics.printer().render(), @"error at 13..21: unknown statement `contaner`");
}

#[test]
fn lowering_rejects_non_module_root() {
    let parsed = parse("leaf x;", SourceId::default(), None, None).unwrap();
    let mut tree = StmtTree::new();
    let mut diagnostics = Diagnostics::new();
    assert!(lower_source(&parsed.root, SourceId::default(), &mut tree, &mut diagnostics).is_none());
    insta::assert_snapshot!(diagnostics.printer().render(), @"error at 0..4: expected a statement keyword: expected `module` or `submodule`, found `leaf`");
}

#[test]
fn wrap_child_inserts_context_statement() {
    let mut tree = StmtTree::new();
    let module = tree.add_root(StmtKeyword::Yang(Keyword::Module), Some("m".into()), span(), None);
    let choice = tree.add_child(
        module,
        StmtKeyword::Yang(Keyword::Choice),
        Some("ch".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    let leaf = tree.add_child(
        choice,
        StmtKeyword::Yang(Keyword::Leaf),
        Some("x".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );

    let case = tree.wrap_child(choice, 0, Keyword::Case);
    assert_eq!(tree.children(choice), [case]);
    assert_eq!(tree.children(case), [leaf]);
    assert_eq!(tree.parent(leaf), Some(case));
    assert_eq!(tree.get(case).raw(), "x");
    assert_eq!(tree.get(case).origin, StatementOrigin::Context);
    assert_eq!(tree.get(case).root, module);
}

#[test]
fn deep_copy_rebinds_schema_nodes_and_skips_uses() {
    let mut tree = StmtTree::new();
    let module = tree.add_root(StmtKeyword::Yang(Keyword::Module), Some("m".into()), span(), None);
    let grouping = tree.add_child(
        module,
        StmtKeyword::Yang(Keyword::Grouping),
        Some("g".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    let leaf = tree.add_child(
        grouping,
        StmtKeyword::Yang(Keyword::Leaf),
        Some("x".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    tree.get_mut(leaf).argument = Some(Argument::Identifier(qname("urn:g", "x")));
    let description = tree.add_child(
        leaf,
        StmtKeyword::Yang(Keyword::Description),
        Some("text".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    tree.get_mut(description).argument = Some(Argument::String("text".into()));
    tree.add_child(
        grouping,
        StmtKeyword::Yang(Keyword::Uses),
        Some("other".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    let uses = tree.add_child(
        module,
        StmtKeyword::Yang(Keyword::Uses),
        Some("g".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );

    let options = CopyOptions {
        kind: CopyKind::AddedByUses,
        introduced_by: uses,
        target_module: Some(QNameModule::new("urn:user", None)),
    };
    let copy = tree.deep_copy(leaf, module, 2, &options);

    assert_eq!(tree.children(module)[2], copy);
    assert_eq!(tree.get(copy).qname(), Some(&qname("urn:user", "x")));
    assert_eq!(tree.get(copy).copy_kind, Some(CopyKind::AddedByUses));
    assert_eq!(tree.original(copy), leaf);
    assert!(!tree.in_grouping(copy));
    assert!(tree.in_grouping(leaf));

    let copied_description = tree.children(copy)[0];
    assert_eq!(tree.original(copied_description), description);
    assert_eq!(
        tree.get(copied_description).argument,
        Some(Argument::String("text".into()))
    );

    let grouping_copy = tree.deep_copy(grouping, module, 0, &options);
    assert_eq!(tree.children(grouping_copy).len(), 1);
}

#[test]
fn pruning_follows_the_introducing_expansion() {
    let mut tree = StmtTree::new();
    let module = tree.add_root(StmtKeyword::Yang(Keyword::Module), Some("m".into()), span(), None);
    let uses = tree.add_child(
        module,
        StmtKeyword::Yang(Keyword::Uses),
        Some("g".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    let container = tree.add_child(
        module,
        StmtKeyword::Yang(Keyword::Container),
        Some("c".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    let leaf = tree.add_child(
        container,
        StmtKeyword::Yang(Keyword::Leaf),
        Some("l".into()),
        StatementOrigin::Declaration,
        span(),
        None,
    );
    tree.get_mut(container).introduced_by = Some(uses);

    assert!(!tree.is_pruned(leaf));
    tree.get_mut(uses).pruned = true;
    assert!(tree.is_pruned(container));
    assert!(tree.is_pruned(leaf));
}
