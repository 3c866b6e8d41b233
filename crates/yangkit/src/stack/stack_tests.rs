use indoc::indoc;
use yangkit_core::{QName, QNameModule, SchemaNodeIdentifier};

use super::{Inference, NavigationError, SchemaInferenceStack, SchemaTreeInference};
use crate::model::{BuiltinType, EffectiveModel, NodeId};
use crate::stmt::Keyword;
use crate::SchemaBuilder;

fn q(namespace: &str, local: &str) -> QName {
    QNameModule::new(namespace, None).bind(local).unwrap()
}

fn qnames(namespace: &str, steps: &[&str]) -> Vec<QName> {
    steps.iter().map(|s| q(namespace, s)).collect()
}

fn path(namespace: &str, steps: &[&str]) -> SchemaNodeIdentifier {
    SchemaNodeIdentifier::absolute(qnames(namespace, steps)).unwrap()
}

#[track_caller]
fn build(src: &str) -> EffectiveModel {
    build_with(SchemaBuilder::inline(src))
}

#[track_caller]
fn build_with(builder: SchemaBuilder) -> EffectiveModel {
    match builder.build() {
        Ok(model) => model,
        Err(err) => {
            let rendered = err.diagnostics().map(|d| d.printer().render());
            panic!("{err}:\n{}", rendered.unwrap_or_default())
        }
    }
}

#[track_caller]
fn node(model: &EffectiveModel, namespace: &str, steps: &[&str]) -> NodeId {
    model
        .find_schema_node(&path(namespace, steps))
        .unwrap_or_else(|| panic!("no schema node at {steps:?}"))
}

fn local_names(path: &SchemaNodeIdentifier) -> Vec<&str> {
    path.node_identifiers().iter().map(QName::local_name).collect()
}

const CHOICES: &str = indoc! {r#"
    module foo {
        namespace "foo";
        prefix foo;
        container foo {
            choice bar {
                case bar {
                    choice baz {
                        case baz {
                            container xyzzy;
                        }
                    }
                }
            }
        }
    }
"#};

const NAMESPACES: &str = indoc! {r#"
    module t {
        namespace "urn:t";
        prefix t;
        typedef x { type string; }
        grouping x {
            container inner { leaf y { type string; } }
        }
        container x {
            leaf y { type int8; }
        }
    }
"#};

const DEREF: &str = indoc! {r#"
    module deref {
        namespace "urn:deref";
        prefix d;
        grouping grp {
            list secondary {
                key id;
                leaf id {
                    type leafref { path "../../id"; }
                }
                leaf type {
                    type leafref { path "deref(../id)/../type"; }
                }
            }
        }
        list grp-uses {
            key id;
            leaf id { type string; }
            leaf type { type string; }
            uses grp;
        }
    }
"#};

#[test]
fn data_tree_steps_skip_choice_and_case() {
    let model = build(CHOICES);
    let stack = SchemaInferenceStack::of_data_tree_path(&model, &qnames("foo", &["foo", "xyzzy"]))
        .unwrap();

    assert_eq!(stack.statement_path().len(), 2);
    let current = stack.current_statement().unwrap();
    assert!(model.node(current).is(Keyword::Container));

    let path = stack.to_schema_node_identifier().unwrap();
    assert!(path.is_absolute());
    assert_eq!(local_names(&path), ["foo", "bar", "bar", "baz", "baz", "xyzzy"]);
    assert_eq!(model.find_schema_node(&path), Some(current));
}

#[test]
fn schema_tree_requires_explicit_choice_and_case() {
    let model = build(CHOICES);
    let mut stack = SchemaInferenceStack::of(&model);
    stack.enter_schema_tree(&q("foo", "foo")).unwrap();

    let err = stack.enter_schema_tree(&q("foo", "xyzzy")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema tree child (foo)xyzzy not present in schema parent (foo)foo"
    );

    for step in ["bar", "bar", "baz", "baz", "xyzzy"] {
        stack.enter_schema_tree(&q("foo", step)).unwrap();
    }
    assert_eq!(stack.statement_path().len(), 6);
    assert_eq!(
        local_names(&stack.to_schema_node_identifier().unwrap()),
        ["foo", "bar", "bar", "baz", "baz", "xyzzy"]
    );
}

#[test]
fn enter_choice_crosses_cases() {
    let model = build(CHOICES);
    let mut stack = SchemaInferenceStack::of(&model);
    stack.enter_schema_tree(&q("foo", "foo")).unwrap();

    let bar = stack.enter_choice(&q("foo", "bar")).unwrap();
    assert!(model.node(bar).is(Keyword::Choice));
    let baz = stack.enter_choice(&q("foo", "baz")).unwrap();
    assert!(model.node(baz).is(Keyword::Choice));
    assert_eq!(stack.statement_path().len(), 3);
    assert_eq!(
        local_names(&stack.to_schema_node_identifier().unwrap()),
        ["foo", "bar", "bar", "baz"]
    );

    // xyzzy is inside a case of baz, but it is a container
    let err = stack.enter_choice(&q("foo", "xyzzy")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Choice (foo)xyzzy not present in schema parent (foo)baz"
    );
    assert_eq!(stack.current_statement().unwrap(), baz);
}

#[test]
fn enter_choice_on_empty_stack_needs_a_choice() {
    let model = build(CHOICES);
    let mut stack = SchemaInferenceStack::of(&model);

    let err = stack.enter_choice(&q("foo", "foo")).unwrap_err();
    assert_eq!(err, NavigationError::ChoiceNotPresent(q("foo", "foo")));
    assert!(stack.is_empty());
}

#[test]
fn exit_to_data_tree_pops_choice_and_case() {
    let model = build(CHOICES);
    let foo = node(&model, "foo", &["foo"]);
    let xyzzy = node(&model, "foo", &["foo", "bar", "bar", "baz", "baz", "xyzzy"]);

    let mut stack =
        SchemaInferenceStack::of_schema_path(&model, &path("foo", &["foo", "bar", "bar", "baz", "baz", "xyzzy"]))
            .unwrap();
    assert_eq!(stack.exit_to_data_tree().unwrap(), xyzzy);
    assert_eq!(stack.statement_path(), [foo]);

    assert_eq!(stack.exit_to_data_tree().unwrap(), foo);
    assert!(stack.is_empty());
    assert_eq!(stack.exit_to_data_tree(), Err(NavigationError::NoSuchElement));
}

#[test]
fn exit_to_data_tree_rejects_non_data_nodes() {
    let model = build(CHOICES);
    let mut stack =
        SchemaInferenceStack::of_schema_path(&model, &path("foo", &["foo", "bar"])).unwrap();

    let err = stack.exit_to_data_tree().unwrap_err();
    assert_eq!(err, NavigationError::UnexpectedCurrent("choice (foo)bar".to_string()));
}

#[test]
fn groupings_typedefs_and_nodes_have_separate_namespaces() {
    let model = build(NAMESPACES);
    let x = q("urn:t", "x");
    let mut stack = SchemaInferenceStack::of(&model);

    let grouping = stack.enter_grouping(&x).unwrap();
    assert!(model.node(grouping).is(Keyword::Grouping));
    assert!(stack.in_grouping());
    assert!(!stack.in_instantiated_context());
    stack.enter_schema_tree(&q("urn:t", "inner")).unwrap();
    stack.enter_schema_tree(&q("urn:t", "y")).unwrap();
    stack.exit().unwrap();
    stack.exit().unwrap();
    assert!(stack.in_grouping());
    stack.exit().unwrap();
    assert!(!stack.in_grouping());

    let typedef = stack.enter_typedef(&x).unwrap();
    assert!(model.node(typedef).is(Keyword::Typedef));
    stack.exit().unwrap();

    let container = stack.enter_schema_tree(&x).unwrap();
    assert!(model.node(container).is(Keyword::Container));
    assert!(stack.in_instantiated_context());
    assert_ne!(container, grouping);
    assert_ne!(container, typedef);
    assert_eq!(stack.current_module().unwrap().name.as_ref(), "t");
}

#[test]
fn missing_statements_name_their_parent() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of(&model);

    let err = stack.enter_grouping(&q("urn:t", "nope")).unwrap_err();
    assert_eq!(err.to_string(), "Grouping (urn:t)nope not present in module (urn:t)t");

    let err = stack.enter_typedef(&q("urn:t", "nope")).unwrap_err();
    assert_eq!(err.to_string(), "Typedef (urn:t)nope not present in module (urn:t)t");

    stack.enter_grouping(&q("urn:t", "x")).unwrap();
    let err = stack.enter_schema_tree(&q("urn:t", "nope")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema tree child (urn:t)nope not present in grouping (urn:t)x"
    );
}

#[test]
fn empty_stack_errors() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of(&model);

    assert_eq!(stack.current_statement(), Err(NavigationError::EmptyStack));
    assert!(stack.current_module().is_err());
    assert_eq!(stack.exit(), Err(NavigationError::NoSuchElement));

    let err = stack.enter_schema_tree(&q("urn:other", "x")).unwrap_err();
    assert_eq!(err.to_string(), "Module for (urn:other)x not found");
}

#[test]
fn leaves_cannot_be_descended() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of_schema_path(&model, &path("urn:t", &["x", "y"])).unwrap();

    let err = stack.enter_schema_tree(&q("urn:t", "z")).unwrap_err();
    assert!(matches!(
        err,
        NavigationError::CannotDescend { axis: "schema", .. }
    ));
    let err = stack.enter_data_tree(&q("urn:t", "z")).unwrap_err();
    assert!(matches!(err, NavigationError::CannotDescend { axis: "data", .. }));
}

#[test]
fn clear_and_copy_are_independent() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of_schema_path(&model, &path("urn:t", &["x", "y"])).unwrap();
    let copy = stack.copy();

    stack.clear();
    assert!(stack.is_empty());
    assert_eq!(copy.statement_path().len(), 2);
    assert_eq!(copy.current_statement().unwrap(), node(&model, "urn:t", &["x", "y"]));
}

#[test]
fn enter_schema_path_restarts_on_absolute_paths() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of(&model);
    stack.enter_grouping(&q("urn:t", "x")).unwrap();

    let y = stack.enter_schema_path(&path("urn:t", &["x", "y"])).unwrap();
    assert_eq!(y, node(&model, "urn:t", &["x", "y"]));
    assert!(!stack.in_grouping());
    assert_eq!(stack.statement_path().len(), 2);
}

#[test]
fn deref_resolves_in_instantiated_copy() {
    let model = build(DEREF);
    let stack = SchemaInferenceStack::of_schema_path(
        &model,
        &path("urn:deref", &["grp-uses", "secondary", "type"]),
    )
    .unwrap();
    let leaf = stack.current_statement().unwrap();
    let leafref = model.node(leaf).type_definition().unwrap();

    let resolved = stack.resolve_leafref(leafref).unwrap();
    assert_eq!(resolved.builtin_type(), BuiltinType::String);
    // resolution works on a copy
    assert_eq!(stack.current_statement().unwrap(), leaf);

    let mut walker = stack.copy();
    let target = walker
        .resolve_path_expression(leafref.leafref_path().unwrap())
        .unwrap();
    assert_eq!(target, node(&model, "urn:deref", &["grp-uses", "type"]));
    assert_eq!(walker.current_statement().unwrap(), target);
}

#[test]
fn deref_inside_grouping_is_illegal_parent_access() {
    let model = build(DEREF);
    let mut stack = SchemaInferenceStack::of(&model);
    stack.enter_grouping(&q("urn:deref", "grp")).unwrap();
    stack.enter_schema_tree(&q("urn:deref", "secondary")).unwrap();
    let leaf = stack.enter_schema_tree(&q("urn:deref", "type")).unwrap();
    let leafref = model.node(leaf).type_definition().unwrap();

    let err = stack.resolve_leafref(leafref).unwrap_err();
    let NavigationError::IllegalParentAccess { path, source } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(path, "../../id");
    assert!(matches!(**source, NavigationError::UnexpectedParent(_)));
}

#[test]
fn leafref_loop_is_detected() {
    let model = build_with(
        SchemaBuilder::inline(indoc! {r#"
            module t {
                namespace "urn:t";
                prefix t;
                container c {
                    leaf a { type leafref { path "../b"; } }
                    leaf b { type leafref { path "../a"; } }
                }
            }
        "#})
        .with_leafref_validation(false),
    );
    let stack = SchemaInferenceStack::of_schema_path(&model, &path("urn:t", &["c", "a"])).unwrap();
    let leafref = model.node(stack.current_statement().unwrap()).type_definition().unwrap();

    let err = stack.resolve_leafref(leafref).unwrap_err();
    assert_eq!(err, NavigationError::LeafrefLoop("leafref ../b".to_string()));
}

#[test]
fn leafref_in_typedef_body_has_no_parent() {
    let model = build(indoc! {r#"
        module t {
            namespace "urn:t";
            prefix t;
            typedef ref {
                type leafref { path "../x"; }
            }
            container c {
                leaf x { type int16; }
                leaf r { type ref; }
            }
        }
    "#});

    let mut stack = SchemaInferenceStack::of(&model);
    let typedef = stack.enter_typedef(&q("urn:t", "ref")).unwrap();
    let declared = model.node(typedef).type_definition().unwrap();
    let err = stack.resolve_leafref(declared).unwrap_err();
    assert_eq!(
        err,
        NavigationError::IllegalParentAccess {
            path: "../x".to_string(),
            source: Box::new(NavigationError::UnexpectedCurrent("typedef (urn:t)ref".to_string())),
        }
    );
    assert_eq!(stack.current_statement().unwrap(), typedef);

    let used = SchemaInferenceStack::of_schema_path(&model, &path("urn:t", &["c", "r"])).unwrap();
    let leaf = used.current_statement().unwrap();
    let resolved = used
        .resolve_leafref(model.node(leaf).type_definition().unwrap())
        .unwrap();
    assert_eq!(resolved.builtin_type(), BuiltinType::Int16);
}

#[test]
fn resolve_leafref_rejects_other_types() {
    let model = build(NAMESPACES);
    let stack = SchemaInferenceStack::of_schema_path(&model, &path("urn:t", &["x", "y"])).unwrap();
    let int8 = model.node(stack.current_statement().unwrap()).type_definition().unwrap();

    let err = stack.resolve_leafref(int8).unwrap_err();
    assert_eq!(err, NavigationError::NotLeafref("int8".to_string()));
}

#[test]
fn schema_tree_inference_round_trips() {
    let model = build(CHOICES);
    let stack = SchemaInferenceStack::of_data_tree_path(&model, &qnames("foo", &["foo", "xyzzy"]))
        .unwrap();

    let inference = stack.to_schema_tree_inference().unwrap();
    assert_eq!(inference.statement_path().len(), 6);
    let trusted = SchemaInferenceStack::of_schema_tree_inference(&inference).unwrap();
    assert_eq!(trusted.statement_path(), inference.statement_path());
    let untrusted = SchemaInferenceStack::of_untrusted(&inference).unwrap();
    assert_eq!(untrusted.to_schema_tree_inference().unwrap(), inference);

    let by_path = SchemaInferenceStack::of_schema_path(&model, &inference.to_schema_node_identifier().unwrap())
        .unwrap();
    assert_eq!(by_path.current_statement(), stack.current_statement());
}

#[test]
fn untrusted_inference_must_match_the_model() {
    let model = build(indoc! {r#"
        module t {
            namespace "urn:t";
            prefix t;
            container a { leaf x { type string; } }
            container b { leaf x { type string; } }
        }
    "#});
    let a = node(&model, "urn:t", &["a"]);
    let b_x = node(&model, "urn:t", &["b", "x"]);

    let forged = SchemaTreeInference::new(&model, vec![a, b_x]);
    let err = SchemaInferenceStack::of_untrusted(&forged).unwrap_err();
    assert_eq!(err, NavigationError::Inconsistent);
}

#[test]
fn foreign_handles_are_inconsistent() {
    let small = build(CHOICES);
    let large = build(DEREF);
    assert!(large.len() > small.len());
    let foreign = large.node_ids().last().unwrap();
    assert!(small.get(foreign).is_none());

    let forged = SchemaTreeInference::new(&small, vec![foreign]);
    assert_eq!(
        SchemaInferenceStack::of_untrusted(&forged).unwrap_err(),
        NavigationError::Inconsistent
    );
    assert_eq!(
        SchemaInferenceStack::of_schema_tree_inference(&forged).unwrap_err(),
        NavigationError::Inconsistent
    );

    let foo = node(&small, "foo", &["foo"]);
    let mixed = SchemaTreeInference::new(&small, vec![foo, foreign]);
    assert_eq!(
        mixed.to_schema_node_identifier().unwrap_err(),
        NavigationError::Inconsistent
    );
}

#[test]
fn uninstantiated_context_has_no_schema_path() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of(&model);
    assert_eq!(
        stack.to_schema_tree_inference().unwrap_err(),
        NavigationError::UninstantiatedContext
    );

    stack.enter_grouping(&q("urn:t", "x")).unwrap();
    stack.enter_schema_tree(&q("urn:t", "inner")).unwrap();
    assert_eq!(
        stack.to_schema_node_identifier().unwrap_err(),
        NavigationError::UninstantiatedContext
    );
}

#[test]
fn inference_restores_full_state() {
    let model = build(NAMESPACES);
    let mut stack = SchemaInferenceStack::of(&model);
    stack.enter_grouping(&q("urn:t", "x")).unwrap();
    stack.enter_schema_tree(&q("urn:t", "inner")).unwrap();

    let inference = stack.to_inference();
    assert_eq!(inference.statement_path(), stack.statement_path());
    let mut restored = inference.to_schema_inference_stack();
    assert!(restored.in_grouping());
    assert_eq!(restored.current_module().unwrap().name.as_ref(), "t");

    restored.exit().unwrap();
    restored.exit().unwrap();
    assert!(!restored.in_grouping());
    assert_eq!(stack.statement_path().len(), 2);
}

#[test]
fn inference_of_data_tree_path() {
    let model = build(CHOICES);
    let inference = Inference::of_data_tree_path(&model, &qnames("foo", &["foo", "xyzzy"])).unwrap();
    assert!(!inference.is_empty());

    let stack = inference.to_schema_inference_stack();
    assert_eq!(
        stack.current_statement().unwrap(),
        node(&model, "foo", &["foo", "bar", "bar", "baz", "baz", "xyzzy"])
    );

    let err = Inference::of_data_tree_path(&model, &qnames("foo", &["foo", "bar"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Data tree child (foo)bar not present in schema parent (foo)foo"
    );
}

#[test]
fn of_node_matches_schema_path() {
    let model = build(CHOICES);
    let steps = ["foo", "bar", "bar", "baz", "baz", "xyzzy"];
    let xyzzy = node(&model, "foo", &steps);

    let stack = SchemaInferenceStack::of_node(&model, xyzzy).unwrap();
    let by_path = SchemaInferenceStack::of_schema_path(&model, &path("foo", &steps)).unwrap();
    assert_eq!(stack.statement_path(), by_path.statement_path());
    assert_eq!(stack.current_module().unwrap().name.as_ref(), "foo");
}

#[test]
fn stacks_navigate_one_model_from_many_threads() {
    let model = build(DEREF);
    let leaf_path = path("urn:deref", &["grp-uses", "secondary", "type"]);
    let expected = node(&model, "urn:deref", &["grp-uses", "type"]);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut stack = SchemaInferenceStack::of_schema_path(&model, &leaf_path).unwrap();
                    let leaf = stack.current_statement().unwrap();
                    let leafref = model.node(leaf).type_definition().unwrap();
                    stack.resolve_path_expression(leafref.leafref_path().unwrap()).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn debug_lists_frames() {
    let model = build(NAMESPACES);
    let stack = SchemaInferenceStack::of_schema_path(&model, &path("urn:t", &["x", "y"])).unwrap();
    let debug = format!("{stack:?}");
    assert!(debug.contains("container (urn:t)x"), "{debug}");
    assert!(debug.contains("leaf (urn:t)y"), "{debug}");
}
