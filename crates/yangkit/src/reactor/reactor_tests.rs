use indoc::indoc;
use yangkit_core::{QName, QNameModule, SchemaNodeIdentifier};

use super::Phase;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{BuiltinType, EffectiveModel, NodeId, TypeKind};
use crate::source_map::SourceMap;
use crate::stmt::Keyword;
use crate::{Error, SchemaBuilder};

fn q(namespace: &str, local: &str) -> QName {
    QNameModule::new(namespace, None).bind(local).unwrap()
}

fn path(namespace: &str, steps: &[&str]) -> SchemaNodeIdentifier {
    SchemaNodeIdentifier::absolute(steps.iter().map(|s| q(namespace, s)).collect()).unwrap()
}

#[track_caller]
fn build_all(builder: SchemaBuilder) -> EffectiveModel {
    match builder.build() {
        Ok(model) => model,
        Err(err) => {
            let rendered = err.diagnostics().map(|d| d.printer().render());
            panic!("{err}:\n{}", rendered.unwrap_or_default())
        }
    }
}

#[track_caller]
fn build(src: &str) -> EffectiveModel {
    build_all(SchemaBuilder::inline(src))
}

fn sources(modules: &[(&str, &str)]) -> SourceMap {
    let mut map = SourceMap::new();
    for (name, content) in modules {
        map.add_inline(name, content);
    }
    map
}

/// Diagnostics of a build that is expected to fail after parsing.
#[track_caller]
fn build_errors(builder: SchemaBuilder) -> Diagnostics {
    match builder.build() {
        Err(Error::Build(diag)) => diag,
        Err(other) => panic!("expected a build failure, got {other}"),
        Ok(model) => panic!("expected a build failure, got:\n{}", model.dump()),
    }
}

#[track_caller]
fn messages(builder: SchemaBuilder) -> Vec<String> {
    build_errors(builder)
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.message.clone())
        .collect()
}

#[track_caller]
fn kinds(builder: SchemaBuilder) -> Vec<DiagnosticKind> {
    build_errors(builder).iter().map(|d| d.kind).collect()
}

#[test]
fn phases_are_ordered() {
    let mut sorted = Phase::ALL;
    sorted.sort();
    assert_eq!(sorted, Phase::ALL);
    assert_eq!(Phase::ALL.first(), Some(&Phase::SourceLinkage));
    assert_eq!(Phase::ALL.last(), Some(&Phase::EffectiveModel));
}

#[test]
fn uses_with_refine_dump() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping endpoint {
            leaf address { type string; }
            leaf port { type uint16; }
          }
          container server {
            uses endpoint {
              refine port { mandatory true; }
            }
            leaf enabled { type boolean; config false; }
          }
        }
    "#});

    insta::assert_snapshot!(model.dump(), @r"
    module t
      container server
        leaf address: string uses
        leaf port: uint16 mandatory uses
        leaf enabled: boolean ro
    ");
}

#[test]
fn typedef_declared_after_use_resolves() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf level { type percent; }
          typedef percent {
            type uint8 { range "0..100"; }
            units "percent";
          }
        }
    "#});

    let leaf = model.find_schema_node(&path("urn:t", &["level"])).unwrap();
    let ty = model.node(leaf).type_definition().unwrap();
    assert_eq!(ty.qname().local_name(), "percent");
    assert_eq!(ty.builtin_type(), BuiltinType::Uint8);
    assert_eq!(ty.units(), Some("percent"));
    assert!(matches!(ty.kind(), TypeKind::Integral { .. }));
    assert!(!ty.is_builtin());
}

#[test]
fn missing_typedef_stalls_with_diagnostic() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf level { type missing; }
        }
    "#}));
    assert_eq!(messages, ["Type [(urn:t)missing] was not found."]);
}

#[test]
fn typedef_cycle_is_reported_once_per_type() {
    let diag = build_errors(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          typedef a { type b; }
          typedef b { type a; }
        }
    "#}));
    assert_eq!(diag.error_count(), 2);
    assert!(diag.iter().all(|d| d.kind == DiagnosticKind::ReferenceCycle));
    let first = diag.first().unwrap();
    assert_eq!(
        first.message,
        "Type [(urn:t)b] depends on an unresolved or circular definition."
    );
}

#[test]
fn grouping_and_typedef_share_a_name() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping shared { leaf x { type string; } }
          typedef shared { type string; }
          container c {
            uses shared;
            leaf y { type shared; }
          }
        }
    "#});

    let module = model.module_by_name("t").unwrap();
    let root = model.node(module.root);
    let grouping = root.grouping(&q("urn:t", "shared")).unwrap();
    let typedef = root.typedef(&q("urn:t", "shared")).unwrap();
    assert_ne!(grouping, typedef);
    assert!(model.find_schema_node(&path("urn:t", &["c", "x"])).is_some());
}

#[test]
fn duplicate_grouping_is_rejected() {
    let diag = build_errors(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping g { leaf x { type string; } }
          grouping g { leaf y { type string; } }
        }
    "#}));
    let first = diag.first().unwrap();
    assert_eq!(first.kind, DiagnosticKind::DuplicateDefinition);
    assert_eq!(first.message, "`g` is already defined");
    assert_eq!(first.related.len(), 1);
}

#[test]
fn uses_copies_take_using_module_namespace() {
    let builder = SchemaBuilder::new(sources(&[
        (
            "a.yang",
            indoc! {r#"
                module a {
                  namespace "urn:a";
                  prefix a;
                  grouping g { leaf x { type string; } }
                }
            "#},
        ),
        (
            "b.yang",
            indoc! {r#"
                module b {
                  namespace "urn:b";
                  prefix b;
                  import a { prefix a; }
                  container c {
                    uses a:g { refine x { config false; } }
                  }
                }
            "#},
        ),
    ]));
    let model = build_all(builder);

    let x = model.find_schema_node(&path("urn:b", &["c", "x"])).unwrap();
    let node = model.node(x);
    assert_eq!(node.qname(), Some(&q("urn:b", "x")));
    assert!(node.flags().added_by_uses());
    assert!(!node.flags().config());
    assert_eq!(model.module_of(x).unwrap().name.as_ref(), "b");
}

#[test]
fn nested_uses_expand_inside_out() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping outer {
            container wrapper { uses inner; }
          }
          grouping inner { leaf deep { type string; } }
          container top { uses outer; }
        }
    "#});
    let deep = model
        .find_schema_node(&path("urn:t", &["top", "wrapper", "deep"]))
        .unwrap();
    assert!(model.node(deep).flags().added_by_uses());
}

#[test]
fn missing_grouping() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          container c { uses nowhere; }
        }
    "#}));
    assert_eq!(messages, ["Grouping [(urn:t)nowhere] was not found."]);
}

#[test]
fn recursive_grouping_is_a_cycle() {
    let kinds = kinds(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping g { container c { uses g; } }
        }
    "#}));
    assert_eq!(kinds, [DiagnosticKind::ReferenceCycle]);
}

#[test]
fn refine_of_unknown_node() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping g { leaf x { type string; } }
          container c { uses g { refine y { mandatory true; } } }
        }
    "#}));
    assert_eq!(messages, ["Refine target [y] was not found."]);
}

#[test]
fn augment_resolves_regardless_of_source_order() {
    // the augmenting module is registered first
    let builder = SchemaBuilder::new(sources(&[
        (
            "ext.yang",
            indoc! {r#"
                module ext {
                  namespace "urn:ext";
                  prefix ext;
                  import base { prefix b; }
                  augment "/b:system" {
                    leaf timezone { type string; }
                  }
                }
            "#},
        ),
        (
            "base.yang",
            indoc! {r#"
                module base {
                  namespace "urn:base";
                  prefix b;
                  container system { leaf hostname { type string; } }
                }
            "#},
        ),
    ]));
    let model = build_all(builder);

    let system = model.find_schema_node(&path("urn:base", &["system"])).unwrap();
    let timezone = model
        .node(system)
        .schema_child(&q("urn:ext", "timezone"))
        .unwrap();
    assert!(model.node(timezone).flags().augmenting());
    assert!(!model.node(timezone).flags().added_by_uses());
    assert!(model.node(timezone).flags().config());
}

#[test]
fn augment_into_choice_wraps_shorthand_case() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          container c { choice how { leaf fast { type empty; } } }
          augment "/t:c/t:how" { leaf slow { type empty; } }
        }
    "#});
    let slow_case = model
        .find_schema_node(&path("urn:t", &["c", "how", "slow"]))
        .unwrap();
    assert!(model.node(slow_case).is(Keyword::Case));
    let c = model.find_schema_node(&path("urn:t", &["c"])).unwrap();
    assert!(model.node(c).data_child(&q("urn:t", "slow")).is_some());
    assert!(model.node(c).data_child(&q("urn:t", "fast")).is_some());
}

#[test]
fn augment_target_not_found() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          augment "/t:nothing" { leaf x { type string; } }
        }
    "#}));
    assert_eq!(messages, ["Augment target [/t:nothing] was not found."]);
}

#[test]
fn uses_augment_marks_nodes_as_both() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          grouping g { container inner; }
          container c {
            uses g {
              augment "inner" { leaf extra { type string; } }
            }
          }
        }
    "#});
    let extra = model
        .find_schema_node(&path("urn:t", &["c", "inner", "extra"]))
        .unwrap();
    let flags = model.node(extra).flags();
    assert!(flags.augmenting());
    assert!(flags.added_by_uses());
}

#[test]
fn unsupported_feature_prunes_nodes() {
    let src = indoc! {r#"
        module t {
          yang-version 1.1;
          namespace "urn:t";
          prefix t;
          feature fancy;
          feature fancier { if-feature fancy; }
          container c {
            leaf plain { type string; }
            leaf shiny { if-feature fancy; type string; }
            leaf shinier { if-feature "fancier"; type string; }
            leaf either { if-feature "fancy or not fancier"; type string; }
          }
        }
    "#};

    let all = build(src);
    for name in ["plain", "shiny", "shinier", "either"] {
        assert!(all.find_schema_node(&path("urn:t", &["c", name])).is_some(), "{name}");
    }
    assert_eq!(all.features().count(), 2);

    let none = build_all(SchemaBuilder::inline(src).with_supported_features([]));
    assert!(none.find_schema_node(&path("urn:t", &["c", "plain"])).is_some());
    assert!(none.find_schema_node(&path("urn:t", &["c", "shiny"])).is_none());
    assert!(none.find_schema_node(&path("urn:t", &["c", "shinier"])).is_none());
    assert!(none.find_schema_node(&path("urn:t", &["c", "either"])).is_some());
    assert_eq!(none.features().count(), 0);

    // `fancier` depends on `fancy`, so enabling it alone is not enough
    let partial =
        build_all(SchemaBuilder::inline(src).with_supported_features([q("urn:t", "fancier")]));
    assert!(partial.find_schema_node(&path("urn:t", &["c", "shinier"])).is_none());
}

#[test]
fn unknown_feature() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { if-feature ghost; type string; }
        }
    "#}));
    assert_eq!(messages, ["Feature [(urn:t)ghost] was not found."]);
}

#[test]
fn identities_and_identityref() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          identity ethernet { base interface-type; }
          identity interface-type;
          leaf kind { type identityref { base interface-type; } }
        }
    "#});
    assert!(model.is_derived_from(&q("urn:t", "ethernet"), &q("urn:t", "interface-type")));
    assert!(!model.is_derived_from(&q("urn:t", "interface-type"), &q("urn:t", "ethernet")));
    let kind = model.find_schema_node(&path("urn:t", &["kind"])).unwrap();
    let ty = model.node(kind).type_definition().unwrap();
    assert!(matches!(ty.kind(), TypeKind::Identityref { bases } if bases == &[q("urn:t", "interface-type")]));
}

#[test]
fn missing_identity_base() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          identity ethernet { base interface-type; }
        }
    "#}));
    assert_eq!(messages, ["Identity [(urn:t)interface-type] was not found."]);
}

#[test]
fn missing_mandatory_and_duplicate_singleton() {
    let diag = build_errors(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf untyped;
          container c { description "one"; description "two"; }
        }
    "#}));
    let messages: Vec<&str> = diag.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Missing mandatory substatement `type` in `leaf`",
            "Substatement `description` may occur at most once in `container`",
        ]
    );
}

#[test]
fn missing_import() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          import elsewhere { prefix e; }
        }
    "#}));
    assert_eq!(messages, ["Imported module [elsewhere] was not found."]);
}

#[test]
fn submodule_nodes_join_the_main_module() {
    let builder = SchemaBuilder::new(sources(&[
        (
            "main.yang",
            indoc! {r#"
                module main {
                  namespace "urn:main";
                  prefix m;
                  include part;
                  container from-main { leaf x { type shared-type; } }
                }
            "#},
        ),
        (
            "part.yang",
            indoc! {r#"
                submodule part {
                  belongs-to main { prefix m; }
                  typedef shared-type { type string; }
                  container from-part;
                }
            "#},
        ),
    ]));
    let model = build_all(builder);
    assert_eq!(model.modules().count(), 1);
    let from_part = model.find_schema_node(&path("urn:main", &["from-part"])).unwrap();
    assert_eq!(model.module_of(from_part).unwrap().name.as_ref(), "main");
    assert!(model.find_schema_node(&path("urn:main", &["from-main", "x"])).is_some());
}

#[test]
fn config_true_under_config_false() {
    let diag = build_errors(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          container state {
            config false;
            leaf counter { type uint32; config true; }
          }
        }
    "#}));
    let first = diag.first().unwrap();
    assert_eq!(first.kind, DiagnosticKind::InvalidConfig);
    assert_eq!(
        first.message,
        "Parent node has config=false, this node must not be specified as config=true"
    );
}

#[test]
fn operations_get_implicit_input_and_output() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          rpc reboot {
            input { leaf delay { type uint32; } }
          }
        }
    "#});
    let delay = model
        .find_schema_node(&path("urn:t", &["reboot", "input", "delay"]))
        .unwrap();
    assert!(!model.node(delay).flags().config());
    let output = model.find_schema_node(&path("urn:t", &["reboot", "output"])).unwrap();
    assert!(model.node(output).is(Keyword::Output));
}

#[test]
fn shorthand_case_and_default() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          choice transport {
            default tcp;
            leaf tcp { type empty; }
            case udp { leaf port { type uint16; } }
          }
        }
    "#});
    let tcp = model.find_schema_node(&path("urn:t", &["transport", "tcp", "tcp"])).unwrap();
    assert!(model.node(tcp).is(Keyword::Leaf));
    let case = model.node(tcp).parent().unwrap();
    assert!(model.node(case).is(Keyword::Case));

    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          choice transport {
            default sctp;
            leaf tcp { type empty; }
          }
        }
    "#}));
    assert_eq!(messages, ["Default case [sctp] of choice [transport] was not found."]);
}

#[test]
fn list_key_must_be_a_leaf() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          list users {
            key name;
            container name;
          }
        }
    "#}));
    assert_eq!(messages, ["Key [name] of list [users] is not a leaf of the list."]);
}

#[test]
fn duplicate_schema_node() {
    let diag = build_errors(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf a { type string; }
          container a;
        }
    "#}));
    let first = diag.first().unwrap();
    assert_eq!(first.kind, DiagnosticKind::DuplicateSchemaNode);
    assert_eq!(first.message, "Schema node [a] is defined more than once.");
    assert_eq!(first.related[0].message, "first defined here");
}

#[test]
fn bits_and_enums_are_numbered_in_order() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf flags {
            type bits { bit a; bit b { position 5; } bit c; }
          }
          leaf color {
            type enumeration { enum red; enum green { value 10; } enum blue; }
          }
        }
    "#});
    let flags = model.find_schema_node(&path("urn:t", &["flags"])).unwrap();
    let TypeKind::Bits { bits } = model.node(flags).type_definition().unwrap().kind() else {
        panic!("not bits");
    };
    let positions: Vec<(&str, u32)> = bits.iter().map(|b| (b.name.as_ref(), b.position)).collect();
    assert_eq!(positions, [("a", 0), ("b", 5), ("c", 6)]);

    let color = model.find_schema_node(&path("urn:t", &["color"])).unwrap();
    let TypeKind::Enumeration { enums } = model.node(color).type_definition().unwrap().kind()
    else {
        panic!("not an enumeration");
    };
    let values: Vec<(&str, i32)> = enums.iter().map(|e| (e.name.as_ref(), e.value)).collect();
    assert_eq!(values, [("red", 0), ("green", 10), ("blue", 11)]);
}

#[test]
fn restricted_bits_keep_base_positions() {
    let model = build(indoc! {r#"
        module t {
          yang-version 1.1;
          namespace "urn:t";
          prefix t;
          typedef all-flags {
            type bits { bit a; bit b; bit c; }
          }
          leaf some { type all-flags { bit c; bit a; } }
        }
    "#});
    let some = model.find_schema_node(&path("urn:t", &["some"])).unwrap();
    let TypeKind::Bits { bits } = model.node(some).type_definition().unwrap().kind() else {
        panic!("not bits");
    };
    let positions: Vec<(&str, u32)> = bits.iter().map(|b| (b.name.as_ref(), b.position)).collect();
    assert_eq!(positions, [("c", 2), ("a", 0)]);
}

#[test]
fn restricted_bits_in_yang_1() {
    let diag = build_errors(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          typedef all-flags {
            type bits { bit a; bit b; }
          }
          leaf some { type all-flags { bit a; } }
        }
    "#}));
    // YANG 1 has no `bit` under a derived type at all
    let first = diag.first().unwrap();
    assert_eq!(first.kind, DiagnosticKind::InvalidSubstatement);
    assert_eq!(first.message, "`bit` is not a valid substatement of `type`");
}

#[test]
fn restricted_bits_unknown_member() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          yang-version 1.1;
          namespace "urn:t";
          prefix t;
          typedef all-flags {
            type bits { bit a; }
          }
          leaf some { type all-flags { bit z; } }
        }
    "#}));
    assert_eq!(
        messages,
        ["Bit 'z' is not a subset of its base bits type (urn:t)all-flags."]
    );
}

#[test]
fn invalid_pattern() {
    let kinds = kinds(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { type string { pattern "[a-"; } }
        }
    "#}));
    assert_eq!(kinds, [DiagnosticKind::InvalidPattern]);
}

#[test]
fn leafref_validation() {
    let src = indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          container c {
            leaf target { type string; }
            leaf good { type leafref { path "../target"; } }
            leaf bad { type leafref { path "../missing"; } }
          }
        }
    "#};
    let diag = build_errors(SchemaBuilder::inline(src));
    let first = diag.first().unwrap();
    assert_eq!(first.kind, DiagnosticKind::InvalidLeafref);
    assert_eq!(
        first.message,
        "Data tree child (urn:t)missing not present in schema parent (urn:t)c"
    );

    let model = build_all(SchemaBuilder::inline(src).with_leafref_validation(false));
    assert!(model.find_schema_node(&path("urn:t", &["c", "bad"])).is_some());
}

#[test]
fn leafref_loop_fails_validation() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf a { type leafref { path "../b"; } }
          leaf b { type leafref { path "../a"; } }
        }
    "#}));
    assert_eq!(
        messages,
        [
            "Resolution of leafref ../b loops back onto itself",
            "Resolution of leafref ../a loops back onto itself",
        ]
    );
}

fn arguments(model: &EffectiveModel, node: NodeId, keyword: Keyword) -> Vec<String> {
    model
        .node(node)
        .substatements()
        .iter()
        .filter(|s| model.node(**s).is(keyword))
        .filter_map(|s| model.node(*s).argument().map(str::to_string))
        .collect()
}

#[test]
fn deviate_not_supported_prunes_target() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          container c {
            leaf a { type string; }
            leaf b { type string; }
          }
          deviation "/t:c/t:b" { deviate not-supported; }
        }
    "#});
    insta::assert_snapshot!(model.dump(), @r"
    module t
      container c
        leaf a: string
    ");
}

#[test]
fn deviate_add_appends_properties() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { type string; must "true()"; }
          deviation "/t:x" {
            deviate add {
              units "seconds";
              mandatory true;
              must "string-length(.) > 0";
            }
          }
        }
    "#});
    let x = model.find_schema_node(&path("urn:t", &["x"])).unwrap();
    assert!(model.node(x).flags().mandatory());
    assert_eq!(arguments(&model, x, Keyword::Units), ["seconds"]);
    assert_eq!(
        arguments(&model, x, Keyword::Must),
        ["true()", "string-length(.) > 0"]
    );
}

#[test]
fn deviate_add_cannot_duplicate_a_singleton() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { type string; units "s"; }
          deviation "/t:x" { deviate add { units "ms"; } }
        }
    "#}));
    assert_eq!(
        messages,
        ["Deviation cannot add substatement units to target node /t:x because it is already \
          defined in target and can appear only once."]
    );
}

#[test]
fn deviate_replace_swaps_type_and_config() {
    let model = build(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          container c {
            leaf x { type string; units "s"; }
          }
          deviation "/t:c/t:x" {
            deviate replace {
              type int16;
              units "ms";
              config false;
            }
          }
        }
    "#});
    let x = model.find_schema_node(&path("urn:t", &["c", "x"])).unwrap();
    let ty = model.node(x).type_definition().unwrap();
    assert_eq!(ty.builtin_type(), BuiltinType::Int16);
    assert!(!model.node(x).flags().config());
    assert_eq!(arguments(&model, x, Keyword::Units), ["ms"]);
    assert_eq!(arguments(&model, x, Keyword::Type), ["int16"]);
}

#[test]
fn deviate_replace_of_absent_property() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { type string; }
          deviation "/t:x" { deviate replace { units "ms"; } }
        }
    "#}));
    assert_eq!(
        messages,
        ["Deviation cannot replace substatement units in target node /t:x because it does \
          not exist in target node."]
    );
}

#[test]
fn deviate_delete_removes_matching_property() {
    let (model, diag) = SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { type string; must "a"; must "b"; }
          deviation "/t:x" {
            deviate delete {
              must "a";
              units "nope";
            }
          }
        }
    "#})
    .build_with_diagnostics()
    .unwrap();
    let x = model.find_schema_node(&path("urn:t", &["x"])).unwrap();
    assert_eq!(arguments(&model, x, Keyword::Must), ["b"]);
    assert_eq!(diag.error_count(), 0);
    assert_eq!(diag.warning_count(), 1);
    assert_eq!(
        diag.iter().next().unwrap().message,
        "statement is not applied: deviate delete units 'nope' in /t:x: no such substatement"
    );
}

#[test]
fn deviate_properties_must_fit_kind_and_target() {
    let kinds = kinds(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          leaf x { type string; }
          deviation "/t:x" { deviate add { type int8; } }
          deviation "/t:x" { deviate add { min-elements 1; } }
        }
    "#}));
    assert_eq!(
        kinds,
        [DiagnosticKind::InvalidSubstatement, DiagnosticKind::InvalidTarget]
    );
}

#[test]
fn deviation_target_not_found() {
    let messages = messages(SchemaBuilder::inline(indoc! {r#"
        module t {
          namespace "urn:t";
          prefix t;
          deviation "/t:nothing" { deviate not-supported; }
        }
    "#}));
    assert_eq!(messages, ["Deviation target [/t:nothing] was not found."]);
}

#[test]
fn deviation_from_another_module() {
    let builder = SchemaBuilder::new(sources(&[
        (
            "dev.yang",
            indoc! {r#"
                module dev {
                  namespace "urn:dev";
                  prefix d;
                  import base { prefix b; }
                  typedef short { type int16; }
                  deviation "/b:system/b:host" { deviate replace { type short; } }
                  deviation "/b:system/b:legacy" { deviate not-supported; }
                }
            "#},
        ),
        (
            "base.yang",
            indoc! {r#"
                module base {
                  namespace "urn:base";
                  prefix b;
                  grouping legacy { leaf legacy { type string; } }
                  container system {
                    leaf host { type string; }
                    uses legacy;
                  }
                }
            "#},
        ),
    ]));
    let model = build_all(builder);

    let host = model
        .find_schema_node(&path("urn:base", &["system", "host"]))
        .unwrap();
    let ty = model.node(host).type_definition().unwrap();
    assert_eq!(ty.qname(), &q("urn:dev", "short"));
    assert_eq!(ty.builtin_type(), BuiltinType::Int16);
    assert!(
        model
            .find_schema_node(&path("urn:base", &["system", "legacy"]))
            .is_none()
    );
}

#[test]
fn parse_errors_stop_before_inference() {
    let err = SchemaBuilder::inline("module t { namespace \"urn:t\"; prefix t;")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
    assert!(err.diagnostics().unwrap().has_errors());
}

#[test]
fn parse_fuel_limit() {
    let err = SchemaBuilder::inline("module t { namespace \"urn:t\"; prefix t; }")
        .with_parse_fuel(1)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::ExecFuelExhausted));
    assert_eq!(err.to_string(), "execution limit exceeded");
}

#[test]
fn diagnostics_render_with_snippets() {
    let map = sources(&[(
        "broken.yang",
        indoc! {r#"
            module broken {
              namespace "urn:broken";
              prefix b;
              leaf level { type missing; }
            }
        "#},
    )]);
    let diag = build_errors(SchemaBuilder::new(map.clone()));
    let rendered = diag.render(&map);
    assert!(rendered.contains("Type [(urn:broken)missing] was not found."));
    assert!(rendered.contains("broken.yang"));
    assert!(rendered.contains("leaf level { type missing; }"));
}
