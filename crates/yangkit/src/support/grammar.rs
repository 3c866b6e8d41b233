//! Substatement grammars of RFC 6020 (YANG 1) and RFC 7950 (YANG 1.1).

use yangkit_core::YangVersion;

use super::validator::SubstatementValidator;
use super::{NodeRole, StatementSupport, TypeGrammar};
use crate::reactor::NamespaceKind;
use crate::stmt::{ArgumentKind, Keyword};

use Keyword as K;

/// Grammar shorthand with version-conditional rules.
struct Grammar {
    validator: SubstatementValidator,
    v11: bool,
}

impl Grammar {
    fn new(keyword: Keyword, version: YangVersion) -> Self {
        Self {
            validator: SubstatementValidator::builder(keyword),
            v11: version == YangVersion::V1_1,
        }
    }

    fn mandatory(mut self, keyword: Keyword) -> Self {
        self.validator = self.validator.add_mandatory(keyword);
        self
    }

    fn optional(mut self, keywords: &[Keyword]) -> Self {
        for &keyword in keywords {
            self.validator = self.validator.add_optional(keyword);
        }
        self
    }

    fn any(mut self, keywords: &[Keyword]) -> Self {
        for &keyword in keywords {
            self.validator = self.validator.add_any(keyword);
        }
        self
    }

    fn at_least_one(mut self, keyword: Keyword) -> Self {
        self.validator = self.validator.add_at_least_one(keyword);
        self
    }

    /// Apply `f` only to YANG 1.1 grammars.
    fn v11(self, f: impl FnOnce(Self) -> Self) -> Self {
        if self.v11 { f(self) } else { self }
    }

    fn meta(self) -> Self {
        self.optional(&[K::Status, K::Description, K::Reference])
    }

    /// `data-def-stmt` of the RFC grammar, `uses` included.
    fn data_defs(self) -> Self {
        self.any(&[
            K::Container,
            K::Leaf,
            K::LeafList,
            K::List,
            K::Choice,
            K::Anyxml,
            K::Uses,
        ])
        .v11(|g| g.any(&[K::Anydata]))
    }

    fn definitions(self) -> Self {
        self.any(&[K::Typedef, K::Grouping])
    }

    fn operations(self) -> Self {
        self.v11(|g| g.any(&[K::Action, K::Notification]))
    }

    fn build(self) -> SubstatementValidator {
        self.validator
    }
}

fn support(
    keyword: Keyword,
    argument: ArgumentKind,
    role: NodeRole,
    defines: Option<NamespaceKind>,
    validator: SubstatementValidator,
) -> StatementSupport {
    StatementSupport {
        keyword,
        argument,
        validator,
        role,
        defines,
    }
}

/// Property statements: an argument and no substatements.
fn leaf_statement(keyword: Keyword, argument: ArgumentKind, version: YangVersion) -> StatementSupport {
    support(
        keyword,
        argument,
        NodeRole::Other,
        None,
        Grammar::new(keyword, version).build(),
    )
}

fn module_body(g: Grammar) -> Grammar {
    g.any(&[
        K::Import,
        K::Include,
        K::Revision,
        K::Extension,
        K::Feature,
        K::Identity,
        K::Augment,
        K::Rpc,
        K::Notification,
        K::Deviation,
    ])
    .optional(&[K::Organization, K::Contact, K::Description, K::Reference])
    .definitions()
    .data_defs()
}

pub(super) fn statements(version: YangVersion) -> Vec<StatementSupport> {
    use ArgumentKind as A;
    use NodeRole as R;

    let g = |keyword| Grammar::new(keyword, version);
    let when_if = |g: Grammar| g.optional(&[K::When]).any(&[K::IfFeature]);

    let mut out = vec![
        support(
            K::Module,
            A::Name,
            R::Other,
            Some(NamespaceKind::Module),
            module_body(
                g(K::Module)
                    .optional(&[K::YangVersion])
                    .mandatory(K::Namespace)
                    .mandatory(K::Prefix),
            )
            .v11(|g| g.mandatory(K::YangVersion))
            .build(),
        ),
        support(
            K::Submodule,
            A::Name,
            R::Other,
            Some(NamespaceKind::Submodule),
            module_body(
                g(K::Submodule)
                    .optional(&[K::YangVersion])
                    .mandatory(K::BelongsTo),
            )
            .v11(|g| g.mandatory(K::YangVersion))
            .build(),
        ),
        support(
            K::Import,
            A::Name,
            R::Other,
            Some(NamespaceKind::ImportPrefix),
            g(K::Import)
                .mandatory(K::Prefix)
                .optional(&[K::RevisionDate])
                .v11(|g| g.optional(&[K::Description, K::Reference]))
                .build(),
        ),
        support(
            K::Include,
            A::Name,
            R::Other,
            None,
            g(K::Include)
                .optional(&[K::RevisionDate])
                .v11(|g| g.optional(&[K::Description, K::Reference]))
                .build(),
        ),
        support(
            K::BelongsTo,
            A::Name,
            R::Other,
            None,
            g(K::BelongsTo).mandatory(K::Prefix).build(),
        ),
        support(
            K::Revision,
            A::Revision,
            R::Other,
            None,
            g(K::Revision)
                .optional(&[K::Description, K::Reference])
                .build(),
        ),
        support(
            K::Extension,
            A::Identifier,
            R::Definition,
            Some(NamespaceKind::Extension),
            g(K::Extension).optional(&[K::Argument]).meta().build(),
        ),
        support(
            K::Argument,
            A::Name,
            R::Other,
            None,
            g(K::Argument).optional(&[K::YinElement]).build(),
        ),
        support(
            K::Feature,
            A::Identifier,
            R::Definition,
            Some(NamespaceKind::Feature),
            g(K::Feature).any(&[K::IfFeature]).meta().build(),
        ),
        support(
            K::Identity,
            A::Identifier,
            R::Definition,
            Some(NamespaceKind::Identity),
            if version == YangVersion::V1_1 {
                g(K::Identity).any(&[K::IfFeature, K::Base]).meta().build()
            } else {
                g(K::Identity).optional(&[K::Base]).meta().build()
            },
        ),
        support(
            K::Typedef,
            A::Identifier,
            R::Definition,
            Some(NamespaceKind::Typedef),
            g(K::Typedef)
                .mandatory(K::Type)
                .optional(&[K::Units, K::Default])
                .meta()
                .build(),
        ),
        support(
            K::Type,
            A::TypeRef,
            R::Other,
            None,
            generic_type(version),
        ),
        support(
            K::Pattern,
            A::String,
            R::Other,
            None,
            g(K::Pattern)
                .v11(|g| g.optional(&[K::Modifier]))
                .optional(&[K::ErrorMessage, K::ErrorAppTag, K::Description, K::Reference])
                .build(),
        ),
        support(
            K::Range,
            A::String,
            R::Other,
            None,
            g(K::Range)
                .optional(&[K::ErrorMessage, K::ErrorAppTag, K::Description, K::Reference])
                .build(),
        ),
        support(
            K::Length,
            A::String,
            R::Other,
            None,
            g(K::Length)
                .optional(&[K::ErrorMessage, K::ErrorAppTag, K::Description, K::Reference])
                .build(),
        ),
        support(
            K::Enum,
            A::String,
            R::Other,
            None,
            g(K::Enum)
                .v11(|g| g.any(&[K::IfFeature]))
                .optional(&[K::Value])
                .meta()
                .build(),
        ),
        support(
            K::Bit,
            A::Name,
            R::Other,
            None,
            g(K::Bit)
                .v11(|g| g.any(&[K::IfFeature]))
                .optional(&[K::Position])
                .meta()
                .build(),
        ),
        support(
            K::Container,
            A::Identifier,
            R::DataNode,
            None,
            when_if(g(K::Container))
                .any(&[K::Must])
                .optional(&[K::Presence, K::Config])
                .meta()
                .definitions()
                .data_defs()
                .operations()
                .build(),
        ),
        support(
            K::Leaf,
            A::Identifier,
            R::DataNode,
            None,
            when_if(g(K::Leaf))
                .mandatory(K::Type)
                .optional(&[K::Units, K::Default, K::Config, K::Mandatory])
                .any(&[K::Must])
                .meta()
                .build(),
        ),
        support(
            K::LeafList,
            A::Identifier,
            R::DataNode,
            None,
            when_if(g(K::LeafList))
                .mandatory(K::Type)
                .optional(&[
                    K::Units,
                    K::Config,
                    K::MinElements,
                    K::MaxElements,
                    K::OrderedBy,
                ])
                .any(&[K::Must])
                .v11(|g| g.any(&[K::Default]))
                .meta()
                .build(),
        ),
        support(
            K::List,
            A::Identifier,
            R::DataNode,
            None,
            when_if(g(K::List))
                .any(&[K::Must, K::Unique])
                .optional(&[
                    K::Key,
                    K::Config,
                    K::MinElements,
                    K::MaxElements,
                    K::OrderedBy,
                ])
                .meta()
                .definitions()
                .data_defs()
                .operations()
                .build(),
        ),
        support(
            K::Choice,
            A::Identifier,
            R::SchemaNode,
            None,
            when_if(g(K::Choice))
                .optional(&[K::Default, K::Config, K::Mandatory])
                .meta()
                .any(&[K::Case, K::Container, K::Leaf, K::LeafList, K::List, K::Anyxml])
                .v11(|g| g.any(&[K::Anydata, K::Choice]))
                .build(),
        ),
        support(
            K::Case,
            A::Identifier,
            R::SchemaNode,
            None,
            when_if(g(K::Case)).meta().data_defs().build(),
        ),
        support(
            K::Anyxml,
            A::Identifier,
            R::DataNode,
            None,
            when_if(g(K::Anyxml))
                .any(&[K::Must])
                .optional(&[K::Config, K::Mandatory])
                .meta()
                .build(),
        ),
        support(
            K::Grouping,
            A::Identifier,
            R::Definition,
            Some(NamespaceKind::Grouping),
            g(K::Grouping)
                .meta()
                .definitions()
                .data_defs()
                .operations()
                .build(),
        ),
        support(
            K::Uses,
            A::Reference,
            R::Other,
            None,
            when_if(g(K::Uses))
                .meta()
                .any(&[K::Refine, K::Augment])
                .build(),
        ),
        support(
            K::Refine,
            A::SchemaNodeId,
            R::Other,
            None,
            g(K::Refine)
                .v11(|g| g.any(&[K::IfFeature]))
                .any(&[K::Must])
                .optional(&[
                    K::Presence,
                    K::Config,
                    K::Mandatory,
                    K::MinElements,
                    K::MaxElements,
                    K::Description,
                    K::Reference,
                ])
                .optional(&[K::Default])
                .v11(|g| g.any(&[K::Default]))
                .build(),
        ),
        support(
            K::Augment,
            A::SchemaNodeId,
            R::Other,
            None,
            when_if(g(K::Augment))
                .meta()
                .data_defs()
                .any(&[K::Case])
                .operations()
                .build(),
        ),
        support(
            K::Rpc,
            A::Identifier,
            R::Operation,
            None,
            g(K::Rpc)
                .any(&[K::IfFeature])
                .meta()
                .definitions()
                .optional(&[K::Input, K::Output])
                .build(),
        ),
        support(
            K::Input,
            A::None,
            R::Operation,
            None,
            g(K::Input)
                .v11(|g| g.any(&[K::Must]))
                .definitions()
                .data_defs()
                .build(),
        ),
        support(
            K::Output,
            A::None,
            R::Operation,
            None,
            g(K::Output)
                .v11(|g| g.any(&[K::Must]))
                .definitions()
                .data_defs()
                .build(),
        ),
        support(
            K::Notification,
            A::Identifier,
            R::Operation,
            None,
            g(K::Notification)
                .any(&[K::IfFeature])
                .v11(|g| g.any(&[K::Must]))
                .meta()
                .definitions()
                .data_defs()
                .build(),
        ),
        support(
            K::Deviation,
            A::SchemaNodeId,
            R::Other,
            None,
            g(K::Deviation)
                .optional(&[K::Description, K::Reference])
                .at_least_one(K::Deviate)
                .build(),
        ),
        support(
            K::Deviate,
            A::Deviate,
            R::Other,
            None,
            g(K::Deviate)
                .optional(&[
                    K::Units,
                    K::Config,
                    K::Mandatory,
                    K::MinElements,
                    K::MaxElements,
                    K::Type,
                ])
                .any(&[K::Must, K::Unique, K::Default])
                .build(),
        ),
        support(
            K::Must,
            A::String,
            R::Other,
            None,
            g(K::Must)
                .optional(&[K::ErrorMessage, K::ErrorAppTag, K::Description, K::Reference])
                .build(),
        ),
        support(
            K::When,
            A::String,
            R::Other,
            None,
            g(K::When)
                .optional(&[K::Description, K::Reference])
                .build(),
        ),
    ];

    // YANG 1.1 only statements.
    if version == YangVersion::V1_1 {
        out.push(support(
            K::Anydata,
            A::Identifier,
            R::DataNode,
            None,
            when_if(g(K::Anydata))
                .any(&[K::Must])
                .optional(&[K::Config, K::Mandatory])
                .meta()
                .build(),
        ));
        out.push(support(
            K::Action,
            A::Identifier,
            R::Operation,
            None,
            g(K::Action)
                .any(&[K::IfFeature])
                .meta()
                .definitions()
                .optional(&[K::Input, K::Output])
                .build(),
        ));
        out.push(leaf_statement(K::Modifier, A::String, version));
    }

    for (keyword, argument) in [
        (K::YangVersion, A::Version),
        (K::Namespace, A::String),
        (K::Prefix, A::Name),
        (K::RevisionDate, A::Revision),
        (K::Organization, A::String),
        (K::Contact, A::String),
        (K::Description, A::String),
        (K::Reference, A::String),
        (K::Units, A::String),
        (K::Default, A::String),
        (K::Status, A::Status),
        (K::Config, A::Boolean),
        (K::Mandatory, A::Boolean),
        (K::Presence, A::String),
        (K::OrderedBy, A::OrderedBy),
        (K::MinElements, A::Unsigned),
        (K::MaxElements, A::MaxElements),
        (K::Key, A::Keys),
        (K::Unique, A::String),
        (K::Base, A::Reference),
        (K::Path, A::Path),
        (K::RequireInstance, A::Boolean),
        (K::FractionDigits, A::FractionDigits),
        (K::Position, A::Unsigned),
        (K::Value, A::Integer),
        (K::IfFeature, A::IfFeature),
        (K::ErrorMessage, A::String),
        (K::ErrorAppTag, A::String),
        (K::YinElement, A::Boolean),
    ] {
        out.push(leaf_statement(keyword, argument, version));
    }
    out
}

/// Derived types and plain built-ins accept every restriction. Applicability to the
/// resolved base is checked when the type is built.
fn generic_type(version: YangVersion) -> SubstatementValidator {
    Grammar::new(K::Type, version)
        .optional(&[K::Length, K::Range, K::FractionDigits, K::RequireInstance])
        .any(&[K::Pattern])
        .v11(|g| g.any(&[K::Enum, K::Bit]))
        .build()
}

pub(super) fn type_grammars(version: YangVersion) -> Vec<(TypeGrammar, SubstatementValidator)> {
    let g = || Grammar::new(K::Type, version);
    vec![
        (TypeGrammar::Generic, generic_type(version)),
        (TypeGrammar::Bits, g().at_least_one(K::Bit).build()),
        (
            TypeGrammar::Decimal64,
            g().mandatory(K::FractionDigits).optional(&[K::Range]).build(),
        ),
        (TypeGrammar::Enumeration, g().at_least_one(K::Enum).build()),
        (
            TypeGrammar::Identityref,
            if version == YangVersion::V1_1 {
                g().at_least_one(K::Base).build()
            } else {
                g().mandatory(K::Base).build()
            },
        ),
        (
            TypeGrammar::InstanceIdentifier,
            g().optional(&[K::RequireInstance]).build(),
        ),
        (
            TypeGrammar::Leafref,
            g().mandatory(K::Path)
                .v11(|g| g.optional(&[K::RequireInstance]))
                .build(),
        ),
        (TypeGrammar::Union, g().at_least_one(K::Type).build()),
    ]
}
