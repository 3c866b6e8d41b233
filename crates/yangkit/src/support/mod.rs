//! Statement support catalog.
//!
//! One [`StatementSupport`] per (keyword, YANG version) describes how the reactor
//! treats a statement: how its argument is parsed, which substatements it allows,
//! which namespace it defines into and what role its effective node plays.
//! `type` has additional grammars selected by the base type named in its argument.

mod grammar;
mod validator;


use std::collections::HashMap;

use yangkit_core::YangVersion;

pub use validator::{Cardinality, SubstatementValidator};

use crate::model::BuiltinType;
use crate::reactor::NamespaceKind;
use crate::stmt::{ArgumentKind, Keyword, TypeRef};

/// What the effective node built from a statement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Appears in instance data: container, leaf, list and friends.
    DataNode,
    /// Schema tree only: choice, case.
    SchemaNode,
    /// rpc, action, notification and their input/output.
    Operation,
    /// Reusable definitions that are never instantiated in place.
    Definition,
    /// Modules, linkage and property statements.
    Other,
}

#[derive(Debug, Clone)]
pub struct StatementSupport {
    pub keyword: Keyword,
    pub argument: ArgumentKind,
    pub validator: SubstatementValidator,
    pub role: NodeRole,
    /// Namespace the statement registers itself into during declaration.
    pub defines: Option<NamespaceKind>,
}

/// Grammars of `type`, keyed by the kind of base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeGrammar {
    /// Derived types and the built-ins without their own grammar.
    Generic,
    Bits,
    Decimal64,
    Enumeration,
    Identityref,
    InstanceIdentifier,
    Leafref,
    Union,
}

impl TypeGrammar {
    pub fn of(type_ref: &TypeRef) -> Self {
        match type_ref {
            TypeRef::Builtin(BuiltinType::Bits) => TypeGrammar::Bits,
            TypeRef::Builtin(BuiltinType::Decimal64) => TypeGrammar::Decimal64,
            TypeRef::Builtin(BuiltinType::Enumeration) => TypeGrammar::Enumeration,
            TypeRef::Builtin(BuiltinType::Identityref) => TypeGrammar::Identityref,
            TypeRef::Builtin(BuiltinType::InstanceIdentifier) => TypeGrammar::InstanceIdentifier,
            TypeRef::Builtin(BuiltinType::Leafref) => TypeGrammar::Leafref,
            TypeRef::Builtin(BuiltinType::Union) => TypeGrammar::Union,
            _ => TypeGrammar::Generic,
        }
    }
}

/// Registry of statement supports for both YANG versions.
#[derive(Debug, Clone)]
pub struct SupportCatalog {
    supports: HashMap<(Keyword, YangVersion), StatementSupport>,
    types: HashMap<(TypeGrammar, YangVersion), SubstatementValidator>,
}

impl Default for SupportCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SupportCatalog {
    /// The RFC 6020 and RFC 7950 statement set.
    pub fn new() -> Self {
        let mut catalog = Self {
            supports: HashMap::new(),
            types: HashMap::new(),
        };
        for version in [YangVersion::V1, YangVersion::V1_1] {
            for support in grammar::statements(version) {
                catalog.supports.insert((support.keyword, version), support);
            }
            for (kind, validator) in grammar::type_grammars(version) {
                catalog.types.insert((kind, version), validator);
            }
        }
        catalog
    }

    /// `None` for keywords the version does not define (`action` in YANG 1).
    pub fn get(&self, keyword: Keyword, version: YangVersion) -> Option<&StatementSupport> {
        self.supports.get(&(keyword, version))
    }

    pub fn type_validator(&self, type_ref: &TypeRef, version: YangVersion) -> &SubstatementValidator {
        let kind = TypeGrammar::of(type_ref);
        self.types
            .get(&(kind, version))
            .or_else(|| self.types.get(&(TypeGrammar::Generic, version)))
            .unwrap_or(&self.supports[&(Keyword::Type, version)].validator)
    }
}
