//! The statement inference reactor.
//!
//! Turns a [`StmtTree`] holding every module and submodule of a build into an
//! [`EffectiveModel`]. Work proceeds in four strictly ordered [`Phase`]s:
//!
//! - `SourceLinkage` ([`linkage`]): index sources, resolve imports, includes and prefixes
//! - `StatementDefinition` ([`declaration`]): parse arguments, check grammars, fill namespaces
//! - `FullDeclaration` ([`expansion`]): expand `uses`, apply `augment` and `deviation`,
//!   bind identities, evaluate `if-feature`
//! - `EffectiveModel` ([`typing`], [`effective`]): resolve types, build and check the model
//!
//! Anything that depends on a reference is queued as an [`InferenceAction`] and applied
//! by a fixed-point sweep once its prerequisites hold. A sweep without progress fails
//! the build with every pending action's diagnostic.
//!
//! The build is all-or-nothing: the first phase that reports an error ends it.

mod action;
mod declaration;
mod effective;
mod expansion;
mod linkage;
mod namespace;
mod typing;

#[cfg(test)]
mod reactor_tests;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use yangkit_core::{QName, QNameModule, SchemaNodeIdentifier, YangVersion};

pub use action::{
    ActionQueue, InferenceAction, Prerequisite, PrerequisiteCheck, Readiness, Unmet,
};
pub use namespace::{NamespaceKey, NamespaceKind, NamespaceRegistry};

use crate::diagnostics::Diagnostics;
use crate::model::{BuiltinType, EffectiveModel, TypeDefinition};
use crate::parser::{DEFAULT_PARSE_FUEL, DEFAULT_PARSE_MAX_DEPTH};
use crate::stmt::{Keyword, PrefixResolver, StmtId, StmtTree};
use crate::support::SupportCatalog;

/// Reactor phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    SourceLinkage,
    StatementDefinition,
    FullDeclaration,
    EffectiveModel,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::SourceLinkage,
        Phase::StatementDefinition,
        Phase::FullDeclaration,
        Phase::EffectiveModel,
    ];
}

/// Knobs of one schema build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub parse_fuel: u32,
    pub parse_max_depth: u32,
    /// `None` supports every feature.
    pub supported_features: Option<HashSet<QName>>,
    /// Resolve the path of every instantiated leafref with the inference stack.
    pub validate_leafrefs: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parse_fuel: DEFAULT_PARSE_FUEL,
            parse_max_depth: DEFAULT_PARSE_MAX_DEPTH,
            supported_features: None,
            validate_leafrefs: true,
        }
    }
}

/// Linkage facts of one module or submodule.
#[derive(Debug, Clone)]
pub(crate) struct ModuleCtx {
    pub name: Arc<str>,
    pub root: StmtId,
    /// Submodules share the namespace of the module they belong to.
    pub namespace: QNameModule,
    pub prefix: Arc<str>,
    pub version: YangVersion,
    pub prefixes: HashMap<String, QNameModule>,
    /// Root of the main module, for submodules.
    pub belongs_to: Option<StmtId>,
}

impl PrefixResolver for ModuleCtx {
    fn resolve_prefix(&self, prefix: &str) -> Option<QNameModule> {
        self.prefixes.get(prefix).cloned()
    }

    fn default_module(&self) -> QNameModule {
        self.namespace.clone()
    }
}

pub(crate) struct Reactor {
    tree: StmtTree,
    catalog: SupportCatalog,
    config: BuildConfig,
    namespaces: NamespaceRegistry,
    diagnostics: Diagnostics,
    /// Keyed by module or submodule root.
    modules: IndexMap<StmtId, ModuleCtx>,
    /// Resolved `type` statements, keyed by original declaration.
    types: HashMap<StmtId, Arc<TypeDefinition>>,
    /// Resolved `typedef` statements.
    typedefs: HashMap<StmtId, Arc<TypeDefinition>>,
    builtins: HashMap<BuiltinType, Arc<TypeDefinition>>,
}

/// Run every phase over `tree`.
///
/// On success the model comes with any warnings that were reported. On failure the
/// diagnostics hold at least one error, and [`Diagnostics::first`] is the one to surface.
pub fn infer(
    tree: StmtTree,
    config: &BuildConfig,
) -> Result<(EffectiveModel, Diagnostics), Diagnostics> {
    let mut reactor = Reactor::new(tree, config.clone());
    let mut model = None;
    for phase in Phase::ALL {
        log::debug!("phase {phase:?} started");
        match phase {
            Phase::SourceLinkage => reactor.link_sources(),
            Phase::StatementDefinition => reactor.declare_statements(),
            Phase::FullDeclaration => reactor.expand(),
            Phase::EffectiveModel => {
                if reactor.resolve_types() {
                    model = Some(reactor.build_effective());
                }
            }
        }
        if reactor.diagnostics.has_errors() {
            log::debug!(
                "phase {phase:?} failed with {} errors",
                reactor.diagnostics.error_count()
            );
            return Err(reactor.diagnostics);
        }
        log::debug!("phase {phase:?} finished");
    }
    match model {
        Some(model) => Ok((model, reactor.diagnostics)),
        None => Err(reactor.diagnostics),
    }
}

impl Reactor {
    fn new(tree: StmtTree, config: BuildConfig) -> Self {
        let builtins = BuiltinType::ALL
            .iter()
            .map(|b| (*b, Arc::new(TypeDefinition::builtin(*b))))
            .collect();
        Self {
            tree,
            catalog: SupportCatalog::new(),
            config,
            namespaces: NamespaceRegistry::new(),
            diagnostics: Diagnostics::new(),
            modules: IndexMap::new(),
            types: HashMap::new(),
            typedefs: HashMap::new(),
            builtins,
        }
    }

    /// Linkage context of the module or submodule `id` was declared in.
    fn module_of(&self, id: StmtId) -> Option<&ModuleCtx> {
        self.modules.get(&self.tree.get(id).root)
    }

    fn version_of(&self, id: StmtId) -> YangVersion {
        self.module_of(id).map_or(YangVersion::V1, |m| m.version)
    }

    fn namespace_of(&self, id: StmtId) -> Option<QNameModule> {
        self.module_of(id).map(|m| m.namespace.clone())
    }

    /// Whether every `uses` in the subtree of `id` has been expanded.
    fn is_fully_declared(&self, id: StmtId) -> bool {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let ctx = self.tree.get(current);
            if ctx.is(Keyword::Uses) && !ctx.expanded {
                return false;
            }
            pending.extend(ctx.children.iter().copied());
        }
        true
    }

    fn reached(&self, id: StmtId, phase: Phase) -> bool {
        match phase {
            Phase::FullDeclaration => self.is_fully_declared(id),
            _ => self.tree.get(id).completed.is_some_and(|done| done >= phase),
        }
    }

    /// Schema-node child of a statement by name. `choice`, `case`, `input` and
    /// `output` are ordinary steps.
    fn schema_child(&self, parent: StmtId, qname: &QName) -> Option<StmtId> {
        self.tree.children(parent).iter().copied().find(|child| {
            let ctx = self.tree.get(*child);
            ctx.yang_keyword().is_some_and(Keyword::is_schema_node) && ctx.qname() == Some(qname)
        })
    }

    /// Walk a schema node identifier over the statement tree. Absolute identifiers start
    /// at the roots of the first step's module; descendant ones at `from`.
    fn find_schema_node(&self, from: StmtId, path: &SchemaNodeIdentifier) -> Option<StmtId> {
        let (first, rest) = path.node_identifiers().split_first()?;
        let start = if path.is_absolute() {
            self.namespaces
                .module_scope(first.module())
                .iter()
                .find_map(|root| self.schema_child(*root, first))?
        } else {
            self.schema_child(from, first)?
        };
        rest.iter()
            .try_fold(start, |current, step| self.schema_child(current, step))
    }
}

impl PrerequisiteCheck for Reactor {
    fn check(&self, prerequisite: &Prerequisite) -> Readiness {
        match prerequisite {
            Prerequisite::Namespace {
                kind,
                from,
                key,
                phase,
            } => match self.namespaces.lookup(&self.tree, *kind, *from, key) {
                None => Readiness::Missing,
                Some(found) if self.reached(found, *phase) => Readiness::Ready,
                Some(_) => Readiness::Blocked,
            },
            Prerequisite::Statement { id, phase } => {
                if self.reached(*id, *phase) {
                    Readiness::Ready
                } else {
                    Readiness::Blocked
                }
            }
            Prerequisite::SchemaNode { from, path } => match self.find_schema_node(*from, path) {
                Some(_) => Readiness::Ready,
                None => Readiness::Missing,
            },
        }
    }
}
