//! Namespace registry.
//!
//! One keyed store per [`NamespaceKind`]. Groupings and typedefs are scoped to the
//! statement that contains them; everything else is global. Values are statement
//! handles, so the registry never owns statement data.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use yangkit_core::{QName, QNameModule};

use crate::stmt::{StmtId, StmtTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    Module,
    Submodule,
    ImportPrefix,
    Grouping,
    Typedef,
    Identity,
    Feature,
    Extension,
}

impl NamespaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NamespaceKind::Module => "module",
            NamespaceKind::Submodule => "submodule",
            NamespaceKind::ImportPrefix => "import prefix",
            NamespaceKind::Grouping => "grouping",
            NamespaceKind::Typedef => "typedef",
            NamespaceKind::Identity => "identity",
            NamespaceKind::Feature => "feature",
            NamespaceKind::Extension => "extension",
        }
    }

    /// Lexically scoped kinds: visible in the defining subtree and its ancestors.
    pub fn is_scoped(self) -> bool {
        matches!(self, NamespaceKind::Grouping | NamespaceKind::Typedef)
    }

    /// Module lookups by bare name resolve to the latest registered revision.
    pub fn allows_overwrite(self) -> bool {
        matches!(self, NamespaceKind::Module | NamespaceKind::Submodule)
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespaceKey {
    Name(Arc<str>),
    QName(QName),
}

impl From<&str> for NamespaceKey {
    fn from(name: &str) -> Self {
        NamespaceKey::Name(name.into())
    }
}

impl From<QName> for NamespaceKey {
    fn from(qname: QName) -> Self {
        NamespaceKey::QName(qname)
    }
}

#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    entries: HashMap<(NamespaceKind, Option<StmtId>, NamespaceKey), StmtId>,
    /// Module roots plus the roots of submodules belonging to them.
    module_scopes: HashMap<QNameModule, Vec<StmtId>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value`. On a duplicate the existing value is returned and nothing changes,
    /// unless the kind allows overwrite.
    pub fn add(
        &mut self,
        kind: NamespaceKind,
        scope: Option<StmtId>,
        key: NamespaceKey,
        value: StmtId,
    ) -> Result<(), StmtId> {
        let slot = (kind, scope, key);
        match self.entries.get(&slot) {
            Some(existing) if *existing != value && !kind.allows_overwrite() => Err(*existing),
            _ => {
                self.entries.insert(slot, value);
                Ok(())
            }
        }
    }

    /// Exact lookup in one scope.
    pub fn get(&self, kind: NamespaceKind, scope: Option<StmtId>, key: &NamespaceKey) -> Option<StmtId> {
        // HashMap lookups need an owned tuple key
        self.entries.get(&(kind, scope, key.clone())).copied()
    }

    pub fn add_module_scope(&mut self, module: QNameModule, root: StmtId) {
        let roots = self.module_scopes.entry(module).or_default();
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    pub fn module_scope(&self, module: &QNameModule) -> &[StmtId] {
        self.module_scopes.get(module).map_or(&[], Vec::as_slice)
    }

    /// Resolve `qname` as seen from statement `from`.
    ///
    /// Scoped kinds walk the lexical ancestors of `from`'s original declaration, then the
    /// top level of every root sharing the name's module. Global kinds ignore `from`.
    pub fn lookup(
        &self,
        tree: &StmtTree,
        kind: NamespaceKind,
        from: StmtId,
        qname: &QName,
    ) -> Option<StmtId> {
        let key = NamespaceKey::QName(qname.clone());
        if !kind.is_scoped() {
            return self.get(kind, None, &key);
        }
        let origin = tree.original(from);
        tree.ancestors(origin)
            .chain(self.module_scope(qname.module()).iter().copied())
            .find_map(|scope| self.get(kind, Some(scope), &key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every value registered under `kind`, in no particular order.
    pub fn values(&self, kind: NamespaceKind) -> impl Iterator<Item = StmtId> + '_ {
        self.entries
            .iter()
            .filter(move |((k, _, _), _)| *k == kind)
            .map(|(_, value)| *value)
    }
}
