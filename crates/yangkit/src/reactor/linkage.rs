//! Source linkage: module index, imports, includes and prefix tables.

use std::collections::HashMap;

use yangkit_core::{QNameModule, Revision, YangVersion};

use super::namespace::{NamespaceKey, NamespaceKind};
use super::{ModuleCtx, Reactor};
use crate::diagnostics::DiagnosticKind;
use crate::stmt::{Keyword, StmtId};

fn versioned(name: &str, revision: Option<Revision>) -> NamespaceKey {
    match revision {
        Some(revision) => NamespaceKey::Name(format!("{name}@{revision}").into()),
        None => NamespaceKey::Name(name.into()),
    }
}

impl Reactor {
    pub(super) fn link_sources(&mut self) {
        let roots = self.tree.roots().to_vec();
        for &root in &roots {
            self.index_source(root);
        }

        for &root in &roots {
            if self.tree.get(root).is(Keyword::Module) {
                self.link_module(root);
            }
        }
        for &root in &roots {
            if self.tree.get(root).is(Keyword::Submodule) {
                self.link_submodule(root);
            }
        }

        let linked: Vec<StmtId> = self.modules.keys().copied().collect();
        for root in linked {
            self.link_imports(root);
            self.link_includes(root);
        }
        log::debug!("linked {} sources", self.modules.len());
    }

    fn latest_revision(&self, root: StmtId) -> Option<Revision> {
        self.tree
            .children_of_kind(root, Keyword::Revision)
            .filter_map(|rev| self.tree.get(rev).raw().parse().ok())
            .max()
    }

    /// Register a source under `name` and, if it has a revision, `name@revision`.
    /// The bare name always points at the latest revision seen.
    fn index_source(&mut self, root: StmtId) {
        let ctx = self.tree.get(root);
        let kind = if ctx.is(Keyword::Module) {
            NamespaceKind::Module
        } else {
            NamespaceKind::Submodule
        };
        let name = ctx.raw().to_string();
        let span = ctx.argument_span();
        let revision = self.latest_revision(root);

        let exact = versioned(&name, revision);
        if let Some(existing) = self.namespaces.get(kind, None, &exact)
            && self.latest_revision(existing) == revision
        {
            let previous = self.tree.get(existing).argument_span();
            self.diagnostics
                .report(DiagnosticKind::DuplicateDefinition, span)
                .message(&name)
                .related_to(format!("{kind} `{name}` first defined here"), previous)
                .emit();
            return;
        }

        let bare = NamespaceKey::Name(name.as_str().into());
        let newer = match self.namespaces.get(kind, None, &bare) {
            Some(existing) => self.latest_revision(existing) < revision,
            None => true,
        };
        if newer {
            let _ = self.namespaces.add(kind, None, bare, root);
        }
        if revision.is_some() {
            let _ = self.namespaces.add(kind, None, exact, root);
        }
    }

    fn header_version(&self, root: StmtId) -> YangVersion {
        self.tree
            .first_child_raw(root, Keyword::YangVersion)
            .and_then(YangVersion::parse)
            .unwrap_or_default()
    }

    fn link_module(&mut self, root: StmtId) {
        let namespace = QNameModule::new(
            self.tree.first_child_raw(root, Keyword::Namespace).unwrap_or(""),
            self.latest_revision(root),
        );
        let prefix = self.tree.first_child_raw(root, Keyword::Prefix).unwrap_or("");
        let ctx = ModuleCtx {
            name: self.tree.get(root).raw().into(),
            root,
            namespace: namespace.clone(),
            prefix: prefix.into(),
            version: self.header_version(root),
            prefixes: HashMap::from([(prefix.to_string(), namespace.clone())]),
            belongs_to: None,
        };
        self.namespaces.add_module_scope(namespace, root);
        self.modules.insert(root, ctx);
    }

    fn link_submodule(&mut self, root: StmtId) {
        let Some(belongs_to) = self.tree.first_child(root, Keyword::BelongsTo) else {
            // missing `belongs-to` is a grammar error reported during declaration
            return;
        };
        let module_name = self.tree.get(belongs_to).raw().to_string();
        let Some(main) = self
            .namespaces
            .get(NamespaceKind::Module, None, &module_name.as_str().into())
        else {
            let span = self.tree.get(belongs_to).span;
            self.diagnostics
                .report(DiagnosticKind::MissingSource, span)
                .message(format!(
                    "Module [{module_name}] from belongs-to was not found."
                ))
                .emit();
            return;
        };
        let Some(namespace) = self.modules.get(&main).map(|m| m.namespace.clone()) else {
            return;
        };
        let prefix = self
            .tree
            .first_child_raw(belongs_to, Keyword::Prefix)
            .unwrap_or("");
        let ctx = ModuleCtx {
            name: self.tree.get(root).raw().into(),
            root,
            namespace: namespace.clone(),
            prefix: prefix.into(),
            version: self.header_version(root),
            prefixes: HashMap::from([(prefix.to_string(), namespace.clone())]),
            belongs_to: Some(main),
        };
        self.namespaces.add_module_scope(namespace, root);
        self.modules.insert(root, ctx);
    }

    fn link_imports(&mut self, root: StmtId) {
        let imports: Vec<StmtId> = self.tree.children_of_kind(root, Keyword::Import).collect();
        for import in imports {
            let ctx = self.tree.get(import);
            let name = ctx.raw().to_string();
            let span = ctx.span;
            let revision = self
                .tree
                .first_child_raw(import, Keyword::RevisionDate)
                .and_then(|raw| raw.parse().ok());
            let Some(target) = self
                .namespaces
                .get(NamespaceKind::Module, None, &versioned(&name, revision))
            else {
                self.diagnostics
                    .report(DiagnosticKind::MissingSource, span)
                    .message(format!("Imported module [{name}] was not found."))
                    .emit();
                continue;
            };
            let Some(namespace) = self.modules.get(&target).map(|m| m.namespace.clone()) else {
                continue;
            };
            let prefix = self
                .tree
                .first_child_raw(import, Keyword::Prefix)
                .unwrap_or("")
                .to_string();
            let Some(module) = self.modules.get_mut(&root) else {
                continue;
            };
            if module.prefixes.contains_key(&prefix) {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateDefinition, span)
                    .message(format!("prefix {prefix}"))
                    .emit();
                continue;
            }
            log::trace!("{}: prefix `{prefix}` -> {namespace}", module.name);
            module.prefixes.insert(prefix, namespace);
        }
    }

    fn link_includes(&mut self, root: StmtId) {
        let includes: Vec<StmtId> = self.tree.children_of_kind(root, Keyword::Include).collect();
        for include in includes {
            let ctx = self.tree.get(include);
            let name = ctx.raw().to_string();
            let span = ctx.span;
            let revision = self
                .tree
                .first_child_raw(include, Keyword::RevisionDate)
                .and_then(|raw| raw.parse().ok());
            if self
                .namespaces
                .get(NamespaceKind::Submodule, None, &versioned(&name, revision))
                .is_none()
            {
                self.diagnostics
                    .report(DiagnosticKind::MissingSource, span)
                    .message(format!("Included submodule [{name}] was not found."))
                    .emit();
            }
        }
    }
}
