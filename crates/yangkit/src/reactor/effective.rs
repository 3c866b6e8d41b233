//! Effective model construction and the checks that need the finished model.

use std::sync::Arc;

use super::{ModuleCtx, Reactor};
use crate::diagnostics::DiagnosticKind;
use crate::model::{EffectiveModel, Flags, Identity, ModuleInfo, NodeData, NodeId, TypeDefinition, TypeKind};
use crate::stack::SchemaInferenceStack;
use crate::stmt::{Argument, CopyKind, Keyword, OrderedBy, StmtId};

/// Flags a child inherits from its parent.
#[derive(Clone, Copy)]
struct Inherited {
    config: bool,
    in_operation: bool,
}

impl Reactor {
    pub(super) fn build_effective(&mut self) -> EffectiveModel {
        let mut model = EffectiveModel::new();
        let modules: Vec<ModuleCtx> = self.modules.values().cloned().collect();
        let top = Inherited {
            config: true,
            in_operation: false,
        };
        for module in modules.iter().filter(|m| m.belongs_to.is_none()) {
            let ctx = self.tree.get(module.root);
            let root = model.push_node(
                None,
                NodeData {
                    keyword: ctx.keyword.clone(),
                    argument: Some(module.name.clone()),
                    qname: None,
                    span: ctx.span,
                    flags: Flags::default().with_config(true),
                    type_definition: None,
                    keys: Vec::new(),
                },
            );
            model.add_module(ModuleInfo {
                name: module.name.clone(),
                namespace: module.namespace.clone(),
                prefix: module.prefix.clone(),
                version: module.version,
                root,
            });
            self.build_children(&mut model, module.root, root, top);
            for submodule in modules.iter().filter(|m| m.belongs_to == Some(module.root)) {
                self.build_children(&mut model, submodule.root, root, top);
            }
        }
        log::debug!("effective model has {} nodes", model.len());

        for conflict in model.link() {
            let duplicate = model.node(conflict.duplicate);
            let existing = model.node(conflict.existing);
            let name = duplicate
                .qname()
                .map_or_else(String::new, |q| q.local_name().to_string());
            self.diagnostics
                .report(DiagnosticKind::DuplicateSchemaNode, duplicate.span())
                .message(format!("Schema node [{name}] is defined more than once."))
                .related_to("first defined here", existing.span())
                .emit();
        }
        self.check_list_keys(&model);
        self.check_choice_defaults(&model);
        if self.config.validate_leafrefs && !self.diagnostics.has_errors() {
            self.check_leafrefs(&model);
        }
        model
    }

    fn build_children(
        &mut self,
        model: &mut EffectiveModel,
        stmt: StmtId,
        parent: NodeId,
        inherited: Inherited,
    ) {
        let children = self.tree.children(stmt).to_vec();
        for child in children {
            if self.tree.is_pruned(child) {
                continue;
            }
            let ctx = self.tree.get(child);
            // extension instances have no effective counterpart
            let Some(keyword) = ctx.yang_keyword() else {
                continue;
            };
            if matches!(
                keyword,
                Keyword::Uses | Keyword::Augment | Keyword::Refine | Keyword::Deviation
            ) {
                continue;
            }

            let (flags, next) = self.flags_of(child, keyword, inherited);
            let ctx = self.tree.get(child);
            let qname = ctx.qname().cloned();
            let keys = match (keyword, &qname) {
                (Keyword::List, Some(list)) => self
                    .tree
                    .first_child(child, Keyword::Key)
                    .and_then(|key| match &self.tree.get(key).argument {
                        Some(Argument::Keys(keys)) => Some(
                            keys.iter().map(|k| k.bind_to(list.module())).collect(),
                        ),
                        _ => None,
                    })
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            let data = NodeData {
                keyword: ctx.keyword.clone(),
                argument: ctx.raw_argument.as_deref().map(Into::into),
                qname: qname.clone(),
                span: ctx.span,
                flags,
                type_definition: self.type_of(child, keyword),
                keys,
            };
            let node = model.push_node(Some(parent), data);

            match (keyword, qname) {
                (Keyword::Identity, Some(qname)) => {
                    let bases = self
                        .tree
                        .children_of_kind(child, Keyword::Base)
                        .filter_map(|base| self.tree.get(base).qname().cloned())
                        .collect();
                    model.add_identity(Identity { qname, bases, node });
                }
                (Keyword::Feature, Some(qname)) if self.feature_supported(&qname, 0) => {
                    model.add_feature(qname, node);
                }
                _ => {}
            }
            self.build_children(model, child, node, next);
        }
    }

    fn type_of(&self, id: StmtId, keyword: Keyword) -> Option<Arc<TypeDefinition>> {
        match keyword {
            Keyword::Type => self.types.get(&self.tree.original(id)).cloned(),
            Keyword::Leaf | Keyword::LeafList => {
                let type_stmt = self.tree.first_child(id, Keyword::Type)?;
                self.types.get(&self.tree.original(type_stmt)).cloned()
            }
            Keyword::Typedef => self.typedefs.get(&self.tree.original(id)).cloned(),
            _ => None,
        }
    }

    fn flags_of(
        &mut self,
        id: StmtId,
        keyword: Keyword,
        inherited: Inherited,
    ) -> (Flags, Inherited) {
        let explicit_config = self.tree.first_child(id, Keyword::Config).and_then(|c| {
            match self.tree.get(c).argument {
                Some(Argument::Boolean(value)) => Some((c, value)),
                _ => None,
            }
        });
        let in_operation = inherited.in_operation
            || matches!(
                keyword,
                Keyword::Rpc
                    | Keyword::Action
                    | Keyword::Notification
                    | Keyword::Input
                    | Keyword::Output
            );
        if let Some((stmt, true)) = explicit_config
            && !inherited.config
            && !in_operation
        {
            let span = self.tree.get(stmt).span;
            self.diagnostics
                .report(DiagnosticKind::InvalidConfig, span)
                .message("Parent node has config=false, this node must not be specified as config=true")
                .emit();
        }
        let config = !in_operation
            && match explicit_config {
                Some((_, value)) => value,
                None => inherited.config,
            };

        let mandatory = match self.tree.first_child(id, Keyword::Mandatory) {
            Some(m) => matches!(self.tree.get(m).argument, Some(Argument::Boolean(true))),
            None => self
                .tree
                .first_child(id, Keyword::MinElements)
                .is_some_and(|m| matches!(self.tree.get(m).argument, Some(Argument::Unsigned(n)) if n > 0)),
        };
        let status = self
            .tree
            .first_child(id, Keyword::Status)
            .and_then(|s| match self.tree.get(s).argument {
                Some(Argument::Status(status)) => Some(status),
                _ => None,
            })
            .unwrap_or_default();
        let user_ordered = self.tree.first_child(id, Keyword::OrderedBy).is_some_and(|o| {
            matches!(self.tree.get(o).argument, Some(Argument::OrderedBy(OrderedBy::User)))
        });
        let presence = self.tree.first_child(id, Keyword::Presence).is_some();
        let (added_by_uses, augmenting) = self.provenance(id);

        let flags = Flags::default()
            .with_config(config)
            .with_mandatory(mandatory)
            .with_status(status)
            .with_user_ordered(user_ordered)
            .with_presence(presence)
            .with_added_by_uses(added_by_uses)
            .with_augmenting(augmenting);
        let next = Inherited {
            config,
            in_operation,
        };
        (flags, next)
    }

    /// Whether a statement was copied by `uses` and whether by `augment`, anywhere
    /// along its copy chain. Nodes of an `augment` nested in `uses` are both.
    fn provenance(&self, id: StmtId) -> (bool, bool) {
        let mut added_by_uses = false;
        let mut augmenting = false;
        let mut current = Some(id);
        while let Some(stmt) = current {
            let ctx = self.tree.get(stmt);
            match ctx.copy_kind {
                Some(CopyKind::AddedByUses) => added_by_uses = true,
                Some(CopyKind::AddedByAugment) => {
                    augmenting = true;
                    let in_uses = ctx
                        .introduced_by
                        .and_then(|augment| self.tree.parent(augment))
                        .is_some_and(|parent| self.tree.get(parent).is(Keyword::Uses));
                    added_by_uses |= in_uses;
                }
                _ => {}
            }
            current = ctx.copy_of;
        }
        (added_by_uses, augmenting)
    }

    fn check_list_keys(&mut self, model: &EffectiveModel) {
        for id in model.node_ids() {
            let list = model.node(id);
            if !list.is(Keyword::List) {
                continue;
            }
            for key in list.keys() {
                let is_leaf = list
                    .schema_child(key)
                    .is_some_and(|child| model.node(child).is(Keyword::Leaf));
                if !is_leaf {
                    let list_name = list.qname().map_or("", |q| q.local_name());
                    self.diagnostics
                        .report(DiagnosticKind::InvalidListKey, list.span())
                        .message(format!(
                            "Key [{}] of list [{list_name}] is not a leaf of the list.",
                            key.local_name()
                        ))
                        .emit();
                }
            }
        }
    }

    fn check_choice_defaults(&mut self, model: &EffectiveModel) {
        for id in model.node_ids() {
            let choice = model.node(id);
            if !choice.is(Keyword::Choice) {
                continue;
            }
            let Some(default) = choice
                .substatements()
                .iter()
                .map(|s| model.node(*s))
                .find(|s| s.is(Keyword::Default))
            else {
                continue;
            };
            let name = default.argument().unwrap_or("");
            let found = choice
                .schema_children()
                .any(|case| model.node(case).qname().is_some_and(|q| q.local_name() == name));
            if !found {
                let choice_name = choice.qname().map_or("", |q| q.local_name());
                self.diagnostics
                    .report(DiagnosticKind::InvalidDefault, default.span())
                    .message(format!(
                        "Default case [{name}] of choice [{choice_name}] was not found."
                    ))
                    .emit();
            }
        }
    }

    /// Resolve the path of every leafref outside groupings.
    fn check_leafrefs(&mut self, model: &EffectiveModel) {
        let mut checked = 0usize;
        for id in model.node_ids() {
            let node = model.node(id);
            if !(node.is(Keyword::Leaf) || node.is(Keyword::LeafList)) {
                continue;
            }
            let Some(leafref) = node
                .type_definition()
                .filter(|t| matches!(t.kind(), TypeKind::Leafref { .. }))
            else {
                continue;
            };
            if model
                .ancestors(id)
                .any(|a| model.node(a).is(Keyword::Grouping))
            {
                continue;
            }
            checked += 1;
            let resolved = SchemaInferenceStack::of_node(model, id)
                .and_then(|stack| stack.resolve_leafref(leafref));
            if let Err(err) = resolved {
                self.diagnostics
                    .report(DiagnosticKind::InvalidLeafref, node.span())
                    .message(err.to_string())
                    .emit();
            }
        }
        log::debug!("validated {checked} leafref paths");
    }
}
