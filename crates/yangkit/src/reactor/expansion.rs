//! Full declaration: `uses` expansion, `augment`, identity bases, deviations and
//! `if-feature`.

use yangkit_core::{QName, YangVersion};

use super::action::{ActionQueue, InferenceAction, Prerequisite, Readiness, Unmet};
use super::namespace::{NamespaceKey, NamespaceKind};
use super::{Phase, Reactor};
use crate::diagnostics::{DiagnosticKind, Span};
use crate::stmt::{
    Argument, CopyKind, CopyOptions, DeviateKind, IfFeatureExpr, Keyword, StmtId,
};

/// Refined substatements that add to the target instead of replacing it.
fn is_additive(keyword: Keyword, target: Keyword) -> bool {
    match keyword {
        Keyword::Must | Keyword::IfFeature => true,
        Keyword::Default => target == Keyword::LeafList,
        _ => false,
    }
}

/// Properties each `deviate` kind may carry.
fn deviate_allows(kind: DeviateKind, keyword: Keyword) -> bool {
    use Keyword as K;
    match kind {
        DeviateKind::NotSupported => false,
        DeviateKind::Add => matches!(
            keyword,
            K::Config
                | K::Default
                | K::Mandatory
                | K::MaxElements
                | K::MinElements
                | K::Must
                | K::Unique
                | K::Units
        ),
        DeviateKind::Replace => matches!(
            keyword,
            K::Config
                | K::Default
                | K::Mandatory
                | K::MaxElements
                | K::MinElements
                | K::Type
                | K::Units
        ),
        DeviateKind::Delete => matches!(keyword, K::Default | K::Must | K::Unique | K::Units),
    }
}

/// Node kinds a deviated property may be placed on.
fn deviation_target_allows(keyword: Keyword, target: Keyword, version: YangVersion) -> bool {
    use Keyword as K;
    match keyword {
        K::Config => matches!(
            target,
            K::Container | K::Leaf | K::LeafList | K::List | K::Choice | K::Anydata | K::Anyxml
        ),
        K::Default => matches!(target, K::Leaf | K::LeafList | K::Choice),
        K::Mandatory => matches!(target, K::Leaf | K::Choice | K::Anydata | K::Anyxml),
        K::MinElements | K::MaxElements => matches!(target, K::List | K::LeafList),
        K::Must => {
            matches!(
                target,
                K::Container | K::Leaf | K::LeafList | K::List | K::Anydata | K::Anyxml
            ) || (version == YangVersion::V1_1
                && matches!(target, K::Input | K::Output | K::Notification))
        }
        K::Type | K::Units => matches!(target, K::Leaf | K::LeafList),
        K::Unique => target == K::List,
        _ => false,
    }
}

/// Properties with an implicit value: `deviate replace` may supply them when absent.
fn is_implicit(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Config | Keyword::Mandatory | Keyword::MinElements | Keyword::MaxElements
    )
}

fn missing_key(unmet: &[Unmet]) -> Option<&QName> {
    unmet.iter().find_map(|u| match &u.prerequisite {
        Prerequisite::Namespace { key, .. } if u.readiness == Readiness::Missing => Some(key),
        _ => None,
    })
}

impl Reactor {
    pub(super) fn expand(&mut self) {
        let mut queue = ActionQueue::new();
        for id in self.tree.walk() {
            let ctx = self.tree.get(id);
            match ctx.yang_keyword() {
                Some(Keyword::Uses) => self.queue_uses(&mut queue, id),
                Some(Keyword::Augment)
                    if ctx.parent.is_some_and(|p| self.tree.get(p).yang_keyword().is_some_and(Keyword::is_module)) =>
                {
                    self.queue_augment(&mut queue, id)
                }
                Some(Keyword::Base)
                    if ctx.parent.is_some_and(|p| self.tree.get(p).is(Keyword::Identity)) =>
                {
                    self.queue_identity_base(&mut queue, id)
                }
                _ => {}
            }
        }
        log::debug!("expansion: {} actions queued", queue.len());
        if !queue.run(self) {
            return;
        }
        // Deviations see the tree after every `uses` and `augment` has landed.
        let mut queue = ActionQueue::new();
        for id in self.tree.walk() {
            let ctx = self.tree.get(id);
            let top_level = ctx
                .parent
                .is_some_and(|p| self.tree.get(p).yang_keyword().is_some_and(Keyword::is_module));
            if ctx.is(Keyword::Deviation) && top_level {
                self.queue_deviation(&mut queue, id);
            }
        }
        log::debug!("expansion: {} deviations queued", queue.len());
        if !queue.run(self) {
            return;
        }
        self.evaluate_if_features();
    }

    fn queue_uses(&self, queue: &mut ActionQueue<Reactor>, uses: StmtId) {
        let Some(grouping) = self.tree.get(uses).qname().cloned() else {
            return;
        };
        let mut prerequisites = vec![Prerequisite::Namespace {
            kind: NamespaceKind::Grouping,
            from: uses,
            key: grouping.clone(),
            phase: Phase::FullDeclaration,
        }];
        // `uses` nested in this one's refine and augment bodies go first.
        let mut pending = self.tree.children(uses).to_vec();
        while let Some(id) = pending.pop() {
            if self.tree.get(id).is(Keyword::Uses) {
                prerequisites.push(Prerequisite::Statement {
                    id,
                    phase: Phase::FullDeclaration,
                });
            }
            pending.extend(self.tree.children(id));
        }

        let span = self.tree.get(uses).argument_span();
        let label = format!("uses {grouping}");
        let missing = grouping.clone();
        queue.push(InferenceAction::new(
            label,
            prerequisites,
            move |r: &mut Reactor| r.expand_uses(uses, &grouping),
            move |r: &mut Reactor, unmet: &[Unmet]| {
                if missing_key(unmet).is_some() {
                    r.diagnostics
                        .report(DiagnosticKind::UnresolvedGrouping, span)
                        .message(format!("Grouping [{missing}] was not found."))
                        .emit();
                } else {
                    r.diagnostics
                        .report(DiagnosticKind::ReferenceCycle, span)
                        .message(format!(
                            "Grouping [{missing}] depends on an unresolved or circular uses."
                        ))
                        .emit();
                }
            },
        ));
    }

    fn expand_uses(&mut self, uses: StmtId, grouping: &QName) {
        let Some(definition) =
            self.namespaces
                .lookup(&self.tree, NamespaceKind::Grouping, uses, grouping)
        else {
            return;
        };
        let Some(parent) = self.tree.parent(uses) else {
            return;
        };
        let Some(mut position) = self.tree.children(parent).iter().position(|c| *c == uses) else {
            return;
        };
        position += 1;

        let options = CopyOptions {
            kind: CopyKind::AddedByUses,
            introduced_by: uses,
            target_module: self.namespace_of(uses),
        };
        let children = self.tree.children(definition).to_vec();
        let mut copied = 0usize;
        for child in children {
            if !self
                .tree
                .get(child)
                .yang_keyword()
                .is_some_and(Keyword::is_schema_node)
            {
                continue;
            }
            self.tree.deep_copy(child, parent, position, &options);
            position += 1;
            copied += 1;
        }
        log::trace!("uses {grouping}: copied {copied} nodes");

        let refines: Vec<StmtId> = self.tree.children_of_kind(uses, Keyword::Refine).collect();
        for refine in refines {
            self.apply_refine(uses, parent, refine);
        }
        let augments: Vec<StmtId> = self.tree.children_of_kind(uses, Keyword::Augment).collect();
        for augment in augments {
            let Some(target) = self.augment_target(parent, augment) else {
                continue;
            };
            let options = CopyOptions {
                kind: CopyKind::AddedByAugment,
                introduced_by: augment,
                target_module: None,
            };
            self.copy_augment_body(augment, target, &options);
        }
        self.tree.get_mut(uses).expanded = true;
    }

    fn invalid_target(&mut self, what: &str, stmt: StmtId) {
        let ctx = self.tree.get(stmt);
        let message = format!("{what} target [{}] was not found.", ctx.raw());
        let span = ctx.argument_span();
        self.diagnostics
            .report(DiagnosticKind::InvalidTarget, span)
            .message(message)
            .emit();
    }

    fn augment_target(&mut self, from: StmtId, augment: StmtId) -> Option<StmtId> {
        let target = match &self.tree.get(augment).argument {
            Some(Argument::SchemaNodeId(path)) => self.find_schema_node(from, path),
            _ => return None,
        };
        if target.is_none() {
            self.invalid_target("Augment", augment);
        }
        target
    }

    /// Replace singleton substatements of the refined node with the refine's own.
    fn apply_refine(&mut self, uses: StmtId, parent: StmtId, refine: StmtId) {
        let target = match &self.tree.get(refine).argument {
            Some(Argument::SchemaNodeId(path)) => self.find_schema_node(parent, path),
            _ => return,
        };
        let Some(target) = target else {
            self.invalid_target("Refine", refine);
            return;
        };
        let Some(target_keyword) = self.tree.get(target).yang_keyword() else {
            return;
        };

        let options = CopyOptions {
            kind: CopyKind::Refine,
            introduced_by: uses,
            target_module: None,
        };
        let properties = self.tree.children(refine).to_vec();
        for property in properties {
            if let Some(keyword) = self.tree.get(property).yang_keyword()
                && !is_additive(keyword, target_keyword)
            {
                let replaced: Vec<StmtId> = self.tree.children_of_kind(target, keyword).collect();
                for old in replaced {
                    self.tree.detach(old);
                }
            }
            let position = self.tree.children(target).len();
            self.tree.deep_copy(property, target, position, &options);
        }
    }

    fn copy_augment_body(&mut self, augment: StmtId, target: StmtId, options: &CopyOptions) {
        let children = self.tree.children(augment).to_vec();
        for child in children {
            let is_node = self
                .tree
                .get(child)
                .yang_keyword()
                .is_some_and(Keyword::is_schema_node);
            if !is_node {
                continue;
            }
            let position = self.tree.children(target).len();
            self.tree.deep_copy(child, target, position, options);
        }
        if self.tree.get(target).is(Keyword::Choice) {
            self.wrap_shorthands_of(target);
        }
    }

    fn queue_augment(&self, queue: &mut ActionQueue<Reactor>, augment: StmtId) {
        let Some(Argument::SchemaNodeId(path)) = self.tree.get(augment).argument.clone() else {
            return;
        };
        let prerequisites = vec![
            Prerequisite::SchemaNode {
                from: augment,
                path: path.clone(),
            },
            Prerequisite::Statement {
                id: augment,
                phase: Phase::FullDeclaration,
            },
        ];
        let label = format!("augment {}", self.tree.get(augment).raw());
        queue.push(InferenceAction::new(
            label,
            prerequisites,
            move |r: &mut Reactor| {
                let Some(target) = r.find_schema_node(augment, &path) else {
                    return;
                };
                let options = CopyOptions {
                    kind: CopyKind::AddedByAugment,
                    introduced_by: augment,
                    target_module: None,
                };
                r.copy_augment_body(augment, target, &options);
            },
            move |r: &mut Reactor, _: &[Unmet]| r.invalid_target("Augment", augment),
        ));
    }

    fn queue_deviation(&self, queue: &mut ActionQueue<Reactor>, deviation: StmtId) {
        let Some(Argument::SchemaNodeId(path)) = self.tree.get(deviation).argument.clone() else {
            return;
        };
        let prerequisites = vec![
            Prerequisite::SchemaNode {
                from: deviation,
                path: path.clone(),
            },
            Prerequisite::Statement {
                id: deviation,
                phase: Phase::FullDeclaration,
            },
        ];
        let label = format!("deviation {}", self.tree.get(deviation).raw());
        queue.push(InferenceAction::new(
            label,
            prerequisites,
            move |r: &mut Reactor| {
                if let Some(target) = r.find_schema_node(deviation, &path) {
                    r.apply_deviation(deviation, target);
                }
            },
            move |r: &mut Reactor, _: &[Unmet]| r.invalid_target("Deviation", deviation),
        ));
    }

    fn apply_deviation(&mut self, deviation: StmtId, target: StmtId) {
        let Some(target_keyword) = self.tree.get(target).yang_keyword() else {
            return;
        };
        let deviates: Vec<StmtId> = self
            .tree
            .children_of_kind(deviation, Keyword::Deviate)
            .collect();
        for deviate in deviates {
            let Some(Argument::Deviate(kind)) = &self.tree.get(deviate).argument else {
                continue;
            };
            let kind = *kind;
            let Some(properties) = self.deviate_properties(deviation, deviate, kind, target_keyword)
            else {
                continue;
            };
            let options = CopyOptions {
                kind: CopyKind::Deviate,
                introduced_by: deviation,
                target_module: None,
            };
            match kind {
                DeviateKind::NotSupported => {
                    log::trace!("deviation {}: not supported", self.tree.get(deviation).raw());
                    self.tree.get_mut(target).pruned = true;
                }
                DeviateKind::Add => {
                    for (property, keyword) in properties {
                        self.deviate_add(deviation, target, property, keyword, &options);
                    }
                }
                DeviateKind::Replace => {
                    for (property, keyword) in properties {
                        self.deviate_replace(deviation, target, property, keyword, &options);
                    }
                }
                DeviateKind::Delete => {
                    for (property, keyword) in properties {
                        self.deviate_delete(deviation, target, property, keyword);
                    }
                }
            }
        }
    }

    /// The properties of one `deviate`, if each is allowed for its kind and target.
    fn deviate_properties(
        &mut self,
        deviation: StmtId,
        deviate: StmtId,
        kind: DeviateKind,
        target_keyword: Keyword,
    ) -> Option<Vec<(StmtId, Keyword)>> {
        let version = self.version_of(deviation);
        let target = self.tree.get(deviation).raw().to_string();
        let deviate_raw = self.tree.get(deviate).raw().to_string();
        let mut properties = Vec::new();
        let mut valid = true;
        for property in self.tree.children(deviate).to_vec() {
            let ctx = self.tree.get(property);
            let Some(keyword) = ctx.yang_keyword() else {
                continue;
            };
            let span = ctx.span;
            if !deviate_allows(kind, keyword) {
                self.diagnostics
                    .report(DiagnosticKind::InvalidSubstatement, span)
                    .message(format!(
                        "`{keyword}` is not a valid substatement of `deviate {deviate_raw}`"
                    ))
                    .emit();
                valid = false;
            } else if !deviation_target_allows(keyword, target_keyword, version) {
                self.diagnostics
                    .report(DiagnosticKind::InvalidTarget, span)
                    .message(format!(
                        "{target} is not a valid deviation target for substatement {keyword}."
                    ))
                    .emit();
                valid = false;
            }
            properties.push((property, keyword));
        }
        valid.then_some(properties)
    }

    fn deviate_add(
        &mut self,
        deviation: StmtId,
        target: StmtId,
        property: StmtId,
        keyword: Keyword,
        options: &CopyOptions,
    ) {
        let single = is_implicit(keyword)
            || keyword == Keyword::Units
            || (keyword == Keyword::Default && !self.tree.get(target).is(Keyword::LeafList));
        if single && self.tree.first_child(target, keyword).is_some() {
            let message = format!(
                "Deviation cannot add substatement {keyword} to target node {} because it is \
                 already defined in target and can appear only once.",
                self.tree.get(deviation).raw()
            );
            let span = self.tree.get(property).span;
            self.diagnostics
                .report(DiagnosticKind::DuplicateSubstatement, span)
                .message(message)
                .emit();
            return;
        }
        let position = self.tree.children(target).len();
        self.tree.deep_copy(property, target, position, options);
    }

    fn deviate_replace(
        &mut self,
        deviation: StmtId,
        target: StmtId,
        property: StmtId,
        keyword: Keyword,
        options: &CopyOptions,
    ) {
        let span = self.tree.get(property).span;
        if keyword == Keyword::Default && self.tree.get(target).is(Keyword::LeafList) {
            let message = format!(
                "deviate replace of default in leaf-list {}",
                self.tree.get(deviation).raw()
            );
            self.diagnostics
                .report(DiagnosticKind::IgnoredStatement, span)
                .message(message)
                .emit();
            return;
        }
        let replaced: Vec<StmtId> = self.tree.children_of_kind(target, keyword).collect();
        if replaced.is_empty() && !is_implicit(keyword) {
            let message = format!(
                "Deviation cannot replace substatement {keyword} in target node {} because it \
                 does not exist in target node.",
                self.tree.get(deviation).raw()
            );
            self.diagnostics
                .report(DiagnosticKind::MissingSubstatement, span)
                .message(message)
                .emit();
            return;
        }
        for old in replaced {
            self.tree.detach(old);
        }
        let position = self.tree.children(target).len();
        self.tree.deep_copy(property, target, position, options);
    }

    /// Remove the target's substatement with the same keyword and argument.
    fn deviate_delete(&mut self, deviation: StmtId, target: StmtId, property: StmtId, keyword: Keyword) {
        let argument = self.tree.get(property).raw().to_string();
        let found = self
            .tree
            .children_of_kind(target, keyword)
            .find(|c| self.tree.get(*c).raw() == argument);
        match found {
            Some(old) => self.tree.detach(old),
            None => {
                let message = format!(
                    "deviate delete {keyword} '{argument}' in {}: no such substatement",
                    self.tree.get(deviation).raw()
                );
                let span = self.tree.get(property).span;
                self.diagnostics
                    .report(DiagnosticKind::IgnoredStatement, span)
                    .message(message)
                    .emit();
            }
        }
    }

    fn queue_identity_base(&self, queue: &mut ActionQueue<Reactor>, base: StmtId) {
        let Some(identity) = self.tree.get(base).qname().cloned() else {
            return;
        };
        let span = self.tree.get(base).argument_span();
        queue.push(InferenceAction::new(
            format!("base {identity}"),
            vec![Prerequisite::Namespace {
                kind: NamespaceKind::Identity,
                from: base,
                key: identity.clone(),
                phase: Phase::StatementDefinition,
            }],
            |_: &mut Reactor| {},
            move |r: &mut Reactor, _: &[Unmet]| r.unresolved_identity(&identity, span),
        ));
    }

    pub(super) fn unresolved_identity(&mut self, identity: &QName, span: Span) {
        self.diagnostics
            .report(DiagnosticKind::UnresolvedIdentity, span)
            .message(format!("Identity [{identity}] was not found."))
            .emit();
    }

    /// Prune every statement whose `if-feature` is false under the configured features.
    fn evaluate_if_features(&mut self) {
        let mut queue = ActionQueue::new();
        for id in self.tree.walk() {
            let conditions: Vec<(StmtId, IfFeatureExpr)> = self
                .tree
                .children_of_kind(id, Keyword::IfFeature)
                .filter_map(|c| match &self.tree.get(c).argument {
                    Some(Argument::IfFeature(expr)) => Some((c, expr.clone())),
                    _ => None,
                })
                .collect();
            for (condition, expr) in conditions {
                let prerequisites = expr
                    .features()
                    .into_iter()
                    .map(|feature| Prerequisite::Namespace {
                        kind: NamespaceKind::Feature,
                        from: condition,
                        key: feature.clone(),
                        phase: Phase::StatementDefinition,
                    })
                    .collect();
                let span = self.tree.get(condition).argument_span();
                let label = format!("if-feature {}", self.tree.get(condition).raw());
                queue.push(InferenceAction::new(
                    label,
                    prerequisites,
                    move |r: &mut Reactor| {
                        if !expr.evaluate(&|feature| r.feature_supported(feature, 0)) {
                            log::trace!("pruned statement {}", id.index());
                            r.tree.get_mut(id).pruned = true;
                        }
                    },
                    move |r: &mut Reactor, unmet: &[Unmet]| {
                        let Some(feature) = missing_key(unmet) else {
                            return;
                        };
                        r.diagnostics
                            .report(DiagnosticKind::UnresolvedFeature, span)
                            .message(format!("Feature [{feature}] was not found."))
                            .emit();
                    },
                ));
            }
        }
        queue.run(self);
    }

    /// A feature is supported if the configuration allows it and its own `if-feature`
    /// conditions hold. Circular feature conditions are unsupported.
    pub(super) fn feature_supported(&self, feature: &QName, depth: usize) -> bool {
        if let Some(supported) = &self.config.supported_features
            && !supported.contains(feature)
        {
            return false;
        }
        let Some(statement) = self.namespaces.get(
            NamespaceKind::Feature,
            None,
            &NamespaceKey::QName(feature.clone()),
        ) else {
            return false;
        };
        if depth > self.tree.len() {
            return false;
        }
        self.tree
            .children_of_kind(statement, Keyword::IfFeature)
            .all(|c| match &self.tree.get(c).argument {
                Some(Argument::IfFeature(expr)) => {
                    expr.evaluate(&|inner| self.feature_supported(inner, depth + 1))
                }
                _ => true,
            })
    }
}
