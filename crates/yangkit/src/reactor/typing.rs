//! Type resolution: every `type` and `typedef` gets a [`TypeDefinition`].

use std::sync::Arc;

use super::action::{ActionQueue, InferenceAction, Prerequisite, Readiness, Unmet};
use super::namespace::NamespaceKind;
use super::{Phase, Reactor};
use crate::diagnostics::DiagnosticKind;
use crate::model::{ConstraintError, MemberDecl, Pattern, Restrictions, restrict};
use crate::stmt::{Argument, Keyword, StmtId, TypeRef};

impl Reactor {
    /// Queue one action per original `type` and `typedef`. Copies share the
    /// definition of their original.
    pub(super) fn resolve_types(&mut self) -> bool {
        let mut queue = ActionQueue::new();
        for id in self.tree.walk() {
            let ctx = self.tree.get(id);
            if ctx.copy_of.is_some() || self.tree.is_pruned(id) {
                continue;
            }
            match ctx.yang_keyword() {
                Some(Keyword::Type) => self.queue_type(&mut queue, id),
                Some(Keyword::Typedef) => self.queue_typedef(&mut queue, id),
                _ => {}
            }
        }
        log::debug!("typing: {} actions queued", queue.len());
        queue.run(self)
    }

    fn queue_type(&self, queue: &mut ActionQueue<Reactor>, id: StmtId) {
        let Some(Argument::Type(type_ref)) = self.tree.get(id).argument.clone() else {
            return;
        };
        let mut prerequisites = Vec::new();
        if let TypeRef::Derived(qname) = &type_ref {
            prerequisites.push(Prerequisite::Namespace {
                kind: NamespaceKind::Typedef,
                from: id,
                key: qname.clone(),
                phase: Phase::EffectiveModel,
            });
        }
        for member in self.tree.children_of_kind(id, Keyword::Type) {
            prerequisites.push(Prerequisite::Statement {
                id: member,
                phase: Phase::EffectiveModel,
            });
        }
        for base in self.tree.children_of_kind(id, Keyword::Base) {
            if let Some(identity) = self.tree.get(base).qname() {
                prerequisites.push(Prerequisite::Namespace {
                    kind: NamespaceKind::Identity,
                    from: base,
                    key: identity.clone(),
                    phase: Phase::StatementDefinition,
                });
            }
        }

        let label = format!("type {type_ref}");
        let span = self.tree.get(id).argument_span();
        let unresolved = type_ref.clone();
        queue.push(InferenceAction::new(
            label,
            prerequisites,
            move |r: &mut Reactor| r.define_type(id, &type_ref),
            move |r: &mut Reactor, unmet: &[Unmet]| {
                let missing = unmet.iter().find_map(|u| match &u.prerequisite {
                    Prerequisite::Namespace { kind, key, .. }
                        if u.readiness == Readiness::Missing =>
                    {
                        Some((*kind, key.clone()))
                    }
                    _ => None,
                });
                match missing {
                    Some((NamespaceKind::Identity, identity)) => {
                        r.unresolved_identity(&identity, span)
                    }
                    Some((_, qname)) => r
                        .diagnostics
                        .report(DiagnosticKind::UnresolvedType, span)
                        .message(format!("Type [{qname}] was not found."))
                        .emit(),
                    None => r
                        .diagnostics
                        .report(DiagnosticKind::ReferenceCycle, span)
                        .message(format!(
                            "Type [{unresolved}] depends on an unresolved or circular definition."
                        ))
                        .emit(),
                }
            },
        ));
    }

    fn queue_typedef(&self, queue: &mut ActionQueue<Reactor>, typedef: StmtId) {
        let Some(type_stmt) = self.tree.first_child(typedef, Keyword::Type) else {
            return;
        };
        let label = format!("typedef {}", self.tree.get(typedef).raw());
        // A stalled typedef always has a stalled `type` child that reports.
        queue.push(InferenceAction::new(
            label,
            vec![Prerequisite::Statement {
                id: type_stmt,
                phase: Phase::EffectiveModel,
            }],
            move |r: &mut Reactor| r.define_typedef(typedef, type_stmt),
            |_: &mut Reactor, _: &[Unmet]| {},
        ));
    }

    fn define_type(&mut self, id: StmtId, type_ref: &TypeRef) {
        let base = match type_ref {
            TypeRef::Builtin(builtin) => self.builtins.get(builtin).cloned(),
            TypeRef::Derived(qname) => self
                .namespaces
                .lookup(&self.tree, NamespaceKind::Typedef, id, qname)
                .and_then(|typedef| self.typedefs.get(&typedef).cloned()),
        };
        let Some(base) = base else {
            return;
        };
        let local = match type_ref {
            TypeRef::Builtin(builtin) => builtin.as_str(),
            TypeRef::Derived(qname) => qname.local_name(),
        };
        let Some(qname) = self
            .namespace_of(id)
            .and_then(|namespace| namespace.bind(local).ok())
        else {
            return;
        };
        let version = self.version_of(id);

        let definition = self
            .restrictions_of(id)
            .and_then(|restrictions| restrict(qname, &base, restrictions, version));
        let definition = match definition {
            Ok(definition) => Arc::new(definition),
            Err(err) => {
                self.report_constraint(id, err);
                // keep the base so dependents do not stall on top of this error
                base
            }
        };
        self.types.insert(id, definition);
        self.tree.get_mut(id).completed = Some(Phase::EffectiveModel);
    }

    fn restrictions_of(&self, id: StmtId) -> Result<Restrictions, ConstraintError> {
        let mut restrictions = Restrictions::default();
        for &child in self.tree.children(id) {
            let ctx = self.tree.get(child);
            let Some(keyword) = ctx.yang_keyword() else {
                continue;
            };
            match (keyword, &ctx.argument) {
                (Keyword::Length, _) => restrictions.length = Some(ctx.raw().to_string()),
                (Keyword::Range, _) => restrictions.range = Some(ctx.raw().to_string()),
                (Keyword::Pattern, _) => {
                    let inverted = self.tree.first_child_raw(child, Keyword::Modifier)
                        == Some("invert-match");
                    restrictions.patterns.push(Pattern::new(ctx.raw(), inverted)?);
                }
                (Keyword::FractionDigits, Some(Argument::FractionDigits(digits))) => {
                    restrictions.fraction_digits = Some(*digits)
                }
                (Keyword::Bit, _) => restrictions.bits.push(MemberDecl {
                    name: ctx.raw().into(),
                    explicit: self
                        .tree
                        .first_child(child, Keyword::Position)
                        .and_then(|p| match self.tree.get(p).argument {
                            Some(Argument::Unsigned(position)) => {
                                Some(i64::try_from(position).unwrap_or(i64::MAX))
                            }
                            _ => None,
                        }),
                }),
                (Keyword::Enum, _) => restrictions.enums.push(MemberDecl {
                    name: ctx.raw().into(),
                    explicit: self
                        .tree
                        .first_child(child, Keyword::Value)
                        .and_then(|v| match self.tree.get(v).argument {
                            Some(Argument::Integer(value)) => Some(value),
                            _ => None,
                        }),
                }),
                (Keyword::Base, Some(Argument::Reference(identity))) => {
                    restrictions.bases.push(identity.clone())
                }
                (Keyword::Path, Some(Argument::Path(path))) => {
                    restrictions.path = Some(path.clone())
                }
                (Keyword::RequireInstance, Some(Argument::Boolean(value))) => {
                    restrictions.require_instance = Some(*value)
                }
                (Keyword::Type, _) => {
                    if let Some(member) = self.types.get(&child) {
                        restrictions.members.push(member.clone());
                    }
                }
                _ => {}
            }
        }
        Ok(restrictions)
    }

    fn report_constraint(&mut self, id: StmtId, err: ConstraintError) {
        let kind = match &err {
            ConstraintError::Restriction(_) => DiagnosticKind::InvalidRestriction,
            ConstraintError::Overflow(_) => DiagnosticKind::NumberingOverflow,
            ConstraintError::Duplicate(_) => DiagnosticKind::DuplicateNumbering,
            ConstraintError::Pattern(_) => DiagnosticKind::InvalidPattern,
        };
        let span = self.tree.get(id).span;
        self.diagnostics.report(kind, span).message(err.to_string()).emit();
    }

    fn define_typedef(&mut self, typedef: StmtId, type_stmt: StmtId) {
        let Some(definition) = self.types.get(&type_stmt) else {
            return;
        };
        let Some(qname) = self.tree.get(typedef).qname().cloned() else {
            return;
        };
        let default = self.tree.first_child_raw(typedef, Keyword::Default).map(Into::into);
        let units = self.tree.first_child_raw(typedef, Keyword::Units).map(Into::into);
        let renamed = definition.renamed(qname, default, units);
        self.typedefs.insert(typedef, Arc::new(renamed));
        self.tree.get_mut(typedef).completed = Some(Phase::EffectiveModel);
    }
}
