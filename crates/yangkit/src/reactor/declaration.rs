//! Statement definition: arguments, grammars and namespace registration.

use super::namespace::{NamespaceKey, NamespaceKind};
use super::{Phase, Reactor};
use crate::diagnostics::DiagnosticKind;
use crate::stmt::{
    Argument, ArgumentError, ArgumentKind, Keyword, StatementOrigin, StmtId, StmtKeyword,
    parse_argument,
};

impl Reactor {
    pub(super) fn declare_statements(&mut self) {
        let roots: Vec<StmtId> = self.modules.keys().copied().collect();
        for root in roots {
            self.declare(root);
        }
        self.wrap_shorthand_cases();
        self.add_implicit_operations();
    }

    fn declare(&mut self, id: StmtId) {
        let Some(module) = self.module_of(id).cloned() else {
            return;
        };
        let ctx = self.tree.get(id);
        let keyword = match &ctx.keyword {
            StmtKeyword::Extension { prefix, .. } => {
                // Extension bodies are opaque: only the prefix has to resolve.
                if !module.prefixes.contains_key(prefix) {
                    let prefix = prefix.clone();
                    let span = ctx.span;
                    self.diagnostics
                        .report(DiagnosticKind::UnresolvedPrefix, span)
                        .message(prefix)
                        .emit();
                }
                self.tree.get_mut(id).completed = Some(Phase::StatementDefinition);
                return;
            }
            StmtKeyword::Yang(keyword) => *keyword,
        };
        // Keywords unknown to this YANG version are reported by the parent's grammar.
        let Some(support) = self.catalog.get(keyword, module.version) else {
            return;
        };
        let argument_kind = support.argument;

        let argument = match (argument_kind, ctx.raw_argument.as_deref()) {
            (ArgumentKind::None, None) => None,
            (ArgumentKind::None, Some(_)) => {
                self.diagnostics
                    .report(DiagnosticKind::UnexpectedArgument, ctx.argument_span())
                    .message(keyword.as_str())
                    .emit();
                None
            }
            (_, None) => {
                self.diagnostics
                    .report(DiagnosticKind::MissingArgument, ctx.span)
                    .message(keyword.as_str())
                    .emit();
                None
            }
            (kind, Some(raw)) => match parse_argument(kind, raw, module.version, &module) {
                Ok(argument) => Some(argument),
                Err(ArgumentError::Invalid(msg)) => {
                    self.diagnostics
                        .report(DiagnosticKind::InvalidArgument, ctx.argument_span())
                        .message(msg)
                        .emit();
                    None
                }
                Err(ArgumentError::UnboundPrefix(prefix)) => {
                    self.diagnostics
                        .report(DiagnosticKind::UnresolvedPrefix, ctx.argument_span())
                        .message(prefix)
                        .emit();
                    None
                }
            },
        };
        // `input` and `output` take no argument but are addressed by name.
        let argument = match keyword {
            Keyword::Input | Keyword::Output => module
                .namespace
                .bind(keyword.as_str())
                .ok()
                .map(Argument::Identifier),
            _ => argument,
        };

        // `type` grammars depend on the base type; an unparsable one gets the generic grammar.
        let validator = match &argument {
            Some(Argument::Type(type_ref)) => self.catalog.type_validator(type_ref, module.version),
            _ => &support.validator,
        };
        validator.validate(&self.tree, id, &mut self.diagnostics);

        let defines = support.defines;
        let stmt = self.tree.get_mut(id);
        stmt.argument = argument;
        stmt.completed = Some(Phase::StatementDefinition);

        if let Some(kind) = defines {
            self.register(kind, id);
        }

        let children = self.tree.children(id).to_vec();
        for child in children {
            self.declare(child);
        }
    }

    fn register(&mut self, kind: NamespaceKind, id: StmtId) {
        // Modules, submodules and prefixes are indexed during linkage.
        if matches!(
            kind,
            NamespaceKind::Module | NamespaceKind::Submodule | NamespaceKind::ImportPrefix
        ) {
            return;
        }
        let ctx = self.tree.get(id);
        let Some(qname) = ctx.qname().cloned() else {
            return;
        };
        let scope = if kind.is_scoped() { ctx.parent } else { None };
        let span = ctx.argument_span();
        if let Err(existing) = self
            .namespaces
            .add(kind, scope, NamespaceKey::QName(qname.clone()), id)
        {
            let previous = self.tree.get(existing).argument_span();
            self.diagnostics
                .report(DiagnosticKind::DuplicateDefinition, span)
                .message(qname.local_name())
                .related_to(format!("{kind} `{}` first defined here", qname.local_name()), previous)
                .emit();
        }
    }

    /// A data definition placed directly under `choice` gets an implicit `case` of the
    /// same name.
    fn wrap_shorthand_cases(&mut self) {
        let choices: Vec<StmtId> = self
            .tree
            .walk()
            .into_iter()
            .filter(|id| self.tree.get(*id).is(Keyword::Choice))
            .collect();
        for choice in choices {
            self.wrap_shorthands_of(choice);
        }
    }

    pub(super) fn wrap_shorthands_of(&mut self, choice: StmtId) {
        for position in 0..self.tree.children(choice).len() {
            let child = self.tree.children(choice)[position];
            let is_shorthand = self
                .tree
                .get(child)
                .yang_keyword()
                .is_some_and(Keyword::is_shorthand_case);
            if is_shorthand {
                let case = self.tree.wrap_child(choice, position, Keyword::Case);
                let completed = self.tree.get(child).completed;
                self.tree.get_mut(case).completed = completed;
            }
        }
    }

    /// Every `rpc` and `action` has an `input` and an `output`, declared or not.
    fn add_implicit_operations(&mut self) {
        let operations: Vec<StmtId> = self
            .tree
            .walk()
            .into_iter()
            .filter(|id| {
                let ctx = self.tree.get(*id);
                ctx.is(Keyword::Rpc) || ctx.is(Keyword::Action)
            })
            .collect();
        for operation in operations {
            let Some(namespace) = self.namespace_of(operation) else {
                continue;
            };
            for keyword in [Keyword::Input, Keyword::Output] {
                if self.tree.first_child(operation, keyword).is_some() {
                    continue;
                }
                let span = self.tree.get(operation).span;
                let id = self.tree.add_child(
                    operation,
                    StmtKeyword::Yang(keyword),
                    None,
                    StatementOrigin::Context,
                    span,
                    None,
                );
                let stmt = self.tree.get_mut(id);
                stmt.argument = namespace.bind(keyword.as_str()).ok().map(Argument::Identifier);
                stmt.completed = Some(Phase::StatementDefinition);
            }
        }
    }
}
