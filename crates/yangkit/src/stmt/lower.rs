//! Lowering from the CST into the statement arena.

use yangkit_core::is_identifier;

use super::keyword::{Keyword, StmtKeyword};
use super::tree::{StatementOrigin, StmtId, StmtTree};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Span};
use crate::parser::{Root, Statement};
use crate::source_map::SourceId;

/// Lower one parsed source. A source holds exactly one `module` or `submodule`.
pub fn lower_source(
    root: &Root,
    source: SourceId,
    tree: &mut StmtTree,
    diagnostics: &mut Diagnostics,
) -> Option<StmtId> {
    let mut statements = root.statements();
    let Some(first) = statements.next() else {
        let span = Span::new(source, root.text_range());
        diagnostics
            .report(DiagnosticKind::ExpectedKeyword, span)
            .message("source contains no `module` or `submodule`")
            .emit();
        return None;
    };

    for extra in statements {
        diagnostics
            .report(
                DiagnosticKind::InvalidSubstatement,
                Span::new(source, extra.keyword_range()),
            )
            .message("a source may contain only one `module` or `submodule`")
            .emit();
    }

    let keyword = lower_keyword(&first, source, diagnostics)?;
    if !keyword.yang().is_some_and(Keyword::is_module) {
        diagnostics
            .report(
                DiagnosticKind::ExpectedKeyword,
                Span::new(source, first.keyword_range()),
            )
            .message(format!("expected `module` or `submodule`, found `{keyword}`"))
            .emit();
        return None;
    }

    let (raw, argument_span) = argument_of(&first, source);
    let id = tree.add_root(
        keyword,
        raw,
        Span::new(source, first.keyword_range()),
        argument_span,
    );
    lower_children(&first, id, source, tree, diagnostics);
    Some(id)
}

fn lower_children(
    stmt: &Statement,
    parent: StmtId,
    source: SourceId,
    tree: &mut StmtTree,
    diagnostics: &mut Diagnostics,
) {
    for child in stmt.substatements() {
        let Some(keyword) = lower_keyword(&child, source, diagnostics) else {
            continue;
        };
        let (raw, argument_span) = argument_of(&child, source);
        let id = tree.add_child(
            parent,
            keyword,
            raw,
            StatementOrigin::Declaration,
            Span::new(source, child.keyword_range()),
            argument_span,
        );
        lower_children(&child, id, source, tree, diagnostics);
    }
}

fn argument_of(stmt: &Statement, source: SourceId) -> (Option<String>, Option<Span>) {
    match stmt.argument() {
        Some(arg) => (Some(arg.value()), Some(Span::new(source, arg.text_range()))),
        None => (None, None),
    }
}

/// Unknown unprefixed keywords are reported and their whole subtree dropped.
fn lower_keyword(
    stmt: &Statement,
    source: SourceId,
    diagnostics: &mut Diagnostics,
) -> Option<StmtKeyword> {
    let text = stmt.keyword()?;
    let span = Span::new(source, stmt.keyword_range());

    if let Some((prefix, name)) = text.split_once(':') {
        if is_identifier(prefix) && is_identifier(name) {
            return Some(StmtKeyword::Extension {
                prefix: prefix.to_string(),
                name: name.to_string(),
            });
        }
        diagnostics
            .report(DiagnosticKind::UnknownKeyword, span)
            .message(text)
            .emit();
        return None;
    }

    match Keyword::lookup(&text) {
        Some(keyword) => Some(StmtKeyword::Yang(keyword)),
        None => {
            diagnostics
                .report(DiagnosticKind::UnknownKeyword, span)
                .message(text)
                .emit();
            None
        }
    }
}
