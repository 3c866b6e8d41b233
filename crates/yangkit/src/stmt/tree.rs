//! Statement context arena.

use yangkit_core::{QName, QNameModule};

use super::argument::Argument;
use super::keyword::{Keyword, StmtKeyword};
use crate::diagnostics::Span;
use crate::reactor::Phase;

/// Handle of a statement in a [`StmtTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOrigin {
    /// Written in a source.
    Declaration,
    /// Created by the reactor: implicit `case`, `input` and `output`.
    Context,
}

/// Why a statement is a copy of another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyKind {
    AddedByUses,
    AddedByAugment,
    Refine,
    /// A property added or replaced by `deviate`.
    Deviate,
}

#[derive(Debug, Clone)]
pub struct StmtCtx {
    pub keyword: StmtKeyword,
    pub raw_argument: Option<String>,
    /// Set once during statement definition.
    pub argument: Option<Argument>,
    pub parent: Option<StmtId>,
    pub children: Vec<StmtId>,
    pub origin: StatementOrigin,
    pub span: Span,
    pub argument_span: Option<Span>,
    /// The `module` or `submodule` this statement was declared in.
    pub root: StmtId,
    pub copy_of: Option<StmtId>,
    pub copy_kind: Option<CopyKind>,
    /// The `uses`, `augment` or `deviation` whose application created this statement.
    pub introduced_by: Option<StmtId>,
    pub completed: Option<Phase>,
    pub pruned: bool,
    /// `uses` whose copies have been appended.
    pub expanded: bool,
}

impl StmtCtx {
    pub fn yang_keyword(&self) -> Option<Keyword> {
        self.keyword.yang()
    }

    pub fn is(&self, keyword: Keyword) -> bool {
        self.keyword.is(keyword)
    }

    pub fn raw(&self) -> &str {
        self.raw_argument.as_deref().unwrap_or("")
    }

    pub fn qname(&self) -> Option<&QName> {
        self.argument.as_ref().and_then(Argument::as_qname)
    }

    /// The span diagnostics about the argument should point at.
    pub fn argument_span(&self) -> Span {
        self.argument_span.unwrap_or(self.span)
    }
}

/// Options for [`StmtTree::deep_copy`].
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub kind: CopyKind,
    pub introduced_by: StmtId,
    /// Rebind schema node names to this module (`uses` into another module).
    pub target_module: Option<QNameModule>,
}

#[derive(Debug, Default)]
pub struct StmtTree {
    stmts: Vec<StmtCtx>,
    roots: Vec<StmtId>,
}

impl StmtTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn roots(&self) -> &[StmtId] {
        &self.roots
    }

    pub fn ids(&self) -> impl Iterator<Item = StmtId> + use<> {
        (0..self.stmts.len() as u32).map(StmtId)
    }

    pub fn get(&self, id: StmtId) -> &StmtCtx {
        &self.stmts[id.index()]
    }

    pub fn get_mut(&mut self, id: StmtId) -> &mut StmtCtx {
        &mut self.stmts[id.index()]
    }

    /// Add a root statement. Its `root` points at itself.
    pub fn add_root(
        &mut self,
        keyword: StmtKeyword,
        raw_argument: Option<String>,
        span: Span,
        argument_span: Option<Span>,
    ) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(StmtCtx {
            keyword,
            raw_argument,
            argument: None,
            parent: None,
            children: Vec::new(),
            origin: StatementOrigin::Declaration,
            span,
            argument_span,
            root: id,
            copy_of: None,
            copy_kind: None,
            introduced_by: None,
            completed: None,
            pruned: false,
            expanded: false,
        });
        self.roots.push(id);
        id
    }

    /// Append a child at the end of `parent`'s children.
    pub fn add_child(
        &mut self,
        parent: StmtId,
        keyword: StmtKeyword,
        raw_argument: Option<String>,
        origin: StatementOrigin,
        span: Span,
        argument_span: Option<Span>,
    ) -> StmtId {
        let id = self.alloc(parent, keyword, raw_argument, origin, span, argument_span);
        self.stmts[parent.index()].children.push(id);
        id
    }

    fn alloc(
        &mut self,
        parent: StmtId,
        keyword: StmtKeyword,
        raw_argument: Option<String>,
        origin: StatementOrigin,
        span: Span,
        argument_span: Option<Span>,
    ) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        let root = self.stmts[parent.index()].root;
        self.stmts.push(StmtCtx {
            keyword,
            raw_argument,
            argument: None,
            parent: Some(parent),
            children: Vec::new(),
            origin,
            span,
            argument_span,
            root,
            copy_of: None,
            copy_kind: None,
            introduced_by: None,
            completed: None,
            pruned: false,
            expanded: false,
        });
        id
    }

    /// Put `child` between `parent` and its current children at `position`.
    pub fn wrap_child(&mut self, parent: StmtId, position: usize, keyword: Keyword) -> StmtId {
        let child = self.stmts[parent.index()].children[position];
        let (raw, span, argument, argument_span) = {
            let ctx = self.get(child);
            (
                ctx.raw_argument.clone(),
                ctx.span,
                ctx.argument.clone(),
                ctx.argument_span,
            )
        };
        let wrapper = self.alloc(
            parent,
            StmtKeyword::Yang(keyword),
            raw,
            StatementOrigin::Context,
            span,
            argument_span,
        );
        self.stmts[wrapper.index()].argument = argument;
        self.stmts[wrapper.index()].children.push(child);
        self.stmts[child.index()].parent = Some(wrapper);
        self.stmts[parent.index()].children[position] = wrapper;
        wrapper
    }

    /// Unlink `id` from its parent. The statement stays in the arena but is no longer
    /// reachable from any root.
    pub fn detach(&mut self, id: StmtId) {
        if let Some(parent) = self.stmts[id.index()].parent.take() {
            self.stmts[parent.index()].children.retain(|child| *child != id);
        }
    }

    /// Every statement reachable from the roots, parents before children.
    pub fn walk(&self) -> Vec<StmtId> {
        let mut out = Vec::with_capacity(self.stmts.len());
        let mut pending: Vec<StmtId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            out.push(id);
            pending.extend(self.get(id).children.iter().rev());
        }
        out
    }

    pub fn children(&self, id: StmtId) -> &[StmtId] {
        &self.get(id).children
    }

    pub fn children_of_kind(
        &self,
        id: StmtId,
        keyword: Keyword,
    ) -> impl Iterator<Item = StmtId> + '_ {
        self.get(id)
            .children
            .iter()
            .copied()
            .filter(move |child| self.get(*child).is(keyword))
    }

    pub fn first_child(&self, id: StmtId, keyword: Keyword) -> Option<StmtId> {
        self.children_of_kind(id, keyword).next()
    }

    pub fn first_child_raw(&self, id: StmtId, keyword: Keyword) -> Option<&str> {
        self.first_child(id, keyword).map(|child| self.get(child).raw())
    }

    pub fn parent(&self, id: StmtId) -> Option<StmtId> {
        self.get(id).parent
    }

    /// `id` and its parents up to the root.
    pub fn ancestors(&self, id: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        std::iter::successors(Some(id), move |current| self.parent(*current))
    }

    pub fn is_ancestor_or_self(&self, ancestor: StmtId, id: StmtId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// The declaration a copy was made from, following copy chains to the end.
    pub fn original(&self, id: StmtId) -> StmtId {
        let mut current = id;
        while let Some(source) = self.get(current).copy_of {
            current = source;
        }
        current
    }

    /// Whether the statement has been removed by `if-feature`, directly or through
    /// an ancestor or the expansion that introduced it.
    pub fn is_pruned(&self, id: StmtId) -> bool {
        self.ancestors(id).any(|a| {
            let ctx = self.get(a);
            ctx.pruned || ctx.introduced_by.is_some_and(|by| self.is_pruned(by))
        })
    }

    /// Whether the statement sits inside a `grouping` (and is therefore not instantiated).
    pub fn in_grouping(&self, id: StmtId) -> bool {
        self.ancestors(id)
            .skip(1)
            .any(|a| self.get(a).is(Keyword::Grouping))
    }

    /// Copy `source` and its subtree under `new_parent` at `position`.
    ///
    /// `uses` statements are skipped: their expansion is already present as siblings.
    pub fn deep_copy(
        &mut self,
        source: StmtId,
        new_parent: StmtId,
        position: usize,
        options: &CopyOptions,
    ) -> StmtId {
        let copy = self.copy_node(source, new_parent, options);
        self.stmts[new_parent.index()]
            .children
            .insert(position, copy);
        copy
    }

    fn copy_node(&mut self, source: StmtId, new_parent: StmtId, options: &CopyOptions) -> StmtId {
        let src = self.get(source).clone();
        // Pruning through an inner expansion must survive re-copying.
        let pruned = src.pruned || src.introduced_by.is_some_and(|by| self.is_pruned(by));
        let id = StmtId(self.stmts.len() as u32);
        let argument = match (&options.target_module, &src.argument) {
            (Some(module), Some(Argument::Identifier(qname)))
                if src.yang_keyword().is_some_and(Keyword::is_schema_node) =>
            {
                Some(Argument::Identifier(qname.bind_to(module)))
            }
            _ => src.argument.clone(),
        };
        self.stmts.push(StmtCtx {
            keyword: src.keyword.clone(),
            raw_argument: src.raw_argument.clone(),
            argument,
            parent: Some(new_parent),
            children: Vec::new(),
            origin: src.origin,
            span: src.span,
            argument_span: src.argument_span,
            root: src.root,
            copy_of: Some(source),
            copy_kind: Some(options.kind),
            introduced_by: Some(options.introduced_by),
            completed: src.completed,
            pruned,
            expanded: src.expanded,
        });

        for child in src.children {
            if self.get(child).is(Keyword::Uses) {
                continue;
            }
            let copied = self.copy_node(child, id, options);
            self.stmts[id.index()].children.push(copied);
        }
        id
    }
}
