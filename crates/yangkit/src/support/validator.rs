//! Substatement cardinality rules.

use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::stmt::{Keyword, StmtId, StmtTree};

/// How many times a substatement may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub min: u32,
    /// `None` is unbounded.
    pub max: Option<u32>,
}

impl Cardinality {
    pub const MANDATORY: Cardinality = Cardinality {
        min: 1,
        max: Some(1),
    };
    pub const OPTIONAL: Cardinality = Cardinality {
        min: 0,
        max: Some(1),
    };
    pub const ANY: Cardinality = Cardinality { min: 0, max: None };
    pub const AT_LEAST_ONE: Cardinality = Cardinality { min: 1, max: None };
}

/// Allowed substatements of one keyword, in RFC order.
///
/// Extension instances (`prefix:name`) are accepted everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstatementValidator {
    keyword: Keyword,
    rules: IndexMap<Keyword, Cardinality>,
}

impl SubstatementValidator {
    pub fn builder(keyword: Keyword) -> Self {
        Self {
            keyword,
            rules: IndexMap::new(),
        }
    }

    pub fn add_mandatory(self, keyword: Keyword) -> Self {
        self.add(keyword, Cardinality::MANDATORY)
    }

    pub fn add_optional(self, keyword: Keyword) -> Self {
        self.add(keyword, Cardinality::OPTIONAL)
    }

    pub fn add_any(self, keyword: Keyword) -> Self {
        self.add(keyword, Cardinality::ANY)
    }

    pub fn add_at_least_one(self, keyword: Keyword) -> Self {
        self.add(keyword, Cardinality::AT_LEAST_ONE)
    }

    /// Later rules for the same keyword replace earlier ones.
    pub fn add(mut self, keyword: Keyword, cardinality: Cardinality) -> Self {
        self.rules.insert(keyword, cardinality);
        self
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn cardinality(&self, keyword: Keyword) -> Option<Cardinality> {
        self.rules.get(&keyword).copied()
    }

    pub fn allows(&self, keyword: Keyword) -> bool {
        self.rules.contains_key(&keyword)
    }

    /// Check the children of `id`. Returns `false` if anything was reported.
    pub fn validate(&self, tree: &StmtTree, id: StmtId, diagnostics: &mut Diagnostics) -> bool {
        let mut valid = true;
        let mut counts: IndexMap<Keyword, u32> = IndexMap::new();

        for &child in tree.children(id) {
            let ctx = tree.get(child);
            let Some(keyword) = ctx.yang_keyword() else {
                continue;
            };
            let Some(rule) = self.rules.get(&keyword) else {
                diagnostics
                    .report(DiagnosticKind::InvalidSubstatement, ctx.span)
                    .message(format!(
                        "`{keyword}` is not a valid substatement of `{}`",
                        self.keyword
                    ))
                    .emit();
                valid = false;
                continue;
            };
            let count = counts.entry(keyword).or_insert(0);
            *count += 1;
            if rule.max.is_some_and(|max| *count > max) {
                diagnostics
                    .report(DiagnosticKind::DuplicateSubstatement, ctx.span)
                    .message(format!(
                        "Substatement `{keyword}` may occur at most once in `{}`",
                        self.keyword
                    ))
                    .emit();
                valid = false;
            }
        }

        let span = tree.get(id).span;
        for (keyword, rule) in &self.rules {
            if rule.min > counts.get(keyword).copied().unwrap_or(0) {
                diagnostics
                    .report(DiagnosticKind::MissingSubstatement, span)
                    .message(format!(
                        "Missing mandatory substatement `{keyword}` in `{}`",
                        self.keyword
                    ))
                    .emit();
                valid = false;
            }
        }
        valid
    }
}
