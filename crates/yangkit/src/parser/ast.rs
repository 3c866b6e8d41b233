//! Typed AST wrappers over CST nodes.
//!
//! Each struct wraps a `SyntaxNode` and provides typed accessors.
//! Cast is infallible for correct `SyntaxKind` - validation happens elsewhere.

use rowan::TextRange;

use super::cst::{SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn as_cst(&self) -> &SyntaxNode {
                &self.0
            }

            pub fn text_range(&self) -> TextRange {
                self.0.text_range()
            }
        }
    };
}

ast_node!(Root, Root);
ast_node!(Statement, Statement);
ast_node!(Argument, Argument);
ast_node!(Block, Block);

impl Root {
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        self.0.children().filter_map(Statement::cast)
    }
}

impl Statement {
    pub fn keyword_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Unquoted)
    }

    pub fn keyword(&self) -> Option<String> {
        self.keyword_token().map(|t| t.text().to_string())
    }

    /// Range of the keyword token, falling back to the whole statement.
    pub fn keyword_range(&self) -> TextRange {
        self.keyword_token()
            .map_or_else(|| self.text_range(), |t| t.text_range())
    }

    pub fn argument(&self) -> Option<Argument> {
        self.0.children().find_map(Argument::cast)
    }

    pub fn block(&self) -> Option<Block> {
        self.0.children().find_map(Block::cast)
    }

    pub fn substatements(&self) -> impl Iterator<Item = Statement> {
        self.block()
            .into_iter()
            .flat_map(|block| block.0.children().filter_map(Statement::cast))
    }
}

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        self.0.children().filter_map(Statement::cast)
    }
}

impl Argument {
    pub fn parts(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind().is_string())
    }

    pub fn is_quoted(&self) -> bool {
        self.parts()
            .next()
            .is_some_and(|t| t.kind() != SyntaxKind::Unquoted)
    }

    /// The argument value after quote removal, escape processing,
    /// indentation trimming and `+` concatenation.
    pub fn value(&self) -> String {
        let mut out = String::new();
        for part in self.parts() {
            let text = part.text();
            match part.kind() {
                SyntaxKind::DoubleQuoted => {
                    let body = &text[1..text.len() - 1];
                    let column = column_of(&part) + 1;
                    out.push_str(&unescape(&trim_indentation(body, column)));
                }
                SyntaxKind::SingleQuoted => out.push_str(&text[1..text.len() - 1]),
                _ => out.push_str(text),
            }
        }
        out
    }
}

const TAB_WIDTH: usize = 8;

fn advance(column: usize, c: char) -> usize {
    if c == '\t' {
        (column / TAB_WIDTH + 1) * TAB_WIDTH
    } else {
        column + 1
    }
}

/// Visual column where `token` starts, with tabs expanded to 8.
fn column_of(token: &SyntaxToken) -> usize {
    let mut prefix: Vec<String> = Vec::new();
    let mut cursor = token.prev_token();
    while let Some(prev) = cursor {
        let text = prev.text();
        if let Some(pos) = text.rfind('\n') {
            prefix.push(text[pos + 1..].to_string());
            break;
        }
        prefix.push(text.to_string());
        cursor = prev.prev_token();
    }
    prefix
        .iter()
        .rev()
        .flat_map(|s| s.chars())
        .fold(0, advance)
}

/// Strips layout indentation from continuation lines of a double-quoted string,
/// up to `column`, and trailing whitespace before each line break.
fn trim_indentation(body: &str, column: usize) -> String {
    if !body.contains('\n') {
        return body.to_string();
    }

    let mut out = String::with_capacity(body.len());
    let lines: Vec<&str> = body.split('\n').collect();
    let last = lines.len() - 1;
    for (i, line) in lines.iter().enumerate() {
        let mut line: &str = line;
        if i > 0 {
            line = strip_leading(line, column);
        }
        if i < last {
            line = line.trim_end_matches([' ', '\t', '\r']);
        }
        out.push_str(line);
        if i < last {
            out.push('\n');
        }
    }
    out
}

fn strip_leading(line: &str, column: usize) -> &str {
    let mut visual = 0;
    for (idx, c) in line.char_indices() {
        if c != ' ' && c != '\t' {
            return &line[idx..];
        }
        let next = advance(visual, c);
        if next > column {
            // A tab straddling the column is consumed entirely.
            return &line[idx + c.len_utf8()..];
        }
        visual = next;
        if visual == column {
            return &line[idx + c.len_utf8()..];
        }
    }
    ""
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
