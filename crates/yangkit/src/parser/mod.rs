//! Parser infrastructure for YANG source text.
//!
//! # Architecture
//!
//! The parser produces a lossless concrete syntax tree (CST) via Rowan's green tree builder:
//!
//! - Zero-copy lexing: tokens carry spans, text sliced only when building tree nodes
//! - Trivia buffering: whitespace/comments collected, then attached as leading trivia
//! - Open blocks are tracked so an unclosed `{` points back at its opening brace
//!
//! # Recovery Strategy
//!
//! The parser is resilient: it always produces a tree. Unknown tokens get wrapped in
//! `SyntaxKind::Error` nodes and consumed; a missing `;` is reported without consuming.
//!
//! Fuel exhaustion (exec fuel, recursion fuel) returns an actual error immediately.

pub mod ast;
pub mod cst;
pub mod lexer;

mod core;
mod grammar;
mod invariants;


pub use ast::{Argument, Block, Root, Statement};
pub use core::{ParseResult, Parser};
pub use cst::{SyntaxKind, SyntaxNode, SyntaxToken};

use crate::Error;
use crate::source_map::SourceId;
use lexer::lex;

pub const DEFAULT_PARSE_FUEL: u32 = 1_000_000;
pub const DEFAULT_PARSE_MAX_DEPTH: u32 = 4096;

/// Parse one source with explicit fuel limits.
pub fn parse(
    source: &str,
    source_id: SourceId,
    exec_fuel: Option<u32>,
    recursion_fuel: Option<u32>,
) -> Result<ParseResult, Error> {
    Parser::new(source, source_id, lex(source))
        .with_exec_fuel(exec_fuel)
        .with_recursion_fuel(recursion_fuel)
        .parse()
}

/// Indented CST dump, trivia omitted.
pub fn dump_cst(root: &SyntaxNode) -> String {
    use std::fmt::Write;

    fn go(node: &SyntaxNode, indent: usize, w: &mut String) -> std::fmt::Result {
        writeln!(w, "{}{:?}", "  ".repeat(indent), node.kind())?;
        for child in node.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Node(n) => go(&n, indent + 1, w)?,
                rowan::NodeOrToken::Token(t) if !t.kind().is_trivia() => {
                    writeln!(w, "{}{:?} {:?}", "  ".repeat(indent + 1), t.kind(), t.text())?;
                }
                rowan::NodeOrToken::Token(_) => {}
            }
        }
        Ok(())
    }

    let mut out = String::new();
    go(root, 0, &mut out).expect("String write never fails");
    out
}
