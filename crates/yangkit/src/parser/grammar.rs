//! Grammar productions for YANG statements.
//!
//! ```text
//! root      = statement*
//! statement = keyword argument? (";" | block)
//! argument  = unquoted | quoted ("+" quoted)*
//! block     = "{" statement* "}"
//! ```
//!
//! Keyword validity is not checked here; any unquoted token in keyword position
//! starts a statement.

use rowan::TextRange;

use super::core::Parser;
use super::cst::SyntaxKind;
use super::cst::token_sets::{ARGUMENT_FIRST, QUOTED};
use crate::diagnostics::DiagnosticKind;

impl Parser<'_> {
    pub fn parse_root(&mut self) {
        self.start_node(SyntaxKind::Root);

        loop {
            let kind = self.current();
            if self.should_stop() {
                break;
            }
            match kind {
                SyntaxKind::Unquoted => self.parse_statement(),
                SyntaxKind::BraceClose => {
                    self.error_and_bump_msg(DiagnosticKind::UnexpectedToken, "unmatched `}`")
                }
                SyntaxKind::Garbage => self.bump_garbage(),
                _ => self.error_and_bump(DiagnosticKind::ExpectedKeyword),
            }
        }

        self.eat_trivia();
        self.finish_node();
    }

    fn parse_statement(&mut self) {
        self.assert_current(SyntaxKind::Unquoted);
        if !self.enter_recursion() {
            return;
        }

        self.start_node(SyntaxKind::Statement);
        self.bump();

        if self.currently_is_one_of(ARGUMENT_FIRST) {
            self.parse_argument();
        }

        match self.current() {
            SyntaxKind::Semicolon => self.bump(),
            SyntaxKind::BraceOpen => self.parse_block(),
            SyntaxKind::Garbage => {
                self.bump_garbage();
                self.eat_token(SyntaxKind::Semicolon);
            }
            _ => {
                // Point right after the statement rather than at whatever follows it.
                let end = self.last_non_trivia_end().unwrap_or_else(|| self.eof_offset());
                self.error_at(DiagnosticKind::ExpectedTerminator, TextRange::empty(end));
            }
        }

        self.finish_node();
        self.exit_recursion();
    }

    /// A single unquoted token, or quoted strings joined by `+`.
    fn parse_argument(&mut self) {
        self.start_node(SyntaxKind::Argument);

        if !self.currently_is_one_of(QUOTED) {
            self.bump();
            self.finish_node();
            return;
        }

        self.bump();
        while self.currently_is(SyntaxKind::Plus) {
            let next = self.peek_nth(1);
            if !QUOTED.contains(next) {
                self.error_and_bump_msg(
                    DiagnosticKind::UnexpectedToken,
                    "`+` must be followed by a quoted string",
                );
                break;
            }
            self.bump();
            self.bump();
        }

        self.finish_node();
    }

    fn parse_block(&mut self) {
        self.start_node(SyntaxKind::Block);
        self.push_delimiter();
        self.bump();

        loop {
            let kind = self.current();
            if self.should_stop() {
                if let Some(open) = self.pop_delimiter() {
                    self.error_unclosed_delimiter(
                        DiagnosticKind::UnclosedBlock,
                        "block opened here",
                        open.span,
                    );
                }
                break;
            }

            match kind {
                SyntaxKind::BraceClose => {
                    self.bump();
                    self.pop_delimiter();
                    break;
                }
                SyntaxKind::Unquoted => self.parse_statement(),
                SyntaxKind::Garbage => self.bump_garbage(),
                _ => self.error_and_bump(DiagnosticKind::ExpectedKeyword),
            }
        }

        self.finish_node();
    }

    /// Garbage starting with a quote is an unterminated string; anything else is an invalid token.
    fn bump_garbage(&mut self) {
        let text = self.current_text();
        if text.starts_with('"') || text.starts_with('\'') {
            self.error_and_bump(DiagnosticKind::UnterminatedString);
        } else {
            self.error_and_bump(DiagnosticKind::InvalidToken);
        }
    }
}
