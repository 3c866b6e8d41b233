//! Leafref path expressions.
//!
//! ```text
//! path     = deref | location
//! deref    = "deref" "(" location ")" "/" location
//! location = ["/"] step ("/" step)*
//! step     = ".." | node-identifier predicate*
//! predicate = "[" node-identifier "=" "current" "(" ")" "/" key-path "]"
//! ```
//!
//! Prefixed steps are bound when the path is parsed, using the defining module's
//! prefix table. Unprefixed steps stay unqualified: the inference stack binds them to
//! the namespace of the statement it is positioned on.


use std::fmt;
use std::sync::Arc;

use logos::Logos;
use yangkit_core::QName;

use crate::stmt::{ArgumentError, PrefixResolver, parse_node_identifier};

/// A parsed `path` argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    text: Arc<str>,
    steps: PathSteps,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSteps {
    Location(LocationPath),
    /// `deref(argument)/relative`
    Deref {
        argument: LocationPath,
        relative: LocationPath,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationPath {
    text: Arc<str>,
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Parent,
    Child {
        name: StepName,
        predicates: Vec<Predicate>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepName {
    Qualified(QName),
    Unqualified(Arc<str>),
}

/// `[key = current()/../path]`. Retained for consumers; resolution ignores predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub key: StepName,
    pub current_path: Vec<Step>,
}

impl PathExpression {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn steps(&self) -> &PathSteps {
        &self.steps
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl LocationPath {
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepName::Qualified(qname) => write!(f, "{qname}"),
            StepName::Unqualified(local) => f.write_str(local),
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum PathToken {
    #[token("/")]
    Slash,
    #[token("..")]
    DotDot,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("=")]
    Equals,
    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*(:[A-Za-z_][A-Za-z0-9_.\-]*)?")]
    Name,
}

struct PathParser<'a> {
    text: &'a str,
    tokens: Vec<(PathToken, std::ops::Range<usize>)>,
    pos: usize,
    resolver: &'a dyn PrefixResolver,
}

/// Parse a `path` argument, binding prefixed steps through `resolver`.
pub fn parse_path(
    text: &str,
    resolver: &dyn PrefixResolver,
) -> Result<PathExpression, ArgumentError> {
    let mut lexer = PathToken::lexer(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(kind) => tokens.push((kind, lexer.span())),
            Err(()) => {
                return Err(ArgumentError::Invalid(format!(
                    "invalid path expression `{text}`: unexpected `{}`",
                    lexer.slice()
                )));
            }
        }
    }

    let mut parser = PathParser {
        text,
        tokens,
        pos: 0,
        resolver,
    };
    let steps = parser.parse_path()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(PathExpression {
        text: text.into(),
        steps,
    })
}

impl PathParser<'_> {
    fn peek(&self) -> Option<PathToken> {
        self.tokens.get(self.pos).map(|(kind, _)| *kind)
    }

    fn peek_nth(&self, n: usize) -> Option<PathToken> {
        self.tokens.get(self.pos + n).map(|(kind, _)| *kind)
    }

    fn slice(&self, index: usize) -> &str {
        &self.text[self.tokens[index].1.clone()]
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.text.len(), |(_, span)| span.start)
    }

    fn error(&self, detail: &str) -> ArgumentError {
        ArgumentError::Invalid(format!(
            "invalid path expression `{}`: {detail} at offset {}",
            self.text,
            self.offset()
        ))
    }

    fn expect(&mut self, kind: PathToken, what: &str) -> Result<(), ArgumentError> {
        if self.peek() == Some(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn parse_path(&mut self) -> Result<PathSteps, ArgumentError> {
        let is_deref = self.peek() == Some(PathToken::Name)
            && self.slice(self.pos) == "deref"
            && self.peek_nth(1) == Some(PathToken::ParenOpen);
        if !is_deref {
            return Ok(PathSteps::Location(self.parse_location(true)?));
        }

        self.pos += 2;
        let argument = self.parse_location(false)?;
        self.expect(PathToken::ParenClose, "`)`")?;
        self.expect(PathToken::Slash, "`/` after deref()")?;
        let relative = self.parse_location(false)?;
        Ok(PathSteps::Deref { argument, relative })
    }

    fn parse_location(&mut self, allow_absolute: bool) -> Result<LocationPath, ArgumentError> {
        let start = self.offset();
        let absolute = allow_absolute && self.peek() == Some(PathToken::Slash);
        if absolute {
            self.pos += 1;
        }

        let mut steps = vec![self.parse_step()?];
        while self.peek() == Some(PathToken::Slash) {
            self.pos += 1;
            steps.push(self.parse_step()?);
        }

        let end = self
            .pos
            .checked_sub(1)
            .map_or(start, |last| self.tokens[last].1.end);
        Ok(LocationPath {
            text: self.text[start..end].into(),
            absolute,
            steps,
        })
    }

    fn parse_step(&mut self) -> Result<Step, ArgumentError> {
        match self.peek() {
            Some(PathToken::DotDot) => {
                self.pos += 1;
                Ok(Step::Parent)
            }
            Some(PathToken::Name) => {
                let name = self.parse_step_name()?;
                let mut predicates = Vec::new();
                while self.peek() == Some(PathToken::BracketOpen) {
                    predicates.push(self.parse_predicate()?);
                }
                Ok(Step::Child { name, predicates })
            }
            _ => Err(self.error("expected a node identifier or `..`")),
        }
    }

    fn parse_step_name(&mut self) -> Result<StepName, ArgumentError> {
        let text = self.slice(self.pos).to_string();
        self.pos += 1;
        if text.contains(':') {
            parse_node_identifier(&text, self.resolver).map(StepName::Qualified)
        } else {
            Ok(StepName::Unqualified(text.into()))
        }
    }

    fn parse_predicate(&mut self) -> Result<Predicate, ArgumentError> {
        self.expect(PathToken::BracketOpen, "`[`")?;
        if self.peek() != Some(PathToken::Name) {
            return Err(self.error("expected a key name"));
        }
        let key = self.parse_step_name()?;
        self.expect(PathToken::Equals, "`=`")?;

        if self.peek() != Some(PathToken::Name) || self.slice(self.pos) != "current" {
            return Err(self.error("expected current()"));
        }
        self.pos += 1;
        self.expect(PathToken::ParenOpen, "`(`")?;
        self.expect(PathToken::ParenClose, "`)`")?;

        let mut current_path = Vec::new();
        while self.peek() == Some(PathToken::Slash) {
            self.pos += 1;
            current_path.push(match self.peek() {
                Some(PathToken::DotDot) => {
                    self.pos += 1;
                    Step::Parent
                }
                Some(PathToken::Name) => Step::Child {
                    name: self.parse_step_name()?,
                    predicates: Vec::new(),
                },
                _ => return Err(self.error("expected a node identifier or `..`")),
            });
        }
        self.expect(PathToken::BracketClose, "`]`")?;
        Ok(Predicate { key, current_path })
    }
}
