//! Parsed statement arguments.
//!
//! Arguments are parsed once, during statement definition, according to the
//! [`ArgumentKind`] the keyword's support declares. Prefixes are resolved through a
//! [`PrefixResolver`] supplied by the reactor, so the parsed value is already bound to
//! the right module namespace.

use std::fmt;
use std::sync::Arc;

use logos::Logos;
use yangkit_core::{QName, QNameModule, Revision, SchemaNodeIdentifier, YangVersion, is_identifier};

use crate::model::BuiltinType;
use crate::path::{PathExpression, parse_path};

/// Binds prefixes in arguments to module namespaces.
pub trait PrefixResolver {
    /// The module a prefix names, from the declaring module's own prefix and imports.
    fn resolve_prefix(&self, prefix: &str) -> Option<QNameModule>;

    /// The module unprefixed identifiers belong to.
    fn default_module(&self) -> QNameModule;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    UnboundPrefix(String),
}

fn invalid(msg: impl Into<String>) -> ArgumentError {
    ArgumentError::Invalid(msg.into())
}

/// How a keyword's argument text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// The statement takes no argument.
    None,
    String,
    /// A bare identifier that is not namespace-bound: module, prefix, bit names.
    Name,
    /// An identifier declared in the current module.
    Identifier,
    /// A possibly prefixed reference to an identifier.
    Reference,
    TypeRef,
    Boolean,
    Revision,
    Unsigned,
    Integer,
    Version,
    Status,
    OrderedBy,
    MaxElements,
    FractionDigits,
    SchemaNodeId,
    Path,
    IfFeature,
    Keys,
    Deviate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderedBy {
    #[default]
    System,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}

/// The `type` argument: a built-in name or a reference to a typedef.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(BuiltinType),
    Derived(QName),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Builtin(builtin) => write!(f, "{builtin}"),
            TypeRef::Derived(qname) => write!(f, "{qname}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    String(Arc<str>),
    Name(Arc<str>),
    Identifier(QName),
    Reference(QName),
    Type(TypeRef),
    Boolean(bool),
    Revision(Revision),
    Unsigned(u64),
    Integer(i64),
    Version(YangVersion),
    Status(Status),
    OrderedBy(OrderedBy),
    /// `None` is `unbounded`.
    MaxElements(Option<u64>),
    FractionDigits(u8),
    SchemaNodeId(SchemaNodeIdentifier),
    Path(PathExpression),
    IfFeature(IfFeatureExpr),
    Keys(Vec<QName>),
    Deviate(DeviateKind),
}

impl Argument {
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            Argument::Identifier(qname) | Argument::Reference(qname) => Some(qname),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) | Argument::Name(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse `raw` as `kind`. `version` gates YANG 1.1 only syntax (`if-feature` expressions).
pub fn parse_argument(
    kind: ArgumentKind,
    raw: &str,
    version: YangVersion,
    resolver: &dyn PrefixResolver,
) -> Result<Argument, ArgumentError> {
    let arg = match kind {
        ArgumentKind::None => return Err(invalid("statement takes no argument")),
        ArgumentKind::String => Argument::String(raw.into()),
        ArgumentKind::Name => {
            if !is_identifier(raw) {
                return Err(invalid(format!("`{raw}` is not a valid identifier")));
            }
            Argument::Name(raw.into())
        }
        ArgumentKind::Identifier => {
            if !is_identifier(raw) {
                return Err(invalid(format!("`{raw}` is not a valid identifier")));
            }
            Argument::Identifier(bind(&resolver.default_module(), raw)?)
        }
        ArgumentKind::Reference => Argument::Reference(parse_node_identifier(raw, resolver)?),
        ArgumentKind::TypeRef => match BuiltinType::from_name(raw) {
            Some(builtin) => Argument::Type(TypeRef::Builtin(builtin)),
            None => Argument::Type(TypeRef::Derived(parse_node_identifier(raw, resolver)?)),
        },
        ArgumentKind::Boolean => match raw {
            "true" => Argument::Boolean(true),
            "false" => Argument::Boolean(false),
            _ => return Err(invalid(format!("`{raw}` is not `true` or `false`"))),
        },
        ArgumentKind::Revision => Argument::Revision(
            raw.parse()
                .map_err(|_| invalid(format!("`{raw}` is not a valid revision date")))?,
        ),
        ArgumentKind::Unsigned => Argument::Unsigned(
            raw.parse()
                .map_err(|_| invalid(format!("`{raw}` is not a non-negative integer")))?,
        ),
        ArgumentKind::Integer => Argument::Integer(
            raw.parse()
                .map_err(|_| invalid(format!("`{raw}` is not an integer")))?,
        ),
        ArgumentKind::Version => Argument::Version(
            YangVersion::parse(raw)
                .ok_or_else(|| invalid(format!("unsupported yang-version `{raw}`")))?,
        ),
        ArgumentKind::Status => Argument::Status(match raw {
            "current" => Status::Current,
            "deprecated" => Status::Deprecated,
            "obsolete" => Status::Obsolete,
            _ => return Err(invalid(format!("`{raw}` is not a valid status"))),
        }),
        ArgumentKind::OrderedBy => Argument::OrderedBy(match raw {
            "system" => OrderedBy::System,
            "user" => OrderedBy::User,
            _ => return Err(invalid(format!("`{raw}` is not `system` or `user`"))),
        }),
        ArgumentKind::MaxElements => match raw {
            "unbounded" => Argument::MaxElements(None),
            _ => {
                let value: u64 = raw
                    .parse()
                    .map_err(|_| invalid(format!("`{raw}` is not a valid max-elements")))?;
                if value == 0 {
                    return Err(invalid("max-elements must be positive"));
                }
                Argument::MaxElements(Some(value))
            }
        },
        ArgumentKind::FractionDigits => {
            let digits: u8 = raw
                .parse()
                .map_err(|_| invalid(format!("`{raw}` is not a valid fraction-digits")))?;
            if !(1..=18).contains(&digits) {
                return Err(invalid(format!(
                    "fraction-digits {digits} is outside the range 1..18"
                )));
            }
            Argument::FractionDigits(digits)
        }
        ArgumentKind::SchemaNodeId => {
            Argument::SchemaNodeId(parse_schema_node_id(raw, resolver)?)
        }
        ArgumentKind::Path => Argument::Path(parse_path(raw, resolver)?),
        ArgumentKind::IfFeature => {
            Argument::IfFeature(IfFeatureExpr::parse(raw, version, resolver)?)
        }
        ArgumentKind::Keys => {
            let keys = raw
                .split_ascii_whitespace()
                .map(|key| parse_node_identifier(key, resolver))
                .collect::<Result<Vec<_>, _>>()?;
            if keys.is_empty() {
                return Err(invalid("key statement names no leaves"));
            }
            Argument::Keys(keys)
        }
        ArgumentKind::Deviate => Argument::Deviate(match raw {
            "not-supported" => DeviateKind::NotSupported,
            "add" => DeviateKind::Add,
            "replace" => DeviateKind::Replace,
            "delete" => DeviateKind::Delete,
            _ => return Err(invalid(format!("`{raw}` is not a valid deviate argument"))),
        }),
    };
    Ok(arg)
}

fn bind(module: &QNameModule, local: &str) -> Result<QName, ArgumentError> {
    module
        .bind(local)
        .map_err(|err| invalid(err.to_string()))
}

/// `prefix:name` or `name`, bound through `resolver`.
pub fn parse_node_identifier(
    text: &str,
    resolver: &dyn PrefixResolver,
) -> Result<QName, ArgumentError> {
    match text.split_once(':') {
        Some((prefix, local)) => {
            let module = resolver
                .resolve_prefix(prefix)
                .ok_or_else(|| ArgumentError::UnboundPrefix(prefix.to_string()))?;
            bind(&module, local)
        }
        None => bind(&resolver.default_module(), text),
    }
}

/// `/a:b/c` (absolute) or `a:b/c` (descendant).
pub fn parse_schema_node_id(
    text: &str,
    resolver: &dyn PrefixResolver,
) -> Result<SchemaNodeIdentifier, ArgumentError> {
    let (absolute, body) = match text.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let steps = body
        .split('/')
        .map(|step| parse_node_identifier(step.trim(), resolver))
        .collect::<Result<Vec<_>, _>>()?;
    let id = if absolute {
        SchemaNodeIdentifier::absolute(steps)
    } else {
        SchemaNodeIdentifier::descendant(steps)
    };
    id.map_err(|err| invalid(err.to_string()))
}

/// A parsed `if-feature` argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IfFeatureExpr {
    Feature(QName),
    Not(Box<IfFeatureExpr>),
    And(Vec<IfFeatureExpr>),
    Or(Vec<IfFeatureExpr>),
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum FeatureToken {
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*(:[A-Za-z_][A-Za-z0-9_.\-]*)?")]
    Name,
}

struct FeatureParser<'a> {
    tokens: Vec<(FeatureToken, &'a str)>,
    pos: usize,
    resolver: &'a dyn PrefixResolver,
}

impl IfFeatureExpr {
    /// YANG 1 only accepts a single feature reference.
    pub fn parse(
        text: &str,
        version: YangVersion,
        resolver: &dyn PrefixResolver,
    ) -> Result<Self, ArgumentError> {
        if version == YangVersion::V1 {
            return parse_node_identifier(text.trim(), resolver).map(IfFeatureExpr::Feature);
        }

        let mut lexer = FeatureToken::lexer(text);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            let token = token
                .map_err(|()| invalid(format!("invalid if-feature expression `{text}`")))?;
            tokens.push((token, lexer.slice()));
        }

        let mut parser = FeatureParser {
            tokens,
            pos: 0,
            resolver,
        };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(invalid(format!("invalid if-feature expression `{text}`")));
        }
        Ok(expr)
    }

    /// Every feature the expression mentions, in source order.
    pub fn features(&self) -> Vec<&QName> {
        let mut out = Vec::new();
        self.collect_features(&mut out);
        out
    }

    fn collect_features<'a>(&'a self, out: &mut Vec<&'a QName>) {
        match self {
            IfFeatureExpr::Feature(qname) => out.push(qname),
            IfFeatureExpr::Not(inner) => inner.collect_features(out),
            IfFeatureExpr::And(items) | IfFeatureExpr::Or(items) => {
                for item in items {
                    item.collect_features(out);
                }
            }
        }
    }

    pub fn evaluate(&self, supported: &dyn Fn(&QName) -> bool) -> bool {
        match self {
            IfFeatureExpr::Feature(qname) => supported(qname),
            IfFeatureExpr::Not(inner) => !inner.evaluate(supported),
            IfFeatureExpr::And(items) => items.iter().all(|item| item.evaluate(supported)),
            IfFeatureExpr::Or(items) => items.iter().any(|item| item.evaluate(supported)),
        }
    }
}

impl FeatureParser<'_> {
    fn peek(&self) -> Option<FeatureToken> {
        self.tokens.get(self.pos).map(|(kind, _)| *kind)
    }

    fn unexpected(&self) -> ArgumentError {
        match self.tokens.get(self.pos) {
            Some((_, text)) => invalid(format!("unexpected `{text}` in if-feature expression")),
            None => invalid("if-feature expression ends unexpectedly"),
        }
    }

    fn parse_or(&mut self) -> Result<IfFeatureExpr, ArgumentError> {
        let mut items = vec![self.parse_and()?];
        while self.peek() == Some(FeatureToken::Or) {
            self.pos += 1;
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            IfFeatureExpr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<IfFeatureExpr, ArgumentError> {
        let mut items = vec![self.parse_factor()?];
        while self.peek() == Some(FeatureToken::And) {
            self.pos += 1;
            items.push(self.parse_factor()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            IfFeatureExpr::And(items)
        })
    }

    fn parse_factor(&mut self) -> Result<IfFeatureExpr, ArgumentError> {
        match self.peek() {
            Some(FeatureToken::Not) => {
                self.pos += 1;
                Ok(IfFeatureExpr::Not(Box::new(self.parse_factor()?)))
            }
            Some(FeatureToken::ParenOpen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(FeatureToken::ParenClose) {
                    return Err(self.unexpected());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(FeatureToken::Name) => {
                let text = self.tokens[self.pos].1;
                self.pos += 1;
                parse_node_identifier(text, self.resolver).map(IfFeatureExpr::Feature)
            }
            _ => Err(self.unexpected()),
        }
    }
}
