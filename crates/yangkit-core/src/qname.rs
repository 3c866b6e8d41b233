//! Namespace-qualified names.
//!
//! Every schema node, grouping, typedef, identity and feature is addressed by a
//! [`QName`]: a local identifier bound to a module namespace and optional revision.
//! Both halves are reference-counted so cloning a QName never allocates.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Errors raised while constructing names and revisions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QNameError {
    #[error("`{0}` is not a valid YANG identifier")]
    InvalidIdentifier(String),

    #[error("`{0}` is not a valid revision date")]
    InvalidRevision(String),
}

/// `identifier = (ALPHA / "_") *(ALPHA / DIGIT / "_" / "-" / ".")`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// A module revision date, ordered chronologically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision {
    year: u16,
    month: u8,
    day: u8,
}

impl Revision {
    pub fn year(self) -> u16 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }

    pub fn day(self) -> u8 {
        self.day
    }
}

impl FromStr for Revision {
    type Err = QNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QNameError::InvalidRevision(s.to_owned());
        let bytes = s.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(invalid());
        }
        let digits = |range: std::ops::Range<usize>| -> Result<u16, QNameError> {
            let part = &s[range];
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let year = digits(0..4)?;
        let month = digits(5..7)?;
        let day = digits(8..10)?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }
        Ok(Self {
            year,
            month: month as u8,
            day: day as u8,
        })
    }
}

impl TryFrom<String> for Revision {
    type Error = QNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Revision> for String {
    fn from(value: Revision) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A module's namespace URI plus its (optional) latest revision.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct QNameModule {
    namespace: Arc<str>,
    revision: Option<Revision>,
}

impl QNameModule {
    pub fn new(namespace: impl Into<Arc<str>>, revision: Option<Revision>) -> Self {
        Self {
            namespace: namespace.into(),
            revision,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn revision(&self) -> Option<Revision> {
        self.revision
    }

    /// Bind a local name into this module.
    pub fn bind(&self, local: &str) -> Result<QName, QNameError> {
        QName::new(self.clone(), local)
    }
}

impl fmt::Display for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)?;
        if let Some(rev) = self.revision {
            write!(f, "?revision={rev}")?;
        }
        Ok(())
    }
}

/// A local identifier qualified by its defining module.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct QName {
    module: QNameModule,
    local: Arc<str>,
}

impl QName {
    pub fn new(module: QNameModule, local: &str) -> Result<Self, QNameError> {
        if !is_identifier(local) {
            return Err(QNameError::InvalidIdentifier(local.to_owned()));
        }
        Ok(Self {
            module,
            local: local.into(),
        })
    }

    pub fn module(&self) -> &QNameModule {
        &self.module
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Same local name, different module. Used when grouping content is
    /// instantiated into another module.
    pub fn bind_to(&self, module: &QNameModule) -> Self {
        Self {
            module: module.clone(),
            local: self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.module, self.local)
    }
}
