//! Portable handles into the schema tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::QName;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema node identifier must have at least one step")]
pub struct EmptySchemaNodeIdentifier;

/// A non-empty sequence of schema-tree QNames.
///
/// Absolute identifiers start at a module root, descendant identifiers start at
/// some enclosing statement (`refine`, `augment` inside `uses`).
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "Repr", into = "Repr")]
pub struct SchemaNodeIdentifier {
    absolute: bool,
    steps: Vec<QName>,
}

impl SchemaNodeIdentifier {
    pub fn absolute(steps: Vec<QName>) -> Result<Self, EmptySchemaNodeIdentifier> {
        Self::new(true, steps)
    }

    pub fn descendant(steps: Vec<QName>) -> Result<Self, EmptySchemaNodeIdentifier> {
        Self::new(false, steps)
    }

    fn new(absolute: bool, steps: Vec<QName>) -> Result<Self, EmptySchemaNodeIdentifier> {
        if steps.is_empty() {
            return Err(EmptySchemaNodeIdentifier);
        }
        Ok(Self { absolute, steps })
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn node_identifiers(&self) -> &[QName] {
        &self.steps
    }

    pub fn first_node_identifier(&self) -> &QName {
        &self.steps[0]
    }

    pub fn last_node_identifier(&self) -> &QName {
        &self.steps[self.steps.len() - 1]
    }
}

impl fmt::Display for SchemaNodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.node_identifiers().iter().enumerate() {
            if i > 0 || self.is_absolute() {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Repr {
    absolute: bool,
    steps: Vec<QName>,
}

impl TryFrom<Repr> for SchemaNodeIdentifier {
    type Error = EmptySchemaNodeIdentifier;

    fn try_from(repr: Repr) -> Result<Self, Self::Error> {
        Self::new(repr.absolute, repr.steps)
    }
}

impl From<SchemaNodeIdentifier> for Repr {
    fn from(id: SchemaNodeIdentifier) -> Self {
        Repr {
            absolute: id.absolute,
            steps: id.steps,
        }
    }
}
