#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core value types shared by the yangkit front end, reactor and effective model.
//!
//! - [`QName`] / [`QNameModule`]: namespace-qualified identifiers
//! - [`Revision`]: `YYYY-MM-DD` module revisions
//! - [`Decimal64`]: the YANG `decimal64` value space with explicit rounding
//! - [`SchemaNodeIdentifier`]: absolute and descendant schema-tree paths
//! - [`YangVersion`]: RFC 6020 (`1`) vs RFC 7950 (`1.1`)

mod decimal64;
mod qname;
mod schema_node_id;

#[cfg(test)]
mod decimal64_tests;
#[cfg(test)]
mod schema_node_id_tests;

pub use decimal64::{Decimal64, Decimal64Error, RoundingMode};
pub use qname::{QName, QNameError, QNameModule, Revision, is_identifier};
pub use schema_node_id::{EmptySchemaNodeIdentifier, SchemaNodeIdentifier};

/// YANG language version declared by `yang-version`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum YangVersion {
    /// RFC 6020. The default when `yang-version` is absent.
    #[default]
    V1,
    /// RFC 7950.
    V1_1,
}

impl YangVersion {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Self::V1),
            "1.1" => Some(Self::V1_1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V1_1 => "1.1",
        }
    }
}

impl std::fmt::Display for YangVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
