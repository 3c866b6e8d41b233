//! Statement contexts: the mutable tree the reactor works on.
//!
//! Parsed sources are lowered into a [`StmtTree`] arena. Each [`StmtCtx`] keeps its
//! keyword, raw and parsed argument, ordered children, origin and copy provenance.
//! The reactor mutates the tree only by parsing arguments, expanding `uses`/`augment`
//! and marking phase completion or pruning.

mod argument;
mod keyword;
mod lower;
mod tree;

#[cfg(test)]
mod stmt_tests;

pub use argument::{
    Argument, ArgumentError, ArgumentKind, DeviateKind, IfFeatureExpr, OrderedBy, PrefixResolver,
    Status, TypeRef, parse_argument, parse_node_identifier, parse_schema_node_id,
};
pub use keyword::{Keyword, StmtKeyword};
pub use lower::lower_source;
pub use tree::{CopyKind, CopyOptions, StatementOrigin, StmtCtx, StmtId, StmtTree};
