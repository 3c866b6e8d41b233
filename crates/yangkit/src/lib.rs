//! yangkit: statement inference and schema navigation for YANG modules.
//!
//! # Example
//!
//! ```
//! use yangkit::{SchemaBuilder, SourceMap};
//!
//! let mut sources = SourceMap::new();
//! sources.add_inline(
//!     "example.yang",
//!     r#"
//!     module example {
//!         namespace "urn:example";
//!         prefix ex;
//!         container system { leaf host-name { type string; } }
//!     }
//!     "#,
//! );
//!
//! let model = SchemaBuilder::new(sources).build().expect("valid module");
//! assert_eq!(model.modules().count(), 1);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod diagnostics;
pub mod model;
pub mod parser;
pub mod path;
pub mod reactor;
pub mod source_map;
pub mod stack;
pub mod stmt;
pub mod support;

use std::collections::HashSet;

pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use model::{EffectiveModel, EffectiveNode, NodeId};
pub use reactor::BuildConfig;
pub use source_map::{SourceId, SourceMap};
pub use stack::{Inference, NavigationError, SchemaInferenceStack, SchemaTreeInference};
pub use yangkit_core::{QName, QNameModule, Revision, SchemaNodeIdentifier, YangVersion};

use stmt::StmtTree;

/// Errors that can occur while building a schema.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Execution fuel exhausted (too many parser operations).
    #[error("execution limit exceeded")]
    ExecFuelExhausted,

    /// Recursion fuel exhausted (input nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("schema parsing failed with {} errors", .0.error_count())]
    Parse(Diagnostics),

    #[error("schema build failed with {} errors", .0.error_count())]
    Build(Diagnostics),
}

impl Error {
    /// Diagnostics behind a parse or build failure.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Error::Parse(diag) | Error::Build(diag) => Some(diag),
            Error::ExecFuelExhausted | Error::RecursionLimitExceeded => None,
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Entry point of a schema build: sources in, effective model out.
pub struct SchemaBuilder {
    source_map: SourceMap,
    config: BuildConfig,
}

impl SchemaBuilder {
    pub fn new(source_map: SourceMap) -> Self {
        Self {
            source_map,
            config: BuildConfig::default(),
        }
    }

    /// Builder over a single inline source.
    pub fn inline(src: &str) -> Self {
        Self::new(SourceMap::inline(src))
    }

    pub fn with_parse_fuel(mut self, fuel: u32) -> Self {
        self.config.parse_fuel = fuel;
        self
    }

    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.config.parse_max_depth = limit;
        self
    }

    /// Restrict `if-feature` evaluation to `features`. Without this every feature is supported.
    pub fn with_supported_features(mut self, features: impl IntoIterator<Item = QName>) -> Self {
        self.config.supported_features = Some(features.into_iter().collect::<HashSet<_>>());
        self
    }

    pub fn with_leafref_validation(mut self, enabled: bool) -> Self {
        self.config.validate_leafrefs = enabled;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Parse and lower every source. Syntax errors stay in the returned diagnostics.
    pub fn parse(self) -> Result<SchemaParsed> {
        let mut tree = StmtTree::new();
        let mut diag = Diagnostics::new();
        let mut fuel_consumed = 0u32;

        for source in self.source_map.iter() {
            let res = parser::parse(
                source.content,
                source.id,
                Some(self.config.parse_fuel),
                Some(self.config.parse_max_depth),
            )?;
            fuel_consumed = fuel_consumed.saturating_add(res.exec_fuel_consumed);
            let has_errors = res.diagnostics.has_errors();
            diag.extend(res.diagnostics);
            if has_errors {
                log::debug!("skipping lowering of {}", source.kind.display_name());
                continue;
            }
            stmt::lower_source(&res.root, source.id, &mut tree, &mut diag);
        }

        Ok(SchemaParsed {
            source_map: self.source_map,
            config: self.config,
            tree,
            diag,
            fuel_consumed,
        })
    }

    /// Parse and infer in one go.
    pub fn build(self) -> Result<EffectiveModel> {
        self.build_with_diagnostics().map(|(model, _)| model)
    }

    /// Like [`build`](Self::build), also returning the warnings of a successful build.
    pub fn build_with_diagnostics(self) -> Result<(EffectiveModel, Diagnostics)> {
        self.parse()?.infer()
    }
}

/// Sources that went through the parser and were lowered into statements.
#[derive(Debug)]
pub struct SchemaParsed {
    source_map: SourceMap,
    config: BuildConfig,
    tree: StmtTree,
    diag: Diagnostics,
    fuel_consumed: u32,
}

impl SchemaParsed {
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn is_valid(&self) -> bool {
        !self.diag.has_errors()
    }

    pub fn parser_fuel_consumed(&self) -> u32 {
        self.fuel_consumed
    }

    pub fn statements(&self) -> &StmtTree {
        &self.tree
    }

    /// Run the reactor. Parse errors fail the build before any phase runs.
    pub fn infer(self) -> Result<(EffectiveModel, Diagnostics)> {
        if self.diag.has_errors() {
            return Err(Error::Parse(self.diag));
        }
        let mut diag = self.diag;
        match reactor::infer(self.tree, &self.config) {
            Ok((model, warnings)) => {
                diag.extend(warnings);
                Ok((model, diag))
            }
            Err(errors) => {
                diag.extend(errors);
                Err(Error::Build(diag))
            }
        }
    }
}


#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
