//! Detached cursors that can be replayed into a stack later.

use yangkit_core::{QName, SchemaNodeIdentifier};

use super::{NavigationError, SchemaInferenceStack};
use crate::model::{EffectiveModel, NodeId};

/// A path of schema-tree statements from a module root, one per schema step.
#[derive(Debug, Clone)]
pub struct SchemaTreeInference<'m> {
    model: &'m EffectiveModel,
    statements: Vec<NodeId>,
}

impl<'m> SchemaTreeInference<'m> {
    /// Wrap `statements` without checking them against the model.
    ///
    /// Hand-built inferences should be replayed with
    /// [`SchemaInferenceStack::of_untrusted`].
    pub fn new(model: &'m EffectiveModel, statements: Vec<NodeId>) -> Self {
        Self { model, statements }
    }

    pub fn model(&self) -> &'m EffectiveModel {
        self.model
    }

    pub fn statement_path(&self) -> &[NodeId] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn to_schema_node_identifier(&self) -> Result<SchemaNodeIdentifier, NavigationError> {
        let qnames = self
            .statements
            .iter()
            .map(|id| {
                let node = self.model.get(*id).ok_or(NavigationError::Inconsistent)?;
                node.qname()
                    .cloned()
                    .ok_or_else(|| NavigationError::UnexpectedCurrent(node.keyword().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        SchemaNodeIdentifier::absolute(qnames).map_err(|_| NavigationError::EmptyStack)
    }
}

impl PartialEq for SchemaTreeInference<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.model, other.model) && self.statements == other.statements
    }
}

impl Eq for SchemaTreeInference<'_> {}

/// The complete state of a stack, including non-schema frames.
#[derive(Debug, Clone)]
pub struct Inference<'m> {
    pub(super) model: &'m EffectiveModel,
    pub(super) frames: Vec<NodeId>,
    pub(super) module: Option<NodeId>,
    pub(super) grouping_depth: usize,
    pub(super) clean: bool,
}

impl<'m> Inference<'m> {
    /// Inference positioned at a data-tree path from the root.
    pub fn of_data_tree_path(
        model: &'m EffectiveModel,
        path: &[QName],
    ) -> Result<Self, NavigationError> {
        Ok(SchemaInferenceStack::of_data_tree_path(model, path)?.to_inference())
    }

    pub fn statement_path(&self) -> &[NodeId] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn to_schema_inference_stack(&self) -> SchemaInferenceStack<'m> {
        SchemaInferenceStack::of_inference(self)
    }
}
