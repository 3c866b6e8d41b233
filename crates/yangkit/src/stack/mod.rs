//! A cursor over an [`EffectiveModel`] that tracks how it got where it is.
//!
//! [`SchemaInferenceStack`] records every statement entered: schema-tree and data-tree
//! children, groupings, typedefs and choices. Data-tree steps skip `choice` and `case`
//! layers. The stack remembers whether its frames still form a plain schema-tree path
//! (`clean`); if not, [`SchemaInferenceStack::to_schema_node_identifier`] reconstructs
//! the skipped layers from the model's schema parent links.
//!
//! Leafref `path` expressions resolve against the stack: `..` pops to the enclosing
//! data node and child steps enter the data tree. Inside a grouping there is nothing
//! above the grouping root to pop to, so such paths fail with
//! [`NavigationError::IllegalParentAccess`].
//!
//! A stack borrows its model immutably and owns its frames. Any number of stacks may
//! walk the same model from different threads.

mod error;
mod snapshot;

#[cfg(test)]
mod stack_tests;

use std::fmt;
use std::sync::Arc;

use yangkit_core::{QName, SchemaNodeIdentifier};

pub use error::NavigationError;
pub use snapshot::{Inference, SchemaTreeInference};

use crate::model::{EffectiveModel, ModuleInfo, NodeId, TypeDefinition, TypeKind};
use crate::path::{LocationPath, PathExpression, PathSteps, Step, StepName};
use crate::stmt::Keyword;

#[derive(Clone)]
pub struct SchemaInferenceStack<'m> {
    model: &'m EffectiveModel,
    frames: Vec<NodeId>,
    /// Root of the module the first frame was entered from.
    module: Option<NodeId>,
    grouping_depth: usize,
    /// Frames are exactly the schema-tree path, with no skipped `choice`/`case` layers.
    clean: bool,
}

impl<'m> SchemaInferenceStack<'m> {
    /// An empty stack.
    pub fn of(model: &'m EffectiveModel) -> Self {
        Self {
            model,
            frames: Vec::new(),
            module: None,
            grouping_depth: 0,
            clean: true,
        }
    }

    /// A stack positioned at the node an absolute schema node identifier names.
    pub fn of_schema_path(
        model: &'m EffectiveModel,
        path: &SchemaNodeIdentifier,
    ) -> Result<Self, NavigationError> {
        let mut stack = Self::of(model);
        for qname in path.node_identifiers() {
            stack.enter_schema_tree(qname)?;
        }
        Ok(stack)
    }

    /// A stack positioned by entering each name on the data tree axis.
    pub fn of_data_tree_path(
        model: &'m EffectiveModel,
        path: &[QName],
    ) -> Result<Self, NavigationError> {
        let mut stack = Self::of(model);
        for qname in path {
            stack.enter_data_tree(qname)?;
        }
        Ok(stack)
    }

    /// Restore the exact state captured by [`SchemaInferenceStack::to_inference`].
    pub fn of_inference(inference: &Inference<'m>) -> Self {
        Self {
            model: inference.model,
            frames: inference.frames.clone(),
            module: inference.module,
            grouping_depth: inference.grouping_depth,
            clean: inference.clean,
        }
    }

    /// Adopt a schema-tree inference as is. Only the module of its first statement
    /// and the validity of the handles are checked.
    pub fn of_schema_tree_inference(
        inference: &SchemaTreeInference<'m>,
    ) -> Result<Self, NavigationError> {
        let model = inference.model();
        if inference.statement_path().iter().any(|id| model.get(*id).is_none()) {
            return Err(NavigationError::Inconsistent);
        }
        let Some(first) = inference.statement_path().first() else {
            return Ok(Self::of(model));
        };
        let qname = model
            .node(*first)
            .qname()
            .ok_or_else(|| NavigationError::UnexpectedCurrent(label(model, *first)))?;
        let module = module_root(model, qname)?;
        Ok(Self {
            model,
            frames: inference.statement_path().to_vec(),
            module: Some(module),
            grouping_depth: 0,
            clean: true,
        })
    }

    /// Re-resolve a schema-tree inference from its names and reject it unless the
    /// resolved statements are the ones it carries. Handles foreign to the model are
    /// rejected too.
    pub fn of_untrusted(inference: &SchemaTreeInference<'m>) -> Result<Self, NavigationError> {
        let path = inference.to_schema_node_identifier()?;
        let stack = Self::of_schema_path(inference.model(), &path)?;
        if stack.frames != inference.statement_path() {
            return Err(NavigationError::Inconsistent);
        }
        Ok(stack)
    }

    /// A stack positioned at `node`, with every schema ancestor as a frame.
    ///
    /// Works inside groupings too: grouping frames count towards
    /// [`SchemaInferenceStack::in_grouping`].
    pub fn of_node(model: &'m EffectiveModel, node: NodeId) -> Result<Self, NavigationError> {
        let mut path: Vec<NodeId> = model
            .ancestors(node)
            .filter(|a| model.node(*a).parent().is_some())
            .collect();
        path.reverse();
        path.push(node);

        let mut stack = Self::of(model);
        for frame in path {
            let current = model.node(frame);
            if current.is(Keyword::Grouping) {
                stack.grouping_depth += 1;
            } else if !current.is_schema_node() && !current.is(Keyword::Typedef) {
                return Err(NavigationError::CannotDescend {
                    axis: "schema",
                    at: label(model, frame),
                });
            }
            stack.frames.push(frame);
        }
        stack.module = Some(model.node(node).module());
        Ok(stack)
    }

    pub fn model(&self) -> &'m EffectiveModel {
        self.model
    }

    /// An independent stack in the same state.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn statement_path(&self) -> &[NodeId] {
        &self.frames
    }

    pub fn current_statement(&self) -> Result<NodeId, NavigationError> {
        self.frames.last().copied().ok_or(NavigationError::EmptyStack)
    }

    pub fn current_module(&self) -> Result<&'m ModuleInfo, NavigationError> {
        self.module
            .and_then(|root| self.model.module_of(root))
            .ok_or(NavigationError::EmptyStack)
    }

    pub fn in_grouping(&self) -> bool {
        self.grouping_depth != 0
    }

    /// Non-empty, outside any grouping, and every frame a schema node.
    pub fn in_instantiated_context(&self) -> bool {
        self.grouping_depth == 0
            && !self.frames.is_empty()
            && self
                .frames
                .iter()
                .all(|frame| self.model.node(*frame).is_schema_node())
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.module = None;
        self.grouping_depth = 0;
        self.clean = true;
    }

    fn push(&mut self, node: NodeId) -> NodeId {
        self.frames.push(node);
        node
    }

    /// Enter a `choice`, crossing the `case` between it and a choice on top.
    pub fn enter_choice(&mut self, qname: &QName) -> Result<NodeId, NavigationError> {
        let parent = self.frames.last().copied();
        if let Some(parent) = parent
            && self.model.node(parent).is(Keyword::Choice)
        {
            let found = self
                .model
                .node(parent)
                .schema_children()
                .filter(|case| self.model.node(*case).is(Keyword::Case))
                .find_map(|case| {
                    self.model
                        .node(case)
                        .schema_child(qname)
                        .filter(|child| self.model.node(*child).is(Keyword::Choice))
                });
            return match found {
                Some(choice) => {
                    self.clean = false;
                    Ok(self.push(choice))
                }
                None => Err(self.not_present(parent, "Choice", qname)),
            };
        }

        let entered = self.enter_schema_tree(qname)?;
        if self.model.node(entered).is(Keyword::Choice) {
            return Ok(entered);
        }
        self.exit()?;
        match parent {
            Some(parent) => Err(self.not_present(parent, "Choice", qname)),
            None => Err(NavigationError::ChoiceNotPresent(qname.clone())),
        }
    }

    /// Enter a grouping defined directly in the top frame, or in the name's module.
    pub fn enter_grouping(&mut self, qname: &QName) -> Result<NodeId, NavigationError> {
        let parent = self.parent_or_module(qname)?;
        let grouping = self
            .model
            .node(parent)
            .grouping(qname)
            .ok_or_else(|| self.not_present(parent, "Grouping", qname))?;
        self.grouping_depth += 1;
        Ok(self.push(grouping))
    }

    /// Enter a typedef defined directly in the top frame, or in the name's module.
    pub fn enter_typedef(&mut self, qname: &QName) -> Result<NodeId, NavigationError> {
        let parent = self.parent_or_module(qname)?;
        let typedef = self
            .model
            .node(parent)
            .typedef(qname)
            .ok_or_else(|| self.not_present(parent, "Typedef", qname))?;
        Ok(self.push(typedef))
    }

    /// Enter a schema-tree child. `choice`, `case`, `input` and `output` are explicit
    /// steps on this axis.
    pub fn enter_schema_tree(&mut self, qname: &QName) -> Result<NodeId, NavigationError> {
        let parent = self.parent_or_module(qname)?;
        let node = self.model.node(parent);
        if !node.yang_keyword().is_some_and(Keyword::is_schema_tree_aware) {
            return Err(NavigationError::CannotDescend {
                axis: "schema",
                at: label(self.model, parent),
            });
        }
        let child = node
            .schema_child(qname)
            .ok_or_else(|| self.not_present(parent, "Schema tree child", qname))?;
        Ok(self.push(child))
    }

    /// Enter each step of a schema node identifier. An absolute one starts from an
    /// empty stack.
    pub fn enter_schema_path(
        &mut self,
        path: &SchemaNodeIdentifier,
    ) -> Result<NodeId, NavigationError> {
        if path.is_absolute() {
            self.clear();
        }
        let mut entered = None;
        for qname in path.node_identifiers() {
            entered = Some(self.enter_schema_tree(qname)?);
        }
        entered.ok_or(NavigationError::EmptyStack)
    }

    /// Enter a data-tree child, skipping any `choice` and `case` layers in between.
    pub fn enter_data_tree(&mut self, qname: &QName) -> Result<NodeId, NavigationError> {
        let parent = self.parent_or_module(qname)?;
        let node = self.model.node(parent);
        if !node.yang_keyword().is_some_and(Keyword::is_data_tree_aware) {
            return Err(NavigationError::CannotDescend {
                axis: "data",
                at: label(self.model, parent),
            });
        }
        let child = node
            .data_child(qname)
            .ok_or_else(|| self.not_present(parent, "Data tree child", qname))?;
        if self.model.node(child).parent() != Some(parent) {
            self.clean = false;
        }
        Ok(self.push(child))
    }

    /// Top frame, or the root of `qname`'s module when the stack is empty. Entering
    /// the first frame binds the stack to that module.
    fn parent_or_module(&mut self, qname: &QName) -> Result<NodeId, NavigationError> {
        if let Some(top) = self.frames.last() {
            return Ok(*top);
        }
        let root = module_root(self.model, qname)?;
        self.module = Some(root);
        Ok(root)
    }

    /// Pop the top frame.
    pub fn exit(&mut self) -> Result<NodeId, NavigationError> {
        let top = self.frames.pop().ok_or(NavigationError::NoSuchElement)?;
        if self.model.node(top).is(Keyword::Grouping) {
            self.grouping_depth = self.grouping_depth.saturating_sub(1);
        }
        if self.frames.is_empty() {
            self.module = None;
            self.clean = true;
        }
        Ok(top)
    }

    /// Pop a data node, then any `choice` and `case` frames above it. Returns the
    /// popped data node.
    pub fn exit_to_data_tree(&mut self) -> Result<NodeId, NavigationError> {
        let child = self.exit()?;
        if !self.model.node(child).is_data_node() {
            return Err(NavigationError::UnexpectedCurrent(label(self.model, child)));
        }
        while let Some(&top) = self.frames.last()
            && is_transparent(self.model, top)
        {
            self.frames.pop();
        }
        if let Some(&parent) = self.frames.last()
            && !self
                .model
                .node(parent)
                .yang_keyword()
                .is_some_and(Keyword::is_data_tree_aware)
        {
            return Err(NavigationError::UnexpectedParent(label(self.model, parent)));
        }
        Ok(child)
    }

    /// Resolve a leafref `path`, leaving the stack on the target.
    ///
    /// On error the stack is left wherever resolution stopped.
    pub fn resolve_path_expression(
        &mut self,
        path: &PathExpression,
    ) -> Result<NodeId, NavigationError> {
        match path.steps() {
            PathSteps::Location(location) => self.resolve_location_path(location),
            PathSteps::Deref { argument, relative } => self.resolve_deref(argument, relative),
        }
    }

    fn resolve_location_path(&mut self, path: &LocationPath) -> Result<NodeId, NavigationError> {
        // unprefixed steps bind to the namespace of the statement the path starts at
        let default_module = self
            .frames
            .last()
            .and_then(|top| self.model.node(*top).qname())
            .map(|qname| qname.module().clone());
        if path.is_absolute() {
            self.clear();
        }

        let mut current = None;
        for step in path.steps() {
            current = Some(match step {
                Step::Parent => {
                    self.exit_to_data_tree()
                        .map_err(|source| NavigationError::IllegalParentAccess {
                            path: path.to_string(),
                            source: Box::new(source),
                        })?
                }
                Step::Child { name, .. } => {
                    let qname = match name {
                        StepName::Qualified(qname) => qname.clone(),
                        StepName::Unqualified(local) => default_module
                            .as_ref()
                            .and_then(|module| module.bind(local).ok())
                            .ok_or_else(|| NavigationError::Unqualified(local.to_string()))?,
                    };
                    self.enter_data_tree(&qname)?
                }
            });
        }
        current.ok_or(NavigationError::EmptyStack)
    }

    fn resolve_deref(
        &mut self,
        argument: &LocationPath,
        relative: &LocationPath,
    ) -> Result<NodeId, NavigationError> {
        let target = self.resolve_location_path(argument)?;
        let node = self.model.node(target);
        let target_type = node
            .type_definition()
            .filter(|_| node.is(Keyword::Leaf) || node.is(Keyword::LeafList))
            .ok_or_else(|| NavigationError::DerefNotTyped {
                path: argument.to_string(),
                target: label(self.model, target),
            })?;

        let dereferenced = match target_type.kind() {
            TypeKind::InstanceIdentifier { .. } => {
                return Err(NavigationError::DerefInstanceIdentifier(
                    target_type.describe(),
                ));
            }
            TypeKind::Leafref {
                path: Some(path), ..
            } => path.clone(),
            _ => return Err(NavigationError::IllegalTargetType(target_type.describe())),
        };

        let resolved = self.resolve_path_expression(&dereferenced)?;
        if !self.model.node(resolved).is(Keyword::Leaf) {
            return Err(NavigationError::DerefNotLeaf {
                path: argument.to_string(),
                target_path: dereferenced.to_string(),
            });
        }
        self.resolve_location_path(relative)
    }

    /// Follow a leafref, and any leafref it points at, to the first non-leafref type.
    ///
    /// Works on a copy: this stack does not move.
    pub fn resolve_leafref(
        &self,
        leafref: &TypeDefinition,
    ) -> Result<Arc<TypeDefinition>, NavigationError> {
        let mut path = leafref
            .leafref_path()
            .ok_or_else(|| NavigationError::NotLeafref(leafref.describe()))?
            .clone();
        let mut stack = self.copy();
        let mut visited = Vec::new();
        loop {
            let resolved = stack.resolve_path_expression(&path)?;
            let node = self.model.node(resolved);
            let resolved_type = node
                .type_definition()
                .filter(|_| node.is(Keyword::Leaf) || node.is(Keyword::LeafList))
                .ok_or_else(|| NavigationError::NotTyped(label(self.model, resolved)))?;
            let Some(next) = resolved_type.leafref_path() else {
                return Ok(resolved_type.clone());
            };
            if visited.contains(&resolved) {
                return Err(NavigationError::LeafrefLoop(leafref.describe()));
            }
            visited.push(resolved);
            path = next.clone();
        }
    }

    /// The schema-tree path of the top frame, with any skipped `choice` and `case`
    /// layers restored.
    pub fn to_schema_node_identifier(&self) -> Result<SchemaNodeIdentifier, NavigationError> {
        self.to_schema_tree_inference()?.to_schema_node_identifier()
    }

    pub fn to_schema_tree_inference(&self) -> Result<SchemaTreeInference<'m>, NavigationError> {
        if !self.in_instantiated_context() {
            return Err(NavigationError::UninstantiatedContext);
        }
        Ok(SchemaTreeInference::new(self.model, self.schema_path()?))
    }

    fn schema_path(&self) -> Result<Vec<NodeId>, NavigationError> {
        if self.clean {
            return Ok(self.frames.clone());
        }
        let top = self.current_statement()?;
        let mut path: Vec<NodeId> = self
            .model
            .ancestors(top)
            .filter(|a| self.model.node(*a).parent().is_some())
            .collect();
        path.reverse();
        path.push(top);
        Ok(path)
    }

    pub fn to_inference(&self) -> Inference<'m> {
        Inference {
            model: self.model,
            frames: self.frames.clone(),
            module: self.module,
            grouping_depth: self.grouping_depth,
            clean: self.clean,
        }
    }

    fn not_present(&self, parent: NodeId, kind: &'static str, qname: &QName) -> NavigationError {
        NavigationError::NotPresent {
            kind,
            qname: qname.clone(),
            parent: describe_parent(self.model, parent),
        }
    }
}

impl fmt::Debug for SchemaInferenceStack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.frames.iter().map(|f| label(self.model, *f)).collect();
        f.debug_struct("SchemaInferenceStack")
            .field("path", &path)
            .field("grouping_depth", &self.grouping_depth)
            .field("clean", &self.clean)
            .finish()
    }
}

fn module_root(model: &EffectiveModel, qname: &QName) -> Result<NodeId, NavigationError> {
    model
        .module(qname.module())
        .map(|module| module.root)
        .ok_or_else(|| NavigationError::ModuleNotFound(qname.clone()))
}

fn is_transparent(model: &EffectiveModel, id: NodeId) -> bool {
    let node = model.node(id);
    node.is(Keyword::Choice) || node.is(Keyword::Case)
}

/// A node's name, or its keyword if it has none.
fn label(model: &EffectiveModel, id: NodeId) -> String {
    let node = model.node(id);
    match node.qname() {
        Some(qname) => format!("{} {qname}", node.keyword()),
        None => node.keyword().to_string(),
    }
}

fn describe_parent(model: &EffectiveModel, id: NodeId) -> String {
    let node = model.node(id);
    if node.parent().is_none()
        && let Some(module) = model.module_of(id)
    {
        return format!("module ({}){}", module.namespace, module.name);
    }
    match (node.qname(), node.yang_keyword()) {
        (Some(qname), Some(keyword)) if keyword.is_schema_node() => {
            format!("schema parent {qname}")
        }
        (Some(qname), Some(Keyword::Grouping)) => format!("grouping {qname}"),
        (Some(qname), _) => format!("parent {qname}"),
        (None, _) => format!("parent {}", node.keyword()),
    }
}
