//! Errors raised by [`SchemaInferenceStack`](super::SchemaInferenceStack) operations.

use yangkit_core::QName;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// `kind` is one of "Schema tree child", "Data tree child", "Grouping", "Typedef"
    /// or "Choice".
    #[error("{kind} {qname} not present in {parent}")]
    NotPresent {
        kind: &'static str,
        qname: QName,
        parent: String,
    },

    /// A choice lookup on an empty stack whose first step is not a choice.
    #[error("Choice {0} not present")]
    ChoiceNotPresent(QName),

    #[error("Module for {0} not found")]
    ModuleNotFound(QName),

    #[error("Cannot execute on empty stack")]
    EmptyStack,

    #[error("Stack is empty")]
    NoSuchElement,

    #[error("Unexpected current {0}")]
    UnexpectedCurrent(String),

    #[error("Unexpected parent {0}")]
    UnexpectedParent(String),

    /// `axis` is "schema" or "data".
    #[error("Cannot descend {axis} tree at {at}")]
    CannotDescend { axis: &'static str, at: String },

    #[error("Illegal parent access in {path}")]
    IllegalParentAccess {
        path: String,
        #[source]
        source: Box<NavigationError>,
    },

    #[error("Can not find target module of step {0}")]
    Unqualified(String),

    #[error("Resolution of {0} loops back onto itself")]
    LeafrefLoop(String),

    #[error("Type {0} is not a leafref with a path")]
    NotLeafref(String),

    #[error("Unexpected result {0} of leafref resolution")]
    NotTyped(String),

    #[error("deref({path}) resolved to non-typed {target}")]
    DerefNotTyped { path: String, target: String },

    #[error("Cannot infer instance-identifier reference {0}")]
    DerefInstanceIdentifier(String),

    #[error("Illegal target type {0}")]
    IllegalTargetType(String),

    #[error("Unexpected deref({path}) reference in {target_path}")]
    DerefNotLeaf { path: String, target_path: String },

    #[error("Cannot convert uninstantiated context")]
    UninstantiatedContext,

    #[error("Provided inference is not consistent with resolved path")]
    Inconsistent,
}
