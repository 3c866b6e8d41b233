//! The effective schema model.
//!
//! An immutable arena of [`EffectiveNode`]s, one per statement that survived
//! expansion and pruning. Each node records its schema-tree parent and its nearest
//! data-tree ancestor, with `choice`/`case` transparent on the data axis, so
//! navigation never re-walks choice chains.
//!
//! The model is `Send + Sync`: any number of threads may navigate it at once.

mod constraints;
mod dump;
mod types;


use std::sync::Arc;

use indexmap::IndexMap;
use yangkit_core::{QName, QNameModule, SchemaNodeIdentifier, YangVersion};

pub use constraints::{
    Bit, ConstraintError, EnumMember, MemberDecl, Pattern, RangeSet, decimal_range,
    integral_range, length, number_bits, number_enums, restrict_bits, restrict_enums,
};
pub use types::{BuiltinType, Restrictions, TypeDefinition, TypeKind, YANG_NAMESPACE, restrict};

use crate::diagnostics::Span;
use crate::stmt::{Keyword, Status, StmtKeyword};

/// Handle of a node in an [`EffectiveModel`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Packed per-node flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u16);

impl Flags {
    const CONFIG: u16 = 1 << 0;
    const MANDATORY: u16 = 1 << 1;
    const STATUS_SHIFT: u16 = 2;
    const STATUS_MASK: u16 = 0b11 << Self::STATUS_SHIFT;
    const USER_ORDERED: u16 = 1 << 4;
    const PRESENCE: u16 = 1 << 5;
    const ADDED_BY_USES: u16 = 1 << 6;
    const AUGMENTING: u16 = 1 << 7;

    fn with(self, bit: u16, value: bool) -> Self {
        if value {
            Self(self.0 | bit)
        } else {
            Self(self.0 & !bit)
        }
    }

    pub fn config(self) -> bool {
        self.0 & Self::CONFIG != 0
    }

    pub fn mandatory(self) -> bool {
        self.0 & Self::MANDATORY != 0
    }

    pub fn status(self) -> Status {
        match (self.0 & Self::STATUS_MASK) >> Self::STATUS_SHIFT {
            1 => Status::Deprecated,
            2 => Status::Obsolete,
            _ => Status::Current,
        }
    }

    pub fn user_ordered(self) -> bool {
        self.0 & Self::USER_ORDERED != 0
    }

    pub fn presence(self) -> bool {
        self.0 & Self::PRESENCE != 0
    }

    pub fn added_by_uses(self) -> bool {
        self.0 & Self::ADDED_BY_USES != 0
    }

    pub fn augmenting(self) -> bool {
        self.0 & Self::AUGMENTING != 0
    }

    pub fn with_config(self, value: bool) -> Self {
        self.with(Self::CONFIG, value)
    }

    pub fn with_mandatory(self, value: bool) -> Self {
        self.with(Self::MANDATORY, value)
    }

    pub fn with_status(self, status: Status) -> Self {
        let bits = match status {
            Status::Current => 0,
            Status::Deprecated => 1,
            Status::Obsolete => 2,
        };
        Self((self.0 & !Self::STATUS_MASK) | (bits << Self::STATUS_SHIFT))
    }

    pub fn with_user_ordered(self, value: bool) -> Self {
        self.with(Self::USER_ORDERED, value)
    }

    pub fn with_presence(self, value: bool) -> Self {
        self.with(Self::PRESENCE, value)
    }

    pub fn with_added_by_uses(self, value: bool) -> Self {
        self.with(Self::ADDED_BY_USES, value)
    }

    pub fn with_augmenting(self, value: bool) -> Self {
        self.with(Self::AUGMENTING, value)
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flags")
            .field("config", &self.config())
            .field("mandatory", &self.mandatory())
            .field("status", &self.status())
            .field("user_ordered", &self.user_ordered())
            .field("presence", &self.presence())
            .field("added_by_uses", &self.added_by_uses())
            .field("augmenting", &self.augmenting())
            .finish()
    }
}

/// The data an effective node is created from.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub keyword: StmtKeyword,
    pub argument: Option<Arc<str>>,
    pub qname: Option<QName>,
    pub span: Span,
    pub flags: Flags,
    pub type_definition: Option<Arc<TypeDefinition>>,
    pub keys: Vec<QName>,
}

#[derive(Debug, Clone)]
pub struct EffectiveNode {
    keyword: StmtKeyword,
    argument: Option<Arc<str>>,
    qname: Option<QName>,
    parent: Option<NodeId>,
    module: NodeId,
    substatements: Vec<NodeId>,
    schema_children: IndexMap<QName, NodeId>,
    data_children: IndexMap<QName, NodeId>,
    groupings: IndexMap<QName, NodeId>,
    typedefs: IndexMap<QName, NodeId>,
    data_parent: Option<NodeId>,
    flags: Flags,
    type_definition: Option<Arc<TypeDefinition>>,
    keys: Vec<QName>,
    span: Span,
}

impl EffectiveNode {
    pub fn keyword(&self) -> &StmtKeyword {
        &self.keyword
    }

    pub fn yang_keyword(&self) -> Option<Keyword> {
        self.keyword.yang()
    }

    pub fn is(&self, keyword: Keyword) -> bool {
        self.keyword.is(keyword)
    }

    /// The argument as written, after string processing.
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// The node's name, for statements whose argument is a namespace-bound identifier.
    pub fn qname(&self) -> Option<&QName> {
        self.qname.as_ref()
    }

    /// Schema-tree parent. `None` for module roots.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The module root this node belongs to.
    pub fn module(&self) -> NodeId {
        self.module
    }

    pub fn substatements(&self) -> &[NodeId] {
        &self.substatements
    }

    pub fn schema_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.schema_children.values().copied()
    }

    pub fn schema_child(&self, qname: &QName) -> Option<NodeId> {
        self.schema_children.get(qname).copied()
    }

    /// Data-tree children, with `choice` and `case` layers flattened away.
    pub fn data_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.data_children.values().copied()
    }

    pub fn data_child(&self, qname: &QName) -> Option<NodeId> {
        self.data_children.get(qname).copied()
    }

    pub fn grouping(&self, qname: &QName) -> Option<NodeId> {
        self.groupings.get(qname).copied()
    }

    pub fn groupings(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.groupings.values().copied()
    }

    pub fn typedef(&self, qname: &QName) -> Option<NodeId> {
        self.typedefs.get(qname).copied()
    }

    pub fn typedefs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.typedefs.values().copied()
    }

    /// Nearest ancestor that is not a `choice` or `case`.
    pub fn data_parent(&self) -> Option<NodeId> {
        self.data_parent
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The resolved type of a `type`, `typedef`, `leaf` or `leaf-list`.
    pub fn type_definition(&self) -> Option<&Arc<TypeDefinition>> {
        self.type_definition.as_ref()
    }

    /// List keys, in `key` statement order.
    pub fn keys(&self) -> &[QName] {
        &self.keys
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_schema_node(&self) -> bool {
        self.yang_keyword().is_some_and(Keyword::is_schema_node)
    }

    pub fn is_data_node(&self) -> bool {
        self.yang_keyword().is_some_and(Keyword::is_data_node)
    }
}

/// Module-level facts kept next to the root node.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: Arc<str>,
    pub namespace: QNameModule,
    pub prefix: Arc<str>,
    pub version: YangVersion,
    pub root: NodeId,
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub qname: QName,
    pub bases: Vec<QName>,
    pub node: NodeId,
}

/// Two schema nodes with the same name under one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict {
    pub existing: NodeId,
    pub duplicate: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct EffectiveModel {
    nodes: Vec<EffectiveNode>,
    modules: IndexMap<QNameModule, ModuleInfo>,
    identities: IndexMap<QName, Identity>,
    features: IndexMap<QName, NodeId>,
}

impl EffectiveModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &EffectiveNode {
        &self.nodes[id.index()]
    }

    /// Like [`node`](Self::node), for handles that may come from another model.
    pub fn get(&self, id: NodeId) -> Option<&EffectiveNode> {
        self.nodes.get(id.index())
    }

    /// Every node, parents before children.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    pub fn module(&self, namespace: &QNameModule) -> Option<&ModuleInfo> {
        self.modules.get(namespace)
    }

    pub fn module_by_name(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.values().find(|m| &*m.name == name)
    }

    /// The module a node belongs to.
    pub fn module_of(&self, id: NodeId) -> Option<&ModuleInfo> {
        let root = self.node(id).module;
        self.modules.values().find(|m| m.root == root)
    }

    pub fn identity(&self, qname: &QName) -> Option<&Identity> {
        self.identities.get(qname)
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    /// Whether `identity` is `base` or derives from it through `base` statements.
    pub fn is_derived_from(&self, identity: &QName, base: &QName) -> bool {
        let mut pending = vec![identity];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if current == base {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(found) = self.identities.get(current) {
                pending.extend(found.bases.iter());
            }
        }
        false
    }

    /// Features that were supported when the model was built.
    pub fn features(&self) -> impl Iterator<Item = &QName> {
        self.features.keys()
    }

    /// Walk an absolute schema node identifier along schema-tree children.
    pub fn find_schema_node(&self, path: &SchemaNodeIdentifier) -> Option<NodeId> {
        if !path.is_absolute() {
            return None;
        }
        let first = path.first_node_identifier();
        let module = self.modules.get(first.module())?;
        path.node_identifiers()
            .iter()
            .try_fold(module.root, |current, step| self.node(current).schema_child(step))
    }

    /// Ancestors of `id` on the schema axis, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |current| {
            self.node(*current).parent
        })
    }

    pub(crate) fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let module = parent.map_or(id, |p| self.node(p).module);
        self.nodes.push(EffectiveNode {
            keyword: data.keyword,
            argument: data.argument,
            qname: data.qname,
            parent,
            module,
            substatements: Vec::new(),
            schema_children: IndexMap::new(),
            data_children: IndexMap::new(),
            groupings: IndexMap::new(),
            typedefs: IndexMap::new(),
            data_parent: None,
            flags: data.flags,
            type_definition: data.type_definition,
            keys: data.keys,
            span: data.span,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].substatements.push(id);
        }
        id
    }

    pub(crate) fn add_module(&mut self, info: ModuleInfo) {
        self.modules.insert(info.namespace.clone(), info);
    }

    pub(crate) fn add_identity(&mut self, identity: Identity) {
        self.identities.insert(identity.qname.clone(), identity);
    }

    pub(crate) fn add_feature(&mut self, qname: QName, node: NodeId) {
        self.features.insert(qname, node);
    }

    /// Fill the per-node indexes from parent links. Nodes are pushed parents first,
    /// so one pass in id order sees every parent before its children.
    ///
    /// Returns schema-tree and data-tree name conflicts, in discovery order.
    pub(crate) fn link(&mut self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for index in 0..self.nodes.len() {
            let id = NodeId(index as u32);
            let Some(parent) = self.nodes[index].parent else {
                continue;
            };
            let keyword = self.nodes[index].yang_keyword();
            let data_parent = self
                .ancestors(id)
                .find(|a| !is_transparent(self.node(*a)));
            self.nodes[index].data_parent = data_parent;

            let Some(qname) = self.nodes[index].qname.clone() else {
                continue;
            };
            match keyword {
                Some(Keyword::Grouping) => {
                    self.nodes[parent.index()].groupings.insert(qname, id);
                }
                Some(Keyword::Typedef) => {
                    self.nodes[parent.index()].typedefs.insert(qname, id);
                }
                Some(kw) if kw.is_schema_node() => {
                    let children = &mut self.nodes[parent.index()].schema_children;
                    if let Some(existing) = children.get(&qname) {
                        conflicts.push(Conflict {
                            existing: *existing,
                            duplicate: id,
                        });
                        continue;
                    }
                    children.insert(qname.clone(), id);

                    if !kw.is_data_node() {
                        continue;
                    }
                    let mut holder = Some(parent);
                    while let Some(current) = holder {
                        let children = &mut self.nodes[current.index()].data_children;
                        if let Some(existing) = children.get(&qname) {
                            if *existing != id {
                                conflicts.push(Conflict {
                                    existing: *existing,
                                    duplicate: id,
                                });
                            }
                            break;
                        }
                        children.insert(qname.clone(), id);
                        holder = if is_transparent(self.node(current)) {
                            self.node(current).parent
                        } else {
                            None
                        };
                    }
                }
                _ => {}
            }
        }
        conflicts
    }
}

/// `choice` and `case` do not appear in instance data.
fn is_transparent(node: &EffectiveNode) -> bool {
    node.is(Keyword::Choice) || node.is(Keyword::Case)
}
