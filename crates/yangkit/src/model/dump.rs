//! Human-readable dump of the schema tree, used for inspection and snapshot tests.

use std::fmt::Write;

use super::{EffectiveModel, NodeId};
use crate::stmt::Status;

impl EffectiveModel {
    /// One line per schema node, modules in build order.
    ///
    /// ```text
    /// module foo
    ///   list items key(id)
    ///     leaf id: string
    ///     leaf label: string ro
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        for module in self.modules() {
            writeln!(w, "module {}", module.name)?;
            for child in self.node(module.root).schema_children() {
                self.format_node(child, 1, w)?;
            }
        }
        Ok(())
    }

    fn format_node(&self, id: NodeId, depth: usize, w: &mut impl Write) -> std::fmt::Result {
        let node = self.node(id);
        write!(w, "{}{}", "  ".repeat(depth), node.keyword())?;
        if let Some(qname) = node.qname() {
            write!(w, " {}", qname.local_name())?;
        }
        if !node.keys().is_empty() {
            let keys: Vec<&str> = node.keys().iter().map(|k| k.local_name()).collect();
            write!(w, " key({})", keys.join(" "))?;
        }
        if let Some(ty) = node.type_definition() {
            write!(w, ": {}", ty.describe())?;
        }

        let flags = node.flags();
        let mut words = Vec::new();
        if node.is_data_node() && !flags.config() {
            words.push("ro");
        }
        if flags.mandatory() {
            words.push("mandatory");
        }
        if flags.presence() {
            words.push("presence");
        }
        if flags.user_ordered() {
            words.push("user-ordered");
        }
        match flags.status() {
            Status::Current => {}
            Status::Deprecated => words.push("deprecated"),
            Status::Obsolete => words.push("obsolete"),
        }
        if flags.added_by_uses() {
            words.push("uses");
        }
        if flags.augmenting() {
            words.push("augment");
        }
        for word in words {
            write!(w, " {word}")?;
        }
        writeln!(w)?;

        for child in node.schema_children() {
            self.format_node(child, depth + 1, w)?;
        }
        Ok(())
    }
}
