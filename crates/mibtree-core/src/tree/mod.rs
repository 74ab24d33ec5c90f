//! OID tree and provider registry.
//!
//! [`MibTree`] stores nodes in an arena. Each node owns its children through
//! a `BTreeMap` keyed by arc, so iteration is always in numeric order, and
//! points back at its parent by [`NodeId`]. Nodes are created on demand and
//! pruned again when nothing (children, value or provider) keeps them
//! alive.
//!
//! Providers are registered on top of the tree (see `registry.rs`) and give
//! meaning to the values stored below them (see `table.rs`).
//!
//! # Example
//!
//! ```
//! use mibtree_core::{MibTree, Oid, ScalarProvider, ValueType};
//!
//! let mut tree = MibTree::new();
//! let oid = Oid::parse("1.3.6.1.2.1.1.1").unwrap();
//! tree.register_provider(ScalarProvider::new("sysDescr", oid, Some(ValueType::OctetString)))
//!     .unwrap();
//! tree.set_scalar("sysDescr", "router").unwrap();
//!
//! let (next, value) = tree.next_instance(&Oid::parse("1.3.6.1.2.1.1").unwrap()).unwrap();
//! assert_eq!(next.to_string(), "1.3.6.1.2.1.1.1.0");
//! assert_eq!(value.as_str(), Some("router"));
//! ```

mod node;
mod oid;
mod registry;
mod table;

use std::collections::BTreeMap;

pub use node::{MibNode, NodeId};
pub use oid::{Oid, MAX_COMPONENT};
pub use table::{CellOrder, RowKey};

use crate::error::{MibError, Result};
use crate::value::Value;
use registry::Registered;

/// OID tree with attached providers and values.
#[derive(Clone, Debug)]
pub struct MibTree {
    nodes: Vec<Option<MibNode>>,
    free: Vec<NodeId>,
    providers: BTreeMap<String, Registered>,
    /// Provider names in registration order.
    order: Vec<String>,
}

impl Default for MibTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MibTree {
    /// Create a tree holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(MibNode::new(Oid::root(), None))],
            free: Vec::new(),
            providers: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Id of the root node (empty address).
    #[must_use]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    const ROOT: NodeId = NodeId::FIRST;

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&MibNode> {
        self.nodes.get(id.to_index()).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut MibNode> {
        self.nodes.get_mut(id.to_index()).and_then(Option::as_mut)
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Only the root is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Id of the node at `oid`, if it exists.
    #[must_use]
    pub fn find(&self, oid: &Oid) -> Option<NodeId> {
        let mut id = Self::ROOT;
        for &arc in oid.arcs() {
            id = self.node(id)?.child(arc)?;
        }
        Some(id)
    }

    /// Node at `oid`, if it exists.
    #[must_use]
    pub fn get(&self, oid: &Oid) -> Option<&MibNode> {
        self.find(oid).and_then(|id| self.node(id))
    }

    /// Id of the node at `oid`, creating it and any missing ancestors.
    pub fn materialize(&mut self, oid: &Oid) -> NodeId {
        let mut id = Self::ROOT;
        for (depth, &arc) in oid.arcs().iter().enumerate() {
            id = match self.node(id).and_then(|n| n.child(arc)) {
                Some(child) => child,
                None => {
                    let address = Oid::from_arcs(oid.arcs()[..=depth].to_vec());
                    let child = self.alloc(MibNode::new(address, Some(id)));
                    if let Some(parent) = self.node_mut(id) {
                        parent.children_mut().insert(arc, child);
                    }
                    child
                }
            };
        }
        id
    }

    /// The node at `oid` if present; otherwise, below the deepest existing
    /// ancestor, the child immediately preceding the missing arc, or the
    /// ancestor itself when no such child exists.
    #[must_use]
    pub fn nearest_at_or_before(&self, oid: &Oid) -> NodeId {
        let mut id = Self::ROOT;
        for &arc in oid.arcs() {
            let Some(node) = self.node(id) else { break };
            match node.child(arc) {
                Some(child) => id = child,
                None => {
                    return node
                        .children()
                        .range(..arc)
                        .next_back()
                        .map_or(id, |(_, &prev)| prev);
                }
            }
        }
        id
    }

    /// First value-holding node strictly after `oid` in numeric order, as
    /// used by SNMP get-next.
    #[must_use]
    pub fn next_instance(&self, oid: &Oid) -> Option<(&Oid, &Value)> {
        self.preorder(Self::ROOT)
            .filter(|node| node.address() > oid)
            .find_map(|node| node.value().map(|v| (node.address(), v)))
    }

    /// Nodes of the subtree at `id` in depth-first, numeric order.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Remove a childless node.
    pub(crate) fn delete(&mut self, id: NodeId) -> Result<()> {
        if id == Self::ROOT {
            return Err(MibError::RootNode);
        }
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        if !node.is_leaf() {
            return Err(MibError::NonLeafNode(node.oid()));
        }
        let parent = node.parent();
        let arc = node.address().last_arc();
        if let (Some(parent), Some(arc)) = (parent.and_then(|p| self.node_mut(p)), arc) {
            parent.children_mut().remove(&arc);
        }
        self.nodes[id.to_index()] = None;
        self.free.push(id);
        Ok(())
    }

    /// Delete `id` and then every ancestor left vacant, stopping below the
    /// root.
    pub(crate) fn prune(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            if id == Self::ROOT {
                break;
            }
            let Some(node) = self.node(id) else { break };
            if !node.is_vacant() {
                break;
            }
            current = node.parent();
            if self.delete(id).is_err() {
                break;
            }
        }
    }

    /// Fail if a value write at `oid` would put a value on an interior node
    /// or below another value.
    pub(crate) fn check_value_slot(&self, oid: &Oid) -> Result<()> {
        let mut id = Self::ROOT;
        for &arc in oid.arcs() {
            let Some(node) = self.node(id) else {
                return Ok(());
            };
            if node.value().is_some() {
                return Err(MibError::ValueNodeConflict(node.oid()));
            }
            match node.child(arc) {
                Some(child) => id = child,
                None => return Ok(()),
            }
        }
        match self.node(id) {
            Some(node) if !node.is_leaf() => Err(MibError::ValueNodeConflict(node.oid())),
            _ => Ok(()),
        }
    }

    fn alloc(&mut self, node: MibNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.to_index()] = Some(node);
            return id;
        }
        self.nodes.push(Some(node));
        NodeId::from_index(self.nodes.len() - 1).unwrap_or(Self::ROOT)
    }
}

/// Depth-first iterator over a subtree; see [`MibTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a MibTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a MibNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.tree.node(id) {
                self.stack.extend(node.children().values().rev());
                return Some(node);
            }
        }
        None
    }
}
