//! Tree nodes and their arena ids.
//!
//! Using `NonZeroU32` enables `Option<NodeId>` niche optimization.

use core::num::NonZeroU32;
use std::collections::BTreeMap;

use super::Oid;
use crate::types::ValueType;
use crate::value::Value;

/// Arena index of a [`MibNode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    pub(crate) const FIRST: Self = Self(NonZeroU32::MIN);

    /// Create from a 0-based index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index + 1).ok().and_then(NonZeroU32::new).map(Self)
    }

    /// Get the 0-based index.
    #[must_use]
    pub const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// A node in the OID tree.
///
/// Children are owned by the tree and keyed by their last arc; the parent
/// link is a plain arena id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MibNode {
    address: Oid,
    parent: Option<NodeId>,
    children: BTreeMap<u32, NodeId>,
    provider: Option<String>,
    value: Option<Value>,
    value_type: Option<ValueType>,
}

impl MibNode {
    pub(crate) fn new(address: Oid, parent: Option<NodeId>) -> Self {
        Self {
            address,
            parent,
            children: BTreeMap::new(),
            provider: None,
            value: None,
            value_type: None,
        }
    }

    #[must_use]
    pub fn address(&self) -> &Oid {
        &self.address
    }

    /// Dotted form of the address.
    #[must_use]
    pub fn oid(&self) -> String {
        self.address.to_dotted()
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children keyed by arc, in numeric order.
    #[must_use]
    pub fn children(&self) -> &BTreeMap<u32, NodeId> {
        &self.children
    }

    #[must_use]
    pub fn child(&self, arc: u32) -> Option<NodeId> {
        self.children.get(&arc).copied()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Name of the provider attached here.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    /// Nothing keeps this node alive.
    pub(crate) fn is_vacant(&self) -> bool {
        self.children.is_empty() && self.provider.is_none() && self.value.is_none()
    }

    pub(crate) fn children_mut(&mut self) -> &mut BTreeMap<u32, NodeId> {
        &mut self.children
    }

    pub(crate) fn set_provider(&mut self, provider: Option<String>) {
        self.provider = provider;
    }

    pub(crate) fn set_value(&mut self, value: Value, value_type: ValueType) {
        self.value = Some(value);
        self.value_type = Some(value_type);
    }

    pub(crate) fn replace_value(&mut self, value: Value) -> Option<Value> {
        self.value.replace(value)
    }

    pub(crate) fn take_value(&mut self) -> Option<Value> {
        self.value_type = None;
        self.value.take()
    }
}
