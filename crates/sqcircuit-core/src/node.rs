//! Node representation for circuit graphs.

use std::fmt;

use crate::branch::BranchId;

/// Unique identifier for a node in the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The ground node (node 0).
    pub const GROUND: NodeId = NodeId(0);

    /// Create a new NodeId from a raw value.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Get the raw node ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Check if this is the ground node.
    pub fn is_ground(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A node in the circuit graph.
///
/// Incident branches are stored as indices into the owning graph's branch
/// arena; a node never owns its branches.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    branches: Vec<BranchId>,
}

impl Node {
    /// Create a new node with the given ID.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            branches: Vec::new(),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        self.id.is_ground()
    }

    /// Branches incident to this node, in insertion order.
    pub fn branches(&self) -> &[BranchId] {
        &self.branches
    }

    /// Number of incident branches.
    pub fn degree(&self) -> usize {
        self.branches.len()
    }

    pub(crate) fn attach(&mut self, branch: BranchId) {
        self.branches.push(branch);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_node() {
        assert!(NodeId::GROUND.is_ground());
        assert_eq!(NodeId::GROUND.as_u32(), 0);
        assert_eq!(NodeId::GROUND.to_string(), "GND");
    }

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert!(!id.is_ground());
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_attach_branches() {
        let mut node = Node::new(NodeId::new(3));
        assert_eq!(node.degree(), 0);
        node.attach(BranchId::new(0));
        node.attach(BranchId::new(4));
        assert_eq!(node.branches(), &[BranchId::new(0), BranchId::new(4)]);
        assert_eq!(node.to_string(), "Node 3");
    }
}
