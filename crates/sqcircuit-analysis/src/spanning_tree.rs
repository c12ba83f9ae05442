//! Superconducting loop detection.
//!
//! Capacitors carry no persistent current, so loops are found in the network
//! left after deleting them and repeatedly trimming dangling nodes. A
//! breadth-first spanning tree of that network is built level by level; every
//! surviving branch outside the tree closes one loop and receives one
//! external flux.

use std::collections::BTreeSet;

use sqcircuit_core::{BranchId, CircuitGraph, Node, NodeId};

use crate::error::Result;

/// Spanning tree and loop branches of the inductive network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStructure {
    /// Branches of the spanning tree.
    pub tree: Vec<BranchId>,
    /// Every branch that survived trimming, in branch order.
    pub loop_branches: Vec<BranchId>,
}

impl LoopStructure {
    /// Loop branches outside the tree, in branch order.
    pub fn closure_branches(&self) -> Vec<BranchId> {
        if self.tree.is_empty() {
            return Vec::new();
        }
        self.loop_branches
            .iter()
            .filter(|b| !self.tree.contains(b))
            .copied()
            .collect()
    }
}

/// Alive flags over a disposable copy of the circuit.
struct Trimmed<'a> {
    graph: &'a CircuitGraph,
    branch_alive: Vec<bool>,
    node_alive: Vec<bool>,
}

impl<'a> Trimmed<'a> {
    fn without_capacitors(graph: &'a CircuitGraph) -> Self {
        Self {
            graph,
            branch_alive: graph
                .branches()
                .iter()
                .map(|b| !b.kind().is_capacitor())
                .collect(),
            node_alive: vec![true; graph.node_count()],
        }
    }

    fn incident(&self, node: &Node) -> Vec<BranchId> {
        node.branches()
            .iter()
            .copied()
            .filter(|b| self.branch_alive[b.index()])
            .collect()
    }

    fn is_alive(&self, id: NodeId) -> bool {
        id.is_ground() || self.node_alive[id.as_u32() as usize - 1]
    }

    /// Delete isolated nodes and dangling branches until nothing changes.
    fn trim(&mut self) {
        let graph = self.graph;
        loop {
            let mut changed = false;
            for (i, node) in graph.nodes().iter().enumerate() {
                if !self.node_alive[i] {
                    continue;
                }
                let incident = self.incident(node);
                match incident.as_slice() {
                    [] => {}
                    [only] => self.branch_alive[only.index()] = false,
                    _ => continue,
                }
                self.node_alive[i] = false;
                changed = true;
            }
            if !changed {
                break;
            }
        }
    }

    fn remaining(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .iter()
            .map(Node::id)
            .filter(|&id| self.is_alive(id))
            .collect()
    }

    fn neighbours(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.graph.node(id) else {
            return Vec::new();
        };
        self.incident(node)
            .into_iter()
            .map(|b| self.graph.branch(b).other_node(id))
            .collect()
    }

    /// First alive branch of `node`, in its branch order, ending at `other`.
    fn link(&self, node: NodeId, other: NodeId) -> Option<BranchId> {
        let n = self.graph.node(node)?;
        self.incident(n).into_iter().find(|&b| {
            let branch = self.graph.branch(b);
            branch.contains_node(other) && branch.other_node(node) == other
        })
    }

    /// Breadth-first levels, restarting at the first unplaced node whenever a
    /// level comes out empty.
    fn levels(&self, remaining: &[NodeId]) -> Vec<Vec<NodeId>> {
        let start = if self.graph.is_grounded() {
            NodeId::GROUND
        } else {
            remaining[0]
        };
        let total = remaining.len() + usize::from(self.graph.is_grounded());

        let mut placed: BTreeSet<NodeId> = BTreeSet::from([start]);
        let mut levels = vec![vec![start]];
        while placed.len() < total {
            let last = levels.len() - 1;
            if levels[last].is_empty() {
                if let Some(&next) = remaining.iter().find(|&&n| !placed.contains(&n)) {
                    levels[last].push(next);
                    placed.insert(next);
                }
            }
            let mut level: Vec<NodeId> = levels[last]
                .iter()
                .flat_map(|&n| self.neighbours(n))
                .filter(|n| !placed.contains(n))
                .collect();
            level.sort();
            level.dedup();
            placed.extend(level.iter().copied());
            levels.push(level);
        }
        levels
    }
}

/// Match every branch of `copy` to a distinct equal branch of `graph`.
fn map_to_original(graph: &CircuitGraph, copy: &CircuitGraph) -> Vec<Option<BranchId>> {
    let mut used = vec![false; graph.branches().len()];
    copy.branches()
        .iter()
        .map(|cb| {
            let found = graph
                .branches()
                .iter()
                .position(|b| !used[b.id().index()] && b.same_element(cb))?;
            used[found] = true;
            Some(BranchId::new(found))
        })
        .collect()
}

/// Spanning tree and loop branches of the circuit's inductive network.
pub fn spanning_tree(graph: &CircuitGraph) -> Result<LoopStructure> {
    let copy = graph.structural_copy()?;
    let mut trimmed = Trimmed::without_capacitors(&copy);
    trimmed.trim();

    let remaining = trimmed.remaining();
    if remaining.is_empty() {
        return Ok(LoopStructure::default());
    }

    let levels = trimmed.levels(&remaining);
    let mut tree = Vec::new();
    for pair in levels.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        for &node in current {
            if let Some(b) = previous.iter().find_map(|&p| trimmed.link(node, p)) {
                tree.push(b);
            }
        }
    }

    let mapping = map_to_original(graph, &copy);
    let original = |ids: Vec<BranchId>| -> Vec<BranchId> {
        ids.into_iter().filter_map(|b| mapping[b.index()]).collect()
    };
    let loop_branches: Vec<BranchId> = copy
        .branches()
        .iter()
        .map(|b| b.id())
        .filter(|b| trimmed.branch_alive[b.index()])
        .collect();

    Ok(LoopStructure {
        tree: original(tree),
        loop_branches: original(loop_branches),
    })
}

/// Closure branches of the circuit, one per independent superconducting loop.
pub fn closure_branches(graph: &CircuitGraph) -> Result<Vec<BranchId>> {
    let closure = without_capacitors(graph, spanning_tree(graph)?.closure_branches());
    log::debug!("closure branches: {closure:?}");
    Ok(closure)
}

/// Drop capacitive branches, which never carry external flux.
pub fn without_capacitors(graph: &CircuitGraph, branches: Vec<BranchId>) -> Vec<BranchId> {
    branches
        .into_iter()
        .filter(|&b| !graph.branch(b).kind().is_capacitor())
        .collect()
}
