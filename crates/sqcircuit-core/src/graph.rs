//! Circuit graph representation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::branch::{Branch, BranchId, BranchKind, ParamValue};
use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::params::{parse_token, ParameterTable};

/// Declarative description of one branch, as handed over by an input parser.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchDescriptor {
    pub kind: BranchKind,
    pub nodes: (u32, u32),
    pub tokens: Vec<String>,
}

impl BranchDescriptor {
    pub fn new<I, S>(kind: BranchKind, node_a: u32, node_b: u32, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            nodes: (node_a, node_b),
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parses a single whitespace-separated line such as `JJ 1,2 EJ=10 1`
/// or `C 1 2 0.5`.
impl FromStr for BranchDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let words: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .collect();
        if words.len() < 3 {
            return Err(Error::Syntax(format!("incomplete branch descriptor `{s}`")));
        }
        let kind: BranchKind = words[0].parse()?;
        let node = |w: &str| {
            w.parse::<u32>()
                .map_err(|_| Error::Syntax(format!("invalid node id `{w}` in `{s}`")))
        };
        Ok(Self::new(
            kind,
            node(words[1])?,
            node(words[2])?,
            words[3..].iter().copied(),
        ))
    }
}

impl fmt::Display for BranchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {},{}", self.kind, self.nodes.0, self.nodes.1)?;
        for token in &self.tokens {
            write!(f, " {token}")?;
        }
        Ok(())
    }
}

/// Node/branch topology of a superconducting circuit.
///
/// Nodes `1..=n` always exist; the ground node (id 0) is created only when
/// a branch touches it. Nodes and branches live in arenas and refer to each
/// other by index.
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    nodes: Vec<Node>,
    ground: Option<Node>,
    branches: Vec<Branch>,
    descriptors: Vec<BranchDescriptor>,
}

impl CircuitGraph {
    /// Build a graph from a node count and ordered branch descriptors.
    ///
    /// Symbolic parameters introduced by `name=value` tokens are recorded in
    /// the returned table in declaration order.
    pub fn from_descriptors(
        node_count: usize,
        descriptors: &[BranchDescriptor],
    ) -> Result<(Self, ParameterTable)> {
        if node_count == 0 {
            return Err(Error::Syntax("a circuit needs at least one node".into()));
        }
        let mut graph = Self {
            nodes: (1..=node_count as u32)
                .map(|id| Node::new(NodeId::new(id)))
                .collect(),
            ground: None,
            branches: Vec::with_capacity(descriptors.len()),
            descriptors: descriptors.to_vec(),
        };
        let mut table = ParameterTable::new();

        for descriptor in descriptors {
            graph.add_branch(descriptor, &mut table)?;
        }
        Ok((graph, table))
    }

    fn add_branch(&mut self, descriptor: &BranchDescriptor, table: &mut ParameterTable) -> Result<()> {
        let names = descriptor.kind.parameter_names();
        if descriptor.tokens.len() != names.len() {
            return Err(Error::Syntax(format!(
                "incorrect number of parameters for a {} branch in `{descriptor}`: expected {}, got {}",
                descriptor.kind,
                names.len(),
                descriptor.tokens.len()
            )));
        }

        let (a, b) = descriptor.nodes;
        for id in [a, b] {
            if id as usize > self.nodes.len() {
                return Err(Error::Syntax(format!(
                    "node {id} in `{descriptor}` exceeds the node count {}",
                    self.nodes.len()
                )));
            }
        }

        let mut parameters = IndexMap::new();
        for (name, token) in names.iter().zip(&descriptor.tokens) {
            let value = table.resolve(parse_token(token)?)?;
            parameters.insert((*name).to_string(), value);
        }

        let id = BranchId::new(self.branches.len());
        let (na, nb) = (NodeId::new(a), NodeId::new(b));
        self.branches
            .push(Branch::new(id, descriptor.kind, (na, nb), parameters));
        self.node_mut(na).attach(id);
        if nb != na {
            self.node_mut(nb).attach(id);
        }
        Ok(())
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        if id.is_ground() {
            self.ground.get_or_insert_with(|| Node::new(NodeId::GROUND))
        } else {
            &mut self.nodes[id.as_u32() as usize - 1]
        }
    }

    /// A fresh graph rebuilt from the same branch descriptors.
    pub fn structural_copy(&self) -> Result<Self> {
        Self::from_descriptors(self.nodes.len(), &self.descriptors).map(|(graph, _)| graph)
    }

    /// Branch descriptors this graph was built from.
    pub fn descriptors(&self) -> &[BranchDescriptor] {
        &self.descriptors
    }

    /// Number of nodes, excluding ground.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Non-ground nodes in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Ground node, if any branch touches it.
    pub fn ground(&self) -> Option<&Node> {
        self.ground.as_ref()
    }

    pub fn is_grounded(&self) -> bool {
        self.ground.is_some()
    }

    pub fn is_ground(&self, id: NodeId) -> bool {
        id.is_ground()
    }

    /// All nodes: the non-ground nodes followed by ground.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().chain(self.ground.iter())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if id.is_ground() {
            self.ground.as_ref()
        } else {
            self.nodes.get(id.as_u32() as usize - 1)
        }
    }

    pub fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id.index()]
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Ids of the branches matching a predicate on their kind, in order.
    pub fn branch_ids_where(&self, keep: impl Fn(BranchKind) -> bool) -> Vec<BranchId> {
        self.branches
            .iter()
            .filter(|b| keep(b.kind()))
            .map(Branch::id)
            .collect()
    }

    /// Nodes adjacent to `id`, through branches of `kind` or through any
    /// branch when `kind` is `None`. One entry per connecting branch.
    pub fn connected_nodes(&self, id: NodeId, kind: Option<BranchKind>) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        node.branches()
            .iter()
            .map(|&b| self.branch(b))
            .filter(|b| kind.map_or(true, |k| b.kind() == k))
            .map(|b| b.other_node(id))
            .collect()
    }

    /// True when no node is shared between the two branch sets.
    pub fn are_branch_sets_disconnected(&self, first: &[BranchId], second: &[BranchId]) -> bool {
        let endpoints = |set: &[BranchId]| -> BTreeSet<NodeId> {
            set.iter()
                .flat_map(|&b| {
                    let (x, y) = self.branch(b).nodes();
                    [x, y]
                })
                .collect()
        };
        endpoints(first).is_disjoint(&endpoints(second))
    }

    /// True when any branch parameter refers to a symbolic parameter.
    pub fn has_symbolic_parameters(&self) -> bool {
        self.branches
            .iter()
            .any(|b| b.parameters().values().any(ParamValue::is_symbolic))
    }
}
