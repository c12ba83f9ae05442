//! Branch elements: capacitors, inductors and Josephson junctions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::Error;
use crate::node::NodeId;

/// Index of a branch in the owning graph's branch arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub(crate) usize);

impl BranchId {
    /// Create a branch id from a raw arena index.
    pub fn new(index: usize) -> Self {
        BranchId(index)
    }

    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Type tag of a two-terminal branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchKind {
    /// Capacitor, parameter `EC`.
    Capacitor,
    /// Linear inductor, parameter `EL`.
    Inductor,
    /// Josephson junction, parameters `EJ` and `ECJ`.
    Josephson,
    /// Junction with a doubled-frequency (cos 2φ) potential, parameters `EJ` and `ECJ`.
    DoubledJosephson,
}

impl BranchKind {
    /// Short tag used in branch descriptors ("C", "L", "JJ", "JJ2").
    pub fn tag(self) -> &'static str {
        match self {
            BranchKind::Capacitor => "C",
            BranchKind::Inductor => "L",
            BranchKind::Josephson => "JJ",
            BranchKind::DoubledJosephson => "JJ2",
        }
    }

    /// Parameter names in the order their tokens appear in a descriptor.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            BranchKind::Capacitor => &["EC"],
            BranchKind::Inductor => &["EL"],
            BranchKind::Josephson | BranchKind::DoubledJosephson => &["EJ", "ECJ"],
        }
    }

    /// Name of the charging-energy parameter, if the branch carries capacitance.
    pub fn charging_parameter(self) -> Option<&'static str> {
        match self {
            BranchKind::Capacitor => Some("EC"),
            BranchKind::Josephson | BranchKind::DoubledJosephson => Some("ECJ"),
            BranchKind::Inductor => None,
        }
    }

    pub fn is_capacitor(self) -> bool {
        self == BranchKind::Capacitor
    }

    pub fn is_inductor(self) -> bool {
        self == BranchKind::Inductor
    }

    /// True for both junction kinds.
    pub fn is_junction(self) -> bool {
        matches!(self, BranchKind::Josephson | BranchKind::DoubledJosephson)
    }
}

impl FromStr for BranchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(BranchKind::Capacitor),
            "L" => Ok(BranchKind::Inductor),
            "JJ" => Ok(BranchKind::Josephson),
            "JJ2" => Ok(BranchKind::DoubledJosephson),
            other => Err(Error::Syntax(format!("unknown branch type `{other}`"))),
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Value of a branch parameter: a bound number or a named symbolic parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Symbol(String),
}

impl ParamValue {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, ParamValue::Symbol(_))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            ParamValue::Symbol(name) => Some(name),
            ParamValue::Number(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Symbol(name) => f.write_str(name),
        }
    }
}

/// A two-terminal branch between two nodes.
///
/// The node order fixes the sign convention: the branch flux is
/// `φ(second) - φ(first)`.
#[derive(Debug, Clone)]
pub struct Branch {
    id: BranchId,
    kind: BranchKind,
    nodes: (NodeId, NodeId),
    parameters: IndexMap<String, ParamValue>,
}

impl Branch {
    pub(crate) fn new(
        id: BranchId,
        kind: BranchKind,
        nodes: (NodeId, NodeId),
        parameters: IndexMap<String, ParamValue>,
    ) -> Self {
        Self {
            id,
            kind,
            nodes,
            parameters,
        }
    }

    pub fn id(&self) -> BranchId {
        self.id
    }

    pub fn kind(&self) -> BranchKind {
        self.kind
    }

    /// Endpoint nodes in descriptor order.
    pub fn nodes(&self) -> (NodeId, NodeId) {
        self.nodes
    }

    /// Raw endpoint ids in descriptor order.
    pub fn node_ids(&self) -> (u32, u32) {
        (self.nodes.0.as_u32(), self.nodes.1.as_u32())
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &IndexMap<String, ParamValue> {
        &self.parameters
    }

    /// The charging-energy parameter (`EC` or `ECJ`), if any.
    pub fn charging_energy(&self) -> Option<&ParamValue> {
        self.kind
            .charging_parameter()
            .and_then(|name| self.parameters.get(name))
    }

    /// Both terminals land on the same node.
    pub fn is_shorted(&self) -> bool {
        self.nodes.0 == self.nodes.1
    }

    pub fn touches_ground(&self) -> bool {
        self.nodes.0.is_ground() || self.nodes.1.is_ground()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.0 == node || self.nodes.1 == node
    }

    /// The endpoint opposite to `node`.
    pub fn other_node(&self, node: NodeId) -> NodeId {
        if self.nodes.0 == node {
            self.nodes.1
        } else {
            self.nodes.0
        }
    }

    /// Two branches are connected when they share at least one node.
    pub fn is_connected(&self, other: &Branch) -> bool {
        let distinct: BTreeSet<NodeId> = [self.nodes.0, self.nodes.1, other.nodes.0, other.nodes.1]
            .into_iter()
            .collect();
        distinct.len() < 4
    }

    /// Nodes shared between this branch and `other`.
    pub fn common_nodes(&self, other: &Branch) -> Vec<NodeId> {
        let mine: BTreeSet<NodeId> = [self.nodes.0, self.nodes.1].into_iter().collect();
        let theirs: BTreeSet<NodeId> = [other.nodes.0, other.nodes.1].into_iter().collect();
        mine.intersection(&theirs).copied().collect()
    }

    /// Same element: equal type, parameters and ordered node ids.
    ///
    /// Used to match branches across structurally identical graphs.
    pub fn same_element(&self, other: &Branch) -> bool {
        self.kind == other.kind
            && self.parameters == other.parameters
            && self.node_ids() == other.node_ids()
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Branch {} connecting nodes: ({},{});",
            self.kind,
            self.nodes.0.as_u32(),
            self.nodes.1.as_u32()
        )?;
        for (name, value) in &self.parameters {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}
