//! Independent-mode computation.
//!
//! A mode is an assignment of one flux coefficient per node. For a subset of
//! branches, the independent modes span the flux assignments that have no
//! flux difference across any branch of the subset: every connected island
//! of the subset moves as one block, and an island touching ground cannot
//! move at all.

use nalgebra::DVector;
use sqcircuit_core::{BranchId, CircuitGraph, NodeId};

use crate::subspace::Subspace;

/// Coefficients written into emitted mode vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeEntries {
    /// Value at the nodes of the island the vector describes.
    pub on: f64,
    /// Value everywhere else.
    pub off: f64,
}

impl ModeEntries {
    /// `on = 1`, `off = 0`.
    pub const INDICATOR: ModeEntries = ModeEntries { on: 1.0, off: 0.0 };
    /// `on = -1`, `off = 1`, used for oscillator modes while building the
    /// transformation.
    pub const SIGNED: ModeEntries = ModeEntries { on: -1.0, off: 1.0 };
}

impl Default for ModeEntries {
    fn default() -> Self {
        Self::INDICATOR
    }
}

/// Label assigned to nodes of an island connected to ground.
const GROUNDED: i64 = -1;
/// Label assigned to nodes touched by no branch of the subset.
const UNTOUCHED: i64 = 0;

/// Position of a node in mode vectors before the ground coordinate is dropped.
fn position(graph: &CircuitGraph, id: NodeId) -> usize {
    if id.is_ground() {
        graph.node_count()
    } else {
        id.as_u32() as usize - 1
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Island label of every node position (ground last when present).
///
/// Islands are numbered from 1 in order of their smallest node position, so
/// the labelling is independent of the order of `subset`.
pub(crate) fn island_labels(graph: &CircuitGraph, subset: &[BranchId]) -> Vec<i64> {
    let size = graph.node_count() + usize::from(graph.is_grounded());
    let mut parent: Vec<usize> = (0..size).collect();
    let mut touched = vec![false; size];

    for &id in subset {
        let (a, b) = graph.branch(id).nodes();
        let (pa, pb) = (position(graph, a), position(graph, b));
        touched[pa] = true;
        touched[pb] = true;
        let (ra, rb) = (find(&mut parent, pa), find(&mut parent, pb));
        if ra != rb {
            // keep the smaller position as root
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            parent[hi] = lo;
        }
    }

    let ground_root = graph
        .is_grounded()
        .then(|| find(&mut parent, size - 1));

    let mut labels = vec![UNTOUCHED; size];
    let mut root_labels: Vec<Option<i64>> = vec![None; size];
    let mut next = 1;
    for pos in 0..size {
        if !touched[pos] {
            continue;
        }
        let root = find(&mut parent, pos);
        if Some(root) == ground_root {
            labels[pos] = GROUNDED;
            continue;
        }
        let label = *root_labels[root].get_or_insert_with(|| {
            let l = next;
            next += 1;
            l
        });
        labels[pos] = label;
    }
    labels
}

/// Basis of the modes with no flux difference across any branch in `subset`.
///
/// One vector is emitted per island label in ascending order (the untouched
/// label 0 included, grounded islands excluded). With `single_nodes`, the
/// elementary vector of each untouched node is appended as well when it
/// increases the rank. Vectors have one entry per non-ground node.
pub fn independent_modes(
    graph: &CircuitGraph,
    subset: &[BranchId],
    single_nodes: bool,
    entries: ModeEntries,
) -> Vec<DVector<f64>> {
    let labels = island_labels(graph, subset);
    let size = labels.len();

    let mut distinct: Vec<i64> = labels.iter().copied().filter(|&l| l != GROUNDED).collect();
    distinct.sort_unstable();
    distinct.dedup();

    let mut basis: Vec<DVector<f64>> = distinct
        .iter()
        .map(|&label| {
            DVector::from_iterator(
                size,
                labels
                    .iter()
                    .map(|&l| if l == label { entries.on } else { entries.off }),
            )
        })
        .collect();

    if single_nodes {
        let mut span = Subspace::spanned_by(size, &basis);
        for (pos, _) in labels.iter().enumerate().filter(|&(_, &l)| l == UNTOUCHED) {
            let mode = DVector::from_fn(size, |i, _| if i == pos { entries.on } else { entries.off });
            if span.try_insert(&mode) {
                basis.push(mode);
            }
        }
    }

    if graph.is_grounded() {
        basis = basis
            .into_iter()
            .map(|v| v.rows(0, size - 1).into_owned())
            .filter(|v| v.iter().any(|&x| x != 0.0))
            .collect();
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use sqcircuit_core::{BranchDescriptor, BranchKind};

    fn graph(node_count: usize, lines: &[&str]) -> CircuitGraph {
        let descriptors: Vec<BranchDescriptor> = lines.iter().map(|l| l.parse().unwrap()).collect();
        CircuitGraph::from_descriptors(node_count, &descriptors).unwrap().0
    }

    #[test]
    fn test_labels_by_smallest_node() {
        let g = graph(4, &["C 3 4 1", "C 1 2 1"]);
        let all: Vec<BranchId> = g.branch_ids_where(|_| true);
        assert_eq!(island_labels(&g, &all), vec![1, 1, 2, 2]);
        let reversed: Vec<BranchId> = all.iter().rev().copied().collect();
        assert_eq!(island_labels(&g, &reversed), vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_grounded_island_label() {
        let g = graph(3, &["L 0 1 1", "C 2 3 1"]);
        let inductors = g.branch_ids_where(BranchKind::is_inductor);
        // node1 and ground grounded, nodes 2 and 3 untouched
        assert_eq!(island_labels(&g, &inductors), vec![-1, 0, 0, -1]);
    }

    #[test]
    fn test_transmon_modes() {
        let g = graph(2, &["C 1 2 EC=1", "JJ 1 2 EJ=10 EC"]);
        let inductors = g.branch_ids_where(BranchKind::is_inductor);
        let periodic = independent_modes(&g, &inductors, true, ModeEntries::INDICATOR);
        assert_eq!(periodic, vec![dvector![1.0, 1.0], dvector![1.0, 0.0]]);

        let non_capacitive = g.branch_ids_where(|k| !k.is_capacitor());
        let cyclic = independent_modes(&g, &non_capacitive, true, ModeEntries::INDICATOR);
        assert_eq!(cyclic, vec![dvector![1.0, 1.0]]);
    }

    #[test]
    fn test_signed_entries() {
        let g = graph(3, &["JJ 1 2 1 1", "C 2 3 1"]);
        let junctions = g.branch_ids_where(|k| k == BranchKind::Josephson);
        let modes = independent_modes(&g, &junctions, false, ModeEntries::SIGNED);
        assert_eq!(modes, vec![dvector![1.0, 1.0, -1.0], dvector![-1.0, -1.0, 1.0]]);
    }

    #[test]
    fn test_grounded_coordinate_dropped() {
        let g = graph(2, &["L 0 1 1", "C 1 2 1"]);
        let inductors = g.branch_ids_where(BranchKind::is_inductor);
        let modes = independent_modes(&g, &inductors, true, ModeEntries::INDICATOR);
        assert_eq!(modes, vec![dvector![0.0, 1.0]]);
    }

    #[test]
    fn test_empty_subset() {
        let g = graph(3, &["C 1 2 1", "C 2 3 1"]);
        let modes = independent_modes(&g, &[], true, ModeEntries::INDICATOR);
        assert_eq!(modes.len(), 3);
        assert_eq!(modes[0], dvector![1.0, 1.0, 1.0]);
        assert_eq!(Subspace::spanned_by(3, &modes).rank(), 3);
    }
}
