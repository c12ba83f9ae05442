//! Symbolic Lagrangian of a circuit.
//!
//! The kinetic energy is the capacitive energy `½·vᵀ·C·v` of the node-flux
//! velocities; the potential collects inductive and Josephson energies. Both
//! are rewritten in the new coordinates through `φ = T·θ`, after which the
//! frozen coordinates are eliminated from the potential by solving their
//! stationarity conditions.

use indexmap::IndexSet;
use nalgebra::DMatrix;
use sqcircuit_core::{Branch, BranchId, BranchKind, CircuitGraph, NodeId, ParamValue, ParameterTable};
use sqcircuit_expr::{Error as ExprError, Expr};

use crate::error::{Error, Result};
use crate::matrix::{self, SymbolicMatrix};
use crate::transform::CategoryMap;

pub fn node_flux(id: NodeId) -> Expr {
    if id.is_ground() {
        Expr::zero()
    } else {
        Expr::sym(format!("φ{}", id.as_u32()))
    }
}

pub fn theta(index: usize) -> Expr {
    Expr::sym(format!("θ{index}"))
}

fn symbolic(value: &ParamValue) -> Expr {
    match value {
        ParamValue::Number(v) => Expr::num(*v),
        ParamValue::Symbol(name) => Expr::sym(name.as_str()),
    }
}

/// Value of a branch parameter, bound to its number when `substitute` is set.
pub(crate) fn parameter_expr(
    value: &ParamValue,
    params: &ParameterTable,
    substitute: bool,
) -> Result<Expr> {
    match value {
        ParamValue::Symbol(name) if substitute => params
            .get(name)
            .map(Expr::num)
            .ok_or_else(|| Error::UnknownParameter(name.clone())),
        value => Ok(symbolic(value)),
    }
}

fn required(branch: &Branch, name: &str) -> Result<Expr> {
    branch
        .parameter(name)
        .map(symbolic)
        .ok_or_else(|| Error::UnknownParameter(format!("{name} of {branch}")))
}

/// Capacitance matrix in node-flux coordinates, ground row and column
/// dropped.
///
/// Every non-shorted capacitor or junction contributes `-1/(8·E)` between
/// its endpoints, `E` being its charging energy; the diagonal is the
/// negative off-diagonal row sum.
pub fn capacitance_matrix(
    graph: &CircuitGraph,
    params: &ParameterTable,
    substitute: bool,
) -> Result<SymbolicMatrix> {
    let grounded = graph.is_grounded();
    let size = graph.node_count() + usize::from(grounded);
    let index = |id: NodeId| {
        if grounded {
            id.as_u32() as usize
        } else {
            id.as_u32() as usize - 1
        }
    };

    let mut upper: SymbolicMatrix = DMatrix::from_element(size, size, Expr::zero());
    for branch in graph.branches() {
        let Some(energy) = branch.charging_energy() else {
            continue;
        };
        if branch.is_shorted() {
            continue;
        }
        let energy = parameter_expr(energy, params, substitute)?;
        let (a, b) = branch.nodes();
        let (i, j) = (index(a), index(b));
        upper[(i, j)] = upper[(i, j)].clone() + (-0.125) * energy.recip();
    }

    let mut c = DMatrix::from_fn(size, size, |i, j| {
        if i == j {
            Expr::zero()
        } else {
            (upper[(i, j)].clone() + upper[(j, i)].clone()).expand()
        }
    });
    for i in 0..size {
        let row_sum = Expr::sum((0..size).filter(|&j| j != i).map(|j| c[(i, j)].clone()));
        c[(i, i)] = (-row_sum).expand();
    }

    if grounded {
        let n = graph.node_count();
        Ok(c.view((1, 1), (n, n)).into_owned())
    } else {
        Ok(c)
    }
}

fn external_flux<'a>(id: BranchId, fluxes: &'a [(BranchId, Expr)]) -> Option<&'a Expr> {
    fluxes.iter().find(|(b, _)| *b == id).map(|(_, phi)| phi)
}

/// Gauge-invariant phase across a branch, shifted by its external flux.
fn branch_phase(branch: &Branch, fluxes: &[(BranchId, Expr)]) -> Expr {
    let (a, b) = branch.nodes();
    let phase = node_flux(b) - node_flux(a);
    match external_flux(branch.id(), fluxes) {
        Some(phi) => phase + phi.clone(),
        None => phase,
    }
}

/// Inductive and Josephson energy in node fluxes.
pub fn potential_node_vars(graph: &CircuitGraph, fluxes: &[(BranchId, Expr)]) -> Result<Expr> {
    let mut terms = Vec::new();
    for branch in graph.branches() {
        let phase = branch_phase(branch, fluxes);
        match branch.kind() {
            BranchKind::Capacitor => {}
            BranchKind::Inductor => {
                terms.push(0.5 * required(branch, "EL")? * phase.powi(2));
            }
            BranchKind::Josephson => {
                terms.push(-required(branch, "EJ")? * Expr::cos(phase));
            }
            BranchKind::DoubledJosephson => {
                terms.push(-required(branch, "EJ")? * Expr::cos(2.0 * phase));
            }
        }
    }
    Ok(Expr::sum(terms).expand())
}

/// Symbolic Lagrangians and potential of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct Lagrangian {
    /// Lagrangian in the new coordinates θ and velocities vθ.
    pub theta: Expr,
    /// Potential in θ, frozen coordinates eliminated.
    pub potential: Expr,
    /// Lagrangian in node fluxes φ and velocities vφ.
    pub node_vars: Expr,
}

/// Derive the Lagrangian for a transformation and its categories.
pub fn derive(
    graph: &CircuitGraph,
    params: &ParameterTable,
    transformation: &DMatrix<f64>,
    categories: &CategoryMap,
    fluxes: &[(BranchId, Expr)],
) -> Result<Lagrangian> {
    let n = graph.node_count();
    let c = capacitance_matrix(graph, params, false)?;

    let node_velocities: Vec<Expr> = (1..=n).map(|i| Expr::sym(format!("vφ{i}"))).collect();
    let velocities: Vec<Expr> = (1..=n).map(|i| Expr::sym(format!("vθ{i}"))).collect();
    let kinetic_node = matrix::quadratic_form(&c, &node_velocities);
    let kinetic = matrix::quadratic_form(&matrix::congruence(transformation, &c)?, &velocities);

    let potential_node = potential_node_vars(graph, fluxes)?;
    let bindings: Vec<(String, Expr)> = (0..n)
        .map(|i| {
            let combo = Expr::sum((0..n).filter_map(|j| {
                let t = transformation[(i, j)];
                (t != 0.0).then(|| t * theta(j + 1))
            }));
            (format!("φ{}", i + 1), combo)
        })
        .collect();
    let mut potential = potential_node.subs_all(&bindings).expand();

    for &index in &categories.frozen {
        let var = format!("θ{index}");
        if !potential.contains_symbol(&var) {
            log::debug!("frozen variable {var} does not enter the potential");
            continue;
        }
        let root = potential.diff(&var).solve_linear(&var).map_err(|e| match e {
            ExprError::NonLinear { variable } | ExprError::NoSolution { variable } => {
                Error::UnsolvableElimination { variable }
            }
            other => Error::Expr(other),
        })?;
        log::debug!("eliminated {var} = {root}");
        potential = potential.subs(&var, &root).expand();
    }

    Ok(Lagrangian {
        theta: (kinetic - potential.clone()).expand(),
        potential,
        node_vars: (kinetic_node - potential_node).expand(),
    })
}

/// Substitutions `E → 1/(8·C<k>)` for the distinct symbolic charging energies
/// of non-shorted capacitive branches, numbered in branch order.
pub fn capacitance_relabeling(graph: &CircuitGraph) -> Vec<(String, Expr)> {
    let names: IndexSet<&str> = graph
        .branches()
        .iter()
        .filter(|b| !b.is_shorted())
        .filter_map(|b| b.charging_energy().and_then(ParamValue::as_symbol))
        .collect();
    names
        .into_iter()
        .enumerate()
        .map(|(k, name)| {
            let capacitance = Expr::sym(format!("C{}", k + 1));
            (name.to_string(), (8.0 * capacitance).recip().expand())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqcircuit_core::BranchDescriptor;
    use sqcircuit_expr::EvalContext;

    fn circuit(node_count: usize, lines: &[&str]) -> (CircuitGraph, ParameterTable) {
        let descriptors: Vec<BranchDescriptor> = lines.iter().map(|l| l.parse().unwrap()).collect();
        CircuitGraph::from_descriptors(node_count, &descriptors).unwrap()
    }

    #[test]
    fn test_capacitance_matrix_numeric() {
        let (g, p) = circuit(2, &["C 0 1 0.5", "C 1 2 0.25"]);
        let c = capacitance_matrix(&g, &p, false).unwrap();
        let value = |i: usize, j: usize| c[(i, j)].constant_value().unwrap();
        // 1/(8*0.5) = 0.25 and 1/(8*0.25) = 0.5
        assert!((value(0, 0) - 0.75).abs() < 1e-12);
        assert!((value(0, 1) + 0.5).abs() < 1e-12);
        assert!((value(1, 0) + 0.5).abs() < 1e-12);
        assert!((value(1, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_capacitance_matrix_symbolic() {
        let (g, p) = circuit(2, &["C 1 2 EC=2", "JJ 1 2 EJ=1 ECJ=4", "C 1 1 EC"]);
        let c = capacitance_matrix(&g, &p, false).unwrap();
        assert!(c[(0, 1)].contains_symbol("EC"));
        assert!(c[(0, 1)].contains_symbol("ECJ"));
        assert!((c[(0, 0)].clone() + c[(0, 1)].clone()).is_identically_zero());

        let ctx = EvalContext::new().with("EC", 2.0).with("ECJ", 4.0);
        let bound = capacitance_matrix(&g, &p, true).unwrap();
        let expected = -(1.0 / 16.0 + 1.0 / 32.0);
        assert!((c[(0, 1)].eval(&ctx).unwrap() - expected).abs() < 1e-12);
        assert!((bound[(0, 1)].constant_value().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_potential_with_external_flux() {
        let (g, _) = circuit(2, &["L 1 2 EL=1", "JJ 0 1 EJ=3 1", "JJ2 2 0 EJ 1"]);
        let fluxes = vec![(BranchId::new(0), Expr::sym("Φ1"))];
        let v = potential_node_vars(&g, &fluxes).unwrap();
        let expected = 0.5 * Expr::sym("EL") * (Expr::sym("φ2") - Expr::sym("φ1") + Expr::sym("Φ1")).powi(2)
            - Expr::sym("EJ") * Expr::cos(Expr::sym("φ1"))
            - Expr::sym("EJ") * Expr::cos(-2.0 * Expr::sym("φ2"));
        assert!((v - expected).is_identically_zero());
    }

    #[test]
    fn test_frozen_elimination() {
        // inductors in series through node 2
        let (g, p) = circuit(2, &["C 0 1 EC=1", "L 1 2 EL1=1", "L 2 0 EL2=2"]);
        let t = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let categories = CategoryMap {
            extended: vec![1],
            frozen: vec![2],
            ..CategoryMap::default()
        };
        let l = derive(&g, &p, &t, &categories, &[]).unwrap();
        assert!(!l.potential.contains_symbol("θ2"));

        let ctx = EvalContext::new()
            .with("EL1", 1.0)
            .with("EL2", 2.0)
            .with("θ1", 0.3);
        let series = 1.0 * 2.0 / 3.0;
        assert!((l.potential.eval(&ctx).unwrap() - 0.5 * series * 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_frozen_coordinate_inside_junction() {
        // automatic classification never freezes a junction node
        let (g, p) = circuit(1, &["C 0 1 1", "JJ 0 1 10 1", "L 0 1 2"]);
        let categories = CategoryMap {
            frozen: vec![1],
            ..CategoryMap::default()
        };
        let err = derive(&g, &p, &DMatrix::identity(1, 1), &categories, &[]).unwrap_err();
        assert_eq!(
            err,
            Error::UnsolvableElimination {
                variable: "θ1".to_string()
            }
        );
    }

    #[test]
    fn test_relabeling() {
        let (g, _) = circuit(3, &["C 1 2 EC=1", "JJ 2 3 EJ=1 EC", "C 3 3 ES=1", "C 1 3 ED=2"]);
        let relabel = capacitance_relabeling(&g);
        let names: Vec<&str> = relabel.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["EC", "ED"]);
        assert_eq!(relabel[1].1.to_string(), "0.125*C2^-1");
    }
}
