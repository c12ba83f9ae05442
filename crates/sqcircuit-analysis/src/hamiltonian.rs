//! Symbolic Hamiltonian.

use nalgebra::DMatrix;
use sqcircuit_core::{CircuitGraph, ParameterTable};
use sqcircuit_expr::{EvalContext, Expr};

use crate::error::{Error, Result};
use crate::lagrangian::capacitance_matrix;
use crate::matrix::{self, SymbolicMatrix};
use crate::transform::CategoryMap;

/// Relative determinant below which a numeric capacitance block is singular.
const SINGULAR_TOL: f64 = 1e-12;

pub fn momentum(index: usize) -> Expr {
    Expr::sym(format!("Q{index}"))
}

pub fn charge_number(index: usize) -> Expr {
    Expr::sym(format!("n{index}"))
}

pub fn offset_charge(index: usize) -> Expr {
    Expr::sym(format!("ng{index}"))
}

/// Number of dynamical coordinates: frozen coordinates and the sum mode of
/// an ungrounded circuit are excluded.
pub fn dynamical_size(graph: &CircuitGraph, categories: &CategoryMap) -> usize {
    graph
        .node_count()
        .saturating_sub(categories.frozen.len() + usize::from(!graph.is_grounded()))
}

fn numeric_inverse(block: &SymbolicMatrix) -> Result<SymbolicMatrix> {
    let numeric = matrix::evaluate(block, &EvalContext::new())?;
    let k = numeric.nrows() as i32;
    let scale = numeric.amax();
    if scale == 0.0 || (numeric.determinant() / scale.powi(k)).abs() < SINGULAR_TOL {
        return Err(Error::SingularCapacitance);
    }
    let inverse = numeric.try_inverse().ok_or(Error::SingularCapacitance)?;
    Ok(matrix::from_numeric(&inverse))
}

/// Derive `H = ½·Qᵀ·C⁻¹·Q + V`.
///
/// `C⁻¹` inverts the capacitance matrix in new coordinates restricted to
/// the dynamical block. Cyclic momenta are zero and periodic momenta are
/// written as `n<i> + ng<i>`. With `substitute`, every parameter is bound to
/// its current value.
pub fn derive(
    graph: &CircuitGraph,
    params: &ParameterTable,
    transformation: &DMatrix<f64>,
    categories: &CategoryMap,
    potential: &Expr,
    substitute: bool,
) -> Result<Expr> {
    let size = dynamical_size(graph, categories);
    let symbolic = graph.has_symbolic_parameters() && !substitute;

    let c = capacitance_matrix(graph, params, substitute)?;
    let block = matrix::leading_block(&matrix::congruence(transformation, &c)?, size);
    let kinetic = if size == 0 {
        Expr::zero()
    } else {
        let inverse = if symbolic {
            matrix::inverse(&block)?
        } else {
            numeric_inverse(&block)?
        };
        let momenta: Vec<Expr> = (1..=size)
            .map(|i| {
                if categories.is_cyclic(i) {
                    Expr::zero()
                } else {
                    momentum(i)
                }
            })
            .collect();
        matrix::quadratic_form(&inverse, &momenta)
    };

    let potential = if substitute {
        let ctx: EvalContext = params.iter().collect();
        potential.bind(&ctx)
    } else {
        potential.clone()
    };

    let offsets: Vec<(String, Expr)> = categories
        .periodic
        .iter()
        .map(|&i| (format!("Q{i}"), charge_number(i) + offset_charge(i)))
        .collect();
    let hamiltonian = (kinetic + potential).subs_all(&offsets).expand();
    log::debug!("hamiltonian over {size} dynamical coordinates derived");
    Ok(hamiltonian)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lagrangian;
    use sqcircuit_core::BranchDescriptor;

    fn circuit(node_count: usize, lines: &[&str]) -> (CircuitGraph, ParameterTable) {
        let descriptors: Vec<BranchDescriptor> = lines.iter().map(|l| l.parse().unwrap()).collect();
        CircuitGraph::from_descriptors(node_count, &descriptors).unwrap()
    }

    #[test]
    fn test_lc_hamiltonian() {
        let (g, p) = circuit(1, &["C 0 1 2", "L 0 1 0.5"]);
        let t = DMatrix::from_element(1, 1, 1.0);
        let categories = CategoryMap {
            extended: vec![1],
            oscillator: vec![1],
            ..CategoryMap::default()
        };
        let l = lagrangian::derive(&g, &p, &t, &categories, &[]).unwrap();
        let h = derive(&g, &p, &t, &categories, &l.potential, false).unwrap();
        // C = 1/16, so 0.5*Q^2/C = 8*Q^2
        let expected = 8.0 * momentum(1).powi(2) + 0.25 * Expr::sym("θ1").powi(2);
        assert!((h - expected).is_identically_zero());
    }

    #[test]
    fn test_transmon_symbolic_hamiltonian() {
        let (g, p) = circuit(2, &["C 1 2 EC=1", "JJ 1 2 EJ=10 EC"]);
        let t = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 1.0]);
        let categories = CategoryMap {
            periodic: vec![1],
            ..CategoryMap::default()
        };
        let l = lagrangian::derive(&g, &p, &t, &categories, &[]).unwrap();
        let h = derive(&g, &p, &t, &categories, &l.potential, false).unwrap();

        let n = charge_number(1) + offset_charge(1);
        let expected = 2.0 * Expr::sym("EC") * n.powi(2) - Expr::sym("EJ") * Expr::cos(Expr::sym("θ1"));
        assert!((h.clone() - expected).is_identically_zero());
        assert!(!h.contains_symbol("Q1"));

        let bound = derive(&g, &p, &t, &categories, &l.potential, true).unwrap();
        assert!(!bound.contains_symbol("EC"));
        assert!(!bound.contains_symbol("EJ"));
    }

    #[test]
    fn test_cyclic_momentum_dropped() {
        // node 2 floats on a capacitor only: its coordinate is cyclic
        let (g, p) = circuit(2, &["C 0 1 1", "L 0 1 1", "C 1 2 1"]);
        let t = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let categories = CategoryMap {
            extended: vec![1],
            cyclic: vec![2],
            ..CategoryMap::default()
        };
        let l = lagrangian::derive(&g, &p, &t, &categories, &[]).unwrap();
        let h = derive(&g, &p, &t, &categories, &l.potential, false).unwrap();
        assert!(h.contains_symbol("Q1"));
        assert!(!h.contains_symbol("Q2"));
    }

    #[test]
    fn test_singular_block() {
        let (g, p) = circuit(2, &["C 0 1 1", "L 1 2 1", "L 2 0 1"]);
        let t = DMatrix::identity(2, 2);
        // treating the inductor-only node as dynamical leaves no capacitance on it
        let categories = CategoryMap {
            extended: vec![1, 2],
            ..CategoryMap::default()
        };
        let l = lagrangian::derive(&g, &p, &t, &categories, &[]).unwrap();
        assert_eq!(
            derive(&g, &p, &t, &categories, &l.potential, false),
            Err(Error::SingularCapacitance)
        );
    }
}
