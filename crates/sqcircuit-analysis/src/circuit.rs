//! Symbolic circuit: the full analysis of one circuit.

use nalgebra::DMatrix;
use sqcircuit_core::{BranchDescriptor, BranchId, CircuitGraph, ParameterTable};
use sqcircuit_expr::Expr;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::hamiltonian::{self, offset_charge};
use crate::lagrangian::{self, capacitance_relabeling};
use crate::matrix::{self, SymbolicMatrix};
use crate::spanning_tree::{closure_branches, without_capacitors};
use crate::transform::{
    build_transformation, classify_supplied, CategoryMap, ClassificationMismatch, Transformation,
};

/// A circuit together with its variable transformation, loop structure and
/// symbolic Lagrangian.
///
/// Everything except the Hamiltonian of large circuits is computed at
/// construction. The only mutation afterwards is rebinding the value of a
/// declared parameter.
#[derive(Debug, Clone)]
pub struct SymbolicCircuit {
    graph: CircuitGraph,
    params: ParameterTable,
    config: AnalysisConfig,
    transformation: DMatrix<f64>,
    categories: CategoryMap,
    warnings: Vec<ClassificationMismatch>,
    closure_branches: Vec<BranchId>,
    external_fluxes: Vec<Expr>,
    offset_charges: Vec<Expr>,
    lagrangian: Expr,
    lagrangian_node_vars: Expr,
    potential: Expr,
    hamiltonian: Option<Expr>,
}

impl SymbolicCircuit {
    /// Analyse a circuit with an automatically built transformation.
    pub fn new(graph: CircuitGraph, params: ParameterTable, config: AnalysisConfig) -> Result<Self> {
        Self::with_transformation(graph, params, config, None, None)
    }

    /// Build the graph from branch descriptors and analyse it.
    pub fn from_descriptors(
        node_count: usize,
        descriptors: &[BranchDescriptor],
        config: AnalysisConfig,
    ) -> Result<Self> {
        let (graph, params) = CircuitGraph::from_descriptors(node_count, descriptors)?;
        Self::new(graph, params, config)
    }

    /// Analyse a circuit, optionally with a supplied transformation matrix
    /// and/or supplied closure branches.
    ///
    /// A supplied matrix is classified against the circuit's own modes and
    /// its classification is used as is; disagreements are available from
    /// [`warnings`](Self::warnings).
    pub fn with_transformation(
        graph: CircuitGraph,
        params: ParameterTable,
        config: AnalysisConfig,
        transformation: Option<DMatrix<f64>>,
        closure: Option<Vec<BranchId>>,
    ) -> Result<Self> {
        let Transformation {
            matrix: transformation,
            categories,
            warnings,
        } = match transformation {
            Some(m) => classify_supplied(&graph, &m, config.basis_completion)?,
            None => build_transformation(&graph, config.basis_completion)?,
        };

        let closure_branches = match closure {
            Some(ids) => {
                if let Some(bad) = ids.iter().find(|b| b.index() >= graph.branches().len()) {
                    return Err(Error::UnknownBranch(bad.index()));
                }
                without_capacitors(&graph, ids)
            }
            None => closure_branches(&graph)?,
        };
        let external_fluxes: Vec<Expr> = (1..=closure_branches.len())
            .map(|k| Expr::sym(format!("Φ{k}")))
            .collect();
        let offset_charges: Vec<Expr> = categories.periodic.iter().map(|&i| offset_charge(i)).collect();

        let fluxes: Vec<(BranchId, Expr)> = closure_branches
            .iter()
            .copied()
            .zip(external_fluxes.iter().cloned())
            .collect();
        let mut terms = lagrangian::derive(&graph, &params, &transformation, &categories, &fluxes)?;
        if graph.has_symbolic_parameters() {
            let relabel = capacitance_relabeling(&graph);
            log::debug!("relabelled {} charging energies as capacitances", relabel.len());
            terms.theta = terms.theta.subs_all(&relabel).expand();
            terms.node_vars = terms.node_vars.subs_all(&relabel).expand();
        }

        let mut circuit = Self {
            graph,
            params,
            config,
            transformation,
            categories,
            warnings,
            closure_branches,
            external_fluxes,
            offset_charges,
            lagrangian: terms.theta,
            lagrangian_node_vars: terms.node_vars,
            potential: terms.potential,
            hamiltonian: None,
        };
        if circuit.graph.node_count() <= circuit.config.eager_hamiltonian_max_nodes {
            // a singular capacitance block is reported by `hamiltonian()`
            match circuit.generate_hamiltonian(false) {
                Ok(h) => circuit.hamiltonian = Some(h),
                Err(Error::SingularCapacitance) => {
                    log::warn!("capacitance block is singular; hamiltonian not derived");
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "analysed circuit with {} nodes and {} branches: {}; {} closure branches",
            circuit.graph.node_count(),
            circuit.graph.branches().len(),
            circuit.categories,
            circuit.closure_branches.len()
        );
        Ok(circuit)
    }

    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.params
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Transformation matrix `T` with `φ = T·θ`.
    pub fn transformation_matrix(&self) -> &DMatrix<f64> {
        &self.transformation
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    /// Classification mismatches found for a supplied transformation.
    pub fn warnings(&self) -> &[ClassificationMismatch] {
        &self.warnings
    }

    pub fn closure_branches(&self) -> &[BranchId] {
        &self.closure_branches
    }

    /// External flux symbols `Φ1, Φ2, ...`, one per closure branch.
    pub fn external_fluxes(&self) -> &[Expr] {
        &self.external_fluxes
    }

    /// Offset charge symbols `ng<i>`, one per periodic coordinate.
    pub fn offset_charges(&self) -> &[Expr] {
        &self.offset_charges
    }

    /// Lagrangian in the new coordinates.
    pub fn lagrangian(&self) -> &Expr {
        &self.lagrangian
    }

    /// Lagrangian in the node fluxes.
    pub fn lagrangian_node_vars(&self) -> &Expr {
        &self.lagrangian_node_vars
    }

    /// Potential in the new coordinates with frozen coordinates eliminated.
    pub fn potential(&self) -> &Expr {
        &self.potential
    }

    /// Symbolic Hamiltonian, derived now if it was not computed at
    /// construction.
    ///
    /// Fails with [`Error::SingularCapacitance`] when the kinetic block of
    /// the dynamical coordinates cannot be inverted.
    pub fn hamiltonian(&self) -> Result<Expr> {
        match &self.hamiltonian {
            Some(h) => Ok(h.clone()),
            None => self.generate_hamiltonian(false),
        }
    }

    /// Derive the Hamiltonian, binding every parameter to its value when
    /// `substitute` is set.
    pub fn generate_hamiltonian(&self, substitute: bool) -> Result<Expr> {
        hamiltonian::derive(
            &self.graph,
            &self.params,
            &self.transformation,
            &self.categories,
            &self.potential,
            substitute,
        )
    }

    /// Capacitance matrix in node fluxes, symbolic unless `substitute`.
    pub fn capacitance_matrix(&self, substitute: bool) -> Result<SymbolicMatrix> {
        lagrangian::capacitance_matrix(&self.graph, &self.params, substitute)
    }

    /// Capacitance matrix with every parameter bound to its value.
    pub fn capacitance_matrix_numeric(&self) -> Result<DMatrix<f64>> {
        matrix::evaluate(&self.capacitance_matrix(true)?, &Default::default())
    }

    /// Rebind the value of a declared symbolic parameter.
    pub fn update_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        if self.params.set(name, value) {
            log::debug!("parameter {name} set to {value}");
            Ok(())
        } else {
            Err(Error::UnknownParameter(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(lines: &[&str]) -> Vec<BranchDescriptor> {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SymbolicCircuit>();
    }

    #[test]
    fn test_transmon_analysis() {
        let circuit = SymbolicCircuit::from_descriptors(
            2,
            &descriptors(&["C 1 2 EC=1", "JJ 1 2 EJ=10 EC"]),
            AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(circuit.categories().periodic, vec![1]);
        assert!(circuit.closure_branches().is_empty());
        assert_eq!(circuit.offset_charges(), &[Expr::sym("ng1")]);
        assert!(circuit.lagrangian().contains_symbol("C1"));
        assert!(!circuit.lagrangian().contains_symbol("EC"));
        assert!(circuit.hamiltonian.is_some());
    }

    #[test]
    fn test_deferred_hamiltonian() {
        let config = AnalysisConfig::default().with_eager_hamiltonian_max_nodes(0);
        let circuit =
            SymbolicCircuit::from_descriptors(1, &descriptors(&["C 0 1 1", "L 0 1 1"]), config)
                .unwrap();
        assert!(circuit.hamiltonian.is_none());
        let h = circuit.hamiltonian().unwrap();
        assert_eq!(h, circuit.generate_hamiltonian(false).unwrap());
    }

    #[test]
    fn test_update_parameter() {
        let mut circuit = SymbolicCircuit::from_descriptors(
            1,
            &descriptors(&["C 0 1 EC=0.5", "L 0 1 EL=1"]),
            AnalysisConfig::default(),
        )
        .unwrap();
        assert!((circuit.capacitance_matrix_numeric().unwrap()[(0, 0)] - 0.25).abs() < 1e-12);
        circuit.update_parameter("EC", 0.25).unwrap();
        assert!((circuit.capacitance_matrix_numeric().unwrap()[(0, 0)] - 0.5).abs() < 1e-12);
        assert_eq!(
            circuit.update_parameter("EJ", 1.0),
            Err(Error::UnknownParameter("EJ".to_string()))
        );
    }

    #[test]
    fn test_supplied_closure_branches() {
        let lines = ["C 1 2 1", "JJ 1 2 10 1", "L 1 2 1"];
        let (graph, params) = CircuitGraph::from_descriptors(2, &descriptors(&lines)).unwrap();
        let circuit = SymbolicCircuit::with_transformation(
            graph.clone(),
            params.clone(),
            AnalysisConfig::default(),
            None,
            Some(vec![BranchId::new(0), BranchId::new(1)]),
        )
        .unwrap();
        // the capacitor is dropped
        assert_eq!(circuit.closure_branches(), &[BranchId::new(1)]);
        assert_eq!(circuit.external_fluxes(), &[Expr::sym("Φ1")]);
        assert!(circuit.potential().contains_symbol("Φ1"));

        let err = SymbolicCircuit::with_transformation(
            graph,
            params,
            AnalysisConfig::default(),
            None,
            Some(vec![BranchId::new(7)]),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownBranch(7));
    }
}
