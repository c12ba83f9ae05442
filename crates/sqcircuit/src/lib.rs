//! # sqcircuit
//!
//! Symbolic analysis of superconducting quantum circuits.
//!
//! sqcircuit turns a circuit of capacitors, inductors and Josephson
//! junctions into:
//! - a variable transformation `φ = T·θ` with classified coordinates
//!   (periodic, extended, cyclic, frozen)
//! - closure branches carrying external fluxes
//! - symbolic Lagrangians and Hamiltonians
//!
//! ## Quick Start
//!
//! ```rust
//! use sqcircuit::prelude::*;
//!
//! // Transmon: a capacitor and a junction between two floating nodes
//! let circuit = sqcircuit::analyse(2, &["C 1 2 EC=1", "JJ 1 2 EJ=10 EC"]).unwrap();
//! assert_eq!(circuit.categories().periodic, vec![1]);
//! println!("H = {}", circuit.hamiltonian().unwrap());
//! ```

// Re-export layer crates
pub use sqcircuit_analysis as analysis;
pub use sqcircuit_core as core;
pub use sqcircuit_expr as expr;

pub use sqcircuit_core::{
    Branch, BranchDescriptor, BranchId, BranchKind, CircuitGraph,
    // Errors
    Error as GraphError,
    Node, NodeId, ParamValue, ParameterTable,
};

pub use sqcircuit_expr::{Error as ExprError, EvalContext, Expr};

pub use sqcircuit_analysis::{
    AnalysisConfig, BasisCompletion, CategoryMap, ClassificationMismatch, Error, Lagrangian,
    ModeKind, Result, SymbolicCircuit, SymbolicMatrix, Transformation,
};

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Parse branch descriptor lines such as `JJ 1,2 EJ=10 1`.
pub fn parse_branches<S: AsRef<str>>(lines: &[S]) -> Result<Vec<BranchDescriptor>> {
    lines
        .iter()
        .map(|line| line.as_ref().parse::<BranchDescriptor>().map_err(Error::from))
        .collect()
}

/// Analyse a circuit given as descriptor lines with the default configuration.
pub fn analyse<S: AsRef<str>>(node_count: usize, lines: &[S]) -> Result<SymbolicCircuit> {
    SymbolicCircuit::from_descriptors(node_count, &parse_branches(lines)?, AnalysisConfig::default())
}

/// Prelude module containing commonly used types.
///
/// ```rust
/// use sqcircuit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{BranchDescriptor, BranchId, BranchKind, CircuitGraph, NodeId, ParameterTable};

    pub use crate::{EvalContext, Expr};

    pub use crate::{AnalysisConfig, BasisCompletion, CategoryMap, ModeKind, SymbolicCircuit};

    pub use crate::DMatrix;
}
