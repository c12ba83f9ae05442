//! Analysis configuration.

use std::fmt;
use std::str::FromStr;

/// Strategy used to complete the mode vectors to a full basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasisCompletion {
    /// All-ones vector, then permutations of a near-uniform 0/1 vector.
    #[default]
    Simple,
    /// Elementary unit vectors.
    Standard,
}

impl FromStr for BasisCompletion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(BasisCompletion::Simple),
            "standard" => Ok(BasisCompletion::Standard),
            other => Err(format!(
                "unknown basis completion `{other}` (expected `simple` or `standard`)"
            )),
        }
    }
}

impl fmt::Display for BasisCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisCompletion::Simple => f.write_str("simple"),
            BasisCompletion::Standard => f.write_str("standard"),
        }
    }
}

/// Configuration for building a [`SymbolicCircuit`](crate::SymbolicCircuit).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Basis completion strategy for the variable transformation.
    pub basis_completion: BasisCompletion,
    /// Largest node count for which the Hamiltonian is derived at construction.
    /// Larger circuits derive it on first request.
    pub eager_hamiltonian_max_nodes: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            basis_completion: BasisCompletion::Simple,
            eager_hamiltonian_max_nodes: 3,
        }
    }
}

impl AnalysisConfig {
    pub fn with_basis_completion(mut self, completion: BasisCompletion) -> Self {
        self.basis_completion = completion;
        self
    }

    pub fn with_eager_hamiltonian_max_nodes(mut self, max_nodes: usize) -> Self {
        self.eager_hamiltonian_max_nodes = max_nodes;
        self
    }
}
