//! Symbolic analysis of superconducting circuits.
//!
//! This crate provides:
//! - Normal-mode detection and the variable transformation `φ = T·θ`
//! - Mode classification (periodic, extended, cyclic, frozen, oscillator)
//! - Spanning trees and closure branches for external fluxes
//! - Symbolic capacitance matrices, Lagrangians and Hamiltonians
//!
//! [`SymbolicCircuit`] runs the whole pipeline for one circuit.

pub mod circuit;
pub mod config;
pub mod error;
pub mod hamiltonian;
pub mod lagrangian;
pub mod matrix;
pub mod modes;
pub mod spanning_tree;
pub mod subspace;
pub mod transform;

pub use circuit::SymbolicCircuit;
pub use config::{AnalysisConfig, BasisCompletion};
pub use error::{Error, Result};
pub use lagrangian::Lagrangian;
pub use matrix::SymbolicMatrix;
pub use modes::{independent_modes, ModeEntries};
pub use spanning_tree::{closure_branches, spanning_tree, LoopStructure};
pub use subspace::Subspace;
pub use transform::{
    build_transformation, classify_supplied, CategoryMap, ClassificationMismatch, ModeKind,
    Transformation,
};
