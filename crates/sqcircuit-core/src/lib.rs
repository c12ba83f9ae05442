//! Core circuit representation for sqcircuit.
//!
//! This crate provides the graph model of a superconducting circuit: nodes
//! (with a lazily created ground node), two-terminal branches (capacitors,
//! inductors and Josephson junctions), and the table of symbolic branch
//! parameters declared while the graph is built.

pub mod branch;
pub mod error;
pub mod graph;
pub mod node;
pub mod params;

pub use branch::{Branch, BranchId, BranchKind, ParamValue};
pub use error::{Error, Result};
pub use graph::{BranchDescriptor, CircuitGraph};
pub use node::{Node, NodeId};
pub use params::{parse_token, ParamToken, ParameterTable};
