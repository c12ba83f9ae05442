//! Error types for sqcircuit-analysis.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("singular variable transformation: {0}")]
    SingularConfiguration(String),

    #[error("cannot eliminate frozen variable {variable}: stationarity condition has no closed-form root")]
    UnsolvableElimination { variable: String },

    #[error("singular capacitance matrix")]
    SingularCapacitance,

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("no branch with index {0}")]
    UnknownBranch(usize),

    #[error(transparent)]
    Graph(#[from] sqcircuit_core::Error),

    #[error(transparent)]
    Expr(#[from] sqcircuit_expr::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
