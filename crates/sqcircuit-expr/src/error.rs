//! Error types for sqcircuit-expr.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("symbol {0} has no bound value")]
    UnboundSymbol(String),

    #[error("expression is not linear in {variable}")]
    NonLinear { variable: String },

    #[error("expression has no root in {variable}")]
    NoSolution { variable: String },
}

pub type Result<T> = std::result::Result<T, Error>;
