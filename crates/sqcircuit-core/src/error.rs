//! Error types for sqcircuit-core.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("the parameter {0} has not been initialized")]
    UninitializedParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
