//! Symbolic expressions for circuit Lagrangians and Hamiltonians.
//!
//! Expressions are trees over constants, symbols, sums, products, integer
//! powers, cosines and sines. The engine supports exactly what the circuit
//! analysis needs:
//! - canonical expansion with like-term combination ([`Expr::expand`])
//! - substitution ([`Expr::subs`], [`Expr::subs_all`])
//! - differentiation ([`Expr::diff`])
//! - closed-form roots of affine equations ([`Expr::solve_linear`])
//! - numeric evaluation ([`Expr::eval`])

mod ast;
mod calculus;
mod canonical;
mod display;
pub mod error;
mod eval;

pub use ast::Expr;
pub use error::{Error, Result};
pub use eval::EvalContext;
