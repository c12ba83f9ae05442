//! Differentiation and closed-form root finding.

use crate::ast::Expr;
use crate::canonical::Poly;
use crate::error::{Error, Result};

impl Expr {
    /// Partial derivative with respect to the symbol `var`, expanded.
    pub fn diff(&self, var: &str) -> Expr {
        self.diff_tree(var).expand()
    }

    fn diff_tree(&self, var: &str) -> Expr {
        match self {
            Expr::Constant(_) => Expr::zero(),
            Expr::Symbol(name) => {
                if name == var {
                    Expr::one()
                } else {
                    Expr::zero()
                }
            }
            Expr::Add(terms) => Expr::sum(terms.iter().map(|t| t.diff_tree(var))),
            Expr::Mul(factors) => Expr::sum((0..factors.len()).map(|i| {
                let d = factors[i].diff_tree(var);
                if d.is_zero() {
                    return Expr::zero();
                }
                let rest = factors
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, f)| f.clone());
                d * Expr::product(rest)
            })),
            Expr::Pow { base, exp } => {
                let d = base.diff_tree(var);
                if d.is_zero() {
                    return Expr::zero();
                }
                Expr::num(*exp as f64) * (**base).clone().powi(exp - 1) * d
            }
            Expr::Cos(arg) => {
                let d = arg.diff_tree(var);
                if d.is_zero() {
                    return Expr::zero();
                }
                -Expr::sin((**arg).clone()) * d
            }
            Expr::Sin(arg) => {
                let d = arg.diff_tree(var);
                if d.is_zero() {
                    return Expr::zero();
                }
                Expr::cos((**arg).clone()) * d
            }
        }
    }

    /// Solve `self == 0` for `var`, provided the expression is affine in it.
    ///
    /// Fails with [`Error::NonLinear`] when `var` appears with a power other
    /// than one or inside a cosine, sine or inverted sum, and with
    /// [`Error::NoSolution`] when the coefficient of `var` vanishes.
    pub fn solve_linear(&self, var: &str) -> Result<Expr> {
        let mut slope = Poly::default();
        let mut offset = Poly::default();
        for (coeff, mono) in Poly::from_expr(self).terms() {
            if mono.hides_symbol(var) {
                return Err(Error::NonLinear {
                    variable: var.to_string(),
                });
            }
            match mono.exponent_of(var) {
                0 => offset.add_term(*coeff, mono.clone()),
                1 => slope.add_term(*coeff, mono.without(var)),
                _ => {
                    return Err(Error::NonLinear {
                        variable: var.to_string(),
                    })
                }
            }
        }
        if slope.is_zero() {
            return Err(Error::NoSolution {
                variable: var.to_string(),
            });
        }
        let mut root = offset.mul(&slope.powi(-1));
        root.scale(-1.0);
        Ok(root.into_expr())
    }
}
