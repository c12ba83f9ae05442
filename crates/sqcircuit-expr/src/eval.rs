//! Numeric evaluation.

use std::collections::HashMap;

use crate::ast::Expr;
use crate::error::{Error, Result};

/// Bound symbol values for evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub values: HashMap<String, f64>,
}

impl EvalContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a symbol.
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Builder-style binding.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }
}

impl<'a> FromIterator<(&'a str, f64)> for EvalContext {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut ctx = EvalContext::new();
        for (name, value) in iter {
            ctx.set(name, value);
        }
        ctx
    }
}

impl Expr {
    /// Evaluate the expression in the given context.
    pub fn eval(&self, ctx: &EvalContext) -> Result<f64> {
        Ok(match self {
            Expr::Constant(v) => *v,
            Expr::Symbol(name) => ctx
                .get(name)
                .ok_or_else(|| Error::UnboundSymbol(name.clone()))?,
            Expr::Add(terms) => {
                let mut total = 0.0;
                for t in terms {
                    total += t.eval(ctx)?;
                }
                total
            }
            Expr::Mul(factors) => {
                let mut total = 1.0;
                for f in factors {
                    total *= f.eval(ctx)?;
                }
                total
            }
            Expr::Pow { base, exp } => base.eval(ctx)?.powi(*exp),
            Expr::Cos(arg) => arg.eval(ctx)?.cos(),
            Expr::Sin(arg) => arg.eval(ctx)?.sin(),
        })
    }

    /// Substitute every bound symbol of the context, leaving the rest symbolic.
    pub fn bind(&self, ctx: &EvalContext) -> Expr {
        let bindings: Vec<(String, Expr)> = self
            .free_symbols()
            .into_iter()
            .filter_map(|name| ctx.get(&name).map(|v| (name, Expr::num(v))))
            .collect();
        self.subs_all(&bindings).expand()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn test_eval_arithmetic() {
        let e = (Expr::sym("a") + 2.0) * Expr::sym("b") / 4.0;
        let ctx = EvalContext::new().with("a", 1.0).with("b", 8.0);
        assert_eq!(e.eval(&ctx).unwrap(), 6.0);
    }

    #[test]
    fn test_eval_trig() {
        let e = Expr::cos(Expr::sym("x")) + Expr::sin(Expr::sym("x"));
        let ctx = EvalContext::new().with("x", PI / 2.0);
        assert!((e.eval(&ctx).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_eval_unbound() {
        let e = Expr::sym("x") + 1.0;
        assert_eq!(
            e.eval(&EvalContext::new()),
            Err(Error::UnboundSymbol("x".to_string()))
        );
    }

    #[test]
    fn test_bind_partial() {
        let e = Expr::sym("EJ") * Expr::cos(Expr::sym("θ1"));
        let ctx: EvalContext = [("EJ", 2.0)].into_iter().collect();
        let bound = e.bind(&ctx);
        assert_eq!(bound.free_symbols().len(), 1);
        let ctx = ctx.with("θ1", 0.0);
        assert_eq!(bound.eval(&ctx).unwrap(), 2.0);
    }
}
