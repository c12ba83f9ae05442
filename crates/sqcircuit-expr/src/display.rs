//! Human-readable printing.

use std::fmt;

use crate::ast::Expr;

impl Expr {
    /// Split a leading negative coefficient off a term.
    fn split_sign(&self) -> (bool, Expr) {
        match self {
            Expr::Constant(c) if *c < 0.0 => (true, Expr::Constant(-c)),
            Expr::Mul(factors) => match factors.first() {
                Some(Expr::Constant(c)) if *c < 0.0 => {
                    let mut rest: Vec<Expr> = factors[1..].to_vec();
                    if *c != -1.0 {
                        rest.insert(0, Expr::Constant(-c));
                    }
                    let magnitude = match rest.len() {
                        0 => Expr::one(),
                        1 => rest.remove(0),
                        _ => Expr::Mul(rest),
                    };
                    (true, magnitude)
                }
                _ => (false, self.clone()),
            },
            _ => (false, self.clone()),
        }
    }

    fn is_atomic(&self) -> bool {
        match self {
            Expr::Constant(c) => *c >= 0.0,
            Expr::Symbol(_) | Expr::Cos(_) | Expr::Sin(_) => true,
            Expr::Add(_) | Expr::Mul(_) | Expr::Pow { .. } => false,
        }
    }
}

fn write_factor(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
    match e {
        Expr::Add(_) => write!(f, "({e})"),
        Expr::Constant(c) if *c < 0.0 => write!(f, "({e})"),
        _ => write!(f, "{e}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(c) => write!(f, "{c}"),
            Expr::Symbol(name) => f.write_str(name),
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    let (negative, magnitude) = term.split_sign();
                    match (i, negative) {
                        (0, true) => f.write_str("-")?,
                        (0, false) => {}
                        (_, true) => f.write_str(" - ")?,
                        (_, false) => f.write_str(" + ")?,
                    }
                    write!(f, "{magnitude}")?;
                }
                Ok(())
            }
            Expr::Mul(factors) => {
                let (negative, magnitude) = self.split_sign();
                if negative {
                    f.write_str("-")?;
                    return write_factor(f, &magnitude);
                }
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write_factor(f, factor)?;
                }
                Ok(())
            }
            Expr::Pow { base, exp } => {
                if base.is_atomic() {
                    write!(f, "{base}^{exp}")
                } else {
                    write!(f, "({base})^{exp}")
                }
            }
            Expr::Cos(arg) => write!(f, "cos({arg})"),
            Expr::Sin(arg) => write!(f, "sin({arg})"),
        }
    }
}
