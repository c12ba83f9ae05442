//! Expression AST types and constructors.

use std::collections::BTreeSet;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Expression AST node.
///
/// Trees built with the operators are only lightly simplified (constant
/// folding and flattening); call [`Expr::expand`] for the canonical form.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant.
    Constant(f64),
    /// Named symbol.
    Symbol(String),
    /// Sum of terms.
    Add(Vec<Expr>),
    /// Product of factors.
    Mul(Vec<Expr>),
    /// Integer power.
    Pow { base: Box<Expr>, exp: i32 },
    /// Cosine.
    Cos(Box<Expr>),
    /// Sine.
    Sin(Box<Expr>),
}

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Constant(value)
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn zero() -> Self {
        Expr::Constant(0.0)
    }

    pub fn one() -> Self {
        Expr::Constant(1.0)
    }

    pub fn cos(arg: Expr) -> Self {
        match arg {
            Expr::Constant(c) => Expr::Constant(c.cos()),
            arg => Expr::Cos(Box::new(arg)),
        }
    }

    pub fn sin(arg: Expr) -> Self {
        match arg {
            Expr::Constant(c) => Expr::Constant(c.sin()),
            arg => Expr::Sin(Box::new(arg)),
        }
    }

    /// Raise to an integer power.
    pub fn powi(self, exp: i32) -> Self {
        match (self, exp) {
            (_, 0) => Expr::one(),
            (base, 1) => base,
            (Expr::Constant(c), n) => Expr::Constant(c.powi(n)),
            (base, n) => Expr::Pow {
                base: Box::new(base),
                exp: n,
            },
        }
    }

    /// Multiplicative inverse.
    pub fn recip(self) -> Self {
        self.powi(-1)
    }

    /// Sum of an iterator of expressions.
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Self {
        terms.into_iter().fold(Expr::zero(), |acc, t| acc + t)
    }

    /// Product of an iterator of expressions.
    pub fn product<I: IntoIterator<Item = Expr>>(factors: I) -> Self {
        factors.into_iter().fold(Expr::one(), |acc, f| acc * f)
    }

    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Expr::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// Structurally the constant zero. Expand first for a semantic check.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Constant(c) if *c == 0.0)
    }

    /// Names of all symbols appearing in the expression.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Add(items) | Expr::Mul(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Expr::Pow { base, .. } => base.collect_symbols(out),
            Expr::Cos(arg) | Expr::Sin(arg) => arg.collect_symbols(out),
        }
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Constant(_) => false,
            Expr::Symbol(s) => s == name,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|i| i.contains_symbol(name)),
            Expr::Pow { base, .. } => base.contains_symbol(name),
            Expr::Cos(arg) | Expr::Sin(arg) => arg.contains_symbol(name),
        }
    }

    /// True when a cosine or sine appears anywhere in the tree.
    pub fn contains_trig(&self) -> bool {
        match self {
            Expr::Constant(_) | Expr::Symbol(_) => false,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(Expr::contains_trig),
            Expr::Pow { base, .. } => base.contains_trig(),
            Expr::Cos(_) | Expr::Sin(_) => true,
        }
    }

    /// Additive terms of the canonical (expanded) form.
    pub fn terms(&self) -> Vec<Expr> {
        match self.expand() {
            Expr::Add(terms) => terms,
            e if e.is_zero() => Vec::new(),
            e => vec![e],
        }
    }

    /// Replace every occurrence of the symbol `name` by `value`.
    ///
    /// The result is not expanded.
    pub fn subs(&self, name: &str, value: &Expr) -> Expr {
        self.map_symbols(&|s| (s == name).then(|| value.clone()))
    }

    /// Simultaneous substitution of several symbols.
    pub fn subs_all(&self, bindings: &[(String, Expr)]) -> Expr {
        self.map_symbols(&|s| {
            bindings
                .iter()
                .find(|(name, _)| name == s)
                .map(|(_, value)| value.clone())
        })
    }

    fn map_symbols(&self, f: &dyn Fn(&str) -> Option<Expr>) -> Expr {
        match self {
            Expr::Constant(c) => Expr::Constant(*c),
            Expr::Symbol(s) => f(s).unwrap_or_else(|| Expr::Symbol(s.clone())),
            Expr::Add(items) => Expr::sum(items.iter().map(|i| i.map_symbols(f))),
            Expr::Mul(items) => Expr::product(items.iter().map(|i| i.map_symbols(f))),
            Expr::Pow { base, exp } => base.map_symbols(f).powi(*exp),
            Expr::Cos(arg) => Expr::cos(arg.map_symbols(f)),
            Expr::Sin(arg) => Expr::sin(arg.map_symbols(f)),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Constant(a), Expr::Constant(b)) => Expr::Constant(a + b),
            (e, Expr::Constant(z)) | (Expr::Constant(z), e) if z == 0.0 => e,
            (Expr::Add(mut a), Expr::Add(b)) => {
                a.extend(b);
                Expr::Add(a)
            }
            (Expr::Add(mut a), e) => {
                a.push(e);
                Expr::Add(a)
            }
            (e, Expr::Add(mut b)) => {
                b.insert(0, e);
                Expr::Add(b)
            }
            (a, b) => Expr::Add(vec![a, b]),
        }
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Constant(a), Expr::Constant(b)) => Expr::Constant(a * b),
            (_, Expr::Constant(z)) | (Expr::Constant(z), _) if z == 0.0 => Expr::zero(),
            (e, Expr::Constant(o)) | (Expr::Constant(o), e) if o == 1.0 => e,
            (Expr::Mul(mut a), Expr::Mul(b)) => {
                a.extend(b);
                Expr::Mul(a)
            }
            (Expr::Mul(mut a), e) => {
                a.push(e);
                Expr::Mul(a)
            }
            (e, Expr::Mul(mut b)) => {
                b.insert(0, e);
                Expr::Mul(b)
            }
            (a, b) => Expr::Mul(vec![a, b]),
        }
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Constant(c) => Expr::Constant(-c),
            e => Expr::Constant(-1.0) * e,
        }
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        match rhs {
            Expr::Constant(c) => self * Expr::Constant(1.0 / c),
            rhs => self * rhs.recip(),
        }
    }
}

macro_rules! forward_ref_binop {
    ($($imp:ident, $method:ident);*) => {$(
        impl $imp<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $imp::$method(self.clone(), rhs.clone())
            }
        }

        impl $imp<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $imp::$method(self, Expr::Constant(rhs))
            }
        }

        impl $imp<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $imp::$method(Expr::Constant(self), rhs)
            }
        }
    )*};
}

forward_ref_binop!(Add, add; Sub, sub; Mul, mul; Div, div);

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_folding() {
        assert_eq!(Expr::num(2.0) + Expr::num(3.0), Expr::num(5.0));
        assert_eq!(Expr::num(2.0) * Expr::num(3.0), Expr::num(6.0));
        assert_eq!(Expr::sym("x") * 0.0, Expr::zero());
        assert_eq!(Expr::sym("x") + 0.0, Expr::sym("x"));
        assert_eq!(1.0 * Expr::sym("x"), Expr::sym("x"));
    }

    #[test]
    fn test_flattening() {
        let e = Expr::sym("a") + Expr::sym("b") + Expr::sym("c");
        assert!(matches!(e, Expr::Add(ref v) if v.len() == 3));
        let e = Expr::sym("a") * Expr::sym("b") * Expr::sym("c");
        assert!(matches!(e, Expr::Mul(ref v) if v.len() == 3));
    }

    #[test]
    fn test_free_symbols() {
        let e = Expr::cos(Expr::sym("θ1") + Expr::sym("Φ1")) * Expr::sym("EJ");
        let names: Vec<String> = e.free_symbols().into_iter().collect();
        assert_eq!(names, vec!["EJ", "Φ1", "θ1"]);
        assert!(e.contains_symbol("Φ1"));
        assert!(!e.contains_symbol("θ2"));
        assert!(e.contains_trig());
    }

    #[test]
    fn test_subs() {
        let e = Expr::sym("x") * Expr::sym("y");
        let s = e.subs("x", &Expr::num(2.0));
        assert_eq!(s, Expr::Mul(vec![Expr::num(2.0), Expr::sym("y")]));

        let both = e.subs_all(&[
            ("x".to_string(), Expr::sym("y")),
            ("y".to_string(), Expr::sym("x")),
        ]);
        assert_eq!(both, Expr::Mul(vec![Expr::sym("y"), Expr::sym("x")]));
    }

    #[test]
    fn test_trig_constant_folding() {
        assert_eq!(Expr::cos(Expr::zero()), Expr::one());
        assert_eq!(Expr::sin(Expr::zero()), Expr::zero());
    }
}
