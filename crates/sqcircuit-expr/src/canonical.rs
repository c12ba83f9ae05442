//! Canonical expanded form.
//!
//! An expression is expanded into a sum of monomials. Each monomial is a
//! coefficient times a product of atoms raised to integer powers, where an
//! atom is a symbol, a cosine or sine of a canonical argument, or (only with
//! a negative exponent) a canonical sum that could not be inverted. Atoms and
//! monomials are keyed by their printed form, which makes the term order and
//! the combination of like terms deterministic.

use std::collections::BTreeMap;

use crate::ast::Expr;

/// Relative magnitude below which a coefficient is treated as cancelled,
/// measured against the combined terms or the largest coefficient.
const CANCEL_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Default)]
pub(crate) struct Monomial {
    /// atom key -> (atom, exponent); exponents are never zero.
    factors: BTreeMap<String, (Expr, i32)>,
}

impl Monomial {
    fn key(&self) -> String {
        self.factors
            .iter()
            .map(|(k, (_, e))| format!("{k}^{e}"))
            .collect::<Vec<_>>()
            .join("*")
    }

    fn multiply(&mut self, other: &Monomial) {
        for (key, (atom, exp)) in &other.factors {
            let remove = match self.factors.get_mut(key) {
                Some(slot) => {
                    slot.1 += exp;
                    slot.1 == 0
                }
                None => {
                    self.factors.insert(key.clone(), (atom.clone(), *exp));
                    false
                }
            };
            if remove {
                self.factors.remove(key);
            }
        }
    }

    /// Exponent of the symbol `name`, zero when absent.
    pub(crate) fn exponent_of(&self, name: &str) -> i32 {
        match self.factors.get(name) {
            Some((Expr::Symbol(_), e)) => *e,
            _ => 0,
        }
    }

    /// True when `name` occurs inside a non-symbol atom.
    pub(crate) fn hides_symbol(&self, name: &str) -> bool {
        self.factors
            .values()
            .any(|(atom, _)| !matches!(atom, Expr::Symbol(_)) && atom.contains_symbol(name))
    }

    pub(crate) fn without(&self, name: &str) -> Monomial {
        let mut out = self.clone();
        out.factors.remove(name);
        out
    }
}

/// A canonical sum of monomials.
#[derive(Debug, Clone, Default)]
pub(crate) struct Poly {
    terms: BTreeMap<String, (f64, Monomial)>,
}

impl Poly {
    pub(crate) fn constant(c: f64) -> Self {
        let mut p = Poly::default();
        p.add_term(c, Monomial::default());
        p
    }

    fn atom(atom: Expr) -> Self {
        let mut mono = Monomial::default();
        mono.factors.insert(atom.to_string(), (atom, 1));
        let mut p = Poly::default();
        p.add_term(1.0, mono);
        p
    }

    pub(crate) fn add_term(&mut self, coeff: f64, mono: Monomial) {
        if coeff == 0.0 {
            return;
        }
        let key = mono.key();
        let remove = match self.terms.get_mut(&key) {
            Some(slot) => {
                let magnitude = slot.0.abs().max(coeff.abs());
                slot.0 += coeff;
                slot.0.abs() <= CANCEL_TOL * magnitude
            }
            None => {
                self.terms.insert(key.clone(), (coeff, mono));
                false
            }
        };
        if remove {
            self.terms.remove(&key);
        }
    }

    pub(crate) fn add(&mut self, other: &Poly) {
        for (coeff, mono) in other.terms.values() {
            self.add_term(*coeff, mono.clone());
        }
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for slot in self.terms.values_mut() {
            slot.0 *= factor;
        }
    }

    pub(crate) fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::default();
        for (ca, ma) in self.terms.values() {
            for (cb, mb) in other.terms.values() {
                let mut mono = ma.clone();
                mono.multiply(mb);
                out.add_settled(ca * cb, mono);
            }
        }
        out
    }

    /// Add a term, re-expanding any sum atom whose exponent became positive.
    fn add_settled(&mut self, coeff: f64, mut mono: Monomial) {
        let sums: Vec<String> = mono
            .factors
            .iter()
            .filter(|(_, (atom, exp))| matches!(atom, Expr::Add(_)) && *exp > 0)
            .map(|(k, _)| k.clone())
            .collect();
        if sums.is_empty() {
            self.add_term(coeff, mono);
            return;
        }
        let mut expanded = Poly::constant(coeff);
        for key in sums {
            if let Some((atom, exp)) = mono.factors.remove(&key) {
                expanded = expanded.mul(&Poly::from_expr(&atom).powi(exp));
            }
        }
        let mut rest = Poly::default();
        rest.add_term(1.0, mono);
        self.add(&expanded.mul(&rest));
    }

    pub(crate) fn powi(&self, n: i32) -> Poly {
        if n == 0 {
            return Poly::constant(1.0);
        }
        if n > 0 {
            let mut result = Poly::constant(1.0);
            let mut base = self.clone();
            let mut k = n as u32;
            while k > 0 {
                if k & 1 == 1 {
                    result = result.mul(&base);
                }
                k >>= 1;
                if k > 0 {
                    base = base.mul(&base);
                }
            }
            return result;
        }

        let mut pruned = self.clone();
        pruned.prune();
        match pruned.terms.len() {
            0 => Poly::constant(f64::INFINITY),
            1 => {
                let (coeff, mono) = pruned.terms.into_values().next().unwrap_or_default();
                let mut inverted = Monomial::default();
                for (key, (atom, exp)) in mono.factors {
                    inverted.factors.insert(key, (atom, exp * n));
                }
                let mut out = Poly::default();
                out.add_settled(coeff.powi(n), inverted);
                out
            }
            _ => {
                let base = pruned.into_expr();
                let mut mono = Monomial::default();
                mono.factors.insert(base.to_string(), (base, n));
                let mut out = Poly::default();
                out.add_term(1.0, mono);
                out
            }
        }
    }

    /// Drop coefficients that are negligible next to the largest one.
    ///
    /// Cancellation between like terms is settled in `add_term`, so a
    /// polynomial whose coefficients are all small keeps every term.
    pub(crate) fn prune(&mut self) {
        let scale = self
            .terms
            .values()
            .map(|(c, _)| c.abs())
            .fold(0.0_f64, f64::max);
        self.terms
            .retain(|_, (c, _)| c.abs() > CANCEL_TOL * scale);
    }

    pub(crate) fn is_zero(&self) -> bool {
        let mut p = self.clone();
        p.prune();
        p.terms.is_empty()
    }

    pub(crate) fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self
                .terms
                .values()
                .next()
                .filter(|(_, m)| m.factors.is_empty())
                .map(|(c, _)| *c),
            _ => None,
        }
    }

    pub(crate) fn terms(&self) -> impl Iterator<Item = &(f64, Monomial)> {
        self.terms.values()
    }

    fn trig(arg: &Expr, cosine: bool) -> Poly {
        let mut p = Poly::from_expr(arg);
        p.prune();
        if let Some(c) = p.as_constant() {
            return Poly::constant(if cosine { c.cos() } else { c.sin() });
        }
        // cos is even and sin is odd: fix the sign of the leading term.
        let negative = p.terms.values().next().is_some_and(|(c, _)| *c < 0.0);
        if negative {
            p.scale(-1.0);
        }
        let arg = Box::new(p.into_expr());
        let mut out = if cosine {
            Poly::atom(Expr::Cos(arg))
        } else {
            Poly::atom(Expr::Sin(arg))
        };
        if negative && !cosine {
            out.scale(-1.0);
        }
        out
    }

    pub(crate) fn from_expr(expr: &Expr) -> Poly {
        match expr {
            Expr::Constant(c) => Poly::constant(*c),
            Expr::Symbol(_) => Poly::atom(expr.clone()),
            Expr::Add(items) => {
                let mut out = Poly::default();
                for item in items {
                    out.add(&Poly::from_expr(item));
                }
                out
            }
            Expr::Mul(items) => items
                .iter()
                .fold(Poly::constant(1.0), |acc, item| acc.mul(&Poly::from_expr(item))),
            Expr::Pow { base, exp } => Poly::from_expr(base).powi(*exp),
            Expr::Cos(arg) => Poly::trig(arg, true),
            Expr::Sin(arg) => Poly::trig(arg, false),
        }
    }

    pub(crate) fn into_expr(mut self) -> Expr {
        self.prune();
        let mut terms: Vec<Expr> = self
            .terms
            .into_values()
            .map(|(coeff, mono)| monomial_expr(coeff, mono))
            .collect();
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.remove(0),
            _ => Expr::Add(terms),
        }
    }
}

fn monomial_expr(coeff: f64, mono: Monomial) -> Expr {
    let mut factors: Vec<Expr> = Vec::with_capacity(mono.factors.len() + 1);
    if coeff != 1.0 || mono.factors.is_empty() {
        factors.push(Expr::Constant(coeff));
    }
    for (atom, exp) in mono.factors.into_values() {
        factors.push(if exp == 1 {
            atom
        } else {
            Expr::Pow {
                base: Box::new(atom),
                exp,
            }
        });
    }
    if factors.len() == 1 {
        factors.remove(0)
    } else {
        Expr::Mul(factors)
    }
}

impl Expr {
    /// Canonical expanded form: products distributed over sums, like terms
    /// combined, cosine arguments sign-normalised.
    pub fn expand(&self) -> Expr {
        Poly::from_expr(self).into_expr()
    }

    /// True when the expression expands to zero.
    pub fn is_identically_zero(&self) -> bool {
        Poly::from_expr(self).is_zero()
    }

    /// Constant value of the expanded form, if it has no symbols left.
    pub fn constant_value(&self) -> Option<f64> {
        let mut p = Poly::from_expr(self);
        p.prune();
        p.as_constant()
    }
}
