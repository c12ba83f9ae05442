//! Dense symbolic matrices.
//!
//! Symbolic matrices are `DMatrix<Expr>`: nalgebra provides the storage and
//! indexing, the arithmetic is done entrywise here with every entry kept in
//! expanded form.

use nalgebra::DMatrix;
use sqcircuit_expr::{EvalContext, Expr};

use crate::error::{Error, Result};

pub type SymbolicMatrix = DMatrix<Expr>;

pub fn from_numeric(m: &DMatrix<f64>) -> SymbolicMatrix {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| Expr::num(m[(i, j)]))
}

/// Numeric value of every entry.
pub fn evaluate(m: &SymbolicMatrix, ctx: &EvalContext) -> Result<DMatrix<f64>> {
    let mut out = DMatrix::zeros(m.nrows(), m.ncols());
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            out[(i, j)] = m[(i, j)].eval(ctx)?;
        }
    }
    Ok(out)
}

/// `Tᵀ·M·T` for a numeric `T`.
pub fn congruence(t: &DMatrix<f64>, m: &SymbolicMatrix) -> Result<SymbolicMatrix> {
    if m.nrows() != t.nrows() || m.ncols() != t.nrows() {
        return Err(Error::DimensionMismatch {
            expected: t.nrows(),
            actual: m.nrows(),
        });
    }
    let n = t.ncols();
    Ok(DMatrix::from_fn(n, n, |a, b| {
        let mut terms = Vec::new();
        for i in 0..t.nrows() {
            if t[(i, a)] == 0.0 {
                continue;
            }
            for j in 0..t.nrows() {
                if t[(j, b)] == 0.0 || m[(i, j)].is_zero() {
                    continue;
                }
                terms.push(t[(i, a)] * t[(j, b)] * m[(i, j)].clone());
            }
        }
        Expr::sum(terms).expand()
    }))
}

/// `½·vᵀ·M·v`, expanded.
pub fn quadratic_form(m: &SymbolicMatrix, v: &[Expr]) -> Expr {
    let mut terms = Vec::new();
    for (i, vi) in v.iter().enumerate() {
        for (j, vj) in v.iter().enumerate() {
            let entry = &m[(i, j)];
            if entry.is_zero() || vi.is_zero() || vj.is_zero() {
                continue;
            }
            terms.push(0.5 * entry.clone() * vi.clone() * vj.clone());
        }
    }
    Expr::sum(terms).expand()
}

/// Leading `size × size` block.
pub fn leading_block(m: &SymbolicMatrix, size: usize) -> SymbolicMatrix {
    m.view((0, 0), (size, size)).into_owned()
}

fn minor(m: &SymbolicMatrix, row: usize, col: usize) -> SymbolicMatrix {
    let skip = |k: usize, removed: usize| if k < removed { k } else { k + 1 };
    DMatrix::from_fn(m.nrows() - 1, m.ncols() - 1, |i, j| {
        m[(skip(i, row), skip(j, col))].clone()
    })
}

/// Determinant by cofactor expansion along the first row.
pub fn determinant(m: &SymbolicMatrix) -> Expr {
    match m.nrows() {
        0 => Expr::one(),
        1 => m[(0, 0)].clone(),
        2 => (&m[(0, 0)] * &m[(1, 1)] - &m[(0, 1)] * &m[(1, 0)]).expand(),
        n => {
            let terms = (0..n).filter(|&j| !m[(0, j)].is_zero()).map(|j| {
                let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                sign * m[(0, j)].clone() * determinant(&minor(m, 0, j))
            });
            Expr::sum(terms).expand()
        }
    }
}

/// Inverse via the adjugate.
///
/// Fails with [`Error::SingularCapacitance`] when the determinant expands to
/// zero.
pub fn inverse(m: &SymbolicMatrix) -> Result<SymbolicMatrix> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: m.ncols(),
        });
    }
    let det = determinant(m);
    if det.is_identically_zero() {
        return Err(Error::SingularCapacitance);
    }
    let inv_det = det.recip();
    if n == 1 {
        return Ok(DMatrix::from_element(1, 1, inv_det.expand()));
    }
    Ok(DMatrix::from_fn(n, n, |i, j| {
        let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
        (sign * determinant(&minor(m, j, i)) * inv_det.clone()).expand()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    fn sym(name: &str) -> Expr {
        Expr::sym(name)
    }

    fn ctx() -> EvalContext {
        EvalContext::new().with("a", 2.0).with("b", 3.0).with("c", 5.0)
    }

    #[test]
    fn test_determinant_numeric_agrees() {
        let m = dmatrix![2.0, -1.0, 0.0; -1.0, 2.0, -1.0; 0.0, -1.0, 2.0];
        let det = determinant(&from_numeric(&m));
        assert!((det.constant_value().unwrap() - m.determinant()).abs() < 1e-12);
    }

    #[test]
    fn test_symbolic_inverse() {
        let m = DMatrix::from_row_slice(
            2,
            2,
            &[sym("a") + sym("b"), -sym("b"), -sym("b"), sym("b") + sym("c")],
        );
        let inv = inverse(&m).unwrap();
        let numeric = evaluate(&m, &ctx()).unwrap();
        let expected = numeric.try_inverse().unwrap();
        let got = evaluate(&inv, &ctx()).unwrap();
        assert!((got - expected).abs().max() < 1e-12);
    }

    #[test]
    fn test_inverse_three_by_three() {
        let m = DMatrix::from_fn(3, 3, |i, j| {
            if i == j {
                Expr::num(2.0) * sym("a")
            } else if i.abs_diff(j) == 1 {
                -sym("a")
            } else {
                Expr::zero()
            }
        });
        let inv = inverse(&m).unwrap();
        let product = evaluate(&m, &ctx()).unwrap() * evaluate(&inv, &ctx()).unwrap();
        assert!((product - DMatrix::identity(3, 3)).abs().max() < 1e-12);
    }

    #[test]
    fn test_singular_inverse() {
        let m = DMatrix::from_element(2, 2, sym("a"));
        assert_eq!(inverse(&m), Err(Error::SingularCapacitance));
    }

    #[test]
    fn test_congruence_and_quadratic_form() {
        let t = dmatrix![1.0, 1.0; 0.0, 1.0];
        let m = DMatrix::from_row_slice(2, 2, &[sym("a"), -sym("a"), -sym("a"), sym("a")]);
        let c = congruence(&t, &m).unwrap();
        // the sum direction carries no energy
        assert!(c[(1, 1)].is_identically_zero());
        assert_eq!(c[(0, 0)], sym("a"));

        let v = [sym("x"), Expr::zero()];
        let q = quadratic_form(&c, &v);
        let expected = 0.5 * sym("a") * sym("x").powi(2);
        assert!((q - expected).is_identically_zero());
    }

    #[test]
    fn test_leading_block() {
        let m = from_numeric(&DMatrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64));
        let block = leading_block(&m, 2);
        assert_eq!(block.shape(), (2, 2));
        assert_eq!(block[(1, 1)], Expr::num(4.0));
    }
}
