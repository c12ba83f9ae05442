//! Incremental rank tracking for sets of mode vectors.

use nalgebra::DVector;

/// Residual magnitude below which a vector counts as dependent.
const RANK_TOL: f64 = 1e-9;

/// Span of a set of vectors, kept as row-echelon pivot rows.
///
/// Each stored row has a unit entry at its pivot column and zeros at the
/// pivots of all rows inserted before it, so reducing a candidate against
/// the rows in insertion order eliminates every pivot column.
#[derive(Debug, Clone)]
pub struct Subspace {
    dim: usize,
    rows: Vec<(usize, DVector<f64>)>,
}

impl Subspace {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            rows: Vec::new(),
        }
    }

    /// Span of the given vectors.
    pub fn spanned_by<'a, I>(dim: usize, vectors: I) -> Self
    where
        I: IntoIterator<Item = &'a DVector<f64>>,
    {
        let mut space = Self::new(dim);
        for v in vectors {
            space.try_insert(v);
        }
        space
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn rank(&self) -> usize {
        self.rows.len()
    }

    pub fn is_full(&self) -> bool {
        self.rank() == self.dim
    }

    fn residual(&self, v: &DVector<f64>) -> DVector<f64> {
        let mut r = v.clone();
        for (pivot, row) in &self.rows {
            let c = r[*pivot];
            if c != 0.0 {
                r.axpy(-c, row, 1.0);
            }
        }
        r
    }

    fn leading_index(r: &DVector<f64>, scale: f64) -> Option<usize> {
        r.iter().position(|x| x.abs() > RANK_TOL * scale)
    }

    /// Add `v` if it is independent of the current span.
    ///
    /// Returns `true` when the rank increased.
    pub fn try_insert(&mut self, v: &DVector<f64>) -> bool {
        debug_assert_eq!(v.len(), self.dim);
        let scale = v.amax().max(1.0);
        let r = self.residual(v);
        match Self::leading_index(&r, scale) {
            Some(pivot) => {
                let row = &r / r[pivot];
                self.rows.push((pivot, row));
                true
            }
            None => false,
        }
    }

    /// True when `v` lies in the span.
    pub fn contains(&self, v: &DVector<f64>) -> bool {
        let scale = v.amax().max(1.0);
        Self::leading_index(&self.residual(v), scale).is_none()
    }

    /// True when inserting `v` would increase the rank.
    pub fn is_independent(&self, v: &DVector<f64>) -> bool {
        !self.contains(v)
    }
}
