//! Variable transformation and mode classification.
//!
//! The transformation matrix maps new coordinates θ to node fluxes φ
//! (`φ = T·θ`); every column is one new basis vector written in node-flux
//! coordinates. Columns are grouped in fixed blocks: periodic, extended,
//! cyclic, frozen, and for ungrounded circuits the sum mode last.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use sqcircuit_core::{BranchKind, CircuitGraph};

use crate::config::BasisCompletion;
use crate::error::{Error, Result};
use crate::modes::{independent_modes, ModeEntries};
use crate::subspace::Subspace;

/// Determinant magnitude, relative to the largest entry raised to the
/// dimension, below which a transformation is singular.
const DET_TOL: f64 = 1e-9;

/// Kind of a new coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Periodic,
    Extended,
    Cyclic,
    Frozen,
    /// Extended coordinates with no flux difference across any junction.
    Oscillator,
}

impl ModeKind {
    pub const ALL: [ModeKind; 5] = [
        ModeKind::Periodic,
        ModeKind::Extended,
        ModeKind::Cyclic,
        ModeKind::Frozen,
        ModeKind::Oscillator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModeKind::Periodic => "periodic",
            ModeKind::Extended => "extended",
            ModeKind::Cyclic => "cyclic",
            ModeKind::Frozen => "frozen",
            ModeKind::Oscillator => "osc",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 1-based indices of the new coordinates in each category.
///
/// Periodic, extended, cyclic and frozen are disjoint; oscillator is a subset
/// of extended. The sum mode of an ungrounded circuit is in no category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    pub periodic: Vec<usize>,
    pub extended: Vec<usize>,
    pub cyclic: Vec<usize>,
    pub frozen: Vec<usize>,
    pub oscillator: Vec<usize>,
}

impl CategoryMap {
    pub fn indices(&self, kind: ModeKind) -> &[usize] {
        match kind {
            ModeKind::Periodic => &self.periodic,
            ModeKind::Extended => &self.extended,
            ModeKind::Cyclic => &self.cyclic,
            ModeKind::Frozen => &self.frozen,
            ModeKind::Oscillator => &self.oscillator,
        }
    }

    pub fn count(&self, kind: ModeKind) -> usize {
        self.indices(kind).len()
    }

    /// Primary category of a 1-based index. Never returns `Oscillator`.
    pub fn kind_of(&self, index: usize) -> Option<ModeKind> {
        [
            ModeKind::Periodic,
            ModeKind::Extended,
            ModeKind::Cyclic,
            ModeKind::Frozen,
        ]
        .into_iter()
        .find(|&kind| self.indices(kind).contains(&index))
    }

    pub fn is_cyclic(&self, index: usize) -> bool {
        self.cyclic.contains(&index)
    }

    fn push(&mut self, kind: ModeKind, index: usize) {
        match kind {
            ModeKind::Periodic => self.periodic.push(index),
            ModeKind::Extended => self.extended.push(index),
            ModeKind::Cyclic => self.cyclic.push(index),
            ModeKind::Frozen => self.frozen.push(index),
            ModeKind::Oscillator => self.oscillator.push(index),
        }
    }
}

impl fmt::Display for CategoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in ModeKind::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}: {:?}", self.indices(kind))?;
        }
        Ok(())
    }
}

/// Non-fatal disagreement between a supplied transformation and the
/// automatically derived one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationMismatch {
    pub kind: ModeKind,
    pub automatic: usize,
    pub supplied: usize,
}

impl fmt::Display for ClassificationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} modes found in the circuit, {} in the supplied transformation",
            self.automatic, self.kind, self.supplied
        )
    }
}

/// A transformation matrix with its classification.
#[derive(Debug, Clone)]
pub struct Transformation {
    pub matrix: DMatrix<f64>,
    pub categories: CategoryMap,
    pub warnings: Vec<ClassificationMismatch>,
}

/// Mode sets of the four branch partitions.
#[derive(Debug, Clone)]
pub(crate) struct ModeSets {
    dim: usize,
    periodic: Vec<DVector<f64>>,
    frozen: Vec<DVector<f64>>,
    cyclic: Vec<DVector<f64>>,
    oscillator: Vec<DVector<f64>>,
    sum: Option<DVector<f64>>,
}

impl ModeSets {
    pub(crate) fn compute(graph: &CircuitGraph, oscillator_entries: ModeEntries) -> Self {
        let dim = graph.node_count();
        let modes_of = |keep: &dyn Fn(BranchKind) -> bool, single_nodes, entries| {
            independent_modes(graph, &graph.branch_ids_where(keep), single_nodes, entries)
        };

        let periodic = modes_of(&|k: BranchKind| k.is_inductor(), true, ModeEntries::INDICATOR);
        let mut frozen = modes_of(&|k: BranchKind| !k.is_inductor(), true, ModeEntries::INDICATOR);
        let cyclic = modes_of(&|k: BranchKind| !k.is_capacitor(), true, ModeEntries::INDICATOR);
        let oscillator = modes_of(
            &|k: BranchKind| k == BranchKind::Josephson,
            false,
            oscillator_entries,
        );

        let sum = (!graph.is_grounded()).then(|| DVector::from_element(dim, 1.0));
        if let Some(sum) = &sum {
            let span = Subspace::spanned_by(dim, &frozen);
            if span.contains(sum) && !frozen.is_empty() {
                frozen.remove(0);
            }
            frozen.push(sum.clone());
        }

        log::debug!(
            "mode sets: {} periodic, {} frozen, {} cyclic, {} oscillator",
            periodic.len(),
            frozen.len(),
            cyclic.len(),
            oscillator.len()
        );

        Self {
            dim,
            periodic,
            frozen,
            cyclic,
            oscillator,
            sum,
        }
    }

    /// Frozen, cyclic, periodic and oscillator modes, in that priority,
    /// keeping only those that increase the rank.
    pub(crate) fn merged(&self) -> Vec<DVector<f64>> {
        let mut span = Subspace::new(self.dim);
        self.frozen
            .iter()
            .chain(&self.cyclic)
            .chain(&self.periodic)
            .chain(&self.oscillator)
            .filter(|m| span.try_insert(m))
            .cloned()
            .collect()
    }
}

/// Advance `combo` to the next k-combination of `0..n` in lexicographic order.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    for i in (0..k).rev() {
        if combo[i] < n - k + i {
            combo[i] += 1;
            for j in i + 1..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

/// Vectors completing any mode set to a basis of the node-flux space.
fn completion_vectors(dim: usize, completion: BasisCompletion) -> Vec<DVector<f64>> {
    match completion {
        BasisCompletion::Standard => (0..dim)
            .map(|i| DVector::from_fn(dim, |r, _| if r == i { 1.0 } else { 0.0 }))
            .collect(),
        BasisCompletion::Simple => {
            let ones = DVector::from_element(dim, 1.0);
            let mut span = Subspace::spanned_by(dim, [&ones]);
            let mut basis = vec![ones];

            // permutations of a vector with `k` leading ones, lexicographically
            // descending, are the k-combinations of positions in ascending order
            let k = if dim > 2 { dim - 2 } else { dim - 1 };
            let mut combo: Vec<usize> = (0..k).collect();
            while !span.is_full() {
                let v = DVector::from_fn(dim, |r, _| if combo.contains(&r) { 1.0 } else { 0.0 });
                if span.try_insert(&v) {
                    basis.push(v);
                }
                if !next_combination(&mut combo, dim) {
                    break;
                }
            }
            basis
        }
    }
}

fn check_invertible(matrix: &DMatrix<f64>) -> Result<()> {
    let det = matrix.determinant();
    let scale = matrix.amax();
    if scale == 0.0 || (det / scale.powi(matrix.nrows() as i32)).abs() < DET_TOL {
        return Err(Error::SingularConfiguration(format!(
            "transformation matrix has zero determinant ({det:e})"
        )));
    }
    Ok(())
}

/// Build the variable transformation of a circuit.
pub fn build_transformation(
    graph: &CircuitGraph,
    completion: BasisCompletion,
) -> Result<Transformation> {
    let dim = graph.node_count();
    let sets = ModeSets::compute(graph, ModeEntries::SIGNED);

    let mut basis = sets.merged();
    let mut span = Subspace::spanned_by(dim, &basis);
    for v in completion_vectors(dim, completion) {
        if span.try_insert(&v) {
            basis.push(v);
        }
    }
    if basis.len() != dim {
        return Err(Error::SingularConfiguration(format!(
            "found {} independent modes for {dim} nodes",
            basis.len()
        )));
    }

    // classification by exact match against the mode lists
    let listed = |list: &[DVector<f64>], v: &DVector<f64>| list.iter().any(|m| m == v);
    let (mut sum, mut cyclic, mut periodic, mut frozen, mut rest) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let mut oscillator = Vec::new();
    for (i, v) in basis.iter().enumerate() {
        if sets.sum.as_ref() == Some(v) {
            sum.push(i);
        } else if listed(&sets.cyclic, v) {
            cyclic.push(i);
        } else if listed(&sets.periodic, v) {
            periodic.push(i);
        } else if listed(&sets.frozen, v) {
            frozen.push(i);
        } else {
            rest.push(i);
            if listed(&sets.oscillator, v) {
                oscillator.push(i);
            }
        }
    }

    let blocks = [
        (ModeKind::Periodic, &periodic),
        (ModeKind::Extended, &rest),
        (ModeKind::Cyclic, &cyclic),
        (ModeKind::Frozen, &frozen),
    ];
    let mut categories = CategoryMap::default();
    let mut columns = Vec::with_capacity(dim);
    for (kind, block) in blocks {
        for &i in block.iter() {
            columns.push(basis[i].clone());
            categories.push(kind, columns.len());
            if oscillator.contains(&i) {
                categories.push(ModeKind::Oscillator, columns.len());
            }
        }
    }
    columns.extend(sum.iter().map(|&i| basis[i].clone()));

    let matrix = DMatrix::from_columns(&columns);
    check_invertible(&matrix)?;
    log::debug!("variable transformation built: {categories}");

    Ok(Transformation {
        matrix,
        categories,
        warnings: Vec::new(),
    })
}

/// Subspace-membership classifier used for supplied transformations.
struct Classifier {
    dim: usize,
    sum: Option<DVector<f64>>,
    frozen: Subspace,
    cyclic: Subspace,
    periodic: Subspace,
    oscillator: Subspace,
}

impl Classifier {
    fn new(sets: &ModeSets) -> Self {
        let dim = sets.dim;
        Self {
            dim,
            sum: sets.sum.clone(),
            frozen: Subspace::spanned_by(dim, &sets.frozen),
            cyclic: Subspace::spanned_by(dim, &sets.cyclic),
            periodic: Subspace::spanned_by(dim, &sets.periodic),
            oscillator: Subspace::spanned_by(dim, &sets.oscillator),
        }
    }

    fn classify<I>(&self, modes: I) -> CategoryMap
    where
        I: IntoIterator<Item = DVector<f64>>,
    {
        let mut categories = CategoryMap::default();
        for (i, mode) in modes.into_iter().enumerate() {
            let index = i + 1;
            if let Some(sum) = &self.sum {
                if Subspace::spanned_by(self.dim, [&mode]).contains(sum) {
                    continue;
                }
            }
            if self.frozen.contains(&mode) {
                categories.push(ModeKind::Frozen, index);
            } else if self.cyclic.contains(&mode) {
                categories.push(ModeKind::Cyclic, index);
            } else if self.periodic.contains(&mode) {
                categories.push(ModeKind::Periodic, index);
            } else {
                if self.oscillator.contains(&mode) {
                    categories.push(ModeKind::Oscillator, index);
                }
                categories.push(ModeKind::Extended, index);
            }
        }
        categories
    }
}

/// Classify the columns of a supplied transformation matrix.
///
/// The transformation built with `completion` is classified the same way
/// for comparison. The supplied classification is returned even when the
/// category counts disagree; each disagreement is logged and recorded as a
/// [`ClassificationMismatch`].
pub fn classify_supplied(
    graph: &CircuitGraph,
    matrix: &DMatrix<f64>,
    completion: BasisCompletion,
) -> Result<Transformation> {
    let dim = graph.node_count();
    for actual in [matrix.nrows(), matrix.ncols()] {
        if actual != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual,
            });
        }
    }
    check_invertible(matrix)?;

    let sets = ModeSets::compute(graph, ModeEntries::INDICATOR);
    let classifier = Classifier::new(&sets);
    let supplied = classifier.classify(matrix.column_iter().map(|c| c.into_owned()));
    let reference = build_transformation(graph, completion)?;
    let automatic = classifier.classify(reference.matrix.column_iter().map(|c| c.into_owned()));

    let mut warnings = Vec::new();
    for kind in ModeKind::ALL {
        let (a, s) = (automatic.count(kind), supplied.count(kind));
        if a != s {
            let mismatch = ClassificationMismatch {
                kind,
                automatic: a,
                supplied: s,
            };
            log::warn!("classification mismatch: {mismatch}");
            warnings.push(mismatch);
        }
    }

    Ok(Transformation {
        matrix: matrix.clone(),
        categories: supplied,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;
    use sqcircuit_core::BranchDescriptor;

    fn graph(node_count: usize, lines: &[&str]) -> CircuitGraph {
        let descriptors: Vec<BranchDescriptor> = lines.iter().map(|l| l.parse().unwrap()).collect();
        CircuitGraph::from_descriptors(node_count, &descriptors).unwrap().0
    }

    fn transmon() -> CircuitGraph {
        graph(2, &["C 1 2 EC=1", "JJ 1 2 EJ=10 EC"])
    }

    #[test]
    fn test_next_combination() {
        let mut c = vec![0, 1];
        let mut seen = vec![c.clone()];
        while next_combination(&mut c, 4) {
            seen.push(c.clone());
        }
        assert_eq!(
            seen,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn test_simple_completion_is_full_rank() {
        for dim in 1..6 {
            let vectors = completion_vectors(dim, BasisCompletion::Simple);
            assert_eq!(vectors.len(), dim);
            assert_eq!(vectors[0], DVector::from_element(dim, 1.0));
            assert!(Subspace::spanned_by(dim, &vectors).is_full());
        }
    }

    #[test]
    fn test_transmon_transformation() {
        let t = build_transformation(&transmon(), BasisCompletion::Simple).unwrap();
        assert_eq!(t.matrix, dmatrix![1.0, 1.0; 0.0, 1.0]);
        assert_eq!(t.categories.periodic, vec![1]);
        assert!(t.categories.extended.is_empty());
        assert!(t.categories.frozen.is_empty());
        assert!(t.categories.cyclic.is_empty());
    }

    #[test]
    fn test_lc_transformation() {
        let g = graph(1, &["C 0 1 EC=2", "L 0 1 EL=1"]);
        let t = build_transformation(&g, BasisCompletion::Simple).unwrap();
        assert_eq!(t.categories.extended, vec![1]);
        assert_eq!(t.categories.oscillator, vec![1]);
        assert!(t.matrix[(0, 0)].abs() == 1.0);
    }

    #[test]
    fn test_frozen_node() {
        // node 2 only touches inductors
        let g = graph(2, &["C 0 1 1", "L 1 2 1", "L 2 0 1"]);
        let t = build_transformation(&g, BasisCompletion::Standard).unwrap();
        assert_eq!(t.categories.frozen, vec![2]);
        assert_eq!(t.categories.extended, vec![1]);
        assert_eq!(t.matrix.column(1).into_owned(), DVector::from_vec(vec![0.0, 1.0]));
    }

    #[test]
    fn test_supplied_matches_automatic() {
        let g = transmon();
        let auto = build_transformation(&g, BasisCompletion::Simple).unwrap();
        let supplied = classify_supplied(&g, &auto.matrix, BasisCompletion::Simple).unwrap();
        assert_eq!(supplied.categories, auto.categories);
        assert!(supplied.warnings.is_empty());
    }

    #[test]
    fn test_supplied_mismatch_warns() {
        let g = transmon();
        // any column outside the sum direction is periodic for a transmon
        let supplied =
            classify_supplied(&g, &dmatrix![1.0, 1.0; -1.0, 1.0], BasisCompletion::Simple).unwrap();
        assert_eq!(supplied.categories.periodic, vec![1]);
        assert!(supplied.warnings.is_empty());

        let g = graph(2, &["C 1 2 1", "L 1 2 1"]);
        let supplied =
            classify_supplied(&g, &dmatrix![1.0, 0.0; 0.0, 1.0], BasisCompletion::Simple).unwrap();
        let auto = build_transformation(&g, BasisCompletion::Simple).unwrap();
        assert_eq!(supplied.categories.extended, vec![1, 2]);
        assert_eq!(auto.categories.extended, vec![1]);
        assert!(supplied
            .warnings
            .iter()
            .any(|w| w.kind == ModeKind::Extended && w.automatic == 1 && w.supplied == 2));
    }

    #[test]
    fn test_supplied_small_entries() {
        let g = transmon();
        let auto = build_transformation(&g, BasisCompletion::Simple).unwrap();
        let scaled = &auto.matrix * 1e-6;
        assert!(scaled.determinant().abs() < 1e-9);
        let supplied = classify_supplied(&g, &scaled, BasisCompletion::Simple).unwrap();
        assert_eq!(supplied.categories, auto.categories);
        assert!(supplied.warnings.is_empty());

        assert!(matches!(
            classify_supplied(&g, &dmatrix![1e-6, 1e-6; 1e-6, 1e-6], BasisCompletion::Simple),
            Err(Error::SingularConfiguration(_))
        ));
    }

    #[test]
    fn test_supplied_errors() {
        let g = transmon();
        assert!(matches!(
            classify_supplied(&g, &dmatrix![1.0, 1.0; 1.0, 1.0], BasisCompletion::Simple),
            Err(Error::SingularConfiguration(_))
        ));
        assert!(matches!(
            classify_supplied(&g, &DMatrix::identity(3, 3), BasisCompletion::Simple),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
