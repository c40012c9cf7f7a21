//! Protein-protein similarity matrices with percentile cutoffs.
//!
//! Two independent precomputed matrices feed graph construction (one
//! correlation-based, one hit-profile-cosine-based). Each carries its
//! own cutoff set, computed once at load time and immutable afterwards.
//!
//! Cutoffs are percentiles of the strictly upper triangular values
//! (row < col, diagonal excluded). Percentiles use linear interpolation
//! between adjacent order statistics: for a sorted sample of `n` values
//! the percentile `p` sits at rank `p/100 * (n-1)` and is interpolated
//! between the two nearest ranks. The interpolation method matters:
//! edge counts downstream are sensitive to ties at cutoff boundaries.

use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Default percentiles used to derive similarity cutoffs.
pub const DEFAULT_PERCENTILES: [f64; 2] = [95.0, 90.0];

/// A square protein-protein similarity matrix with derived cutoffs.
///
/// The matrix may be indexed over a larger protein universe than any
/// particular analysis subset; lookups by identifier fail loudly when a
/// protein is absent from the universe.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    values: Array2<f64>,
    cutoffs: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build a matrix from its id ordering and values, computing one
    /// cutoff per percentile.
    ///
    /// Fails when the matrix is not square, is misaligned with `ids`,
    /// has duplicate identifiers, holds fewer than two proteins (no
    /// upper-triangle sample exists), or a percentile falls outside
    /// `[0, 100]`.
    pub fn from_parts(ids: Vec<String>, values: Array2<f64>, percentiles: &[f64]) -> Result<Self> {
        if values.nrows() != values.ncols() {
            return Err(Error::ShapeMismatch {
                expected: format!("{n}x{n} square matrix", n = values.nrows()),
                actual: format!("{}x{}", values.nrows(), values.ncols()),
            });
        }
        if ids.len() != values.nrows() {
            return Err(Error::DimensionMismatch {
                expected: ids.len(),
                found: values.nrows(),
            });
        }
        if ids.len() < 2 {
            return Err(Error::EmptyInput);
        }
        for p in percentiles {
            if !(0.0..=100.0).contains(p) {
                return Err(Error::InvalidParameter {
                    name: "percentiles",
                    message: "percentile must be within [0, 100]",
                });
            }
        }

        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(Error::InvalidParameter {
                    name: "ids",
                    message: "duplicate protein identifier",
                });
            }
        }

        let mut sample = upper_triangle(&values);
        sample.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let cutoffs = percentiles.iter().map(|&p| percentile(&sample, p)).collect();

        Ok(Self {
            ids,
            index,
            values,
            cutoffs,
        })
    }

    /// Ordered protein identifiers of this matrix universe.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Cutoff values, one per configured percentile.
    pub fn cutoffs(&self) -> &[f64] {
        &self.cutoffs
    }

    /// Whether `pid` belongs to this matrix universe.
    pub fn contains(&self, pid: &str) -> bool {
        self.index.contains_key(pid)
    }

    /// Similarity between two proteins.
    ///
    /// Errors with [`Error::UnknownProtein`] when either identifier is
    /// absent from the universe; the pipeline treats that as a fatal
    /// setup problem, not a skippable condition.
    pub fn value(&self, a: &str, b: &str) -> Result<f64> {
        let ia = self.lookup(a)?;
        let ib = self.lookup(b)?;
        Ok(self.values[[ia, ib]])
    }

    fn lookup(&self, pid: &str) -> Result<usize> {
        self.index.get(pid).copied().ok_or_else(|| Error::UnknownProtein {
            pid: pid.to_string(),
        })
    }
}

/// Strictly upper triangular values (row < col), flattened row-major.
fn upper_triangle(values: &Array2<f64>) -> Vec<f64> {
    let n = values.nrows();
    let mut out = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(values[[i, j]]);
        }
    }
    out
}

/// Percentile of a pre-sorted sample, linearly interpolated between
/// adjacent order statistics.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
