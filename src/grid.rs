//! Grid search over hit-selection thresholds with quality-gated
//! scoring.
//!
//! For every (protein group, hit cap, promiscuity cap) combination the
//! induced hit dataset is cross-validated; combinations that clear the
//! AUROC cut get the classifier re-fit on their labels and the full
//! candidate library scored, producing one named score column each.
//! Combinations that fail produce nothing — by design the number of
//! retained columns ranges from zero to `groups x grid size`.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::task::{ActivityModel, HitSelector, TaskEvaluation, TaskEvaluator};

/// The 2D threshold grid swept per protein group.
#[derive(Debug, Clone)]
pub struct ScoreGrid {
    /// Caps on hit fragments per protein.
    pub max_hit_fragments: Vec<usize>,
    /// Caps on fragment promiscuity.
    pub max_fragment_promiscuity: Vec<usize>,
}

impl Default for ScoreGrid {
    fn default() -> Self {
        Self {
            max_hit_fragments: vec![50, 100, 200],
            max_fragment_promiscuity: vec![100, 250, 500],
        }
    }
}

impl ScoreGrid {
    /// Number of (hit cap, promiscuity cap) combinations.
    pub fn len(&self) -> usize {
        self.max_hit_fragments.len() * self.max_fragment_promiscuity.len()
    }

    /// Whether the grid is empty on either axis.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One scoring task's protein set, carrying its column-name scheme.
///
/// Cluster groups cover detected communities and the appended
/// full-input pseudo-community; single groups cover each input protein
/// on its own.
#[derive(Debug, Clone)]
pub enum ProteinGroup {
    /// A community, named by its position in the group list.
    Cluster {
        /// Cluster index embedded in column names.
        index: usize,
        /// Member proteins.
        pids: Vec<String>,
    },
    /// A single input protein.
    Single(String),
}

impl ProteinGroup {
    /// Member proteins of this group.
    pub fn pids(&self) -> &[String] {
        match self {
            ProteinGroup::Cluster { pids, .. } => pids,
            ProteinGroup::Single(pid) => std::slice::from_ref(pid),
        }
    }

    /// Column name for this group under the given caps; unique and
    /// stable for a fixed group ordering.
    pub fn column_name(&self, max_hit_fragments: usize, max_prom: usize) -> String {
        match self {
            ProteinGroup::Cluster { index, .. } => {
                format!("clu{index}_{max_hit_fragments}_{max_prom}")
            }
            ProteinGroup::Single(pid) => format!("prot{pid}_{max_hit_fragments}_{max_prom}"),
        }
    }
}

/// A named score column, one value per candidate molecule.
#[derive(Debug, Clone)]
pub struct ScoreColumn {
    /// Provenance-encoding name.
    pub name: String,
    /// Positive-class probabilities, in molecule order.
    pub scores: Vec<f64>,
}

/// Retained columns plus their evaluation records, in lockstep order.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    /// Retained score columns.
    pub columns: Vec<ScoreColumn>,
    /// One evaluation record per retained column.
    pub metadata: Vec<TaskEvaluation>,
}

/// Sweeps the threshold grid over protein groups and scores the
/// candidate library for every surviving combination.
#[derive(Debug, Clone)]
pub struct GridSearchScorer {
    grid: ScoreGrid,
    auroc_cut: f64,
    tfidf: bool,
}

impl GridSearchScorer {
    /// Create a scorer with the default grid and the default AUROC cut
    /// of 0.6 (independent of the community detector's own cut).
    pub fn new(tfidf: bool) -> Self {
        Self {
            grid: ScoreGrid::default(),
            auroc_cut: 0.6,
            tfidf,
        }
    }

    /// Replace the threshold grid.
    pub fn with_grid(mut self, grid: ScoreGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Set the retention AUROC cut.
    pub fn with_auroc_cut(mut self, auroc_cut: f64) -> Self {
        self.auroc_cut = auroc_cut;
        self
    }

    /// Run the full sweep in deterministic order: groups outer, hit
    /// caps middle, promiscuity caps inner.
    ///
    /// The classifier is re-fit on every accepted combination; callers
    /// must not assume it retains any earlier fit once this returns.
    /// Individual combinations failing to evaluate are skipped
    /// silently; only collaborator errors abort the sweep.
    pub fn score_all<M: ActivityModel>(
        &self,
        model: &mut M,
        groups: &[ProteinGroup],
        smiles: &[String],
        selector: &dyn HitSelector,
        evaluator: &dyn TaskEvaluator,
    ) -> Result<ScoreSet> {
        let mut out = ScoreSet::default();

        for group in groups {
            for &max_hits in &self.grid.max_hit_fragments {
                for &max_prom in &self.grid.max_fragment_promiscuity {
                    let column = group.column_name(max_hits, max_prom);

                    let Some(data) =
                        selector.select(group.pids(), self.tfidf, max_hits, max_prom)?
                    else {
                        debug!("{column}: no hit dataset, skipped");
                        continue;
                    };
                    let Some(evaluation) = evaluator.evaluate(model, &data)? else {
                        debug!("{column}: not evaluable, skipped");
                        continue;
                    };
                    if !evaluation.passes(self.auroc_cut) {
                        debug!("{column}: auroc {:?} below cut, skipped", evaluation.auroc);
                        continue;
                    }

                    model.fit(&data.y)?;
                    let scores = positive_class(model, smiles)?;
                    out.columns.push(ScoreColumn {
                        name: column,
                        scores,
                    });
                    out.metadata.push(evaluation);
                }
            }
        }

        info!(
            "grid search retained {} of {} combinations",
            out.columns.len(),
            groups.len() * self.grid.len()
        );
        Ok(out)
    }
}

/// Score the library and extract the positive-class column, validating
/// the probability-matrix shape.
fn positive_class<M: ActivityModel>(model: &M, smiles: &[String]) -> Result<Vec<f64>> {
    let proba = model.predict_proba(smiles)?;
    if proba.nrows() != smiles.len() || proba.ncols() < 2 {
        return Err(Error::ShapeMismatch {
            expected: format!("{} x >=2 probability matrix", smiles.len()),
            actual: format!("{}x{}", proba.nrows(), proba.ncols()),
        });
    }
    Ok(proba.column(1).to_vec())
}
