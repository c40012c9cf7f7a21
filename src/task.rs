//! Collaborator contracts for hit selection, modeling, and evaluation.
//!
//! The classifier, the hit-selection logic, and the cross-validation
//! evaluator are external capabilities: this crate consumes them
//! through the traits below and never assumes how they work inside.
//! In particular, nothing here requires their scores to be
//! deterministic.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Labeled hit dataset for one (protein set, cap pair) task.
///
/// Beyond the label vector consumed by [`ActivityModel::fit`], the
/// dataset is opaque to the pipeline; fragment identifiers travel with
/// it for whatever the evaluator needs.
#[derive(Debug, Clone)]
pub struct HitDataset {
    /// Labels, one per fragment: `true` marks an observed hit.
    pub y: Vec<bool>,
    /// Fragment identifiers aligned with `y`.
    pub fragments: Vec<String>,
}

impl HitDataset {
    /// Number of labeled fragments.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the dataset holds no labels.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of positive labels.
    pub fn n_positives(&self) -> usize {
        self.y.iter().filter(|&&l| l).count()
    }
}

/// Cross-validation record for one task.
///
/// `auroc: None` signals "not evaluable" (e.g. single-class folds) and
/// is an expected outcome, never an error. Retained records are written
/// out alongside the results table, one per retained score column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvaluation {
    /// Mean cross-validated AUROC, if evaluable.
    pub auroc: Option<f64>,
    /// Spread of the AUROC across folds, if evaluable.
    pub auroc_std: Option<f64>,
    /// Number of labeled fragments in the task.
    pub n_samples: usize,
    /// Number of positive labels in the task.
    pub n_positives: usize,
}

impl TaskEvaluation {
    /// Whether the recorded AUROC meets `cut`.
    pub fn passes(&self, cut: f64) -> bool {
        matches!(self.auroc, Some(a) if a >= cut)
    }
}

/// On-the-fly classifier contract.
///
/// The pipeline re-fits one shared instance on every accepted task, so
/// no fit state survives past the next call; treat the model as an
/// exclusively-owned scratch resource.
pub trait ActivityModel {
    /// Fit on the labels of the current task.
    fn fit(&mut self, y: &[bool]) -> Result<()>;

    /// Per-class probability matrix for the given molecule structures,
    /// one row per molecule; the pipeline reads the positive class from
    /// column 1.
    fn predict_proba(&self, smiles: &[String]) -> Result<Array2<f64>>;
}

/// Hit-selection contract: build the labeled dataset for a protein set
/// under the two caps.
///
/// `Ok(None)` means no dataset can be formed for these proteins (for
/// example, none of them carries usable hits) and is an expected,
/// skippable outcome.
pub trait HitSelector {
    /// Select hits for `pids`, tfidf-weighted if requested, capped by
    /// `max_hit_fragments` per protein and `max_fragment_promiscuity`
    /// per fragment.
    fn select(
        &self,
        pids: &[String],
        tfidf: bool,
        max_hit_fragments: usize,
        max_fragment_promiscuity: usize,
    ) -> Result<Option<HitDataset>>;
}

/// Cross-validation evaluator contract.
///
/// `Ok(None)` means the task could not be evaluated at all; a returned
/// record may still carry `auroc: None`. Both are quality-gating
/// outcomes, not errors. Evaluation may re-fit the model, which is why
/// it takes the classifier mutably.
pub trait TaskEvaluator {
    /// Evaluate the predictive quality of `model` on `data`.
    fn evaluate(
        &self,
        model: &mut dyn ActivityModel,
        data: &HitDataset,
    ) -> Result<Option<TaskEvaluation>>;
}
