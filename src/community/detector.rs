//! Community detection gated by predictive quality.
//!
//! Candidate communities come from weighted Louvain; each one is kept
//! only if a model trained on its induced hit dataset cross-validates
//! at or above the AUROC cut. Candidates that cannot be evaluated are
//! dropped the same way — an expected outcome, not a detector failure.

use log::debug;

use super::louvain::Louvain;
use super::traits::CommunityDetection;
use crate::error::Result;
use crate::graph::ProteinGraph;
use crate::task::{ActivityModel, HitSelector, TaskEvaluator};

/// A community of proteins proposed by graph partitioning.
pub type Community = Vec<String>;

/// A candidate community that failed its quality gate, with the AUROC
/// observed for it (if any evaluation was possible at all).
#[derive(Debug, Clone)]
pub struct RejectedCommunity {
    /// Member proteins.
    pub pids: Community,
    /// Observed AUROC, `None` when the candidate was not evaluable.
    pub auroc: Option<f64>,
}

/// Outcome of gated community detection.
#[derive(Debug, Clone, Default)]
pub struct ClusterOutcome {
    /// Communities whose AUROC met the cut, in partition order.
    pub ok: Vec<Community>,
    /// Candidates dropped by the gate, kept for auditability.
    pub rejected: Vec<RejectedCommunity>,
}

/// Partitions a protein graph and keeps only communities that predict
/// well under cross-validation.
#[derive(Debug, Clone)]
pub struct CommunityDetector {
    louvain: Louvain,
    tfidf: bool,
    auroc_cut: f64,
    selection_caps: (usize, usize),
}

impl CommunityDetector {
    /// Create a detector with the given tfidf flag and AUROC cut.
    pub fn new(tfidf: bool, auroc_cut: f64) -> Self {
        Self {
            louvain: Louvain::new(),
            tfidf,
            auroc_cut,
            selection_caps: (usize::MAX, usize::MAX),
        }
    }

    /// Set the Louvain resolution parameter.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.louvain = self.louvain.with_resolution(resolution);
        self
    }

    /// Cap hit selection during gating; candidates are selected
    /// uncapped by default.
    pub fn with_selection_caps(mut self, max_hit_fragments: usize, max_prom: usize) -> Self {
        self.selection_caps = (max_hit_fragments, max_prom);
        self
    }

    /// Partition `graph` and gate every candidate community.
    ///
    /// The graph is not mutated. For each candidate, the hit dataset
    /// restricted to its proteins is selected and evaluated; the
    /// candidate lands in `ok` iff its AUROC meets the cut, otherwise
    /// in `rejected` with whatever AUROC was observed.
    pub fn cluster<M: ActivityModel>(
        &self,
        model: &mut M,
        graph: &ProteinGraph,
        selector: &dyn HitSelector,
        evaluator: &dyn TaskEvaluator,
    ) -> Result<ClusterOutcome> {
        let labels = self.louvain.detect(graph)?;

        let n_communities = labels.iter().copied().max().map_or(0, |m| m + 1);
        let mut candidates: Vec<Community> = vec![Vec::new(); n_communities];
        for (node, &community) in labels.iter().enumerate() {
            let pid = graph[petgraph::graph::NodeIndex::new(node)].clone();
            candidates[community].push(pid);
        }

        let mut outcome = ClusterOutcome::default();
        let (max_hits, max_prom) = self.selection_caps;
        for pids in candidates {
            let auroc = self.gate(model, &pids, selector, evaluator, max_hits, max_prom)?;
            match auroc {
                Some(a) if a >= self.auroc_cut => outcome.ok.push(pids),
                observed => {
                    debug!(
                        "community of {} proteins rejected (auroc {observed:?})",
                        pids.len()
                    );
                    outcome.rejected.push(RejectedCommunity {
                        pids,
                        auroc: observed,
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Evaluate one candidate; `None` when no dataset or no evaluation
    /// was obtainable.
    fn gate<M: ActivityModel>(
        &self,
        model: &mut M,
        pids: &[String],
        selector: &dyn HitSelector,
        evaluator: &dyn TaskEvaluator,
        max_hits: usize,
        max_prom: usize,
    ) -> Result<Option<f64>> {
        let Some(data) = selector.select(pids, self.tfidf, max_hits, max_prom)? else {
            return Ok(None);
        };
        let Some(evaluation) = evaluator.evaluate(model, &data)? else {
            return Ok(None);
        };
        Ok(evaluation.auroc)
    }
}
