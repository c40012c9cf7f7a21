//! End-to-end prediction pipeline.
//!
//! Fixed candidate library, curated protein-of-interest list, two
//! similarity matrices in; one score column per retained (protein
//! group, threshold pair) task out. Single-threaded and synchronous:
//! the classifier is a shared mutable scratch resource, re-fit once per
//! accepted task, never concurrently.

use log::info;

use crate::assemble::{assemble, MoleculeTable, ResultsTable};
use crate::community::{ClusterOutcome, CommunityDetector};
use crate::error::Result;
use crate::graph;
use crate::grid::{GridSearchScorer, ProteinGroup, ScoreGrid};
use crate::io::{HitsBundle, NameMap};
use crate::similarity::{SimilarityMatrix, DEFAULT_PERCENTILES};
use crate::task::{ActivityModel, HitSelector, TaskEvaluation, TaskEvaluator};

/// Pipeline parameters with the standard run defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Percentiles for similarity cutoffs (applied at matrix load).
    pub similarity_percentiles: Vec<f64>,
    /// AUROC cut for retaining a detected community.
    pub community_auroc_cut: f64,
    /// AUROC cut for retaining a grid-search task. Independent of the
    /// community cut.
    pub scoring_auroc_cut: f64,
    /// Whether hit selection is tfidf-weighted.
    pub tfidf: bool,
    /// Louvain resolution parameter.
    pub resolution: f64,
    /// Threshold grid swept per protein group.
    pub grid: ScoreGrid,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_percentiles: DEFAULT_PERCENTILES.to_vec(),
            community_auroc_cut: 0.7,
            scoring_auroc_cut: 0.6,
            tfidf: true,
            resolution: 1.0,
            grid: ScoreGrid::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the community-retention AUROC cut.
    pub fn with_community_auroc_cut(mut self, cut: f64) -> Self {
        self.community_auroc_cut = cut;
        self
    }

    /// Set the task-retention AUROC cut.
    pub fn with_scoring_auroc_cut(mut self, cut: f64) -> Self {
        self.scoring_auroc_cut = cut;
        self
    }

    /// Enable or disable tfidf weighting of hit selection.
    pub fn with_tfidf(mut self, tfidf: bool) -> Self {
        self.tfidf = tfidf;
        self
    }

    /// Set the Louvain resolution parameter.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Replace the threshold grid.
    pub fn with_grid(mut self, grid: ScoreGrid) -> Self {
        self.grid = grid;
        self
    }
}

/// One resolved input protein, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinSummary {
    /// UniProt accession.
    pub accession: String,
    /// Display name, or the accession when no name is mapped.
    pub name: String,
    /// Observed hit-fragment count.
    pub fragment_hits: u32,
}

/// Summarize the resolved protein set against the mapping table and
/// hit index.
pub fn protein_summaries(
    pids: &[String],
    names: &NameMap,
    hits: &HitsBundle,
) -> Vec<ProteinSummary> {
    pids.iter()
        .map(|pid| ProteinSummary {
            accession: pid.clone(),
            name: names.display_name(pid).unwrap_or(pid).to_string(),
            fragment_hits: hits.protein_hit_counts.get(pid).copied().unwrap_or(0),
        })
        .collect()
}

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Molecule table with retained score columns appended.
    pub results: ResultsTable,
    /// One evaluation record per retained column, in column order.
    pub metadata: Vec<TaskEvaluation>,
    /// The gated community-detection outcome, for auditability.
    pub communities: ClusterOutcome,
}

/// Build the scoring group list: retained communities, then the full
/// input list as one extra pseudo-community, then each input protein on
/// its own.
///
/// Cluster indices run over communities and the appended input list, so
/// column names stay unique and stable for a given run.
pub fn protein_groups(communities: &[Vec<String>], input_pids: &[String]) -> Vec<ProteinGroup> {
    let mut groups: Vec<ProteinGroup> = communities
        .iter()
        .enumerate()
        .map(|(index, pids)| ProteinGroup::Cluster {
            index,
            pids: pids.clone(),
        })
        .collect();
    groups.push(ProteinGroup::Cluster {
        index: communities.len(),
        pids: input_pids.to_vec(),
    });
    groups.extend(input_pids.iter().cloned().map(ProteinGroup::Single));
    groups
}

/// Run the full pipeline.
///
/// Builds the similarity graph over `input_pids`, detects and gates
/// communities, sweeps the threshold grid over every protein group, and
/// assembles the results table. Fails only on data-integrity problems;
/// a run where every task is gated away succeeds with zero score
/// columns.
pub fn run<M: ActivityModel>(
    config: &PipelineConfig,
    molecules: MoleculeTable,
    input_pids: &[String],
    matrices: &[SimilarityMatrix],
    model: &mut M,
    selector: &dyn HitSelector,
    evaluator: &dyn TaskEvaluator,
) -> Result<PipelineOutput> {
    info!(
        "pipeline start: {} molecules, {} input proteins",
        molecules.len(),
        input_pids.len()
    );

    let protein_graph = graph::build(input_pids, matrices)?;

    let detector = CommunityDetector::new(config.tfidf, config.community_auroc_cut)
        .with_resolution(config.resolution);
    let communities = detector.cluster(model, &protein_graph, selector, evaluator)?;
    info!(
        "community detection: {} retained, {} rejected",
        communities.ok.len(),
        communities.rejected.len()
    );

    let groups = protein_groups(&communities.ok, input_pids);
    let scorer = GridSearchScorer::new(config.tfidf)
        .with_grid(config.grid.clone())
        .with_auroc_cut(config.scoring_auroc_cut);
    let smiles = molecules.smiles.clone();
    let scores = scorer.score_all(model, &groups, &smiles, selector, evaluator)?;

    let results = assemble(molecules, scores.columns)?;
    info!(
        "pipeline done: {} score columns over {} molecules",
        results.n_score_columns(),
        results.n_rows()
    );

    Ok(PipelineOutput {
        results,
        metadata: scores.metadata,
        communities,
    })
}
