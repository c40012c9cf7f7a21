//! Weighted Louvain modularity optimization.
//!
//! Greedy local moves followed by graph aggregation, repeated until
//! modularity stops improving (Blondel et al. 2008). Edge weights feed
//! the modularity objective directly, so heavily co-similar protein
//! pairs pull harder than single-cutoff pairs.
//!
//! The implementation is deterministic: nodes are visited in index
//! order and ties keep the current assignment.

use std::collections::HashMap;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

use super::traits::CommunityDetection;
use crate::error::{Error, Result};

/// Weighted Louvain community detection.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma). Higher values produce smaller
    /// communities.
    resolution: f64,
    /// Maximum local-moving sweeps per level.
    max_iter: usize,
    /// Maximum aggregation levels.
    max_levels: usize,
    /// Minimum modularity improvement to keep aggregating.
    min_gain: f64,
}

/// Weighted graph at one aggregation level: deduplicated inter-node
/// edges plus per-node self-loop weight accumulated from contracted
/// communities.
struct LevelGraph {
    n: usize,
    edges: Vec<(usize, usize, f64)>,
    self_loops: Vec<f64>,
}

impl Louvain {
    /// Create a detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_gain: 1e-7,
        }
    }

    /// Set the resolution parameter.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the maximum local-moving sweeps per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the maximum number of aggregation levels.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelGraph {
    fn total_weight(&self) -> f64 {
        self.edges.iter().map(|&(_, _, w)| w).sum::<f64>() + self.self_loops.iter().sum::<f64>()
    }

    /// Weighted degree per node; self-loops count twice.
    fn degrees(&self) -> Vec<f64> {
        let mut degrees = vec![0.0; self.n];
        for &(i, j, w) in &self.edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }
        degrees
    }

    fn modularity(&self, partition: &[usize], resolution: f64) -> f64 {
        let m = self.total_weight();
        if m == 0.0 {
            return 0.0;
        }
        let degrees = self.degrees();

        let mut q = 0.0;
        for &(i, j, w) in &self.edges {
            if partition[i] == partition[j] {
                q += w - resolution * degrees[i] * degrees[j] / (2.0 * m);
            }
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            if sl > 0.0 {
                q += sl - resolution * degrees[i] * degrees[i] / (4.0 * m);
            }
        }
        q / m
    }
}

impl Louvain {
    /// One level of greedy local moving. Returns the partition and
    /// whether any node moved.
    fn local_moving(&self, level: &LevelGraph) -> (Vec<usize>, bool) {
        let n = level.n;
        let m = level.total_weight();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }

        let mut adjacency: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        for &(i, j, w) in &level.edges {
            *adjacency[i].entry(j).or_insert(0.0) += w;
            *adjacency[j].entry(i).or_insert(0.0) += w;
        }

        let degrees = level.degrees();
        let mut partition: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut any_moved = false;

        for _sweep in 0..self.max_iter {
            let mut moved = false;

            for node in 0..n {
                let home = partition[node];
                let ki = degrees[node];
                community_degrees[home] -= ki;

                // Weight of edges from `node` into each neighboring
                // community.
                let mut links: HashMap<usize, f64> = HashMap::new();
                for (&neighbor, &w) in &adjacency[node] {
                    *links.entry(partition[neighbor]).or_insert(0.0) += w;
                }

                let mut best = home;
                let mut best_gain = 0.0;
                for (&target, &ki_in) in &links {
                    let gain = ki_in / m
                        - self.resolution * community_degrees[target] * ki / (2.0 * m * m);
                    if gain > best_gain {
                        best_gain = gain;
                        best = target;
                    }
                }

                partition[node] = best;
                community_degrees[best] += ki;
                if best != home {
                    moved = true;
                    any_moved = true;
                }
            }

            if !moved {
                break;
            }
        }

        (partition, any_moved)
    }

    /// Contract each community into a single node. Returns the
    /// aggregated graph and, per new node, the original-node groups it
    /// absorbed.
    fn aggregate(&self, level: &LevelGraph, partition: &[usize]) -> (LevelGraph, Vec<Vec<usize>>) {
        let mut community_ids: Vec<usize> = partition.to_vec();
        community_ids.sort_unstable();
        community_ids.dedup();
        let relabel: HashMap<usize, usize> = community_ids
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();
        let n_new = community_ids.len();

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for (node, &community) in partition.iter().enumerate() {
            groups[relabel[&community]].push(node);
        }

        let mut merged: HashMap<(usize, usize), f64> = HashMap::new();
        let mut self_loops = vec![0.0; n_new];
        for &(i, j, w) in &level.edges {
            let ci = relabel[&partition[i]];
            let cj = relabel[&partition[j]];
            if ci == cj {
                self_loops[ci] += w;
            } else {
                let key = if ci < cj { (ci, cj) } else { (cj, ci) };
                *merged.entry(key).or_insert(0.0) += w;
            }
        }
        for (i, &sl) in level.self_loops.iter().enumerate() {
            self_loops[relabel[&partition[i]]] += sl;
        }

        let edges = merged.into_iter().map(|((i, j), w)| (i, j, w)).collect();
        (
            LevelGraph {
                n: n_new,
                edges,
                self_loops,
            },
            groups,
        )
    }

    /// Push an aggregated-level partition back down one level.
    fn expand(partition: &[usize], groups: &[Vec<usize>], n_below: usize) -> Vec<usize> {
        let mut result = vec![0; n_below];
        for (aggregated, members) in groups.iter().enumerate() {
            for &original in members {
                result[original] = partition[aggregated];
            }
        }
        result
    }
}

impl CommunityDetection for Louvain {
    fn detect<N, E: Copy + Into<f64>>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if graph.edge_count() == 0 {
            return Ok((0..n).collect());
        }

        // Collect weighted edges, normalized to i < j. Parallel edges
        // merge; self-loops are skipped (the similarity graph never has
        // them, and modularity would double-count).
        let mut merged: HashMap<(usize, usize), f64> = HashMap::new();
        for edge in graph.edge_references() {
            let a = edge.source().index();
            let b = edge.target().index();
            if a == b {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            *merged.entry(key).or_insert(0.0) += (*edge.weight()).into();
        }

        let mut level = LevelGraph {
            n,
            edges: merged.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
            self_loops: vec![0.0; n],
        };
        let mut group_stack: Vec<Vec<Vec<usize>>> = Vec::new();
        let mut sizes: Vec<usize> = Vec::new();
        let mut prev_modularity = f64::NEG_INFINITY;

        for _level_idx in 0..self.max_levels {
            let (partition, moved) = self.local_moving(&level);
            if !moved {
                break;
            }

            let q = level.modularity(&partition, self.resolution);
            if q - prev_modularity < self.min_gain {
                break;
            }
            prev_modularity = q;

            let (aggregated, groups) = self.aggregate(&level, &partition);
            if aggregated.n == level.n {
                break;
            }
            sizes.push(level.n);
            group_stack.push(groups);
            level = aggregated;
        }

        // Identity at the top level, expanded back down through every
        // aggregation.
        let mut partition: Vec<usize> = (0..level.n).collect();
        while let Some(groups) = group_stack.pop() {
            let n_below = sizes.pop().unwrap_or(n);
            partition = Self::expand(&partition, &groups, n_below);
        }

        // Renumber to consecutive ids in first-appearance order.
        let mut relabel: HashMap<usize, usize> = HashMap::new();
        Ok(partition
            .iter()
            .map(|&c| {
                let next = relabel.len();
                *relabel.entry(c).or_insert(next)
            })
            .collect())
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}
