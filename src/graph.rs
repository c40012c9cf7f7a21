//! Protein similarity graph construction.
//!
//! Nodes are protein identifiers; an edge exists when at least one
//! (matrix, cutoff) pair is satisfied and its weight counts how many
//! are. Multiple cutoffs on the same matrix each add weight
//! independently, so a pair passing both cutoffs of both matrices gets
//! weight 4 under the default two-percentile configuration.

use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{Error, Result};
use crate::similarity::SimilarityMatrix;

/// Weighted undirected graph over protein identifiers.
///
/// Edge weights are satisfied-cutoff counts, always >= 1.
pub type ProteinGraph = UnGraph<String, u32>;

/// Build the similarity graph for `protein_ids` from the given
/// matrices.
///
/// Every unordered pair (i < j) is looked up in each matrix via that
/// matrix's own id-to-index map; a protein missing from any matrix
/// universe is a fatal [`Error::UnknownProtein`]. Self-loops are never
/// created, and the result is a pure function of similarity values and
/// cutoffs.
pub fn build(protein_ids: &[String], matrices: &[SimilarityMatrix]) -> Result<ProteinGraph> {
    if protein_ids.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut graph = ProteinGraph::new_undirected();
    let nodes: Vec<NodeIndex> = protein_ids
        .iter()
        .map(|pid| graph.add_node(pid.clone()))
        .collect();

    for i in 0..protein_ids.len() {
        for j in (i + 1)..protein_ids.len() {
            for matrix in matrices {
                let v = matrix.value(&protein_ids[i], &protein_ids[j])?;
                for &cutoff in matrix.cutoffs() {
                    if v >= cutoff {
                        bump_edge(&mut graph, nodes[i], nodes[j]);
                    }
                }
            }
        }
    }

    debug!(
        "similarity graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn bump_edge(graph: &mut ProteinGraph, a: NodeIndex, b: NodeIndex) {
    match graph.find_edge(a, b) {
        Some(edge) => {
            if let Some(weight) = graph.edge_weight_mut(edge) {
                *weight += 1;
            }
        }
        None => {
            graph.add_edge(a, b, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SimilarityMatrix;
    use ndarray::Array2;
    use petgraph::visit::EdgeRef;
    use std::collections::HashMap;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Matrix over P0..Pn-1 with every off-diagonal value equal, so
    /// each derived cutoff lands exactly on that value.
    fn uniform_matrix(n: usize, value: f64, percentiles: &[f64]) -> SimilarityMatrix {
        let names: Vec<String> = (0..n).map(|i| format!("P{i}")).collect();
        let mut m = Array2::from_elem((n, n), value);
        for i in 0..n {
            m[[i, i]] = 1.0;
        }
        SimilarityMatrix::from_parts(names, m, percentiles).unwrap()
    }

    fn edge_weights(graph: &ProteinGraph) -> HashMap<(String, String), u32> {
        graph
            .edge_references()
            .map(|e| {
                let mut pair = [
                    graph[e.source()].clone(),
                    graph[e.target()].clone(),
                ];
                pair.sort();
                ((pair[0].clone(), pair[1].clone()), *e.weight())
            })
            .collect()
    }

    #[test]
    fn test_uniform_similarity_gives_uniform_weight() {
        // Every pair sits exactly at both cutoffs of both matrices.
        let pids = ids(&["P0", "P1", "P2"]);
        let m0 = uniform_matrix(3, 0.9, &[95.0, 90.0]);
        let m1 = uniform_matrix(3, 0.9, &[95.0, 90.0]);
        let graph = build(&pids, &[m0, m1]).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        for (_, w) in edge_weights(&graph) {
            assert_eq!(w, 4);
        }
    }

    #[test]
    fn test_extra_satisfied_cutoff_adds_exactly_one() {
        let pids = ids(&["P0", "P1", "P2"]);
        let one_cutoff = uniform_matrix(3, 0.9, &[90.0]);
        let two_cutoffs = uniform_matrix(3, 0.9, &[95.0, 90.0]);

        let g1 = build(&pids, &[one_cutoff]).unwrap();
        let g2 = build(&pids, &[two_cutoffs]).unwrap();

        let w1 = edge_weights(&g1);
        let w2 = edge_weights(&g2);
        for (pair, w) in &w1 {
            assert_eq!(w2[pair], w + 1);
        }
    }

    #[test]
    fn test_no_self_loops() {
        let pids = ids(&["P0", "P1", "P2", "P3"]);
        let m = uniform_matrix(4, 1.0, &[95.0, 90.0]);
        let graph = build(&pids, &[m]).unwrap();
        for e in graph.edge_references() {
            assert_ne!(e.source(), e.target());
        }
    }

    #[test]
    fn test_input_order_does_not_change_edges() {
        let m = uniform_matrix(4, 0.5, &[75.0]);
        let forward = ids(&["P0", "P1", "P2", "P3"]);
        let shuffled = ids(&["P3", "P1", "P0", "P2"]);

        let g1 = build(&forward, &[m.clone()]).unwrap();
        let g2 = build(&shuffled, &[m]).unwrap();
        assert_eq!(edge_weights(&g1), edge_weights(&g2));
    }

    #[test]
    fn test_subset_of_larger_universe() {
        let m = uniform_matrix(6, 0.8, &[90.0]);
        let pids = ids(&["P1", "P4"]);
        let graph = build(&pids, &[m]).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_unknown_protein_fails_loudly() {
        let m = uniform_matrix(3, 0.8, &[90.0]);
        let pids = ids(&["P0", "MISSING"]);
        assert!(matches!(
            build(&pids, &[m]),
            Err(Error::UnknownProtein { .. })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let m = uniform_matrix(3, 0.8, &[90.0]);
        assert!(matches!(build(&[], &[m]), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_below_cutoff_pairs_get_no_edge() {
        // Distinct values: only the top pair survives a high percentile.
        let names = ids(&["A", "B", "C"]);
        let mut values = Array2::from_elem((3, 3), 0.0);
        values[[0, 1]] = 0.2;
        values[[1, 0]] = 0.2;
        values[[0, 2]] = 0.4;
        values[[2, 0]] = 0.4;
        values[[1, 2]] = 0.9;
        values[[2, 1]] = 0.9;
        let m = SimilarityMatrix::from_parts(names.clone(), values, &[100.0]).unwrap();

        let graph = build(&names, &[m]).unwrap();
        let weights = edge_weights(&graph);
        assert_eq!(weights.len(), 1);
        assert_eq!(weights[&("B".to_string(), "C".to_string())], 1);
    }
}
