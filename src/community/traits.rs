//! Community detection seam.

use petgraph::graph::UnGraph;

use crate::error::Result;

/// Trait for community detection over weighted undirected graphs.
///
/// Edge weights are read through `Into<f64>`, so integer-weighted
/// similarity graphs and float-weighted graphs both qualify.
pub trait CommunityDetection {
    /// Partition the graph nodes.
    ///
    /// Returns one community id per node, indexed by node index, with
    /// ids renumbered to consecutive integers starting at 0.
    fn detect<N, E: Copy + Into<f64>>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>>;

    /// Resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}
