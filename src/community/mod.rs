//! Graph partitioning with predictive-quality gating.
//!
//! Candidate communities are proposed by weighted modularity
//! optimization ([`Louvain`]), then each candidate must prove itself:
//! a model trained on the community's induced hit dataset has to
//! cross-validate at or above an AUROC cut, or the community is
//! dropped. The gate is injected as collaborator traits, so the
//! detector stays testable with stub evaluators.

mod detector;
mod louvain;
mod traits;

pub use detector::{ClusterOutcome, Community, CommunityDetector, RejectedCommunity};
pub use louvain::Louvain;
pub use traits::CommunityDetection;
