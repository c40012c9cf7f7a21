//! Predictive-quality metrics.
//!
//! Evaluator implementations gate communities and grid-search tasks on
//! cross-validated AUROC; this module provides the reference
//! computation they share.
//!
//! # Example
//!
//! ```rust
//! use guild::metrics::auroc;
//!
//! let labels = [true, true, false, false];
//! let scores = [0.9, 0.8, 0.3, 0.1];
//! assert_eq!(auroc(&labels, &scores), Some(1.0));
//! ```

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic.
///
/// Ties in `scores` receive their average rank, so tied
/// positive/negative pairs contribute 0.5 each.
///
/// Returns `None` when the labels are single-class (AUROC is undefined)
/// or when the two slices differ in length. A `None` here means "not
/// evaluable", mirroring the null-AUROC convention of
/// [`TaskEvaluation`](crate::task::TaskEvaluation).
pub fn auroc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    if labels.len() != scores.len() || labels.is_empty() {
        return None;
    }
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over tie groups, then sum the positive ranks.
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share the average.
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos_f = n_pos as f64;
    let u = rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Some(u / (n_pos_f * n_neg as f64))
}
