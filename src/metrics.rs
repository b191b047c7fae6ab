//! Comparing clusterings.
//!
//! MAC is only weakly deterministic across parallelism levels: modes are
//! identical, but first-match membership can differ when two modes straddle
//! the tolerance. These helpers quantify how far two runs on the same data
//! agree.
//!
//! | Helper | Question |
//! |--------|----------|
//! | [`ari`] | Do the two label vectors partition points the same way? |
//! | [`match_modes`] | Which clusters correspond, and do their sizes agree? |
//!
//! # Example
//!
//! ```rust
//! use modalclust::metrics::ari;
//!
//! // Same partition, different label names
//! assert!((ari(&[0, 0, 1, 1], &[1, 1, 0, 0]) - 1.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use crate::cluster::ClusteringResult;
use std::collections::HashMap;

#[inline]
fn pairs(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (n * (n - 1) / 2) as f64
    }
}

/// Adjusted Rand Index between two labelings of the same points.
///
/// ```text
/// ARI = (Σ_ij C(n_ij,2) - E) / (½(Σ_i C(a_i,2) + Σ_j C(b_j,2)) - E)
/// E   = Σ_i C(a_i,2) · Σ_j C(b_j,2) / C(n,2)
/// ```
///
/// 1.0 for identical partitions (up to relabeling), about 0 for chance.
/// Returns 0.0 when the inputs differ in length or are empty.
pub fn ari(a: &[usize], b: &[usize]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut rows: HashMap<usize, usize> = HashMap::new();
    let mut cols: HashMap<usize, usize> = HashMap::new();
    for (&x, &y) in a.iter().zip(b) {
        *joint.entry((x, y)).or_default() += 1;
        *rows.entry(x).or_default() += 1;
        *cols.entry(y).or_default() += 1;
    }

    let index: f64 = joint.values().map(|&c| pairs(c)).sum();
    let sum_a: f64 = rows.values().map(|&c| pairs(c)).sum();
    let sum_b: f64 = cols.values().map(|&c| pairs(c)).sum();
    let total = pairs(a.len());

    if total == 0.0 {
        return 1.0;
    }

    let expected = sum_a * sum_b / total;
    let max_index = 0.5 * (sum_a + sum_b);
    let denom = max_index - expected;
    if denom.abs() < 1e-12 {
        // Both partitions are trivial (all singletons or one block) and equal.
        return if (index - expected).abs() < 1e-12 { 1.0 } else { 0.0 };
    }
    (index - expected) / denom
}

/// ARI between two results over dataset indices `0..n`.
///
/// `None` if either result does not cover `0..n` exactly once.
pub fn result_ari(a: &ClusteringResult, b: &ClusteringResult, n: usize) -> Option<f64> {
    Some(ari(&a.labels(n)?, &b.labels(n)?))
}

/// Cluster correspondence between two results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeMatching {
    /// `(i, j)`: cluster `i` of the first result matches cluster `j` of the second.
    pub matched: Vec<(usize, usize)>,
    /// Clusters of the first result with no partner.
    pub unmatched_left: Vec<usize>,
    /// Clusters of the second result with no partner.
    pub unmatched_right: Vec<usize>,
}

impl ModeMatching {
    /// True when every cluster found a partner.
    pub fn is_complete(&self) -> bool {
        self.unmatched_left.is_empty() && self.unmatched_right.is_empty()
    }
}

/// Greedily pair clusters whose modes are within `tolerance`, closest first.
///
/// Each cluster is used at most once.
pub fn match_modes(a: &ClusteringResult, b: &ClusteringResult, tolerance: f64) -> ModeMatching {
    let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
    for (i, ca) in a.clusters().iter().enumerate() {
        for (j, cb) in b.clusters().iter().enumerate() {
            let d = ca.mode().distance(cb.mode());
            if d < tolerance {
                candidates.push((d, i, j));
            }
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];
    let mut matched = Vec::new();
    for (_, i, j) in candidates {
        if !used_a[i] && !used_b[j] {
            used_a[i] = true;
            used_b[j] = true;
            matched.push((i, j));
        }
    }
    matched.sort_unstable();

    ModeMatching {
        matched,
        unmatched_left: (0..a.len()).filter(|&i| !used_a[i]).collect(),
        unmatched_right: (0..b.len()).filter(|&j| !used_b[j]).collect(),
    }
}
