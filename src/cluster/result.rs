//! Finished clusterings and the sequential partial-result merge.
//!
//! A [`ClusteringResult`] is an ordered list of [`Cluster`]s. Order is creation
//! order and carries no meaning. Membership is decided by the same rule
//! everywhere in the crate:
//!
//! ```text
//! join the FIRST cluster c (in list order) with ‖mode - c.mode‖ < threshold
//! otherwise create a new cluster
//! ```
//!
//! "First", not "closest": a mode that lies within tolerance of two clusters
//! joins the older one.
//!
//! # Merging Partial Results
//!
//! When workers keep private results, [`ClusteringResult::merge`] folds one into
//! another cluster-by-cluster with the same rule. Folding worker results in
//! index order (0 absorbs 1, then 2, ...) is deterministic for a given sharding,
//! but a mode near the tolerance boundary can land differently than it would
//! under a different shard layout.

use crate::vector::Vector;
use log::debug;

/// One mode and the points that converged to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    mode: Vector,
    indices: Vec<usize>,
    members: Vec<Vector>,
}

impl Cluster {
    /// New cluster whose only member is `point` (dataset index `index`).
    pub fn new(mode: Vector, index: usize, point: Vector) -> Self {
        Self {
            mode,
            indices: vec![index],
            members: vec![point],
        }
    }

    /// Representative mode, fixed at creation.
    pub fn mode(&self) -> &Vector {
        &self.mode
    }

    /// Member points, in insertion order.
    pub fn members(&self) -> &[Vector] {
        &self.members
    }

    /// Dataset indices of the members, parallel to [`members`](Self::members).
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Member count.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn push(&mut self, index: usize, point: Vector) {
        self.indices.push(index);
        self.members.push(point);
    }

    pub(crate) fn absorb(&mut self, other: Cluster) {
        self.indices.extend(other.indices);
        self.members.extend(other.members);
    }
}

/// Position of the first cluster whose mode is within `threshold` of `mode`.
pub(crate) fn first_within<'a, I>(modes: I, mode: &Vector, threshold: f64) -> Option<usize>
where
    I: IntoIterator<Item = &'a Vector>,
{
    modes
        .into_iter()
        .position(|m| mode.distance(m) < threshold)
}

/// Ordered collection of clusters produced by one MAC run.
#[derive(Debug, Clone)]
pub struct ClusteringResult {
    clusters: Vec<Cluster>,
    mode_threshold: f64,
}

impl ClusteringResult {
    /// Empty result that will match modes within `mode_threshold`.
    pub fn new(mode_threshold: f64) -> Self {
        Self {
            clusters: Vec::new(),
            mode_threshold,
        }
    }

    pub(crate) fn from_clusters(clusters: Vec<Cluster>, mode_threshold: f64) -> Self {
        Self {
            clusters,
            mode_threshold,
        }
    }

    /// Clusters in creation order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Consume into the cluster list.
    pub fn into_clusters(self) -> Vec<Cluster> {
        self.clusters
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True when there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Mode-equivalence tolerance.
    pub fn mode_threshold(&self) -> f64 {
        self.mode_threshold
    }

    /// Cluster modes in order.
    pub fn modes(&self) -> impl Iterator<Item = &Vector> + '_ {
        self.clusters.iter().map(Cluster::mode)
    }

    /// Sum of cluster sizes.
    pub fn total_members(&self) -> usize {
        self.clusters.iter().map(Cluster::size).sum()
    }

    /// Position of the cluster that `mode` would join.
    pub fn find(&self, mode: &Vector) -> Option<usize> {
        first_within(self.modes(), mode, self.mode_threshold)
    }

    /// Add one (point, mode) pair without any locking.
    pub fn insert(&mut self, index: usize, point: Vector, mode: Vector) {
        match self.find(&mode) {
            Some(pos) => self.clusters[pos].push(index, point),
            None => self.clusters.push(Cluster::new(mode, index, point)),
        }
    }

    /// Fold `other` into `self`, cluster by cluster.
    pub fn merge(&mut self, other: ClusteringResult) {
        for cluster in other.clusters {
            match self.find(&cluster.mode) {
                Some(pos) => self.clusters[pos].absorb(cluster),
                None => self.clusters.push(cluster),
            }
        }
    }

    /// Cluster position of every dataset index in `0..n`.
    ///
    /// Returns `None` unless each index appears in exactly one cluster.
    pub fn labels(&self, n: usize) -> Option<Vec<usize>> {
        let mut labels = vec![usize::MAX; n];
        for (label, cluster) in self.clusters.iter().enumerate() {
            for &i in cluster.indices() {
                let slot = labels.get_mut(i)?;
                if *slot != usize::MAX {
                    return None;
                }
                *slot = label;
            }
        }
        if labels.contains(&usize::MAX) {
            return None;
        }
        Some(labels)
    }

    /// Smallest distance between two distinct cluster modes.
    pub fn min_mode_separation(&self) -> Option<f64> {
        let mut best: Option<f64> = None;
        for (i, a) in self.clusters.iter().enumerate() {
            for b in &self.clusters[i + 1..] {
                let d = a.mode.distance(&b.mode);
                best = Some(best.map_or(d, |m| m.min(d)));
            }
        }
        best
    }
}

/// Fold per-worker results in order: the first absorbs the second, then the
/// third, and so on.
pub fn merge_in_order<I>(partials: I, mode_threshold: f64) -> ClusteringResult
where
    I: IntoIterator<Item = ClusteringResult>,
{
    let mut merged = ClusteringResult::new(mode_threshold);
    for (worker, partial) in partials.into_iter().enumerate() {
        debug!(
            "merging {} clusters from worker {} into {}",
            partial.len(),
            worker,
            merged.len()
        );
        merged.merge(partial);
    }
    merged
}

#[cfg(feature = "serde")]
mod json {
    use super::{Cluster, ClusteringResult};
    use serde::ser::{Serialize, SerializeStruct, Serializer};

    impl Serialize for Cluster {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut s = serializer.serialize_struct("Cluster", 3)?;
            s.serialize_field("mode", &self.mode)?;
            s.serialize_field("members", &self.members)?;
            s.serialize_field("size", &self.size())?;
            s.end()
        }
    }

    impl Serialize for ClusteringResult {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut s = serializer.serialize_struct("ClusteringResult", 2)?;
            s.serialize_field("clusters", &self.clusters)?;
            s.serialize_field("count", &self.clusters.len())?;
            s.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(coords: &[f64]) -> Vector {
        Vector::from(coords.to_vec())
    }

    #[test]
    fn test_insert_joins_within_threshold() {
        let mut r = ClusteringResult::new(0.01);
        r.insert(0, v(&[0.0, 0.0]), v(&[1.0, 1.0]));
        r.insert(1, v(&[0.1, 0.0]), v(&[1.005, 1.0]));
        r.insert(2, v(&[5.0, 5.0]), v(&[4.0, 4.0]));

        assert_eq!(r.len(), 2);
        assert_eq!(r.clusters()[0].indices(), &[0, 1]);
        assert_eq!(r.clusters()[1].indices(), &[2]);
        // Mode is the first one seen, not an average.
        assert_eq!(r.clusters()[0].mode(), &v(&[1.0, 1.0]));
    }

    #[test]
    fn test_insert_first_match_wins_not_closest() {
        let mut r = ClusteringResult::new(0.01);
        r.insert(0, v(&[0.0]), v(&[0.0]));
        r.insert(1, v(&[0.0]), v(&[0.015]));
        assert_eq!(r.len(), 2);

        // Within tolerance of both; closer to the second.
        r.insert(2, v(&[0.0]), v(&[0.009]));
        assert_eq!(r.clusters()[0].indices(), &[0, 2]);
        assert_eq!(r.clusters()[1].indices(), &[1]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut r = ClusteringResult::new(0.5);
        r.insert(0, v(&[0.0]), v(&[0.0]));
        r.insert(1, v(&[0.0]), v(&[0.5]));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_merge_folds_matching_and_appends_rest() {
        let mut a = ClusteringResult::new(0.01);
        a.insert(0, v(&[0.0]), v(&[0.0]));
        a.insert(1, v(&[9.0]), v(&[10.0]));

        let mut b = ClusteringResult::new(0.01);
        b.insert(2, v(&[0.1]), v(&[0.001]));
        b.insert(3, v(&[20.0]), v(&[20.0]));
        b.insert(4, v(&[19.0]), v(&[20.002]));

        a.merge(b);

        assert_eq!(a.len(), 3);
        assert_eq!(a.clusters()[0].indices(), &[0, 2]);
        assert_eq!(a.clusters()[1].indices(), &[1]);
        assert_eq!(a.clusters()[2].indices(), &[3, 4]);
        assert_eq!(a.clusters()[2].mode(), &v(&[20.0]));
        assert_eq!(a.total_members(), 5);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut a = ClusteringResult::new(0.01);
        let mut b = ClusteringResult::new(0.01);
        b.insert(0, v(&[1.0]), v(&[1.0]));
        a.merge(b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_merge_in_order_is_worker_ordered() {
        // Worker 1 and worker 2 both hold modes within tolerance of a mode
        // worker 0 lacks; worker 1's version becomes the representative.
        let mut w0 = ClusteringResult::new(0.01);
        w0.insert(0, v(&[0.0]), v(&[0.0]));
        let mut w1 = ClusteringResult::new(0.01);
        w1.insert(1, v(&[5.0]), v(&[5.004]));
        let mut w2 = ClusteringResult::new(0.01);
        w2.insert(2, v(&[5.0]), v(&[4.998]));
        w2.insert(3, v(&[0.0]), v(&[0.002]));

        let merged = merge_in_order(vec![w0, w1, w2], 0.01);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.clusters()[0].indices(), &[0, 3]);
        assert_eq!(merged.clusters()[1].indices(), &[1, 2]);
        assert_eq!(merged.clusters()[1].mode(), &v(&[5.004]));
    }

    #[test]
    fn test_merge_in_order_empty() {
        let merged = merge_in_order(Vec::new(), 0.01);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_labels_require_exact_cover() {
        let mut r = ClusteringResult::new(0.01);
        r.insert(0, v(&[0.0]), v(&[0.0]));
        r.insert(2, v(&[0.0]), v(&[0.0]));
        r.insert(1, v(&[5.0]), v(&[5.0]));

        assert_eq!(r.labels(3), Some(vec![0, 1, 0]));
        // Index 3 missing
        assert_eq!(r.labels(4), None);
        // Index 2 outside 0..2
        assert_eq!(r.labels(2), None);

        // Duplicate index
        r.insert(1, v(&[5.0]), v(&[5.0]));
        assert_eq!(r.labels(3), None);
    }

    #[test]
    fn test_min_mode_separation() {
        let mut r = ClusteringResult::new(0.01);
        assert_eq!(r.min_mode_separation(), None);
        r.insert(0, v(&[0.0]), v(&[0.0]));
        r.insert(1, v(&[0.0]), v(&[3.0]));
        r.insert(2, v(&[0.0]), v(&[1.0]));
        assert_eq!(r.min_mode_separation(), Some(1.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_shape() -> crate::Result<()> {
        let mut r = ClusteringResult::new(0.01);
        r.insert(0, v(&[0.0, 1.0]), v(&[0.5, 0.5]));
        r.insert(1, v(&[1.0, 0.0]), v(&[0.5, 0.5]));

        let value = serde_json::to_value(&r)?;
        assert_eq!(
            value,
            serde_json::json!({
                "clusters": [{
                    "mode": [0.5, 0.5],
                    "members": [[0.0, 1.0], [1.0, 0.0]],
                    "size": 2
                }],
                "count": 1
            })
        );
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_empty() -> crate::Result<()> {
        let r = ClusteringResult::new(0.01);
        assert_eq!(serde_json::to_string(&r)?, r#"{"clusters":[],"count":0}"#);
        Ok(())
    }
}
