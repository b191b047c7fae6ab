//! Concurrent cluster aggregation.
//!
//! Workers push `(point, mode)` pairs into one shared [`ClusterAggregator`] as
//! soon as each seek finishes. Insertion is double-checked:
//!
//! 1. **Read lock** the cluster list, scan for the first mode within tolerance,
//!    release.
//! 2. Hit: append under that cluster's own mutex. The list lock is not held.
//! 3. Miss: **write lock** the list and scan again, since another worker may
//!    have created a matching cluster in between. Append on a hit, otherwise
//!    push a new cluster.
//!
//! The common case (joining an existing mode) only ever takes the shared lock,
//! so workers contend on individual clusters rather than the whole list.
//!
//! # Known Limitation
//!
//! Membership is online and order sensitive. Two modes that are each just
//! outside tolerance of one another both become clusters, even if a third mode
//! arriving later would have bridged them. Under concurrency, which of two
//! nearby modes is created first depends on scheduling.

use super::result::{first_within, Cluster, ClusteringResult};
use crate::vector::Vector;
use log::trace;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// What [`ClusterAggregator::insert`] did with a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Joined a cluster found under the shared lock.
    Joined,
    /// Missed under the shared lock, then found a cluster created in between.
    JoinedOnRecheck,
    /// Started a new cluster.
    Created,
}

#[derive(Debug)]
struct SharedCluster {
    /// Copy of the cluster's mode, readable without taking `cluster`'s lock.
    mode: Vector,
    cluster: Mutex<Cluster>,
}

impl SharedCluster {
    fn new(mode: Vector, index: usize, point: Vector) -> Self {
        Self {
            cluster: Mutex::new(Cluster::new(mode.clone(), index, point)),
            mode,
        }
    }
}

/// Thread-safe clustering under construction.
#[derive(Debug)]
pub struct ClusterAggregator {
    clusters: RwLock<Vec<Arc<SharedCluster>>>,
    mode_threshold: f64,
}

impl ClusterAggregator {
    /// Empty aggregator matching modes within `mode_threshold`.
    pub fn new(mode_threshold: f64) -> Self {
        Self {
            clusters: RwLock::new(Vec::new()),
            mode_threshold,
        }
    }

    /// Mode-equivalence tolerance.
    pub fn mode_threshold(&self) -> f64 {
        self.mode_threshold
    }

    /// Number of clusters created so far.
    pub fn len(&self) -> usize {
        self.clusters.read().len()
    }

    /// True when no cluster exists yet.
    pub fn is_empty(&self) -> bool {
        self.clusters.read().is_empty()
    }

    fn find(&self, clusters: &[Arc<SharedCluster>], mode: &Vector) -> Option<usize> {
        first_within(clusters.iter().map(|c| &c.mode), mode, self.mode_threshold)
    }

    /// Record that dataset point `index` converged to `mode`.
    ///
    /// Safe to call from any number of threads at once.
    pub fn insert(&self, index: usize, point: Vector, mode: Vector) -> Insertion {
        let hit = {
            let clusters = self.clusters.read();
            self.find(&clusters, &mode).map(|pos| Arc::clone(&clusters[pos]))
        };

        if let Some(shared) = hit {
            shared.cluster.lock().push(index, point);
            return Insertion::Joined;
        }

        let mut clusters = self.clusters.write();
        if let Some(pos) = self.find(&clusters, &mode) {
            clusters[pos].cluster.lock().push(index, point);
            return Insertion::JoinedOnRecheck;
        }

        trace!("creating cluster {} for point {}", clusters.len(), index);
        clusters.push(Arc::new(SharedCluster::new(mode, index, point)));
        Insertion::Created
    }

    /// Copy of the current clusters.
    ///
    /// Only consistent once no insert is in flight.
    pub fn snapshot(&self) -> ClusteringResult {
        let clusters = self
            .clusters
            .read()
            .iter()
            .map(|shared| shared.cluster.lock().clone())
            .collect();
        ClusteringResult::from_clusters(clusters, self.mode_threshold)
    }

    /// Finish aggregation.
    pub fn into_result(self) -> ClusteringResult {
        let clusters = self
            .clusters
            .into_inner()
            .into_iter()
            .map(|shared| match Arc::try_unwrap(shared) {
                Ok(owned) => owned.cluster.into_inner(),
                Err(still_shared) => still_shared.cluster.lock().clone(),
            })
            .collect();
        ClusteringResult::from_clusters(clusters, self.mode_threshold)
    }
}
