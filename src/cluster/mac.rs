//! Modal Association Clustering driver.
//!
//! Wires the pieces together:
//!
//! ```text
//! Dataset ──► WorkSource ──► W workers ──► ModeSeeker::seek(x_i)
//!                                   │
//!                                   ├─ Aggregation::Shared    ──► ClusterAggregator (concurrent)
//!                                   └─ Aggregation::PerWorker ──► private results ──► ordered merge
//! ```
//!
//! Workers run on a dedicated `rayon` pool of exactly W threads; each thread
//! runs one worker loop (`ThreadPool::broadcast`) that pulls indices until its
//! source is exhausted.
//!
//! # Failure
//!
//! The first worker error is kept, a per-run [`CancelToken`] is tripped so the
//! other workers stop claiming, and `fit` returns that error. The per-run token
//! is a child of the caller's token, so an external cancel stops the run but a
//! failed run leaves the caller's token untripped. A panicking
//! worker propagates the panic out of `fit`. Points are never silently dropped.
//!
//! # Tolerances
//!
//! The mean-shift stopping rule is relative (`convergence_factor * sigma`)
//! while the mode threshold is absolute. A seek stops once its step falls
//! below `convergence_factor * sigma`, which on a flat density can be far
//! from the true mode; starts that approach a plateau from different sides
//! then stop more than `mode_threshold` apart and one basin splits into
//! several clusters. This shows up at large sigma or on evenly spread data.
//! Keep `convergence_factor * sigma` well below `mode_threshold`, by
//! lowering [`Mac::with_convergence_factor`] or raising
//! [`Mac::with_mode_threshold`].
//!
//! # Determinism
//!
//! Seeks are independent, so modes do not depend on scheduling. Cluster
//! membership can: the first-match rule is online, and when two modes sit near
//! the tolerance boundary the cluster count may differ between parallelism
//! levels. With one worker and a fixed strategy the output is fully
//! deterministic.

use super::aggregate::ClusterAggregator;
use super::distribute::{distribute, CancelToken, Claims, Distribution, WorkSource};
use super::mem::ModeSeeker;
use super::result::{merge_in_order, ClusteringResult};
use super::traits::Clustering;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::vector::Vector;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::time::Instant;

/// Default tolerance under which two modes are the same cluster.
///
/// Absolute, unlike the sigma-relative convergence factor; see the module
/// docs on how the two interact.
pub const DEFAULT_MODE_THRESHOLD: f64 = 1e-2;

/// How workers combine their (point, mode) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// One concurrently updated [`ClusterAggregator`].
    #[default]
    Shared,
    /// A private result per worker, merged in worker order at the end.
    PerWorker,
}

/// Half the available hardware threads, at least one.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| (n.get() / 2).max(1))
        .unwrap_or(1)
}

/// Modal Association Clustering.
#[derive(Debug, Clone)]
pub struct Mac {
    /// Mean-shift settings (bandwidth, convergence, iteration cap).
    seeker: ModeSeeker,
    /// Worker count.
    parallelism: usize,
    /// Mode-equivalence tolerance.
    mode_threshold: f64,
    /// Index hand-out strategy.
    distribution: Distribution,
    /// Shared aggregator or per-worker merge.
    aggregation: Aggregation,
    /// External stop signal.
    cancel: Option<CancelToken>,
}

impl Mac {
    /// Create a clusterer with kernel bandwidth `sigma`.
    pub fn new(sigma: f64) -> Self {
        Self {
            seeker: ModeSeeker::new(sigma),
            parallelism: default_parallelism(),
            mode_threshold: DEFAULT_MODE_THRESHOLD,
            distribution: Distribution::default(),
            aggregation: Aggregation::default(),
            cancel: None,
        }
    }

    /// Set worker count.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set mode-equivalence tolerance.
    pub fn with_mode_threshold(mut self, threshold: f64) -> Self {
        self.mode_threshold = threshold;
        self
    }

    /// Set mean-shift convergence factor (fraction of sigma).
    pub fn with_convergence_factor(mut self, factor: f64) -> Self {
        self.seeker = self.seeker.with_convergence_factor(factor);
        self
    }

    /// Cap mean-shift iterations per point.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.seeker = self.seeker.with_max_iter(max_iter);
        self
    }

    /// Set work distribution strategy.
    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// Set aggregation mode.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Stop handing out points once `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bandwidth.
    pub fn sigma(&self) -> f64 {
        self.seeker.sigma()
    }

    /// Worker count.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Mode-equivalence tolerance.
    pub fn mode_threshold(&self) -> f64 {
        self.mode_threshold
    }

    /// Index hand-out strategy.
    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    /// Aggregation mode.
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Mean-shift settings.
    pub fn seeker(&self) -> &ModeSeeker {
        &self.seeker
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        self.seeker.validate()?;
        if self.parallelism == 0 {
            return Err(Error::InvalidParallelism {
                requested: self.parallelism,
            });
        }
        if !(self.mode_threshold > 0.0 && self.mode_threshold.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "mode_threshold",
                message: "must be positive and finite",
            });
        }
        if self.distribution == (Distribution::BoundedQueue { capacity: 0 }) {
            return Err(Error::InvalidParameter {
                name: "capacity",
                message: "queue capacity must be at least 1",
            });
        }
        Ok(())
    }

    /// Cluster `dataset`.
    ///
    /// An empty dataset yields an empty result.
    pub fn fit(&self, dataset: &Dataset) -> Result<ClusteringResult> {
        self.validate()?;
        if dataset.is_empty() {
            return Ok(ClusteringResult::new(self.mode_threshold));
        }

        let n = dataset.len();
        let workers = self.parallelism.min(n);
        // Worker failures trip only this run's token, never the caller's.
        let cancel = self.cancel.as_ref().map_or_else(CancelToken::new, CancelToken::child);
        let failure: Mutex<Option<Error>> = Mutex::new(None);

        info!(
            "MAC: N={}, D={}, sigma={}, workers={}",
            n,
            dataset.dim(),
            self.sigma(),
            workers
        );
        debug!(
            "MAC: distribution={:?}, aggregation={:?}, mode_threshold={}",
            self.distribution, self.aggregation, self.mode_threshold
        );
        let started = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("modalclust-{i}"))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        let result = match self.aggregation {
            Aggregation::Shared => {
                let aggregator = ClusterAggregator::new(self.mode_threshold);
                distribute(self.distribution, n, workers, cancel.clone(), |source| {
                    let _ = pool.broadcast(|ctx| {
                        self.work(ctx.index(), dataset, source, &cancel, &failure, |i, p, m| {
                            let _ = aggregator.insert(i, p, m);
                        })
                    });
                });
                aggregator.into_result()
            }
            Aggregation::PerWorker => {
                let partials = distribute(self.distribution, n, workers, cancel.clone(), |source| {
                    pool.broadcast(|ctx| {
                        let mut partial = ClusteringResult::new(self.mode_threshold);
                        self.work(ctx.index(), dataset, source, &cancel, &failure, |i, p, m| {
                            partial.insert(i, p, m)
                        });
                        partial
                    })
                });
                merge_in_order(partials, self.mode_threshold)
            }
        };

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        if result.total_members() < n {
            warn!(
                "MAC cancelled after {} of {} points",
                result.total_members(),
                n
            );
            return Err(Error::Cancelled);
        }

        info!(
            "MAC: {} clusters in {:.3?}",
            result.len(),
            started.elapsed()
        );
        Ok(result)
    }

    /// One worker loop: claim, seek, hand the pair to `sink`.
    fn work(
        &self,
        worker: usize,
        dataset: &Dataset,
        source: &dyn WorkSource,
        cancel: &CancelToken,
        failure: &Mutex<Option<Error>>,
        mut sink: impl FnMut(usize, Vector, Vector),
    ) {
        let mut processed = 0usize;
        for index in Claims::new(source, worker) {
            match self.seeker.seek(dataset, dataset.row(index)) {
                Ok(Some(mode)) => {
                    sink(index, dataset.point(index), mode);
                    processed += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!("worker {} failed on point {}: {}", worker, index, err);
                    cancel.cancel();
                    let _ = failure.lock().get_or_insert(err);
                    break;
                }
            }
        }
        debug!("worker {} processed {} points", worker, processed);
    }
}

impl Clustering for Mac {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        let dataset = Dataset::new(data)?;
        let result = self.fit(&dataset)?;

        let mut labels = vec![0usize; dataset.len()];
        for (label, cluster) in result.clusters().iter().enumerate() {
            for &i in cluster.indices() {
                labels[i] = label;
            }
        }
        Ok(labels)
    }

    /// MAC discovers clusters dynamically, so this returns 0.
    fn n_clusters(&self) -> usize {
        0
    }
}

/// Cluster `data` with bandwidth `sigma` on `parallelism` workers, using the
/// default tolerances.
pub fn compute_mac(data: &[Vec<f64>], sigma: f64, parallelism: usize) -> Result<ClusteringResult> {
    let mac = Mac::new(sigma).with_parallelism(parallelism);
    mac.validate()?;
    let dataset = Dataset::new(data)?;
    mac.fit(&dataset)
}
