//! Clustering traits.

use crate::error::Result;

/// Hard-assignment clustering.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per input point. Labels are
    /// positions in the fitted cluster list and carry no other meaning.
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>>;

    /// Number of clusters, or 0 when it is only known after fitting.
    fn n_clusters(&self) -> usize;
}
