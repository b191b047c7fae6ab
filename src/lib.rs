//! # modalclust
//!
//! Modal Association Clustering: group points by the kernel-density mode each
//! one climbs to under mean shift, with the per-point climbs spread across a
//! fixed pool of worker threads.
//!
//! ```rust
//! use modalclust::compute_mac;
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![0.05, -0.05],
//!     vec![10.0, 10.0],
//!     vec![10.1, 9.9],
//! ];
//!
//! let result = compute_mac(&data, 0.5, 2).unwrap();
//! assert_eq!(result.len(), 2);
//! ```
//!
//! Tuning beyond bandwidth and worker count goes through [`Mac`].

pub mod cluster;
pub mod dataset;
/// Error types used across `modalclust`.
pub mod error;
pub mod io;
pub mod metrics;
pub mod vector;


pub use cluster::{
    compute_mac, Aggregation, CancelToken, Cluster, ClusterAggregator, Clustering,
    ClusteringResult, Distribution, Mac, ModeSeeker, DEFAULT_CONVERGENCE_FACTOR,
    DEFAULT_MODE_THRESHOLD,
};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use metrics::{ari, match_modes, ModeMatching};
pub use vector::Vector;
