//! Modal association clustering.
//!
//! MAC groups points by the density mode they climb to. Unlike K-means, the
//! number of clusters is not an input: it falls out of the bandwidth σ.
//!
//! ## The Idea
//!
//! Put a Gaussian bump of width σ on every point. The sum is a smooth density
//! estimate with a handful of peaks (modes). Starting at each point, hill-climb
//! with mean shift until you stop moving. Points that reach the same peak form
//! a cluster.
//!
//! ```text
//! density
//!   │      ╭─╮                 ╭──╮
//!   │     ╭╯ ╰╮               ╭╯  ╰╮
//!   │  ╭──╯   ╰──╮       ╭────╯    ╰──╮
//!   └──●─●──●──●─●───────●──●───●──●──●──► x
//!       cluster A              cluster B
//! ```
//!
//! ## Pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ModeSeeker`] | Mean-shift iteration from one start point |
//! | [`WorkSource`] | Hands each point index to exactly one worker |
//! | [`ClusterAggregator`] | Concurrent first-match cluster list |
//! | [`merge_in_order`] | Sequential merge of per-worker results |
//! | [`Mac`] | Parameter validation and the worker pool |
//!
//! ## Choosing σ
//!
//! - Too small: every point is its own mode (and far-away starts underflow).
//! - Too large: everything merges into one mode.
//! - Start near the typical nearest-neighbour distance inside a cluster.
//!
//! ## Usage
//!
//! ```rust
//! use modalclust::cluster::{Clustering, Mac};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Mac::new(0.5).with_parallelism(2).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! ```

mod aggregate;
mod distribute;
mod mac;
mod mem;
mod result;
mod traits;

pub use aggregate::{ClusterAggregator, Insertion};
pub use distribute::{
    distribute, BoundedQueue, CancelToken, Claims, Distribution, SharedCursor, StaticShards,
    WorkSource,
};
pub use mac::{compute_mac, default_parallelism, Aggregation, Mac, DEFAULT_MODE_THRESHOLD};
pub use mem::{seek, ModeSeeker, DEFAULT_CONVERGENCE_FACTOR};
pub use result::{merge_in_order, Cluster, ClusteringResult};
pub use traits::Clustering;
