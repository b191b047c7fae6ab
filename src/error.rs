use thiserror::Error;

/// Result alias for `modalclust`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by mode seeking, aggregation, and data loading.
#[derive(Debug, Error)]
pub enum Error {
    /// Kernel bandwidth was zero, negative, or not finite.
    #[error("invalid bandwidth: sigma must be positive and finite, got {sigma}")]
    InvalidBandwidth {
        /// Offending bandwidth.
        sigma: f64,
    },

    /// Worker count was zero.
    #[error("invalid parallelism: need at least one worker, got {requested}")]
    InvalidParallelism {
        /// Requested worker count.
        requested: usize,
    },

    /// A point's dimension differs from the first point's.
    #[error("dimension mismatch at point {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
        /// Index of the offending point.
        index: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate at point {index}, component {component}")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
        /// Position of the bad value within the point.
        component: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Mode seeking hit its iteration cap before the step fell below tolerance.
    #[error("mode seeking did not converge after {iterations} iterations")]
    ConvergenceFailure {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Every kernel weight underflowed to zero, so the centroid is undefined.
    #[error("kernel weights underflowed for sigma {sigma}; bandwidth is too small for the data scale")]
    BandwidthUnderflow {
        /// Bandwidth in use.
        sigma: f64,
    },

    /// The run was cancelled before every point was clustered.
    #[error("clustering cancelled before all points were processed")]
    Cancelled,

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Malformed input row.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: u64,
        /// What went wrong.
        message: String,
    },

    /// I/O failure while reading input.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV framing failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON encoding failure.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_parameter() {
        let err = Error::InvalidParameter {
            name: "mode_threshold",
            message: "must be positive",
        };
        let s = err.to_string();
        assert!(s.contains("mode_threshold"));
        assert!(s.contains("must be positive"));
    }

    #[test]
    fn test_display_parse_error_has_line() {
        let err = Error::Parse {
            line: 7,
            message: "bad float".into(),
        };
        assert_eq!(err.to_string(), "parse error on line 7: bad float");
    }
}
