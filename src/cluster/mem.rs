//! Mean-shift mode seeking (MEM).
//!
//! Starting from a point, repeatedly move to the Gaussian-kernel-weighted
//! centroid of the whole dataset until the move is small. The fixed point is a
//! local maximum (mode) of the kernel density estimate:
//!
//! ```text
//! w_i   = exp(-½ (‖x - x_i‖ / σ)²)
//! x'    = Σ w_i x_i / Σ w_i
//! stop when ‖x' - x‖ ≤ ε σ
//! ```
//!
//! where σ is the bandwidth and ε the convergence factor.
//!
//! # Cost
//!
//! Each iteration touches every point once: O(N·D). A full MAC run calls this
//! once per point, so it dominates the total O(N²·D·K) cost.
//!
//! # Failure Modes
//!
//! - **Tiny σ**: if every weight underflows to zero the centroid is undefined.
//!   This is reported as [`Error::BandwidthUnderflow`] rather than producing NaN.
//! - **Slow convergence**: there is no iteration cap by default. Set one with
//!   [`ModeSeeker::with_max_iter`] to turn a runaway seek into
//!   [`Error::ConvergenceFailure`].

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::vector::{squared_distance, Vector};
use log::trace;
use ndarray::ArrayView1;

/// Default step tolerance, as a fraction of σ.
pub const DEFAULT_CONVERGENCE_FACTOR: f64 = 1e-4;

/// Mean-shift iteration with a Gaussian kernel.
#[derive(Debug, Clone)]
pub struct ModeSeeker {
    /// Kernel bandwidth.
    sigma: f64,
    /// Step tolerance as a fraction of `sigma`.
    convergence_factor: f64,
    /// Optional iteration cap.
    max_iter: Option<usize>,
}

impl ModeSeeker {
    /// Create a seeker with bandwidth `sigma`.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            convergence_factor: DEFAULT_CONVERGENCE_FACTOR,
            max_iter: None,
        }
    }

    /// Set the convergence factor.
    pub fn with_convergence_factor(mut self, factor: f64) -> Self {
        self.convergence_factor = factor;
        self
    }

    /// Cap the number of iterations per seek.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    /// Bandwidth.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Convergence factor.
    pub fn convergence_factor(&self) -> f64 {
        self.convergence_factor
    }

    /// Check parameters without touching data.
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(Error::InvalidBandwidth { sigma: self.sigma });
        }
        if !(self.convergence_factor > 0.0 && self.convergence_factor.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "convergence_factor",
                message: "must be positive and finite",
            });
        }
        if self.max_iter == Some(0) {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Climb from `start` to a local mode of `dataset`.
    ///
    /// Returns `Ok(None)` for an empty dataset.
    pub fn seek(&self, dataset: &Dataset, start: ArrayView1<'_, f64>) -> Result<Option<Vector>> {
        self.validate()?;
        if dataset.is_empty() {
            return Ok(None);
        }
        if start.len() != dataset.dim() {
            return Err(Error::DimensionMismatch {
                expected: dataset.dim(),
                found: start.len(),
                index: 0,
            });
        }

        let bound = self.convergence_factor * self.sigma;
        let mut weights = vec![0.0; dataset.len()];
        let mut current = Vector::from(start);
        let mut next = Vector::zeros(dataset.dim());
        let mut iterations = 0usize;

        loop {
            if let Some(max) = self.max_iter {
                if iterations >= max {
                    return Err(Error::ConvergenceFailure { iterations });
                }
            }

            let step = self.step_into(dataset, &current, &mut next, &mut weights)?;
            std::mem::swap(&mut current, &mut next);
            iterations += 1;

            if step <= bound {
                break;
            }
        }

        trace!("seek converged after {} iterations", iterations);
        Ok(Some(current))
    }

    /// One mean-shift update from `at`, returning the new centroid.
    pub fn shift(&self, dataset: &Dataset, at: &Vector) -> Result<Vector> {
        self.validate()?;
        if dataset.is_empty() {
            return Ok(at.clone());
        }
        let mut weights = vec![0.0; dataset.len()];
        let mut next = Vector::zeros(dataset.dim());
        self.step_into(dataset, at, &mut next, &mut weights)?;
        Ok(next)
    }

    /// Write the weighted centroid around `current` into `next` and return the
    /// step length. `weights` must have one slot per point.
    fn step_into(
        &self,
        dataset: &Dataset,
        current: &Vector,
        next: &mut Vector,
        weights: &mut [f64],
    ) -> Result<f64> {
        let sigma_sq = self.sigma * self.sigma;

        let mut total = 0.0;
        for (w, x) in weights.iter_mut().zip(dataset.rows()) {
            *w = (-0.5 * squared_distance(current.view(), x) / sigma_sq).exp();
            total += *w;
        }

        if !(total > 0.0 && total.is_finite()) {
            return Err(Error::BandwidthUnderflow { sigma: self.sigma });
        }

        next.fill(0.0);
        for (&w, x) in weights.iter().zip(dataset.rows()) {
            next.add_scaled(w / total, x);
        }

        Ok(current.distance(next))
    }
}

/// Seek a mode with default convergence settings.
pub fn seek(dataset: &Dataset, start: ArrayView1<'_, f64>, sigma: f64) -> Result<Option<Vector>> {
    ModeSeeker::new(sigma).seek(dataset, start)
}
