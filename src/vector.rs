//! Dense numeric points.
//!
//! [`Vector`] is the single point type used throughout the crate. It wraps an
//! owned `ndarray::Array1<f64>` so dataset rows (borrowed as `ArrayView1`) and
//! owned modes share the same arithmetic without conversion.
//!
//! The arithmetic comes in two flavors:
//!
//! - **Pure**: [`Vector::scale`] and `&a + &b` return fresh vectors.
//! - **Accumulating**: [`Vector::add_scaled`] folds `s * x` into an existing
//!   buffer. The mean-shift loop uses this to avoid allocating per data point.
//!
//! Both give the same numbers; the second is only faster.

use ndarray::{Array1, ArrayView1};
use std::ops::Add;

/// Fixed-dimension point with Euclidean arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector(Array1<f64>);

impl Vector {
    /// All-zero vector of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self(Array1::zeros(dim))
    }

    /// Dimension.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Borrow as an `ndarray` view.
    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.0.view()
    }

    /// Copy coordinates out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Iterate coordinates.
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.0.iter()
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Vector) -> f64 {
        distance(self.view(), other.view())
    }

    /// Elementwise multiply by `s`, returning a new vector.
    pub fn scale(&self, s: f64) -> Vector {
        Vector(&self.0 * s)
    }

    /// In-place `self += s * other`.
    #[inline]
    pub fn add_scaled(&mut self, s: f64, other: ArrayView1<'_, f64>) {
        self.0.scaled_add(s, &other);
    }

    /// Overwrite every coordinate with `value`.
    pub fn fill(&mut self, value: f64) {
        self.0.fill(value);
    }
}

impl Add<&Vector> for &Vector {
    type Output = Vector;

    fn add(self, rhs: &Vector) -> Vector {
        Vector(&self.0 + &rhs.0)
    }
}

impl From<Vec<f64>> for Vector {
    fn from(coords: Vec<f64>) -> Self {
        Self(Array1::from_vec(coords))
    }
}

impl From<ArrayView1<'_, f64>> for Vector {
    fn from(view: ArrayView1<'_, f64>) -> Self {
        Self(view.to_owned())
    }
}

impl From<Array1<f64>> for Vector {
    fn from(arr: Array1<f64>) -> Self {
        Self(arr)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Vector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Squared Euclidean distance between two views of equal length.
#[inline]
pub fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance between two views of equal length.
#[inline]
pub fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_basic() {
        let a = Vector::from(vec![0.0, 0.0, 0.0]);
        let b = Vector::from(vec![1.0, 1.0, 1.0]);
        assert_relative_eq!(a.distance(&b), 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_distance_identity_and_symmetry() {
        let a = Vector::from(vec![3.5, -2.1, 4.8]);
        let b = Vector::from(vec![-1.0, 0.5, 2.0]);
        assert_eq!(a.distance(&a), 0.0);
        assert_relative_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn test_scale_and_add_are_pure() {
        let a = Vector::from(vec![1.0, 2.0]);
        let b = Vector::from(vec![0.5, -1.0]);

        let scaled = a.scale(2.0);
        let sum = &a + &b;

        assert_eq!(scaled.to_vec(), vec![2.0, 4.0]);
        assert_eq!(sum.to_vec(), vec![1.5, 1.0]);
        // Inputs untouched
        assert_eq!(a.to_vec(), vec![1.0, 2.0]);
        assert_eq!(b.to_vec(), vec![0.5, -1.0]);
    }

    #[test]
    fn test_add_scaled_matches_pure_form() {
        let acc = Vector::from(vec![1.0, 1.0, 1.0]);
        let x = Vector::from(vec![2.0, -4.0, 0.5]);

        let pure = &acc + &x.scale(0.25);

        let mut fast = acc.clone();
        fast.add_scaled(0.25, x.view());

        for (p, f) in pure.iter().zip(fast.iter()) {
            assert_relative_eq!(*p, *f, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_fill_resets_accumulator() {
        let mut v = Vector::from(vec![4.0, 5.0]);
        v.fill(0.0);
        assert_eq!(v, Vector::zeros(2));
    }
}
