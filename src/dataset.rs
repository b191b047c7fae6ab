//! Validated, read-only point collections.

use crate::error::{Error, Result};
use crate::vector::Vector;
use ndarray::{Array2, ArrayView1, Axis};

/// N points of identical dimension D, stored row-major.
///
/// Built once, then shared by reference across workers. Every row has the
/// same length; construction is the only place that is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Array2<f64>,
}

impl Dataset {
    /// Build from row vectors, rejecting ragged input and NaN or infinite
    /// coordinates.
    ///
    /// An empty slice yields an empty dataset (N = 0, D = 0).
    pub fn new(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::empty());
        };
        let n = rows.len();
        let d = first.len();

        let mut flat: Vec<f64> = Vec::with_capacity(n * d);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                    index,
                });
            }
            if let Some(component) = row.iter().position(|x| !x.is_finite()) {
                return Err(Error::NonFiniteCoordinate { index, component });
            }
            flat.extend_from_slice(row);
        }

        let data = Array2::from_shape_vec((n, d), flat).map_err(|_| Error::InvalidParameter {
            name: "rows",
            message: "could not be laid out as an N x D matrix",
        })?;
        Ok(Self { data })
    }

    /// Wrap an existing N x D matrix.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        for (index, row) in data.axis_iter(Axis(0)).enumerate() {
            if let Some(component) = row.iter().position(|x| !x.is_finite()) {
                return Err(Error::NonFiniteCoordinate { index, component });
            }
        }
        Ok(Self { data })
    }

    /// Dataset with no points.
    pub fn empty() -> Self {
        Self {
            data: Array2::zeros((0, 0)),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// True when there are no points.
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Point dimension.
    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow point `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    /// Owned copy of point `index`.
    pub fn point(&self, index: usize) -> Vector {
        Vector::from(self.data.row(index))
    }

    /// Iterate points in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = ArrayView1<'_, f64>> + '_ {
        self.data.axis_iter(Axis(0))
    }

    /// Underlying matrix.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }
}

impl TryFrom<Vec<Vec<f64>>> for Dataset {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_shape() -> Result<()> {
        let ds = Dataset::new(&[vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]])?;
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.dim(), 2);
        assert_eq!(ds.point(1).to_vec(), vec![2.0, 3.0]);
        assert_eq!(ds.rows().count(), 3);
        Ok(())
    }

    #[test]
    fn test_dataset_empty_is_valid() -> Result<()> {
        let ds = Dataset::new(&[])?;
        assert!(ds.is_empty());
        assert_eq!(ds, Dataset::empty());
        Ok(())
    }

    #[test]
    fn test_dataset_rejects_ragged_rows() {
        let err = Dataset::new(&[vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0]]).unwrap_err();
        match err {
            Error::DimensionMismatch {
                expected,
                found,
                index,
            } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dataset_rejects_non_finite() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Dataset::new(&[vec![0.0, 0.0], vec![bad, 1.0]]).unwrap_err();
            assert!(
                matches!(err, Error::NonFiniteCoordinate { index: 1, component: 0 }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_from_array_rejects_non_finite() {
        let arr = ndarray::array![[0.0, 1.0], [2.0, f64::NAN]];
        assert!(matches!(
            Dataset::from_array(arr),
            Err(Error::NonFiniteCoordinate { index: 1, component: 1 })
        ));
        assert!(Dataset::from_array(ndarray::array![[0.0], [1.0]]).is_ok());
    }

    #[test]
    fn test_dataset_try_from() {
        let ds = Dataset::try_from(vec![vec![1.0], vec![2.0]]);
        assert!(ds.is_ok());
    }
}
