//! Expression matrix with a per-cell presence mask
//!
//! Microarray files routinely contain missing measurements, so every value
//! carries a `present` flag. All numeric passes in this crate consult the
//! mask and skip absent cells.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{ClusterError, Result};

/// An expression matrix (genes x arrays) with a parallel presence mask.
/// Cluster 3.0 equivalent: the `_data` / `_mask` pair in data.c.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Expression values; masked-out cells hold 0.0 but must not be read
    /// without consulting the mask.
    values: Array2<f64>,
    /// true = value present, false = missing
    mask: Array2<bool>,
}

impl ExpressionMatrix {
    pub fn new(values: Array2<f64>, mask: Array2<bool>) -> Result<Self> {
        if values.dim() != mask.dim() {
            return Err(ClusterError::DimensionMismatch {
                expected: format!("mask of shape {:?}", values.dim()),
                got: format!("{:?}", mask.dim()),
            });
        }
        Ok(Self { values, mask })
    }

    /// A matrix with every cell present. Used mostly in tests.
    pub fn dense(values: Array2<f64>) -> Self {
        let mask = Array2::from_elem(values.dim(), true);
        Self { values, mask }
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn mask(&self) -> ArrayView2<'_, bool> {
        self.mask.view()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if self.mask[[row, column]] {
            Some(self.values[[row, column]])
        } else {
            None
        }
    }

    pub fn is_present(&self, row: usize, column: usize) -> bool {
        self.mask[[row, column]]
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        self.values[[row, column]] = value;
        self.mask[[row, column]] = true;
    }

    /// Mark a cell as missing. Its stored value is zeroed so that stale
    /// numbers cannot leak into sums that forget the mask.
    pub fn clear(&mut self, row: usize, column: usize) {
        self.values[[row, column]] = 0.0;
        self.mask[[row, column]] = false;
    }

    /// Replace a present cell's value in place; missing cells stay missing.
    pub fn update_present(&mut self, row: usize, column: usize, value: f64) {
        if self.mask[[row, column]] {
            self.values[[row, column]] = value;
        }
    }

    pub fn row(&self, row: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, bool>) {
        (self.values.row(row), self.mask.row(row))
    }

    /// Present values of one row, in column order.
    pub fn present_in_row(&self, row: usize) -> Vec<f64> {
        self.values
            .row(row)
            .iter()
            .zip(self.mask.row(row).iter())
            .filter(|(_, &m)| m)
            .map(|(&v, _)| v)
            .collect()
    }

    /// Present values of one column, in row order.
    pub fn present_in_column(&self, column: usize) -> Vec<f64> {
        self.values
            .column(column)
            .iter()
            .zip(self.mask.column(column).iter())
            .filter(|(_, &m)| m)
            .map(|(&v, _)| v)
            .collect()
    }

    /// New matrix containing only the selected rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            values: self.values.select(Axis(0), rows),
            mask: self.mask.select(Axis(0), rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dense_matrix_all_present() {
        let m = ExpressionMatrix::dense(array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_columns(), 2);
        assert_eq!(m.get(0, 1), Some(2.0));
    }

    #[test]
    fn test_mask_shape_checked() {
        let values = array![[1.0, 2.0]];
        let mask = Array2::from_elem((2, 2), true);
        assert!(ExpressionMatrix::new(values, mask).is_err());
    }

    #[test]
    fn test_clear_zeroes_value() {
        let mut m = ExpressionMatrix::dense(array![[1.0, 2.0]]);
        m.clear(0, 0);
        assert_eq!(m.get(0, 0), None);
        assert_eq!(m.values()[[0, 0]], 0.0);
        assert_eq!(m.present_in_row(0), vec![2.0]);
    }

    #[test]
    fn test_update_present_skips_missing() {
        let mut m = ExpressionMatrix::dense(array![[1.0, 2.0]]);
        m.clear(0, 1);
        m.update_present(0, 1, 9.0);
        assert_eq!(m.get(0, 1), None);
        m.update_present(0, 0, 9.0);
        assert_eq!(m.get(0, 0), Some(9.0));
    }

    #[test]
    fn test_select_rows() {
        let m = ExpressionMatrix::dense(array![[1.0], [2.0], [3.0]]);
        let s = m.select_rows(&[2, 0]);
        assert_eq!(s.n_rows(), 2);
        assert_eq!(s.get(0, 0), Some(3.0));
        assert_eq!(s.get(1, 0), Some(1.0));
    }
}
