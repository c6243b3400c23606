//! Numeric adjustments applied before clustering
//!
//! Log transform, per-gene/per-array centering and L2 normalization. All
//! passes respect the presence mask and only ever touch present cells.

use crate::data::ExpressionMatrix;

/// Which location statistic to subtract when centering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Centering {
    Mean,
    Median,
}

/// Replace every present positive value by its base-2 logarithm.
///
/// Values <= 0 cannot be log-transformed and are masked out rather than
/// reported as errors; this matches how expression ratios are handled in
/// Cluster 3.0 (LogTransform() in data.c).
pub fn log_transform(matrix: &mut ExpressionMatrix) {
    for row in 0..matrix.n_rows() {
        for column in 0..matrix.n_columns() {
            match matrix.get(row, column) {
                Some(v) if v > 0.0 => matrix.update_present(row, column, v.log2()),
                Some(_) => matrix.clear(row, column),
                None => {}
            }
        }
    }
}

/// Center and/or L2-normalize each row (gene) independently.
/// Cluster 3.0 equivalent: AdjustGenes() in data.c.
///
/// Statistics are computed over present cells only. Rows without present
/// cells, and rows with zero norm, are left unchanged.
pub fn adjust_genes(matrix: &mut ExpressionMatrix, center: Option<Centering>, normalize: bool) {
    for row in 0..matrix.n_rows() {
        if let Some(how) = center {
            let present = matrix.present_in_row(row);
            if !present.is_empty() {
                let shift = match how {
                    Centering::Mean => mean(&present),
                    Centering::Median => median(present),
                };
                for column in 0..matrix.n_columns() {
                    if let Some(v) = matrix.get(row, column) {
                        matrix.update_present(row, column, v - shift);
                    }
                }
            }
        }
        if normalize {
            let norm = l2_norm(&matrix.present_in_row(row));
            if norm > 0.0 {
                for column in 0..matrix.n_columns() {
                    if let Some(v) = matrix.get(row, column) {
                        matrix.update_present(row, column, v / norm);
                    }
                }
            }
        }
    }
}

/// Center and/or L2-normalize each column (array) independently.
/// Cluster 3.0 equivalent: AdjustArrays() in data.c.
pub fn adjust_arrays(matrix: &mut ExpressionMatrix, center: Option<Centering>, normalize: bool) {
    for column in 0..matrix.n_columns() {
        if let Some(how) = center {
            let present = matrix.present_in_column(column);
            if !present.is_empty() {
                let shift = match how {
                    Centering::Mean => mean(&present),
                    Centering::Median => median(present),
                };
                for row in 0..matrix.n_rows() {
                    if let Some(v) = matrix.get(row, column) {
                        matrix.update_present(row, column, v - shift);
                    }
                }
            }
        }
        if normalize {
            let norm = l2_norm(&matrix.present_in_column(column));
            if norm > 0.0 {
                for row in 0..matrix.n_rows() {
                    if let Some(v) = matrix.get(row, column) {
                        matrix.update_present(row, column, v / norm);
                    }
                }
            }
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_log_transform_masks_nonpositive() {
        let mut m = ExpressionMatrix::dense(array![[8.0, 0.0, -2.0, 1.0]]);
        log_transform(&mut m);
        assert_eq!(m.get(0, 0), Some(3.0));
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(0, 2), None);
        assert_eq!(m.get(0, 3), Some(0.0));
    }

    #[test]
    fn test_log_then_mean_center_rows_sum_to_zero() {
        // 4 genes x 3 arrays, no missing values, default weights: after a
        // log transform and per-gene mean centering every row of present
        // values sums to zero.
        let mut m = ExpressionMatrix::dense(array![
            [1.0, 2.0, 4.0],
            [8.0, 16.0, 32.0],
            [2.0, 2.0, 2.0],
            [1.0, 4.0, 16.0],
        ]);
        log_transform(&mut m);
        adjust_genes(&mut m, Some(Centering::Mean), false);
        for row in 0..4 {
            let sum: f64 = m.present_in_row(row).iter().sum();
            assert!(sum.abs() < 1e-12, "row {} sums to {}", row, sum);
        }
    }

    #[test]
    fn test_median_center() {
        let mut m = ExpressionMatrix::dense(array![[1.0, 2.0, 10.0]]);
        adjust_genes(&mut m, Some(Centering::Median), false);
        assert_eq!(m.get(0, 0), Some(-1.0));
        assert_eq!(m.get(0, 1), Some(0.0));
        assert_eq!(m.get(0, 2), Some(8.0));
    }

    #[test]
    fn test_normalize_rows_unit_norm() {
        let mut m = ExpressionMatrix::dense(array![[3.0, 4.0]]);
        adjust_genes(&mut m, None, true);
        assert!((m.get(0, 0).unwrap() - 0.6).abs() < 1e-12);
        assert!((m.get(0, 1).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_norm_row_left_unchanged() {
        let mut m = ExpressionMatrix::dense(array![[0.0, 0.0]]);
        adjust_genes(&mut m, None, true);
        assert_eq!(m.get(0, 0), Some(0.0));
        assert_eq!(m.get(0, 1), Some(0.0));
    }

    #[test]
    fn test_centering_skips_missing_cells() {
        let mut m = ExpressionMatrix::dense(array![[1.0, 3.0, 100.0]]);
        m.clear(0, 2);
        adjust_genes(&mut m, Some(Centering::Mean), false);
        assert_eq!(m.get(0, 0), Some(-1.0));
        assert_eq!(m.get(0, 1), Some(1.0));
        assert_eq!(m.get(0, 2), None);
    }

    #[test]
    fn test_adjust_arrays_centers_columns() {
        let mut m = ExpressionMatrix::dense(array![[1.0, 10.0], [3.0, 20.0]]);
        adjust_arrays(&mut m, Some(Centering::Mean), false);
        assert_eq!(m.get(0, 0), Some(-1.0));
        assert_eq!(m.get(1, 0), Some(1.0));
        assert_eq!(m.get(0, 1), Some(-5.0));
        assert_eq!(m.get(1, 1), Some(5.0));
    }

    #[test]
    fn test_median_of_even_count() {
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(vec![5.0, 1.0, 3.0]), 3.0);
    }
}
