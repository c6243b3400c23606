//! Row filtering by data quality criteria
//!
//! A gene is retained only when it satisfies every active predicate:
//! minimum percentage of present values, minimum sample standard
//! deviation, minimum number of extreme observations, and minimum range.
//! Cluster 3.0 equivalent: FilterRow() in data.c.

use crate::data::{ExpressionDataSet, ExpressionMatrix};
use crate::error::Result;

/// Active row-filter predicates. `None` disables a predicate.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Minimum percentage (0-100) of arrays with a present value.
    pub min_percent_present: Option<f64>,
    /// Minimum sample standard deviation; rows with fewer than two
    /// present values never pass this predicate.
    pub min_std: Option<f64>,
    /// At least `count` observations with `|value| >= threshold`.
    pub min_extreme: Option<ExtremeFilter>,
    /// Minimum max - min over present values.
    pub min_range: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtremeFilter {
    pub count: usize,
    pub threshold: f64,
}

impl RowFilter {
    pub fn is_active(&self) -> bool {
        self.min_percent_present.is_some()
            || self.min_std.is_some()
            || self.min_extreme.is_some()
            || self.min_range.is_some()
    }

    /// Whether one row satisfies every active predicate.
    pub fn row_passes(&self, matrix: &ExpressionMatrix, row: usize) -> bool {
        let threshold = self.min_extreme.map(|e| e.threshold).unwrap_or(0.0);
        let mut count = 0usize;
        let mut count_extreme = 0usize;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for column in 0..matrix.n_columns() {
            if let Some(value) = matrix.get(row, column) {
                count += 1;
                sum += value;
                sum_sq += value * value;
                min = min.min(value);
                max = max.max(value);
                if value.abs() >= threshold {
                    count_extreme += 1;
                }
            }
        }

        if let Some(percent) = self.min_percent_present {
            let needed = (percent * matrix.n_columns() as f64 / 100.0).ceil() as usize;
            if count < needed {
                return false;
            }
        }
        if let Some(min_std) = self.min_std {
            if count < 2 {
                return false;
            }
            let mean = sum / count as f64;
            let var = (sum_sq - count as f64 * mean * mean) / (count as f64 - 1.0);
            if var.max(0.0).sqrt() < min_std {
                return false;
            }
        }
        if let Some(extreme) = self.min_extreme {
            if count_extreme < extreme.count {
                return false;
            }
        }
        if let Some(min_range) = self.min_range {
            if count == 0 || max - min < min_range {
                return false;
            }
        }
        true
    }

    /// Apply the filter, producing a new dataset holding only the
    /// surviving genes. The input dataset is left untouched.
    pub fn apply(&self, dataset: &ExpressionDataSet) -> Result<ExpressionDataSet> {
        let keep: Vec<bool> = (0..dataset.n_genes())
            .map(|row| self.row_passes(dataset.matrix(), row))
            .collect();
        let kept = keep.iter().filter(|&&k| k).count();
        log::info!("row filter retained {} of {} genes", kept, dataset.n_genes());
        dataset.select_genes(&keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AxisMetadata;
    use ndarray::array;

    fn dataset() -> ExpressionDataSet {
        let mut matrix = ExpressionMatrix::dense(array![
            [1.0, 1.0, 1.0, 1.0],   // flat: zero SD, zero range
            [-4.0, 2.0, 5.0, 0.5],  // varied, two extremes at |v| >= 2
            [3.0, 0.0, 0.0, 0.0],   // becomes mostly missing below
        ]);
        matrix.clear(2, 1);
        matrix.clear(2, 2);
        matrix.clear(2, 3);
        let genes = AxisMetadata::with_defaults(
            "UNIQID",
            vec!["flat".into(), "varied".into(), "sparse".into()],
        );
        let arrays = AxisMetadata::with_defaults(
            "ARRAY",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
        );
        ExpressionDataSet::new(matrix, genes, arrays).unwrap()
    }

    #[test]
    fn test_inactive_filter_keeps_everything() {
        let ds = dataset();
        let filter = RowFilter::default();
        assert!(!filter.is_active());
        for row in 0..ds.n_genes() {
            assert!(filter.row_passes(ds.matrix(), row));
        }
    }

    #[test]
    fn test_percent_present() {
        let ds = dataset();
        let filter = RowFilter {
            min_percent_present: Some(75.0),
            ..Default::default()
        };
        assert!(filter.row_passes(ds.matrix(), 0));
        assert!(filter.row_passes(ds.matrix(), 1));
        assert!(!filter.row_passes(ds.matrix(), 2), "1 of 4 present fails 75%");
    }

    #[test]
    fn test_std_rejects_flat_and_sparse_rows() {
        let ds = dataset();
        let filter = RowFilter {
            min_std: Some(0.5),
            ..Default::default()
        };
        assert!(!filter.row_passes(ds.matrix(), 0), "zero SD");
        assert!(filter.row_passes(ds.matrix(), 1));
        assert!(!filter.row_passes(ds.matrix(), 2), "fewer than 2 present values");
    }

    #[test]
    fn test_extreme_observations() {
        let ds = dataset();
        let filter = RowFilter {
            min_extreme: Some(ExtremeFilter {
                count: 2,
                threshold: 2.0,
            }),
            ..Default::default()
        };
        assert!(!filter.row_passes(ds.matrix(), 0));
        assert!(filter.row_passes(ds.matrix(), 1), "|-4| and |5| qualify");
    }

    #[test]
    fn test_range() {
        let ds = dataset();
        let filter = RowFilter {
            min_range: Some(5.0),
            ..Default::default()
        };
        assert!(!filter.row_passes(ds.matrix(), 0));
        assert!(filter.row_passes(ds.matrix(), 1), "range 9.0 passes");
        assert!(!filter.row_passes(ds.matrix(), 2), "single value has zero range");
    }

    #[test]
    fn test_predicates_combine_conjunctively() {
        let ds = dataset();
        let filter = RowFilter {
            min_percent_present: Some(50.0),
            min_std: Some(0.5),
            min_range: Some(5.0),
            ..Default::default()
        };
        let survivors: Vec<usize> = (0..ds.n_genes())
            .filter(|&row| filter.row_passes(ds.matrix(), row))
            .collect();
        assert_eq!(survivors, vec![1]);
    }

    #[test]
    fn test_apply_builds_subset() {
        let ds = dataset();
        let filter = RowFilter {
            min_std: Some(0.5),
            ..Default::default()
        };
        let filtered = filter.apply(&ds).unwrap();
        assert_eq!(filtered.n_genes(), 1);
        assert_eq!(filtered.genes().id(0), "varied");
    }
}
