//! The expression dataset: matrix, axis metadata and display order
//!
//! All components read and mutate the loaded data through this store. A
//! load or row-subset operation replaces the whole store; nothing observes
//! a partially rebuilt one.

use crate::data::matrix::ExpressionMatrix;
use crate::data::metadata::AxisMetadata;
use crate::error::{ClusterError, Result};
use crate::order;
use crate::provider::MergeNode;

/// One of the two matrix dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Rows of the matrix.
    Gene,
    /// Columns of the matrix (microarrays / experiments).
    Array,
}

/// A loaded expression dataset with its current display order.
#[derive(Debug, Clone)]
pub struct ExpressionDataSet {
    matrix: ExpressionMatrix,
    genes: AxisMetadata,
    arrays: AxisMetadata,
    /// Gene display order: `gene_index[slot]` is the matrix row shown at
    /// display position `slot`. Always a permutation of `0..n_genes`.
    gene_index: Vec<usize>,
    /// Array display order, same contract as `gene_index`.
    array_index: Vec<usize>,
}

impl ExpressionDataSet {
    pub fn new(
        matrix: ExpressionMatrix,
        genes: AxisMetadata,
        arrays: AxisMetadata,
    ) -> Result<Self> {
        if genes.len() != matrix.n_rows() {
            return Err(ClusterError::DimensionMismatch {
                expected: format!("{} gene entries", matrix.n_rows()),
                got: format!("{}", genes.len()),
            });
        }
        if arrays.len() != matrix.n_columns() {
            return Err(ClusterError::DimensionMismatch {
                expected: format!("{} array entries", matrix.n_columns()),
                got: format!("{}", arrays.len()),
            });
        }
        let mut ds = Self {
            matrix,
            genes,
            arrays,
            gene_index: Vec::new(),
            array_index: Vec::new(),
        };
        ds.reset_index(Axis::Gene);
        ds.reset_index(Axis::Array);
        Ok(ds)
    }

    pub fn n_genes(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn n_arrays(&self) -> usize {
        self.matrix.n_columns()
    }

    pub fn matrix(&self) -> &ExpressionMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut ExpressionMatrix {
        &mut self.matrix
    }

    pub fn genes(&self) -> &AxisMetadata {
        &self.genes
    }

    pub fn arrays(&self) -> &AxisMetadata {
        &self.arrays
    }

    pub fn metadata(&self, axis: Axis) -> &AxisMetadata {
        match axis {
            Axis::Gene => &self.genes,
            Axis::Array => &self.arrays,
        }
    }

    pub fn set_weights(&mut self, axis: Axis, weights: Vec<f64>) -> Result<()> {
        match axis {
            Axis::Gene => self.genes.set_weights(weights),
            Axis::Array => self.arrays.set_weights(weights),
        }
    }

    pub fn gene_index(&self) -> &[usize] {
        &self.gene_index
    }

    pub fn array_index(&self) -> &[usize] {
        &self.array_index
    }

    pub fn index(&self, axis: Axis) -> &[usize] {
        match axis {
            Axis::Gene => &self.gene_index,
            Axis::Array => &self.array_index,
        }
    }

    /// Recompute an axis's display order from its order keys alone. This
    /// is the default order before any clustering has run.
    pub fn reset_index(&mut self, axis: Axis) {
        let index = order::sorted_by_key(self.metadata(axis).order_keys());
        self.set_index(axis, index);
    }

    /// Display order from a flat cluster assignment: clusters in id order,
    /// members within a cluster in order-key order.
    pub fn set_cluster_index(&mut self, axis: Axis, labels: &[usize], k: usize) -> Result<()> {
        let index = order::cluster_index(self.metadata(axis).order_keys(), labels, k)?;
        self.set_index(axis, index);
        Ok(())
    }

    /// Display order from a hierarchical merge tree.
    pub fn set_tree_index(&mut self, axis: Axis, nodes: &[MergeNode]) -> Result<()> {
        let index = order::tree_sort(nodes, self.metadata(axis).order_keys())?;
        self.set_index(axis, index);
        Ok(())
    }

    fn set_index(&mut self, axis: Axis, index: Vec<usize>) {
        debug_assert_eq!(index.len(), self.metadata(axis).len());
        match axis {
            Axis::Gene => self.gene_index = index,
            Axis::Array => self.array_index = index,
        }
    }

    /// New dataset containing only the genes where `keep` is true. The
    /// array axis is untouched; the gene order index is rebuilt from the
    /// surviving order keys.
    /// Cluster 3.0 equivalent: SelectSubset() in data.c.
    pub fn select_genes(&self, keep: &[bool]) -> Result<ExpressionDataSet> {
        if keep.len() != self.n_genes() {
            return Err(ClusterError::DimensionMismatch {
                expected: format!("{} flags", self.n_genes()),
                got: format!("{}", keep.len()),
            });
        }
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, &k)| k)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            return Err(ClusterError::Constraint {
                reason: "no genes passed the filter".to_string(),
            });
        }
        ExpressionDataSet::new(
            self.matrix.select_rows(&rows),
            self.genes.select(&rows),
            self.arrays.clone(),
        )
    }
}
