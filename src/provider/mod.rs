//! External numeric provider contract
//!
//! The heavy numerics (linkage clustering, k-means, SOM training, SVD) sit
//! behind the [`NumericProvider`] trait so the core data handling never
//! depends on a particular numerical implementation. The crate ships one
//! implementation, [`builtin::BuiltinProvider`].

use crate::data::ExpressionMatrix;
use crate::error::Result;

pub mod builtin;

pub use builtin::BuiltinProvider;

/// One child of a hierarchical merge node: either an original matrix element
/// or an earlier merge node.
///
/// Cluster 3.0 encodes this as one integer, with internal node `k` stored as
/// `-k-1`. The tagged variant removes the off-by-one arithmetic at tree
/// resolution time; [`Child::encoded`] recovers the integer form where the
/// legacy semantics (tie-break comparisons, `GENE{i}X`/`NODE{k}X` ids) need
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    /// An original element (leaf), by matrix index.
    Leaf(usize),
    /// An earlier internal node, by merge order. Always refers to an
    /// already-resolved node: node `k` only appears as a child after entry
    /// `k` of the merge list.
    Node(usize),
}

impl Child {
    /// The legacy integer encoding: leaves map to their index, internal
    /// node `k` to `-k-1`.
    pub fn encoded(self) -> i64 {
        match self {
            Child::Leaf(i) => i as i64,
            Child::Node(k) => -(k as i64) - 1,
        }
    }
}

/// One merge event of a hierarchical clustering result. A tree over `n`
/// elements has exactly `n - 1` nodes, in the order the merges were made.
#[derive(Debug, Clone, Copy)]
pub struct MergeNode {
    pub left: Child,
    pub right: Child,
    /// Distance at which the two children were joined.
    pub distance: f64,
}

/// Distance measures, matching the Cluster 3.0 menu (`-g`/`-e` codes 1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// 1: uncentered correlation
    Uncentered,
    /// 2: Pearson correlation
    Pearson,
    /// 3: uncentered correlation, absolute value
    AbsUncentered,
    /// 4: Pearson correlation, absolute value
    AbsPearson,
    /// 5: Spearman's rank correlation
    Spearman,
    /// 6: Kendall's tau
    Kendall,
    /// 7: Euclidean distance
    Euclidean,
    /// 8: city-block distance
    CityBlock,
}

impl Metric {
    /// Map a Cluster 3.0 numeric menu code; 0 means "no clustering".
    pub fn from_code(code: u8) -> Option<Metric> {
        match code {
            1 => Some(Metric::Uncentered),
            2 => Some(Metric::Pearson),
            3 => Some(Metric::AbsUncentered),
            4 => Some(Metric::AbsPearson),
            5 => Some(Metric::Spearman),
            6 => Some(Metric::Kendall),
            7 => Some(Metric::Euclidean),
            8 => Some(Metric::CityBlock),
            _ => None,
        }
    }

    /// Distance-family metrics report raw merge heights that get rescaled
    /// for display; correlation-family metrics report `1 - similarity`
    /// directly.
    pub fn is_distance_family(self) -> bool {
        matches!(self, Metric::Euclidean | Metric::CityBlock)
    }
}

/// Hierarchical linkage methods (`-m` codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageMethod {
    Single,
    Complete,
    Average,
    Centroid,
}

impl LinkageMethod {
    pub fn from_char(c: char) -> Option<LinkageMethod> {
        match c {
            's' => Some(LinkageMethod::Single),
            'm' => Some(LinkageMethod::Complete),
            'a' => Some(LinkageMethod::Average),
            'c' => Some(LinkageMethod::Centroid),
            _ => None,
        }
    }
}

/// Result of a k-means run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster id in `[0, k)` per element.
    pub labels: Vec<usize>,
    /// Within-cluster error of the best trial.
    pub best_error: f64,
    /// Number of trials that reproduced the best assignment.
    pub n_found: usize,
}

/// Result of SOM training.
#[derive(Debug, Clone)]
pub struct SomResult {
    /// Grid width (x) and height (y).
    pub nx: usize,
    pub ny: usize,
    /// Node weight vectors; node `(i, j)` lives at `i * ny + j`. Each
    /// vector has one entry per dimension of the clustered elements.
    pub node_weights: Vec<Vec<f64>>,
    /// Best-matching grid cell `(x, y)` per element.
    pub best_match: Vec<(usize, usize)>,
}

impl SomResult {
    /// Flat cluster id of the node an element mapped to.
    pub fn cluster_of(&self, element: usize) -> usize {
        let (x, y) = self.best_match[element];
        x * self.ny + y
    }
}

/// Result of a singular value decomposition.
#[derive(Debug, Clone)]
pub struct SvdResult {
    /// Left singular vectors, one row per matrix row, one column per
    /// singular value.
    pub left: Vec<Vec<f64>>,
    pub values: Vec<f64>,
    /// Right singular vectors, one row per matrix column, one column per
    /// singular value.
    pub right: Vec<Vec<f64>>,
}

/// Black-box numerical routines consumed by the pipeline.
///
/// All methods are deterministic given identical inputs except
/// `kmeans_cluster` and `self_organizing_map`, which are randomized and
/// only statistically reproducible (seed the provider for repeatability).
///
/// `transpose = false` clusters rows (genes) and `weights` then holds one
/// weight per column; `transpose = true` clusters columns with one weight
/// per row.
pub trait NumericProvider {
    fn hierarchical_cluster(
        &self,
        matrix: &ExpressionMatrix,
        weights: &[f64],
        transpose: bool,
        metric: Metric,
        method: LinkageMethod,
    ) -> Result<Vec<MergeNode>>;

    fn kmeans_cluster(
        &self,
        matrix: &ExpressionMatrix,
        weights: &[f64],
        transpose: bool,
        k: usize,
        trials: usize,
        metric: Metric,
    ) -> Result<KMeansResult>;

    #[allow(clippy::too_many_arguments)]
    fn self_organizing_map(
        &self,
        matrix: &ExpressionMatrix,
        weights: &[f64],
        transpose: bool,
        nx: usize,
        ny: usize,
        iterations: usize,
        tau: f64,
        metric: Metric,
    ) -> Result<SomResult>;

    /// Decompose an already-dense matrix (the PCA driver fills missing
    /// cells and normalizes rows before calling this).
    fn singular_value_decomposition(&self, dense: &ndarray::Array2<f64>) -> Result<SvdResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_encoding_roundtrip() {
        assert_eq!(Child::Leaf(0).encoded(), 0);
        assert_eq!(Child::Leaf(7).encoded(), 7);
        assert_eq!(Child::Node(0).encoded(), -1);
        assert_eq!(Child::Node(3).encoded(), -4);
    }

    #[test]
    fn test_metric_codes() {
        assert_eq!(Metric::from_code(0), None);
        assert_eq!(Metric::from_code(1), Some(Metric::Uncentered));
        assert_eq!(Metric::from_code(8), Some(Metric::CityBlock));
        assert_eq!(Metric::from_code(9), None);
        assert!(Metric::Euclidean.is_distance_family());
        assert!(!Metric::Pearson.is_distance_family());
    }

    #[test]
    fn test_som_cluster_of() {
        let som = SomResult {
            nx: 2,
            ny: 3,
            node_weights: vec![vec![]; 6],
            best_match: vec![(0, 0), (1, 2)],
        };
        assert_eq!(som.cluster_of(0), 0);
        assert_eq!(som.cluster_of(1), 5);
    }
}
