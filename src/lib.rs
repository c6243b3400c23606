//! rust_cluster3: clustering of gene expression data
//!
//! This crate reads tab-delimited expression matrices and clusters their
//! genes and arrays with hierarchical, k-means or self-organizing-map
//! methods, plus principal component analysis, writing the established
//! result file formats (.cdt, .gtr, .atr, .kgg, .kag, SOM node tables, PCA
//! coordinate tables).
//!
//! # Example
//!
//! ```ignore
//! use rust_cluster3::prelude::*;
//!
//! // Load data
//! let mut ds = read_dataset("expression.txt")?;
//!
//! // Adjust it
//! log_transform(ds.matrix_mut());
//! adjust_genes(ds.matrix_mut(), Some(Centering::Mean), false);
//!
//! // Cluster genes hierarchically and write demo.gtr / demo.cdt
//! let provider = BuiltinProvider::new();
//! run_hierarchical(&mut ds, &provider, Some(Metric::Pearson), None,
//!                  LinkageMethod::Average, "demo")?;
//! ```

pub mod cli;
pub mod data;
pub mod error;
pub mod filter;
pub mod io;
pub mod order;
pub mod pipeline;
pub mod provider;
pub mod transform;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::{Axis, AxisMetadata, ExpressionDataSet, ExpressionMatrix};
    pub use crate::error::{ClusterError, Result};
    pub use crate::filter::{ExtremeFilter, RowFilter};
    pub use crate::io::{load_dataset, read_dataset};
    pub use crate::pipeline::{run_hierarchical, run_kmeans, run_pca, run_som};
    pub use crate::provider::{
        BuiltinProvider, Child, KMeansResult, LinkageMethod, MergeNode, Metric, NumericProvider,
        SomResult, SvdResult,
    };
    pub use crate::transform::{adjust_arrays, adjust_genes, log_transform, Centering};
}
