//! Data structures for expression matrices and their metadata

mod dataset;
mod matrix;
mod metadata;

pub use dataset::{Axis, ExpressionDataSet};
pub use matrix::ExpressionMatrix;
pub use metadata::AxisMetadata;
