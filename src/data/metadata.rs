//! Per-axis metadata: identifiers, display names, weights and order keys

use crate::error::{ClusterError, Result};

/// Metadata for one matrix axis (genes or arrays).
/// Cluster 3.0 equivalent: the `_geneuniqID`/`_genename`/`_geneweight`/
/// `_geneorder` (and array counterpart) vectors in data.c.
#[derive(Debug, Clone)]
pub struct AxisMetadata {
    /// The header keyword the user supplied for this axis, e.g. whatever
    /// stood in place of "UNIQID" in the first header cell.
    label: String,
    /// Mandatory user-visible identifiers, one per element.
    ids: Vec<String>,
    /// Optional display names; fall back to the id when absent.
    names: Vec<Option<String>>,
    /// Clustering weights, default 1.0.
    weights: Vec<f64>,
    /// Tie-break order keys, default = original file position.
    order: Vec<f64>,
}

impl AxisMetadata {
    pub fn new(
        label: impl Into<String>,
        ids: Vec<String>,
        names: Vec<Option<String>>,
        weights: Vec<f64>,
        order: Vec<f64>,
    ) -> Result<Self> {
        let n = ids.len();
        for (what, len) in [
            ("names", names.len()),
            ("weights", weights.len()),
            ("order keys", order.len()),
        ] {
            if len != n {
                return Err(ClusterError::DimensionMismatch {
                    expected: format!("{} {}", n, what),
                    got: format!("{}", len),
                });
            }
        }
        Ok(Self {
            label: label.into(),
            ids,
            names,
            weights,
            order,
        })
    }

    /// Metadata with default weights (1.0) and file-position order keys.
    pub fn with_defaults(label: impl Into<String>, ids: Vec<String>) -> Self {
        let n = ids.len();
        Self {
            label: label.into(),
            ids,
            names: vec![None; n],
            weights: vec![1.0; n],
            order: (0..n).map(|i| i as f64).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self, i: usize) -> &str {
        &self.ids[i]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Display name, falling back to the unique id.
    pub fn display_name(&self, i: usize) -> &str {
        self.names[i].as_deref().unwrap_or(&self.ids[i])
    }

    pub fn has_names(&self) -> bool {
        self.names.iter().any(|n| n.is_some())
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        if weights.len() != self.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: format!("{} weights", self.len()),
                got: format!("{}", weights.len()),
            });
        }
        self.weights = weights;
        Ok(())
    }

    pub fn order_key(&self, i: usize) -> f64 {
        self.order[i]
    }

    pub fn order_keys(&self) -> &[f64] {
        &self.order
    }

    /// New metadata containing only the selected elements, in the given order.
    pub fn select(&self, keep: &[usize]) -> Self {
        Self {
            label: self.label.clone(),
            ids: keep.iter().map(|&i| self.ids[i].clone()).collect(),
            names: keep.iter().map(|&i| self.names[i].clone()).collect(),
            weights: keep.iter().map(|&i| self.weights[i]).collect(),
            order: keep.iter().map(|&i| self.order[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let m = AxisMetadata::with_defaults("UNIQID", ids(&["g1", "g2"]));
        assert_eq!(m.len(), 2);
        assert_eq!(m.weight(0), 1.0);
        assert_eq!(m.order_key(1), 1.0);
        assert_eq!(m.display_name(0), "g1");
        assert!(!m.has_names());
    }

    #[test]
    fn test_display_name_fallback() {
        let m = AxisMetadata::new(
            "YORF",
            ids(&["g1", "g2"]),
            vec![Some("alpha".to_string()), None],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        )
        .unwrap();
        assert_eq!(m.display_name(0), "alpha");
        assert_eq!(m.display_name(1), "g2");
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let r = AxisMetadata::new("UNIQID", ids(&["g1"]), vec![], vec![1.0], vec![0.0]);
        assert!(r.is_err());
    }

    #[test]
    fn test_select_reorders() {
        let m = AxisMetadata::with_defaults("UNIQID", ids(&["a", "b", "c"]));
        let s = m.select(&[2, 0]);
        assert_eq!(s.id(0), "c");
        assert_eq!(s.order_key(0), 2.0);
        assert_eq!(s.len(), 2);
    }
}
