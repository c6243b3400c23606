//! Pure-Rust implementation of the numeric provider
//!
//! Distance measures, agglomerative linkage, k-means and SOM training follow
//! the algorithms of the C Clustering Library (cluster.c); the singular value
//! decomposition comes from nalgebra.

use nalgebra::DMatrix;
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data::ExpressionMatrix;
use crate::error::{ClusterError, Result};
use crate::provider::{
    Child, KMeansResult, LinkageMethod, MergeNode, Metric, NumericProvider, SomResult, SvdResult,
};

/// The default [`NumericProvider`]. Randomized routines draw from the OS
/// unless a seed is given.
#[derive(Debug, Clone, Default)]
pub struct BuiltinProvider {
    seed: Option<u64>,
}

impl BuiltinProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        }
    }
}

/// One row or column of the matrix, pulled out for distance computation.
#[derive(Debug, Clone)]
struct Element {
    values: Vec<f64>,
    mask: Vec<bool>,
}

impl Element {
    fn present(n: usize) -> Self {
        Element {
            values: vec![0.0; n],
            mask: vec![true; n],
        }
    }
}

fn extract_elements(matrix: &ExpressionMatrix, transpose: bool) -> Vec<Element> {
    if transpose {
        (0..matrix.n_columns())
            .map(|column| {
                let mut e = Element {
                    values: vec![0.0; matrix.n_rows()],
                    mask: vec![false; matrix.n_rows()],
                };
                for row in 0..matrix.n_rows() {
                    if let Some(v) = matrix.get(row, column) {
                        e.values[row] = v;
                        e.mask[row] = true;
                    }
                }
                e
            })
            .collect()
    } else {
        (0..matrix.n_rows())
            .map(|row| {
                let mut e = Element {
                    values: vec![0.0; matrix.n_columns()],
                    mask: vec![false; matrix.n_columns()],
                };
                for column in 0..matrix.n_columns() {
                    if let Some(v) = matrix.get(row, column) {
                        e.values[column] = v;
                        e.mask[column] = true;
                    }
                }
                e
            })
            .collect()
    }
}

fn check_weights(weights: &[f64], ndim: usize) -> Result<()> {
    if weights.len() != ndim {
        return Err(ClusterError::DimensionMismatch {
            expected: format!("{} weights", ndim),
            got: format!("{}", weights.len()),
        });
    }
    Ok(())
}

/// Distance between two elements over their shared present dimensions.
/// Degenerate cases (no shared dimensions, zero variance) yield 0 for the
/// distance family and 1 for the correlation family, matching cluster.c.
fn distance(metric: Metric, a: &Element, b: &Element, weights: &[f64]) -> f64 {
    match metric {
        Metric::Euclidean => {
            let mut result = 0.0;
            let mut tweight = 0.0;
            for i in 0..a.values.len() {
                if a.mask[i] && b.mask[i] {
                    let term = a.values[i] - b.values[i];
                    result += weights[i] * term * term;
                    tweight += weights[i];
                }
            }
            if tweight > 0.0 {
                result / tweight
            } else {
                0.0
            }
        }
        Metric::CityBlock => {
            let mut result = 0.0;
            let mut tweight = 0.0;
            for i in 0..a.values.len() {
                if a.mask[i] && b.mask[i] {
                    result += weights[i] * (a.values[i] - b.values[i]).abs();
                    tweight += weights[i];
                }
            }
            if tweight > 0.0 {
                result / tweight
            } else {
                0.0
            }
        }
        Metric::Uncentered | Metric::AbsUncentered => {
            let mut num = 0.0;
            let mut sum1 = 0.0;
            let mut sum2 = 0.0;
            for i in 0..a.values.len() {
                if a.mask[i] && b.mask[i] {
                    let w = weights[i];
                    num += w * a.values[i] * b.values[i];
                    sum1 += w * a.values[i] * a.values[i];
                    sum2 += w * b.values[i] * b.values[i];
                }
            }
            let denom = sum1 * sum2;
            let r = if denom > 0.0 { num / denom.sqrt() } else { 0.0 };
            if metric == Metric::AbsUncentered {
                1.0 - r.abs()
            } else {
                1.0 - r
            }
        }
        Metric::Pearson | Metric::AbsPearson => {
            let r = weighted_pearson(a, b, weights);
            if metric == Metric::AbsPearson {
                1.0 - r.abs()
            } else {
                1.0 - r
            }
        }
        Metric::Spearman => {
            // Rank correlation ignores the weight vector, as in cluster.c.
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for i in 0..a.values.len() {
                if a.mask[i] && b.mask[i] {
                    xs.push(a.values[i]);
                    ys.push(b.values[i]);
                }
            }
            if xs.len() < 2 {
                return 1.0;
            }
            let rx = ranks(&xs);
            let ry = ranks(&ys);
            let unit = vec![1.0; rx.len()];
            let ex = Element {
                mask: vec![true; rx.len()],
                values: rx,
            };
            let ey = Element {
                mask: vec![true; ys.len()],
                values: ry,
            };
            1.0 - weighted_pearson(&ex, &ey, &unit)
        }
        Metric::Kendall => {
            let mut con = 0i64;
            let mut dis = 0i64;
            let mut denomx = 0i64;
            let mut denomy = 0i64;
            let shared: Vec<usize> = (0..a.values.len())
                .filter(|&i| a.mask[i] && b.mask[i])
                .collect();
            for (p, &i) in shared.iter().enumerate() {
                for &j in &shared[p + 1..] {
                    let dx = a.values[i] - a.values[j];
                    let dy = b.values[i] - b.values[j];
                    if dx * dy > 0.0 {
                        con += 1;
                    } else if dx * dy < 0.0 {
                        dis += 1;
                    }
                    if dx != 0.0 {
                        denomx += 1;
                    }
                    if dy != 0.0 {
                        denomy += 1;
                    }
                }
            }
            if denomx == 0 || denomy == 0 {
                return 1.0;
            }
            1.0 - (con - dis) as f64 / ((denomx as f64) * (denomy as f64)).sqrt()
        }
    }
}

fn weighted_pearson(a: &Element, b: &Element, weights: &[f64]) -> f64 {
    let mut sumx = 0.0;
    let mut sumy = 0.0;
    let mut sumxx = 0.0;
    let mut sumyy = 0.0;
    let mut sumxy = 0.0;
    let mut tweight = 0.0;
    for i in 0..a.values.len() {
        if a.mask[i] && b.mask[i] {
            let w = weights[i];
            let x = a.values[i];
            let y = b.values[i];
            sumx += w * x;
            sumy += w * y;
            sumxx += w * x * x;
            sumyy += w * y * y;
            sumxy += w * x * y;
            tweight += w;
        }
    }
    if tweight == 0.0 {
        return 0.0;
    }
    let num = sumxy - sumx * sumy / tweight;
    let denomx = sumxx - sumx * sumx / tweight;
    let denomy = sumyy - sumy * sumy / tweight;
    if denomx <= 0.0 || denomy <= 0.0 {
        return 0.0;
    }
    num / (denomx * denomy).sqrt()
}

/// Fractional ranks, ties averaged.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| {
        values[i]
            .partial_cmp(&values[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut result = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0;
        for &k in &order[i..=j] {
            result[k] = rank;
        }
        i = j + 1;
    }
    result
}

/// Masked per-dimension means of a group of elements.
fn centroid(members: &[usize], elements: &[Element], ndim: usize) -> Element {
    let mut sums = vec![0.0; ndim];
    let mut counts = vec![0usize; ndim];
    for &m in members {
        for i in 0..ndim {
            if elements[m].mask[i] {
                sums[i] += elements[m].values[i];
                counts[i] += 1;
            }
        }
    }
    let mut e = Element {
        values: vec![0.0; ndim],
        mask: vec![false; ndim],
    };
    for i in 0..ndim {
        if counts[i] > 0 {
            e.values[i] = sums[i] / counts[i] as f64;
            e.mask[i] = true;
        }
    }
    e
}

struct Cluster {
    child: Child,
    size: usize,
    /// Elements of the cluster; only maintained for centroid linkage.
    members: Vec<usize>,
}

impl NumericProvider for BuiltinProvider {
    fn hierarchical_cluster(
        &self,
        matrix: &ExpressionMatrix,
        weights: &[f64],
        transpose: bool,
        metric: Metric,
        method: LinkageMethod,
    ) -> Result<Vec<MergeNode>> {
        let elements = extract_elements(matrix, transpose);
        let n = elements.len();
        if n < 2 {
            return Err(ClusterError::Constraint {
                reason: "hierarchical clustering needs at least two elements".to_string(),
            });
        }
        let ndim = elements[0].values.len();
        check_weights(weights, ndim)?;

        let mut dist = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..i {
                let d = distance(metric, &elements[i], &elements[j], weights);
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        let mut clusters: Vec<Cluster> = (0..n)
            .map(|i| Cluster {
                child: Child::Leaf(i),
                size: 1,
                members: vec![i],
            })
            .collect();
        let mut nodes = Vec::with_capacity(n - 1);

        while clusters.len() > 1 {
            // Deterministic: the first of the tied minimal pairs wins.
            let mut best = (0usize, 1usize);
            let mut best_d = dist[0][1];
            for i in 0..clusters.len() {
                for j in (i + 1)..clusters.len() {
                    if dist[i][j] < best_d {
                        best_d = dist[i][j];
                        best = (i, j);
                    }
                }
            }
            let (i, j) = best;
            nodes.push(MergeNode {
                left: clusters[i].child,
                right: clusters[j].child,
                distance: best_d,
            });

            let (si, sj) = (clusters[i].size as f64, clusters[j].size as f64);
            match method {
                LinkageMethod::Single => {
                    for k in 0..clusters.len() {
                        if k != i && k != j {
                            dist[i][k] = dist[i][k].min(dist[j][k]);
                            dist[k][i] = dist[i][k];
                        }
                    }
                }
                LinkageMethod::Complete => {
                    for k in 0..clusters.len() {
                        if k != i && k != j {
                            dist[i][k] = dist[i][k].max(dist[j][k]);
                            dist[k][i] = dist[i][k];
                        }
                    }
                }
                LinkageMethod::Average => {
                    for k in 0..clusters.len() {
                        if k != i && k != j {
                            dist[i][k] = (si * dist[i][k] + sj * dist[j][k]) / (si + sj);
                            dist[k][i] = dist[i][k];
                        }
                    }
                }
                LinkageMethod::Centroid => {
                    let mut members = clusters[i].members.clone();
                    members.extend_from_slice(&clusters[j].members);
                    let merged = centroid(&members, &elements, ndim);
                    for k in 0..clusters.len() {
                        if k != i && k != j {
                            let other = centroid(&clusters[k].members, &elements, ndim);
                            dist[i][k] = distance(metric, &merged, &other, weights);
                            dist[k][i] = dist[i][k];
                        }
                    }
                    clusters[i].members = members;
                }
            }
            clusters[i].child = Child::Node(nodes.len() - 1);
            clusters[i].size += clusters[j].size;

            clusters.remove(j);
            dist.remove(j);
            for row in dist.iter_mut() {
                row.remove(j);
            }
        }
        Ok(nodes)
    }

    fn kmeans_cluster(
        &self,
        matrix: &ExpressionMatrix,
        weights: &[f64],
        transpose: bool,
        k: usize,
        trials: usize,
        metric: Metric,
    ) -> Result<KMeansResult> {
        let elements = extract_elements(matrix, transpose);
        let n = elements.len();
        if k == 0 || k > n {
            return Err(ClusterError::Constraint {
                reason: format!("cannot partition {} elements into {} clusters", n, k),
            });
        }
        let ndim = elements[0].values.len();
        check_weights(weights, ndim)?;

        let mut rng = self.rng();
        let mut best_labels: Option<Vec<usize>> = None;
        let mut best_error = f64::INFINITY;
        let mut n_found = 0usize;

        for _ in 0..trials.max(1) {
            let mut labels = random_assignment(n, k, &mut rng);
            let mut sizes = vec![0usize; k];
            for &l in &labels {
                sizes[l] += 1;
            }

            for _ in 0..100 {
                let centroids: Vec<Element> = (0..k)
                    .map(|c| {
                        let members: Vec<usize> =
                            (0..n).filter(|&e| labels[e] == c).collect();
                        centroid(&members, &elements, ndim)
                    })
                    .collect();
                let mut changed = false;
                for e in 0..n {
                    let mut nearest = labels[e];
                    let mut nearest_d = distance(metric, &elements[e], &centroids[nearest], weights);
                    for c in 0..k {
                        let d = distance(metric, &elements[e], &centroids[c], weights);
                        if d < nearest_d {
                            nearest = c;
                            nearest_d = d;
                        }
                    }
                    // Never empty a cluster.
                    if nearest != labels[e] && sizes[labels[e]] > 1 {
                        sizes[labels[e]] -= 1;
                        sizes[nearest] += 1;
                        labels[e] = nearest;
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }

            let centroids: Vec<Element> = (0..k)
                .map(|c| {
                    let members: Vec<usize> = (0..n).filter(|&e| labels[e] == c).collect();
                    centroid(&members, &elements, ndim)
                })
                .collect();
            let error: f64 = (0..n)
                .map(|e| distance(metric, &elements[e], &centroids[labels[e]], weights))
                .sum();

            match &best_labels {
                Some(best) if canonical(best) == canonical(&labels) => n_found += 1,
                _ if error < best_error => {
                    best_error = error;
                    best_labels = Some(labels);
                    n_found = 1;
                }
                _ => {}
            }
        }

        let labels = best_labels.unwrap_or_default();
        Ok(KMeansResult {
            labels,
            best_error,
            n_found,
        })
    }

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
    ) -> Result<SomResult> {
        let elements = extract_elements(matrix, transpose);
        let n = elements.len();
        if n == 0 || nx == 0 || ny == 0 {
            return Err(ClusterError::Constraint {
                reason: "self-organizing map needs elements and a non-empty grid".to_string(),
            });
        }
        let ndim = elements[0].values.len();
        check_weights(weights, ndim)?;

        let mut rng = self.rng();
        let n_nodes = nx * ny;
        let mut nodes: Vec<Element> = (0..n_nodes)
            .map(|_| {
                let pick = &elements[rng.random_range(0..n)];
                let mut node = Element::present(ndim);
                for i in 0..ndim {
                    if pick.mask[i] {
                        node.values[i] = pick.values[i];
                    }
                }
                node
            })
            .collect();

        let max_radius = nx.max(ny) as f64;
        for t in 0..iterations {
            let fraction = 1.0 - t as f64 / iterations as f64;
            let alpha = tau * fraction;
            let radius = max_radius * fraction;
            let e = &elements[rng.random_range(0..n)];

            let (bx, by) = closest_node(e, &nodes, nx, ny, metric, weights);
            for gx in 0..nx {
                for gy in 0..ny {
                    let dx = gx as f64 - bx as f64;
                    let dy = gy as f64 - by as f64;
                    if (dx * dx + dy * dy).sqrt() < radius {
                        let node = &mut nodes[gx * ny + gy];
                        for i in 0..ndim {
                            if e.mask[i] {
                                node.values[i] += alpha * (e.values[i] - node.values[i]);
                            }
                        }
                    }
                }
            }
        }

        let best_match: Vec<(usize, usize)> = elements
            .iter()
            .map(|e| closest_node(e, &nodes, nx, ny, metric, weights))
            .collect();
        Ok(SomResult {
            nx,
            ny,
            node_weights: nodes.into_iter().map(|n| n.values).collect(),
            best_match,
        })
    }

    fn singular_value_decomposition(&self, dense: &Array2<f64>) -> Result<SvdResult> {
        let (nrows, ncols) = dense.dim();
        let m = DMatrix::from_fn(nrows, ncols, |i, j| dense[[i, j]]);
        let svd = m.svd(true, true);
        let u = svd.u.ok_or_else(|| ClusterError::Numeric {
            reason: "singular value decomposition did not produce U".to_string(),
        })?;
        let v_t = svd.v_t.ok_or_else(|| ClusterError::Numeric {
            reason: "singular value decomposition did not produce V".to_string(),
        })?;
        let nvals = svd.singular_values.len();
        let values: Vec<f64> = svd.singular_values.iter().copied().collect();
        let left = (0..nrows)
            .map(|i| (0..nvals).map(|k| u[(i, k)]).collect())
            .collect();
        let right = (0..ncols)
            .map(|j| (0..nvals).map(|k| v_t[(k, j)]).collect())
            .collect();
        Ok(SvdResult {
            left,
            values,
            right,
        })
    }
}

/// Random initial assignment with every cluster non-empty.
fn random_assignment(n: usize, k: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let mut labels = vec![0usize; n];
    for (slot, &e) in order.iter().enumerate() {
        labels[e] = if slot < k {
            slot
        } else {
            rng.random_range(0..k)
        };
    }
    labels
}

/// Relabel clusters by order of first appearance, so label permutations
/// compare equal.
fn canonical(labels: &[usize]) -> Vec<usize> {
    let mut map: Vec<Option<usize>> = vec![None; labels.len() + 1];
    let mut next = 0usize;
    labels
        .iter()
        .map(|&l| {
            *map[l].get_or_insert_with(|| {
                let id = next;
                next += 1;
                id
            })
        })
        .collect()
}

fn closest_node(
    e: &Element,
    nodes: &[Element],
    nx: usize,
    ny: usize,
    metric: Metric,
    weights: &[f64],
) -> (usize, usize) {
    let mut best = (0usize, 0usize);
    let mut best_d = f64::INFINITY;
    for gx in 0..nx {
        for gy in 0..ny {
            let d = distance(metric, e, &nodes[gx * ny + gy], weights);
            if d < best_d {
                best_d = d;
                best = (gx, gy);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn element(values: Vec<f64>) -> Element {
        Element {
            mask: vec![true; values.len()],
            values,
        }
    }

    #[test]
    fn test_self_distance_is_zero() {
        let e = element(vec![1.0, -2.0, 3.5, 0.25]);
        let w = vec![1.0; 4];
        for code in 1..=8 {
            let metric = Metric::from_code(code).unwrap();
            let d = distance(metric, &e, &e, &w);
            assert!(d.abs() < 1e-12, "{:?} self-distance was {}", metric, d);
        }
    }

    #[test]
    fn test_euclidean_is_weighted_mean_of_squares() {
        let a = element(vec![0.0, 0.0]);
        let b = element(vec![3.0, 4.0]);
        let d = distance(Metric::Euclidean, &a, &b, &[1.0, 1.0]);
        assert!((d - 12.5).abs() < 1e-12);
        let d = distance(Metric::Euclidean, &a, &b, &[1.0, 3.0]);
        assert!((d - (9.0 + 3.0 * 16.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_skips_missing_dimensions() {
        let a = Element {
            values: vec![1.0, 100.0],
            mask: vec![true, false],
        };
        let b = element(vec![4.0, 0.0]);
        let d = distance(Metric::CityBlock, &a, &b, &[1.0, 1.0]);
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_sign_and_abs_variant() {
        let a = element(vec![1.0, 2.0, 3.0]);
        let b = element(vec![3.0, 2.0, 1.0]);
        let w = vec![1.0; 3];
        let d = distance(Metric::Pearson, &a, &b, &w);
        assert!((d - 2.0).abs() < 1e-12, "perfect anticorrelation");
        let d = distance(Metric::AbsPearson, &a, &b, &w);
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn test_spearman_monotone_transform_invariant() {
        let a = element(vec![1.0, 2.0, 3.0, 4.0]);
        let b = element(vec![1.0, 4.0, 9.0, 16.0]);
        let d = distance(Metric::Spearman, &a, &b, &[1.0; 4]);
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn test_ranks_average_ties() {
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 30.0]), vec![0.0, 1.5, 1.5, 3.0]);
    }

    #[test]
    fn test_hierarchical_structure() {
        let matrix = ExpressionMatrix::dense(array![
            [0.0, 0.0],
            [0.1, 0.0],
            [10.0, 10.0],
            [10.1, 10.0],
        ]);
        let provider = BuiltinProvider::new();
        let nodes = provider
            .hierarchical_cluster(
                &matrix,
                &[1.0, 1.0],
                false,
                Metric::Euclidean,
                LinkageMethod::Average,
            )
            .unwrap();
        assert_eq!(nodes.len(), 3);
        // The two tight pairs merge before the final bridge.
        assert_eq!(nodes[0].left, Child::Leaf(0));
        assert_eq!(nodes[0].right, Child::Leaf(1));
        assert_eq!(nodes[1].left, Child::Leaf(2));
        assert_eq!(nodes[1].right, Child::Leaf(3));
        assert_eq!(nodes[2].left, Child::Node(0));
        assert_eq!(nodes[2].right, Child::Node(1));
        assert!(nodes[2].distance > nodes[0].distance);
    }

    #[test]
    fn test_hierarchical_transpose_clusters_columns() {
        let matrix = ExpressionMatrix::dense(array![[0.0, 0.1, 5.0], [1.0, 1.1, 9.0]]);
        let provider = BuiltinProvider::new();
        let nodes = provider
            .hierarchical_cluster(
                &matrix,
                &[1.0, 1.0],
                true,
                Metric::Euclidean,
                LinkageMethod::Single,
            )
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].left, Child::Leaf(0));
        assert_eq!(nodes[0].right, Child::Leaf(1));
    }

    #[test]
    fn test_single_element_axis_rejected() {
        let matrix = ExpressionMatrix::dense(array![[1.0, 2.0]]);
        let provider = BuiltinProvider::new();
        let result = provider.hierarchical_cluster(
            &matrix,
            &[1.0, 1.0],
            false,
            Metric::Euclidean,
            LinkageMethod::Single,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_kmeans_separates_obvious_clusters() {
        let matrix = ExpressionMatrix::dense(array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.05, 0.05],
            [8.0, 8.1],
            [8.1, 8.0],
        ]);
        let provider = BuiltinProvider::seeded(42);
        let result = provider
            .kmeans_cluster(&matrix, &[1.0, 1.0], false, 2, 5, Metric::Euclidean)
            .unwrap();
        assert_eq!(result.labels.len(), 5);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[0], result.labels[2]);
        assert_eq!(result.labels[3], result.labels[4]);
        assert_ne!(result.labels[0], result.labels[3]);
        assert!(result.n_found >= 1);
    }

    #[test]
    fn test_kmeans_rejects_k_larger_than_n() {
        let matrix = ExpressionMatrix::dense(array![[1.0], [2.0]]);
        let provider = BuiltinProvider::seeded(1);
        assert!(provider
            .kmeans_cluster(&matrix, &[1.0], false, 3, 1, Metric::Euclidean)
            .is_err());
    }

    #[test]
    fn test_canonical_labels_ignore_permutation() {
        assert_eq!(canonical(&[2, 2, 0, 1]), canonical(&[0, 0, 1, 2]));
        assert_ne!(canonical(&[0, 1, 0, 1]), canonical(&[0, 0, 1, 1]));
    }

    #[test]
    fn test_som_shapes_and_assignment() {
        let matrix = ExpressionMatrix::dense(array![
            [0.0, 0.0],
            [0.1, 0.1],
            [9.0, 9.0],
            [9.1, 9.1],
        ]);
        let provider = BuiltinProvider::seeded(7);
        let som = provider
            .self_organizing_map(&matrix, &[1.0, 1.0], false, 2, 1, 2000, 0.02, Metric::Euclidean)
            .unwrap();
        assert_eq!(som.node_weights.len(), 2);
        assert_eq!(som.node_weights[0].len(), 2);
        assert_eq!(som.best_match.len(), 4);
        for &(x, y) in &som.best_match {
            assert!(x < 2 && y < 1);
        }
        for node in &som.node_weights {
            assert!(node.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_svd_reconstructs_matrix() {
        let provider = BuiltinProvider::new();
        let dense = array![[3.0, 1.0], [1.0, 3.0], [2.0, 2.0]];
        let svd = provider.singular_value_decomposition(&dense).unwrap();
        assert_eq!(svd.values.len(), 2);
        assert_eq!(svd.left.len(), 3);
        assert_eq!(svd.right.len(), 2);
        for i in 0..3 {
            for j in 0..2 {
                let approx: f64 = (0..2)
                    .map(|k| svd.left[i][k] * svd.values[k] * svd.right[j][k])
                    .sum();
                assert!(
                    (approx - dense[[i, j]]).abs() < 1e-9,
                    "cell ({}, {}): {} vs {}",
                    i,
                    j,
                    approx,
                    dense[[i, j]]
                );
            }
        }
    }
}
