//! End-to-end clustering runs: compute, reorder, write result files
//!
//! Each run takes the dataset through one clustering mode and writes the
//! corresponding output files next to the job name. A failure on one axis
//! or one output file is logged and skipped; the remaining outputs are
//! still produced.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::data::{Axis, ExpressionDataSet};
use crate::error::Result;
use crate::io::{
    save_array_clusters, save_array_pca, save_array_som_nodes, save_cdt, save_gene_clusters,
    save_gene_pca, save_gene_som_nodes, save_tree,
};
use crate::provider::{LinkageMethod, MergeNode, Metric, NumericProvider};

const SOM_TAU: f64 = 0.02;
const GENE_SOM_ITERATIONS: usize = 100_000;
const ARRAY_SOM_ITERATIONS: usize = 20_000;

/// Write one output file, logging instead of failing: a bad disk or path
/// must not abort the remaining outputs of a run.
fn write_output<F>(path: &str, write: F)
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let attempt = File::create(path)
        .map_err(crate::error::ClusterError::from)
        .and_then(|file| {
            let mut w = BufWriter::new(file);
            write(&mut w)?;
            w.flush()?;
            Ok(())
        });
    match attempt {
        Ok(()) => log::info!("wrote {}", path),
        Err(e) => log::error!("failed to write {}: {}", path, e),
    }
}

/// Distance-family merge heights are rescaled so the deepest merge sits at
/// 1.0 before the similarity scores are written. Display only, the tree
/// structure is unchanged.
fn rescale_distances(nodes: &mut [MergeNode]) {
    let max = nodes.iter().map(|n| n.distance).fold(0.0, f64::max);
    if max > 0.0 {
        for node in nodes.iter_mut() {
            node.distance /= max;
        }
    }
}

fn cluster_tree(
    ds: &mut ExpressionDataSet,
    provider: &dyn NumericProvider,
    axis: Axis,
    metric: Metric,
    method: LinkageMethod,
) -> Result<Vec<MergeNode>> {
    let (transpose, weights) = match axis {
        Axis::Gene => (false, ds.arrays().weights().to_vec()),
        Axis::Array => (true, ds.genes().weights().to_vec()),
    };
    let mut nodes = provider.hierarchical_cluster(ds.matrix(), &weights, transpose, metric, method)?;
    if metric.is_distance_family() {
        rescale_distances(&mut nodes);
    }
    ds.set_tree_index(axis, &nodes)?;
    Ok(nodes)
}

/// Hierarchical clustering: `.gtr`/`.atr` per clustered axis plus the
/// reordered `.cdt` table.
pub fn run_hierarchical(
    ds: &mut ExpressionDataSet,
    provider: &dyn NumericProvider,
    gene_metric: Option<Metric>,
    array_metric: Option<Metric>,
    method: LinkageMethod,
    job: &str,
) -> Result<()> {
    let mut gene_id = false;
    let mut array_id = false;
    if let Some(metric) = gene_metric {
        match cluster_tree(ds, provider, Axis::Gene, metric, method) {
            Ok(nodes) => {
                write_output(&format!("{}.gtr", job), |w| save_tree(w, Axis::Gene, &nodes));
                gene_id = true;
            }
            Err(e) => log::error!("gene clustering failed: {}", e),
        }
    }
    if let Some(metric) = array_metric {
        match cluster_tree(ds, provider, Axis::Array, metric, method) {
            Ok(nodes) => {
                write_output(&format!("{}.atr", job), |w| save_tree(w, Axis::Array, &nodes));
                array_id = true;
            }
            Err(e) => log::error!("array clustering failed: {}", e),
        }
    }
    write_output(&format!("{}.cdt", job), |w| save_cdt(w, ds, gene_id, array_id));
    Ok(())
}

/// k-means partitioning: `.kgg`/`.kag` per clustered axis plus a `.cdt`
/// with members grouped by cluster.
pub fn run_kmeans(
    ds: &mut ExpressionDataSet,
    provider: &dyn NumericProvider,
    gene_metric: Option<Metric>,
    array_metric: Option<Metric>,
    k: usize,
    trials: usize,
    job: &str,
) -> Result<()> {
    let mut base = format!("{}_K", job);
    if gene_metric.is_some() {
        base.push_str(&format!("_G{}", k));
    }
    if array_metric.is_some() {
        base.push_str(&format!("_A{}", k));
    }
    if let Some(metric) = gene_metric {
        let weights = ds.arrays().weights().to_vec();
        match provider.kmeans_cluster(ds.matrix(), &weights, false, k, trials, metric) {
            Ok(result) => {
                log::info!(
                    "gene k-means: best solution found {} of {} times (within-cluster error {:.6})",
                    result.n_found,
                    trials,
                    result.best_error
                );
                write_output(&format!("{}_K_G{}.kgg", job, k), |w| {
                    save_gene_clusters(w, ds, &result.labels, k)
                });
                ds.set_cluster_index(Axis::Gene, &result.labels, k)?;
            }
            Err(e) => log::error!("gene k-means failed: {}", e),
        }
    }
    if let Some(metric) = array_metric {
        let weights = ds.genes().weights().to_vec();
        match provider.kmeans_cluster(ds.matrix(), &weights, true, k, trials, metric) {
            Ok(result) => {
                log::info!(
                    "array k-means: best solution found {} of {} times (within-cluster error {:.6})",
                    result.n_found,
                    trials,
                    result.best_error
                );
                write_output(&format!("{}_K_A{}.kag", job, k), |w| {
                    save_array_clusters(w, ds, &result.labels, k)
                });
                ds.set_cluster_index(Axis::Array, &result.labels, k)?;
            }
            Err(e) => log::error!("array k-means failed: {}", e),
        }
    }
    write_output(&format!("{}.cdt", base), |w| save_cdt(w, ds, false, false));
    Ok(())
}

/// SOM training: `.gnf`/`.anf` node tables per clustered axis plus a `.txt`
/// matrix table with members grouped by their best-matching node.
pub fn run_som(
    ds: &mut ExpressionDataSet,
    provider: &dyn NumericProvider,
    gene_metric: Option<Metric>,
    array_metric: Option<Metric>,
    nx: usize,
    ny: usize,
    job: &str,
) -> Result<()> {
    let mut base = format!("{}_SOM", job);
    if gene_metric.is_some() {
        base.push_str(&format!("_G{}-{}", nx, ny));
    }
    if array_metric.is_some() {
        base.push_str(&format!("_A{}-{}", nx, ny));
    }
    let k = nx * ny;
    if let Some(metric) = gene_metric {
        let weights = ds.arrays().weights().to_vec();
        match provider.self_organizing_map(
            ds.matrix(),
            &weights,
            false,
            nx,
            ny,
            GENE_SOM_ITERATIONS,
            SOM_TAU,
            metric,
        ) {
            Ok(som) => {
                write_output(&format!("{}.gnf", base), |w| save_gene_som_nodes(w, ds, &som));
                let labels: Vec<usize> = (0..ds.n_genes()).map(|g| som.cluster_of(g)).collect();
                ds.set_cluster_index(Axis::Gene, &labels, k)?;
            }
            Err(e) => log::error!("gene SOM failed: {}", e),
        }
    }
    if let Some(metric) = array_metric {
        let weights = ds.genes().weights().to_vec();
        match provider.self_organizing_map(
            ds.matrix(),
            &weights,
            true,
            nx,
            ny,
            ARRAY_SOM_ITERATIONS,
            SOM_TAU,
            metric,
        ) {
            Ok(som) => {
                write_output(&format!("{}.anf", base), |w| save_array_som_nodes(w, ds, &som));
                let labels: Vec<usize> = (0..ds.n_arrays()).map(|a| som.cluster_of(a)).collect();
                ds.set_cluster_index(Axis::Array, &labels, k)?;
            }
            Err(e) => log::error!("array SOM failed: {}", e),
        }
    }
    write_output(&format!("{}.txt", base), |w| save_cdt(w, ds, false, false));
    Ok(())
}

/// Principal component analysis over the row-normalized matrix, writing the
/// gene and array coordinate tables.
pub fn run_pca(ds: &ExpressionDataSet, provider: &dyn NumericProvider, job: &str) -> Result<()> {
    let mut dense = ndarray::Array2::<f64>::zeros((ds.n_genes(), ds.n_arrays()));
    for row in 0..ds.n_genes() {
        let magnitude: f64 = ds
            .matrix()
            .present_in_row(row)
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt();
        for column in 0..ds.n_arrays() {
            if let Some(v) = ds.matrix().get(row, column) {
                dense[[row, column]] = if magnitude > 0.0 { v / magnitude } else { v };
            }
        }
    }
    let svd = provider.singular_value_decomposition(&dense)?;
    write_output(&format!("{}_pca_gene.txt", job), |w| save_gene_pca(w, ds, &svd));
    write_output(&format!("{}_pca_array.txt", job), |w| save_array_pca(w, ds, &svd));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_dataset;
    use crate::provider::BuiltinProvider;
    use std::fs;
    use tempfile::tempdir;

    fn dataset() -> ExpressionDataSet {
        let text = "UNIQID\tc1\tc2\tc3\n\
                    g1\t0.0\t0.1\t0.2\n\
                    g2\t0.1\t0.2\t0.1\n\
                    g3\t5.0\t5.1\t5.2\n\
                    g4\t5.1\t5.0\t5.1\n";
        load_dataset(&mut text.as_bytes()).unwrap()
    }

    #[test]
    fn test_hierarchical_writes_tree_and_table() {
        let dir = tempdir().unwrap();
        let job = dir.path().join("demo").to_string_lossy().into_owned();
        let mut ds = dataset();
        run_hierarchical(
            &mut ds,
            &BuiltinProvider::new(),
            Some(Metric::Euclidean),
            None,
            LinkageMethod::Average,
            &job,
        )
        .unwrap();

        let gtr = fs::read_to_string(format!("{}.gtr", job)).unwrap();
        assert_eq!(gtr.lines().count(), 3, "n - 1 merge rows");
        assert!(gtr.starts_with("NODE1X\t"));

        let cdt = fs::read_to_string(format!("{}.cdt", job)).unwrap();
        assert!(cdt.starts_with("GID\t"), "gene ids present when genes clustered");
        assert!(!cdt.contains("AID"), "no array ids without array clustering");
        assert!(!dir.path().join("demo.atr").exists());
    }

    #[test]
    fn test_hierarchical_distance_scores_rescaled() {
        let dir = tempdir().unwrap();
        let job = dir.path().join("demo").to_string_lossy().into_owned();
        let mut ds = dataset();
        run_hierarchical(
            &mut ds,
            &BuiltinProvider::new(),
            Some(Metric::Euclidean),
            None,
            LinkageMethod::Single,
            &job,
        )
        .unwrap();
        let gtr = fs::read_to_string(format!("{}.gtr", job)).unwrap();
        // The deepest merge rescales to distance 1, i.e. similarity 0.
        assert!(gtr.lines().last().unwrap().ends_with("0.000000"));
    }

    #[test]
    fn test_kmeans_filenames_and_grouping() {
        let dir = tempdir().unwrap();
        let job = dir.path().join("demo").to_string_lossy().into_owned();
        let mut ds = dataset();
        run_kmeans(
            &mut ds,
            &BuiltinProvider::seeded(11),
            Some(Metric::Euclidean),
            None,
            2,
            3,
            &job,
        )
        .unwrap();

        let kgg = fs::read_to_string(format!("{}_K_G2.kgg", job)).unwrap();
        assert!(kgg.starts_with("UNIQID\tGROUP\n"));
        assert_eq!(kgg.lines().count(), 5);

        let cdt = fs::read_to_string(format!("{}_K_G2.cdt", job)).unwrap();
        let rows: Vec<&str> = cdt.lines().skip(2).collect();
        // Cluster members are adjacent in the reordered table.
        let g1 = rows.iter().position(|r| r.starts_with("g1\t")).unwrap();
        let g2 = rows.iter().position(|r| r.starts_with("g2\t")).unwrap();
        assert_eq!(g1.abs_diff(g2), 1);
    }

    #[test]
    fn test_kmeans_too_many_clusters_still_writes_table() {
        let dir = tempdir().unwrap();
        let job = dir.path().join("demo").to_string_lossy().into_owned();
        let mut ds = dataset();
        run_kmeans(
            &mut ds,
            &BuiltinProvider::seeded(3),
            Some(Metric::Euclidean),
            None,
            10,
            1,
            &job,
        )
        .unwrap();
        assert!(!dir.path().join("demo_K_G10.kgg").exists());
        assert!(dir.path().join("demo_K_G10.cdt").exists());
    }

    #[test]
    fn test_som_filenames() {
        let dir = tempdir().unwrap();
        let job = dir.path().join("demo").to_string_lossy().into_owned();
        let mut ds = dataset();
        run_som(
            &mut ds,
            &BuiltinProvider::seeded(5),
            Some(Metric::Euclidean),
            None,
            2,
            1,
            &job,
        )
        .unwrap();
        let gnf = fs::read_to_string(format!("{}_SOM_G2-1.gnf", job)).unwrap();
        assert!(gnf.starts_with("NODE\tc1\tc2\tc3\n"));
        assert_eq!(gnf.lines().count(), 3);
        assert!(dir.path().join("demo_SOM_G2-1.txt").exists());
    }

    #[test]
    fn test_pca_outputs() {
        let dir = tempdir().unwrap();
        let job = dir.path().join("demo").to_string_lossy().into_owned();
        let ds = dataset();
        run_pca(&ds, &BuiltinProvider::new(), &job).unwrap();

        let gene = fs::read_to_string(format!("{}_pca_gene.txt", job)).unwrap();
        assert!(gene.starts_with("UNIQID\tNAME\tGWEIGHT\t"));
        assert_eq!(gene.lines().count(), 5);

        let array = fs::read_to_string(format!("{}_pca_array.txt", job)).unwrap();
        assert!(array.starts_with("EIGVALUE\tc1\tc2\tc3\n"));
        assert_eq!(array.lines().count(), 4, "header plus one row per singular value");
    }
}
