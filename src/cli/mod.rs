//! Command-line interface for rust_cluster3

use std::path::PathBuf;

use clap::Parser;

use crate::filter::{ExtremeFilter, RowFilter};
use crate::provider::LinkageMethod;
use crate::transform::Centering;

fn parse_centering(s: &str) -> Result<Centering, String> {
    match s {
        "a" => Ok(Centering::Mean),
        "m" => Ok(Centering::Median),
        _ => Err(format!("expected 'a' (mean) or 'm' (median), got '{}'", s)),
    }
}

fn parse_method(s: &str) -> Result<LinkageMethod, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => LinkageMethod::from_char(c)
            .ok_or_else(|| format!("expected one of s, m, a, c, got '{}'", s)),
        _ => Err(format!("expected a single character, got '{}'", s)),
    }
}

#[derive(Parser)]
#[command(name = "rust_cluster3")]
#[command(version)]
#[command(about = "Hierarchical, k-means and SOM clustering of expression data")]
#[command(
    long_about = "Hierarchical, k-means and SOM clustering of expression data\n\n\
        Reads a tab-delimited expression matrix, optionally filters and adjusts it,\n\
        clusters genes and/or arrays, and writes the result files (.cdt, .gtr, .atr,\n\
        .kgg, .kag, SOM node files, PCA coordinate files) next to the job name.",
    after_long_help = "\
Examples:
  # Hierarchical clustering of genes, uncentered correlation, complete linkage
  rust_cluster3 -f expression.txt

  # Log transform, mean-center genes, cluster both axes with Pearson correlation
  rust_cluster3 -f expression.txt -l --cg a -g 2 -e 2

  # k-means with 6 gene clusters, best of 20 runs
  rust_cluster3 -f expression.txt -k 6 -r 20

  # 4x3 self-organizing map over genes
  rust_cluster3 -f expression.txt -s -x 4 -y 3

  # Principal component analysis
  rust_cluster3 -f expression.txt --pca"
)]
pub struct Cli {
    /// Input expression file (tab-delimited)
    #[arg(short, long,
        long_help = "Input expression file.\n\
            Tab-delimited: first row = column headers, first column = gene ids.\n\
            Recognizes the optional NAME, GWEIGHT and GORDER columns and the\n\
            optional EWEIGHT and EORDER rows. Empty cells are missing values.")]
    pub file: PathBuf,

    /// Job name for output files (default: input file name without extension)
    #[arg(short = 'u', long = "jobname")]
    pub job_name: Option<String>,

    /// Apply a base-2 log transform before anything else
    #[arg(short = 'l', long = "log")]
    pub log_transform: bool,

    /// Center each gene: a = mean, m = median
    #[arg(long = "cg", value_name = "a|m", value_parser = parse_centering)]
    pub center_genes: Option<Centering>,

    /// Normalize each gene to unit length
    #[arg(long = "ng")]
    pub normalize_genes: bool,

    /// Center each array: a = mean, m = median
    #[arg(long = "ca", value_name = "a|m", value_parser = parse_centering)]
    pub center_arrays: Option<Centering>,

    /// Normalize each array to unit length
    #[arg(long = "na")]
    pub normalize_arrays: bool,

    /// Distance measure for gene clustering (0 = do not cluster genes)
    #[arg(short = 'g', long = "gene-metric", default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=8),
        long_help = "Distance measure for gene clustering:\n\
            0 = do not cluster genes\n\
            1 = uncentered correlation\n\
            2 = Pearson correlation\n\
            3 = uncentered correlation, absolute value\n\
            4 = Pearson correlation, absolute value\n\
            5 = Spearman rank correlation\n\
            6 = Kendall's tau\n\
            7 = Euclidean distance\n\
            8 = city-block distance")]
    pub gene_metric: u8,

    /// Distance measure for array clustering (0 = do not cluster arrays)
    #[arg(short = 'e', long = "array-metric", default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=8),
        long_help = "Distance measure for array clustering, same codes as -g.\n\
            0 (the default) leaves the arrays unclustered.")]
    pub array_metric: u8,

    /// Hierarchical linkage: s = single, m = complete, a = average, c = centroid
    #[arg(short = 'm', long = "method", default_value = "m", value_name = "s|m|a|c",
        value_parser = parse_method)]
    pub method: LinkageMethod,

    /// Run k-means with this many clusters instead of hierarchical clustering
    #[arg(short = 'k', long = "kmeans", value_name = "N")]
    pub k: Option<usize>,

    /// Number of k-means trials; the best solution is kept
    #[arg(short = 'r', long = "trials", default_value_t = 1)]
    pub trials: usize,

    /// Train a self-organizing map instead of hierarchical clustering
    #[arg(short = 's', long = "som")]
    pub som: bool,

    /// SOM grid width
    #[arg(short = 'x', default_value_t = 2, value_name = "N")]
    pub som_x: usize,

    /// SOM grid height
    #[arg(short = 'y', default_value_t = 1, value_name = "N")]
    pub som_y: usize,

    /// Run principal component analysis instead of clustering
    #[arg(long)]
    pub pca: bool,

    /// Keep genes with at least this percentage of values present
    #[arg(long = "min-present", value_name = "PCT")]
    pub min_percent_present: Option<f64>,

    /// Keep genes with at least this sample standard deviation
    #[arg(long = "min-std", value_name = "SD")]
    pub min_std: Option<f64>,

    /// Keep genes with at least N observations of magnitude --min-obs-value
    #[arg(long = "min-obs", value_name = "N", requires = "min_obs_value")]
    pub min_obs: Option<usize>,

    /// Magnitude threshold for --min-obs
    #[arg(long = "min-obs-value", value_name = "VAL", requires = "min_obs")]
    pub min_obs_value: Option<f64>,

    /// Keep genes whose max - min is at least this large
    #[arg(long = "min-range", value_name = "RANGE")]
    pub min_range: Option<f64>,

    /// Seed for the randomized routines (k-means, SOM)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Output file base: the -u override, or the input path with its
    /// extension stripped.
    pub fn job(&self) -> String {
        match &self.job_name {
            Some(name) => name.clone(),
            None => self.file.with_extension("").to_string_lossy().into_owned(),
        }
    }

    pub fn row_filter(&self) -> RowFilter {
        RowFilter {
            min_percent_present: self.min_percent_present,
            min_std: self.min_std,
            min_extreme: match (self.min_obs, self.min_obs_value) {
                (Some(count), Some(threshold)) => Some(ExtremeFilter { count, threshold }),
                _ => None,
            },
            min_range: self.min_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["rust_cluster3", "-f", "data.txt"]).unwrap();
        assert_eq!(cli.gene_metric, 1);
        assert_eq!(cli.array_metric, 0);
        assert_eq!(cli.method, LinkageMethod::Complete);
        assert_eq!(cli.trials, 1);
        assert!(!cli.som);
        assert!(!cli.pca);
        assert_eq!(cli.job(), "data");
    }

    #[test]
    fn test_jobname_override() {
        let cli =
            Cli::try_parse_from(["rust_cluster3", "-f", "dir/data.txt", "-u", "out/run1"]).unwrap();
        assert_eq!(cli.job(), "out/run1");
    }

    #[test]
    fn test_metric_range_enforced() {
        assert!(Cli::try_parse_from(["rust_cluster3", "-f", "d.txt", "-g", "9"]).is_err());
    }

    #[test]
    fn test_method_and_centering_parsers() {
        let cli = Cli::try_parse_from([
            "rust_cluster3", "-f", "d.txt", "-m", "a", "--cg", "m", "--ca", "a",
        ])
        .unwrap();
        assert_eq!(cli.method, LinkageMethod::Average);
        assert_eq!(cli.center_genes, Some(Centering::Median));
        assert_eq!(cli.center_arrays, Some(Centering::Mean));
        assert!(Cli::try_parse_from(["rust_cluster3", "-f", "d.txt", "-m", "x"]).is_err());
        assert!(Cli::try_parse_from(["rust_cluster3", "-f", "d.txt", "--cg", "q"]).is_err());
    }

    #[test]
    fn test_extreme_filter_requires_both_flags() {
        assert!(Cli::try_parse_from(["rust_cluster3", "-f", "d.txt", "--min-obs", "3"]).is_err());
        let cli = Cli::try_parse_from([
            "rust_cluster3", "-f", "d.txt", "--min-obs", "3", "--min-obs-value", "2.0",
        ])
        .unwrap();
        let filter = cli.row_filter();
        assert!(filter.is_active());
        assert_eq!(filter.min_extreme.unwrap().count, 3);
    }
}
