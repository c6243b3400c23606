//! rust_cluster3 command-line interface

use clap::Parser;
use log::{info, warn, LevelFilter};

use rust_cluster3::cli::Cli;
use rust_cluster3::prelude::*;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut ds = read_dataset(&cli.file)?;
    info!(
        "loaded {} genes x {} arrays from {}",
        ds.n_genes(),
        ds.n_arrays(),
        cli.file.display()
    );

    let row_filter = cli.row_filter();
    if row_filter.is_active() {
        ds = row_filter.apply(&ds)?;
    }

    if cli.log_transform {
        log_transform(ds.matrix_mut());
    }
    adjust_genes(ds.matrix_mut(), cli.center_genes, cli.normalize_genes);
    adjust_arrays(ds.matrix_mut(), cli.center_arrays, cli.normalize_arrays);

    let provider = match cli.seed {
        Some(seed) => BuiltinProvider::seeded(seed),
        None => BuiltinProvider::new(),
    };
    let job = cli.job();
    let gene_metric = Metric::from_code(cli.gene_metric);
    let array_metric = Metric::from_code(cli.array_metric);

    if cli.pca {
        run_pca(&ds, &provider, &job)?;
    } else if cli.som {
        run_som(
            &mut ds,
            &provider,
            gene_metric,
            array_metric,
            cli.som_x,
            cli.som_y,
            &job,
        )?;
    } else if let Some(k) = cli.k {
        run_kmeans(
            &mut ds,
            &provider,
            gene_metric,
            array_metric,
            k,
            cli.trials,
            &job,
        )?;
    } else if gene_metric.is_some() || array_metric.is_some() {
        run_hierarchical(&mut ds, &provider, gene_metric, array_metric, cli.method, &job)?;
    } else {
        warn!("no clustering requested (-g 0, -e 0, no -k/-s/--pca); nothing to do");
    }
    Ok(())
}
