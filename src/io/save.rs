//! Writers for the clustering result file formats
//!
//! Layouts match Cluster 3.0's outputs cell for cell (`%f` formatting,
//! missing cells as empty fields). Every writer iterates genes and arrays
//! through the dataset's current order permutations and never reorders
//! storage itself.

use std::io::Write;

use crate::data::{Axis, ExpressionDataSet};
use crate::error::Result;
use crate::order;
use crate::provider::{Child, MergeNode, SomResult, SvdResult};

/// Synthesized element id, e.g. `GENE4X`, `ARRY0X`, `NODE7X`.
/// Cluster 3.0 equivalent: MakeID() in data.c.
fn make_id(keyword: &str, i: usize) -> String {
    format!("{}{}X", keyword, i)
}

fn child_id(keyword: &str, child: Child) -> String {
    match child {
        Child::Leaf(i) => make_id(keyword, i),
        Child::Node(k) => make_id("NODE", k + 1),
    }
}

/// Write the main matrix table (`.cdt`). `gene_id`/`array_id` add the
/// GID column and AID row of synthesized ids that tie the table to the
/// `.gtr`/`.atr` files.
/// Cluster 3.0 equivalent: Save() in data.c.
pub fn save_cdt<W: Write>(
    w: &mut W,
    ds: &ExpressionDataSet,
    gene_id: bool,
    array_id: bool,
) -> Result<()> {
    let genes = ds.genes();
    let arrays = ds.arrays();

    if gene_id {
        write!(w, "GID\t")?;
    }
    write!(w, "{}\tNAME\tGWEIGHT", genes.label())?;
    for &column in ds.array_index() {
        write!(w, "\t{}", arrays.id(column))?;
    }
    writeln!(w)?;

    if array_id {
        write!(w, "AID")?;
        if gene_id {
            write!(w, "\t")?;
        }
        write!(w, "\t\t")?;
        for &column in ds.array_index() {
            write!(w, "\t{}", make_id("ARRY", column))?;
        }
        writeln!(w)?;
    }

    write!(w, "EWEIGHT")?;
    if gene_id {
        write!(w, "\t")?;
    }
    write!(w, "\t\t")?;
    for &column in ds.array_index() {
        write!(w, "\t{:.6}", arrays.weight(column))?;
    }
    writeln!(w)?;

    for &row in ds.gene_index() {
        if gene_id {
            write!(w, "{}\t", make_id("GENE", row))?;
        }
        write!(
            w,
            "{}\t{}\t{:.6}",
            genes.id(row),
            genes.display_name(row),
            genes.weight(row)
        )?;
        for &column in ds.array_index() {
            match ds.matrix().get(row, column) {
                Some(value) => write!(w, "\t{:.6}", value)?,
                None => write!(w, "\t")?,
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Write a dendrogram table (`.gtr`/`.atr`): one row per merge node with
/// its synthesized id, the two child ids and the similarity score
/// `1 - distance`. A node's distance is max-propagated over its children
/// so the printed scores never invert along a branch.
pub fn save_tree<W: Write>(w: &mut W, axis: Axis, nodes: &[MergeNode]) -> Result<()> {
    let keyword = match axis {
        Axis::Gene => "GENE",
        Axis::Array => "ARRY",
    };
    let mut resolved = vec![0.0f64; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        let mut distance = node.distance;
        for child in [node.left, node.right] {
            if let Child::Node(k) = child {
                distance = distance.max(resolved[k]);
            }
        }
        resolved[i] = distance;
        writeln!(
            w,
            "{}\t{}\t{}\t{:.6}",
            make_id("NODE", i + 1),
            child_id(keyword, node.left),
            child_id(keyword, node.right),
            1.0 - distance
        )?;
    }
    Ok(())
}

/// Write a gene partition table (`.kgg`): clusters in id order, members
/// sorted by order key.
/// Cluster 3.0 equivalent: SaveGeneKCluster() in data.c.
pub fn save_gene_clusters<W: Write>(
    w: &mut W,
    ds: &ExpressionDataSet,
    labels: &[usize],
    k: usize,
) -> Result<()> {
    writeln!(w, "{}\tGROUP", ds.genes().label())?;
    for row in order::cluster_index(ds.genes().order_keys(), labels, k)? {
        writeln!(w, "{}\t{}", ds.genes().id(row), labels[row])?;
    }
    Ok(())
}

/// Write an array partition table (`.kag`).
/// Cluster 3.0 equivalent: SaveArrayKCluster() in data.c.
pub fn save_array_clusters<W: Write>(
    w: &mut W,
    ds: &ExpressionDataSet,
    labels: &[usize],
    k: usize,
) -> Result<()> {
    writeln!(w, "ARRAY\tGROUP")?;
    for column in order::cluster_index(ds.arrays().order_keys(), labels, k)? {
        writeln!(w, "{}\t{}", ds.arrays().id(column), labels[column])?;
    }
    Ok(())
}

/// Write the gene-SOM node table (`.gnf`): one row per grid node with its
/// weight vector, columns ordered by array order key.
pub fn save_gene_som_nodes<W: Write>(
    w: &mut W,
    ds: &ExpressionDataSet,
    som: &SomResult,
) -> Result<()> {
    let columns = order::sorted_by_key(ds.arrays().order_keys());
    write!(w, "NODE")?;
    for &column in &columns {
        write!(w, "\t{}", ds.arrays().id(column))?;
    }
    writeln!(w)?;
    for i in 0..som.nx {
        for j in 0..som.ny {
            write!(w, "NODE({},{})", i, j)?;
            let weights = &som.node_weights[i * som.ny + j];
            for &column in &columns {
                write!(w, "\t{:.6}", weights[column])?;
            }
            writeln!(w)?;
        }
    }
    Ok(())
}

/// Write the array-SOM node table (`.anf`): one row per gene in display
/// order, one column per grid node.
pub fn save_array_som_nodes<W: Write>(
    w: &mut W,
    ds: &ExpressionDataSet,
    som: &SomResult,
) -> Result<()> {
    write!(w, "{}\t", ds.genes().label())?;
    for i in 0..som.nx {
        for j in 0..som.ny {
            write!(w, "\tNODE({},{})", i, j)?;
        }
    }
    writeln!(w)?;
    for &row in ds.gene_index() {
        write!(w, "{}\t{}", ds.genes().id(row), ds.genes().display_name(row))?;
        for i in 0..som.nx {
            for j in 0..som.ny {
                write!(w, "\t{:.6}", som.node_weights[i * som.ny + j][row])?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Indices of singular values, largest first. Ties keep index order.
fn descending_values(values: &[f64]) -> Vec<usize> {
    let negated: Vec<f64> = values.iter().map(|&v| -v).collect();
    order::sorted_by_key(&negated)
}

/// Write the per-array principal component table: one row per singular
/// value (descending) with the right-singular-vector loadings.
/// Cluster 3.0 equivalent: SaveArrayPCA() in data.c.
pub fn save_array_pca<W: Write>(w: &mut W, ds: &ExpressionDataSet, svd: &SvdResult) -> Result<()> {
    write!(w, "EIGVALUE")?;
    for column in 0..ds.n_arrays() {
        write!(w, "\t{}", ds.arrays().id(column))?;
    }
    writeln!(w)?;
    for &v in &descending_values(&svd.values) {
        write!(w, "{:.6}", svd.values[v])?;
        for column in 0..ds.n_arrays() {
            write!(w, "\t{:.6}", svd.right[column][v])?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Write the per-gene principal component table: one row per gene with the
/// left-singular-vector loadings, components in descending-value order.
/// Cluster 3.0 equivalent: SaveGenePCA() in data.c.
pub fn save_gene_pca<W: Write>(w: &mut W, ds: &ExpressionDataSet, svd: &SvdResult) -> Result<()> {
    let components = descending_values(&svd.values);
    write!(w, "{}\tNAME\tGWEIGHT", ds.genes().label())?;
    for &v in &components {
        write!(w, "\t{:.6}", svd.values[v])?;
    }
    writeln!(w)?;
    for row in 0..ds.n_genes() {
        write!(
            w,
            "{}\t{}\t{:.6}",
            ds.genes().id(row),
            ds.genes().display_name(row),
            ds.genes().weight(row)
        )?;
        for &v in &components {
            write!(w, "\t{:.6}", svd.left[row][v])?;
        }
        writeln!(w)?;
    }
    Ok(())
}
