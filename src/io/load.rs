//! Loader for the tab-delimited expression file format
//!
//! The format is the classic Cluster 3.0 layout: a header row naming the
//! gene identifier keyword and the arrays, optional reserved columns
//! (`NAME`, `GWEIGHT`, `GORDER`) anywhere after the first cell, optional
//! reserved rows (`EWEIGHT`, `EORDER`) anywhere after the header, and one
//! data row per gene with empty cells marking missing values.
//!
//! Loading is two-phase: the header is compiled into a column-role table,
//! every line is validated against it, and only then is storage allocated
//! and populated. A failed load leaves no partial dataset behind.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::Array2;

use crate::data::{AxisMetadata, ExpressionDataSet, ExpressionMatrix};
use crate::error::{ClusterError, Result};

/// What a header cell after the first one stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    /// Gene display name (`NAME`).
    Name,
    /// Gene weight (`GWEIGHT`).
    Weight,
    /// Gene order key (`GORDER`).
    Order,
    /// Expression value for data column `i`.
    Data(usize),
}

/// Column layout inferred from the header line.
struct Schema {
    /// The user's keyword from the first header cell (stands in for
    /// "UNIQID").
    label: String,
    /// Array identifiers, one per data column.
    array_ids: Vec<String>,
    /// Roles of the file columns after the first, in file order.
    roles: Vec<ColumnRole>,
    /// Total number of fields every row must have.
    n_file_columns: usize,
}

/// Load a dataset from a file on disk.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<ExpressionDataSet> {
    let mut file = File::open(path)?;
    load_dataset(&mut file)
}

/// Load a dataset from any reader holding the tab-delimited text format.
pub fn load_dataset<R: Read>(reader: &mut R) -> Result<ExpressionDataSet> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    if text.is_empty() {
        return Err(ClusterError::parse(1, "attempt to read an empty file"));
    }

    // CR, LF and CRLF line endings are all accepted.
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    parse_lines(&lines)
}

fn parse_lines(lines: &[&str]) -> Result<ExpressionDataSet> {
    // Header = first non-blank line.
    let (header_line_no, header) = lines
        .iter()
        .enumerate()
        .map(|(i, l)| (i + 1, *l))
        .find(|(_, l)| !l.is_empty())
        .ok_or_else(|| ClusterError::parse(1, "failed to find the first line in the file"))?;

    let schema = parse_header(header_line_no, header)?;

    // Validation pass: row counts and structure, before any allocation.
    let mut n_genes = 0usize;
    for (line_no, line) in numbered_body(lines, header_line_no) {
        let fields: Vec<&str> = line.split('\t').collect();
        let first = fields[0];
        if first == "EWEIGHT" || first == "EORDER" {
            // Special metadata row, not a gene.
        } else if first.is_empty() {
            return Err(ClusterError::parse(line_no, "Gene name is missing"));
        } else {
            n_genes += 1;
        }
        if fields.len() < schema.n_file_columns {
            return Err(ClusterError::parse(
                line_no,
                format!(
                    "only {} columns available ({} needed)",
                    fields.len(),
                    schema.n_file_columns
                ),
            ));
        }
        if fields.len() > schema.n_file_columns {
            return Err(ClusterError::parse(
                line_no,
                format!(
                    "{} columns given ({} needed)",
                    fields.len(),
                    schema.n_file_columns
                ),
            ));
        }
    }

    // Population pass.
    let n_columns = schema.array_ids.len();
    let mut values = Array2::<f64>::zeros((n_genes, n_columns));
    let mut mask = Array2::<bool>::from_elem((n_genes, n_columns), false);
    let mut gene_ids: Vec<String> = Vec::with_capacity(n_genes);
    let mut gene_names: Vec<Option<String>> = Vec::with_capacity(n_genes);
    let mut gene_weights: Vec<f64> = Vec::with_capacity(n_genes);
    let mut gene_order: Vec<f64> = Vec::with_capacity(n_genes);
    let mut array_weights: Vec<f64> = vec![1.0; n_columns];
    let mut array_order: Vec<f64> = (0..n_columns).map(|c| c as f64).collect();

    for (_, line) in numbered_body(lines, header_line_no) {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "EWEIGHT" => decode_special_row(&schema, &fields, &mut array_weights),
            "EORDER" => decode_special_row(&schema, &fields, &mut array_order),
            id => {
                let row = gene_ids.len();
                gene_ids.push(id.to_string());
                // Defaults apply when the file has no NAME/GWEIGHT/GORDER
                // column at all; a present-but-unparsable weight or order
                // cell deliberately becomes 0.0 instead.
                let mut name: Option<String> = None;
                let mut weight = 1.0;
                let mut order = row as f64;
                for (cell, &role) in fields[1..].iter().zip(&schema.roles) {
                    match role {
                        ColumnRole::Name => name = Some(cell.to_string()),
                        ColumnRole::Weight => weight = cell.parse().unwrap_or(0.0),
                        ColumnRole::Order => order = cell.parse().unwrap_or(0.0),
                        ColumnRole::Data(c) => {
                            // Empty = missing; unparsable is treated as
                            // missing as well.
                            if let Ok(v) = cell.parse::<f64>() {
                                values[[row, c]] = v;
                                mask[[row, c]] = true;
                            }
                        }
                    }
                }
                gene_names.push(name);
                gene_weights.push(weight);
                gene_order.push(order);
            }
        }
    }

    let matrix = ExpressionMatrix::new(values, mask)?;
    let genes = AxisMetadata::new(
        schema.label.clone(),
        gene_ids,
        gene_names,
        gene_weights,
        gene_order,
    )?;
    let arrays = AxisMetadata::new(
        "ARRAY",
        schema.array_ids,
        vec![None; n_columns],
        array_weights,
        array_order,
    )?;
    ExpressionDataSet::new(matrix, genes, arrays)
}

/// Non-blank lines after the header with their 1-based file line numbers.
fn numbered_body<'a>(
    lines: &'a [&'a str],
    header_line_no: usize,
) -> impl Iterator<Item = (usize, &'a str)> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| (i + 1, *l))
        .skip(header_line_no)
        .filter(|(_, l)| !l.is_empty())
}

fn parse_header(line_no: usize, header: &str) -> Result<Schema> {
    let fields: Vec<&str> = header.split('\t').collect();
    if fields.len() < 2 {
        return Err(ClusterError::parse(
            line_no,
            "less than two columns found in the file",
        ));
    }
    let label = fields[0].to_string();
    let mut array_ids = Vec::new();
    let mut roles = Vec::with_capacity(fields.len() - 1);
    for &cell in &fields[1..] {
        let role = match cell {
            "NAME" => ColumnRole::Name,
            "GWEIGHT" => ColumnRole::Weight,
            "GORDER" => ColumnRole::Order,
            _ => {
                array_ids.push(cell.to_string());
                ColumnRole::Data(array_ids.len() - 1)
            }
        };
        roles.push(role);
    }
    Ok(Schema {
        label,
        array_ids,
        n_file_columns: fields.len(),
        roles,
    })
}

/// Decode an `EWEIGHT`/`EORDER` row into per-array values. Cells are
/// matched to data columns positionally via the column-role table; empty
/// or unparsable cells default to 0.
fn decode_special_row(schema: &Schema, fields: &[&str], out: &mut [f64]) {
    for (cell, &role) in fields[1..].iter().zip(&schema.roles) {
        if let ColumnRole::Data(c) = role {
            out[c] = cell.parse().unwrap_or(0.0);
        }
    }
}
