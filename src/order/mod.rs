//! Display-order computation
//!
//! Every output file iterates genes and arrays through a permutation that
//! encodes the current display order. Three sources feed it: the order keys
//! from the input file, a flat cluster assignment, or a hierarchical merge
//! tree. All three reduce to a stable sort here, so the resulting order is
//! deterministic under ties.

use std::cmp::Ordering;

use crate::error::{ClusterError, Result};
use crate::provider::{Child, MergeNode};

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Indices `0..n` stably sorted by order key ascending. Stability breaks
/// ties by original index.
/// Cluster 3.0 equivalent: ResetIndex() in data.c.
pub fn sorted_by_key(keys: &[f64]) -> Vec<usize> {
    let mut index: Vec<usize> = (0..keys.len()).collect();
    index.sort_by(|&a, &b| cmp_f64(keys[a], keys[b]));
    index
}

/// Permutation grouping elements by cluster id, clusters in id order,
/// members within a cluster sorted by order key.
/// Cluster 3.0 equivalent: SetClusterIndex() in data.c.
pub fn cluster_index(keys: &[f64], labels: &[usize], k: usize) -> Result<Vec<usize>> {
    if labels.len() != keys.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: format!("{} cluster labels", keys.len()),
            got: format!("{}", labels.len()),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&c| c >= k) {
        return Err(ClusterError::Constraint {
            reason: format!("cluster id {} out of range (k = {})", bad, k),
        });
    }
    let mut index: Vec<usize> = (0..keys.len()).collect();
    index.sort_by(|&a, &b| labels[a].cmp(&labels[b]).then(cmp_f64(keys[a], keys[b])));
    Ok(index)
}

/// Linearize a merge tree into a left-to-right leaf permutation.
/// Cluster 3.0 equivalent: TreeSort() in data.c.
///
/// Walks the `n - 1` merge nodes in creation order, synthesizing for each
/// internal node a resolved order key (leaf-count-weighted average of its
/// children) and a leaf count. At every merge, the child resolving to the
/// larger order is placed after the other, and each leaf under it receives
/// a positional increment equal to the other child's leaf count; the final
/// increment of a leaf is therefore the number of leaves placed before it
/// by all ancestor merges. When both children resolve to the same order,
/// the child with the lower encoded index is placed first.
///
/// The returned permutation is the stable sort of leaves by (accumulated
/// increment, base order key).
pub fn tree_sort(nodes: &[MergeNode], keys: &[f64]) -> Result<Vec<usize>> {
    let n = keys.len();
    if n == 0 {
        return Err(ClusterError::InvalidInput {
            reason: "cannot order an empty axis".to_string(),
        });
    }
    if nodes.len() + 1 != n {
        return Err(ClusterError::InvalidInput {
            reason: format!(
                "merge tree has {} nodes for {} elements ({} needed)",
                nodes.len(),
                n,
                n - 1
            ),
        });
    }

    let mut increment = vec![0.0f64; n];
    let mut node_order = vec![0.0f64; nodes.len()];
    let mut node_count = vec![0usize; nodes.len()];
    // Leaves currently under each resolved internal node. Taken (emptied)
    // when the node is consumed as a child, so a node used twice trips the
    // validation below.
    let mut node_members: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut leaf_used = vec![false; n];

    for (i, node) in nodes.iter().enumerate() {
        let mut resolve = |child: Child| -> Result<(f64, usize, Vec<usize>)> {
            match child {
                Child::Leaf(j) => {
                    if j >= n {
                        return Err(ClusterError::InvalidInput {
                            reason: format!("merge node {} references leaf {} (only {} leaves)", i, j, n),
                        });
                    }
                    if leaf_used[j] {
                        return Err(ClusterError::InvalidInput {
                            reason: format!("merge tree references leaf {} twice", j),
                        });
                    }
                    leaf_used[j] = true;
                    Ok((keys[j], 1, vec![j]))
                }
                Child::Node(k) => {
                    if k >= i {
                        return Err(ClusterError::InvalidInput {
                            reason: format!("merge node {} references unresolved node {}", i, k),
                        });
                    }
                    let members = std::mem::take(&mut node_members[k]);
                    if members.is_empty() {
                        return Err(ClusterError::InvalidInput {
                            reason: format!("merge tree references node {} twice", k),
                        });
                    }
                    Ok((node_order[k], node_count[k], members))
                }
            }
        };

        let (order_l, count_l, members_l) = resolve(node.left)?;
        let (order_r, count_r, members_r) = resolve(node.right)?;

        let left_first = match cmp_f64(order_l, order_r) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => node.left.encoded() < node.right.encoded(),
        };
        let (mut before, mut after) = if left_first {
            (members_l, members_r)
        } else {
            (members_r, members_l)
        };
        let shift = before.len() as f64;
        for &leaf in &after {
            increment[leaf] += shift;
        }

        node_order[i] = (count_l as f64 * order_l + count_r as f64 * order_r)
            / (count_l + count_r) as f64;
        node_count[i] = count_l + count_r;
        // Merge smaller into larger; keeps the whole pass O(n log n).
        if before.len() < after.len() {
            std::mem::swap(&mut before, &mut after);
        }
        before.extend(after);
        node_members[i] = before;
    }

    let mut index: Vec<usize> = (0..n).collect();
    index.sort_by(|&a, &b| cmp_f64(increment[a], increment[b]).then(cmp_f64(keys[a], keys[b])));
    Ok(index)
}
