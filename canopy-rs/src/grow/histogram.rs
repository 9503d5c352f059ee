//! Histogram accumulation over one column block.
//!
//! The work grid is `(row_lanes × cols_in_block × batch)`: every frontier
//! node owns a stride of the histogram region, and within it each lane
//! owns a private copy of the block's tables. A `(node, lane)` task folds
//! a contiguous chunk of the node's sampled rows into its lane, lanes are
//! then reduced in lane order into lane 0, and the spare `n_bins`-th row
//! of each table receives the column totals. Counts are exact integers in
//! `f64`; label sums reduce in a fixed order, so a build is deterministic
//! for a fixed lane plan.

use crate::grow::workspace::WorkspaceLayout;
use crate::input::{Labels, QuantizedInput};
use crate::tree::NodeRecord;
use rayon::prelude::*;

/// Fill lane 0 of every node's histogram stride for the given column
/// block. `hist` must cover exactly `nodes.len()` node strides and is
/// zeroed here before accumulation.
pub(crate) fn fill_block(
    input: &QuantizedInput<'_>,
    layout: &WorkspaceLayout,
    nodes: &[NodeRecord],
    rowids: &[u32],
    cols: &[usize],
    lanes: usize,
    hist: &mut [f64],
) {
    let node_stride = layout.node_stride();
    let lane_stride = layout.lane_stride();
    let col_stride = layout.col_stride();
    let bin_width = layout.bin_width;
    let n_bins = layout.n_bins;

    debug_assert_eq!(hist.len(), nodes.len() * node_stride);
    debug_assert!(cols.len() <= layout.col_block_width);

    hist.par_chunks_mut(node_stride)
        .zip(nodes.par_iter())
        .for_each(|(node_hist, node)| {
            node_hist.fill(0.0);

            let lo = node.start as usize;
            let rows = &rowids[lo..lo + node.count as usize];
            let chunk = rows.len().div_ceil(lanes).max(1);

            node_hist
                .par_chunks_mut(lane_stride)
                .take(lanes)
                .enumerate()
                .for_each(|(lane, lane_hist)| {
                    let begin = lane * chunk;
                    if begin >= rows.len() {
                        return;
                    }
                    let end = ((lane + 1) * chunk).min(rows.len());
                    accumulate(input, &rows[begin..end], cols, col_stride, bin_width, lane_hist);
                });

            // Reduce lanes into lane 0, in lane order.
            let (lane0, rest) = node_hist.split_at_mut(lane_stride);
            for lane in 1..lanes {
                let src = &rest[(lane - 1) * lane_stride..lane * lane_stride];
                for (dst, s) in lane0.iter_mut().zip(src) {
                    *dst += s;
                }
            }

            // Column totals land in the spare bin row.
            for j in 0..cols.len() {
                let table = &mut lane0[j * col_stride..(j + 1) * col_stride];
                let (bins, totals) = table.split_at_mut(n_bins * bin_width);
                for b in 0..n_bins {
                    for w in 0..bin_width {
                        totals[w] += bins[b * bin_width + w];
                    }
                }
            }
        });
}

/// Fold one chunk of rows into one histogram lane. Columns are walked in
/// the outer loop so each inner pass reads one contiguous column run.
fn accumulate(
    input: &QuantizedInput<'_>,
    rows: &[u32],
    cols: &[usize],
    col_stride: usize,
    bin_width: usize,
    lane_hist: &mut [f64],
) {
    match input.labels() {
        Labels::Classes(classes) => {
            for (j, &col) in cols.iter().enumerate() {
                let table = &mut lane_hist[j * col_stride..(j + 1) * col_stride];
                for &row in rows {
                    let bin = input.bin_index(row, col);
                    table[bin * bin_width + classes[row as usize] as usize] += 1.0;
                }
            }
        }
        Labels::Values(values) => {
            for (j, &col) in cols.iter().enumerate() {
                let table = &mut lane_hist[j * col_stride..(j + 1) * col_stride];
                for &row in rows {
                    let bin = input.bin_index(row, col);
                    table[bin * 2] += values[row as usize];
                    table[bin * 2 + 1] += 1.0;
                }
            }
        }
    }
}
