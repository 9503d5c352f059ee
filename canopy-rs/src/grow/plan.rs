//! Work-grid sizing for the histogram pass.
//!
//! The accumulation grid is `(row_lanes × cols_in_block × batch)`; each
//! `(node, lane)` task folds a contiguous chunk of the node's rows into
//! its own histogram lane. Lane count is occupancy-driven: enough lanes to
//! saturate the thread pool when the frontier is narrow (a lone root node
//! would otherwise serialize the heaviest pass), no more than the lane
//! reservation the workspace was sized for.

/// Histogram lanes reserved per node in the workspace layout.
pub(crate) const LANE_CAP: usize = 4;

/// Lanes to actually use for a batch of `batch` frontier nodes.
pub(crate) fn row_lanes(batch: usize) -> usize {
    let threads = rayon::current_num_threads();
    let wanted = (2 * threads).div_ceil(batch.max(1));
    wanted.clamp(1, LANE_CAP)
}
