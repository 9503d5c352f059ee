//! Host-side builder driver.
//!
//! One `TreeBuilder` grows one tree: it binds a pre-allocated workspace,
//! seeds the root over the full sample slice, then repeatedly expands the
//! frontier `[node_start, node_end)` a batch at a time. Each batch runs
//! the histogram search over every column block, applies the winning
//! splits in frontier order, scatters the split nodes' row slices and
//! appends the children to the host node sequence. Growth ends when a
//! batch emits nothing and the frontier is exhausted.
//!
//! The driver is single-threaded per tree; the heavy phases (histogram
//! fill, split evaluation, the scatter, child predictions) fan out over
//! rayon. Several builders may run concurrently on separate workspaces;
//! the input view is shared read-only.

use crate::config::{DecisionTreeParams, SplitCriterion};
use crate::error::{CanopyError, Result};
use crate::grow::histogram::fill_block;
use crate::grow::plan;
use crate::grow::workspace::{workspace_size, Workspace, WorkspaceLayout};
use crate::input::{Labels, QuantizedInput};
use crate::objectives::{
    EntropyObjective, GiniObjective, HistTable, MaeObjective, MseObjective, SplitObjective,
};
use crate::tree::{Node, NodeRecord, Split, TrainedTree};
use rayon::prelude::*;
use tracing::{debug, info, trace};

/// Per-tree builder over a bound workspace.
pub struct TreeBuilder<'a, 'w> {
    params: DecisionTreeParams,
    input: QuantizedInput<'a>,
    layout: WorkspaceLayout,
    workspace: Option<Workspace<'w>>,
}

impl<'a, 'w> TreeBuilder<'a, 'w> {
    /// Validate the configuration against the input view.
    ///
    /// Fails fast on anything the growth loop would otherwise have to
    /// assume: bin-count mismatch with the quantile table, a criterion
    /// family that does not match the label kind, or a degenerate class
    /// count.
    pub fn new(params: DecisionTreeParams, input: QuantizedInput<'a>) -> Result<Self> {
        params.validate()?;

        if params.n_bins != input.n_bins() {
            return Err(CanopyError::ConfigError(format!(
                "n_bins is {} but the quantile table has {} bins",
                params.n_bins,
                input.n_bins()
            )));
        }
        match (params.split_criterion.is_classification(), input.labels()) {
            (true, Labels::Values(_)) => {
                return Err(CanopyError::ConfigError(format!(
                    "{:?} requires class labels, got regression targets",
                    params.split_criterion
                )));
            }
            (false, Labels::Classes(_)) => {
                return Err(CanopyError::ConfigError(format!(
                    "{:?} requires regression targets, got class labels",
                    params.split_criterion
                )));
            }
            _ => {}
        }
        if params.split_criterion.is_classification() && input.nclasses() < 2 {
            return Err(CanopyError::LabelError(format!(
                "classification needs at least 2 classes, got {}",
                input.nclasses()
            )));
        }
        if !params.split_criterion.is_classification() && input.nclasses() != 1 {
            return Err(CanopyError::LabelError(format!(
                "regression expects nclasses == 1, got {}",
                input.nclasses()
            )));
        }

        let layout = WorkspaceLayout::new(&params, input.shape());
        Ok(Self {
            params,
            input,
            layout,
            workspace: None,
        })
    }

    /// Bind the two caller-allocated buffers. No copying happens here;
    /// the regions alias the buffers until the builder is dropped.
    pub fn assign_workspace(
        &mut self,
        arena: &'w mut [u8],
        frontier: &'w mut [u8],
    ) -> Result<()> {
        self.workspace = Some(Workspace::attach(&self.layout, arena, frontier)?);
        Ok(())
    }

    /// Grow one tree. The workspace must be assigned; counters and
    /// staging are reset here, so a builder can train repeatedly on fresh
    /// state.
    pub fn train(&mut self) -> Result<TrainedTree> {
        let ws = self
            .workspace
            .as_mut()
            .ok_or(CanopyError::WorkspaceUnassigned)?;
        let params = &self.params;
        let input = &self.input;
        let layout = &self.layout;

        match params.split_criterion {
            SplitCriterion::Gini => {
                let objective = GiniObjective::new(
                    input.nclasses(),
                    params.min_samples_leaf,
                    params.min_impurity_decrease,
                );
                grow(params, input, layout, ws, &objective)
            }
            SplitCriterion::Entropy => {
                let objective = EntropyObjective::new(
                    input.nclasses(),
                    params.min_samples_leaf,
                    params.min_impurity_decrease,
                );
                grow(params, input, layout, ws, &objective)
            }
            SplitCriterion::Mse => {
                let objective =
                    MseObjective::new(params.min_samples_leaf, params.min_impurity_decrease);
                grow(params, input, layout, ws, &objective)
            }
            SplitCriterion::Mae => {
                let objective =
                    MaeObjective::new(params.min_samples_leaf, params.min_impurity_decrease);
                grow(params, input, layout, ws, &objective)
            }
            SplitCriterion::Poisson => Err(CanopyError::ConfigError(
                "Poisson split criterion is not supported".to_string(),
            )),
        }
    }
}

/// Allocate a workspace internally and grow a single tree.
///
/// The convenience path for callers that do not manage buffers
/// themselves; forest drivers that reuse workspaces across trees should
/// hold a [`TreeBuilder`] instead.
pub fn train_tree(
    params: &DecisionTreeParams,
    input: &QuantizedInput<'_>,
) -> Result<TrainedTree> {
    let sizes = workspace_size(params, input.shape())?;
    let mut arena = vec![0u8; sizes.arena_bytes];
    let mut frontier = vec![0u8; sizes.frontier_bytes];
    let mut builder = TreeBuilder::new(params.clone(), *input)?;
    builder.assign_workspace(&mut arena, &mut frontier)?;
    builder.train()
}

fn grow<O: SplitObjective>(
    params: &DecisionTreeParams,
    input: &QuantizedInput<'_>,
    layout: &WorkspaceLayout,
    ws: &mut Workspace<'_>,
    objective: &O,
) -> Result<TrainedTree> {
    let n_rows = input.n_sampled_rows();
    ws.rowids[..n_rows].copy_from_slice(input.rowids());

    let mut nodes: Vec<Node> = Vec::with_capacity(layout.max_nodes);
    let mut root = Node::new_frontier(0, 0, n_rows as u32, 0);
    root.prediction = node_prediction(input, &ws.rowids[..n_rows]);
    nodes.push(root);

    // Leaves of the tree as it stands: the root counts as one, and every
    // applied split trades one leaf for two. This is the count the
    // max_leaves gate consumes, in frontier order.
    let mut n_leaves = 1usize;
    let mut tree_depth = 0u32;
    let mut node_start = 0usize;
    let mut node_end = 1usize;
    let mut batches = 0usize;

    info!(
        "Growing tree: {} sampled rows, {} sampled columns, {} bins, {:?}",
        n_rows,
        input.n_sampled_cols(),
        params.n_bins,
        params.split_criterion
    );

    while node_start < node_end {
        let emitted = do_split(
            params,
            input,
            layout,
            ws,
            objective,
            &mut nodes,
            node_start,
            node_end,
            &mut n_leaves,
            &mut tree_depth,
        );
        batches += 1;
        debug!(
            "batch {}: frontier [{}, {}), emitted {} children, {} nodes total",
            batches,
            node_start,
            node_end,
            emitted,
            nodes.len()
        );

        node_start = node_end;
        node_end += (nodes.len() - node_end).min(params.max_batch_size);
    }

    info!(
        "Tree complete: {} nodes, {} leaves, depth {}, {} batches",
        nodes.len(),
        n_leaves,
        tree_depth,
        batches
    );

    Ok(TrainedTree {
        nodes,
        num_leaves: n_leaves,
        depth: tree_depth,
    })
}

/// Expand one frontier batch. Returns the number of children emitted.
#[allow(clippy::too_many_arguments)]
fn do_split<O: SplitObjective>(
    params: &DecisionTreeParams,
    input: &QuantizedInput<'_>,
    layout: &WorkspaceLayout,
    ws: &mut Workspace<'_>,
    objective: &O,
    nodes: &mut Vec<Node>,
    node_start: usize,
    node_end: usize,
    n_leaves: &mut usize,
    tree_depth: &mut u32,
) -> usize {
    let batch = node_end - node_start;

    // Stage the frontier and reset the best-split slots to the sentinel.
    for (record, node) in ws.curr_nodes[..batch]
        .iter_mut()
        .zip(&nodes[node_start..node_end])
    {
        *record = NodeRecord::from_node(node);
    }
    ws.splits[..batch].fill(Split::NONE);

    // Search every column block over the whole batch.
    let lanes = plan::row_lanes(batch);
    let node_stride = layout.node_stride();
    for block in input.colids().chunks(layout.col_block_width) {
        trace!("histogram pass: {} columns x {} nodes", block.len(), batch);
        fill_block(
            input,
            layout,
            &ws.curr_nodes[..batch],
            &*ws.rowids,
            block,
            lanes,
            &mut ws.hist[..batch * node_stride],
        );
        evaluate_block(
            objective,
            layout,
            input,
            &ws.curr_nodes[..batch],
            block,
            &ws.hist[..batch * node_stride],
            &mut ws.splits[..batch],
            &mut ws.class_scratch[..batch * layout.bin_width],
        );
    }

    // Apply the winning splits in frontier order.
    let first_child = nodes.len();
    let mut emitted = 0usize;
    let mut jobs: Vec<ScatterJob> = Vec::new();
    for i in 0..batch {
        let split = ws.splits[i];
        let idx = node_start + i;
        let node = nodes[idx];
        let count = node.count as usize;

        let structural_leaf = node.depth + 1 > params.max_depth
            || (params.max_leaves > 0 && *n_leaves >= params.max_leaves as usize)
            || count < params.min_samples_split
            || count < 2 * params.min_samples_leaf;
        if structural_leaf || !split.is_valid() {
            nodes[idx].make_leaf();
            continue;
        }

        let left_id = (first_child + emitted) as i32;
        nodes[idx].make_split(&split, left_id);
        let left = Node::new_frontier(left_id as u32, node.start, split.n_left, node.depth + 1);
        let right = Node::new_frontier(
            left_id as u32 + 1,
            node.start + split.n_left,
            node.count - split.n_left,
            node.depth + 1,
        );
        ws.next_nodes[emitted] = NodeRecord::from_node(&left);
        ws.next_nodes[emitted + 1] = NodeRecord::from_node(&right);
        emitted += 2;

        jobs.push(ScatterJob {
            start: node.start as usize,
            count,
            n_left: split.n_left as usize,
            column: split.column as usize,
            threshold: split.threshold,
        });
        *n_leaves += 1;
        *tree_depth = (*tree_depth).max(node.depth + 1);
    }

    // Host copy: append the staged children to the node sequence.
    for record in &ws.next_nodes[..emitted] {
        nodes.push(record.to_node());
    }

    // Scatter each split node's rowid slice, then fill in the children's
    // predictions over the partitioned slices.
    partition_rowids(input, jobs, &mut *ws.rowids, &mut *ws.scatter);

    let rowids: &[u32] = &*ws.rowids;
    nodes[first_child..].par_iter_mut().for_each(|child| {
        let lo = child.start as usize;
        child.prediction = node_prediction(input, &rowids[lo..lo + child.count as usize]);
    });

    emitted
}

fn evaluate_block<O: SplitObjective>(
    objective: &O,
    layout: &WorkspaceLayout,
    input: &QuantizedInput<'_>,
    nodes: &[NodeRecord],
    cols: &[usize],
    hist: &[f64],
    splits: &mut [Split],
    class_scratch: &mut [f64],
) {
    let node_stride = layout.node_stride();
    let col_stride = layout.col_stride();

    splits
        .par_iter_mut()
        .zip(class_scratch.par_chunks_mut(layout.bin_width))
        .zip(hist.par_chunks(node_stride))
        .zip(nodes.par_iter())
        .for_each(|(((best, scratch), node_hist), node)| {
            for (j, &col) in cols.iter().enumerate() {
                let table = HistTable::new(
                    &node_hist[j * col_stride..(j + 1) * col_stride],
                    layout.n_bins,
                    layout.bin_width,
                );
                let candidate =
                    objective.best_split(&table, input.edges(col), col as i32, node.count, scratch);
                best.update(candidate);
            }
        });
}

struct ScatterJob {
    start: usize,
    count: usize,
    n_left: usize,
    column: usize,
    threshold: f64,
}

/// Stable scatter: for every split node, reorder its rowid slice so the
/// left side (`value <= threshold`) comes first, preserving the original
/// order within each side. Slices are disjoint, so nodes scatter in
/// parallel.
fn partition_rowids(
    input: &QuantizedInput<'_>,
    mut jobs: Vec<ScatterJob>,
    rowids: &mut [u32],
    scatter: &mut [u32],
) {
    if jobs.is_empty() {
        return;
    }
    // A mixed-depth frontier is not ordered by slice start.
    jobs.sort_by_key(|job| job.start);

    let mut tasks: Vec<(ScatterJob, &mut [u32], &mut [u32])> = Vec::with_capacity(jobs.len());
    let mut rest_rows: &mut [u32] = rowids;
    let mut rest_scratch: &mut [u32] = scatter;
    let mut consumed = 0usize;
    for job in jobs {
        let skip = job.start - consumed;
        let (_, tail) = std::mem::take(&mut rest_rows).split_at_mut(skip);
        let (rows, tail) = tail.split_at_mut(job.count);
        rest_rows = tail;
        let (_, tail) = std::mem::take(&mut rest_scratch).split_at_mut(skip);
        let (scratch, tail) = tail.split_at_mut(job.count);
        rest_scratch = tail;
        consumed = job.start + job.count;
        tasks.push((job, rows, scratch));
    }

    tasks.into_par_iter().for_each(|(job, rows, scratch)| {
        scratch.copy_from_slice(rows);
        let mut write = 0usize;
        for &row in scratch.iter() {
            if input.value(row, job.column) <= job.threshold {
                rows[write] = row;
                write += 1;
            }
        }
        debug_assert_eq!(write, job.n_left, "scatter disagrees with the histogram");
        for &row in scratch.iter() {
            if !(input.value(row, job.column) <= job.threshold) {
                rows[write] = row;
                write += 1;
            }
        }
    });
}

/// Leaf value over a node's row slice: majority class id (smallest id on
/// ties) for classification, label mean for regression.
fn node_prediction(input: &QuantizedInput<'_>, rows: &[u32]) -> f64 {
    match input.labels() {
        Labels::Classes(classes) => {
            let mut counts = vec![0u32; input.nclasses()];
            for &row in rows {
                counts[classes[row as usize] as usize] += 1;
            }
            let mut best = 0usize;
            for c in 1..counts.len() {
                if counts[c] > counts[best] {
                    best = c;
                }
            }
            best as f64
        }
        Labels::Values(values) => {
            if rows.is_empty() {
                return 0.0;
            }
            let sum: f64 = rows.iter().map(|&row| values[row as usize]).sum();
            sum / rows.len() as f64
        }
    }
}
