//! Pre-allocated workspace: layout arithmetic and buffer binding.
//!
//! Growth never allocates: every array the batch loop touches lives in two
//! caller-provided byte buffers, carved once into typed regions at
//! 512-byte aligned offsets. The *arena* buffer holds the bulk numeric
//! regions (histogram lanes, the working copy of the sampled row ids, the
//! scatter scratch, per-node class scratch); the *frontier* buffer holds
//! the per-batch node and split staging. The caller allocates and releases
//! the buffers around `train()`; the builder only binds them.
//!
//! Sizing is a pure function of the configuration and the input shape:
//! calling [`workspace_size`] twice with identical arguments yields
//! identical sizes.

use crate::config::DecisionTreeParams;
use crate::error::{CanopyError, Result};
use crate::grow::plan::LANE_CAP;
use crate::input::InputShape;
use crate::objectives::REGRESSION_SLOTS;
use crate::tree::{NodeRecord, Split};
use bytemuck::Pod;

/// Region alignment guaranteed by the carver, not by the allocator.
pub const WORKSPACE_ALIGN: usize = 512;

/// Histogram byte budget per column block; the block width is chosen so
/// one block's lanes stay within it.
const HIST_BYTES_TARGET: usize = 4 << 20;

/// Byte sizes of the two workspace buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceSizes {
    pub arena_bytes: usize,
    pub frontier_bytes: usize,
}

/// Element counts and strides for every carved region.
#[derive(Debug, Clone)]
pub(crate) struct WorkspaceLayout {
    pub max_batch: usize,
    pub col_block_width: usize,
    pub n_bins: usize,
    /// Histogram slots per bin: `nclasses` or `{label_sum, count}`.
    pub bin_width: usize,
    pub n_sampled_rows: usize,
    /// Host node-sequence reservation hint (the sequence itself grows
    /// geometrically past this between batches).
    pub max_nodes: usize,

    hist_len: usize,
    class_scratch_len: usize,
}

fn align_up(bytes: usize) -> usize {
    bytes.next_multiple_of(WORKSPACE_ALIGN)
}

impl WorkspaceLayout {
    pub fn new(params: &DecisionTreeParams, shape: InputShape) -> Self {
        let bin_width = if params.split_criterion.is_classification() {
            shape.nclasses
        } else {
            REGRESSION_SLOTS
        };
        let n_bins = params.n_bins;
        let max_batch = params.max_batch_size;

        // One column's table, all lanes, whole batch.
        let col_bytes = LANE_CAP * max_batch * (n_bins + 1) * bin_width * size_of::<f64>();
        let col_block_width = (HIST_BYTES_TARGET / col_bytes.max(1))
            .clamp(1, shape.n_sampled_cols.max(1));

        let hist_len = max_batch * LANE_CAP * col_block_width * (n_bins + 1) * bin_width;
        let class_scratch_len = max_batch * bin_width;

        Self {
            max_batch,
            col_block_width,
            n_bins,
            bin_width,
            n_sampled_rows: shape.n_sampled_rows,
            max_nodes: params.max_nodes(),
            hist_len,
            class_scratch_len,
        }
    }

    /// Values per bin row of one column's table.
    #[inline]
    pub fn col_stride(&self) -> usize {
        (self.n_bins + 1) * self.bin_width
    }

    #[inline]
    pub fn lane_stride(&self) -> usize {
        self.col_block_width * self.col_stride()
    }

    #[inline]
    pub fn node_stride(&self) -> usize {
        LANE_CAP * self.lane_stride()
    }

    pub fn sizes(&self) -> WorkspaceSizes {
        let arena_bytes = WORKSPACE_ALIGN
            + align_up(self.hist_len * size_of::<f64>())
            + align_up(self.n_sampled_rows * size_of::<u32>())
            + align_up(self.n_sampled_rows * size_of::<u32>())
            + align_up(self.class_scratch_len * size_of::<f64>());
        let frontier_bytes = WORKSPACE_ALIGN
            + align_up(self.max_batch * size_of::<NodeRecord>())
            + align_up(2 * self.max_batch * size_of::<NodeRecord>())
            + align_up(self.max_batch * size_of::<Split>());
        WorkspaceSizes {
            arena_bytes,
            frontier_bytes,
        }
    }
}

/// Workspace sizes for a configuration and input shape.
///
/// Pure: no allocation happens here, and identical arguments always
/// produce identical sizes.
pub fn workspace_size(params: &DecisionTreeParams, shape: InputShape) -> Result<WorkspaceSizes> {
    params.validate()?;
    Ok(WorkspaceLayout::new(params, shape).sizes())
}

/// Typed regions carved out of the caller's buffers.
#[derive(Debug)]
pub(crate) struct Workspace<'w> {
    pub hist: &'w mut [f64],
    pub rowids: &'w mut [u32],
    pub scatter: &'w mut [u32],
    pub class_scratch: &'w mut [f64],
    pub curr_nodes: &'w mut [NodeRecord],
    pub next_nodes: &'w mut [NodeRecord],
    pub splits: &'w mut [Split],
}

/// Drop leading bytes until the buffer sits on the workspace alignment.
fn align_base<'w>(buf: &'w mut [u8]) -> &'w mut [u8] {
    let misalign = buf.as_ptr() as usize % WORKSPACE_ALIGN;
    let skip = if misalign == 0 {
        0
    } else {
        WORKSPACE_ALIGN - misalign
    };
    &mut buf[skip..]
}

/// Carve `elems` values of `T` off the front of `buf`, consuming a
/// 512-aligned span. The caller has already verified the total size.
fn carve<'w, T: Pod>(buf: &mut &'w mut [u8], elems: usize) -> &'w mut [T] {
    let bytes = elems * size_of::<T>();
    let padded = align_up(bytes);
    let taken = std::mem::take(buf);
    let cut = padded.min(taken.len());
    let (head, tail) = taken.split_at_mut(cut);
    *buf = tail;
    bytemuck::cast_slice_mut(&mut head[..bytes])
}

impl<'w> Workspace<'w> {
    /// Bind the layout's regions into the caller's buffers. No copying;
    /// the regions alias the buffers for the builder's lifetime.
    pub fn attach(
        layout: &WorkspaceLayout,
        arena: &'w mut [u8],
        frontier: &'w mut [u8],
    ) -> Result<Self> {
        let sizes = layout.sizes();
        if arena.len() < sizes.arena_bytes {
            return Err(CanopyError::WorkspaceTooSmall {
                needed: sizes.arena_bytes,
                got: arena.len(),
            });
        }
        if frontier.len() < sizes.frontier_bytes {
            return Err(CanopyError::WorkspaceTooSmall {
                needed: sizes.frontier_bytes,
                got: frontier.len(),
            });
        }

        let mut arena = align_base(arena);
        let hist = carve::<f64>(&mut arena, layout.hist_len);
        let rowids = carve::<u32>(&mut arena, layout.n_sampled_rows);
        let scatter = carve::<u32>(&mut arena, layout.n_sampled_rows);
        let class_scratch = carve::<f64>(&mut arena, layout.class_scratch_len);

        let mut frontier = align_base(frontier);
        let curr_nodes = carve::<NodeRecord>(&mut frontier, layout.max_batch);
        let next_nodes = carve::<NodeRecord>(&mut frontier, 2 * layout.max_batch);
        let splits = carve::<Split>(&mut frontier, layout.max_batch);

        Ok(Self {
            hist,
            rowids,
            scatter,
            class_scratch,
            curr_nodes,
            next_nodes,
            splits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitCriterion;

    fn shape() -> InputShape {
        InputShape {
            n_sampled_rows: 1000,
            n_sampled_cols: 20,
            n_bins: 64,
            nclasses: 3,
        }
    }

    #[test]
    fn sizing_is_idempotent() {
        let params = DecisionTreeParams::default();
        let a = workspace_size(&params, shape()).unwrap();
        let b = workspace_size(&params, shape()).unwrap();
        assert_eq!(a, b);
        assert!(a.arena_bytes > 0 && a.frontier_bytes > 0);
    }

    #[test]
    fn regression_tables_use_two_slots() {
        let params = DecisionTreeParams {
            split_criterion: SplitCriterion::Mse,
            ..Default::default()
        };
        let layout = WorkspaceLayout::new(&params, shape());
        assert_eq!(layout.bin_width, REGRESSION_SLOTS);

        let classification = WorkspaceLayout::new(&DecisionTreeParams::default(), shape());
        assert_eq!(classification.bin_width, 3);
    }

    #[test]
    fn block_width_respects_the_budget_and_the_columns() {
        let params = DecisionTreeParams::default();
        let layout = WorkspaceLayout::new(&params, shape());
        assert!(layout.col_block_width >= 1);
        assert!(layout.col_block_width <= 20);
    }

    #[test]
    fn attach_carves_every_region() {
        let params = DecisionTreeParams {
            max_batch_size: 8,
            n_bins: 4,
            ..Default::default()
        };
        let small = InputShape {
            n_sampled_rows: 100,
            n_sampled_cols: 3,
            n_bins: 4,
            nclasses: 2,
        };
        let layout = WorkspaceLayout::new(&params, small);
        let sizes = layout.sizes();

        let mut arena = vec![0u8; sizes.arena_bytes];
        let mut frontier = vec![0u8; sizes.frontier_bytes];
        let ws = Workspace::attach(&layout, &mut arena, &mut frontier).unwrap();

        assert_eq!(ws.hist.len(), layout.hist_len);
        assert_eq!(ws.rowids.len(), 100);
        assert_eq!(ws.scatter.len(), 100);
        assert_eq!(ws.curr_nodes.len(), 8);
        assert_eq!(ws.next_nodes.len(), 16);
        assert_eq!(ws.splits.len(), 8);
        assert_eq!(ws.hist.as_ptr() as usize % WORKSPACE_ALIGN, 0);
        assert_eq!(ws.rowids.as_ptr() as usize % WORKSPACE_ALIGN, 0);
    }

    #[test]
    fn attach_rejects_short_buffers() {
        let params = DecisionTreeParams::default();
        let layout = WorkspaceLayout::new(&params, shape());
        let sizes = layout.sizes();

        let mut arena = vec![0u8; sizes.arena_bytes / 2];
        let mut frontier = vec![0u8; sizes.frontier_bytes];
        let err = Workspace::attach(&layout, &mut arena, &mut frontier).unwrap_err();
        assert!(matches!(err, CanopyError::WorkspaceTooSmall { .. }));
    }
}
