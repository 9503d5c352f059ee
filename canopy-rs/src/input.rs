//! Read-only view over the quantized training data.
//!
//! The builder never touches raw files or owns the training matrix; it
//! works through [`QuantizedInput`], a borrowed descriptor over the
//! column-major feature matrix, the labels, the sampled row/column ids and
//! the per-column quantile edges. All structural validation happens here,
//! at the collaborator boundary, so the growth loop can assume a
//! well-formed view.

use crate::error::{CanopyError, Result};
use ndarray::{ArrayView1, ArrayView2, Axis};

/// Training labels, one entry per matrix row.
///
/// The variant must match the split criterion family: class-count
/// criteria (Gini, Entropy) require `Classes`, regression criteria (MSE,
/// MAE) require `Values`.
#[derive(Debug, Clone, Copy)]
pub enum Labels<'a> {
    /// Integer class ids in `[0, nclasses)`.
    Classes(&'a [u32]),
    /// Floating-point regression targets.
    Values(&'a [f64]),
}

impl<'a> Labels<'a> {
    pub fn len(&self) -> usize {
        match self {
            Labels::Classes(l) => l.len(),
            Labels::Values(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_classes(&self) -> bool {
        matches!(self, Labels::Classes(_))
    }
}

/// Shape summary consumed by workspace sizing.
///
/// Pure data; two identical shapes always produce identical workspace
/// sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub n_sampled_rows: usize,
    pub n_sampled_cols: usize,
    pub n_bins: usize,
    pub nclasses: usize,
}

/// Immutable descriptor over the sampled, quantized training data.
///
/// `data` and `quantiles` must be column-major: every column of the
/// feature matrix and of the edge table is a contiguous run, which is what
/// the histogram accumulation walks. Row-major input is rejected here
/// rather than silently transposed.
#[derive(Debug, Clone, Copy)]
pub struct QuantizedInput<'a> {
    data: ArrayView2<'a, f64>,
    labels: Labels<'a>,
    rowids: &'a [u32],
    colids: &'a [usize],
    quantiles: ArrayView2<'a, f64>,
    nclasses: usize,
}

/// A 2-D view is column-major when its transpose is in standard layout.
fn is_column_major(view: &ArrayView2<'_, f64>) -> bool {
    view.t().is_standard_layout()
}

impl<'a> QuantizedInput<'a> {
    /// Bind a view over the training data, validating every structural
    /// precondition the growth loop relies on.
    pub fn new(
        data: ArrayView2<'a, f64>,
        labels: Labels<'a>,
        rowids: &'a [u32],
        colids: &'a [usize],
        quantiles: ArrayView2<'a, f64>,
        nclasses: usize,
    ) -> Result<Self> {
        let (n_rows, n_cols) = data.dim();

        if !is_column_major(&data) {
            return Err(CanopyError::RowMajorInput);
        }
        if labels.len() != n_rows {
            return Err(CanopyError::LabelError(format!(
                "expected {} labels, got {}",
                n_rows,
                labels.len()
            )));
        }
        if nclasses < 1 {
            return Err(CanopyError::LabelError(format!(
                "nclasses must be at least 1, got {nclasses}"
            )));
        }
        if let Labels::Classes(classes) = labels {
            if let Some(&bad) = classes.iter().find(|&&c| c as usize >= nclasses) {
                return Err(CanopyError::LabelError(format!(
                    "class id {bad} out of range for nclasses={nclasses}"
                )));
            }
        }
        if rowids.is_empty() {
            return Err(CanopyError::InsufficientData { min: 1, actual: 0 });
        }
        if let Some(&bad) = rowids.iter().find(|&&r| r as usize >= n_rows) {
            return Err(CanopyError::ConfigError(format!(
                "sampled row id {bad} out of range for {n_rows} rows"
            )));
        }
        if colids.is_empty() || colids.iter().any(|&c| c >= n_cols) {
            return Err(CanopyError::ConfigError(format!(
                "sampled column ids must be a non-empty subset of [0, {n_cols})"
            )));
        }

        Self::validate_quantiles(&quantiles, n_cols)?;

        Ok(Self {
            data,
            labels,
            rowids,
            colids,
            quantiles,
            nclasses,
        })
    }

    fn validate_quantiles(quantiles: &ArrayView2<'a, f64>, n_cols: usize) -> Result<()> {
        let (n_bins, q_cols) = quantiles.dim();
        if n_bins < 1 {
            return Err(CanopyError::QuantileError(
                "quantile table has no bins".to_string(),
            ));
        }
        if q_cols != n_cols {
            return Err(CanopyError::QuantileError(format!(
                "quantile table covers {q_cols} columns, data has {n_cols}"
            )));
        }
        if !is_column_major(quantiles) {
            return Err(CanopyError::RowMajorInput);
        }
        for (c, col) in quantiles.columns().into_iter().enumerate() {
            for b in 0..n_bins {
                if !col[b].is_finite() {
                    return Err(CanopyError::QuantileError(format!(
                        "non-finite edge at bin {b}, column {c}"
                    )));
                }
                if b > 0 && col[b] < col[b - 1] {
                    return Err(CanopyError::QuantileError(format!(
                        "edges decrease at bin {b}, column {c}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn n_sampled_rows(&self) -> usize {
        self.rowids.len()
    }

    pub fn n_sampled_cols(&self) -> usize {
        self.colids.len()
    }

    pub fn n_bins(&self) -> usize {
        self.quantiles.nrows()
    }

    pub fn nclasses(&self) -> usize {
        self.nclasses
    }

    pub fn labels(&self) -> Labels<'a> {
        self.labels
    }

    pub fn rowids(&self) -> &'a [u32] {
        self.rowids
    }

    pub fn colids(&self) -> &'a [usize] {
        self.colids
    }

    pub fn shape(&self) -> InputShape {
        InputShape {
            n_sampled_rows: self.n_sampled_rows(),
            n_sampled_cols: self.n_sampled_cols(),
            n_bins: self.n_bins(),
            nclasses: self.nclasses,
        }
    }

    #[inline]
    pub fn value(&self, row: u32, col: usize) -> f64 {
        self.data[(row as usize, col)]
    }

    /// Upper edge of bin `b` for column `col`.
    #[inline]
    pub fn bin_edge(&self, col: usize, b: usize) -> f64 {
        self.quantiles[(b, col)]
    }

    /// All quantile edges of one column, lowest bin first.
    #[inline]
    pub fn edges(&self, col: usize) -> ArrayView1<'a, f64> {
        self.quantiles.index_axis_move(Axis(1), col)
    }

    /// Bin containing `data[row, col]`.
    ///
    /// Bisects the column's edges counting edges strictly below the value,
    /// clamped into the last bin, so that `bin(v) <= b` exactly when
    /// `v <= edge[b]`. Threshold partitioning relies on that equivalence.
    #[inline]
    pub fn bin_index(&self, row: u32, col: usize) -> usize {
        let v = self.value(row, col);
        let n_bins = self.n_bins();
        let mut lo = 0usize;
        let mut hi = n_bins;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.quantiles[(mid, col)] < v {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo.min(n_bins - 1)
    }
}
