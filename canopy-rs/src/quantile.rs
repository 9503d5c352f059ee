//! Per-column quantile edge computation.
//!
//! The builder consumes an `n_bins × N` table of upper bin edges and
//! treats it as given. This collaborator computes the table by sorting
//! each column's (optionally sampled) values and reading evenly spaced
//! order statistics, so edges are non-decreasing and the last edge is the
//! column maximum. Columns are independent and sort in parallel.

use crate::error::{CanopyError, Result};
use ndarray::{Array2, ArrayView2, ShapeBuilder};
use rayon::prelude::*;

/// Quantile edges over every row of `data`.
pub fn compute_quantiles(data: ArrayView2<'_, f64>, n_bins: usize) -> Result<Array2<f64>> {
    let rows: Vec<u32> = (0..data.nrows() as u32).collect();
    compute_quantiles_sampled(data, &rows, n_bins)
}

/// Quantile edges over a sampled subset of rows (per-tree quantiles).
pub fn compute_quantiles_sampled(
    data: ArrayView2<'_, f64>,
    rowids: &[u32],
    n_bins: usize,
) -> Result<Array2<f64>> {
    if n_bins < 1 {
        return Err(CanopyError::ConfigError(
            "n_bins must be at least 1".to_string(),
        ));
    }
    if rowids.is_empty() {
        return Err(CanopyError::InsufficientData { min: 1, actual: 0 });
    }

    let n_cols = data.ncols();
    let columns: Vec<Result<Vec<f64>>> = (0..n_cols)
        .into_par_iter()
        .map(|c| {
            let mut values: Vec<f64> = rowids.iter().map(|&r| data[(r as usize, c)]).collect();
            if values.iter().any(|v| !v.is_finite()) {
                return Err(CanopyError::QuantileError(format!(
                    "non-finite value in column {c}"
                )));
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let n = values.len();
            let edges = (1..=n_bins)
                .map(|b| {
                    let rank = (b * n).div_ceil(n_bins).max(1) - 1;
                    values[rank.min(n - 1)]
                })
                .collect();
            Ok(edges)
        })
        .collect();

    let mut flat = Vec::with_capacity(n_bins * n_cols);
    for column in columns {
        flat.extend(column?);
    }
    Array2::from_shape_vec((n_bins, n_cols).f(), flat)
        .map_err(|e| CanopyError::QuantileError(e.to_string()))
}
