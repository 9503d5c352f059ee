//! Gini impurity gain for classification.

use crate::objectives::{HistTable, SplitObjective};
use crate::tree::Split;
use ndarray::ArrayView1;

/// Gini gain over per-class bin counts.
///
/// For a candidate bin `i` with per-class left counts `l_c` and right
/// counts `r_c`:
///
/// ```text
/// gain = sum_c (l_c^2 / n_left + r_c^2 / n_right) / n
///      - sum_c ((l_c + r_c) / n)^2
/// ```
///
/// which is the decrease in Gini impurity weighted by the child sizes.
#[derive(Debug, Clone)]
pub struct GiniObjective {
    nclasses: usize,
    min_samples_leaf: f64,
    min_impurity_decrease: f64,
}

impl GiniObjective {
    pub fn new(nclasses: usize, min_samples_leaf: usize, min_impurity_decrease: f64) -> Self {
        Self {
            nclasses,
            min_samples_leaf: min_samples_leaf as f64,
            min_impurity_decrease,
        }
    }
}

impl SplitObjective for GiniObjective {
    fn bin_width(&self) -> usize {
        self.nclasses
    }

    fn is_classification(&self) -> bool {
        true
    }

    fn best_split(
        &self,
        table: &HistTable<'_>,
        edges: ArrayView1<'_, f64>,
        column: i32,
        n_samples: u32,
        scratch: &mut [f64],
    ) -> Split {
        let n = n_samples as f64;
        let totals = table.totals();
        let left = &mut scratch[..self.nclasses];
        left.fill(0.0);

        let mut best = Split::NONE;
        for b in 0..table.n_bins() {
            for c in 0..self.nclasses {
                left[c] += table.cell(b, c);
            }
            let n_left: f64 = left.iter().sum();
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let mut children = 0.0;
            let mut parent = 0.0;
            for c in 0..self.nclasses {
                let lval = left[c];
                let rval = totals[c] - lval;
                children += (lval * lval / n_left + rval * rval / n_right) / n;
                let p = totals[c] / n;
                parent += p * p;
            }
            let gain = children - parent;
            if gain <= self.min_impurity_decrease {
                continue;
            }

            best.update(Split {
                gain,
                threshold: edges[b],
                column,
                n_left: n_left as u32,
            });
        }
        best
    }
}
