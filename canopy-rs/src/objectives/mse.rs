//! Mean-squared-error gain for regression.

use crate::objectives::{HistTable, SplitObjective, REGRESSION_SLOTS};
use crate::tree::Split;
use ndarray::ArrayView1;

/// Variance reduction from per-bin label sums and counts.
///
/// The parent objective is `-(Σy)²/n`; a candidate's children contribute
/// `-(Σy_left)²/n_left - (Σy_right)²/n_right`, and
///
/// ```text
/// gain = (parent - children) / n
/// ```
///
/// which equals the per-sample decrease in squared error around the side
/// means.
#[derive(Debug, Clone)]
pub struct MseObjective {
    min_samples_leaf: f64,
    min_impurity_decrease: f64,
}

impl MseObjective {
    pub fn new(min_samples_leaf: usize, min_impurity_decrease: f64) -> Self {
        Self {
            min_samples_leaf: min_samples_leaf as f64,
            min_impurity_decrease,
        }
    }
}

impl SplitObjective for MseObjective {
    fn bin_width(&self) -> usize {
        REGRESSION_SLOTS
    }

    fn is_classification(&self) -> bool {
        false
    }

    fn best_split(
        &self,
        table: &HistTable<'_>,
        edges: ArrayView1<'_, f64>,
        column: i32,
        n_samples: u32,
        _scratch: &mut [f64],
    ) -> Split {
        let n = n_samples as f64;
        let label_sum = table.totals()[0];
        let parent = -(label_sum * label_sum) / n;

        let mut best = Split::NONE;
        let mut left_sum = 0.0;
        let mut n_left = 0.0;
        for b in 0..table.n_bins() {
            left_sum += table.cell(b, 0);
            n_left += table.cell(b, 1);
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let right_sum = label_sum - left_sum;
            let children = -(left_sum * left_sum) / n_left - (right_sum * right_sum) / n_right;
            let gain = (parent - children) / n;
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn separated_means_gain_the_variance() {
        // bin 0: two labels of 1.0; bin 1: two labels of 3.0.
        // Var([1,1,3,3]) = 1, and the split removes all of it.
        let cells = vec![2.0, 2.0, 6.0, 2.0, 8.0, 4.0];
        let table = HistTable::new(&cells, 2, 2);
        let edges = array![0.5, 1.0];
        let obj = MseObjective::new(1, 0.0);
        let mut scratch = [];

        let split = obj.best_split(&table, edges.view(), 2, 4, &mut scratch);
        assert!(split.is_valid());
        assert_relative_eq!(split.gain, 1.0);
        assert_eq!(split.n_left, 2);
        assert_relative_eq!(split.threshold, 0.5);
    }

    #[test]
    fn constant_labels_are_vetoed() {
        let cells = vec![4.0, 2.0, 4.0, 2.0, 8.0, 4.0];
        let table = HistTable::new(&cells, 2, 2);
        let edges = array![0.5, 1.0];
        let obj = MseObjective::new(1, 0.0);
        let mut scratch = [];

        let split = obj.best_split(&table, edges.view(), 0, 4, &mut scratch);
        assert!(!split.is_valid());
    }

    #[test]
    fn min_samples_leaf_vetoes_thin_children() {
        // Only one row lands right of bin 0.
        let cells = vec![3.0, 3.0, 9.0, 1.0, 12.0, 4.0];
        let table = HistTable::new(&cells, 2, 2);
        let edges = array![0.5, 1.0];
        let obj = MseObjective::new(2, 0.0);
        let mut scratch = [];

        let split = obj.best_split(&table, edges.view(), 0, 4, &mut scratch);
        assert!(!split.is_valid());
    }
}
