//! Entropy (information gain) for classification.

use crate::objectives::{HistTable, SplitObjective};
use crate::tree::Split;
use ndarray::ArrayView1;

/// Information gain in bits over per-class bin counts.
///
/// Per class, with left count `l`, right count `r` and `v = l + r`:
///
/// ```text
/// gain += (l/n)·log2(l/n_left) + (r/n)·log2(r/n_right) - (v/n)·log2(v/n)
/// ```
///
/// Zero counts contribute nothing (`0·log 0 == 0`).
#[derive(Debug, Clone)]
pub struct EntropyObjective {
    nclasses: usize,
    min_samples_leaf: f64,
    min_impurity_decrease: f64,
}

impl EntropyObjective {
    pub fn new(nclasses: usize, min_samples_leaf: usize, min_impurity_decrease: f64) -> Self {
        Self {
            nclasses,
            min_samples_leaf: min_samples_leaf as f64,
            min_impurity_decrease,
        }
    }
}

#[inline]
fn plogp_term(count: f64, n: f64, denom: f64) -> f64 {
    if count > 0.0 {
        (count / n) * (count / denom).log2()
    } else {
        0.0
    }
}

impl SplitObjective for EntropyObjective {
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

            let mut gain = 0.0;
            for c in 0..self.nclasses {
                let lval = left[c];
                let rval = totals[c] - lval;
                gain += plogp_term(lval, n, n_left);
                gain += plogp_term(rval, n, n_right);
                gain -= plogp_term(totals[c], n, n);
            }
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
    fn pure_split_gains_one_bit() {
        let cells = vec![2.0, 0.0, 0.0, 2.0, 2.0, 2.0];
        let table = HistTable::new(&cells, 2, 2);
        let edges = array![0.5, 1.0];
        let obj = EntropyObjective::new(2, 1, 0.0);
        let mut scratch = [0.0; 2];

        let split = obj.best_split(&table, edges.view(), 3, 4, &mut scratch);
        assert!(split.is_valid());
        assert_relative_eq!(split.gain, 1.0);
        assert_eq!(split.column, 3);
    }

    #[test]
    fn constant_labels_are_vetoed() {
        let cells = vec![3.0, 0.0, 1.0, 0.0, 4.0, 0.0];
        let table = HistTable::new(&cells, 2, 2);
        let edges = array![0.5, 1.0];
        let obj = EntropyObjective::new(2, 1, 0.0);
        let mut scratch = [0.0; 2];

        let split = obj.best_split(&table, edges.view(), 0, 4, &mut scratch);
        assert!(!split.is_valid());
    }

    #[test]
    fn partial_split_matches_hand_computation() {
        // bin 0 = [2, 1], bin 1 = [0, 1]; n = 4.
        // Left of bin 0: H(parent) - weighted child entropies
        //   parent: H(2/4, 2/4) = 1 bit
        //   left (3 rows, [2,1]): H = 0.9183, right (1 row): H = 0
        //   gain = 1 - (3/4)·0.9183 = 0.3113
        let cells = vec![2.0, 1.0, 0.0, 1.0, 2.0, 2.0];
        let table = HistTable::new(&cells, 2, 2);
        let edges = array![0.5, 1.0];
        let obj = EntropyObjective::new(2, 1, 0.0);
        let mut scratch = [0.0; 2];

        let split = obj.best_split(&table, edges.view(), 0, 4, &mut scratch);
        assert!(split.is_valid());
        assert_relative_eq!(split.gain, 0.311278, epsilon = 1e-5);
        assert_eq!(split.n_left, 3);
    }
}
