//! Per-tree row and column sampling.
//!
//! A forest driver hands every tree its own `rowids` (bootstrap draw) and
//! `colids` (feature subset). Sampling is keyed by `(seed, treeid)`
//! through independent ChaCha streams, so a tree's sample is reproducible
//! from those two numbers alone, with no per-tree state held between
//! calls and no coordination between concurrently sampled trees.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Reproducible per-tree sampler.
#[derive(Debug, Clone)]
pub struct TreeSampler {
    seed: u64,
}

impl TreeSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Rows and columns draw from distinct streams so the two samples
    /// never correlate.
    fn stream_rng(&self, treeid: u64, lane: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(treeid * 2 + lane);
        rng
    }

    /// Sampled row ids for one tree: a bootstrap draw with replacement,
    /// or the identity permutation when bagging is off.
    pub fn sample_rows(&self, treeid: u64, n_rows: usize, bootstrap: bool) -> Vec<u32> {
        if bootstrap {
            let mut rng = self.stream_rng(treeid, 0);
            (0..n_rows)
                .map(|_| rng.random_range(0..n_rows) as u32)
                .collect()
        } else {
            (0..n_rows as u32).collect()
        }
    }

    /// Sampled column ids for one tree: `ceil(max_features * n_cols)`
    /// columns, ascending. Without replacement the subset is distinct;
    /// with replacement a column may repeat.
    pub fn sample_cols(
        &self,
        treeid: u64,
        n_cols: usize,
        max_features: f64,
        with_replacement: bool,
    ) -> Vec<usize> {
        let k = ((max_features * n_cols as f64).ceil() as usize).clamp(1, n_cols);
        let mut rng = self.stream_rng(treeid, 1);

        let mut cols: Vec<usize> = if with_replacement {
            (0..k).map(|_| rng.random_range(0..n_cols)).collect()
        } else if k == n_cols {
            (0..n_cols).collect()
        } else {
            let mut all: Vec<usize> = (0..n_cols).collect();
            let (picked, _) = all.partial_shuffle(&mut rng, k);
            picked.to_vec()
        };
        cols.sort_unstable();
        cols
    }
}
