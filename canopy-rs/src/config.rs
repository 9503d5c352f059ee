//! Builder configuration.
//!
//! `DecisionTreeParams` collects every knob the per-tree builder honors,
//! with defaults chosen for histogram-based growth on quantized features.
//! Validation is fail-fast: a bad configuration is rejected before any
//! workspace is touched or any work is enqueued.

use crate::error::{CanopyError, Result};
use serde::{Deserialize, Serialize};

/// Impurity criterion used to score candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity (classification)
    Gini,
    /// Shannon entropy in bits (classification)
    Entropy,
    /// Mean squared error (regression)
    Mse,
    /// Mean absolute error (regression)
    Mae,
    /// Poisson deviance (regression; recognized but not implemented)
    Poisson,
}

impl SplitCriterion {
    /// Whether this criterion scores class-count histograms.
    pub fn is_classification(&self) -> bool {
        matches!(self, SplitCriterion::Gini | SplitCriterion::Entropy)
    }
}

/// Per-tree builder configuration.
///
/// Default parameters suit medium-depth forests over quantized features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeParams {
    /// Hard cap on node depth (default: 16)
    ///
    /// Depth 0 means the tree is just the root leaf. Children sit one level
    /// below their parent, so a node at `max_depth` is always a leaf.
    pub max_depth: u32,

    /// Cap on the total number of leaves (default: -1, disabled)
    ///
    /// When positive, frontier nodes are forced into leaves as soon as the
    /// running leaf count reaches the cap, in frontier order.
    pub max_leaves: i64,

    /// Upper bound on frontier nodes processed per batch (default: 1024)
    ///
    /// **Tradeoff**: larger batches expose more parallel work per pass but
    /// grow the histogram workspace linearly.
    pub max_batch_size: usize,

    /// Number of histogram bins per column (default: 64)
    ///
    /// Must match the row count of the quantile table handed to the
    /// builder. More bins give finer thresholds at the cost of histogram
    /// size and evaluation work.
    pub n_bins: usize,

    /// Minimum sample count required to attempt a split (default: 2)
    pub min_samples_split: usize,

    /// Minimum sample count required in each child (default: 1)
    pub min_samples_leaf: usize,

    /// Minimum gain required to accept a split (default: 0.0)
    ///
    /// **Tradeoff**: raising this prunes marginal splits early and keeps
    /// trees smaller, but can stop growth before rare structure is found.
    pub min_impurity_decrease: f64,

    /// Impurity criterion (default: Gini)
    pub split_criterion: SplitCriterion,

    /// Fraction of columns sampled per tree, in (0, 1] (default: 1.0)
    ///
    /// Consumed by the per-tree sampler, not by the builder itself.
    pub max_features: f64,

    /// Bootstrap rows with replacement per tree (default: true)
    ///
    /// Sampler-facing; the builder only sees the resulting `rowids`.
    pub bootstrap: bool,

    /// Sample feature subsets with replacement (default: false)
    pub bootstrap_features: bool,

    /// Recompute quantile edges from each tree's bootstrap sample
    /// (default: false)
    pub quantile_per_tree: bool,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_leaves: -1,
            max_batch_size: 1024,
            n_bins: 64,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_impurity_decrease: 0.0,
            split_criterion: SplitCriterion::Gini,
            max_features: 1.0,
            bootstrap: true,
            bootstrap_features: false,
            quantile_per_tree: false,
        }
    }
}

impl DecisionTreeParams {
    /// Validate the configuration, before any workspace sizing or growth.
    pub fn validate(&self) -> Result<()> {
        if self.n_bins < 1 {
            return Err(CanopyError::ConfigError(format!(
                "n_bins must be at least 1, got {}",
                self.n_bins
            )));
        }
        if self.max_batch_size < 1 {
            return Err(CanopyError::ConfigError(
                "max_batch_size must be positive".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(CanopyError::ConfigError(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(CanopyError::ConfigError(format!(
                "min_samples_leaf must be at least 1, got {}",
                self.min_samples_leaf
            )));
        }
        if !self.min_impurity_decrease.is_finite() || self.min_impurity_decrease < 0.0 {
            return Err(CanopyError::ConfigError(format!(
                "min_impurity_decrease must be finite and non-negative, got {}",
                self.min_impurity_decrease
            )));
        }
        if !(self.max_features > 0.0 && self.max_features <= 1.0) {
            return Err(CanopyError::ConfigError(format!(
                "max_features must lie in (0, 1], got {}",
                self.max_features
            )));
        }
        if self.split_criterion == SplitCriterion::Poisson {
            return Err(CanopyError::ConfigError(
                "Poisson split criterion is not supported".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on nodes a tree of `max_depth` can hold.
    ///
    /// Closed form `2^(max_depth+1) - 1` for shallow trees; deeper trees
    /// use a fixed reservation and the host node sequence grows
    /// geometrically between batches instead.
    pub fn max_nodes(&self) -> usize {
        if self.max_depth < 13 {
            (1usize << (self.max_depth + 1)) - 1
        } else {
            8191
        }
    }
}
