//! canopy-rs: batched level-wise decision-tree growth over quantized
//! features.
//!
//! One tree grows a level at a time: every frontier node is expanded in
//! the same pass over the training data, using histogram-based split
//! finding over pre-quantized feature values. All growth-time arrays live
//! in a pre-allocated workspace the caller binds around `train()`, so the
//! batch loop itself never allocates.
//!
//! ## Usage
//!
//! ```no_run
//! use canopy_rs::{
//!     compute_quantiles, train_tree, DecisionTreeParams, Labels, QuantizedInput,
//! };
//! use ndarray::{Array2, ShapeBuilder};
//!
//! # fn main() -> canopy_rs::Result<()> {
//! // Column-major feature matrix, one label per row.
//! let data = Array2::<f64>::zeros((100, 4).f());
//! let labels: Vec<u32> = vec![0; 100];
//! let rowids: Vec<u32> = (0..100).collect();
//! let colids: Vec<usize> = (0..4).collect();
//!
//! let params = DecisionTreeParams::default();
//! let quantiles = compute_quantiles(data.view(), params.n_bins)?;
//! let input = QuantizedInput::new(
//!     data.view(),
//!     Labels::Classes(&labels),
//!     &rowids,
//!     &colids,
//!     quantiles.view(),
//!     2,
//! )?;
//! let tree = train_tree(&params, &input)?;
//! println!("{} leaves, depth {}", tree.num_leaves, tree.depth);
//! # Ok(())
//! # }
//! ```
//!
//! Forest-level concerns (bagging, aggregation, inference) live with the
//! caller; [`sampling`] and [`quantile`] provide the per-tree sampling
//! and quantile-edge collaborators such a driver needs.

pub mod config;
pub mod error;
pub mod grow;
pub mod input;
pub mod objectives;
pub mod quantile;
pub mod sampling;
pub mod tree;

pub use config::{DecisionTreeParams, SplitCriterion};
pub use error::{CanopyError, Result};
pub use grow::{train_tree, workspace_size, TreeBuilder, WorkspaceSizes};
pub use input::{InputShape, Labels, QuantizedInput};
pub use quantile::{compute_quantiles, compute_quantiles_sampled};
pub use sampling::TreeSampler;
pub use tree::{Node, Split, TrainedTree};
