//! Batched level-wise growth: workspace layout, histogram kernels and the
//! builder driver.

pub mod builder;
pub(crate) mod histogram;
pub(crate) mod plan;
pub mod workspace;

pub use builder::{train_tree, TreeBuilder};
pub use workspace::{workspace_size, WorkspaceSizes, WORKSPACE_ALIGN};
