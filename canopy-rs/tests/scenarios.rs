//! End-to-end growth scenarios.
//!
//! Each test pins one contract of the builder: split placement, forced
//! leaves, structural caps, tie-breaking and the boundary behaviors.

use canopy_rs::{
    train_tree, CanopyError, DecisionTreeParams, Labels, QuantizedInput, SplitCriterion,
};
use ndarray::{Array2, ShapeBuilder};

fn col_major(rows: usize, cols: usize, values: &[f64]) -> Array2<f64> {
    Array2::from_shape_vec((rows, cols).f(), values.to_vec()).unwrap()
}

/// Four samples, one column, two bins: the split lands on the 0.5 edge
/// and each leaf keeps two rows.
#[test]
fn pure_split_at_the_bin_edge() {
    let data = col_major(4, 1, &[0.1, 0.2, 0.8, 0.9]);
    let quantiles = col_major(2, 1, &[0.5, 1.0]);
    let labels = [0u32, 0, 1, 1];
    let rowids = [0u32, 1, 2, 3];
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 2,
        max_depth: 2,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.num_nodes(), 3);
    assert_eq!(tree.num_leaves, 2);

    let root = &tree.nodes[0];
    assert_eq!(root.split_feature, 0);
    assert_eq!(root.split_threshold, 0.5);
    assert_eq!(tree.nodes[1].count, 2);
    assert_eq!(tree.nodes[2].count, 2);
}

/// The only informative split would isolate the lone `1`, which
/// `min_samples_leaf = 2` forbids, so the root stays a leaf.
#[test]
fn min_samples_leaf_forces_the_root_leaf() {
    let data = col_major(4, 1, &[0.1, 0.2, 0.3, 0.9]);
    let quantiles = col_major(2, 1, &[0.5, 1.0]);
    let labels = [0u32, 0, 0, 1];
    let rowids = [0u32, 1, 2, 3];
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 2,
        min_samples_leaf: 2,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.num_nodes(), 1);
    assert_eq!(tree.num_leaves, 1);
    let root = &tree.nodes[0];
    assert!(root.is_leaf);
    assert_eq!(root.split_feature, -1);
    assert_eq!(root.left_child_id, -1);
}

/// Constant regression targets give every candidate zero gain; the root
/// is a leaf predicting the constant.
#[test]
fn constant_regression_target_is_a_single_leaf() {
    let values: Vec<f64> = (0..12).map(|i| i as f64 / 12.0).collect();
    let data = col_major(12, 1, &values);
    let quantiles = col_major(4, 1, &[0.25, 0.5, 0.75, 1.0]);
    let labels = [2.5f64; 12];
    let rowids: Vec<u32> = (0..12).collect();
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Values(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        1,
    )
    .unwrap();

    for criterion in [SplitCriterion::Mse, SplitCriterion::Mae] {
        let params = DecisionTreeParams {
            n_bins: 4,
            split_criterion: criterion,
            ..Default::default()
        };
        let tree = train_tree(&params, &input).unwrap();
        assert_eq!(tree.num_leaves, 1, "{criterion:?}");
        assert_eq!(tree.depth, 0);
        assert_eq!(tree.nodes[0].prediction, 2.5);
    }
}

/// Sixteen alternating labels keep every node splittable, so the leaf
/// cap decides: the third provisional leaf shuts growth down in frontier
/// order and exactly three leaves remain.
#[test]
fn max_leaves_cap_stops_growth_in_frontier_order() {
    let values: Vec<f64> = (0..16).map(|i| (i as f64 + 0.5) / 16.0).collect();
    let data = col_major(16, 1, &values);
    let edges: Vec<f64> = (1..=16).map(|b| b as f64 / 16.0).collect();
    let quantiles = col_major(16, 1, &edges);
    let labels: Vec<u32> = (0..16).map(|i| (i % 2) as u32).collect();
    let rowids: Vec<u32> = (0..16).collect();
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 16,
        max_leaves: 3,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.num_leaves, 3);
    let leaf_count = tree.nodes.iter().filter(|n| n.is_leaf).count();
    assert_eq!(leaf_count, 3);
}

/// A dataset that would naturally grow deep is clipped at `max_depth`;
/// every node at the cap is a leaf.
#[test]
fn depth_cap_clips_the_tree() {
    let values: Vec<f64> = (0..16).map(|i| (i as f64 + 0.5) / 16.0).collect();
    let data = col_major(16, 1, &values);
    let edges: Vec<f64> = (1..=16).map(|b| b as f64 / 16.0).collect();
    let quantiles = col_major(16, 1, &edges);
    let labels: Vec<u32> = (0..16).map(|i| (i % 2) as u32).collect();
    let rowids: Vec<u32> = (0..16).collect();
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 16,
        max_depth: 2,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.depth, 2);
    for node in &tree.nodes {
        assert!(node.depth <= 2);
        if node.depth == 2 {
            assert!(node.is_leaf);
        }
    }
}

/// Two byte-identical columns produce identical gains; the recorded
/// split must carry the lower column id.
#[test]
fn gain_ties_resolve_to_the_lower_column() {
    let column = [0.1, 0.2, 0.8, 0.9];
    let mut values = Vec::new();
    values.extend_from_slice(&column);
    values.extend_from_slice(&column);
    let data = col_major(4, 2, &values);
    let quantiles = col_major(2, 2, &[0.5, 1.0, 0.5, 1.0]);
    let labels = [0u32, 0, 1, 1];
    let rowids = [0u32, 1, 2, 3];
    let colids = [0usize, 1];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 2,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.nodes[0].split_feature, 0);
}

/// `max_depth = 0` means the tree is just the root leaf.
#[test]
fn depth_zero_is_a_single_leaf() {
    let data = col_major(4, 1, &[0.1, 0.2, 0.8, 0.9]);
    let quantiles = col_major(2, 1, &[0.5, 1.0]);
    let labels = [0u32, 0, 1, 1];
    let rowids = [0u32, 1, 2, 3];
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 2,
        max_depth: 0,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.num_nodes(), 1);
    assert_eq!(tree.num_leaves, 1);
    assert_eq!(tree.depth, 0);
}

/// Identical class labels leave nothing to gain; the root is a leaf.
#[test]
fn constant_labels_leave_the_root_alone() {
    let data = col_major(6, 1, &[0.1, 0.3, 0.5, 0.6, 0.8, 0.9]);
    let quantiles = col_major(3, 1, &[0.4, 0.7, 1.0]);
    let labels = [1u32; 6];
    let rowids: Vec<u32> = (0..6).collect();
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 3,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.num_leaves, 1);
    assert_eq!(tree.nodes[0].prediction, 1.0);
}

/// A constant column lands every row in one bin and never wins; the
/// informative column does.
#[test]
fn single_bin_columns_cannot_split() {
    let mut values = vec![0.5f64; 4]; // column 0: constant
    values.extend_from_slice(&[0.1, 0.2, 0.8, 0.9]); // column 1
    let data = col_major(4, 2, &values);
    let quantiles = col_major(2, 2, &[0.5, 0.5, 0.5, 1.0]);
    let labels = [0u32, 0, 1, 1];
    let rowids = [0u32, 1, 2, 3];
    let colids = [0usize, 1];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 2,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.nodes[0].split_feature, 1);
}

/// A node smaller than `2 * min_samples_leaf` cannot produce two valid
/// children and is forced into a leaf.
#[test]
fn small_nodes_are_forced_leaves() {
    let data = col_major(4, 1, &[0.1, 0.2, 0.8, 0.9]);
    let quantiles = col_major(2, 1, &[0.5, 1.0]);
    let labels = [0u32, 0, 1, 1];
    let rowids = [0u32, 1, 2, 3];
    let colids = [0usize];
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        2,
    )
    .unwrap();
    let params = DecisionTreeParams {
        n_bins: 2,
        min_samples_leaf: 3,
        ..Default::default()
    };

    let tree = train_tree(&params, &input).unwrap();
    assert_eq!(tree.num_leaves, 1);
    assert!(tree.nodes[0].is_leaf);
}

/// Unknown-to-the-builder criteria fail before any work happens.
#[test]
fn poisson_is_rejected_up_front() {
    let params = DecisionTreeParams {
        split_criterion: SplitCriterion::Poisson,
        ..Default::default()
    };
    assert!(matches!(
        params.validate(),
        Err(CanopyError::ConfigError(_))
    ));
}
