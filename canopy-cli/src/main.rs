use anyhow::{bail, Context, Result};
use canopy_rs::{
    compute_quantiles, compute_quantiles_sampled, train_tree, DecisionTreeParams, Labels,
    QuantizedInput, SplitCriterion, TrainedTree, TreeSampler,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// canopy - train decision-tree forests from CSV data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "canopy")]
#[command(about = "Batched level-wise decision-tree training over CSV data", long_about = None)]
struct Cli {
    /// Path to the input CSV file (header row required)
    #[arg(value_name = "INPUT_CSV")]
    input: PathBuf,

    /// Label column name (defaults to the last column)
    #[arg(short, long)]
    label: Option<String>,

    /// Task to train for
    #[arg(long, value_enum, default_value = "auto")]
    task: TaskArg,

    /// Number of trees in the forest
    #[arg(short = 'n', long, default_value = "10")]
    trees: usize,

    /// Seed for per-tree row/column sampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Split criterion (auto picks Gini or MSE by task)
    #[arg(long, value_enum, default_value = "auto")]
    criterion: CriterionArg,

    /// Maximum tree depth
    #[arg(long, default_value = "16")]
    max_depth: u32,

    /// Maximum number of leaves per tree (-1 disables the cap)
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    max_leaves: i64,

    /// Histogram bins per column
    #[arg(long, default_value = "64")]
    n_bins: usize,

    /// Minimum samples required to attempt a split
    #[arg(long, default_value = "2")]
    min_samples_split: usize,

    /// Minimum samples required in each child
    #[arg(long, default_value = "1")]
    min_samples_leaf: usize,

    /// Minimum gain required to accept a split
    #[arg(long, default_value = "0.0")]
    min_impurity_decrease: f64,

    /// Fraction of columns sampled per tree, in (0, 1]
    #[arg(long, default_value = "1.0")]
    max_features: f64,

    /// Disable bootstrap row sampling (default: bootstrap on)
    #[arg(long)]
    no_bootstrap: bool,

    /// Sample feature subsets with replacement
    #[arg(long)]
    bootstrap_features: bool,

    /// Recompute quantile edges from each tree's bootstrap sample
    #[arg(long)]
    quantile_per_tree: bool,

    /// Write the trained forest as JSON
    #[arg(short, long, value_name = "MODEL_JSON")]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
enum TaskArg {
    /// Infer from the label column dtype
    Auto,
    /// Multi-class classification
    Classification,
    /// Regression
    Regression,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CriterionArg {
    Auto,
    Gini,
    Entropy,
    Mse,
    Mae,
}

impl CriterionArg {
    fn resolve(self, classification: bool) -> SplitCriterion {
        match (self, classification) {
            (CriterionArg::Auto, true) => SplitCriterion::Gini,
            (CriterionArg::Auto, false) => SplitCriterion::Mse,
            (CriterionArg::Gini, _) => SplitCriterion::Gini,
            (CriterionArg::Entropy, _) => SplitCriterion::Entropy,
            (CriterionArg::Mse, _) => SplitCriterion::Mse,
            (CriterionArg::Mae, _) => SplitCriterion::Mae,
        }
    }
}

/// Labels decoded from the CSV label column.
enum TaskLabels {
    /// Class ids plus the original class names, sorted.
    Classes(Vec<u32>, Vec<String>),
    Values(Vec<f64>),
}

#[derive(Serialize)]
struct ForestModel {
    task: String,
    n_rows: usize,
    n_features: usize,
    nclasses: usize,
    classes: Option<Vec<String>>,
    seed: u64,
    params: DecisionTreeParams,
    trees: Vec<TrainedTree>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let started = Instant::now();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(cli.input.clone()))
        .with_context(|| format!("opening {}", cli.input.display()))?
        .finish()
        .with_context(|| format!("parsing {}", cli.input.display()))?;

    let label_name = match &cli.label {
        Some(name) => name.clone(),
        None => df
            .get_column_names()
            .last()
            .map(|s| s.to_string())
            .context("CSV has no columns")?,
    };
    let label_column = df
        .column(&label_name)
        .with_context(|| format!("label column '{label_name}' not found"))?
        .clone();

    let features_df = df.drop(&label_name)?;
    if features_df.width() == 0 {
        bail!("no feature columns besides the label");
    }
    let features: Array2<f64> = features_df
        .to_ndarray::<Float64Type>(IndexOrder::Fortran)
        .context("feature columns must be numeric")?;
    let (n_rows, n_features) = features.dim();

    let classification = match cli.task {
        TaskArg::Classification => true,
        TaskArg::Regression => false,
        TaskArg::Auto => !label_column.dtype().is_float(),
    };
    let labels = decode_labels(&label_column, classification)?;
    let (nclasses, class_names) = match &labels {
        TaskLabels::Classes(_, names) => (names.len(), Some(names.clone())),
        TaskLabels::Values(_) => (1, None),
    };

    info!(
        "Loaded {}: {} rows, {} features, label '{}' ({})",
        cli.input.display(),
        n_rows,
        n_features,
        label_name,
        if classification {
            format!("{nclasses} classes")
        } else {
            "regression".to_string()
        }
    );

    let params = DecisionTreeParams {
        max_depth: cli.max_depth,
        max_leaves: cli.max_leaves,
        n_bins: cli.n_bins,
        min_samples_split: cli.min_samples_split,
        min_samples_leaf: cli.min_samples_leaf,
        min_impurity_decrease: cli.min_impurity_decrease,
        split_criterion: cli.criterion.resolve(classification),
        max_features: cli.max_features,
        bootstrap: !cli.no_bootstrap,
        bootstrap_features: cli.bootstrap_features,
        quantile_per_tree: cli.quantile_per_tree,
        ..Default::default()
    };
    params.validate()?;

    // Global quantile edges, shared by every tree unless the per-tree
    // option recomputes them from each bootstrap sample.
    let global_quantiles = if params.quantile_per_tree {
        None
    } else {
        Some(compute_quantiles(features.view(), params.n_bins)?)
    };

    let sampler = TreeSampler::new(cli.seed);
    let progress = ProgressBar::new(cli.trees as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} trees [{elapsed_precise}]",
    )?);

    let trees: Vec<TrainedTree> = (0..cli.trees as u64)
        .into_par_iter()
        .map(|treeid| {
            let rowids = sampler.sample_rows(treeid, n_rows, params.bootstrap);
            let colids = sampler.sample_cols(
                treeid,
                n_features,
                params.max_features,
                params.bootstrap_features,
            );

            let tree_quantiles;
            let quantile_view = match &global_quantiles {
                Some(q) => q.view(),
                None => {
                    tree_quantiles =
                        compute_quantiles_sampled(features.view(), &rowids, params.n_bins)?;
                    tree_quantiles.view()
                }
            };
            let label_view = match &labels {
                TaskLabels::Classes(ids, _) => Labels::Classes(ids),
                TaskLabels::Values(values) => Labels::Values(values),
            };
            let input = QuantizedInput::new(
                features.view(),
                label_view,
                &rowids,
                &colids,
                quantile_view,
                nclasses.max(1),
            )?;

            let tree = train_tree(&params, &input)?;
            debug!(
                "tree {}: {} nodes, {} leaves, depth {}",
                treeid,
                tree.num_nodes(),
                tree.num_leaves,
                tree.depth
            );
            progress.inc(1);
            Ok(tree)
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish_and_clear();

    let total_nodes: usize = trees.iter().map(|t| t.num_nodes()).sum();
    let total_leaves: usize = trees.iter().map(|t| t.num_leaves).sum();
    let max_depth = trees.iter().map(|t| t.depth).max().unwrap_or(0);

    println!("Trained {} trees in {:.2?}", trees.len(), started.elapsed());
    println!(
        "  {} nodes total, {:.1} leaves/tree, max depth {}",
        total_nodes,
        total_leaves as f64 / trees.len().max(1) as f64,
        max_depth
    );

    if let Some(path) = &cli.output {
        let model = ForestModel {
            task: if classification {
                "classification".to_string()
            } else {
                "regression".to_string()
            },
            n_rows,
            n_features,
            nclasses,
            classes: class_names,
            seed: cli.seed,
            params,
            trees,
        };
        let json = serde_json::to_string_pretty(&model)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Model written to {}", path.display());
    }

    Ok(())
}

/// Decode the label column: class ids over the sorted distinct values
/// for classification, plain f64 targets for regression.
fn decode_labels(column: &Column, classification: bool) -> Result<TaskLabels> {
    if column.null_count() > 0 {
        bail!("label column contains nulls");
    }

    if !classification {
        let casted = column.cast(&DataType::Float64)?;
        let values: Vec<f64> = casted.f64()?.into_iter().flatten().collect();
        return Ok(TaskLabels::Values(values));
    }

    let casted = column.cast(&DataType::String)?;
    let ca = casted.str()?;
    let raw: Vec<&str> = ca.into_iter().flatten().collect();
    let distinct: BTreeSet<&str> = raw.iter().copied().collect();
    let index: std::collections::HashMap<&str, u32> = distinct
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i as u32))
        .collect();
    let names: Vec<String> = distinct.iter().map(|s| s.to_string()).collect();
    let ids: Vec<u32> = raw.iter().map(|v| index[v]).collect();
    Ok(TaskLabels::Classes(ids, names))
}
