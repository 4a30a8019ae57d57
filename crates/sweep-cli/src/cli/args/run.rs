//! Run command arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "eval.yaml")]
    pub config: PathBuf,

    /// Dataset name (overrides the config file)
    #[arg(long, conflicts_with = "dataset_id")]
    pub dataset: Option<String>,

    /// Dataset id (overrides the config file)
    #[arg(long)]
    pub dataset_id: Option<String>,

    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub repetitions: Option<usize>,

    /// Trace session name (default: {dataset}-{predictor}-{repetitions})
    #[arg(long)]
    pub session: Option<String>,

    /// Evaluate one example at a time, in dataset order
    #[arg(long)]
    pub sequential: bool,

    /// Print a progress line per completed example to stderr
    #[arg(long)]
    pub progress: bool,

    /// Write the results JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}
