use clap::{Parser, Subcommand};

pub mod run;
pub use run::*;

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Run language models and chains over every example of a dataset"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a predictor over a dataset
    Run(RunArgs),
    /// List datasets visible to the tenant
    Datasets(DatasetsArgs),
    /// List the examples of a dataset
    Examples(ExamplesArgs),
    Version,
}

#[derive(Parser, Debug, Clone)]
pub struct DatasetsArgs {
    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct ExamplesArgs {
    #[arg(long)]
    pub dataset_id: String,
}
