//! Run language models, chat models and chains over every example of a
//! hosted dataset, with a bounded worker pool and per-example trace
//! correlation.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sweep_core::dataset::{DatasetRef, PlusClient};
//! use sweep_core::engine::{Evaluator, RunOptions};
//! use sweep_core::predictor::{chain, EchoChain};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = PlusClient::from_env().await?;
//! let evaluator = Evaluator::with_logging(Arc::new(client));
//! let report = evaluator
//!     .arun_on_dataset(
//!         &DatasetRef::Name("qa".into()),
//!         chain(EchoChain),
//!         RunOptions::default().with_repetitions(2),
//!     )
//!     .await?;
//! println!("{} examples processed", report.processed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod model;
pub mod predictor;
pub mod report;
pub mod trace;

pub use engine::{Evaluator, RunOptions};
pub use errors::{SweepError, SweepResult};
pub use model::{Dataset, Example, ExampleId, Outcome, ResultMap};
pub use report::RunReport;
