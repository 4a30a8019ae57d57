//! Run reports and their renderings.

pub mod json;
pub mod progress;
pub mod summary;

use crate::model::{ExampleId, ResultMap};
use serde::{Deserialize, Serialize};

/// Everything a finished dataset run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub session_name: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub predictor: String,
    pub repetitions: usize,
    /// Examples with results. Equals the number of examples once a run completes.
    pub processed: usize,
    /// Example ids in the order their results were recorded.
    pub completion_order: Vec<ExampleId>,
    pub results: ResultMap,
}

impl RunReport {
    /// Number of repetitions, across all examples, that ended in an error.
    pub fn error_count(&self) -> usize {
        self.results
            .values()
            .flatten()
            .filter(|o| o.is_error())
            .count()
    }

    pub fn outcome_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}
