//! Shared result aggregation for concurrent workers.

use crate::model::{ExampleId, Outcome, ResultMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Count of examples whose results have been recorded.
#[derive(Debug, Default)]
pub struct JobState {
    processed: AtomicUsize,
}

impl JobState {
    /// Bump the counter and return the new value.
    pub fn increment(&self) -> usize {
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    results: ResultMap,
    order: Vec<ExampleId>,
}

/// Result map plus processed counter, written to by every worker.
#[derive(Debug, Default)]
pub struct ResultCollector {
    recorded: Mutex<Recorded>,
    state: JobState,
}

/// What a collector held once every worker was done with it.
#[derive(Debug, Default)]
pub struct Collected {
    pub results: ResultMap,
    pub completion_order: Vec<ExampleId>,
    pub processed: usize,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the outcomes of one example and return how many examples are
    /// now done.
    pub fn record(&self, id: ExampleId, outcomes: Vec<Outcome>) -> usize {
        {
            let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
            recorded.order.push(id.clone());
            recorded.results.insert(id, outcomes);
        }
        self.state.increment()
    }

    pub fn processed(&self) -> usize {
        self.state.processed()
    }

    /// Move the recorded results out, leaving the collector empty.
    pub fn take(&self) -> Collected {
        let recorded = std::mem::take(
            &mut *self.recorded.lock().unwrap_or_else(PoisonError::into_inner),
        );
        Collected {
            results: recorded.results,
            completion_order: recorded.order,
            processed: self.state.processed(),
        }
    }
}
