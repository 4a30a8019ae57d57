//! Single-task runner: examples in dataset order, one at a time.
//!
//! The loop runs on its own task so a panicking predictor fails the run
//! with [`SweepError::WorkerPanicked`], as it does in the pool.

use super::pool::worker_failed;
use super::results::{Collected, ResultCollector};
use super::runner::run_example;
use crate::errors::SweepResult;
use crate::model::Example;
use crate::predictor::Predictor;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::trace::TraceSession;
use std::sync::Arc;

pub(crate) async fn run_sequential(
    predictor: Arc<dyn Predictor>,
    examples: Vec<Example>,
    session: &TraceSession,
    repetitions: usize,
    progress: Option<ProgressSink>,
) -> SweepResult<Collected> {
    let collector = Arc::new(ResultCollector::new());
    let mut tracer = session.tracer();
    let total = examples.len();

    let task_collector = collector.clone();
    let task = tokio::spawn(async move {
        for example in &examples {
            let outcomes =
                run_example(predictor.as_ref(), example, repetitions, &mut tracer).await;
            let done = task_collector.record(example.id.clone(), outcomes);
            if let Some(progress) = &progress {
                progress(ProgressEvent {
                    done,
                    total,
                    example_id: example.id.clone(),
                });
            }
        }
    });
    task.await.map_err(worker_failed)?;

    Ok(collector.take())
}
