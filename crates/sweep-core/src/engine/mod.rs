//! Dataset evaluation engine.
//!
//! [`Evaluator`] resolves a dataset, opens a trace session and runs a
//! predictor over every example, either on a bounded worker pool
//! ([`Evaluator::arun_on_dataset`]) or one example at a time
//! ([`Evaluator::run_on_dataset`]). Both produce a [`RunReport`] whose result
//! map has one entry per example and one outcome per repetition.

mod pool;
pub mod results;
pub mod runner;
mod sequential;

pub use results::{JobState, ResultCollector};
pub use runner::run_example;

use crate::config::{RunConfig, DEFAULT_JOIN_TIMEOUT_SECS, DEFAULT_REPETITIONS, DEFAULT_WORKERS};
use crate::dataset::{DatasetRef, DatasetStore};
use crate::errors::{SweepError, SweepResult};
use crate::model::{Dataset, Example};
use crate::predictor::{block_on, Predictor, PredictorRegistry};
use crate::report::progress::ProgressSink;
use crate::report::RunReport;
use crate::trace::TraceRecorder;
use results::Collected;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Knobs for a single dataset run.
#[derive(Clone)]
pub struct RunOptions {
    /// Worker tasks in the pool. Ignored by the sequential runner.
    pub workers: usize,
    /// Invocations per example.
    pub repetitions: usize,
    /// Trace session name; defaults to `{dataset}-{predictor}-{repetitions}`.
    pub session_name: Option<String>,
    /// How long to wait for workers to exit once the queue has drained.
    /// Workers find their stop marker right after the drain, so this only
    /// trips when the runtime starves them.
    pub join_timeout: Duration,
    pub progress: Option<ProgressSink>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            repetitions: DEFAULT_REPETITIONS,
            session_name: None,
            join_timeout: Duration::from_secs(DEFAULT_JOIN_TIMEOUT_SECS),
            progress: None,
        }
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("workers", &self.workers)
            .field("repetitions", &self.repetitions)
            .field("session_name", &self.session_name)
            .field("join_timeout", &self.join_timeout)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl RunOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = Some(name.into());
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    fn validate(&self) -> SweepResult<()> {
        if self.workers == 0 {
            return Err(SweepError::invalid_options("workers must be at least 1"));
        }
        if self.repetitions == 0 {
            return Err(SweepError::invalid_options("repetitions must be at least 1"));
        }
        Ok(())
    }

    fn session_name_for(&self, dataset: &Dataset, predictor: &dyn Predictor) -> String {
        self.session_name.clone().unwrap_or_else(|| {
            default_session_name(&dataset.name, predictor.name(), self.repetitions)
        })
    }
}

pub fn default_session_name(dataset_name: &str, predictor_name: &str, repetitions: usize) -> String {
    format!("{}-{}-{}", dataset_name, predictor_name, repetitions)
}

/// Runs predictors over datasets read from a [`DatasetStore`], recording
/// traces through a [`TraceRecorder`].
#[derive(Clone)]
pub struct Evaluator {
    store: Arc<dyn DatasetStore>,
    recorder: TraceRecorder,
}

impl Evaluator {
    pub fn new(store: Arc<dyn DatasetStore>, recorder: TraceRecorder) -> Self {
        Self { store, recorder }
    }

    /// Evaluator that logs trace events through `tracing`.
    pub fn with_logging(store: Arc<dyn DatasetStore>) -> Self {
        Self::new(store, TraceRecorder::logging())
    }

    /// Run `predictor` over every example of `dataset` on a pool of
    /// `opts.workers` tasks.
    ///
    /// Dataset lookup and option errors are returned before a trace session
    /// is opened. Predictor failures never fail the run.
    pub async fn arun_on_dataset(
        &self,
        dataset: &DatasetRef,
        predictor: Arc<dyn Predictor>,
        opts: RunOptions,
    ) -> SweepResult<RunReport> {
        opts.validate()?;
        let (dataset, examples) = self.load(dataset).await?;
        let session_name = opts.session_name_for(&dataset, predictor.as_ref());
        info!(
            dataset = %dataset.name,
            predictor = predictor.name(),
            kind = %predictor.kind(),
            session = %session_name,
            "starting dataset run"
        );

        let session = self.recorder.open_session(session_name);
        let collected = pool::run_pool(predictor.clone(), examples, &session, &opts).await?;
        let report = finish(session.name(), &dataset, predictor.as_ref(), &opts, collected);
        session.close();
        Ok(report)
    }

    /// Sequential variant: one example at a time, in dataset order.
    pub async fn run_on_dataset(
        &self,
        dataset: &DatasetRef,
        predictor: Arc<dyn Predictor>,
        opts: RunOptions,
    ) -> SweepResult<RunReport> {
        opts.validate()?;
        let (dataset, examples) = self.load(dataset).await?;
        let session_name = opts.session_name_for(&dataset, predictor.as_ref());
        info!(
            dataset = %dataset.name,
            predictor = predictor.name(),
            session = %session_name,
            "starting sequential dataset run"
        );

        let session = self.recorder.open_session(session_name);
        let collected = sequential::run_sequential(
            predictor.clone(),
            examples,
            &session,
            opts.repetitions,
            opts.progress.clone(),
        )
        .await?;
        let report = finish(session.name(), &dataset, predictor.as_ref(), &opts, collected);
        session.close();
        Ok(report)
    }

    /// Blocking form of [`Evaluator::run_on_dataset`]. Refuses to run
    /// inside an async runtime.
    pub fn run_on_dataset_blocking(
        &self,
        dataset: &DatasetRef,
        predictor: Arc<dyn Predictor>,
        opts: RunOptions,
    ) -> SweepResult<RunReport> {
        block_on(self.run_on_dataset(dataset, predictor, opts))?
    }

    /// Build the predictor named in `cfg` and run it, pooled unless the
    /// config asks for a sequential run.
    ///
    /// An unknown predictor kind fails here, before the dataset is read or a
    /// session is opened.
    pub async fn run_from_config(
        &self,
        cfg: &RunConfig,
        registry: &PredictorRegistry,
        progress: Option<ProgressSink>,
    ) -> SweepResult<RunReport> {
        let predictor = registry.build(&cfg.predictor)?;
        self.run_configured(cfg, predictor, progress).await
    }

    /// Run an already-built predictor with the dataset and options from `cfg`.
    pub async fn run_configured(
        &self,
        cfg: &RunConfig,
        predictor: Arc<dyn Predictor>,
        progress: Option<ProgressSink>,
    ) -> SweepResult<RunReport> {
        let dataset = cfg.dataset_ref()?;
        let mut opts = cfg.run_options();
        opts.progress = progress;
        if cfg.sequential {
            self.run_on_dataset(&dataset, predictor, opts).await
        } else {
            self.arun_on_dataset(&dataset, predictor, opts).await
        }
    }

    async fn load(&self, dataset: &DatasetRef) -> SweepResult<(Dataset, Vec<Example>)> {
        let dataset = self.store.read_dataset(dataset).await?;
        let examples = self.store.list_examples(&dataset.id).await?;
        info!(dataset = %dataset.name, examples = examples.len(), "loaded dataset");
        Ok((dataset, examples))
    }
}

fn finish(
    session_name: &str,
    dataset: &Dataset,
    predictor: &dyn Predictor,
    opts: &RunOptions,
    collected: Collected,
) -> RunReport {
    info!(
        session = session_name,
        processed = collected.processed,
        "dataset run finished"
    );
    RunReport {
        session_name: session_name.to_string(),
        dataset_id: dataset.id.clone(),
        dataset_name: dataset.name.clone(),
        predictor: predictor.name().to_string(),
        repetitions: opts.repetitions,
        processed: collected.processed,
        completion_order: collected.completion_order,
        results: collected.results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryStore;
    use crate::model::Inputs;
    use crate::predictor::{chain, EchoChain};
    use crate::trace::MemorySink;

    fn evaluator(sink: Arc<MemorySink>) -> Evaluator {
        let store = InMemoryStore::new().with_dataset(
            Dataset::new("ds-1", "qa"),
            vec![Example::new("a", Inputs::new()), Example::new("b", Inputs::new())],
        );
        Evaluator::new(Arc::new(store), TraceRecorder::new(sink))
    }

    #[test]
    fn default_session_name_format() {
        assert_eq!(default_session_name("qa", "echo", 3), "qa-echo-3");
    }

    #[tokio::test]
    async fn zero_workers_is_rejected_before_session() {
        let sink = Arc::new(MemorySink::default());
        let err = evaluator(sink.clone())
            .arun_on_dataset(
                &DatasetRef::Name("qa".into()),
                chain(EchoChain),
                RunOptions::default().with_workers(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidOptions { .. }));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn missing_dataset_opens_no_session() {
        let sink = Arc::new(MemorySink::default());
        let err = evaluator(sink.clone())
            .run_on_dataset(&DatasetRef::Id("nope".into()), chain(EchoChain), RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::DatasetNotFound { .. }));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn session_name_defaults_from_run() {
        let sink = Arc::new(MemorySink::default());
        let report = evaluator(sink)
            .arun_on_dataset(
                &DatasetRef::Name("qa".into()),
                chain(EchoChain),
                RunOptions::default().with_repetitions(2),
            )
            .await
            .unwrap();
        assert_eq!(report.session_name, "qa-echo-2");
        assert_eq!(report.processed, 2);
    }

    #[test]
    fn blocking_run_outside_runtime() {
        let sink = Arc::new(MemorySink::default());
        let report = evaluator(sink)
            .run_on_dataset_blocking(
                &DatasetRef::Name("qa".into()),
                chain(EchoChain),
                RunOptions::default().with_session_name("nightly"),
            )
            .unwrap();
        assert_eq!(report.session_name, "nightly");
        assert_eq!(report.results.len(), 2);
    }

    #[tokio::test]
    async fn blocking_run_inside_runtime_is_refused() {
        let sink = Arc::new(MemorySink::default());
        let err = evaluator(sink)
            .run_on_dataset_blocking(
                &DatasetRef::Name("qa".into()),
                chain(EchoChain),
                RunOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SweepError::BlockingInsideRuntime));
    }
}
