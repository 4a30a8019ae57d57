//! Bounded worker pool.
//!
//! The feeder enqueues every example, waits until each one has been
//! processed, then sends one [`Job::Stop`] per worker and joins them.
//! Workers pull from a single shared queue, so there is no per-example task
//! and no ordering between examples beyond what one worker sees.

use super::results::{Collected, ResultCollector};
use super::runner::run_example;
use super::RunOptions;
use crate::errors::{SweepError, SweepResult};
use crate::model::Example;
use crate::predictor::Predictor;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::trace::{TraceSession, Tracer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Queue item. `Stop` tells the worker that receives it to exit.
pub(crate) enum Job {
    Work(Arc<Example>),
    Stop,
}

type Queue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Examples enqueued but not yet recorded.
#[derive(Default)]
struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

impl Outstanding {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Everything a worker needs, shared across the pool.
struct Shared {
    predictor: Arc<dyn Predictor>,
    repetitions: usize,
    total: usize,
    collector: ResultCollector,
    outstanding: Outstanding,
    progress: Option<ProgressSink>,
}

pub(crate) async fn run_pool(
    predictor: Arc<dyn Predictor>,
    examples: Vec<Example>,
    session: &TraceSession,
    opts: &RunOptions,
) -> SweepResult<Collected> {
    let shared = Arc::new(Shared {
        predictor,
        repetitions: opts.repetitions,
        total: examples.len(),
        collector: ResultCollector::new(),
        outstanding: Outstanding::default(),
        progress: opts.progress.clone(),
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let queue: Queue = Arc::new(Mutex::new(rx));

    let mut workers = JoinSet::new();
    for worker_id in 0..opts.workers {
        let tracer = session.tracer();
        workers.spawn(worker(worker_id, queue.clone(), tracer, shared.clone()));
    }
    info!(
        workers = opts.workers,
        examples = shared.total,
        repetitions = opts.repetitions,
        session = session.name(),
        "worker pool started"
    );

    for example in examples {
        shared.outstanding.add();
        send(&tx, Job::Work(Arc::new(example)))?;
    }

    // Drain. A worker that exits here never consumed a stop marker.
    tokio::select! {
        _ = shared.outstanding.wait_idle() => {}
        exited = workers.join_next() => {
            workers.shutdown().await;
            return Err(early_exit(exited));
        }
    }
    debug!(processed = shared.collector.processed(), "queue drained");

    for _ in 0..opts.workers {
        send(&tx, Job::Stop)?;
    }
    drop(tx);

    join_within(&mut workers, opts.join_timeout).await?;

    Ok(shared.collector.take())
}

/// Join every worker, aborting the stragglers once `timeout` has passed.
async fn join_within(workers: &mut JoinSet<()>, timeout: Duration) -> SweepResult<()> {
    match tokio::time::timeout(timeout, join_all(workers)).await {
        Ok(joined) => joined,
        Err(_) => {
            let remaining = workers.len();
            warn!(remaining, timeout = ?timeout, "workers did not stop in time");
            workers.abort_all();
            Err(SweepError::JoinTimeout { timeout, remaining })
        }
    }
}

async fn worker(worker_id: usize, queue: Queue, mut tracer: Tracer, shared: Arc<Shared>) {
    loop {
        let job = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let example = match job {
            Some(Job::Work(example)) => example,
            Some(Job::Stop) | None => break,
        };

        let outcomes = run_example(
            shared.predictor.as_ref(),
            &example,
            shared.repetitions,
            &mut tracer,
        )
        .await;
        let done = shared.collector.record(example.id.clone(), outcomes);
        if let Some(progress) = &shared.progress {
            progress(ProgressEvent {
                done,
                total: shared.total,
                example_id: example.id.clone(),
            });
        }
        shared.outstanding.done();
    }
    debug!(worker_id, "worker stopped");
}

fn send(tx: &mpsc::UnboundedSender<Job>, job: Job) -> SweepResult<()> {
    tx.send(job).map_err(|_| SweepError::WorkerPanicked {
        message: "job queue closed before all jobs were sent".to_string(),
    })
}

async fn join_all(workers: &mut JoinSet<()>) -> SweepResult<()> {
    while let Some(joined) = workers.join_next().await {
        joined.map_err(worker_failed)?;
    }
    Ok(())
}

fn early_exit(exited: Option<Result<(), JoinError>>) -> SweepError {
    match exited {
        Some(Err(e)) => worker_failed(e),
        _ => SweepError::WorkerPanicked {
            message: "worker exited before the queue drained".to_string(),
        },
    }
}

pub(super) fn worker_failed(e: JoinError) -> SweepError {
    SweepError::WorkerPanicked {
        message: e.to_string(),
    }
}
