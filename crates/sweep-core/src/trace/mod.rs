//! Trace correlation for dataset runs.
//!
//! A [`TraceRecorder`] opens named sessions. Each worker holds its own
//! [`Tracer`] bound to the shared session; the tracer carries the id of the
//! example currently being evaluated so every recorded run can be attributed
//! to it. Runs are reported through the [`RunObserver`] callbacks that the
//! predictor adapters invoke.

mod sink;

pub use sink::{LogSink, MemorySink};

use crate::model::ExampleId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

pub type RunId = Uuid;

/// Something worth recording about a session or one of its runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    SessionOpened {
        session_id: Uuid,
        session: String,
        at: DateTime<Utc>,
    },
    SessionClosed {
        session_id: Uuid,
        session: String,
        at: DateTime<Utc>,
    },
    RunStarted {
        run_id: RunId,
        parent_run_id: Option<RunId>,
        session: String,
        example_id: Option<ExampleId>,
        name: String,
        inputs: serde_json::Value,
        at: DateTime<Utc>,
    },
    RunEnded {
        run_id: RunId,
        session: String,
        outputs: serde_json::Value,
        at: DateTime<Utc>,
    },
    RunFailed {
        run_id: RunId,
        session: String,
        error: String,
        at: DateTime<Utc>,
    },
}

/// Destination of trace events.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// Observer notified around every predictor invocation.
pub trait RunObserver: Send + Sync {
    /// Returns the id that identifies this run in the matching end/error call.
    fn on_run_start(&self, name: &str, inputs: &serde_json::Value) -> RunId;
    fn on_run_end(&self, run_id: RunId, outputs: &serde_json::Value);
    fn on_run_error(&self, run_id: RunId, error: &str);
}

/// Observers passed down to a predictor call.
pub type Callbacks<'a> = &'a [&'a dyn RunObserver];

/// Opens trace sessions on a sink.
#[derive(Clone)]
pub struct TraceRecorder {
    sink: Arc<dyn TraceSink>,
}

impl TraceRecorder {
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    /// Recorder that forwards events to `tracing`.
    pub fn logging() -> Self {
        Self::new(Arc::new(LogSink))
    }

    /// Open a session. It is closed when the returned guard is dropped.
    pub fn open_session(&self, name: impl Into<String>) -> TraceSession {
        let inner = Arc::new(SessionInner {
            id: Uuid::new_v4(),
            name: name.into(),
            sink: self.sink.clone(),
            closed: AtomicBool::new(false),
        });
        inner.sink.record(TraceEvent::SessionOpened {
            session_id: inner.id,
            session: inner.name.clone(),
            at: Utc::now(),
        });
        TraceSession { inner }
    }
}

struct SessionInner {
    id: Uuid,
    name: String,
    sink: Arc<dyn TraceSink>,
    closed: AtomicBool,
}

impl SessionInner {
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.sink.record(TraceEvent::SessionClosed {
            session_id: self.id,
            session: self.name.clone(),
            at: Utc::now(),
        });
    }
}

/// Scoped handle on an open session. Closes the session exactly once, on
/// [`TraceSession::close`] or drop, whichever comes first.
pub struct TraceSession {
    inner: Arc<SessionInner>,
}

impl TraceSession {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// A fresh tracer bound to this session, with no active example.
    pub fn tracer(&self) -> Tracer {
        Tracer {
            session: self.inner.clone(),
            example_id: None,
            open_runs: Mutex::new(Vec::new()),
        }
    }

    pub fn close(self) {
        self.inner.close();
    }
}

impl Drop for TraceSession {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Per-worker correlator. Records runs against its session and the example
/// that is currently active.
pub struct Tracer {
    session: Arc<SessionInner>,
    example_id: Option<ExampleId>,
    // Runs started but not yet finished; the last one is the parent of the next.
    open_runs: Mutex<Vec<RunId>>,
}

impl Tracer {
    pub fn session_name(&self) -> &str {
        &self.session.name
    }

    pub fn example_id(&self) -> Option<&ExampleId> {
        self.example_id.as_ref()
    }

    /// Replace the active example, returning the previous one.
    pub fn set_example_id(&mut self, id: Option<ExampleId>) -> Option<ExampleId> {
        std::mem::replace(&mut self.example_id, id)
    }

    /// Make `id` the active example until the returned guard is dropped.
    pub fn scope(&mut self, id: ExampleId) -> ExampleScope<'_> {
        let previous = self.set_example_id(Some(id));
        ExampleScope {
            tracer: self,
            previous: Some(previous),
        }
    }

    fn open_runs(&self) -> std::sync::MutexGuard<'_, Vec<RunId>> {
        self.open_runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, run_id: RunId) {
        let mut open = self.open_runs();
        if let Some(pos) = open.iter().rposition(|id| *id == run_id) {
            open.remove(pos);
        }
    }
}

impl RunObserver for Tracer {
    fn on_run_start(&self, name: &str, inputs: &serde_json::Value) -> RunId {
        let run_id = Uuid::new_v4();
        let parent_run_id = {
            let mut open = self.open_runs();
            let parent = open.last().copied();
            open.push(run_id);
            parent
        };
        self.session.sink.record(TraceEvent::RunStarted {
            run_id,
            parent_run_id,
            session: self.session.name.clone(),
            example_id: self.example_id.clone(),
            name: name.to_string(),
            inputs: inputs.clone(),
            at: Utc::now(),
        });
        run_id
    }

    fn on_run_end(&self, run_id: RunId, outputs: &serde_json::Value) {
        self.finish(run_id);
        self.session.sink.record(TraceEvent::RunEnded {
            run_id,
            session: self.session.name.clone(),
            outputs: outputs.clone(),
            at: Utc::now(),
        });
    }

    fn on_run_error(&self, run_id: RunId, error: &str) {
        self.finish(run_id);
        self.session.sink.record(TraceEvent::RunFailed {
            run_id,
            session: self.session.name.clone(),
            error: error.to_string(),
            at: Utc::now(),
        });
    }
}

/// Guard returned by [`Tracer::scope`]. Restores the previous active example
/// on drop.
pub struct ExampleScope<'a> {
    tracer: &'a mut Tracer,
    previous: Option<Option<ExampleId>>,
}

impl Deref for ExampleScope<'_> {
    type Target = Tracer;

    fn deref(&self) -> &Tracer {
        self.tracer
    }
}

impl DerefMut for ExampleScope<'_> {
    fn deref_mut(&mut self) -> &mut Tracer {
        self.tracer
    }
}

impl Drop for ExampleScope<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.tracer.example_id = previous;
        }
    }
}
