use super::{TraceEvent, TraceSink};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl TraceSink for MemorySink {
    fn record(&self, event: TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Forwards events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&self, event: TraceEvent) {
        match event {
            TraceEvent::SessionOpened { session, session_id, .. } => {
                info!(session = %session, session_id = %session_id, "trace session opened");
            }
            TraceEvent::SessionClosed { session, session_id, .. } => {
                info!(session = %session, session_id = %session_id, "trace session closed");
            }
            TraceEvent::RunStarted {
                run_id,
                parent_run_id,
                session,
                example_id,
                name,
                ..
            } => {
                debug!(
                    session = %session,
                    run_id = %run_id,
                    parent_run_id = ?parent_run_id,
                    example_id = ?example_id.as_ref().map(|id| id.as_str()),
                    name = %name,
                    "run started"
                );
            }
            TraceEvent::RunEnded { run_id, session, .. } => {
                debug!(session = %session, run_id = %run_id, "run ended");
            }
            TraceEvent::RunFailed {
                run_id,
                session,
                error,
                ..
            } => {
                debug!(session = %session, run_id = %run_id, error = %error, "run failed");
            }
        }
    }
}
