//! Per-example progress, emitted in completion order.

use crate::model::ExampleId;
use std::sync::{Arc, Mutex, PoisonError};

/// One example finished: `done` of `total` examples now have results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
    pub example_id: ExampleId,
}

/// Called by the engine each time an example completes. Workers call it
/// concurrently, so implementations must be thread-safe.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Completed {}/{}", done, total)
}

/// Sink that prints one progress line per completed example to stderr.
pub fn console_progress_sink() -> ProgressSink {
    Arc::new(|ev: ProgressEvent| {
        eprintln!("{}", format_progress_line(ev.done, ev.total));
    })
}

/// Sink that keeps every event, for inspection after a run.
#[derive(Clone, Default)]
pub struct ProgressLog {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> ProgressSink {
        let events = self.events.clone();
        Arc::new(move |ev: ProgressEvent| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ev);
        })
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_format() {
        assert_eq!(format_progress_line(3, 10), "Completed 3/10");
    }

    #[test]
    fn log_collects_events_in_call_order() {
        let log = ProgressLog::new();
        let sink = log.sink();
        sink(ProgressEvent {
            done: 1,
            total: 2,
            example_id: "b".into(),
        });
        sink(ProgressEvent {
            done: 2,
            total: 2,
            example_id: "a".into(),
        });
        let done: Vec<usize> = log.events().iter().map(|e| e.done).collect();
        assert_eq!(done, vec![1, 2]);
        assert_eq!(log.events()[0].example_id.as_str(), "b");
    }
}
