//! Per-example runner.

use crate::model::{Example, Outcome};
use crate::predictor::Predictor;
use crate::trace::{RunObserver, Tracer};
use tracing::{debug, warn};

/// Invoke `predictor` on `example` `repetitions` times, in order.
///
/// The tracer's active example is set to `example.id` for the duration of
/// the call and restored afterwards. A failing repetition becomes an
/// [`Outcome::Error`] and the remaining repetitions still run.
pub async fn run_example(
    predictor: &dyn Predictor,
    example: &Example,
    repetitions: usize,
    tracer: &mut Tracer,
) -> Vec<Outcome> {
    let scope = tracer.scope(example.id.clone());
    let observers: [&dyn RunObserver; 1] = [&*scope];

    let mut outcomes = Vec::with_capacity(repetitions);
    for rep in 0..repetitions {
        match predictor.invoke(&example.inputs, &observers).await {
            Ok(output) => {
                debug!(example_id = %example.id, rep, "repetition finished");
                outcomes.push(Outcome::Output(output));
            }
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(
                    example_id = %example.id,
                    predictor = predictor.name(),
                    rep,
                    error = %message,
                    "predictor failed on example"
                );
                outcomes.push(Outcome::error(message));
            }
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Inputs;
    use crate::predictor::{chain, Chain};
    use crate::trace::{Callbacks, MemorySink, TraceEvent, TraceRecorder};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails on every other call.
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Chain for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn call(&self, _inputs: &Inputs, _callbacks: Callbacks<'_>) -> anyhow::Result<Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                anyhow::bail!("call {} failed", n);
            }
            Ok(json!(n))
        }
    }

    #[tokio::test]
    async fn failures_are_isolated_per_repetition() {
        let sink = Arc::new(MemorySink::default());
        let session = TraceRecorder::new(sink.clone()).open_session("s");
        let mut tracer = session.tracer();
        let predictor = chain(Flaky {
            calls: AtomicUsize::new(0),
        });
        let example = Example::new("ex-1", Inputs::new());

        let outcomes = run_example(predictor.as_ref(), &example, 4, &mut tracer).await;

        assert_eq!(
            outcomes,
            vec![
                Outcome::Output(json!(0)),
                Outcome::error("call 1 failed"),
                Outcome::Output(json!(2)),
                Outcome::error("call 3 failed"),
            ]
        );
        assert_eq!(tracer.example_id(), None);

        let started: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                TraceEvent::RunStarted { example_id, .. } => Some(example_id),
                _ => None,
            })
            .collect();
        assert_eq!(started.len(), 4);
        assert!(started.iter().all(|id| id.as_ref().map(|i| i.as_str()) == Some("ex-1")));
    }

    #[tokio::test]
    async fn restores_previous_example_id() {
        let session = TraceRecorder::new(Arc::new(MemorySink::default())).open_session("s");
        let mut tracer = session.tracer();
        tracer.set_example_id(Some("outer".into()));
        let predictor = chain(crate::predictor::EchoChain);

        run_example(predictor.as_ref(), &Example::new("inner", Inputs::new()), 1, &mut tracer)
            .await;

        assert_eq!(tracer.example_id().map(|i| i.as_str()), Some("outer"));
    }
}
