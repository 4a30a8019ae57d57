use super::super::args::RunArgs;
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use std::sync::Arc;
use sweep_core::config::{load_config, RunConfig};
use sweep_core::dataset::PlusClient;
use sweep_core::engine::Evaluator;
use sweep_core::predictor::PredictorRegistry;
use sweep_core::report::json::write_json;
use sweep_core::report::progress::console_progress_sink;
use sweep_core::report::summary::summary_line;
use tracing::info;

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut cfg = load_config(&args.config)?;
    apply_overrides(&mut cfg, &args);

    // Unknown kinds fail before the API is contacted.
    let registry = PredictorRegistry::with_builtins();
    let predictor = registry.build(&cfg.predictor)?;
    cfg.dataset_ref()?;

    let client = PlusClient::from_env().await?;
    let evaluator = Evaluator::with_logging(Arc::new(client));
    let progress = args.progress.then(console_progress_sink);
    let report = evaluator.run_configured(&cfg, predictor, progress).await?;

    eprintln!("{}", summary_line(&report));
    match &args.output {
        Some(path) => {
            write_json(&report, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "results written");
        }
        None => println!("{}", serde_json::to_string_pretty(&report.results)?),
    }
    Ok(SUCCESS)
}

fn apply_overrides(cfg: &mut RunConfig, args: &RunArgs) {
    if args.dataset.is_some() || args.dataset_id.is_some() {
        cfg.dataset = args.dataset.clone();
        cfg.dataset_id = args.dataset_id.clone();
    }
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }
    if let Some(repetitions) = args.repetitions {
        cfg.repetitions = repetitions;
    }
    if let Some(session) = &args.session {
        cfg.session_name = Some(session.clone());
    }
    if args.sequential {
        cfg.sequential = true;
    }
}
