//! Name-based predictor construction.
//!
//! Configuration names a predictor by kind (`openai-chat`, `echo`, ...). The
//! registry maps each kind to a factory; an unknown kind is rejected before
//! any session is opened.

use super::{chain, chat_model, llm, openai::OpenAiModel, EchoChain, Predictor};
use crate::config::PredictorConfig;
use crate::errors::{SweepError, SweepResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a predictor from its configuration.
pub type PredictorFactory =
    Arc<dyn Fn(&PredictorConfig) -> anyhow::Result<Arc<dyn Predictor>> + Send + Sync>;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Default)]
pub struct PredictorRegistry {
    factories: BTreeMap<String, PredictorFactory>,
}

impl PredictorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `echo`, `openai` (bare model) and `openai-chat`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("echo", |_cfg: &PredictorConfig| Ok(chain(EchoChain)));
        registry.register("openai", |cfg: &PredictorConfig| {
            Ok(llm(openai_from_config(cfg)?))
        });
        registry.register("openai-chat", |cfg: &PredictorConfig| {
            Ok(chat_model(openai_from_config(cfg)?))
        });
        registry
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&PredictorConfig) -> anyhow::Result<Arc<dyn Predictor>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, cfg: &PredictorConfig) -> SweepResult<Arc<dyn Predictor>> {
        let factory = self
            .factories
            .get(&cfg.kind)
            .ok_or_else(|| SweepError::UnsupportedPredictorKind {
                kind: cfg.kind.clone(),
            })?;
        factory(cfg).map_err(|e| {
            SweepError::config(format!("failed to build predictor '{}': {}", cfg.kind, e))
        })
    }
}

fn openai_from_config(cfg: &PredictorConfig) -> anyhow::Result<OpenAiModel> {
    OpenAiModel::from_env(
        cfg.model
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        cfg.temperature.unwrap_or(0.0),
        cfg.max_tokens.unwrap_or(256),
    )
}
