//! Predictors under evaluation and the adapters that give them one calling
//! convention.
//!
//! Three shapes are supported, each behind its own adapter:
//!
//! - [`Llm`]: a bare completion model; inputs must carry a `prompts` list.
//! - [`ChatModel`]: a chat model; each prompt is parsed into a transcript
//!   with [`chat::parse_chat_messages`].
//! - [`Chain`]: a composed pipeline; inputs are passed through unchanged.
//!
//! The engine only sees [`Predictor`]. Supporting a new shape means writing
//! a new adapter, nothing in the engine changes.

pub mod chat;
pub mod openai;
pub mod registry;

pub use chat::{parse_chat_messages, ChatMessage, ChatRole};
pub use registry::{PredictorFactory, PredictorRegistry};

use crate::errors::{SweepError, SweepResult};
use crate::model::Inputs;
use crate::trace::{Callbacks, RunId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Input key holding the prompt list for model predictors.
pub const PROMPTS_KEY: &str = "prompts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    Llm,
    ChatModel,
    Chain,
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Llm => "llm",
            Self::ChatModel => "chat_model",
            Self::Chain => "chain",
        };
        f.write_str(s)
    }
}

/// One generated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_info: Option<Value>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            message: None,
            generation_info: None,
        }
    }
}

/// Model output: one list of generations per prompt, in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResult {
    pub generations: Vec<Vec<Generation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output: Option<Value>,
}

/// A bare completion model.
#[async_trait]
pub trait Llm: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompts: &[String],
        callbacks: Callbacks<'_>,
    ) -> anyhow::Result<LlmResult>;
}

/// A chat model taking one transcript per request.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(
        &self,
        conversations: &[Vec<ChatMessage>],
        callbacks: Callbacks<'_>,
    ) -> anyhow::Result<LlmResult>;
}

/// A composed pipeline. Receives the example inputs as-is.
#[async_trait]
pub trait Chain: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, inputs: &Inputs, callbacks: Callbacks<'_>) -> anyhow::Result<Value>;
}

/// The single invocation contract the engine relies on.
#[async_trait]
pub trait Predictor: Send + Sync {
    fn kind(&self) -> PredictorKind;

    fn name(&self) -> &str;

    /// Run once on `inputs`, reporting the run to `callbacks`.
    async fn invoke(&self, inputs: &Inputs, callbacks: Callbacks<'_>) -> anyhow::Result<Value>;

    /// Blocking form of [`Predictor::invoke`]. Must not be called from
    /// inside an async runtime.
    fn invoke_blocking(&self, inputs: &Inputs, callbacks: Callbacks<'_>) -> anyhow::Result<Value> {
        block_on(self.invoke(inputs, callbacks))?
    }
}

/// Drive `fut` to completion on a private current-thread runtime.
pub(crate) fn block_on<F: Future>(fut: F) -> SweepResult<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(SweepError::BlockingInsideRuntime);
    }
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SweepError::config(format!("failed to start runtime: {}", e)))?;
    Ok(rt.block_on(fut))
}

/// Wrap `call` in start/end notifications to every observer.
async fn observed<F>(
    callbacks: Callbacks<'_>,
    name: &str,
    inputs: &Inputs,
    call: F,
) -> anyhow::Result<Value>
where
    F: Future<Output = anyhow::Result<Value>>,
{
    let run_inputs = Value::Object(inputs.clone());
    let run_ids: Vec<RunId> = callbacks
        .iter()
        .map(|cb| cb.on_run_start(name, &run_inputs))
        .collect();

    let result = call.await;

    match &result {
        Ok(output) => {
            for (cb, run_id) in callbacks.iter().zip(&run_ids) {
                cb.on_run_end(*run_id, output);
            }
        }
        Err(e) => {
            let message = e.to_string();
            for (cb, run_id) in callbacks.iter().zip(&run_ids) {
                cb.on_run_error(*run_id, &message);
            }
        }
    }
    result
}

/// Extract the prompt list model predictors expect.
pub fn prompts_from(inputs: &Inputs) -> anyhow::Result<Vec<String>> {
    let raw = inputs
        .get(PROMPTS_KEY)
        .ok_or_else(|| anyhow::anyhow!("inputs are missing the `{}` key", PROMPTS_KEY))?;
    let list = raw
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("`{}` must be a list of strings", PROMPTS_KEY))?;
    list.iter()
        .map(|p| {
            p.as_str()
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("`{}` must be a list of strings", PROMPTS_KEY))
        })
        .collect()
}

/// Adapter for [`Llm`] predictors.
pub struct LlmAdapter {
    model: Arc<dyn Llm>,
}

impl LlmAdapter {
    pub fn new(model: Arc<dyn Llm>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Predictor for LlmAdapter {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Llm
    }

    fn name(&self) -> &str {
        self.model.name()
    }

    async fn invoke(&self, inputs: &Inputs, callbacks: Callbacks<'_>) -> anyhow::Result<Value> {
        observed(callbacks, self.model.name(), inputs, async {
            let prompts = prompts_from(inputs)?;
            let result = self.model.generate(&prompts, callbacks).await?;
            Ok(serde_json::to_value(result)?)
        })
        .await
    }
}

/// Adapter for [`ChatModel`] predictors.
pub struct ChatModelAdapter {
    model: Arc<dyn ChatModel>,
}

impl ChatModelAdapter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Predictor for ChatModelAdapter {
    fn kind(&self) -> PredictorKind {
        PredictorKind::ChatModel
    }

    fn name(&self) -> &str {
        self.model.name()
    }

    async fn invoke(&self, inputs: &Inputs, callbacks: Callbacks<'_>) -> anyhow::Result<Value> {
        observed(callbacks, self.model.name(), inputs, async {
            let conversations: Vec<Vec<ChatMessage>> = prompts_from(inputs)?
                .iter()
                .map(|p| parse_chat_messages(p))
                .collect();
            let result = self.model.chat(&conversations, callbacks).await?;
            Ok(serde_json::to_value(result)?)
        })
        .await
    }
}

/// Adapter for [`Chain`] predictors.
pub struct ChainAdapter {
    chain: Arc<dyn Chain>,
}

impl ChainAdapter {
    pub fn new(chain: Arc<dyn Chain>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Predictor for ChainAdapter {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Chain
    }

    fn name(&self) -> &str {
        self.chain.name()
    }

    async fn invoke(&self, inputs: &Inputs, callbacks: Callbacks<'_>) -> anyhow::Result<Value> {
        observed(callbacks, self.chain.name(), inputs, self.chain.call(inputs, callbacks)).await
    }
}

pub fn llm(model: impl Llm + 'static) -> Arc<dyn Predictor> {
    Arc::new(LlmAdapter::new(Arc::new(model)))
}

pub fn chat_model(model: impl ChatModel + 'static) -> Arc<dyn Predictor> {
    Arc::new(ChatModelAdapter::new(Arc::new(model)))
}

pub fn chain(chain: impl Chain + 'static) -> Arc<dyn Predictor> {
    Arc::new(ChainAdapter::new(Arc::new(chain)))
}

/// Chain that returns its inputs. Useful for dry runs against a dataset.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoChain;

#[async_trait]
impl Chain for EchoChain {
    fn name(&self) -> &str {
        "echo"
    }

    async fn call(&self, inputs: &Inputs, _callbacks: Callbacks<'_>) -> anyhow::Result<Value> {
        Ok(Value::Object(inputs.clone()))
    }
}
