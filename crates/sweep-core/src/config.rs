//! Run configuration (YAML) and client configuration (environment).

use crate::dataset::DatasetRef;
use crate::engine::RunOptions;
use crate::errors::{SweepError, SweepResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_REPETITIONS: usize = 1;
pub const DEFAULT_JOIN_TIMEOUT_SECS: u64 = 300;

/// Which predictor to build, resolved through a
/// [`PredictorRegistry`](crate::predictor::PredictorRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub kind: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl PredictorConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub version: u32,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,
    #[serde(default)]
    pub sequential: bool,
    pub predictor: PredictorConfig,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_repetitions() -> usize {
    DEFAULT_REPETITIONS
}

fn default_join_timeout_secs() -> u64 {
    DEFAULT_JOIN_TIMEOUT_SECS
}

impl RunConfig {
    pub fn dataset_ref(&self) -> SweepResult<DatasetRef> {
        DatasetRef::from_parts(self.dataset.clone(), self.dataset_id.clone())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            workers: self.workers,
            repetitions: self.repetitions,
            session_name: self.session_name.clone(),
            join_timeout: Duration::from_secs(self.join_timeout_secs),
            progress: None,
        }
    }

    fn validate(&self) -> SweepResult<()> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(SweepError::config(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if self.workers == 0 {
            return Err(SweepError::config("workers must be at least 1"));
        }
        if self.repetitions == 0 {
            return Err(SweepError::config("repetitions must be at least 1"));
        }
        if self.predictor.kind.trim().is_empty() {
            return Err(SweepError::config("predictor.kind must not be empty"));
        }
        Ok(())
    }
}

pub fn parse_config(raw: &str) -> SweepResult<RunConfig> {
    let cfg: RunConfig = serde_yaml::from_str(raw)
        .map_err(|e| SweepError::config(format!("failed to parse YAML: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> SweepResult<RunConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SweepError::config(format!("failed to read config {}: {}", path.display(), e))
    })?;
    parse_config(&raw)
}

/// Connection settings for the hosted dataset API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            tenant_id: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SWEEP_API_URL` | API base URL (default `http://localhost:8000`) |
    /// | `SWEEP_API_KEY` | API key, required for non-local URLs |
    /// | `SWEEP_TENANT_ID` | Tenant; looked up from the server when local |
    /// | `SWEEP_TIMEOUT_SECS` | Request timeout in seconds (default: 30) |
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("SWEEP_API_URL").unwrap_or_else(|_| default_api_url()),
            api_key: std::env::var("SWEEP_API_KEY").ok().filter(|k| !k.is_empty()),
            tenant_id: std::env::var("SWEEP_TENANT_ID")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("SWEEP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg = parse_config("version: 1\ndataset: qa.csv\npredictor:\n  kind: echo\n").unwrap();
        assert_eq!(cfg.workers, DEFAULT_WORKERS);
        assert_eq!(cfg.repetitions, DEFAULT_REPETITIONS);
        assert_eq!(cfg.join_timeout_secs, DEFAULT_JOIN_TIMEOUT_SECS);
        assert!(!cfg.sequential);
        assert_eq!(cfg.predictor.kind, "echo");
        assert_eq!(cfg.dataset_ref().unwrap(), DatasetRef::Name("qa.csv".into()));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = parse_config("version: 2\ndataset: qa\npredictor: {kind: echo}\n").unwrap_err();
        assert!(err.to_string().contains("unsupported config version 2"));
    }

    #[test]
    fn rejects_zero_workers_and_repetitions() {
        let err = parse_config("version: 1\nworkers: 0\npredictor: {kind: echo}\n").unwrap_err();
        assert!(err.to_string().contains("workers"));
        let err =
            parse_config("version: 1\nrepetitions: 0\npredictor: {kind: echo}\n").unwrap_err();
        assert!(err.to_string().contains("repetitions"));
    }

    #[test]
    fn dataset_name_and_id_are_exclusive() {
        let cfg = parse_config(
            "version: 1\ndataset: qa\ndataset_id: ds-1\npredictor: {kind: echo}\n",
        )
        .unwrap();
        assert!(matches!(
            cfg.dataset_ref(),
            Err(SweepError::AmbiguousDatasetRef { .. })
        ));
    }

    #[test]
    fn run_options_follow_config() {
        let cfg = parse_config(
            "version: 1\ndataset: qa\nworkers: 2\nrepetitions: 3\nsession_name: nightly\njoin_timeout_secs: 9\npredictor: {kind: echo}\n",
        )
        .unwrap();
        let opts = cfg.run_options();
        assert_eq!(opts.workers, 2);
        assert_eq!(opts.repetitions, 3);
        assert_eq!(opts.session_name.as_deref(), Some("nightly"));
        assert_eq!(opts.join_timeout, Duration::from_secs(9));
    }

    #[test]
    fn load_config_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "version: 1\ndataset_id: ds-9\npredictor:\n  kind: openai-chat\n  model: gpt-4o-mini"
        )
        .unwrap();
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.predictor.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cfg.dataset_ref().unwrap(), DatasetRef::Id("ds-9".into()));
    }

    #[test]
    fn load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/sweep.yaml")).unwrap_err();
        assert!(matches!(err, SweepError::Config { .. }));
    }

    #[test]
    #[serial]
    fn client_config_from_env() {
        unsafe {
            std::env::set_var("SWEEP_API_URL", "https://api.example.com");
            std::env::set_var("SWEEP_API_KEY", "key-1");
            std::env::remove_var("SWEEP_TENANT_ID");
            std::env::set_var("SWEEP_TIMEOUT_SECS", "7");
        }
        let cfg = ClientConfig::from_env();
        assert_eq!(cfg.api_url, "https://api.example.com");
        assert_eq!(cfg.api_key.as_deref(), Some("key-1"));
        assert_eq!(cfg.tenant_id, None);
        assert_eq!(cfg.timeout_secs, 7);
        unsafe {
            std::env::remove_var("SWEEP_API_URL");
            std::env::remove_var("SWEEP_API_KEY");
            std::env::remove_var("SWEEP_TIMEOUT_SECS");
        }
    }
}
