//! Dataset stores the engine reads examples from.

pub mod http;
pub mod memory;

pub use http::PlusClient;
pub use memory::InMemoryStore;

use crate::errors::{SweepError, SweepResult};
use crate::model::{Dataset, Example};
use async_trait::async_trait;
use std::fmt;

/// A dataset addressed by exactly one of its name or id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetRef {
    Name(String),
    Id(String),
}

impl DatasetRef {
    /// Build a reference from optional parts; exactly one must be present.
    pub fn from_parts(name: Option<String>, id: Option<String>) -> SweepResult<Self> {
        match (name, id) {
            (Some(name), Some(id)) => Err(SweepError::AmbiguousDatasetRef { name, id }),
            (Some(name), None) => Ok(Self::Name(name)),
            (None, Some(id)) => Ok(Self::Id(id)),
            (None, None) => Err(SweepError::MissingDatasetRef),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Id(id) => write!(f, "id:{}", id),
        }
    }
}

/// Read access to datasets and their examples.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn read_dataset(&self, dataset: &DatasetRef) -> SweepResult<Dataset>;

    /// Examples of a dataset, in the order the store yields them.
    async fn list_examples(&self, dataset_id: &str) -> SweepResult<Vec<Example>>;
}
