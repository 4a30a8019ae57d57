use super::{DatasetRef, DatasetStore};
use crate::errors::{SweepError, SweepResult};
use crate::model::{Dataset, Example};
use async_trait::async_trait;
use std::collections::HashMap;

/// Datasets held in memory. Examples keep insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    datasets: Vec<Dataset>,
    examples: HashMap<String, Vec<Example>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset with its examples; `dataset_id` is filled in on each example.
    pub fn insert(&mut self, dataset: Dataset, examples: Vec<Example>) {
        let examples = examples
            .into_iter()
            .map(|mut ex| {
                ex.dataset_id = Some(dataset.id.clone());
                ex
            })
            .collect();
        self.examples.insert(dataset.id.clone(), examples);
        self.datasets.retain(|d| d.id != dataset.id);
        self.datasets.push(dataset);
    }

    pub fn with_dataset(mut self, dataset: Dataset, examples: Vec<Example>) -> Self {
        self.insert(dataset, examples);
        self
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }
}

#[async_trait]
impl DatasetStore for InMemoryStore {
    async fn read_dataset(&self, dataset: &DatasetRef) -> SweepResult<Dataset> {
        let found = match dataset {
            DatasetRef::Name(name) => self.datasets.iter().find(|d| &d.name == name),
            DatasetRef::Id(id) => self.datasets.iter().find(|d| &d.id == id),
        };
        found.cloned().ok_or_else(|| SweepError::DatasetNotFound {
            reference: dataset.to_string(),
        })
    }

    async fn list_examples(&self, dataset_id: &str) -> SweepResult<Vec<Example>> {
        Ok(self.examples.get(dataset_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Inputs;

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_dataset(
            Dataset::new("ds-1", "qa"),
            vec![
                Example::new("a", Inputs::new()),
                Example::new("b", Inputs::new()),
            ],
        )
    }

    #[tokio::test]
    async fn resolves_by_name_and_id() {
        let s = store();
        let by_name = s.read_dataset(&DatasetRef::Name("qa".into())).await.unwrap();
        let by_id = s.read_dataset(&DatasetRef::Id("ds-1".into())).await.unwrap();
        assert_eq!(by_name, by_id);
    }

    #[tokio::test]
    async fn unknown_dataset_is_not_found() {
        let err = store()
            .read_dataset(&DatasetRef::Name("nope".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::DatasetNotFound { .. }));
    }

    #[tokio::test]
    async fn examples_keep_order_and_dataset_id() {
        let examples = store().list_examples("ds-1").await.unwrap();
        let ids: Vec<&str> = examples.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(examples
            .iter()
            .all(|e| e.dataset_id.as_deref() == Some("ds-1")));
    }
}
