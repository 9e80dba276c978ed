//! # In-Memory Result Store
//!
//! A [`ResultStore`] backed by a map behind a tokio `RwLock`. Saves replace the
//! stored result with the same id, so concurrent writers resolve last-write-wins.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::GraderError;
use crate::traits::ResultStore;
use crate::types::StoredResult;

#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<BTreeMap<i64, StoredResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: impl IntoIterator<Item = StoredResult>) -> Self {
        Self {
            results: RwLock::new(results.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub async fn get(&self, id: i64) -> Option<StoredResult> {
        self.results.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn find_by_exercise(&self, exercise_id: i64) -> Result<Vec<StoredResult>, GraderError> {
        Ok(self
            .results
            .read()
            .await
            .values()
            .filter(|r| r.exercise_id == exercise_id)
            .cloned()
            .collect())
    }

    async fn save(&self, result: StoredResult) -> Result<(), GraderError> {
        self.results.write().await.insert(result.id, result);
        Ok(())
    }
}
