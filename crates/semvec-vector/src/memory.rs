//! In-memory vector store for tests and offline development
//!
//! Implements the same contract as the Qdrant adapter with a linear cosine
//! scan, so the HTTP layer can be exercised without a live vector database.

use std::collections::HashMap;

use async_trait::async_trait;
use semvec_core::{InsertOutcome, NewRecord, Result, SearchHit, SemvecError};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cosine_similarity;

/// Process-local vector store backed by a hash map
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
}

struct MemCollection {
    dimension: usize,
    records: Vec<MemRecord>,
}

struct MemRecord {
    id: String,
    vector: Vec<f32>,
    text: Option<String>,
    category: Option<String>,
    metadata: Option<serde_json::Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::VectorStore for InMemoryStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        if dimension == 0 {
            return Err(SemvecError::Validation(
                "Collection dimension must be at least 1".to_string(),
            ));
        }

        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(SemvecError::CollectionAlreadyExists(name.to_string()));
        }

        collections.insert(
            name.to_string(),
            MemCollection {
                dimension,
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .remove(name)
            .ok_or_else(|| SemvecError::CollectionNotFound(name.to_string()))?;
        Ok(())
    }

    async fn collection_dimension(&self, name: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections
            .get(name)
            .map(|c| c.dimension)
            .ok_or_else(|| SemvecError::CollectionNotFound(name.to_string()))
    }

    async fn insert(&self, collection: &str, records: Vec<NewRecord>) -> Result<InsertOutcome> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| SemvecError::CollectionNotFound(collection.to_string()))?;

        // Validate the whole batch before touching the collection
        for record in &records {
            if record.vector.len() != entry.dimension {
                return Err(SemvecError::DimensionMismatch {
                    expected: entry.dimension,
                    actual: record.vector.len(),
                });
            }
        }

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = Uuid::new_v4().to_string();
            entry.records.push(MemRecord {
                id: id.clone(),
                vector: record.vector,
                text: record.text,
                category: record.category,
                metadata: record.metadata,
            });
            ids.push(id);
        }

        Ok(InsertOutcome {
            count: ids.len(),
            ids,
        })
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&serde_json::Value>,
    ) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| SemvecError::CollectionNotFound(collection.to_string()))?;

        if vector.len() != entry.dimension {
            return Err(SemvecError::DimensionMismatch {
                expected: entry.dimension,
                actual: vector.len(),
            });
        }

        let mut hits = Vec::new();
        for record in &entry.records {
            if let Some(filter) = filter {
                if !matches_filter(record, filter)? {
                    continue;
                }
            }

            hits.push(SearchHit {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
                text: record.text.clone(),
                category: record.category.clone(),
                metadata: record.metadata.clone(),
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }
}

/// Apply the same flat filter semantics as the Qdrant adapter: keys are
/// payload paths, values must be scalar, all conditions must match.
fn matches_filter(record: &MemRecord, filter: &serde_json::Value) -> Result<bool> {
    let object = filter
        .as_object()
        .ok_or_else(|| SemvecError::Validation("Search filter must be a JSON object".to_string()))?;

    for (key, expected) in object {
        match expected {
            serde_json::Value::String(_) | serde_json::Value::Bool(_) => {}
            serde_json::Value::Number(n) if n.is_i64() => {}
            _ => {
                return Err(SemvecError::Validation(format!(
                    "Filter value for '{key}' must be a string, integer, or boolean"
                )))
            }
        }

        if lookup_field(record, key).as_ref() != Some(expected) {
            return Ok(false);
        }
    }

    Ok(true)
}

fn lookup_field(record: &MemRecord, path: &str) -> Option<serde_json::Value> {
    match path {
        "text" => record.text.clone().map(serde_json::Value::String),
        "category" => record.category.clone().map(serde_json::Value::String),
        _ => {
            let rest = path.strip_prefix("metadata")?;
            let metadata = record.metadata.as_ref()?;
            if rest.is_empty() {
                return Some(metadata.clone());
            }
            let pointer = format!("/{}", rest.strip_prefix('.')?.replace('.', "/"));
            metadata.pointer(&pointer).cloned()
        }
    }
}
