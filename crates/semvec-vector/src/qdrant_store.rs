//! Qdrant implementation for vector storage
//!
//! Provides connection management and per-collection vector operations
//! against a remote Qdrant instance.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    vectors_config, Condition, CreateCollectionBuilder, Distance, Filter, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use semvec_core::{InsertOutcome, NewRecord, Result, SearchHit, SemvecError, StoreConfig};
use uuid::Uuid;

/// Qdrant vector store implementation
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Create a new Qdrant connection.
    ///
    /// The underlying channel is lazy, so errors here only cover invalid
    /// URLs. Reachability surfaces on the first operation.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| SemvecError::Upstream(format!("Qdrant connection failed: {e}")))?;

        Ok(Self { client })
    }

    async fn ensure_collection(&self, name: &str) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to list collections: {e}")))?;

        if !collections.collections.iter().any(|c| c.name == name) {
            return Err(SemvecError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl super::VectorStore for QdrantStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        if dimension == 0 {
            return Err(SemvecError::Validation(
                "Collection dimension must be at least 1".to_string(),
            ));
        }

        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to list collections: {e}")))?;

        if collections.collections.iter().any(|c| c.name == name) {
            return Err(SemvecError::CollectionAlreadyExists(name.to_string()));
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    dimension as u64,
                    Distance::Cosine,
                )),
            )
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to create collection: {e}")))?;

        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to list collections: {e}")))?;

        Ok(collections
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.ensure_collection(name).await?;

        self.client
            .delete_collection(name)
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to delete collection: {e}")))?;

        Ok(())
    }

    async fn collection_dimension(&self, name: &str) -> Result<usize> {
        self.ensure_collection(name).await?;

        let info = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to read collection info: {e}")))?;

        info.result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                vectors_config::Config::Params(params) => Some(params.size as usize),
                vectors_config::Config::ParamsMap(map) => {
                    map.map.values().next().map(|params| params.size as usize)
                }
            })
            .ok_or_else(|| {
                SemvecError::Upstream(format!("Collection {name} reports no vector params"))
            })
    }

    async fn insert(&self, collection: &str, records: Vec<NewRecord>) -> Result<InsertOutcome> {
        let expected = self.collection_dimension(collection).await?;

        if records.is_empty() {
            return Ok(InsertOutcome {
                count: 0,
                ids: Vec::new(),
            });
        }

        let mut ids = Vec::with_capacity(records.len());
        let mut points = Vec::with_capacity(records.len());

        for record in records {
            if record.vector.len() != expected {
                return Err(SemvecError::DimensionMismatch {
                    expected,
                    actual: record.vector.len(),
                });
            }

            let id = Uuid::new_v4().to_string();

            let mut fields = serde_json::Map::new();
            if let Some(text) = record.text {
                fields.insert("text".to_string(), serde_json::Value::String(text));
            }
            if let Some(category) = record.category {
                fields.insert("category".to_string(), serde_json::Value::String(category));
            }
            if let Some(metadata) = record.metadata {
                fields.insert("metadata".to_string(), metadata);
            }

            let payload_map: HashMap<String, Value> =
                fields.into_iter().map(|(k, v)| (k, v.into())).collect();

            points.push(PointStruct::new(id.clone(), record.vector, payload_map));
            ids.push(id);
        }

        let count = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await
            .map_err(|e| SemvecError::Upstream(format!("Failed to upsert vectors: {e}")))?;

        Ok(InsertOutcome { count, ids })
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&serde_json::Value>,
    ) -> Result<Vec<SearchHit>> {
        let expected = self.collection_dimension(collection).await?;
        if vector.len() != expected {
            return Err(SemvecError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut request = SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
            .with_payload(true);

        if let Some(filter) = filter {
            let conditions = filter_conditions(filter)?;
            if !conditions.is_empty() {
                request = request.filter(Filter::must(conditions));
            }
        }

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| SemvecError::Upstream(format!("Vector search failed: {e}")))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let text = point
                    .payload
                    .get("text")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let category = point
                    .payload
                    .get("category")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let metadata = point
                    .payload
                    .get("metadata")
                    .map(qdrant_value_to_json)
                    .filter(|v| !v.is_null());

                SearchHit {
                    id: point_id_to_string(point.id.as_ref()),
                    score: point.score,
                    text,
                    category,
                    metadata,
                }
            })
            .collect();

        Ok(hits)
    }
}

/// Translate a flat JSON filter object into Qdrant match conditions.
///
/// Keys are payload paths (`category`, `metadata.lang`), values must be
/// scalar. Floats are rejected because Qdrant only matches them by range.
fn filter_conditions(filter: &serde_json::Value) -> Result<Vec<Condition>> {
    let object = filter
        .as_object()
        .ok_or_else(|| SemvecError::Validation("Search filter must be a JSON object".to_string()))?;

    let mut conditions = Vec::with_capacity(object.len());
    for (key, value) in object {
        let condition = match value {
            serde_json::Value::String(s) => Condition::matches(key.clone(), s.clone()),
            serde_json::Value::Bool(b) => Condition::matches(key.clone(), *b),
            serde_json::Value::Number(n) => {
                let integer = n.as_i64().ok_or_else(|| {
                    SemvecError::Validation(format!(
                        "Filter value for '{key}' must be a string, integer, or boolean"
                    ))
                })?;
                Condition::matches(key.clone(), integer)
            }
            _ => {
                return Err(SemvecError::Validation(format!(
                    "Filter value for '{key}' must be a string, integer, or boolean"
                )))
            }
        };
        conditions.push(condition);
    }

    Ok(conditions)
}

fn qdrant_value_to_json(value: &Value) -> serde_json::Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(*i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}

fn point_id_to_string(id: Option<&PointId>) -> String {
    match id.and_then(|p| p.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VectorStore;

    #[test]
    fn test_filter_conditions_accepts_scalars() {
        let filter = serde_json::json!({
            "category": "greeting",
            "metadata.priority": 3,
            "metadata.published": true
        });
        let conditions = filter_conditions(&filter).unwrap();
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn test_filter_conditions_rejects_nested_values() {
        let filter = serde_json::json!({ "metadata": { "lang": "ko" } });
        assert!(matches!(
            filter_conditions(&filter),
            Err(SemvecError::Validation(_))
        ));

        let filter = serde_json::json!(["category"]);
        assert!(matches!(
            filter_conditions(&filter),
            Err(SemvecError::Validation(_))
        ));
    }

    #[test]
    fn test_filter_conditions_rejects_floats() {
        let filter = serde_json::json!({ "metadata.score": 0.5 });
        assert!(matches!(
            filter_conditions(&filter),
            Err(SemvecError::Validation(_))
        ));
    }

    #[test]
    fn test_payload_value_round_trip() {
        let original = serde_json::json!({
            "lang": "ko",
            "tags": ["greeting", "formal"],
            "count": 3,
            "nested": { "published": true }
        });

        let converted: Value = original.clone().into();
        assert_eq!(qdrant_value_to_json(&converted), original);
    }

    #[test]
    fn test_point_id_to_string() {
        let uuid_id = PointId {
            point_id_options: Some(PointIdOptions::Uuid("abc-123".to_string())),
        };
        assert_eq!(point_id_to_string(Some(&uuid_id)), "abc-123");

        let num_id = PointId {
            point_id_options: Some(PointIdOptions::Num(42)),
        };
        assert_eq!(point_id_to_string(Some(&num_id)), "42");
        assert_eq!(point_id_to_string(None), "");
    }

    #[tokio::test]
    #[ignore = "requires a running Qdrant instance on localhost:6334"]
    async fn test_collection_lifecycle() {
        let store = QdrantStore::connect(&StoreConfig::default()).unwrap();
        let name = format!("semvec-test-{}", Uuid::new_v4());

        store.create_collection(&name, 4).await.unwrap();
        assert!(store.list_collections().await.unwrap().contains(&name));
        assert_eq!(store.collection_dimension(&name).await.unwrap(), 4);

        let duplicate = store.create_collection(&name, 4).await;
        assert!(matches!(
            duplicate,
            Err(SemvecError::CollectionAlreadyExists(_))
        ));

        let records = vec![
            NewRecord::new(vec![0.1, 0.2, 0.3, 0.4])
                .with_text("안녕하세요")
                .with_category("greeting"),
            NewRecord::new(vec![0.9, 0.1, 0.0, 0.0]).with_text("bonjour"),
        ];
        let outcome = store.insert(&name, records).await.unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.ids.len(), 2);

        let hits = store
            .search(&name, &[0.1, 0.2, 0.3, 0.4], 5, None)
            .await
            .unwrap();
        assert!(!hits.is_empty());

        store.delete_collection(&name).await.unwrap();
        assert!(!store.list_collections().await.unwrap().contains(&name));
    }

    #[tokio::test]
    #[ignore = "requires a running Qdrant instance on localhost:6334"]
    async fn test_missing_collection_is_reported() {
        let store = QdrantStore::connect(&StoreConfig::default()).unwrap();
        let result = store.collection_dimension("semvec-missing").await;
        assert!(matches!(result, Err(SemvecError::CollectionNotFound(_))));
    }
}
