//! Application state management

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use semvec_core::AppConfig;
use semvec_vector::{TextEmbedder, VectorStore};
use tokio::sync::RwLock;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Embedding backend (None until a model is loaded)
    pub embedder: RwLock<Option<Arc<dyn TextEmbedder>>>,
    /// Vector store backend (None when the upstream is unconfigured)
    pub store: RwLock<Option<Arc<dyn VectorStore>>>,
}

impl AppState {
    /// Create new application state with config
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(false),
            embedder: RwLock::new(None),
            store: RwLock::new(None),
        }
    }

    /// State with backends already installed and the ready flag set
    pub fn with_backends(
        config: AppConfig,
        embedder: Option<Arc<dyn TextEmbedder>>,
        store: Option<Arc<dyn VectorStore>>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
            embedder: RwLock::new(embedder),
            store: RwLock::new(store),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }

    /// Install the embedding backend
    pub async fn set_embedder(&self, embedder: Arc<dyn TextEmbedder>) {
        *self.embedder.write().await = Some(embedder);
    }

    /// Get the embedding backend if loaded
    pub async fn get_embedder(&self) -> Option<Arc<dyn TextEmbedder>> {
        self.embedder.read().await.clone()
    }

    /// Install the vector store backend
    pub async fn set_store(&self, store: Arc<dyn VectorStore>) {
        *self.store.write().await = Some(store);
    }

    /// Get the vector store backend if configured
    pub async fn get_store(&self) -> Option<Arc<dyn VectorStore>> {
        self.store.read().await.clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
