//! Semvec configuration management
//!
//! Handles configuration from environment variables and optional TOML
//! config files, with sensible defaults for local development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Vector store connection
    pub store: StoreConfig,

    /// Embedding backend configuration
    pub embedding: EmbeddingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                value: port,
            })?;
        }

        // CORS origins (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Qdrant
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.store.url = url;
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            config.store.api_key = Some(key);
        }

        // Embedding backend
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider.parse()?;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = Some(model);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.embedding.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.embedding.openai_base_url = url;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        // Only override if env values differ from defaults
        if env_config.server.host != ServerConfig::default().host {
            self.server.host = env_config.server.host;
        }
        if env_config.server.port != ServerConfig::default().port {
            self.server.port = env_config.server.port;
        }
        if env_config.store.url != StoreConfig::default().url {
            self.store.url = env_config.store.url;
        }

        // Always use env for credentials
        if env_config.store.api_key.is_some() {
            self.store.api_key = env_config.store.api_key;
        }
        if env_config.embedding.openai_api_key.is_some() {
            self.embedding.openai_api_key = env_config.embedding.openai_api_key;
        }

        Ok(self)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS; empty means allow any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec![],
        }
    }
}

/// Vector store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Qdrant gRPC URL
    pub url: String,

    /// Bearer credential sent with every store call
    pub api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
        }
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend produces embeddings
    pub provider: EmbedderKind,

    /// Model name; `None` uses the backend's default
    pub model: Option<String>,

    /// OpenAI API key (required for the `openai` provider)
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL
    pub openai_base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderKind::Local,
            model: None,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
        }
    }
}

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Local ONNX model via fastembed
    Local,
    /// OpenAI-compatible embeddings API
    OpenAi,
}

impl std::str::FromStr for EmbedderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAi),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.url, "http://localhost:6334");
        assert_eq!(config.embedding.provider, EmbedderKind::Local);
        assert!(config.store.api_key.is_none());
    }

    #[test]
    fn test_embedder_kind_parse() {
        assert_eq!("local".parse::<EmbedderKind>().unwrap(), EmbedderKind::Local);
        assert_eq!(
            "openai".parse::<EmbedderKind>().unwrap(),
            EmbedderKind::OpenAi
        );
        assert_eq!(
            "OpenAI".parse::<EmbedderKind>().unwrap(),
            EmbedderKind::OpenAi
        );
        assert!("milvus".parse::<EmbedderKind>().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            cors_origins = ["http://localhost:3000"]

            [store]
            url = "http://qdrant.internal:6334"

            [embedding]
            provider = "local"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.store.url, "http://qdrant.internal:6334");
        assert_eq!(config.server.cors_origins.len(), 1);
        // Unlisted fields fall back to defaults
        assert_eq!(config.embedding.openai_base_url, "https://api.openai.com");
        assert!(config.store.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[store]\nurl = \"http://127.0.0.1:6334\"\n").unwrap();
        assert_eq!(config.store.url, "http://127.0.0.1:6334");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.embedding.provider, EmbedderKind::Local);
    }
}
