//! Application configuration loaded from environment variables.

use std::env;

/// Where stories are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process tables; contents are lost on restart.
    Memory,
    /// Google Cloud Firestore in the given project.
    Firestore { project_id: String },
}

impl StorageBackend {
    /// Value of `STORAGE_BACKEND` that selects this backend.
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Firestore { .. } => "firestore",
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Storage backend for stories
    pub storage: StorageBackend,
    /// JWT signing key for bearer tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Fixed configuration for tests: in-memory storage and a known signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first, if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .trim()
        {
            "memory" => StorageBackend::Memory,
            "firestore" => StorageBackend::Firestore {
                project_id: env::var("GCP_PROJECT_ID")
                    .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            },
            other => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Unknown STORAGE_BACKEND '{0}' (expected 'memory' or 'firestore')")]
    InvalidBackend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases mutate the same process-wide variables, so they run in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::remove_var("STORAGE_BACKEND");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");

        env::set_var("STORAGE_BACKEND", "firestore");
        env::set_var("GCP_PROJECT_ID", "diary-test");
        let config = Config::from_env().expect("Config should load");
        assert_eq!(
            config.storage,
            StorageBackend::Firestore {
                project_id: "diary-test".to_string()
            }
        );
        assert_eq!(config.storage.name(), "firestore");

        env::set_var("STORAGE_BACKEND", "postgres");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend(ref name) if name == "postgres"));

        env::remove_var("STORAGE_BACKEND");
        env::remove_var("GCP_PROJECT_ID");
    }
}
