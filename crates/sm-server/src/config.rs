//! Configuration management

use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Collaborator Endpoints
// ============================================================================

/// Default processing engine API base URL.
pub const DEFAULT_ENGINE_API_URL: &str = "http://localhost:5123";

/// Default timeout for a single engine request, in seconds.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 60;

/// Default molecular database registry base URL.
pub const DEFAULT_MOLDB_API_URL: &str = "http://localhost:5001";

/// Default timeout for registry requests, in seconds.
pub const DEFAULT_MOLDB_TIMEOUT_SECS: u64 = 10;

/// Default base URL that relative optical image URLs are resolved against.
pub const DEFAULT_IMG_STORAGE_URL: &str = "http://localhost:4201";

// ============================================================================
// Database
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/sm";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Mutation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub registry: RegistryConfig,
    pub image_storage: ImageStorageConfig,
    pub database: DatabaseConfig,
}

/// Processing engine endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

/// Molecular database registry endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

/// Optical image storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStorageConfig {
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            engine: EngineConfig {
                api_url: env_or("SM_ENGINE_API_URL", DEFAULT_ENGINE_API_URL),
                timeout_secs: env_parse_or("SM_ENGINE_TIMEOUT_SECS", DEFAULT_ENGINE_TIMEOUT_SECS),
            },
            registry: RegistryConfig {
                api_url: env_or("SM_MOLDB_API_URL", DEFAULT_MOLDB_API_URL),
                timeout_secs: env_parse_or("SM_MOLDB_TIMEOUT_SECS", DEFAULT_MOLDB_TIMEOUT_SECS),
            },
            image_storage: ImageStorageConfig {
                base_url: env_or("SM_IMG_STORAGE_URL", DEFAULT_IMG_STORAGE_URL),
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: env_parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                connect_timeout_secs: env_parse_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_http_url("engine API URL", &self.engine.api_url)?;
        validate_http_url("molecular database API URL", &self.registry.api_url)?;
        validate_http_url("image storage URL", &self.image_storage.base_url)?;

        if self.engine.timeout_secs == 0 {
            anyhow::bail!("Engine timeout must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        Ok(())
    }
}

fn validate_http_url(what: &str, raw: &str) -> anyhow::Result<()> {
    if raw.is_empty() {
        anyhow::bail!("The {} cannot be empty", what);
    }
    let parsed = Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", what, raw, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("The {} must use http or https, got '{}'", what, parsed.scheme());
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                api_url: DEFAULT_ENGINE_API_URL.to_string(),
                timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            },
            registry: RegistryConfig {
                api_url: DEFAULT_MOLDB_API_URL.to_string(),
                timeout_secs: DEFAULT_MOLDB_TIMEOUT_SECS,
            },
            image_storage: ImageStorageConfig {
                base_url: DEFAULT_IMG_STORAGE_URL.to_string(),
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}
