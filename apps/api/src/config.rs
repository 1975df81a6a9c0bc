use anyhow::{bail, Context, Result};

/// Default upload limit for a single font file: 20 MiB.
const DEFAULT_MAX_FONT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Postgres metadata, S3 font binaries.
    Postgres,
    /// Process-local; everything is lost on restart.
    Memory,
}

/// Connection settings for the Postgres + S3 backend.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable required by the chosen backend is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    /// `Some` exactly when `storage_backend` is `Postgres`.
    pub persistence: Option<PersistenceConfig>,
    pub port: u16,
    pub rust_log: String,
    pub font_url_prefix: String,
    pub max_font_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend = parse_backend(
            &std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
        )?;

        let persistence = match storage_backend {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(PersistenceConfig {
                database_url: require_env("DATABASE_URL")?,
                s3_bucket: require_env("S3_BUCKET")?,
                s3_endpoint: require_env("S3_ENDPOINT")?,
                aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
        };

        Ok(Config {
            storage_backend,
            persistence,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            font_url_prefix: std::env::var("FONT_URL_PREFIX")
                .unwrap_or_else(|_| "/fonts".to_string()),
            max_font_bytes: match std::env::var("MAX_FONT_BYTES") {
                Ok(v) => v
                    .parse::<usize>()
                    .context("MAX_FONT_BYTES must be a byte count")?,
                Err(_) => DEFAULT_MAX_FONT_BYTES,
            },
        })
    }

    /// Process-local configuration with defaults; used by tests.
    pub fn in_memory() -> Self {
        Config {
            storage_backend: StorageBackend::Memory,
            persistence: None,
            port: 8080,
            rust_log: "info".to_string(),
            font_url_prefix: "/fonts".to_string(),
            max_font_bytes: DEFAULT_MAX_FONT_BYTES,
        }
    }
}

fn parse_backend(value: &str) -> Result<StorageBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" => Ok(StorageBackend::Postgres),
        "memory" => Ok(StorageBackend::Memory),
        other => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
