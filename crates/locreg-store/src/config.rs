//! Environment configuration and backend selection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use locreg_core::{RegistrationRepository, StoreError};

use crate::file::FileRepository;
use crate::mongo::MongoRegistrationRepository;
use crate::object::ObjectStoreRepository;
use crate::postgres::PgRegistrationRepository;

/// Default deadline for remote object-store calls, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is missing for the selected backend.
    #[error("{variable} must be set when STORAGE_BACKEND={backend}")]
    Missing {
        /// The missing environment variable.
        variable: &'static str,
        /// The backend that requires it.
        backend: &'static str,
    },

    /// `STORAGE_BACKEND` named something other than the four known kinds.
    #[error("unsupported STORAGE_BACKEND: {0} (expected FILE, MINIO, POSTGRES or MONGO)")]
    UnknownBackend(String),

    /// A numeric variable failed to parse.
    #[error("{variable} is not a valid number: {value}")]
    InvalidNumber {
        /// The offending environment variable.
        variable: &'static str,
        /// The value that failed to parse.
        value: String,
    },
}

/// The storage backend selected at startup, with its connection settings.
#[derive(Debug, Clone)]
pub enum BackendKind {
    /// Local JSON file.
    File {
        /// Path of the aggregate document.
        path: PathBuf,
    },
    /// S3-compatible object store (MinIO).
    Minio {
        /// Endpoint URL, e.g. `http://localhost:9000`.
        endpoint: String,
        /// Region name; MinIO accepts any, defaults to `us-east-1`.
        region: String,
        /// Bucket holding the aggregate document.
        bucket: String,
        /// Object key of the aggregate document.
        key: String,
        /// Access key id.
        access_key: String,
        /// Secret access key.
        secret_key: String,
        /// Per-call deadline.
        timeout: Duration,
    },
    /// `PostgreSQL` with normalized tables.
    Postgres {
        /// Connection string.
        database_url: String,
    },
    /// `MongoDB` with one document per location plus a counter document.
    Mongo {
        /// Connection string.
        url: String,
        /// Database name.
        database: String,
    },
}

impl BackendKind {
    /// Name used in log output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::Minio { .. } => "minio",
            Self::Postgres { .. } => "postgres",
            Self::Mongo { .. } => "mongo",
        }
    }
}

/// Parsed store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// The selected backend.
    pub backend: BackendKind,
}

impl StoreConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// `STORAGE_BACKEND` selects the backend kind (`FILE` when unset); the
    /// remaining variables are backend-specific.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let kind = get("STORAGE_BACKEND").unwrap_or_else(|| "FILE".to_string());
        let require = |variable: &'static str, backend: &'static str| {
            get(variable).ok_or(ConfigError::Missing { variable, backend })
        };

        let backend = match kind.to_ascii_uppercase().as_str() {
            "FILE" => BackendKind::File {
                path: get("STORAGE_FILE_PATH")
                    .unwrap_or_else(|| "storage.json".to_string())
                    .into(),
            },
            "MINIO" => {
                let timeout = match get("STORAGE_TIMEOUT_SECS") {
                    None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                    Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                        ConfigError::InvalidNumber {
                            variable: "STORAGE_TIMEOUT_SECS",
                            value: raw.clone(),
                        }
                    })?),
                };
                BackendKind::Minio {
                    endpoint: require("MINIO_ENDPOINT", "MINIO")?,
                    region: get("MINIO_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    bucket: require("MINIO_BUCKET", "MINIO")?,
                    key: get("MINIO_OBJECT_KEY").unwrap_or_else(|| "storage.json".to_string()),
                    access_key: require("MINIO_ACCESS_KEY", "MINIO")?,
                    secret_key: require("MINIO_SECRET_KEY", "MINIO")?,
                    timeout,
                }
            }
            "POSTGRES" => BackendKind::Postgres {
                database_url: require("DATABASE_URL", "POSTGRES")?,
            },
            "MONGO" => BackendKind::Mongo {
                url: require("MONGO_URL", "MONGO")?,
                database: get("MONGO_DATABASE").unwrap_or_else(|| "locreg".to_string()),
            },
            _ => return Err(ConfigError::UnknownBackend(kind)),
        };

        Ok(Self { backend })
    }
}

/// Builds the repository selected by `config`, connecting pools and clients
/// as needed. Called once at startup; the result is shared behind an `Arc`.
///
/// # Errors
///
/// Returns [`StoreError::StorageUnavailable`] when the backend cannot be
/// reached or authenticated against.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn RegistrationRepository>, StoreError> {
    tracing::info!(backend = config.backend.name(), "selecting storage backend");

    match &config.backend {
        BackendKind::File { path } => Ok(Arc::new(FileRepository::new(path.clone()))),
        BackendKind::Minio {
            endpoint,
            region,
            bucket,
            key,
            access_key,
            secret_key,
            timeout,
        } => {
            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(Region::new(region.clone()))
                .credentials_provider(Credentials::from_keys(access_key, secret_key, None))
                .load()
                .await;
            // MinIO serves buckets under the path, not as subdomains.
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            let client = aws_sdk_s3::Client::from_conf(s3_config);
            Ok(Arc::new(ObjectStoreRepository::new(
                client,
                bucket.clone(),
                key.clone(),
                *timeout,
            )))
        }
        BackendKind::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .connect(database_url)
                .await
                .map_err(StoreError::unavailable)?;
            Ok(Arc::new(PgRegistrationRepository::new(pool)))
        }
        BackendKind::Mongo { url, database } => {
            let client = mongodb::Client::with_uri_str(url)
                .await
                .map_err(StoreError::unavailable)?;
            Ok(Arc::new(MongoRegistrationRepository::new(
                &client.database(database),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn test_defaults_to_the_file_backend() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        match config.backend {
            BackendKind::File { path } => assert_eq!(path, PathBuf::from("storage.json")),
            other => panic!("expected file backend, got {other:?}"),
        }
    }

    #[test]
    fn test_backend_kind_is_case_insensitive() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "file"),
            ("STORAGE_FILE_PATH", "/tmp/state.json"),
        ]))
        .unwrap();
        match config.backend {
            BackendKind::File { path } => assert_eq!(path, PathBuf::from("/tmp/state.json")),
            other => panic!("expected file backend, got {other:?}"),
        }
    }

    #[test]
    fn test_minio_requires_endpoint_bucket_and_credentials() {
        let err = StoreConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "MINIO")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                variable: "MINIO_ENDPOINT",
                ..
            }
        ));
    }

    #[test]
    fn test_minio_parses_with_defaults_for_key_region_and_timeout() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "MINIO"),
            ("MINIO_ENDPOINT", "http://localhost:9000"),
            ("MINIO_BUCKET", "registrations"),
            ("MINIO_ACCESS_KEY", "minio"),
            ("MINIO_SECRET_KEY", "minio123"),
        ]))
        .unwrap();
        match config.backend {
            BackendKind::Minio { key, region, timeout, .. } => {
                assert_eq!(key, "storage.json");
                assert_eq!(region, "us-east-1");
                assert_eq!(timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
            }
            other => panic!("expected minio backend, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "MINIO"),
            ("MINIO_ENDPOINT", "http://localhost:9000"),
            ("MINIO_BUCKET", "registrations"),
            ("MINIO_ACCESS_KEY", "minio"),
            ("MINIO_SECRET_KEY", "minio123"),
            ("STORAGE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                variable: "STORAGE_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = StoreConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "POSTGRES")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                variable: "DATABASE_URL",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "REDIS")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(ref kind) if kind == "REDIS"));
    }
}
