use std::path::PathBuf;

use super::Environment;

/// Runtime settings, read from the environment with local-friendly defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub upload: UploadSettings,
    pub summarizer: SummarizerSettings,
    pub queue: QueueSettings,
    pub environment: Environment,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub blob_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_file_size_mb: u64,
}

impl UploadSettings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    /// Empty key switches the wiring to the mock summarizer.
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub capacity: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings {
                port: env_parsed("SERVER_PORT", 3000),
            },
            storage: StorageSettings {
                blob_path: PathBuf::from(env_or("BLOB_STORE_PATH", "./blobs")),
            },
            upload: UploadSettings {
                max_file_size_mb: env_parsed("MAX_UPLOAD_MB", 20),
            },
            summarizer: SummarizerSettings {
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: env_or("SUMMARY_MODEL", "gpt-4o-mini"),
            },
            queue: QueueSettings {
                capacity: env_parsed("QUEUE_CAPACITY", 64),
            },
            environment: std::env::var("APP_ENV")
                .ok()
                .and_then(|v| Environment::try_from(v).ok())
                .unwrap_or(Environment::Local),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
