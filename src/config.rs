use crate::services::DedupMode;
use std::env;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "mongodb://localhost:27017/testExcelDemo";

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_upload_files: usize,
    pub max_upload_bytes: usize,
    pub dedup_mode: DedupMode,
    pub cors_allowed_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_upload_files: 10,
            max_upload_bytes: 10 * 1024 * 1024,
            dedup_mode: DedupMode::Strict,
            cors_allowed_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", defaults.port),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_upload_files: parsed(&lookup, "MAX_UPLOAD_FILES", defaults.max_upload_files),
            max_upload_bytes: parsed(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            dedup_mode: parsed(&lookup, "IMPORT_DEDUP_MODE", defaults.dedup_mode),
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN").filter(|o| !o.is_empty()),
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️  Invalid {}='{}', using default", key, raw);
            default
        }),
        None => default,
    }
}
