use crate::error::{EnricherError, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub gcp: GcpConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct GcpConfig {
    /// Project hosting the outbound topic and the resource cache
    pub project_id: String,
    pub topic_name: String,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Named Datastore database; `None` targets the default database
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Datastore,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = EnricherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "datastore" | "firestore" => Ok(Self::Datastore),
            "memory" => Ok(Self::Memory),
            other => Err(EnricherError::Config(format!(
                "Invalid CACHE_BACKEND: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = EnricherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(EnricherError::Config(format!("Invalid LOG_FORMAT: {other}"))),
        }
    }
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    settings_from(|key| std::env::var(key).ok())
}

/// Build settings from an arbitrary variable source
pub(crate) fn settings_from(var: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    let gcp = GcpConfig {
        project_id: var("PROJECT_ID")
            .or_else(|| var("GOOGLE_CLOUD_PROJECT"))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EnricherError::Config("PROJECT_ID not set".to_string()))?,
        topic_name: var("TOPIC_NAME")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EnricherError::Config("TOPIC_NAME not set".to_string()))?,
        http_timeout: Duration::from_secs(
            var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| EnricherError::Config("Invalid HTTP_TIMEOUT_SECS".to_string()))?,
        ),
    };

    let server = ServerConfig {
        port: var("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| EnricherError::Config("Invalid PORT".to_string()))?,
    };

    let cache = CacheConfig {
        backend: var("CACHE_BACKEND")
            .unwrap_or_else(|| "datastore".to_string())
            .parse()?,
        database_id: var("DATASTORE_DATABASE_ID").filter(|v| !v.is_empty()),
    };

    let log_format = var("LOG_FORMAT")
        .unwrap_or_else(|| "pretty".to_string())
        .parse()?;

    Ok(Settings {
        gcp,
        server,
        cache,
        log_format,
    })
}
