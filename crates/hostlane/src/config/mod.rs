use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use uuid::Uuid;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the platform.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub backend: BackendConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            backend: BackendConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Which backend implementation serves repositories and object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Memory,
    Rest { url: String, service_key: String },
}

/// Connection details for the managed database and storage service.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub photo_bucket: String,
    pub document_bucket: String,
    pub signed_url_ttl_secs: u64,
    pub bootstrap_admin: Option<Uuid>,
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mode = match env::var("APP_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => BackendMode::Memory,
            "rest" => {
                let url = env::var("APP_BACKEND_URL")
                    .map_err(|_| ConfigError::MissingVar("APP_BACKEND_URL"))?;
                let service_key = env::var("APP_BACKEND_KEY")
                    .map_err(|_| ConfigError::MissingVar("APP_BACKEND_KEY"))?;
                BackendMode::Rest {
                    url: url.trim_end_matches('/').to_string(),
                    service_key,
                }
            }
            other => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        let signed_url_ttl_secs = env::var("APP_SIGNED_URL_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber("APP_SIGNED_URL_TTL_SECS"))?;

        let bootstrap_admin = match env::var("APP_BOOTSTRAP_ADMIN") {
            Ok(raw) => Some(
                Uuid::parse_str(raw.trim())
                    .map_err(|_| ConfigError::InvalidUuid("APP_BOOTSTRAP_ADMIN"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            mode,
            photo_bucket: env::var("APP_PHOTO_BUCKET")
                .unwrap_or_else(|_| "property-photos".to_string()),
            document_bucket: env::var("APP_DOCUMENT_BUCKET")
                .unwrap_or_else(|_| "property-documents".to_string()),
            signed_url_ttl_secs,
            bootstrap_admin,
        })
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Memory,
            photo_bucket: "property-photos".to_string(),
            document_bucket: "property-documents".to_string(),
            signed_url_ttl_secs: 3600,
            bootstrap_admin: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidBackend(String),
    MissingVar(&'static str),
    InvalidNumber(&'static str),
    InvalidUuid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json' (found '{value}')")
            }
            ConfigError::InvalidBackend(value) => {
                write!(f, "APP_BACKEND must be 'memory' or 'rest' (found '{value}')")
            }
            ConfigError::MissingVar(name) => write!(f, "{name} is required for the rest backend"),
            ConfigError::InvalidNumber(name) => write!(f, "{name} must be a positive integer"),
            ConfigError::InvalidUuid(name) => write!(f, "{name} must be a UUID"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
