use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub resolver: ResolverConfig,
    pub dispatch: DispatchConfig,
    pub dashboard: DashboardConfig,
    pub completion: Option<CompletionConfig>,
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

        let resolver = ResolverConfig {
            default_radius_km: parse_var("APP_SEARCH_RADIUS_KM", 50.0)?,
            enrichment_timeout: Duration::from_millis(parse_var(
                "APP_ENRICHMENT_TIMEOUT_MS",
                8_000,
            )?),
            enrichment_limit: parse_var("APP_ENRICHMENT_LIMIT", 10)?,
            registry_path: optional_var("APP_OFFICE_REGISTRY").map(PathBuf::from),
        };

        let dispatch = DispatchConfig {
            send_timeout: Duration::from_millis(parse_var("APP_MAIL_TIMEOUT_MS", 10_000)?),
            sender: env::var("APP_MAIL_SENDER")
                .unwrap_or_else(|_| "noreply@civic-dispatch.local".to_string()),
            relay_url: optional_var("APP_MAIL_RELAY_URL"),
        };

        let dashboard = DashboardConfig {
            page_size: parse_var("APP_DASHBOARD_PAGE_SIZE", 10)?,
            report_list_limit: parse_var("APP_REPORT_LIST_LIMIT", 100)?,
            fetch_limit: parse_var("APP_DASHBOARD_FETCH_LIMIT", DEFAULT_DASHBOARD_FETCH_LIMIT)?,
        };

        let completion = match (
            optional_var("APP_COMPLETION_URL"),
            optional_var("APP_COMPLETION_API_KEY"),
        ) {
            (Some(endpoint), Some(api_key)) => Some(CompletionConfig {
                endpoint,
                api_key,
                model: env::var("APP_COMPLETION_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            resolver,
            dispatch,
            dashboard,
            completion,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Office resolution defaults.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub default_radius_km: f64,
    pub enrichment_timeout: Duration,
    /// Only the leading matches are enriched; the degraded full-registry
    /// response would otherwise fan out to every office.
    pub enrichment_limit: usize,
    pub registry_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 50.0,
            enrichment_timeout: Duration::from_secs(8),
            enrichment_limit: 10,
            registry_path: None,
        }
    }
}

/// Outbound notification settings.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub send_timeout: Duration,
    pub sender: String,
    pub relay_url: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(10),
            sender: "noreply@civic-dispatch.local".to_string(),
            relay_url: None,
        }
    }
}

const DEFAULT_DASHBOARD_FETCH_LIMIT: usize = 100_000;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub page_size: usize,
    pub report_list_limit: usize,
    /// Reports read per aggregation pass; independent of the listing limit.
    pub fetch_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            report_list_limit: 100,
            fetch_limit: DEFAULT_DASHBOARD_FETCH_LIMIT,
        }
    }
}

/// Chat-completion endpoint used to fill in missing office contacts.
#[derive(Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => write!(f, "{key} must be a valid number"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
