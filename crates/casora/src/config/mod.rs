use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::domain::TenantId;

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
    pub tenancy: TenancyConfig,
    pub portal: PortalConfig,
    pub auth: AuthConfig,
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

        let root_domain = env::var("APP_ROOT_DOMAIN")
            .unwrap_or_else(|_| "casora.pe".to_string())
            .trim()
            .to_ascii_lowercase();
        if root_domain.is_empty() || root_domain.starts_with('.') {
            return Err(ConfigError::InvalidRootDomain(root_domain));
        }
        let admin_label = env::var("APP_ADMIN_LABEL")
            .unwrap_or_else(|_| "app".to_string())
            .trim()
            .to_ascii_lowercase();
        let extra_platform_hosts: Vec<String> = env::var("APP_EXTRA_PLATFORM_HOSTS")
            .map(|raw| split_list(&raw).map(str::to_ascii_lowercase).collect())
            .unwrap_or_default();
        let custom_domains: Vec<(String, TenantId)> = match env::var("APP_CUSTOM_DOMAINS") {
            Ok(raw) => parse_pairs("APP_CUSTOM_DOMAINS", &raw)?
                .into_iter()
                .map(|(host, tenant)| (host.to_ascii_lowercase(), TenantId::new(tenant)))
                .collect(),
            Err(_) => Vec::new(),
        };

        let default_page_size = parse_usize("APP_PORTAL_PAGE_SIZE", 24)?;
        let max_page_size = parse_usize("APP_PORTAL_MAX_PAGE_SIZE", 100)?;
        if default_page_size == 0 || default_page_size > max_page_size {
            return Err(ConfigError::InvalidPageSize);
        }

        let sessions = match env::var("APP_SESSION_TOKENS") {
            Ok(raw) => parse_pairs("APP_SESSION_TOKENS", &raw)?
                .into_iter()
                .map(|(token, grant)| SessionGrant::parse(token, grant))
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            tenancy: TenancyConfig {
                root_domain,
                admin_label,
                extra_platform_hosts,
                custom_domains,
            },
            portal: PortalConfig {
                default_page_size,
                max_page_size,
            },
            auth: AuthConfig { sessions },
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_pairs<'a>(
    variable: &'static str,
    raw: &'a str,
) -> Result<Vec<(&'a str, &'a str)>, ConfigError> {
    split_list(raw)
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, value)| !key.is_empty() && !value.is_empty())
                .ok_or_else(|| ConfigError::InvalidPair {
                    variable,
                    entry: pair.to_string(),
                })
        })
        .collect()
}

fn parse_usize(variable: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Hostname layout of the platform. Built once at start and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenancyConfig {
    pub root_domain: String,
    pub admin_label: String,
    pub extra_platform_hosts: Vec<String>,
    pub custom_domains: Vec<(String, TenantId)>,
}

impl TenancyConfig {
    pub fn new(root_domain: impl Into<String>) -> Self {
        Self {
            root_domain: root_domain.into(),
            admin_label: "app".to_string(),
            extra_platform_hosts: Vec::new(),
            custom_domains: Vec::new(),
        }
    }
}

/// Page sizing for the cross-tenant portal listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            default_page_size: 24,
            max_page_size: 100,
        }
    }
}

/// Static bearer tokens accepted by the back office.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub sessions: Vec<SessionGrant>,
}

/// `token=user@tenant`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub token: String,
    pub user_id: String,
    pub tenant_id: TenantId,
}

impl SessionGrant {
    fn parse(token: &str, grant: &str) -> Result<Self, ConfigError> {
        let (user_id, tenant_id) = grant
            .split_once('@')
            .filter(|(user, tenant)| !user.is_empty() && !tenant.is_empty())
            .ok_or_else(|| ConfigError::InvalidPair {
                variable: "APP_SESSION_TOKENS",
                entry: format!("{token}={grant}"),
            })?;

        Ok(Self {
            token: token.to_string(),
            user_id: user_id.to_string(),
            tenant_id: TenantId::new(tenant_id),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRootDomain(String),
    InvalidNumber { variable: &'static str },
    InvalidPageSize,
    InvalidPair { variable: &'static str, entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRootDomain(value) => {
                write!(f, "APP_ROOT_DOMAIN '{value}' is not a usable domain")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::InvalidPageSize => write!(
                f,
                "APP_PORTAL_PAGE_SIZE must be between 1 and APP_PORTAL_MAX_PAGE_SIZE"
            ),
            ConfigError::InvalidPair { variable, entry } => {
                write!(f, "{variable} entry '{entry}' is malformed")
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_ROOT_DOMAIN",
            "APP_ADMIN_LABEL",
            "APP_EXTRA_PLATFORM_HOSTS",
            "APP_CUSTOM_DOMAINS",
            "APP_SESSION_TOKENS",
            "APP_PORTAL_PAGE_SIZE",
            "APP_PORTAL_MAX_PAGE_SIZE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.tenancy.root_domain, "casora.pe");
        assert_eq!(config.tenancy.admin_label, "app");
        assert_eq!(config.portal, PortalConfig::default());
        assert!(config.auth.sessions.is_empty());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn parses_custom_domains_and_sessions() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var(
            "APP_CUSTOM_DOMAINS",
            "Inmobiliaria-Demo.com=demo, acme.pe=acme",
        );
        env::set_var("APP_SESSION_TOKENS", "tok-1=agent-7@acme");
        let config = AppConfig::load().expect("config loads");

        assert_eq!(
            config.tenancy.custom_domains,
            vec![
                ("inmobiliaria-demo.com".to_string(), TenantId::new("demo")),
                ("acme.pe".to_string(), TenantId::new("acme")),
            ]
        );
        assert_eq!(
            config.auth.sessions,
            vec![SessionGrant {
                token: "tok-1".to_string(),
                user_id: "agent-7".to_string(),
                tenant_id: TenantId::new("acme"),
            }]
        );
        reset_env();
    }

    #[test]
    fn rejects_malformed_session_grant() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SESSION_TOKENS", "tok-1=agent-without-tenant");
        let err = AppConfig::load().expect_err("grant without tenant is rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidPair {
                variable: "APP_SESSION_TOKENS",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn rejects_page_size_above_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORTAL_PAGE_SIZE", "500");
        let err = AppConfig::load().expect_err("page size above max is rejected");
        assert!(matches!(err, ConfigError::InvalidPageSize));
        reset_env();
    }
}
