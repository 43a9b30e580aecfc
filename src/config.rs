/*
 * Responsibility
 * - 環境変数や設定の読み込み (Keycloak, license registry, cache, vault, path policy)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_UNPROTECTED_PATHS: &str = "/favicon.ico,/docs,/credential/openapi.json,/health";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Valkey,
    Memory,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct KeycloakConfig {
    pub host: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone)]
pub struct VaultConfig {
    pub base_url: String,
    pub token: String,
    pub mount: String,
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub auth_audience: String,
    pub keycloak: KeycloakConfig,
    pub license_registry_url: String,

    pub cache_backend: CacheBackend,
    /// `redis://` URL; only present for the valkey backend.
    pub redis_url: Option<String>,
    pub cache_key_prefix: String,

    pub vault: VaultConfig,

    pub unprotected_paths: Vec<String>,
    pub unlicensed_paths: Vec<String>,

    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
    /// How often one token may force a fresh introspection with `Cache-Control: no-cache`.
    pub forced_refresh_interval: Duration,
}

// Secrets stay out of Debug output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("auth_audience", &self.auth_audience)
            .field("keycloak_host", &self.keycloak.host)
            .field("keycloak_realm", &self.keycloak.realm)
            .field("license_registry_url", &self.license_registry_url)
            .field("cache_backend", &self.cache_backend)
            .field("vault_base_url", &self.vault.base_url)
            .field("vault_mount", &self.vault.mount)
            .field("unprotected_paths", &self.unprotected_paths)
            .field("unlicensed_paths", &self.unlicensed_paths)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let auth_audience = required("AUTH_AUDIENCE")?;

        let keycloak = KeycloakConfig {
            host: required("KEYCLOAK_HOST")?,
            realm: required("KEYCLOAK_REALM")?,
            client_id: required("KEYCLOAK_CLIENT_ID")?,
            client_secret: required("KEYCLOAK_CLIENT_SECRET")?,
        };

        let license_registry_url = required("LICENSE_REGISTRY_URL")?;

        let cache_backend = match lookup("CACHE_BACKEND")
            .unwrap_or_else(|| "valkey".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "valkey" | "redis" => CacheBackend::Valkey,
            "memory" => CacheBackend::Memory,
            _ => return Err(ConfigError::Invalid("CACHE_BACKEND")),
        };

        let redis_url = match cache_backend {
            CacheBackend::Valkey => Some(redis_url(
                &required("REDIS_HOST")?,
                parse_or(&lookup, "REDIS_PORT", 6379u16)?,
                parse_or(&lookup, "REDIS_DB", 0u32)?,
                lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()).as_deref(),
            )?),
            CacheBackend::Memory => None,
        };

        let cache_key_prefix = lookup("CACHE_KEY_PREFIX").unwrap_or_default();

        let vault_host = required("VAULT_HOST")?;
        let vault_port: u16 = parse_or(&lookup, "VAULT_PORT", 8200)?;
        let vault = VaultConfig {
            base_url: vault_base_url(&vault_host, vault_port)?,
            token: required("VAULT_TOKEN")?,
            mount: required("VAULT_SECRET_PATH")?
                .trim_matches('/')
                .to_string(),
        };

        let unprotected_paths = split_list(
            &lookup("UNPROTECTED_PATHS").unwrap_or_else(|| DEFAULT_UNPROTECTED_PATHS.to_string()),
        );
        let unlicensed_paths = split_list(&lookup("UNLICENSED_PATHS").unwrap_or_default());

        let upstream_timeout =
            Duration::from_secs(parse_or(&lookup, "UPSTREAM_TIMEOUT_SECONDS", 5u64)?);
        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30u64)?);
        let request_body_limit_bytes = parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 65536usize)?;
        let forced_refresh_interval =
            Duration::from_secs(parse_or(&lookup, "FORCED_REFRESH_INTERVAL_SECONDS", 10u64)?);

        Ok(Self {
            addr,
            app_env,
            auth_audience,
            keycloak,
            license_registry_url,
            cache_backend,
            redis_url,
            cache_key_prefix,
            vault,
            unprotected_paths,
            unlicensed_paths,
            upstream_timeout,
            request_timeout,
            request_body_limit_bytes,
            forced_refresh_interval,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn redis_url(host: &str, port: u16, db: u32, password: Option<&str>) -> Result<String, ConfigError> {
    let mut url = url::Url::parse(&format!("redis://{host}:{port}/{db}"))
        .map_err(|_| ConfigError::Invalid("REDIS_HOST"))?;
    if let Some(password) = password {
        url.set_password(Some(password))
            .map_err(|_| ConfigError::Invalid("REDIS_PASSWORD"))?;
    }
    Ok(url.to_string())
}

// VAULT_HOST may come with or without a scheme.
fn vault_base_url(host: &str, port: u16) -> Result<String, ConfigError> {
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    let mut url = url::Url::parse(&with_scheme).map_err(|_| ConfigError::Invalid("VAULT_HOST"))?;
    url.set_port(Some(port))
        .map_err(|_| ConfigError::Invalid("VAULT_PORT"))?;
    Ok(url.to_string())
}
