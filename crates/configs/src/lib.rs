use std::collections::BTreeMap;
use std::path::Path;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Collections served by the HTTP layer; policy overrides must name one of these.
pub const COLLECTIONS: [&str; 4] = ["categories", "products", "subscribers", "subscriptions"];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-collection overrides of the default access policy.
    #[serde(default)]
    pub policy: BTreeMap<String, CollectionPolicy>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), log_format: LogFormat::Compact }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server starts.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: default_auto_migrate(),
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_auto_migrate() -> bool { true }

/// Bearer token verification settings.
///
/// Exactly one of `jwt_secret` (HS256) or `realm_public_key` (RS256) must be set.
/// The realm key may be a full PEM document or the bare base64 body an identity
/// provider shows in its realm settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub realm_public_key: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_user_role")]
    pub user_role: String,
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            realm_public_key: None,
            issuer: None,
            audience: None,
            user_role: default_user_role(),
            admin_role: default_admin_role(),
        }
    }
}

fn default_user_role() -> String { "app-user".into() }
fn default_admin_role() -> String { "app-admin".into() }

/// Minimum caller level required by an operation.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CollectionPolicy {
    pub list: Option<AccessLevel>,
    pub get: Option<AccessLevel>,
    pub create: Option<AccessLevel>,
    pub update: Option<AccessLevel>,
    pub delete: Option<AccessLevel>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    AppConfig::from_toml_str(&content)
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(content)?;
        Ok(cfg)
    }

    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.validate_policy()
    }

    fn validate_policy(&self) -> Result<()> {
        for name in self.policy.keys() {
            if !COLLECTIONS.contains(&name.as_str()) {
                return Err(anyhow!("policy.{name}: unknown collection (expected one of {})", COLLECTIONS.join(", ")));
            }
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // the file wins; DATABASE_URL only fills a missing url
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.is_none() && self.realm_public_key.is_none() {
            self.jwt_secret = std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.jwt_secret, &self.realm_public_key) {
            (Some(_), Some(_)) => Err(anyhow!("auth: set only one of jwt_secret or realm_public_key")),
            (None, None) => Err(anyhow!("auth: jwt_secret or realm_public_key is required (or JWT_SECRET)")),
            (Some(secret), None) if secret.trim().is_empty() => Err(anyhow!("auth.jwt_secret must not be empty")),
            (None, Some(key)) if key.trim().is_empty() => Err(anyhow!("auth.realm_public_key must not be empty")),
            _ if self.user_role.trim().is_empty() || self.admin_role.trim().is_empty() => {
                Err(anyhow!("auth.user_role and auth.admin_role must not be empty"))
            }
            _ => Ok(()),
        }
    }
}
