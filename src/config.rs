use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub tmdb: TmdbConfig,

    pub scheduler: SchedulerConfig,

    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/reeltrack.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Accepted `Host` header values. `*` accepts any host.
    pub allowed_hosts: Vec<String>,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    pub secure_cookies: bool,

    /// Application secret. Required unless `debug` is on.
    pub secret_key: String,

    pub debug: bool,

    /// Session expiry after this many minutes of inactivity.
    pub session_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
            secure_cookies: true,
            secret_key: String::new(),
            debug: false,
            session_minutes: 60 * 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: String,

    pub base_url: String,

    /// Language passed to every TMDb request (e.g. "en-US").
    pub language: String,

    pub timeout_seconds: u64,

    /// Extra attempts after the first failed one. Capped at 5.
    pub max_retries: u32,

    /// Initial backoff between attempts; doubles each retry.
    pub retry_delay_ms: u64,

    /// Concurrent credit lookups used to add directors and cast to search
    /// hits. 0 turns enrichment off.
    pub enrich_concurrency: usize,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.themoviedb.org/3".to_string(),
            language: "en-US".to_string(),
            timeout_seconds: 10,
            max_retries: 2,
            retry_delay_ms: 250,
            enrich_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Metadata refresh interval in hours (default: 24)
    pub metadata_refresh_hours: u32,

    /// Concurrent provider fetches during a batch refresh.
    pub refresh_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            metadata_refresh_hours: 24,
            refresh_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Emit log lines as JSON objects instead of the human format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            tmdb: TmdbConfig::default(),
            scheduler: SchedulerConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies `.env` and process
    /// environment overrides.
    pub fn load() -> Result<Self> {
        // A missing .env file is the common case.
        let _ = dotenvy::dotenv();

        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over file values. `lookup` is injected so
    /// tests don't have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("REELTRACK_SECRET_KEY") {
            self.server.secret_key = secret;
        }

        if let Some(debug) = lookup("REELTRACK_DEBUG") {
            self.server.debug = matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
            if self.server.debug {
                self.general.log_level = "debug".to_string();
            }
        }

        if let Some(hosts) = lookup("REELTRACK_ALLOWED_HOSTS") {
            self.server.allowed_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(port) = lookup("REELTRACK_PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.general.database_path = url;
        }

        if let Some(key) = lookup("TMDB_API_KEY") {
            self.tmdb.api_key = key;
        }

        if let Some(base_url) = lookup("TMDB_BASE_URL") {
            self.tmdb.base_url = base_url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("reeltrack").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".reeltrack").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if !self.server.debug && self.server.secret_key.trim().is_empty() {
            anyhow::bail!(
                "server.secret_key (or REELTRACK_SECRET_KEY) must be set when debug is off"
            );
        }

        url::Url::parse(&self.tmdb.base_url)
            .with_context(|| format!("Invalid TMDb base URL: {}", self.tmdb.base_url))?;

        if self.tmdb.timeout_seconds == 0 {
            anyhow::bail!("TMDb timeout must be > 0 seconds");
        }

        if self.tmdb.max_retries > 5 {
            anyhow::bail!("TMDb max_retries cannot exceed 5");
        }

        if self.scheduler.enabled && self.scheduler.metadata_refresh_hours == 0 {
            anyhow::bail!("Metadata refresh interval must be > 0 hours");
        }

        Ok(())
    }

    /// `true` when `host` (with or without port) is accepted.
    #[must_use]
    pub fn is_host_allowed(&self, host: &str) -> bool {
        let bare = host.rsplit_once(':').map_or(host, |(name, port)| {
            if port.chars().all(|c| c.is_ascii_digit()) {
                name
            } else {
                host
            }
        });

        self.server
            .allowed_hosts
            .iter()
            .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(bare))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.tmdb.timeout_seconds, 10);
        assert_eq!(config.tmdb.max_retries, 2);
        assert_eq!(config.tmdb.enrich_concurrency, 4);
        assert!(!config.scheduler.enabled);
        assert!(!config.server.debug);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[tmdb]"));
        assert!(toml_str.contains("[scheduler]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [tmdb]
            max_retries = 4
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.tmdb.max_retries, 4);
        assert_eq!(config.tmdb.timeout_seconds, 10);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("REELTRACK_SECRET_KEY", "s3cret"),
            ("REELTRACK_DEBUG", "true"),
            ("REELTRACK_ALLOWED_HOSTS", "example.com, api.example.com ,"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("TMDB_API_KEY", "abc"),
            ("TMDB_BASE_URL", "http://127.0.0.1:9999/3"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.server.secret_key, "s3cret");
        assert!(config.server.debug);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(
            config.server.allowed_hosts,
            vec!["example.com".to_string(), "api.example.com".to_string()]
        );
        assert_eq!(config.general.database_path, "sqlite::memory:");
        assert_eq!(config.tmdb.api_key, "abc");
        assert_eq!(config.tmdb.base_url, "http://127.0.0.1:9999/3");
    }

    #[test]
    fn test_validate_requires_secret_outside_debug() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.server.debug = true;
        assert!(config.validate().is_ok());

        config.server.debug = false;
        config.server.secret_key = "key".to_string();
        assert!(config.validate().is_ok());

        config.tmdb.max_retries = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_host_allow_list() {
        let mut config = Config::default();
        assert!(config.is_host_allowed("localhost"));
        assert!(config.is_host_allowed("localhost:8000"));
        assert!(!config.is_host_allowed("evil.example"));

        config.server.allowed_hosts = vec!["*".to_string()];
        assert!(config.is_host_allowed("evil.example"));
    }
}
