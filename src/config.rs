use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Upstream catalog settings: which host to search and the default
/// language/organization/stage used when the caller does not override them.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_stage")]
    pub stage: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            language: default_language(),
            organization: default_organization(),
            stage: default_stage(),
        }
    }
}

fn default_host() -> String {
    "https://git.door43.org".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_organization() -> String {
    "unfoldingWord".to_string()
}
fn default_stage() -> String {
    "prod".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Path of the persistent SQLite cache database.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Whether to put an in-process memory tier in front of SQLite.
    #[serde(default = "default_memory")]
    pub memory: bool,
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_secs: u64,
    #[serde(default = "default_archive_ttl")]
    pub archive_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            memory: default_memory(),
            catalog_ttl_secs: default_catalog_ttl(),
            archive_ttl_secs: default_archive_ttl(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/scr-cache.sqlite")
}
fn default_memory() -> bool {
    true
}
fn default_catalog_ttl() -> u64 {
    crate::cache::CATALOG_TTL_SECS
}
fn default_archive_ttl() -> u64 {
    crate::cache::ARCHIVE_TTL_SECS
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("scripture-harness/", env!("CARGO_PKG_VERSION")).to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config file if it exists; otherwise fall back to defaults.
/// Missing config is normal for CLI use against the public catalog.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    match config.catalog.stage.as_str() {
        "prod" | "preprod" | "latest" => {}
        other => anyhow::bail!(
            "Unknown catalog stage: '{}'. Must be prod, preprod, or latest.",
            other
        ),
    }
    if config.http.timeout_secs == 0 {
        anyhow::bail!("http.timeout_secs must be > 0");
    }
    if config.catalog.host.trim_end_matches('/').is_empty() {
        anyhow::bail!("catalog.host must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_door43() {
        let config = Config::default();
        assert_eq!(config.catalog.host, "https://git.door43.org");
        assert_eq!(config.catalog.stage, "prod");
        assert!(config.cache.memory);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [catalog]
            language = "es-419"
            organization = "Es-419_gl"
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog.language, "es-419");
        assert_eq!(config.catalog.host, "https://git.door43.org");
        assert_eq!(config.cache.catalog_ttl_secs, 3600);
    }

    #[test]
    fn bad_stage_is_rejected() {
        let config: Config = toml::from_str("[catalog]\nstage = \"nightly\"\n").unwrap();
        assert!(validate(&config).is_err());
    }
}
