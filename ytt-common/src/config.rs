//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error; the compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const ENV_CONFIG_FILE: &str = "YTT_CONFIG";
pub const ENV_ROOT_FOLDER: &str = "YTT_ROOT_FOLDER";
pub const ENV_SOURCE_CSV: &str = "YTT_SOURCE_CSV";
pub const ENV_STORE_PATH: &str = "YTT_STORE_PATH";
pub const ENV_REGION: &str = "YTT_REGION";
pub const ENV_THREADS: &str = "YTT_THREADS";
pub const ENV_SHARE_POPULATION: &str = "YTT_SHARE_POPULATION";

/// Region the stickiness, channel and tag tables are scoped to
pub const DEFAULT_REGION: &str = "United States";
/// Source export location relative to the root folder
pub const DEFAULT_SOURCE_CSV: &str = "raw/youtube_trending_global/youtube_trending_videos_global.csv";
/// Analytical store location relative to the root folder
pub const DEFAULT_STORE_PATH: &str = "processed/trending.sqlite";
pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_HTTP_PORT: u16 = 5730;

/// Denominator used for `video_share` in the monthly tag aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePopulation {
    /// Videos with at least one surviving tag in the month
    #[default]
    Tagged,
    /// Every regional video observed in the month
    All,
}

impl SharePopulation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePopulation::Tagged => "tagged",
            SharePopulation::All => "all",
        }
    }
}

impl FromStr for SharePopulation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tagged" => Ok(SharePopulation::Tagged),
            "all" => Ok(SharePopulation::All),
            other => Err(Error::Config(format!(
                "share_population must be 'tagged' or 'all', got '{}'",
                other
            ))),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding `raw/` and `processed/`
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Source CSV export (relative paths resolve against the root folder)
    #[serde(default)]
    pub source_csv: Option<PathBuf>,

    /// Analytical store file (relative paths resolve against the root folder)
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default)]
    pub region: Option<String>,

    /// Worker threads for the scan/aggregate stages
    #[serde(default)]
    pub threads: Option<usize>,

    #[serde(default)]
    pub share_population: Option<SharePopulation>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP adapter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_HTTP_PORT
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub root_folder: Option<PathBuf>,
    pub source_csv: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
    pub region: Option<String>,
    pub threads: Option<usize>,
    pub share_population: Option<SharePopulation>,
    pub http_port: Option<u16>,
}

/// Fully resolved settings for one process
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub source_csv: PathBuf,
    pub store_path: PathBuf,
    pub region: String,
    pub threads: usize,
    pub share_population: SharePopulation,
    pub log_level: String,
    pub http_bind: String,
    pub http_port: u16,
}

impl Settings {
    /// Resolve settings from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let config_file = overrides
            .config_file
            .clone()
            .or_else(|| env_value(ENV_CONFIG_FILE).map(PathBuf::from));
        let toml_config = load_toml_config(config_file.as_deref())?;
        Self::resolve_with(overrides, &toml_config)
    }

    /// Resolve settings against an already-loaded TOML config
    pub fn resolve_with(overrides: &ConfigOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let root_folder = overrides
            .root_folder
            .clone()
            .or_else(|| env_value(ENV_ROOT_FOLDER).map(PathBuf::from))
            .or_else(|| toml_config.root_folder.clone())
            .unwrap_or_else(get_default_root_folder);

        let source_csv = resolve_path(
            overrides.source_csv.as_ref(),
            ENV_SOURCE_CSV,
            toml_config.source_csv.as_ref(),
            DEFAULT_SOURCE_CSV,
            &root_folder,
        );

        let store_path = resolve_path(
            overrides.store_path.as_ref(),
            ENV_STORE_PATH,
            toml_config.store_path.as_ref(),
            DEFAULT_STORE_PATH,
            &root_folder,
        );

        let region = overrides
            .region
            .clone()
            .or_else(|| env_value(ENV_REGION))
            .or_else(|| toml_config.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let threads = match overrides.threads {
            Some(threads) => threads,
            None => match env_value(ENV_THREADS) {
                Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                    Error::Config(format!("{} must be a positive integer: {}", ENV_THREADS, e))
                })?,
                None => toml_config.threads.unwrap_or(DEFAULT_THREADS),
            },
        };
        if threads == 0 {
            return Err(Error::Config("threads must be at least 1".to_string()));
        }

        let share_population = match overrides.share_population {
            Some(population) => population,
            None => match env_value(ENV_SHARE_POPULATION) {
                Some(raw) => raw.parse()?,
                None => toml_config.share_population.unwrap_or_default(),
            },
        };

        Ok(Settings {
            root_folder,
            source_csv,
            store_path,
            region,
            threads,
            share_population,
            log_level: toml_config.logging.level.clone(),
            http_bind: toml_config.http.bind.clone(),
            http_port: overrides.http_port.unwrap_or(toml_config.http.port),
        })
    }
}

fn resolve_path(
    cli: Option<&PathBuf>,
    env_var_name: &str,
    from_toml: Option<&PathBuf>,
    default_relative: &str,
    root_folder: &Path,
) -> PathBuf {
    if let Some(path) = cli {
        return path.clone();
    }
    if let Some(path) = env_value(env_var_name) {
        return PathBuf::from(path);
    }
    let relative = from_toml
        .cloned()
        .unwrap_or_else(|| PathBuf::from(default_relative));
    if relative.is_absolute() {
        relative
    } else {
        root_folder.join(relative)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load the TOML config
///
/// An explicitly named file must exist and parse. Without one, the platform
/// config locations are tried and their absence falls back to defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_file() {
            Some(path) => path,
            None => {
                debug!("No config file found, using compiled defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;
    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// First existing platform config file
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ytt").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/ytt/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("ytt"),
        None => {
            warn!("Could not determine local data directory, using ./ytt_data");
            PathBuf::from("./ytt_data")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_population_parse() {
        assert_eq!("tagged".parse::<SharePopulation>().unwrap(), SharePopulation::Tagged);
        assert_eq!(" ALL ".parse::<SharePopulation>().unwrap(), SharePopulation::All);
        assert!("videos".parse::<SharePopulation>().is_err());
    }

    #[test]
    fn test_toml_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.root_folder.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.http.port, DEFAULT_HTTP_PORT);
        assert_eq!(config.http.bind, "127.0.0.1");
    }

    #[test]
    fn test_toml_full() {
        let config: TomlConfig = toml::from_str(
            r#"
            root_folder = "/srv/ytt"
            store_path = "db/trending.sqlite"
            region = "Canada"
            threads = 8
            share_population = "all"

            [logging]
            level = "debug"

            [http]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/ytt")));
        assert_eq!(config.region.as_deref(), Some("Canada"));
        assert_eq!(config.threads, Some(8));
        assert_eq!(config.share_population, Some(SharePopulation::All));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let result = load_toml_config(Some(Path::new("/nonexistent/ytt/config.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_root_folder_not_empty() {
        assert!(!get_default_root_folder().as_os_str().is_empty());
    }
}
