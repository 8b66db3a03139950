//! Layered settings. Precedence: CLI > environment > config files > defaults.

use crate::users::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::users::stats::DEFAULT_TOP_CITIES;
use crate::query::MAX_LIMIT;
use crate::users::{PageLimits, ServiceSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "USERBASE_";
pub const CONFIG_FILE_NAME: &str = "userbase.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind: String,
    /// Operation log file; `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub top_cities: usize,
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".into(),
            data_path: Some(PathBuf::from("userbase.wal")),
            log_dir: None,
            log_level: "info".into(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            top_cities: DEFAULT_TOP_CITIES,
            body_limit_bytes: 10 * 1024,
        }
    }
}

/// One config file; any subset of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub data_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub default_page_size: Option<usize>,
    pub max_page_size: Option<usize>,
    pub top_cities: Option<usize>,
    pub body_limit_bytes: Option<usize>,
}

impl FileConfig {
    // Fields already set win; earlier files take priority over later ones.
    fn fill_from(&mut self, other: Self) {
        macro_rules! fill {
            ($($f:ident),*) => { $( if self.$f.is_none() { self.$f = other.$f; } )* };
        }
        fill!(bind, data_path, log_dir, log_level, default_page_size, max_page_size, top_cities, body_limit_bytes);
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub bind: Option<String>,
    pub data_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub in_memory: bool,
}

/// Candidate files in priority order: `--config`, `$USERBASE_CONFIG`, `./userbase.toml`.
fn config_paths(cli: Option<&Path>, env: &dyn Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = cli {
        paths.push(p.to_path_buf());
    }
    if let Some(p) = env("CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join(CONFIG_FILE_NAME));
    }
    paths
}

fn parse_env<T: std::str::FromStr>(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {ENV_PREFIX}{key}={raw}: not a valid value");
            None
        }
    }
}

impl AppConfig {
    /// Loads from the process environment and the usual config file locations.
    ///
    /// # Errors
    /// A config file that exists but cannot be read or parsed.
    pub fn load(cli: &CliOverrides) -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_with(cli, &|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Same as [`AppConfig::load`] with `env` looking up keys without the `USERBASE_` prefix.
    ///
    /// # Errors
    /// A config file that exists but cannot be read or parsed.
    pub fn load_with(
        cli: &CliOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = FileConfig::default();
        for p in config_paths(cli.config.as_deref(), env) {
            if !p.exists() {
                continue;
            }
            let text = std::fs::read_to_string(&p)?;
            let parsed: FileConfig =
                toml::from_str(&text).map_err(|e| format!("{}: {e}", p.display()))?;
            file.fill_from(parsed);
        }

        let d = Self::default();
        let mut cfg = Self {
            bind: env("BIND").or(file.bind).unwrap_or(d.bind),
            data_path: env("DATA").map(PathBuf::from).or(file.data_path).or(d.data_path),
            log_dir: env("LOG_DIR").map(PathBuf::from).or(file.log_dir),
            log_level: env("LOG_LEVEL").or(file.log_level).unwrap_or(d.log_level),
            default_page_size: parse_env(env, "DEFAULT_PAGE_SIZE")
                .or(file.default_page_size)
                .unwrap_or(d.default_page_size),
            max_page_size: parse_env(env, "MAX_PAGE_SIZE").or(file.max_page_size).unwrap_or(d.max_page_size),
            top_cities: parse_env(env, "TOP_CITIES").or(file.top_cities).unwrap_or(d.top_cities),
            body_limit_bytes: parse_env(env, "BODY_LIMIT_BYTES")
                .or(file.body_limit_bytes)
                .unwrap_or(d.body_limit_bytes),
        };

        if let Some(bind) = &cli.bind {
            cfg.bind.clone_from(bind);
        }
        if let Some(level) = &cli.log_level {
            cfg.log_level.clone_from(level);
        }
        if cli.in_memory {
            cfg.data_path = None;
        } else if let Some(p) = &cli.data_path {
            cfg.data_path = Some(p.clone());
        }
        Ok(cfg)
    }

    /// Page sizes are kept within what a single query can return.
    #[must_use]
    pub fn service_settings(&self) -> ServiceSettings {
        if self.max_page_size > MAX_LIMIT {
            log::warn!("max_page_size {} exceeds the query cap, using {MAX_LIMIT}", self.max_page_size);
        }
        ServiceSettings {
            limits: PageLimits {
                default_limit: self.default_page_size.clamp(1, MAX_LIMIT),
                max_limit: self.max_page_size.clamp(1, MAX_LIMIT),
            },
            top_cities: self.top_cities,
        }
    }
}
