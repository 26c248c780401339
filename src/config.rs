//! Runtime configuration from environment variables.
//!
//! `main` loads `.env` with dotenv first, so the same names work from a file.

use crate::error::CidrError;
use crate::processing::MapOptions;

pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";
pub const DEFAULT_ADJACENT_LIMIT: usize = 16;

const ENV_LOG_CONFIG: &str = "CIDR_LOG_CONFIG";
const ENV_CACHE_FILE: &str = "CIDR_CACHE_FILE";
const ENV_MAX_DEPTH: &str = "CIDR_MAX_DEPTH";
const ENV_ADJACENT_LIMIT: &str = "CIDR_ADJACENT_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// log4rs configuration file.
    pub log_config: String,
    /// Snapshot file used when `--input` is not given.
    pub cache_file: Option<String>,
    /// Allocation tree depth limit, `None` for host granularity.
    pub max_depth: Option<u8>,
    /// How many adjacent subnets to try when looking for a free neighbour.
    pub adjacent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_config: DEFAULT_LOG_CONFIG.to_string(),
            cache_file: None,
            max_depth: None,
            adjacent_limit: DEFAULT_ADJACENT_LIMIT,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Config, CidrError> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, CidrError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(ENV_LOG_CONFIG) {
            config.log_config = path;
        }
        config.cache_file = lookup(ENV_CACHE_FILE).filter(|f| !f.trim().is_empty());

        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            let depth = value
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|d| *d <= 128)
                .ok_or(CidrError::Config {
                    name: ENV_MAX_DEPTH,
                    value: value.clone(),
                })?;
            config.max_depth = Some(depth);
        }

        if let Some(value) = lookup(ENV_ADJACENT_LIMIT) {
            config.adjacent_limit = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(CidrError::Config {
                    name: ENV_ADJACENT_LIMIT,
                    value: value.clone(),
                })?;
        }

        log::debug!("Config: {config:?}");
        Ok(config)
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            max_depth: self.max_depth,
        }
    }
}
