// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use config::{Config as ConfigFile, File, Environment};

/// Base URL baked in at build time, mirroring how the web bundles read
/// their API URL from the build environment.
pub const DEFAULT_API_URL: &str = match option_env!("PORTFOLIO_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};

pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Central configuration for the client
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub wallet: WalletConfig,
    pub log_level: LogLevel,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Path prefix shared by every endpoint (`/api/v1` for the mobile
    /// backend, `/api` for the older web one)
    pub prefix: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where durable session data lives. `None` picks the platform data dir.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Ethereum JSON-RPC endpoint. Without one, no wallet is detected.
    pub rpc_url: Option<String>,
    pub currency_symbol: String,
    pub poll_interval_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            prefix: DEFAULT_API_PREFIX.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            currency_symbol: "ETH".to_string(),
            poll_interval_secs: 4,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl StorageConfig {
    /// Resolve the storage file, falling back to `<data dir>/portfolio-tracker/session.json`
    pub fn resolve_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("portfolio-tracker")
                .join("session.json")
        })
    }
}

impl Config {
    /// Directory holding `default.toml` and friends. `CONFIG_DIR` wins, then a
    /// `config/` next to the working directory, then the user config dir.
    pub fn config_dir() -> PathBuf {
        if let Ok(dir) = env::var("CONFIG_DIR") {
            return PathBuf::from(dir);
        }

        let local = PathBuf::from("config");
        if local.is_dir() {
            return local;
        }

        dirs::config_dir()
            .map(|dir| dir.join("portfolio-tracker"))
            .unwrap_or(local)
    }

    /// Layer `default.toml`, the `PORTFOLIO_PROFILE` file if one is named,
    /// `local.toml`, then `PORTFOLIO__*` variables. A named profile file must exist.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(&Self::config_dir(), env::var("PORTFOLIO_PROFILE").ok().as_deref())
    }

    pub fn load_from(dir: &Path, profile: Option<&str>) -> Result<Self, config::ConfigError> {
        tracing::debug!("Loading client configuration from {}", dir.display());

        let mut builder = ConfigFile::builder()
            .add_source(File::from(dir.join("default.toml")).required(false));

        if let Some(profile) = profile {
            tracing::debug!("Using profile {}", profile);
            builder = builder.add_source(File::from(dir.join(format!("{}.toml", profile))).required(true));
        }

        builder
            .add_source(File::from(dir.join("local.toml")).required(false))
            // PORTFOLIO__API__BASE_URL, PORTFOLIO__WALLET__RPC_URL, ...
            .add_source(Environment::with_prefix("PORTFOLIO").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load from files first, then fall back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::debug!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_plain_env()
            }
        }
    }

    fn from_plain_env() -> Self {
        let defaults = Self::default();

        let base_url = env::var("API_URL").unwrap_or(defaults.api.base_url);
        let prefix = env::var("API_PREFIX").unwrap_or(defaults.api.prefix);
        let timeout_secs = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.api.timeout_secs);

        let storage_path = env::var("STORAGE_PATH").ok().map(PathBuf::from);

        let rpc_url = env::var("WALLET_RPC_URL").ok();
        let currency_symbol = env::var("WALLET_CURRENCY_SYMBOL")
            .unwrap_or(defaults.wallet.currency_symbol);
        let poll_interval_secs = env::var("WALLET_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.wallet.poll_interval_secs);

        let log_level = env::var("LOG_LEVEL").map(LogLevel).unwrap_or(defaults.log_level);

        Self {
            api: ApiConfig {
                base_url,
                prefix,
                timeout_secs,
            },
            storage: StorageConfig { path: storage_path },
            wallet: WalletConfig {
                rpc_url,
                currency_symbol,
                poll_interval_secs,
            },
            log_level,
        }
    }
}
