use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitoring: MonitoringConfig,
    pub storage: StorageConfig,
    pub tokens: TokensConfig,
    pub notifications: NotificationsConfig,
    pub crosschain: CrossChainConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Master switch for the scheduled report cycle
    pub enabled: bool,
    /// Seconds between report cycles (default: 4h)
    pub interval_secs: u64,
    /// Period tag used in report keys
    pub period: String,
    /// Timeout for each metric source call
    pub source_timeout_ms: u64,
    /// Timeout for each chat send
    pub notify_timeout_ms: u64,
    /// How far a stored snapshot may sit from "24h ago" and still be the baseline
    pub snapshot_tolerance_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 4 * 60 * 60,
            period: "4h".to_string(),
            source_timeout_ms: 10_000,
            notify_timeout_ms: 10_000,
            snapshot_tolerance_secs: 2 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Filesystem,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            root: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Identifier used in storage keys and metric source lookups
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    18
}

impl TokenConfig {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals: default_decimals(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    pub gold: TokenConfig,
    pub synthetic: TokenConfig,
    pub launchpad: TokenConfig,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            gold: TokenConfig::new("GOLD"),
            synthetic: TokenConfig::new("USDX"),
            launchpad: TokenConfig::new("LAUNCH"),
        }
    }
}

/// Destinations serving one logical channel. Missing ids are skipped at
/// send time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelDestinations {
    pub telegram_chat_id: Option<String>,
    pub discord_channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelBindingsConfig {
    pub operations: ChannelDestinations,
    pub alerts: ChannelDestinations,
    pub escalation: ChannelDestinations,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub telegram_bot_token: Option<String>,
    pub discord_bot_token: Option<String>,
    /// Override for a self-hosted Bot API server
    pub telegram_api_base: Option<String>,
    pub discord_api_base: Option<String>,
    pub channels: ChannelBindingsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrossChainConfig {
    /// Accepted endpoint ids; empty accepts any non-zero id
    pub known_endpoints: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind: String,
    /// Minimum seconds between on-demand report generations
    pub generate_cooldown_secs: u64,
    pub admin_token: Option<String>,
    pub admin_auth_required: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8080".to_string(),
            generate_cooldown_secs: 300,
            admin_token: None,
            admin_auth_required: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json: bool,
    /// Also write daily-rotated log files here
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
            file_prefix: "ecosentry.log".to_string(),
        }
    }
}

/// Characters allowed in values that end up inside object keys.
fn is_key_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ECOSENTRY_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ECOSENTRY_MONITORING__ENABLED, etc.)
            .add_source(
                Environment::with_prefix("ECOSENTRY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("crosschain.known_endpoints")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let m = &self.monitoring;
        if m.interval_secs == 0 {
            errors.push("monitoring.interval_secs must be positive".to_string());
        }
        if !is_key_safe(&m.period) {
            errors.push(format!(
                "monitoring.period {:?} must be non-empty and use [A-Za-z0-9_-]",
                m.period
            ));
        }
        if m.source_timeout_ms == 0 {
            errors.push("monitoring.source_timeout_ms must be positive".to_string());
        }
        if m.notify_timeout_ms == 0 {
            errors.push("monitoring.notify_timeout_ms must be positive".to_string());
        }
        if m.snapshot_tolerance_secs == 0 {
            errors.push("monitoring.snapshot_tolerance_secs must be positive".to_string());
        }

        if self.storage.backend == StorageBackend::Filesystem && self.storage.root.trim().is_empty()
        {
            errors.push("storage.root is required for the filesystem backend".to_string());
        }

        let mut symbols = HashSet::new();
        for (name, token) in [
            ("gold", &self.tokens.gold),
            ("synthetic", &self.tokens.synthetic),
            ("launchpad", &self.tokens.launchpad),
        ] {
            if !is_key_safe(&token.symbol) {
                errors.push(format!(
                    "tokens.{name}.symbol {:?} must be non-empty and use [A-Za-z0-9_-]",
                    token.symbol
                ));
            }
            if !symbols.insert(token.symbol.as_str()) {
                errors.push(format!("tokens.{name}.symbol {:?} is used twice", token.symbol));
            }
            if token.decimals > 28 {
                errors.push(format!("tokens.{name}.decimals must be at most 28"));
            }
        }

        if self.crosschain.known_endpoints.contains(&0) {
            errors.push("crosschain.known_endpoints must not contain 0".to_string());
        }

        if self.api.enabled && self.api.bind.parse::<SocketAddr>().is_err() {
            errors.push(format!("api.bind {:?} is not a socket address", self.api.bind));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
