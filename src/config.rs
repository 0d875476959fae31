// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates the gateway URL and transports and fills defaults for the rest
use crate::paths;
use crate::transport::TransportKind;
use anyhow::{Context, Result};
use deskchat_core::backoff::ReconnectPolicy;
use deskchat_core::connection::ConnectionConfig;
use deskchat_core::dashboard::{DashboardOptions, DEFAULT_ADMIN_ID};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL shared by the realtime gateway and the REST API
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Transports in preference order
    #[serde(default = "default_transports")]
    pub transports: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub reconnection: bool,
    #[serde(default = "default_reconnection_attempts")]
    pub reconnection_attempts: u32,
    #[serde(default = "default_reconnection_delay_ms")]
    pub reconnection_delay_ms: u64,
    /// Attach the session cookie to gateway handshakes and REST calls
    #[serde(default = "default_true")]
    pub with_credentials: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

// Custom Debug impl to redact the session cookie
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("transports", &self.transports)
            .field("timeout_secs", &self.timeout_secs)
            .field("reconnection", &self.reconnection)
            .field("reconnection_attempts", &self.reconnection_attempts)
            .field("reconnection_delay_ms", &self.reconnection_delay_ms)
            .field("with_credentials", &self.with_credentials)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            transports: default_transports(),
            timeout_secs: default_timeout_secs(),
            reconnection: true,
            reconnection_attempts: default_reconnection_attempts(),
            reconnection_delay_ms: default_reconnection_delay_ms(),
            with_credentials: true,
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_id")]
    pub admin_id: String,
    /// Open a newly announced conversation when none is selected
    #[serde(default = "default_true")]
    pub auto_select_new: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            admin_id: default_admin_id(),
            auto_select_new: true,
        }
    }
}

fn default_gateway_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_transports() -> Vec<String> {
    vec!["websocket".to_string(), "polling".to_string()]
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_reconnection_attempts() -> u32 {
    5
}

fn default_reconnection_delay_ms() -> u64 {
    1000
}

fn default_admin_id() -> String {
    DEFAULT_ADMIN_ID.to_string()
}

fn default_true() -> bool {
    true
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::fixed(
            Duration::from_millis(self.reconnection_delay_ms),
            self.reconnection_attempts,
        )
    }

    /// Parsed transport list, in preference order
    pub fn transport_kinds(&self) -> Result<Vec<TransportKind>> {
        self.transports.iter().map(|t| t.parse()).collect()
    }

    /// Cookie to attach to outgoing requests, if credentials are enabled
    pub fn credentials(&self) -> Option<&str> {
        if self.with_credentials {
            self.session_cookie.as_deref()
        } else {
            None
        }
    }

    /// Connection tuning for the admin or customer surface
    pub fn connection_config(&self, admin: bool) -> ConnectionConfig {
        let base = if admin {
            ConnectionConfig::admin()
        } else {
            ConnectionConfig::customer()
        };
        ConnectionConfig {
            timeout: self.timeout(),
            reconnection: self.reconnection,
            policy: self.reconnect_policy(),
            ..base
        }
    }
}

impl AdminConfig {
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            admin_id: self.admin_id.clone(),
            auto_select_new: self.auto_select_new,
        }
    }
}

impl Config {
    /// Find the config file, checking multiple locations in order:
    /// 1. DESKCHAT_CONFIG_PATH env var (if set)
    /// 2. ./config.toml (current directory - for development)
    /// 3. ~/.config/deskchat/config.toml (XDG config dir)
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("DESKCHAT_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = paths::config_file();
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Load configuration with environment variable overrides, then validate
    pub fn load() -> Result<Self> {
        let mut config = if let Some(config_path) = Self::find_config_file() {
            tracing::info!(
                path = %config_path.display(),
                "Loading configuration from file"
            );
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            tracing::info!("No config file found, using environment variables and defaults");
            Config::default()
        };

        if let Ok(val) = std::env::var("DESKCHAT_GATEWAY_URL") {
            config.gateway.url = val;
        }
        if let Ok(val) = std::env::var("DESKCHAT_SESSION_COOKIE") {
            config.gateway.session_cookie = Some(val);
            // Clear from environment to prevent exposure via /proc or ps
            std::env::remove_var("DESKCHAT_SESSION_COOKIE");
        }
        if let Ok(val) = std::env::var("DESKCHAT_ADMIN_ID") {
            config.admin.admin_id = val;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.gateway.url)
            .with_context(|| format!("gateway.url is not a valid URL: {}", self.gateway.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "gateway.url must use http or https (set in config.toml or DESKCHAT_GATEWAY_URL env var), got: {}",
                url.scheme()
            );
        }

        if self.gateway.transports.is_empty() {
            anyhow::bail!("gateway.transports must list at least one transport");
        }
        self.gateway
            .transport_kinds()
            .context("gateway.transports contains an unknown transport")?;

        if self.gateway.timeout_secs == 0 {
            anyhow::bail!("gateway.timeout_secs must be greater than zero");
        }
        if self.admin.admin_id.trim().is_empty() {
            anyhow::bail!("admin.admin_id must not be empty");
        }

        Ok(())
    }
}
