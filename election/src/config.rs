//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use votechain_orchestrator::{OrchestratorConfig, RpcSignerSettings};
use votechain_registry::HttpSettings;
use votechain_utils::LogFormat;

use crate::ElectionError;

/// Configuration for the election client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the election backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// JSON-RPC endpoint of the wallet that signs transactions.
    #[serde(default = "default_signer_url")]
    pub signer_url: String,

    /// Account the wallet signs with; defaults to the connected identity.
    #[serde(default)]
    pub signer_account: Option<String>,

    /// Base URL of the content store used for candidate images.
    #[serde(default = "default_content_store_url")]
    pub content_store_url: String,

    /// Identity to connect at startup.
    #[serde(default)]
    pub identity: Option<String>,

    /// Bound on each backend read and receipt lookup. Signature requests are
    /// never timed out; they wait for the user.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on the wait for a receipt after broadcast.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    /// How often the voting period is re-read from the backend.
    #[serde(default = "default_period_refresh_secs")]
    pub period_refresh_secs: u64,

    /// How often the countdown is recomputed.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_signer_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_content_store_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_ms() -> u64 {
    2_000
}

fn default_period_refresh_secs() -> u64 {
    60
}

fn default_countdown_tick_ms() -> u64 {
    1_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ElectionError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ElectionError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ElectionError> {
        let config: Self = toml::from_str(s).map_err(|e| ElectionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ElectionError> {
        toml::to_string_pretty(self).map_err(|e| ElectionError::Config(e.to_string()))
    }

    /// Reject intervals that would spin or never fire.
    pub fn validate(&self) -> Result<(), ElectionError> {
        let zero = [
            ("confirmation_timeout_secs", self.confirmation_timeout_secs),
            ("receipt_poll_ms", self.receipt_poll_ms),
            ("period_refresh_secs", self.period_refresh_secs),
            ("countdown_tick_ms", self.countdown_tick_ms),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);
        match zero {
            Some((field, _)) => Err(ElectionError::Config(format!("{field} must be positive"))),
            None => Ok(()),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
        }
    }

    /// Signer settings, signing as `account` unless one is configured.
    pub fn signer_settings(&self, account: Option<&str>) -> RpcSignerSettings {
        RpcSignerSettings {
            from: self.signer_account.clone().or(account.map(str::to_string)),
            poll_interval: Duration::from_millis(self.receipt_poll_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn period_refresh(&self) -> Duration {
        Duration::from_secs(self.period_refresh_secs)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            signer_url: default_signer_url(),
            signer_account: None,
            content_store_url: default_content_store_url(),
            identity: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            receipt_poll_ms: default_receipt_poll_ms(),
            period_refresh_secs: default_period_refresh_secs(),
            countdown_tick_ms: default_countdown_tick_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ClientConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ClientConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.period_refresh(), Duration::from_secs(60));
        assert_eq!(config.countdown_tick(), Duration::from_secs(1));
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            backend_url = "https://api.example.org"
            confirmation_timeout_secs = 300
            log_format = "json"
        "#;
        let config = ClientConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.backend_url, "https://api.example.org");
        assert_eq!(
            config.orchestrator_config().confirmation_timeout,
            Duration::from_secs(300)
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = ClientConfig::from_toml_str("countdown_tick_ms = 0").unwrap_err();
        assert!(err.to_string().contains("countdown_tick_ms"));
    }

    #[test]
    fn configured_account_wins_over_identity() {
        let config = ClientConfig {
            signer_account: Some("0xaaaa".into()),
            ..ClientConfig::default()
        };
        assert_eq!(config.signer_settings(Some("0xbbbb")).from.as_deref(), Some("0xaaaa"));
        assert_eq!(
            ClientConfig::default().signer_settings(Some("0xbbbb")).from.as_deref(),
            Some("0xbbbb")
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "period_refresh_secs = 15").unwrap();
        let config = ClientConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.period_refresh_secs, 15);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ClientConfig::from_toml_file("/nonexistent/votechain.toml");
        assert!(matches!(result, Err(ElectionError::Config(_))));
    }
}
