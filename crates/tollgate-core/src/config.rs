//! Configuration
//!
//! 設定は `config` クレートで読み込みます。環境変数は `TOLLGATE` プレフィックス、
//! ネストは `__`（ダブルアンダースコア）区切りです。
//!
//! - `TOLLGATE__GATEWAY__BASE_URL=http://localhost:8000/api` -> `gateway.base_url`
//! - `TOLLGATE__GATEWAY__TIMEOUT_MS=5000` -> `gateway.timeout_ms`
//! - `TOLLGATE__DRAFTS__STORE_PATH=/tmp/drafts.json` -> `drafts.store_path`
//!
//! すべてのセクションにデフォルトがあるので、何も設定しなくても起動できます。
//! 起動時に `validate()` で Fail-fast します。

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("gateway.base_url must not be empty")]
    EmptyBaseUrl,

    #[error("gateway.timeout_ms must be greater than zero")]
    InvalidTimeout,

    #[error("drafts.store_path must not be empty")]
    EmptyStorePath,
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TollgateConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub drafts: DraftConfig,
}

/// Request Gateway / transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Joined with every request path.
    pub base_url: String,

    /// Transport deadline per request.
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub loading_text: String,
    pub error_duration_ms: u64,
}

impl NotificationConfig {
    pub fn error_duration(&self) -> Duration {
        Duration::from_millis(self.error_duration_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            loading_text: "加载中...".to_string(),
            error_duration_ms: 4_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    pub store_path: PathBuf,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(".tollgate/drafts.json"),
        }
    }
}

impl TollgateConfig {
    /// Load from the environment only.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load from an optional file (any format `config` understands), then
    /// the environment. Environment values win.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("TOLLGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }
        if self.gateway.timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.drafts.store_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyStorePath);
        }
        Ok(())
    }
}
