//! # Configuration
//!
//! `VaultConfig` is read from a JSON file, validated, and handed to
//! `VaultService::new`. Nothing else reads configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::model::{AccountTier, TierLimits};
use crate::retry::RetryPolicy;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Minimum length of signing and JWT secrets in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Longest upload capability lifetime accepted
pub const MAX_UPLOAD_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Data directory (required)
    pub data_dir: String,

    /// Base URL capabilities point at
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Key used to sign blob capabilities (required)
    pub signing_secret: String,

    #[serde(default)]
    pub http: HttpServerConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub tiers: TierConfig,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

/// Bearer token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

fn default_issuer() -> String {
    "cloudvault".to_string()
}
fn default_audience() -> String {
    "cloudvault-api".to_string()
}
fn default_token_ttl_minutes() -> i64 {
    60
}

/// Capability lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_upload_ttl_secs")]
    pub upload_ttl_secs: u64,

    #[serde(default = "default_download_ttl_secs")]
    pub download_ttl_secs: u64,
}

fn default_upload_ttl_secs() -> u64 {
    300
}
fn default_download_ttl_secs() -> u64 {
    60
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            upload_ttl_secs: default_upload_ttl_secs(),
            download_ttl_secs: default_download_ttl_secs(),
        }
    }
}

impl TransferConfig {
    pub fn upload_ttl(&self) -> Duration {
        Duration::seconds(self.upload_ttl_secs as i64)
    }

    pub fn download_ttl(&self) -> Duration {
        Duration::seconds(self.download_ttl_secs as i64)
    }
}

/// Limits per subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    #[serde(default = "default_free_limits")]
    pub free: TierLimits,

    #[serde(default = "default_premium_limits")]
    pub premium: TierLimits,
}

fn default_free_limits() -> TierLimits {
    TierLimits {
        quota_bytes: 250 * MIB,
        max_file_bytes: 50 * MIB,
    }
}

fn default_premium_limits() -> TierLimits {
    TierLimits {
        quota_bytes: 10 * GIB,
        max_file_bytes: 10 * GIB,
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            free: default_free_limits(),
            premium: default_premium_limits(),
        }
    }
}

impl TierConfig {
    pub fn limits_for(&self, tier: AccountTier) -> TierLimits {
        match tier {
            AccountTier::Free => self.free,
            AccountTier::Premium => self.premium,
        }
    }

    /// Largest single file any tier admits
    pub fn largest_file_bytes(&self) -> u64 {
        self.free.max_file_bytes.max(self.premium.max_file_bytes)
    }
}

impl VaultConfig {
    /// Config with defaults for everything but the directory and secrets
    pub fn new(
        data_dir: impl Into<String>,
        signing_secret: impl Into<String>,
        jwt_secret: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            public_base_url: default_public_base_url(),
            signing_secret: signing_secret.into(),
            http: HttpServerConfig::default(),
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                issuer: default_issuer(),
                audience: default_audience(),
                token_ttl_minutes: default_token_ttl_minutes(),
            },
            transfer: TransferConfig::default(),
            tiers: TierConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;

        let config: VaultConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.data_dir.trim().is_empty() {
            return invalid("data_dir must not be empty".to_string());
        }
        if self.signing_secret.len() < MIN_SECRET_LEN {
            return invalid(format!("signing_secret must be at least {} bytes", MIN_SECRET_LEN));
        }
        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return invalid(format!("auth.jwt_secret must be at least {} bytes", MIN_SECRET_LEN));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return invalid("auth.token_ttl_minutes must be > 0".to_string());
        }
        if self.transfer.upload_ttl_secs == 0 || self.transfer.upload_ttl_secs > MAX_UPLOAD_TTL_SECS {
            return invalid(format!(
                "transfer.upload_ttl_secs must be between 1 and {}",
                MAX_UPLOAD_TTL_SECS
            ));
        }
        if self.transfer.download_ttl_secs == 0 {
            return invalid("transfer.download_ttl_secs must be > 0".to_string());
        }
        for (name, limits) in [("free", self.tiers.free), ("premium", self.tiers.premium)] {
            if limits.max_file_bytes > limits.quota_bytes {
                return invalid(format!(
                    "tiers.{}.max_file_bytes must not exceed quota_bytes",
                    name
                ));
            }
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be > 0".to_string());
        }
        if !(self.retry.multiplier >= 1.0) {
            return invalid("retry.multiplier must be >= 1.0".to_string());
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return invalid("retry.initial_backoff_ms must not exceed max_backoff_ms".to_string());
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Root of the filesystem blob backend
    pub fn blob_root(&self) -> PathBuf {
        self.data_path().join("blobs")
    }

    /// Location of the durable catalog document
    pub fn catalog_path(&self) -> PathBuf {
        self.data_path().join("catalog").join("catalog.json")
    }
}
