//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::errors::VaultError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    ConfigError,
    /// I/O error (stdout, data directory)
    IoError,
    AlreadyInitialized,
    NotInitialized,
    BootFailed,
    /// A vault operation failed
    VaultError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "VAULT_CLI_CONFIG_ERROR",
            Self::IoError => "VAULT_CLI_IO_ERROR",
            Self::AlreadyInitialized => "VAULT_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "VAULT_CLI_NOT_INITIALIZED",
            Self::BootFailed => "VAULT_CLI_BOOT_FAILED",
            Self::VaultError => "VAULT_CLI_OPERATION_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'cloudvault init' first.",
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<VaultError> for CliError {
    fn from(e: VaultError) -> Self {
        Self::new(CliErrorCode::VaultError, format!("{} ({})", e, e.kind()))
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::not_initialized();
        assert!(err.to_string().starts_with("VAULT_CLI_NOT_INITIALIZED: "));
    }

    #[test]
    fn test_config_error_folds_in() {
        let err: CliError = ConfigError::Invalid("signing_secret too short".into()).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().contains("signing_secret"));
    }
}
