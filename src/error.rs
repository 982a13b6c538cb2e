//! Error types for certsync.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure is fatal: the pipeline stops at the first one.
#[derive(Error, Debug)]
pub enum CertSyncError {
    /// The compose document is missing or is not valid YAML.
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// The compose document does not have the shape we expect.
    #[error("Unexpected compose layout in {}: {message}", .path.display())]
    Schema { path: PathBuf, message: String },

    /// A required external tool is not installed.
    #[error("'{tool}' command not found. {hint}")]
    DependencyMissing { tool: String, hint: String },

    /// An external command exited with a non-zero status.
    #[error("Command failed ({}): {command}", .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "killed by signal".to_string()))]
    ProcessFailure {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// Operator input was missing or invalid.
    #[error("Invalid {param}: {message}")]
    Validation { param: String, message: String },

    /// Settings file or path template could not be used.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The terminal prompt itself failed.
    #[error("Input error: {0}")]
    Input(#[from] dialoguer::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertSyncError {
    pub fn validation(param: &str, message: impl Into<String>) -> Self {
        CertSyncError::Validation {
            param: param.to_string(),
            message: message.into(),
        }
    }

    /// Output captured from a failed process, if this error carries one.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            CertSyncError::ProcessFailure { output, .. } if !output.trim().is_empty() => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CertSyncError>;
