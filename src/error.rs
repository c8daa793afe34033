// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Error types for Fleet Remedy
//!
//! Only the collaborator layer (external tools, report files, configuration)
//! produces errors. The matching core is infallible and degrades to empty or
//! `Unknown` results instead.

use std::io;
use thiserror::Error;

/// Result type alias for Fleet Remedy operations
pub type Result<T> = std::result::Result<T, RemedyError>;

/// Main error type for Fleet Remedy
#[derive(Error, Debug)]
pub enum RemedyError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WMI error (Windows)
    #[cfg(windows)]
    #[error("WMI error: {0}")]
    Wmi(#[from] wmi::WMIError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External command ran but reported failure
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// External tool (HPIA, HPCMSL, PowerShell) is not installed or not on PATH
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// External command exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl RemedyError {
    /// Render the error as a scan-level warning line prefixed with the
    /// collaborator that produced it.
    pub fn as_warning(&self, origin: &str) -> String {
        format!("{} failed: {}", origin, self)
    }
}
