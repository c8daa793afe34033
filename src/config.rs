// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Scan configuration
//!
//! Loaded from TOML. Every section and field is optional and falls back to
//! its default; command-line flags override file values.

use crate::error::{RemedyError, Result};
use crate::matcher::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Matching and output policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub min_name_score: u32,
    pub allow_name_fallback: bool,
    pub include_non_drivers: bool,
    pub show_unmatched: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let policy = MatchPolicy::default();
        Self {
            min_name_score: policy.min_name_score,
            allow_name_fallback: policy.allow_name_fallback,
            include_non_drivers: false,
            show_unmatched: false,
        }
    }
}

impl MatchingConfig {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            min_name_score: self.min_name_score,
            allow_name_fallback: self.allow_name_fallback,
        }
    }
}

/// External tool locations and parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub powershell: String,
    pub hpia_path: Option<PathBuf>,
    pub hpia_report_dir: Option<PathBuf>,
    /// HP platform ID; detected when absent
    pub platform: Option<String>,
    pub os: String,
    pub os_version: String,
    pub command_timeout_secs: u64,
    pub enrich_cmsl: bool,
    pub enrich_limit: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            powershell: "powershell".into(),
            hpia_path: None,
            hpia_report_dir: None,
            platform: None,
            os: "Win11".into(),
            os_version: "24H2".into(),
            command_timeout_secs: 60,
            enrich_cmsl: false,
            enrich_limit: 200,
        }
    }
}

impl ToolsConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Report folder for HPIA runs, `_hpia_report` under the working
    /// directory unless configured.
    pub fn report_dir(&self) -> PathBuf {
        self.hpia_report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("_hpia_report"))
    }
}

/// Local legacy driver repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    pub root: Option<PathBuf>,
    /// Model name used for folder lookup; detected when absent
    pub model: Option<String>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemedyConfig {
    pub matching: MatchingConfig,
    pub tools: ToolsConfig,
    pub legacy: LegacyConfig,
}

impl RemedyConfig {
    /// Load from TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RemedyError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RemedyError::Configuration(format!("TOML parse error: {}", e)))
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# Fleet Remedy Configuration

[matching]
min_name_score = 2
# Accept name-only matches that reach min_name_score
allow_name_fallback = false
include_non_drivers = false
show_unmatched = false

[tools]
powershell = "powershell"
# hpia_path = 'C:\Program Files\HP\HPIA\HPImageAssistant.exe'
# hpia_report_dir = 'C:\ProgramData\FleetRemedy\hpia'
# platform = "8A56"
os = "Win11"
os_version = "24H2"
command_timeout_secs = 60
enrich_cmsl = false
enrich_limit = 200

[legacy]
# root = '\\fileserver\drivers\legacy'
# model = "HP EliteDesk 800 G1 SFF"
"#
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_toml_parses_to_defaults() {
        let config = RemedyConfig::from_toml(&RemedyConfig::sample_toml()).unwrap();
        assert_eq!(config, RemedyConfig::default());
    }

    #[test]
    fn test_partial_config_falls_back() {
        let config = RemedyConfig::from_toml(
            r#"
[matching]
allow_name_fallback = true

[tools]
platform = "8A56"
"#,
        )
        .unwrap();
        assert!(config.matching.allow_name_fallback);
        assert_eq!(config.matching.min_name_score, 2);
        assert_eq!(config.tools.platform.as_deref(), Some("8A56"));
        assert_eq!(config.tools.os, "Win11");
        assert_eq!(config.tools.command_timeout(), Duration::from_secs(60));
        assert!(config.legacy.root.is_none());
        assert_eq!(config.matching.policy().min_name_score, 2);
    }

    #[test]
    fn test_empty_config() {
        let config = RemedyConfig::from_toml("").unwrap();
        assert_eq!(config.tools.enrich_limit, 200);
        assert_eq!(config.tools.report_dir(), PathBuf::from("_hpia_report"));
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = RemedyConfig::from_toml("[matching]\nmin_name_score = \"high\"").unwrap_err();
        assert!(matches!(err, RemedyError::Configuration(_)));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remedy.toml");
        std::fs::write(&path, "[legacy]\nroot = \"/srv/drivers\"\n").unwrap();
        let config = RemedyConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.legacy.root, Some(PathBuf::from("/srv/drivers")));

        let missing = RemedyConfig::from_toml_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(missing.to_string().contains("Cannot read"));
    }
}
