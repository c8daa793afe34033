// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Loose version parsing and installed-vs-available comparison.
//!
//! Vendor versions show up as `31.0.101.5186`, `Ver. 01.12.00 Rev.A`,
//! `1.2.3.4 (A)` or `N/A`. The first run of one to five dot-separated integer
//! groups is taken as the version; anything that cannot be read that way
//! compares as [`VersionStatus::Unknown`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static VERSION_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+){0,4})").ok());

/// Ordered integer components of a version string. Compares lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTuple(Vec<u64>);

impl VersionTuple {
    /// Parse a version string. Returns `None` when no integer component can
    /// be read.
    pub fn parse(value: &str) -> Option<Self> {
        let text = value.trim();
        if text.is_empty() {
            return None;
        }
        let text = VERSION_RUN
            .as_ref()
            .and_then(|re| re.find(text))
            .map(|m| m.as_str())
            .unwrap_or(text);
        let mut parts = Vec::new();
        for part in text.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parts.push(part.parse().ok()?);
        }
        if parts.is_empty() {
            None
        } else {
            Some(Self(parts))
        }
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Outcome of comparing an installed version against a catalog version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// No installed counterpart was found
    NotInstalled,
    /// Catalog version is newer than the installed one
    UpdateAvailable,
    UpToDate,
    /// Installed version is newer than the catalog; already satisfied
    Installed,
    /// One side could not be parsed
    Unknown,
}

impl VersionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VersionStatus::NotInstalled => "Not Installed",
            VersionStatus::UpdateAvailable => "Update Available",
            VersionStatus::UpToDate => "Up to Date",
            VersionStatus::Installed => "Installed",
            VersionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compare an installed version with the catalog's available version.
pub fn compare_versions(installed: Option<&str>, available: Option<&str>) -> VersionStatus {
    let (Some(inst), Some(avail)) = (
        installed.and_then(VersionTuple::parse),
        available.and_then(VersionTuple::parse),
    ) else {
        return VersionStatus::Unknown;
    };
    match avail.cmp(&inst) {
        Ordering::Greater => VersionStatus::UpdateAvailable,
        Ordering::Equal => VersionStatus::UpToDate,
        Ordering::Less => VersionStatus::Installed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_embedded() {
        assert_eq!(VersionTuple::parse("1.2.3.4").unwrap().components(), &[1, 2, 3, 4]);
        assert_eq!(VersionTuple::parse("Ver. 01.12.00 Rev.A").unwrap().components(), &[1, 12, 0]);
        assert_eq!(VersionTuple::parse(" 31 ").unwrap().components(), &[31]);
    }

    #[test]
    fn test_parse_caps_at_five_groups() {
        let v = VersionTuple::parse("1.2.3.4.5.6").unwrap();
        assert_eq!(v.components(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(VersionTuple::parse("N/A").is_none());
        assert!(VersionTuple::parse("").is_none());
        assert!(VersionTuple::parse("   ").is_none());
        assert!(VersionTuple::parse("99999999999999999999999").is_none());
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions(Some("1.2.3.4"), Some("1.2.3.5")), VersionStatus::UpdateAvailable);
        assert_eq!(compare_versions(Some("1.2.3.5"), Some("1.2.3.4")), VersionStatus::Installed);
        assert_eq!(compare_versions(Some("1.2.3.4"), Some("1.2.3.4")), VersionStatus::UpToDate);
        assert_eq!(compare_versions(Some("N/A"), Some("1.2.3.4")), VersionStatus::Unknown);
        assert_eq!(compare_versions(Some("1.2.3.4"), Some("N/A")), VersionStatus::Unknown);
        assert_eq!(compare_versions(None, Some("1.0")), VersionStatus::Unknown);
    }

    #[test]
    fn test_compare_numeric_not_lexical() {
        assert_eq!(compare_versions(Some("9.0"), Some("10.0")), VersionStatus::UpdateAvailable);
        assert_eq!(compare_versions(Some("1.2"), Some("1.2.0")), VersionStatus::UpdateAvailable);
    }

    #[test]
    fn test_display_and_labels() {
        assert_eq!(VersionTuple::parse("01.02").unwrap().to_string(), "1.2");
        assert_eq!(VersionStatus::UpToDate.to_string(), "Up to Date");
    }
}
