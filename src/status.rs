// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Final user-facing status from vendor urgency and version comparison.

use crate::version::VersionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor-declared urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Recommended,
    /// `Optional`, absent, or unrecognized
    #[default]
    None,
}

impl Urgency {
    /// Parse a vendor tag such as `Critical` or `Recommended`.
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_lowercase()).as_deref() {
            Some("critical") => Urgency::Critical,
            Some("recommended") => Urgency::Recommended,
            _ => Urgency::None,
        }
    }
}

/// Status label shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverStatus {
    Critical,
    Recommended,
    #[serde(rename = "Update Available")]
    UpdateAvailable,
    Optional,
    #[serde(rename = "Up to Date")]
    UpToDate,
    Installed,
    Unknown,
}

impl DriverStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DriverStatus::Critical => "Critical",
            DriverStatus::Recommended => "Recommended",
            DriverStatus::UpdateAvailable => "Update Available",
            DriverStatus::Optional => "Optional",
            DriverStatus::UpToDate => "Up to Date",
            DriverStatus::Installed => "Installed",
            DriverStatus::Unknown => "Unknown",
        }
    }

    /// Whether the operator should act on this item.
    pub fn needs_action(&self) -> bool {
        matches!(
            self,
            DriverStatus::Critical | DriverStatus::Recommended | DriverStatus::UpdateAvailable
        )
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Combine urgency with the version comparison outcome.
pub fn classify_status(urgency: Urgency, version: VersionStatus) -> DriverStatus {
    match (urgency, version) {
        (Urgency::Critical, _) => DriverStatus::Critical,
        (Urgency::Recommended, VersionStatus::NotInstalled | VersionStatus::UpdateAvailable) => {
            DriverStatus::Recommended
        }
        (Urgency::None, VersionStatus::UpdateAvailable) => DriverStatus::UpdateAvailable,
        (Urgency::None, VersionStatus::NotInstalled) => DriverStatus::Optional,
        (_, VersionStatus::UpToDate) => DriverStatus::UpToDate,
        (_, VersionStatus::Installed) => DriverStatus::Installed,
        (_, _) => DriverStatus::Unknown,
    }
}
