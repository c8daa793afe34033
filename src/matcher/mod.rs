// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Catalog-to-inventory matching.
//!
//! Vendor catalogs and the Windows device inventory rarely share a key, so a
//! catalog item is matched by the strongest of three signals:
//!
//! 1. **Hardware ID** overlap (score [`HWID_SCORE`])
//! 2. **INF name** overlap (score [`INF_SCORE`])
//! 3. **Name** overlap: normalized-name containment, vocabulary terms and
//!    category/family bonuses (see [`name_score`])
//!
//! Identifier scores sit far above any reachable name score, so an identifier
//! match always outranks a name match. Name-only matches are gated twice: the
//! installed device class must agree with the classes the catalog text
//! implies, and the result is only accepted as primary when it reaches
//! [`MatchPolicy::min_name_score`] with [`MatchPolicy::allow_name_fallback`]
//! enabled. Ties keep the first installed entry.
//!
//! # Examples
//!
//! ```
//! use remedylib::catalog::{CatalogItem, CatalogSource, InstalledEntry};
//! use remedylib::matcher::{Inventory, MatchPolicy, MatchReason};
//!
//! let mut item = CatalogItem::named(CatalogSource::PackageList, "Intel WLAN Driver", "Driver - Network", Some("23.60"));
//! item.hardware_ids = "PCI\\VEN_8086&DEV_A0F0".into();
//! let mut wlan = InstalledEntry::named("Intel(R) Wi-Fi 6 AX201 160MHz", Some("22.200"), Some("Net"));
//! wlan.hardware_ids = "PCI\\VEN_8086&DEV_A0F0&SUBSYS_00748086 PCI\\VEN_8086&DEV_A0F0".into();
//!
//! let installed = [wlan];
//! let inventory = Inventory::new(&installed);
//! let result = inventory.best_match(&item, &MatchPolicy::default());
//! assert_eq!(result.reason, MatchReason::HardwareId);
//! ```

mod score;

pub use score::{name_score, CATEGORY_BONUS, CONTAINMENT_BONUS, HWID_SCORE, INF_SCORE};

use crate::catalog::{CatalogItem, InstalledEntry};
use crate::classify::expected_classes;
use crate::generic::is_generic_normalized;
use crate::normalize::{normalize_name, IdentifierSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Acceptance policy for name-only matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Minimum name score for a name-only match
    pub min_name_score: u32,
    /// Whether name-only matches may be accepted at all
    pub allow_name_fallback: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_name_score: 2,
            allow_name_fallback: false,
        }
    }
}

/// Why a catalog item did or did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
    /// Hardware IDs overlap
    #[serde(rename = "hwid")]
    HardwareId,
    /// INF file names overlap
    Inf,
    /// Accepted name-only match
    Name,
    /// The catalog item carried identifiers but nothing matched well enough
    NoMatchInsufficientScore,
    /// The catalog item carried no identifiers, and no name match was accepted
    NoMatchNoIdentifiersAvailable,
    /// Taken verbatim from the vendor analysis report
    Report,
}

impl MatchReason {
    pub fn label(&self) -> &'static str {
        match self {
            MatchReason::HardwareId => "hwid",
            MatchReason::Inf => "inf",
            MatchReason::Name => "name",
            MatchReason::NoMatchInsufficientScore => "no-hwid-match",
            MatchReason::NoMatchNoIdentifiersAvailable => "no-ids",
            MatchReason::Report => "report",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(
            self,
            MatchReason::HardwareId | MatchReason::Inf | MatchReason::Name | MatchReason::Report
        )
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of matching one catalog item against the inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    /// Accepted installed entry
    pub matched: Option<&'a InstalledEntry>,
    pub reason: MatchReason,
    pub score: u32,
    /// Shared hardware ID or INF name behind an identifier match
    pub matched_identifier: Option<String>,
    /// Highest name-score entry, kept for diagnostics even when rejected
    pub name_candidate: Option<&'a InstalledEntry>,
    pub name_candidate_score: u32,
}

/// An installed entry with its derived comparison keys.
#[derive(Debug)]
struct PreparedEntry<'a> {
    entry: &'a InstalledEntry,
    normalized: String,
    identifiers: IdentifierSet,
}

/// Installed inventory prepared once for matching many catalog items.
#[derive(Debug)]
pub struct Inventory<'a> {
    entries: Vec<PreparedEntry<'a>>,
}

impl<'a> Inventory<'a> {
    pub fn new(entries: &'a [InstalledEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|entry| PreparedEntry {
                    entry,
                    normalized: normalize_name(&entry.name),
                    identifiers: entry.identifiers(),
                })
                .collect(),
        }
    }

    /// Best installed entry for `item` under `policy`.
    pub fn best_match(&self, item: &CatalogItem, policy: &MatchPolicy) -> MatchResult<'a> {
        let catalog_norm = item.normalized_name();
        let expected = expected_classes(&item.name, &item.category);
        let catalog_ids = item.identifiers();

        let mut best: Option<(&'a InstalledEntry, MatchReason, u32, Option<String>)> = None;
        let mut name_candidate: Option<(&'a InstalledEntry, u32)> = None;

        for prepared in &self.entries {
            if is_generic_normalized(&prepared.normalized, &catalog_norm) {
                continue;
            }

            let shared_hwid = catalog_ids.shared_hardware_id(&prepared.identifiers);
            let shared_inf = catalog_ids.shared_inf(&prepared.identifiers);
            let name = name_score(&item.name, &item.category, &prepared.normalized);

            let (reason, score, identifier) = if let Some(id) = shared_hwid {
                (MatchReason::HardwareId, HWID_SCORE, Some(id.to_string()))
            } else if let Some(inf) = shared_inf {
                (MatchReason::Inf, INF_SCORE, Some(inf.to_string()))
            } else {
                (MatchReason::Name, name, None)
            };

            if name > name_candidate.map_or(0, |(_, s)| s) {
                name_candidate = Some((prepared.entry, name));
            }

            if reason == MatchReason::Name
                && !expected.admits(prepared.entry.device_class.as_deref().unwrap_or(""))
            {
                continue;
            }

            if score > best.as_ref().map_or(0, |(_, _, s, _)| *s) {
                best = Some((prepared.entry, reason, score, identifier));
            }
        }

        let no_match_reason = if catalog_ids.is_empty() {
            MatchReason::NoMatchNoIdentifiersAvailable
        } else {
            MatchReason::NoMatchInsufficientScore
        };

        let (matched, reason, score, matched_identifier) = match best {
            Some((entry, MatchReason::Name, score, _))
                if score < policy.min_name_score || !policy.allow_name_fallback =>
            {
                log::debug!(
                    "demoted name match '{}' -> '{}' (score {}, min {}, fallback {})",
                    item.name,
                    entry.name,
                    score,
                    policy.min_name_score,
                    policy.allow_name_fallback
                );
                (None, no_match_reason, 0, None)
            }
            Some((entry, reason, score, identifier)) => {
                log::debug!("matched '{}' -> '{}' by {} ({})", item.name, entry.name, reason, score);
                (Some(entry), reason, score, identifier)
            }
            None => (None, no_match_reason, 0, None),
        };

        MatchResult {
            matched,
            reason,
            score,
            matched_identifier,
            name_candidate: name_candidate.map(|(e, _)| e),
            name_candidate_score: name_candidate.map_or(0, |(_, s)| s),
        }
    }
}

/// Match one catalog item against an installed inventory.
pub fn match_catalog_item<'a>(
    item: &CatalogItem,
    installed: &'a [InstalledEntry],
    min_name_score: u32,
    allow_name_fallback: bool,
) -> MatchResult<'a> {
    let policy = MatchPolicy {
        min_name_score,
        allow_name_fallback,
    };
    Inventory::new(installed).best_match(item, &policy)
}

#[cfg(test)]
mod tests;
