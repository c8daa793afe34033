// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Scan orchestration: catalog sources plus inventory in, ordered
//! reconciliation records out.
//!
//! Report recommendations are taken as-is. Package-list items are filtered to
//! drivers, stripped of anything the report already covers, deduplicated by
//! name, then matched against the inventory. Legacy repository entries are
//! matched the same way and a stale BIOS is escalated to critical.

use crate::catalog::{CatalogItem, CatalogSource, InstalledEntry, CM_PROB_FAILED_INSTALL};
use crate::classify::{is_bios_item, is_driver_item, DriverCategory};
use crate::config::RemedyConfig;
use crate::dedup::{dedupe_latest, drop_covered, CoverageSet};
use crate::error::Result;
use crate::matcher::{Inventory, MatchPolicy, MatchReason, MatchResult};
use crate::status::{classify_status, DriverStatus, Urgency};
use crate::version::{compare_versions, VersionStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One catalog item with its resolved installed counterpart and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub source: CatalogSource,
    pub catalog_name: String,
    pub category: String,
    pub bucket: DriverCategory,
    pub catalog_version: Option<String>,
    pub package_id: Option<String>,
    pub release_notes_url: Option<String>,
    pub match_name: Option<String>,
    pub match_version: Option<String>,
    /// Hardware ID or INF name behind an identifier match
    pub match_identifier: Option<String>,
    pub reason: MatchReason,
    pub score: u32,
    pub version_status: VersionStatus,
    pub status: DriverStatus,
    /// `Some(true)` when the matched device reports Device Manager code 28,
    /// `None` when there is no match or no code
    pub missing_driver: Option<bool>,
    pub config_error_code: Option<u32>,
    pub name_candidate: Option<String>,
    pub name_candidate_version: Option<String>,
    pub name_candidate_score: u32,
    /// Package file for legacy repository entries
    pub package_path: Option<PathBuf>,
}

impl ReconciliationRecord {
    fn base(item: &CatalogItem) -> Self {
        Self {
            source: item.source,
            catalog_name: item.name.clone(),
            category: item.category.clone(),
            bucket: item.bucket(),
            catalog_version: item.version.clone(),
            package_id: item.package_id.clone(),
            release_notes_url: item.release_notes_url.clone(),
            match_name: None,
            match_version: None,
            match_identifier: None,
            reason: MatchReason::NoMatchNoIdentifiersAvailable,
            score: 0,
            version_status: VersionStatus::NotInstalled,
            status: DriverStatus::Optional,
            missing_driver: None,
            config_error_code: None,
            name_candidate: None,
            name_candidate_version: None,
            name_candidate_score: 0,
            package_path: item.package_path.clone(),
        }
    }

    /// Record for a report recommendation, which carries its own installed
    /// version and is never re-matched.
    pub fn from_report(item: &CatalogItem) -> Self {
        let version_status = match item.reported_installed_version.as_deref() {
            Some(current) => compare_versions(Some(current), item.version.as_deref()),
            None => VersionStatus::NotInstalled,
        };
        Self {
            match_name: Some(item.name.clone()),
            match_version: item.reported_installed_version.clone(),
            reason: MatchReason::Report,
            score: 0,
            version_status,
            status: classify_status(item.urgency, version_status),
            ..Self::base(item)
        }
    }

    /// Record for a matched (or unmatched) package-list or legacy item.
    pub fn from_match(item: &CatalogItem, result: &MatchResult<'_>, urgency: Urgency) -> Self {
        let version_status = match result.matched {
            Some(entry) => compare_versions(entry.version.as_deref(), item.version.as_deref()),
            None => VersionStatus::NotInstalled,
        };
        let matched = result.matched;
        Self {
            match_name: matched.map(|e| e.name.clone()),
            match_version: matched.and_then(|e| e.version.clone()),
            match_identifier: result.matched_identifier.clone(),
            reason: result.reason,
            score: result.score,
            version_status,
            status: classify_status(urgency, version_status),
            missing_driver: matched
                .and_then(|e| e.config_error_code)
                .map(|code| code == CM_PROB_FAILED_INSTALL),
            config_error_code: matched.and_then(|e| e.config_error_code),
            name_candidate: result.name_candidate.map(|e| e.name.clone()),
            name_candidate_version: result.name_candidate.and_then(|e| e.version.clone()),
            name_candidate_score: result.name_candidate_score,
            ..Self::base(item)
        }
    }

    pub fn is_matched(&self) -> bool {
        self.reason.is_match()
    }

    /// `missing`, `ok` or `unknown` for the matched device's driver state.
    pub fn driver_state(&self) -> &'static str {
        match self.missing_driver {
            Some(true) => "missing",
            Some(false) => "ok",
            None => "unknown",
        }
    }
}

/// Everything one scan reconciles, already loaded.
#[derive(Debug, Clone, Default)]
pub struct ScanSources {
    pub host: String,
    pub report: Vec<CatalogItem>,
    pub package_list: Vec<CatalogItem>,
    pub legacy: Vec<CatalogItem>,
    pub inventory: Vec<InstalledEntry>,
    /// Warnings raised while collecting the sources
    pub warnings: Vec<String>,
}

/// Result of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub host: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub records: Vec<ReconciliationRecord>,
    pub warnings: Vec<String>,
}

impl ScanReport {
    /// Records the operator should act on.
    pub fn actionable(&self) -> impl Iterator<Item = &ReconciliationRecord> {
        self.records.iter().filter(|r| r.status.needs_action())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Scan policy.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    pub policy: MatchPolicy,
    /// Emit package-list and legacy items that matched nothing
    pub show_unmatched: bool,
    /// Keep package-list utilities and applications, not only drivers
    pub include_non_drivers: bool,
}

impl Reconciler {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn from_config(config: &RemedyConfig) -> Self {
        Self {
            policy: config.matching.policy(),
            show_unmatched: config.matching.show_unmatched,
            include_non_drivers: config.matching.include_non_drivers,
        }
    }

    pub fn with_show_unmatched(mut self, show: bool) -> Self {
        self.show_unmatched = show;
        self
    }

    pub fn with_non_drivers(mut self, include: bool) -> Self {
        self.include_non_drivers = include;
        self
    }

    /// Reconcile all sources into records: report first, then package list,
    /// then legacy, each in input order.
    pub fn reconcile(&self, sources: &ScanSources) -> Vec<ReconciliationRecord> {
        let inventory = Inventory::new(&sources.inventory);
        let mut records: Vec<ReconciliationRecord> =
            sources.report.iter().map(ReconciliationRecord::from_report).collect();

        let package_list = self.prepare_package_list(&sources.report, &sources.package_list);
        for item in &package_list {
            let result = inventory.best_match(item, &self.policy);
            if result.matched.is_none() && !self.show_unmatched {
                continue;
            }
            records.push(ReconciliationRecord::from_match(item, &result, Urgency::None));
        }

        for item in &sources.legacy {
            let result = inventory.best_match(item, &self.policy);
            if result.matched.is_none() && !self.show_unmatched {
                continue;
            }
            let mut record = ReconciliationRecord::from_match(item, &result, item.urgency);
            if record.status == DriverStatus::UpdateAvailable && is_bios_item(&item.category, &item.name) {
                record.status = DriverStatus::Critical;
            }
            records.push(record);
        }

        records
    }

    /// Driver filter, report coverage and name dedup over the package list.
    pub fn prepare_package_list(&self, report: &[CatalogItem], package_list: &[CatalogItem]) -> Vec<CatalogItem> {
        let drivers: Vec<CatalogItem> = package_list
            .iter()
            .filter(|item| self.include_non_drivers || is_driver_item(&item.category, &item.name))
            .cloned()
            .collect();
        let uncovered = drop_covered(drivers, &CoverageSet::from_items(report));
        dedupe_latest(uncovered)
    }

    /// Run a full scan and stamp the report.
    pub fn scan(&self, sources: &ScanSources) -> ScanReport {
        log::info!(
            "scanning {}: {} report, {} package-list, {} legacy items against {} installed entries",
            sources.host,
            sources.report.len(),
            sources.package_list.len(),
            sources.legacy.len(),
            sources.inventory.len()
        );
        for warning in &sources.warnings {
            log::warn!("{}", warning);
        }
        if sources.inventory.is_empty() && !(sources.package_list.is_empty() && sources.legacy.is_empty()) {
            log::warn!("installed inventory is empty; every package-list item will be unmatched");
        }

        let records = self.reconcile(sources);
        log::info!(
            "{} records, {} need action",
            records.len(),
            records.iter().filter(|r| r.status.needs_action()).count()
        );

        ScanReport {
            host: sources.host.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            records,
            warnings: sources.warnings.clone(),
        }
    }
}
