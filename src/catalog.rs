// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Catalog items and installed entries, and their ingestion from vendor
//! JSON documents.
//!
//! # Sources
//!
//! - **Report**: HP Image Assistant analysis report (`HPIA.Recommendations`)
//! - **Package list**: HPCMSL `Get-SoftpaqList` output, optionally enriched
//!   with `Get-SoftpaqMetadata` under a nested `Meta` map
//! - **Legacy**: `manifest.json` in a local driver repository folder
//! - **Inventory**: `Win32_PnPSignedDriver` rows joined with
//!   `Win32_PnPEntity.ConfigManagerErrorCode`
//!
//! Field names differ between tools and versions; each logical field is read
//! through an alias list and falls back to the `Meta` map.

use crate::classify::{categorize, DriverCategory};
use crate::error::Result;
use crate::normalize::{normalize_name, IdentifierSet};
use crate::status::Urgency;
use crate::value::{records_from_json, RawValue, META_KEY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

const CATALOG_NAME: &[&str] = &["Name", "DeviceName"];
const CATALOG_CATEGORY: &[&str] = &["Category", "Class", "ClassName"];
const CATALOG_VERSION: &[&str] = &["Version"];
const CATALOG_PACKAGE_ID: &[&str] = &["Id", "SoftPaqId", "Number"];
const CATALOG_URGENCY: &[&str] = &["RecommendationValue"];
const CATALOG_CURRENT_VERSION: &[&str] = &["CurrentVersion"];
const CATALOG_URL: &[&str] = &["ReleaseNotesUrl", "Url"];
const CATALOG_HARDWARE_IDS: &[&str] = &[
    "HardwareID",
    "HardwareIds",
    "HWID",
    "DeviceID",
    "DeviceIds",
    "PnPIds",
    "SupportedDevices",
    "Devices",
];
const CATALOG_INF: &[&str] = &["InfName", "INF", "Inf", "InfFiles", "CVA", "Description", "Notes"];

const INSTALLED_NAME: &[&str] = &["DeviceName", "Name"];
const INSTALLED_VERSION: &[&str] = &["DriverVersion", "Version"];
const INSTALLED_CLASS: &[&str] = &["DeviceClass", "Class"];
const INSTALLED_MANUFACTURER: &[&str] = &["Manufacturer", "Publisher"];
const INSTALLED_HARDWARE_IDS: &[&str] = &["HardwareID", "HardwareIds", "DeviceID"];
const INSTALLED_INF: &[&str] = &["InfName", "Inf"];
const INSTALLED_ERROR_CODE: &[&str] = &["ConfigManagerErrorCode"];

/// `ConfigManagerErrorCode` meaning the device has no driver installed.
pub const CM_PROB_FAILED_INSTALL: u32 = 28;

/// Where a catalog item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogSource {
    /// Structured per-device analysis report (HPIA)
    #[serde(rename = "HPIA")]
    Report,
    /// Full package list for the platform (HPCMSL)
    #[serde(rename = "CMSL")]
    PackageList,
    /// Local legacy driver repository
    Legacy,
}

impl CatalogSource {
    pub fn label(&self) -> &'static str {
        match self {
            CatalogSource::Report => "HPIA",
            CatalogSource::PackageList => "CMSL",
            CatalogSource::Legacy => "Legacy",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A vendor-recommended driver, BIOS or firmware update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub source: CatalogSource,
    pub name: String,
    /// Category or class text as declared by the vendor
    pub category: String,
    /// Available version
    pub version: Option<String>,
    /// SoftPaq number or other package id
    pub package_id: Option<String>,
    pub urgency: Urgency,
    /// Installed version as reported by the vendor tool itself
    pub reported_installed_version: Option<String>,
    pub release_notes_url: Option<String>,
    /// Raw hardware-ID payload, any shape
    pub hardware_ids: RawValue,
    /// Raw INF references, any shape (may be free text)
    pub inf_refs: RawValue,
    /// Package file for legacy repository entries
    pub package_path: Option<PathBuf>,
}

impl CatalogItem {
    /// Build from a raw record. Returns `None` for non-map values.
    pub fn from_raw(source: CatalogSource, raw: &RawValue) -> Option<Self> {
        raw.as_map()?;
        Some(Self {
            source,
            name: raw.text_field(CATALOG_NAME).unwrap_or_default(),
            category: raw.text_field(CATALOG_CATEGORY).unwrap_or_default(),
            version: raw.text_field(CATALOG_VERSION),
            package_id: raw.text_field(CATALOG_PACKAGE_ID),
            urgency: Urgency::parse(raw.text_field(CATALOG_URGENCY).as_deref()),
            reported_installed_version: raw.text_field(CATALOG_CURRENT_VERSION),
            release_notes_url: raw.text_field(CATALOG_URL),
            hardware_ids: raw.owned_field(CATALOG_HARDWARE_IDS),
            inf_refs: raw.owned_field(CATALOG_INF),
            package_path: None,
        })
    }

    /// A bare item with only name, category and version set.
    pub fn named(source: CatalogSource, name: &str, category: &str, version: Option<&str>) -> Self {
        Self {
            source,
            name: name.to_string(),
            category: category.to_string(),
            version: version.map(str::to_string),
            package_id: None,
            urgency: Urgency::None,
            reported_installed_version: None,
            release_notes_url: None,
            hardware_ids: RawValue::Null,
            inf_refs: RawValue::Null,
            package_path: None,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn identifiers(&self) -> IdentifierSet {
        IdentifierSet::from_raw(&self.hardware_ids, &self.inf_refs)
    }

    pub fn bucket(&self) -> DriverCategory {
        categorize(&self.category, &self.name)
    }
}

/// An installed device driver or software package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledEntry {
    pub name: String,
    pub version: Option<String>,
    /// Device setup class (`Display`, `Net`, `MEDIA`, ...)
    pub device_class: Option<String>,
    pub manufacturer: Option<String>,
    /// Raw hardware-ID payload, any shape
    pub hardware_ids: RawValue,
    /// Raw INF payload, any shape
    pub inf: RawValue,
    /// Device Manager problem code
    pub config_error_code: Option<u32>,
}

impl InstalledEntry {
    /// Build from a raw record. Returns `None` for non-map values.
    pub fn from_raw(raw: &RawValue) -> Option<Self> {
        raw.as_map()?;
        Some(Self {
            name: raw.text_field(INSTALLED_NAME).unwrap_or_default(),
            version: raw.text_field(INSTALLED_VERSION),
            device_class: raw.text_field(INSTALLED_CLASS),
            manufacturer: raw.text_field(INSTALLED_MANUFACTURER),
            hardware_ids: raw.owned_field(INSTALLED_HARDWARE_IDS),
            inf: raw.owned_field(INSTALLED_INF),
            config_error_code: raw.field(INSTALLED_ERROR_CODE).and_then(RawValue::as_u32),
        })
    }

    /// A bare entry with only name, version and class set.
    pub fn named(name: &str, version: Option<&str>, device_class: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(str::to_string),
            device_class: device_class.map(str::to_string),
            manufacturer: None,
            hardware_ids: RawValue::Null,
            inf: RawValue::Null,
            config_error_code: None,
        }
    }

    pub fn identifiers(&self) -> IdentifierSet {
        IdentifierSet::from_raw(&self.hardware_ids, &self.inf)
    }

    /// Whether Device Manager reports this device as having no driver.
    pub fn missing_driver(&self) -> bool {
        self.config_error_code == Some(CM_PROB_FAILED_INSTALL)
    }
}

/// Catalog items from a JSON array/object, skipping non-object entries.
pub fn catalog_from_json(source: CatalogSource, doc: serde_json::Value) -> Vec<CatalogItem> {
    records_from_json(doc)
        .iter()
        .filter_map(|raw| CatalogItem::from_raw(source, raw))
        .collect()
}

/// Installed entries from a JSON array/object, skipping non-object entries.
pub fn inventory_from_json(doc: serde_json::Value) -> Vec<InstalledEntry> {
    records_from_json(doc)
        .iter()
        .filter_map(InstalledEntry::from_raw)
        .collect()
}

/// Recommendation list out of an HPIA report document.
///
/// Looks at `HPIA.Recommendations`, then `Recommendations`, then treats the
/// document itself as the list.
pub fn report_recommendations(doc: serde_json::Value) -> Vec<RawValue> {
    let list = match doc {
        serde_json::Value::Object(mut map) => {
            let nested = map
                .get_mut("HPIA")
                .and_then(|h| h.get_mut("Recommendations"))
                .map(serde_json::Value::take)
                .filter(|v| !v.is_null());
            let found = nested.or_else(|| map.remove("Recommendations").filter(|v| !v.is_null()));
            found.unwrap_or(serde_json::Value::Object(map))
        }
        other => other,
    };
    records_from_json(list)
}

/// Load an HPIA report from a JSON file, or from the newest `*.json` inside a
/// report folder. A folder without reports yields an empty list.
pub fn load_report(path: &Path) -> Result<Vec<CatalogItem>> {
    let file = if path.is_dir() {
        match newest_json_in(path)? {
            Some(file) => file,
            None => return Ok(Vec::new()),
        }
    } else {
        path.to_path_buf()
    };
    let doc = read_json(&file)?;
    Ok(report_recommendations(doc)
        .iter()
        .filter_map(|raw| CatalogItem::from_raw(CatalogSource::Report, raw))
        .collect())
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(content.trim_start_matches('\u{feff}'))?)
}

fn newest_json_in(dir: &Path) -> Result<Option<PathBuf>> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json || !path.is_file() {
            continue;
        }
        let modified = std::fs::metadata(&path)?.modified()?;
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, p)| p))
}

/// Attach enrichment metadata (keyed by package id) as each record's `Meta`.
pub fn attach_metadata(records: &mut [serde_json::Value], metadata: &HashMap<String, serde_json::Value>) {
    for record in records.iter_mut() {
        let id = RawValue::from(record.clone()).text_field(CATALOG_PACKAGE_ID);
        let Some(meta) = id.and_then(|id| metadata.get(&id)) else { continue };
        if let Some(map) = record.as_object_mut() {
            map.insert(META_KEY.to_string(), meta.clone());
        }
    }
}

/// Union of top-level keys across records, sorted.
pub fn record_keys(records: &[RawValue]) -> Vec<String> {
    let keys: BTreeSet<&str> = records.iter().flat_map(|r| r.keys()).collect();
    keys.into_iter().map(str::to_string).collect()
}

/// Union of `Meta` keys across records, sorted.
pub fn meta_keys(records: &[RawValue]) -> Vec<String> {
    let keys: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.as_map()?.get(META_KEY))
        .flat_map(|m| m.keys())
        .collect();
    keys.into_iter().map(str::to_string).collect()
}
