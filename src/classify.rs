// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Device-class and vocabulary inference from catalog text.
//!
//! All vocabularies are static ordered tables of `(pattern, tags)` rows so the
//! rules can be extended and tested row by row. Patterns are compiled once.

use crate::normalize::normalize_name;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Windows device setup class as reported by `Win32_PnPSignedDriver.Class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceClass {
    Display,
    Media,
    Net,
    Bluetooth,
    ScsiAdapter,
    Hdc,
    DiskDrive,
    System,
    Firmware,
}

impl DeviceClass {
    /// Lower-case setup class name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Display => "display",
            DeviceClass::Media => "media",
            DeviceClass::Net => "net",
            DeviceClass::Bluetooth => "bluetooth",
            DeviceClass::ScsiAdapter => "scsiadapter",
            DeviceClass::Hdc => "hdc",
            DeviceClass::DiskDrive => "diskdrive",
            DeviceClass::System => "system",
            DeviceClass::Firmware => "firmware",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device classes a catalog item is expected to bind to. Empty means no
/// class gating applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedClasses(BTreeSet<DeviceClass>);

impl ExpectedClasses {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, class: DeviceClass) -> bool {
        self.0.contains(&class)
    }

    /// Whether an installed entry's free-text class is acceptable. An empty
    /// expectation or an empty installed class always admits.
    pub fn admits(&self, installed_class: &str) -> bool {
        let class = installed_class.trim().to_lowercase();
        self.0.is_empty() || class.is_empty() || self.0.iter().any(|c| c.as_str() == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = DeviceClass> + '_ {
        self.0.iter().copied()
    }
}

const STORAGE_CLASSES: &[DeviceClass] =
    &[DeviceClass::ScsiAdapter, DeviceClass::Hdc, DeviceClass::DiskDrive];

/// `(pattern over normalized name, pattern over lower-cased category, classes)`
const CLASS_RULES: &[(&str, &str, &[DeviceClass])] = &[
    (r"graphics|video|display", r"graphics|display", &[DeviceClass::Display]),
    (r"audio|sound|realtek", r"audio", &[DeviceClass::Media]),
    (r"wireless|wlan|wifi|ethernet|network|bluetooth", r"network", &[DeviceClass::Net]),
    (r"bluetooth", r"bluetooth", &[DeviceClass::Bluetooth, DeviceClass::Net]),
    (r"storage|raid|rst|rapid|ssd|nvme", r"storage", STORAGE_CLASSES),
    (r"chipset|serial|management engine|me driver|platform", r"chipset", &[DeviceClass::System]),
    (r"firmware|bios", r"bios|firmware", &[DeviceClass::Firmware, DeviceClass::System]),
];

/// `(pattern over lower-cased raw name, terms scored against installed names)`
const SEARCH_TERM_RULES: &[(&str, &[&str])] = &[
    (r"intel", &["intel"]),
    (r"realtek", &["realtek"]),
    (r"nvidia", &["nvidia"]),
    (r"amd", &["amd"]),
    (r"bluetooth", &["bluetooth"]),
    (r"wireless|wlan|wifi|wi-fi", &["wireless", "wlan", "wifi"]),
    (r"graphics|video|display", &["graphics", "video", "display"]),
    (r"audio|sound", &["audio", "sound"]),
    (r"ethernet|nic|network", &["ethernet", "network"]),
    (r"chipset", &["chipset"]),
    (r"storage|raid|rst|rapid", &["storage", "rapid", "rst"]),
    (r"bios", &["bios"]),
    (r"firmware", &["firmware"]),
    (r"management engine|me driver", &["management engine"]),
    (r"thunderbolt", &["thunderbolt"]),
    (r"serial io|serialio", &["serial"]),
    (r"arc|a380|a770", &["arc"]),
    (r"usb 3", &["usb 3"]),
];

/// Display buckets for package-list categories, first match wins.
const BUCKET_RULES: &[(&str, DriverCategory)] = &[
    (r"bios|firmware|uefi", DriverCategory::BiosFirmware),
    (r"audio|sound", DriverCategory::Audio),
    (r"video|graphics|display", DriverCategory::Video),
    (r"network|ethernet|lan", DriverCategory::Network),
    (r"wireless|wifi|wlan|bluetooth", DriverCategory::Network),
    (r"storage|sata|raid|rst|nvme", DriverCategory::Storage),
    (r"chipset|serial|usb", DriverCategory::Chipset),
    (r"input|keyboard|touchpad|mouse", DriverCategory::Input),
    (r"security|tpm", DriverCategory::Security),
    (r"software|utility|management", DriverCategory::Software),
];

struct ClassRule {
    name: Regex,
    category: Regex,
    classes: &'static [DeviceClass],
}

static COMPILED_CLASS_RULES: LazyLock<Vec<ClassRule>> = LazyLock::new(|| {
    CLASS_RULES
        .iter()
        .map(|(name, category, classes)| ClassRule {
            name: Regex::new(name).expect("class rule name pattern"),
            category: Regex::new(category).expect("class rule category pattern"),
            classes: *classes,
        })
        .collect()
});

static COMPILED_SEARCH_TERMS: LazyLock<Vec<(Regex, &'static [&'static str])>> =
    LazyLock::new(|| {
        SEARCH_TERM_RULES
            .iter()
            .map(|(pattern, terms)| (Regex::new(pattern).expect("search term pattern"), *terms))
            .collect()
    });

static COMPILED_BUCKETS: LazyLock<Vec<(Regex, DriverCategory)>> = LazyLock::new(|| {
    BUCKET_RULES
        .iter()
        .map(|(pattern, bucket)| (Regex::new(pattern).expect("bucket pattern"), *bucket))
        .collect()
});

static DRIVER_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbios\b|\bfirmware\b|driver").expect("driver item pattern"));

/// Expected device classes for a catalog item's name and category.
pub fn expected_classes(name: &str, category: &str) -> ExpectedClasses {
    let name = normalize_name(name);
    let category = category.to_lowercase();
    let mut classes = BTreeSet::new();
    for rule in COMPILED_CLASS_RULES.iter() {
        if rule.name.is_match(&name) || rule.category.is_match(&category) {
            classes.extend(rule.classes.iter().copied());
        }
    }
    ExpectedClasses(classes)
}

/// Vendor and functional terms derived from a catalog name, in table order.
/// Each term present in an installed name contributes one point.
pub fn search_terms(name: &str) -> Vec<&'static str> {
    let lower = name.to_lowercase();
    COMPILED_SEARCH_TERMS
        .iter()
        .filter(|(re, _)| re.is_match(&lower))
        .flat_map(|(_, terms)| terms.iter().copied())
        .collect()
}

/// Display bucket for a package-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverCategory {
    #[serde(rename = "BIOS/Firmware")]
    BiosFirmware,
    Audio,
    Video,
    Network,
    Storage,
    Chipset,
    Input,
    Security,
    Software,
    Other,
}

impl DriverCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DriverCategory::BiosFirmware => "BIOS/Firmware",
            DriverCategory::Audio => "Audio",
            DriverCategory::Video => "Video",
            DriverCategory::Network => "Network",
            DriverCategory::Storage => "Storage",
            DriverCategory::Chipset => "Chipset",
            DriverCategory::Input => "Input",
            DriverCategory::Security => "Security",
            DriverCategory::Software => "Software",
            DriverCategory::Other => "Other",
        }
    }
}

impl fmt::Display for DriverCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a category/name pair for display.
pub fn categorize(category: &str, name: &str) -> DriverCategory {
    let raw = format!("{} {}", category, name).to_lowercase();
    COMPILED_BUCKETS
        .iter()
        .find(|(re, _)| re.is_match(&raw))
        .map(|(_, bucket)| *bucket)
        .unwrap_or(DriverCategory::Other)
}

/// Whether a package-list entry describes a driver, BIOS or firmware package
/// rather than a utility or application.
pub fn is_driver_item(category: &str, name: &str) -> bool {
    let text = format!("{} {}", category, name).to_lowercase();
    DRIVER_ITEM.is_match(&text)
}

/// Whether a catalog item describes BIOS or system firmware.
pub fn is_bios_item(category: &str, name: &str) -> bool {
    category.to_lowercase().contains("bios") || normalize_name(name).split(' ').any(|w| w == "bios")
}
