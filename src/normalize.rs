// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Name canonicalization and identifier extraction.
//!
//! Every comparison between a vendor catalog entry and an installed device
//! goes through the normalized name produced here, and every identifier-level
//! match goes through [`IdentifierSet`].

use crate::value::RawValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Bus-specific hardware-ID patterns. Each match is the canonical
/// vendor/device prefix only; `&SUBSYS_..`, `&REV_..` qualifiers and the
/// `\<instance>` path that follow it in a full device ID are not part of the
/// token.
const HARDWARE_ID_PATTERNS: &[&str] = &[
    r"(?i)PCI\\VEN_[0-9A-F]{4}&DEV_[0-9A-F]{4}",
    r"(?i)USB\\VID_[0-9A-F]{4}&PID_[0-9A-F]{4}",
    r"(?i)HDAUDIO\\FUNC_[0-9A-F]{2}(?:&VEN_[0-9A-F]{4}&DEV_[0-9A-F]{4})?",
];

static COMPILED_HARDWARE_IDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HARDWARE_ID_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("hardware ID pattern"))
        .collect()
});

static INF_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9_\-]+\.inf)\b").expect("INF name pattern"));

static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("separator pattern"));

/// Canonical form used for all name and category comparisons.
///
/// Lower-cases, folds `wi-fi`/`wi fi` to `wifi`, collapses each run of
/// non-alphanumeric characters to one space and trims.
pub fn normalize_name(value: &str) -> String {
    let text = value
        .to_lowercase()
        .replace("wi-fi", "wifi")
        .replace("wi fi", "wifi");
    NON_ALNUM_RUN.replace_all(&text, " ").trim().to_string()
}

/// Extract canonical uppercased PCI/USB/HDAUDIO hardware IDs from any
/// payload shape.
pub fn extract_hardware_ids(value: &RawValue) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for text in value.leaf_strings() {
        for re in COMPILED_HARDWARE_IDS.iter() {
            ids.extend(re.find_iter(&text).map(|m| m.as_str().to_uppercase()));
        }
    }
    ids
}

/// Extract lower-cased `*.inf` file names from any payload shape.
pub fn extract_inf_names(value: &RawValue) -> BTreeSet<String> {
    let mut infs = BTreeSet::new();
    for text in value.leaf_strings() {
        let lower = text.to_lowercase();
        infs.extend(INF_NAME.find_iter(&lower).map(|m| m.as_str().to_string()));
    }
    infs
}

/// Canonical hardware-ID and INF tokens derived from one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSet {
    pub hardware_ids: BTreeSet<String>,
    pub inf_names: BTreeSet<String>,
}

impl IdentifierSet {
    pub fn from_raw(hardware_ids: &RawValue, inf_refs: &RawValue) -> Self {
        Self {
            hardware_ids: extract_hardware_ids(hardware_ids),
            inf_names: extract_inf_names(inf_refs),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hardware_ids.is_empty() && self.inf_names.is_empty()
    }

    /// First hardware ID present in both sets.
    pub fn shared_hardware_id<'s>(&'s self, other: &'s IdentifierSet) -> Option<&'s str> {
        self.hardware_ids
            .intersection(&other.hardware_ids)
            .next()
            .map(String::as_str)
    }

    /// First INF name present in both sets.
    pub fn shared_inf<'s>(&'s self, other: &'s IdentifierSet) -> Option<&'s str> {
        self.inf_names
            .intersection(&other.inf_names)
            .next()
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_wifi_variants_agree() {
        assert_eq!(normalize_name("Wi-Fi 6E AX211"), normalize_name("WIFI 6E AX211!!"));
        assert_eq!(normalize_name("Wi-Fi 6E AX211"), "wifi 6e ax211");
        assert_eq!(normalize_name("wi fi driver"), "wifi driver");
    }

    #[test]
    fn test_normalize_collapses_punctuation() {
        assert_eq!(normalize_name("  Intel(R) Serial IO -- I2C  "), "intel r serial io i2c");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("***"), "");
    }

    #[test]
    fn test_extract_hardware_ids_any_depth_uppercased() {
        let payload = RawValue::from(json!({
            "Devices": [
                {"Id": "see pci\\ven_8086&dev_a0f0 for details"},
                ["USB\\VID_8087&PID_0026;HDAUDIO\\FUNC_01&VEN_10EC&DEV_0236"]
            ],
            "Other": "PCI\\VEN_8086&DEV_A0F0"
        }));
        let ids = extract_hardware_ids(&payload);
        let expected: BTreeSet<String> = [
            "PCI\\VEN_8086&DEV_A0F0",
            "USB\\VID_8087&PID_0026",
            "HDAUDIO\\FUNC_01&VEN_10EC&DEV_0236",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_extract_hardware_ids_drops_qualifiers() {
        let ids = extract_hardware_ids(&RawValue::from(
            "PCI\\VEN_10EC&DEV_8168&SUBSYS_84321043&REV_15 PCI\\VEN_10EC&DEV_8168",
        ));
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("PCI\\VEN_10EC&DEV_8168"));
    }

    #[test]
    fn test_extract_hardware_ids_from_instance_path() {
        let ids = extract_hardware_ids(&RawValue::from(
            "PCI\\VEN_8086&DEV_1234&SUBSYS_00011028&REV_01\\3&11583659&0&10",
        ));
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["PCI\\VEN_8086&DEV_1234"]);

        let audio = extract_hardware_ids(&RawValue::from(
            "HDAUDIO\\FUNC_01&VEN_10EC&DEV_0236&SUBSYS_103C8724&REV_1000\\4&2A1B3C&0&0001",
        ));
        assert!(audio.contains("HDAUDIO\\FUNC_01&VEN_10EC&DEV_0236"));
        assert_eq!(audio.len(), 1);
    }

    #[test]
    fn test_hardware_id_patterns_all_compile() {
        assert_eq!(COMPILED_HARDWARE_IDS.len(), HARDWARE_ID_PATTERNS.len());
    }

    #[test]
    fn test_extract_hardware_ids_rejects_short_codes() {
        assert!(extract_hardware_ids(&RawValue::from("PCI\\VEN_80&DEV_12")).is_empty());
        assert!(extract_hardware_ids(&RawValue::Null).is_empty());
    }

    #[test]
    fn test_extract_inf_names() {
        let payload = RawValue::from(json!(["Installs Netwtw10.INF and", {"x": "iaStorVD.inf"}]));
        let infs = extract_inf_names(&payload);
        assert!(infs.contains("netwtw10.inf"));
        assert!(infs.contains("iastorvd.inf"));
        assert_eq!(infs.len(), 2);
    }

    #[test]
    fn test_identifier_set_overlap() {
        let a = IdentifierSet::from_raw(
            &RawValue::from("PCI\\VEN_8086&DEV_1234"),
            &RawValue::from("oem12.inf"),
        );
        let b = IdentifierSet::from_raw(
            &RawValue::from(json!(["PCI\\VEN_8086&DEV_1234", "PCI\\VEN_8086&DEV_9999"])),
            &RawValue::Null,
        );
        assert_eq!(a.shared_hardware_id(&b), Some("PCI\\VEN_8086&DEV_1234"));
        assert_eq!(a.shared_inf(&b), None);
        assert!(!a.is_empty());
        assert!(IdentifierSet::default().is_empty());
    }
}
