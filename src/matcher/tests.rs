// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

use super::*;
use crate::catalog::CatalogSource;
use crate::value::RawValue;
use serde_json::json;

fn catalog(name: &str, category: &str) -> CatalogItem {
    CatalogItem::named(CatalogSource::PackageList, name, category, Some("1.0"))
}

fn installed(name: &str, class: &str) -> InstalledEntry {
    InstalledEntry::named(name, Some("1.0"), Some(class))
}

fn lenient() -> MatchPolicy {
    MatchPolicy {
        min_name_score: 2,
        allow_name_fallback: true,
    }
}

#[test]
fn test_hardware_id_beats_higher_name_score() {
    let mut item = catalog("Intel Graphics Driver", "Driver - Graphics");
    item.hardware_ids = RawValue::from("PCI\\VEN_8086&DEV_1234");

    let by_name = installed("Intel Graphics Driver Intel(R) UHD Graphics Display", "Display");
    let mut by_id = installed("Video Controller", "Display");
    by_id.hardware_ids = RawValue::from(json!(["PCI\\VEN_8086&DEV_1234&SUBSYS_8A5617AA", "PCI\\VEN_8086&DEV_1234"]));

    let entries = vec![by_name, by_id];
    let result = match_catalog_item(&item, &entries, 2, true);
    assert_eq!(result.reason, MatchReason::HardwareId);
    assert_eq!(result.score, HWID_SCORE);
    assert_eq!(result.matched.map(|e| e.name.as_str()), Some("Video Controller"));
    assert_eq!(result.matched_identifier.as_deref(), Some("PCI\\VEN_8086&DEV_1234"));
    assert_eq!(
        result.name_candidate.map(|e| e.name.as_str()),
        Some("Intel Graphics Driver Intel(R) UHD Graphics Display")
    );
    assert!(result.name_candidate_score > 0);
}

#[test]
fn test_inf_match_beats_name_and_ignores_policy() {
    let mut item = catalog("Intel WLAN Driver", "Driver - Network");
    item.inf_refs = RawValue::from("Package installs Netwtw10.inf");

    let mut wlan = installed("Wireless Adapter", "Net");
    wlan.inf = RawValue::from("netwtw10.inf");
    let named = installed("Intel Wireless WLAN WiFi Network", "Net");

    let entries = vec![named, wlan];
    let result = match_catalog_item(&item, &entries, 50, false);
    assert_eq!(result.reason, MatchReason::Inf);
    assert_eq!(result.score, INF_SCORE);
    assert_eq!(result.matched.map(|e| e.name.as_str()), Some("Wireless Adapter"));
}

#[test]
fn test_hardware_id_wins_over_inf() {
    let mut item = catalog("Realtek Audio Driver", "Driver - Audio");
    item.hardware_ids = RawValue::from("HDAUDIO\\FUNC_01&VEN_10EC&DEV_0236");
    item.inf_refs = RawValue::from("hdxhpai.inf");

    let mut inf_only = installed("Audio Device A", "MEDIA");
    inf_only.inf = RawValue::from("hdxhpai.inf");
    let mut both = installed("Audio Device B", "MEDIA");
    both.hardware_ids = RawValue::from("HDAUDIO\\FUNC_01&VEN_10EC&DEV_0236");

    let entries = vec![inf_only, both];
    let result = match_catalog_item(&item, &entries, 2, false);
    assert_eq!(result.reason, MatchReason::HardwareId);
    assert_eq!(result.matched.map(|e| e.name.as_str()), Some("Audio Device B"));
}

#[test]
fn test_manageability_engine_never_matches_wireless() {
    let item = catalog("Intel Wireless-AC 9560", "");
    let entries = vec![installed("Intel(R) Management Engine Interface", "System")];
    let result = match_catalog_item(&item, &entries, 0, true);
    assert!(result.matched.is_none());
    assert_eq!(result.reason, MatchReason::NoMatchNoIdentifiersAvailable);
    assert!(result.name_candidate.is_none());
    assert_eq!(result.name_candidate_score, 0);
}

#[test]
fn test_generic_display_adapter_is_excluded() {
    let item = catalog("NVIDIA Graphics Driver", "");
    let entries = vec![installed("Microsoft Basic Display Adapter", "Display")];
    let result = match_catalog_item(&item, &entries, 0, true);
    assert!(result.matched.is_none());
    assert_eq!(result.reason, MatchReason::NoMatchNoIdentifiersAvailable);
    assert!(result.name_candidate.is_none());
}

#[test]
fn test_generic_entry_excluded_even_with_shared_hardware_id() {
    let mut item = catalog("Intel Ethernet Driver", "Driver - Network");
    item.hardware_ids = RawValue::from("PCI\\VEN_8086&DEV_15FB");
    let mut miniport = installed("WAN Miniport (IP)", "Net");
    miniport.hardware_ids = RawValue::from("PCI\\VEN_8086&DEV_15FB");
    let entries = vec![miniport];
    let result = match_catalog_item(&item, &entries, 2, true);
    assert!(result.matched.is_none());
    assert_eq!(result.reason, MatchReason::NoMatchInsufficientScore);
}

#[test]
fn test_name_match_demoted_without_fallback_keeps_candidate() {
    let item = catalog("Intel Bluetooth Wireless", "");
    let entries = vec![installed("Intel(R) Wireless Bluetooth(R)", "Bluetooth")];

    let strict = match_catalog_item(&item, &entries, 2, false);
    assert!(strict.matched.is_none());
    assert_eq!(strict.reason, MatchReason::NoMatchNoIdentifiersAvailable);
    assert_eq!(strict.score, 0);
    assert_eq!(
        strict.name_candidate.map(|e| e.name.as_str()),
        Some("Intel(R) Wireless Bluetooth(R)")
    );
    assert_eq!(strict.name_candidate_score, 3);

    let fallback = match_catalog_item(&item, &entries, 2, true);
    assert_eq!(fallback.reason, MatchReason::Name);
    assert_eq!(fallback.score, 3);
    assert!(fallback.matched.is_some());
}

#[test]
fn test_name_match_below_minimum_is_rejected() {
    let item = catalog("Intel Bluetooth Wireless", "");
    let entries = vec![installed("Intel(R) Wireless Bluetooth(R)", "Bluetooth")];
    let result = match_catalog_item(&item, &entries, 4, true);
    assert!(result.matched.is_none());
    assert_eq!(result.name_candidate_score, 3);
}

#[test]
fn test_demoted_reason_reflects_catalog_identifiers() {
    let mut item = catalog("Intel Bluetooth Wireless", "");
    item.hardware_ids = RawValue::from("USB\\VID_8087&PID_0026");
    let entries = vec![installed("Intel(R) Wireless Bluetooth(R)", "Bluetooth")];
    let result = match_catalog_item(&item, &entries, 2, false);
    assert_eq!(result.reason, MatchReason::NoMatchInsufficientScore);
}

#[test]
fn test_class_gate_disqualifies_but_candidate_survives() {
    // Expected classes: display. A "System" device sharing terms is gated out.
    let item = catalog("Intel Graphics Driver", "Driver - Graphics");
    let entries = vec![
        installed("Intel Graphics Command Center Service", "System"),
        installed("Intel(R) UHD Graphics", "Display"),
    ];
    let result = match_catalog_item(&item, &entries, 2, true);
    assert_eq!(result.matched.map(|e| e.name.as_str()), Some("Intel(R) UHD Graphics"));
    assert_eq!(
        result.name_candidate.map(|e| e.name.as_str()),
        Some("Intel Graphics Command Center Service")
    );
}

#[test]
fn test_class_gate_ignores_empty_expectation_and_empty_class() {
    let item = catalog("Thunderbolt Controller", "");
    let entries = vec![installed("Thunderbolt Controller - 1137", "System")];
    let result = match_catalog_item(&item, &entries, 2, true);
    assert_eq!(result.reason, MatchReason::Name);

    let gated = catalog("Intel Ethernet Controller", "");
    let unclassified = vec![InstalledEntry::named("Intel(R) Ethernet Connection", Some("12.1"), None)];
    assert_eq!(match_catalog_item(&gated, &unclassified, 2, true).reason, MatchReason::Name);
}

#[test]
fn test_first_entry_wins_ties() {
    let item = catalog("Realtek Audio", "");
    let entries = vec![
        installed("Realtek Audio Console", "MEDIA"),
        installed("Realtek Audio Effects", "MEDIA"),
    ];
    let result = match_catalog_item(&item, &entries, 2, true);
    assert_eq!(result.matched.map(|e| e.name.as_str()), Some("Realtek Audio Console"));
    assert_eq!(result.name_candidate.map(|e| e.name.as_str()), Some("Realtek Audio Console"));
}

#[test]
fn test_empty_inventory_and_empty_catalog() {
    let item = catalog("Intel Chipset", "Driver - Chipset");
    let result = match_catalog_item(&item, &[], 2, true);
    assert!(result.matched.is_none());
    assert_eq!(result.reason, MatchReason::NoMatchNoIdentifiersAvailable);

    let blank = CatalogItem::named(CatalogSource::PackageList, "", "", None);
    let entries = vec![installed("Anything", "System")];
    assert!(match_catalog_item(&blank, &entries, 0, true).matched.is_none());
}

#[test]
fn test_hardware_id_matches_fully_qualified_device_ids() {
    let mut item = catalog("Intel Graphics Driver", "Driver - Graphics");
    item.hardware_ids = RawValue::from("PCI\\VEN_8086&DEV_1234");

    let mut hwid = installed("Video Controller", "Display");
    hwid.hardware_ids = RawValue::from("PCI\\VEN_8086&DEV_1234&SUBSYS_00011028&REV_01");
    let mut instance = installed("Video Controller (VGA)", "Display");
    instance.hardware_ids = RawValue::from("PCI\\VEN_8086&DEV_1234&SUBSYS_00011028&REV_01\\3&11583659&0&10");

    for entry in [hwid, instance] {
        let expected = entry.name.clone();
        let entries = vec![entry];
        let result = match_catalog_item(&item, &entries, 2, false);
        assert_eq!(result.reason, MatchReason::HardwareId);
        assert_eq!(result.matched.map(|e| e.name.as_str()), Some(expected.as_str()));
        assert_eq!(result.matched_identifier.as_deref(), Some("PCI\\VEN_8086&DEV_1234"));
    }
}

#[test]
fn test_inventory_reused_across_items() {
    let entries = vec![
        installed("Realtek High Definition Audio", "MEDIA"),
        installed("Intel(R) Ethernet Connection I219-LM", "Net"),
    ];
    let inventory = Inventory::new(&entries);
    let policy = lenient();
    let audio = inventory.best_match(&catalog("Realtek Audio Driver", "Driver - Audio"), &policy);
    let net = inventory.best_match(&catalog("Intel Ethernet Driver", "Driver - Network"), &policy);
    assert_eq!(audio.matched.map(|e| e.name.as_str()), Some("Realtek High Definition Audio"));
    assert_eq!(net.matched.map(|e| e.name.as_str()), Some("Intel(R) Ethernet Connection I219-LM"));
    assert_eq!(
        inventory.best_match(&catalog("Realtek Audio Driver", "Driver - Audio"), &policy),
        audio
    );
}

#[test]
fn test_reason_serializes_kebab_case() {
    assert_eq!(serde_json::to_string(&MatchReason::HardwareId).unwrap(), "\"hwid\"");
    assert_eq!(
        serde_json::to_string(&MatchReason::NoMatchNoIdentifiersAvailable).unwrap(),
        "\"no-match-no-identifiers-available\""
    );
    assert!(!MatchReason::NoMatchInsufficientScore.is_match());
}
