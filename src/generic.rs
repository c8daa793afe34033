// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! OS-generic placeholder devices that must never satisfy a catalog item.

use crate::normalize::normalize_name;
use regex::Regex;
use std::sync::LazyLock;

/// `(needle in normalized installed name, catalog-name pattern that lifts the exclusion)`
///
/// A `None` exemption means the installed entry is always excluded.
const GENERIC_RULES: &[(&str, Option<&str>)] = &[
    ("microsoft", Some(r"microsoft")),
    ("wan miniport", None),
    ("system management bios driver", Some(r"bios|firmware")),
    ("storage spaces controller", None),
    ("basic display adapter", Some(r"display")),
    ("display audio", Some(r"\baudio\b")),
    ("u03 system firmware", Some(r"\bfirmware\b|\bbios\b")),
];

static COMPILED_RULES: LazyLock<Vec<(&'static str, Option<Regex>)>> = LazyLock::new(|| {
    GENERIC_RULES
        .iter()
        .map(|(needle, exempt)| {
            let exempt = exempt.map(|p| Regex::new(p).expect("generic exemption pattern"));
            (*needle, exempt)
        })
        .collect()
});

/// Whether `installed_name` is a generic placeholder when compared against
/// the catalog item named `catalog_name`.
pub fn is_generic_installed(installed_name: &str, catalog_name: &str) -> bool {
    let installed = normalize_name(installed_name);
    let catalog = normalize_name(catalog_name);
    is_generic_normalized(&installed, &catalog)
}

/// [`is_generic_installed`] over already-normalized names.
pub fn is_generic_normalized(installed: &str, catalog: &str) -> bool {
    COMPILED_RULES.iter().any(|(needle, exempt)| {
        installed.contains(needle)
            && !exempt.as_ref().is_some_and(|re| re.is_match(catalog))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_rules_table() {
        let cases = [
            ("Microsoft Basic Display Adapter", "NVIDIA Graphics Driver", true),
            ("Microsoft Bluetooth Enumerator", "Microsoft Surface Firmware", false),
            ("WAN Miniport (IKEv2)", "Intel Ethernet Driver", true),
            ("System Management BIOS Driver", "Intel Chipset Driver", true),
            ("System Management BIOS Driver", "HP System BIOS", false),
            ("Storage Spaces Controller", "Storage Spaces Controller", true),
            ("Basic Display Adapter", "Display Driver", false),
            ("Intel(R) Display Audio", "Intel Graphics Driver", true),
            ("Intel(R) Display Audio", "Intel Display Audio Driver", false),
            ("U03 System Firmware", "Intel Chipset Driver", true),
            ("U03 System Firmware", "HP System Firmware", false),
            ("Realtek Audio", "Realtek Audio Driver", false),
        ];
        for (installed, catalog, expected) in cases {
            assert_eq!(
                is_generic_installed(installed, catalog),
                expected,
                "{} vs {}",
                installed,
                catalog
            );
        }
    }

    #[test]
    fn test_audio_exemption_is_word_bounded() {
        assert!(is_generic_installed("NVIDIA Display Audio", "NVIDIA Audiophile Pack"));
    }

    #[test]
    fn test_rule_table_compiles() {
        assert_eq!(COMPILED_RULES.len(), GENERIC_RULES.len());
    }
}
