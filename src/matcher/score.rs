// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Scoring constants and the additive name score.

use crate::classify::search_terms;
use crate::normalize::normalize_name;
use regex::Regex;
use std::sync::LazyLock;

/// Score of a hardware-ID overlap
pub const HWID_SCORE: u32 = 100;
/// Score of an INF-name overlap
pub const INF_SCORE: u32 = 80;
/// Bonus when the normalized catalog name appears inside the installed name
pub const CONTAINMENT_BONUS: u32 = 3;
/// Bonus per category family shared by the catalog category and installed name
pub const CATEGORY_BONUS: u32 = 2;

/// `(pattern over lower-cased catalog category, pattern over normalized installed name)`
const CATEGORY_FAMILIES: &[(&str, &str)] = &[
    (r"graphics", r"graphics|display|video"),
    (r"audio", r"audio|sound|realtek"),
    (r"network", r"network|ethernet|wireless|wifi|bluetooth"),
    (r"chipset", r"chipset|serial|management|usb"),
    (r"storage", r"storage|rapid|rst|raid|optane"),
    (r"bios|firmware", r"bios|firmware"),
];

static COMPILED_FAMILIES: LazyLock<Vec<(Regex, Regex)>> = LazyLock::new(|| {
    CATEGORY_FAMILIES
        .iter()
        .map(|(cat, inst)| {
            (
                Regex::new(cat).expect("category family pattern"),
                Regex::new(inst).expect("installed family pattern"),
            )
        })
        .collect()
});

/// Manageability-engine software that shares vendor terms with wireless
/// adapters but is never one.
static MANAGEABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bmanageability\b|\bmanagement engine\b").expect("manageability pattern")
});

static WIRELESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(wlan|wifi|wireless)\b").expect("wireless pattern"));


/// Additive name score of an installed entry (already normalized) against a
/// catalog name and category.
pub fn name_score(catalog_name: &str, catalog_category: &str, installed_norm: &str) -> u32 {
    let catalog_norm = normalize_name(catalog_name);
    if catalog_norm.is_empty() || installed_norm.is_empty() {
        return 0;
    }

    if MANAGEABILITY.is_match(installed_norm)
        && !MANAGEABILITY.is_match(&catalog_norm)
        && WIRELESS.is_match(&catalog_norm)
    {
        return 0;
    }

    let mut score = search_terms(catalog_name)
        .iter()
        .filter(|term| installed_norm.contains(*term))
        .count() as u32;

    let category = catalog_category.to_lowercase();
    if !category.is_empty() {
        score += COMPILED_FAMILIES
            .iter()
            .filter(|(cat, inst)| cat.is_match(&category) && inst.is_match(installed_norm))
            .count() as u32
            * CATEGORY_BONUS;
    }

    if installed_norm.contains(&catalog_norm) {
        score += CONTAINMENT_BONUS;
    }
    score
}
