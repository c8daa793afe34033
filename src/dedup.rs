// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Merging of overlapping catalog sources.
//!
//! The analysis report and the package list describe the same machine by
//! different means. Package-list items already covered by the report are
//! dropped, and package-list items that normalize to the same name collapse to
//! the one with the highest available version.

use crate::catalog::CatalogItem;
use crate::version::VersionTuple;
use std::collections::{HashMap, HashSet};

/// Package ids and normalized names covered by the structured report.
#[derive(Debug, Clone, Default)]
pub struct CoverageSet {
    package_ids: HashSet<String>,
    names: HashSet<String>,
}

impl CoverageSet {
    pub fn from_items(items: &[CatalogItem]) -> Self {
        let mut coverage = Self::default();
        for item in items {
            if let Some(id) = item.package_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
                coverage.package_ids.insert(id.to_lowercase());
            }
            let name = item.normalized_name();
            if !name.is_empty() {
                coverage.names.insert(name);
            }
        }
        coverage
    }

    pub fn is_empty(&self) -> bool {
        self.package_ids.is_empty() && self.names.is_empty()
    }

    pub fn covers(&self, item: &CatalogItem) -> bool {
        let by_id = item
            .package_id
            .as_deref()
            .is_some_and(|id| self.package_ids.contains(&id.trim().to_lowercase()));
        by_id || self.names.contains(&item.normalized_name())
    }
}

/// Drop items whose package id or normalized name is already covered.
pub fn drop_covered(items: Vec<CatalogItem>, coverage: &CoverageSet) -> Vec<CatalogItem> {
    if coverage.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| !coverage.covers(item)).collect()
}

/// Collapse items sharing a normalized name to the highest available version.
///
/// A missing or unparseable version loses to any parsed one; equal versions
/// keep the earlier item. Survivors stay at the position their name was first
/// seen. Items with an empty normalized name are never merged.
pub fn dedupe_latest(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    let mut slots: Vec<(Option<VersionTuple>, CatalogItem)> = Vec::with_capacity(items.len());
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for item in items {
        let version = item.version.as_deref().and_then(VersionTuple::parse);
        let name = item.normalized_name();
        if name.is_empty() {
            slots.push((version, item));
            continue;
        }
        match by_name.get(&name) {
            Some(&index) => {
                if version > slots[index].0 {
                    slots[index] = (version, item);
                }
            }
            None => {
                by_name.insert(name, slots.len());
                slots.push((version, item));
            }
        }
    }

    slots.into_iter().map(|(_, item)| item).collect()
}
