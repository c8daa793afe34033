// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Local legacy driver repository for models the vendor tools no longer
//! cover.
//!
//! Layout: one folder per model or platform ID under the root, each with a
//! `manifest.json` array of `{Name, Category, Version, File|Path|FileName,
//! SoftPaqId}` entries next to the package files.
//!
//! ```text
//! legacy/
//! ├── 18E4/                    # platform ID
//! │   ├── manifest.json
//! │   └── sp81234.exe
//! └── EliteDesk 800 G1 SFF/    # model
//!     └── manifest.json
//! ```

use crate::catalog::{read_json, CatalogItem, CatalogSource};
use crate::normalize::normalize_name;
use crate::value::RawValue;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
const DEFAULT_NAME: &str = "Legacy Driver";

/// Platform-ID folder name equal to the platform ID.
pub const PLATFORM_EXACT: u32 = 100;
/// Folder name contains the platform ID.
pub const PLATFORM_CONTAINS: u32 = 60;
/// Folder name equal to a model variant.
pub const MODEL_EXACT: u32 = 80;
/// Folder name contains a model variant.
pub const MODEL_CONTAINS: u32 = 50;
/// Per token shared between folder name and a model variant.
pub const MODEL_TOKEN: u32 = 5;

/// Folder chosen for this device and the packages it lists.
#[derive(Debug, Clone)]
pub struct LegacySelection {
    pub folder: PathBuf,
    pub items: Vec<CatalogItem>,
    /// Set when the folder was picked by scoring rather than direct lookup
    pub detail: Option<String>,
    /// Several folders scored the same as the chosen one
    pub ambiguous: bool,
}

/// Model name with the vendor prefix removed.
fn strip_vendor(model: &str) -> String {
    model.replace("HP ", "").replace("Hewlett-Packard ", "")
}

/// Score a folder name against the device's platform ID and model.
pub fn score_folder(folder_name: &str, platform_id: Option<&str>, model: Option<&str>) -> u32 {
    let folder = normalize_name(folder_name);
    let folder_tokens: HashSet<&str> = folder.split_whitespace().collect();
    let mut score = 0;

    if let Some(pid) = platform_id.map(normalize_name).filter(|p| !p.is_empty()) {
        if folder == pid {
            score += PLATFORM_EXACT;
        } else if folder.contains(&pid) {
            score += PLATFORM_CONTAINS;
        }
    }

    let variants = model.map(|m| [m.to_string(), strip_vendor(m)]);
    for variant in variants.iter().flatten() {
        let model_norm = normalize_name(variant);
        if model_norm.is_empty() {
            continue;
        }
        if folder == model_norm {
            score += MODEL_EXACT;
        } else if folder.contains(&model_norm) {
            score += MODEL_CONTAINS;
        }
        let shared = model_norm
            .split_whitespace()
            .collect::<HashSet<_>>()
            .intersection(&folder_tokens)
            .count() as u32;
        score += shared * MODEL_TOKEN;
    }
    score
}

/// Catalog items from a folder's manifest. Entries without a package file
/// are skipped; a missing or unreadable manifest yields nothing.
pub fn load_manifest(folder: &Path) -> Vec<CatalogItem> {
    let manifest = folder.join(MANIFEST_FILE);
    if !manifest.is_file() {
        return Vec::new();
    }
    let doc = match read_json(&manifest) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("skipping {}: {}", manifest.display(), e);
            return Vec::new();
        }
    };
    let serde_json::Value::Array(entries) = doc else {
        log::warn!("skipping {}: not a JSON array", manifest.display());
        return Vec::new();
    };

    entries
        .into_iter()
        .map(RawValue::from)
        .filter_map(|raw| {
            let file = raw.text_field(&["File", "Path", "FileName"])?;
            let mut item = CatalogItem::from_raw(CatalogSource::Legacy, &raw)?;
            if item.name.is_empty() {
                item.name = DEFAULT_NAME.to_string();
            }
            item.package_path = Some(folder.join(file));
            Some(item)
        })
        .collect()
}

/// Legacy driver repository rooted at one folder.
#[derive(Debug, Clone)]
pub struct LegacyRepository {
    root: PathBuf,
}

impl LegacyRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Packages for this device: direct lookup by platform ID, model, and
    /// model without vendor prefix; then the best-scoring folder with a
    /// manifest. `None` when no folder yields any package.
    pub fn select(&self, platform_id: Option<&str>, model: Option<&str>) -> Option<LegacySelection> {
        let mut direct: Vec<String> = Vec::new();
        direct.extend(platform_id.map(str::to_string));
        if let Some(model) = model {
            direct.push(model.to_string());
            direct.push(strip_vendor(model));
        }
        for name in direct.iter().filter(|n| !n.trim().is_empty()) {
            let folder = self.root.join(name);
            let items = load_manifest(&folder);
            if !items.is_empty() {
                log::info!("legacy repository: {} packages in {}", items.len(), folder.display());
                return Some(LegacySelection {
                    folder,
                    items,
                    detail: None,
                    ambiguous: false,
                });
            }
        }

        let subdirs = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_dir())
                .collect::<Vec<_>>(),
            Err(e) => {
                log::warn!("cannot read legacy repository {}: {}", self.root.display(), e);
                return None;
            }
        };

        let mut scored: Vec<(u32, String, PathBuf, Vec<CatalogItem>)> = subdirs
            .into_iter()
            .filter_map(|dir| {
                let items = load_manifest(&dir);
                if items.is_empty() {
                    return None;
                }
                let name = dir.file_name()?.to_string_lossy().into_owned();
                let score = score_folder(&name, platform_id, model);
                Some((score, name, dir, items))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.to_lowercase().cmp(&a.1.to_lowercase()))
        });

        let ambiguous = scored.len() > 1 && scored[0].0 == scored[1].0;
        let (_, name, folder, items) = scored.into_iter().next()?;
        let detail = if ambiguous {
            format!(
                "Multiple legacy manifest folders matched equally; using '{}'. Consider creating a platform ID folder.",
                name
            )
        } else {
            format!("Legacy repo fallback selected '{}'.", name)
        };
        Some(LegacySelection {
            folder,
            items,
            detail: Some(detail),
            ambiguous,
        })
    }
}
