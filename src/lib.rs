// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! # Fleet Remedy
//!
//! Driver and firmware reconciliation for Windows endpoints.
//!
//! Vendor catalogs (the HP Image Assistant analysis report, the HPCMSL
//! package list, a local legacy repository) are matched against the
//! installed device inventory, and each recommendation is classified as
//! critical, recommended, update available, optional, up to date or
//! installed.
//!
//! ## Matching
//!
//! Catalogs and inventories rarely share a key. Each catalog item is matched
//! by hardware-ID overlap, then INF-name overlap, then a gated name score; see
//! [`matcher`]. OS placeholder devices (`Microsoft Basic Display Adapter`,
//! WAN miniports, ...) never match.
//!
//! ## Example
//!
//! ```
//! use remedylib::catalog::{CatalogItem, CatalogSource, InstalledEntry};
//! use remedylib::reconcile::{Reconciler, ScanSources};
//! use remedylib::{DriverStatus, MatchPolicy};
//!
//! let mut gpu = CatalogItem::named(CatalogSource::PackageList, "Intel Graphics Driver", "Driver - Graphics", Some("31.0.101.5186"));
//! gpu.hardware_ids = "PCI\\VEN_8086&DEV_9A49".into();
//! let mut installed = InstalledEntry::named("Intel(R) UHD Graphics", Some("31.0.101.4502"), Some("Display"));
//! installed.hardware_ids = "PCI\\VEN_8086&DEV_9A49&SUBSYS_880D103C PCI\\VEN_8086&DEV_9A49".into();
//!
//! let sources = ScanSources {
//!     host: "pc-01".into(),
//!     package_list: vec![gpu],
//!     inventory: vec![installed],
//!     ..ScanSources::default()
//! };
//! let report = Reconciler::new(MatchPolicy::default()).scan(&sources);
//! assert_eq!(report.records[0].status, DriverStatus::UpdateAvailable);
//! ```

pub mod catalog;
pub mod classify;
pub mod collect;
pub mod config;
pub mod dedup;
pub mod error;
pub mod generic;
pub mod legacy;
pub mod matcher;
pub mod normalize;
pub mod reconcile;
pub mod status;
pub mod value;
pub mod version;

pub use catalog::{CatalogItem, CatalogSource, InstalledEntry};
pub use config::RemedyConfig;
pub use error::{RemedyError, Result};
pub use matcher::{match_catalog_item, Inventory, MatchPolicy, MatchReason, MatchResult};
pub use reconcile::{ReconciliationRecord, Reconciler, ScanReport, ScanSources};
pub use status::{DriverStatus, Urgency};
pub use value::RawValue;
pub use version::{compare_versions, VersionStatus, VersionTuple};
