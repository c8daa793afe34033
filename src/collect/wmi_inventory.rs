// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Native WMI inventory: `Win32_PnPSignedDriver` joined with
//! `Win32_PnPEntity.ConfigManagerErrorCode` on `DeviceID`.

use crate::catalog::InstalledEntry;
use crate::error::{RemedyError, Result};
use crate::value::RawValue;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Win32PnPSignedDriver {
    device_name: Option<String>,
    driver_version: Option<String>,
    manufacturer: Option<String>,
    #[serde(rename = "DeviceID")]
    device_id: Option<String>,
    #[serde(rename = "HardWareID")]
    hardware_id: Option<String>,
    inf_name: Option<String>,
    device_class: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Win32PnPEntity {
    #[serde(rename = "DeviceID")]
    device_id: Option<String>,
    config_manager_error_code: Option<u32>,
}

fn text(value: Option<String>) -> RawValue {
    value.map(RawValue::String).unwrap_or_default()
}

/// Installed PnP drivers read over WMI.
pub fn installed_inventory() -> Result<Vec<InstalledEntry>> {
    let com = wmi::COMLibrary::new()
        .map_err(|e| RemedyError::Other(format!("Failed to initialize COM: {}", e)))?;
    let wmi_con = wmi::WMIConnection::with_namespace_path("root\\CIMV2", com.into())?;

    let entities: Vec<Win32PnPEntity> = wmi_con
        .raw_query("SELECT DeviceID, ConfigManagerErrorCode FROM Win32_PnPEntity")
        .unwrap_or_default();
    let codes: HashMap<String, u32> = entities
        .into_iter()
        .filter_map(|e| Some((e.device_id?, e.config_manager_error_code?)))
        .collect();

    let drivers: Vec<Win32PnPSignedDriver> = wmi_con.raw_query(
        "SELECT DeviceName, DriverVersion, Manufacturer, DeviceID, HardWareID, InfName, DeviceClass FROM Win32_PnPSignedDriver",
    )?;
    log::debug!("WMI returned {} signed drivers, {} PnP entities", drivers.len(), codes.len());

    Ok(drivers
        .into_iter()
        .map(|d| {
            let config_error_code = d.device_id.as_ref().and_then(|id| codes.get(id).copied());
            InstalledEntry {
                name: d.device_name.unwrap_or_default(),
                version: d.driver_version,
                device_class: d.device_class,
                manufacturer: d.manufacturer,
                hardware_ids: text(d.hardware_id.or(d.device_id)),
                inf: text(d.inf_name),
                config_error_code,
            }
        })
        .collect())
}
