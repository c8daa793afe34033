// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! PowerShell collaborator: HPCMSL package list and metadata, PnP driver
//! inventory and platform detection.

use super::{parse_json_output, CommandRunner};
use crate::catalog::{attach_metadata, inventory_from_json, InstalledEntry};
use crate::error::{RemedyError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Printed by the metadata script when `Get-SoftpaqMetadata` is missing.
const NO_METADATA_MARKER: &str = "__NO_METADATA_CMDLET__";

/// `Win32_PnPSignedDriver` rows with the matching `Win32_PnPEntity`
/// problem code attached.
const INVENTORY_SCRIPT: &str = r#"
$entities = @{}
Get-CimInstance Win32_PnPEntity -ErrorAction SilentlyContinue | ForEach-Object {
    if ($_.DeviceID) { $entities[$_.DeviceID] = $_.ConfigManagerErrorCode }
}
Get-CimInstance Win32_PnPSignedDriver -ErrorAction SilentlyContinue |
Select-Object DeviceName, DriverVersion, Manufacturer, DeviceID, HardwareID, InfName, ClassGuid, DeviceClass, DriverDate,
    @{n='ConfigManagerErrorCode';e={ $entities[$_.DeviceID] }} |
ConvertTo-Json -Depth 4
"#;

/// Baseboard product, then BIOS SystemSKU, then SKU number, then model.
const PLATFORM_SCRIPT: &str = r#"
$cs = Get-CimInstance Win32_ComputerSystem -ErrorAction SilentlyContinue
$bb = Get-CimInstance Win32_BaseBoard -ErrorAction SilentlyContinue
$csProduct = Get-CimInstance Win32_ComputerSystemProduct -ErrorAction SilentlyContinue
$biosReg = Get-ItemProperty 'HKLM:\HARDWARE\DESCRIPTION\System\BIOS' -ErrorAction SilentlyContinue
$result = $null
if ($bb -and $bb.Product) { $result = $bb.Product }
if (-not $result -and $biosReg -and $biosReg.SystemSKU) { $result = $biosReg.SystemSKU }
if (-not $result -and $csProduct -and $csProduct.SKUNumber) { $result = $csProduct.SKUNumber }
if (-not $result -and $cs -and $cs.Model) { $result = $cs.Model }
if ($result) { $result }
"#;

const MODEL_SCRIPT: &str =
    "(Get-CimInstance Win32_ComputerSystem -ErrorAction SilentlyContinue).Model";

/// Quote a value as a single-quoted PowerShell literal.
fn ps_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// PowerShell host invoked through a [`CommandRunner`].
pub struct PowerShell<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> PowerShell<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Run a script with `-NoProfile -NonInteractive -Command`, returning
    /// stdout on exit code 0.
    pub fn run_script(&self, script: &str) -> Result<String> {
        let args = [
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            script.to_string(),
        ];
        self.runner.run(&self.program, &args)?.into_stdout("PowerShell")
    }

    /// `Get-SoftpaqList` records for a platform, as raw JSON objects.
    pub fn softpaq_list(&self, platform: &str, os: &str, os_version: &str) -> Result<Vec<Value>> {
        if platform.trim().is_empty() {
            return Err(RemedyError::Configuration("platform ID is empty".into()));
        }
        let script = format!(
            "Import-Module HPCMSL -ErrorAction Stop; \
             $sp = Get-SoftpaqList -Platform {} -Os {} -OsVer {} -ErrorAction Stop; \
             $sp | ConvertTo-Json -Depth 6",
            ps_literal(platform.trim()),
            ps_literal(os),
            ps_literal(os_version)
        );
        let doc = parse_json_output(&self.run_script(&script)?, "Get-SoftpaqList")?;
        Ok(object_records(doc))
    }

    /// `Get-SoftpaqMetadata` for each id, keyed by id. Ids whose lookup
    /// fails are skipped by the script.
    pub fn softpaq_metadata(&self, ids: &[String]) -> Result<HashMap<String, Value>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids_literal: Vec<String> = ids.iter().map(|id| ps_literal(id)).collect();
        let script = format!(
            r#"
Import-Module HPCMSL -ErrorAction Stop
$ids = @({ids})
$metaCmd = Get-Command -Name Get-SoftpaqMetadata -ErrorAction SilentlyContinue
if (-not $metaCmd) {{
    Write-Output "{marker}"
    return
}}
$results = @()
foreach ($id in $ids) {{
    try {{
        $m = Get-SoftpaqMetadata -Number $id -ErrorAction Stop
        if ($m) {{ $results += [PSCustomObject]@{{ Id = $id; Meta = $m }} }}
    }} catch {{
    }}
}}
$results | ConvertTo-Json -Depth 8
"#,
            ids = ids_literal.join(","),
            marker = NO_METADATA_MARKER
        );
        let output = self.run_script(&script)?;
        if output.contains(NO_METADATA_MARKER) {
            return Err(RemedyError::ToolUnavailable(
                "HPCMSL Get-SoftpaqMetadata cmdlet".into(),
            ));
        }
        let doc = match parse_json_output(&output, "Get-SoftpaqMetadata") {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("{}", e);
                return Ok(HashMap::new());
            }
        };

        let mut mapping = HashMap::new();
        for record in object_records(doc) {
            let id = record
                .get("Id")
                .and_then(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|id| !id.is_empty());
            if let (Some(id), Some(meta @ Value::Object(_))) = (id, record.get("Meta")) {
                mapping.insert(id, meta.clone());
            }
        }
        Ok(mapping)
    }

    /// Attach metadata to at most `limit` records carrying a package id.
    /// Returns how many records received a `Meta` map.
    pub fn enrich(&self, records: &mut [Value], limit: usize) -> Result<usize> {
        let ids: Vec<String> = records
            .iter()
            .filter_map(package_id)
            .take(limit)
            .collect();
        let metadata = self.softpaq_metadata(&ids)?;
        attach_metadata(records, &metadata);
        let attached = records.iter().filter(|r| r.get("Meta").is_some_and(Value::is_object)).count();
        log::info!("metadata attached to {} of {} package-list items", attached, records.len());
        Ok(attached)
    }

    /// Installed PnP drivers with their Device Manager problem codes.
    pub fn installed_inventory(&self) -> Result<Vec<InstalledEntry>> {
        let doc = parse_json_output(&self.run_script(INVENTORY_SCRIPT)?, "Win32_PnPSignedDriver")?;
        Ok(inventory_from_json(doc))
    }

    /// Best-effort HP platform ID. `None` when nothing could be determined.
    pub fn detect_platform_id(&self) -> Result<Option<String>> {
        Ok(first_line(&self.run_script(PLATFORM_SCRIPT)?))
    }

    /// Computer model as reported by `Win32_ComputerSystem`.
    pub fn detect_model(&self) -> Result<Option<String>> {
        Ok(first_line(&self.run_script(MODEL_SCRIPT)?))
    }
}

fn first_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn object_records(doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(items) => items.into_iter().filter(Value::is_object).collect(),
        obj @ Value::Object(_) => vec![obj],
        _ => Vec::new(),
    }
}

fn package_id(record: &Value) -> Option<String> {
    ["Id", "SoftPaqId", "Number"].iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::fake::FakeRunner;
    use crate::collect::CommandOutput;

    fn shell(runner: &FakeRunner) -> PowerShell<&FakeRunner> {
        PowerShell::new(runner, "powershell")
    }

    #[test]
    fn test_softpaq_list_builds_script_and_parses() {
        let runner = FakeRunner::with_stdout(&[r#"[{"Id":"sp1","Name":"BIOS"}, 7, {"Id":"sp2"}]"#]);
        let records = shell(&runner).softpaq_list("8A56", "Win11", "24H2").unwrap();
        assert_eq!(records.len(), 2);
        let calls = runner.calls.borrow();
        assert_eq!(calls[0].0, "powershell");
        assert_eq!(calls[0].1[0], "-NoProfile");
        drop(calls);
        let script = runner.script(0);
        assert!(script.contains("Get-SoftpaqList -Platform '8A56' -Os 'Win11' -OsVer '24H2'"));
    }

    #[test]
    fn test_softpaq_list_single_object_and_empty() {
        let runner = FakeRunner::with_stdout(&[r#"{"Id":"sp1"}"#, ""]);
        let ps = shell(&runner);
        assert_eq!(ps.softpaq_list("8A56", "Win11", "24H2").unwrap().len(), 1);
        assert!(ps.softpaq_list("8A56", "Win11", "24H2").unwrap().is_empty());
        assert!(ps.softpaq_list("  ", "Win11", "24H2").is_err());
    }

    #[test]
    fn test_platform_literal_is_escaped() {
        let runner = FakeRunner::with_stdout(&["[]"]);
        shell(&runner).softpaq_list("it's", "Win11", "24H2").unwrap();
        assert!(runner.script(0).contains("-Platform 'it''s'"));
    }

    #[test]
    fn test_metadata_marker_means_unavailable() {
        let runner = FakeRunner::with_stdout(&["__NO_METADATA_CMDLET__\n"]);
        let err = shell(&runner).softpaq_metadata(&["sp1".into()]).unwrap_err();
        assert!(matches!(err, RemedyError::ToolUnavailable(_)));
    }

    #[test]
    fn test_metadata_mapping() {
        let runner = FakeRunner::with_stdout(&[
            r#"[{"Id":"sp1","Meta":{"Devices":"PCI\\VEN_8086&DEV_A0F0"}},{"Id":"sp2","Meta":"x"},{"Meta":{}}]"#,
        ]);
        let map = shell(&runner).softpaq_metadata(&["sp1".into(), "sp2".into()]).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map["sp1"].get("Devices").is_some());
        assert!(runner.script(0).contains("$ids = @('sp1','sp2')"));
    }

    #[test]
    fn test_metadata_skips_empty_id_list_and_bad_json() {
        let runner = FakeRunner::with_stdout(&["not json"]);
        let ps = shell(&runner);
        assert!(ps.softpaq_metadata(&[]).unwrap().is_empty());
        assert!(runner.calls.borrow().is_empty());
        assert!(ps.softpaq_metadata(&["sp1".into()]).unwrap().is_empty());
    }

    #[test]
    fn test_enrich_respects_limit() {
        let runner = FakeRunner::with_stdout(&[r#"{"Id":"sp1","Meta":{"CVA":"netwtw10.inf"}}"#]);
        let mut records = vec![
            serde_json::json!({"Id": "sp1"}),
            serde_json::json!({"Name": "no id"}),
            serde_json::json!({"SoftPaqId": "sp3"}),
        ];
        let attached = shell(&runner).enrich(&mut records, 1).unwrap();
        assert_eq!(attached, 1);
        let script = runner.script(0);
        assert!(script.contains("@('sp1')"));
        assert!(records[0].get("Meta").is_some());
    }

    #[test]
    fn test_installed_inventory() {
        let runner = FakeRunner::with_stdout(&[
            r#"[{"DeviceName":"Realtek Audio","DriverVersion":"6.0.9","DeviceClass":"MEDIA","ConfigManagerErrorCode":0},
                {"DeviceName":"PCI Device","ConfigManagerErrorCode":28}]"#,
        ]);
        let entries = shell(&runner).installed_inventory().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].device_class.as_deref(), Some("MEDIA"));
        assert!(runner.script(0).contains("DeviceClass"));
        assert!(!entries[0].missing_driver());
        assert!(entries[1].missing_driver());
    }

    #[test]
    fn test_detect_platform_id() {
        let runner = FakeRunner::with_stdout(&["\r\n8A56\r\n", "   "]);
        let ps = shell(&runner);
        assert_eq!(ps.detect_platform_id().unwrap().as_deref(), Some("8A56"));
        assert_eq!(ps.detect_platform_id().unwrap(), None);
    }

    #[test]
    fn test_failing_command_propagates() {
        let runner = FakeRunner::default();
        runner.push(Ok(CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: "Import-Module : The specified module 'HPCMSL' was not loaded".into(),
        }));
        let err = shell(&runner).softpaq_list("8A56", "Win11", "24H2").unwrap_err();
        assert!(err.to_string().contains("HPCMSL"));
    }
}
