// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! CLI tool for Fleet Remedy (remedy)

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use colored::Colorize;
#[cfg(feature = "cli")]
use remedylib::{
    catalog::{catalog_from_json, inventory_from_json, load_report, meta_keys, read_json, record_keys},
    collect::{CommandRunner, Hpia, PowerShell, SubprocessRunner},
    legacy::LegacyRepository,
    CatalogSource, DriverStatus, InstalledEntry, RawValue, Reconciler, ReconciliationRecord,
    RemedyConfig, RemedyError, ScanReport, ScanSources,
};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "remedy")]
#[command(about = "Fleet Remedy: reconcile vendor driver and firmware catalogs against installed devices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Match vendor catalogs against the installed inventory
    Match(MatchArgs),
    /// List installed drivers: name | version | class | hwid/inf counts
    Inventory {
        /// Installed drivers JSON (Win32_PnPSignedDriver) instead of live collection
        #[arg(long)]
        installed_json: Option<PathBuf>,
    },
    /// Print the union of package-list keys and exit
    Keys {
        /// CMSL JSON output (Get-SoftpaqList) instead of a live query
        #[arg(long)]
        cmsl_json: Option<PathBuf>,
        /// HP platform ID for the live query
        #[arg(long)]
        platform: Option<String>,
        /// Print keys of the enrichment metadata instead
        #[arg(long)]
        meta: bool,
        /// Fetch metadata via Get-SoftpaqMetadata before listing
        #[arg(long)]
        enrich_cmsl: bool,
    },
    /// Print a sample configuration file
    Config,
}

#[cfg(feature = "cli")]
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(clap::Args)]
struct MatchArgs {
    /// CMSL JSON output (Get-SoftpaqList)
    #[arg(long)]
    cmsl_json: Option<PathBuf>,
    /// Installed drivers JSON (Win32_PnPSignedDriver)
    #[arg(long)]
    installed_json: Option<PathBuf>,
    /// HPIA JSON report file or report folder
    #[arg(long)]
    hpia_report: Option<PathBuf>,
    /// Run an HPIA analysis and load the newest report
    #[arg(long)]
    hpia_run: bool,
    /// HPImageAssistant.exe location (standard install paths when omitted)
    #[arg(long)]
    hpia_path: Option<PathBuf>,
    /// Legacy driver repository root
    #[arg(long)]
    legacy_root: Option<PathBuf>,
    /// HP platform ID (detected when omitted)
    #[arg(long)]
    platform: Option<String>,
    /// Computer model for legacy folder lookup (detected when omitted)
    #[arg(long)]
    model: Option<String>,
    /// Minimum name score to accept a name-only match
    #[arg(long)]
    min_score: Option<u32>,
    /// Accept name-only matches when no hardware ID or INF matches
    #[arg(long)]
    allow_name_fallback: bool,
    /// Show catalog items with no match
    #[arg(long)]
    show_unmatched: bool,
    /// Include non-driver package-list items
    #[arg(long)]
    include_non_drivers: bool,
    /// Fetch package metadata (hardware IDs / INF) via Get-SoftpaqMetadata
    #[arg(long)]
    enrich_cmsl: bool,
    /// Maximum number of packages to enrich
    #[arg(long)]
    enrich_limit: Option<usize>,
    /// Write the scan report to a JSON file
    #[arg(long)]
    output_json: Option<PathBuf>,
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
impl MatchArgs {
    /// Fold flags into the file configuration; flags win.
    fn apply(&self, config: &mut RemedyConfig) {
        if let Some(min) = self.min_score {
            config.matching.min_name_score = min;
        }
        config.matching.allow_name_fallback |= self.allow_name_fallback;
        config.matching.show_unmatched |= self.show_unmatched;
        config.matching.include_non_drivers |= self.include_non_drivers;
        config.tools.enrich_cmsl |= self.enrich_cmsl;
        if let Some(limit) = self.enrich_limit {
            config.tools.enrich_limit = limit;
        }
        if self.hpia_path.is_some() {
            config.tools.hpia_path = self.hpia_path.clone();
        }
        if self.platform.is_some() {
            config.tools.platform = self.platform.clone();
        }
        if self.legacy_root.is_some() {
            config.legacy.root = self.legacy_root.clone();
        }
        if self.model.is_some() {
            config.legacy.model = self.model.clone();
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::init();

    let mut config = match &cli.config {
        Some(path) => RemedyConfig::from_toml_file(path)?,
        None => RemedyConfig::default(),
    };

    match &cli.command {
        Commands::Config => {
            print!("{}", RemedyConfig::sample_toml());
        }
        Commands::Inventory { installed_json } => {
            let runner = SubprocessRunner::new(config.tools.command_timeout());
            let ps = PowerShell::new(&runner, config.tools.powershell.clone());
            let installed = match installed_json {
                Some(path) => inventory_from_json(read_json(path)?),
                None => collect_inventory(&ps)?,
            };
            print_inventory(&installed);
        }
        Commands::Keys {
            cmsl_json,
            platform,
            meta,
            enrich_cmsl,
        } => {
            if platform.is_some() {
                config.tools.platform = platform.clone();
            }
            let runner = SubprocessRunner::new(config.tools.command_timeout());
            let ps = PowerShell::new(&runner, config.tools.powershell.clone());
            let mut records = match cmsl_json {
                Some(path) => json_records(read_json(path)?),
                None => {
                    let platform = resolve_platform(&config, &ps)
                        .ok_or("Provide --platform or --cmsl-json (auto-detect failed)")?;
                    ps.softpaq_list(&platform, &config.tools.os, &config.tools.os_version)?
                }
            };
            if *enrich_cmsl {
                ps.enrich(&mut records, config.tools.enrich_limit)?;
            }
            let raws: Vec<RawValue> = records.into_iter().map(RawValue::from).collect();
            if *meta {
                println!("CMSL meta keys: {}", meta_keys(&raws).join(", "));
            } else {
                println!("CMSL keys: {}", record_keys(&raws).join(", "));
            }
        }
        Commands::Match(args) => {
            args.apply(&mut config);
            let report = run_match(args, &config)?;
            if let Some(path) = &args.output_json {
                std::fs::write(path, report.to_json_pretty()?)?;
                eprintln!("{} Report written to: {}", "[+]".green(), path.display());
            } else if args.format == OutputFormat::Json {
                println!("{}", report.to_json_pretty()?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn run_match(args: &MatchArgs, config: &RemedyConfig) -> Result<ScanReport, RemedyError> {
    let runner = SubprocessRunner::new(config.tools.command_timeout());
    let ps = PowerShell::new(&runner, config.tools.powershell.clone());
    let mut sources = ScanSources {
        host: hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".into()),
        ..ScanSources::default()
    };

    // Analysis report
    if args.hpia_run {
        let loaded = Hpia::locate(&runner, config.tools.hpia_path.as_deref())
            .and_then(|hpia| hpia.analyze(&config.tools.report_dir()));
        match loaded {
            Ok(items) => sources.report = items,
            Err(e) => sources.warnings.push(e.as_warning("HPIA analysis")),
        }
    } else if let Some(path) = &args.hpia_report {
        sources.report = load_report(path)?;
    }
    if !sources.report.is_empty() {
        log::info!("HPIA recommendations: {}", sources.report.len());
    }

    // Installed inventory
    sources.inventory = match &args.installed_json {
        Some(path) => inventory_from_json(read_json(path)?),
        None => match collect_inventory(&ps) {
            Ok(entries) => entries,
            Err(e) => {
                sources.warnings.push(e.as_warning("Installed driver inventory"));
                Vec::new()
            }
        },
    };

    // Package list
    let platform = match &args.cmsl_json {
        Some(_) => config.tools.platform.clone(),
        None => resolve_platform(config, &ps),
    };
    let mut records = match (&args.cmsl_json, &platform) {
        (Some(path), _) => json_records(read_json(path)?),
        (None, Some(platform)) => ps
            .softpaq_list(platform, &config.tools.os, &config.tools.os_version)
            .unwrap_or_else(|e| {
                sources.warnings.push(e.as_warning("CMSL scan"));
                Vec::new()
            }),
        (None, None) => {
            sources
                .warnings
                .push("CMSL scan skipped: no platform ID (pass --platform or --cmsl-json)".into());
            Vec::new()
        }
    };
    if config.tools.enrich_cmsl && !records.is_empty() {
        if let Err(e) = ps.enrich(&mut records, config.tools.enrich_limit) {
            sources.warnings.push(e.as_warning("CMSL metadata enrichment"));
        }
    }
    sources.package_list = catalog_from_json(CatalogSource::PackageList, serde_json::Value::Array(records));

    // Legacy repository
    if let Some(root) = &config.legacy.root {
        let model = config.legacy.model.clone().or_else(|| {
            ps.detect_model().unwrap_or_else(|e| {
                log::debug!("model detection failed: {}", e);
                None
            })
        });
        match LegacyRepository::new(root).select(platform.as_deref(), model.as_deref()) {
            Some(selection) => {
                if let Some(detail) = selection.detail {
                    if selection.ambiguous {
                        sources.warnings.push(detail);
                    } else {
                        log::info!("{}", detail);
                    }
                }
                sources.legacy = selection.items;
            }
            None => sources
                .warnings
                .push("No legacy repository manifest found for this device.".into()),
        }
    }

    Ok(Reconciler::from_config(config).scan(&sources))
}

#[cfg(feature = "cli")]
fn resolve_platform<R: CommandRunner>(config: &RemedyConfig, ps: &PowerShell<R>) -> Option<String> {
    config.tools.platform.clone().or_else(|| {
        ps.detect_platform_id().unwrap_or_else(|e| {
            log::warn!("platform detection failed: {}", e);
            None
        })
    })
}

#[cfg(feature = "cli")]
#[cfg(windows)]
fn collect_inventory<R: CommandRunner>(ps: &PowerShell<R>) -> Result<Vec<InstalledEntry>, RemedyError> {
    remedylib::collect::wmi_inventory::installed_inventory().or_else(|e| {
        log::warn!("WMI inventory failed, falling back to PowerShell: {}", e);
        ps.installed_inventory()
    })
}

#[cfg(feature = "cli")]
#[cfg(not(windows))]
fn collect_inventory<R: CommandRunner>(ps: &PowerShell<R>) -> Result<Vec<InstalledEntry>, RemedyError> {
    ps.installed_inventory()
}

#[cfg(feature = "cli")]
fn json_records(doc: serde_json::Value) -> Vec<serde_json::Value> {
    match doc {
        serde_json::Value::Array(items) => items.into_iter().filter(|v| v.is_object()).collect(),
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => Vec::new(),
    }
}

#[cfg(feature = "cli")]
fn print_inventory(installed: &[InstalledEntry]) {
    for entry in installed {
        let ids = entry.identifiers();
        println!(
            "{} | {} | {} | hwid={} inf={}",
            entry.name,
            entry.version.as_deref().unwrap_or("-"),
            entry.device_class.as_deref().unwrap_or("-"),
            ids.hardware_ids.len(),
            ids.inf_names.len()
        );
    }
}

#[cfg(feature = "cli")]
fn record_line(record: &ReconciliationRecord) -> String {
    let mut line = format!(
        "[{} {}/{}] {} {} ({}) -> {} ({})",
        record.source,
        record.reason,
        record.score,
        record.driver_state(),
        record.catalog_name,
        record.catalog_version.as_deref().unwrap_or("-"),
        record.match_name.as_deref().unwrap_or(""),
        record.match_version.as_deref().unwrap_or("-"),
    );
    if !record.is_matched() {
        if let Some(candidate) = &record.name_candidate {
            line.push_str(&format!(
                " | name-candidate: {} ({}) score={}",
                candidate,
                record.name_candidate_version.as_deref().unwrap_or("-"),
                record.name_candidate_score
            ));
        }
    }
    line
}

#[cfg(feature = "cli")]
fn print_report(report: &ScanReport) {
    println!(
        "{} {} ({})",
        "Host:".bold(),
        report.host.cyan(),
        report.generated_at
    );
    for record in &report.records {
        let status = match record.status {
            DriverStatus::Critical => record.status.label().red().bold(),
            DriverStatus::Recommended | DriverStatus::UpdateAvailable => record.status.label().yellow(),
            DriverStatus::UpToDate | DriverStatus::Installed => record.status.label().green(),
            DriverStatus::Optional | DriverStatus::Unknown => record.status.label().normal(),
        };
        println!("{:<16} {}", status, record_line(record));
    }
    for warning in &report.warnings {
        eprintln!("{} {}", "[!]".yellow(), warning);
    }
    println!(
        "\n{} records, {} need action",
        report.records.len(),
        report.actionable().count().to_string().bold()
    );
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
