// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! HP Image Assistant collaborator.

use super::CommandRunner;
use crate::catalog::{load_report, CatalogItem};
use crate::error::{RemedyError, Result};
use std::path::{Path, PathBuf};

/// Standard install locations, checked in order.
pub const DEFAULT_LOCATIONS: &[&str] = &[
    r"C:\Program Files\HP\HPIA\HPImageAssistant.exe",
    r"C:\Program Files (x86)\HP\HPIA\HPImageAssistant.exe",
];

/// Locate the HPIA executable: the configured path if it exists, otherwise
/// the first standard location that does.
pub fn locate(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.is_file().then(|| path.to_path_buf());
    }
    DEFAULT_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// Analysis arguments writing a JSON report into `report_dir`.
pub fn analyze_args(report_dir: &Path) -> Vec<String> {
    vec![
        "/Operation:Analyze".into(),
        "/Category:All".into(),
        "/Selection:All".into(),
        "/Action:List".into(),
        format!("/ReportFolder:{}", report_dir.display()),
        "/Silent".into(),
    ]
}

/// HPIA executable driven through a [`CommandRunner`].
pub struct Hpia<R> {
    runner: R,
    exe: PathBuf,
}

impl<R: CommandRunner> Hpia<R> {
    pub fn new(runner: R, exe: PathBuf) -> Self {
        Self { runner, exe }
    }

    /// Locate the executable, failing with [`RemedyError::ToolUnavailable`].
    pub fn locate(runner: R, configured: Option<&Path>) -> Result<Self> {
        let exe = locate(configured).ok_or_else(|| {
            RemedyError::ToolUnavailable(match configured {
                Some(path) => path.display().to_string(),
                None => "HPImageAssistant.exe".into(),
            })
        })?;
        Ok(Self::new(runner, exe))
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Run an analysis into `report_dir` and load the newest report there.
    pub fn analyze(&self, report_dir: &Path) -> Result<Vec<CatalogItem>> {
        std::fs::create_dir_all(report_dir)?;
        let program = self.exe.display().to_string();
        log::info!("running HPIA analysis into {}", report_dir.display());
        self.runner
            .run(&program, &analyze_args(report_dir))?
            .into_stdout("HPIA analysis")?;
        load_report(report_dir)
    }
}
