// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! External collaborators: process execution, PowerShell/HPCMSL, HP Image
//! Assistant and (on Windows) native WMI inventory.
//!
//! Everything here is fallible. Callers turn errors into scan warnings with
//! [`RemedyError::as_warning`](crate::error::RemedyError::as_warning) and
//! continue with whatever sources did load.

pub mod hpia;
pub mod powershell;
#[cfg(windows)]
pub mod wmi_inventory;

pub use hpia::Hpia;
pub use powershell::PowerShell;

use crate::error::{RemedyError, Result};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `-1` when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout on success, otherwise a [`RemedyError::CommandFailed`] carrying
    /// stderr (or the exit code when stderr is empty).
    pub fn into_stdout(self, what: &str) -> Result<String> {
        if self.success() {
            return Ok(self.stdout);
        }
        let detail = self.stderr.trim();
        Err(RemedyError::CommandFailed(if detail.is_empty() {
            format!("{} exited with code {}", what, self.exit_code)
        } else {
            format!("{}: {}", what, detail)
        }))
    }
}

/// Runs external programs. Implemented by [`SubprocessRunner`] and by test
/// doubles.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs commands as child processes, killing them after a timeout.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    timeout: Duration,
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl SubprocessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run_async(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        // Dropping the pending future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(RemedyError::ToolUnavailable(program.to_string()))
            }
            Ok(Err(e)) => {
                return Err(RemedyError::CommandFailed(format!("{}: {}", program, e)))
            }
            Err(_) => {
                return Err(RemedyError::Timeout(format!(
                    "{} after {}s",
                    program,
                    self.timeout.as_secs()
                )))
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl CommandRunner for SubprocessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        log::debug!("running {} {:?}", program, args);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        runtime.block_on(self.run_async(program, args))
    }
}

/// Parse PowerShell `ConvertTo-Json` output. Empty output is an empty list.
pub(crate) fn parse_json_output(stdout: &str, what: &str) -> Result<serde_json::Value> {
    let text = stdout.trim().trim_start_matches('\u{feff}');
    if text.is_empty() {
        return Ok(serde_json::Value::Array(Vec::new()));
    }
    serde_json::from_str(text)
        .map_err(|e| RemedyError::Parse(format!("{} returned invalid JSON: {}", what, e)))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned outputs and records every invocation.
    #[derive(Default)]
    pub struct FakeRunner {
        pub responses: RefCell<VecDeque<Result<CommandOutput>>>,
        pub calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl FakeRunner {
        pub fn with_stdout(outputs: &[&str]) -> Self {
            let runner = Self::default();
            for out in outputs {
                runner.push_ok(out);
            }
            runner
        }

        pub fn push_ok(&self, stdout: &str) {
            self.responses.borrow_mut().push_back(Ok(CommandOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            }));
        }

        pub fn push(&self, result: Result<CommandOutput>) {
            self.responses.borrow_mut().push_back(result);
        }

        /// Script text of the n-th call (last argument).
        pub fn script(&self, n: usize) -> String {
            self.calls.borrow()[n].1.last().cloned().unwrap_or_default()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.calls.borrow_mut().push((program.to_string(), args.to_vec()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(RemedyError::Other("no canned response".into())))
        }
    }
}
