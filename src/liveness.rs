//! Is the process behind a PID file actually running?

use crate::config::ProcessTableKind;
use crate::error::FatimaError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait ProcessTable {
    fn is_alive(&self, pid: u32) -> Result<bool, FatimaError>;
}

/// Scans `ps -e -o pid=` for the pid.
///
/// `-e` is required: plain `ps` only lists the caller's terminal, and the
/// platform daemons run detached from any terminal.
pub struct PsProcessTable;

const PS_ARGS: [&str; 3] = ["-e", "-o", "pid="];

impl ProcessTable for PsProcessTable {
    fn is_alive(&self, pid: u32) -> Result<bool, FatimaError> {
        let ps = which::which("ps")
            .map_err(|err| FatimaError::ProcessTable(format!("ps not found: {err}")))?;
        let output = Command::new(ps)
            .args(PS_ARGS)
            .output()
            .map_err(|err| FatimaError::ProcessTable(format!("fail to execute ps: {err}")))?;
        if !output.status.success() {
            return Err(FatimaError::ProcessTable(format!(
                "ps exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(ps_output_contains_pid(
            &String::from_utf8_lossy(&output.stdout),
            pid,
        ))
    }
}

pub fn ps_output_contains_pid(text: &str, pid: u32) -> bool {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|token| token.parse::<u32>().ok())
        .any(|candidate| candidate == pid)
}

/// Checks for `/proc/<pid>`.
pub struct ProcfsProcessTable {
    root: PathBuf,
}

impl ProcfsProcessTable {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for ProcfsProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for ProcfsProcessTable {
    fn is_alive(&self, pid: u32) -> Result<bool, FatimaError> {
        if pid == 0 {
            return Ok(false);
        }
        Ok(self.root.join(pid.to_string()).is_dir())
    }
}

pub fn process_table_for(kind: ProcessTableKind) -> Box<dyn ProcessTable> {
    match kind {
        ProcessTableKind::Ps => Box::new(PsProcessTable),
        ProcessTableKind::Procfs => Box::new(ProcfsProcessTable::new()),
    }
}

pub fn read_pid_file(path: &Path) -> Option<u32> {
    let text = fs::read_to_string(path).ok()?;
    match text.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Some(pid),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unparsable pid file");
            None
        }
    }
}

/// Returns the pid when the PID file names a live process.
///
/// A missing or unreadable PID file counts as "not running".
pub fn running_pid(
    pid_file: &Path,
    table: &dyn ProcessTable,
) -> Result<Option<u32>, FatimaError> {
    let Some(pid) = read_pid_file(pid_file) else {
        return Ok(None);
    };
    if table.is_alive(pid)? {
        Ok(Some(pid))
    } else {
        tracing::info!(pid, path = %pid_file.display(), "stale pid file");
        Ok(None)
    }
}
