//! Package HA (`system.ha`) and PS (`system.ps`) marker files.

use crate::error::FatimaError;
use crate::paths::FatimaLayout;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ha,
    Ps,
}

impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Ha => "ha",
            StatusKind::Ps => "ps",
        }
    }

    /// Names written as `1` and `2`.
    pub fn states(self) -> [&'static str; 2] {
        match self {
            StatusKind::Ha => ["ACTIVE", "STANDBY"],
            StatusKind::Ps => ["PRIMARY", "SECONDARY"],
        }
    }

    pub fn file(self, layout: &FatimaLayout) -> PathBuf {
        match self {
            StatusKind::Ha => layout.ha_file(),
            StatusKind::Ps => layout.ps_file(),
        }
    }

    pub fn describe(self, code: &str) -> &'static str {
        let [one, two] = self.states();
        match code.trim() {
            "1" => one,
            "2" => two,
            _ => "UNKNOWN",
        }
    }

    pub fn code_for(self, state: &str) -> Option<u8> {
        let wanted = state.trim().to_uppercase();
        self.states()
            .iter()
            .position(|name| *name == wanted)
            .map(|idx| idx as u8 + 1)
    }
}

fn existing_file(layout: &FatimaLayout, kind: StatusKind) -> Result<PathBuf, FatimaError> {
    let path = kind.file(layout);
    if !path.is_file() {
        return Err(FatimaError::StatusFileMissing {
            kind: kind.label(),
            path,
        });
    }
    Ok(path)
}

pub fn read_status(layout: &FatimaLayout, kind: StatusKind) -> Result<&'static str, FatimaError> {
    let path = existing_file(layout, kind)?;
    let content = fs::read_to_string(&path)?;
    Ok(kind.describe(&content))
}

/// Writes the code for `state`; returns the canonical state name.
pub fn write_status(
    layout: &FatimaLayout,
    kind: StatusKind,
    state: &str,
) -> Result<&'static str, FatimaError> {
    let code = kind.code_for(state).ok_or_else(|| {
        FatimaError::Config(format!(
            "unknown {} status {state:?}; expected {}",
            kind.label(),
            kind.states().join(" or ").to_lowercase()
        ))
    })?;
    let path = existing_file(layout, kind)?;
    fs::write(&path, code.to_string())?;
    tracing::info!(path = %path.display(), code, "package status written");
    Ok(kind.describe(&code.to_string()))
}
