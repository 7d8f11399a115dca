//! `lcproc <process> version [TAG]`: list revisions or switch the live one.

use crate::config::Config;
use crate::error::FatimaError;
use crate::liveness::{running_pid, ProcessTable};
use crate::paths::FatimaLayout;
use crate::prompt::Confirmer;
use crate::revision::{
    check_process_name, current_revision_if_linked, find_revision, normalize_tag, scan_revisions,
    Revision,
};
use crate::switcher::link_revision;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersioningRequest {
    pub process: String,
    pub target_tag: Option<String>,
}

impl VersioningRequest {
    pub fn list(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            target_tag: None,
        }
    }

    pub fn switch(process: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            target_tag: Some(tag.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RevisionEntry {
    pub tag: String,
    pub number: u32,
    pub directory: PathBuf,
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RevisionListing {
    pub process: String,
    pub current: Option<u32>,
    pub revisions: Vec<RevisionEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwitchOutcome {
    Switched {
        process: String,
        from: Option<u32>,
        to: String,
        link_target: PathBuf,
    },
    AlreadyCurrent {
        process: String,
        tag: String,
    },
    Declined {
        process: String,
        tag: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum VersioningOutcome {
    Listing(RevisionListing),
    Switch(SwitchOutcome),
}

struct ProcessRevisions {
    current: Option<u32>,
    revisions: Vec<Revision>,
}

fn load_process_revisions(
    layout: &FatimaLayout,
    cfg: &Config,
    process: &str,
) -> Result<ProcessRevisions, FatimaError> {
    check_process_name(cfg, process)?;
    let root = layout.revision_root(process);
    if !root.is_dir() {
        return Err(FatimaError::RevisionRootMissing(process.to_string()));
    }
    let current = current_revision_if_linked(&layout.live_link(process))?;
    let revisions = scan_revisions(&root)?;
    Ok(ProcessRevisions { current, revisions })
}

pub fn list_revisions(
    layout: &FatimaLayout,
    cfg: &Config,
    process: &str,
) -> Result<RevisionListing, FatimaError> {
    let loaded = load_process_revisions(layout, cfg, process)?;
    let revisions = loaded
        .revisions
        .iter()
        .map(|revision| RevisionEntry {
            tag: revision.tag.clone(),
            number: revision.number,
            directory: revision.directory.clone(),
            current: revision.is_active(loaded.current),
        })
        .collect();
    Ok(RevisionListing {
        process: process.to_string(),
        current: loaded.current,
        revisions,
    })
}

/// Switches the live link to `tag` once the operator agrees and the process
/// is confirmed stopped.
pub fn switch_revision(
    layout: &FatimaLayout,
    cfg: &Config,
    process: &str,
    tag: &str,
    table: &dyn ProcessTable,
    confirmer: &mut dyn Confirmer,
) -> Result<SwitchOutcome, FatimaError> {
    let loaded = load_process_revisions(layout, cfg, process)?;
    let tag = normalize_tag(tag)?;
    let target = find_revision(&loaded.revisions, &tag)
        .ok_or_else(|| FatimaError::RevisionNotFound(tag.clone()))?;

    if target.is_active(loaded.current) {
        return Ok(SwitchOutcome::AlreadyCurrent {
            process: process.to_string(),
            tag,
        });
    }

    let prompt = format!("{process} :: reset to revision {tag}?");
    if !confirmer.confirm(&prompt)? {
        return Ok(SwitchOutcome::Declined {
            process: process.to_string(),
            tag,
        });
    }

    if let Some(pid) = running_pid(&layout.pid_file(process), table)? {
        return Err(FatimaError::ProcessRunning { pid });
    }

    let link_target = link_revision(&layout.app_dir(), process, &target.directory)?;
    Ok(SwitchOutcome::Switched {
        process: process.to_string(),
        from: loaded.current,
        to: target.tag.clone(),
        link_target,
    })
}

pub fn run_versioning(
    layout: &FatimaLayout,
    cfg: &Config,
    request: &VersioningRequest,
    table: &dyn ProcessTable,
    confirmer: &mut dyn Confirmer,
) -> Result<VersioningOutcome, FatimaError> {
    match request.target_tag.as_deref() {
        None => list_revisions(layout, cfg, &request.process).map(VersioningOutcome::Listing),
        Some(tag) => switch_revision(layout, cfg, &request.process, tag, table, confirmer)
            .map(VersioningOutcome::Switch),
    }
}
