//! `lcappclear`: drop revisions nobody links to and leftover backup files.

use crate::error::FatimaError;
use crate::paths::{FatimaLayout, REVISION_FOLDER};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const STALE_SUFFIXES: [&str; 2] = [".backup", ".old"];

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ClearPlan {
    pub live_revisions: Vec<PathBuf>,
    pub revision_dirs: Vec<PathBuf>,
    pub stale_files: Vec<PathBuf>,
    /// Entries that could not be read while planning.
    pub skipped: Vec<ClearFailure>,
}

impl ClearPlan {
    pub fn is_empty(&self) -> bool {
        self.revision_dirs.is_empty() && self.stale_files.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClearFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<ClearFailure>,
}

fn skip_unreadable(skipped: &mut Vec<ClearFailure>, path: &Path, err: io::Error) {
    tracing::warn!(path = %path.display(), %err, "unreadable entry skipped");
    skipped.push(ClearFailure {
        path: path.to_path_buf(),
        error: err.to_string(),
    });
}

fn live_revision_targets(
    app_dir: &Path,
    revision_base: &Path,
    skipped: &mut Vec<ClearFailure>,
) -> Result<BTreeSet<PathBuf>, FatimaError> {
    let mut live = BTreeSet::new();
    for entry in fs::read_dir(app_dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                skip_unreadable(skipped, app_dir, err);
                continue;
            }
        };
        match entry.file_type() {
            Ok(file_type) if file_type.is_symlink() => {}
            Ok(_) => continue,
            Err(err) => {
                skip_unreadable(skipped, &entry.path(), err);
                continue;
            }
        }
        let resolved = match fs::canonicalize(entry.path()) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(link = %entry.path().display(), %err, "dangling app link");
                continue;
            }
        };
        let Some(parent) = resolved.parent() else {
            continue;
        };
        if parent.starts_with(revision_base) && parent != revision_base {
            live.insert(resolved);
        }
    }
    Ok(live)
}

fn collect_stale_files(
    dir: &Path,
    skip: &BTreeSet<PathBuf>,
    out: &mut Vec<PathBuf>,
    skipped: &mut Vec<ClearFailure>,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            skip_unreadable(skipped, dir, err);
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                skip_unreadable(skipped, dir, err);
                continue;
            }
        };
        let path = entry.path();
        if skip.contains(&path) {
            continue;
        }
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                skip_unreadable(skipped, &path, err);
                continue;
            }
        };
        if file_type.is_dir() {
            collect_stale_files(&path, skip, out, skipped);
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if STALE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            out.push(path);
        }
    }
}

/// Works out what a clear would remove without touching anything.
///
/// Only a missing or unreadable app directory is an error; anything below it
/// that cannot be read lands in [`ClearPlan::skipped`].
pub fn plan_clear(layout: &FatimaLayout) -> Result<ClearPlan, FatimaError> {
    let app_dir = layout.app_dir();
    if !app_dir.is_dir() {
        return Err(FatimaError::Config(format!(
            "app directory does not exist: {}",
            app_dir.display()
        )));
    }
    let app_dir = fs::canonicalize(&app_dir)?;
    let revision_base = app_dir.join(REVISION_FOLDER);
    let mut skipped = Vec::new();

    let live = if revision_base.is_dir() {
        live_revision_targets(&app_dir, &revision_base, &mut skipped)?
    } else {
        BTreeSet::new()
    };

    let mut revision_dirs = BTreeSet::new();
    let parents: BTreeSet<PathBuf> = live
        .iter()
        .filter_map(|path| path.parent().map(Path::to_path_buf))
        .collect();
    for parent in parents {
        let entries = match fs::read_dir(&parent) {
            Ok(entries) => entries,
            Err(err) => {
                skip_unreadable(&mut skipped, &parent, err);
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !live.contains(&path) {
                        revision_dirs.insert(path);
                    }
                }
                Err(err) => skip_unreadable(&mut skipped, &parent, err),
            }
        }
    }

    let mut stale_files = Vec::new();
    collect_stale_files(&app_dir, &revision_dirs, &mut stale_files, &mut skipped);
    stale_files.sort();

    Ok(ClearPlan {
        live_revisions: live.into_iter().collect(),
        revision_dirs: revision_dirs.into_iter().collect(),
        stale_files,
        skipped,
    })
}

/// Removes everything in the plan; failures are collected, not fatal.
pub fn execute_clear(plan: &ClearPlan) -> ClearReport {
    let mut report = ClearReport::default();
    let targets = plan.revision_dirs.iter().chain(plan.stale_files.iter());
    for path in targets {
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed");
                report.removed.push(path.clone());
            }
            Err(err) => report.failed.push(ClearFailure {
                path: path.clone(),
                error: err.to_string(),
            }),
        }
    }
    report
}
