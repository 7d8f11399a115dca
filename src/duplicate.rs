//! `lcproc <process> dup <new>`: seed a new process from another one's files.

use crate::config::Config;
use crate::error::FatimaError;
use crate::paths::FatimaLayout;
use crate::revision::{check_process_name, Revision};
use crate::switcher::{check_link_target, link_revision};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions copied regardless of the file's name.
pub const COPY_EXTENSIONS: [&str; 11] = [
    "properties",
    "xml",
    "json",
    "yaml",
    "yml",
    "sh",
    "dat",
    "p8",
    "rb",
    "rbw",
    "lua",
];

const FIRST_TAG: &str = "R001";
const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H.%M";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub source: String,
    pub target: String,
    pub revision: Revision,
    pub link_target: PathBuf,
    pub files: Vec<CopiedFile>,
}

pub fn first_revision_dir_name(now: DateTime<Local>) -> String {
    format!("{}_{FIRST_TAG}", now.format(TIMESTAMP_FORMAT))
}

fn process_exists(layout: &FatimaLayout, process: &str) -> bool {
    fs::symlink_metadata(layout.live_link(process)).is_ok()
        || layout.revision_root(process).exists()
}

fn is_copy_candidate(file_name: &str, source: &str) -> bool {
    if file_name.starts_with(source) {
        return true;
    }
    COPY_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(&format!(".{ext}")))
}

/// Destination name with the source prefix swapped for the target name.
pub fn destination_name(file_name: &str, source: &str, target: &str) -> String {
    match file_name.strip_prefix(source) {
        Some(rest) => format!("{target}{rest}"),
        None => file_name.to_string(),
    }
}

/// Regular files in `source_dir` worth carrying over, sorted by name.
pub fn select_source_files(source_dir: &Path, source: &str) -> Result<Vec<PathBuf>, FatimaError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable entry");
                continue;
            }
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_copy_candidate(&name, source) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn copy_files(
    files: &[PathBuf],
    destination_dir: &Path,
    source: &str,
    target: &str,
) -> Result<Vec<CopiedFile>, FatimaError> {
    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let destination = destination_dir.join(destination_name(&name, source, target));
        fs::copy(file, &destination)?;
        tracing::debug!(
            from = %file.display(),
            to = %destination.display(),
            "copied"
        );
        copied.push(CopiedFile {
            source: file.clone(),
            destination,
        });
    }
    Ok(copied)
}

/// Drops a half-built target so the operator can retry the duplication.
fn discard_revision_root(revision_root: &Path) {
    if let Err(cleanup) = fs::remove_dir_all(revision_root) {
        tracing::warn!(
            path = %revision_root.display(),
            %cleanup,
            "failed to remove partial revision"
        );
    }
}

/// Copies `source`'s live files into a fresh `R001` revision of `target` and
/// links it.
pub fn duplicate_process(
    layout: &FatimaLayout,
    cfg: &Config,
    source: &str,
    target: &str,
    now: DateTime<Local>,
) -> Result<DuplicateReport, FatimaError> {
    check_process_name(cfg, source)?;
    check_process_name(cfg, target)?;
    if !process_exists(layout, source) {
        return Err(FatimaError::SourceMissing(source.to_string()));
    }
    if process_exists(layout, target) {
        return Err(FatimaError::TargetExists(target.to_string()));
    }

    let source_dir = layout.live_link(source);
    let files = select_source_files(&source_dir, source)?;
    if files.is_empty() {
        return Err(FatimaError::NoSourceFiles(source_dir));
    }

    let app_dir = layout.app_dir();
    let revision_root = layout.revision_root(target);
    let revision_dir = revision_root.join(first_revision_dir_name(now));
    check_link_target(&app_dir, &revision_dir)?;

    fs::create_dir_all(&revision_dir)?;
    let copied = match copy_files(&files, &revision_dir, source, target) {
        Ok(copied) => copied,
        Err(err) => {
            discard_revision_root(&revision_root);
            return Err(err);
        }
    };
    tracing::info!(source, target, count = copied.len(), "duplicated process files");

    let link_target = match link_revision(&app_dir, target, &revision_dir) {
        Ok(link_target) => link_target,
        Err(err) => {
            discard_revision_root(&revision_root);
            return Err(err);
        }
    };
    Ok(DuplicateReport {
        source: source.to_string(),
        target: target.to_string(),
        revision: Revision {
            directory: revision_dir,
            tag: FIRST_TAG.to_string(),
            number: 1,
        },
        link_target,
        files: copied,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::revision::current_revision_number;
    use crate::switcher::tests::foreign_device_dir;
    use chrono::TimeZone;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use tempfile::tempdir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2018, 8, 14, 8, 35, 0).unwrap()
    }

    fn seed_alpha(layout: &FatimaLayout) -> PathBuf {
        let rev = layout.revision_root("alpha").join("2018.01.01-00.00_R004");
        fs::create_dir_all(rev.join("proc")).unwrap();
        fs::write(rev.join("alpha"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(rev.join("alpha"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(rev.join("alpha.properties"), "name=alpha\n").unwrap();
        fs::write(rev.join("other.json"), "{}").unwrap();
        fs::write(rev.join("ignored.bin"), [0u8, 1, 2]).unwrap();
        fs::write(rev.join("proc").join("alpha.pid"), "1").unwrap();
        link_revision(&layout.app_dir(), "alpha", &rev).unwrap();
        rev
    }

    #[test]
    fn revision_dir_name_uses_minute_timestamp() {
        assert_eq!(first_revision_dir_name(fixed_now()), "2018.08.14-08.35_R001");
    }

    #[test]
    fn candidate_rules() {
        assert!(is_copy_candidate("alpha", "alpha"));
        assert!(is_copy_candidate("alpha.cfg", "alpha"));
        assert!(is_copy_candidate("other.yml", "alpha"));
        assert!(!is_copy_candidate("ignored.bin", "alpha"));
        assert!(!is_copy_candidate("json", "alpha"));
        assert_eq!(destination_name("alpha.properties", "alpha", "beta"), "beta.properties");
        assert_eq!(destination_name("other.json", "alpha", "beta"), "other.json");
    }

    #[test]
    fn duplicates_into_new_first_revision() {
        let dir = tempdir().unwrap();
        let layout = FatimaLayout::new(dir.path());
        seed_alpha(&layout);

        let report =
            duplicate_process(&layout, &Config::default(), "alpha", "beta", fixed_now()).unwrap();

        let expected_dir = layout
            .revision_root("beta")
            .join("2018.08.14-08.35_R001");
        assert_eq!(report.revision.directory, expected_dir);
        assert_eq!(report.revision.tag, "R001");
        let mut names: Vec<String> = fs::read_dir(&expected_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["beta", "beta.properties", "other.json"]);
        assert_eq!(
            fs::read_to_string(expected_dir.join("beta.properties")).unwrap(),
            "name=alpha\n"
        );
        let mode = fs::metadata(expected_dir.join("beta")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        assert_eq!(current_revision_number(&layout.live_link("beta")).unwrap(), 1);
        assert_eq!(
            fs::read_link(layout.live_link("beta")).unwrap(),
            PathBuf::from("revision/beta/2018.08.14-08.35_R001")
        );
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempdir().unwrap();
        let layout = FatimaLayout::new(dir.path());
        fs::create_dir_all(layout.app_dir()).unwrap();
        let err = duplicate_process(&layout, &Config::default(), "alpha", "beta", fixed_now())
            .expect_err("missing");
        assert_eq!(err.to_string(), "alpha process doesn't exist");
    }

    #[test]
    fn existing_target_is_reported() {
        let dir = tempdir().unwrap();
        let layout = FatimaLayout::new(dir.path());
        seed_alpha(&layout);
        fs::create_dir_all(layout.revision_root("beta")).unwrap();
        let err = duplicate_process(&layout, &Config::default(), "alpha", "beta", fixed_now())
            .expect_err("exists");
        assert!(matches!(err, FatimaError::TargetExists(_)));
        assert!(fs::symlink_metadata(layout.live_link("beta")).is_err());
    }

    #[test]
    fn no_matching_files_creates_nothing() {
        let dir = tempdir().unwrap();
        let layout = FatimaLayout::new(dir.path());
        let rev = layout.revision_root("alpha").join("2018.01.01-00.00_R001");
        fs::create_dir_all(rev.join("lib")).unwrap();
        fs::write(rev.join("data.bin"), "x").unwrap();
        link_revision(&layout.app_dir(), "alpha", &rev).unwrap();

        let err = duplicate_process(&layout, &Config::default(), "alpha", "beta", fixed_now())
            .expect_err("no files");
        assert!(matches!(err, FatimaError::NoSourceFiles(_)));
        assert!(!layout.revision_root("beta").exists());
        assert!(fs::symlink_metadata(layout.live_link("beta")).is_err());
    }

    #[test]
    fn foreign_revision_base_is_refused_before_copying() {
        let dir = tempdir().unwrap();
        let layout = FatimaLayout::new(dir.path());
        fs::create_dir_all(layout.app_dir()).unwrap();
        let Some(foreign) = foreign_device_dir(&layout.app_dir()) else {
            return;
        };
        symlink(foreign.path(), layout.revision_base()).unwrap();
        let rev = layout.revision_root("alpha").join("2018.01.01-00.00_R004");
        fs::create_dir_all(&rev).unwrap();
        fs::write(rev.join("alpha.properties"), "name=alpha\n").unwrap();
        symlink("revision/alpha/2018.01.01-00.00_R004", layout.live_link("alpha")).unwrap();

        for _ in 0..2 {
            let err = duplicate_process(&layout, &Config::default(), "alpha", "beta", fixed_now())
                .expect_err("cross device");
            assert!(matches!(err, FatimaError::CrossDevice { .. }), "{err}");
            assert!(!layout.revision_root("beta").exists());
            assert!(fs::symlink_metadata(layout.live_link("beta")).is_err());
        }
    }

    #[test]
    fn reserved_target_is_refused() {
        let dir = tempdir().unwrap();
        let layout = FatimaLayout::new(dir.path());
        seed_alpha(&layout);
        let err = duplicate_process(&layout, &Config::default(), "alpha", "juno", fixed_now())
            .expect_err("reserved");
        assert!(matches!(err, FatimaError::ReservedProgram(_)));
    }
}
