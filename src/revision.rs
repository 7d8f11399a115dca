//! Revision folders and the live link that selects one of them.
//!
//! A process keeps every deployed snapshot under
//! `$FATIMA_HOME/app/revision/<process>/<timestamp>_R<N>`; the symlink
//! `$FATIMA_HOME/app/<process>` points at the live one.

use crate::config::Config;
use crate::error::FatimaError;
use crate::paths::REVISION_FOLDER;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub directory: PathBuf,
    pub tag: String,
    pub number: u32,
}

impl Revision {
    pub fn is_active(&self, current: Option<u32>) -> bool {
        current == Some(self.number)
    }
}

/// Splits `<anything>_R<digits>` into its tag and number.
pub fn parse_revision_dir_name(name: &str) -> Option<(String, u32)> {
    let idx = name.rfind('R')?;
    if !name[..idx].ends_with('_') {
        return None;
    }
    let digits = &name[idx + 1..];
    let number = parse_digits(digits)?;
    Some((format!("R{digits}"), number))
}

fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok()
}

fn compare_revisions(a: &Revision, b: &Revision) -> Ordering {
    b.number
        .cmp(&a.number)
        .then_with(|| b.directory.cmp(&a.directory))
}

/// Lists the revisions under `revision_root`, newest first.
///
/// Entries that are not directories or whose names do not end in `_R<digits>`
/// are skipped.
pub fn scan_revisions(revision_root: &Path) -> Result<Vec<Revision>, FatimaError> {
    let mut revisions = Vec::new();
    for entry in fs::read_dir(revision_root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Some((tag, number)) = parse_revision_dir_name(&name) else {
            tracing::debug!(dir = %path.display(), "skipping non-revision folder");
            continue;
        };
        revisions.push(Revision {
            directory: path,
            tag,
            number,
        });
    }
    revisions.sort_by(compare_revisions);
    tracing::debug!(
        root = %revision_root.display(),
        count = revisions.len(),
        "scanned revisions"
    );
    Ok(revisions)
}

pub fn find_revision<'a>(revisions: &'a [Revision], tag: &str) -> Option<&'a Revision> {
    revisions.iter().find(|revision| revision.tag == tag)
}

/// Uppercases an operator-supplied tag and checks the `R` marker.
pub fn normalize_tag(raw: &str) -> Result<String, FatimaError> {
    let tag = raw.trim().to_uppercase();
    if !tag.starts_with('R') {
        return Err(FatimaError::InvalidRevisionTag(tag));
    }
    Ok(tag)
}

/// Revision number the live link currently points at.
pub fn current_revision_number(live_link: &Path) -> Result<u32, FatimaError> {
    let meta = fs::symlink_metadata(live_link)?;
    if !meta.file_type().is_symlink() {
        return Err(FatimaError::NotSymlink(live_link.to_path_buf()));
    }
    let target = fs::read_link(live_link)?;
    parse_link_target(&target).ok_or(FatimaError::InvalidLinkFormat(target))
}

/// Like [`current_revision_number`], but a missing live link means "none".
pub fn current_revision_if_linked(live_link: &Path) -> Result<Option<u32>, FatimaError> {
    match current_revision_number(live_link) {
        Ok(number) => Ok(Some(number)),
        Err(FatimaError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Digits after the last `R` of the link target; a bare `R<digits>` target
/// with nothing in front of the marker is rejected.
fn parse_link_target(target: &Path) -> Option<u32> {
    let text = target.to_str()?;
    let idx = text.rfind('R')?;
    if idx == 0 {
        return None;
    }
    parse_digits(&text[idx + 1..])
}

/// Rejects names that would escape `app/` or collide with platform daemons.
pub fn check_process_name(cfg: &Config, process: &str) -> Result<(), FatimaError> {
    let trimmed = process.trim();
    if trimmed.is_empty()
        || trimmed != process
        || process == "."
        || process == ".."
        || process == REVISION_FOLDER
        || process.contains('/')
        || process.contains('\\')
    {
        return Err(FatimaError::InvalidProcessName(process.to_string()));
    }
    if cfg.is_reserved(process) {
        return Err(FatimaError::ReservedProgram(process.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn parses_well_formed_names() {
        assert_eq!(
            parse_revision_dir_name("2018.08.14-08.35_R006"),
            Some(("R006".to_string(), 6))
        );
        assert_eq!(
            parse_revision_dir_name("2023.01.01-00.00_R17"),
            Some(("R17".to_string(), 17))
        );
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "2018.08.14-08.35",
            "2018.08.14-08.35_R",
            "2018.08.14-08.35_Rx1",
            "2018.08.14-08.35_R1a",
            "2018.08.14-08.35R001",
            "backup",
            "_r001",
        ] {
            assert_eq!(parse_revision_dir_name(name), None, "{name}");
        }
    }

    #[test]
    fn scan_sorts_newest_first_and_skips_junk() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("2023.01.01-00.00_R001")).unwrap();
        fs::create_dir(root.join("2023.01.03-00.00_R010")).unwrap();
        fs::create_dir(root.join("2023.01.02-00.00_R002")).unwrap();
        fs::create_dir(root.join("scratch")).unwrap();
        fs::create_dir(root.join("2023.01.04-00.00_Rxx")).unwrap();
        fs::write(root.join("2023.01.05-00.00_R099"), "not a dir").unwrap();

        let revisions = scan_revisions(root).unwrap();
        let tags: Vec<&str> = revisions.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["R010", "R002", "R001"]);
        assert_eq!(revisions[0].number, 10);
        assert!(revisions[0].directory.ends_with("2023.01.03-00.00_R010"));
    }

    #[test]
    fn scan_is_repeatable() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("a_R001")).unwrap();
        fs::create_dir(dir.path().join("b_R002")).unwrap();
        assert_eq!(
            scan_revisions(dir.path()).unwrap(),
            scan_revisions(dir.path()).unwrap()
        );
    }

    #[test]
    fn normalize_tag_uppercases_and_requires_marker() {
        assert_eq!(normalize_tag("r017").unwrap(), "R017");
        let err = normalize_tag("17").expect_err("missing R");
        assert!(matches!(err, FatimaError::InvalidRevisionTag(_)));
    }

    #[test]
    fn find_revision_is_exact() {
        let revisions = vec![Revision {
            directory: PathBuf::from("/x/a_R003"),
            tag: "R003".to_string(),
            number: 3,
        }];
        assert!(find_revision(&revisions, "R003").is_some());
        assert!(find_revision(&revisions, "R3").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolves_current_revision_from_link() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("svc");
        symlink("revision/svc/2023.01.01-00.00_R007", &link).unwrap();
        assert_eq!(current_revision_number(&link).unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn marker_may_open_the_last_component() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("svc");
        symlink("revision/svc/R007", &link).unwrap();
        assert_eq!(current_revision_number(&link).unwrap(), 7);

        let bare = dir.path().join("bare");
        symlink("R007", &bare).unwrap();
        let err = current_revision_number(&bare).expect_err("nothing before marker");
        assert!(matches!(err, FatimaError::InvalidLinkFormat(_)));
    }

    #[test]
    fn plain_directory_is_not_a_live_link() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc");
        fs::create_dir(&path).unwrap();
        let err = current_revision_number(&path).expect_err("directory");
        assert!(matches!(err, FatimaError::NotSymlink(_)));
    }

    #[cfg(unix)]
    #[test]
    fn link_without_revision_marker_is_invalid() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("svc");
        symlink("revision/svc/latest", &link).unwrap();
        let err = current_revision_number(&link).expect_err("no marker");
        assert!(matches!(err, FatimaError::InvalidLinkFormat(_)));

        let link2 = dir.path().join("svc2");
        symlink("revision/svc2/2023_Rabc", &link2).unwrap();
        let err = current_revision_number(&link2).expect_err("non numeric");
        assert!(matches!(err, FatimaError::InvalidLinkFormat(_)));
    }

    #[test]
    fn missing_link_means_no_current_revision() {
        let dir = tempdir().unwrap();
        assert_eq!(
            current_revision_if_linked(&dir.path().join("ghost")).unwrap(),
            None
        );
    }

    #[test]
    fn process_names_are_checked() {
        let cfg = Config::default();
        assert!(check_process_name(&cfg, "mypgm").is_ok());
        assert!(matches!(
            check_process_name(&cfg, "Juno"),
            Err(FatimaError::ReservedProgram(_))
        ));
        for bad in ["", "..", "revision", "a/b", " pad"] {
            assert!(
                matches!(
                    check_process_name(&cfg, bad),
                    Err(FatimaError::InvalidProcessName(_))
                ),
                "{bad:?}"
            );
        }
    }
}
