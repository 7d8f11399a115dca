//! Repoints a process's live link at another revision.

use crate::error::FatimaError;
use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::symlink;
use std::path::{Component, Path, PathBuf};

/// Path of `revision_dir` as seen from `app_dir`, used as the link target.
pub fn relative_revision_path(app_dir: &Path, revision_dir: &Path) -> Result<PathBuf, FatimaError> {
    let outside = || FatimaError::LinkOutsideAppRoot {
        revision: revision_dir.to_path_buf(),
        app_dir: app_dir.to_path_buf(),
    };
    let relative = revision_dir.strip_prefix(app_dir).map_err(|_| outside())?;
    let escapes = relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)));
    if relative.as_os_str().is_empty() || escapes {
        return Err(outside());
    }
    Ok(relative.to_path_buf())
}

/// Relative link target for `revision_dir`, or the reason it cannot be linked
/// from `app_dir`.
///
/// `revision_dir` need not exist yet; its nearest existing ancestor decides
/// the device, so callers can check before creating anything.
pub fn check_link_target(app_dir: &Path, revision_dir: &Path) -> Result<PathBuf, FatimaError> {
    let relative = relative_revision_path(app_dir, revision_dir)?;
    ensure_same_device(app_dir, revision_dir)?;
    Ok(relative)
}

#[cfg(unix)]
fn ensure_same_device(app_dir: &Path, revision_dir: &Path) -> Result<(), FatimaError> {
    use std::os::unix::fs::MetadataExt;

    let existing = revision_dir
        .ancestors()
        .find(|path| path.exists())
        .unwrap_or(revision_dir);
    let app_dev = fs::metadata(app_dir)?.dev();
    let revision_dev = fs::metadata(existing)?.dev();
    if app_dev != revision_dev {
        return Err(FatimaError::CrossDevice {
            revision: revision_dir.to_path_buf(),
            app_dir: app_dir.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_same_device(_app_dir: &Path, _revision_dir: &Path) -> Result<(), FatimaError> {
    Ok(())
}

/// Makes `<app_dir>/<process>` point at `revision_dir`.
///
/// The new link is built beside the old one and renamed over it, so the live
/// path never disappears. A live path that is not a symlink is left alone.
pub fn link_revision(
    app_dir: &Path,
    process: &str,
    revision_dir: &Path,
) -> Result<PathBuf, FatimaError> {
    let relative = check_link_target(app_dir, revision_dir)?;

    let live_link = app_dir.join(process);
    match fs::symlink_metadata(&live_link) {
        Ok(meta) if !meta.file_type().is_symlink() => {
            return Err(FatimaError::LinkRemoval {
                path: live_link,
                reason: "refusing to replace a path that is not a symbolic link".to_string(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(FatimaError::LinkRemoval {
                path: live_link,
                reason: err.to_string(),
            });
        }
    }

    let staging = app_dir.join(format!(".{process}.link-{}", std::process::id()));
    match fs::remove_file(&staging) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(FatimaError::LinkRemoval {
                path: staging,
                reason: err.to_string(),
            });
        }
    }

    swap_in_link(&relative, &staging, &live_link)?;
    tracing::info!(
        link = %live_link.display(),
        target = %relative.display(),
        "live link updated"
    );
    Ok(relative)
}

/// Creates `staging -> relative` and renames it over `live_link`. A failed
/// rename removes the staging link again.
fn swap_in_link(relative: &Path, staging: &Path, live_link: &Path) -> Result<(), FatimaError> {
    let creation_error = |reason: String| FatimaError::LinkCreation {
        link: live_link.to_path_buf(),
        target: relative.to_path_buf(),
        reason,
    };
    create_symlink(relative, staging).map_err(|err| creation_error(err.to_string()))?;
    if let Err(err) = fs::rename(staging, live_link) {
        if let Err(cleanup) = fs::remove_file(staging) {
            tracing::warn!(path = %staging.display(), %cleanup, "staging link left behind");
        }
        return Err(creation_error(err.to_string()));
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    symlink(target, link)
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
