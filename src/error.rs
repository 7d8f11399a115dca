use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatimaError {
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not permitted ro programs (e.g juno,jupiter,saturn): {0}")]
    ReservedProgram(String),
    #[error("invalid process name: {0:?}")]
    InvalidProcessName(String),
    #[error("{0} revision folder doesn't exist")]
    RevisionRootMissing(String),
    #[error("Invalid new revision : {0}")]
    InvalidRevisionTag(String),
    #[error("Not found revision {0}")]
    RevisionNotFound(String),
    #[error("not symbolic link path: {}", .0.display())]
    NotSymlink(PathBuf),
    #[error("invalid link name: {}", .0.display())]
    InvalidLinkFormat(PathBuf),

    #[error("pid {pid} exist. firstly, you have to stop process")]
    ProcessRunning { pid: u32 },
    #[error("process table error: {0}")]
    ProcessTable(String),

    #[error("fail to remove applink {}: {reason}", .path.display())]
    LinkRemoval { path: PathBuf, reason: String },
    #[error("fail to create applink {} -> {}: {reason}", .link.display(), .target.display())]
    LinkCreation {
        link: PathBuf,
        target: PathBuf,
        reason: String,
    },
    #[error("revision {} is not under app root {}", .revision.display(), .app_dir.display())]
    LinkOutsideAppRoot { revision: PathBuf, app_dir: PathBuf },
    #[error("revision {} is on a different filesystem than app root {}", .revision.display(), .app_dir.display())]
    CrossDevice { revision: PathBuf, app_dir: PathBuf },

    #[error("{0} process doesn't exist")]
    SourceMissing(String),
    #[error("{0} process dir exist")]
    TargetExists(String),
    #[error("there is no source files in {}", .0.display())]
    NoSourceFiles(PathBuf),

    #[error("{failed} of {total} paths could not be removed")]
    ClearIncomplete { failed: usize, total: usize },

    #[error("{kind} file not found: {}", .path.display())]
    StatusFileMissing { kind: &'static str, path: PathBuf },
}

impl FatimaError {
    /// Stable identifier used in `--json` error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            FatimaError::Config(_) => "config",
            FatimaError::Io(_) => "io",
            FatimaError::Prompt(_) => "prompt",
            FatimaError::Yaml(_) => "yaml",
            FatimaError::Json(_) => "json",
            FatimaError::ReservedProgram(_) => "reserved_program",
            FatimaError::InvalidProcessName(_) => "invalid_process_name",
            FatimaError::RevisionRootMissing(_) => "revision_root_missing",
            FatimaError::InvalidRevisionTag(_) => "invalid_revision_tag",
            FatimaError::RevisionNotFound(_) => "revision_not_found",
            FatimaError::NotSymlink(_) => "not_symlink",
            FatimaError::InvalidLinkFormat(_) => "invalid_link_format",
            FatimaError::ProcessRunning { .. } => "process_running",
            FatimaError::ProcessTable(_) => "process_table",
            FatimaError::LinkRemoval { .. } => "link_removal",
            FatimaError::LinkCreation { .. } => "link_creation",
            FatimaError::LinkOutsideAppRoot { .. } => "link_outside_app_root",
            FatimaError::CrossDevice { .. } => "cross_device",
            FatimaError::SourceMissing(_) => "source_missing",
            FatimaError::TargetExists(_) => "target_exists",
            FatimaError::NoSourceFiles(_) => "no_source_files",
            FatimaError::ClearIncomplete { .. } => "clear_incomplete",
            FatimaError::StatusFileMissing { .. } => "status_file_missing",
        }
    }
}
