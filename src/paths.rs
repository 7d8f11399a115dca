//! `$FATIMA_HOME` directory layout.

use std::path::PathBuf;

pub const APP_FOLDER: &str = "app";
pub const REVISION_FOLDER: &str = "revision";
pub const PROC_FOLDER: &str = "proc";

#[derive(Debug, Clone)]
pub struct FatimaLayout {
    home: PathBuf,
}

impl FatimaLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `$FATIMA_HOME/app`, the directory holding every live link.
    pub fn app_dir(&self) -> PathBuf {
        self.home.join(APP_FOLDER)
    }

    pub fn revision_base(&self) -> PathBuf {
        self.app_dir().join(REVISION_FOLDER)
    }

    pub fn revision_root(&self, process: &str) -> PathBuf {
        self.revision_base().join(process)
    }

    pub fn live_link(&self, process: &str) -> PathBuf {
        self.app_dir().join(process)
    }

    pub fn pid_file(&self, process: &str) -> PathBuf {
        self.live_link(process)
            .join(PROC_FOLDER)
            .join(format!("{process}.pid"))
    }

    pub fn ha_file(&self) -> PathBuf {
        self.package_ha_dir().join("system.ha")
    }

    pub fn ps_file(&self) -> PathBuf {
        self.package_ha_dir().join("system.ps")
    }

    fn package_ha_dir(&self) -> PathBuf {
        self.home.join("package").join("cfm").join("ha")
    }
}
