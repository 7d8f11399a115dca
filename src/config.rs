use crate::error::FatimaError;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const FATIMA_HOME_ENV: &str = "FATIMA_HOME";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: u32,
    pub fatima_home: String,
    pub reserved_programs: Vec<String>,
    pub liveness: Liveness,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Liveness {
    pub process_table: ProcessTableKind,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessTableKind {
    Ps,
    Procfs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            fatima_home: "".to_string(),
            reserved_programs: vec![
                "jupiter".to_string(),
                "juno".to_string(),
                "saturn".to_string(),
            ],
            liveness: Liveness::default(),
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            process_table: ProcessTableKind::default(),
        }
    }
}

impl Default for ProcessTableKind {
    fn default() -> Self {
        ProcessTableKind::Ps
    }
}

impl Config {
    pub fn is_reserved(&self, process: &str) -> bool {
        self.reserved_programs
            .iter()
            .any(|name| name.eq_ignore_ascii_case(process))
    }
}

pub fn resolve_config_path(override_path: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = override_path {
        return path.clone();
    }
    if let Ok(path) = env::var("FATIMA_CONFIG") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    let mut base = default_config_dir();
    base.push("config.yaml");
    base
}

pub fn default_config_dir() -> PathBuf {
    if let Ok(path) = env::var("FATIMA_CONFIG_DIR") {
        return PathBuf::from(path);
    }
    let mut base = home_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push(".config");
    base.push("fatima");
    base
}

pub fn read_config_from_str(content: &str) -> Result<Config, FatimaError> {
    let cfg: Config = serde_yaml::from_str(content)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config, FatimaError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file absent, using defaults");
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    read_config_from_str(&content).map_err(|err| {
        FatimaError::Config(format!(
            "config is invalid. Please edit {} and try again. ({})",
            path.display(),
            err
        ))
    })
}

fn validate_config(cfg: &Config) -> Result<(), FatimaError> {
    if cfg.version != 1 {
        return Err(FatimaError::Config(format!(
            "unsupported config version {}",
            cfg.version
        )));
    }
    if cfg
        .reserved_programs
        .iter()
        .any(|name| name.trim().is_empty())
    {
        return Err(FatimaError::Config(
            "reserved_programs must not contain empty names".to_string(),
        ));
    }
    Ok(())
}

fn expand_path(input: &str) -> String {
    if let Some(stripped) = input.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(stripped).to_string_lossy().to_string();
        }
    }
    input.to_string()
}

/// Flag beats config beats `FATIMA_HOME`.
pub fn resolve_fatima_home(
    override_path: Option<&PathBuf>,
    cfg: &Config,
) -> Result<PathBuf, FatimaError> {
    if let Some(path) = override_path {
        return Ok(path.clone());
    }
    if !cfg.fatima_home.trim().is_empty() {
        return Ok(PathBuf::from(expand_path(cfg.fatima_home.trim())));
    }
    match env::var(FATIMA_HOME_ENV) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Err(FatimaError::Config(format!(
            "{FATIMA_HOME_ENV} is not set; export it or set fatima_home in config.yaml"
        ))),
    }
}
