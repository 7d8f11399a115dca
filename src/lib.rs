//! Local command-line tooling for fatima hosts: process revisions, process
//! duplication, app cleanup and package status files.

pub mod clear;
pub mod cli;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod liveness;
pub mod logging;
pub mod output;
pub mod package_status;
pub mod paths;
pub mod prompt;
pub mod revision;
pub mod switcher;
pub mod versioning;

pub use error::FatimaError;
