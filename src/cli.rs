//! Flags and context shared by every binary.

use crate::config::{load_config, resolve_config_path, resolve_fatima_home, Config};
use crate::error::FatimaError;
use crate::output::emit;
use crate::package_status::{read_status, write_status, StatusKind};
use crate::paths::FatimaLayout;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: ~/.config/fatima/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
    /// Platform root, overrides config and $FATIMA_HOME
    #[arg(long, global = true)]
    pub fatima_home: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub layout: FatimaLayout,
    pub json: bool,
}

pub fn build_context(args: &GlobalArgs) -> Result<Context, FatimaError> {
    let config_path = resolve_config_path(args.config.as_ref());
    let config = load_config(&config_path)?;
    let home = resolve_fatima_home(args.fatima_home.as_ref(), &config)?;
    tracing::debug!(
        config = %config_path.display(),
        home = %home.display(),
        "resolved context"
    );
    Ok(Context {
        config,
        layout: FatimaLayout::new(home),
        json: args.json,
    })
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum StatusCommand {
    /// Set the package status
    Set { status: String },
}

/// Shared body of `lcha` and `lcps`.
pub fn handle_status(
    ctx: &Context,
    kind: StatusKind,
    command: Option<StatusCommand>,
) -> Result<(), FatimaError> {
    let (state, changed) = match command {
        None => (read_status(&ctx.layout, kind)?, false),
        Some(StatusCommand::Set { status }) => (write_status(&ctx.layout, kind, &status)?, true),
    };
    emit(
        ctx.json,
        &json!({"kind": kind.label(), "status": state, "changed": changed}),
        || {
            if changed {
                println!("set to {state}");
            } else {
                println!("{state}");
            }
        },
    )
}
