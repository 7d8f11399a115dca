use clap::Parser;
use fatima_cmd::cli::{build_context, handle_status, GlobalArgs, StatusCommand};
use fatima_cmd::logging::init_tracing;
use fatima_cmd::output::exit_with_error;
use fatima_cmd::package_status::StatusKind;
use fatima_cmd::FatimaError;

#[derive(Parser, Debug)]
#[command(name = "lcps", version, about = "show/control package primary/secondary status")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Option<StatusCommand>,
}

fn main() -> Result<(), FatimaError> {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.global.json;
    let result =
        build_context(&cli.global).and_then(|ctx| handle_status(&ctx, StatusKind::Ps, cli.command));
    if let Err(err) = result {
        exit_with_error(json, &err);
    }
    Ok(())
}
