use chrono::Local;
use clap::{Parser, Subcommand};
use dialoguer::console::style;
use fatima_cmd::cli::{build_context, Context, GlobalArgs};
use fatima_cmd::duplicate::duplicate_process;
use fatima_cmd::liveness::process_table_for;
use fatima_cmd::logging::init_tracing;
use fatima_cmd::output::{emit, exit_with_error};
use fatima_cmd::prompt::{AssumeYes, Confirmer, OperatorConfirmer};
use fatima_cmd::versioning::{
    run_versioning, RevisionListing, SwitchOutcome, VersioningOutcome, VersioningRequest,
};
use fatima_cmd::FatimaError;

#[derive(Parser, Debug)]
#[command(
    name = "lcproc",
    version,
    about = "display/control process version, duplicate process",
    after_help = "examples:\n  lcproc mypgm version         display mypgm revision versions\n  lcproc mypgm version R017    change mypgm revision to R017\n  lcproc mypgm dup mypgm2      duplicate mypgm to mypgm2"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    /// Answer yes to the confirmation prompt
    #[arg(long, global = true)]
    yes: bool,
    /// process name
    process: String,
    #[command(subcommand)]
    command: ProcCommand,
}

#[derive(Subcommand, Debug)]
enum ProcCommand {
    /// List revisions, or switch the live revision to TAG
    Version { tag: Option<String> },
    /// Duplicate the process into a new R001 revision
    Dup { target: String },
}

fn main() -> Result<(), FatimaError> {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.global.json;
    if let Err(err) = run(cli) {
        exit_with_error(json, &err);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), FatimaError> {
    let ctx = build_context(&cli.global)?;
    match cli.command {
        ProcCommand::Version { tag } => {
            let request = VersioningRequest {
                process: cli.process,
                target_tag: tag,
            };
            handle_version(&ctx, &request, cli.yes)
        }
        ProcCommand::Dup { target } => handle_dup(&ctx, &cli.process, &target),
    }
}

fn handle_version(
    ctx: &Context,
    request: &VersioningRequest,
    yes: bool,
) -> Result<(), FatimaError> {
    let table = process_table_for(ctx.config.liveness.process_table);
    let mut confirmer: Box<dyn Confirmer> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(OperatorConfirmer)
    };
    let outcome = run_versioning(
        &ctx.layout,
        &ctx.config,
        request,
        table.as_ref(),
        confirmer.as_mut(),
    )?;
    emit(ctx.json, &outcome, || match &outcome {
        VersioningOutcome::Listing(listing) => print_listing(listing),
        VersioningOutcome::Switch(switch) => print_switch(switch),
    })
}

fn print_listing(listing: &RevisionListing) {
    println!("{} revisions...", listing.process);
    for entry in &listing.revisions {
        if entry.current {
            println!("{} {}", entry.tag, style("<=== Current").green());
        } else {
            println!("{}", entry.tag);
        }
    }
}

fn print_switch(outcome: &SwitchOutcome) {
    match outcome {
        SwitchOutcome::Switched {
            process,
            to,
            link_target,
            ..
        } => {
            println!("applink : {} -> {}", process, link_target.display());
            println!("process {process} tagged to {to} revision. start process");
        }
        SwitchOutcome::AlreadyCurrent { process, tag } => {
            println!("process {process} is already on revision {tag}");
        }
        SwitchOutcome::Declined { process, tag } => {
            println!("process {process} not changed to revision {tag}");
        }
    }
}

fn handle_dup(ctx: &Context, source: &str, target: &str) -> Result<(), FatimaError> {
    let report = duplicate_process(&ctx.layout, &ctx.config, source, target, Local::now())?;
    emit(ctx.json, &report, || {
        println!("targetPath : {}", report.revision.directory.display());
        for file in &report.files {
            println!("copying to {}", file.destination.display());
        }
        println!("total {} files copied", report.files.len());
        println!("successfully duplicated {} to {}", report.source, report.target);
        println!("applink : {} -> {}", report.target, report.link_target.display());
        println!();
        println!("you have to add process in config using roproc command");
    })
}
